//! Isogeometric volume blocks: per-field solution spaces, refinement
//! propagation, degeneracy and periodicity analysis, and face topology.

pub mod analysis;
mod block;
pub mod conditions;
mod model;
mod orientation;
mod refine;
pub mod solution;
pub mod types;
mod validate;

pub use block::VolumeBlock;
pub use conditions::{BoundaryCondition, ConditionKind, PointCondition};
pub use model::VolumeModel;
pub use solution::SolutionSpace;
pub use types::*;

//! Tensor-product spline geometry for isogeometric volume blocks.
//!
//! Provides clamped B-spline bases with knot insertion and order raising,
//! trivariate spline volumes (optionally rational), and the bivariate
//! surfaces extracted from their faces.

pub mod basis;
pub mod face;
pub mod nurbs;
pub mod surface;
pub mod volume;

pub use basis::BsplineBasis;
pub use face::Face;
pub use surface::{SplineSurface, Surface};
pub use volume::SplineVolume;

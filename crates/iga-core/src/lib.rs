pub mod error;
pub mod tolerance;
pub mod traits;

pub use error::{check_axis, IgaError, Result};
pub use tolerance::Tolerance;

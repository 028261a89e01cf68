use thiserror::Error;

#[derive(Debug, Error)]
pub enum IgaError {
    #[error("Invalid parameter direction: {0} (expected 0, 1 or 2)")]
    InvalidAxis(usize),

    #[error("Invalid face number: {0} (expected 0..=5)")]
    InvalidFace(usize),

    #[error("Invalid dimension: {0}")]
    InvalidDimension(String),

    #[error("Point is not on boundary surface (distance {distance:e}, tolerance {tolerance:e})")]
    PointNotOnBoundary { distance: f64, tolerance: f64 },

    #[error("No face <-> block match")]
    NoFaceMatch,

    #[error("Unsupported configuration: {0}")]
    UnsupportedConfiguration(String),

    #[error("Not implemented: {0}")]
    Unsupported(String),

    #[error("Geometry error: {0}")]
    Geometry(String),

    #[error("Topology error: {0}")]
    Topology(String),

    #[error("Not found: {0}")]
    NotFound(String),
}

pub type Result<T> = std::result::Result<T, IgaError>;

/// Check a parameter direction argument.
pub fn check_axis(axis: usize) -> Result<usize> {
    if axis <= 2 {
        Ok(axis)
    } else {
        Err(IgaError::InvalidAxis(axis))
    }
}

use crate::error::Result;

/// Structural consistency check for models and their links.
pub trait Validate {
    fn validate(&self) -> Result<()>;
}

/// Axis-aligned bounds of a geometry's control net.
///
/// For spline geometry the convex hull property makes the control-net box
/// an enclosing box of the evaluated geometry.
pub trait BoundingBox {
    type Bounds;
    fn bounding_box(&self) -> Self::Bounds;
}

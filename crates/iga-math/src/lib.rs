pub mod aabb;

pub use glam::{dvec3, DVec2, DVec3};
pub use aabb::Aabb3;

pub type Point2 = DVec2;
pub type Point3 = DVec3;
pub type Vector3 = DVec3;

/// Signed volume spanned by three vectors, `a . (b x c)`.
///
/// Positive for a right-handed triple.
#[inline]
pub fn triple_product(a: Vector3, b: Vector3, c: Vector3) -> f64 {
    a.dot(b.cross(c))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_triple_product_handedness() {
        assert_relative_eq!(triple_product(DVec3::X, DVec3::Y, DVec3::Z), 1.0);
        assert_relative_eq!(triple_product(DVec3::Y, DVec3::X, DVec3::Z), -1.0);
        assert_relative_eq!(triple_product(DVec3::X, DVec3::X, DVec3::Z), 0.0);
    }
}

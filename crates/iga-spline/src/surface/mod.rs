//! Surface trait and the spline surface extracted from volume faces.

mod spline;

use iga_math::{Point3, Vector3};

pub use spline::SplineSurface;

/// Trait for parametric surfaces in 3D space.
pub trait Surface: Send + Sync {
    /// Evaluate the surface at parameters `(u, v)`.
    fn point_at(&self, u: f64, v: f64) -> Point3;

    /// Evaluate the unit surface normal `S_u x S_v` at parameters `(u, v)`.
    fn normal_at(&self, u: f64, v: f64) -> Vector3;

    /// Return the u-parameter domain `(u_min, u_max)`.
    fn domain_u(&self) -> (f64, f64);

    /// Return the v-parameter domain `(v_min, v_max)`.
    fn domain_v(&self) -> (f64, f64);

    /// The four corners with their parameters, starting at `(u_min, v_min)`
    /// and proceeding counter-clockwise in the parameter plane.
    fn corner_points(&self) -> [(Point3, [f64; 2]); 4] {
        let (u0, u1) = self.domain_u();
        let (v0, v1) = self.domain_v();
        [[u0, v0], [u1, v0], [u1, v1], [u0, v1]].map(|[u, v]| (self.point_at(u, v), [u, v]))
    }
}

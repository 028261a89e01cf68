//! Tensor-product B-spline / NURBS surface.

use iga_core::{IgaError, Result};
use iga_math::{DVec3, Point3, Vector3};
use serde::{Deserialize, Serialize};

use super::Surface;
use crate::basis::BsplineBasis;
use crate::nurbs::tensor;

/// Maximum number of Gauss-Newton steps in [`SplineSurface::closest_point`].
const MAX_PROJECTION_STEPS: usize = 50;

/// A spline surface over two bases.
///
/// Coefficient `(i, j)` lives at index `j * n_u + i` and occupies
/// `dimension + rational` homogeneous channels.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SplineSurface {
    bases: [BsplineBasis; 2],
    dimension: usize,
    rational: bool,
    coefs: Vec<f64>,
}

impl SplineSurface {
    pub fn new(
        bases: [BsplineBasis; 2],
        dimension: usize,
        rational: bool,
        coefs: Vec<f64>,
    ) -> Result<Self> {
        let expected =
            bases[0].num_coefs() * bases[1].num_coefs() * (dimension + rational as usize);
        if dimension == 0 || coefs.len() != expected {
            return Err(IgaError::InvalidDimension(format!(
                "surface of dimension {} needs {} coefficient values, got {}",
                dimension,
                expected,
                coefs.len()
            )));
        }
        Ok(Self {
            bases,
            dimension,
            rational,
            coefs,
        })
    }

    pub fn basis(&self, dir: usize) -> &BsplineBasis {
        &self.bases[dir]
    }

    pub fn num_coefs(&self, dir: usize) -> usize {
        self.bases[dir].num_coefs()
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn rational(&self) -> bool {
        self.rational
    }

    pub fn coefs(&self) -> &[f64] {
        &self.coefs
    }

    pub fn coef_index(&self, i: usize, j: usize) -> usize {
        j * self.num_coefs(0) + i
    }

    /// Control point `index` in Euclidean coordinates, padded/truncated to 3D.
    pub fn control_point3(&self, index: usize) -> Point3 {
        let stride = self.dimension + self.rational as usize;
        let c = &self.coefs[index * stride..(index + 1) * stride];
        let w = if self.rational { c[self.dimension] } else { 1.0 };
        let get = |k: usize| if k < self.dimension { c[k] / w } else { 0.0 };
        DVec3::new(get(0), get(1), get(2))
    }

    pub fn point(&self, s: f64, t: f64) -> Vec<f64> {
        let mut out = tensor::evaluate(
            &[&self.bases[0], &self.bases[1]],
            &self.coefs,
            self.dimension,
            self.rational,
            &[s, t],
            false,
        );
        out.swap_remove(0)
    }

    /// Position followed by the two first partials.
    pub fn derivs(&self, s: f64, t: f64) -> Vec<Vec<f64>> {
        tensor::evaluate(
            &[&self.bases[0], &self.bases[1]],
            &self.coefs,
            self.dimension,
            self.rational,
            &[s, t],
            true,
        )
    }

    pub fn point3(&self, s: f64, t: f64) -> Point3 {
        to_point3(&self.point(s, t))
    }

    pub fn derivs3(&self, s: f64, t: f64) -> [Vector3; 3] {
        let d = self.derivs(s, t);
        [to_point3(&d[0]), to_point3(&d[1]), to_point3(&d[2])]
    }

    /// Closest point on the surface to `pt`.
    ///
    /// Returns `(s, t, closest, distance)`. The search is seeded from a
    /// parameter grid and refined by Gauss-Newton steps clamped to the
    /// domain, stopping once the parameter step falls below `epsilon`.
    pub fn closest_point(&self, pt: Point3, epsilon: f64) -> (f64, f64, Point3, f64) {
        let (s0, s1) = self.domain_u();
        let (t0, t1) = self.domain_v();

        let samples_s = (2 * self.num_coefs(0)).max(8);
        let samples_t = (2 * self.num_coefs(1)).max(8);
        let mut best = (s0, t0, f64::INFINITY);
        for a in 0..=samples_s {
            let s = s0 + (s1 - s0) * a as f64 / samples_s as f64;
            for b in 0..=samples_t {
                let t = t0 + (t1 - t0) * b as f64 / samples_t as f64;
                let d2 = self.point3(s, t).distance_squared(pt);
                if d2 < best.2 {
                    best = (s, t, d2);
                }
            }
        }

        let (mut s, mut t) = (best.0, best.1);
        let step_tol = epsilon.max(f64::EPSILON) * 1e-3 * (s1 - s0).max(t1 - t0);
        let mut converged = false;
        for _ in 0..MAX_PROJECTION_STEPS {
            let [p, ds, dt] = self.derivs3(s, t);
            let r = p - pt;
            let a11 = ds.dot(ds);
            let a12 = ds.dot(dt);
            let a22 = dt.dot(dt);
            let b1 = -r.dot(ds);
            let b2 = -r.dot(dt);
            let det = a11 * a22 - a12 * a12;
            if det.abs() < 1e-30 {
                // Singular metric, e.g. at a collapsed edge
                converged = true;
                break;
            }
            let delta_s = (b1 * a22 - b2 * a12) / det;
            let delta_t = (a11 * b2 - a12 * b1) / det;
            let ns = (s + delta_s).clamp(s0, s1);
            let nt = (t + delta_t).clamp(t0, t1);
            let moved = (ns - s).abs() + (nt - t).abs();
            s = ns;
            t = nt;
            if moved < step_tol {
                converged = true;
                break;
            }
        }

        let closest = self.point3(s, t);
        if !converged {
            log::debug!(
                "closest point projection stopped after {} steps at ({}, {})",
                MAX_PROJECTION_STEPS,
                s,
                t
            );
        }
        (s, t, closest, closest.distance(pt))
    }
}

fn to_point3(v: &[f64]) -> Point3 {
    let get = |k: usize| v.get(k).copied().unwrap_or(0.0);
    DVec3::new(get(0), get(1), get(2))
}

impl Surface for SplineSurface {
    fn point_at(&self, u: f64, v: f64) -> Point3 {
        self.point3(u, v)
    }

    fn normal_at(&self, u: f64, v: f64) -> Vector3 {
        let [_, du, dv] = self.derivs3(u, v);
        let n = du.cross(dv);
        let len = n.length();
        if len < 1e-15 {
            DVec3::ZERO
        } else {
            n / len
        }
    }

    fn domain_u(&self) -> (f64, f64) {
        (self.bases[0].start_param(), self.bases[0].end_param())
    }

    fn domain_v(&self) -> (f64, f64) {
        (self.bases[1].start_param(), self.bases[1].end_param())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn bilinear_surface() -> SplineSurface {
        let b = BsplineBasis::bezier(1, 0.0, 1.0).unwrap();
        SplineSurface::new(
            [b.clone(), b],
            3,
            false,
            vec![
                0.0, 0.0, 0.0, //
                1.0, 0.0, 0.0, //
                0.0, 1.0, 0.0, //
                1.0, 1.0, 0.0,
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_corners_counter_clockwise() {
        let surf = bilinear_surface();
        let corners = surf.corner_points();
        assert_eq!(corners[0].1, [0.0, 0.0]);
        assert_eq!(corners[1].1, [1.0, 0.0]);
        assert_eq!(corners[2].1, [1.0, 1.0]);
        assert_eq!(corners[3].1, [0.0, 1.0]);
        assert!((corners[2].0 - DVec3::new(1.0, 1.0, 0.0)).length() < 1e-12);
    }

    #[test]
    fn test_flat_normal() {
        let surf = bilinear_surface();
        assert!((surf.normal_at(0.3, 0.7) - DVec3::Z).length() < 1e-12);
    }

    #[test]
    fn test_closest_point_projection() {
        let surf = bilinear_surface();
        let (s, t, p, dist) = surf.closest_point(DVec3::new(0.3, 0.6, 2.0), 1e-9);
        assert_abs_diff_eq!(s, 0.3, epsilon = 1e-9);
        assert_abs_diff_eq!(t, 0.6, epsilon = 1e-9);
        assert_abs_diff_eq!(p.z, 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(dist, 2.0, epsilon = 1e-9);
    }

    #[test]
    fn test_closest_point_outside_domain_clamps() {
        let surf = bilinear_surface();
        let (s, t, _, dist) = surf.closest_point(DVec3::new(2.0, 0.5, 0.0), 1e-9);
        assert_abs_diff_eq!(s, 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(t, 0.5, epsilon = 1e-9);
        assert_abs_diff_eq!(dist, 1.0, epsilon = 1e-9);
    }

    #[test]
    fn test_wrong_coefficient_count() {
        let b = BsplineBasis::bezier(1, 0.0, 1.0).unwrap();
        assert!(SplineSurface::new([b.clone(), b], 3, false, vec![0.0; 5]).is_err());
    }
}

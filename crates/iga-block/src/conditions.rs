//! Boundary and point conditions attached to a solution space.
//!
//! Only the enumeration contract lives here: which coefficients of the
//! solution space a condition touches, and with what weights for a point
//! condition. Turning values into constraints is left to the solver.

use iga_spline::{Face, SplineVolume};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConditionKind {
    /// Homogeneous Dirichlet condition.
    Zero,
    /// Prescribed value.
    Dirichlet,
    /// Prescribed flux.
    Neumann,
}

/// A condition on a whole face of the block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoundaryCondition {
    pub face: Face,
    pub kind: ConditionKind,
    /// One entry per field component.
    pub value: Vec<f64>,
}

impl BoundaryCondition {
    /// Coefficients of `space` lying on the condition's face.
    pub fn coefficient_enumeration(&self, space: &SplineVolume) -> Vec<usize> {
        space.face_coef_indices(self.face)
    }
}

/// A condition at a single parameter point of a face.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointCondition {
    pub face: Face,
    /// Face parameters `(s, t)`.
    pub param: [f64; 2],
    pub kind: ConditionKind,
    pub value: Vec<f64>,
}

impl PointCondition {
    /// Coefficients whose basis functions are non-zero at the point, paired
    /// with the (rational) basis value.
    ///
    /// The factors sum to one, so a value at the point is
    /// `sum(factor * coefficient)`.
    pub fn interpolation_factors(&self, space: &SplineVolume) -> Vec<(usize, f64)> {
        let param = space.face_param(self.face, self.param);
        let local: Vec<(usize, Vec<f64>)> = (0..3)
            .map(|axis| {
                let basis = space.basis(axis);
                let (span, values) = basis.evaluate(param[axis]);
                (span - basis.degree(), values)
            })
            .collect();

        let mut factors = Vec::new();
        for (c, wv) in local[2].1.iter().enumerate() {
            for (b, vv) in local[1].1.iter().enumerate() {
                for (a, uv) in local[0].1.iter().enumerate() {
                    let value = uv * vv * wv;
                    if value <= 0.0 {
                        continue;
                    }
                    let idx = space.coef_index(local[0].0 + a, local[1].0 + b, local[2].0 + c);
                    factors.push((idx, value * space.weight(idx)));
                }
            }
        }

        let total: f64 = factors.iter().map(|(_, f)| f).sum();
        if total > 0.0 {
            for (_, f) in &mut factors {
                *f /= total;
            }
        }
        factors
    }

    /// Coefficients influenced by the point condition.
    pub fn coefficient_enumeration(&self, space: &SplineVolume) -> Vec<usize> {
        self.interpolation_factors(space)
            .into_iter()
            .map(|(idx, _)| idx)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use iga_spline::BsplineBasis;

    fn quadratic_field() -> SplineVolume {
        let b = BsplineBasis::bezier(2, 0.0, 1.0).unwrap();
        let lin = BsplineBasis::bezier(1, 0.0, 1.0).unwrap();
        SplineVolume::new([b.clone(), b, lin], 1, false, vec![0.0; 18]).unwrap()
    }

    #[test]
    fn test_boundary_condition_enumeration() {
        let space = quadratic_field();
        let bc = BoundaryCondition {
            face: Face::WMax,
            kind: ConditionKind::Zero,
            value: vec![0.0],
        };
        assert_eq!(bc.coefficient_enumeration(&space), (9..18).collect::<Vec<_>>());
    }

    #[test]
    fn test_point_condition_at_face_corner() {
        let space = quadratic_field();
        let pc = PointCondition {
            face: Face::WMin,
            param: [0.0, 0.0],
            kind: ConditionKind::Dirichlet,
            value: vec![1.0],
        };
        assert_eq!(pc.coefficient_enumeration(&space), vec![0]);
    }

    #[test]
    fn test_point_condition_factors_partition_unity() {
        let space = quadratic_field();
        let pc = PointCondition {
            face: Face::WMin,
            param: [0.5, 0.25],
            kind: ConditionKind::Dirichlet,
            value: vec![1.0],
        };
        let factors = pc.interpolation_factors(&space);
        assert_eq!(factors.len(), 9);
        let sum: f64 = factors.iter().map(|(_, f)| f).sum();
        assert_abs_diff_eq!(sum, 1.0, epsilon = 1e-14);
        assert!(factors.iter().all(|(idx, _)| *idx < 9));
    }
}

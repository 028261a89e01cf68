//! Discretisation of one physical field over a block's parameter domain.

use iga_core::{check_axis, IgaError, Result};
use iga_spline::{Face, SplineVolume};
use serde::{Deserialize, Serialize};

use crate::conditions::{BoundaryCondition, ConditionKind, PointCondition};

/// One solution field: a spline volume sharing the geometry's parameter
/// domain, plus the conditions imposed on it.
///
/// For a rational geometry the space carries the geometry's weights as an
/// extra channel so both evaluate with the same denominator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolutionSpace {
    space: SplineVolume,
    minimum_degree: usize,
    boundary_conditions: Vec<BoundaryCondition>,
    point_conditions: Vec<PointCondition>,
}

impl SolutionSpace {
    /// Zero field of dimension `dimension` on the geometry's bases.
    pub fn from_geometry(geometry: &SplineVolume, dimension: usize) -> Result<Self> {
        if dimension == 0 {
            return Err(IgaError::InvalidDimension(
                "solution space dimension must be positive".into(),
            ));
        }
        let rational = geometry.rational();
        let n = geometry.total_coefs();
        let stride = dimension + rational as usize;
        let mut coefs = vec![0.0; n * stride];
        if rational {
            for i in 0..n {
                coefs[i * stride + dimension] = geometry.weight(i);
            }
        }
        let space = SplineVolume::new(geometry.bases().clone(), dimension, rational, coefs)?;
        Ok(Self::new(space))
    }

    pub fn new(space: SplineVolume) -> Self {
        Self {
            minimum_degree: 0,
            space,
            boundary_conditions: Vec::new(),
            point_conditions: Vec::new(),
        }
    }

    pub fn space(&self) -> &SplineVolume {
        &self.space
    }

    /// Field components per coefficient (the weight channel excluded).
    pub fn dimension(&self) -> usize {
        self.space.dimension()
    }

    pub fn degree(&self, axis: usize) -> Result<usize> {
        check_axis(axis)?;
        Ok(self.space.basis(axis).degree())
    }

    pub fn minimum_degree(&self) -> usize {
        self.minimum_degree
    }

    pub fn insert_knots(&mut self, knots: &[f64], axis: usize) -> Result<()> {
        self.space.insert_knots(check_axis(axis)?, knots)
    }

    /// Raise the degree along `axis` to `new_degree`; no-op if it is
    /// already at least that high.
    pub fn increase_degree(&mut self, new_degree: usize, axis: usize) -> Result<()> {
        let current = self.degree(axis)?;
        if current >= new_degree {
            return Ok(());
        }
        let mut raise = [0; 3];
        raise[axis] = new_degree - current;
        log::trace!(
            "raising solution degree {} -> {} along direction {}",
            current,
            new_degree,
            axis
        );
        self.space.raise_order(raise)
    }

    /// Record the field's minimum degree and raise every direction below it.
    pub fn set_minimum_degree(&mut self, degree: usize) -> Result<()> {
        self.minimum_degree = degree;
        for axis in 0..3 {
            self.increase_degree(degree, axis)?;
        }
        Ok(())
    }

    fn check_value(&self, value: &[f64]) -> Result<()> {
        if value.len() != self.dimension() {
            return Err(IgaError::InvalidDimension(format!(
                "condition value has {} components, field has {}",
                value.len(),
                self.dimension()
            )));
        }
        Ok(())
    }

    /// Attach a face condition; returns its index.
    pub fn add_boundary_condition(
        &mut self,
        face: Face,
        kind: ConditionKind,
        value: Vec<f64>,
    ) -> Result<usize> {
        self.check_value(&value)?;
        self.boundary_conditions
            .push(BoundaryCondition { face, kind, value });
        Ok(self.boundary_conditions.len() - 1)
    }

    /// Attach a point condition at face parameters `param`; returns its index.
    pub fn add_point_condition(
        &mut self,
        face: Face,
        param: [f64; 2],
        kind: ConditionKind,
        value: Vec<f64>,
    ) -> Result<usize> {
        self.check_value(&value)?;
        let [a, b] = face.surface_axes();
        for (p, axis) in param.iter().zip([a, b]) {
            let basis = self.space.basis(axis);
            if *p < basis.start_param() || *p > basis.end_param() {
                return Err(IgaError::Geometry(format!(
                    "face parameter {} outside [{}, {}]",
                    p,
                    basis.start_param(),
                    basis.end_param()
                )));
            }
        }
        self.point_conditions.push(PointCondition {
            face,
            param,
            kind,
            value,
        });
        Ok(self.point_conditions.len() - 1)
    }

    pub fn boundary_conditions(&self) -> &[BoundaryCondition] {
        &self.boundary_conditions
    }

    pub fn point_conditions(&self) -> &[PointCondition] {
        &self.point_conditions
    }

    pub fn face_boundary_conditions(&self, face: Face) -> impl Iterator<Item = &BoundaryCondition> {
        self.boundary_conditions.iter().filter(move |c| c.face == face)
    }

    pub fn face_point_conditions(&self, face: Face) -> impl Iterator<Item = &PointCondition> {
        self.point_conditions.iter().filter(move |c| c.face == face)
    }
}

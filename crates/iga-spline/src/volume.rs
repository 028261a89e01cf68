//! Trivariate tensor-product B-spline / NURBS volume.

use iga_core::traits::BoundingBox;
use iga_core::{check_axis, IgaError, Result};
use iga_math::{triple_product, Aabb3, DVec3, Point3, Vector3};
use serde::{Deserialize, Serialize};

use crate::basis::BsplineBasis;
use crate::face::Face;
use crate::nurbs::tensor;
use crate::surface::SplineSurface;

/// A spline volume over three bases.
///
/// Coefficient `(i, j, k)` lives at index `(k * n_v + j) * n_u + i` and
/// occupies `dimension + rational` homogeneous channels, the weight last.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SplineVolume {
    bases: [BsplineBasis; 3],
    dimension: usize,
    rational: bool,
    coefs: Vec<f64>,
}

impl SplineVolume {
    pub fn new(
        bases: [BsplineBasis; 3],
        dimension: usize,
        rational: bool,
        coefs: Vec<f64>,
    ) -> Result<Self> {
        let count: usize = bases.iter().map(|b| b.num_coefs()).product();
        let expected = count * (dimension + rational as usize);
        if dimension == 0 || coefs.len() != expected {
            return Err(IgaError::InvalidDimension(format!(
                "volume of dimension {} needs {} coefficient values, got {}",
                dimension,
                expected,
                coefs.len()
            )));
        }
        if rational {
            let stride = dimension + 1;
            if coefs.chunks(stride).any(|c| c[dimension] <= 0.0) {
                return Err(IgaError::Geometry("Rational weights must be positive".into()));
            }
        }
        Ok(Self {
            bases,
            dimension,
            rational,
            coefs,
        })
    }

    /// Non-rational volume from Euclidean control points, u fastest.
    pub fn from_points(bases: [BsplineBasis; 3], points: &[Point3]) -> Result<Self> {
        let coefs = points.iter().flat_map(|p| p.to_array()).collect();
        Self::new(bases, 3, false, coefs)
    }

    /// Rational volume from Euclidean control points and weights.
    pub fn from_weighted_points(
        bases: [BsplineBasis; 3],
        points: &[Point3],
        weights: &[f64],
    ) -> Result<Self> {
        if points.len() != weights.len() {
            return Err(IgaError::InvalidDimension(format!(
                "{} control points but {} weights",
                points.len(),
                weights.len()
            )));
        }
        let coefs = points
            .iter()
            .zip(weights)
            .flat_map(|(p, &w)| [p.x * w, p.y * w, p.z * w, w])
            .collect();
        Self::new(bases, 3, true, coefs)
    }

    pub fn basis(&self, axis: usize) -> &BsplineBasis {
        &self.bases[axis]
    }

    pub fn bases(&self) -> &[BsplineBasis; 3] {
        &self.bases
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn rational(&self) -> bool {
        self.rational
    }

    /// Channels per coefficient.
    pub fn stride(&self) -> usize {
        self.dimension + self.rational as usize
    }

    pub fn coefs(&self) -> &[f64] {
        &self.coefs
    }

    pub fn coefs_mut(&mut self) -> &mut [f64] {
        &mut self.coefs
    }

    pub fn num_coefs(&self, axis: usize) -> usize {
        self.bases[axis].num_coefs()
    }

    pub fn total_coefs(&self) -> usize {
        self.bases.iter().map(|b| b.num_coefs()).product()
    }

    pub fn order(&self, axis: usize) -> usize {
        self.bases[axis].order()
    }

    pub fn start_param(&self, axis: usize) -> f64 {
        self.bases[axis].start_param()
    }

    pub fn end_param(&self, axis: usize) -> f64 {
        self.bases[axis].end_param()
    }

    pub fn coef_index(&self, i: usize, j: usize, k: usize) -> usize {
        (k * self.num_coefs(1) + j) * self.num_coefs(0) + i
    }

    /// Inverse of [`coef_index`](Self::coef_index).
    pub fn coef_position(&self, index: usize) -> [usize; 3] {
        let nu = self.num_coefs(0);
        let nv = self.num_coefs(1);
        [index % nu, (index / nu) % nv, index / (nu * nv)]
    }

    /// Weight of coefficient `index` (1 for non-rational volumes).
    pub fn weight(&self, index: usize) -> f64 {
        if self.rational {
            self.coefs[index * self.stride() + self.dimension]
        } else {
            1.0
        }
    }

    /// Euclidean control point `index`, padded/truncated to 3D.
    pub fn control_point3(&self, index: usize) -> Point3 {
        let stride = self.stride();
        let c = &self.coefs[index * stride..(index + 1) * stride];
        let w = self.weight(index);
        let get = |k: usize| if k < self.dimension { c[k] / w } else { 0.0 };
        DVec3::new(get(0), get(1), get(2))
    }

    pub fn point(&self, param: [f64; 3]) -> Vec<f64> {
        let mut out = self.evaluate(param, false);
        out.swap_remove(0)
    }

    /// Position followed by the three first partials.
    pub fn derivs(&self, param: [f64; 3]) -> Vec<Vec<f64>> {
        self.evaluate(param, true)
    }

    pub fn point3(&self, param: [f64; 3]) -> Point3 {
        to_point3(&self.point(param))
    }

    pub fn derivs3(&self, param: [f64; 3]) -> [Vector3; 4] {
        let d = self.derivs(param);
        [
            to_point3(&d[0]),
            to_point3(&d[1]),
            to_point3(&d[2]),
            to_point3(&d[3]),
        ]
    }

    fn evaluate(&self, param: [f64; 3], derivs: bool) -> Vec<Vec<f64>> {
        tensor::evaluate(
            &[&self.bases[0], &self.bases[1], &self.bases[2]],
            &self.coefs,
            self.dimension,
            self.rational,
            &param,
            derivs,
        )
    }

    /// Parameter of corner `c`: bit 0 selects u max, bit 1 v max, bit 2 w max.
    pub fn corner_param(&self, c: usize) -> [f64; 3] {
        let mut param = [0.0; 3];
        for (axis, p) in param.iter_mut().enumerate() {
            *p = if c & (1 << axis) != 0 {
                self.end_param(axis)
            } else {
                self.start_param(axis)
            };
        }
        param
    }

    /// The eight corner points, ordered as [`corner_param`](Self::corner_param).
    pub fn corner_points(&self) -> [Point3; 8] {
        std::array::from_fn(|c| self.point3(self.corner_param(c)))
    }

    /// Volume parameter of the point at face parameters `(s, t)`.
    pub fn face_param(&self, face: Face, st: [f64; 2]) -> [f64; 3] {
        let axis = face.axis();
        let mut param = [0.0; 3];
        param[axis] = if face.is_max() {
            self.end_param(axis)
        } else {
            self.start_param(axis)
        };
        let [a, b] = face.surface_axes();
        param[a] = st[0];
        param[b] = st[1];
        param
    }

    /// Indices of the coefficients on `face`, in the face surface's own order
    /// (first surface direction fastest).
    pub fn face_coef_indices(&self, face: Face) -> Vec<usize> {
        let axis = face.axis();
        let fixed = if face.is_max() {
            self.num_coefs(axis) - 1
        } else {
            0
        };
        let [a, b] = face.surface_axes();
        let mut indices = Vec::with_capacity(self.num_coefs(a) * self.num_coefs(b));
        for q in 0..self.num_coefs(b) {
            for p in 0..self.num_coefs(a) {
                let mut pos = [0usize; 3];
                pos[axis] = fixed;
                pos[a] = p;
                pos[b] = q;
                indices.push(self.coef_index(pos[0], pos[1], pos[2]));
            }
        }
        indices
    }

    /// Extract the boundary surface on `face`.
    ///
    /// The surface is parametrised by [`Face::surface_axes`], so its normal
    /// follows the right-handed cross product of the in-plane partials.
    pub fn boundary_surface(&self, face: Face) -> Result<SplineSurface> {
        let [a, b] = face.surface_axes();
        let stride = self.stride();
        let mut coefs = Vec::with_capacity(self.num_coefs(a) * self.num_coefs(b) * stride);
        for idx in self.face_coef_indices(face) {
            coefs.extend_from_slice(&self.coefs[idx * stride..(idx + 1) * stride]);
        }
        SplineSurface::new(
            [self.bases[a].clone(), self.bases[b].clone()],
            self.dimension,
            self.rational,
            coefs,
        )
    }

    /// Insert `knots` into the basis of `axis`.
    pub fn insert_knots(&mut self, axis: usize, knots: &[f64]) -> Result<()> {
        check_axis(axis)?;
        if knots.is_empty() {
            return Ok(());
        }
        let (basis, map) = self.bases[axis].insert_knots(knots)?;
        self.apply_refinement(axis, basis, &map);
        Ok(())
    }

    /// Raise the order of each direction by the given amount.
    pub fn raise_order(&mut self, raise: [usize; 3]) -> Result<()> {
        for (axis, &r) in raise.iter().enumerate() {
            if r == 0 {
                continue;
            }
            let (basis, map) = self.bases[axis].raise_order(r)?;
            self.apply_refinement(axis, basis, &map);
        }
        Ok(())
    }

    fn apply_refinement(&mut self, axis: usize, basis: BsplineBasis, map: &nalgebra::DMatrix<f64>) {
        let sizes = [self.num_coefs(0), self.num_coefs(1), self.num_coefs(2)];
        self.coefs = tensor::apply_axis_map(&self.coefs, &sizes, self.stride(), axis, map);
        self.bases[axis] = basis;
    }

    /// Whether the parametrisation is left-handed, judged by the sign of the
    /// Jacobian determinant at the parameter midpoint.
    pub fn is_left_handed(&self) -> bool {
        let mid = std::array::from_fn(|a| 0.5 * (self.start_param(a) + self.end_param(a)));
        let [_, du, dv, dw] = self.derivs3(mid);
        triple_product(du, dv, dw) < 0.0
    }
}

impl BoundingBox for SplineVolume {
    type Bounds = Aabb3;

    fn bounding_box(&self) -> Aabb3 {
        Aabb3::from_points((0..self.total_coefs()).map(|i| self.control_point3(i)))
            .unwrap_or_else(|| Aabb3::new(DVec3::ZERO, DVec3::ZERO))
    }
}

fn to_point3(v: &[f64]) -> Point3 {
    let get = |k: usize| v.get(k).copied().unwrap_or(0.0);
    DVec3::new(get(0), get(1), get(2))
}

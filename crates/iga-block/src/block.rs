//! A single volumetric block: geometry, solution fields and face links.

use iga_core::{check_axis, IgaError, Result, Tolerance};
use iga_math::Point3;
use iga_spline::{BsplineBasis, Face, SplineSurface, SplineVolume};

use crate::analysis;
use crate::conditions::{BoundaryCondition, PointCondition};
use crate::solution::SolutionSpace;
use crate::types::{
    BlockId, DegeneracyRecord, DegenerateFace, Neighbour, PeriodicityRecord,
};

/// A trivariate spline block of an isogeometric model.
///
/// Owns its geometry and one [`SolutionSpace`] per declared field. Field
/// indices are fixed at construction; spaces are never added, removed or
/// reordered afterwards. Neighbour links are plain [`BlockId`]s and are not
/// kept reciprocal or cleared automatically.
#[derive(Debug, Clone)]
pub struct VolumeBlock {
    pub(crate) geometry: SplineVolume,
    index: usize,
    neighbours: [Option<Neighbour>; 6],
    pub(crate) solution_spaces: Vec<SolutionSpace>,
    tolerance: Tolerance,
}

impl VolumeBlock {
    /// Build a block over `geometry` with one zero field per entry of
    /// `field_dimensions`, each on the geometry's knot vectors.
    pub fn new(geometry: SplineVolume, field_dimensions: &[usize], index: usize) -> Result<Self> {
        if geometry.dimension() != 3 {
            return Err(IgaError::InvalidDimension(format!(
                "block geometry must live in 3D, got dimension {}",
                geometry.dimension()
            )));
        }
        let solution_spaces = field_dimensions
            .iter()
            .map(|&dim| SolutionSpace::from_geometry(&geometry, dim))
            .collect::<Result<Vec<_>>>()?;

        log::debug!(
            "block {}: {} coefficients, {} solution spaces",
            index,
            geometry.total_coefs(),
            solution_spaces.len()
        );

        Ok(Self {
            geometry,
            index,
            neighbours: [None; 6],
            solution_spaces,
            tolerance: Tolerance::default(),
        })
    }

    pub fn with_tolerance(mut self, tolerance: Tolerance) -> Self {
        self.tolerance = tolerance;
        self
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn tolerance(&self) -> Tolerance {
        self.tolerance
    }

    // --- Topology ---

    /// Link `face` to `block`, replacing any previous link on that face.
    ///
    /// Only this direction is recorded and the faces are not checked for
    /// coincidence; see [`VolumeModel::link`](crate::VolumeModel::link).
    pub fn add_neighbour(&mut self, face: Face, block: BlockId, orientation: i32) {
        self.neighbours[face.index()] = Some(Neighbour { block, orientation });
    }

    /// Drop the link on `face`, returning it.
    pub fn clear_neighbour(&mut self, face: Face) -> Option<Neighbour> {
        self.neighbours[face.index()].take()
    }

    pub fn neighbour_count(&self) -> usize {
        self.neighbours.iter().flatten().count()
    }

    pub fn neighbour(&self, face: Face) -> Option<&Neighbour> {
        self.neighbours[face.index()].as_ref()
    }

    /// Linked faces, in face order.
    pub fn neighbours(&self) -> impl Iterator<Item = (Face, &Neighbour)> {
        Face::ALL
            .iter()
            .zip(&self.neighbours)
            .filter_map(|(&face, n)| n.as_ref().map(|n| (face, n)))
    }

    /// Whether any face links to `other`. Does not look at `other`'s links.
    pub fn is_neighbour_of(&self, other: BlockId) -> bool {
        self.neighbours.iter().flatten().any(|n| n.block == other)
    }

    // --- Geometry ---

    pub fn volume(&self) -> &SplineVolume {
        &self.geometry
    }

    pub fn basis(&self, axis: usize) -> Result<&BsplineBasis> {
        Ok(self.geometry.basis(check_axis(axis)?))
    }

    pub fn coef_count(&self) -> usize {
        self.geometry.total_coefs()
    }

    pub fn boundary_surface(&self, face: Face) -> Result<SplineSurface> {
        self.geometry.boundary_surface(face)
    }

    /// Face parameters of the point on `face` closest to `position`.
    ///
    /// Fails with `PointNotOnBoundary` if that point is at least the gap
    /// tolerance away.
    pub fn param_on_face(&self, face: Face, position: Point3) -> Result<[f64; 2]> {
        let surface = self.boundary_surface(face)?;
        let gap = self.tolerance.gap;
        let (s, t, _, distance) = surface.closest_point(position, gap);
        if distance >= gap {
            return Err(IgaError::PointNotOnBoundary {
                distance,
                tolerance: gap,
            });
        }
        Ok([s, t])
    }

    /// Replace the boundary surface on `face` and adapt the solution spaces.
    pub fn update_geometry(&mut self, _boundary: &SplineSurface, face: Face) -> Result<()> {
        log::warn!("block {}: update_geometry({}) is not available", self.index, face);
        Err(IgaError::Unsupported(
            "updating block geometry from a new boundary surface".into(),
        ))
    }

    /// Fails with `UnsupportedConfiguration` for a left-handed geometry.
    pub fn check_handedness(&self) -> Result<()> {
        if self.geometry.is_left_handed() {
            return Err(IgaError::UnsupportedConfiguration(format!(
                "block {} has a left-handed parametrisation",
                self.index
            )));
        }
        Ok(())
    }

    // --- Degeneracy and periodicity ---

    pub fn detect_degenerate_faces(&self, tolerance: f64) -> DegeneracyRecord {
        analysis::degenerate_faces(&self.geometry, tolerance)
    }

    /// For every degenerate face, the geometry coefficients on the collapsed
    /// locus.
    pub fn degenerate_coefficient_enumeration(
        &self,
        tolerance: f64,
    ) -> Vec<(DegenerateFace, Vec<usize>)> {
        self.detect_degenerate_faces(tolerance)
            .faces
            .into_iter()
            .map(|d| {
                let indices = analysis::degenerate_coef_enumeration(
                    &self.geometry,
                    d.face,
                    d.kind,
                    tolerance,
                );
                (d, indices)
            })
            .collect()
    }

    /// Periodicity of all three parameter directions.
    pub fn detect_periodic_axes(&self, tolerance: f64) -> Result<PeriodicityRecord> {
        let mut per_axis = [-1; 3];
        for (axis, p) in per_axis.iter_mut().enumerate() {
            *p = analysis::analyze_periodicity(&self.geometry, axis, tolerance)?;
        }
        Ok(PeriodicityRecord { per_axis })
    }

    /// Coefficient identification across the seam of a periodic direction.
    ///
    /// `Ok(None)` if `axis` is not periodic within the gap tolerance.
    pub fn periodic_coefficient_pairing(&self, axis: usize) -> Result<Option<Vec<(usize, usize)>>> {
        check_axis(axis)?;
        if analysis::analyze_periodicity(&self.geometry, axis, self.tolerance.gap)? < 0 {
            return Ok(None);
        }
        analysis::periodic_enumeration(&self.geometry, axis).map(Some)
    }

    // --- Solution spaces ---

    pub fn solution_space_count(&self) -> usize {
        self.solution_spaces.len()
    }

    pub fn solution_space(&self, index: usize) -> Option<&SolutionSpace> {
        self.solution_spaces.get(index)
    }

    /// Mutable access for attaching conditions; refinement goes through the
    /// block so geometry and fields stay in step.
    pub fn solution_space_mut(&mut self, index: usize) -> Option<&mut SolutionSpace> {
        self.solution_spaces.get_mut(index)
    }

    pub fn solution_spaces(&self) -> &[SolutionSpace] {
        &self.solution_spaces
    }

    pub fn set_minimum_degree(&mut self, degree: usize, field: usize) -> Result<()> {
        let index = self.index;
        let space = self.solution_spaces.get_mut(field).ok_or_else(|| {
            IgaError::NotFound(format!("block {index} has no solution space {field}"))
        })?;
        space.set_minimum_degree(degree)
    }

    /// Rebuild a field's spline space from the geometry and its minimum degree.
    pub fn update_solution_space(&mut self, field: usize) -> Result<()> {
        log::warn!(
            "block {}: update_solution_space({}) is not available",
            self.index,
            field
        );
        Err(IgaError::Unsupported(
            "rebuilding a solution space from the geometry".into(),
        ))
    }

    /// Face conditions on `face` over all fields, in field order.
    pub fn face_boundary_conditions(&self, face: Face) -> Vec<&BoundaryCondition> {
        self.solution_spaces
            .iter()
            .flat_map(|s| s.face_boundary_conditions(face))
            .collect()
    }

    /// Point conditions on `face` over all fields, in field order.
    pub fn face_point_conditions(&self, face: Face) -> Vec<&PointCondition> {
        self.solution_spaces
            .iter()
            .flat_map(|s| s.face_point_conditions(face))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conditions::ConditionKind;
    use iga_math::dvec3;
    use slotmap::SlotMap;

    fn cube(offset: f64) -> SplineVolume {
        let b = BsplineBasis::bezier(1, 0.0, 1.0).unwrap();
        let points: Vec<_> = (0..8)
            .map(|c| {
                dvec3(
                    (c & 1) as f64 + offset,
                    ((c >> 1) & 1) as f64,
                    ((c >> 2) & 1) as f64,
                )
            })
            .collect();
        SplineVolume::from_points([b.clone(), b.clone(), b], &points).unwrap()
    }

    #[test]
    fn test_construction_builds_one_space_per_field() {
        let block = VolumeBlock::new(cube(0.0), &[1, 3], 4).unwrap();
        assert_eq!(block.index(), 4);
        assert_eq!(block.solution_space_count(), 2);
        assert_eq!(block.solution_space(0).unwrap().dimension(), 1);
        assert_eq!(block.solution_space(1).unwrap().dimension(), 3);
        assert!(block.solution_space(2).is_none());
        assert_eq!(block.coef_count(), 8);
        assert!(!block.solution_space(1).unwrap().space().rational());
    }

    #[test]
    fn test_invalid_field_dimension() {
        assert!(matches!(
            VolumeBlock::new(cube(0.0), &[2, 0], 0),
            Err(IgaError::InvalidDimension(_))
        ));
    }

    #[test]
    fn test_neighbour_table() {
        let mut ids: SlotMap<BlockId, ()> = SlotMap::with_key();
        let a = ids.insert(());
        let b = ids.insert(());
        let c = ids.insert(());

        let mut block = VolumeBlock::new(cube(0.0), &[1], 0).unwrap();
        assert_eq!(block.neighbour_count(), 0);
        block.add_neighbour(Face::UMax, a, 0);
        block.add_neighbour(Face::VMin, b, 5);
        assert_eq!(block.neighbour_count(), 2);
        assert!(block.is_neighbour_of(a));
        assert!(!block.is_neighbour_of(c));

        // Overwrite
        block.add_neighbour(Face::UMax, c, 1);
        assert_eq!(block.neighbour_count(), 2);
        assert!(!block.is_neighbour_of(a));
        assert_eq!(block.neighbour(Face::UMax).unwrap().orientation, 1);
        assert!(block.neighbour(Face::WMax).is_none());

        assert_eq!(block.clear_neighbour(Face::VMin).unwrap().block, b);
        assert_eq!(block.neighbours().count(), 1);
    }

    #[test]
    fn test_basis_rejects_bad_axis() {
        let block = VolumeBlock::new(cube(0.0), &[], 0).unwrap();
        assert!(block.basis(2).is_ok());
        assert!(matches!(block.basis(3), Err(IgaError::InvalidAxis(3))));
        assert!(matches!(
            block.periodic_coefficient_pairing(7),
            Err(IgaError::InvalidAxis(7))
        ));
    }

    #[test]
    fn test_param_on_face() {
        let block = VolumeBlock::new(cube(0.0), &[1], 0).unwrap();
        // u-max face is parametrised by (v, w)
        let st = block
            .param_on_face(Face::UMax, dvec3(1.0, 0.25, 0.75))
            .unwrap();
        assert!((st[0] - 0.25).abs() < 1e-9);
        assert!((st[1] - 0.75).abs() < 1e-9);

        let err = block
            .param_on_face(Face::UMax, dvec3(1.5, 0.25, 0.75))
            .unwrap_err();
        assert!(matches!(err, IgaError::PointNotOnBoundary { .. }));
    }

    #[test]
    fn test_unimplemented_updates_are_reported() {
        let mut block = VolumeBlock::new(cube(0.0), &[1], 0).unwrap();
        let surface = block.boundary_surface(Face::UMin).unwrap();
        assert!(matches!(
            block.update_geometry(&surface, Face::UMin),
            Err(IgaError::Unsupported(_))
        ));
        assert!(matches!(block.update_solution_space(0), Err(IgaError::Unsupported(_))));
    }

    #[test]
    fn test_condition_aggregation_over_fields() {
        let mut block = VolumeBlock::new(cube(0.0), &[1, 3], 0).unwrap();
        block
            .solution_space_mut(0)
            .unwrap()
            .add_boundary_condition(Face::WMin, ConditionKind::Zero, vec![0.0])
            .unwrap();
        block
            .solution_space_mut(1)
            .unwrap()
            .add_boundary_condition(Face::WMin, ConditionKind::Dirichlet, vec![1.0, 0.0, 0.0])
            .unwrap();
        block
            .solution_space_mut(1)
            .unwrap()
            .add_point_condition(Face::WMax, [0.5, 0.5], ConditionKind::Neumann, vec![0.0; 3])
            .unwrap();

        let on_wmin = block.face_boundary_conditions(Face::WMin);
        assert_eq!(on_wmin.len(), 2);
        assert_eq!(on_wmin[0].kind, ConditionKind::Zero);
        assert!(block.face_boundary_conditions(Face::WMax).is_empty());
        assert_eq!(block.face_point_conditions(Face::WMax).len(), 1);
    }

    #[test]
    fn test_minimum_degree_for_missing_field() {
        let mut block = VolumeBlock::new(cube(0.0), &[1], 0).unwrap();
        assert!(block.set_minimum_degree(2, 0).is_ok());
        assert_eq!(block.solution_space(0).unwrap().degree(0).unwrap(), 2);
        assert!(matches!(block.set_minimum_degree(2, 1), Err(IgaError::NotFound(_))));
    }

    #[test]
    fn test_left_handed_geometry_is_flagged() {
        let block = VolumeBlock::new(cube(0.0), &[1], 0).unwrap();
        assert!(block.check_handedness().is_ok());

        let b = BsplineBasis::bezier(1, 0.0, 1.0).unwrap();
        let points: Vec<_> = (0..8)
            .map(|c| dvec3(((c >> 1) & 1) as f64, (c & 1) as f64, ((c >> 2) & 1) as f64))
            .collect();
        let swapped = SplineVolume::from_points([b.clone(), b.clone(), b], &points).unwrap();
        let block = VolumeBlock::new(swapped, &[1], 1).unwrap();
        assert!(matches!(
            block.check_handedness(),
            Err(IgaError::UnsupportedConfiguration(_))
        ));
    }
}

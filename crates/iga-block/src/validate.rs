use iga_core::traits::{BoundingBox, Validate};
use iga_core::{IgaError, Result};

use crate::block::VolumeBlock;
use crate::model::VolumeModel;

impl Validate for VolumeBlock {
    /// Every solution space must contain each geometry knot with at least
    /// the geometry's multiplicity.
    fn validate(&self) -> Result<()> {
        for axis in 0..3 {
            let geometry = self.volume().basis(axis);
            for (field, space) in self.solution_spaces().iter().enumerate() {
                let basis = space.space().basis(axis);
                for k in geometry.knots_simple() {
                    let (have, need) = (basis.knot_multiplicity(k), geometry.knot_multiplicity(k));
                    if have < need {
                        return Err(IgaError::Geometry(format!(
                            "Block {} field {}: knot {} on direction {} has multiplicity {}, geometry has {}",
                            self.index(),
                            field,
                            k,
                            axis,
                            have,
                            need
                        )));
                    }
                }
            }
        }
        Ok(())
    }
}

impl Validate for VolumeModel {
    fn validate(&self) -> Result<()> {
        let tol = self.tolerance().neighbour;

        for (id, block) in &self.blocks {
            block.validate()?;
            block.check_handedness()?;

            for (face, link) in block.neighbours() {
                // 1. Link target must be alive
                let other = self.blocks.get(link.block).ok_or_else(|| {
                    IgaError::Topology(format!(
                        "Block {} face {} links to removed block {:?}",
                        block.index(),
                        face,
                        link.block
                    ))
                })?;

                // 2. Reciprocity
                if !other.is_neighbour_of(id) {
                    return Err(IgaError::Topology(format!(
                        "Block {} face {} links to block {}, which does not link back",
                        block.index(),
                        face,
                        other.index()
                    )));
                }

                // 3. Linked blocks must at least touch
                if !block
                    .volume()
                    .bounding_box()
                    .touches(&other.volume().bounding_box(), tol)
                {
                    return Err(IgaError::Topology(format!(
                        "Block {} face {} links to block {}, but their bounding boxes are apart",
                        block.index(),
                        face,
                        other.index()
                    )));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use iga_math::{dvec3, Point3};
    use iga_spline::{BsplineBasis, Face, SplineVolume};

    fn cube(offset: Point3) -> SplineVolume {
        let b = BsplineBasis::bezier(1, 0.0, 1.0).unwrap();
        let points: Vec<Point3> = (0..8)
            .map(|c| offset + dvec3((c & 1) as f64, ((c >> 1) & 1) as f64, ((c >> 2) & 1) as f64))
            .collect();
        SplineVolume::from_points([b.clone(), b.clone(), b], &points).unwrap()
    }

    #[test]
    fn test_linked_pair_is_valid() {
        let mut model = VolumeModel::default();
        let a = model.add_block(cube(Point3::ZERO), &[1, 3]).unwrap();
        let b = model.add_block(cube(dvec3(1.0, 0.0, 0.0)), &[1]).unwrap();
        model.stitch(a, Face::UMax, b).unwrap();
        model.validate().unwrap();
    }

    #[test]
    fn test_one_way_link_is_reported() {
        let mut model = VolumeModel::default();
        let a = model.add_block(cube(Point3::ZERO), &[1]).unwrap();
        let b = model.add_block(cube(dvec3(1.0, 0.0, 0.0)), &[1]).unwrap();
        model.block_mut(a).unwrap().add_neighbour(Face::UMax, b, 0);
        assert!(matches!(model.validate(), Err(IgaError::Topology(_))));
    }

    #[test]
    fn test_dangling_link_is_reported() {
        let mut model = VolumeModel::default();
        let a = model.add_block(cube(Point3::ZERO), &[1]).unwrap();
        let b = model.add_block(cube(dvec3(1.0, 0.0, 0.0)), &[1]).unwrap();
        model.link(a, Face::UMax, b, Face::UMin, 0).unwrap();
        model.remove_block(b);
        assert!(model.block(a).unwrap().is_neighbour_of(b));
        assert!(matches!(model.validate(), Err(IgaError::Topology(_))));
    }

    #[test]
    fn test_distant_link_is_reported() {
        let mut model = VolumeModel::default();
        let a = model.add_block(cube(Point3::ZERO), &[1]).unwrap();
        let b = model.add_block(cube(dvec3(4.0, 0.0, 0.0)), &[1]).unwrap();
        model.link(a, Face::UMax, b, Face::UMin, 0).unwrap();
        assert!(matches!(model.validate(), Err(IgaError::Topology(_))));
    }

    #[test]
    fn test_solution_space_behind_geometry_is_reported() {
        let mut block = VolumeBlock::new(cube(Point3::ZERO), &[1], 0).unwrap();
        block.geometry.insert_knots(0, &[0.5]).unwrap();
        assert!(matches!(block.validate(), Err(IgaError::Geometry(_))));
        block.solution_spaces[0].insert_knots(&[0.5], 0).unwrap();
        block.validate().unwrap();
    }
}

//! Identifying which face of a block an arbitrary surface lies on.

use iga_core::{IgaError, Result};
use iga_math::Vector3;
use iga_spline::{Face, Surface};

use crate::block::VolumeBlock;
use crate::types::FaceMatch;

/// Normals shorter than this are treated as undefined.
const MIN_NORMAL_LENGTH: f64 = 1e-12;

impl VolumeBlock {
    /// Match `surface` against the six faces of the geometry.
    ///
    /// A face matches when each of its four corners coincides (within
    /// `tolerance`) with some corner of the surface. The flip bit is set when
    /// the surface normal opposes the cross product of the face's in-plane
    /// partials. The normals are compared at the surface's `(min, min)`
    /// corner, or at the next corner counter-clockwise where that one is
    /// degenerate.
    pub fn face_orientation(&self, surface: &dyn Surface, tolerance: f64) -> Result<FaceMatch> {
        if self.geometry.is_left_handed() {
            log::warn!(
                "block {}: left-handed geometry, face orientation may be reversed",
                self.index()
            );
        }

        let tol2 = tolerance * tolerance;
        let surface_corners = surface.corner_points();
        let volume_corners = self.geometry.corner_points();

        // coincident[c][s]: volume corner c touches surface corner s
        let coincident: [[bool; 4]; 8] = std::array::from_fn(|c| {
            std::array::from_fn(|s| volume_corners[c].distance_squared(surface_corners[s].0) < tol2)
        });

        let face = Face::ALL.into_iter().find(|face| {
            face_corners(*face)
                .iter()
                .all(|&c| coincident[c].iter().any(|&hit| hit))
        });
        let Some(face) = face else {
            log::warn!(
                "block {}: surface does not coincide with any face (tolerance {})",
                self.index(),
                tolerance
            );
            return Err(IgaError::NoFaceMatch);
        };

        let [a, b] = face.surface_axes();
        let mut flipped = false;
        for (s, (_, [u, v])) in surface_corners.iter().enumerate() {
            let Some(&c) = face_corners(face).iter().find(|&&c| coincident[c][s]) else {
                continue;
            };
            let d = self.geometry.derivs3(self.geometry.corner_param(c));
            let face_normal: Vector3 = d[1 + a].cross(d[1 + b]);
            let surface_normal = surface.normal_at(*u, *v);
            if face_normal.length() < MIN_NORMAL_LENGTH
                || surface_normal.length() < MIN_NORMAL_LENGTH
            {
                continue;
            }
            flipped = match normals_opposed(face_normal, surface_normal, self.tolerance().kink) {
                Some(opposed) => opposed,
                None => {
                    log::warn!(
                        "block {}: surface normal is {:.3} rad off face {}",
                        self.index(),
                        face_normal.angle_between(surface_normal),
                        face
                    );
                    face_normal.dot(surface_normal) < 0.0
                }
            };
            break;
        }

        Ok(FaceMatch { face, flipped })
    }
}

/// `Some(false)` if the normals agree within `kink` radians, `Some(true)` if
/// they are opposed within `kink`, `None` otherwise.
fn normals_opposed(a: Vector3, b: Vector3, kink: f64) -> Option<bool> {
    let angle = a.angle_between(b);
    if angle <= kink {
        Some(false)
    } else if angle >= std::f64::consts::PI - kink {
        Some(true)
    } else {
        None
    }
}

/// Volume corner numbers (see `SplineVolume::corner_param`) on `face`.
fn face_corners(face: Face) -> [usize; 4] {
    let axis = face.axis();
    let fixed = if face.is_max() { 1 << axis } else { 0 };
    let [a, b] = face.surface_axes();
    [0, 1 << a, 1 << b, (1 << a) | (1 << b)].map(|c| c | fixed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use iga_math::{dvec3, Point3};
    use iga_spline::{BsplineBasis, SplineSurface, SplineVolume};

    fn linear() -> BsplineBasis {
        BsplineBasis::bezier(1, 0.0, 1.0).unwrap()
    }

    fn unit_cube() -> VolumeBlock {
        let points: Vec<Point3> = (0..8)
            .map(|c| dvec3((c & 1) as f64, ((c >> 1) & 1) as f64, ((c >> 2) & 1) as f64))
            .collect();
        let geom = SplineVolume::from_points([linear(), linear(), linear()], &points).unwrap();
        VolumeBlock::new(geom, &[1], 0).unwrap()
    }

    fn bilinear(corners: [Point3; 4]) -> SplineSurface {
        let coefs = corners.iter().flat_map(|p| p.to_array()).collect();
        SplineSurface::new([linear(), linear()], 3, false, coefs).unwrap()
    }

    #[test]
    fn test_face_corners() {
        assert_eq!(face_corners(Face::UMin), [0, 2, 4, 6]);
        assert_eq!(face_corners(Face::UMax), [1, 3, 5, 7]);
        assert_eq!(face_corners(Face::VMax), [2, 6, 3, 7]);
        assert_eq!(face_corners(Face::WMin), [0, 1, 2, 3]);
    }

    #[test]
    fn test_normals_opposed_within_kink() {
        let n = dvec3(0.0, 0.0, 1.0);
        assert_eq!(normals_opposed(n, dvec3(0.001, 0.0, 1.0), 1e-2), Some(false));
        assert_eq!(normals_opposed(n, dvec3(0.0, 0.001, -1.0), 1e-2), Some(true));
        assert_eq!(normals_opposed(n, dvec3(1.0, 0.0, 1.0), 1e-2), None);
    }

    #[test]
    fn test_own_faces_match_unflipped() {
        let block = unit_cube();
        for face in Face::ALL {
            let surface = block.boundary_surface(face).unwrap();
            let m = block.face_orientation(&surface, 1e-8).unwrap();
            assert_eq!(m, FaceMatch { face, flipped: false });
            assert_eq!(m.code(), face.index() as i32 * 2);
        }
    }

    #[test]
    fn test_reversed_parametrisation_is_flipped() {
        let block = unit_cube();
        // x = 0 plane with s along z and t along y
        let surface = bilinear([
            dvec3(0.0, 0.0, 0.0),
            dvec3(0.0, 0.0, 1.0),
            dvec3(0.0, 1.0, 0.0),
            dvec3(0.0, 1.0, 1.0),
        ]);
        let m = block.face_orientation(&surface, 1e-8).unwrap();
        assert_eq!(m.face, Face::UMin);
        assert!(m.flipped);
        assert_eq!(m.code(), 1);
    }

    #[test]
    fn test_flip_read_past_collapsed_corner() {
        // u-min edge of the block collapsed onto the w axis
        let points: Vec<Point3> = (0..8)
            .map(|c| {
                let (i, j, k) = ((c & 1) as f64, ((c >> 1) & 1) as f64, ((c >> 2) & 1) as f64);
                dvec3(i, i * j, k)
            })
            .collect();
        let geom = SplineVolume::from_points([linear(), linear(), linear()], &points).unwrap();
        let block = VolumeBlock::new(geom, &[1], 0).unwrap();

        let own = block.boundary_surface(Face::WMin).unwrap();
        assert_eq!(own.normal_at(0.0, 0.0), Vector3::ZERO);
        let m = block.face_orientation(&own, 1e-8).unwrap();
        assert_eq!(m, FaceMatch { face: Face::WMin, flipped: false });

        // Same face with s and t swapped
        let swapped = bilinear([
            dvec3(0.0, 0.0, 0.0),
            dvec3(0.0, 0.0, 0.0),
            dvec3(1.0, 0.0, 0.0),
            dvec3(1.0, 1.0, 0.0),
        ]);
        let m = block.face_orientation(&swapped, 1e-8).unwrap();
        assert_eq!(m, FaceMatch { face: Face::WMin, flipped: true });
    }

    #[test]
    fn test_distant_surface_has_no_match() {
        let block = unit_cube();
        let surface = bilinear([
            dvec3(5.0, 0.0, 0.0),
            dvec3(6.0, 0.0, 0.0),
            dvec3(5.0, 1.0, 0.0),
            dvec3(6.0, 1.0, 0.0),
        ]);
        assert!(matches!(
            block.face_orientation(&surface, 1e-8),
            Err(IgaError::NoFaceMatch)
        ));
    }
}

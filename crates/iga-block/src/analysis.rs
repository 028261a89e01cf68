//! Degeneracy and periodicity analysis of a spline volume's control net.
//!
//! All tests work on coefficients: by the convex hull property a boundary
//! curve whose control points coincide is itself a point, and two faces with
//! coinciding coefficients are the same surface.

use iga_core::{check_axis, Result};
use iga_math::Point3;
use iga_spline::{Face, SplineVolume};

use crate::types::{DegeneracyRecord, DegeneracyType, DegenerateFace};

/// Control net of one face as a `na x nb` grid, first direction fastest.
struct FaceNet {
    indices: Vec<usize>,
    points: Vec<Point3>,
    na: usize,
    nb: usize,
}

impl FaceNet {
    fn new(vol: &SplineVolume, face: Face) -> Self {
        let [a, b] = face.surface_axes();
        let indices = vol.face_coef_indices(face);
        let points = indices.iter().map(|&i| vol.control_point3(i)).collect();
        Self {
            indices,
            points,
            na: vol.num_coefs(a),
            nb: vol.num_coefs(b),
        }
    }

    fn at(&self, p: usize, q: usize) -> usize {
        q * self.na + p
    }

    /// Positions of the four boundary curves: t-min, s-max, t-max, s-min.
    fn boundary_curves(&self) -> [Vec<usize>; 4] {
        [
            (0..self.na).map(|p| self.at(p, 0)).collect(),
            (0..self.nb).map(|q| self.at(self.na - 1, q)).collect(),
            (0..self.na).map(|p| self.at(p, self.nb - 1)).collect(),
            (0..self.nb).map(|q| self.at(0, q)).collect(),
        ]
    }

    fn collapsed(&self, positions: &[usize], tol2: f64) -> bool {
        let first = self.points[positions[0]];
        positions
            .iter()
            .all(|&k| self.points[k].distance_squared(first) < tol2)
    }

    fn classify(&self, tol: f64) -> Option<DegeneracyType> {
        let tol2 = tol * tol;
        let all: Vec<usize> = (0..self.points.len()).collect();
        if self.collapsed(&all, tol2) {
            return Some(DegeneracyType::Point);
        }

        let rows_collapse = (0..self.nb).all(|q| {
            let row: Vec<usize> = (0..self.na).map(|p| self.at(p, q)).collect();
            self.collapsed(&row, tol2)
        });
        let columns_collapse = (0..self.na).all(|p| {
            let column: Vec<usize> = (0..self.nb).map(|q| self.at(p, q)).collect();
            self.collapsed(&column, tol2)
        });
        if rows_collapse || columns_collapse {
            return Some(DegeneracyType::Line);
        }

        if self
            .boundary_curves()
            .iter()
            .any(|curve| self.collapsed(curve, tol2))
        {
            return Some(DegeneracyType::Edge);
        }
        None
    }
}

/// Degeneracy type of one face, `None` for a regular face.
pub fn face_degeneracy(vol: &SplineVolume, face: Face, tol: f64) -> Option<DegeneracyType> {
    FaceNet::new(vol, face).classify(tol)
}

/// Classify all six faces.
pub fn degenerate_faces(vol: &SplineVolume, tol: f64) -> DegeneracyRecord {
    let faces = Face::ALL
        .iter()
        .filter_map(|&face| {
            face_degeneracy(vol, face, tol).map(|kind| DegenerateFace { face, kind })
        })
        .collect();
    DegeneracyRecord { faces }
}

/// Volume coefficient indices lying on the collapsed part of a degenerate face.
///
/// For [`DegeneracyType::Edge`] these are the coefficients of the collapsed
/// boundary curves (each index once, in curve order); for a face collapsing
/// to a line or a point every face coefficient is returned.
pub fn degenerate_coef_enumeration(
    vol: &SplineVolume,
    face: Face,
    kind: DegeneracyType,
    tol: f64,
) -> Vec<usize> {
    let net = FaceNet::new(vol, face);
    match kind {
        DegeneracyType::Line | DegeneracyType::Point => net.indices,
        DegeneracyType::Edge => {
            let tol2 = tol * tol;
            let mut out: Vec<usize> = Vec::new();
            for curve in net.boundary_curves() {
                if !net.collapsed(&curve, tol2) {
                    continue;
                }
                for k in curve {
                    let idx = net.indices[k];
                    if !out.contains(&idx) {
                        out.push(idx);
                    }
                }
            }
            out
        }
    }
}

fn coefs_close(a: &[f64], b: &[f64], tol: f64) -> bool {
    let scale = a
        .iter()
        .chain(b)
        .fold(1.0_f64, |m, x| m.max(x.abs()));
    a.iter().zip(b).all(|(x, y)| (x - y).abs() < tol * scale)
}

/// k-th derivative coefficients at both ends of one coefficient line.
fn end_derivatives(knots: &[f64], degree: usize, line: &[Vec<f64>], k: usize) -> (Vec<f64>, Vec<f64>) {
    let mut current = line.to_vec();
    for j in 1..=k {
        let mut next = Vec::with_capacity(current.len() - 1);
        for i in 0..current.len() - 1 {
            let denom = knots[i + degree + 1] - knots[i + j];
            let factor = if denom > 0.0 {
                (degree - j + 1) as f64 / denom
            } else {
                0.0
            };
            next.push(
                current[i + 1]
                    .iter()
                    .zip(&current[i])
                    .map(|(b, a)| factor * (b - a))
                    .collect(),
            );
        }
        current = next;
    }
    let last = current.len() - 1;
    (current[0].clone(), current[last].clone())
}

/// Periodicity of direction `axis`.
///
/// Returns `-1` unless the coefficients of the two faces bounding `axis`
/// coincide pairwise (homogeneous coordinates, weights included). Otherwise
/// returns the highest `k < degree` such that the first `k` derivatives
/// across the seam agree as well.
pub fn analyze_periodicity(vol: &SplineVolume, axis: usize, tol: f64) -> Result<i32> {
    check_axis(axis)?;
    let (face_min, face_max) = Face::pair(axis)?;
    let stride = vol.stride();
    let coef = |idx: usize| &vol.coefs()[idx * stride..(idx + 1) * stride];

    let min_indices = vol.face_coef_indices(face_min);
    let max_indices = vol.face_coef_indices(face_max);
    if !min_indices
        .iter()
        .zip(&max_indices)
        .all(|(&a, &b)| coefs_close(coef(a), coef(b), tol))
    {
        return Ok(-1);
    }

    let basis = vol.basis(axis);
    let degree = basis.degree();
    let n = basis.num_coefs();
    let lines: Vec<Vec<Vec<f64>>> = min_indices
        .iter()
        .map(|&idx| {
            let pos = vol.coef_position(idx);
            (0..n)
                .map(|r| {
                    let mut p = pos;
                    p[axis] = r;
                    coef(vol.coef_index(p[0], p[1], p[2])).to_vec()
                })
                .collect()
        })
        .collect();

    let mut continuity = 0;
    for k in 1..degree {
        if n <= k {
            break;
        }
        let smooth = lines.iter().all(|line| {
            let (start, end) = end_derivatives(basis.knots(), degree, line, k);
            coefs_close(&start, &end, tol)
        });
        if !smooth {
            break;
        }
        continuity = k as i32;
    }
    Ok(continuity)
}

/// Pair up the coefficients of the two faces bounding `axis`.
///
/// Pair `i` holds the `i`-th coefficient of the min face and the `i`-th of
/// the max face, both in face order.
pub fn periodic_enumeration(vol: &SplineVolume, axis: usize) -> Result<Vec<(usize, usize)>> {
    let (face_min, face_max) = Face::pair(axis)?;
    Ok(vol
        .face_coef_indices(face_min)
        .into_iter()
        .zip(vol.face_coef_indices(face_max))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use iga_math::dvec3;
    use iga_spline::BsplineBasis;

    fn linear() -> BsplineBasis {
        BsplineBasis::bezier(1, 0.0, 1.0).unwrap()
    }

    /// Unit cube with the u-max face's v-max edge pulled onto its v-min edge.
    fn wedge() -> SplineVolume {
        let points: Vec<Point3> = (0..8)
            .map(|c| {
                let (i, j, k) = (c & 1, (c >> 1) & 1, (c >> 2) & 1);
                let y = if i == 1 { 0.0 } else { j as f64 };
                dvec3(i as f64, y, k as f64)
            })
            .collect();
        SplineVolume::from_points([linear(), linear(), linear()], &points).unwrap()
    }

    #[test]
    fn test_cube_has_no_degenerate_faces() {
        let points: Vec<Point3> = (0..8)
            .map(|c| dvec3((c & 1) as f64, ((c >> 1) & 1) as f64, ((c >> 2) & 1) as f64))
            .collect();
        let vol = SplineVolume::from_points([linear(), linear(), linear()], &points).unwrap();
        assert!(!degenerate_faces(&vol, 1e-9).is_degenerate());
    }

    #[test]
    fn test_wedge_face_collapses_to_line() {
        let vol = wedge();
        let record = degenerate_faces(&vol, 1e-9);
        assert_eq!(record.kind(Face::UMax), Some(DegeneracyType::Line));
        let all = degenerate_coef_enumeration(&vol, Face::UMax, DegeneracyType::Line, 1e-9);
        assert_eq!(all, vec![1, 3, 5, 7]);
    }

    #[test]
    fn test_wedge_side_faces_have_collapsed_edges() {
        let vol = wedge();
        // w-min face: the u-max boundary curve (coefs 1 and 3) collapses
        assert_eq!(face_degeneracy(&vol, Face::WMin, 1e-9), Some(DegeneracyType::Edge));
        let enumeration = degenerate_coef_enumeration(&vol, Face::WMin, DegeneracyType::Edge, 1e-9);
        assert_eq!(enumeration, vec![1, 3]);
    }

    #[test]
    fn test_non_periodic_cube() {
        let points: Vec<Point3> = (0..8)
            .map(|c| dvec3((c & 1) as f64, ((c >> 1) & 1) as f64, ((c >> 2) & 1) as f64))
            .collect();
        let vol = SplineVolume::from_points([linear(), linear(), linear()], &points).unwrap();
        for axis in 0..3 {
            assert_eq!(analyze_periodicity(&vol, axis, 1e-9).unwrap(), -1);
        }
        assert!(analyze_periodicity(&vol, 3, 1e-9).is_err());
    }

    #[test]
    fn test_pairing_uses_fixed_face_pairs() {
        let points = vec![dvec3(0.0, 0.0, 0.0); 8];
        let vol = SplineVolume::from_points([linear(), linear(), linear()], &points).unwrap();
        assert_eq!(periodic_enumeration(&vol, 2).unwrap(), vec![(0, 4), (1, 5), (2, 6), (3, 7)]);
        assert_eq!(periodic_enumeration(&vol, 1).unwrap(), vec![(0, 2), (4, 6), (1, 3), (5, 7)]);
    }
}

use iga_core::{IgaError, Result};
use iga_spline::Face;
use serde::{Deserialize, Serialize};
use slotmap::new_key_type;

// --- SlotMap key types ---

new_key_type! {
    pub struct BlockId;
}

// --- Topology records ---

/// Non-owning link from one block face to the adjacent block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Neighbour {
    pub block: BlockId,
    /// How the two faces' (s, t) parametrisations relate, see [`FaceMatch::code`].
    pub orientation: i32,
}

/// Result of matching a surface against the six faces of a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FaceMatch {
    pub face: Face,
    /// Surface normal opposes the block's face normal.
    pub flipped: bool,
}

impl FaceMatch {
    /// `axis * 4 + max * 2 + flip`.
    pub fn code(self) -> i32 {
        (self.face.axis() * 4 + self.face.is_max() as usize * 2 + self.flipped as usize) as i32
    }

    pub fn from_code(code: i32) -> Result<Self> {
        if !(0..12).contains(&code) {
            return Err(IgaError::Topology(format!("Invalid orientation code {code}")));
        }
        let code = code as usize;
        Ok(Self {
            face: Face::new(code / 4, code & 2 != 0)?,
            flipped: code & 1 != 0,
        })
    }
}

// --- Degeneracy ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DegeneracyType {
    /// At least one boundary curve of the face collapses to a point.
    Edge = 1,
    /// The whole face collapses to a curve.
    Line = 2,
    /// The whole face collapses to a point.
    Point = 3,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DegenerateFace {
    pub face: Face,
    pub kind: DegeneracyType,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DegeneracyRecord {
    pub faces: Vec<DegenerateFace>,
}

impl DegeneracyRecord {
    pub fn is_degenerate(&self) -> bool {
        !self.faces.is_empty()
    }

    pub fn kind(&self, face: Face) -> Option<DegeneracyType> {
        self.faces.iter().find(|d| d.face == face).map(|d| d.kind)
    }
}

// --- Periodicity ---

/// Per-direction periodicity: `-1` when not periodic, otherwise the order of
/// continuity across the seam (0 = the boundary coefficients coincide).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodicityRecord {
    pub per_axis: [i32; 3],
}

impl PeriodicityRecord {
    pub fn is_periodic(&self, axis: usize) -> bool {
        self.per_axis.get(axis).is_some_and(|&p| p >= 0)
    }

    pub fn any(&self) -> bool {
        self.per_axis.iter().any(|&p| p >= 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_face_match_code_round_trip() {
        for code in 0..12 {
            let m = FaceMatch::from_code(code).unwrap();
            assert_eq!(m.code(), code);
            assert_eq!(m.face.index(), code as usize / 2);
        }
        assert!(FaceMatch::from_code(12).is_err());
        assert!(FaceMatch::from_code(-1).is_err());
    }

    #[test]
    fn test_periodicity_record() {
        let rec = PeriodicityRecord {
            per_axis: [-1, 0, -1],
        };
        assert!(rec.any());
        assert!(!rec.is_periodic(0));
        assert!(rec.is_periodic(1));
        assert!(!rec.is_periodic(7));
    }
}

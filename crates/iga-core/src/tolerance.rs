/// Tolerances shared by every block of an isogeometric model.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Tolerance {
    /// Geometric coincidence (in model units), used for projections and pairing
    pub gap: f64,
    /// Distance below which two block faces count as the same face
    pub neighbour: f64,
    /// Angle (radians) below which two normals are considered parallel
    pub kink: f64,
}

impl Tolerance {
    pub const DEFAULT_GAP: f64 = 1e-6;
    pub const DEFAULT_NEIGHBOUR: f64 = 1e-4;
    pub const DEFAULT_KINK: f64 = 1e-2;

    pub fn new(gap: f64, neighbour: f64, kink: f64) -> Self {
        Self {
            gap,
            neighbour,
            kink,
        }
    }

    pub fn default_precision() -> Self {
        Self {
            gap: Self::DEFAULT_GAP,
            neighbour: Self::DEFAULT_NEIGHBOUR,
            kink: Self::DEFAULT_KINK,
        }
    }

    pub fn loose() -> Self {
        Self {
            gap: 1e-3,
            neighbour: 1e-2,
            kink: 5e-2,
        }
    }

    pub fn tight() -> Self {
        Self {
            gap: 1e-9,
            neighbour: 1e-7,
            kink: 1e-4,
        }
    }
}

impl Default for Tolerance {
    fn default() -> Self {
        Self::default_precision()
    }
}

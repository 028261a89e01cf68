use iga_core::{IgaError, Result};
use serde::{Deserialize, Serialize};

/// One of the six boundary faces of a trivariate volume.
///
/// The numbering is fixed: 0/1 = min/max of the first parameter direction,
/// 2/3 = second direction, 4/5 = third direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Face {
    UMin = 0,
    UMax = 1,
    VMin = 2,
    VMax = 3,
    WMin = 4,
    WMax = 5,
}

impl Face {
    pub const ALL: [Face; 6] = [
        Face::UMin,
        Face::UMax,
        Face::VMin,
        Face::VMax,
        Face::WMin,
        Face::WMax,
    ];

    pub fn from_index(index: usize) -> Result<Self> {
        Self::ALL
            .get(index)
            .copied()
            .ok_or(IgaError::InvalidFace(index))
    }

    pub fn new(axis: usize, at_max: bool) -> Result<Self> {
        if axis > 2 {
            return Err(IgaError::InvalidAxis(axis));
        }
        Self::from_index(2 * axis + at_max as usize)
    }

    pub fn index(self) -> usize {
        self as usize
    }

    /// Parameter direction held constant on this face.
    pub fn axis(self) -> usize {
        self.index() / 2
    }

    pub fn is_max(self) -> bool {
        self.index() % 2 == 1
    }

    pub fn opposite(self) -> Self {
        Self::ALL[self.index() ^ 1]
    }

    /// The (min, max) face pair bounding `axis`.
    pub fn pair(axis: usize) -> Result<(Self, Self)> {
        Ok((Self::new(axis, false)?, Self::new(axis, true)?))
    }

    /// Volume parameter directions running along the face's (s, t) parameters.
    ///
    /// The pairing is cyclic, (v, w) / (w, u) / (u, v), so that `ds x dt`
    /// points along the increasing constant direction.
    pub fn surface_axes(self) -> [usize; 2] {
        match self.axis() {
            0 => [1, 2],
            1 => [2, 0],
            _ => [0, 1],
        }
    }
}

impl std::fmt::Display for Face {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Face::UMin => "u-min",
            Face::UMax => "u-max",
            Face::VMin => "v-min",
            Face::VMax => "v-max",
            Face::WMin => "w-min",
            Face::WMax => "w-max",
        };
        write!(f, "{name}")
    }
}

use crate::{Point3, Vector3};
use serde::{Deserialize, Serialize};

/// Axis-aligned box around a set of control points.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb3 {
    pub min: Point3,
    pub max: Point3,
}

impl Aabb3 {
    pub fn new(min: Point3, max: Point3) -> Self {
        Self { min, max }
    }

    pub fn from_points<I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = Point3>,
    {
        let mut iter = points.into_iter();
        let first = iter.next()?;
        Some(iter.fold(Self::new(first, first), |acc, p| Self {
            min: acc.min.min(p),
            max: acc.max.max(p),
        }))
    }

    pub fn diagonal(&self) -> Vector3 {
        self.max - self.min
    }

    /// Grow the box by `amount` on every side.
    pub fn expand(&self, amount: f64) -> Self {
        let offset = Vector3::splat(amount);
        Self {
            min: self.min - offset,
            max: self.max + offset,
        }
    }

    /// Whether the two boxes overlap or are separated by at most `tol`.
    pub fn touches(&self, other: &Self, tol: f64) -> bool {
        let a = self.expand(tol);
        a.min.x <= other.max.x
            && a.max.x >= other.min.x
            && a.min.y <= other.max.y
            && a.max.y >= other.min.y
            && a.min.z <= other.max.z
            && a.max.z >= other.min.z
    }
}

use strum::{FromRepr, VariantArray};

use crate::location::Point;

/// A unit step on the square lattice.
///
/// The discriminants double as the 2-bit direction codes of the share codec.
#[derive(Copy, Clone, Debug, Eq, FromRepr, Hash, Ord, PartialEq, PartialOrd, VariantArray)]
#[repr(u8)]
pub enum Direction {
    Up = 0,
    Right = 1,
    Down = 2,
    Left = 3,
}

impl Direction {
    /// Attempt the step from `point` and return the resultant [`Point`], which may lie off the lattice.
    pub fn attempt_from(&self, point: Point) -> Point {
        match self {
            Self::Up => point.offset_by((0, -1)),
            Self::Down => point.offset_by((0, 1)),
            Self::Left => point.offset_by((-1, 0)),
            Self::Right => point.offset_by((1, 0)),
        }
    }

    /// Determine the direction from `a` to `b`, or [`None`] unless they are lattice neighbors.
    pub fn direction_to(a: Point, b: Point) -> Option<Self> {
        Self::VARIANTS.iter().find(|dir| dir.attempt_from(a) == b).copied()
    }

    /// All in-bounds lattice neighbors of `point` on a lattice `cols` by `rows` cells large.
    pub(crate) fn neighbors_of(point: Point, cols: usize, rows: usize) -> impl Iterator<Item = (Self, Point)> {
        Self::VARIANTS.iter()
            .map(move |dir| (*dir, dir.attempt_from(point)))
            .filter(move |(_, p)| p.x <= cols && p.y <= rows)
    }
}

use std::fmt::{Display, Formatter};
use std::num::NonZero;

use serde::{Deserialize, Serialize};
use unordered_pair::UnorderedPair;

pub(crate) type Coord = usize;
/// A grid dimension, in cells. Grids are never empty.
pub type Dimension = NonZero<Coord>;

/// A lattice point `(x, y)`. The top left node is `Point { x: 0, y: 0 }`.
///
/// Cells are addressed with the same type: cell `(x, y)` is the cell whose top left corner is node `(x, y)`.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct Point {
    /// Column of the node, or of the cell.
    pub x: Coord,
    /// Row of the node, or of the cell.
    pub y: Coord,
}

impl Point {
    /// Shorthand for `Point { x, y }`.
    pub const fn new(x: Coord, y: Coord) -> Self {
        Self { x, y }
    }

    /// Index into a row-major [`ndarray::Array2`], i.e. `(row, col)`.
    pub(crate) fn as_index(&self) -> (Coord, Coord) {
        (self.y, self.x)
    }

    // out of bounds offsets wrap around to huge coordinates and fail any bounds check
    pub(crate) fn offset_by(self, rhs: (isize, isize)) -> Self {
        Self::new(self.x.wrapping_add_signed(rhs.0), self.y.wrapping_add_signed(rhs.1))
    }

    pub(crate) fn manhattan(&self, other: &Point) -> usize {
        self.x.abs_diff(other.x) + self.y.abs_diff(other.y)
    }
}

impl From<(Coord, Coord)> for Point {
    fn from(value: (Coord, Coord)) -> Self {
        // ndarray indices come in (row, col)
        Self::new(value.1, value.0)
    }
}

impl Display for Point {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Identifies one edge of the lattice.
///
/// Horizontal edge `(row, col)` joins nodes `(col, row)` and `(col + 1, row)`.
/// Vertical edge `(row, col)` joins nodes `(col, row)` and `(col, row + 1)`.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "orientation")]
pub enum EdgeId {
    /// Joins nodes `(col, row)` and `(col + 1, row)`.
    Horizontal { row: Coord, col: Coord },
    /// Joins nodes `(col, row)` and `(col, row + 1)`.
    Vertical { row: Coord, col: Coord },
}

impl EdgeId {
    /// The edge joining two lattice-adjacent points, or [`None`] if they are not adjacent.
    pub fn between(a: Point, b: Point) -> Option<Self> {
        if a.manhattan(&b) != 1 {
            return None;
        }

        let (lo, hi) = if a < b { (a, b) } else { (b, a) };
        Some(if lo.y == hi.y {
            Self::Horizontal { row: lo.y, col: lo.x.min(hi.x) }
        } else {
            Self::Vertical { row: lo.y.min(hi.y), col: lo.x }
        })
    }

    /// Both endpoints, lower indexed first.
    pub fn endpoints(&self) -> (Point, Point) {
        match *self {
            Self::Horizontal { row, col } => (Point::new(col, row), Point::new(col + 1, row)),
            Self::Vertical { row, col } => (Point::new(col, row), Point::new(col, row + 1)),
        }
    }
}

impl TryFrom<UnorderedPair<Point>> for EdgeId {
    type Error = UnorderedPair<Point>;

    fn try_from(value: UnorderedPair<Point>) -> Result<Self, Self::Error> {
        Self::between(value.0, value.1).ok_or(value)
    }
}

impl From<EdgeId> for UnorderedPair<Point> {
    fn from(value: EdgeId) -> Self {
        UnorderedPair::from(value.endpoints())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn edge_between_is_order_independent() {
        let a = Point::new(2, 1);
        let b = Point::new(3, 1);
        assert_eq!(EdgeId::between(a, b), Some(EdgeId::Horizontal { row: 1, col: 2 }));
        assert_eq!(EdgeId::between(b, a), Some(EdgeId::Horizontal { row: 1, col: 2 }));
        assert_eq!(EdgeId::between(Point::new(0, 4), Point::new(0, 3)), Some(EdgeId::Vertical { row: 3, col: 0 }));
        assert_eq!(EdgeId::between(a, Point::new(3, 2)), None);
    }

    #[test]
    fn endpoints_round_trip() {
        let edge = EdgeId::Vertical { row: 0, col: 5 };
        let (a, b) = edge.endpoints();
        assert_eq!(EdgeId::between(b, a), Some(edge));
    }
}

use serde::{Deserialize, Serialize};
use strum::{Display, FromRepr, VariantArray};

use crate::location::{EdgeId, Point};

/// The symmetry mode of a puzzle. Discriminants are the 2-bit codec values.
///
/// Under any mode but [`None`](Self::None) every path drawn implies a mirrored companion path.
#[derive(Clone, Copy, Debug, Default, Display, Eq, FromRepr, Hash, PartialEq, VariantArray, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[repr(u8)]
pub enum SymmetryType {
    #[default]
    None = 0,
    /// Mirror left to right, `x -> cols - x`.
    Horizontal = 1,
    /// Mirror top to bottom, `y -> rows - y`.
    Vertical = 2,
    /// Half turn about the center.
    Rotational = 3,
}

impl SymmetryType {
    /// Whether a companion path exists.
    pub fn is_symmetric(&self) -> bool {
        *self != Self::None
    }

    /// Reflect a lattice point on a lattice `cols` by `rows` cells large. Identity for [`None`](Self::None).
    pub fn reflect(&self, point: Point, cols: usize, rows: usize) -> Point {
        match self {
            Self::None => point,
            Self::Horizontal => Point::new(cols - point.x, point.y),
            Self::Vertical => Point::new(point.x, rows - point.y),
            Self::Rotational => Point::new(cols - point.x, rows - point.y),
        }
    }

    /// Reflect an edge by reflecting both endpoints.
    pub fn reflect_edge(&self, edge: EdgeId, cols: usize, rows: usize) -> EdgeId {
        let (a, b) = edge.endpoints();
        // reflection keeps adjacency, so this always succeeds
        EdgeId::between(self.reflect(a, cols, rows), self.reflect(b, cols, rows)).unwrap_or(edge)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reflections_are_involutions() {
        let p = Point::new(1, 3);
        for symmetry in SymmetryType::VARIANTS {
            assert_eq!(symmetry.reflect(symmetry.reflect(p, 4, 5), 4, 5), p);
        }
        assert_eq!(SymmetryType::Rotational.reflect(p, 4, 5), Point::new(3, 2));
    }

    #[test]
    fn center_edge_is_its_own_mirror() {
        // on a 2 wide lattice the vertical edges in column 1 map onto themselves
        let edge = EdgeId::Vertical { row: 0, col: 1 };
        assert_eq!(SymmetryType::Horizontal.reflect_edge(edge, 2, 2), edge);
        assert_ne!(SymmetryType::Vertical.reflect_edge(edge, 2, 2), edge);
    }
}

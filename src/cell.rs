use serde::{Deserialize, Serialize};
use strum::{Display, FromRepr, VariantArray};

use crate::polyomino::Polyomino;

/// The symbol occupying a cell. Discriminants are the 4-bit codec values.
#[derive(Clone, Copy, Debug, Default, Display, Eq, FromRepr, Hash, Ord, PartialEq, PartialOrd, VariantArray, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[repr(u8)]
pub enum CellKind {
    #[default]
    /// An empty cell.
    None = 0,
    /// All squares in a region share one color.
    Square = 1,
    /// Each star color appears on exactly two symbols of its region.
    Star = 2,
    /// A fixed-orientation piece the region must be tiled with.
    Tetromino = 3,
    /// A piece that may be rotated when tiling.
    TetrominoRotatable = 4,
    /// A fixed-orientation piece subtracted from the tiling.
    TetrominoNegative = 5,
    /// A subtracted piece that may be rotated.
    TetrominoNegativeRotatable = 6,
    /// Cancels one violation in its region, or another eraser.
    Eraser = 7,
    /// The cell has exactly `count` traversed edges.
    Triangle = 8,
}

impl CellKind {
    /// Any of the four tetromino kinds.
    pub fn is_tetromino(&self) -> bool {
        matches!(self, Self::Tetromino | Self::TetrominoRotatable | Self::TetrominoNegative | Self::TetrominoNegativeRotatable)
    }

    /// A subtracted tetromino kind.
    pub fn is_negative(&self) -> bool {
        matches!(self, Self::TetrominoNegative | Self::TetrominoNegativeRotatable)
    }

    /// A tetromino kind that may be rotated.
    pub fn is_rotatable(&self) -> bool {
        matches!(self, Self::TetrominoRotatable | Self::TetrominoNegativeRotatable)
    }

    /// The tetromino kind for the given rotation and sign flags.
    pub fn tetromino(rotatable: bool, negative: bool) -> Self {
        match (rotatable, negative) {
            (false, false) => Self::Tetromino,
            (true, false) => Self::TetrominoRotatable,
            (false, true) => Self::TetrominoNegative,
            (true, true) => Self::TetrominoNegativeRotatable,
        }
    }
}

/// Symbol colors. Discriminants are the 3-bit codec values.
#[derive(Clone, Copy, Debug, Default, Display, Eq, FromRepr, Hash, Ord, PartialEq, PartialOrd, VariantArray, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[repr(u8)]
pub enum Color {
    #[default]
    Black = 0,
    White = 1,
    Red = 2,
    Blue = 3,
    Green = 4,
    Yellow = 5,
    Cyan = 6,
    Magenta = 7,
}

/// The state of one lattice edge. Discriminants are the 3-bit codec values.
#[derive(Clone, Copy, Debug, Default, Display, Eq, FromRepr, Hash, Ord, PartialEq, PartialOrd, VariantArray, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[repr(u8)]
pub enum EdgeKind {
    #[default]
    /// A plain, traversable edge.
    Normal = 0,
    /// Cannot be traversed but does not separate regions.
    Broken = 1,
    /// Outside the puzzle: cannot be traversed and separates regions.
    Absent = 2,
    /// Must be traversed by either path.
    Hexagon = 3,
    /// Must be traversed by the main path.
    HexagonMain = 4,
    /// Must be traversed by the symmetric path.
    HexagonSymmetry = 5,
}

impl EdgeKind {
    /// Whether a path may cross this edge.
    pub fn is_traversable(&self) -> bool {
        !matches!(self, Self::Broken | Self::Absent)
    }

    /// The must-pass marker on this edge or node, if any.
    pub fn hexagon(&self) -> Option<HexagonKind> {
        match self {
            Self::Hexagon => Some(HexagonKind::Any),
            Self::HexagonMain => Some(HexagonKind::Main),
            Self::HexagonSymmetry => Some(HexagonKind::Symmetry),
            _ => None,
        }
    }
}

/// The state of one lattice node. Discriminants are the 3-bit codec values.
#[derive(Clone, Copy, Debug, Default, Display, Eq, FromRepr, Hash, Ord, PartialEq, PartialOrd, VariantArray, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[repr(u8)]
pub enum NodeKind {
    #[default]
    Normal = 0,
    Start = 1,
    End = 2,
    Hexagon = 3,
    HexagonMain = 4,
    HexagonSymmetry = 5,
}

impl NodeKind {
    /// The must-pass marker on this edge or node, if any.
    pub fn hexagon(&self) -> Option<HexagonKind> {
        match self {
            Self::Hexagon => Some(HexagonKind::Any),
            Self::HexagonMain => Some(HexagonKind::Main),
            Self::HexagonSymmetry => Some(HexagonKind::Symmetry),
            _ => None,
        }
    }
}

/// Which path a must-pass marker binds.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum HexagonKind {
    /// Either path.
    Any,
    /// The main path only.
    Main,
    /// The symmetric path only.
    Symmetry,
}

impl HexagonKind {
    /// Whether a traversal by the main (`by_main`) or the symmetric path satisfies this marker.
    ///
    /// Without symmetry every marker binds the single path.
    pub fn satisfied_by(&self, by_main: bool, symmetric: bool) -> bool {
        match (self, symmetric) {
            (_, false) | (Self::Any, true) => true,
            (Self::Main, true) => by_main,
            (Self::Symmetry, true) => !by_main,
        }
    }
}

/// One cell of a [`Grid`](crate::Grid).
#[derive(Clone, Debug, Default, Eq, Hash, PartialEq)]
pub struct Cell {
    /// The symbol.
    pub kind: CellKind,
    pub color: Color,
    /// Present for tetromino kinds.
    pub shape: Option<Polyomino>,
    /// Present for triangles, in `1..=3`.
    pub count: Option<u8>,
}

impl Cell {
    /// A colored square.
    pub fn square(color: Color) -> Self {
        Self { kind: CellKind::Square, color, ..Default::default() }
    }

    /// A colored star.
    pub fn star(color: Color) -> Self {
        Self { kind: CellKind::Star, color, ..Default::default() }
    }

    /// An eraser. Its color only matters to the star tally.
    pub fn eraser(color: Color) -> Self {
        Self { kind: CellKind::Eraser, color, ..Default::default() }
    }

    /// A triangle requiring `count` traversed edges.
    pub fn triangle(count: u8, color: Color) -> Self {
        Self { kind: CellKind::Triangle, color, count: Some(count), ..Default::default() }
    }

    /// A tetromino of the kind given by the two flags.
    pub fn tetromino(shape: Polyomino, rotatable: bool, negative: bool, color: Color) -> Self {
        Self { kind: CellKind::tetromino(rotatable, negative), color, shape: Some(shape), count: None }
    }

    /// Whether this cell carries any symbol at all.
    pub fn is_symbol(&self) -> bool {
        self.kind != CellKind::None
    }
}

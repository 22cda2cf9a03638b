//! Plain JSON interchange for grids.

use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::cell::{Cell, CellKind, Color, EdgeKind, NodeKind};
use crate::grid::Grid;
use crate::location::{EdgeId, Point};
use crate::polyomino::Polyomino;
use crate::symmetry::SymmetryType;

/// One cell, as exchanged.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CellData {
    #[serde(rename = "type")]
    /// The symbol.
    pub kind: CellKind,
    #[serde(default)]
    pub color: Color,
    /// Row-major occupancy matrix, for tetromino kinds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shape: Option<Polyomino>,
    /// Required edge count, for triangles.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<u8>,
}

/// One edge, as exchanged.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct EdgeData {
    #[serde(rename = "type")]
    pub kind: EdgeKind,
}

/// One node, as exchanged.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct NodeData {
    #[serde(rename = "type")]
    pub kind: NodeKind,
}

/// A whole grid, as exchanged. Every array is indexed `[row][col]`.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PuzzleData {
    /// Cell rows.
    pub rows: usize,
    /// Cell columns.
    pub cols: usize,
    /// `rows x cols`.
    pub cells: Vec<Vec<CellData>>,
    /// `rows x (cols + 1)`.
    pub v_edges: Vec<Vec<EdgeData>>,
    /// `(rows + 1) x cols`.
    pub h_edges: Vec<Vec<EdgeData>>,
    /// `(rows + 1) x (cols + 1)`.
    pub nodes: Vec<Vec<NodeData>>,
    #[serde(default)]
    pub symmetry: SymmetryType,
    #[serde(default)]
    pub seed: String,
}

/// Reasons [`PuzzleData`] cannot become a [`Grid`].
#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
pub enum PuzzleDataError {
    /// A grid needs at least one cell.
    #[error("grid has no cells")]
    Empty,
    /// An array does not have the shape the dimensions imply.
    #[error("{array} should be {rows}x{cols}")]
    DimensionMismatch {
        /// Which array is malformed.
        array: &'static str,
        /// Expected outer length.
        rows: usize,
        /// Expected inner length.
        cols: usize,
    },
    /// A tetromino cell without a shape.
    #[error("tetromino at {0} has no shape")]
    MissingShape(Point),
    /// A triangle cell without a count in `1..=3`.
    #[error("triangle at {0} needs a count of 1 to 3")]
    MissingCount(Point),
}

fn check_shape<T>(array: &[Vec<T>], name: &'static str, rows: usize, cols: usize) -> Result<(), PuzzleDataError> {
    match array.len() == rows && array.iter().all(|row| row.len() == cols) {
        true => Ok(()),
        false => Err(PuzzleDataError::DimensionMismatch { array: name, rows, cols }),
    }
}

impl From<&CellData> for Cell {
    fn from(value: &CellData) -> Self {
        Cell {
            kind: value.kind,
            color: value.color,
            shape: value.kind.is_tetromino().then(|| value.shape.clone()).flatten(),
            count: (value.kind == CellKind::Triangle).then_some(value.count).flatten(),
        }
    }
}

impl TryFrom<PuzzleData> for Grid {
    type Error = PuzzleDataError;

    /// Shapes on non-tetromino cells and counts on non-triangle cells are dropped.
    fn try_from(value: PuzzleData) -> Result<Self, Self::Error> {
        let (rows, cols) = (value.rows, value.cols);
        if rows == 0 || cols == 0 {
            return Err(PuzzleDataError::Empty);
        }
        check_shape(&value.cells, "cells", rows, cols)?;
        check_shape(&value.v_edges, "vEdges", rows, cols + 1)?;
        check_shape(&value.h_edges, "hEdges", rows + 1, cols)?;
        check_shape(&value.nodes, "nodes", rows + 1, cols + 1)?;

        let mut grid = Grid::blank(cols, rows);
        grid.symmetry = value.symmetry;
        grid.seed = value.seed;

        for (row, cells) in value.cells.iter().enumerate() {
            for (col, data) in cells.iter().enumerate() {
                let at = Point::new(col, row);
                let cell = Cell::from(data);
                if cell.kind.is_tetromino() && cell.shape.is_none() {
                    return Err(PuzzleDataError::MissingShape(at));
                }
                if cell.kind == CellKind::Triangle && !cell.count.is_some_and(|c| (1..=3).contains(&c)) {
                    return Err(PuzzleDataError::MissingCount(at));
                }
                grid.set_cell(at, cell);
            }
        }
        for (row, edges) in value.h_edges.iter().enumerate() {
            for (col, edge) in edges.iter().enumerate() {
                grid.set_edge(EdgeId::Horizontal { row, col }, edge.kind);
            }
        }
        for (row, edges) in value.v_edges.iter().enumerate() {
            for (col, edge) in edges.iter().enumerate() {
                grid.set_edge(EdgeId::Vertical { row, col }, edge.kind);
            }
        }
        for (row, nodes) in value.nodes.iter().enumerate() {
            for (col, node) in nodes.iter().enumerate() {
                grid.set_node(Point::new(col, row), node.kind);
            }
        }

        Ok(grid)
    }
}

impl From<&Grid> for PuzzleData {
    fn from(grid: &Grid) -> Self {
        Self {
            rows: grid.rows,
            cols: grid.cols,
            cells: grid.cells.rows().into_iter()
                .map(|row| row.iter()
                    .map(|cell| CellData { kind: cell.kind, color: cell.color, shape: cell.shape.clone(), count: cell.count })
                    .collect_vec())
                .collect_vec(),
            v_edges: grid.v_edges.rows().into_iter()
                .map(|row| row.iter().map(|kind| EdgeData { kind: *kind }).collect_vec())
                .collect_vec(),
            h_edges: grid.h_edges.rows().into_iter()
                .map(|row| row.iter().map(|kind| EdgeData { kind: *kind }).collect_vec())
                .collect_vec(),
            nodes: grid.nodes.rows().into_iter()
                .map(|row| row.iter().map(|kind| NodeData { kind: *kind }).collect_vec())
                .collect_vec(),
            symmetry: grid.symmetry,
            seed: grid.seed.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::GridBuilder;
    use crate::location::Dimension;

    fn sample() -> Grid {
        let l = Polyomino::from_cells([(0, 0), (0, 1), (1, 1)]).unwrap();
        GridBuilder::with_dims((Dimension::new(3).unwrap(), Dimension::new(2).unwrap()))
            .add_start(Point::new(0, 2))
            .add_end(Point::new(3, 0))
            .cell(Point::new(0, 0), Cell::star(Color::Red))
            .cell(Point::new(1, 0), Cell::triangle(2, Color::Yellow))
            .cell(Point::new(2, 1), Cell::tetromino(l, true, false, Color::Yellow))
            .edge(EdgeId::Vertical { row: 1, col: 1 }, EdgeKind::Broken)
            .node(Point::new(2, 1), NodeKind::Hexagon)
            .symmetry(SymmetryType::None)
            .seed("data")
            .build()
            .unwrap()
    }

    #[test]
    fn grid_round_trip_through_json() {
        let grid = sample();
        let json = serde_json::to_string(&PuzzleData::from(&grid)).unwrap();
        assert!(json.contains(r#""type":"tetrominoRotatable""#));
        assert!(json.contains(r#""vEdges""#));

        let data: PuzzleData = serde_json::from_str(&json).unwrap();
        assert_eq!(Grid::try_from(data).unwrap(), grid);
    }

    #[test]
    fn rejects_bad_arrays() {
        let mut data = PuzzleData::from(&sample());
        data.v_edges[0].pop();
        assert_eq!(
            Grid::try_from(data).unwrap_err(),
            PuzzleDataError::DimensionMismatch { array: "vEdges", rows: 2, cols: 4 },
        );

        let mut data = PuzzleData::from(&sample());
        data.cells[0][1].count = None;
        assert_eq!(Grid::try_from(data).unwrap_err(), PuzzleDataError::MissingCount(Point::new(1, 0)));

        let mut data = PuzzleData::from(&sample());
        data.cells[1][2].shape = None;
        assert_eq!(Grid::try_from(data).unwrap_err(), PuzzleDataError::MissingShape(Point::new(2, 1)));
    }
}

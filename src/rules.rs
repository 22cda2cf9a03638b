use std::collections::HashSet;

use itertools::Itertools;

use crate::cell::{CellKind, Color};
use crate::grid::Grid;
use crate::location::{EdgeId, Point};
use crate::tetromino::{Piece, TetrominoPacker};

/// Squares: every square of the region must share one color, otherwise every square is in error.
pub fn square_errors(grid: &Grid, symbols: &[Point]) -> Vec<Point> {
    let squares = symbols.iter()
        .filter(|c| grid.cell(**c).kind == CellKind::Square)
        .copied()
        .collect_vec();

    match squares.iter().map(|c| grid.cell(*c).color).unique().count() {
        0 | 1 => vec![],
        _ => squares,
    }
}

/// Stars: each star color must be carried by exactly two of the region's stars, squares and erasers.
pub fn star_errors(grid: &Grid, symbols: &[Point]) -> Vec<Point> {
    let counted_towards = |color: Color| symbols.iter()
        .filter(|c| matches!(grid.cell(**c).kind, CellKind::Star | CellKind::Square | CellKind::Eraser) && grid.cell(**c).color == color)
        .count();

    let stars = symbols.iter().filter(|c| grid.cell(**c).kind == CellKind::Star).copied().collect_vec();
    let failing = stars.iter()
        .map(|c| grid.cell(*c).color)
        .unique()
        .filter(|color| counted_towards(*color) != 2)
        .collect_vec();

    stars.into_iter().filter(|c| failing.contains(&grid.cell(*c).color)).collect_vec()
}

/// Triangles: the number of traversed edges around the cell must equal its count.
pub fn triangle_errors(grid: &Grid, symbols: &[Point], traversed: &HashSet<EdgeId>) -> Vec<Point> {
    symbols.iter()
        .filter(|c| grid.cell(**c).kind == CellKind::Triangle)
        .filter(|c| {
            let around = grid.cell_edges(**c).iter().filter(|edge| traversed.contains(edge)).count();
            grid.cell(**c).count.map(usize::from) != Some(around)
        })
        .copied()
        .collect_vec()
}

/// Tetrominoes: the region's pieces must tile it exactly, otherwise every participating cell is in error.
pub fn tetromino_errors(grid: &Grid, region: &[Point], symbols: &[Point], packer: &mut TetrominoPacker) -> Vec<Point> {
    let pieces = symbols.iter()
        .filter(|c| grid.cell(**c).kind.is_tetromino())
        .copied()
        .collect_vec();
    if pieces.is_empty() {
        return vec![];
    }

    let mut positives = Vec::new();
    let mut negatives = Vec::new();
    for cell in &pieces {
        let symbol = grid.cell(*cell);
        // a tetromino without a shape can never tile anything
        let Some(shape) = symbol.shape.clone() else {
            return pieces;
        };
        let piece = Piece { shape, rotatable: symbol.kind.is_rotatable() };
        match symbol.kind.is_negative() {
            true => negatives.push(piece),
            false => positives.push(piece),
        }
    }

    match packer.can_tile((grid.cols, grid.rows), region, &positives, &negatives) {
        true => vec![],
        false => pieces,
    }
}

/// All rule violations among `symbols`, the still-active symbol cells of `region`.
///
/// Erasers among `symbols` count as colored symbols for stars but are never themselves reported.
pub fn region_errors(grid: &Grid, region: &[Point], symbols: &[Point], traversed: &HashSet<EdgeId>, packer: &mut TetrominoPacker) -> Vec<Point> {
    square_errors(grid, symbols).into_iter()
        .chain(star_errors(grid, symbols))
        .chain(triangle_errors(grid, symbols, traversed))
        .chain(tetromino_errors(grid, region, symbols, packer))
        .unique()
        .collect_vec()
}

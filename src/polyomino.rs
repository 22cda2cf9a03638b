use std::fmt::{Display, Formatter};

use itertools::Itertools;
use serde::{Deserialize, Serialize};

/// A polyomino shape, stored as its cell offsets normalized so the minimum `x` and `y` are both 0.
///
/// Offsets are `(x, y)` with `y` growing downward and are kept sorted, so equal shapes compare equal.
#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "Vec<Vec<bool>>", into = "Vec<Vec<bool>>")]
pub struct Polyomino {
    cells: Vec<(i32, i32)>,
}

/// Reasons a matrix does not describe a polyomino.
#[derive(Clone, Copy, Debug, Eq, PartialEq, thiserror::Error)]
pub enum ShapeError {
    /// No cell of the matrix is filled.
    #[error("shape matrix has no filled cells")]
    Empty,
}

impl Polyomino {
    /// Build a shape from arbitrary offsets, normalizing them.
    pub fn from_cells(cells: impl IntoIterator<Item = (i32, i32)>) -> Result<Self, ShapeError> {
        let cells = cells.into_iter().collect_vec();
        let min_x = cells.iter().map(|c| c.0).min().ok_or(ShapeError::Empty)?;
        let min_y = cells.iter().map(|c| c.1).min().ok_or(ShapeError::Empty)?;

        Ok(Self {
            cells: cells.into_iter()
                .map(|(x, y)| (x - min_x, y - min_y))
                .sorted()
                .dedup()
                .collect_vec(),
        })
    }

    /// Build a shape from a boolean matrix in row-major order (`matrix[y][x]`).
    pub fn from_matrix(matrix: &[Vec<bool>]) -> Result<Self, ShapeError> {
        Self::from_cells(matrix.iter()
            .enumerate()
            .flat_map(|(y, row)| row.iter()
                .enumerate()
                .filter(|(_, filled)| **filled)
                .map(move |(x, _)| (x as i32, y as i32))))
    }

    /// The boolean matrix of this shape's bounding box, row-major.
    pub fn to_matrix(&self) -> Vec<Vec<bool>> {
        let (width, height) = self.bounds();
        let mut matrix = vec![vec![false; width]; height];
        for (x, y) in &self.cells {
            matrix[*y as usize][*x as usize] = true;
        }

        matrix
    }

    /// Width and height of the bounding box.
    pub fn bounds(&self) -> (usize, usize) {
        let width = self.cells.iter().map(|c| c.0).max().unwrap_or(-1) + 1;
        let height = self.cells.iter().map(|c| c.1).max().unwrap_or(-1) + 1;
        (width as usize, height as usize)
    }

    /// Number of cells.
    pub fn area(&self) -> usize {
        self.cells.len()
    }

    /// Normalized offsets, sorted.
    pub fn cells(&self) -> &[(i32, i32)] {
        &self.cells
    }

    /// This shape turned a quarter clockwise.
    pub fn rotated(&self) -> Self {
        // (x, y) -> (-y, x) is clockwise with y pointing down; renormalize afterwards
        let min_x = self.cells.iter().map(|c| -c.1).min().unwrap_or(0);
        let min_y = self.cells.iter().map(|c| c.0).min().unwrap_or(0);
        Self {
            cells: self.cells.iter()
                .map(|(x, y)| (-y - min_x, *x - min_y))
                .sorted()
                .collect_vec(),
        }
    }

    /// The distinct orientations usable when tiling: all distinct quarter turns if `rotatable`, else only `self`.
    pub fn orientations(&self, rotatable: bool) -> Vec<Self> {
        if !rotatable {
            return vec![self.clone()];
        }

        let mut out: Vec<Self> = Vec::with_capacity(4);
        let mut current = self.clone();
        for _ in 0..4 {
            if !out.contains(&current) {
                out.push(current.clone());
            }
            current = current.rotated();
        }

        out
    }

    /// Canonical representative among the usable orientations, for cache keys.
    pub fn canonical(&self, rotatable: bool) -> Self {
        self.orientations(rotatable).into_iter().min().unwrap_or_else(|| self.clone())
    }
}

impl TryFrom<Vec<Vec<bool>>> for Polyomino {
    type Error = ShapeError;

    fn try_from(value: Vec<Vec<bool>>) -> Result<Self, Self::Error> {
        Self::from_matrix(&value)
    }
}

impl From<Polyomino> for Vec<Vec<bool>> {
    fn from(value: Polyomino) -> Self {
        value.to_matrix()
    }
}

impl Display for Polyomino {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        for row in self.to_matrix() {
            writeln!(f, "{}", row.iter().map(|filled| if *filled { '#' } else { '.' }).collect::<String>())?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn l_piece() -> Polyomino {
        Polyomino::from_matrix(&[
            vec![true, false],
            vec![true, false],
            vec![true, true],
        ]).unwrap()
    }

    #[test]
    fn rotation_cycle() {
        let l = l_piece();
        assert_eq!(format!("{}", l.rotated()), "###\n#..\n");
        assert_eq!(l.rotated().rotated().rotated().rotated(), l);
        assert_eq!(l.orientations(true).len(), 4);
        assert_eq!(l.orientations(false), vec![l.clone()]);
    }

    #[test]
    fn symmetric_shapes_dedupe_orientations() {
        let square = Polyomino::from_cells([(0, 0), (1, 0), (0, 1), (1, 1)]).unwrap();
        assert_eq!(square.orientations(true).len(), 1);
        let bar = Polyomino::from_cells([(3, 2), (4, 2), (5, 2), (6, 2)]).unwrap();
        assert_eq!(bar.orientations(true).len(), 2);
        assert_eq!(bar.bounds(), (4, 1));
    }

    #[test]
    fn canonical_is_rotation_invariant() {
        let l = l_piece();
        assert_eq!(l.canonical(true), l.rotated().canonical(true));
        assert_ne!(l.canonical(false), l.rotated().canonical(false));
    }

    #[test]
    fn empty_matrix_is_rejected() {
        assert_eq!(Polyomino::from_matrix(&[vec![false]]), Err(ShapeError::Empty));
    }
}

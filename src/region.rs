use std::collections::{HashSet, VecDeque};

use itertools::Itertools;
use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::cell::EdgeKind;
use crate::grid::Grid;
use crate::location::{EdgeId, Point};
use crate::path::{PathSet, SolutionPath};

/// A maximal set of cells connected without crossing a traversed or absent edge.
#[derive(Clone, Debug, Default, Eq, Hash, PartialEq, Serialize, Deserialize)]
pub struct Region {
    /// Member cells, row-major.
    pub cells: Vec<Point>,
}

impl Region {
    /// Number of member cells.
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Whether the region has no cells.
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Member test; cells are kept sorted row-major so this is a binary search.
    pub fn contains(&self, cell: Point) -> bool {
        self.cells.binary_search_by_key(&(cell.y, cell.x), |c| (c.y, c.x)).is_ok()
    }
}

/// Blocked edge masks: `(horizontal, vertical)`, shaped like the grid's edge arrays.
fn blocked_masks(grid: &Grid, traversed: &HashSet<EdgeId>) -> (Array2<bool>, Array2<bool>) {
    let mut horizontal = grid.h_edges.map(|kind| *kind == EdgeKind::Absent);
    let mut vertical = grid.v_edges.map(|kind| *kind == EdgeKind::Absent);
    for edge in traversed {
        match *edge {
            EdgeId::Horizontal { row, col } => horizontal[(row, col)] = true,
            EdgeId::Vertical { row, col } => vertical[(row, col)] = true,
        }
    }

    (horizontal, vertical)
}

/// Partition every cell into regions separated by the edges of `traversed` and by absent edges.
///
/// Regions come ordered by their first cell in row-major order.
pub fn regions_from_edges(grid: &Grid, traversed: &HashSet<EdgeId>) -> Vec<Region> {
    let (horizontal, vertical) = blocked_masks(grid, traversed);
    let mut seen = Array2::from_elem((grid.rows, grid.cols), false);
    let mut out = Vec::new();

    for start in grid.all_cells() {
        if seen[start.as_index()] {
            continue;
        }

        seen[start.as_index()] = true;
        let mut cells = vec![start];
        let mut queue = VecDeque::from([start]);
        while let Some(cell) = queue.pop_front() {
            for edge in grid.cell_edges(cell) {
                let blocked = match edge {
                    EdgeId::Horizontal { row, col } => horizontal[(row, col)],
                    EdgeId::Vertical { row, col } => vertical[(row, col)],
                };
                if blocked {
                    continue;
                }
                if let Some(next) = grid.across(cell, edge) {
                    if !seen[next.as_index()] {
                        seen[next.as_index()] = true;
                        cells.push(next);
                        queue.push_back(next);
                    }
                }
            }
        }

        out.push(Region { cells: cells.into_iter().sorted_by_key(|c| (c.y, c.x)).collect_vec() });
    }

    out
}

/// Partition every cell into regions for a main path and, if present, its symmetric companion.
pub fn regions(grid: &Grid, main: &SolutionPath, symmetric: Option<&SolutionPath>) -> Vec<Region> {
    let mut traversed: HashSet<EdgeId> = main.edges().collect();
    if let Some(companion) = symmetric {
        traversed.extend(companion.edges());
    }

    regions_from_edges(grid, &traversed)
}

/// Regions for a validated [`PathSet`].
pub(crate) fn regions_for(grid: &Grid, paths: &PathSet) -> Vec<Region> {
    regions_from_edges(grid, &paths.traversed())
}

/// Cells conceptually outside the puzzle: reachable from beyond the boundary by crossing absent edges only,
/// with all four of their own edges absent.
pub fn external_cells(grid: &Grid) -> Array2<bool> {
    let fully_absent = |cell: Point| grid.cell_edges(cell).iter().all(|edge| grid.edge(*edge) == EdgeKind::Absent);

    let mut external = Array2::from_elem((grid.rows, grid.cols), false);
    let mut queue = grid.all_edges()
        .filter(|edge| grid.is_boundary_edge(*edge) && grid.edge(*edge) == EdgeKind::Absent)
        .flat_map(|edge| grid.edge_cells(edge))
        .filter(|cell| fully_absent(*cell))
        .collect::<VecDeque<_>>();
    for cell in &queue {
        external[cell.as_index()] = true;
    }

    while let Some(cell) = queue.pop_front() {
        for edge in grid.cell_edges(cell) {
            // every edge of an external cell is absent, so any neighbor is entered across an absent edge
            if let Some(next) = grid.across(cell, edge) {
                if !external[next.as_index()] && fully_absent(next) {
                    external[next.as_index()] = true;
                    queue.push_back(next);
                }
            }
        }
    }

    external
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::GridBuilder;
    use crate::location::Dimension;

    fn open_grid(cols: usize, rows: usize) -> Grid {
        GridBuilder::with_dims((Dimension::new(cols).unwrap(), Dimension::new(rows).unwrap()))
            .add_start(Point::new(0, rows))
            .add_end(Point::new(cols, 0))
            .build()
            .unwrap()
    }

    #[test]
    fn straight_cut_splits_in_two() {
        let grid = open_grid(3, 2);
        let path = SolutionPath::new(vec![Point::new(0, 1), Point::new(1, 1), Point::new(2, 1), Point::new(3, 1)]);
        let found = regions(&grid, &path, None);
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].cells, vec![Point::new(0, 0), Point::new(1, 0), Point::new(2, 0)]);
        assert!(found[1].contains(Point::new(2, 1)));
    }

    #[test]
    fn boundary_walk_keeps_one_region() {
        let grid = open_grid(2, 2);
        let path = SolutionPath::new(vec![Point::new(0, 2), Point::new(0, 1), Point::new(0, 0), Point::new(1, 0), Point::new(2, 0)]);
        assert_eq!(regions(&grid, &path, None).len(), 1);
    }

    #[test]
    fn absent_edges_split_and_external_cells() {
        let mut grid = open_grid(3, 1);
        for edge in grid.cell_edges(Point::new(0, 0)) {
            grid.set_edge(edge, EdgeKind::Absent);
        }
        // broken edges never split
        grid.set_edge(EdgeId::Vertical { row: 0, col: 2 }, EdgeKind::Broken);

        let found = regions_from_edges(&grid, &HashSet::new());
        assert_eq!(found.len(), 2);
        let external = external_cells(&grid);
        assert!(external[(0, 0)]);
        assert!(!external[(0, 1)]);
        assert!(!external[(0, 2)]);
    }
}

//! Signed polyomino tiling.
//!
//! A region holding tetromino symbols is valid when the pieces can be laid on the grid so that every region
//! cell ends up covered exactly once and every other cell not at all, negative pieces subtracting from the
//! coverage of positive ones. When negative area cancels positive area entirely the pieces only need to
//! cancel each other out.

use std::collections::HashMap;

use fixedbitset::FixedBitSet;
use itertools::Itertools;

use crate::location::Point;
use crate::polyomino::Polyomino;

/// One piece handed to the packer.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct Piece {
    pub shape: Polyomino,
    /// Whether any quarter turn of `shape` may be used.
    pub rotatable: bool,
}

#[derive(Clone, Debug, Eq, Hash, PartialEq)]
struct PackingKey {
    dims: (usize, usize),
    region: FixedBitSet,
    pieces: Vec<(Polyomino, bool, bool)>,
}

/// Decides tilings, remembering answers for configurations it has already seen.
pub struct TetrominoPacker {
    memo: HashMap<PackingKey, bool>,
    memo_cap: usize,
    node_limit: usize,
}

impl Default for TetrominoPacker {
    fn default() -> Self {
        Self::with_limits(200_000, 4096)
    }
}

impl TetrominoPacker {
    /// A packer giving up after `node_limit` search nodes per query and holding at most `memo_cap` answers.
    pub fn with_limits(node_limit: usize, memo_cap: usize) -> Self {
        Self {
            memo: HashMap::new(),
            memo_cap,
            node_limit,
        }
    }

    /// Whether `positives` minus `negatives` can tile `region` on a grid of `dims = (cols, rows)` cells.
    pub fn can_tile(&mut self, dims: (usize, usize), region: &[Point], positives: &[Piece], negatives: &[Piece]) -> bool {
        let positive_area = positives.iter().map(|p| p.shape.area()).sum::<usize>() as isize;
        let negative_area = negatives.iter().map(|p| p.shape.area()).sum::<usize>() as isize;
        let net = positive_area - negative_area;
        if net < 0 || (net != 0 && net != region.len() as isize) {
            return false;
        }

        let (cols, rows) = dims;
        let mut mask = FixedBitSet::with_capacity(cols * rows);
        for cell in region {
            mask.insert(cell.y * cols + cell.x);
        }

        let key = PackingKey {
            dims,
            region: mask.clone(),
            pieces: positives.iter().map(|p| (p.shape.canonical(p.rotatable), p.rotatable, false))
                .chain(negatives.iter().map(|p| (p.shape.canonical(p.rotatable), p.rotatable, true)))
                .sorted()
                .collect_vec(),
        };
        if let Some(known) = self.memo.get(&key) {
            return *known;
        }

        let target = match net {
            0 => vec![0; cols * rows],
            _ => (0..cols * rows).map(|index| mask.contains(index) as i32).collect_vec(),
        };
        let mut search = Search::new(cols, rows, target, positives, negatives, self.node_limit);
        let found = search.place_positive();
        if search.aborted {
            log::warn!("tiling search gave up after {} nodes on a {}-cell region", search.nodes, region.len());
        }

        if self.memo.len() >= self.memo_cap {
            self.memo.clear();
        }
        self.memo.insert(key, found);
        found
    }
}

struct Search {
    cols: usize,
    rows: usize,
    target: Vec<i32>,
    coverage: Vec<i32>,
    positive: Vec<i32>,
    // positive coverage of any one cell stays within 1 + number of negatives
    cap: i32,
    outside_allowed: bool,
    // orientations per piece, and a type id shared by interchangeable pieces
    positives: Vec<(Vec<Polyomino>, usize)>,
    negatives: Vec<(Vec<Polyomino>, usize)>,
    positive_used: Vec<bool>,
    negative_used: Vec<bool>,
    remaining_positive: i32,
    remaining_negative: i32,
    // target cells still under-covered / units of coverage above target
    deficit: i32,
    excess: i32,
    nodes: usize,
    node_limit: usize,
    aborted: bool,
}

fn typed(pieces: &[Piece]) -> Vec<(Vec<Polyomino>, usize)> {
    pieces.iter()
        .enumerate()
        .map(|(index, piece)| {
            let type_id = pieces.iter().position(|other| other.rotatable == piece.rotatable
                && other.shape.canonical(other.rotatable) == piece.shape.canonical(piece.rotatable)).unwrap_or(index);
            (piece.shape.orientations(piece.rotatable), type_id)
        })
        .collect_vec()
}

impl Search {
    fn new(cols: usize, rows: usize, target: Vec<i32>, positives: &[Piece], negatives: &[Piece], node_limit: usize) -> Self {
        let deficit = target.iter().sum();
        Self {
            cols,
            rows,
            coverage: vec![0; target.len()],
            positive: vec![0; target.len()],
            target,
            cap: 1 + negatives.len() as i32,
            outside_allowed: !negatives.is_empty(),
            positives: typed(positives),
            negatives: typed(negatives),
            positive_used: vec![false; positives.len()],
            negative_used: vec![false; negatives.len()],
            remaining_positive: positives.iter().map(|p| p.shape.area() as i32).sum(),
            remaining_negative: negatives.iter().map(|p| p.shape.area() as i32).sum(),
            deficit,
            excess: 0,
            nodes: 0,
            node_limit,
            aborted: false,
        }
    }

    fn tick(&mut self) -> bool {
        self.nodes += 1;
        if self.nodes > self.node_limit {
            self.aborted = true;
        }
        !self.aborted
    }

    /// Grid cell indices covered by `shape` anchored at `(ox, oy)`, or [`None`] if it leaves the grid.
    fn footprint(&self, shape: &Polyomino, ox: i32, oy: i32) -> Option<Vec<usize>> {
        shape.cells().iter()
            .map(|(dx, dy)| {
                let (x, y) = (ox + dx, oy + dy);
                match x >= 0 && y >= 0 && (x as usize) < self.cols && (y as usize) < self.rows {
                    true => Some(y as usize * self.cols + x as usize),
                    false => None,
                }
            })
            .collect()
    }

    fn positive_fits(&self, cells: &[usize]) -> bool {
        cells.iter().all(|cell| match self.outside_allowed {
            true => self.positive[*cell] < self.cap,
            // without negatives pieces can neither overlap nor leave the target
            false => self.target[*cell] == 1 && self.coverage[*cell] == 0,
        })
    }

    fn add_positive(&mut self, cells: &[usize], sign: i32) {
        for cell in cells {
            if sign > 0 {
                if self.coverage[*cell] < self.target[*cell] { self.deficit -= 1 } else { self.excess += 1 }
                self.coverage[*cell] += 1;
                self.positive[*cell] += 1;
            } else {
                self.coverage[*cell] -= 1;
                self.positive[*cell] -= 1;
                if self.coverage[*cell] < self.target[*cell] { self.deficit += 1 } else { self.excess -= 1 }
            }
        }
        self.remaining_positive -= sign * cells.len() as i32;
    }

    fn add_negative(&mut self, cells: &[usize], sign: i32) {
        for cell in cells {
            self.coverage[*cell] -= sign;
            self.excess -= sign;
        }
        self.remaining_negative -= sign * cells.len() as i32;
    }

    fn try_positive(&mut self, index: usize, cells: Vec<usize>) -> bool {
        if !self.positive_fits(&cells) {
            return false;
        }

        self.positive_used[index] = true;
        self.add_positive(&cells, 1);
        let found = self.place_positive();
        self.add_positive(&cells, -1);
        self.positive_used[index] = false;
        found
    }

    fn place_positive(&mut self) -> bool {
        if !self.tick() {
            return false;
        }
        if self.deficit > self.remaining_positive || self.excess > self.remaining_negative {
            return false;
        }
        if self.positive_used.iter().all(|used| *used) {
            return self.place_negative();
        }

        let needy = (0..self.coverage.len()).find(|cell| self.coverage[*cell] < self.target[*cell]);
        let mut tried_types = Vec::new();

        for index in 0..self.positives.len() {
            if self.positive_used[index] || tried_types.contains(&self.positives[index].1) {
                continue;
            }
            tried_types.push(self.positives[index].1);

            for orientation in self.positives[index].0.clone() {
                match needy {
                    // some piece must cover the first under-covered cell, try every placement that does
                    Some(cell) => {
                        let (cx, cy) = ((cell % self.cols) as i32, (cell / self.cols) as i32);
                        for (dx, dy) in orientation.cells().to_vec() {
                            if let Some(cells) = self.footprint(&orientation, cx - dx, cy - dy) {
                                if self.try_positive(index, cells) {
                                    return true;
                                }
                            }
                        }
                    }
                    // everything is covered; leftover pieces go anywhere for negatives to cancel
                    None => {
                        let (width, height) = orientation.bounds();
                        for (oy, ox) in (0..=self.rows.saturating_sub(height)).cartesian_product(0..=self.cols.saturating_sub(width)) {
                            if let Some(cells) = self.footprint(&orientation, ox as i32, oy as i32) {
                                if self.try_positive(index, cells) {
                                    return true;
                                }
                            }
                        }
                    }
                }
                if self.aborted {
                    return false;
                }
            }

            // with no needy cell any order of placement is equivalent, so only the first free piece is tried
            if needy.is_none() {
                break;
            }
        }

        false
    }

    fn place_negative(&mut self) -> bool {
        if !self.tick() {
            return false;
        }
        if self.deficit != 0 || self.excess != self.remaining_negative {
            return false;
        }
        if self.negative_used.iter().all(|used| *used) {
            return self.excess == 0;
        }

        // the first over-covered cell must lose coverage to some negative piece
        let Some(cell) = (0..self.coverage.len()).find(|cell| self.coverage[*cell] > self.target[*cell]) else {
            return false;
        };
        let (cx, cy) = ((cell % self.cols) as i32, (cell / self.cols) as i32);
        let mut tried_types = Vec::new();

        for index in 0..self.negatives.len() {
            if self.negative_used[index] || tried_types.contains(&self.negatives[index].1) {
                continue;
            }
            tried_types.push(self.negatives[index].1);

            for orientation in self.negatives[index].0.clone() {
                for (dx, dy) in orientation.cells().to_vec() {
                    let Some(cells) = self.footprint(&orientation, cx - dx, cy - dy) else {
                        continue;
                    };
                    if !cells.iter().all(|c| self.coverage[*c] > self.target[*c]) {
                        continue;
                    }

                    self.negative_used[index] = true;
                    self.add_negative(&cells, 1);
                    let found = self.place_negative();
                    self.add_negative(&cells, -1);
                    self.negative_used[index] = false;
                    if found {
                        return true;
                    }
                    if self.aborted {
                        return false;
                    }
                }
            }
        }

        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn piece(cells: &[(i32, i32)], rotatable: bool) -> Piece {
        Piece { shape: Polyomino::from_cells(cells.iter().copied()).unwrap(), rotatable }
    }

    fn rect(cols: usize, rows: usize) -> Vec<Point> {
        (0..rows).cartesian_product(0..cols).map(|(y, x)| Point::new(x, y)).collect_vec()
    }

    #[test]
    fn exact_fit_and_area_mismatch() {
        let mut packer = TetrominoPacker::default();
        let bar = piece(&[(0, 0), (1, 0), (2, 0), (3, 0)], false);
        assert!(packer.can_tile((4, 1), &rect(4, 1), &[bar.clone()], &[]));
        assert!(!packer.can_tile((4, 2), &rect(4, 2), &[bar.clone()], &[]));
        assert!(packer.can_tile((4, 2), &rect(4, 2), &[bar.clone(), bar.clone()], &[]));
    }

    #[test]
    fn rotation_flag_controls_orientation() {
        let mut packer = TetrominoPacker::default();
        let vertical = rect(1, 4);
        assert!(!packer.can_tile((1, 4), &vertical, &[piece(&[(0, 0), (1, 0), (2, 0), (3, 0)], false)], &[]));
        assert!(packer.can_tile((1, 4), &vertical, &[piece(&[(0, 0), (1, 0), (2, 0), (3, 0)], true)], &[]));
    }

    #[test]
    fn negative_unit_cancels_positive_unit() {
        let mut packer = TetrominoPacker::default();
        let domino = piece(&[(0, 0), (1, 0)], false);
        let unit = piece(&[(0, 0)], false);
        // the monomino pair contributes no net area
        assert!(packer.can_tile((3, 3), &rect(2, 1), &[domino.clone(), unit.clone()], &[unit.clone()]));
        assert!(!packer.can_tile((3, 3), &rect(2, 1), &[domino.clone(), unit.clone()], &[]));
    }

    #[test]
    fn negative_piece_carves_the_region() {
        let mut packer = TetrominoPacker::default();
        // an L region is a 2x2 square minus one cell
        let region = vec![Point::new(0, 0), Point::new(0, 1), Point::new(1, 1)];
        let square = piece(&[(0, 0), (1, 0), (0, 1), (1, 1)], false);
        let unit = piece(&[(0, 0)], false);
        assert!(packer.can_tile((2, 2), &region, &[square.clone()], &[unit.clone()]));
        // the square cannot lie outside the grid
        assert!(!packer.can_tile((2, 2), &[Point::new(0, 0), Point::new(1, 0), Point::new(1, 1)], &[piece(&[(0, 0), (1, 0), (2, 0), (0, 1)], false)], &[unit]));
    }

    #[test]
    fn fully_cancelled_pieces_are_valid_anywhere() {
        let mut packer = TetrominoPacker::default();
        let bar = piece(&[(0, 0), (1, 0)], true);
        assert!(packer.can_tile((3, 3), &rect(1, 1), &[bar.clone()], &[bar.clone()]));
        assert!(!packer.can_tile((3, 3), &rect(1, 1), &[bar], &[piece(&[(0, 0), (1, 0), (2, 0)], true)]));
    }

    #[test]
    fn memo_returns_same_answer() {
        let mut packer = TetrominoPacker::with_limits(10_000, 1);
        let unit = piece(&[(0, 0)], false);
        let region = rect(1, 1);
        assert!(packer.can_tile((2, 2), &region, &[unit.clone()], &[]));
        assert!(packer.can_tile((2, 2), &region, &[unit.clone()], &[]));
        assert!(!packer.can_tile((2, 2), &rect(2, 1), &[unit], &[]));
        assert_eq!(packer.memo.len(), 1);
    }
}

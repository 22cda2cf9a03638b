//! Difficulty estimation by exhaustive path search.
//!
//! The lattice is expressed as an undirected graph whose nodes are lattice points and whose edges carry the
//! grid's edge state. Every simple path from each start (and its mirror, under symmetry) is enumerated; each
//! time the path(s) stand on end nodes the induced partition is fingerprinted, and previously unseen
//! fingerprints are checked with the full validator. How much searching it takes to find how many solutions
//! drives the score.

use std::collections::{HashMap, HashSet, VecDeque};

use fixedbitset::FixedBitSet;
use itertools::Itertools;
use petgraph::graphmap::UnGraphMap;
use serde::{Deserialize, Serialize};

use crate::cell::{CellKind, HexagonKind, NodeKind};
use crate::grid::Grid;
use crate::location::{EdgeId, Point};
use crate::options::SearchLimits;
use crate::path::SolutionPath;
use crate::region::regions_from_edges;
use crate::validate::Validator;

/// Counters collected by [`analyze`].
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchStats {
    /// Distinct valid solutions found.
    pub solution_count: usize,
    /// Search nodes entered.
    pub total_nodes_visited: usize,
    /// Search nodes with more than one legal continuation.
    pub branching_points: usize,
    /// Whether the visit ceiling cut the search short.
    pub truncated: bool,
}

#[derive(Clone, Copy, Debug)]
struct EdgeInfo {
    edge: EdgeId,
    hexagon: Option<HexagonKind>,
    blocked: bool,
}

/// Express `grid` as a graph of lattice points.
fn lattice_graph(grid: &Grid) -> UnGraphMap<Point, EdgeInfo> {
    let mut graph = UnGraphMap::with_capacity(grid.node_count(), grid.all_edges().count());
    for point in grid.all_nodes() {
        graph.add_node(point);
    }
    for edge in grid.all_edges() {
        let (a, b) = edge.endpoints();
        let kind = grid.edge(edge);
        graph.add_edge(a, b, EdgeInfo { edge, hexagon: kind.hexagon(), blocked: !kind.is_traversable() });
    }
    graph
}

/// Structured summary of what a candidate solution does to the grid's symbols.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
struct Fingerprint {
    // symbol cells per region; every cell for regions whose verdict depends on their shape
    groups: Vec<Vec<usize>>,
    triangles: Vec<usize>,
    marks: FixedBitSet,
}

struct Search<'a> {
    grid: &'a Grid,
    graph: UnGraphMap<Point, EdgeInfo>,
    symmetric: bool,
    validator: Validator,
    node_markers: HashMap<Point, (usize, HexagonKind)>,
    edge_markers: HashMap<EdgeId, (usize, HexagonKind)>,
    // without erasers a missed marker always fails, so such paths need not be validated
    markers_required: bool,
    visited: FixedBitSet,
    marks: FixedBitSet,
    main: Vec<Point>,
    companion: Vec<Point>,
    fingerprints: HashSet<Fingerprint>,
    reach_cache: HashMap<(Point, FixedBitSet), bool>,
    reach_cache_cap: usize,
    visit_limit: usize,
    stats: SearchStats,
}

impl<'a> Search<'a> {
    fn new(grid: &'a Grid, limits: &SearchLimits) -> Self {
        let edge_markers = grid.all_edges()
            .filter_map(|edge| grid.edge(edge).hexagon().map(|kind| (edge, kind)))
            .enumerate()
            .map(|(index, (edge, kind))| (edge, (index, kind)))
            .collect::<HashMap<_, _>>();
        let node_markers = grid.all_nodes()
            .filter_map(|point| grid.node(point).hexagon().map(|kind| (point, kind)))
            .enumerate()
            .map(|(index, (point, kind))| (point, (edge_markers.len() + index, kind)))
            .collect::<HashMap<_, _>>();

        Self {
            grid,
            graph: lattice_graph(grid),
            symmetric: grid.symmetry.is_symmetric(),
            validator: Validator::with_limits(limits),
            markers_required: !grid.all_cells().any(|c| grid.cell(c).kind == CellKind::Eraser),
            visited: FixedBitSet::with_capacity(grid.node_count()),
            marks: FixedBitSet::with_capacity(edge_markers.len() + node_markers.len()),
            main: Vec::new(),
            companion: Vec::new(),
            fingerprints: HashSet::new(),
            reach_cache: HashMap::new(),
            reach_cache_cap: limits.reach_cache_cap,
            visit_limit: limits.visit_multiplier.saturating_mul(grid.node_count()),
            stats: SearchStats::default(),
            node_markers,
            edge_markers,
        }
    }

    fn mirror(&self, point: Point) -> Point {
        self.grid.symmetry.reflect(point, self.grid.cols, self.grid.rows)
    }

    fn info(&self, a: Point, b: Point) -> Option<EdgeInfo> {
        self.graph.edge_weight(a, b).copied().filter(|info| !info.blocked)
    }

    fn node_allowed(&self, point: Point, by_main: bool) -> bool {
        match self.grid.node(point).hexagon() {
            Some(HexagonKind::Symmetry) if self.symmetric => !by_main,
            Some(HexagonKind::Main) if self.symmetric => by_main,
            _ => true,
        }
    }

    fn edge_allowed(&self, info: &EdgeInfo, by_main: bool) -> bool {
        match info.hexagon {
            Some(HexagonKind::Symmetry) if self.symmetric => !by_main,
            Some(HexagonKind::Main) if self.symmetric => by_main,
            _ => true,
        }
    }

    /// Whether an end node is reachable from `from` without touching a visited node.
    fn can_reach_end(&mut self, from: Point) -> bool {
        let key = (from, self.visited.clone());
        if let Some(known) = self.reach_cache.get(&key) {
            return *known;
        }

        let mut seen = self.visited.clone();
        seen.insert(self.grid.node_index(from));
        let mut queue = VecDeque::from([from]);
        let mut found = false;
        while let Some(point) = queue.pop_front() {
            if self.grid.node(point) == NodeKind::End {
                found = true;
                break;
            }
            for (_, next, info) in self.graph.edges(point) {
                let index = self.grid.node_index(next);
                if !info.blocked && !seen.contains(index) {
                    seen.insert(index);
                    queue.push_back(next);
                }
            }
        }

        if self.reach_cache.len() >= self.reach_cache_cap {
            self.reach_cache.clear();
        }
        self.reach_cache.insert(key, found);
        found
    }

    /// Mark whatever markers `point` (and the edge leading to it) satisfy, returning the bits newly set.
    fn mark(&mut self, point: Point, via: Option<EdgeId>) -> Vec<usize> {
        let mut set = Vec::new();
        let node = self.node_markers.get(&point).map(|(index, _)| *index);
        let edge = via.and_then(|e| self.edge_markers.get(&e)).map(|(index, _)| *index);
        for index in node.into_iter().chain(edge) {
            if !self.marks.contains(index) {
                self.marks.insert(index);
                set.push(index);
            }
        }
        set
    }

    fn enter(&mut self, point: Point, mirror: Option<Point>, via: Option<(EdgeId, Option<EdgeId>)>) -> Vec<usize> {
        self.visited.insert(self.grid.node_index(point));
        self.main.push(point);
        let mut set = self.mark(point, via.map(|(edge, _)| edge));
        if let Some(mirror) = mirror {
            self.visited.insert(self.grid.node_index(mirror));
            self.companion.push(mirror);
            set.extend(self.mark(mirror, via.and_then(|(_, edge)| edge)));
        }
        set
    }

    fn leave(&mut self, point: Point, mirror: Option<Point>, set: Vec<usize>) {
        self.visited.set(self.grid.node_index(point), false);
        self.main.pop();
        if let Some(mirror) = mirror {
            self.visited.set(self.grid.node_index(mirror), false);
            self.companion.pop();
        }
        for index in set {
            self.marks.set(index, false);
        }
    }

    fn legal_moves(&mut self, point: Point) -> Vec<(Point, EdgeId, Option<EdgeId>)> {
        let candidates = self.graph.edges(point).map(|(_, next, info)| (next, *info)).collect_vec();
        let mut moves = Vec::with_capacity(candidates.len());

        for (next, info) in candidates {
            if info.blocked || self.visited.contains(self.grid.node_index(next)) {
                continue;
            }
            if !self.edge_allowed(&info, true) || !self.node_allowed(next, true) {
                continue;
            }

            let mirrored_edge = match self.symmetric {
                false => None,
                true => {
                    let (from, to) = (self.mirror(point), self.mirror(next));
                    if to == next || self.visited.contains(self.grid.node_index(to)) {
                        continue;
                    }
                    let Some(mirrored) = self.info(from, to) else {
                        continue;
                    };
                    if mirrored.edge == info.edge || !self.edge_allowed(&mirrored, false) || !self.node_allowed(to, false) {
                        continue;
                    }
                    Some(mirrored.edge)
                }
            };

            if !self.can_reach_end(next) {
                continue;
            }
            moves.push((next, info.edge, mirrored_edge));
        }

        moves
    }

    fn at_end(&self, point: Point, mirror: Option<Point>) -> bool {
        self.grid.node(point) == NodeKind::End && mirror.map_or(true, |m| self.grid.node(m) == NodeKind::End)
    }

    fn fingerprint(&self) -> Fingerprint {
        let traversed = SolutionPath::new(self.main.clone()).edges()
            .chain(SolutionPath::new(self.companion.clone()).edges())
            .collect::<HashSet<_>>();

        let groups = regions_from_edges(self.grid, &traversed).into_iter()
            .map(|region| {
                let shaped = region.cells.iter().any(|c| {
                    let kind = self.grid.cell(*c).kind;
                    kind.is_tetromino() || kind == CellKind::Eraser
                });
                region.cells.iter()
                    .filter(|c| shaped || self.grid.cell(**c).is_symbol())
                    .map(|c| self.grid.cell_index(*c))
                    .sorted()
                    .collect_vec()
            })
            .filter(|group| !group.is_empty())
            .sorted()
            .collect_vec();
        let triangles = self.grid.all_cells()
            .filter(|c| self.grid.cell(*c).kind == CellKind::Triangle)
            .map(|c| self.grid.cell_edges(c).iter().filter(|e| traversed.contains(e)).count())
            .collect_vec();

        Fingerprint { groups, triangles, marks: self.marks.clone() }
    }

    fn record(&mut self) {
        if self.markers_required && self.marks.count_ones(..) != self.marks.len() {
            return;
        }

        let fingerprint = self.fingerprint();
        if self.fingerprints.contains(&fingerprint) {
            return;
        }
        let valid = self.validator.validate(self.grid, &SolutionPath::new(self.main.clone())).is_valid;
        log::trace!("new fingerprint over {} groups, valid: {valid}", fingerprint.groups.len());
        self.fingerprints.insert(fingerprint);
        if valid {
            self.stats.solution_count += 1;
        }
    }

    fn visit(&mut self, point: Point, mirror: Option<Point>) {
        if self.stats.truncated {
            return;
        }
        self.stats.total_nodes_visited += 1;
        if self.stats.total_nodes_visited > self.visit_limit {
            self.stats.truncated = true;
            return;
        }

        if self.at_end(point, mirror) {
            self.record();
        }

        let moves = self.legal_moves(point);
        if moves.len() > 1 {
            self.stats.branching_points += 1;
        }
        for (next, edge, mirrored_edge) in moves {
            let next_mirror = mirror.map(|_| self.mirror(next));
            let set = self.enter(next, next_mirror, Some((edge, mirrored_edge)));
            self.visit(next, next_mirror);
            self.leave(next, next_mirror, set);
        }
    }

    fn run(&mut self, starts: &[Point]) {
        for start in starts.iter().copied() {
            if !self.grid.contains_node(start) || self.grid.node(start) != NodeKind::Start {
                continue;
            }
            let mirror = match self.symmetric {
                false => None,
                true => {
                    let mirror = self.mirror(start);
                    if mirror == start || self.grid.node(mirror) != NodeKind::Start {
                        continue;
                    }
                    Some(mirror)
                }
            };
            if !self.node_allowed(start, true) || mirror.is_some_and(|m| !self.node_allowed(m, false)) {
                continue;
            }

            let set = self.enter(start, mirror, None);
            self.visit(start, mirror);
            self.leave(start, mirror, set);
        }
    }
}

/// Search every path from `starts` (all start nodes when `None`).
pub fn analyze(grid: &Grid, starts: Option<&[Point]>) -> SearchStats {
    analyze_with_limits(grid, starts, &SearchLimits::default())
}

/// [`analyze`] under explicit ceilings.
pub fn analyze_with_limits(grid: &Grid, starts: Option<&[Point]>, limits: &SearchLimits) -> SearchStats {
    let starts = starts.map(<[Point]>::to_vec).unwrap_or_else(|| grid.starts());
    let mut search = Search::new(grid, limits);
    search.run(&starts);

    if search.stats.truncated {
        log::warn!("difficulty search stopped after {} visits", search.visit_limit);
    }
    log::debug!(
        "difficulty search: {} solutions, {} visits, {} branch points",
        search.stats.solution_count, search.stats.total_nodes_visited, search.stats.branching_points,
    );
    search.stats
}

/// Turn search counters into a score in `[0, 1]`; zero solutions score 0.
pub fn score(grid: &Grid, stats: &SearchStats) -> f64 {
    if stats.solution_count == 0 {
        return 0.0;
    }

    let visited = stats.total_nodes_visited.max(1) as f64;
    let mut raw = 0.45 * stats.branching_points as f64 / visited + 0.06 * visited.ln()
        - 0.07 * (stats.solution_count as f64).log2()
        + 0.15;

    let count_cells = |f: fn(CellKind) -> bool| grid.all_cells().filter(|c| f(grid.cell(*c).kind)).count() as f64;
    let edge_hexagons = grid.all_edges().filter(|e| grid.edge(*e).hexagon().is_some()).count() as f64;
    let node_hexagons = grid.all_nodes().filter(|p| grid.node(*p).hexagon().is_some()).count() as f64;
    raw -= (0.02 * edge_hexagons).min(0.15);
    raw += (0.02 * node_hexagons).min(0.1);
    raw += (0.05 * count_cells(|k| k.is_tetromino() && !k.is_negative())).min(0.2);
    raw += (0.04 * count_cells(|k| k == CellKind::Triangle)).min(0.15);
    raw += (0.07 * count_cells(|k| k.is_negative())).min(0.2);
    raw += (0.05 * count_cells(|k| k == CellKind::Eraser)).min(0.15);

    let cells = (grid.rows * grid.cols) as f64;
    let symbols = grid.symbol_cells().count() as f64;
    let density = (symbols / cells / 0.3).powf(0.5).min(1.0).max(0.35);
    let size = (0.75 + 0.25 * (cells / 16.0).sqrt()).min(1.25);

    (raw * density * size).clamp(0.01, 1.0)
}

/// Estimated difficulty of `grid` in `[0, 1]`, searching from `starts` (all start nodes when `None`).
pub fn difficulty(grid: &Grid, starts: Option<&[Point]>) -> f64 {
    score(grid, &analyze(grid, starts))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::GridBuilder;
    use crate::cell::{Cell, Color, EdgeKind};
    use crate::location::Dimension;

    fn dims(cols: usize, rows: usize) -> (Dimension, Dimension) {
        (Dimension::new(cols).unwrap(), Dimension::new(rows).unwrap())
    }

    #[test]
    fn open_grid_counts_partitions() {
        let grid = GridBuilder::with_dims(dims(1, 1))
            .add_start(Point::new(0, 1))
            .add_end(Point::new(1, 0))
            .build()
            .unwrap();
        let stats = analyze(&grid, None);
        // both routes around the lone cell cut nothing, so they share a fingerprint
        assert_eq!(stats.solution_count, 1);
        assert!(!stats.truncated);
        assert!(stats.branching_points >= 1);

        let d = difficulty(&grid, None);
        assert!(d > 0.0 && d <= 1.0);
    }

    #[test]
    fn unreachable_end_scores_zero() {
        let grid = GridBuilder::with_dims(dims(1, 1))
            .add_start(Point::new(0, 1))
            .add_end(Point::new(1, 0))
            .edge(EdgeId::Horizontal { row: 1, col: 0 }, EdgeKind::Broken)
            .edge(EdgeId::Vertical { row: 0, col: 0 }, EdgeKind::Broken)
            .build()
            .unwrap();
        assert_eq!(analyze(&grid, None).solution_count, 0);
        assert_eq!(difficulty(&grid, None), 0.0);
    }

    #[test]
    fn conflicting_squares_need_a_separating_path() {
        // two differently colored squares can only be split by the path
        let grid = GridBuilder::with_dims(dims(2, 1))
            .add_start(Point::new(0, 1))
            .add_end(Point::new(2, 0))
            .cell(Point::new(0, 0), Cell::square(Color::Black))
            .cell(Point::new(1, 0), Cell::square(Color::White))
            .build()
            .unwrap();
        let stats = analyze(&grid, None);
        assert_eq!(stats.solution_count, 1);
    }
}

use std::collections::HashSet;

use itertools::Itertools;
use serde::{Deserialize, Serialize};
use unordered_pair::UnorderedPair;

use crate::cell::NodeKind;
use crate::grid::Grid;
use crate::location::{EdgeId, Point};

/// A drawn line: an ordered list of lattice points from a Start node to an End node.
#[derive(Clone, Debug, Default, Eq, Hash, PartialEq, Serialize, Deserialize)]
pub struct SolutionPath {
    /// Visited lattice points in drawing order.
    pub points: Vec<Point>,
}

/// Structural defects of a single path.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize, thiserror::Error)]
#[serde(rename_all = "camelCase")]
pub enum PathFault {
    #[error("a path needs at least two points")]
    TooShort,
    #[error("path leaves the lattice")]
    OutOfBounds,
    #[error("path does not begin on a start node")]
    NotAtStart,
    #[error("path does not finish on an end node")]
    NotAtEnd,
    #[error("consecutive path points are not adjacent")]
    NotAdjacent,
    #[error("path visits a node twice")]
    RepeatedNode,
    #[error("path traverses an edge twice")]
    RepeatedEdge,
    #[error("path crosses a broken or absent edge")]
    BlockedEdge,
}

impl SolutionPath {
    /// A path through `points`, in drawing order.
    pub fn new(points: Vec<Point>) -> Self {
        Self { points }
    }

    /// Consecutive point pairs, in drawing order.
    pub fn segments(&self) -> impl Iterator<Item = UnorderedPair<Point>> + '_ {
        self.points.iter().tuple_windows().map(|(a, b)| UnorderedPair::from((*a, *b)))
    }

    /// Edges traversed, in drawing order. Non-adjacent steps are skipped.
    pub fn edges(&self) -> impl Iterator<Item = EdgeId> + '_ {
        self.segments().filter_map(|pair| EdgeId::try_from(pair).ok())
    }

    /// The companion path implied by `grid`'s symmetry mode.
    pub fn mirrored(&self, grid: &Grid) -> Self {
        Self {
            points: self.points.iter().map(|p| grid.symmetry.reflect(*p, grid.cols, grid.rows)).collect_vec(),
        }
    }

    /// Check the path-structural rules against `grid`.
    pub fn check(&self, grid: &Grid) -> Result<(), PathFault> {
        if self.points.len() < 2 {
            return Err(PathFault::TooShort);
        }
        if self.points.iter().any(|p| !grid.contains_node(*p)) {
            return Err(PathFault::OutOfBounds);
        }
        if self.points.first().is_some_and(|p| grid.node(*p) != NodeKind::Start) {
            return Err(PathFault::NotAtStart);
        }
        if self.points.last().is_some_and(|p| grid.node(*p) != NodeKind::End) {
            return Err(PathFault::NotAtEnd);
        }

        let mut seen = HashSet::with_capacity(self.points.len());
        if !self.points.iter().all(|p| seen.insert(*p)) {
            return Err(PathFault::RepeatedNode);
        }

        let mut traversed = HashSet::with_capacity(self.points.len());
        for pair in self.segments() {
            let edge = EdgeId::try_from(pair).map_err(|_| PathFault::NotAdjacent)?;
            if !traversed.insert(edge) {
                return Err(PathFault::RepeatedEdge);
            }
            if !grid.edge(edge).is_traversable() {
                return Err(PathFault::BlockedEdge);
            }
        }

        Ok(())
    }
}

/// Ways a main path and its companion may collide.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize, thiserror::Error)]
#[serde(rename_all = "camelCase")]
pub enum Collision {
    #[error("the paths meet at a node")]
    SharedNode,
    #[error("the paths share an edge")]
    SharedEdge,
    #[error("a path crosses an edge that is its own mirror image")]
    SelfMirroredEdge,
}

/// The main path together with its companion, if the grid is symmetric, plus their traversal sets.
#[derive(Clone, Debug)]
pub struct PathSet {
    pub(crate) main: SolutionPath,
    pub(crate) companion: Option<SolutionPath>,
    pub(crate) main_edges: HashSet<EdgeId>,
    pub(crate) companion_edges: HashSet<EdgeId>,
    pub(crate) main_nodes: HashSet<Point>,
    pub(crate) companion_nodes: HashSet<Point>,
}

impl PathSet {
    /// Pair `main` with its mirror image when `grid` is symmetric.
    ///
    /// A path leaving the lattice has no companion; [`check`](Self::check) then rejects it as out of bounds.
    pub fn new(grid: &Grid, main: &SolutionPath) -> Self {
        let on_lattice = main.points.iter().all(|p| grid.contains_node(*p));
        let companion = (grid.symmetry.is_symmetric() && on_lattice).then(|| main.mirrored(grid));
        let companion_edges = companion.as_ref().map(|c| c.edges().collect()).unwrap_or_default();
        let companion_nodes = companion.as_ref().map(|c| c.points.iter().copied().collect()).unwrap_or_default();

        Self {
            main_edges: main.edges().collect(),
            main_nodes: main.points.iter().copied().collect(),
            main: main.clone(),
            companion,
            companion_edges,
            companion_nodes,
        }
    }

    /// Check both paths structurally, then check that they do not collide.
    pub(crate) fn check(&self, grid: &Grid) -> Result<(), crate::validate::InvalidReason> {
        use crate::validate::InvalidReason;

        self.main.check(grid).map_err(InvalidReason::Path)?;
        let Some(companion) = &self.companion else {
            return Ok(());
        };
        companion.check(grid).map_err(InvalidReason::CompanionPath)?;

        if self.main.edges().any(|edge| grid.symmetry.reflect_edge(edge, grid.cols, grid.rows) == edge) {
            return Err(InvalidReason::Collision(Collision::SelfMirroredEdge));
        }
        if !self.main_edges.is_disjoint(&self.companion_edges) {
            return Err(InvalidReason::Collision(Collision::SharedEdge));
        }
        if !self.main_nodes.is_disjoint(&self.companion_nodes) {
            return Err(InvalidReason::Collision(Collision::SharedNode));
        }

        Ok(())
    }

    /// Every edge traversed by either path.
    pub fn traversed(&self) -> HashSet<EdgeId> {
        self.main_edges.union(&self.companion_edges).copied().collect()
    }

    /// Whether `edge` is traversed by the main path (`by_main`) or the companion.
    pub(crate) fn has_edge(&self, edge: EdgeId, by_main: bool) -> bool {
        match by_main {
            true => self.main_edges.contains(&edge),
            false => self.companion_edges.contains(&edge),
        }
    }

    /// Whether node `point` is visited by the main path (`by_main`) or the companion.
    pub(crate) fn has_node(&self, point: Point, by_main: bool) -> bool {
        match by_main {
            true => self.main_nodes.contains(&point),
            false => self.companion_nodes.contains(&point),
        }
    }
}

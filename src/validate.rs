//! Whole-puzzle validation: path structure, collisions, must-pass markers, then per-region rules with erasers.

use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::eraser::Negotiation;
use crate::grid::Grid;
use crate::location::{EdgeId, Point};
use crate::options::SearchLimits;
use crate::path::{Collision, PathFault, PathSet, SolutionPath};
use crate::region::{external_cells, regions_for, Region};
use crate::tetromino::TetrominoPacker;

/// Why a solution was rejected.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize, thiserror::Error)]
#[serde(rename_all = "camelCase", tag = "kind", content = "detail")]
pub enum InvalidReason {
    /// The main path is structurally broken.
    #[error("invalid path: {0}")]
    Path(PathFault),
    /// The mirrored path is structurally broken.
    #[error("invalid symmetric path: {0}")]
    CompanionPath(PathFault),
    /// The main and mirrored paths collide.
    #[error("paths collide: {0}")]
    Collision(Collision),
    /// A must-pass marker was not traversed and no eraser accounts for it.
    #[error("a hexagon was missed")]
    MissedHexagon,
    /// Some region breaks a symbol rule that erasers cannot fix.
    #[error("a region breaks a symbol rule")]
    RuleViolation,
}

/// The outcome of checking a solution against a grid.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    /// Whether the solution is accepted.
    pub is_valid: bool,
    /// Symbol cells left in violation.
    pub error_cells: Vec<Point>,
    /// Unclaimed missed edge hexagons.
    pub error_edges: Vec<EdgeId>,
    /// Unclaimed missed node hexagons.
    pub error_nodes: Vec<Point>,
    /// Symbols and erasers cancelled during negotiation.
    pub invalidated_cells: Vec<Point>,
    /// Missed edge hexagons cancelled by an eraser.
    pub invalidated_edges: Vec<EdgeId>,
    /// Missed node hexagons cancelled by an eraser.
    pub invalidated_nodes: Vec<Point>,
    /// The regions the path(s) cut the grid into, without external cells.
    pub regions: Vec<Region>,
    /// The first failure, when invalid.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub error_reason: Option<InvalidReason>,
}

impl ValidationResult {
    fn rejected(reason: InvalidReason) -> Self {
        Self { error_reason: Some(reason), ..Default::default() }
    }
}

/// Validates solutions, reusing one tiling memo across calls.
pub struct Validator {
    packer: TetrominoPacker,
    limits: SearchLimits,
}

impl Default for Validator {
    fn default() -> Self {
        Self::with_limits(&SearchLimits::default())
    }
}

impl Validator {
    /// A validator with default limits.
    pub fn new() -> Self {
        Self::default()
    }

    /// A validator bounded by the tiling and negotiation ceilings of `limits`.
    pub fn with_limits(limits: &SearchLimits) -> Self {
        Self {
            packer: TetrominoPacker::with_limits(limits.packer_nodes, limits.memo_cap),
            limits: limits.clone(),
        }
    }

    /// Check `path` against `grid`.
    pub fn validate(&mut self, grid: &Grid, path: &SolutionPath) -> ValidationResult {
        let paths = PathSet::new(grid, path);
        if let Err(reason) = paths.check(grid) {
            log::debug!("rejecting path: {reason}");
            return ValidationResult::rejected(reason);
        }

        let symmetric = grid.symmetry.is_symmetric();
        let satisfied = |kind: crate::cell::HexagonKind, visited: &dyn Fn(bool) -> bool| {
            [true, false].into_iter()
                .filter(|by_main| *by_main || symmetric)
                .any(|by_main| visited(by_main) && kind.satisfied_by(by_main, symmetric))
        };

        let missed_edges = grid.all_edges()
            .filter(|edge| grid.edge(*edge).hexagon().is_some_and(|kind| !satisfied(kind, &|m| paths.has_edge(*edge, m))))
            .collect_vec();
        let missed_nodes = grid.all_nodes()
            .filter(|node| grid.node(*node).hexagon().is_some_and(|kind| !satisfied(kind, &|m| paths.has_node(*node, m))))
            .collect_vec();

        let external = external_cells(grid);
        let regions = regions_for(grid, &paths).into_iter()
            .map(|region| Region { cells: region.cells.into_iter().filter(|c| !external[c.as_index()]).collect_vec() })
            .filter(|region| !region.is_empty())
            .collect_vec();

        let traversed = paths.traversed();
        Negotiation::new(grid, &traversed, &mut self.packer, &self.limits).resolve(regions, &missed_edges, &missed_nodes)
    }
}

/// Check `path` against `grid` with a fresh [`Validator`].
pub fn validate(grid: &Grid, path: &SolutionPath) -> ValidationResult {
    Validator::new().validate(grid, path)
}

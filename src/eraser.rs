//! Eraser negotiation.
//!
//! Every eraser must cancel exactly one thing in its region: a violating symbol, a missed must-pass marker
//! next to the region, or another eraser. A cancellation is only accepted when it is needed, i.e. restoring the
//! cancelled item would break the region again. Markers can border several regions, so a final backtracking
//! pass decides which region accounts for each missed marker.

use std::cmp::Reverse;
use std::collections::HashSet;

use itertools::Itertools;

use crate::cell::CellKind;
use crate::grid::Grid;
use crate::location::{EdgeId, Point};
use crate::options::SearchLimits;
use crate::region::Region;
use crate::rules::region_errors;
use crate::tetromino::TetrominoPacker;
use crate::validate::{InvalidReason, ValidationResult};

/// A must-pass marker the path(s) failed to traverse.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Marker {
    /// A hexagon drawn on an edge.
    Edge(EdgeId),
    /// A hexagon drawn on a node.
    Node(Point),
}

impl Marker {
    fn touches(&self, grid: &Grid, region: &Region) -> bool {
        let cells = match self {
            Self::Edge(edge) => grid.edge_cells(*edge),
            Self::Node(point) => grid.node_cells(*point),
        };
        cells.into_iter().any(|cell| region.contains(cell))
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Item {
    Cell(Point),
    Marker(usize),
}

/// One accepted way of spending a region's erasers.
#[derive(Clone, Debug, Default)]
struct Candidate {
    negated: Vec<Point>,
    claimed: Vec<usize>,
    erasers: Vec<Point>,
}

impl Candidate {
    // fewest invalidated items, then markers before symbols, then fewest cells
    fn rank(&self) -> (usize, Reverse<usize>, usize) {
        let cells = self.negated.len() + self.erasers.len();
        (cells + self.claimed.len(), Reverse(self.claimed.len()), cells)
    }
}

/// The least bad configuration of a region without any valid one, kept for error reporting.
#[derive(Clone, Debug, Default)]
struct Fallback {
    errors: Vec<Point>,
    negated: Vec<Point>,
    claimed: Vec<usize>,
}

#[derive(Debug, Default)]
struct RegionOutcome {
    candidates: Vec<Candidate>,
    fallback: Fallback,
}

/// Eraser negotiation over one drawn solution.
pub struct Negotiation<'a> {
    grid: &'a Grid,
    traversed: &'a HashSet<EdgeId>,
    packer: &'a mut TetrominoPacker,
    config_limit: usize,
}

impl<'a> Negotiation<'a> {
    /// Negotiate on `grid` with `traversed` holding every edge drawn by either path. `limits.negotiation_cap`
    /// bounds the configurations tried per region and the steps of the cross-region assignment.
    pub fn new(grid: &'a Grid, traversed: &'a HashSet<EdgeId>, packer: &'a mut TetrominoPacker, limits: &SearchLimits) -> Self {
        Self { grid, traversed, packer, config_limit: limits.negotiation_cap }
    }

    fn errors(&mut self, region: &Region, active: &[Point]) -> Vec<Point> {
        region_errors(self.grid, &region.cells, active, self.traversed, self.packer)
    }

    fn negotiate(&mut self, region: &Region, markers: &[Marker]) -> RegionOutcome {
        let symbols = region.cells.iter().filter(|c| self.grid.cell(**c).is_symbol()).copied().collect_vec();
        let (erasers, others): (Vec<Point>, Vec<Point>) = symbols.iter().partition(|c| self.grid.cell(**c).kind == CellKind::Eraser);

        let base_errors = self.errors(region, &symbols);
        if erasers.is_empty() {
            return match base_errors.is_empty() {
                true => RegionOutcome { candidates: vec![Candidate::default()], fallback: Fallback::default() },
                false => RegionOutcome { candidates: vec![], fallback: Fallback { errors: base_errors, ..Default::default() } },
            };
        }

        let items = others.iter().map(|c| Item::Cell(*c))
            .chain(markers.iter().enumerate().filter(|(_, m)| m.touches(self.grid, region)).map(|(index, _)| Item::Marker(index)))
            .collect_vec();

        // leaving the erasers unused is always possible, but every one of them is then an error
        let mut fallback = Fallback {
            errors: base_errors.iter().chain(erasers.iter()).copied().collect_vec(),
            ..Default::default()
        };
        let mut candidates = Vec::new();
        let mut evaluated = 0usize;

        'search: for pairs in 0..=erasers.len() / 2 {
            let spent = erasers.len() - 2 * pairs;
            if spent > items.len() {
                continue;
            }

            for paired in erasers.iter().copied().combinations(2 * pairs) {
                for negated_items in items.iter().copied().combinations(spent) {
                    evaluated += 1;
                    if evaluated > self.config_limit {
                        log::warn!("eraser negotiation stopped after {} configurations", self.config_limit);
                        break 'search;
                    }

                    let negated = negated_items.iter().filter_map(|item| match item {
                        Item::Cell(cell) => Some(*cell),
                        Item::Marker(_) => None,
                    }).collect_vec();
                    let claimed = negated_items.iter().filter_map(|item| match item {
                        Item::Marker(index) => Some(*index),
                        Item::Cell(_) => None,
                    }).collect_vec();
                    let active = symbols.iter()
                        .filter(|c| !paired.contains(c) && !negated.contains(c))
                        .copied()
                        .collect_vec();

                    let errors = self.errors(region, &active);
                    // restoring a needed cancellation must break the region again; markers always do
                    let redundant = match errors.is_empty() {
                        true => negated.iter().filter(|cell| {
                            let mut restored = active.clone();
                            restored.push(**cell);
                            self.errors(region, &restored).is_empty()
                        }).count(),
                        false => 0,
                    };

                    if errors.is_empty() && redundant == 0 {
                        candidates.push(Candidate { negated, claimed, erasers: erasers.clone() });
                        continue;
                    }

                    let score = errors.len() + redundant;
                    if score < fallback.errors.len() {
                        let wasted = erasers.iter().filter(|e| !paired.contains(e)).take(redundant).copied();
                        fallback = Fallback { errors: errors.into_iter().chain(wasted).collect_vec(), negated, claimed };
                    }
                }
            }
        }

        candidates.sort_by_key(Candidate::rank);
        RegionOutcome { candidates, fallback }
    }
}

/// Depth-first choice of one candidate per region so that every missed marker is claimed exactly once.
struct Assignment<'a> {
    outcomes: &'a [RegionOutcome],
    // index of the last region able to claim each marker
    last_claimant: Vec<Option<usize>>,
    claims: Vec<usize>,
    chosen: Vec<usize>,
    steps: usize,
    step_limit: usize,
}

impl Assignment<'_> {
    fn solve(&mut self, region: usize) -> bool {
        self.steps += 1;
        if self.steps > self.step_limit {
            return false;
        }
        if region == self.outcomes.len() {
            return self.claims.iter().all(|count| *count == 1);
        }

        for (index, candidate) in self.outcomes[region].candidates.iter().enumerate() {
            if candidate.claimed.iter().any(|marker| self.claims[*marker] > 0) {
                continue;
            }

            candidate.claimed.iter().for_each(|marker| self.claims[*marker] += 1);
            // a marker nobody later can claim must be settled by now
            let settled = self.last_claimant.iter()
                .zip(&self.claims)
                .all(|(last, count)| *last != Some(region) || *count == 1);
            if settled {
                self.chosen.push(index);
                if self.solve(region + 1) {
                    return true;
                }
                self.chosen.pop();
            }
            candidate.claimed.iter().for_each(|marker| self.claims[*marker] -= 1);
        }

        false
    }
}

impl Negotiation<'_> {
    /// Negotiate erasers across `regions` and assemble the validation outcome.
    ///
    /// `missed_edges` and `missed_nodes` are the must-pass markers not traversed as required.
    pub fn resolve(mut self, regions: Vec<Region>, missed_edges: &[EdgeId], missed_nodes: &[Point]) -> ValidationResult {
        let grid = self.grid;
        let markers = missed_edges.iter().map(|e| Marker::Edge(*e))
            .chain(missed_nodes.iter().map(|p| Marker::Node(*p)))
            .collect_vec();

        let outcomes = regions.iter().map(|region| self.negotiate(region, &markers)).collect_vec();

        let last_claimant = markers.iter()
            .map(|marker| regions.iter().rposition(|region| marker.touches(grid, region)))
            .collect_vec();
        let all_regions_valid = outcomes.iter().all(|outcome| !outcome.candidates.is_empty());
        let mut assignment = Assignment {
            outcomes: &outcomes,
            claims: vec![0; markers.len()],
            last_claimant,
            chosen: Vec::with_capacity(outcomes.len()),
            steps: 0,
            step_limit: self.config_limit,
        };
        let assigned = all_regions_valid && markers.iter().all(|m| regions.iter().any(|r| m.touches(grid, r))) && assignment.solve(0);

        let mut result = ValidationResult { is_valid: assigned, ..Default::default() };
        let mut claim_counts = vec![0usize; markers.len()];
        let mut invalidated_markers = Vec::new();

        for (region, outcome) in outcomes.iter().enumerate() {
            let (negated, claimed, erasers, errors) = match (assigned, outcome.candidates.first()) {
                (true, _) => {
                    let candidate = &outcome.candidates[assignment.chosen[region]];
                    (&candidate.negated, &candidate.claimed, candidate.erasers.clone(), vec![])
                }
                (false, Some(best)) => (&best.negated, &best.claimed, best.erasers.clone(), vec![]),
                (false, None) => (&outcome.fallback.negated, &outcome.fallback.claimed, vec![], outcome.fallback.errors.clone()),
            };

            result.invalidated_cells.extend(negated.iter().chain(erasers.iter().filter(|e| !errors.contains(e))));
            result.error_cells.extend(errors);
            for marker in claimed {
                claim_counts[*marker] += 1;
                invalidated_markers.push(*marker);
            }
        }

        for (index, marker) in markers.iter().enumerate() {
            let faulty = !assigned && claim_counts[index] != 1;
            match (marker, faulty) {
                (Marker::Edge(edge), true) => result.error_edges.push(*edge),
                (Marker::Node(point), true) => result.error_nodes.push(*point),
                (Marker::Edge(edge), false) if invalidated_markers.contains(&index) => result.invalidated_edges.push(*edge),
                (Marker::Node(point), false) if invalidated_markers.contains(&index) => result.invalidated_nodes.push(*point),
                _ => {}
            }
        }

        if !result.is_valid {
            result.error_reason = Some(match result.error_cells.is_empty() {
                true => InvalidReason::MissedHexagon,
                false => InvalidReason::RuleViolation,
            });
        }
        result.invalidated_cells = result.invalidated_cells.into_iter().unique().collect_vec();
        result.error_cells = result.error_cells.into_iter().unique().collect_vec();
        result.regions = regions;
        result
    }
}

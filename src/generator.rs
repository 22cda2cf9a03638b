//! Puzzle generation.
//!
//! A generation attempt samples a solution path first, then decorates the regions it induces with symbols
//! the path satisfies. The decorated grid is validated against the sampled path, screened for ambiguous
//! starts and scored; the attempt closest to the requested difficulty wins.

use std::collections::HashSet;

use fixedbitset::FixedBitSet;
use itertools::Itertools;

use crate::cell::{Cell, CellKind, Color, EdgeKind, NodeKind};
use crate::difficulty::{analyze_with_limits, score};
use crate::grid::Grid;
use crate::location::{EdgeId, Point};
use crate::options::{GenerationOptions, SearchLimits};
use crate::path::SolutionPath;
use crate::polyomino::Polyomino;
use crate::region::{regions, Region};
use crate::rng::PuzzleRng;
use crate::symmetry::SymmetryType;
use crate::validate::Validator;

const DIFFICULTY_TOLERANCE: f64 = 0.1;
const AMBIGUITY_RATIO: f64 = 0.9;

/// A generated grid together with the path it was built around.
#[derive(Clone, Debug)]
pub struct Generated {
    /// The puzzle.
    pub grid: Grid,
    /// The sampled solution; `None` only for the bare fallback grid.
    pub solution: Option<SolutionPath>,
    /// Estimated difficulty of `grid`.
    pub difficulty: f64,
    /// Whether no attempt carried every requested symbol family and a plainer grid was returned.
    pub fallback: bool,
}

/// The symbol families an attempt can be asked to contain.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
enum Family {
    Hexagon,
    Square,
    Star,
    Tetromino,
    NegativeTetromino,
    Triangle,
    Eraser,
}

impl Family {
    fn present_in(&self, grid: &Grid) -> bool {
        let has_cell = |f: fn(CellKind) -> bool| grid.all_cells().any(|c| f(grid.cell(c).kind));
        match self {
            Self::Hexagon => grid.all_edges().any(|e| grid.edge(e).hexagon().is_some())
                || grid.all_nodes().any(|p| grid.node(p).hexagon().is_some()),
            Self::Square => has_cell(|k| k == CellKind::Square),
            Self::Star => has_cell(|k| k == CellKind::Star),
            Self::Tetromino => has_cell(|k| k.is_tetromino() && !k.is_negative()),
            Self::NegativeTetromino => has_cell(|k| k.is_negative()),
            Self::Triangle => has_cell(|k| k == CellKind::Triangle),
            Self::Eraser => has_cell(|k| k == CellKind::Eraser),
        }
    }
}

/// A sampled main path and, under symmetry, its companion.
struct Sample {
    main: Vec<Point>,
    companion: Option<Vec<Point>>,
}

impl Sample {
    fn traversed(&self) -> HashSet<EdgeId> {
        let main = SolutionPath::new(self.main.clone());
        let companion = self.companion.clone().map(SolutionPath::new);
        main.edges().chain(companion.iter().flat_map(|c| c.edges().collect_vec())).collect()
    }
}

/// Randomized depth-first search for a path of roughly `target` edges.
struct PathSampler<'a> {
    grid: &'a Grid,
    rng: &'a mut PuzzleRng,
    target: usize,
    budget: usize,
    visited: FixedBitSet,
    main: Vec<Point>,
    companion: Vec<Point>,
    best: Option<Sample>,
}

impl PathSampler<'_> {
    fn mirror(&self, point: Point) -> Option<Point> {
        self.grid.symmetry.is_symmetric().then(|| self.grid.symmetry.reflect(point, self.grid.cols, self.grid.rows))
    }

    fn distance(&self, len: usize) -> usize {
        len.abs_diff(self.target)
    }

    fn nearest_end(&self, point: Point) -> usize {
        self.grid.ends().iter().map(|end| end.manhattan(&point)).min().unwrap_or(0)
    }

    fn moves(&mut self, point: Point) -> Vec<Point> {
        let mut moves = self.grid.open_neighbors(point)
            .filter(|(_, next)| !self.visited.contains(self.grid.node_index(*next)))
            .filter(|(edge, next)| match self.mirror(*next) {
                None => true,
                Some(mirrored) => {
                    let mirrored_edge = self.grid.symmetry.reflect_edge(*edge, self.grid.cols, self.grid.rows);
                    mirrored != *next
                        && mirrored_edge != *edge
                        && !self.visited.contains(self.grid.node_index(mirrored))
                        && self.grid.edge(mirrored_edge).is_traversable()
                }
            })
            .map(|(_, next)| next)
            .collect_vec();

        self.rng.shuffle(&mut moves);
        if self.main.len() > self.target {
            moves.sort_by_key(|next| self.nearest_end(*next));
        }
        moves
    }

    /// Returns `true` once the search should stop.
    fn walk(&mut self, point: Point) -> bool {
        if self.budget == 0 {
            return true;
        }
        self.budget -= 1;

        let mirror = self.mirror(point);
        let at_end = self.grid.node(point) == NodeKind::End && mirror.map_or(true, |m| self.grid.node(m) == NodeKind::End);
        if at_end {
            let len = self.main.len() - 1;
            let better = self.best.as_ref().map_or(true, |best| self.distance(len) < self.distance(best.main.len() - 1));
            if better {
                self.best = Some(Sample { main: self.main.clone(), companion: mirror.map(|_| self.companion.clone()) });
            }
            if len >= self.target {
                return true;
            }
        }

        for next in self.moves(point) {
            let next_mirror = self.mirror(next);
            self.visited.insert(self.grid.node_index(next));
            self.main.push(next);
            if let Some(m) = next_mirror {
                self.visited.insert(self.grid.node_index(m));
                self.companion.push(m);
            }

            let stop = self.walk(next);

            self.visited.set(self.grid.node_index(next), false);
            self.main.pop();
            if let Some(m) = next_mirror {
                self.visited.set(self.grid.node_index(m), false);
                self.companion.pop();
            }
            if stop {
                return true;
            }
        }

        false
    }
}

/// Builds puzzles for one seeded session.
pub struct Generator {
    options: GenerationOptions,
    limits: SearchLimits,
    rng: PuzzleRng,
    validator: Validator,
}

impl Generator {
    /// A generator with default search limits.
    pub fn new(options: GenerationOptions) -> Self {
        Self::with_limits(options, SearchLimits::default())
    }

    /// A generator bounded by `limits` instead of the defaults.
    pub fn with_limits(options: GenerationOptions, limits: SearchLimits) -> Self {
        Self {
            rng: PuzzleRng::new(options.rng_type, &options.seed),
            validator: Validator::with_limits(&limits),
            options,
            limits,
        }
    }

    /// Generate a `rows` by `cols` grid.
    pub fn generate(&mut self, rows: usize, cols: usize) -> Grid {
        self.generate_with_solution(rows, cols).grid
    }

    /// Generate a `rows` by `cols` grid, also returning the path it was built around.
    pub fn generate_with_solution(&mut self, rows: usize, cols: usize) -> Generated {
        let base = self.base_grid(rows.max(1), cols.max(1));
        let requested = self.requested();
        let target = self.options.difficulty.clamp(0.0, 1.0);

        let mut best: Option<Generated> = None;
        let mut budget = self.limits.attempts;
        let mut attempt = 0;
        while attempt < budget {
            attempt += 1;
            let Some(sample) = self.sample_path(&base) else {
                log::trace!("attempt {attempt}: no path sampled");
                continue;
            };
            let regions = self.sample_regions(&base, &sample);

            for _ in 0..self.limits.placement_retries {
                let Some(candidate) = self.attempt(&base, &sample, &regions, &requested, true) else {
                    continue;
                };
                log::trace!("attempt {attempt}: difficulty {:.3}", candidate.difficulty);
                let closer = best.as_ref().map_or(true, |b| (candidate.difficulty - target).abs() < (b.difficulty - target).abs());
                if closer {
                    best = Some(candidate);
                }
            }

            budget = self.next_budget(budget, attempt, best.as_ref().map(|b| (b.difficulty - target).abs()));
        }

        if let Some(best) = best {
            log::debug!("generated {rows}x{cols} grid at difficulty {:.3} after {attempt} attempts", best.difficulty);
            return best;
        }

        log::debug!("no attempt met the requested features, falling back");
        self.fallback(base)
    }

    /// Shrink the budget once the best candidate is within tolerance; once it runs out, extend it by more
    /// attempts the further the best candidate is from the target, never past the cap.
    fn next_budget(&self, budget: usize, attempt: usize, gap: Option<f64>) -> usize {
        let gap = gap.unwrap_or(1.0);
        if gap <= DIFFICULTY_TOLERANCE {
            return budget.min(attempt + 2);
        }
        if attempt < budget {
            return budget;
        }
        let extra = (gap / DIFFICULTY_TOLERANCE).ceil() as usize;
        budget.max(budget.saturating_add(extra).min(self.limits.attempt_cap))
    }

    fn fallback(&mut self, base: Grid) -> Generated {
        for _ in 0..self.limits.fallback_attempts {
            let Some(sample) = self.sample_path(&base) else {
                continue;
            };
            let regions = self.sample_regions(&base, &sample);
            if let Some(found) = self.attempt(&base, &sample, &regions, &[], false) {
                return Generated { fallback: true, ..found };
            }
        }

        let stats = analyze_with_limits(&base, None, &self.limits);
        Generated { difficulty: score(&base, &stats), grid: base, solution: None, fallback: true }
    }

    fn requested(&self) -> Vec<Family> {
        let o = &self.options;
        [
            (o.use_hexagons, Family::Hexagon),
            (o.use_squares, Family::Square),
            (o.use_stars, Family::Star),
            (o.use_tetris, Family::Tetromino),
            (o.use_tetris_negative, Family::NegativeTetromino),
            (o.use_triangles, Family::Triangle),
            (o.use_eraser, Family::Eraser),
        ]
        .into_iter()
        .filter_map(|(wanted, family)| wanted.then_some(family))
        .collect_vec()
    }

    fn terminals(&self, rows: usize, cols: usize) -> (Vec<Point>, Vec<Point>) {
        let symmetry = self.options.symmetry;
        let in_bounds = |p: &Point| p.x <= cols && p.y <= rows;
        let default_end = match symmetry {
            SymmetryType::Rotational => Point::new(0, 0),
            _ => Point::new(cols, 0),
        };

        let pick = |explicit: &Option<Vec<Point>>, fallback: Point| {
            let points = explicit.iter().flatten().copied().filter(in_bounds).collect_vec();
            match points.is_empty() {
                true => vec![fallback],
                false => points,
            }
        };
        let mut starts = pick(&self.options.starts, Point::new(0, rows));
        let mut ends = pick(&self.options.ends, default_end);

        if symmetry.is_symmetric() {
            let mirrored = |points: &[Point]| points.iter()
                .flat_map(|p| [*p, symmetry.reflect(*p, cols, rows)])
                .unique()
                .collect_vec();
            starts = mirrored(&starts);
            ends = mirrored(&ends);
        }
        ends.retain(|p| !starts.contains(p));
        if ends.is_empty() {
            ends.push(Point::new(cols, 0));
            starts.retain(|p| *p != Point::new(cols, 0));
        }
        (starts, ends)
    }

    fn base_grid(&self, rows: usize, cols: usize) -> Grid {
        let (starts, ends) = self.terminals(rows, cols);
        let mut grid = Grid::blank(cols, rows);
        grid.symmetry = self.options.symmetry;
        grid.seed = self.options.seed.clone();
        for start in starts {
            grid.set_node(start, NodeKind::Start);
        }
        for end in ends {
            grid.set_node(end, NodeKind::End);
        }
        grid
    }

    fn target_length(&self, grid: &Grid) -> usize {
        let min = grid.rows + grid.cols;
        let max = (grid.rows + 1) * (grid.cols + 1) - 1;
        let (min, max) = match grid.symmetry.is_symmetric() {
            true => (min / 2, max / 2),
            false => (min, max),
        };
        let fraction = self.options.path_length.clamp(0.0, 1.0);
        (min as f64 + fraction * max.saturating_sub(min) as f64).round() as usize
    }

    fn sample_path(&mut self, base: &Grid) -> Option<Sample> {
        let target = self.target_length(base);
        let starts = base.starts();
        let mut best: Option<Sample> = None;

        for _ in 0..self.limits.path_samples {
            let Some(start) = self.rng.pick(&starts).copied() else {
                return None;
            };
            let mirror = base.symmetry.is_symmetric().then(|| base.symmetry.reflect(start, base.cols, base.rows));
            if mirror.is_some_and(|m| m == start || base.node(m) != NodeKind::Start) {
                continue;
            }

            let mut sampler = PathSampler {
                grid: base,
                rng: &mut self.rng,
                target,
                budget: 50 * base.node_count(),
                visited: FixedBitSet::with_capacity(base.node_count()),
                main: vec![start],
                companion: mirror.into_iter().collect_vec(),
                best: None,
            };
            sampler.visited.insert(base.node_index(start));
            if let Some(m) = mirror {
                sampler.visited.insert(base.node_index(m));
            }
            sampler.walk(start);

            if let Some(found) = sampler.best {
                let distance = |s: &Sample| (s.main.len() - 1).abs_diff(target);
                if best.as_ref().map_or(true, |b| distance(&found) < distance(b)) {
                    best = Some(found);
                }
            }
        }

        best
    }

    fn sample_regions(&self, base: &Grid, sample: &Sample) -> Vec<Region> {
        let main = SolutionPath::new(sample.main.clone());
        let companion = sample.companion.clone().map(SolutionPath::new);
        regions(base, &main, companion.as_ref())
    }

    /// Decorate, check and score one candidate. `strict` demands every requested family.
    fn attempt(&mut self, base: &Grid, sample: &Sample, regions: &[Region], requested: &[Family], strict: bool) -> Option<Generated> {
        let mut grid = base.clone();
        let traversed = sample.traversed();

        let mut placer = Placer { grid: &mut grid, rng: &mut self.rng, options: &self.options, traversed: &traversed };
        if self.options.use_hexagons {
            placer.place_hexagons(sample, strict);
        }
        placer.place_symbols(regions, strict);
        if self.options.use_broken_edges {
            placer.break_edges();
        }

        let missing = requested.iter().filter(|family| !family.present_in(&grid)).collect_vec();
        if strict && !missing.is_empty() {
            log::trace!("rejected: missing {missing:?}");
            return None;
        }

        let solution = SolutionPath::new(sample.main.clone());
        let result = self.validator.validate(&grid, &solution);
        if !result.is_valid {
            log::trace!("rejected: sampled path fails with {:?}", result.error_reason);
            return None;
        }

        let intended = sample.main[0];
        let intended_stats = analyze_with_limits(&grid, Some(std::slice::from_ref(&intended)), &self.limits);
        let mirror = grid.symmetry.is_symmetric().then(|| grid.symmetry.reflect(intended, grid.cols, grid.rows));
        for other in grid.starts().into_iter().filter(|s| *s != intended && Some(*s) != mirror) {
            let rival = analyze_with_limits(&grid, Some(std::slice::from_ref(&other)), &self.limits);
            if rival.solution_count as f64 >= AMBIGUITY_RATIO * intended_stats.solution_count as f64 && rival.solution_count > 0 {
                log::trace!("rejected: start {other} is as good as {intended}");
                return None;
            }
        }

        let stats = analyze_with_limits(&grid, None, &self.limits);
        Some(Generated { difficulty: score(&grid, &stats), grid, solution: Some(solution), fallback: false })
    }
}

/// Writes symbols onto one candidate grid.
struct Placer<'a> {
    grid: &'a mut Grid,
    rng: &'a mut PuzzleRng,
    options: &'a GenerationOptions,
    traversed: &'a HashSet<EdgeId>,
}

impl Placer<'_> {
    fn free_cells(&mut self, region: &Region) -> Vec<Point> {
        let mut free = region.cells.iter().filter(|c| !self.grid.cell(**c).is_symbol()).copied().collect_vec();
        self.rng.shuffle(&mut free);
        free
    }

    fn region_colors(&self, region: &Region, kinds: &[CellKind]) -> Vec<Color> {
        region.cells.iter()
            .map(|c| self.grid.cell(*c))
            .filter(|cell| kinds.contains(&cell.kind))
            .map(|cell| cell.color)
            .unique()
            .collect_vec()
    }

    fn fresh_color(&mut self, avoid: &[Color]) -> Option<Color> {
        let choices = self.options.palette().into_iter().filter(|c| !avoid.contains(c)).collect_vec();
        self.rng.pick(&choices).copied()
    }

    fn place_hexagons(&mut self, sample: &Sample, strict: bool) {
        let symmetric = self.grid.symmetry.is_symmetric();
        let main = SolutionPath::new(sample.main.clone());
        let branchy = sample.main.iter().filter(|p| self.grid.open_neighbors(**p).count() > 2).count() as f64;
        let density = branchy / sample.main.len().max(1) as f64;
        let rate = (0.05 + 0.2 * (1.0 - self.options.difficulty)) * (0.5 + density);

        let mut placed = 0;
        for edge in main.edges().collect_vec() {
            if self.rng.chance(rate) {
                let kind = match symmetric && self.rng.chance(0.5) {
                    true => EdgeKind::HexagonMain,
                    false => EdgeKind::Hexagon,
                };
                self.grid.set_edge(edge, kind);
                placed += 1;
            }
        }
        if let Some(companion) = &sample.companion {
            for edge in SolutionPath::new(companion.clone()).edges().collect_vec() {
                if self.rng.chance(rate / 2.0) {
                    self.grid.set_edge(edge, EdgeKind::HexagonSymmetry);
                    placed += 1;
                }
            }
        }
        for point in sample.main.iter().skip(1).dropping_back(1) {
            if self.rng.chance(rate / 2.0) {
                self.grid.set_node(*point, NodeKind::Hexagon);
                placed += 1;
            }
        }

        if placed == 0 && strict {
            let edges = main.edges().collect_vec();
            if let Some(edge) = self.rng.pick(&edges).copied() {
                self.grid.set_edge(edge, EdgeKind::Hexagon);
            }
        }
    }

    fn place_symbols(&mut self, regions: &[Region], strict: bool) {
        let o = self.options;
        let families = [
            (o.use_squares, Family::Square),
            (o.use_stars, Family::Star),
            (o.use_tetris || o.use_tetris_negative, Family::Tetromino),
            (o.use_triangles, Family::Triangle),
        ]
        .into_iter()
        .filter_map(|(wanted, family)| wanted.then_some(family))
        .collect_vec();

        let mut forced = match strict {
            true => families.clone(),
            false => vec![],
        };
        let mut eraser_forced = strict && o.use_eraser;
        let density = 0.12 + 0.3 * o.complexity.clamp(0.0, 1.0);

        let mut order = (0..regions.len()).collect_vec();
        self.rng.shuffle(&mut order);
        for region in order.into_iter().map(|i| &regions[i]) {
            let mut quota = ((region.len() as f64 * density).round() as usize).max(1);
            let mut tries = 0;
            while quota > 0 && tries < 6 && !families.is_empty() {
                tries += 1;
                let family = match forced.is_empty() || self.rng.chance(0.3) {
                    true => self.rng.pick(&families).copied(),
                    false => forced.first().copied(),
                };
                let Some(family) = family else {
                    break;
                };

                let used = match family {
                    Family::Square => self.place_squares(region, regions),
                    Family::Star => self.place_stars(region),
                    Family::Tetromino => self.place_tetrominoes(region),
                    Family::Triangle => self.place_triangle(region),
                    _ => 0,
                };
                if used > 0 {
                    forced.retain(|f| *f != family);
                    quota = quota.saturating_sub(used);
                }
            }

            if o.use_eraser && (eraser_forced || self.rng.chance(0.15 + 0.2 * o.difficulty)) && self.place_eraser(region) {
                eraser_forced = false;
            }
        }
    }

    fn place_squares(&mut self, region: &Region, regions: &[Region]) -> usize {
        let stars = self.region_colors(region, &[CellKind::Star, CellKind::Eraser]);
        let color = match self.region_colors(region, &[CellKind::Square]).first() {
            Some(color) => *color,
            None => {
                // prefer a color no other region's squares use
                let elsewhere = regions.iter()
                    .flat_map(|r| self.region_colors(r, &[CellKind::Square]))
                    .chain(stars.iter().copied())
                    .collect_vec();
                match self.fresh_color(&elsewhere) {
                    Some(color) => color,
                    None => match self.fresh_color(&stars) {
                        Some(color) => color,
                        None => return 0,
                    },
                }
            }
        };
        if stars.contains(&color) {
            return 0;
        }

        let free = self.free_cells(region);
        let count = (1 + self.rng.below(2)).min(free.len());
        for cell in free.into_iter().take(count) {
            self.grid.set_cell(cell, Cell::square(color));
        }
        count
    }

    fn place_stars(&mut self, region: &Region) -> usize {
        let taken = self.region_colors(region, &[CellKind::Square, CellKind::Star, CellKind::Eraser]);
        let free = self.free_cells(region);
        if free.len() < 2 {
            return 0;
        }
        let Some(color) = self.fresh_color(&taken) else {
            return 0;
        };
        for cell in free.into_iter().take(2) {
            self.grid.set_cell(cell, Cell::star(color));
        }
        2
    }

    fn place_triangle(&mut self, region: &Region) -> usize {
        let color = self.options.default_color(CellKind::Triangle);
        for cell in self.free_cells(region) {
            let count = self.grid.cell_edges(cell).iter().filter(|e| self.traversed.contains(e)).count();
            if (1..=3).contains(&count) {
                self.grid.set_cell(cell, Cell::triangle(count as u8, color));
                return 1;
            }
        }
        0
    }

    fn cell_neighbors(&self, cell: Point) -> Vec<Point> {
        self.grid.cell_edges(cell).into_iter().filter_map(|edge| self.grid.across(cell, edge)).collect_vec()
    }

    /// Split `region` into random connected pieces of at most four cells.
    fn decompose(&mut self, region: &Region) -> Vec<Vec<Point>> {
        let mut uncovered = region.cells.clone();
        let mut pieces = Vec::new();
        while !uncovered.is_empty() {
            let seed = uncovered.swap_remove(self.rng.below(uncovered.len()));
            let size = [1, 2, 3, 4, 4, 4][self.rng.below(6)];
            let mut piece = vec![seed];
            while piece.len() < size {
                let frontier = piece.iter()
                    .flat_map(|c| self.cell_neighbors(*c))
                    .filter(|c| uncovered.contains(c))
                    .unique()
                    .collect_vec();
                let Some(next) = self.rng.pick(&frontier).copied() else {
                    break;
                };
                uncovered.retain(|c| *c != next);
                piece.push(next);
            }
            pieces.push(piece);
        }
        pieces
    }

    fn shape_of(cells: &[Point]) -> Option<Polyomino> {
        Polyomino::from_cells(cells.iter().map(|c| (c.x as i32, c.y as i32))).ok()
    }

    fn place_tetrominoes(&mut self, region: &Region) -> usize {
        if region.len() > 16 || !self.region_colors(region, &[CellKind::Tetromino, CellKind::TetrominoRotatable]).is_empty() {
            return 0;
        }
        let free = self.free_cells(region);
        let pieces = self.decompose(region);
        let negatives_allowed = self.options.use_tetris_negative;

        // (shape, negative) pairs, one per symbol
        let mut symbols = Vec::new();
        for piece in pieces {
            let grow = match negatives_allowed && piece.len() <= 3 && self.rng.chance(0.5) {
                true => 1 + self.rng.below(2),
                false => 0,
            };
            let mut grown = piece.clone();
            let mut knobs = Vec::new();
            for _ in 0..grow {
                let frontier = grown.iter()
                    .flat_map(|c| self.cell_neighbors(*c))
                    .filter(|c| !grown.contains(c))
                    .unique()
                    .collect_vec();
                if let Some(knob) = self.rng.pick(&frontier).copied() {
                    grown.push(knob);
                    knobs.push(knob);
                }
            }

            let Some(shape) = Self::shape_of(&grown) else {
                return 0;
            };
            symbols.push((shape, false));
            for knob in knobs {
                if let Some(shape) = Self::shape_of(&[knob]) {
                    symbols.push((shape, true));
                }
            }
        }
        if symbols.len() > free.len() || (!self.options.use_tetris && !symbols.iter().any(|(_, negative)| *negative)) {
            return 0;
        }

        let count = symbols.len();
        for ((shape, negative), cell) in symbols.into_iter().zip(free) {
            let rotatable = self.rng.chance(0.3);
            let color = self.options.default_color(CellKind::tetromino(rotatable, negative));
            self.grid.set_cell(cell, Cell::tetromino(shape, rotatable, negative, color));
        }
        count
    }

    /// Place an eraser next to a lone star it has to cancel.
    fn place_eraser(&mut self, region: &Region) -> bool {
        let free = self.free_cells(region);
        if free.len() < 2 {
            return false;
        }
        let stars = self.region_colors(region, &[CellKind::Star]);
        let eraser_color = self.options.default_color(CellKind::Eraser);
        let eraser_color = match stars.contains(&eraser_color) {
            true => match self.fresh_color(&stars) {
                Some(color) => color,
                None => return false,
            },
            false => eraser_color,
        };

        let mut taken = self.region_colors(region, &[CellKind::Square, CellKind::Star, CellKind::Eraser]);
        taken.push(eraser_color);
        let Some(star_color) = self.fresh_color(&taken) else {
            return false;
        };

        self.grid.set_cell(free[0], Cell::star(star_color));
        self.grid.set_cell(free[1], Cell::eraser(eraser_color));
        true
    }

    fn break_edges(&mut self) {
        let unused = self.grid.all_edges()
            .filter(|e| !self.traversed.contains(e) && self.grid.edge(*e) == EdgeKind::Normal)
            .collect_vec();
        let rate = 0.1 + 0.15 * self.options.complexity.clamp(0.0, 1.0);
        let broken = unused.into_iter().filter(|_| self.rng.chance(rate)).collect_vec();
        for edge in &broken {
            self.grid.set_edge(*edge, EdgeKind::Broken);
        }

        // boundary or isolated breaks with no symbol beside them fall out of the puzzle
        let touches_path = |edge: &EdgeId| {
            let (a, b) = edge.endpoints();
            [a, b].into_iter().any(|p| self.grid.open_neighbors(p).any(|(e, _)| self.traversed.contains(&e)))
        };
        let promotable = broken.iter()
            .filter(|edge| !self.grid.edge_cells(**edge).iter().any(|c| self.grid.cell(*c).is_symbol()))
            .filter(|edge| self.grid.is_boundary_edge(**edge) || !touches_path(edge))
            .copied()
            .collect_vec();
        for edge in promotable {
            if self.rng.chance(0.5) {
                self.grid.set_edge(edge, EdgeKind::Absent);
            }
        }

        for cell in self.grid.all_cells().collect_vec() {
            let edges = self.grid.cell_edges(cell);
            if edges.iter().any(|e| self.grid.edge(*e).is_traversable()) {
                continue;
            }
            match self.grid.cell(cell).is_symbol() {
                true => self.grid.set_edge(edges[0], EdgeKind::Normal),
                false => edges.iter().for_each(|e| self.grid.set_edge(*e, EdgeKind::Absent)),
            }
        }
    }
}

/// Generate a `rows` by `cols` grid with a fresh [`Generator`].
pub fn generate(rows: usize, cols: usize, options: &GenerationOptions) -> Grid {
    Generator::new(options.clone()).generate(rows, cols)
}

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::cell::{CellKind, Color};
use crate::location::Point;
use crate::rng::RngType;
use crate::symmetry::SymmetryType;

/// What the generator should produce.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GenerationOptions {
    /// Place must-pass markers.
    pub use_hexagons: bool,
    /// Place colored squares.
    pub use_squares: bool,
    /// Place star pairs.
    pub use_stars: bool,
    /// Positive tetrominoes.
    pub use_tetris: bool,
    /// Negative tetrominoes, only placed alongside positive ones.
    pub use_tetris_negative: bool,
    /// Place erasers.
    pub use_eraser: bool,
    /// Place triangles.
    pub use_triangles: bool,
    /// Broken and absent edges.
    pub use_broken_edges: bool,
    /// Symmetry mode of the generated grid.
    pub symmetry: SymmetryType,
    /// Symbol density, in `[0, 1]`.
    pub complexity: f64,
    /// Target difficulty, in `[0, 1]`.
    pub difficulty: f64,
    /// Target path length between the shortest and longest possible, in `[0, 1]`.
    pub path_length: f64,
    /// Seed for the deterministic sources; stored on the generated grid.
    pub seed: String,
    /// Which random source drives generation.
    pub rng_type: RngType,
    /// Colors squares and stars are drawn from.
    pub available_colors: Vec<Color>,
    /// Color given to every symbol of a kind that does not vary its color.
    pub default_colors: BTreeMap<CellKind, Color>,
    /// Explicit start nodes; defaults to the bottom-left corner.
    pub starts: Option<Vec<Point>>,
    /// Explicit end nodes; defaults to the top-right corner.
    pub ends: Option<Vec<Point>>,
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            use_hexagons: true,
            use_squares: true,
            use_stars: true,
            use_tetris: false,
            use_tetris_negative: false,
            use_eraser: false,
            use_triangles: false,
            use_broken_edges: false,
            symmetry: SymmetryType::None,
            complexity: 0.5,
            difficulty: 0.5,
            path_length: 0.5,
            seed: String::new(),
            rng_type: RngType::ChaCha,
            available_colors: vec![Color::Black, Color::White, Color::Red, Color::Blue],
            default_colors: BTreeMap::from([
                (CellKind::Tetromino, Color::Yellow),
                (CellKind::TetrominoNegative, Color::Blue),
                (CellKind::Eraser, Color::White),
                (CellKind::Triangle, Color::Yellow),
            ]),
            starts: None,
            ends: None,
        }
    }
}

impl GenerationOptions {
    /// The default color for symbols of `kind`.
    pub fn default_color(&self, kind: CellKind) -> Color {
        let family = match kind {
            CellKind::TetrominoRotatable => CellKind::Tetromino,
            CellKind::TetrominoNegativeRotatable => CellKind::TetrominoNegative,
            other => other,
        };
        self.default_colors.get(&family).copied().unwrap_or_default()
    }

    /// Colors squares and stars may use, never empty.
    pub(crate) fn palette(&self) -> Vec<Color> {
        match self.available_colors.is_empty() {
            true => vec![Color::Black, Color::White],
            false => self.available_colors.clone(),
        }
    }
}

/// Iteration ceilings bounding every search the engine runs.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SearchLimits {
    /// Constraint placement attempts granted up front.
    pub attempts: usize,
    /// Ceiling the attempt budget may grow to while no candidate is near the target difficulty.
    pub attempt_cap: usize,
    /// Paths sampled per attempt, keeping the one closest to the target length.
    pub path_samples: usize,
    /// Placements tried against one sampled path.
    pub placement_retries: usize,
    /// Fresh samplings tried by the fallback before settling for the bare grid.
    pub fallback_attempts: usize,
    /// Search nodes per tiling query.
    pub packer_nodes: usize,
    /// Remembered tiling answers.
    pub memo_cap: usize,
    /// Difficulty search visits, per lattice node.
    pub visit_multiplier: usize,
    /// Remembered reachability answers.
    pub reach_cache_cap: usize,
    /// Eraser configurations evaluated per region.
    pub negotiation_cap: usize,
}

impl Default for SearchLimits {
    fn default() -> Self {
        Self {
            attempts: 24,
            attempt_cap: 72,
            path_samples: 6,
            placement_retries: 4,
            fallback_attempts: 64,
            packer_nodes: 200_000,
            memo_cap: 4096,
            visit_multiplier: 4000,
            reach_cache_cap: 50_000,
            negotiation_cap: 20_000,
        }
    }
}

impl SearchLimits {
    /// Small budgets for interactive use.
    pub fn quick() -> Self {
        Self {
            attempts: 8,
            attempt_cap: 16,
            path_samples: 3,
            placement_retries: 2,
            fallback_attempts: 32,
            visit_multiplier: 500,
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_take_defaults() {
        let options: GenerationOptions = serde_json::from_str(r#"{"useTetris": true, "difficulty": 0.8}"#).unwrap();
        assert!(options.use_tetris);
        assert!(options.use_hexagons);
        assert_eq!(options.difficulty, 0.8);
        assert_eq!(options.symmetry, SymmetryType::None);
        assert_eq!(options.default_color(CellKind::TetrominoRotatable), Color::Yellow);
    }

    #[test]
    fn json_round_trip() {
        let options = GenerationOptions {
            seed: "abc".into(),
            starts: Some(vec![Point::new(0, 2)]),
            symmetry: SymmetryType::Rotational,
            ..Default::default()
        };
        let json = serde_json::to_string(&options).unwrap();
        assert!(json.contains("\"pathLength\""));
        assert_eq!(serde_json::from_str::<GenerationOptions>(&json).unwrap(), options);
    }
}

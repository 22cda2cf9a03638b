#![warn(missing_docs)]

//! # `linewright`
//!
//! A constraint engine for line-drawing puzzles in the style of The Witness: a path is drawn across a lattice
//! from a start node to an end node, cutting the grid into regions whose symbols must all be satisfied.
//!
//! Build a grid with a [`GridBuilder`], [`generate`] one, or convert it from [`PuzzleData`](data::PuzzleData).
//! Check a drawn [`SolutionPath`] with [`validate()`], or estimate how hard a grid is with [`difficulty()`].
//! Grids, options and paths can be shared as compact codes with [`codec::encode`] and [`codec::decode`].
//!
//! # Internals
//! Validation proceeds in stages. The path (and its mirror image, on symmetric grids) is checked structurally,
//! then missed must-pass markers are collected and the regions the path(s) cut out are computed. Each region's
//! symbols are checked by the rules in [`rules`], tetrominoes by a signed tiling search. Erasers are then
//! negotiated: every eraser must cancel exactly one violation, and a final assignment decides which region
//! accounts for each missed marker.
//!
//! Difficulty is estimated by exhaustively enumerating simple paths over a [`petgraph`] graph of the lattice,
//! deduplicating candidate solutions by the partition of symbols they induce.

pub use builder::GridBuilder;
pub use difficulty::{analyze, difficulty, SearchStats};
pub use generator::{generate, Generated, Generator};
pub use grid::Grid;
pub use location::{EdgeId, Point};
pub use options::{GenerationOptions, SearchLimits};
pub use path::SolutionPath;
pub use validate::{validate, InvalidReason, ValidationResult, Validator};

mod tests;
pub mod builder;
pub mod cell;
pub mod codec;
pub mod data;
pub mod difficulty;
pub mod eraser;
pub mod generator;
pub mod grid;
pub mod location;
pub mod options;
pub mod path;
pub mod polyomino;
pub mod region;
pub mod rng;
pub mod rules;
pub mod shape;
pub mod symmetry;
pub mod tetromino;
pub mod validate;
#[cfg(feature = "wasm")]
pub mod wasm;

//! JSON-in, JSON-out entry points for JavaScript hosts.

use std::fmt::Display;

use js_sys::Error;
use wasm_bindgen::prelude::*;

use crate::codec::{self, CodecMode, Payload};
use crate::data::PuzzleData;
use crate::generator::generate;
use crate::grid::Grid;
use crate::options::GenerationOptions;
use crate::path::SolutionPath;
use crate::{difficulty, validate};

fn js_error(error: impl Display) -> Error {
    Error::new(&error.to_string())
}

fn parse_grid(puzzle: &str) -> Result<Grid, Error> {
    let data: PuzzleData = serde_json::from_str(puzzle).map_err(js_error)?;
    Grid::try_from(data).map_err(js_error)
}

/// Validate a JSON [`SolutionPath`] against a JSON [`PuzzleData`], returning a JSON
/// [`ValidationResult`](crate::ValidationResult).
#[wasm_bindgen(js_name = validateJson)]
pub fn validate_json(puzzle: &str, path: &str) -> Result<String, Error> {
    let grid = parse_grid(puzzle)?;
    let path: SolutionPath = serde_json::from_str(path).map_err(js_error)?;
    serde_json::to_string(&validate::validate(&grid, &path)).map_err(js_error)
}

/// Generate a puzzle from JSON [`GenerationOptions`], returning JSON [`PuzzleData`].
#[wasm_bindgen(js_name = generateJson)]
pub fn generate_json(rows: u32, cols: u32, options: &str) -> Result<String, Error> {
    let options: GenerationOptions = serde_json::from_str(options).map_err(js_error)?;
    let grid = generate(rows as usize, cols as usize, &options);
    serde_json::to_string(&PuzzleData::from(&grid)).map_err(js_error)
}

/// Estimated difficulty of a JSON [`PuzzleData`].
#[wasm_bindgen(js_name = difficultyJson)]
pub fn difficulty_json(puzzle: &str) -> Result<f64, Error> {
    Ok(difficulty::difficulty(&parse_grid(puzzle)?, None))
}

/// Encode a JSON [`Payload`] as a share code.
#[wasm_bindgen(js_name = encodeShareCode)]
pub fn encode_share_code(payload: &str, recovery: bool) -> Result<String, Error> {
    let payload: Payload = serde_json::from_str(payload).map_err(js_error)?;
    let mode = match recovery {
        true => CodecMode::Recovery,
        false => CodecMode::Fast,
    };
    codec::encode(&payload, mode).map_err(js_error)
}

/// Decode a share code into a JSON [`Payload`].
#[wasm_bindgen(js_name = decodeShareCode)]
pub fn decode_share_code(code: &str) -> Result<String, Error> {
    let payload = codec::decode(code).map_err(js_error)?;
    serde_json::to_string(&payload).map_err(js_error)
}

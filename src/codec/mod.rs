//! Compact share codes.
//!
//! A payload is bit-packed behind a flag byte naming the sections present, compressed with raw `snap`, given a
//! trailer and written as unpadded base64url. The fast trailer is one XOR checksum byte; the recovery trailer
//! is a big-endian length marker followed by ten Reed-Solomon parity bytes, enough to repair five damaged bytes.

mod bits;
mod rs;

use std::collections::BTreeMap;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use serde::{Deserialize, Serialize};

use bits::{BitReader, BitWriter};

use crate::cell::{CellKind, Color, EdgeKind, NodeKind};
use crate::data::{CellData, EdgeData, NodeData, PuzzleData};
use crate::location::Point;
use crate::options::GenerationOptions;
use crate::path::SolutionPath;
use crate::polyomino::Polyomino;
use crate::rng::RngType;
use crate::shape::Direction;
use crate::symmetry::SymmetryType;

const FLAG_PUZZLE: u8 = 1;
const FLAG_SEED: u8 = 2;
const FLAG_OPTIONS: u8 = 4;
const FLAG_PATH: u8 = 8;

const PARITY: usize = 10;
const MARKER: usize = 2;
const SHAPE_TABLE: usize = 32;
const ABSENT_POINTS: u32 = 63;
const REPAIR_LIMIT: usize = 96;

/// Reasons a payload cannot be encoded or a share code decoded.
#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
pub enum CodecError {
    #[error("not base64url: {0}")]
    Base64(#[from] base64::DecodeError),
    /// The trailer does not match the data.
    #[error("checksum mismatch")]
    Checksum,
    #[error("bad compressed data: {0}")]
    Compression(String),
    /// The bitstream ended inside a field.
    #[error("bitstream ends early")]
    Truncated,
    /// A field holds a value no enum variant maps to.
    #[error("invalid {0} value")]
    InvalidValue(&'static str),
    /// A value does not fit its field.
    #[error("cannot encode {0}")]
    Unencodable(&'static str),
    /// Neither the trailer nor single-character repair recovered a payload.
    #[error("share code is damaged beyond repair")]
    Unrecoverable,
}

impl From<snap::Error> for CodecError {
    fn from(value: snap::Error) -> Self {
        Self::Compression(value.to_string())
    }
}

/// Which trailer to append.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CodecMode {
    /// One XOR checksum byte.
    #[default]
    Fast,
    /// Reed-Solomon parity, falling back to [`CodecMode::Fast`] for payloads too long for one codeword.
    Recovery,
}

/// Everything a share code can carry.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Payload {
    /// A complete puzzle.
    pub puzzle: Option<PuzzleData>,
    /// A generation seed on its own.
    pub seed: Option<String>,
    /// Generation options to reproduce a puzzle with.
    pub options: Option<GenerationOptions>,
    /// A drawn path, usually a solution.
    pub path: Option<SolutionPath>,
}

fn checked(value: usize, width: u8, what: &'static str) -> Result<u32, CodecError> {
    match value < 1 << width {
        true => Ok(value as u32),
        false => Err(CodecError::Unencodable(what)),
    }
}

fn write_string(writer: &mut BitWriter, value: &str) -> Result<(), CodecError> {
    writer.write(checked(value.len(), 8, "string longer than 255 bytes")?, 8);
    writer.write_bytes(value.as_bytes());
    Ok(())
}

fn read_string(reader: &mut BitReader) -> Result<String, CodecError> {
    let len = reader.read(8)? as usize;
    String::from_utf8(reader.read_bytes(len)?).map_err(|_| CodecError::InvalidValue("string"))
}

fn write_point(writer: &mut BitWriter, point: Point) -> Result<(), CodecError> {
    writer.write(checked(point.x, 6, "coordinate above 63")?, 6);
    writer.write(checked(point.y, 6, "coordinate above 63")?, 6);
    Ok(())
}

fn read_point(reader: &mut BitReader) -> Result<Point, CodecError> {
    let x = reader.read(6)? as usize;
    let y = reader.read(6)? as usize;
    Ok(Point::new(x, y))
}

fn percent(value: f64) -> u32 {
    (value.clamp(0.0, 1.0) * 100.0).round() as u32
}

fn symmetry_from(bits: u32) -> Result<SymmetryType, CodecError> {
    SymmetryType::from_repr(bits as u8).ok_or(CodecError::InvalidValue("symmetry"))
}

fn color_from(bits: u32) -> Result<Color, CodecError> {
    Color::from_repr(bits as u8).ok_or(CodecError::InvalidValue("color"))
}

fn cell_kind_from(bits: u32) -> Result<CellKind, CodecError> {
    CellKind::from_repr(bits as u8).ok_or(CodecError::InvalidValue("cell type"))
}

fn write_puzzle(writer: &mut BitWriter, puzzle: &PuzzleData) -> Result<(), CodecError> {
    if puzzle.rows == 0 || puzzle.cols == 0 {
        return Err(CodecError::Unencodable("empty grid"));
    }
    writer.write(checked(puzzle.rows, 6, "more than 63 rows")?, 6);
    writer.write(checked(puzzle.cols, 6, "more than 63 columns")?, 6);
    writer.write(puzzle.symmetry as u32, 2);

    let mut shapes: Vec<Polyomino> = Vec::new();
    for cell in puzzle.cells.iter().flatten() {
        writer.write(cell.kind as u32, 4);
        writer.write(cell.color as u32, 3);
        if cell.kind == CellKind::Triangle {
            let count = cell.count.ok_or(CodecError::Unencodable("triangle without count"))?;
            writer.write(checked(usize::from(count), 2, "triangle count above 3")?, 2);
        } else if cell.kind.is_tetromino() {
            let shape = cell.shape.as_ref().ok_or(CodecError::Unencodable("tetromino without shape"))?;
            match shapes.iter().position(|known| known == shape) {
                Some(index) => {
                    writer.write_bool(true);
                    writer.write(index as u32, 5);
                }
                None => {
                    let (width, height) = shape.bounds();
                    writer.write_bool(false);
                    writer.write(checked(width - 1, 3, "shape wider than 8")?, 3);
                    writer.write(checked(height - 1, 3, "shape taller than 8")?, 3);
                    for bit in shape.to_matrix().iter().flatten() {
                        writer.write_bool(*bit);
                    }
                    if shapes.len() < SHAPE_TABLE {
                        shapes.push(shape.clone());
                    }
                }
            }
        }
    }

    for edge in puzzle.h_edges.iter().chain(&puzzle.v_edges).flatten() {
        writer.write(edge.kind as u32, 3);
    }
    for node in puzzle.nodes.iter().flatten() {
        writer.write(node.kind as u32, 3);
    }
    write_string(writer, &puzzle.seed)
}

fn read_puzzle(reader: &mut BitReader) -> Result<PuzzleData, CodecError> {
    let rows = reader.read(6)? as usize;
    let cols = reader.read(6)? as usize;
    let symmetry = symmetry_from(reader.read(2)?)?;

    let mut shapes: Vec<Polyomino> = Vec::new();
    let mut cells = Vec::with_capacity(rows);
    for _ in 0..rows {
        let mut row = Vec::with_capacity(cols);
        for _ in 0..cols {
            let kind = cell_kind_from(reader.read(4)?)?;
            let color = color_from(reader.read(3)?)?;
            let mut cell = CellData { kind, color, shape: None, count: None };
            if kind == CellKind::Triangle {
                cell.count = Some(reader.read(2)? as u8);
            } else if kind.is_tetromino() {
                let shape = match reader.read_bool()? {
                    true => shapes.get(reader.read(5)? as usize).cloned().ok_or(CodecError::InvalidValue("shape index"))?,
                    false => {
                        let width = reader.read(3)? as usize + 1;
                        let height = reader.read(3)? as usize + 1;
                        let matrix = (0..height)
                            .map(|_| (0..width).map(|_| reader.read_bool()).collect::<Result<Vec<_>, _>>())
                            .collect::<Result<Vec<_>, _>>()?;
                        let shape = Polyomino::from_matrix(&matrix).map_err(|_| CodecError::InvalidValue("shape"))?;
                        if shapes.len() < SHAPE_TABLE {
                            shapes.push(shape.clone());
                        }
                        shape
                    }
                };
                cell.shape = Some(shape);
            }
            row.push(cell);
        }
        cells.push(row);
    }

    let mut edges = |count: usize, width: usize| -> Result<Vec<Vec<EdgeData>>, CodecError> {
        (0..count)
            .map(|_| (0..width)
                .map(|_| EdgeKind::from_repr(reader.read(3)? as u8).map(|kind| EdgeData { kind }).ok_or(CodecError::InvalidValue("edge type")))
                .collect::<Result<Vec<_>, _>>())
            .collect()
    };
    let h_edges = edges(rows + 1, cols)?;
    let v_edges = edges(rows, cols + 1)?;
    let nodes = (0..rows + 1)
        .map(|_| (0..cols + 1)
            .map(|_| NodeKind::from_repr(reader.read(3)? as u8).map(|kind| NodeData { kind }).ok_or(CodecError::InvalidValue("node type")))
            .collect::<Result<Vec<_>, _>>())
        .collect::<Result<Vec<_>, _>>()?;
    let seed = read_string(reader)?;

    Ok(PuzzleData { rows, cols, cells, v_edges, h_edges, nodes, symmetry, seed })
}

fn write_points(writer: &mut BitWriter, points: &Option<Vec<Point>>) -> Result<(), CodecError> {
    match points {
        None => writer.write(ABSENT_POINTS, 6),
        Some(points) => {
            if points.len() >= ABSENT_POINTS as usize {
                return Err(CodecError::Unencodable("more than 62 terminals"));
            }
            writer.write(points.len() as u32, 6);
            for point in points {
                write_point(writer, *point)?;
            }
        }
    }
    Ok(())
}

fn read_points(reader: &mut BitReader) -> Result<Option<Vec<Point>>, CodecError> {
    match reader.read(6)? {
        ABSENT_POINTS => Ok(None),
        count => (0..count).map(|_| read_point(reader)).collect::<Result<Vec<_>, _>>().map(Some),
    }
}

fn write_options(writer: &mut BitWriter, options: &GenerationOptions) -> Result<(), CodecError> {
    for flag in [
        options.use_hexagons,
        options.use_squares,
        options.use_stars,
        options.use_tetris,
        options.use_tetris_negative,
        options.use_eraser,
        options.use_triangles,
        options.use_broken_edges,
    ] {
        writer.write_bool(flag);
    }
    writer.write(options.symmetry as u32, 2);
    writer.write(percent(options.complexity), 7);
    writer.write(percent(options.difficulty), 7);
    writer.write(percent(options.path_length), 7);
    writer.write(options.rng_type as u32, 2);

    let mask = options.available_colors.iter().fold(0u32, |mask, color| mask | 1 << (*color as u32));
    writer.write(mask, 8);
    writer.write(checked(options.default_colors.len(), 4, "more than 15 default colors")?, 4);
    for (kind, color) in &options.default_colors {
        writer.write(*kind as u32, 4);
        writer.write(*color as u32, 3);
    }

    write_points(writer, &options.starts)?;
    write_points(writer, &options.ends)?;
    write_string(writer, &options.seed)
}

fn read_options(reader: &mut BitReader) -> Result<GenerationOptions, CodecError> {
    let mut flags = [false; 8];
    for flag in &mut flags {
        *flag = reader.read_bool()?;
    }
    let symmetry = symmetry_from(reader.read(2)?)?;
    let mut ratio = || -> Result<f64, CodecError> { Ok(f64::from(reader.read(7)?.min(100)) / 100.0) };
    let (complexity, difficulty, path_length) = (ratio()?, ratio()?, ratio()?);
    let rng_type = RngType::from_repr(reader.read(2)? as u8).ok_or(CodecError::InvalidValue("rng type"))?;

    let mask = reader.read(8)?;
    let available_colors = (0..8u8).filter(|bit| mask & (1 << bit) != 0).filter_map(Color::from_repr).collect();
    let mut default_colors = BTreeMap::new();
    for _ in 0..reader.read(4)? {
        let kind = cell_kind_from(reader.read(4)?)?;
        default_colors.insert(kind, color_from(reader.read(3)?)?);
    }

    let [use_hexagons, use_squares, use_stars, use_tetris, use_tetris_negative, use_eraser, use_triangles, use_broken_edges] = flags;
    Ok(GenerationOptions {
        use_hexagons,
        use_squares,
        use_stars,
        use_tetris,
        use_tetris_negative,
        use_eraser,
        use_triangles,
        use_broken_edges,
        symmetry,
        complexity,
        difficulty,
        path_length,
        rng_type,
        available_colors,
        default_colors,
        starts: read_points(reader)?,
        ends: read_points(reader)?,
        seed: read_string(reader)?,
    })
}

fn write_path(writer: &mut BitWriter, path: &SolutionPath) -> Result<(), CodecError> {
    let start = path.points.first().ok_or(CodecError::Unencodable("empty path"))?;
    write_point(writer, *start)?;
    writer.write(checked(path.points.len() - 1, 12, "path longer than 4095 steps")?, 12);
    for (from, to) in path.points.iter().zip(path.points.iter().skip(1)) {
        let direction = Direction::direction_to(*from, *to).ok_or(CodecError::Unencodable("non-adjacent path step"))?;
        writer.write(direction as u32, 2);
    }
    Ok(())
}

fn read_path(reader: &mut BitReader) -> Result<SolutionPath, CodecError> {
    let mut point = read_point(reader)?;
    let steps = reader.read(12)?;
    let mut points = vec![point];
    for _ in 0..steps {
        let direction = Direction::from_repr(reader.read(2)? as u8).ok_or(CodecError::InvalidValue("direction"))?;
        point = direction.attempt_from(point);
        points.push(point);
    }
    Ok(SolutionPath::new(points))
}

fn pack(payload: &Payload) -> Result<Vec<u8>, CodecError> {
    let flags = [
        (payload.puzzle.is_some(), FLAG_PUZZLE),
        (payload.seed.is_some(), FLAG_SEED),
        (payload.options.is_some(), FLAG_OPTIONS),
        (payload.path.is_some(), FLAG_PATH),
    ]
    .into_iter()
    .filter(|(present, _)| *present)
    .fold(0, |flags, (_, flag)| flags | flag);

    let mut writer = BitWriter::default();
    writer.write(u32::from(flags), 8);
    if let Some(puzzle) = &payload.puzzle {
        write_puzzle(&mut writer, puzzle)?;
    }
    if let Some(seed) = &payload.seed {
        write_string(&mut writer, seed)?;
    }
    if let Some(options) = &payload.options {
        write_options(&mut writer, options)?;
    }
    if let Some(path) = &payload.path {
        write_path(&mut writer, path)?;
    }
    Ok(snap::raw::Encoder::new().compress_vec(&writer.finish())?)
}

fn unpack(compressed: &[u8]) -> Result<Payload, CodecError> {
    let bytes = snap::raw::Decoder::new().decompress_vec(compressed)?;
    let mut reader = BitReader::new(&bytes);
    let flags = reader.read(8)? as u8;
    if flags & !(FLAG_PUZZLE | FLAG_SEED | FLAG_OPTIONS | FLAG_PATH) != 0 {
        return Err(CodecError::InvalidValue("flag byte"));
    }

    let present = |flag: u8| flags & flag != 0;
    Ok(Payload {
        puzzle: present(FLAG_PUZZLE).then(|| read_puzzle(&mut reader)).transpose()?,
        seed: present(FLAG_SEED).then(|| read_string(&mut reader)).transpose()?,
        options: present(FLAG_OPTIONS).then(|| read_options(&mut reader)).transpose()?,
        path: present(FLAG_PATH).then(|| read_path(&mut reader)).transpose()?,
    })
}

fn xor(bytes: &[u8]) -> u8 {
    bytes.iter().fold(0, |acc, b| acc ^ b)
}

/// Encode `payload` as a share code.
pub fn encode(payload: &Payload, mode: CodecMode) -> Result<String, CodecError> {
    let mut bytes = pack(payload)?;
    let codeword_len = bytes.len() + MARKER + PARITY;

    match mode {
        CodecMode::Recovery if codeword_len <= 255 => {
            bytes.extend((bytes.len() as u16).to_be_bytes());
            let parity = rs::encode(&bytes, PARITY);
            bytes.extend(parity);
        }
        _ => {
            if mode == CodecMode::Recovery {
                log::debug!("payload of {} bytes too long for recovery mode", bytes.len());
            }
            bytes.push(xor(&bytes));
        }
    }

    Ok(URL_SAFE_NO_PAD.encode(bytes))
}

/// Decode exactly, trusting whichever trailer verifies.
fn decode_exact(text: &str) -> Result<Payload, CodecError> {
    let bytes = URL_SAFE_NO_PAD.decode(text)?;

    if let Some((checksum, data)) = bytes.split_last() {
        if xor(data) == *checksum {
            if let Ok(payload) = unpack(data) {
                return Ok(payload);
            }
        }
    }

    let n = bytes.len();
    if n <= MARKER + PARITY {
        return Err(CodecError::Checksum);
    }
    let corrected = rs::correct(&bytes, PARITY).ok_or(CodecError::Checksum)?;
    let data_len = n - MARKER - PARITY;
    let marker = u16::from_be_bytes([corrected[data_len], corrected[data_len + 1]]) as usize;
    if marker != data_len {
        return Err(CodecError::Checksum);
    }
    unpack(&corrected[..data_len])
}

/// Try every single-character substitution, accepting the result only if exactly one distinct payload decodes.
fn repair(text: &str) -> Option<Payload> {
    const ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789-_";

    let mut found: Option<Payload> = None;
    for (index, original) in text.char_indices() {
        for candidate in ALPHABET.iter().map(|b| char::from(*b)).filter(|c| *c != original) {
            let mut attempt = text.to_string();
            attempt.replace_range(index..index + original.len_utf8(), candidate.encode_utf8(&mut [0; 4]));
            let Ok(payload) = decode_exact(&attempt) else {
                continue;
            };
            match &found {
                None => found = Some(payload),
                Some(known) if *known == payload => {}
                Some(_) => {
                    log::debug!("share code repair is ambiguous");
                    return None;
                }
            }
        }
    }
    found
}

/// Decode a share code, repairing damage where the trailer allows.
pub fn decode(text: &str) -> Result<Payload, CodecError> {
    let error = match decode_exact(text) {
        Ok(payload) => return Ok(payload),
        Err(error) => error,
    };
    log::debug!("share code failed to decode ({error}), attempting repair");

    match text.chars().count() <= REPAIR_LIMIT {
        true => repair(text).ok_or(CodecError::Unrecoverable),
        false => Err(CodecError::Unrecoverable),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::GridBuilder;
    use crate::cell::Cell;
    use crate::location::{Dimension, EdgeId};

    fn puzzle() -> PuzzleData {
        let l = Polyomino::from_cells([(0, 0), (0, 1), (1, 1)]).unwrap();
        let grid = GridBuilder::with_dims((Dimension::new(3).unwrap(), Dimension::new(3).unwrap()))
            .add_start(Point::new(0, 3))
            .add_end(Point::new(3, 0))
            .cell(Point::new(0, 0), Cell::star(Color::Red))
            .cell(Point::new(1, 1), Cell::triangle(3, Color::Yellow))
            .cell(Point::new(2, 0), Cell::tetromino(l.clone(), false, false, Color::Yellow))
            .cell(Point::new(2, 2), Cell::tetromino(l, true, true, Color::Blue))
            .edge(EdgeId::Horizontal { row: 2, col: 1 }, EdgeKind::Hexagon)
            .edge(EdgeId::Vertical { row: 0, col: 3 }, EdgeKind::Absent)
            .seed("share")
            .build()
            .unwrap();
        PuzzleData::from(&grid)
    }

    fn full_payload() -> Payload {
        Payload {
            puzzle: Some(puzzle()),
            seed: Some("again".into()),
            options: Some(GenerationOptions {
                use_tetris: true,
                difficulty: 0.8,
                available_colors: vec![Color::Black, Color::Red],
                starts: Some(vec![Point::new(0, 3)]),
                seed: "opts".into(),
                ..Default::default()
            }),
            path: Some(SolutionPath::new(vec![Point::new(0, 3), Point::new(0, 2), Point::new(1, 2), Point::new(1, 1)])),
        }
    }

    #[test]
    fn round_trip_in_both_modes() {
        let payload = full_payload();
        for mode in [CodecMode::Fast, CodecMode::Recovery] {
            let code = encode(&payload, mode).unwrap();
            assert!(code.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
            assert_eq!(decode(&code).unwrap(), payload);
        }
    }

    #[test]
    fn recovery_repairs_a_corrupted_character() {
        let payload = Payload { puzzle: Some(puzzle()), ..Default::default() };
        let code = encode(&payload, CodecMode::Recovery).unwrap();
        for index in [0, code.len() / 2, code.len() - 1] {
            let original = code.as_bytes()[index];
            let replacement = if original == b'A' { 'B' } else { 'A' };
            let mut damaged = code.clone();
            damaged.replace_range(index..index + 1, &replacement.to_string());
            assert_eq!(decode(&damaged).unwrap(), payload);
        }
    }

    #[test]
    fn fast_mode_never_returns_wrong_data() {
        let payload = Payload { seed: Some("x".into()), ..Default::default() };
        let code = encode(&payload, CodecMode::Fast).unwrap();
        let mut damaged = code.clone();
        let replacement = if code.starts_with('A') { "B" } else { "A" };
        damaged.replace_range(0..1, replacement);
        match decode(&damaged) {
            Ok(decoded) => assert_eq!(decoded, payload),
            Err(error) => assert_eq!(error, CodecError::Unrecoverable),
        }
    }

    #[test]
    fn rejects_out_of_range_values() {
        let mut long = full_payload();
        long.seed = Some("s".repeat(300));
        assert_eq!(encode(&long, CodecMode::Fast), Err(CodecError::Unencodable("string longer than 255 bytes")));

        let jump = Payload { path: Some(SolutionPath::new(vec![Point::new(0, 0), Point::new(2, 0)])), ..Default::default() };
        assert_eq!(encode(&jump, CodecMode::Fast), Err(CodecError::Unencodable("non-adjacent path step")));

        assert_eq!(decode("!!!!"), Err(CodecError::Unrecoverable));
    }
}

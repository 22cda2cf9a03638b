#[cfg(test)]
mod tests {
    use serde_json::json;

    use crate::builder::GridBuilder;
    use crate::cell::{Cell, Color, EdgeKind, NodeKind};
    use crate::codec::{self, CodecMode, Payload};
    use crate::data::PuzzleData;
    use crate::location::{Dimension, EdgeId, Point};
    use crate::path::{Collision, PathFault, SolutionPath};
    use crate::polyomino::Polyomino;
    use crate::symmetry::SymmetryType;
    use crate::{analyze, generate, validate, GenerationOptions, Grid, InvalidReason, Validator};

    fn init() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn dims(cols: usize, rows: usize) -> (Dimension, Dimension) {
        (Dimension::new(cols).unwrap(), Dimension::new(rows).unwrap())
    }

    fn path(points: &[(usize, usize)]) -> SolutionPath {
        SolutionPath::new(points.iter().map(|(x, y)| Point::new(*x, *y)).collect())
    }

    /// A one row strip with Start bottom left, End bottom right and `cells` placed left to right.
    fn strip(cells: Vec<Cell>) -> Grid {
        let width = cells.len();
        let mut builder = GridBuilder::with_dims(dims(width, 1));
        builder.add_start(Point::new(0, 1)).add_end(Point::new(width, 1));
        for (x, cell) in cells.into_iter().enumerate() {
            builder.cell(Point::new(x, 0), cell);
        }
        builder.build().unwrap()
    }

    fn along_bottom(width: usize) -> SolutionPath {
        SolutionPath::new((0..=width).map(|x| Point::new(x, 1)).collect())
    }

    #[test]
    fn star_pair_in_one_region() {
        init();
        let grid = strip(vec![Cell::star(Color::Black), Cell::star(Color::Black)]);
        let result = validate(&grid, &along_bottom(2));
        assert!(result.is_valid);
        assert_eq!(result.regions.len(), 1);
        assert_eq!(result.error_reason, None);
    }

    #[test]
    fn star_pair_split_by_the_path() {
        let grid = GridBuilder::with_dims(dims(2, 1))
            .add_start(Point::new(0, 1))
            .add_end(Point::new(2, 0))
            .cell(Point::new(0, 0), Cell::star(Color::Black))
            .cell(Point::new(1, 0), Cell::star(Color::Black))
            .build()
            .unwrap();

        let result = validate(&grid, &path(&[(0, 1), (1, 1), (1, 0), (2, 0)]));
        assert!(!result.is_valid);
        assert_eq!(result.regions.len(), 2);
        assert_eq!(result.error_cells, vec![Point::new(0, 0), Point::new(1, 0)]);
    }

    #[test]
    fn three_stars_break_the_pair() {
        let grid = strip(vec![Cell::star(Color::Black); 3]);
        let result = validate(&grid, &along_bottom(3));
        assert!(!result.is_valid);
        assert_eq!(result.error_cells.len(), 3);
        assert_eq!(result.error_reason, Some(InvalidReason::RuleViolation));
    }

    #[test]
    fn eraser_with_nothing_to_erase_is_an_error() {
        // the black eraser completes the star pair itself, so cancelling the star is never needed
        let grid = strip(vec![Cell::star(Color::Black), Cell::eraser(Color::Black)]);
        let result = validate(&grid, &along_bottom(2));
        assert!(!result.is_valid);
        assert_eq!(result.error_cells, vec![Point::new(1, 0)]);
        assert_eq!(result.error_reason, Some(InvalidReason::RuleViolation));
    }

    #[test]
    fn eraser_cancels_a_lonely_star() {
        let grid = strip(vec![Cell::star(Color::Black), Cell::eraser(Color::White)]);
        let result = validate(&grid, &along_bottom(2));
        assert!(result.is_valid);
        assert_eq!(result.invalidated_cells, vec![Point::new(0, 0), Point::new(1, 0)]);
        assert!(result.error_cells.is_empty());
    }

    #[test]
    fn eraser_cancels_the_third_star() {
        let grid = strip(vec![Cell::star(Color::Black), Cell::star(Color::Black), Cell::eraser(Color::Black)]);
        let result = validate(&grid, &along_bottom(3));
        assert!(result.is_valid);
        assert_eq!(result.invalidated_cells.len(), 2);
        assert!(result.invalidated_cells.contains(&Point::new(2, 0)));
    }

    #[test]
    fn two_erasers_cancel_each_other() {
        let grid = strip(vec![Cell::eraser(Color::White), Cell::eraser(Color::White)]);
        let result = validate(&grid, &along_bottom(2));
        assert!(result.is_valid);
        assert_eq!(result.invalidated_cells.len(), 2);
    }

    #[test]
    fn missed_hexagon() {
        let top = EdgeId::Horizontal { row: 0, col: 0 };
        let mut builder = GridBuilder::with_dims(dims(1, 1));
        builder.add_start(Point::new(0, 1)).add_end(Point::new(1, 0)).edge(top, EdgeKind::Hexagon);
        let grid = builder.build().unwrap();

        let missed = validate(&grid, &path(&[(0, 1), (1, 1), (1, 0)]));
        assert!(!missed.is_valid);
        assert_eq!(missed.error_edges, vec![top]);
        assert_eq!(missed.error_reason, Some(InvalidReason::MissedHexagon));

        assert!(validate(&grid, &path(&[(0, 1), (0, 0), (1, 0)])).is_valid);

        // an eraser next to the marker accounts for it
        let grid = builder.cell(Point::new(0, 0), Cell::eraser(Color::White)).build().unwrap();
        let erased = validate(&grid, &path(&[(0, 1), (1, 1), (1, 0)]));
        assert!(erased.is_valid);
        assert_eq!(erased.invalidated_edges, vec![top]);
        assert_eq!(erased.invalidated_cells, vec![Point::new(0, 0)]);
    }

    #[test]
    fn missed_node_hexagon() {
        let grid = GridBuilder::with_dims(dims(1, 1))
            .add_start(Point::new(0, 1))
            .add_end(Point::new(1, 0))
            .node(Point::new(0, 0), NodeKind::Hexagon)
            .build()
            .unwrap();

        let result = validate(&grid, &path(&[(0, 1), (1, 1), (1, 0)]));
        assert_eq!(result.error_nodes, vec![Point::new(0, 0)]);
        assert!(validate(&grid, &path(&[(0, 1), (0, 0), (1, 0)])).is_valid);
    }

    #[test]
    fn triangle_counts_edges_of_its_cell() {
        let grid = strip(vec![Cell::triangle(2, Color::Yellow)]);
        let result = validate(&grid, &path(&[(0, 1), (0, 0), (1, 0), (1, 1)]));
        assert!(!result.is_valid);

        let mut builder = GridBuilder::with_dims(dims(1, 1));
        builder.add_start(Point::new(0, 1)).add_end(Point::new(1, 0)).cell(Point::new(0, 0), Cell::triangle(2, Color::Yellow));
        let grid = builder.build().unwrap();
        assert!(validate(&grid, &path(&[(0, 1), (0, 0), (1, 0)])).is_valid);
    }

    fn around_two_by_two() -> SolutionPath {
        path(&[(0, 2), (0, 1), (0, 0), (1, 0), (2, 0), (2, 1), (2, 2)])
    }

    fn square_grid(pieces: &[(Point, Cell)]) -> Grid {
        let mut builder = GridBuilder::with_dims(dims(2, 2));
        builder.add_start(Point::new(0, 2)).add_end(Point::new(2, 2));
        for (at, cell) in pieces {
            builder.cell(*at, cell.clone());
        }
        builder.build().unwrap()
    }

    #[test]
    fn tetromino_area_must_match_region() {
        let o = Polyomino::from_cells([(0, 0), (1, 0), (0, 1), (1, 1)]).unwrap();

        let fits = square_grid(&[(Point::new(0, 0), Cell::tetromino(o.clone(), false, false, Color::Yellow))]);
        assert!(validate(&fits, &around_two_by_two()).is_valid);

        let too_much = square_grid(&[
            (Point::new(0, 0), Cell::tetromino(o.clone(), false, false, Color::Yellow)),
            (Point::new(1, 1), Cell::tetromino(o.clone(), true, false, Color::Yellow)),
        ]);
        let result = validate(&too_much, &around_two_by_two());
        assert!(!result.is_valid);
        assert_eq!(result.error_cells, vec![Point::new(0, 0), Point::new(1, 1)]);

        // a negative piece brings the net area back to the region size
        let cancelled = square_grid(&[
            (Point::new(0, 0), Cell::tetromino(o.clone(), false, false, Color::Yellow)),
            (Point::new(1, 0), Cell::tetromino(o.clone(), false, false, Color::Yellow)),
            (Point::new(1, 1), Cell::tetromino(o, true, true, Color::Blue)),
        ]);
        assert!(validate(&cancelled, &around_two_by_two()).is_valid);
    }

    #[test]
    fn rotation_flag_decides_fit() {
        let upright = Polyomino::from_cells([(0, 0), (0, 1), (0, 2), (0, 3)]).unwrap();

        let fixed = strip(vec![Cell::tetromino(upright.clone(), false, false, Color::Yellow), Cell::default(), Cell::default(), Cell::default()]);
        assert!(!validate(&fixed, &along_bottom(4)).is_valid);

        let rotatable = strip(vec![Cell::tetromino(upright, true, false, Color::Yellow), Cell::default(), Cell::default(), Cell::default()]);
        assert!(validate(&rotatable, &along_bottom(4)).is_valid);
    }

    #[test]
    fn domino_region_is_found_by_the_search() {
        init();
        let domino = Polyomino::from_cells([(0, 0), (0, 1)]).unwrap();
        let grid = GridBuilder::with_dims(dims(2, 2))
            .add_start(Point::new(1, 2))
            .add_end(Point::new(1, 0))
            .cell(Point::new(0, 0), Cell::tetromino(domino, false, false, Color::Yellow))
            .build()
            .unwrap();

        // only the cut down the middle leaves the domino its own column
        assert!(validate(&grid, &path(&[(1, 2), (1, 1), (1, 0)])).is_valid);
        assert!(!validate(&grid, &path(&[(1, 2), (0, 2), (0, 1), (0, 0), (1, 0)])).is_valid);

        let stats = analyze(&grid, None);
        assert_eq!(stats.solution_count, 1);
        assert!(crate::difficulty::difficulty(&grid, None) > 0.0);
    }

    #[test]
    fn eraser_grid_has_a_solution() {
        let grid = strip(vec![Cell::star(Color::Black), Cell::eraser(Color::White)]);
        // splitting the two cells strands both symbols
        assert!(!validate(&grid, &path(&[(0, 1), (1, 1), (1, 0), (2, 0), (2, 1)])).is_valid);

        let stats = analyze(&grid, None);
        assert_eq!(stats.solution_count, 1);
        assert!(crate::difficulty::difficulty(&grid, None) > 0.0);
    }

    fn mirrored_strip(starts: &[(usize, usize)], ends: &[(usize, usize)]) -> Grid {
        let mut builder = GridBuilder::with_dims(dims(2, 1));
        builder.symmetry(SymmetryType::Horizontal);
        for (x, y) in starts {
            builder.add_start(Point::new(*x, *y));
        }
        for (x, y) in ends {
            builder.add_end(Point::new(*x, *y));
        }
        builder.build().unwrap()
    }

    #[test]
    fn symmetric_paths_that_stay_apart() {
        let grid = mirrored_strip(&[(0, 1), (2, 1)], &[(0, 0), (2, 0)]);
        let result = validate(&grid, &path(&[(0, 1), (0, 0)]));
        assert!(result.is_valid);
        assert_eq!(result.regions.len(), 1);
    }

    #[test]
    fn symmetric_paths_meeting_at_a_node() {
        let grid = mirrored_strip(&[(0, 1), (2, 1)], &[(1, 1)]);
        let result = validate(&grid, &path(&[(0, 1), (1, 1)]));
        assert_eq!(result.error_reason, Some(InvalidReason::Collision(Collision::SharedNode)));
    }

    #[test]
    fn symmetric_paths_sharing_an_edge() {
        let grid = mirrored_strip(&[(0, 0), (2, 0)], &[(0, 1), (2, 1)]);
        let result = validate(&grid, &path(&[(0, 0), (0, 1), (1, 1), (2, 1)]));
        assert_eq!(result.error_reason, Some(InvalidReason::Collision(Collision::SharedEdge)));
    }

    #[test]
    fn path_on_its_own_mirror_edge() {
        let grid = mirrored_strip(&[(0, 1), (2, 1)], &[(1, 1)]);
        let result = validate(&grid, &path(&[(0, 1), (0, 0), (1, 0), (1, 1)]));
        assert_eq!(result.error_reason, Some(InvalidReason::Collision(Collision::SelfMirroredEdge)));
    }

    fn mirrored_strip_with(edge: EdgeId, kind: EdgeKind) -> Grid {
        GridBuilder::with_dims(dims(2, 1))
            .symmetry(SymmetryType::Horizontal)
            .add_start(Point::new(0, 1))
            .add_start(Point::new(2, 1))
            .add_end(Point::new(0, 0))
            .add_end(Point::new(2, 0))
            .edge(edge, kind)
            .build()
            .unwrap()
    }

    #[test]
    fn symmetric_search_respects_hexagon_owners() {
        let left = EdgeId::Vertical { row: 0, col: 0 };
        let (from_left, from_right) = ([Point::new(0, 1)], [Point::new(2, 1)]);

        let plain = mirrored_strip(&[(0, 1), (2, 1)], &[(0, 0), (2, 0)]);
        assert_eq!(analyze(&plain, None).solution_count, 1);

        // only the main path may take the left edge
        let main_only = mirrored_strip_with(left, EdgeKind::HexagonMain);
        assert!(validate(&main_only, &path(&[(0, 1), (0, 0)])).is_valid);
        assert!(!validate(&main_only, &path(&[(2, 1), (2, 0)])).is_valid);
        assert_eq!(analyze(&main_only, Some(&from_left[..])).solution_count, 1);
        assert_eq!(analyze(&main_only, Some(&from_right[..])).solution_count, 0);

        // only the mirrored path may take it
        let mirror_only = mirrored_strip_with(left, EdgeKind::HexagonSymmetry);
        assert!(!validate(&mirror_only, &path(&[(0, 1), (0, 0)])).is_valid);
        assert!(validate(&mirror_only, &path(&[(2, 1), (2, 0)])).is_valid);
        assert_eq!(analyze(&mirror_only, Some(&from_left[..])).solution_count, 0);
        assert_eq!(analyze(&mirror_only, Some(&from_right[..])).solution_count, 1);
    }

    /// Three cells in a row, the first walled off by an absent edge, with a hexagon on the node above the wall.
    fn walled_hexagon(cells: &[(usize, Cell)]) -> Grid {
        let mut builder = GridBuilder::with_dims(dims(3, 1));
        builder
            .add_start(Point::new(0, 1))
            .add_end(Point::new(3, 1))
            .edge(EdgeId::Vertical { row: 0, col: 1 }, EdgeKind::Absent)
            .node(Point::new(1, 0), NodeKind::Hexagon);
        for (x, cell) in cells {
            builder.cell(Point::new(*x, 0), cell.clone());
        }
        builder.build().unwrap()
    }

    #[test]
    fn shared_hexagon_is_claimed_once() {
        // both erasers can only spend themselves on the one hexagon
        let contested = walled_hexagon(&[(0, Cell::eraser(Color::White)), (1, Cell::eraser(Color::White))]);
        let result = validate(&contested, &along_bottom(3));
        assert_eq!(result.regions.len(), 2);
        assert!(!result.is_valid);
        assert_eq!(result.error_nodes, vec![Point::new(1, 0)]);
        assert_eq!(result.error_reason, Some(InvalidReason::MissedHexagon));

        // with a lonely star beside the second eraser the hexagon goes to the first region
        let settled = walled_hexagon(&[
            (0, Cell::eraser(Color::White)),
            (1, Cell::eraser(Color::White)),
            (2, Cell::star(Color::Black)),
        ]);
        let result = validate(&settled, &along_bottom(3));
        assert!(result.is_valid);
        assert_eq!(result.invalidated_nodes, vec![Point::new(1, 0)]);
        assert_eq!(result.invalidated_cells.len(), 3);
        assert!(result.error_nodes.is_empty());
    }

    #[test]
    fn external_cells_leave_no_region() {
        let outside = Point::new(1, 0);
        let mut builder = GridBuilder::with_dims(dims(2, 1));
        builder.add_start(Point::new(0, 1)).add_end(Point::new(1, 0));
        for edge in [
            EdgeId::Horizontal { row: 0, col: 1 },
            EdgeId::Vertical { row: 0, col: 2 },
            EdgeId::Horizontal { row: 1, col: 1 },
            EdgeId::Vertical { row: 0, col: 1 },
        ] {
            builder.edge(edge, EdgeKind::Absent);
        }
        let grid = builder.build().unwrap();

        let result = validate(&grid, &path(&[(0, 1), (0, 0), (1, 0)]));
        assert!(result.is_valid);
        assert_eq!(result.regions.len(), 1);
        assert_eq!(result.regions[0].cells, vec![Point::new(0, 0)]);
        assert!(!result.regions[0].contains(outside));
    }

    #[test]
    fn structural_faults() {
        let grid = strip(vec![Cell::default(); 2]);
        let reason = |points: &[(usize, usize)]| validate(&grid, &path(points)).error_reason;

        assert_eq!(reason(&[(0, 1)]), Some(InvalidReason::Path(PathFault::TooShort)));
        assert_eq!(reason(&[(0, 1), (0, 2)]), Some(InvalidReason::Path(PathFault::OutOfBounds)));
        assert_eq!(reason(&[(1, 1), (2, 1)]), Some(InvalidReason::Path(PathFault::NotAtStart)));
        assert_eq!(reason(&[(0, 1), (1, 1)]), Some(InvalidReason::Path(PathFault::NotAtEnd)));
        assert_eq!(reason(&[(0, 1), (2, 1)]), Some(InvalidReason::Path(PathFault::NotAdjacent)));
        assert_eq!(reason(&[(0, 1), (1, 1), (1, 0), (0, 0), (0, 1), (1, 1), (2, 1)]), Some(InvalidReason::Path(PathFault::RepeatedNode)));

        let grid = GridBuilder::with_dims(dims(2, 1))
            .add_start(Point::new(0, 1))
            .add_end(Point::new(2, 1))
            .edge(EdgeId::Horizontal { row: 1, col: 1 }, EdgeKind::Broken)
            .build()
            .unwrap();
        assert_eq!(validate(&grid, &along_bottom(2)).error_reason, Some(InvalidReason::Path(PathFault::BlockedEdge)));

        // a point past the lattice has no mirror image to compare against
        let mirrored = mirrored_strip(&[(0, 1), (2, 1)], &[(0, 0), (2, 0)]);
        assert_eq!(validate(&mirrored, &path(&[(0, 1), (5, 1)])).error_reason, Some(InvalidReason::Path(PathFault::OutOfBounds)));
        assert_eq!(analyze(&mirrored, Some(&[Point::new(7, 0)][..])).solution_count, 0);
    }

    #[test]
    fn result_json_shape() {
        let grid = mirrored_strip(&[(0, 1), (2, 1)], &[(1, 1)]);
        let rejected = serde_json::to_value(validate(&grid, &path(&[(0, 1), (1, 1)]))).unwrap();
        assert_eq!(rejected["isValid"], json!(false));
        assert_eq!(rejected["errorReason"], json!({ "kind": "collision", "detail": "sharedNode" }));

        let top = EdgeId::Horizontal { row: 0, col: 0 };
        let grid = GridBuilder::with_dims(dims(1, 1))
            .add_start(Point::new(0, 1))
            .add_end(Point::new(1, 0))
            .edge(top, EdgeKind::Hexagon)
            .build()
            .unwrap();
        let missed = serde_json::to_value(validate(&grid, &path(&[(0, 1), (1, 1), (1, 0)]))).unwrap();
        assert_eq!(missed["errorEdges"], json!([{ "orientation": "horizontal", "row": 0, "col": 0 }]));
        assert_eq!(missed["errorReason"], json!({ "kind": "missedHexagon" }));
        assert_eq!(missed["regions"], json!([{ "cells": [{ "x": 0, "y": 0 }] }]));

        let accepted = serde_json::to_value(validate(&grid, &path(&[(0, 1), (0, 0), (1, 0)]))).unwrap();
        assert!(accepted.get("errorReason").is_none());
    }

    #[test]
    fn validator_reuses_its_memo() {
        let upright = Polyomino::from_cells([(0, 0), (0, 1), (0, 2), (0, 3)]).unwrap();
        let grid = strip(vec![Cell::tetromino(upright, true, false, Color::Yellow), Cell::default(), Cell::default(), Cell::default()]);
        let mut validator = Validator::new();
        let first = validator.validate(&grid, &along_bottom(4));
        assert_eq!(validator.validate(&grid, &along_bottom(4)), first);
    }

    #[test]
    fn ascii_picture_of_symbols() {
        let grid = GridBuilder::with_dims(dims(2, 1))
            .add_start(Point::new(0, 1))
            .add_end(Point::new(2, 0))
            .node(Point::new(1, 0), NodeKind::Hexagon)
            .edge(EdgeId::Horizontal { row: 1, col: 1 }, EdgeKind::HexagonMain)
            .cell(Point::new(0, 0), Cell::triangle(2, Color::Yellow))
            .cell(Point::new(1, 0), Cell::tetromino(Polyomino::from_cells([(0, 0)]).unwrap(), false, true, Color::Blue))
            .build()
            .unwrap();

        assert_eq!(format!("{}", grid), "+-o-E\n|2|n|\nS-+m+\n");
    }

    #[test]
    fn generated_grid_survives_a_share_code() {
        init();
        let grid = generate(3, 3, &GenerationOptions { seed: "share me".into(), ..Default::default() });
        assert!(analyze(&grid, None).solution_count >= 1);

        let payload = Payload { puzzle: Some(PuzzleData::from(&grid)), ..Default::default() };
        let code = codec::encode(&payload, CodecMode::Recovery).unwrap();
        let decoded = codec::decode(&code).unwrap();
        let restored = Grid::try_from(decoded.puzzle.unwrap()).unwrap();
        assert_eq!(restored, grid);
    }
}

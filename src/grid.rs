use std::fmt::{Display, Formatter};

use itertools::Itertools;
use ndarray::Array2;

use crate::cell::{Cell, CellKind, EdgeKind, NodeKind};
use crate::location::{EdgeId, Point};
use crate::shape::Direction;
use crate::symmetry::SymmetryType;

/// The static geometry of one puzzle.
///
/// Array shapes are fixed when the grid is built: `rows x cols` cells, `(rows + 1) x cols` horizontal edges,
/// `rows x (cols + 1)` vertical edges and `(rows + 1) x (cols + 1)` nodes, all indexed `(row, col)`.
///
/// [`Grid`]s should be built using a [`GridBuilder`](crate::builder::GridBuilder), produced by the
/// [`Generator`](crate::generator::Generator) or converted from [`PuzzleData`](crate::data::PuzzleData).
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Grid {
    pub(crate) rows: usize,
    pub(crate) cols: usize,
    pub(crate) cells: Array2<Cell>,
    pub(crate) h_edges: Array2<EdgeKind>,
    pub(crate) v_edges: Array2<EdgeKind>,
    pub(crate) nodes: Array2<NodeKind>,
    pub(crate) symmetry: SymmetryType,
    pub(crate) seed: String,
}

impl Grid {
    /// An empty grid with plain edges and nodes.
    pub(crate) fn blank(cols: usize, rows: usize) -> Self {
        Self {
            rows,
            cols,
            cells: Array2::from_shape_simple_fn((rows, cols), Cell::default),
            h_edges: Array2::from_elem((rows + 1, cols), EdgeKind::Normal),
            v_edges: Array2::from_elem((rows, cols + 1), EdgeKind::Normal),
            nodes: Array2::from_elem((rows + 1, cols + 1), NodeKind::Normal),
            symmetry: SymmetryType::None,
            seed: String::new(),
        }
    }

    /// Number of cell rows.
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Number of cell columns.
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// The symmetry mode.
    pub fn symmetry(&self) -> SymmetryType {
        self.symmetry
    }

    /// The opaque seed string this grid was generated from, if any.
    pub fn seed(&self) -> &str {
        &self.seed
    }

    /// Number of lattice nodes, `(rows + 1) * (cols + 1)`.
    pub fn node_count(&self) -> usize {
        (self.rows + 1) * (self.cols + 1)
    }

    /// Row-major index of a node, used for bitsets.
    pub(crate) fn node_index(&self, point: Point) -> usize {
        point.y * (self.cols + 1) + point.x
    }

    /// Row-major index of a cell.
    pub(crate) fn cell_index(&self, cell: Point) -> usize {
        cell.y * self.cols + cell.x
    }

    pub(crate) fn contains_node(&self, point: Point) -> bool {
        point.x <= self.cols && point.y <= self.rows
    }

    pub(crate) fn contains_cell(&self, cell: Point) -> bool {
        cell.x < self.cols && cell.y < self.rows
    }

    pub(crate) fn contains_edge(&self, edge: EdgeId) -> bool {
        match edge {
            EdgeId::Horizontal { row, col } => row <= self.rows && col < self.cols,
            EdgeId::Vertical { row, col } => row < self.rows && col <= self.cols,
        }
    }

    /// The cell at `cell`. Panics if out of bounds.
    pub fn cell(&self, cell: Point) -> &Cell {
        &self.cells[cell.as_index()]
    }

    /// The state of `edge`. Panics if out of bounds.
    pub fn edge(&self, edge: EdgeId) -> EdgeKind {
        match edge {
            EdgeId::Horizontal { row, col } => self.h_edges[(row, col)],
            EdgeId::Vertical { row, col } => self.v_edges[(row, col)],
        }
    }

    /// The state of node `point`. Panics if out of bounds.
    pub fn node(&self, point: Point) -> NodeKind {
        self.nodes[point.as_index()]
    }

    pub(crate) fn set_cell(&mut self, cell: Point, value: Cell) {
        self.cells[cell.as_index()] = value;
    }

    pub(crate) fn set_edge(&mut self, edge: EdgeId, kind: EdgeKind) {
        match edge {
            EdgeId::Horizontal { row, col } => self.h_edges[(row, col)] = kind,
            EdgeId::Vertical { row, col } => self.v_edges[(row, col)] = kind,
        }
    }

    pub(crate) fn set_node(&mut self, point: Point, kind: NodeKind) {
        self.nodes[point.as_index()] = kind;
    }

    /// All cell coordinates in row-major order.
    pub fn all_cells(&self) -> impl Iterator<Item = Point> + '_ {
        (0..self.rows).cartesian_product(0..self.cols).map(|(y, x)| Point::new(x, y))
    }

    /// All node coordinates in row-major order.
    pub fn all_nodes(&self) -> impl Iterator<Item = Point> + '_ {
        (0..=self.rows).cartesian_product(0..=self.cols).map(|(y, x)| Point::new(x, y))
    }

    /// All edges, horizontal first, each in row-major order.
    pub fn all_edges(&self) -> impl Iterator<Item = EdgeId> + '_ {
        let horizontal = (0..=self.rows).cartesian_product(0..self.cols).map(|(row, col)| EdgeId::Horizontal { row, col });
        let vertical = (0..self.rows).cartesian_product(0..=self.cols).map(|(row, col)| EdgeId::Vertical { row, col });
        horizontal.chain(vertical)
    }

    /// Cells carrying a symbol.
    pub fn symbol_cells(&self) -> impl Iterator<Item = Point> + '_ {
        self.all_cells().filter(|c| self.cell(*c).is_symbol())
    }

    /// Every Start node, row-major.
    pub fn starts(&self) -> Vec<Point> {
        self.all_nodes().filter(|p| self.node(*p) == NodeKind::Start).collect_vec()
    }

    /// Every End node, row-major.
    pub fn ends(&self) -> Vec<Point> {
        self.all_nodes().filter(|p| self.node(*p) == NodeKind::End).collect_vec()
    }

    /// The four edges around `cell`: top, right, bottom, left.
    pub fn cell_edges(&self, cell: Point) -> [EdgeId; 4] {
        [
            EdgeId::Horizontal { row: cell.y, col: cell.x },
            EdgeId::Vertical { row: cell.y, col: cell.x + 1 },
            EdgeId::Horizontal { row: cell.y + 1, col: cell.x },
            EdgeId::Vertical { row: cell.y, col: cell.x },
        ]
    }

    /// The one or two cells bordering `edge`.
    pub fn edge_cells(&self, edge: EdgeId) -> Vec<Point> {
        let candidates = match edge {
            EdgeId::Horizontal { row, col } => [Point::new(col, row.wrapping_sub(1)), Point::new(col, row)],
            EdgeId::Vertical { row, col } => [Point::new(col.wrapping_sub(1), row), Point::new(col, row)],
        };
        candidates.into_iter().filter(|c| self.contains_cell(*c)).collect_vec()
    }

    /// The up to four cells touching node `point`.
    pub fn node_cells(&self, point: Point) -> Vec<Point> {
        [(-1, -1), (0, -1), (-1, 0), (0, 0)].into_iter()
            .map(|offset| point.offset_by(offset))
            .filter(|c| self.contains_cell(*c))
            .collect_vec()
    }

    /// Whether `edge` lies on the outer boundary of the lattice.
    pub fn is_boundary_edge(&self, edge: EdgeId) -> bool {
        self.edge_cells(edge).len() < 2
    }

    /// In-bounds neighbors of `point` reachable over traversable edges.
    pub(crate) fn open_neighbors(&self, point: Point) -> impl Iterator<Item = (EdgeId, Point)> + '_ {
        Direction::neighbors_of(point, self.cols, self.rows)
            .filter_map(move |(_, next)| EdgeId::between(point, next).map(|edge| (edge, next)))
            .filter(move |(edge, _)| self.edge(*edge).is_traversable())
    }

    /// The cell on the far side of `edge` from `cell`, if inside the grid.
    pub(crate) fn across(&self, cell: Point, edge: EdgeId) -> Option<Point> {
        self.edge_cells(edge).into_iter().find(|c| *c != cell)
    }
}

fn cell_char(cell: &Cell) -> char {
    match cell.kind {
        CellKind::None => ' ',
        CellKind::Square => 'q',
        CellKind::Star => 'x',
        CellKind::Tetromino => 't',
        CellKind::TetrominoRotatable => 'r',
        CellKind::TetrominoNegative => 'n',
        CellKind::TetrominoNegativeRotatable => 'u',
        CellKind::Eraser => 'e',
        CellKind::Triangle => match cell.count {
            Some(1) => '1',
            Some(2) => '2',
            Some(3) => '3',
            _ => '?',
        },
    }
}

fn node_char(kind: NodeKind) -> char {
    match kind {
        NodeKind::Normal => '+',
        NodeKind::Start => 'S',
        NodeKind::End => 'E',
        NodeKind::Hexagon => 'o',
        NodeKind::HexagonMain => 'm',
        NodeKind::HexagonSymmetry => 'y',
    }
}

fn edge_char(kind: EdgeKind, horizontal: bool) -> char {
    match kind {
        EdgeKind::Normal => if horizontal { '-' } else { '|' },
        EdgeKind::Broken => if horizontal { '~' } else { ':' },
        EdgeKind::Absent => ' ',
        EdgeKind::Hexagon => 'o',
        EdgeKind::HexagonMain => 'm',
        EdgeKind::HexagonSymmetry => 'y',
    }
}

impl Display for Grid {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let mut out = String::with_capacity((2 * self.rows + 1) * (2 * self.cols + 2));

        for row in 0..=self.rows {
            for col in 0..=self.cols {
                out.push(node_char(self.nodes[(row, col)]));
                if col < self.cols {
                    out.push(edge_char(self.h_edges[(row, col)], true));
                }
            }
            out.push('\n');

            if row < self.rows {
                for col in 0..=self.cols {
                    out.push(edge_char(self.v_edges[(row, col)], false));
                    if col < self.cols {
                        out.push(cell_char(&self.cells[(row, col)]));
                    }
                }
                out.push('\n');
            }
        }

        write!(f, "{}", out)
    }
}

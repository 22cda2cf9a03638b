use crate::cell::{Cell, CellKind, EdgeKind, NodeKind};
use crate::grid::Grid;
use crate::location::{Dimension, EdgeId, Point};
use crate::symmetry::SymmetryType;

/// Reasons a builder may become invalid while building.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum BuilderInvalidReason {
    /// A feature like a symbol or marker was placed outside the bounds specified by `dims`.
    FeatureOutOfBounds,
    /// A tetromino cell was given without a shape, or a triangle without a count in `1..=3`.
    IncompleteSymbol,
    /// [`build`](GridBuilder::build) found no Start or no End node.
    MissingTerminal,
}

/// A builder for [`Grid`]s.
///
/// Builders mutate themselves while building but can be [`Clone`]d to save their state at some point.
/// Once a builder becomes invalid every further call does nothing and [`build`](Self::build) reports why.
#[derive(Clone)]
pub struct GridBuilder {
    grid: Grid,
    invalid_reasons: Vec<BuilderInvalidReason>,
}

impl Default for GridBuilder {
    fn default() -> Self {
        Self::with_dims((Dimension::MIN.saturating_add(3), Dimension::MIN.saturating_add(3)))
    }
}

impl GridBuilder {
    /// Construct a new builder with the specified dimensions, in `(cols, rows)` order.
    pub fn with_dims(dims: (Dimension, Dimension)) -> Self {
        Self {
            grid: Grid::blank(dims.0.get(), dims.1.get()),
            invalid_reasons: Default::default(),
        }
    }

    fn guard(&mut self, in_bounds: bool) -> bool {
        if !self.invalid_reasons.is_empty() {
            return false;
        }
        if !in_bounds {
            self.invalid_reasons.push(BuilderInvalidReason::FeatureOutOfBounds);
        }

        in_bounds
    }

    /// Mark node `point` as a Start node.
    pub fn add_start(&mut self, point: Point) -> &mut Self {
        self.node(point, NodeKind::Start)
    }

    /// Mark node `point` as an End node.
    pub fn add_end(&mut self, point: Point) -> &mut Self {
        self.node(point, NodeKind::End)
    }

    /// Set the state of node `point`.
    pub fn node(&mut self, point: Point, kind: NodeKind) -> &mut Self {
        if self.guard(self.grid.contains_node(point)) {
            self.grid.set_node(point, kind);
        }

        self
    }

    /// Set the state of `edge`.
    pub fn edge(&mut self, edge: EdgeId, kind: EdgeKind) -> &mut Self {
        if self.guard(self.grid.contains_edge(edge)) {
            self.grid.set_edge(edge, kind);
        }

        self
    }

    /// Place a symbol in `cell`.
    ///
    /// May cause the builder to enter an [`IncompleteSymbol`](BuilderInvalidReason::IncompleteSymbol) invalid state
    /// if a tetromino comes without a shape or a triangle without a usable count.
    pub fn cell(&mut self, cell: Point, value: Cell) -> &mut Self {
        if !self.guard(self.grid.contains_cell(cell)) {
            return self;
        }

        let complete = match value.kind {
            kind if kind.is_tetromino() => value.shape.is_some(),
            CellKind::Triangle => value.count.is_some_and(|count| (1..=3).contains(&count)),
            _ => true,
        };
        if !complete {
            self.invalid_reasons.push(BuilderInvalidReason::IncompleteSymbol);
            return self;
        }

        self.grid.set_cell(cell, value);
        self
    }

    /// Set the symmetry mode.
    pub fn symmetry(&mut self, symmetry: SymmetryType) -> &mut Self {
        self.grid.symmetry = symmetry;
        self
    }

    /// Set the seed string carried by the grid.
    pub fn seed(&mut self, seed: impl Into<String>) -> &mut Self {
        self.grid.seed = seed.into();
        self
    }

    /// Check the validity of this builder, returning the reasons it is invalid if any.
    pub fn is_valid(&self) -> Option<&Vec<BuilderInvalidReason>> {
        match self.invalid_reasons.is_empty() {
            true => None,
            false => Some(&self.invalid_reasons),
        }
    }

    /// Convert the state of this builder into a [`Grid`].
    /// If the builder is invalid for any reason, a reference to a [`Vec`] of [`BuilderInvalidReason`] will indicate why.
    pub fn build(&mut self) -> Result<Grid, &Vec<BuilderInvalidReason>> {
        if self.invalid_reasons.is_empty() && (self.grid.starts().is_empty() || self.grid.ends().is_empty()) {
            self.invalid_reasons.push(BuilderInvalidReason::MissingTerminal);
        }
        if !self.invalid_reasons.is_empty() {
            return Err(&self.invalid_reasons);
        }

        Ok(self.grid.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dims(cols: usize, rows: usize) -> (Dimension, Dimension) {
        (Dimension::new(cols).unwrap(), Dimension::new(rows).unwrap())
    }

    #[test]
    fn out_of_bounds_poisons_builder() {
        let mut builder = GridBuilder::with_dims(dims(2, 2));
        builder.add_start(Point::new(0, 2))
            .add_end(Point::new(3, 0))
            .cell(Point::new(0, 0), Cell::square(Default::default()));

        assert_eq!(builder.build(), Err(&vec![BuilderInvalidReason::FeatureOutOfBounds]));
    }

    #[test]
    fn triangle_needs_count() {
        let mut builder = GridBuilder::with_dims(dims(2, 2));
        builder.add_start(Point::new(0, 2))
            .add_end(Point::new(2, 0))
            .cell(Point::new(0, 0), Cell { kind: CellKind::Triangle, ..Default::default() });

        assert_eq!(builder.is_valid(), Some(&vec![BuilderInvalidReason::IncompleteSymbol]));
    }

    #[test]
    fn requires_terminals() {
        let mut builder = GridBuilder::with_dims(dims(1, 1));
        builder.add_start(Point::new(0, 0));
        assert_eq!(builder.build(), Err(&vec![BuilderInvalidReason::MissingTerminal]));
    }

    #[test]
    fn ascii_picture() {
        let grid = GridBuilder::with_dims(dims(2, 1))
            .add_start(Point::new(0, 1))
            .add_end(Point::new(2, 0))
            .edge(EdgeId::Vertical { row: 0, col: 1 }, EdgeKind::Broken)
            .cell(Point::new(1, 0), Cell::star(Default::default()))
            .build()
            .unwrap();

        assert_eq!(format!("{}", grid), "+-+-E\n| :x|\nS-+-+\n");
    }
}

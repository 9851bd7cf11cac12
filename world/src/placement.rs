//! Mapping of floating shapes onto grid cells, validation, commit and
//! feasibility search.

use marble_smash_core::{GridCoord, MarbleColor, PlacementError, ShapeInstance, ShapeTemplate};

use crate::grid::GridModel;

/// One marble of a shape paired with the cell it would land on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PlannedMarble {
    /// Index of the marble inside its shape.
    pub marble: usize,
    /// Cell receiving the marble.
    pub cell: GridCoord,
    /// Color of the marble.
    pub color: MarbleColor,
}

/// Candidate mapping from the marbles of a shape onto grid cells.
///
/// Marbles whose target falls outside the grid are omitted, so a plan
/// shorter than its shape can never validate.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlacementPlan {
    expected: usize,
    marbles: Vec<PlannedMarble>,
}

impl PlacementPlan {
    /// Creates a plan for a shape of `expected` marbles.
    #[must_use]
    pub fn new(expected: usize, marbles: Vec<PlannedMarble>) -> Self {
        Self { expected, marbles }
    }

    /// Number of marbles in the shape the plan was built for.
    #[must_use]
    pub const fn expected_size(&self) -> usize {
        self.expected
    }

    /// Number of marbles that resolved to a cell.
    #[must_use]
    pub fn len(&self) -> usize {
        self.marbles.len()
    }

    /// Reports whether no marble resolved to a cell.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.marbles.is_empty()
    }

    /// Resolved marbles in shape order.
    #[must_use]
    pub fn marbles(&self) -> &[PlannedMarble] {
        &self.marbles
    }

    /// Target cells in shape order.
    #[must_use]
    pub fn cells(&self) -> Vec<GridCoord> {
        self.marbles.iter().map(|marble| marble.cell).collect()
    }

    /// Occupies every target cell and returns the cells that were filled.
    ///
    /// Callers validate the plan first; the commit does not repeat the check.
    ///
    /// # Panics
    ///
    /// Panics when the plan is partial or a target cell is not available,
    /// which includes committing the same plan twice.
    pub fn commit(&self, grid: &mut GridModel) -> Vec<GridCoord> {
        assert_eq!(
            self.marbles.len(),
            self.expected,
            "cannot commit a partial placement plan"
        );
        for marble in &self.marbles {
            grid.occupy(marble.cell, marble.color);
        }
        self.cells()
    }
}

/// Read-only placement queries over a grid.
#[derive(Clone, Copy, Debug)]
pub struct PlacementEngine<'g> {
    grid: &'g GridModel,
}

impl<'g> PlacementEngine<'g> {
    /// Creates an engine answering queries about `grid`.
    #[must_use]
    pub const fn new(grid: &'g GridModel) -> Self {
        Self { grid }
    }

    /// Maps every marble of `shape` onto the grid with offset zero on `anchor`.
    #[must_use]
    pub fn resolve_targets(
        &self,
        template: &ShapeTemplate,
        shape: &ShapeInstance,
        anchor: GridCoord,
    ) -> PlacementPlan {
        let marbles = translate(template, anchor)
            .zip(shape.colors())
            .enumerate()
            .filter_map(|(marble, (cell, color))| {
                let cell = cell.filter(|cell| self.grid.contains(*cell))?;
                Some(PlannedMarble {
                    marble,
                    cell,
                    color: *color,
                })
            })
            .collect();
        PlacementPlan::new(shape.marble_count(), marbles)
    }

    /// Explains why a plan cannot be committed, if it cannot.
    pub fn validate(&self, plan: &PlacementPlan, expected: usize) -> Result<(), PlacementError> {
        if plan.len() != expected || plan.expected_size() != expected {
            return Err(PlacementError::OutOfGrid);
        }

        let cells = plan.cells();
        for (index, cell) in cells.iter().enumerate() {
            if cells[..index].contains(cell) {
                return Err(PlacementError::Overlapping);
            }
        }

        for cell in &cells {
            match self.grid.cell(*cell) {
                None => return Err(PlacementError::OutOfGrid),
                Some(target) if target.is_locked() => return Err(PlacementError::Locked),
                Some(target) if target.is_occupied() => return Err(PlacementError::Occupied),
                Some(_) => {}
            }
        }

        Ok(())
    }

    /// Reports whether a plan may be committed.
    #[must_use]
    pub fn is_valid(&self, plan: &PlacementPlan, expected: usize) -> bool {
        self.validate(plan, expected).is_ok()
    }

    /// Reports whether the template fits with offset zero on `anchor`.
    #[must_use]
    pub fn fits_at(&self, template: &ShapeTemplate, anchor: GridCoord) -> bool {
        translate(template, anchor)
            .all(|cell| cell.map_or(false, |cell| self.grid.is_available(cell)))
    }

    /// Every anchor where the template fits, in row-major order.
    #[must_use]
    pub fn anchors_for(&self, template: &ShapeTemplate) -> Vec<GridCoord> {
        self.grid
            .available_cells()
            .filter(|anchor| self.fits_at(template, *anchor))
            .collect()
    }

    /// Exhaustive search for any translation of the template onto free cells.
    ///
    /// Every template offset is tried as the pivot landing on each available
    /// cell; the search stops at the first fit.
    #[must_use]
    pub fn can_be_placed_anywhere(&self, template: &ShapeTemplate) -> bool {
        self.grid.available_cells().any(|candidate| {
            template.offsets().iter().any(|pivot| {
                let Some(shift) = candidate.checked_sub(*pivot) else {
                    return false;
                };
                template.offsets().iter().all(|offset| {
                    shift
                        .checked_add(*offset)
                        .map_or(false, |cell| self.grid.is_available(cell))
                })
            })
        })
    }
}

/// Coordinates covered by the template when offset zero lands on `anchor`.
///
/// Offsets whose coordinate falls outside the integer range yield `None`.
pub(crate) fn translate(
    template: &ShapeTemplate,
    anchor: GridCoord,
) -> impl Iterator<Item = Option<GridCoord>> + '_ {
    let shift = anchor.checked_sub(template.anchor_offset());
    template
        .offsets()
        .iter()
        .map(move |offset| shift?.checked_add(*offset))
}

#[cfg(test)]
mod tests {
    use super::*;
    use marble_smash_core::ShapeId;

    const RED: MarbleColor = MarbleColor::from_rgb(0xc8, 0x2a, 0x36);

    fn triangle() -> ShapeTemplate {
        ShapeTemplate::new(
            "triangle",
            vec![GridCoord::new(0, 0), GridCoord::new(1, 0), GridCoord::new(0, 1)],
        )
        .expect("triangle")
    }

    #[test]
    fn translation_keeps_anchor_offset_on_anchor() {
        let template = ShapeTemplate::new(
            "offset",
            vec![GridCoord::new(1, 1), GridCoord::new(2, 1)],
        )
        .expect("template");
        let cells: Vec<_> = translate(&template, GridCoord::new(4, 4)).collect();
        assert_eq!(
            cells,
            vec![Some(GridCoord::new(4, 4)), Some(GridCoord::new(5, 4))]
        );
    }

    #[test]
    fn resolve_targets_omits_cells_outside_the_grid() {
        let grid = GridModel::new(3, 3);
        let engine = PlacementEngine::new(&grid);
        let shape = ShapeInstance::new(ShapeId::new(0), vec![RED; 3]);

        let plan = engine.resolve_targets(&triangle(), &shape, GridCoord::new(2, 2));
        assert_eq!(plan.cells(), vec![GridCoord::new(2, 2)]);
        assert_eq!(plan.expected_size(), 3);
        assert_eq!(engine.validate(&plan, 3), Err(PlacementError::OutOfGrid));
    }
}

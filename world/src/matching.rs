//! Same-color connectivity search and explosion decisions.

use std::collections::{BTreeSet, VecDeque};

use marble_smash_core::{GridCoord, EXPLOSION_THRESHOLD};

use crate::grid::GridModel;

/// Cells marked for removal by a single resolution pass.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ExplosionResult {
    removed: BTreeSet<GridCoord>,
}

impl ExplosionResult {
    /// Number of marbles marked for removal.
    #[must_use]
    pub fn count(&self) -> usize {
        self.removed.len()
    }

    /// Reports whether nothing exploded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.removed.is_empty()
    }

    /// Reports whether the cell was marked for removal.
    #[must_use]
    pub fn contains(&self, cell: GridCoord) -> bool {
        self.removed.contains(&cell)
    }

    /// Marked cells in ascending coordinate order.
    #[must_use]
    pub fn cells(&self) -> Vec<GridCoord> {
        self.removed.iter().copied().collect()
    }

    /// Vacates every marked cell.
    pub fn apply(&self, grid: &mut GridModel) {
        for cell in &self.removed {
            let _ = grid.vacate(*cell);
        }
    }
}

/// Read-only connectivity queries over a grid.
#[derive(Clone, Copy, Debug)]
pub struct MatchResolver<'g> {
    grid: &'g GridModel,
}

impl<'g> MatchResolver<'g> {
    /// Creates a resolver answering queries about `grid`.
    #[must_use]
    pub const fn new(grid: &'g GridModel) -> Self {
        Self { grid }
    }

    /// Maximal set of occupied cells sharing the start cell's color and
    /// reachable from it through same-colored neighbors.
    ///
    /// Empty when the start cell holds no marble.
    #[must_use]
    pub fn find_connected_group(&self, start: GridCoord) -> BTreeSet<GridCoord> {
        let mut group = BTreeSet::new();
        let Some(color) = self.grid.occupant_color(start) else {
            return group;
        };

        let _ = group.insert(start);
        let mut frontier = VecDeque::from([start]);
        while let Some(cell) = frontier.pop_front() {
            for neighbor in self.grid.neighbors(cell) {
                if self.grid.occupant_color(neighbor) == Some(color) && group.insert(neighbor) {
                    frontier.push_back(neighbor);
                }
            }
        }
        group
    }

    /// Marks every group touching `affected` that reaches the explosion threshold.
    ///
    /// Each cell is evaluated at most once per pass; groups are measured
    /// against the current board only.
    #[must_use]
    pub fn plan_explosions(&self, affected: &[GridCoord]) -> ExplosionResult {
        let mut consumed = BTreeSet::new();
        let mut result = ExplosionResult::default();

        for &cell in affected {
            if consumed.contains(&cell) {
                continue;
            }

            let group = self.find_connected_group(cell);
            if group.len() >= EXPLOSION_THRESHOLD {
                result.removed.extend(group.iter().copied());
            }
            consumed.extend(group);
        }

        result
    }
}

/// Resolves matches created by a placement and vacates the exploded cells.
///
/// Cells emptied here are not re-examined; chaining is up to the caller.
pub fn resolve_after_placement(grid: &mut GridModel, affected: &[GridCoord]) -> ExplosionResult {
    let result = MatchResolver::new(grid).plan_explosions(affected);
    result.apply(grid);
    result
}

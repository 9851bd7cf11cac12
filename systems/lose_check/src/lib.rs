#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Terminal-state detection: fails the level once no queued shape fits.

use marble_smash_core::{Command, Event, LevelStatus, ShapeCatalog, ShapeInstance};
use marble_smash_world::{GridModel, PlacementEngine};

/// Reports whether none of the queued shapes can be placed anywhere.
///
/// An empty queue is never lost; a refill always follows it.
#[must_use]
pub fn is_level_lost(grid: &GridModel, catalog: &ShapeCatalog, queued: &[ShapeInstance]) -> bool {
    if queued.is_empty() {
        return false;
    }

    let engine = PlacementEngine::new(grid);
    queued.iter().all(|shape| match catalog.get(shape.shape()) {
        Some(template) => !engine.can_be_placed_anywhere(template),
        None => true,
    })
}

/// Pure system that re-evaluates feasibility whenever the board or tray changes.
#[derive(Clone, Copy, Debug, Default)]
pub struct LoseConditionChecker;

impl LoseConditionChecker {
    /// Creates a new checker.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Consumes world events and emits [`Command::FailLevel`] when the level is lost.
    pub fn handle(
        &mut self,
        events: &[Event],
        grid: &GridModel,
        catalog: &ShapeCatalog,
        queued: &[ShapeInstance],
        status: LevelStatus,
        out: &mut Vec<Command>,
    ) {
        if status != LevelStatus::InProgress {
            return;
        }

        let board_changed = events.iter().any(|event| {
            matches!(
                event,
                Event::ShapePlaced { .. }
                    | Event::MarblesExploded { .. }
                    | Event::ShapeOffered { .. }
                    | Event::CellUnlocked { .. }
                    | Event::QueueDiscarded { .. }
            )
        });
        if !board_changed {
            return;
        }

        if is_level_lost(grid, catalog, queued) {
            out.push(Command::FailLevel);
        }
    }
}

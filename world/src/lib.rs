#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative board state for Marble Smash.
//!
//! The world owns the hex grid, the shape tray and the level status. It only
//! changes in response to [`Command`]s passed to [`apply`], and it reports
//! every change as an [`Event`].

mod grid;
mod matching;
mod placement;
mod tray;

use marble_smash_core::{
    ColorPalette, Command, Event, GridCoord, Level, LevelStatus, PlacementError, ShapeCatalog,
    ShapeInstance, SlotId, QUEUE_CAPACITY,
};

pub use grid::{GridCell, GridModel};
pub use matching::{resolve_after_placement, ExplosionResult, MatchResolver};
pub use placement::{PlacementEngine, PlacementPlan, PlannedMarble};

use tray::ShapeTray;

/// Represents the authoritative state of a level in progress.
#[derive(Clone, Debug)]
pub struct World {
    level_id: u32,
    level_number: u32,
    grid: GridModel,
    catalog: ShapeCatalog,
    palette: ColorPalette,
    tray: ShapeTray,
    status: LevelStatus,
    goal: u32,
    reward: u32,
    turn: u64,
}

impl World {
    /// Builds the world for a validated level at the given display level number.
    #[must_use]
    pub fn new(level: &Level, level_number: u32) -> Self {
        Self {
            level_id: level.id(),
            level_number,
            grid: GridModel::from_level(level),
            catalog: level.catalog().clone(),
            palette: level.palette().clone(),
            tray: ShapeTray::default(),
            status: LevelStatus::InProgress,
            goal: level.goal(),
            reward: level.reward(),
            turn: 0,
        }
    }

    fn in_progress(&self) -> bool {
        self.status == LevelStatus::InProgress
    }

    fn accepts_offer(&self, shape: &ShapeInstance) -> bool {
        let Some(template) = self.catalog.get(shape.shape()) else {
            return false;
        };
        template.len() == shape.marble_count()
            && shape
                .colors()
                .iter()
                .all(|color| self.palette.contains(*color))
    }
}

fn reject(out_events: &mut Vec<Event>, slot: SlotId, anchor: GridCoord, reason: PlacementError) {
    out_events.push(Event::PlacementRejected {
        slot,
        anchor,
        reason,
    });
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::PlaceShape { slot, anchor } => {
            if !world.in_progress() {
                reject(out_events, slot, anchor, PlacementError::LevelOver);
                return;
            }
            let Some(shape) = world.tray.get(slot).cloned() else {
                reject(out_events, slot, anchor, PlacementError::EmptySlot);
                return;
            };
            let Some(template) = world.catalog.get(shape.shape()) else {
                reject(out_events, slot, anchor, PlacementError::EmptySlot);
                return;
            };

            let engine = PlacementEngine::new(&world.grid);
            let plan = engine.resolve_targets(template, &shape, anchor);
            if let Err(reason) = engine.validate(&plan, shape.marble_count()) {
                reject(out_events, slot, anchor, reason);
                return;
            }

            let cells = plan.commit(&mut world.grid);
            let _ = world.tray.take(slot);
            out_events.push(Event::ShapePlaced { slot, shape, cells });

            if world.tray.is_empty() {
                out_events.push(Event::QueueRefillRequested {
                    slots: QUEUE_CAPACITY,
                });
            }
        }
        Command::ResolveMatches { cells } => {
            let result = resolve_after_placement(&mut world.grid, &cells);
            if !result.is_empty() {
                out_events.push(Event::MarblesExploded {
                    count: result.count(),
                    cells: result.cells(),
                });
            }
        }
        Command::OfferShape { shape, mode } => {
            if !world.in_progress() || !world.accepts_offer(&shape) {
                return;
            }
            if let Some(slot) = world.tray.offer(shape.clone()) {
                out_events.push(Event::ShapeOffered { slot, shape, mode });
            }
        }
        Command::RefreshQueue => {
            if !world.in_progress() {
                return;
            }
            let shapes = world.tray.clear();
            out_events.push(Event::QueueDiscarded { shapes });
            out_events.push(Event::QueueRefillRequested {
                slots: QUEUE_CAPACITY,
            });
        }
        Command::DetonateCell { cell } => {
            if !world.in_progress() || world.grid.occupant_color(cell).is_none() {
                return;
            }
            let _ = world.grid.vacate(cell);
            out_events.push(Event::MarblesExploded {
                count: 1,
                cells: vec![cell],
            });
        }
        Command::UnlockCell { cell } => {
            if world.grid.unlock(cell) {
                out_events.push(Event::CellUnlocked { cell });
            }
        }
        Command::FailLevel => {
            if world.in_progress() {
                world.status = LevelStatus::Failed;
                out_events.push(Event::LevelFailed);
            }
        }
        Command::CompleteLevel => {
            if world.in_progress() {
                world.status = LevelStatus::Completed;
                out_events.push(Event::LevelCompleted {
                    reward: world.reward,
                });
            }
        }
        Command::CompleteTurn => {
            world.turn = world.turn.saturating_add(1);
            out_events.push(Event::TurnCompleted { turn: world.turn });
        }
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use marble_smash_core::{
        ColorPalette, GridCoord, LevelStatus, LockedCell, MarbleColor, ShapeCatalog,
        ShapeInstance, SlotId,
    };

    use super::{GridModel, PlacementEngine, World};

    /// Provides read-only access to the hex grid.
    #[must_use]
    pub fn grid(world: &World) -> &GridModel {
        &world.grid
    }

    /// Shape templates available on this level.
    #[must_use]
    pub fn catalog(world: &World) -> &ShapeCatalog {
        &world.catalog
    }

    /// Marble colors available on this level.
    #[must_use]
    pub fn palette(world: &World) -> &ColorPalette {
        &world.palette
    }

    /// Identifier of the level configuration being played.
    #[must_use]
    pub fn level_id(world: &World) -> u32 {
        world.level_id
    }

    /// Display level number, which keeps growing after the level sequence loops.
    #[must_use]
    pub fn level_number(world: &World) -> u32 {
        world.level_number
    }

    /// Current status of the level.
    #[must_use]
    pub fn status(world: &World) -> LevelStatus {
        world.status
    }

    /// Score required to complete the level.
    #[must_use]
    pub fn goal(world: &World) -> u32 {
        world.goal
    }

    /// Reward granted on completion.
    #[must_use]
    pub fn reward(world: &World) -> u32 {
        world.reward
    }

    /// Number of completed turns.
    #[must_use]
    pub fn turn(world: &World) -> u64 {
        world.turn
    }

    /// Shape waiting in the given slot.
    #[must_use]
    pub fn slot(world: &World, slot: SlotId) -> Option<&ShapeInstance> {
        world.tray.get(slot)
    }

    /// Occupied tray slots in slot order.
    #[must_use]
    pub fn queue(world: &World) -> Vec<(SlotId, ShapeInstance)> {
        world
            .tray
            .queued()
            .map(|(slot, shape)| (slot, shape.clone()))
            .collect()
    }

    /// Shapes waiting in the tray in slot order.
    #[must_use]
    pub fn queued_shapes(world: &World) -> Vec<ShapeInstance> {
        world.tray.queued().map(|(_, shape)| shape.clone()).collect()
    }

    /// Cells that are still locked along with their unlock thresholds.
    #[must_use]
    pub fn locked_cells(world: &World) -> Vec<LockedCell> {
        world.grid.locked_cells()
    }

    /// Pairs of adjacent cells holding marbles of the same color.
    #[must_use]
    pub fn same_color_links(world: &World) -> Vec<(GridCoord, GridCoord)> {
        world.grid.same_color_links()
    }

    /// Ghost of a queued shape hovering over the grid.
    #[derive(Clone, Debug, PartialEq, Eq)]
    pub struct PlacementPreview {
        /// Slot holding the previewed shape.
        pub slot: SlotId,
        /// Cell under offset zero of the shape.
        pub anchor: GridCoord,
        /// Cells the marbles would land on, limited to cells inside the grid.
        pub marbles: Vec<(GridCoord, MarbleColor)>,
        /// Whether placing the shape here would be accepted.
        pub placeable: bool,
    }

    /// Computes the ghost shown while the player drags a shape.
    ///
    /// `None` when the slot is empty.
    #[must_use]
    pub fn preview(world: &World, slot: SlotId, anchor: GridCoord) -> Option<PlacementPreview> {
        let shape = world.tray.get(slot)?;
        let template = world.catalog.get(shape.shape())?;
        let engine = PlacementEngine::new(&world.grid);
        let plan = engine.resolve_targets(template, shape, anchor);
        let placeable = world.in_progress() && engine.is_valid(&plan, shape.marble_count());
        Some(PlacementPreview {
            slot,
            anchor,
            marbles: plan
                .marbles()
                .iter()
                .map(|marble| (marble.cell, marble.color))
                .collect(),
            placeable,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use marble_smash_core::{LevelConfig, LockedCellConfig, MarbleColor, ShapeConfig, ShapeId, SpawnMode};

    const RED: &str = "#c82a36";
    const BLUE: &str = "#5847ff";

    fn level() -> Level {
        LevelConfig {
            id: 1,
            columns: 4,
            rows: 4,
            disabled: Vec::new(),
            locked: vec![LockedCellConfig {
                cell: GridCoord::new(3, 3),
                threshold: 5,
            }],
            palette: vec![
                MarbleColor::parse_hex(RED).expect("red"),
                MarbleColor::parse_hex(BLUE).expect("blue"),
            ],
            shapes: vec![ShapeConfig {
                name: "pair".into(),
                offsets: vec![GridCoord::new(0, 0), GridCoord::new(1, 0)],
            }],
            goal: 10,
            reward: 7,
        }
        .validate()
        .expect("valid level")
    }

    fn pair(color: &str) -> ShapeInstance {
        let color = MarbleColor::parse_hex(color).expect("color");
        ShapeInstance::new(ShapeId::new(0), vec![color, color])
    }

    #[test]
    fn offers_outside_the_palette_are_ignored() {
        let mut world = World::new(&level(), 1);
        let mut events = Vec::new();
        let stray = MarbleColor::from_rgb(1, 2, 3);
        apply(
            &mut world,
            Command::OfferShape {
                shape: ShapeInstance::new(ShapeId::new(0), vec![stray, stray]),
                mode: SpawnMode::Neutral,
            },
            &mut events,
        );
        assert!(events.is_empty(), "stray colors must not reach the tray");

        apply(
            &mut world,
            Command::OfferShape {
                shape: pair(RED),
                mode: SpawnMode::Neutral,
            },
            &mut events,
        );
        assert_eq!(query::queue(&world).len(), 1);
    }

    #[test]
    fn failed_level_rejects_placements() {
        let mut world = World::new(&level(), 1);
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::OfferShape {
                shape: pair(BLUE),
                mode: SpawnMode::Neutral,
            },
            &mut events,
        );
        apply(&mut world, Command::FailLevel, &mut events);
        events.clear();

        apply(
            &mut world,
            Command::PlaceShape {
                slot: SlotId::new(0),
                anchor: GridCoord::new(0, 0),
            },
            &mut events,
        );
        assert_eq!(
            events,
            vec![Event::PlacementRejected {
                slot: SlotId::new(0),
                anchor: GridCoord::new(0, 0),
                reason: PlacementError::LevelOver,
            }]
        );
        assert_eq!(query::status(&world), LevelStatus::Failed);
    }
}

#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure input system translating drag-and-drop and power-up intents into commands.

use marble_smash_core::{Command, Event, GridCoord, LevelStatus, SlotId};

/// Input snapshot distilled from adapter-provided frame input data.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PlayerInput {
    /// Player released the pointer on this frame.
    pub confirm: bool,
    /// Player pressed the refresh power-up.
    pub refresh: bool,
    /// Player toggled the firework power-up.
    pub toggle_firework: bool,
    /// Cell currently under the pointer.
    pub cursor_cell: Option<GridCoord>,
    /// Tray slot whose shape is being dragged.
    pub dragged_slot: Option<SlotId>,
}

impl PlayerInput {
    /// Input dropping the shape from `slot` with offset zero on `cell`.
    #[must_use]
    pub const fn drop_shape(slot: SlotId, cell: GridCoord) -> Self {
        Self {
            confirm: true,
            refresh: false,
            toggle_firework: false,
            cursor_cell: Some(cell),
            dragged_slot: Some(slot),
        }
    }
}

/// Input system that tracks power-up state and level status.
#[derive(Clone, Debug)]
pub struct InputSystem {
    status: LevelStatus,
    firework_armed: bool,
}

impl Default for InputSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl InputSystem {
    /// Creates a new input system for a level in progress.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            status: LevelStatus::InProgress,
            firework_armed: false,
        }
    }

    /// Reports whether the next confirmed cell will be detonated.
    #[must_use]
    pub const fn firework_armed(&self) -> bool {
        self.firework_armed
    }

    /// Consumes world events and player input to emit commands.
    ///
    /// The `is_occupied` closure should mirror the grid's occupancy so an
    /// armed firework is only spent on a marble.
    pub fn handle<F>(
        &mut self,
        events: &[Event],
        input: PlayerInput,
        is_occupied: F,
        out: &mut Vec<Command>,
    ) where
        F: Fn(GridCoord) -> bool,
    {
        for event in events {
            match event {
                Event::LevelFailed => self.status = LevelStatus::Failed,
                Event::LevelCompleted { .. } => self.status = LevelStatus::Completed,
                _ => {}
            }
        }

        if self.status != LevelStatus::InProgress {
            self.firework_armed = false;
            return;
        }

        if input.toggle_firework {
            self.firework_armed = !self.firework_armed;
        }

        if input.refresh {
            out.push(Command::RefreshQueue);
            return;
        }

        if !input.confirm {
            return;
        }
        let Some(cell) = input.cursor_cell else {
            return;
        };

        if self.firework_armed {
            if is_occupied(cell) {
                self.firework_armed = false;
                out.push(Command::DetonateCell { cell });
            }
            return;
        }

        if let Some(slot) = input.dragged_slot {
            out.push(Command::PlaceShape { slot, anchor: cell });
        }
    }
}

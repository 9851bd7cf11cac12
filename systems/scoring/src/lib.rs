#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Score keeping: counts exploded marbles, unlocks cells and completes the level.

use marble_smash_core::{Command, Event, LockedCell};

/// Pure system tracking the score of the current level.
#[derive(Clone, Debug)]
pub struct Scoring {
    score: u32,
    goal: u32,
    goal_reached: bool,
}

impl Scoring {
    /// Creates a scorer for a level with the provided goal.
    #[must_use]
    pub const fn new(goal: u32) -> Self {
        Self {
            score: 0,
            goal,
            goal_reached: false,
        }
    }

    /// Score accumulated so far.
    #[must_use]
    pub const fn score(&self) -> u32 {
        self.score
    }

    /// Score required to complete the level.
    #[must_use]
    pub const fn goal(&self) -> u32 {
        self.goal
    }

    /// Consumes world events, announcing score changes and requesting unlocks
    /// and level completion.
    ///
    /// `locked` lists the cells that are still locked on the board.
    pub fn handle(
        &mut self,
        events: &[Event],
        locked: &[LockedCell],
        out_commands: &mut Vec<Command>,
        out_events: &mut Vec<Event>,
    ) {
        let gained: usize = events
            .iter()
            .filter_map(|event| match event {
                Event::MarblesExploded { count, .. } => Some(*count),
                _ => None,
            })
            .sum();
        if gained == 0 {
            return;
        }

        self.score = self
            .score
            .saturating_add(u32::try_from(gained).unwrap_or(u32::MAX));
        out_events.push(Event::ScoreChanged {
            score: self.score,
            goal: self.goal,
        });

        for cell in locked {
            if cell.threshold <= self.score {
                out_commands.push(Command::UnlockCell { cell: cell.cell });
            }
        }

        if !self.goal_reached && self.score >= self.goal {
            self.goal_reached = true;
            out_commands.push(Command::CompleteLevel);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use marble_smash_core::GridCoord;

    #[test]
    fn quiet_events_leave_score_untouched() {
        let mut scoring = Scoring::new(10);
        let mut commands = Vec::new();
        let mut events = Vec::new();
        scoring.handle(
            &[Event::TurnCompleted { turn: 1 }],
            &[LockedCell {
                cell: GridCoord::new(0, 0),
                threshold: 0,
            }],
            &mut commands,
            &mut events,
        );
        assert_eq!(scoring.score(), 0);
        assert!(commands.is_empty());
        assert!(events.is_empty());
    }
}

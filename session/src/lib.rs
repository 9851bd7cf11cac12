#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Simulation driver that sequences a turn through its phases.
//!
//! A turn moves `Idle → Placing → Resolving → Refilling → LoseCheck → Idle`.
//! Each call to [`Session::step`] runs exactly one phase so the host can hand
//! control to presentation between phases. Every event produced along the way
//! is delivered to the registered [`EventListener`]s.

use std::collections::VecDeque;

use marble_smash_core::{
    Command, ConfigError, Event, GridCoord, Level, LevelConfig, LevelStatus, SlotId,
    QUEUE_CAPACITY,
};
use marble_smash_system_director::{DifficultyDirector, DirectorTuning};
use marble_smash_system_input::{InputSystem, PlayerInput};
use marble_smash_system_lose_check::LoseConditionChecker;
use marble_smash_system_scoring::Scoring;
use marble_smash_world::{self as world, query, World};
use rand::Rng;
use thiserror::Error;

/// Phase a turn is currently in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TurnPhase {
    /// Waiting for the player.
    Idle,
    /// A placement has been submitted and not yet applied.
    Placing,
    /// The placed shape is checked for matches.
    Resolving,
    /// The tray is refilled if it ran empty.
    Refilling,
    /// The level is checked for a dead end and the turn is closed.
    LoseCheck,
}

/// Errors reported by the session driver.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum SessionError {
    /// A new action arrived while a turn was still running.
    #[error("a turn is already in progress ({0:?})")]
    TurnInProgress(TurnPhase),
}

/// Observer receiving every event the session produces.
pub trait EventListener {
    /// Called once per event, in emission order.
    fn on_event(&mut self, event: &Event);
}

impl<F> EventListener for F
where
    F: FnMut(&Event),
{
    fn on_event(&mut self, event: &Event) {
        self(event);
    }
}

/// Summary of one player action.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TurnReport {
    /// Events emitted while the action ran.
    pub events: Vec<Event>,
    /// Phases executed, in order.
    pub phases: Vec<TurnPhase>,
    /// Marbles removed by explosions and detonations.
    pub exploded: usize,
    /// Whether the action closed a turn.
    pub completed: bool,
}

impl TurnReport {
    fn from_events(events: Vec<Event>, phases: Vec<TurnPhase>) -> Self {
        let exploded = events
            .iter()
            .map(|event| match event {
                Event::MarblesExploded { count, .. } => *count,
                _ => 0,
            })
            .sum();
        let completed = events
            .iter()
            .any(|event| matches!(event, Event::TurnCompleted { .. }));
        Self {
            events,
            phases,
            exploded,
            completed,
        }
    }

    /// Reports whether the placement was turned down.
    #[must_use]
    pub fn rejected(&self) -> bool {
        self.events
            .iter()
            .any(|event| matches!(event, Event::PlacementRejected { .. }))
    }
}

/// Owns the world and the systems reacting to it for one level.
pub struct Session<R> {
    world: World,
    director: DifficultyDirector,
    lose_check: LoseConditionChecker,
    scoring: Scoring,
    input: InputSystem,
    rng: R,
    phase: TurnPhase,
    pending: Option<(SlotId, GridCoord)>,
    placed: Vec<GridCoord>,
    turn_events: Vec<Event>,
    listeners: Vec<Box<dyn EventListener>>,
}

impl<R: Rng> Session<R> {
    /// Starts a validated level and fills the tray.
    pub fn new(level: &Level, level_number: u32, tuning: DirectorTuning, rng: R) -> Self {
        Self::with_listeners(level, level_number, tuning, rng, Vec::new())
    }

    /// Validates the configuration and starts the level.
    pub fn from_config(
        config: &LevelConfig,
        level_number: u32,
        tuning: DirectorTuning,
        rng: R,
    ) -> Result<Self, ConfigError> {
        let level = config.validate()?;
        Ok(Self::new(&level, level_number, tuning, rng))
    }

    /// Starts a level with listeners that observe the opening refill.
    pub fn with_listeners(
        level: &Level,
        level_number: u32,
        tuning: DirectorTuning,
        rng: R,
        listeners: Vec<Box<dyn EventListener>>,
    ) -> Self {
        let world = World::new(level, level_number);
        let scoring = Scoring::new(query::goal(&world));
        let mut session = Self {
            world,
            director: DifficultyDirector::new(tuning, level_number),
            lose_check: LoseConditionChecker::new(),
            scoring,
            input: InputSystem::new(),
            rng,
            phase: TurnPhase::Idle,
            pending: None,
            placed: Vec::new(),
            turn_events: Vec::new(),
            listeners,
        };

        session.publish(Event::QueueRefillRequested {
            slots: QUEUE_CAPACITY,
        });
        session.refill();
        session.check_loss();
        session
    }

    /// Registers a listener for every future event.
    pub fn subscribe(&mut self, listener: impl EventListener + 'static) {
        self.listeners.push(Box::new(listener));
    }

    /// Read-only access to the authoritative world.
    #[must_use]
    pub fn world(&self) -> &World {
        &self.world
    }

    /// Phase the current turn is in.
    #[must_use]
    pub fn phase(&self) -> TurnPhase {
        self.phase
    }

    /// Score accumulated on this level.
    #[must_use]
    pub fn score(&self) -> u32 {
        self.scoring.score()
    }

    /// Current status of the level.
    #[must_use]
    pub fn status(&self) -> LevelStatus {
        query::status(&self.world)
    }

    /// Queues a placement, moving the session from `Idle` to `Placing`.
    pub fn submit_placement(&mut self, slot: SlotId, anchor: GridCoord) -> Result<(), SessionError> {
        self.ensure_idle()?;
        self.turn_events.clear();
        self.placed.clear();
        self.pending = Some((slot, anchor));
        self.phase = TurnPhase::Placing;
        Ok(())
    }

    /// Runs the current phase and returns the next one.
    pub fn step(&mut self) -> TurnPhase {
        self.phase = match self.phase {
            TurnPhase::Idle => TurnPhase::Idle,
            TurnPhase::Placing => self.place(),
            TurnPhase::Resolving => {
                let cells = std::mem::take(&mut self.placed);
                let _ = self.dispatch(vec![Command::ResolveMatches { cells }]);
                TurnPhase::Refilling
            }
            TurnPhase::Refilling => {
                self.refill();
                TurnPhase::LoseCheck
            }
            TurnPhase::LoseCheck => {
                self.check_loss();
                let _ = self.dispatch(vec![Command::CompleteTurn]);
                TurnPhase::Idle
            }
        };
        self.phase
    }

    /// Submits a placement and runs its turn to completion.
    pub fn play_turn(&mut self, slot: SlotId, anchor: GridCoord) -> Result<TurnReport, SessionError> {
        self.submit_placement(slot, anchor)?;
        let mut phases = vec![TurnPhase::Placing];
        while self.phase != TurnPhase::Idle {
            let next = self.step();
            if next != TurnPhase::Idle {
                phases.push(next);
            }
        }
        Ok(TurnReport::from_events(
            std::mem::take(&mut self.turn_events),
            phases,
        ))
    }

    /// Discards the tray and deals a fresh set of shapes.
    pub fn refresh_queue(&mut self) -> Result<TurnReport, SessionError> {
        self.power_up(Command::RefreshQueue)
    }

    /// Removes a single marble from the board.
    pub fn detonate(&mut self, cell: GridCoord) -> Result<TurnReport, SessionError> {
        self.power_up(Command::DetonateCell { cell })
    }

    /// Translates a frame of player input and runs whatever it triggers.
    ///
    /// `None` when the input did not produce an action.
    pub fn apply_input(&mut self, input: PlayerInput) -> Result<Option<TurnReport>, SessionError> {
        self.ensure_idle()?;
        let grid = query::grid(&self.world);
        let mut commands = Vec::new();
        self.input.handle(
            &self.turn_events,
            input,
            |cell| grid.occupant_color(cell).is_some(),
            &mut commands,
        );

        match commands.into_iter().next() {
            Some(Command::PlaceShape { slot, anchor }) => self.play_turn(slot, anchor).map(Some),
            Some(Command::RefreshQueue) => self.refresh_queue().map(Some),
            Some(Command::DetonateCell { cell }) => self.detonate(cell).map(Some),
            _ => Ok(None),
        }
    }

    fn ensure_idle(&self) -> Result<(), SessionError> {
        if self.phase == TurnPhase::Idle {
            Ok(())
        } else {
            Err(SessionError::TurnInProgress(self.phase))
        }
    }

    fn power_up(&mut self, command: Command) -> Result<TurnReport, SessionError> {
        self.ensure_idle()?;
        self.turn_events.clear();
        let _ = self.dispatch(vec![command]);
        self.refill();
        self.check_loss();
        Ok(TurnReport::from_events(
            std::mem::take(&mut self.turn_events),
            vec![TurnPhase::Refilling, TurnPhase::LoseCheck],
        ))
    }

    fn place(&mut self) -> TurnPhase {
        let Some((slot, anchor)) = self.pending.take() else {
            return TurnPhase::Idle;
        };
        let events = self.dispatch(vec![Command::PlaceShape { slot, anchor }]);
        for event in events {
            if let Event::ShapePlaced { cells, .. } = event {
                self.placed = cells;
                return TurnPhase::Resolving;
            }
        }
        TurnPhase::Idle
    }

    fn refill(&mut self) {
        if query::status(&self.world) != LevelStatus::InProgress {
            return;
        }
        let mut commands = Vec::new();
        self.director.handle(
            &self.turn_events,
            query::grid(&self.world),
            query::catalog(&self.world),
            query::palette(&self.world),
            &mut self.rng,
            &mut commands,
        );
        let _ = self.dispatch(commands);
    }

    fn check_loss(&mut self) {
        let queued = query::queued_shapes(&self.world);
        let mut commands = Vec::new();
        self.lose_check.handle(
            &self.turn_events,
            query::grid(&self.world),
            query::catalog(&self.world),
            &queued,
            query::status(&self.world),
            &mut commands,
        );
        let _ = self.dispatch(commands);
    }

    /// Applies commands and every follow-up the scorer requests.
    fn dispatch(&mut self, commands: Vec<Command>) -> Vec<Event> {
        let mut queue = VecDeque::from(commands);
        let mut emitted = Vec::new();

        while let Some(command) = queue.pop_front() {
            let mut events = Vec::new();
            world::apply(&mut self.world, command, &mut events);

            let mut follow_up = Vec::new();
            let mut scored = Vec::new();
            self.scoring.handle(
                &events,
                &query::locked_cells(&self.world),
                &mut follow_up,
                &mut scored,
            );
            events.extend(scored);
            queue.extend(follow_up);

            for event in events {
                self.publish(event.clone());
                emitted.push(event);
            }
        }

        emitted
    }

    fn publish(&mut self, event: Event) {
        for listener in &mut self.listeners {
            listener.on_event(&event);
        }
        self.turn_events.push(event);
    }
}

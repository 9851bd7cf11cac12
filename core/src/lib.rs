#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Marble Smash simulation.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative world, and pure systems. Adapters submit [`Command`] values
//! describing desired mutations, the world executes those commands via its
//! `apply` entry point, and then broadcasts [`Event`] values for systems to
//! react to deterministically. Systems consume event streams, query immutable
//! views of the grid, and respond exclusively with new command batches.

mod level;

use std::{fmt, sync::Arc};

use serde::{Deserialize, Serialize};

pub use level::{
    ConfigError, Level, LevelConfig, LevelSequence, LockedCellConfig, ShapeConfig,
    DEFAULT_GOAL, DEFAULT_REWARD, MAX_GRID_SIDE,
};

/// Minimum size a connected same-color group must reach to explode.
pub const EXPLOSION_THRESHOLD: usize = 5;

/// Number of shapes offered to the player at once.
pub const QUEUE_CAPACITY: usize = 3;

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Command {
    /// Requests that the shape held in a tray slot be dropped onto the grid.
    PlaceShape {
        /// Tray slot holding the shape.
        slot: SlotId,
        /// Cell that receives the template's first offset.
        anchor: GridCoord,
    },
    /// Runs match resolution over the cells filled by the latest placement.
    ResolveMatches {
        /// Cells that were occupied by the placement.
        cells: Vec<GridCoord>,
    },
    /// Offers a fully colored shape in the first free tray slot.
    OfferShape {
        /// Shape handed to the player.
        shape: ShapeInstance,
        /// Spawn mode that produced the shape.
        mode: SpawnMode,
    },
    /// Discards every queued shape and asks for a complete refill.
    RefreshQueue,
    /// Removes the single marble resting on the provided cell.
    DetonateCell {
        /// Cell whose marble should be removed.
        cell: GridCoord,
    },
    /// Unlocks a cell whose score threshold was reached.
    UnlockCell {
        /// Cell to unlock.
        cell: GridCoord,
    },
    /// Marks the level as lost.
    FailLevel,
    /// Marks the level as won.
    CompleteLevel,
    /// Closes the current turn.
    CompleteTurn,
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Event {
    /// A shape was added to the tray.
    ShapeOffered {
        /// Slot now holding the shape.
        slot: SlotId,
        /// Shape that was offered.
        shape: ShapeInstance,
        /// Spawn mode that produced the shape.
        mode: SpawnMode,
    },
    /// A shape was committed to the grid.
    ShapePlaced {
        /// Slot the shape was taken from.
        slot: SlotId,
        /// Shape that was placed.
        shape: ShapeInstance,
        /// Cells that became occupied, in marble order.
        cells: Vec<GridCoord>,
    },
    /// A placement request was refused without touching the grid.
    PlacementRejected {
        /// Slot named in the request.
        slot: SlotId,
        /// Anchor named in the request.
        anchor: GridCoord,
        /// Why the request was refused.
        reason: PlacementError,
    },
    /// Marbles were removed from the grid.
    MarblesExploded {
        /// Number of marbles removed.
        count: usize,
        /// Cells that were vacated, in ascending coordinate order.
        cells: Vec<GridCoord>,
    },
    /// Every tray slot is empty and new shapes are required.
    QueueRefillRequested {
        /// Number of slots waiting for a shape.
        slots: usize,
    },
    /// The queued shapes were thrown away by a refresh.
    QueueDiscarded {
        /// Shapes that were removed from the tray.
        shapes: Vec<ShapeInstance>,
    },
    /// A locked cell became available.
    CellUnlocked {
        /// Cell that was unlocked.
        cell: GridCoord,
    },
    /// The score collaborator published a new total.
    ScoreChanged {
        /// Current score.
        score: u32,
        /// Score required to finish the level.
        goal: u32,
    },
    /// A turn finished all of its phases.
    TurnCompleted {
        /// Sequential number of the completed turn, starting at one.
        turn: u64,
    },
    /// No queued shape fits anywhere on the grid.
    LevelFailed,
    /// The level goal was reached.
    LevelCompleted {
        /// Reward granted for the level.
        reward: u32,
    },
}

/// Position of a cell in the offset hexagonal layout.
///
/// Odd rows are shifted half a cell to the right, so the row parity decides
/// which diagonal columns are adjacent.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(from = "(i32, i32)", into = "(i32, i32)")]
pub struct GridCoord {
    column: i32,
    row: i32,
}

impl GridCoord {
    /// Creates a new grid coordinate.
    #[must_use]
    pub const fn new(column: i32, row: i32) -> Self {
        Self { column, row }
    }

    /// Column component of the coordinate.
    #[must_use]
    pub const fn column(&self) -> i32 {
        self.column
    }

    /// Row component of the coordinate.
    #[must_use]
    pub const fn row(&self) -> i32 {
        self.row
    }

    /// Reports whether the coordinate lies on an even row.
    #[must_use]
    pub const fn is_even_row(&self) -> bool {
        self.row.rem_euclid(2) == 0
    }

    /// Component-wise sum, or `None` if either component overflows.
    #[must_use]
    pub const fn checked_add(self, rhs: Self) -> Option<Self> {
        match (self.column.checked_add(rhs.column), self.row.checked_add(rhs.row)) {
            (Some(column), Some(row)) => Some(Self::new(column, row)),
            _ => None,
        }
    }

    /// Component-wise difference, or `None` if either component overflows.
    #[must_use]
    pub const fn checked_sub(self, rhs: Self) -> Option<Self> {
        match (self.column.checked_sub(rhs.column), self.row.checked_sub(rhs.row)) {
            (Some(column), Some(row)) => Some(Self::new(column, row)),
            _ => None,
        }
    }
}


impl From<(i32, i32)> for GridCoord {
    fn from((column, row): (i32, i32)) -> Self {
        Self::new(column, row)
    }
}

impl From<GridCoord> for (i32, i32) {
    fn from(coord: GridCoord) -> Self {
        (coord.column, coord.row)
    }
}

impl fmt::Display for GridCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.column, self.row)
    }
}

/// Color carried by a marble.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MarbleColor {
    red: u8,
    green: u8,
    blue: u8,
}

impl MarbleColor {
    /// Creates a new marble color from byte RGB components.
    #[must_use]
    pub const fn from_rgb(red: u8, green: u8, blue: u8) -> Self {
        Self { red, green, blue }
    }

    /// Red component of the color.
    #[must_use]
    pub const fn red(&self) -> u8 {
        self.red
    }

    /// Green component of the color.
    #[must_use]
    pub const fn green(&self) -> u8 {
        self.green
    }

    /// Blue component of the color.
    #[must_use]
    pub const fn blue(&self) -> u8 {
        self.blue
    }

    /// Parses a `#rrggbb` literal.
    pub fn parse_hex(literal: &str) -> Result<Self, ConfigError> {
        let invalid = || ConfigError::InvalidColor(literal.to_owned());
        let digits = literal.strip_prefix('#').ok_or_else(invalid)?;
        if digits.len() != 6 || !digits.bytes().all(|byte| byte.is_ascii_hexdigit()) {
            return Err(invalid());
        }

        let channel = |range: std::ops::Range<usize>| {
            u8::from_str_radix(&digits[range], 16).map_err(|_| invalid())
        };
        Ok(Self::from_rgb(channel(0..2)?, channel(2..4)?, channel(4..6)?))
    }
}

impl fmt::Display for MarbleColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.red, self.green, self.blue)
    }
}

impl TryFrom<String> for MarbleColor {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse_hex(&value)
    }
}

impl From<MarbleColor> for String {
    fn from(color: MarbleColor) -> Self {
        color.to_string()
    }
}

/// Ordered, non-empty set of colors usable in the active level.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ColorPalette {
    colors: Vec<MarbleColor>,
}

impl ColorPalette {
    /// Builds a palette, rejecting empty lists and repeated colors.
    pub fn new(colors: Vec<MarbleColor>) -> Result<Self, ConfigError> {
        if colors.is_empty() {
            return Err(ConfigError::EmptyPalette);
        }

        for (index, color) in colors.iter().enumerate() {
            if colors[..index].contains(color) {
                return Err(ConfigError::DuplicateColor(*color));
            }
        }

        Ok(Self { colors })
    }

    /// Colors in palette order.
    #[must_use]
    pub fn colors(&self) -> &[MarbleColor] {
        &self.colors
    }

    /// Number of colors in the palette. Never zero.
    #[must_use]
    pub fn len(&self) -> usize {
        self.colors.len()
    }

    /// Always `false`; palettes are non-empty by construction.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    /// Reports whether the color belongs to the palette.
    #[must_use]
    pub fn contains(&self, color: MarbleColor) -> bool {
        self.colors.contains(&color)
    }
}

/// Index of a template inside the [`ShapeCatalog`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ShapeId(u32);

impl ShapeId {
    /// Creates a new shape identifier with the provided catalog index.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the catalog index.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }

    fn index(self) -> usize {
        self.0 as usize
    }
}

/// Catalog entry describing one placeable piece as relative offsets.
///
/// Offset zero is the anchor used when a shape is dropped onto a cell.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ShapeTemplate {
    name: String,
    offsets: Vec<GridCoord>,
}

impl ShapeTemplate {
    /// Creates a template, rejecting empty offset lists and repeated offsets.
    pub fn new(name: impl Into<String>, offsets: Vec<GridCoord>) -> Result<Self, ConfigError> {
        let name = name.into();
        if offsets.is_empty() {
            return Err(ConfigError::EmptyShape(name));
        }

        for (index, offset) in offsets.iter().enumerate() {
            if offsets[..index].contains(offset) {
                return Err(ConfigError::DuplicateOffset {
                    shape: name,
                    offset: *offset,
                });
            }
        }

        Ok(Self { name, offsets })
    }

    /// Human-readable name of the template.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Relative offsets in marble order.
    #[must_use]
    pub fn offsets(&self) -> &[GridCoord] {
        &self.offsets
    }

    /// Offset used as the reference point when translating the template.
    #[must_use]
    pub fn anchor_offset(&self) -> GridCoord {
        self.offsets[0]
    }

    /// Number of marbles the template holds.
    #[must_use]
    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    /// Always `false`; templates are non-empty by construction.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }
}

/// Immutable list of shape templates ordered from easiest to hardest.
///
/// Cloning is cheap; every clone shares the same templates.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ShapeCatalog {
    templates: Arc<[ShapeTemplate]>,
}

impl ShapeCatalog {
    /// Builds a catalog from templates in difficulty order.
    pub fn new(templates: Vec<ShapeTemplate>) -> Result<Self, ConfigError> {
        if templates.is_empty() {
            return Err(ConfigError::EmptyCatalog);
        }

        Ok(Self {
            templates: templates.into(),
        })
    }

    /// Looks up the template for the provided identifier.
    #[must_use]
    pub fn get(&self, id: ShapeId) -> Option<&ShapeTemplate> {
        self.templates.get(id.index())
    }

    /// Number of templates in the catalog. Never zero.
    #[must_use]
    pub fn len(&self) -> usize {
        self.templates.len()
    }

    /// Always `false`; catalogs are non-empty by construction.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    /// Identifier of the lowest-index template.
    #[must_use]
    pub const fn first_id(&self) -> ShapeId {
        ShapeId::new(0)
    }

    /// Iterates over every template together with its identifier.
    pub fn iter(&self) -> impl Iterator<Item = (ShapeId, &ShapeTemplate)> {
        self.templates
            .iter()
            .enumerate()
            .map(|(index, template)| (ShapeId::new(index as u32), template))
    }

    /// Identifiers of the first `size` templates, clamped to the catalog.
    #[must_use]
    pub fn pool(&self, size: usize) -> Vec<ShapeId> {
        let size = size.clamp(1, self.templates.len());
        (0..size).map(|index| ShapeId::new(index as u32)).collect()
    }
}

/// Colored shape offered to the player.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ShapeInstance {
    shape: ShapeId,
    colors: Vec<MarbleColor>,
}

impl ShapeInstance {
    /// Creates a shape instance assigning one color per template offset.
    #[must_use]
    pub fn new(shape: ShapeId, colors: Vec<MarbleColor>) -> Self {
        Self { shape, colors }
    }

    /// Template this instance was built from.
    #[must_use]
    pub const fn shape(&self) -> ShapeId {
        self.shape
    }

    /// Colors assigned to each offset, in template order.
    #[must_use]
    pub fn colors(&self) -> &[MarbleColor] {
        &self.colors
    }

    /// Number of marbles in the instance.
    #[must_use]
    pub fn marble_count(&self) -> usize {
        self.colors.len()
    }
}

/// Index of a tray slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SlotId(u8);

impl SlotId {
    /// Creates a new slot identifier.
    #[must_use]
    pub const fn new(value: u8) -> Self {
        Self(value)
    }

    /// Retrieves the numeric slot index.
    #[must_use]
    pub const fn get(&self) -> u8 {
        self.0
    }
}

/// Bias applied when choosing the next shape.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SpawnMode {
    /// The shape and colors were picked to complete a match.
    Assistance,
    /// The shape and colors were picked to avoid handing out a match.
    Hindrance,
    /// Uniform-random shape and colors.
    Neutral,
    /// A biased search found nothing; the lowest-index shape was used.
    Fallback,
}

/// Reasons a placement request may be rejected by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlacementError {
    /// The level already ended.
    LevelOver,
    /// The named tray slot holds no shape.
    EmptySlot,
    /// At least one marble would land outside the grid or on a hole.
    OutOfGrid,
    /// Two marbles would land on the same cell.
    Overlapping,
    /// At least one target cell is locked.
    Locked,
    /// At least one target cell already holds a marble.
    Occupied,
}

/// Lifecycle state of the active level.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LevelStatus {
    /// The player may still place shapes.
    InProgress,
    /// The goal score was reached.
    Completed,
    /// No queued shape could be placed.
    Failed,
}

/// Locked cell together with the score that unlocks it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LockedCell {
    /// Coordinate of the locked cell.
    pub cell: GridCoord,
    /// Score required before the cell unlocks.
    pub threshold: u32,
}

//! Level configuration consumed at level start and its validation.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    ColorPalette, GridCoord, LockedCell, MarbleColor, ShapeCatalog, ShapeTemplate,
};

/// Largest supported number of columns or rows.
pub const MAX_GRID_SIDE: u32 = 256;

/// Score goal applied when a level file omits one.
pub const DEFAULT_GOAL: u32 = 20;

/// Reward applied when a level file omits one.
pub const DEFAULT_REWARD: u32 = 50;

/// Fatal problems detected while preparing a level.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// Grid sides must lie within `1..=MAX_GRID_SIDE`.
    #[error("grid dimensions {columns}x{rows} are malformed")]
    MalformedDimensions {
        /// Configured column count.
        columns: i64,
        /// Configured row count.
        rows: i64,
    },
    /// The palette lists no colors.
    #[error("color palette is empty")]
    EmptyPalette,
    /// The palette lists the same color twice.
    #[error("color palette lists {0} more than once")]
    DuplicateColor(MarbleColor),
    /// A color literal is not of the form `#rrggbb`.
    #[error("`{0}` is not a #rrggbb color")]
    InvalidColor(String),
    /// The shape catalog lists no shapes.
    #[error("shape catalog is empty")]
    EmptyCatalog,
    /// A shape lists no offsets.
    #[error("shape `{0}` has no offsets")]
    EmptyShape(String),
    /// A shape lists the same offset twice.
    #[error("shape `{shape}` lists offset {offset} more than once")]
    DuplicateOffset {
        /// Name of the offending shape.
        shape: String,
        /// Repeated offset.
        offset: GridCoord,
    },
    /// A disabled cell lies outside the grid.
    #[error("disabled cell {0} lies outside the grid")]
    DisabledOutOfBounds(GridCoord),
    /// A locked cell lies outside the grid.
    #[error("locked cell {0} lies outside the grid")]
    LockedOutOfBounds(GridCoord),
    /// A locked cell is also disabled.
    #[error("locked cell {0} is disabled")]
    LockedCellDisabled(GridCoord),
    /// The level can never be completed.
    #[error("level goal must be positive")]
    ZeroGoal,
    /// A level sequence lists no levels.
    #[error("level sequence is empty")]
    EmptySequence,
}

/// Serialized description of a locked cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LockedCellConfig {
    /// Cell that starts locked.
    pub cell: GridCoord,
    /// Score that unlocks the cell.
    pub threshold: u32,
}

/// Serialized description of a catalog shape.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ShapeConfig {
    /// Human-readable name.
    pub name: String,
    /// Relative offsets; the first one is the anchor.
    pub offsets: Vec<GridCoord>,
}

/// Serialized level description, read-only once the level starts.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LevelConfig {
    /// Designer-facing level identifier.
    pub id: u32,
    /// Number of columns in the grid.
    pub columns: i64,
    /// Number of rows in the grid.
    pub rows: i64,
    /// Cells removed from the grid entirely.
    #[serde(default)]
    pub disabled: Vec<GridCoord>,
    /// Cells that start locked.
    #[serde(default)]
    pub locked: Vec<LockedCellConfig>,
    /// Colors marbles may take in this level.
    pub palette: Vec<MarbleColor>,
    /// Shapes ordered from easiest to hardest.
    pub shapes: Vec<ShapeConfig>,
    /// Score required to finish the level.
    #[serde(default = "default_goal")]
    pub goal: u32,
    /// Reward announced when the level is finished.
    #[serde(default = "default_reward")]
    pub reward: u32,
}

fn default_goal() -> u32 {
    DEFAULT_GOAL
}

fn default_reward() -> u32 {
    DEFAULT_REWARD
}

impl LevelConfig {
    /// Checks the configuration and produces a level ready to run.
    pub fn validate(&self) -> Result<Level, ConfigError> {
        let malformed = ConfigError::MalformedDimensions {
            columns: self.columns,
            rows: self.rows,
        };
        let side = 1..=i64::from(MAX_GRID_SIDE);
        if !side.contains(&self.columns) || !side.contains(&self.rows) {
            return Err(malformed);
        }
        let columns = u32::try_from(self.columns).map_err(|_| malformed.clone())?;
        let rows = u32::try_from(self.rows).map_err(|_| malformed)?;

        let inside = |cell: GridCoord| {
            cell.column() >= 0
                && cell.row() >= 0
                && i64::from(cell.column()) < self.columns
                && i64::from(cell.row()) < self.rows
        };

        let mut disabled = BTreeSet::new();
        for &cell in &self.disabled {
            if !inside(cell) {
                return Err(ConfigError::DisabledOutOfBounds(cell));
            }
            let _ = disabled.insert(cell);
        }

        let mut locked = Vec::with_capacity(self.locked.len());
        for entry in &self.locked {
            if !inside(entry.cell) {
                return Err(ConfigError::LockedOutOfBounds(entry.cell));
            }
            if disabled.contains(&entry.cell) {
                return Err(ConfigError::LockedCellDisabled(entry.cell));
            }
            locked.push(LockedCell {
                cell: entry.cell,
                threshold: entry.threshold,
            });
        }

        let palette = ColorPalette::new(self.palette.clone())?;
        let templates = self
            .shapes
            .iter()
            .map(|shape| ShapeTemplate::new(shape.name.clone(), shape.offsets.clone()))
            .collect::<Result<Vec<_>, _>>()?;
        let catalog = ShapeCatalog::new(templates)?;

        if self.goal == 0 {
            return Err(ConfigError::ZeroGoal);
        }

        Ok(Level {
            id: self.id,
            columns,
            rows,
            disabled,
            locked,
            palette,
            catalog,
            goal: self.goal,
            reward: self.reward,
        })
    }
}

/// Validated level, the only form the world accepts.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Level {
    id: u32,
    columns: u32,
    rows: u32,
    disabled: BTreeSet<GridCoord>,
    locked: Vec<LockedCell>,
    palette: ColorPalette,
    catalog: ShapeCatalog,
    goal: u32,
    reward: u32,
}

impl Level {
    /// Designer-facing level identifier.
    #[must_use]
    pub const fn id(&self) -> u32 {
        self.id
    }

    /// Number of columns in the grid.
    #[must_use]
    pub const fn columns(&self) -> u32 {
        self.columns
    }

    /// Number of rows in the grid.
    #[must_use]
    pub const fn rows(&self) -> u32 {
        self.rows
    }

    /// Cells removed from the grid.
    #[must_use]
    pub fn disabled(&self) -> &BTreeSet<GridCoord> {
        &self.disabled
    }

    /// Cells that start locked.
    #[must_use]
    pub fn locked(&self) -> &[LockedCell] {
        &self.locked
    }

    /// Colors available in the level.
    #[must_use]
    pub fn palette(&self) -> &ColorPalette {
        &self.palette
    }

    /// Shapes available in the level.
    #[must_use]
    pub fn catalog(&self) -> &ShapeCatalog {
        &self.catalog
    }

    /// Score required to finish the level.
    #[must_use]
    pub const fn goal(&self) -> u32 {
        self.goal
    }

    /// Reward announced when the level is finished.
    #[must_use]
    pub const fn reward(&self) -> u32 {
        self.reward
    }
}

/// Ordered list of designed levels that loops once the player runs past it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LevelSequence {
    levels: Vec<Level>,
    loop_start: usize,
}

impl LevelSequence {
    /// Creates a sequence; `loop_start` is the 1-based level replayed after the last one.
    pub fn new(levels: Vec<Level>, loop_start: u32) -> Result<Self, ConfigError> {
        if levels.is_empty() {
            return Err(ConfigError::EmptySequence);
        }

        let loop_start = (loop_start.max(1) as usize).min(levels.len()) - 1;
        Ok(Self { levels, loop_start })
    }

    /// Number of designed levels.
    #[must_use]
    pub fn len(&self) -> usize {
        self.levels.len()
    }

    /// Always `false`; sequences are non-empty by construction.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    /// Resolves the 1-based display level the player has reached.
    #[must_use]
    pub fn level_for(&self, display_level: u32) -> &Level {
        let display = display_level.max(1) as usize;
        let total = self.levels.len();
        let index = if display <= total {
            display - 1
        } else {
            let loop_range = total - self.loop_start;
            self.loop_start + (display - total - 1) % loop_range
        };
        &self.levels[index.min(total - 1)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_config() -> LevelConfig {
        LevelConfig {
            id: 1,
            columns: 7,
            rows: 7,
            disabled: vec![GridCoord::new(0, 0)],
            locked: vec![LockedCellConfig {
                cell: GridCoord::new(3, 3),
                threshold: 10,
            }],
            palette: vec![
                MarbleColor::from_rgb(0xc8, 0x2a, 0x36),
                MarbleColor::from_rgb(0x2f, 0x95, 0x32),
            ],
            shapes: vec![ShapeConfig {
                name: "triangle".to_owned(),
                offsets: vec![
                    GridCoord::new(0, 0),
                    GridCoord::new(1, 0),
                    GridCoord::new(0, 1),
                ],
            }],
            goal: DEFAULT_GOAL,
            reward: DEFAULT_REWARD,
        }
    }

    fn level_with_id(id: u32) -> Level {
        LevelConfig { id, ..sample_config() }
            .validate()
            .expect("valid level")
    }

    #[test]
    fn valid_config_produces_level() {
        let level = sample_config().validate().expect("valid level");
        assert_eq!(level.columns(), 7);
        assert_eq!(level.rows(), 7);
        assert!(level.disabled().contains(&GridCoord::new(0, 0)));
        assert_eq!(level.locked()[0].threshold, 10);
        assert_eq!(level.catalog().len(), 1);
        assert_eq!(level.palette().len(), 2);
    }

    #[test]
    fn malformed_dimensions_are_rejected() {
        for (columns, rows) in [(0, 7), (7, -1), (i64::from(MAX_GRID_SIDE) + 1, 3)] {
            let config = LevelConfig {
                columns,
                rows,
                ..sample_config()
            };
            assert_eq!(
                config.validate(),
                Err(ConfigError::MalformedDimensions { columns, rows }),
            );
        }
    }

    #[test]
    fn empty_palette_and_catalog_are_fatal() {
        let config = LevelConfig {
            palette: Vec::new(),
            ..sample_config()
        };
        assert_eq!(config.validate(), Err(ConfigError::EmptyPalette));

        let config = LevelConfig {
            shapes: Vec::new(),
            ..sample_config()
        };
        assert_eq!(config.validate(), Err(ConfigError::EmptyCatalog));
    }

    #[test]
    fn out_of_grid_cells_are_rejected() {
        let config = LevelConfig {
            disabled: vec![GridCoord::new(7, 0)],
            ..sample_config()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::DisabledOutOfBounds(GridCoord::new(7, 0))),
        );

        let config = LevelConfig {
            locked: vec![LockedCellConfig {
                cell: GridCoord::new(0, 0),
                threshold: 3,
            }],
            ..sample_config()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::LockedCellDisabled(GridCoord::new(0, 0))),
        );
    }

    #[test]
    fn zero_goal_is_rejected() {
        let config = LevelConfig {
            goal: 0,
            ..sample_config()
        };
        assert_eq!(config.validate(), Err(ConfigError::ZeroGoal));
    }

    #[test]
    fn sequence_loops_back_after_last_designed_level() {
        let levels = (1..=5).map(level_with_id).collect();
        let sequence = LevelSequence::new(levels, 3).expect("sequence");

        let ids: Vec<u32> = (1..=10)
            .map(|display| sequence.level_for(display).id())
            .collect();
        assert_eq!(ids, vec![1, 2, 3, 4, 5, 3, 4, 5, 3, 4]);
        assert_eq!(sequence.level_for(0).id(), 1);
    }

    #[test]
    fn sequence_with_oversized_loop_start_repeats_last_level() {
        let levels = (1..=2).map(level_with_id).collect();
        let sequence = LevelSequence::new(levels, 15).expect("sequence");
        assert_eq!(sequence.level_for(7).id(), 2);
        assert_eq!(LevelSequence::new(Vec::new(), 1), Err(ConfigError::EmptySequence));
    }
}

#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Difficulty director that decides which shapes refill the tray.
//!
//! Every refill request is answered with one [`Command::OfferShape`] per
//! requested slot. The whole batch shares a single mode drawn from the fill
//! ratio: assistance hands out a shape that completes a match, hindrance hands
//! out the coloring least likely to match, and neutral picks at random. A slot
//! whose search comes up empty falls back to the first catalog shape.

mod search;

use std::collections::BTreeMap;

use marble_smash_core::{
    ColorPalette, Command, Event, GridCoord, MarbleColor, ShapeCatalog, ShapeId, ShapeInstance,
    ShapeTemplate, SpawnMode,
};
use marble_smash_world::GridModel;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Tuning knobs steering how often the director helps or hinders the player.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DirectorTuning {
    /// Highest fill ratio at which assistance may trigger.
    pub assist_threshold: f64,
    /// Probability of assisting once the fill ratio allows it.
    pub assist_chance: f64,
    /// Lowest fill ratio at which hindrance may trigger.
    pub hinder_threshold: f64,
    /// Probability of hindering once the fill ratio allows it.
    pub hinder_chance: f64,
    /// Hindrance stays disabled until the level number exceeds this value.
    pub hinder_unlock_level: u32,
    /// Number of catalog shapes available on the first level.
    pub base_pool_size: usize,
    /// Levels between two pool growth steps; zero disables growth.
    pub pool_growth_interval: u32,
    /// Shapes added to the pool at every growth step.
    pub pool_growth: usize,
    /// Score for a cell colored away from an adjacent group.
    pub hinder_guard_score: u32,
    /// Score for a cell with no adjacent group.
    pub hinder_plain_score: u32,
}

impl Default for DirectorTuning {
    fn default() -> Self {
        Self {
            assist_threshold: 0.5,
            assist_chance: 0.3,
            hinder_threshold: 0.3,
            hinder_chance: 0.25,
            hinder_unlock_level: 5,
            base_pool_size: 3,
            pool_growth_interval: 2,
            pool_growth: 1,
            hinder_guard_score: 10,
            hinder_plain_score: 1,
        }
    }
}

/// Shape chosen by the director, with the colors it insists on.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SpawnDirective {
    shape: ShapeId,
    overrides: BTreeMap<usize, MarbleColor>,
    anchor: Option<GridCoord>,
    mode: SpawnMode,
}

impl SpawnDirective {
    /// Creates a directive without color overrides.
    #[must_use]
    pub fn new(shape: ShapeId, mode: SpawnMode) -> Self {
        Self {
            shape,
            overrides: BTreeMap::new(),
            anchor: None,
            mode,
        }
    }

    /// Adds the placement the directive was computed for.
    #[must_use]
    pub fn with_anchor(mut self, anchor: GridCoord) -> Self {
        self.anchor = Some(anchor);
        self
    }

    /// Forces the color of the marble at `index`.
    #[must_use]
    pub fn with_override(mut self, index: usize, color: MarbleColor) -> Self {
        let _ = self.overrides.insert(index, color);
        self
    }

    /// Catalog shape to offer.
    #[must_use]
    pub const fn shape(&self) -> ShapeId {
        self.shape
    }

    /// Forced colors keyed by marble index.
    #[must_use]
    pub fn overrides(&self) -> &BTreeMap<usize, MarbleColor> {
        &self.overrides
    }

    /// Anchor the search had in mind, if the mode searched placements.
    #[must_use]
    pub const fn anchor(&self) -> Option<GridCoord> {
        self.anchor
    }

    /// Mode that produced the directive.
    #[must_use]
    pub const fn mode(&self) -> SpawnMode {
        self.mode
    }

    /// Colors every marble, sampling the palette where no override exists.
    pub fn realize<R: Rng + ?Sized>(
        &self,
        template: &ShapeTemplate,
        palette: &ColorPalette,
        rng: &mut R,
    ) -> ShapeInstance {
        let colors = (0..template.len())
            .map(|index| match self.overrides.get(&index) {
                Some(color) => *color,
                None => random_color(palette, rng),
            })
            .collect();
        ShapeInstance::new(self.shape, colors)
    }
}

pub(crate) fn random_color<R: Rng + ?Sized>(palette: &ColorPalette, rng: &mut R) -> MarbleColor {
    palette.colors()[rng.gen_range(0..palette.len())]
}

/// Pure system answering refill requests with shape offers.
#[derive(Clone, Debug)]
pub struct DifficultyDirector {
    tuning: DirectorTuning,
    level_number: u32,
}

impl DifficultyDirector {
    /// Creates a director for the given display level number.
    #[must_use]
    pub fn new(tuning: DirectorTuning, level_number: u32) -> Self {
        Self {
            tuning,
            level_number,
        }
    }

    /// Tuning the director runs with.
    #[must_use]
    pub fn tuning(&self) -> &DirectorTuning {
        &self.tuning
    }

    /// Number of catalog shapes unlocked at the current level.
    #[must_use]
    pub fn pool_size(&self, catalog_len: usize) -> usize {
        let steps = match self.tuning.pool_growth_interval {
            0 => 0,
            interval => self.level_number.saturating_sub(1) / interval,
        };
        let size = self
            .tuning
            .base_pool_size
            .saturating_add(self.tuning.pool_growth.saturating_mul(steps as usize));
        size.clamp(1, catalog_len.max(1))
    }

    /// Picks the spawn mode for the next directive.
    pub fn choose_mode<R: Rng + ?Sized>(&self, fill_ratio: f64, rng: &mut R) -> SpawnMode {
        let tuning = &self.tuning;
        if fill_ratio <= tuning.assist_threshold && rng.gen_bool(probability(tuning.assist_chance))
        {
            return SpawnMode::Assistance;
        }
        if self.level_number > tuning.hinder_unlock_level
            && fill_ratio >= tuning.hinder_threshold
            && rng.gen_bool(probability(tuning.hinder_chance))
        {
            return SpawnMode::Hindrance;
        }
        SpawnMode::Neutral
    }

    /// Draws a mode and decides the next shape to offer.
    ///
    /// Searches that find nothing fall back to the first catalog shape.
    pub fn choose_next_directive<R: Rng + ?Sized>(
        &self,
        grid: &GridModel,
        catalog: &ShapeCatalog,
        palette: &ColorPalette,
        rng: &mut R,
    ) -> SpawnDirective {
        let mode = self.choose_mode(grid.fill_ratio(), rng);
        self.directive_for_mode(mode, grid, catalog, palette, rng)
    }

    /// Runs the search behind `mode` and falls back to the first catalog shape.
    pub fn directive_for_mode<R: Rng + ?Sized>(
        &self,
        mode: SpawnMode,
        grid: &GridModel,
        catalog: &ShapeCatalog,
        palette: &ColorPalette,
        rng: &mut R,
    ) -> SpawnDirective {
        let pool = catalog.pool(self.pool_size(catalog.len()));
        let directive = match mode {
            SpawnMode::Assistance => search::assistance(grid, catalog, palette, &pool, rng),
            SpawnMode::Hindrance => search::hindrance(
                grid,
                catalog,
                palette,
                &pool,
                &self.tuning,
                rng,
            ),
            SpawnMode::Neutral | SpawnMode::Fallback => {
                Some(search::neutral(&pool, rng))
            }
        };
        directive.unwrap_or_else(|| SpawnDirective::new(catalog.first_id(), SpawnMode::Fallback))
    }

    /// Searches for a shape and coloring that completes a match.
    pub fn assistance_search<R: Rng + ?Sized>(
        &self,
        grid: &GridModel,
        catalog: &ShapeCatalog,
        palette: &ColorPalette,
        rng: &mut R,
    ) -> Option<SpawnDirective> {
        let pool = catalog.pool(self.pool_size(catalog.len()));
        search::assistance(grid, catalog, palette, &pool, rng)
    }

    /// Searches for the shape and coloring least likely to complete a match.
    pub fn hindrance_search<R: Rng + ?Sized>(
        &self,
        grid: &GridModel,
        catalog: &ShapeCatalog,
        palette: &ColorPalette,
        rng: &mut R,
    ) -> Option<SpawnDirective> {
        let pool = catalog.pool(self.pool_size(catalog.len()));
        search::hindrance(grid, catalog, palette, &pool, &self.tuning, rng)
    }

    /// Consumes world events and emits one offer per requested slot.
    ///
    /// The mode is drawn once per refill request and shared by its offers.
    pub fn handle<R: Rng + ?Sized>(
        &mut self,
        events: &[Event],
        grid: &GridModel,
        catalog: &ShapeCatalog,
        palette: &ColorPalette,
        rng: &mut R,
        out: &mut Vec<Command>,
    ) {
        for event in events {
            let Event::QueueRefillRequested { slots } = event else {
                continue;
            };
            let mode = self.choose_mode(grid.fill_ratio(), rng);
            for _ in 0..*slots {
                let directive = self.directive_for_mode(mode, grid, catalog, palette, rng);
                let Some(template) = catalog.get(directive.shape()) else {
                    continue;
                };
                out.push(Command::OfferShape {
                    shape: directive.realize(template, palette, rng),
                    mode: directive.mode(),
                });
            }
        }
    }
}

fn probability(chance: f64) -> f64 {
    if chance.is_nan() {
        0.0
    } else {
        chance.clamp(0.0, 1.0)
    }
}

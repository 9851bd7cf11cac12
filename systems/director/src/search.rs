//! Shape, placement and color searches behind each spawn mode.

use std::collections::{BTreeMap, BTreeSet};

use marble_smash_core::{
    ColorPalette, GridCoord, MarbleColor, ShapeCatalog, ShapeId, ShapeTemplate, SpawnMode,
    EXPLOSION_THRESHOLD,
};
use marble_smash_world::{GridModel, MatchResolver, PlacementEngine};
use rand::{seq::SliceRandom, Rng};

use crate::{random_color, DirectorTuning, SpawnDirective};

/// Cells covered by the template with offset zero on `anchor`.
///
/// `None` when a coordinate falls outside the integer range.
fn targets(template: &ShapeTemplate, anchor: GridCoord) -> Option<Vec<GridCoord>> {
    let shift = anchor.checked_sub(template.anchor_offset())?;
    template
        .offsets()
        .iter()
        .map(|offset| shift.checked_add(*offset))
        .collect()
}

/// Occupied cells bordering the placement, each counted once per color.
fn neighbor_histogram(grid: &GridModel, cells: &[GridCoord]) -> BTreeMap<MarbleColor, usize> {
    let mut seen = BTreeSet::new();
    let mut histogram = BTreeMap::new();
    for cell in cells {
        for neighbor in grid.neighbors(*cell) {
            if cells.contains(&neighbor) || !seen.insert(neighbor) {
                continue;
            }
            if let Some(color) = grid.occupant_color(neighbor) {
                *histogram.entry(color).or_insert(0) += 1;
            }
        }
    }
    histogram
}

pub(crate) fn assistance<R: Rng + ?Sized>(
    grid: &GridModel,
    catalog: &ShapeCatalog,
    palette: &ColorPalette,
    pool: &[ShapeId],
    rng: &mut R,
) -> Option<SpawnDirective> {
    let engine = PlacementEngine::new(grid);
    let mut shapes = pool.to_vec();
    shapes.shuffle(rng);
    let mut anchors: Vec<GridCoord> = grid.available_cells().collect();
    anchors.shuffle(rng);

    for shape in shapes {
        let Some(template) = catalog.get(shape) else {
            continue;
        };
        for &anchor in &anchors {
            if !engine.fits_at(template, anchor) {
                continue;
            }
            let Some(cells) = targets(template, anchor) else {
                continue;
            };
            let histogram = neighbor_histogram(grid, &cells);

            let mut best: Option<(MarbleColor, usize)> = None;
            for color in palette.colors() {
                let count = histogram.get(color).copied().unwrap_or(0);
                if best.map_or(true, |(_, top)| count > top) {
                    best = Some((*color, count));
                }
            }

            let Some((color, count)) = best else {
                continue;
            };
            if count + template.len() >= EXPLOSION_THRESHOLD {
                let directive = (0..template.len()).fold(
                    SpawnDirective::new(shape, SpawnMode::Assistance).with_anchor(anchor),
                    |directive, index| directive.with_override(index, color),
                );
                return Some(directive);
            }
        }
    }

    None
}

/// Size of the same-color group every occupied cell belongs to.
fn group_sizes(grid: &GridModel) -> BTreeMap<GridCoord, usize> {
    let resolver = MatchResolver::new(grid);
    let mut sizes = BTreeMap::new();
    for cell in grid.cells() {
        let coord = cell.coord();
        if !cell.is_occupied() || sizes.contains_key(&coord) {
            continue;
        }
        let group = resolver.find_connected_group(coord);
        let size = group.len();
        for member in group {
            let _ = sizes.insert(member, size);
        }
    }
    sizes
}

/// Least common half of the palette on the current board, rarest first.
fn minority_colors(grid: &GridModel, palette: &ColorPalette) -> Vec<MarbleColor> {
    let counts = grid.color_counts();
    let mut colors = palette.colors().to_vec();
    colors.sort_by_key(|color| counts.get(color).copied().unwrap_or(0));
    let keep = (colors.len() + 1) / 2;
    colors.truncate(keep.max(1));
    colors
}

pub(crate) fn hindrance<R: Rng + ?Sized>(
    grid: &GridModel,
    catalog: &ShapeCatalog,
    palette: &ColorPalette,
    pool: &[ShapeId],
    tuning: &DirectorTuning,
    rng: &mut R,
) -> Option<SpawnDirective> {
    let engine = PlacementEngine::new(grid);
    let sizes = group_sizes(grid);
    let minority = minority_colors(grid, palette);
    let mut best: Option<(u32, SpawnDirective)> = None;

    for &shape in pool {
        let Some(template) = catalog.get(shape) else {
            continue;
        };
        if !engine.can_be_placed_anywhere(template) {
            continue;
        }

        for anchor in engine.anchors_for(template) {
            let Some(cells) = targets(template, anchor) else {
                continue;
            };
            let mut directive = SpawnDirective::new(shape, SpawnMode::Hindrance).with_anchor(anchor);
            let mut score = 0_u32;
            let mut rotation = 0_usize;

            for (index, cell) in cells.iter().enumerate() {
                let guarded: BTreeSet<MarbleColor> = grid
                    .neighbors(*cell)
                    .filter(|neighbor| !cells.contains(neighbor))
                    .filter(|neighbor| sizes.get(neighbor).copied().unwrap_or(0) >= 2)
                    .filter_map(|neighbor| grid.occupant_color(neighbor))
                    .collect();

                let color = if guarded.is_empty() {
                    score = score.saturating_add(tuning.hinder_plain_score);
                    minority[rng.gen_range(0..minority.len())]
                } else {
                    score = score.saturating_add(tuning.hinder_guard_score);
                    let start = rotation;
                    rotation += 1;
                    (0..minority.len())
                        .map(|step| minority[(start + step) % minority.len()])
                        .find(|color| !guarded.contains(color))
                        .unwrap_or(minority[start % minority.len()])
                };
                directive = directive.with_override(index, color);
            }

            if best.as_ref().map_or(true, |(top, _)| score > *top) {
                best = Some((score, directive));
            }
        }
    }

    best.map(|(_, directive)| directive)
}

pub(crate) fn neutral<R: Rng + ?Sized>(pool: &[ShapeId], rng: &mut R) -> SpawnDirective {
    let shape = pool
        .choose(rng)
        .copied()
        .unwrap_or_else(|| ShapeId::new(0));
    SpawnDirective::new(shape, SpawnMode::Neutral)
}

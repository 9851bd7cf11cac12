//! Scripted player used by the command-line runner.

use marble_smash_core::{GridCoord, SlotId};
use marble_smash_world::{query, MatchResolver, PlacementEngine, World};

/// Picks the placement that touches the most same-colored marbles.
///
/// Ties keep the lowest slot and the first anchor in row-major order.
/// `None` when no queued shape fits anywhere.
pub(crate) fn choose_move(world: &World) -> Option<(SlotId, GridCoord)> {
    let grid = query::grid(world);
    let engine = PlacementEngine::new(grid);
    let resolver = MatchResolver::new(grid);
    let mut best: Option<(usize, SlotId, GridCoord)> = None;

    for (slot, shape) in query::queue(world) {
        let Some(template) = query::catalog(world).get(shape.shape()) else {
            continue;
        };
        for anchor in engine.anchors_for(template) {
            let plan = engine.resolve_targets(template, &shape, anchor);
            let touching = plan
                .marbles()
                .iter()
                .flat_map(|marble| {
                    grid.neighbors(marble.cell)
                        .filter(move |neighbor| grid.occupant_color(*neighbor) == Some(marble.color))
                })
                .map(|neighbor| resolver.find_connected_group(neighbor).len())
                .max()
                .unwrap_or(0);

            if best.map_or(true, |(score, _, _)| touching > score) {
                best = Some((touching, slot, anchor));
            }
        }
    }

    best.map(|(_, slot, anchor)| (slot, anchor))
}

#[cfg(test)]
mod tests {
    use super::*;
    use marble_smash_core::{Command, LevelConfig, MarbleColor, ShapeConfig, ShapeId, ShapeInstance, SpawnMode};
    use marble_smash_world as world;

    const RED: MarbleColor = MarbleColor::from_rgb(0xc8, 0x2a, 0x36);

    fn dot_world() -> World {
        let level = LevelConfig {
            id: 1,
            columns: 4,
            rows: 4,
            disabled: Vec::new(),
            locked: Vec::new(),
            palette: vec![RED],
            shapes: vec![ShapeConfig {
                name: "dot".into(),
                offsets: vec![GridCoord::new(0, 0)],
            }],
            goal: 20,
            reward: 50,
        }
        .validate()
        .expect("valid level");
        World::new(&level, 1)
    }

    fn offer_dot(world: &mut World) {
        let mut events = Vec::new();
        world::apply(
            world,
            Command::OfferShape {
                shape: ShapeInstance::new(ShapeId::new(0), vec![RED]),
                mode: SpawnMode::Neutral,
            },
            &mut events,
        );
    }

    #[test]
    fn empty_tray_has_no_move() {
        assert_eq!(choose_move(&dot_world()), None);
    }

    #[test]
    fn prefers_anchors_next_to_matching_marbles() {
        let mut world = dot_world();
        offer_dot(&mut world);
        offer_dot(&mut world);
        let mut events = Vec::new();
        world::apply(
            &mut world,
            Command::PlaceShape {
                slot: SlotId::new(0),
                anchor: GridCoord::new(2, 2),
            },
            &mut events,
        );

        let (slot, anchor) = choose_move(&world).expect("dot fits");
        assert_eq!(slot, SlotId::new(1));
        assert!(
            query::grid(&world).neighbors(anchor).any(|cell| cell == GridCoord::new(2, 2)),
            "{anchor} is not next to the placed marble"
        );
    }
}

use marble_smash_core::{
    Command, Event, GridCoord, Level, LevelConfig, LevelStatus, LockedCellConfig, MarbleColor,
    PlacementError, ShapeConfig, ShapeId, ShapeInstance, SlotId, SpawnMode, QUEUE_CAPACITY,
};
use marble_smash_world::{self as world, query, World};

const RED: MarbleColor = MarbleColor::from_rgb(0xc8, 0x2a, 0x36);
const BLUE: MarbleColor = MarbleColor::from_rgb(0x58, 0x47, 0xff);

fn level() -> Level {
    LevelConfig {
        id: 3,
        columns: 7,
        rows: 7,
        disabled: vec![GridCoord::new(6, 6)],
        locked: vec![LockedCellConfig {
            cell: GridCoord::new(0, 6),
            threshold: 4,
        }],
        palette: vec![RED, BLUE],
        shapes: vec![
            ShapeConfig {
                name: "dot".into(),
                offsets: vec![GridCoord::new(0, 0)],
            },
            ShapeConfig {
                name: "triangle".into(),
                offsets: vec![GridCoord::new(0, 0), GridCoord::new(1, 0), GridCoord::new(0, 1)],
            },
        ],
        goal: 12,
        reward: 40,
    }
    .validate()
    .expect("valid level")
}

fn dot(color: MarbleColor) -> ShapeInstance {
    ShapeInstance::new(ShapeId::new(0), vec![color])
}

fn triangle(color: MarbleColor) -> ShapeInstance {
    ShapeInstance::new(ShapeId::new(1), vec![color; 3])
}

fn offer(world: &mut World, shape: ShapeInstance) -> Vec<Event> {
    let mut events = Vec::new();
    world::apply(
        world,
        Command::OfferShape {
            shape,
            mode: SpawnMode::Neutral,
        },
        &mut events,
    );
    events
}

fn place(world: &mut World, slot: u8, anchor: (i32, i32)) -> Vec<Event> {
    let mut events = Vec::new();
    world::apply(
        world,
        Command::PlaceShape {
            slot: SlotId::new(slot),
            anchor: GridCoord::from(anchor),
        },
        &mut events,
    );
    events
}

#[test]
fn new_world_mirrors_the_level() {
    let world = World::new(&level(), 9);
    let grid = query::grid(&world);

    assert_eq!(grid.columns(), 7);
    assert_eq!(grid.rows(), 7);
    assert!(!grid.contains(GridCoord::new(6, 6)), "disabled cell");
    assert_eq!(query::locked_cells(&world).len(), 1);
    assert_eq!(query::level_id(&world), 3);
    assert_eq!(query::level_number(&world), 9);
    assert_eq!(query::goal(&world), 12);
    assert_eq!(query::status(&world), LevelStatus::InProgress);
    assert!(query::queue(&world).is_empty());
}

#[test]
fn placing_the_last_queued_shape_requests_a_refill() {
    let mut world = World::new(&level(), 1);
    let offered = offer(&mut world, dot(RED));
    assert_eq!(
        offered,
        vec![Event::ShapeOffered {
            slot: SlotId::new(0),
            shape: dot(RED),
            mode: SpawnMode::Neutral,
        }]
    );
    let _ = offer(&mut world, dot(BLUE));

    let events = place(&mut world, 0, (2, 2));
    assert_eq!(
        events,
        vec![Event::ShapePlaced {
            slot: SlotId::new(0),
            shape: dot(RED),
            cells: vec![GridCoord::new(2, 2)],
        }],
        "one shape still queued",
    );

    let events = place(&mut world, 1, (3, 2));
    assert_eq!(events.len(), 2);
    assert_eq!(
        events[1],
        Event::QueueRefillRequested {
            slots: QUEUE_CAPACITY
        }
    );
    assert_eq!(query::grid(&world).occupied_count(), 2);
}

#[test]
fn rejected_placements_leave_the_world_untouched() {
    let mut world = World::new(&level(), 1);
    let _ = offer(&mut world, triangle(BLUE));

    assert_eq!(
        place(&mut world, 2, (1, 1)),
        vec![Event::PlacementRejected {
            slot: SlotId::new(2),
            anchor: GridCoord::new(1, 1),
            reason: PlacementError::EmptySlot,
        }]
    );
    assert_eq!(
        place(&mut world, 0, (6, 1)),
        vec![Event::PlacementRejected {
            slot: SlotId::new(0),
            anchor: GridCoord::new(6, 1),
            reason: PlacementError::OutOfGrid,
        }]
    );
    assert_eq!(
        place(&mut world, 0, (0, 5)),
        vec![Event::PlacementRejected {
            slot: SlotId::new(0),
            anchor: GridCoord::new(0, 5),
            reason: PlacementError::Locked,
        }]
    );

    assert_eq!(query::grid(&world).occupied_count(), 0);
    assert_eq!(query::queued_shapes(&world), vec![triangle(BLUE)]);
}

#[test]
fn anchors_at_the_integer_limits_are_out_of_grid() {
    let mut world = World::new(&level(), 1);
    let _ = offer(&mut world, triangle(RED));

    for anchor in [(i32::MAX, 0), (0, i32::MAX), (i32::MIN, i32::MIN)] {
        assert_eq!(
            place(&mut world, 0, anchor),
            vec![Event::PlacementRejected {
                slot: SlotId::new(0),
                anchor: GridCoord::from(anchor),
                reason: PlacementError::OutOfGrid,
            }]
        );
        let preview = query::preview(&world, SlotId::new(0), GridCoord::from(anchor))
            .expect("slot holds a shape");
        assert!(!preview.placeable);
        assert!(preview.marbles.is_empty());
    }

    assert_eq!(query::grid(&world).occupied_count(), 0);
}

#[test]
fn resolving_matches_reports_exploded_cells() {
    let mut world = World::new(&level(), 1);
    let _ = offer(&mut world, dot(RED));
    let _ = offer(&mut world, dot(RED));
    let _ = offer(&mut world, triangle(RED));
    let _ = place(&mut world, 0, (1, 3));
    let _ = place(&mut world, 1, (2, 3));
    let placed = place(&mut world, 2, (3, 3));

    let Some(Event::ShapePlaced { cells, .. }) = placed.first().cloned() else {
        panic!("expected placement, got {placed:?}");
    };

    let mut events = Vec::new();
    world::apply(&mut world, Command::ResolveMatches { cells }, &mut events);
    match events.as_slice() {
        [Event::MarblesExploded { count, cells }] => {
            assert_eq!(*count, 5);
            assert_eq!(cells.len(), 5);
        }
        other => panic!("unexpected events: {other:?}"),
    }
    assert_eq!(query::grid(&world).occupied_count(), 0);
}

#[test]
fn refresh_discards_queue_and_requests_new_shapes() {
    let mut world = World::new(&level(), 1);
    let _ = offer(&mut world, dot(RED));
    let _ = offer(&mut world, triangle(BLUE));

    let mut events = Vec::new();
    world::apply(&mut world, Command::RefreshQueue, &mut events);
    assert_eq!(
        events,
        vec![
            Event::QueueDiscarded {
                shapes: vec![dot(RED), triangle(BLUE)],
            },
            Event::QueueRefillRequested {
                slots: QUEUE_CAPACITY
            },
        ]
    );
    assert!(query::queue(&world).is_empty());
}

#[test]
fn detonation_removes_a_single_marble() {
    let mut world = World::new(&level(), 1);
    let _ = offer(&mut world, triangle(BLUE));
    let _ = place(&mut world, 0, (2, 2));

    let mut events = Vec::new();
    world::apply(
        &mut world,
        Command::DetonateCell {
            cell: GridCoord::new(4, 4),
        },
        &mut events,
    );
    assert!(events.is_empty(), "empty cells do not detonate");

    world::apply(
        &mut world,
        Command::DetonateCell {
            cell: GridCoord::new(3, 2),
        },
        &mut events,
    );
    assert_eq!(
        events,
        vec![Event::MarblesExploded {
            count: 1,
            cells: vec![GridCoord::new(3, 2)],
        }]
    );
    assert_eq!(query::grid(&world).occupied_count(), 2);
}

#[test]
fn unlocking_is_reported_once() {
    let mut world = World::new(&level(), 1);
    let cell = GridCoord::new(0, 6);
    let mut events = Vec::new();

    world::apply(&mut world, Command::UnlockCell { cell }, &mut events);
    world::apply(&mut world, Command::UnlockCell { cell }, &mut events);

    assert_eq!(events, vec![Event::CellUnlocked { cell }]);
    assert!(query::grid(&world).is_available(cell));
}

#[test]
fn level_ends_only_once() {
    let mut world = World::new(&level(), 1);
    let mut events = Vec::new();

    world::apply(&mut world, Command::CompleteLevel, &mut events);
    world::apply(&mut world, Command::FailLevel, &mut events);
    world::apply(&mut world, Command::CompleteTurn, &mut events);

    assert_eq!(
        events,
        vec![
            Event::LevelCompleted { reward: 40 },
            Event::TurnCompleted { turn: 1 },
        ]
    );
    assert_eq!(query::status(&world), LevelStatus::Completed);
    assert!(offer(&mut world, dot(RED)).is_empty(), "no offers after the end");
}

#[test]
fn preview_tracks_validity() {
    let mut world = World::new(&level(), 1);
    let _ = offer(&mut world, triangle(RED));

    let preview = query::preview(&world, SlotId::new(0), GridCoord::new(6, 0))
        .expect("slot holds a shape");
    assert!(!preview.placeable);
    assert_eq!(preview.marbles.len(), 2, "one marble hangs off the grid");

    let preview = query::preview(&world, SlotId::new(0), GridCoord::new(2, 2))
        .expect("slot holds a shape");
    assert!(preview.placeable);
    assert_eq!(preview.marbles.len(), 3);
    assert!(query::preview(&world, SlotId::new(1), GridCoord::new(2, 2)).is_none());
}

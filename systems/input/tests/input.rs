use marble_smash_core::{Command, Event, GridCoord, SlotId};
use marble_smash_system_input::{InputSystem, PlayerInput};

fn nothing_occupied(_: GridCoord) -> bool {
    false
}

#[test]
fn dropping_a_shape_requests_placement() {
    let mut input = InputSystem::new();
    let mut commands = Vec::new();

    input.handle(
        &[],
        PlayerInput {
            cursor_cell: Some(GridCoord::new(2, 2)),
            dragged_slot: Some(SlotId::new(1)),
            ..PlayerInput::default()
        },
        nothing_occupied,
        &mut commands,
    );
    assert!(commands.is_empty(), "hovering does not place");

    input.handle(
        &[],
        PlayerInput::drop_shape(SlotId::new(1), GridCoord::new(2, 2)),
        nothing_occupied,
        &mut commands,
    );
    assert_eq!(
        commands,
        vec![Command::PlaceShape {
            slot: SlotId::new(1),
            anchor: GridCoord::new(2, 2),
        }]
    );
}

#[test]
fn armed_firework_detonates_one_marble() {
    let mut input = InputSystem::new();
    let mut commands = Vec::new();
    let occupied = |cell: GridCoord| cell == GridCoord::new(3, 1);

    input.handle(
        &[],
        PlayerInput {
            toggle_firework: true,
            ..PlayerInput::default()
        },
        occupied,
        &mut commands,
    );
    assert!(input.firework_armed());

    input.handle(
        &[],
        PlayerInput {
            confirm: true,
            cursor_cell: Some(GridCoord::new(0, 0)),
            ..PlayerInput::default()
        },
        occupied,
        &mut commands,
    );
    assert!(commands.is_empty(), "empty cells keep the firework armed");
    assert!(input.firework_armed());

    input.handle(
        &[],
        PlayerInput::drop_shape(SlotId::new(0), GridCoord::new(3, 1)),
        occupied,
        &mut commands,
    );
    assert_eq!(
        commands,
        vec![Command::DetonateCell {
            cell: GridCoord::new(3, 1)
        }]
    );
    assert!(!input.firework_armed());
}

#[test]
fn finished_level_ignores_input() {
    let mut input = InputSystem::new();
    let mut commands = Vec::new();

    input.handle(
        &[Event::LevelCompleted { reward: 50 }],
        PlayerInput {
            refresh: true,
            ..PlayerInput::default()
        },
        nothing_occupied,
        &mut commands,
    );
    input.handle(
        &[],
        PlayerInput::drop_shape(SlotId::new(0), GridCoord::new(1, 1)),
        nothing_occupied,
        &mut commands,
    );
    assert!(commands.is_empty());
}

#[test]
fn refresh_power_up_requests_new_queue() {
    let mut input = InputSystem::default();
    let mut commands = Vec::new();
    input.handle(
        &[Event::TurnCompleted { turn: 2 }],
        PlayerInput {
            refresh: true,
            ..PlayerInput::default()
        },
        nothing_occupied,
        &mut commands,
    );
    assert_eq!(commands, vec![Command::RefreshQueue]);
}

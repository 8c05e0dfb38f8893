use super::*;

#[test]
fn parses_every_known_action_id() {
    for input in GameInput::ALL {
        let parsed = GameInput::from_action_id(&input.action_id()).expect("known action");
        assert_eq!(parsed, input);
    }
}

#[test]
fn rejects_unknown_and_unprefixed_action_ids() {
    let err = GameInput::from_action_id("GAME_INPUT_FOO").expect_err("unknown");
    assert!(matches!(err, InputError::UnknownCommand(ref id) if id == "GAME_INPUT_FOO"));

    assert!(GameInput::from_action_id("UP").is_err());
    assert!(GameInput::from_action_id("GAME_INPUT_up").is_err());
    assert!(GameInput::from_action_id("").is_err());
}

#[test]
fn default_key_map_matches_emulator_bindings() {
    let keys = KeyMap::default();
    assert_eq!(keys.key_for(GameInput::A), "Z");
    assert_eq!(keys.key_for(GameInput::B), "X");
    assert_eq!(keys.key_for(GameInput::Start), "Enter");
    assert_eq!(keys.key_for(GameInput::Select), "Backspace");
    assert_eq!(keys.key_for(GameInput::Left), "Left");
}

#[test]
fn overridden_key_flows_into_command() {
    let mut keys = KeyMap::default();
    keys.set(GameInput::A, "a");
    let command = keys.command_for(GameInput::A);
    assert_eq!(command.input, GameInput::A);
    assert_eq!(command.target_key, "a");
}

#[test]
fn serializes_as_uppercase_name() {
    let json = serde_json::to_string(&GameInput::Select).expect("json");
    assert_eq!(json, "\"SELECT\"");
    let back: GameInput = serde_json::from_str("\"START\"").expect("parse");
    assert_eq!(back, GameInput::Start);
}

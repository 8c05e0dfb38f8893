use super::*;
use crate::domain::KeyMap;

fn event(origin: &str, input: GameInput) -> InputEvent {
    InputEvent::new(origin, KeyMap::default().command_for(input))
}

#[test]
fn ledger_record_has_date_username_and_input() {
    let event = event("alice", GameInput::Up);
    let value = serde_json::to_value(event.ledger_record()).expect("json");
    let object = value.as_object().expect("object");

    assert_eq!(object.len(), 3);
    assert_eq!(object["username"], "alice");
    assert_eq!(object["input"], "UP");
    let date = object["date"].as_str().expect("date string");
    let parsed = DateTime::parse_from_rfc3339(date).expect("iso-8601");
    assert_eq!(parsed.with_timezone(&Utc), event.timestamp);
}

#[test]
fn observer_frame_carries_only_username_and_input() {
    let event = event("bob", GameInput::B);
    let text = serde_json::to_string(&event.observer_frame()).expect("json");
    assert_eq!(text, r#"{"username":"bob","input":"B"}"#);
}

#[test]
fn action_request_username_is_optional() {
    let request: ActionRequest =
        serde_json::from_str(r#"{"action_id":"GAME_INPUT_A"}"#).expect("json");
    assert_eq!(request.action_id, "GAME_INPUT_A");
    assert!(request.username.is_none());
}

#[test]
fn control_pad_lists_inputs_in_pad_order() {
    let pad = control_pad();
    let ids: Vec<_> = pad.iter().map(|button| button.action_id.as_str()).collect();
    assert_eq!(
        ids,
        [
            "GAME_INPUT_UP",
            "GAME_INPUT_DOWN",
            "GAME_INPUT_LEFT",
            "GAME_INPUT_RIGHT",
            "GAME_INPUT_A",
            "GAME_INPUT_B",
            "GAME_INPUT_START",
            "GAME_INPUT_SELECT",
        ]
    );
    assert_eq!(pad[6].label, "START");
}

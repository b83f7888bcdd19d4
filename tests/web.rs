//! 浏览器环境下的导出接口测试（`wasm-pack test --headless --firefox`）。

#![cfg(target_arch = "wasm32")]

use chopsticks_core::{create_game_state, legal_moves, validate_state, GameEngine, GameState};
use serde_wasm_bindgen::from_value;
use wasm_bindgen_test::*;

wasm_bindgen_test_configure!(run_in_browser);

#[wasm_bindgen_test]
fn created_state_is_the_opening_position() {
    let value = create_game_state().expect("state should convert to JS");
    let state: GameState = from_value(value.clone()).expect("state should convert back");
    assert_eq!(state, GameState::new());
    assert!(validate_state(value).is_ok());
}

#[wasm_bindgen_test]
fn opening_has_four_legal_moves() {
    let value = create_game_state().expect("state should convert to JS");
    let moves = legal_moves(value).expect("moves should convert to JS");
    let moves: Vec<chopsticks_core::AttackAction> = from_value(moves).expect("moves decode");
    assert_eq!(moves.len(), 4);
}

#[wasm_bindgen_test]
fn attack_json_reports_rule_errors() {
    let mut engine = GameEngine::new(None);
    assert!(engine.attack_json("left", "left").is_ok());
    assert!(engine.attack_json("left", "nose").is_err());
    assert!(engine.split_json(4, 4).is_err());
    assert_eq!(engine.current_player(), 2);
}

#[wasm_bindgen_test]
fn corrupt_state_json_is_rejected() {
    let mut engine = GameEngine::new(None);
    let json = r#"{"hands":[{"left":7,"right":1},{"left":1,"right":1}],"current_player":"player1","turn":1}"#;
    assert!(engine.set_state_json(json).is_err());
    assert_eq!(engine.p1_left(), 1, "failed load keeps the previous game");
}

#[wasm_bindgen_test]
async fn think_ai_resolves_without_moving() {
    let mut engine = GameEngine::new(None);
    assert!(engine.make_move("left", "left"));
    let promise = engine.think_ai(Some("medium".into()), Some(10));
    let value = wasm_bindgen_futures::JsFuture::from(promise)
        .await
        .expect("search should resolve");
    let json = value.as_string().expect("decision is a JSON string");
    assert!(json.contains("\"action\""));
    assert_eq!(engine.current_player(), 2);
}

#[wasm_bindgen_test]
fn apply_ai_move_refuses_player_one_turn() {
    let mut engine = GameEngine::new(None);
    assert!(engine.apply_ai_move(None).is_err());
    assert_eq!(engine.describe(), GameEngine::new(None).describe());
}

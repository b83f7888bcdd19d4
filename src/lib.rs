pub mod ai;
pub mod game;
pub mod utils;

use gloo_timers::future::TimeoutFuture;
use serde::Serialize;
use serde_wasm_bindgen::{from_value, to_value};
use std::str::FromStr;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::future_to_promise;
use web_sys::js_sys::Promise;

pub use ai::{
    enumerate_legal_moves, evaluate_state, simulate_move, AiAgent, AiConfig, AiDecision,
    AiDifficulty, AiStrategy, Snapshot, AI_PLAYER,
};
pub use game::{
    AttackAction, ChopsticksGame, GameAction, GameEvent, GameState, Hand, Hands, IntegrityError,
    PlayerId, RuleEngine, RuleError, RuleResolution, SplitAction, TerminalPolicy, VictoryReason,
    VictoryState,
};

#[cfg(all(feature = "wee_alloc", target_arch = "wasm32"))]
#[global_allocator]
static ALLOC: wee_alloc::WeeAlloc = wee_alloc::WeeAlloc::INIT;

#[wasm_bindgen(start)]
pub fn start() {
    utils::set_panic_hook();
}

fn to_js_error(error: RuleError) -> JsValue {
    to_value(&error).unwrap_or_else(|serialize_err| JsValue::from_str(&serialize_err.to_string()))
}

fn serde_to_js_error<E: std::fmt::Display>(error: E) -> JsValue {
    JsValue::from_str(&error.to_string())
}

fn make_resolution_json(resolution: RuleResolution) -> Result<String, JsValue> {
    serde_json::to_string(&resolution).map_err(serde_to_js_error)
}

fn parse_policy(policy: Option<&str>) -> TerminalPolicy {
    policy
        .and_then(|value| TerminalPolicy::from_str(value).ok())
        .unwrap_or_default()
}

fn config_for(difficulty: Option<&str>) -> AiConfig {
    let difficulty = difficulty
        .and_then(|value| AiDifficulty::from_str(value).ok())
        .unwrap_or(AiDifficulty::Medium);
    AiConfig::from_difficulty(difficulty)
}

/// 搜索只替 `AI_PLAYER` 打分，轮到对方时拒绝思考；已终局的局面直接放行。
fn ensure_ai_turn(state: &GameState) -> Result<(), RuleError> {
    if !state.is_finished() && state.current_player != AI_PLAYER {
        return Err(RuleError::NotPlayersTurn { player: AI_PLAYER });
    }
    Ok(())
}

fn log_outcome(state: &GameState) {
    if let Some(winner) = state.winner() {
        utils::log(&format!("game over: {winner} wins after {} turns", state.turn));
    }
}

#[derive(Serialize)]
struct AiMoveResponse {
    decision: AiDecision,
    #[serde(skip_serializing_if = "Option::is_none")]
    applied: Option<RuleResolution>,
}

#[wasm_bindgen]
pub struct GameEngine {
    game: ChopsticksGame,
}

#[wasm_bindgen]
impl GameEngine {
    #[wasm_bindgen(constructor)]
    pub fn new(policy: Option<String>) -> GameEngine {
        GameEngine {
            game: ChopsticksGame::with_policy(parse_policy(policy.as_deref())),
        }
    }

    pub fn state_json(&self) -> Result<String, JsValue> {
        serde_json::to_string(self.game.state()).map_err(serde_to_js_error)
    }

    pub fn set_state_json(&mut self, json: &str) -> Result<(), JsValue> {
        let state: GameState = serde_json::from_str(json).map_err(serde_to_js_error)?;
        self.game = ChopsticksGame::from_state(state, self.game.policy()).map_err(to_js_error)?;
        Ok(())
    }

    pub fn reset(&mut self) {
        self.game.reset();
        utils::log("new game started");
    }

    pub fn is_valid_move(&self, attacking_hand: &str, target_hand: &str) -> bool {
        self.game.is_valid_move(attacking_hand, target_hand)
    }

    pub fn make_move(&mut self, attacking_hand: &str, target_hand: &str) -> bool {
        let applied = self.game.make_move(attacking_hand, target_hand);
        if applied {
            log_outcome(self.game.state());
        }
        applied
    }

    pub fn split_fingers(&mut self, left: i32, right: i32) -> bool {
        self.game.split_fingers(left, right)
    }

    pub fn check_winner(&mut self) -> Option<u8> {
        self.game.check_winner().map(|outcome| outcome.winner.number())
    }

    pub fn attack_json(&mut self, attacking_hand: &str, target_hand: &str) -> Result<String, JsValue> {
        let action = AttackAction::parse(attacking_hand, target_hand).map_err(to_js_error)?;
        let events = self.game.try_make_move(action).map_err(to_js_error)?;
        log_outcome(self.game.state());
        make_resolution_json(RuleResolution::new(self.game.state().clone(), events))
    }

    pub fn split_json(&mut self, left: i32, right: i32) -> Result<String, JsValue> {
        let events = self
            .game
            .try_split_fingers(left, right)
            .map_err(to_js_error)?;
        make_resolution_json(RuleResolution::new(self.game.state().clone(), events))
    }

    pub fn p1_left(&self) -> u8 {
        self.game.p1_left()
    }

    pub fn p1_right(&self) -> u8 {
        self.game.p1_right()
    }

    pub fn p2_left(&self) -> u8 {
        self.game.p2_left()
    }

    pub fn p2_right(&self) -> u8 {
        self.game.p2_right()
    }

    pub fn current_player(&self) -> u8 {
        self.game.current_player().number()
    }

    pub fn is_game_over(&self) -> bool {
        self.game.is_game_over()
    }

    pub fn winner(&self) -> Option<u8> {
        self.game.winner().map(PlayerId::number)
    }

    pub fn describe(&self) -> String {
        self.game.describe()
    }

    pub fn legal_moves_json(&self) -> Result<String, JsValue> {
        serde_json::to_string(&self.game.legal_moves()).map_err(serde_to_js_error)
    }

    pub fn apply_ai_move(&mut self, difficulty: Option<String>) -> Result<String, JsValue> {
        let config = config_for(difficulty.as_deref());
        ensure_ai_turn(self.game.state()).map_err(to_js_error)?;

        // 先用局面副本做决策，再由引擎落子
        let state_for_ai = self.game.state().clone();
        let mut agent = AiAgent::new(config);
        let decision = agent.decide(&state_for_ai);

        let applied = match decision.action {
            Some(action) => {
                let events = self.game.try_make_move(action).map_err(to_js_error)?;
                utils::log(&format!(
                    "ai plays {} -> {} (score {}, {} nodes)",
                    action.attacking_hand, action.target_hand, decision.evaluation, decision.nodes
                ));
                log_outcome(self.game.state());
                Some(RuleResolution::new(self.game.state().clone(), events))
            }
            None => None,
        };

        let response = AiMoveResponse { decision, applied };
        serde_json::to_string(&response).map_err(serde_to_js_error)
    }

    /// 延迟 `delay_ms` 后在局面副本上思考，只返回决策，不落子。
    pub fn think_ai(&self, difficulty: Option<String>, delay_ms: Option<u32>) -> Promise {
        let state = self.game.state().clone();
        let config = config_for(difficulty.as_deref());
        let delay = delay_ms.unwrap_or(0);

        future_to_promise(async move {
            ensure_ai_turn(&state).map_err(to_js_error)?;
            if delay > 0 {
                TimeoutFuture::new(delay).await;
            }
            let mut agent = AiAgent::new(config);
            let decision = agent.decide(&state);
            let json = serde_json::to_string(&decision).map_err(serde_to_js_error)?;
            Ok(JsValue::from_str(&json))
        })
    }
}

/// 返回开局局面，方便前端初始化。
#[wasm_bindgen(js_name = "createGameState")]
pub fn create_game_state() -> Result<JsValue, JsValue> {
    to_value(&GameState::new()).map_err(JsValue::from)
}

#[wasm_bindgen(js_name = "legalMoves")]
pub fn legal_moves(state: JsValue) -> Result<JsValue, JsValue> {
    let state: GameState = from_value(state).map_err(JsValue::from)?;
    to_value(&RuleEngine::legal_attacks(&state)).map_err(JsValue::from)
}

#[wasm_bindgen(js_name = "applyAction")]
pub fn apply_action(state: JsValue, action: JsValue, policy: Option<String>) -> Result<JsValue, JsValue> {
    let mut state: GameState = from_value(state).map_err(JsValue::from)?;
    let action: GameAction = from_value(action).map_err(JsValue::from)?;
    let engine = RuleEngine::with_policy(parse_policy(policy.as_deref()));
    match engine.apply(&mut state, action) {
        Ok(events) => to_value(&RuleResolution::new(state, events)).map_err(JsValue::from),
        Err(error) => Err(to_js_error(error)),
    }
}

#[wasm_bindgen(js_name = "checkVictory")]
pub fn check_victory(state: JsValue, policy: Option<String>) -> Result<JsValue, JsValue> {
    let mut state: GameState = from_value(state).map_err(JsValue::from)?;
    let engine = RuleEngine::with_policy(parse_policy(policy.as_deref()));
    let outcome = engine.check_victory(&mut state);
    to_value(&outcome).map_err(JsValue::from)
}

#[wasm_bindgen(js_name = "validateState")]
pub fn validate_state(state: JsValue) -> Result<(), JsValue> {
    let state: GameState = from_value(state).map_err(JsValue::from)?;
    state
        .integrity_check()
        .map_err(|error| to_js_error(RuleError::IntegrityViolation { error }))?;
    Ok(())
}

#[wasm_bindgen(js_name = "computeAiMove")]
pub fn compute_ai_move(state: JsValue, difficulty: Option<String>) -> Result<JsValue, JsValue> {
    let state: GameState = from_value(state).map_err(JsValue::from)?;
    ensure_ai_turn(&state).map_err(to_js_error)?;
    let mut agent = AiAgent::new(config_for(difficulty.as_deref()));
    let decision = agent.decide(&state);
    to_value(&decision).map_err(JsValue::from)
}

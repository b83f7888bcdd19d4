//! 持有规范局面的游戏引擎，是唯一会修改局面的入口。

use super::rules::{AttackAction, RuleEngine, RuleError, SplitAction, TerminalPolicy};
use super::state::{GameEvent, GameState, PlayerId, VictoryState};

#[derive(Debug, Clone, Default)]
pub struct ChopsticksGame {
    state: GameState,
    rules: RuleEngine,
}

impl ChopsticksGame {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_policy(policy: TerminalPolicy) -> Self {
        Self {
            state: GameState::new(),
            rules: RuleEngine::with_policy(policy),
        }
    }

    /// 载入外部局面（例如前端保存的 JSON），先做完整性校验，再补做终局判定。
    pub fn from_state(mut state: GameState, policy: TerminalPolicy) -> Result<Self, RuleError> {
        state
            .integrity_check()
            .map_err(|error| RuleError::IntegrityViolation { error })?;
        let rules = RuleEngine::with_policy(policy);
        rules.check_victory(&mut state);
        Ok(Self { state, rules })
    }

    pub fn reset(&mut self) {
        self.state = GameState::new();
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn policy(&self) -> TerminalPolicy {
        self.rules.policy()
    }

    pub fn is_valid_move(&self, attacking_hand: &str, target_hand: &str) -> bool {
        RuleEngine::is_valid_move(&self.state, attacking_hand, target_hand)
    }

    pub fn legal_moves(&self) -> Vec<AttackAction> {
        RuleEngine::legal_attacks(&self.state)
    }

    pub fn make_move(&mut self, attacking_hand: &str, target_hand: &str) -> bool {
        AttackAction::parse(attacking_hand, target_hand)
            .and_then(|action| self.try_make_move(action))
            .is_ok()
    }

    pub fn try_make_move(&mut self, action: AttackAction) -> Result<Vec<GameEvent>, RuleError> {
        self.rules.attack(&mut self.state, action)
    }

    pub fn split_fingers(&mut self, left: i32, right: i32) -> bool {
        self.try_split_fingers(left, right).is_ok()
    }

    pub fn try_split_fingers(&mut self, left: i32, right: i32) -> Result<Vec<GameEvent>, RuleError> {
        self.rules.split(&mut self.state, SplitAction { left, right })
    }

    pub fn check_winner(&mut self) -> Option<VictoryState> {
        self.rules.check_victory(&mut self.state)
    }

    pub fn p1_left(&self) -> u8 {
        self.state.p1_left()
    }

    pub fn p1_right(&self) -> u8 {
        self.state.p1_right()
    }

    pub fn p2_left(&self) -> u8 {
        self.state.p2_left()
    }

    pub fn p2_right(&self) -> u8 {
        self.state.p2_right()
    }

    pub fn current_player(&self) -> PlayerId {
        self.state.current_player
    }

    pub fn is_game_over(&self) -> bool {
        self.state.is_finished()
    }

    pub fn winner(&self) -> Option<PlayerId> {
        self.state.winner()
    }

    pub fn describe(&self) -> String {
        self.state.to_string()
    }
}

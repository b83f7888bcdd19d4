use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::state::{
    GameEvent, GameState, Hand, IntegrityError, PlayerId, VictoryReason, VictoryState, MAX_FINGERS,
};

/// 行动方用 `attacking_hand` 拍对手的 `target_hand`。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct AttackAction {
    pub attacking_hand: Hand,
    pub target_hand: Hand,
}

impl AttackAction {
    pub fn new(attacking_hand: Hand, target_hand: Hand) -> Self {
        Self {
            attacking_hand,
            target_hand,
        }
    }

    pub fn parse(attacking_hand: &str, target_hand: &str) -> Result<Self, RuleError> {
        Ok(Self::new(attacking_hand.parse()?, target_hand.parse()?))
    }
}

/// 行动方重新分配自己两只手的手指。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct SplitAction {
    pub left: i32,
    pub right: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum GameAction {
    Attack { action: AttackAction },
    Split { action: SplitAction },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum RuleError {
    GameFinished,
    UnknownHand { name: String },
    InactiveAttacker { hand: Hand },
    InactiveTarget { hand: Hand },
    SplitTotalMismatch { expected: u16, actual: i32 },
    SplitOutOfRange { amount: i32 },
    IntegrityViolation { error: IntegrityError },
    NotPlayersTurn { player: PlayerId },
}

impl fmt::Display for RuleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuleError::GameFinished => f.write_str("the game is already over"),
            RuleError::UnknownHand { name } => write!(f, "unknown hand {name:?}"),
            RuleError::InactiveAttacker { hand } => write!(f, "cannot attack with the empty {hand} hand"),
            RuleError::InactiveTarget { hand } => write!(f, "cannot attack the empty {hand} hand"),
            RuleError::SplitTotalMismatch { expected, actual } => {
                write!(f, "split must keep {expected} fingers, got {actual}")
            }
            RuleError::SplitOutOfRange { amount } => {
                write!(f, "split amount {amount} must be between 0 and {}", MAX_FINGERS - 1)
            }
            RuleError::IntegrityViolation { error } => write!(f, "invalid game state: {error}"),
            RuleError::NotPlayersTurn { player } => write!(f, "it is not {player}'s turn"),
        }
    }
}

impl std::error::Error for RuleError {}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleResolution {
    pub state: GameState,
    pub events: Vec<GameEvent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub victory: Option<VictoryState>,
}

impl RuleResolution {
    /// 本步事件已在 `events` 中，`state` 不再携带历史日志。
    pub fn new(mut state: GameState, mut events: Vec<GameEvent>) -> Self {
        state.event_log.clear();
        let victory = state.outcome.clone();
        if let Some(ref outcome) = victory {
            let has_event = events
                .iter()
                .any(|event| matches!(event, GameEvent::GameWon { .. }));
            if !has_event {
                events.push(GameEvent::GameWon {
                    winner: outcome.winner,
                    reason: outcome.reason.clone(),
                });
            }
        }

        Self {
            state,
            events,
            victory,
        }
    }
}

/// 终局判定规则。
///
/// `AliveOnly` 只在一方两手皆空时结束游戏；`NoLegalMoves` 先判定
/// 轮到行动却无合法攻击（而对手仍存活）的一方落败，理由记为 `NoLegalMoves`。
/// 仅靠攻击规则对弈时两者胜负一致，差别只体现在载入的局面上。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum TerminalPolicy {
    #[default]
    AliveOnly,
    NoLegalMoves,
}

impl FromStr for TerminalPolicy {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "alive" | "alive-only" => Ok(TerminalPolicy::AliveOnly),
            "strict" | "no-legal-moves" => Ok(TerminalPolicy::NoLegalMoves),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RuleEngine {
    policy: TerminalPolicy,
}

impl RuleEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_policy(policy: TerminalPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> TerminalPolicy {
        self.policy
    }

    fn ensure_in_progress(state: &GameState) -> Result<(), RuleError> {
        if state.is_finished() {
            return Err(RuleError::GameFinished);
        }
        Ok(())
    }

    fn ensure_integrity(state: &GameState) -> Result<(), RuleError> {
        state
            .integrity_check()
            .map_err(|error| RuleError::IntegrityViolation { error })
    }

    fn ensure_split_amount(amount: i32) -> Result<u8, RuleError> {
        if amount < 0 || amount >= MAX_FINGERS as i32 {
            return Err(RuleError::SplitOutOfRange { amount });
        }
        Ok(amount as u8)
    }

    pub fn validate_attack(state: &GameState, action: AttackAction) -> Result<(), RuleError> {
        Self::ensure_in_progress(state)?;

        let mover = state.current_player;
        if !state.hands(mover).is_active(action.attacking_hand) {
            return Err(RuleError::InactiveAttacker {
                hand: action.attacking_hand,
            });
        }
        if !state.hands(mover.opponent()).is_active(action.target_hand) {
            return Err(RuleError::InactiveTarget {
                hand: action.target_hand,
            });
        }
        Ok(())
    }

    pub fn is_valid_move(state: &GameState, attacking_hand: &str, target_hand: &str) -> bool {
        AttackAction::parse(attacking_hand, target_hand)
            .and_then(|action| Self::validate_attack(state, action))
            .is_ok()
    }

    /// 当前行动方的全部合法攻击，顺序固定为 左→左、左→右、右→左、右→右。
    pub fn legal_attacks(state: &GameState) -> Vec<AttackAction> {
        let mut actions = Vec::new();
        for attacking_hand in Hand::ALL {
            for target_hand in Hand::ALL {
                let action = AttackAction::new(attacking_hand, target_hand);
                if Self::validate_attack(state, action).is_ok() {
                    actions.push(action);
                }
            }
        }
        actions
    }

    pub fn attack(&self, state: &mut GameState, action: AttackAction) -> Result<Vec<GameEvent>, RuleError> {
        Self::ensure_integrity(state)?;
        Self::validate_attack(state, action)?;

        let mover = state.current_player;
        let mut events = state.strike(mover, action.attacking_hand, action.target_hand);

        if let Some(outcome) = state.evaluate_victory() {
            // 终局时不再换手，current_player 停留在获胜的一方。
            events.push(GameEvent::GameWon {
                winner: outcome.winner,
                reason: outcome.reason,
            });
            return Ok(events);
        }

        // 未终局时双方都还有手，换手后行动方必有合法攻击。
        events.push(state.pass_turn());
        Ok(events)
    }

    /// 分手不做终局判定：手指总数守恒，行动方不可能因此两手皆空。
    pub fn split(&self, state: &mut GameState, action: SplitAction) -> Result<Vec<GameEvent>, RuleError> {
        Self::ensure_integrity(state)?;
        Self::ensure_in_progress(state)?;

        let left = Self::ensure_split_amount(action.left)?;
        let right = Self::ensure_split_amount(action.right)?;

        let mover = state.current_player;
        let expected = state.hands(mover).total();
        let actual = action.left + action.right;
        if actual != expected as i32 {
            return Err(RuleError::SplitTotalMismatch { expected, actual });
        }

        let mut events = vec![state.redistribute(mover, left, right)];
        events.push(state.pass_turn());
        Ok(events)
    }

    pub fn apply(&self, state: &mut GameState, action: GameAction) -> Result<Vec<GameEvent>, RuleError> {
        match action {
            GameAction::Attack { action } => self.attack(state, action),
            GameAction::Split { action } => self.split(state, action),
        }
    }

    /// 幂等的终局判定。
    pub fn check_victory(&self, state: &mut GameState) -> Option<VictoryState> {
        if let Some(outcome) = &state.outcome {
            return Some(outcome.clone());
        }
        if let Some(outcome) = self.check_stalemate(state) {
            return Some(outcome);
        }
        state.evaluate_victory()
    }

    fn check_stalemate(&self, state: &mut GameState) -> Option<VictoryState> {
        if self.policy != TerminalPolicy::NoLegalMoves {
            return None;
        }
        let loser = state.current_player;
        if state.has_legal_attack(loser) || !state.hands(loser.opponent()).is_alive() {
            return None;
        }
        Some(state.declare_victory(loser.opponent(), VictoryReason::NoLegalMoves { loser }))
    }
}

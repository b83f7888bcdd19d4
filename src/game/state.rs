use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::rules::RuleError;

/// 手指数累计到该值即取模归零，该手出局。
pub const MAX_FINGERS: u8 = 5;
/// 开局时每只手的手指数。
pub const STARTING_FINGERS: u8 = 1;
/// `event_log` 最多保留的事件条数，超出后丢弃最早的事件。
pub const EVENT_LOG_LIMIT: usize = 256;

/// 玩家标识。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum PlayerId {
    Player1,
    Player2,
}

impl PlayerId {
    pub fn opponent(self) -> Self {
        match self {
            PlayerId::Player1 => PlayerId::Player2,
            PlayerId::Player2 => PlayerId::Player1,
        }
    }

    pub fn index(self) -> usize {
        match self {
            PlayerId::Player1 => 0,
            PlayerId::Player2 => 1,
        }
    }

    /// 前端使用的编号（1 或 2）。
    pub fn number(self) -> u8 {
        self.index() as u8 + 1
    }

    pub fn from_number(number: u8) -> Option<Self> {
        match number {
            1 => Some(PlayerId::Player1),
            2 => Some(PlayerId::Player2),
            _ => None,
        }
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Player {}", self.number())
    }
}

/// 左手或右手。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Hand {
    Left,
    Right,
}

impl Hand {
    pub const ALL: [Hand; 2] = [Hand::Left, Hand::Right];

    pub fn as_str(self) -> &'static str {
        match self {
            Hand::Left => "left",
            Hand::Right => "right",
        }
    }
}

impl FromStr for Hand {
    type Err = RuleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "left" => Ok(Hand::Left),
            "right" => Ok(Hand::Right),
            _ => Err(RuleError::UnknownHand { name: s.to_string() }),
        }
    }
}

impl fmt::Display for Hand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 一名玩家的两只手。值为 0 表示该手已出局。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Hands {
    pub left: u8,
    pub right: u8,
}

impl Hands {
    pub fn new(left: u8, right: u8) -> Self {
        Self { left, right }
    }

    pub fn get(&self, hand: Hand) -> u8 {
        match hand {
            Hand::Left => self.left,
            Hand::Right => self.right,
        }
    }

    pub fn set(&mut self, hand: Hand, value: u8) {
        match hand {
            Hand::Left => self.left = value,
            Hand::Right => self.right = value,
        }
    }

    pub fn is_active(&self, hand: Hand) -> bool {
        self.get(hand) > 0
    }

    pub fn is_alive(&self) -> bool {
        self.left > 0 || self.right > 0
    }

    pub fn total(&self) -> u16 {
        u16::from(self.left) + u16::from(self.right)
    }

    /// 被攻击后的新值：超过上限按取模回绕，恰好整除时归零。
    pub fn struck(value: u8, attack: u8) -> u8 {
        ((u16::from(value) + u16::from(attack)) % u16::from(MAX_FINGERS)) as u8
    }
}

impl Default for Hands {
    fn default() -> Self {
        Self::new(STARTING_FINGERS, STARTING_FINGERS)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum VictoryReason {
    HandsEliminated { loser: PlayerId },
    NoLegalMoves { loser: PlayerId },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct VictoryState {
    pub winner: PlayerId,
    pub reason: VictoryReason,
}

/// 游戏事件流。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum GameEvent {
    AttackResolved {
        player: PlayerId,
        attacking_hand: Hand,
        target_hand: Hand,
        attack_value: u8,
        before: u8,
        after: u8,
    },
    HandEliminated {
        player: PlayerId,
        hand: Hand,
    },
    FingersSplit {
        player: PlayerId,
        before: Hands,
        after: Hands,
    },
    TurnPassed {
        next: PlayerId,
    },
    GameWon {
        winner: PlayerId,
        reason: VictoryReason,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum IntegrityError {
    HandOutOfRange {
        player: PlayerId,
        hand: Hand,
        value: u8,
    },
    InconsistentOutcome {
        winner: PlayerId,
    },
}

impl fmt::Display for IntegrityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IntegrityError::HandOutOfRange {
                player,
                hand,
                value,
            } => write!(f, "{player} {hand} hand holds {value} fingers"),
            IntegrityError::InconsistentOutcome { winner } => {
                write!(f, "{winner} recorded as winner while the loser still has fingers")
            }
        }
    }
}

/// 游戏整体状态。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GameState {
    pub hands: [Hands; 2],
    pub current_player: PlayerId,
    pub turn: u32,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub event_log: Vec<GameEvent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outcome: Option<VictoryState>,
}

impl GameState {
    pub fn new() -> Self {
        Self::from_hands(Hands::default(), Hands::default(), PlayerId::Player1)
    }

    /// 以任意手指分布构造局面，常用于测试与残局。
    pub fn from_hands(player1: Hands, player2: Hands, current_player: PlayerId) -> Self {
        Self {
            hands: [player1, player2],
            current_player,
            turn: 1,
            event_log: Vec::new(),
            outcome: None,
        }
    }

    pub fn hands(&self, player: PlayerId) -> Hands {
        self.hands[player.index()]
    }

    pub fn hands_mut(&mut self, player: PlayerId) -> &mut Hands {
        &mut self.hands[player.index()]
    }

    pub fn p1_left(&self) -> u8 {
        self.hands[0].left
    }

    pub fn p1_right(&self) -> u8 {
        self.hands[0].right
    }

    pub fn p2_left(&self) -> u8 {
        self.hands[1].left
    }

    pub fn p2_right(&self) -> u8 {
        self.hands[1].right
    }

    pub fn is_finished(&self) -> bool {
        self.outcome.is_some()
    }

    pub fn winner(&self) -> Option<PlayerId> {
        self.outcome.as_ref().map(|outcome| outcome.winner)
    }

    pub fn record_event(&mut self, event: GameEvent) {
        if self.event_log.len() >= EVENT_LOG_LIMIT {
            let overflow = self.event_log.len() + 1 - EVENT_LOG_LIMIT;
            self.event_log.drain(..overflow);
        }
        self.event_log.push(event);
    }

    /// 当前行动方是否至少有一步合法攻击。
    pub fn has_legal_attack(&self, player: PlayerId) -> bool {
        self.hands(player).is_alive() && self.hands(player.opponent()).is_alive()
    }

    /// 用 `player` 的一只手攻击对手的一只手，不做合法性检查。
    pub fn strike(&mut self, player: PlayerId, attacking_hand: Hand, target_hand: Hand) -> Vec<GameEvent> {
        let attack_value = self.hands(player).get(attacking_hand);
        let defender = player.opponent();
        let before = self.hands(defender).get(target_hand);
        let after = Hands::struck(before, attack_value);
        self.hands_mut(defender).set(target_hand, after);

        let mut events = vec![GameEvent::AttackResolved {
            player,
            attacking_hand,
            target_hand,
            attack_value,
            before,
            after,
        }];
        if after == 0 {
            events.push(GameEvent::HandEliminated {
                player: defender,
                hand: target_hand,
            });
        }
        for event in &events {
            self.record_event(event.clone());
        }
        events
    }

    pub fn redistribute(&mut self, player: PlayerId, left: u8, right: u8) -> GameEvent {
        let before = self.hands(player);
        let after = Hands::new(left, right);
        *self.hands_mut(player) = after;
        let event = GameEvent::FingersSplit {
            player,
            before,
            after,
        };
        self.record_event(event.clone());
        event
    }

    pub fn pass_turn(&mut self) -> GameEvent {
        self.current_player = self.current_player.opponent();
        self.turn += 1;
        let event = GameEvent::TurnPassed {
            next: self.current_player,
        };
        self.record_event(event.clone());
        event
    }

    /// 存活判定：一方两只手都为 0 时另一方获胜。
    pub fn evaluate_victory(&mut self) -> Option<VictoryState> {
        if let Some(outcome) = &self.outcome {
            return Some(outcome.clone());
        }

        if !self.hands(PlayerId::Player1).is_alive() {
            let loser = PlayerId::Player1;
            return Some(self.declare_victory(loser.opponent(), VictoryReason::HandsEliminated { loser }));
        }
        if !self.hands(PlayerId::Player2).is_alive() {
            let loser = PlayerId::Player2;
            return Some(self.declare_victory(loser.opponent(), VictoryReason::HandsEliminated { loser }));
        }

        None
    }

    pub fn declare_victory(&mut self, winner: PlayerId, reason: VictoryReason) -> VictoryState {
        let victory = VictoryState { winner, reason };
        if self.outcome.is_none() {
            self.record_event(GameEvent::GameWon {
                winner: victory.winner,
                reason: victory.reason.clone(),
            });
            self.outcome = Some(victory.clone());
        }
        victory
    }

    pub fn integrity_check(&self) -> Result<(), IntegrityError> {
        for player in [PlayerId::Player1, PlayerId::Player2] {
            let hands = self.hands(player);
            for hand in Hand::ALL {
                let value = hands.get(hand);
                if value >= MAX_FINGERS {
                    return Err(IntegrityError::HandOutOfRange {
                        player,
                        hand,
                        value,
                    });
                }
            }
        }

        if let Some(outcome) = &self.outcome {
            let loser = match &outcome.reason {
                VictoryReason::HandsEliminated { loser } | VictoryReason::NoLegalMoves { loser } => *loser,
            };
            if loser == outcome.winner
                || self.hands(loser).is_alive()
                || !self.hands(outcome.winner).is_alive()
            {
                return Err(IntegrityError::InconsistentOutcome {
                    winner: outcome.winner,
                });
            }
        }

        Ok(())
    }
}

impl Default for GameState {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for GameState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Player 1: Left={}, Right={}", self.p1_left(), self.p1_right())?;
        writeln!(f, "Player 2: Left={}, Right={}", self.p2_left(), self.p2_right())?;
        write!(f, "Current Player: {}", self.current_player.number())?;
        if let Some(winner) = self.winner() {
            write!(f, "\nGame Over: {winner} wins")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_game_starts_with_one_finger_everywhere() {
        let state = GameState::new();
        assert_eq!(state.hands(PlayerId::Player1), Hands::new(1, 1));
        assert_eq!(state.hands(PlayerId::Player2), Hands::new(1, 1));
        assert_eq!(state.current_player, PlayerId::Player1);
        assert!(!state.is_finished());
        assert_eq!(state.winner(), None);
    }

    #[test]
    fn hand_names_parse_case_insensitively() {
        assert_eq!("LEFT".parse::<Hand>(), Ok(Hand::Left));
        assert_eq!(" Right ".parse::<Hand>(), Ok(Hand::Right));
        assert_eq!(
            "thumb".parse::<Hand>(),
            Err(RuleError::UnknownHand {
                name: "thumb".into()
            })
        );
    }

    #[test]
    fn strike_wraps_on_multiples_of_five() {
        assert_eq!(Hands::struck(1, 1), 2);
        assert_eq!(Hands::struck(2, 3), 0);
        assert_eq!(Hands::struck(4, 3), 2);
        assert_eq!(Hands::struck(4, 4), 3);

        let mut state = GameState::from_hands(Hands::new(3, 1), Hands::new(2, 1), PlayerId::Player1);
        let events = state.strike(PlayerId::Player1, Hand::Left, Hand::Left);
        assert_eq!(state.p2_left(), 0);
        assert!(
            events.iter().any(|event| matches!(
                event,
                GameEvent::HandEliminated {
                    player: PlayerId::Player2,
                    hand: Hand::Left
                }
            )),
            "a hand landing on five should be reported as eliminated"
        );
    }

    #[test]
    fn victory_is_declared_once() {
        let mut state = GameState::from_hands(Hands::new(0, 0), Hands::new(1, 2), PlayerId::Player2);
        let first = state.evaluate_victory().expect("player 1 has no fingers left");
        assert_eq!(first.winner, PlayerId::Player2);

        let again = state.evaluate_victory().expect("outcome is sticky");
        assert_eq!(again, first);
        let won_events = state
            .event_log
            .iter()
            .filter(|event| matches!(event, GameEvent::GameWon { .. }))
            .count();
        assert_eq!(won_events, 1);
    }

    #[test]
    fn integrity_check_rejects_out_of_range_hands() {
        let state = GameState::from_hands(Hands::new(5, 1), Hands::new(1, 1), PlayerId::Player1);
        assert_eq!(
            state.integrity_check(),
            Err(IntegrityError::HandOutOfRange {
                player: PlayerId::Player1,
                hand: Hand::Left,
                value: 5
            })
        );
    }

    #[test]
    fn integrity_check_rejects_bogus_outcome() {
        let mut state = GameState::new();
        state.outcome = Some(VictoryState {
            winner: PlayerId::Player1,
            reason: VictoryReason::HandsEliminated {
                loser: PlayerId::Player2,
            },
        });
        assert!(matches!(
            state.integrity_check(),
            Err(IntegrityError::InconsistentOutcome { .. })
        ));
    }

    #[test]
    fn integrity_check_rejects_outcome_naming_the_wrong_loser() {
        let mut state = GameState::from_hands(Hands::new(0, 0), Hands::new(1, 1), PlayerId::Player1);
        state.outcome = Some(VictoryState {
            winner: PlayerId::Player1,
            reason: VictoryReason::HandsEliminated {
                loser: PlayerId::Player2,
            },
        });
        assert_eq!(
            state.integrity_check(),
            Err(IntegrityError::InconsistentOutcome {
                winner: PlayerId::Player1
            })
        );

        state.outcome = Some(VictoryState {
            winner: PlayerId::Player2,
            reason: VictoryReason::NoLegalMoves {
                loser: PlayerId::Player1,
            },
        });
        assert_eq!(state.integrity_check(), Ok(()));
    }

    #[test]
    fn hand_arithmetic_tolerates_out_of_range_values() {
        assert_eq!(Hands::struck(u8::MAX, u8::MAX), 0);
        assert_eq!(Hands::struck(200, 3), 3);
        assert_eq!(Hands::new(u8::MAX, u8::MAX).total(), 510);
    }

    #[test]
    fn event_log_keeps_only_the_latest_events() {
        let mut state = GameState::from_hands(Hands::new(2, 2), Hands::new(2, 2), PlayerId::Player1);
        for _ in 0..EVENT_LOG_LIMIT {
            state.redistribute(state.current_player, 1, 3);
            state.pass_turn();
        }
        assert_eq!(state.event_log.len(), EVENT_LOG_LIMIT);
        assert_eq!(
            state.event_log.last(),
            Some(&GameEvent::TurnPassed {
                next: PlayerId::Player1
            })
        );
    }

    #[test]
    fn display_matches_console_dump() {
        let mut state = GameState::from_hands(Hands::new(0, 3), Hands::new(0, 0), PlayerId::Player1);
        assert_eq!(
            state.to_string(),
            "Player 1: Left=0, Right=3\nPlayer 2: Left=0, Right=0\nCurrent Player: 1"
        );
        state.evaluate_victory();
        assert!(state.to_string().ends_with("Game Over: Player 1 wins"));
    }

    #[test]
    fn state_round_trips_through_json() {
        let mut state = GameState::from_hands(Hands::new(2, 4), Hands::new(0, 1), PlayerId::Player2);
        state.pass_turn();
        let json = serde_json::to_string(&state).expect("state should serialize");
        assert!(json.contains("\"current_player\":\"player1\""));
        let back: GameState = serde_json::from_str(&json).expect("state should deserialize");
        assert_eq!(back, state);
    }
}

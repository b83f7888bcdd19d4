use std::str::FromStr;

use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::game::{AttackAction, GameState, Hand, Hands, PlayerId};

/// 玩家 2（AI，极大方）获胜时的分数。
pub const WIN_SCORE: i32 = 100;
/// 玩家 2 落败时的分数。
pub const LOSE_SCORE: i32 = -100;
/// 搜索的极大方，也是 AI 执子的一方。
pub const AI_PLAYER: PlayerId = PlayerId::Player2;

/// 搜索专用的局面快照。按值复制，与引擎持有的规范局面互不影响。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Snapshot {
    pub player1: Hands,
    pub player2: Hands,
    pub current_player: PlayerId,
}

impl Snapshot {
    pub fn new(player1: Hands, player2: Hands, current_player: PlayerId) -> Self {
        Self {
            player1,
            player2,
            current_player,
        }
    }

    pub fn hands(&self, player: PlayerId) -> Hands {
        match player {
            PlayerId::Player1 => self.player1,
            PlayerId::Player2 => self.player2,
        }
    }

    fn hands_mut(&mut self, player: PlayerId) -> &mut Hands {
        match player {
            PlayerId::Player1 => &mut self.player1,
            PlayerId::Player2 => &mut self.player2,
        }
    }
}

impl From<&GameState> for Snapshot {
    fn from(state: &GameState) -> Self {
        Self::new(
            state.hands(PlayerId::Player1),
            state.hands(PlayerId::Player2),
            state.current_player,
        )
    }
}

/// 行动方在快照中的合法攻击，顺序固定（左→左、左→右、右→左、右→右），
/// 同分时以此顺序决胜。
pub fn enumerate_legal_moves(snapshot: &Snapshot) -> Vec<AttackAction> {
    let mover = snapshot.hands(snapshot.current_player);
    let defender = snapshot.hands(snapshot.current_player.opponent());
    let mut moves = Vec::with_capacity(4);
    for attacking_hand in Hand::ALL {
        if !mover.is_active(attacking_hand) {
            continue;
        }
        for target_hand in Hand::ALL {
            if defender.is_active(target_hand) {
                moves.push(AttackAction::new(attacking_hand, target_hand));
            }
        }
    }
    moves
}

/// 纯函数：返回执行攻击后的新快照；目标手已出局时返回 `None`。
pub fn simulate_move(snapshot: &Snapshot, action: AttackAction) -> Option<Snapshot> {
    let mover = snapshot.current_player;
    let defender = mover.opponent();
    let target = snapshot.hands(defender).get(action.target_hand);
    if target == 0 {
        return None;
    }
    let attack = snapshot.hands(mover).get(action.attacking_hand);

    let mut next = *snapshot;
    next.hands_mut(defender)
        .set(action.target_hand, Hands::struck(target, attack));
    next.current_player = defender;
    Some(next)
}

/// 叶节点估值：玩家 2 手指总数减去玩家 1 手指总数。
pub fn evaluate_state(snapshot: &Snapshot) -> i32 {
    snapshot.player2.total() as i32 - snapshot.player1.total() as i32
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AiStrategy {
    Random,
    Minimax,
}

impl FromStr for AiStrategy {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "random" => Ok(AiStrategy::Random),
            "minimax" | "alphabeta" | "search" => Ok(AiStrategy::Minimax),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AiDifficulty {
    Easy,
    Medium,
    Hard,
}

impl FromStr for AiDifficulty {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "easy" => Ok(AiDifficulty::Easy),
            "medium" | "normal" => Ok(AiDifficulty::Medium),
            "hard" | "expert" => Ok(AiDifficulty::Hard),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AiConfig {
    pub depth: u8,
    pub strategy: AiStrategy,
    pub pruning: bool,
}

impl AiConfig {
    pub fn from_difficulty(difficulty: AiDifficulty) -> Self {
        match difficulty {
            AiDifficulty::Easy => Self {
                depth: 0,
                strategy: AiStrategy::Random,
                pruning: true,
            },
            AiDifficulty::Medium => Self {
                depth: 2,
                strategy: AiStrategy::Minimax,
                pruning: true,
            },
            AiDifficulty::Hard => Self {
                depth: 4,
                strategy: AiStrategy::Minimax,
                pruning: true,
            },
        }
    }

    pub fn with_strategy(mut self, strategy: AiStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn with_depth(mut self, depth: u8) -> Self {
        self.depth = depth;
        self
    }

    /// 关闭 alpha-beta 剪枝，退化为穷举极小化极大搜索。
    pub fn without_pruning(mut self) -> Self {
        self.pruning = false;
        self
    }
}

impl Default for AiConfig {
    fn default() -> Self {
        AiConfig::from_difficulty(AiDifficulty::Medium)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AiDecision {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<AttackAction>,
    pub evaluation: i32,
    pub depth: u8,
    pub nodes: u64,
    pub strategy: AiStrategy,
}

struct SearchStats {
    nodes: u64,
}

impl SearchStats {
    fn new() -> Self {
        Self { nodes: 0 }
    }
}

pub struct AiAgent {
    config: AiConfig,
    rng: SmallRng,
}

impl AiAgent {
    pub fn new(config: AiConfig) -> Self {
        Self {
            config,
            rng: SmallRng::from_entropy(),
        }
    }

    pub fn with_seed(config: AiConfig, seed: u64) -> Self {
        Self {
            config,
            rng: SmallRng::seed_from_u64(seed),
        }
    }

    pub fn config(&self) -> &AiConfig {
        &self.config
    }

    /// 按配置为当前行动方选一步。对局已结束或无子可走时 `action` 为 `None`。
    /// 评分始终站在 `AI_PLAYER` 一方，轮到玩家 1 时选出的是对玩家 1 最差的一步。
    pub fn decide(&mut self, state: &GameState) -> AiDecision {
        let snapshot = Snapshot::from(state);
        let strategy = self.config.strategy;

        if state.is_finished() {
            return AiDecision {
                action: None,
                evaluation: evaluate_state(&snapshot),
                depth: 0,
                nodes: 0,
                strategy,
            };
        }

        match strategy {
            AiStrategy::Random => {
                let action = self.choose_random_move(&snapshot);
                let evaluation = action
                    .and_then(|action| simulate_move(&snapshot, action))
                    .map(|next| evaluate_state(&next))
                    .unwrap_or_else(|| evaluate_state(&snapshot));
                AiDecision {
                    action,
                    evaluation,
                    depth: 0,
                    nodes: 0,
                    strategy,
                }
            }
            AiStrategy::Minimax => {
                let mut stats = SearchStats::new();
                let depth = self.config.depth;
                let best = self.search_root(&snapshot, depth, &mut stats);
                AiDecision {
                    action: best.map(|(action, _)| action),
                    evaluation: best
                        .map(|(_, score)| score)
                        .unwrap_or_else(|| evaluate_state(&snapshot)),
                    depth,
                    nodes: stats.nodes,
                    strategy,
                }
            }
        }
    }

    pub fn choose_random_move(&mut self, snapshot: &Snapshot) -> Option<AttackAction> {
        enumerate_legal_moves(snapshot).choose(&mut self.rng).copied()
    }

    pub fn choose_best_move(&self, snapshot: &Snapshot, depth: u8) -> Option<AttackAction> {
        let mut stats = SearchStats::new();
        self.search_root(snapshot, depth, &mut stats)
            .map(|(action, _)| action)
    }

    pub fn minimax(&self, snapshot: &Snapshot, depth: u8, maximizing: bool, alpha: i32, beta: i32) -> i32 {
        let mut stats = SearchStats::new();
        self.minimax_rec(snapshot, depth, maximizing, alpha, beta, &mut stats)
    }

    fn search_root(
        &self,
        snapshot: &Snapshot,
        depth: u8,
        stats: &mut SearchStats,
    ) -> Option<(AttackAction, i32)> {
        let mut best: Option<(AttackAction, i32)> = None;

        for action in enumerate_legal_moves(snapshot) {
            let Some(child) = simulate_move(snapshot, action) else {
                continue;
            };
            let score = self.minimax_rec(
                &child,
                depth.saturating_sub(1),
                false,
                i32::MIN,
                i32::MAX,
                stats,
            );

            // 严格大于：同分保留先枚举到的着法。
            if best.map_or(true, |(_, best_score)| score > best_score) {
                best = Some((action, score));
            }
        }

        best
    }

    fn minimax_rec(
        &self,
        snapshot: &Snapshot,
        depth_remaining: u8,
        maximizing: bool,
        mut alpha: i32,
        mut beta: i32,
        stats: &mut SearchStats,
    ) -> i32 {
        stats.nodes += 1;

        if !snapshot.player2.is_alive() {
            return LOSE_SCORE;
        }
        if !snapshot.player1.is_alive() {
            return WIN_SCORE;
        }
        if depth_remaining == 0 {
            return evaluate_state(snapshot);
        }

        let successors: Vec<Snapshot> = enumerate_legal_moves(snapshot)
            .into_iter()
            .filter_map(|action| simulate_move(snapshot, action))
            .collect();
        if successors.is_empty() {
            return if maximizing { LOSE_SCORE } else { WIN_SCORE };
        }

        if maximizing {
            let mut value = i32::MIN;
            for child in &successors {
                let score =
                    self.minimax_rec(child, depth_remaining - 1, false, alpha, beta, stats);
                value = value.max(score);
                alpha = alpha.max(value);
                if self.config.pruning && beta <= alpha {
                    break;
                }
            }
            value
        } else {
            let mut value = i32::MAX;
            for child in &successors {
                let score =
                    self.minimax_rec(child, depth_remaining - 1, true, alpha, beta, stats);
                value = value.min(score);
                beta = beta.min(value);
                if self.config.pruning && beta <= alpha {
                    break;
                }
            }
            value
        }
    }
}

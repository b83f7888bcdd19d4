//! AI 算法模块（随机走子与带 alpha-beta 剪枝的极小化极大搜索）。

pub mod minimax;

pub use minimax::{
    enumerate_legal_moves, evaluate_state, simulate_move, AiAgent, AiConfig, AiDecision,
    AiDifficulty, AiStrategy, Snapshot, AI_PLAYER, LOSE_SCORE, WIN_SCORE,
};

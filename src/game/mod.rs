//! 游戏核心逻辑模块（局面、规则引擎、规范局面的持有者）。

pub mod engine;
pub mod rules;
pub mod state;

pub use engine::ChopsticksGame;
pub use rules::{
    AttackAction,
    GameAction,
    RuleEngine,
    RuleError,
    RuleResolution,
    SplitAction,
    TerminalPolicy,
};
pub use state::{
    GameEvent,
    GameState,
    Hand,
    Hands,
    IntegrityError,
    PlayerId,
    VictoryReason,
    VictoryState,
    EVENT_LOG_LIMIT,
    MAX_FINGERS,
    STARTING_FINGERS,
};

//! Combat core - problems, damage, the session state machine and rewards
//!
//! Everything here is synchronous and deterministic given an injected
//! random source and wall-clock instant. The engine crate drives sessions in
//! real time.

pub mod damage;
pub mod log;
pub mod outcome;
pub mod problem;
pub mod rewards;
pub mod schedule;
pub mod selector;
pub mod session;
pub mod view;

pub use damage::{
    calculate_damage_reduction, monster_attack_damage, player_attack_damage, DamageReduction,
    MAX_DEFENSE_PERCENT,
};
pub use log::{BattleLog, LogEntry, LogKind};
pub use outcome::{CombatOutcome, CombatStats, RewardReceipt, Settlement, SkillProgressResult};
pub use problem::{Operation, Problem};
pub use rewards::{CombatResult, CombatRewards};
pub use schedule::{TaskArena, TaskHandle, TaskKind};
pub use selector::{recommended_skill_level, MonsterSelector, SkillWarning, StartCheck};
pub use session::{
    round_time_limit, AnswerResult, ClockEvent, CombatSession, CombatStatus, Combatant, Round,
    RoundPhase,
};
pub use view::CombatView;

extern crate self as mathquest_domain;

pub mod aggregates;
pub mod combat;
pub mod entities;
pub mod error;
pub mod ids;
pub mod value_objects;

pub use aggregates::{Character, CharacterData, CharacterPatch};
pub use entities::{is_monster_available, DefeatedMonster, EquipmentSlot, Item, Monster};
pub use error::DomainError;

// Re-export ID types
pub use ids::{CharacterId, CombatSessionId, ItemId, MonsterId, OutcomeId, UserId};

pub use value_objects::{
    CharacterName, CombatRules, Difficulty, ItemName, MonsterLevel, MonsterName, ProblemSource,
    MAX_LEVEL, MIN_LEVEL,
};

pub use combat::{
    AnswerResult, BattleLog, ClockEvent, CombatOutcome, CombatResult, CombatRewards,
    CombatSession, CombatStats, CombatStatus, CombatView, Combatant, DamageReduction, LogEntry,
    LogKind, MonsterSelector, Problem, RewardReceipt, SkillProgressResult, StartCheck,
};

//! Value objects - immutable, validated by construction

mod combat_rules;
mod level;
mod names;

pub use combat_rules::{CombatRules, ProblemSource};
pub use level::{Difficulty, MonsterLevel, MAX_LEVEL, MIN_LEVEL};
pub use names::{CharacterName, ItemName, MonsterName};

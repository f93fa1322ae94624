//! Combat use cases.
//!
//! Start, drive, settle. The session itself lives in the domain crate; these
//! types wire it to storage, skills and achievements.

use std::sync::Arc;

mod availability;
mod driver;
mod end;
mod error;
mod resolve_rewards;
mod start;

#[cfg(test)]
mod tests;

pub use availability::{ListAvailableMonsters, MonsterAvailability};
pub use driver::{CombatCommand, CombatDriver, CombatHandle};
pub use end::{CombatSummary, EndCombat};
pub use error::CombatError;
pub use resolve_rewards::ResolveRewards;
pub use start::{StartCombat, StartedCombat};

/// Skill that combat progress is credited to.
pub const COMBAT_SKILL: &str = "Kamp";

/// Achievement counter bumped on every victory.
pub const MONSTERS_KILLED_STAT: &str = "monsters_killed";

/// Container for combat use cases.
pub struct CombatUseCases {
    pub start: Arc<StartCombat>,
    pub end: Arc<EndCombat>,
    pub rewards: Arc<ResolveRewards>,
    pub availability: Arc<ListAvailableMonsters>,
    pub driver: Arc<CombatDriver>,
}

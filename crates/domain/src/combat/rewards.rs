//! Reward tables for each combat result.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::value_objects::MonsterLevel;

/// Terminal result of a combat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CombatResult {
    Victory,
    Defeat,
    Retreat,
}

impl std::fmt::Display for CombatResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CombatResult::Victory => write!(f, "victory"),
            CombatResult::Defeat => write!(f, "defeat"),
            CombatResult::Retreat => write!(f, "retreat"),
        }
    }
}

/// Rewards earned by a combat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CombatRewards {
    pub xp: u64,
    pub gold: u64,
    pub skill_progress: u32,
    /// Percent of max energy the controller deducts; only set on retreat.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub energy_penalty: Option<u32>,
}

impl CombatRewards {
    /// `xp = 10 * level^2`, `gold = 5 * level + [0, 10 * level)`, `skill = level`.
    pub fn victory<R: Rng + ?Sized>(level: MonsterLevel, rng: &mut R) -> Self {
        let level = u64::from(level.value());
        Self {
            xp: 10 * level * level,
            gold: 5 * level + rng.gen_range(0..10 * level),
            skill_progress: level as u32,
            energy_penalty: None,
        }
    }

    /// `xp = 5 * level`, no gold, `skill = ceil(level / 2)`.
    pub fn defeat(level: MonsterLevel) -> Self {
        let level = u32::from(level.value());
        Self {
            xp: u64::from(5 * level),
            gold: 0,
            skill_progress: level.div_ceil(2),
            energy_penalty: None,
        }
    }

    /// `xp = 2 * level`, nothing else, plus the energy penalty.
    pub fn retreat(level: MonsterLevel, energy_penalty_percent: u32) -> Self {
        Self {
            xp: 2 * u64::from(level.value()),
            gold: 0,
            skill_progress: 0,
            energy_penalty: Some(energy_penalty_percent),
        }
    }
}

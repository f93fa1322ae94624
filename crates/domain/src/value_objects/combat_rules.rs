//! Tunable combat constants.
//!
//! `CombatRules` includes serde derives because the engine overlays values
//! from the environment and the runner prints the effective rules.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::DomainError;

/// How each round's problem is produced.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ProblemSource {
    /// Multiplication with operands bounded by `min(10, 4 + level)`.
    #[default]
    MonsterLevel,
    /// `generate_by_difficulty` with the monster level as difficulty.
    Difficulty,
}

impl std::fmt::Display for ProblemSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProblemSource::MonsterLevel => write!(f, "monster_level"),
            ProblemSource::Difficulty => write!(f, "difficulty"),
        }
    }
}

impl std::str::FromStr for ProblemSource {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "monster_level" | "level" => Ok(ProblemSource::MonsterLevel),
            "difficulty" => Ok(ProblemSource::Difficulty),
            _ => Err(DomainError::parse(format!(
                "Unknown problem source '{s}', expected monster_level or difficulty"
            ))),
        }
    }
}

fn default_energy_cost() -> u32 {
    10
}

fn default_tick_interval_ms() -> u64 {
    100
}

fn default_round_advance_delay_ms() -> u64 {
    1500
}

fn default_respawn_hours() -> i64 {
    10
}

fn default_retreat_energy_penalty_percent() -> u32 {
    50
}

/// Combat constants shared by the selector, the session and the controller.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CombatRules {
    /// Energy deducted when a combat starts.
    #[serde(default = "default_energy_cost")]
    pub energy_cost: u32,
    /// Countdown granularity.
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
    /// Pause between a resolved round and the next problem.
    #[serde(default = "default_round_advance_delay_ms")]
    pub round_advance_delay_ms: u64,
    /// Cooldown before a defeated monster may be fought again.
    #[serde(default = "default_respawn_hours")]
    pub respawn_hours: i64,
    /// Share of max energy lost on retreat.
    #[serde(default = "default_retreat_energy_penalty_percent")]
    pub retreat_energy_penalty_percent: u32,
    #[serde(default)]
    pub problem_source: ProblemSource,
}

impl Default for CombatRules {
    fn default() -> Self {
        Self {
            energy_cost: default_energy_cost(),
            tick_interval_ms: default_tick_interval_ms(),
            round_advance_delay_ms: default_round_advance_delay_ms(),
            respawn_hours: default_respawn_hours(),
            retreat_energy_penalty_percent: default_retreat_energy_penalty_percent(),
            problem_source: ProblemSource::default(),
        }
    }
}

impl CombatRules {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms.max(1))
    }

    pub fn round_advance_delay(&self) -> Duration {
        Duration::from_millis(self.round_advance_delay_ms)
    }

    pub fn respawn_window(&self) -> chrono::Duration {
        chrono::Duration::hours(self.respawn_hours)
    }
}

//! Damage formulas
//!
//! Outgoing damage rewards skill and speed; incoming damage is mitigated by
//! equipment defense, capped at 50% and never below 1.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Highest share of incoming damage defense can block, in percent.
pub const MAX_DEFENSE_PERCENT: u32 = 50;

/// Result of running incoming damage through defense.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DamageReduction {
    pub reduced_damage: u32,
    pub damage_blocked: u32,
    pub defense_percentage: u32,
}

/// Player damage before the speed and skill multiplier: `10 + floor(skill * 1.5)`.
pub fn base_player_damage(skill_level: u32) -> u32 {
    10 + skill_level * 3 / 2
}

/// Speed bonus in `[0, 1]`: the unused share of the round's time limit.
pub fn time_bonus(time_remaining: Duration, time_limit: Duration) -> f64 {
    if time_limit.is_zero() {
        return 0.0;
    }
    let used = time_limit.saturating_sub(time_remaining);
    (1.0 - used.as_secs_f64() / time_limit.as_secs_f64()).clamp(0.0, 1.0)
}

/// Damage of a correct answer.
///
/// `floor(base * (1 + time_bonus * 0.5 + skill * 0.08))`
pub fn player_attack_damage(skill_level: u32, time_remaining: Duration, time_limit: Duration) -> u32 {
    let base = f64::from(base_player_damage(skill_level));
    let multiplier =
        1.0 + time_bonus(time_remaining, time_limit) * 0.5 + f64::from(skill_level) * 0.08;
    (base * multiplier).floor() as u32
}

/// Flat monster hit before mitigation: `5 + floor(level * 1.5)`.
pub fn monster_attack_damage(level: u32) -> u32 {
    5 + level * 3 / 2
}

/// Mitigate incoming damage by total defense.
///
/// The defense share is `min(0.5, defense / 100)`; the blocked amount is
/// floored and the damage that lands is at least 1.
pub fn calculate_damage_reduction(incoming: u32, defense: u32) -> DamageReduction {
    let defense_percentage = defense.min(MAX_DEFENSE_PERCENT);
    let blocked = (u64::from(incoming) * u64::from(defense_percentage) / 100) as u32;
    let reduced_damage = incoming.saturating_sub(blocked).max(1);
    DamageReduction {
        reduced_damage,
        damage_blocked: incoming.saturating_sub(reduced_damage),
        defense_percentage,
    }
}

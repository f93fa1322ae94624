//! Engine settings with environment variable overrides.
//!
//! Supported environment variables:
//! - `MATHQUEST_ENERGY_COST`: energy paid to start a combat
//! - `MATHQUEST_TICK_INTERVAL_MS`: countdown granularity (range: 10-1000)
//! - `MATHQUEST_ROUND_ADVANCE_DELAY_MS`: pause between rounds
//! - `MATHQUEST_RESPAWN_HOURS`: defeated monster cooldown
//! - `MATHQUEST_RETREAT_ENERGY_PENALTY_PERCENT`: share of max energy lost on retreat (0-100)
//! - `MATHQUEST_PROBLEM_SOURCE`: `monster_level` or `difficulty`
//! - `MATHQUEST_LOG_TAIL`: battle log entries included in combat views
//!
//! Malformed or out-of-range values are logged and ignored.

use std::str::FromStr;

use mathquest_domain::{CombatRules, ProblemSource};
use serde::{Deserialize, Serialize};

fn default_log_tail() -> usize {
    8
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    #[serde(default)]
    pub rules: CombatRules,
    #[serde(default = "default_log_tail")]
    pub log_tail: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            rules: CombatRules::default(),
            log_tail: default_log_tail(),
        }
    }
}

impl Settings {
    /// Defaults overlaid with `MATHQUEST_*` process environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overlaid with whatever `lookup` returns for each key.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut settings = Self::default();
        let rules = &mut settings.rules;

        if let Some(v) = parse_in_range(&lookup, "MATHQUEST_ENERGY_COST", 0..=u32::MAX) {
            rules.energy_cost = v;
        }
        if let Some(v) = parse_in_range(&lookup, "MATHQUEST_TICK_INTERVAL_MS", 10..=1000) {
            rules.tick_interval_ms = v;
        }
        if let Some(v) = parse_in_range(&lookup, "MATHQUEST_ROUND_ADVANCE_DELAY_MS", 0..=60_000) {
            rules.round_advance_delay_ms = v;
        }
        if let Some(v) = parse_in_range(&lookup, "MATHQUEST_RESPAWN_HOURS", 0..=24 * 365) {
            rules.respawn_hours = v;
        }
        if let Some(v) =
            parse_in_range(&lookup, "MATHQUEST_RETREAT_ENERGY_PENALTY_PERCENT", 0..=100)
        {
            rules.retreat_energy_penalty_percent = v;
        }
        if let Some(raw) = lookup("MATHQUEST_PROBLEM_SOURCE") {
            match ProblemSource::from_str(&raw) {
                Ok(source) => {
                    rules.problem_source = source;
                    tracing::info!(%source, "Applied MATHQUEST_PROBLEM_SOURCE environment variable");
                }
                Err(e) => tracing::warn!(
                    val = %raw,
                    error = %e,
                    "Invalid MATHQUEST_PROBLEM_SOURCE, ignoring"
                ),
            }
        }
        if let Some(v) = parse_in_range(&lookup, "MATHQUEST_LOG_TAIL", 1..=100) {
            settings.log_tail = v;
        }

        settings
    }
}

fn parse_in_range<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    range: std::ops::RangeInclusive<T>,
) -> Option<T>
where
    T: FromStr + PartialOrd + std::fmt::Display + Copy,
{
    let raw = lookup(key)?;
    match raw.trim().parse::<T>() {
        Ok(value) if range.contains(&value) => {
            tracing::info!(key, %value, "Applied environment variable");
            Some(value)
        }
        Ok(value) => {
            tracing::warn!(
                key,
                %value,
                min = %range.start(),
                max = %range.end(),
                "Environment variable out of range, ignoring"
            );
            None
        }
        Err(_) => {
            tracing::warn!(key, val = %raw, "Environment variable is not a valid number, ignoring");
            None
        }
    }
}

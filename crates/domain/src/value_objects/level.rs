//! Bounded level scales used by combat.
//!
//! Both monster levels and problem difficulty live on the same 1-10 scale,
//! but they are validated differently: a monster level outside the range is
//! malformed data and is rejected, while a difficulty request is clamped.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::DomainError;

pub const MIN_LEVEL: u8 = 1;
pub const MAX_LEVEL: u8 = 10;

/// Level of a monster (1-10). Drives health, attack, round timer and rewards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct MonsterLevel(u8);

impl MonsterLevel {
    /// Create a validated monster level.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if the level is outside 1-10.
    pub fn new(level: u8) -> Result<Self, DomainError> {
        if !(MIN_LEVEL..=MAX_LEVEL).contains(&level) {
            return Err(DomainError::validation(format!(
                "Monster level must be between {MIN_LEVEL} and {MAX_LEVEL}, got {level}"
            )));
        }
        Ok(Self(level))
    }

    /// Clamp an arbitrary requested level into range.
    pub fn clamped(level: i64) -> Self {
        Self(level.clamp(MIN_LEVEL as i64, MAX_LEVEL as i64) as u8)
    }

    pub fn value(self) -> u8 {
        self.0
    }

    pub fn as_u32(self) -> u32 {
        u32::from(self.0)
    }
}

impl Default for MonsterLevel {
    fn default() -> Self {
        Self(MIN_LEVEL)
    }
}

impl fmt::Display for MonsterLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<u8> for MonsterLevel {
    type Error = DomainError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<MonsterLevel> for u8 {
    fn from(level: MonsterLevel) -> u8 {
        level.0
    }
}

/// Problem difficulty (1-10). Out-of-range requests are clamped, never rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "i64", into = "u8")]
pub struct Difficulty(u8);

impl Difficulty {
    pub fn clamped(difficulty: i64) -> Self {
        Self(difficulty.clamp(MIN_LEVEL as i64, MAX_LEVEL as i64) as u8)
    }

    pub fn value(self) -> u8 {
        self.0
    }
}

impl From<i64> for Difficulty {
    fn from(value: i64) -> Self {
        Self::clamped(value)
    }
}

impl From<Difficulty> for u8 {
    fn from(difficulty: Difficulty) -> u8 {
        difficulty.0
    }
}

impl From<MonsterLevel> for Difficulty {
    fn from(level: MonsterLevel) -> Self {
        Self(level.0)
    }
}

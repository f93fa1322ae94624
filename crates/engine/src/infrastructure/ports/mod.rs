//! Port traits for infrastructure boundaries.
//!
//! These are the only abstractions in the engine. Everything else is concrete types.
//! Ports exist for:
//! - Record storage (characters, monsters, defeat records)
//! - Skill progression and achievement counters owned by other services
//! - Clock/Random (for testing)

mod error;
mod external;
mod repos;
mod testing;

// =============================================================================
// Repository Ports
// =============================================================================
pub use repos::{CharacterRepo, DefeatedMonsterRepo, MonsterRepo};

// =============================================================================
// External Service Ports
// =============================================================================
pub use external::{AchievementPort, SkillProgressPort};

// =============================================================================
// Testability Ports
// =============================================================================
pub use testing::{ClockPort, RandomPort};

// =============================================================================
// Errors
// =============================================================================
pub use error::RepoError;

#[cfg(test)]
pub use external::{MockAchievementPort, MockSkillProgressPort};
#[cfg(test)]
pub use repos::{MockCharacterRepo, MockDefeatedMonsterRepo, MockMonsterRepo};
#[cfg(test)]
pub use testing::{MockClockPort, MockRandomPort};

//! Combat operation errors.

use chrono::{DateTime, Utc};
use mathquest_domain::{DomainError, MonsterLevel};

use crate::infrastructure::ports::RepoError;

/// Errors that can occur around a combat.
///
/// All of them are raised before a session exists or before any reward was
/// applied; nothing is left half-done.
#[derive(Debug, thiserror::Error)]
pub enum CombatError {
    #[error("Not enough energy: {required} required, {available} available")]
    InsufficientEnergy { required: u32, available: u32 },
    #[error("No monster found at level {0}")]
    MonsterNotFound(MonsterLevel),
    #[error("Monster is still recovering until {respawn_at}")]
    MonsterUnavailable { respawn_at: DateTime<Utc> },
    #[error("Character not found")]
    CharacterNotFound,
    #[error("Validation error: {0}")]
    Validation(#[from] DomainError),
    #[error("Repository error: {0}")]
    Repo(#[from] RepoError),
}

//! Ports for services the combat core calls but does not own.

use async_trait::async_trait;
use mathquest_domain::{SkillProgressResult, UserId};

use super::error::RepoError;

/// Skill progression collaborator.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SkillProgressPort: Send + Sync {
    async fn skill_level(&self, user_id: UserId, skill: &str) -> Result<u32, RepoError>;

    async fn increase_skill_progress(
        &self,
        user_id: UserId,
        skill: &str,
        amount: u32,
    ) -> Result<SkillProgressResult, RepoError>;
}

/// Per-user achievement counters. Failures are never fatal to callers.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AchievementPort: Send + Sync {
    async fn increment_user_stat(
        &self,
        user_id: UserId,
        stat_key: &str,
        amount: u64,
    ) -> Result<(), RepoError>;
}

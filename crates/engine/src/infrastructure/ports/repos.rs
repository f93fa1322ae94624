//! Repository port traits for record storage.

use async_trait::async_trait;
use mathquest_domain::{
    Character, CharacterPatch, DefeatedMonster, Monster, MonsterId, MonsterLevel, UserId,
};

use super::error::RepoError;

// =============================================================================
// Database Ports (one per entity type)
// =============================================================================

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CharacterRepo: Send + Sync {
    /// The active character of a user.
    async fn get_for_user(&self, user_id: UserId) -> Result<Option<Character>, RepoError>;

    /// Apply absolute field values and return the stored character.
    ///
    /// Re-applying the same patch must leave the character unchanged.
    async fn update(
        &self,
        user_id: UserId,
        patch: CharacterPatch,
    ) -> Result<Character, RepoError>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MonsterRepo: Send + Sync {
    async fn get(&self, id: MonsterId) -> Result<Option<Monster>, RepoError>;
    async fn find_by_level(&self, level: MonsterLevel) -> Result<Vec<Monster>, RepoError>;
    async fn list(&self) -> Result<Vec<Monster>, RepoError>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DefeatedMonsterRepo: Send + Sync {
    async fn get(
        &self,
        user_id: UserId,
        monster_id: MonsterId,
    ) -> Result<Option<DefeatedMonster>, RepoError>;

    /// Insert or overwrite the record for `(user_id, monster_id)`.
    async fn upsert(&self, record: &DefeatedMonster) -> Result<(), RepoError>;

    async fn list_for_user(&self, user_id: UserId) -> Result<Vec<DefeatedMonster>, RepoError>;
}

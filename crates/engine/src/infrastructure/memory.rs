//! In-memory adapters for every port.
//!
//! Used by the terminal runner and by integration tests. Keys mirror the
//! uniqueness constraints a real store would enforce.

use async_trait::async_trait;
use dashmap::DashMap;
use mathquest_domain::{
    Character, CharacterPatch, DefeatedMonster, Monster, MonsterId, MonsterLevel,
    SkillProgressResult, UserId,
};
use tokio::sync::RwLock;

use crate::infrastructure::ports::{
    AchievementPort, CharacterRepo, DefeatedMonsterRepo, MonsterRepo, RepoError,
    SkillProgressPort,
};

// =============================================================================
// Characters
// =============================================================================

#[derive(Default)]
pub struct InMemoryCharacterRepo {
    characters: DashMap<UserId, Character>,
}

impl InMemoryCharacterRepo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, character: Character) {
        self.characters.insert(character.user_id(), character);
    }
}

#[async_trait]
impl CharacterRepo for InMemoryCharacterRepo {
    async fn get_for_user(&self, user_id: UserId) -> Result<Option<Character>, RepoError> {
        Ok(self.characters.get(&user_id).map(|c| c.clone()))
    }

    async fn update(
        &self,
        user_id: UserId,
        patch: CharacterPatch,
    ) -> Result<Character, RepoError> {
        let mut entry = self
            .characters
            .get_mut(&user_id)
            .ok_or_else(|| RepoError::not_found("Character", user_id))?;
        entry.apply(&patch);
        Ok(entry.clone())
    }
}

// =============================================================================
// Monsters
// =============================================================================

#[derive(Default)]
pub struct InMemoryMonsterRepo {
    monsters: RwLock<Vec<Monster>>,
}

impl InMemoryMonsterRepo {
    pub fn new(monsters: Vec<Monster>) -> Self {
        Self {
            monsters: RwLock::new(monsters),
        }
    }

    pub async fn insert(&self, monster: Monster) {
        self.monsters.write().await.push(monster);
    }
}

#[async_trait]
impl MonsterRepo for InMemoryMonsterRepo {
    async fn get(&self, id: MonsterId) -> Result<Option<Monster>, RepoError> {
        Ok(self
            .monsters
            .read()
            .await
            .iter()
            .find(|m| m.id == id)
            .cloned())
    }

    async fn find_by_level(&self, level: MonsterLevel) -> Result<Vec<Monster>, RepoError> {
        Ok(self
            .monsters
            .read()
            .await
            .iter()
            .filter(|m| m.level == level)
            .cloned()
            .collect())
    }

    async fn list(&self) -> Result<Vec<Monster>, RepoError> {
        let mut monsters = self.monsters.read().await.clone();
        monsters.sort_by_key(|m| m.level);
        Ok(monsters)
    }
}

// =============================================================================
// Defeated monsters
// =============================================================================

#[derive(Default)]
pub struct InMemoryDefeatedMonsterRepo {
    records: DashMap<(UserId, MonsterId), DefeatedMonster>,
}

impl InMemoryDefeatedMonsterRepo {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DefeatedMonsterRepo for InMemoryDefeatedMonsterRepo {
    async fn get(
        &self,
        user_id: UserId,
        monster_id: MonsterId,
    ) -> Result<Option<DefeatedMonster>, RepoError> {
        Ok(self
            .records
            .get(&(user_id, monster_id))
            .map(|r| r.clone()))
    }

    async fn upsert(&self, record: &DefeatedMonster) -> Result<(), RepoError> {
        self.records.insert(record.key(), record.clone());
        Ok(())
    }

    async fn list_for_user(&self, user_id: UserId) -> Result<Vec<DefeatedMonster>, RepoError> {
        let mut records: Vec<_> = self
            .records
            .iter()
            .filter(|r| r.user_id == user_id)
            .map(|r| r.value().clone())
            .collect();
        records.sort_by_key(|r| r.defeated_at);
        Ok(records)
    }
}

// =============================================================================
// Skills
// =============================================================================

/// Level a skill has before any progress was recorded.
pub const STARTING_SKILL_LEVEL: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct SkillState {
    level: u32,
    progress: u32,
}

impl Default for SkillState {
    fn default() -> Self {
        Self {
            level: STARTING_SKILL_LEVEL,
            progress: 0,
        }
    }
}

/// Skill store that levels a skill up each time its progress reaches
/// `level * 10`. Leftover progress carries over.
#[derive(Default)]
pub struct InMemorySkillStore {
    skills: DashMap<(UserId, String), SkillState>,
}

impl InMemorySkillStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_level(&self, user_id: UserId, skill: &str, level: u32) {
        self.skills.insert(
            (user_id, skill.to_string()),
            SkillState { level, progress: 0 },
        );
    }

    pub fn progress(&self, user_id: UserId, skill: &str) -> u32 {
        self.skills
            .get(&(user_id, skill.to_string()))
            .map_or(0, |s| s.progress)
    }
}

#[async_trait]
impl SkillProgressPort for InMemorySkillStore {
    async fn skill_level(&self, user_id: UserId, skill: &str) -> Result<u32, RepoError> {
        Ok(self
            .skills
            .get(&(user_id, skill.to_string()))
            .map_or(STARTING_SKILL_LEVEL, |s| s.level))
    }

    async fn increase_skill_progress(
        &self,
        user_id: UserId,
        skill: &str,
        amount: u32,
    ) -> Result<SkillProgressResult, RepoError> {
        let mut state = self.skills.entry((user_id, skill.to_string())).or_default();
        state.progress = state.progress.saturating_add(amount);

        let mut leveled_up = false;
        while state.level > 0 && state.progress >= state.level * 10 {
            state.progress -= state.level * 10;
            state.level += 1;
            leveled_up = true;
        }

        Ok(SkillProgressResult {
            success: true,
            leveled_up,
            new_level: state.level,
        })
    }
}

// =============================================================================
// Achievements
// =============================================================================

#[derive(Default)]
pub struct InMemoryAchievementStore {
    stats: DashMap<(UserId, String), u64>,
}

impl InMemoryAchievementStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stat(&self, user_id: UserId, stat_key: &str) -> u64 {
        self.stats
            .get(&(user_id, stat_key.to_string()))
            .map_or(0, |v| *v)
    }
}

#[async_trait]
impl AchievementPort for InMemoryAchievementStore {
    async fn increment_user_stat(
        &self,
        user_id: UserId,
        stat_key: &str,
        amount: u64,
    ) -> Result<(), RepoError> {
        *self
            .stats
            .entry((user_id, stat_key.to_string()))
            .or_insert(0) += amount;
        Ok(())
    }
}

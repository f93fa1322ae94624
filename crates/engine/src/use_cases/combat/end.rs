//! End combat use case.
//!
//! Settles an outcome through the reward resolver, persists the resulting
//! absolute character values and records the respawn cooldown on victory.
//! Persistence failures are logged; the summary still carries the values the
//! player earned and a later call retries the write.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use mathquest_domain::{
    Character, CombatOutcome, CombatResult, CombatRewards, CombatStats, CombatRules,
    DefeatedMonster, OutcomeId, RewardReceipt, UserId,
};
use serde::Serialize;

use crate::infrastructure::ports::{CharacterRepo, ClockPort, DefeatedMonsterRepo};

use super::error::CombatError;
use super::resolve_rewards::ResolveRewards;

/// What a finished combat did to the player.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CombatSummary {
    pub outcome_id: OutcomeId,
    pub result: CombatResult,
    pub monster_name: String,
    pub rewards: CombatRewards,
    pub stats: CombatStats,
    pub receipt: RewardReceipt,
    pub character: Character,
    /// False when the character store rejected the update
    pub persisted: bool,
    pub respawn_at: Option<DateTime<Utc>>,
}

pub struct EndCombat {
    character_repo: Arc<dyn CharacterRepo>,
    defeated_repo: Arc<dyn DefeatedMonsterRepo>,
    resolver: Arc<ResolveRewards>,
    clock: Arc<dyn ClockPort>,
    rules: CombatRules,
}

impl EndCombat {
    pub fn new(
        character_repo: Arc<dyn CharacterRepo>,
        defeated_repo: Arc<dyn DefeatedMonsterRepo>,
        resolver: Arc<ResolveRewards>,
        clock: Arc<dyn ClockPort>,
        rules: CombatRules,
    ) -> Self {
        Self {
            character_repo,
            defeated_repo,
            resolver,
            clock,
            rules,
        }
    }

    /// Apply `outcome` for `user_id`.
    ///
    /// Rewards are resolved once. The character write is retried on later
    /// calls until the store accepts it; after that, calls perform no writes
    /// and return the same summary.
    pub async fn execute(
        &self,
        user_id: UserId,
        outcome: &mut CombatOutcome,
    ) -> Result<CombatSummary, CombatError> {
        let mut character = self
            .character_repo
            .get_for_user(user_id)
            .await?
            .ok_or(CombatError::CharacterNotFound)?;

        let receipt = match outcome.receipt().cloned() {
            Some(receipt) if outcome.is_persisted() => {
                tracing::debug!(outcome_id = %outcome.id(), "Combat already ended, returning receipt");
                // Patch values are absolute
                character.apply(&receipt.character_patch);
                let respawn_at = outcome.respawn_at();
                return Ok(self.summary(outcome, receipt, character, true, respawn_at));
            }
            Some(receipt) => {
                tracing::info!(outcome_id = %outcome.id(), "Retrying combat persistence");
                receipt
            }
            None => self.resolver.execute(user_id, outcome, &character).await?,
        };

        let (character, persisted) = match self
            .character_repo
            .update(user_id, receipt.character_patch)
            .await
        {
            Ok(updated) => (updated, true),
            Err(e) => {
                tracing::error!(
                    user_id = %user_id,
                    outcome_id = %outcome.id(),
                    error = %e,
                    "Failed to persist character after combat"
                );
                character.apply(&receipt.character_patch);
                (character, false)
            }
        };

        let mut respawn_at = None;
        if outcome.result() == CombatResult::Victory {
            let record = DefeatedMonster::new(
                user_id,
                outcome.monster().id,
                self.clock.now(),
                self.rules.respawn_window(),
            );
            respawn_at = Some(record.respawn_at);
            if let Err(e) = self.defeated_repo.upsert(&record).await {
                tracing::warn!(
                    user_id = %user_id,
                    monster_id = %record.monster_id,
                    error = %e,
                    "Failed to record defeated monster"
                );
            }
        }

        if persisted {
            outcome.mark_persisted(respawn_at)?;
        }

        tracing::info!(
            user_id = %user_id,
            outcome = ?outcome.result(),
            monster_level = %outcome.stats().monster_level,
            damage_taken = outcome.stats().total_damage_taken,
            xp = receipt.xp_gained,
            gold = receipt.gold_gained,
            persisted,
            "Combat ended"
        );

        Ok(self.summary(outcome, receipt, character, persisted, respawn_at))
    }

    fn summary(
        &self,
        outcome: &CombatOutcome,
        receipt: RewardReceipt,
        character: Character,
        persisted: bool,
        respawn_at: Option<DateTime<Utc>>,
    ) -> CombatSummary {
        CombatSummary {
            outcome_id: outcome.id(),
            result: outcome.result(),
            monster_name: outcome.monster().name.to_string(),
            rewards: *outcome.rewards(),
            stats: *outcome.stats(),
            receipt,
            character,
            persisted,
            respawn_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::ports::{
        MockAchievementPort, MockCharacterRepo, MockClockPort, MockDefeatedMonsterRepo,
        MockSkillProgressPort, RepoError,
    };
    use chrono::TimeZone;
    use mathquest_domain::{
        CharacterName, CharacterPatch, CombatSessionId, Monster, MonsterLevel, MonsterName,
        SkillProgressResult,
    };
    use mockall::predicate::*;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 7, 4, 20, 0, 0).unwrap()
    }

    fn character(user_id: UserId) -> Character {
        Character::new(user_id, CharacterName::new("Gudrun").unwrap(), 100, 80)
            .unwrap()
            .with_health(90)
            .unwrap()
            .with_energy(70)
            .unwrap()
            .with_experience(10)
            .with_coins(3)
    }

    fn outcome(result: CombatResult, rewards: CombatRewards, damage_taken: u32) -> CombatOutcome {
        let level = MonsterLevel::new(2).unwrap();
        CombatOutcome::new(
            CombatSessionId::new(),
            result,
            Monster::new(MonsterName::new("Nokk").unwrap(), level),
            rewards,
            CombatStats {
                player_health_remaining: 90 - damage_taken,
                monster_level: level,
                total_damage_taken: damage_taken,
                total_damage_dealt: 0,
                total_damage_blocked: 0,
                rounds: 3,
            },
        )
    }

    fn resolver() -> Arc<ResolveRewards> {
        let mut skills = MockSkillProgressPort::new();
        skills.expect_increase_skill_progress().returning(|_, _, _| {
            Ok(SkillProgressResult {
                success: true,
                leveled_up: false,
                new_level: 1,
            })
        });
        let mut achievements = MockAchievementPort::new();
        achievements
            .expect_increment_user_stat()
            .returning(|_, _, _| Ok(()));
        Arc::new(ResolveRewards::new(Arc::new(skills), Arc::new(achievements)))
    }

    fn clock() -> Arc<MockClockPort> {
        let mut clock = MockClockPort::new();
        clock.expect_now().returning(now);
        Arc::new(clock)
    }

    #[tokio::test]
    async fn victory_persists_character_and_respawn_record() {
        let user_id = UserId::new();
        let mut characters = MockCharacterRepo::new();
        let mut defeated = MockDefeatedMonsterRepo::new();
        let expected_patch = CharacterPatch {
            health: Some(78),
            energy: None,
            experience: Some(50),
            coins: Some(23),
        };

        characters
            .expect_get_for_user()
            .returning(move |_| Ok(Some(character(user_id))));
        characters
            .expect_update()
            .with(eq(user_id), eq(expected_patch))
            .times(1)
            .returning(move |_, patch| {
                let mut c = character(user_id);
                c.apply(&patch);
                Ok(c)
            });
        defeated
            .expect_upsert()
            .withf(move |r| {
                r.user_id == user_id && r.respawn_at == now() + chrono::Duration::hours(10)
            })
            .times(1)
            .returning(|_| Ok(()));

        let end = EndCombat::new(
            Arc::new(characters),
            Arc::new(defeated),
            resolver(),
            clock(),
            CombatRules::default(),
        );
        let rewards = CombatRewards {
            xp: 40,
            gold: 20,
            skill_progress: 2,
            energy_penalty: None,
        };
        let mut outcome = outcome(CombatResult::Victory, rewards, 12);

        let summary = end.execute(user_id, &mut outcome).await.unwrap();
        assert!(summary.persisted);
        assert_eq!(summary.character.health(), 78);
        assert_eq!(summary.character.coins(), 23);
        assert_eq!(summary.respawn_at, Some(now() + chrono::Duration::hours(10)));
    }

    #[tokio::test]
    async fn retreat_deducts_energy_and_skips_respawn_record() {
        let user_id = UserId::new();
        let mut characters = MockCharacterRepo::new();
        let mut defeated = MockDefeatedMonsterRepo::new();

        characters
            .expect_get_for_user()
            .returning(move |_| Ok(Some(character(user_id))));
        characters
            .expect_update()
            .withf(|_, patch| patch.energy == Some(30) && patch.coins == Some(3))
            .times(1)
            .returning(move |_, patch| {
                let mut c = character(user_id);
                c.apply(&patch);
                Ok(c)
            });
        defeated.expect_upsert().never();

        let end = EndCombat::new(
            Arc::new(characters),
            Arc::new(defeated),
            resolver(),
            clock(),
            CombatRules::default(),
        );
        let mut outcome = outcome(
            CombatResult::Retreat,
            CombatRewards::retreat(MonsterLevel::new(2).unwrap(), 50),
            0,
        );

        let summary = end.execute(user_id, &mut outcome).await.unwrap();
        assert_eq!(summary.receipt.energy_lost, 40);
        assert_eq!(summary.character.energy(), 30);
        assert_eq!(summary.character.experience(), 14);
        assert!(summary.respawn_at.is_none());
    }

    #[tokio::test]
    async fn second_call_performs_no_writes() {
        let user_id = UserId::new();
        let mut characters = MockCharacterRepo::new();
        let mut defeated = MockDefeatedMonsterRepo::new();

        characters
            .expect_get_for_user()
            .times(2)
            .returning(move |_| Ok(Some(character(user_id))));
        characters
            .expect_update()
            .times(1)
            .returning(move |_, patch| {
                let mut c = character(user_id);
                c.apply(&patch);
                Ok(c)
            });
        defeated.expect_upsert().times(1).returning(|_| Ok(()));

        let end = EndCombat::new(
            Arc::new(characters),
            Arc::new(defeated),
            resolver(),
            clock(),
            CombatRules::default(),
        );
        let rewards = CombatRewards {
            xp: 40,
            gold: 15,
            skill_progress: 2,
            energy_penalty: None,
        };
        let mut outcome = outcome(CombatResult::Victory, rewards, 0);

        let first = end.execute(user_id, &mut outcome).await.unwrap();
        let second = end.execute(user_id, &mut outcome).await.unwrap();
        assert_eq!(first.receipt, second.receipt);
    }

    #[tokio::test]
    async fn failed_persistence_still_reports_earned_values() {
        let user_id = UserId::new();
        let mut characters = MockCharacterRepo::new();
        let mut defeated = MockDefeatedMonsterRepo::new();

        characters
            .expect_get_for_user()
            .returning(move |_| Ok(Some(character(user_id))));
        characters
            .expect_update()
            .returning(|_, _| Err(RepoError::database("update_character", "timeout")));
        defeated
            .expect_upsert()
            .returning(|_| Err(RepoError::database("upsert_defeated_monster", "timeout")));

        let end = EndCombat::new(
            Arc::new(characters),
            Arc::new(defeated),
            resolver(),
            clock(),
            CombatRules::default(),
        );
        let rewards = CombatRewards {
            xp: 40,
            gold: 15,
            skill_progress: 2,
            energy_penalty: None,
        };
        let mut outcome = outcome(CombatResult::Victory, rewards, 5);

        let summary = end.execute(user_id, &mut outcome).await.unwrap();
        assert!(!summary.persisted);
        assert_eq!(summary.character.health(), 85);
        assert_eq!(summary.character.experience(), 50);
        assert!(outcome.is_settled());
    }

    #[tokio::test]
    async fn failed_write_is_retried_on_next_call() {
        use std::sync::atomic::{AtomicUsize, Ordering};

        let user_id = UserId::new();
        let mut characters = MockCharacterRepo::new();
        let mut defeated = MockDefeatedMonsterRepo::new();
        let attempts = Arc::new(AtomicUsize::new(0));

        characters
            .expect_get_for_user()
            .times(3)
            .returning(move |_| Ok(Some(character(user_id))));
        let counter = attempts.clone();
        characters
            .expect_update()
            .times(2)
            .returning(move |_, patch| {
                if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                    return Err(RepoError::database("update_character", "timeout"));
                }
                let mut c = character(user_id);
                c.apply(&patch);
                Ok(c)
            });
        defeated.expect_upsert().times(2).returning(|_| Ok(()));

        let mut skills = MockSkillProgressPort::new();
        skills
            .expect_increase_skill_progress()
            .times(1)
            .returning(|_, _, _| {
                Ok(SkillProgressResult {
                    success: true,
                    leveled_up: false,
                    new_level: 1,
                })
            });
        let mut achievements = MockAchievementPort::new();
        achievements
            .expect_increment_user_stat()
            .times(1)
            .returning(|_, _, _| Ok(()));
        let resolver = Arc::new(ResolveRewards::new(Arc::new(skills), Arc::new(achievements)));

        let end = EndCombat::new(
            Arc::new(characters),
            Arc::new(defeated),
            resolver,
            clock(),
            CombatRules::default(),
        );
        let rewards = CombatRewards {
            xp: 40,
            gold: 15,
            skill_progress: 2,
            energy_penalty: None,
        };
        let mut outcome = outcome(CombatResult::Victory, rewards, 5);

        let first = end.execute(user_id, &mut outcome).await.unwrap();
        assert!(!first.persisted);
        assert!(!outcome.is_persisted());
        assert_eq!(first.character.experience(), 50);

        let second = end.execute(user_id, &mut outcome).await.unwrap();
        assert!(second.persisted);
        assert_eq!(second.receipt, first.receipt);
        assert_eq!(second.character.experience(), 50);
        assert_eq!(second.character.coins(), 18);
        assert_eq!(second.respawn_at, Some(now() + chrono::Duration::hours(10)));

        // Persisted now; only the read happens
        let third = end.execute(user_id, &mut outcome).await.unwrap();
        assert!(third.persisted);
        assert_eq!(third.character.experience(), 50);
        assert_eq!(third.character.health(), 85);
        assert_eq!(third.respawn_at, second.respawn_at);
        assert_eq!(attempts.load(Ordering::SeqCst), 2);
    }
}

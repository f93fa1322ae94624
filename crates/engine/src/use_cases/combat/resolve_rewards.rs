//! Reward resolver.
//!
//! Applies one combat outcome's side effects exactly once: skill progress,
//! the kill counter and the character values to persist. The outcome carries
//! its own settlement state, so a second call returns the stored receipt
//! without calling any collaborator again.

use std::sync::Arc;

use mathquest_domain::{Character, CombatOutcome, CombatResult, RewardReceipt, UserId};

use crate::infrastructure::ports::{AchievementPort, SkillProgressPort};

use super::error::CombatError;
use super::{COMBAT_SKILL, MONSTERS_KILLED_STAT};

pub struct ResolveRewards {
    skills: Arc<dyn SkillProgressPort>,
    achievements: Arc<dyn AchievementPort>,
}

impl ResolveRewards {
    pub fn new(skills: Arc<dyn SkillProgressPort>, achievements: Arc<dyn AchievementPort>) -> Self {
        Self {
            skills,
            achievements,
        }
    }

    /// Settle `outcome` for `character` and return what was applied.
    ///
    /// Collaborator failures are logged and recorded in the receipt; they
    /// never fail the call.
    pub async fn execute(
        &self,
        user_id: UserId,
        outcome: &mut CombatOutcome,
        character: &Character,
    ) -> Result<RewardReceipt, CombatError> {
        if let Some(receipt) = outcome.receipt() {
            tracing::debug!(outcome_id = %outcome.id(), "Rewards already applied");
            return Ok(receipt.clone());
        }

        let rewards = *outcome.rewards();
        let result = outcome.result();

        let mut skill = None;
        let mut skill_progress = 0;
        if result != CombatResult::Retreat && rewards.skill_progress > 0 {
            match self
                .skills
                .increase_skill_progress(user_id, COMBAT_SKILL, rewards.skill_progress)
                .await
            {
                Ok(progress) => {
                    if progress.leveled_up {
                        tracing::info!(
                            user_id = %user_id,
                            new_level = progress.new_level,
                            "Combat skill leveled up"
                        );
                    }
                    skill_progress = rewards.skill_progress;
                    skill = Some(progress);
                }
                Err(e) => {
                    tracing::warn!(
                        user_id = %user_id,
                        amount = rewards.skill_progress,
                        error = %e,
                        "Failed to add combat skill progress"
                    );
                }
            }
        }

        let mut achievement_recorded = false;
        if result == CombatResult::Victory {
            match self
                .achievements
                .increment_user_stat(user_id, MONSTERS_KILLED_STAT, 1)
                .await
            {
                Ok(()) => achievement_recorded = true,
                Err(e) => {
                    tracing::warn!(
                        user_id = %user_id,
                        stat = MONSTERS_KILLED_STAT,
                        error = %e,
                        "Failed to increment achievement counter"
                    );
                }
            }
        }

        let receipt = RewardReceipt {
            xp_gained: rewards.xp,
            gold_gained: rewards.gold,
            skill_progress,
            skill,
            achievement_recorded,
            energy_lost: outcome.energy_lost(character.max_energy()),
            character_patch: outcome.character_patch(character),
        };
        outcome.settle(receipt.clone())?;

        tracing::debug!(
            outcome_id = %outcome.id(),
            outcome = ?result,
            xp = receipt.xp_gained,
            gold = receipt.gold_gained,
            "Rewards applied"
        );
        Ok(receipt)
    }
}

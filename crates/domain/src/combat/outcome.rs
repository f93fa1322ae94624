//! Combat outcome and its settlement lifecycle
//!
//! An outcome starts `Pending` and moves to `RewardsApplied` exactly once,
//! carrying the receipt of what was applied. Re-processing a settled outcome
//! reads the receipt instead of repeating side effects. `Persisted` follows
//! once the character store accepted the receipt's values; until then the
//! write may be retried.
//!
//! Outcomes are deliberately not `Clone`: the latch lives in the instance.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::aggregates::{Character, CharacterPatch};
use crate::entities::Monster;
use crate::error::DomainError;
use crate::value_objects::MonsterLevel;
use crate::{CombatSessionId, OutcomeId};

use super::rewards::{CombatResult, CombatRewards};

/// Final numbers of a combat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CombatStats {
    pub player_health_remaining: u32,
    pub monster_level: MonsterLevel,
    pub total_damage_taken: u32,
    pub total_damage_dealt: u32,
    pub total_damage_blocked: u32,
    pub rounds: u32,
}

/// What the skill collaborator reported after adding progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkillProgressResult {
    pub success: bool,
    pub leveled_up: bool,
    pub new_level: u32,
}

/// Record of the reward effects applied for one outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RewardReceipt {
    pub xp_gained: u64,
    pub gold_gained: u64,
    /// Progress added to the combat skill (0 when not applied)
    pub skill_progress: u32,
    pub skill: Option<SkillProgressResult>,
    pub achievement_recorded: bool,
    /// Energy lost to the retreat penalty, for display
    pub energy_lost: u32,
    /// Absolute character values after the combat
    pub character_patch: CharacterPatch,
}

#[derive(Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum Settlement {
    Pending,
    RewardsApplied {
        receipt: RewardReceipt,
    },
    Persisted {
        receipt: RewardReceipt,
        respawn_at: Option<DateTime<Utc>>,
    },
}

/// Immutable terminal result of a combat session.
#[derive(Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CombatOutcome {
    id: OutcomeId,
    session_id: CombatSessionId,
    result: CombatResult,
    monster: Monster,
    rewards: CombatRewards,
    stats: CombatStats,
    settlement: Settlement,
}

impl CombatOutcome {
    pub fn new(
        session_id: CombatSessionId,
        result: CombatResult,
        monster: Monster,
        rewards: CombatRewards,
        stats: CombatStats,
    ) -> Self {
        Self {
            id: OutcomeId::new(),
            session_id,
            result,
            monster,
            rewards,
            stats,
            settlement: Settlement::Pending,
        }
    }

    pub fn id(&self) -> OutcomeId {
        self.id
    }

    pub fn session_id(&self) -> CombatSessionId {
        self.session_id
    }

    pub fn result(&self) -> CombatResult {
        self.result
    }

    pub fn monster(&self) -> &Monster {
        &self.monster
    }

    pub fn rewards(&self) -> &CombatRewards {
        &self.rewards
    }

    pub fn stats(&self) -> &CombatStats {
        &self.stats
    }

    pub fn is_settled(&self) -> bool {
        !matches!(self.settlement, Settlement::Pending)
    }

    /// True once the receipt's character values were stored.
    pub fn is_persisted(&self) -> bool {
        matches!(self.settlement, Settlement::Persisted { .. })
    }

    pub fn receipt(&self) -> Option<&RewardReceipt> {
        match &self.settlement {
            Settlement::RewardsApplied { receipt } | Settlement::Persisted { receipt, .. } => {
                Some(receipt)
            }
            Settlement::Pending => None,
        }
    }

    /// Respawn time recorded when the outcome was persisted.
    pub fn respawn_at(&self) -> Option<DateTime<Utc>> {
        match &self.settlement {
            Settlement::Persisted { respawn_at, .. } => *respawn_at,
            _ => None,
        }
    }

    /// Move to `RewardsApplied`. Fails if rewards were already applied.
    pub fn settle(&mut self, receipt: RewardReceipt) -> Result<(), DomainError> {
        if self.is_settled() {
            return Err(DomainError::invalid_state_transition(format!(
                "Rewards for outcome {} were already applied",
                self.id
            )));
        }
        self.settlement = Settlement::RewardsApplied { receipt };
        Ok(())
    }

    /// Move from `RewardsApplied` to `Persisted`.
    pub fn mark_persisted(&mut self, respawn_at: Option<DateTime<Utc>>) -> Result<(), DomainError> {
        let settlement = std::mem::replace(&mut self.settlement, Settlement::Pending);
        match settlement {
            Settlement::RewardsApplied { receipt } => {
                self.settlement = Settlement::Persisted {
                    receipt,
                    respawn_at,
                };
                Ok(())
            }
            other => {
                self.settlement = other;
                Err(DomainError::invalid_state_transition(format!(
                    "Outcome {} is not awaiting persistence",
                    self.id
                )))
            }
        }
    }

    /// Energy a retreat costs: the penalty share of `max_energy`, floored.
    pub fn energy_lost(&self, max_energy: u32) -> u32 {
        self.rewards
            .energy_penalty
            .map_or(0, |percent| (u64::from(max_energy) * u64::from(percent) / 100) as u32)
    }

    /// Absolute character values once this outcome is applied.
    ///
    /// Health loses the damage taken this session, retreat costs energy,
    /// and experience and gold are added. Pools floor at zero.
    pub fn character_patch(&self, character: &Character) -> CharacterPatch {
        let energy = match self.result {
            CombatResult::Retreat => Some(
                character
                    .energy()
                    .saturating_sub(self.energy_lost(character.max_energy())),
            ),
            CombatResult::Victory | CombatResult::Defeat => None,
        };
        CharacterPatch {
            health: Some(
                character
                    .health()
                    .saturating_sub(self.stats.total_damage_taken),
            ),
            energy,
            experience: Some(character.experience().saturating_add(self.rewards.xp)),
            coins: Some(character.coins().saturating_add(self.rewards.gold)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value_objects::{CharacterName, MonsterName};
    use crate::UserId;

    fn outcome(result: CombatResult, rewards: CombatRewards, damage_taken: u32) -> CombatOutcome {
        let level = MonsterLevel::new(4).unwrap();
        CombatOutcome::new(
            CombatSessionId::new(),
            result,
            Monster::new(MonsterName::new("Draug").unwrap(), level),
            rewards,
            CombatStats {
                player_health_remaining: 0,
                monster_level: level,
                total_damage_taken: damage_taken,
                total_damage_dealt: 0,
                total_damage_blocked: 0,
                rounds: 1,
            },
        )
    }

    fn character() -> Character {
        Character::new(UserId::new(), CharacterName::new("Ingrid").unwrap(), 100, 80)
            .unwrap()
            .with_health(60)
            .unwrap()
            .with_energy(70)
            .unwrap()
            .with_coins(5)
            .with_experience(100)
    }

    #[test]
    fn victory_patch_adds_gold_and_xp() {
        let rewards = CombatRewards {
            xp: 160,
            gold: 33,
            skill_progress: 4,
            energy_penalty: None,
        };
        let patch = outcome(CombatResult::Victory, rewards, 18).character_patch(&character());

        assert_eq!(patch.health, Some(42));
        assert_eq!(patch.energy, None);
        assert_eq!(patch.experience, Some(260));
        assert_eq!(patch.coins, Some(38));
    }

    #[test]
    fn retreat_patch_costs_half_max_energy() {
        let rewards = CombatRewards::retreat(MonsterLevel::new(4).unwrap(), 50);
        let o = outcome(CombatResult::Retreat, rewards, 100);
        let patch = o.character_patch(&character());

        assert_eq!(o.energy_lost(80), 40);
        assert_eq!(patch.energy, Some(30));
        assert_eq!(patch.health, Some(0));
        assert_eq!(patch.experience, Some(108));
        assert_eq!(patch.coins, Some(5));
    }

    #[test]
    fn settle_is_one_shot() {
        let mut o = outcome(CombatResult::Defeat, CombatRewards::defeat(MonsterLevel::new(4).unwrap()), 0);
        let receipt = RewardReceipt {
            xp_gained: 20,
            gold_gained: 0,
            skill_progress: 2,
            skill: None,
            achievement_recorded: false,
            energy_lost: 0,
            character_patch: CharacterPatch::default(),
        };

        assert!(!o.is_settled());
        o.settle(receipt.clone()).unwrap();
        assert_eq!(o.receipt(), Some(&receipt));
        assert!(matches!(
            o.settle(receipt),
            Err(DomainError::InvalidStateTransition(_))
        ));
    }

    #[test]
    fn persistence_follows_settlement_once() {
        let mut o = outcome(CombatResult::Defeat, CombatRewards::defeat(MonsterLevel::new(4).unwrap()), 0);
        assert!(matches!(
            o.mark_persisted(None),
            Err(DomainError::InvalidStateTransition(_))
        ));

        o.settle(RewardReceipt {
            xp_gained: 20,
            gold_gained: 0,
            skill_progress: 2,
            skill: None,
            achievement_recorded: false,
            energy_lost: 0,
            character_patch: CharacterPatch::default(),
        })
        .unwrap();
        assert!(o.is_settled());
        assert!(!o.is_persisted());

        let respawn = chrono::TimeZone::with_ymd_and_hms(&Utc, 2025, 3, 3, 3, 0, 0).unwrap();
        o.mark_persisted(Some(respawn)).unwrap();
        assert!(o.is_persisted());
        assert!(o.receipt().is_some());
        assert_eq!(o.respawn_at(), Some(respawn));
        assert!(o.mark_persisted(None).is_err());
        assert_eq!(o.respawn_at(), Some(respawn));
    }
}

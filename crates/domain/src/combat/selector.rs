//! Pre-combat gating: selected level, energy cost, advisory skill check.

use serde::{Deserialize, Serialize};

use crate::aggregates::Character;
use crate::error::DomainError;
use crate::value_objects::{CombatRules, MonsterLevel};

/// Skill level a player is advised to have before fighting `level`:
/// `ceil(level / 2)`.
pub fn recommended_skill_level(level: MonsterLevel) -> u32 {
    level.as_u32().div_ceil(2)
}

/// Shown when the player's combat skill is below the recommendation.
/// Never blocks a start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkillWarning {
    pub recommended: u32,
    pub current: u32,
}

/// A level the player may start a combat at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartCheck {
    pub level: MonsterLevel,
    pub energy_cost: u32,
    pub skill_warning: Option<SkillWarning>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonsterSelector {
    level: MonsterLevel,
    energy_cost: u32,
}

impl MonsterSelector {
    pub fn new(rules: &CombatRules) -> Self {
        Self {
            level: MonsterLevel::clamped(1),
            energy_cost: rules.energy_cost,
        }
    }

    pub fn level(&self) -> MonsterLevel {
        self.level
    }

    pub fn energy_cost(&self) -> u32 {
        self.energy_cost
    }

    /// Select a level. Out-of-range input is clamped into 1..=10.
    pub fn select(&mut self, level: i64) -> MonsterLevel {
        self.level = MonsterLevel::clamped(level);
        self.level
    }

    pub fn can_afford(&self, character: &Character) -> bool {
        character.energy() >= self.energy_cost
    }

    /// Validate a start at the selected level.
    ///
    /// # Errors
    ///
    /// `DomainError::Constraint` when the character cannot pay the energy cost.
    pub fn check(
        &self,
        character: &Character,
        combat_skill_level: u32,
    ) -> Result<StartCheck, DomainError> {
        if !self.can_afford(character) {
            return Err(DomainError::constraint(format!(
                "Not enough energy: {} required, {} available",
                self.energy_cost,
                character.energy()
            )));
        }
        let recommended = recommended_skill_level(self.level);
        let skill_warning = (combat_skill_level < recommended).then_some(SkillWarning {
            recommended,
            current: combat_skill_level,
        });
        Ok(StartCheck {
            level: self.level,
            energy_cost: self.energy_cost,
            skill_warning,
        })
    }
}

//! Character aggregate - the player's fighter
//!
//! # Rustic DDD Design
//!
//! - **Private fields**: pools can only change through methods that keep
//!   `health <= max_health` and `energy <= max_energy`
//! - **Valid by construction**: `new()` and `TryFrom<CharacterData>` reject
//!   malformed pools once, at the boundary
//! - **Absolute patches**: persistence receives target values, never deltas

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::entities::{EquipmentSlot, Item};
use crate::error::DomainError;
use crate::value_objects::CharacterName;
use crate::{CharacterId, UserId};

/// Unvalidated character shape as stored by the record store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharacterData {
    pub id: CharacterId,
    pub user_id: UserId,
    pub name: String,
    pub health: u32,
    pub max_health: u32,
    pub energy: u32,
    pub max_energy: u32,
    #[serde(default)]
    pub experience: u64,
    #[serde(default)]
    pub coins: u64,
    #[serde(default)]
    pub equipment: BTreeMap<EquipmentSlot, Item>,
}

/// Partial update with absolute target values.
///
/// Fields left as `None` are not touched. Stores must apply the values as-is
/// so that repeating the same patch is harmless.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CharacterPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub health: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub energy: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub experience: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coins: Option<u64>,
}

impl CharacterPatch {
    pub fn is_empty(&self) -> bool {
        self.health.is_none()
            && self.energy.is_none()
            && self.experience.is_none()
            && self.coins.is_none()
    }
}

/// A player-owned character.
///
/// # Invariants
///
/// - `max_health > 0` and `max_energy > 0`
/// - `health <= max_health`, `energy <= max_energy`
/// - `experience` never decreases through combat
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "CharacterData", into = "CharacterData")]
pub struct Character {
    id: CharacterId,
    user_id: UserId,
    name: CharacterName,
    health: u32,
    max_health: u32,
    energy: u32,
    max_energy: u32,
    experience: u64,
    coins: u64,
    equipment: BTreeMap<EquipmentSlot, Item>,
}

impl Character {
    // =========================================================================
    // Constructor
    // =========================================================================

    /// Create a fresh character with full health and energy.
    pub fn new(
        user_id: UserId,
        name: CharacterName,
        max_health: u32,
        max_energy: u32,
    ) -> Result<Self, DomainError> {
        Self::try_from(CharacterData {
            id: CharacterId::new(),
            user_id,
            name: name.into(),
            health: max_health,
            max_health,
            energy: max_energy,
            max_energy,
            experience: 0,
            coins: 0,
            equipment: BTreeMap::new(),
        })
    }

    /// Set current health, rejecting values above the maximum.
    pub fn with_health(mut self, health: u32) -> Result<Self, DomainError> {
        if health > self.max_health {
            return Err(DomainError::validation(format!(
                "Health {} exceeds max health {}",
                health, self.max_health
            )));
        }
        self.health = health;
        Ok(self)
    }

    /// Set current energy, rejecting values above the maximum.
    pub fn with_energy(mut self, energy: u32) -> Result<Self, DomainError> {
        if energy > self.max_energy {
            return Err(DomainError::validation(format!(
                "Energy {} exceeds max energy {}",
                energy, self.max_energy
            )));
        }
        self.energy = energy;
        Ok(self)
    }

    pub fn with_coins(mut self, coins: u64) -> Self {
        self.coins = coins;
        self
    }

    pub fn with_experience(mut self, experience: u64) -> Self {
        self.experience = experience;
        self
    }

    pub fn with_equipment(mut self, slot: EquipmentSlot, item: Item) -> Self {
        self.equipment.insert(slot, item);
        self
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    #[inline]
    pub fn id(&self) -> CharacterId {
        self.id
    }

    #[inline]
    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    #[inline]
    pub fn name(&self) -> &CharacterName {
        &self.name
    }

    #[inline]
    pub fn health(&self) -> u32 {
        self.health
    }

    #[inline]
    pub fn max_health(&self) -> u32 {
        self.max_health
    }

    #[inline]
    pub fn energy(&self) -> u32 {
        self.energy
    }

    #[inline]
    pub fn max_energy(&self) -> u32 {
        self.max_energy
    }

    #[inline]
    pub fn experience(&self) -> u64 {
        self.experience
    }

    #[inline]
    pub fn coins(&self) -> u64 {
        self.coins
    }

    pub fn equipment(&self) -> &BTreeMap<EquipmentSlot, Item> {
        &self.equipment
    }

    /// Sum of the defense attribute over every equipped item.
    pub fn total_defense(&self) -> u32 {
        self.equipment
            .values()
            .fold(0u32, |acc, item| acc.saturating_add(item.defense))
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Equip an item, returning whatever occupied the slot before.
    pub fn equip(&mut self, slot: EquipmentSlot, item: Item) -> Option<Item> {
        self.equipment.insert(slot, item)
    }

    pub fn unequip(&mut self, slot: EquipmentSlot) -> Option<Item> {
        self.equipment.remove(&slot)
    }

    /// Patch that pays `cost` energy, or a constraint error when short.
    pub fn spend_energy(&self, cost: u32) -> Result<CharacterPatch, DomainError> {
        if self.energy < cost {
            return Err(DomainError::constraint(format!(
                "Not enough energy: need {}, have {}",
                cost, self.energy
            )));
        }
        Ok(CharacterPatch {
            energy: Some(self.energy - cost),
            ..CharacterPatch::default()
        })
    }

    /// Apply an absolute patch, clamping pools to their maximums.
    pub fn apply(&mut self, patch: &CharacterPatch) {
        if let Some(health) = patch.health {
            self.health = health.min(self.max_health);
        }
        if let Some(energy) = patch.energy {
            self.energy = energy.min(self.max_energy);
        }
        if let Some(experience) = patch.experience {
            self.experience = experience;
        }
        if let Some(coins) = patch.coins {
            self.coins = coins;
        }
    }
}

impl TryFrom<CharacterData> for Character {
    type Error = DomainError;

    fn try_from(data: CharacterData) -> Result<Self, Self::Error> {
        if data.max_health == 0 {
            return Err(DomainError::validation("Max health must be positive"));
        }
        if data.max_energy == 0 {
            return Err(DomainError::validation("Max energy must be positive"));
        }
        let character = Self {
            id: data.id,
            user_id: data.user_id,
            name: CharacterName::new(data.name)?,
            health: 0,
            max_health: data.max_health,
            energy: 0,
            max_energy: data.max_energy,
            experience: data.experience,
            coins: data.coins,
            equipment: data.equipment,
        };
        character.with_health(data.health)?.with_energy(data.energy)
    }
}

impl From<Character> for CharacterData {
    fn from(character: Character) -> Self {
        Self {
            id: character.id,
            user_id: character.user_id,
            name: character.name.into(),
            health: character.health,
            max_health: character.max_health,
            energy: character.energy,
            max_energy: character.max_energy,
            experience: character.experience,
            coins: character.coins,
            equipment: character.equipment,
        }
    }
}

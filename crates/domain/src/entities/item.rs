//! Item entity - equipment worn by a character
//!
//! Only the defense attribute matters to combat; everything else an item
//! carries belongs to the shop and inventory screens.

use serde::{Deserialize, Serialize};

use crate::{ItemId, ItemName};

/// Equipment slot an item occupies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EquipmentSlot {
    Head,
    Chest,
    Legs,
    Feet,
    Hands,
    Weapon,
    Shield,
    Accessory,
    /// Unknown slot for forward compatibility
    #[serde(other)]
    Unknown,
}

impl std::fmt::Display for EquipmentSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Head => write!(f, "head"),
            Self::Chest => write!(f, "chest"),
            Self::Legs => write!(f, "legs"),
            Self::Feet => write!(f, "feet"),
            Self::Hands => write!(f, "hands"),
            Self::Weapon => write!(f, "weapon"),
            Self::Shield => write!(f, "shield"),
            Self::Accessory => write!(f, "accessory"),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}

/// A piece of equipment.
///
/// Simple data struct: any combination of a valid name and a defense value is valid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,
    pub name: ItemName,
    /// Flat defense contributed while equipped
    #[serde(default)]
    pub defense: u32,
}

impl Item {
    pub fn new(name: ItemName) -> Self {
        Self {
            id: ItemId::new(),
            name,
            defense: 0,
        }
    }

    pub fn with_defense(mut self, defense: u32) -> Self {
        self.defense = defense;
        self
    }
}

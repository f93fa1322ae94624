//! Entities - data-carrying structs with identity

pub mod defeated_monster;
pub mod item;
pub mod monster;

pub use defeated_monster::{is_monster_available, DefeatedMonster};
pub use item::{EquipmentSlot, Item};
pub use monster::Monster;

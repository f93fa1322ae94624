//! Monster entity - read-only combat template

use serde::{Deserialize, Serialize};

use crate::{MonsterId, MonsterLevel, MonsterName};

/// A monster that can be fought.
///
/// Validated at the boundary: the name and level are newtypes, so a
/// `Monster` in hand always has a usable level for the combat formulas.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Monster {
    pub id: MonsterId,
    pub name: MonsterName,
    #[serde(default)]
    pub description: Option<String>,
    pub level: MonsterLevel,
}

impl Monster {
    pub fn new(name: MonsterName, level: MonsterLevel) -> Self {
        Self {
            id: MonsterId::new(),
            name,
            description: None,
            level,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Health at the start of a fight: `50 + level * 20`.
    pub fn battle_health(&self) -> u32 {
        50 + self.level.as_u32() * 20
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn monster(level: u8) -> Monster {
        Monster::new(
            MonsterName::new("Fjelltroll").unwrap(),
            MonsterLevel::new(level).unwrap(),
        )
    }

    #[test]
    fn battle_health_scales_with_level() {
        assert_eq!(monster(1).battle_health(), 70);
        assert_eq!(monster(3).battle_health(), 110);
        assert_eq!(monster(10).battle_health(), 250);
    }

    #[test]
    fn rejects_malformed_level_on_deserialize() {
        let json = format!(
            r#"{{"id":"{}","name":"Nisse","level":0}}"#,
            uuid::Uuid::nil()
        );
        assert!(serde_json::from_str::<Monster>(&json).is_err());
    }
}

//! Defeated monster record - per-user respawn cooldown

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{MonsterId, UserId};

/// Marks that a user has beaten a monster and when it becomes fightable again.
///
/// Keyed by `(user_id, monster_id)`; a newer victory overwrites the older record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DefeatedMonster {
    pub user_id: UserId,
    pub monster_id: MonsterId,
    pub defeated_at: DateTime<Utc>,
    pub respawn_at: DateTime<Utc>,
}

impl DefeatedMonster {
    pub fn new(
        user_id: UserId,
        monster_id: MonsterId,
        defeated_at: DateTime<Utc>,
        respawn_window: chrono::Duration,
    ) -> Self {
        Self {
            user_id,
            monster_id,
            defeated_at,
            respawn_at: defeated_at + respawn_window,
        }
    }

    pub fn key(&self) -> (UserId, MonsterId) {
        (self.user_id, self.monster_id)
    }

    /// Whether the monster has respawned at `now`.
    pub fn has_respawned(&self, now: DateTime<Utc>) -> bool {
        now >= self.respawn_at
    }
}

/// A monster is fightable when no record exists or its cooldown has elapsed.
pub fn is_monster_available(record: Option<&DefeatedMonster>, now: DateTime<Utc>) -> bool {
    record.map_or(true, |r| r.has_respawned(now))
}

//! Serializable snapshot of a running combat for presentation layers.

use serde::{Deserialize, Serialize};

use crate::value_objects::MonsterLevel;
use crate::CombatSessionId;

use super::log::LogEntry;
use super::session::{CombatSession, CombatStatus};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CombatView {
    pub session_id: CombatSessionId,
    pub status: CombatStatus,
    pub monster_name: String,
    pub monster_level: MonsterLevel,
    pub monster_health: u32,
    pub monster_max_health: u32,
    pub player_health: u32,
    pub player_max_health: u32,
    pub round: u32,
    /// Rendered problem text, e.g. `"6 × 7"`
    pub problem: Option<String>,
    pub time_limit_ms: u64,
    pub time_remaining_ms: u64,
    pub accepting_answers: bool,
    pub retreat_pending: bool,
    /// Most recent log entries, oldest first
    pub log: Vec<LogEntry>,
    /// Entries ever written, including those outside `log`
    pub log_total: usize,
}

impl CombatView {
    pub(crate) fn from_session(session: &CombatSession, log_tail: usize) -> Self {
        let round = session.round();
        Self {
            session_id: session.id(),
            status: session.status(),
            monster_name: session.monster().name.to_string(),
            monster_level: session.monster().level,
            monster_health: session.monster_health(),
            monster_max_health: session.base_monster_health(),
            player_health: session.player_health(),
            player_max_health: session.max_player_health(),
            round: round.map_or(0, |r| r.number),
            problem: round.map(|r| r.problem.to_string()),
            time_limit_ms: round.map_or(0, |r| r.time_limit.as_millis() as u64),
            time_remaining_ms: round.map_or(0, |r| r.time_remaining.as_millis() as u64),
            accepting_answers: session.accepting_answers(),
            retreat_pending: session.retreat_requested(),
            log: session.log().tail(log_tail).to_vec(),
            log_total: session.log().len(),
        }
    }

    /// Share of the round's time still left, in `[0, 1]`.
    pub fn time_fraction(&self) -> f64 {
        if self.time_limit_ms == 0 {
            return 0.0;
        }
        self.time_remaining_ms as f64 / self.time_limit_ms as f64
    }

    /// Entries written after the first `seen`, as far as `log` still holds them.
    pub fn entries_since(&self, seen: usize) -> &[LogEntry] {
        let fresh = self.log_total.saturating_sub(seen).min(self.log.len());
        &self.log[self.log.len() - fresh..]
    }
}

#[cfg(test)]
mod tests {
    use crate::combat::session::{CombatSession, Combatant};
    use crate::entities::Monster;
    use crate::value_objects::{CombatRules, MonsterLevel, MonsterName};
    use chrono::{TimeZone, Utc};
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::time::Duration;

    fn session() -> (CombatSession, StdRng) {
        let mut rng = StdRng::seed_from_u64(3);
        let monster = Monster::new(
            MonsterName::new("Lindorm").unwrap(),
            MonsterLevel::new(2).unwrap(),
        );
        let combatant = Combatant {
            health: 40,
            max_health: 60,
            defense: 0,
            combat_skill_level: 1,
        };
        let now = Utc.with_ymd_and_hms(2025, 2, 2, 10, 0, 0).unwrap();
        let session = CombatSession::start(monster, combatant, CombatRules::default(), &mut rng, now);
        (session, rng)
    }

    #[test]
    fn snapshot_reflects_session() {
        let (session, _) = session();
        let view = session.view(8);

        assert_eq!(view.monster_name, "Lindorm");
        assert_eq!(view.monster_health, 90);
        assert_eq!(view.monster_max_health, 90);
        assert_eq!(view.player_health, 40);
        assert_eq!(view.player_max_health, 60);
        assert_eq!(view.round, 1);
        assert!(view.problem.as_deref().is_some_and(|p| p.contains('×')));
        assert_eq!(view.time_limit_ms, 7000);
        assert_eq!(view.time_fraction(), 1.0);
        assert!(view.accepting_answers);
        assert_eq!(view.log_total, 2);
    }

    #[test]
    fn time_fraction_uses_stored_limit() {
        let (mut session, mut rng) = session();
        let now = Utc.with_ymd_and_hms(2025, 2, 2, 10, 0, 3).unwrap();
        session.advance_clock(Duration::from_millis(3500), &mut rng, now);

        let view = session.view(8);
        assert_eq!(view.time_remaining_ms, 3500);
        assert_eq!(view.time_fraction(), 0.5);
    }

    #[test]
    fn entries_since_returns_only_new_lines() {
        let (mut session, mut rng) = session();
        let seen = session.view(8).log_total;
        let now = Utc.with_ymd_and_hms(2025, 2, 2, 10, 0, 1).unwrap();
        session.submit_answer("not a number", &mut rng, now);

        let view = session.view(1);
        assert_eq!(view.entries_since(seen).len(), 1);
        assert_eq!(session.view(8).entries_since(seen).len(), 2);
        assert!(view.entries_since(view.log_total).is_empty());
    }
}

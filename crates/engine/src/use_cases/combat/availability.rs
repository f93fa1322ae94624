//! Monster availability queries.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use mathquest_domain::{is_monster_available, Monster, MonsterId, UserId};
use serde::Serialize;

use crate::infrastructure::ports::{ClockPort, DefeatedMonsterRepo, MonsterRepo};

use super::error::CombatError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonsterAvailability {
    pub monster: Monster,
    pub available: bool,
    /// Set while the monster is still recovering
    pub respawn_at: Option<DateTime<Utc>>,
}

pub struct ListAvailableMonsters {
    monster_repo: Arc<dyn MonsterRepo>,
    defeated_repo: Arc<dyn DefeatedMonsterRepo>,
    clock: Arc<dyn ClockPort>,
}

impl ListAvailableMonsters {
    pub fn new(
        monster_repo: Arc<dyn MonsterRepo>,
        defeated_repo: Arc<dyn DefeatedMonsterRepo>,
        clock: Arc<dyn ClockPort>,
    ) -> Self {
        Self {
            monster_repo,
            defeated_repo,
            clock,
        }
    }

    /// Every monster with its availability for `user_id`.
    pub async fn execute(&self, user_id: UserId) -> Result<Vec<MonsterAvailability>, CombatError> {
        let now = self.clock.now();
        let records: HashMap<MonsterId, _> = self
            .defeated_repo
            .list_for_user(user_id)
            .await?
            .into_iter()
            .map(|r| (r.monster_id, r))
            .collect();

        let monsters = self.monster_repo.list().await?;
        Ok(monsters
            .into_iter()
            .map(|monster| {
                let record = records.get(&monster.id);
                let available = is_monster_available(record, now);
                MonsterAvailability {
                    respawn_at: record.filter(|_| !available).map(|r| r.respawn_at),
                    available,
                    monster,
                }
            })
            .collect())
    }

    /// Whether `user_id` may fight `monster_id` right now.
    pub async fn is_available(
        &self,
        user_id: UserId,
        monster_id: MonsterId,
    ) -> Result<bool, CombatError> {
        let record = self.defeated_repo.get(user_id, monster_id).await?;
        Ok(is_monster_available(record.as_ref(), self.clock.now()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::ports::{MockClockPort, MockDefeatedMonsterRepo, MockMonsterRepo};
    use chrono::TimeZone;
    use mathquest_domain::{DefeatedMonster, MonsterLevel, MonsterName};
    use mockall::predicate::*;

    fn monster(name: &str, level: u8) -> Monster {
        Monster::new(MonsterName::new(name).unwrap(), MonsterLevel::new(level).unwrap())
    }

    #[tokio::test]
    async fn marks_recovering_monsters() {
        let user_id = UserId::new();
        let now = Utc.with_ymd_and_hms(2025, 8, 1, 12, 0, 0).unwrap();
        let nisse = monster("Nisse", 1);
        let draug = monster("Draug", 4);
        let troll = monster("Troll", 6);

        let recovering = DefeatedMonster::new(
            user_id,
            draug.id,
            now - chrono::Duration::hours(2),
            chrono::Duration::hours(10),
        );
        let respawned = DefeatedMonster::new(
            user_id,
            troll.id,
            now - chrono::Duration::hours(11),
            chrono::Duration::hours(10),
        );
        let respawn_at = recovering.respawn_at;

        let mut monsters = MockMonsterRepo::new();
        let listed = vec![nisse.clone(), draug.clone(), troll.clone()];
        monsters.expect_list().returning(move || Ok(listed.clone()));
        let mut defeated = MockDefeatedMonsterRepo::new();
        defeated
            .expect_list_for_user()
            .with(eq(user_id))
            .returning(move |_| Ok(vec![recovering.clone(), respawned.clone()]));
        let mut clock = MockClockPort::new();
        clock.expect_now().returning(move || now);

        let use_case =
            ListAvailableMonsters::new(Arc::new(monsters), Arc::new(defeated), Arc::new(clock));
        let list = use_case.execute(user_id).await.unwrap();

        let by_name = |name: &str| list.iter().find(|m| m.monster.name.as_str() == name).unwrap();
        assert!(by_name("Nisse").available);
        assert!(!by_name("Draug").available);
        assert_eq!(by_name("Draug").respawn_at, Some(respawn_at));
        assert!(by_name("Troll").available);
        assert_eq!(by_name("Troll").respawn_at, None);
    }

    #[tokio::test]
    async fn single_monster_check_uses_record() {
        let user_id = UserId::new();
        let monster_id = MonsterId::new();
        let now = Utc.with_ymd_and_hms(2025, 8, 1, 12, 0, 0).unwrap();

        let mut defeated = MockDefeatedMonsterRepo::new();
        defeated
            .expect_get()
            .with(eq(user_id), eq(monster_id))
            .returning(move |u, m| {
                Ok(Some(DefeatedMonster::new(
                    u,
                    m,
                    now,
                    chrono::Duration::hours(10),
                )))
            });
        let mut clock = MockClockPort::new();
        clock.expect_now().returning(move || now);

        let use_case = ListAvailableMonsters::new(
            Arc::new(MockMonsterRepo::new()),
            Arc::new(defeated),
            Arc::new(clock),
        );
        assert!(!use_case.is_available(user_id, monster_id).await.unwrap());
    }
}

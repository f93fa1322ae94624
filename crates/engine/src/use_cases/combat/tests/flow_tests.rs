//! End-to-end combat flows against the in-memory adapters.
//!
//! Tests cover:
//! - Start pays energy, victory settles rewards and blocks the monster until respawn
//! - Ending the same outcome twice changes nothing
//! - Starting without enough energy persists nothing
//! - Skill level-ups and the skill warning at high monster levels
//! - Defeat drains health without a respawn record
//! - Retreat through the real-time driver costs energy

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};
use mathquest_domain::{
    Character, CharacterName, CombatOutcome, CombatResult, CombatSession, Monster, MonsterLevel,
    MonsterName, UserId,
};
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::infrastructure::clock::{FixedClock, FixedRandom};
use crate::infrastructure::memory::{
    InMemoryAchievementStore, InMemoryCharacterRepo, InMemoryDefeatedMonsterRepo,
    InMemoryMonsterRepo, InMemorySkillStore,
};
use crate::infrastructure::ports::{CharacterRepo, ClockPort};
use crate::use_cases::combat::{CombatCommand, CombatError, COMBAT_SKILL, MONSTERS_KILLED_STAT};
use crate::{App, Repositories, Settings};

struct World {
    app: App,
    user_id: UserId,
    characters: Arc<InMemoryCharacterRepo>,
    skills: Arc<InMemorySkillStore>,
    achievements: Arc<InMemoryAchievementStore>,
    clock: Arc<FixedClock>,
}

fn start_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 10, 1, 18, 0, 0).unwrap()
}

fn monster(name: &str, level: u8) -> Monster {
    Monster::new(MonsterName::new(name).unwrap(), MonsterLevel::new(level).unwrap())
}

fn world(energy: u32) -> World {
    let user_id = UserId::new();
    let characters = Arc::new(InMemoryCharacterRepo::new());
    characters.insert(
        Character::new(user_id, CharacterName::new("Ragnhild").unwrap(), 100, 50)
            .unwrap()
            .with_energy(energy)
            .unwrap(),
    );
    let monsters = Arc::new(InMemoryMonsterRepo::new(vec![
        monster("Nisse", 1),
        monster("Hulder", 2),
        monster("Draug", 4),
        monster("Jotun", 10),
    ]));
    let skills = Arc::new(InMemorySkillStore::new());
    let achievements = Arc::new(InMemoryAchievementStore::new());
    let clock = Arc::new(FixedClock::new(start_time()));

    let repositories = Repositories {
        character: characters.clone(),
        monster: monsters,
        defeated_monster: Arc::new(InMemoryDefeatedMonsterRepo::new()),
        skills: skills.clone(),
        achievements: achievements.clone(),
        clock: clock.clone(),
        random: Arc::new(FixedRandom::new(11)),
    };

    World {
        app: App::new(Settings::default(), repositories),
        user_id,
        characters,
        skills,
        achievements,
        clock,
    }
}

/// Drive `session` synchronously, answering every problem with `answer_for`.
fn fight(
    world: &World,
    session: &mut CombatSession,
    answer_for: impl Fn(&CombatSession) -> String,
) -> CombatOutcome {
    let mut rng = StdRng::seed_from_u64(3);
    let delay = world.app.settings.rules.round_advance_delay();
    for _ in 0..500 {
        if session.status().is_terminal() {
            break;
        }
        if session.accepting_answers() {
            let input = answer_for(session);
            session.submit_answer(&input, &mut rng, world.clock.now());
        } else {
            session.advance_clock(delay, &mut rng, world.clock.now());
        }
    }
    session.take_outcome().unwrap()
}

fn correct(session: &CombatSession) -> String {
    session.current_problem().unwrap().answer.to_string()
}

fn wrong(_: &CombatSession) -> String {
    "not a number".to_string()
}

#[tokio::test]
async fn victory_settles_rewards_and_blocks_monster_until_respawn() {
    let w = world(50);
    let combat = &w.app.use_cases.combat;

    let mut started = combat.start.execute(w.user_id, 1).await.unwrap();
    assert_eq!(started.character.energy(), 40);
    assert!(started.skill_warning.is_none());
    let stored = w.characters.get_for_user(w.user_id).await.unwrap().unwrap();
    assert_eq!(stored.energy(), 40);

    let mut outcome = fight(&w, &mut started.session, correct);
    assert_eq!(outcome.result(), CombatResult::Victory);
    assert_eq!(outcome.stats().total_damage_taken, 0);

    let summary = combat.end.execute(w.user_id, &mut outcome).await.unwrap();
    assert!(summary.persisted);
    assert_eq!(summary.receipt.xp_gained, 10);
    assert!((5..15).contains(&summary.receipt.gold_gained));
    assert_eq!(summary.character.experience(), 10);
    assert_eq!(summary.character.coins(), summary.receipt.gold_gained);
    assert_eq!(summary.character.health(), 100);
    assert_eq!(summary.character.energy(), 40);
    assert_eq!(summary.respawn_at, Some(start_time() + chrono::Duration::hours(10)));
    assert_eq!(w.achievements.stat(w.user_id, MONSTERS_KILLED_STAT), 1);
    assert_eq!(w.skills.progress(w.user_id, COMBAT_SKILL), 1);

    // The only level 1 monster is recovering
    let err = combat.start.execute(w.user_id, 1).await.unwrap_err();
    assert!(matches!(
        err,
        CombatError::MonsterUnavailable { respawn_at } if respawn_at == start_time() + chrono::Duration::hours(10)
    ));
    let listed = combat.availability.execute(w.user_id).await.unwrap();
    let nisse = listed
        .iter()
        .find(|m| m.monster.name.as_str() == "Nisse")
        .unwrap();
    assert!(!nisse.available);

    w.clock.advance(chrono::Duration::hours(10));
    let again = combat.start.execute(w.user_id, 1).await.unwrap();
    assert_eq!(again.session.monster().name.as_str(), "Nisse");
    assert_eq!(again.character.energy(), 30);
}

#[tokio::test]
async fn ending_twice_applies_rewards_once() {
    let w = world(50);
    let combat = &w.app.use_cases.combat;

    let mut started = combat.start.execute(w.user_id, 1).await.unwrap();
    let mut outcome = fight(&w, &mut started.session, correct);

    let first = combat.end.execute(w.user_id, &mut outcome).await.unwrap();
    let second = combat.end.execute(w.user_id, &mut outcome).await.unwrap();

    assert_eq!(first.receipt, second.receipt);
    assert_eq!(second.character.coins(), first.character.coins());
    assert_eq!(second.character.experience(), 10);
    assert_eq!(w.achievements.stat(w.user_id, MONSTERS_KILLED_STAT), 1);
    assert_eq!(w.skills.progress(w.user_id, COMBAT_SKILL), 1);
}

#[tokio::test]
async fn insufficient_energy_persists_nothing() {
    let w = world(5);

    let err = w.app.use_cases.combat.start.execute(w.user_id, 3).await.unwrap_err();
    assert!(matches!(
        err,
        CombatError::InsufficientEnergy {
            required: 10,
            available: 5
        }
    ));
    let stored = w.characters.get_for_user(w.user_id).await.unwrap().unwrap();
    assert_eq!(stored.energy(), 5);
}

#[tokio::test]
async fn high_level_victory_levels_up_combat_skill() {
    let w = world(50);
    w.skills.set_level(w.user_id, COMBAT_SKILL, 1);
    let combat = &w.app.use_cases.combat;

    // Out-of-range levels clamp to 10
    let mut started = combat.start.execute(w.user_id, 99).await.unwrap();
    assert_eq!(started.session.monster().name.as_str(), "Jotun");
    let warning = started.skill_warning.unwrap();
    assert_eq!(warning.recommended, 5);
    assert_eq!(warning.current, 1);

    let mut outcome = fight(&w, &mut started.session, correct);
    let summary = combat.end.execute(w.user_id, &mut outcome).await.unwrap();

    assert_eq!(summary.result, CombatResult::Victory);
    assert_eq!(summary.receipt.xp_gained, 1000);
    let skill = summary.receipt.skill.unwrap();
    assert!(skill.leveled_up);
    assert_eq!(skill.new_level, 2);
    assert_eq!(w.skills.progress(w.user_id, COMBAT_SKILL), 0);
}

#[tokio::test]
async fn defeat_drains_health_without_respawn_record() {
    let w = world(50);
    let combat = &w.app.use_cases.combat;

    let mut started = combat.start.execute(w.user_id, 4).await.unwrap();
    let mut outcome = fight(&w, &mut started.session, wrong);
    assert_eq!(outcome.result(), CombatResult::Defeat);
    assert_eq!(outcome.stats().total_damage_taken, 100);

    let summary = combat.end.execute(w.user_id, &mut outcome).await.unwrap();
    assert_eq!(summary.character.health(), 0);
    assert_eq!(summary.receipt.xp_gained, 20);
    assert_eq!(summary.receipt.gold_gained, 0);
    assert!(summary.respawn_at.is_none());
    assert_eq!(w.achievements.stat(w.user_id, MONSTERS_KILLED_STAT), 0);

    let listed = combat.availability.execute(w.user_id).await.unwrap();
    assert!(listed.iter().all(|m| m.available));
}

#[tokio::test(start_paused = true)]
async fn retreat_through_driver_costs_energy() {
    let w = world(50);
    let combat = &w.app.use_cases.combat;

    let started = combat.start.execute(w.user_id, 2).await.unwrap();
    let handle = w.app.spawn_combat(started.session);

    tokio::time::sleep(Duration::from_millis(1500)).await;
    assert!(handle.send(CombatCommand::RequestRetreat).await);
    assert!(handle.send(CombatCommand::ConfirmRetreat).await);
    let mut outcome = handle.finish().await.unwrap();
    assert_eq!(outcome.result(), CombatResult::Retreat);

    let summary = combat.end.execute(w.user_id, &mut outcome).await.unwrap();
    assert_eq!(summary.receipt.energy_lost, 25);
    assert_eq!(summary.character.energy(), 15);
    assert_eq!(summary.receipt.xp_gained, 4);
    assert!(summary.respawn_at.is_none());
}

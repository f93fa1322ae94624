//! MathQuest Engine - terminal combat runner.
//!
//! Seeds in-memory stores, fights one combat against a monster of the level
//! given as the first argument (default 1) and prints the settlement as JSON.
//!
//! Type an answer and press enter. `r` asks to retreat, `y` confirms, `n`
//! keeps fighting.

use std::sync::Arc;

use anyhow::Context;
use mathquest_domain::{
    Character, CharacterName, CombatStatus, EquipmentSlot, Item, ItemName, LogKind, Monster,
    MonsterLevel, MonsterName, UserId,
};
use mathquest_engine::infrastructure::memory::{
    InMemoryAchievementStore, InMemoryCharacterRepo, InMemoryDefeatedMonsterRepo,
    InMemoryMonsterRepo, InMemorySkillStore,
};
use mathquest_engine::use_cases::combat::{CombatCommand, COMBAT_SKILL};
use mathquest_engine::{App, Repositories, Settings};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const BESTIARY: [&str; 10] = [
    "Nisse", "Hulder", "Nøkk", "Draug", "Troll", "Lindorm", "Jotun", "Mare", "Fenrisulv",
    "Jormungand",
];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    load_dotenv_from_repo_root();

    // Logs go to stderr so stdout stays clean for the JSON summary
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mathquest_engine=debug,mathquest_domain=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let settings = Settings::from_env();
    tracing::info!(rules = ?settings.rules, "Starting MathQuest combat runner");

    let level: i64 = match std::env::args().nth(1) {
        Some(arg) => arg
            .parse()
            .with_context(|| format!("monster level must be a number, got {arg:?}"))?,
        None => 1,
    };

    let user_id = UserId::new();
    let characters = Arc::new(InMemoryCharacterRepo::new());
    characters.insert(seed_character(user_id)?);
    let monsters = Arc::new(InMemoryMonsterRepo::new(seed_monsters()?));
    let skills = Arc::new(InMemorySkillStore::new());
    skills.set_level(user_id, COMBAT_SKILL, 2);

    let app = App::new(
        settings,
        Repositories::with_system_time(
            characters,
            monsters,
            Arc::new(InMemoryDefeatedMonsterRepo::new()),
            skills,
            Arc::new(InMemoryAchievementStore::new()),
        ),
    );

    let started = app.use_cases.combat.start.execute(user_id, level).await?;
    if let Some(warning) = started.skill_warning {
        println!(
            "Warning: combat skill {} is below the recommended {}.",
            warning.current, warning.recommended
        );
    }
    println!(
        "Energy left after paying the entry cost: {}",
        started.character.energy()
    );

    let handle = app.spawn_combat(started.session);
    let mut views = handle.subscribe();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut seen = 0;
    let mut prompted = false;
    let mut stdin_open = true;

    loop {
        let view = views.borrow_and_update().clone();
        for entry in view.entries_since(seen) {
            let marker = match entry.kind {
                LogKind::Info => " ",
                LogKind::Success => "+",
                LogKind::Warning => "!",
                LogKind::Error => "-",
            };
            println!("{marker} {}", entry.message);
        }
        seen = view.log_total;
        if view.status != CombatStatus::Playing {
            break;
        }
        if view.retreat_pending && !prompted {
            println!("Retreat? [y/n]");
        }
        prompted = view.retreat_pending;

        tokio::select! {
            changed = views.changed() => {
                if changed.is_err() {
                    break;
                }
            }
            line = lines.next_line(), if stdin_open => {
                match line? {
                    Some(line) => {
                        let command = match line.trim() {
                            "r" | "retreat" => CombatCommand::RequestRetreat,
                            "y" | "yes" => CombatCommand::ConfirmRetreat,
                            "n" | "no" => CombatCommand::CancelRetreat,
                            answer => CombatCommand::Answer(answer.to_string()),
                        };
                        handle.send(command).await;
                    }
                    None => {
                        // End of input retreats
                        stdin_open = false;
                        handle.send(CombatCommand::RequestRetreat).await;
                        handle.send(CombatCommand::ConfirmRetreat).await;
                    }
                }
            }
        }
    }

    let mut outcome = handle
        .finish()
        .await
        .context("combat ended without an outcome")?;
    let summary = app
        .use_cases
        .combat
        .end
        .execute(user_id, &mut outcome)
        .await?;

    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

fn seed_character(user_id: UserId) -> anyhow::Result<Character> {
    let helmet = Item::new(ItemName::new("Iron helmet")?).with_defense(8);
    let shield = Item::new(ItemName::new("Round shield")?).with_defense(12);
    Ok(
        Character::new(user_id, CharacterName::new("Eirik")?, 100, 50)?
            .with_equipment(EquipmentSlot::Head, helmet)
            .with_equipment(EquipmentSlot::Shield, shield),
    )
}

fn seed_monsters() -> anyhow::Result<Vec<Monster>> {
    BESTIARY
        .iter()
        .zip(1u8..)
        .map(|(name, level)| {
            Ok(
                Monster::new(MonsterName::new(*name)?, MonsterLevel::new(level)?)
                    .with_description(format!("A level {level} foe")),
            )
        })
        .collect()
}

fn load_dotenv_from_repo_root() {
    let repo_root = std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..");

    // Prefer local overrides.
    for filename in [".env.local", ".env"] {
        let path = repo_root.join(filename);
        if path.exists() {
            let _ = dotenvy::from_path(path);
        }
    }
}

//! Application state and composition.

use std::sync::Arc;

use mathquest_domain::CombatSession;

use crate::infrastructure::{
    clock::{SystemClock, SystemRandom},
    ports::{
        AchievementPort, CharacterRepo, ClockPort, DefeatedMonsterRepo, MonsterRepo, RandomPort,
        SkillProgressPort,
    },
    settings::Settings,
};
use crate::use_cases::combat::{
    CombatDriver, CombatHandle, EndCombat, ListAvailableMonsters, ResolveRewards, StartCombat,
};
use crate::use_cases::CombatUseCases;

/// Main application state.
///
/// Holds the injected ports and the use cases built from them.
pub struct App {
    pub settings: Settings,
    pub repositories: Repositories,
    pub use_cases: UseCases,
}

/// Container for all injected ports.
#[derive(Clone)]
pub struct Repositories {
    pub character: Arc<dyn CharacterRepo>,
    pub monster: Arc<dyn MonsterRepo>,
    pub defeated_monster: Arc<dyn DefeatedMonsterRepo>,
    pub skills: Arc<dyn SkillProgressPort>,
    pub achievements: Arc<dyn AchievementPort>,
    pub clock: Arc<dyn ClockPort>,
    pub random: Arc<dyn RandomPort>,
}

impl Repositories {
    /// Ports backed by the given stores with the system clock and random source.
    pub fn with_system_time(
        character: Arc<dyn CharacterRepo>,
        monster: Arc<dyn MonsterRepo>,
        defeated_monster: Arc<dyn DefeatedMonsterRepo>,
        skills: Arc<dyn SkillProgressPort>,
        achievements: Arc<dyn AchievementPort>,
    ) -> Self {
        Self {
            character,
            monster,
            defeated_monster,
            skills,
            achievements,
            clock: Arc::new(SystemClock::new()),
            random: Arc::new(SystemRandom::new()),
        }
    }
}

/// Container for all use cases.
pub struct UseCases {
    pub combat: CombatUseCases,
}

impl App {
    /// Create a new App with all dependencies wired up.
    pub fn new(settings: Settings, repositories: Repositories) -> Self {
        let r = &repositories;
        let rules = settings.rules.clone();

        let rewards = Arc::new(ResolveRewards::new(
            r.skills.clone(),
            r.achievements.clone(),
        ));
        let combat = CombatUseCases {
            start: Arc::new(StartCombat::new(
                r.character.clone(),
                r.monster.clone(),
                r.defeated_monster.clone(),
                r.skills.clone(),
                r.clock.clone(),
                r.random.clone(),
                rules.clone(),
            )),
            end: Arc::new(EndCombat::new(
                r.character.clone(),
                r.defeated_monster.clone(),
                rewards.clone(),
                r.clock.clone(),
                rules,
            )),
            rewards,
            availability: Arc::new(ListAvailableMonsters::new(
                r.monster.clone(),
                r.defeated_monster.clone(),
                r.clock.clone(),
            )),
            driver: Arc::new(CombatDriver::new(
                r.clock.clone(),
                r.random.clone(),
                settings.log_tail,
            )),
        };

        Self {
            settings,
            repositories,
            use_cases: UseCases { combat },
        }
    }

    /// Run `session` in real time at the configured tick interval.
    pub fn spawn_combat(&self, session: CombatSession) -> CombatHandle {
        self.use_cases
            .combat
            .driver
            .spawn(session, self.settings.rules.tick_interval())
    }
}

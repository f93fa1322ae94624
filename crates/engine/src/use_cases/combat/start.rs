//! Start combat use case.
//!
//! Validates energy, resolves an available monster for the selected level,
//! pays the energy cost and builds the session. Nothing is persisted unless
//! every check passes.

use std::sync::Arc;

use mathquest_domain::combat::SkillWarning;
use mathquest_domain::{
    is_monster_available, Character, CombatRules, CombatSession, Combatant, DomainError, Monster,
    MonsterId, MonsterSelector, UserId,
};
use rand::seq::SliceRandom;

use crate::infrastructure::clock::seeded_rng;
use crate::infrastructure::ports::{
    CharacterRepo, ClockPort, DefeatedMonsterRepo, MonsterRepo, RandomPort, SkillProgressPort,
};

use super::error::CombatError;
use super::COMBAT_SKILL;

/// A freshly started combat.
#[derive(Debug)]
pub struct StartedCombat {
    pub session: CombatSession,
    /// The character after paying the energy cost
    pub character: Character,
    pub combat_skill_level: u32,
    pub skill_warning: Option<SkillWarning>,
}

pub struct StartCombat {
    character_repo: Arc<dyn CharacterRepo>,
    monster_repo: Arc<dyn MonsterRepo>,
    defeated_repo: Arc<dyn DefeatedMonsterRepo>,
    skills: Arc<dyn SkillProgressPort>,
    clock: Arc<dyn ClockPort>,
    random: Arc<dyn RandomPort>,
    rules: CombatRules,
}

impl StartCombat {
    pub fn new(
        character_repo: Arc<dyn CharacterRepo>,
        monster_repo: Arc<dyn MonsterRepo>,
        defeated_repo: Arc<dyn DefeatedMonsterRepo>,
        skills: Arc<dyn SkillProgressPort>,
        clock: Arc<dyn ClockPort>,
        random: Arc<dyn RandomPort>,
        rules: CombatRules,
    ) -> Self {
        Self {
            character_repo,
            monster_repo,
            defeated_repo,
            skills,
            clock,
            random,
            rules,
        }
    }

    /// Start a combat against any available monster of `level`.
    ///
    /// The level is clamped into 1..=10.
    pub async fn execute(&self, user_id: UserId, level: i64) -> Result<StartedCombat, CombatError> {
        let mut selector = MonsterSelector::new(&self.rules);
        let level = selector.select(level);

        let character = self.load_character(user_id).await?;
        self.ensure_energy(&selector, &character)?;

        let candidates = self.monster_repo.find_by_level(level).await?;
        if candidates.is_empty() {
            return Err(CombatError::MonsterNotFound(level));
        }

        let now = self.clock.now();
        let mut available = Vec::with_capacity(candidates.len());
        let mut earliest_respawn = None;
        for monster in candidates {
            let record = self.defeated_repo.get(user_id, monster.id).await?;
            if is_monster_available(record.as_ref(), now) {
                available.push(monster);
            } else if let Some(record) = record {
                earliest_respawn = Some(match earliest_respawn {
                    Some(at) if at <= record.respawn_at => at,
                    _ => record.respawn_at,
                });
            }
        }

        let mut rng = seeded_rng(self.random.as_ref());
        let Some(monster) = available.choose(&mut rng).cloned() else {
            return match earliest_respawn {
                Some(respawn_at) => Err(CombatError::MonsterUnavailable { respawn_at }),
                None => Err(CombatError::MonsterNotFound(level)),
            };
        };

        self.begin(user_id, selector, character, monster).await
    }

    /// Start a combat against one specific monster.
    pub async fn execute_for_monster(
        &self,
        user_id: UserId,
        monster_id: MonsterId,
    ) -> Result<StartedCombat, CombatError> {
        let monster = self
            .monster_repo
            .get(monster_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Monster", monster_id.to_string()))?;

        let mut selector = MonsterSelector::new(&self.rules);
        selector.select(i64::from(monster.level.value()));

        let character = self.load_character(user_id).await?;
        self.ensure_energy(&selector, &character)?;

        let record = self.defeated_repo.get(user_id, monster.id).await?;
        if let Some(record) = record.filter(|r| !r.has_respawned(self.clock.now())) {
            return Err(CombatError::MonsterUnavailable {
                respawn_at: record.respawn_at,
            });
        }

        self.begin(user_id, selector, character, monster).await
    }

    async fn load_character(&self, user_id: UserId) -> Result<Character, CombatError> {
        self.character_repo
            .get_for_user(user_id)
            .await?
            .ok_or(CombatError::CharacterNotFound)
    }

    fn ensure_energy(
        &self,
        selector: &MonsterSelector,
        character: &Character,
    ) -> Result<(), CombatError> {
        if selector.can_afford(character) {
            return Ok(());
        }
        tracing::info!(
            user_id = %character.user_id(),
            energy = character.energy(),
            required = selector.energy_cost(),
            "Combat start rejected: not enough energy"
        );
        Err(CombatError::InsufficientEnergy {
            required: selector.energy_cost(),
            available: character.energy(),
        })
    }

    async fn begin(
        &self,
        user_id: UserId,
        selector: MonsterSelector,
        character: Character,
        monster: Monster,
    ) -> Result<StartedCombat, CombatError> {
        let combat_skill_level = self.skills.skill_level(user_id, COMBAT_SKILL).await?;
        let check = selector.check(&character, combat_skill_level)?;

        // Pay before the session exists
        let patch = character.spend_energy(check.energy_cost)?;
        let character = self.character_repo.update(user_id, patch).await?;

        let mut rng = seeded_rng(self.random.as_ref());
        let session = CombatSession::start(
            monster,
            Combatant::from_character(&character, combat_skill_level),
            self.rules.clone(),
            &mut rng,
            self.clock.now(),
        );

        tracing::info!(
            user_id = %user_id,
            session_id = %session.id(),
            monster = %session.monster().name,
            monster_level = %check.level,
            combat_skill_level,
            energy_left = character.energy(),
            "Combat started"
        );
        if let Some(warning) = check.skill_warning {
            tracing::debug!(
                recommended = warning.recommended,
                current = warning.current,
                "Combat skill below recommended level"
            );
        }

        Ok(StartedCombat {
            session,
            character,
            combat_skill_level,
            skill_warning: check.skill_warning,
        })
    }
}

//! Combat session state machine
//!
//! ```text
//!            ┌──────────── correct, monster at 0 ──────────► Victory
//! Playing ───┼──── wrong / timeout, player at 0 ───────────► Defeat
//!            └──── retreat requested + confirmed ──────────► Retreat
//! ```
//!
//! Each round presents a problem and runs a countdown. A correct answer hits
//! the monster; a wrong answer or an expired countdown lets the monster hit
//! back. The session owns its timers (see [`TaskArena`]) and cancels all of
//! them on the single terminal transition or on teardown, so a late tick can
//! never touch a finished session. The outcome is emitted once through
//! [`CombatSession::take_outcome`].

use std::time::Duration;

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::aggregates::Character;
use crate::entities::Monster;
use crate::error::DomainError;
use crate::value_objects::{CombatRules, Difficulty, MonsterLevel, ProblemSource};
use crate::CombatSessionId;

use super::damage::{
    calculate_damage_reduction, monster_attack_damage, player_attack_damage, DamageReduction,
};
use super::log::{BattleLog, LogKind};
use super::outcome::{CombatOutcome, CombatStats};
use super::problem::{self, Operation, Problem};
use super::rewards::{CombatResult, CombatRewards};
use super::schedule::{TaskArena, TaskHandle, TaskKind};
use super::view::CombatView;

/// Player-side numbers a session needs. Built from a validated `Character`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Combatant {
    pub health: u32,
    pub max_health: u32,
    pub defense: u32,
    pub combat_skill_level: u32,
}

impl Combatant {
    pub fn from_character(character: &Character, combat_skill_level: u32) -> Self {
        Self {
            health: character.health(),
            max_health: character.max_health(),
            defense: character.total_defense(),
            combat_skill_level,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CombatStatus {
    Playing,
    Victory,
    Defeat,
    Retreat,
}

impl CombatStatus {
    pub fn is_terminal(self) -> bool {
        self != CombatStatus::Playing
    }
}

impl From<CombatResult> for CombatStatus {
    fn from(result: CombatResult) -> Self {
        match result {
            CombatResult::Victory => CombatStatus::Victory,
            CombatResult::Defeat => CombatStatus::Defeat,
            CombatResult::Retreat => CombatStatus::Retreat,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoundPhase {
    Answering,
    Resolved,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Round {
    pub number: u32,
    pub problem: Problem,
    pub time_limit: Duration,
    pub time_remaining: Duration,
    pub phase: RoundPhase,
}

/// What a submitted answer did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnswerResult {
    /// No round is accepting answers (between rounds, ended, or torn down).
    Ignored,
    Correct { damage: u32, monster_health: u32 },
    Incorrect {
        expected: i64,
        damage: DamageReduction,
        player_health: u32,
    },
}

/// Timer-driven transitions observed while advancing the clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockEvent {
    TimedOut { round: u32, damage: DamageReduction },
    RoundStarted { round: u32 },
}

/// Seconds allowed per round: `max(3, floor(8 - level * 0.3))`.
pub fn round_time_limit(level: MonsterLevel) -> Duration {
    let tenths = 80u64.saturating_sub(3 * u64::from(level.value()));
    Duration::from_secs((tenths / 10).max(3))
}

#[derive(Debug)]
pub struct CombatSession {
    id: CombatSessionId,
    monster: Monster,
    rules: CombatRules,
    combatant: Combatant,
    base_monster_health: u32,
    monster_health: u32,
    player_health: u32,
    round: Option<Round>,
    status: CombatStatus,
    retreat_requested: bool,
    torn_down: bool,
    log: BattleLog,
    total_player_damage: u32,
    total_damage_blocked: u32,
    total_damage_taken: u32,
    timers: TaskArena,
    countdown: Option<TaskHandle>,
    advance: Option<TaskHandle>,
    outcome: Option<CombatOutcome>,
}

impl CombatSession {
    /// Start a combat and present the first problem.
    ///
    /// Energy is paid by the caller before a session exists.
    pub fn start<R: Rng + ?Sized>(
        monster: Monster,
        combatant: Combatant,
        rules: CombatRules,
        rng: &mut R,
        now: DateTime<Utc>,
    ) -> Self {
        let base_monster_health = monster.battle_health();
        let mut session = Self {
            id: CombatSessionId::new(),
            base_monster_health,
            monster_health: base_monster_health,
            player_health: combatant.health.min(combatant.max_health),
            combatant,
            rules,
            round: None,
            status: CombatStatus::Playing,
            retreat_requested: false,
            torn_down: false,
            log: BattleLog::new(),
            total_player_damage: 0,
            total_damage_blocked: 0,
            total_damage_taken: 0,
            timers: TaskArena::new(),
            countdown: None,
            advance: None,
            outcome: None,
            monster,
        };
        session.log.push(
            LogKind::Info,
            format!(
                "{} (level {}) appears with {} health!",
                session.monster.name, session.monster.level, base_monster_health
            ),
            now,
        );
        session.start_round(rng, now);
        session
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn id(&self) -> CombatSessionId {
        self.id
    }

    pub fn monster(&self) -> &Monster {
        &self.monster
    }

    pub fn status(&self) -> CombatStatus {
        self.status
    }

    pub fn monster_health(&self) -> u32 {
        self.monster_health
    }

    pub fn base_monster_health(&self) -> u32 {
        self.base_monster_health
    }

    pub fn player_health(&self) -> u32 {
        self.player_health
    }

    pub fn max_player_health(&self) -> u32 {
        self.combatant.max_health
    }

    pub fn round(&self) -> Option<&Round> {
        self.round.as_ref()
    }

    pub fn current_problem(&self) -> Option<&Problem> {
        self.round.as_ref().map(|r| &r.problem)
    }

    pub fn log(&self) -> &BattleLog {
        &self.log
    }

    pub fn total_player_damage(&self) -> u32 {
        self.total_player_damage
    }

    pub fn total_damage_blocked(&self) -> u32 {
        self.total_damage_blocked
    }

    pub fn total_damage_taken(&self) -> u32 {
        self.total_damage_taken
    }

    pub fn retreat_requested(&self) -> bool {
        self.retreat_requested
    }

    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }

    /// Number of timers still armed.
    pub fn pending_timers(&self) -> usize {
        self.timers.pending()
    }

    pub fn accepting_answers(&self) -> bool {
        self.is_live()
            && self
                .round
                .as_ref()
                .is_some_and(|r| r.phase == RoundPhase::Answering)
    }

    fn is_live(&self) -> bool {
        self.status == CombatStatus::Playing && !self.torn_down
    }

    /// Read-only snapshot with the last `log_tail` log entries.
    pub fn view(&self, log_tail: usize) -> CombatView {
        CombatView::from_session(self, log_tail)
    }

    // =========================================================================
    // Player actions
    // =========================================================================

    /// Resolve the current round with a typed answer.
    ///
    /// Malformed input counts as a wrong answer.
    pub fn submit_answer<R: Rng + ?Sized>(
        &mut self,
        input: &str,
        rng: &mut R,
        now: DateTime<Utc>,
    ) -> AnswerResult {
        if !self.accepting_answers() {
            return AnswerResult::Ignored;
        }
        let Some(round) = self.round.as_ref() else {
            return AnswerResult::Ignored;
        };
        let correct = round.problem.check(input);
        let expected = round.problem.answer;
        let (time_remaining, time_limit) = (round.time_remaining, round.time_limit);
        self.resolve_round();

        if correct {
            let damage = player_attack_damage(
                self.combatant.combat_skill_level,
                time_remaining,
                time_limit,
            );
            self.monster_health = self.monster_health.saturating_sub(damage);
            self.total_player_damage = self.total_player_damage.saturating_add(damage);
            self.log.push(
                LogKind::Success,
                format!(
                    "Correct! You hit {} for {} damage.",
                    self.monster.name, damage
                ),
                now,
            );

            if self.monster_health == 0 {
                let rewards = CombatRewards::victory(self.monster.level, rng);
                self.finish(CombatResult::Victory, rewards, now);
            } else {
                self.schedule_next_round();
            }
            AnswerResult::Correct {
                damage,
                monster_health: self.monster_health,
            }
        } else {
            self.log.push(
                LogKind::Error,
                format!("Wrong! The answer was {expected}."),
                now,
            );
            let damage = self.monster_strike(now);
            AnswerResult::Incorrect {
                expected,
                damage,
                player_health: self.player_health,
            }
        }
    }

    /// First step of retreating. Returns false once the combat has ended.
    pub fn request_retreat(&mut self) -> bool {
        if !self.is_live() {
            return false;
        }
        self.retreat_requested = true;
        true
    }

    pub fn cancel_retreat(&mut self) {
        self.retreat_requested = false;
    }

    /// End the combat as a retreat. Requires a prior [`request_retreat`].
    ///
    /// No further damage is applied; health stays where it is.
    ///
    /// [`request_retreat`]: CombatSession::request_retreat
    pub fn confirm_retreat(&mut self, now: DateTime<Utc>) -> Result<(), DomainError> {
        if !self.is_live() {
            return Err(DomainError::invalid_state_transition(format!(
                "Cannot retreat from a combat in state {:?}",
                self.status
            )));
        }
        if !self.retreat_requested {
            return Err(DomainError::invalid_state_transition(
                "Retreat must be requested before it is confirmed",
            ));
        }
        let rewards =
            CombatRewards::retreat(self.monster.level, self.rules.retreat_energy_penalty_percent);
        self.finish(CombatResult::Retreat, rewards, now);
        Ok(())
    }

    // =========================================================================
    // Time
    // =========================================================================

    /// Let `elapsed` wall-clock time pass, firing every timer that comes due.
    pub fn advance_clock<R: Rng + ?Sized>(
        &mut self,
        elapsed: Duration,
        rng: &mut R,
        now: DateTime<Utc>,
    ) -> Vec<ClockEvent> {
        let mut events = Vec::new();
        let mut budget = elapsed;

        while self.is_live() {
            let Some((handle, kind, consumed)) = self.timers.pop_due(budget) else {
                break;
            };
            budget = budget.saturating_sub(consumed);
            match kind {
                TaskKind::Countdown if self.countdown == Some(handle) => {
                    if let Some(event) = self.countdown_tick(now) {
                        events.push(event);
                    }
                }
                TaskKind::AdvanceRound if self.advance == Some(handle) => {
                    self.advance = None;
                    self.start_round(rng, now);
                    if let Some(round) = &self.round {
                        events.push(ClockEvent::RoundStarted {
                            round: round.number,
                        });
                    }
                }
                _ => {}
            }
        }
        self.timers.elapse(budget);
        events
    }

    /// Cancel every timer. The session accepts no further input and never
    /// produces an outcome if it had not ended yet.
    pub fn teardown(&mut self) {
        self.cancel_timers();
        self.torn_down = true;
    }

    /// Hand over the outcome. Yields `Some` exactly once, after the terminal
    /// transition.
    pub fn take_outcome(&mut self) -> Option<CombatOutcome> {
        self.outcome.take()
    }

    // =========================================================================
    // Internals
    // =========================================================================

    fn next_problem<R: Rng + ?Sized>(&self, rng: &mut R) -> Problem {
        match self.rules.problem_source {
            ProblemSource::MonsterLevel => problem::generate(
                rng,
                Operation::Multiplication,
                problem::max_factor_for_level(self.monster.level.as_u32()),
                false,
            ),
            ProblemSource::Difficulty => {
                problem::generate_by_difficulty(rng, Difficulty::from(self.monster.level))
            }
        }
    }

    fn start_round<R: Rng + ?Sized>(&mut self, rng: &mut R, now: DateTime<Utc>) {
        if !self.is_live() {
            return;
        }
        let number = self.round.as_ref().map_or(1, |r| r.number + 1);
        let problem = self.next_problem(rng);
        let time_limit = round_time_limit(self.monster.level);
        self.log.push(
            LogKind::Info,
            format!(
                "Round {}: what is {}? ({}s)",
                number,
                problem,
                time_limit.as_secs()
            ),
            now,
        );
        self.round = Some(Round {
            number,
            problem,
            time_limit,
            time_remaining: time_limit,
            phase: RoundPhase::Answering,
        });
        if let Some(handle) = self.countdown.take() {
            self.timers.cancel(handle);
        }
        self.countdown = Some(
            self.timers
                .schedule_repeating(TaskKind::Countdown, self.rules.tick_interval()),
        );
    }

    fn countdown_tick(&mut self, now: DateTime<Utc>) -> Option<ClockEvent> {
        let tick = self.rules.tick_interval();
        let round = self.round.as_mut()?;
        if round.phase != RoundPhase::Answering {
            return None;
        }
        round.time_remaining = round.time_remaining.saturating_sub(tick);
        if !round.time_remaining.is_zero() {
            return None;
        }

        let number = round.number;
        let expected = round.problem.answer;
        self.resolve_round();
        self.log.push(
            LogKind::Warning,
            format!("Time's up! The answer was {expected}."),
            now,
        );
        let damage = self.monster_strike(now);
        Some(ClockEvent::TimedOut {
            round: number,
            damage,
        })
    }

    /// Close the current round to further answers and stop its countdown.
    fn resolve_round(&mut self) {
        if let Some(round) = self.round.as_mut() {
            round.phase = RoundPhase::Resolved;
        }
        if let Some(handle) = self.countdown.take() {
            self.timers.cancel(handle);
        }
    }

    /// Monster hits the player through defense. May end the combat in defeat.
    fn monster_strike(&mut self, now: DateTime<Utc>) -> DamageReduction {
        let incoming = monster_attack_damage(self.monster.level.as_u32());
        let reduction = calculate_damage_reduction(incoming, self.combatant.defense);
        let landed = reduction.reduced_damage.min(self.player_health);

        self.player_health -= landed;
        self.total_damage_taken = self.total_damage_taken.saturating_add(landed);
        self.total_damage_blocked = self
            .total_damage_blocked
            .saturating_add(reduction.damage_blocked);

        let message = if reduction.damage_blocked > 0 {
            format!(
                "{} hits you for {} damage ({} blocked by armor).",
                self.monster.name, reduction.reduced_damage, reduction.damage_blocked
            )
        } else {
            format!(
                "{} hits you for {} damage.",
                self.monster.name, reduction.reduced_damage
            )
        };
        self.log.push(LogKind::Error, message, now);

        if self.player_health == 0 {
            self.finish(
                CombatResult::Defeat,
                CombatRewards::defeat(self.monster.level),
                now,
            );
        } else {
            self.schedule_next_round();
        }
        reduction
    }

    fn schedule_next_round(&mut self) {
        if !self.is_live() {
            return;
        }
        if let Some(handle) = self.advance.take() {
            self.timers.cancel(handle);
        }
        self.advance = Some(
            self.timers
                .schedule_once(TaskKind::AdvanceRound, self.rules.round_advance_delay()),
        );
    }

    fn cancel_timers(&mut self) {
        self.timers.cancel_all();
        self.countdown = None;
        self.advance = None;
    }

    /// The single terminal transition.
    fn finish(&mut self, result: CombatResult, rewards: CombatRewards, now: DateTime<Utc>) {
        if self.status.is_terminal() {
            return;
        }
        self.cancel_timers();
        self.status = result.into();
        self.retreat_requested = false;
        if let Some(round) = self.round.as_mut() {
            round.phase = RoundPhase::Resolved;
        }

        let message = match result {
            CombatResult::Victory => (
                LogKind::Success,
                format!("Victory! {} is defeated.", self.monster.name),
            ),
            CombatResult::Defeat => (
                LogKind::Error,
                format!("Defeat! {} was too strong.", self.monster.name),
            ),
            CombatResult::Retreat => (
                LogKind::Warning,
                format!("You retreat from {}.", self.monster.name),
            ),
        };
        self.log.push(message.0, message.1, now);

        let stats = CombatStats {
            player_health_remaining: self.player_health,
            monster_level: self.monster.level,
            total_damage_taken: self.total_damage_taken,
            total_damage_dealt: self.total_player_damage,
            total_damage_blocked: self.total_damage_blocked,
            rounds: self.round.as_ref().map_or(0, |r| r.number),
        };
        self.outcome = Some(CombatOutcome::new(
            self.id,
            result,
            self.monster.clone(),
            rewards,
            stats,
        ));
    }
}

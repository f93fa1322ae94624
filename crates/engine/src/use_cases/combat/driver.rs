//! Real-time combat driver.
//!
//! Runs one [`CombatSession`] on its own task. A tokio interval feeds the
//! session's clock, player commands arrive over an mpsc channel and every
//! change is published as a [`CombatView`] on a watch channel. Cancelling the
//! handle (or dropping it) tears the session down, which cancels its timers.

use std::sync::Arc;
use std::time::Duration;

use mathquest_domain::{AnswerResult, CombatOutcome, CombatSession, CombatView};
use rand::rngs::StdRng;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::infrastructure::clock::seeded_rng;
use crate::infrastructure::ports::{ClockPort, RandomPort};

const COMMAND_BUFFER: usize = 16;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CombatCommand {
    Answer(String),
    RequestRetreat,
    CancelRetreat,
    ConfirmRetreat,
}

/// Handle to a running combat.
pub struct CombatHandle {
    commands: mpsc::Sender<CombatCommand>,
    view: watch::Receiver<CombatView>,
    cancel: CancellationToken,
    task: Option<JoinHandle<Option<CombatOutcome>>>,
}

impl CombatHandle {
    /// Queue a command. Returns false once the combat task has stopped.
    pub async fn send(&self, command: CombatCommand) -> bool {
        self.commands.send(command).await.is_ok()
    }

    pub async fn answer(&self, input: impl Into<String>) -> bool {
        self.send(CombatCommand::Answer(input.into())).await
    }

    /// Latest snapshot.
    pub fn view(&self) -> CombatView {
        self.view.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<CombatView> {
        self.view.clone()
    }

    /// Tear the session down without an outcome.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Wait for the combat to end. `None` when it was torn down first.
    pub async fn finish(mut self) -> Option<CombatOutcome> {
        let task = self.task.take()?;
        match task.await {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::error!(error = %e, "Combat task failed");
                None
            }
        }
    }
}

impl Drop for CombatHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

pub struct CombatDriver {
    clock: Arc<dyn ClockPort>,
    random: Arc<dyn RandomPort>,
    log_tail: usize,
}

impl CombatDriver {
    pub fn new(clock: Arc<dyn ClockPort>, random: Arc<dyn RandomPort>, log_tail: usize) -> Self {
        Self {
            clock,
            random,
            log_tail,
        }
    }

    /// Spawn the session on the current runtime.
    pub fn spawn(&self, session: CombatSession, tick: Duration) -> CombatHandle {
        let (command_tx, command_rx) = mpsc::channel(COMMAND_BUFFER);
        let (view_tx, view_rx) = watch::channel(session.view(self.log_tail));
        let cancel = CancellationToken::new();

        let runner = SessionRunner {
            session,
            rng: seeded_rng(self.random.as_ref()),
            clock: self.clock.clone(),
            view: view_tx,
            log_tail: self.log_tail,
            last_tick: Instant::now(),
        };
        let task = tokio::spawn(runner.run(command_rx, cancel.clone(), tick));

        CombatHandle {
            commands: command_tx,
            view: view_rx,
            cancel,
            task: Some(task),
        }
    }
}

struct SessionRunner {
    session: CombatSession,
    rng: StdRng,
    clock: Arc<dyn ClockPort>,
    view: watch::Sender<CombatView>,
    log_tail: usize,
    last_tick: Instant,
}

impl SessionRunner {
    async fn run(
        mut self,
        mut commands: mpsc::Receiver<CombatCommand>,
        cancel: CancellationToken,
        tick: Duration,
    ) -> Option<CombatOutcome> {
        let session_id = self.session.id();
        let mut interval = tokio::time::interval_at(self.last_tick + tick, tick);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        tracing::debug!(session_id = %session_id, "Combat driver started");

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    self.session.teardown();
                    tracing::debug!(session_id = %session_id, "Combat torn down");
                    return None;
                }
                _ = interval.tick() => {
                    self.catch_up();
                }
                command = commands.recv() => {
                    let Some(command) = command else {
                        self.session.teardown();
                        tracing::debug!(session_id = %session_id, "Command channel closed");
                        return None;
                    };
                    self.catch_up();
                    self.handle(command);
                }
            }

            self.view.send_replace(self.session.view(self.log_tail));

            if self.session.status().is_terminal() {
                let outcome = self.session.take_outcome();
                tracing::info!(
                    session_id = %session_id,
                    status = ?self.session.status(),
                    "Combat finished"
                );
                return outcome;
            }
        }
    }

    /// Feed the wall-clock time since the last update into the session.
    fn catch_up(&mut self) {
        let now = Instant::now();
        let elapsed = now.saturating_duration_since(self.last_tick);
        self.last_tick = now;

        for event in self
            .session
            .advance_clock(elapsed, &mut self.rng, self.clock.now())
        {
            tracing::debug!(session_id = %self.session.id(), ?event, "Combat clock event");
        }
    }

    fn handle(&mut self, command: CombatCommand) {
        let now = self.clock.now();
        match command {
            CombatCommand::Answer(input) => {
                let result = self.session.submit_answer(&input, &mut self.rng, now);
                if result == AnswerResult::Ignored {
                    tracing::debug!(session_id = %self.session.id(), "Answer ignored between rounds");
                } else {
                    tracing::debug!(session_id = %self.session.id(), ?result, "Answer resolved");
                }
            }
            CombatCommand::RequestRetreat => {
                self.session.request_retreat();
            }
            CombatCommand::CancelRetreat => self.session.cancel_retreat(),
            CombatCommand::ConfirmRetreat => {
                if let Err(e) = self.session.confirm_retreat(now) {
                    tracing::debug!(session_id = %self.session.id(), error = %e, "Retreat not confirmed");
                }
            }
        }
    }
}

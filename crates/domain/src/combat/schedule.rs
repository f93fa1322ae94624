//! Scheduled tasks owned by a combat session.
//!
//! Timers live in a small arena addressed by generation-checked handles.
//! Cancelling frees the slot and bumps its generation, so a stale handle can
//! never cancel or observe a task scheduled later in the same slot. Time only
//! moves when the owner calls [`TaskArena::pop_due`] / [`TaskArena::elapse`],
//! which keeps every firing deterministic.

use std::time::Duration;

/// What a scheduled task does when it fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskKind {
    /// Repeating countdown tick for the active round.
    Countdown,
    /// One-shot start of the next round after a resolved one.
    AdvanceRound,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskHandle {
    index: usize,
    generation: u32,
}

#[derive(Debug, Clone)]
struct ScheduledTask {
    kind: TaskKind,
    due_in: Duration,
    repeat: Option<Duration>,
}

#[derive(Debug, Clone, Default)]
struct Slot {
    generation: u32,
    task: Option<ScheduledTask>,
}

#[derive(Debug, Clone, Default)]
pub struct TaskArena {
    slots: Vec<Slot>,
    free: Vec<usize>,
}

impl TaskArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule_once(&mut self, kind: TaskKind, delay: Duration) -> TaskHandle {
        self.insert(ScheduledTask {
            kind,
            due_in: delay,
            repeat: None,
        })
    }

    /// Fire every `interval`, first after one interval. Zero intervals are
    /// bumped to 1ms so the arena always makes progress.
    pub fn schedule_repeating(&mut self, kind: TaskKind, interval: Duration) -> TaskHandle {
        let interval = interval.max(Duration::from_millis(1));
        self.insert(ScheduledTask {
            kind,
            due_in: interval,
            repeat: Some(interval),
        })
    }

    /// Cancel a task. Returns false for stale or already-cancelled handles.
    pub fn cancel(&mut self, handle: TaskHandle) -> bool {
        match self.slots.get_mut(handle.index) {
            Some(slot) if slot.generation == handle.generation && slot.task.is_some() => {
                slot.task = None;
                slot.generation = slot.generation.wrapping_add(1);
                self.free.push(handle.index);
                true
            }
            _ => false,
        }
    }

    pub fn cancel_all(&mut self) {
        for index in 0..self.slots.len() {
            if self.slots[index].task.is_some() {
                let generation = self.slots[index].generation;
                self.cancel(TaskHandle { index, generation });
            }
        }
    }

    pub fn is_scheduled(&self, handle: TaskHandle) -> bool {
        self.slots
            .get(handle.index)
            .is_some_and(|slot| slot.generation == handle.generation && slot.task.is_some())
    }

    pub fn pending(&self) -> usize {
        self.slots.iter().filter(|slot| slot.task.is_some()).count()
    }

    /// Fire the earliest task due within `budget`.
    ///
    /// Every pending task is moved forward by the time consumed. Repeating
    /// tasks are re-armed; one-shot tasks are released. Returns the fired
    /// task's handle and kind plus the time consumed, or `None` when nothing
    /// is due within the budget.
    pub fn pop_due(&mut self, budget: Duration) -> Option<(TaskHandle, TaskKind, Duration)> {
        let (index, due_in) = self
            .slots
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| slot.task.as_ref().map(|t| (i, t.due_in)))
            .filter(|(_, due_in)| *due_in <= budget)
            .min_by_key(|(i, due_in)| (*due_in, *i))?;

        self.elapse(due_in);

        let generation = self.slots[index].generation;
        let handle = TaskHandle { index, generation };
        let (kind, repeat) = {
            let task = self.slots[index].task.as_ref()?;
            (task.kind, task.repeat)
        };
        match repeat {
            Some(interval) => {
                if let Some(task) = self.slots[index].task.as_mut() {
                    task.due_in = interval;
                }
            }
            None => {
                self.cancel(handle);
            }
        }
        Some((handle, kind, due_in))
    }

    /// Move every pending task forward without firing anything.
    pub fn elapse(&mut self, elapsed: Duration) {
        for task in self.slots.iter_mut().filter_map(|slot| slot.task.as_mut()) {
            task.due_in = task.due_in.saturating_sub(elapsed);
        }
    }

    fn insert(&mut self, task: ScheduledTask) -> TaskHandle {
        match self.free.pop() {
            Some(index) => {
                self.slots[index].task = Some(task);
                TaskHandle {
                    index,
                    generation: self.slots[index].generation,
                }
            }
            None => {
                self.slots.push(Slot {
                    generation: 0,
                    task: Some(task),
                });
                TaskHandle {
                    index: self.slots.len() - 1,
                    generation: 0,
                }
            }
        }
    }
}

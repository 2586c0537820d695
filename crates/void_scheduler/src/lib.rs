//! # void_scheduler - Cooperative Job Scheduler
//!
//! Runs queued jobs in short, time-boxed slices and hands control back to
//! the host between slices so input stays responsive.
//!
//! ## Architecture
//!
//! ```text
//! schedule(job) ──► Job Queue ──► Slice (deadline = now + budget) ──► Step::Done
//!        │                              │
//!        ▼                              └──► Step::Pending (stays at front, resumes next slice)
//!  Transitions (Microtask | Message | Timer) ──► host wake ──► next slice
//! ```
//!
//! A job that cannot finish inside its slice returns [`Step::Pending`] and
//! keeps its own progress, so resuming it needs no coroutine machinery.

pub mod clock;
pub mod config;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{Deferral, SchedulerConfig};

use std::collections::VecDeque;
use std::time::Duration;

/// Outcome of running a job for one step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// The job finished and leaves the queue
    Done,
    /// The job has work left; it stays at the front of the queue
    Pending,
}

/// A resumable unit of work over a shared context `C`
pub trait Job<C> {
    /// Name used in logs
    fn name(&self) -> &str {
        "job"
    }

    /// Run until done or until the slice asks to yield
    fn run(&mut self, cx: &mut C, slice: &mut Slice<'_, C>) -> Step;
}

/// Something that accepts new jobs
pub trait Spawn<C> {
    /// Enqueue a job
    fn spawn(&mut self, job: Box<dyn Job<C>>);
}

/// One-shot job wrapping a closure
pub struct FnJob<F> {
    name: &'static str,
    func: Option<F>,
}

impl<F> FnJob<F> {
    /// Create a new function job
    pub fn new<C>(name: &'static str, func: F) -> Self
    where
        F: FnOnce(&mut C, &mut Slice<'_, C>),
    {
        Self {
            name,
            func: Some(func),
        }
    }
}

impl<C, F> Job<C> for FnJob<F>
where
    F: FnOnce(&mut C, &mut Slice<'_, C>),
{
    fn name(&self) -> &str {
        self.name
    }

    fn run(&mut self, cx: &mut C, slice: &mut Slice<'_, C>) -> Step {
        if let Some(func) = self.func.take() {
            func(cx, slice);
        }
        Step::Done
    }
}

/// View of the running slice handed to a job
pub struct Slice<'a, C> {
    queue: &'a mut VecDeque<Box<dyn Job<C>>>,
    transitions: &'a mut VecDeque<Deferral>,
    clock: &'a dyn Clock,
    deadline: Duration,
}

impl<'a, C> Slice<'a, C> {
    /// True once the slice budget is spent
    pub fn should_yield(&self) -> bool {
        self.clock.now() >= self.deadline
    }

    /// Deadline of this slice on the scheduler clock
    pub fn deadline(&self) -> Duration {
        self.deadline
    }

    /// Enqueue a job behind everything already queued.
    /// It may still run in this slice if budget remains.
    pub fn schedule(&mut self, job: Box<dyn Job<C>>) {
        self.queue.push_back(job);
        self.transitions.push_back(Deferral::Microtask);
    }

    /// Number of jobs waiting behind the running one
    pub fn queued(&self) -> usize {
        self.queue.len()
    }
}

impl<'a, C> Spawn<C> for Slice<'a, C> {
    fn spawn(&mut self, job: Box<dyn Job<C>>) {
        self.schedule(job);
    }
}

/// Scheduler statistics
#[derive(Debug, Clone, Default)]
pub struct SchedulerStats {
    /// Slices opened
    pub slices: u64,
    /// Jobs that ran to completion
    pub jobs_completed: u64,
    /// Times a job yielded and stayed queued
    pub jobs_resumed: u64,
    /// Wall time spent in the last slice
    pub last_slice: Duration,
    /// Longest queue observed at the start of a slice
    pub peak_queue: usize,
}

/// Time-sliced FIFO job scheduler
pub struct Scheduler<C> {
    config: SchedulerConfig,
    clock: Box<dyn Clock>,
    /// Ready jobs, front runs first
    queue: VecDeque<Box<dyn Job<C>>>,
    /// Pending slice requests, consumed one per wake
    transitions: VecDeque<Deferral>,
    deadline: Duration,
    stats: SchedulerStats,
}

impl<C> Scheduler<C> {
    /// Create a scheduler driven by the system clock
    pub fn new(config: SchedulerConfig) -> Self {
        Self::with_clock(config, Box::new(SystemClock::new()))
    }

    /// Create a scheduler with a custom clock
    pub fn with_clock(config: SchedulerConfig, clock: Box<dyn Clock>) -> Self {
        Self {
            config,
            clock,
            queue: VecDeque::new(),
            transitions: VecDeque::new(),
            deadline: Duration::ZERO,
            stats: SchedulerStats::default(),
        }
    }

    /// Enqueue a job and request a slice
    pub fn schedule(&mut self, job: Box<dyn Job<C>>) {
        log::trace!("Scheduled job '{}' ({} queued)", job.name(), self.queue.len() + 1);
        self.queue.push_back(job);
        self.start_transition_kind(Deferral::Microtask);
    }

    /// Enqueue a one-shot callback
    pub fn start_transition<F>(&mut self, func: F)
    where
        F: FnOnce(&mut C) + 'static,
        C: 'static,
    {
        self.schedule(Box::new(FnJob::new("transition", move |cx: &mut C, _: &mut Slice<'_, C>| {
            func(cx)
        })));
    }

    fn start_transition_kind(&mut self, kind: Deferral) {
        self.transitions.push_back(kind);
    }

    /// True once the current slice budget is spent
    pub fn should_yield(&self) -> bool {
        self.clock.now() >= self.deadline
    }

    /// Deferral the host should use for the next wake, if any
    pub fn next_deferral(&self) -> Option<Deferral> {
        self.transitions.front().copied()
    }

    /// Consume one pending slice request and run it.
    /// Returns false when nothing was pending.
    pub fn wake(&mut self, cx: &mut C) -> bool {
        match self.transitions.pop_front() {
            Some(_) => {
                self.flush(cx);
                true
            }
            None => false,
        }
    }

    /// Keep waking until no slice is requested. Returns slices that did work.
    pub fn run_until_idle(&mut self, cx: &mut C) -> u64 {
        let before = self.stats.slices;
        while self.wake(cx) {}
        self.stats.slices - before
    }

    /// Run one slice now.
    ///
    /// The front job always gets one step so every slice makes progress,
    /// even when the clock has already passed the deadline.
    pub fn flush(&mut self, cx: &mut C) {
        if self.queue.is_empty() {
            return;
        }

        let started = self.clock.now();
        self.deadline = started.saturating_add(self.config.slice_budget());
        self.stats.slices += 1;
        self.stats.peak_queue = self.stats.peak_queue.max(self.queue.len());

        let mut first = true;
        while first || !self.should_yield() {
            first = false;
            let Some(mut job) = self.queue.pop_front() else {
                break;
            };

            let step = {
                let mut slice = Slice {
                    queue: &mut self.queue,
                    transitions: &mut self.transitions,
                    clock: self.clock.as_ref(),
                    deadline: self.deadline,
                };
                job.run(cx, &mut slice)
            };

            match step {
                Step::Done => {
                    self.stats.jobs_completed += 1;
                    log::trace!("Job '{}' completed", job.name());
                }
                Step::Pending => {
                    self.stats.jobs_resumed += 1;
                    log::trace!("Job '{}' yielded", job.name());
                    self.queue.push_front(job);
                }
            }
        }

        let ended = self.clock.now();
        self.stats.last_slice = ended.saturating_sub(started);

        if !self.queue.is_empty() {
            let kind = if ended >= self.deadline {
                self.config.continuation
            } else {
                Deferral::Microtask
            };
            log::trace!("Slice ended with {} jobs left, deferring via {:?}", self.queue.len(), kind);
            self.start_transition_kind(kind);
        }
    }

    /// Number of queued jobs
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// Check if no job is queued
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Number of pending slice requests
    pub fn pending_transitions(&self) -> usize {
        self.transitions.len()
    }

    /// Get statistics
    pub fn stats(&self) -> &SchedulerStats {
        &self.stats
    }

    /// Get configuration
    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }
}

impl<C> Spawn<C> for Scheduler<C> {
    fn spawn(&mut self, job: Box<dyn Job<C>>) {
        self.schedule(job);
    }
}

/// Prelude
pub mod prelude {
    pub use crate::{
        Clock, Deferral, FnJob, Job, ManualClock, Scheduler, SchedulerConfig, SchedulerStats,
        Slice, Spawn, Step, SystemClock,
    };
}

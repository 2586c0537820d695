//! Integration tests for void_scheduler

use std::time::Duration;
use void_scheduler::prelude::*;

/// Simulated unit of work: each step costs one clock reading
struct Counter {
    id: usize,
    remaining: u32,
}

impl Job<Vec<usize>> for Counter {
    fn run(&mut self, done: &mut Vec<usize>, slice: &mut Slice<'_, Vec<usize>>) -> Step {
        while self.remaining > 0 {
            self.remaining -= 1;
            if self.remaining > 0 && slice.should_yield() {
                return Step::Pending;
            }
        }
        done.push(self.id);
        Step::Done
    }
}

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[test]
fn test_many_jobs_complete_in_bounded_slices() {
    init_logger();
    let clock = ManualClock::with_step(Duration::from_millis(1));
    let mut scheduler: Scheduler<Vec<usize>> =
        Scheduler::with_clock(SchedulerConfig::default(), Box::new(clock));
    let mut done = Vec::new();

    let jobs = 10;
    let work_per_job = 12;
    for id in 0..jobs {
        scheduler.schedule(Box::new(Counter {
            id,
            remaining: work_per_job,
        }));
    }

    let slices = scheduler.run_until_idle(&mut done);

    assert_eq!(done, (0..jobs).collect::<Vec<_>>());
    // Every slice makes progress, so slices are bounded by the total work
    assert!(slices as usize <= jobs * work_per_job as usize);
    assert!(slices > 1);
    assert!(scheduler.is_empty());
    assert_eq!(scheduler.pending_transitions(), 0);
}

#[test]
fn test_zero_budget_still_makes_progress() {
    let config = SchedulerConfig::default().with_slice_budget(Duration::ZERO);
    let mut scheduler: Scheduler<Vec<usize>> =
        Scheduler::with_clock(config, Box::new(ManualClock::new()));
    let mut done = Vec::new();

    scheduler.schedule(Box::new(Counter { id: 7, remaining: 3 }));
    scheduler.schedule(Box::new(Counter { id: 8, remaining: 1 }));
    scheduler.run_until_idle(&mut done);

    assert_eq!(done, vec![7, 8]);
}

#[test]
fn test_continuation_deferral_is_configurable() {
    let clock = ManualClock::with_step(Duration::from_millis(3));
    let config = SchedulerConfig::default().with_continuation(Deferral::Timer);
    let mut scheduler: Scheduler<Vec<usize>> = Scheduler::with_clock(config, Box::new(clock));
    let mut done = Vec::new();

    scheduler.schedule(Box::new(Counter { id: 1, remaining: 10 }));
    assert_eq!(scheduler.next_deferral(), Some(Deferral::Microtask));
    scheduler.wake(&mut done);

    assert!(done.is_empty());
    assert_eq!(scheduler.next_deferral(), Some(Deferral::Timer));
}

#[test]
fn test_transitions_batch_into_one_slice() {
    let mut scheduler: Scheduler<Vec<usize>> =
        Scheduler::with_clock(SchedulerConfig::default(), Box::new(ManualClock::new()));
    let mut done = Vec::new();

    for id in 0..4 {
        scheduler.start_transition(move |d: &mut Vec<usize>| d.push(id));
    }
    assert_eq!(scheduler.pending_transitions(), 4);

    // The first wake drains the whole queue, the rest find nothing to do
    scheduler.wake(&mut done);
    assert_eq!(done, vec![0, 1, 2, 3]);
    assert_eq!(scheduler.stats().slices, 1);

    scheduler.run_until_idle(&mut done);
    assert_eq!(scheduler.stats().slices, 1);
}

#[test]
fn test_unbounded_budget_runs_in_one_slice() {
    let clock = ManualClock::with_step(Duration::from_millis(1));
    let config = SchedulerConfig::default().with_slice_budget(Duration::MAX);
    let mut scheduler: Scheduler<Vec<usize>> = Scheduler::with_clock(config, Box::new(clock));
    let mut done = Vec::new();

    scheduler.schedule(Box::new(Counter { id: 1, remaining: 50 }));
    scheduler.schedule(Box::new(Counter { id: 2, remaining: 50 }));
    scheduler.run_until_idle(&mut done);

    assert_eq!(done, vec![1, 2]);
    assert_eq!(scheduler.stats().slices, 1);
}

//! Scheduler configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// How the host should defer the next slice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Deferral {
    /// Run right after the current host task (queueMicrotask)
    Microtask,
    /// Run as a fresh host task so input can be handled first (MessageChannel)
    Message,
    /// Run from a zero-delay timer (setTimeout)
    Timer,
}

/// Scheduler configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Time budget of a single slice in milliseconds
    pub slice_budget_ms: f64,
    /// Deferral used when a slice ran out of budget with work left.
    /// Hosts without a message channel should pick `Timer`.
    pub continuation: Deferral,
}

impl SchedulerConfig {
    /// Set the slice budget
    pub fn with_slice_budget(mut self, budget: Duration) -> Self {
        self.slice_budget_ms = budget.as_secs_f64() * 1000.0;
        self
    }

    /// Set the continuation deferral
    pub fn with_continuation(mut self, deferral: Deferral) -> Self {
        self.continuation = deferral;
        self
    }

    /// Slice budget as a duration. Negative and NaN budgets clamp to zero,
    /// budgets beyond the range of `Duration` saturate.
    pub fn slice_budget(&self) -> Duration {
        let secs = self.slice_budget_ms.max(0.0) / 1000.0;
        Duration::try_from_secs_f64(secs).unwrap_or(Duration::MAX)
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            slice_budget_ms: 5.0,
            continuation: Deferral::Message,
        }
    }
}

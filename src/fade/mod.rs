// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Adaptive fade stepping.
//!
//! A fade moves a channel's level toward its target in discrete steps, each
//! one scheduled as a delayed callback. Nothing is precomputed: every tick
//! looks at how far the level still has to travel and how much time is left
//! before the deadline, then picks both the next step size and the delay
//! before it.
//!
//! The finest useful step is one unit of the output's duty resolution
//! ([`min_step_size`]). Spreading the remaining time over that many steps can
//! ask for delays shorter than the timer can honor, so the delay is floored at
//! [`MIN_STEP_TIME`] and the step size grows by the same factor. The number of
//! callbacks is therefore bounded while the deadline is still met.
//!
//! ```
//! use std::time::Duration;
//! use ledctl_lib::fade::{plan_step, min_step_size, MIN_STEP_TIME};
//!
//! // 0 -> 100 over 2 s on a 1024-step PWM pin: 1024 steps would need ~2 ms
//! // each, so the planner waits 10 ms and moves half a percent per step.
//! let step = plan_step(0.0, 100.0, Some(Duration::from_secs(2)), min_step_size(1024));
//! assert_eq!(step.interval, MIN_STEP_TIME);
//! assert!((step.level - 0.5).abs() < 1e-9);
//! ```

use std::time::Duration;

use tokio::task::AbortHandle;
use tokio::time::Instant;

use crate::types::MAX_LEVEL;

/// Shortest delay between two fade steps (caps the step rate at 100 Hz).
pub const MIN_STEP_TIME: Duration = Duration::from_millis(10);

/// Returns the level distance of one duty-cycle unit at `resolution`.
#[must_use]
pub fn min_step_size(resolution: u32) -> f64 {
    MAX_LEVEL / f64::from(resolution.max(1))
}

/// The next scheduled step of a fade.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FadeStep {
    /// Delay before the step is applied.
    pub interval: Duration,
    /// Candidate level the step moves to.
    pub level: f64,
}

impl FadeStep {
    /// A step that lands on `target` without waiting.
    #[must_use]
    pub fn immediate(target: f64) -> Self {
        Self {
            interval: Duration::ZERO,
            level: target,
        }
    }
}

/// Plans the next step from `level` toward `target`.
///
/// `time_remaining` is `None` once the deadline has passed (or the clock went
/// backwards). A fade with no time left, or no distance left, gets an
/// immediate step that lands on the target.
#[must_use]
pub fn plan_step(
    level: f64,
    target: f64,
    time_remaining: Option<Duration>,
    min_step_size: f64,
) -> FadeStep {
    let distance = target - level;
    let steps_remaining = distance.abs() / min_step_size;

    let Some(time_remaining) = time_remaining.filter(|t| !t.is_zero()) else {
        return FadeStep::immediate(target);
    };
    if !steps_remaining.is_finite() || steps_remaining <= 0.0 {
        return FadeStep::immediate(target);
    }
    if steps_remaining < 1.0 {
        // Less than one duty unit left: land on the target when time runs out.
        return FadeStep {
            interval: time_remaining.max(MIN_STEP_TIME),
            level: target,
        };
    }

    let raw_interval = time_remaining.as_secs_f64() / steps_remaining;
    let interval = raw_interval.max(MIN_STEP_TIME.as_secs_f64());

    // Fewer, larger steps when the interval was floored.
    let step_count = steps_remaining * raw_interval / interval;
    let step_size = distance / step_count;

    FadeStep {
        interval: Duration::from_secs_f64(interval),
        level: level + step_size,
    }
}

/// Plans the next step against an absolute deadline.
#[must_use]
pub fn next_step(
    level: f64,
    target: f64,
    deadline: Instant,
    now: Instant,
    min_step_size: f64,
) -> FadeStep {
    plan_step(
        level,
        target,
        deadline.checked_duration_since(now),
        min_step_size,
    )
}

/// Returns `true` if applying `candidate` finishes the fade.
///
/// A fade finishes when the candidate reaches or crosses the target in the
/// direction of travel, or when the deadline has passed.
#[must_use]
pub fn is_terminal(level: f64, target: f64, candidate: f64, deadline: Instant, now: Instant) -> bool {
    let reached = if target > level {
        candidate >= target
    } else {
        candidate <= target
    };
    reached || now >= deadline
}

/// The active step chain of one channel.
///
/// A channel holds at most one job. Starting another fade cancels the
/// current job first.
#[derive(Debug)]
pub struct FadeJob {
    from: f64,
    to: f64,
    deadline: Instant,
    generation: u64,
    handle: AbortHandle,
}

impl FadeJob {
    pub(crate) fn new(
        from: f64,
        to: f64,
        deadline: Instant,
        generation: u64,
        handle: AbortHandle,
    ) -> Self {
        Self {
            from,
            to,
            deadline,
            generation,
            handle,
        }
    }

    /// Level the fade started from.
    #[must_use]
    pub fn from_level(&self) -> f64 {
        self.from
    }

    /// Level the fade is driving toward.
    #[must_use]
    pub fn to_level(&self) -> f64 {
        self.to
    }

    /// When the target must be reached.
    #[must_use]
    pub fn deadline(&self) -> Instant {
        self.deadline
    }

    /// Identifier that step callbacks compare against before applying.
    #[must_use]
    pub(crate) fn generation(&self) -> u64 {
        self.generation
    }

    /// Stops the step chain.
    pub(crate) fn cancel(self) {
        self.handle.abort();
    }
}

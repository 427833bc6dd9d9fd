// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! A dimmable output channel and its fade job.
//!
//! [`Channel`] is the PWM-like building block: a standalone dimmer is one
//! channel, a color light is three. Every level change reduces to
//! [`Channel::fade`], which either writes the target immediately or spawns a
//! step chain on the tokio runtime.
//!
//! All mutable state sits behind one `parking_lot::Mutex`. A step task only
//! holds the lock while it plans or applies a step, never across the sleep
//! between steps. Each fade bumps a generation counter; a step task whose
//! generation no longer matches exits without touching the channel, so an
//! aborted task that was already waiting on the lock cannot apply a stale
//! step.

use std::sync::{Arc, Weak};
use std::time::Duration;

use parking_lot::{Mutex, MutexGuard, RwLock};
use tokio::runtime::Handle;
use tokio::time::Instant;

use crate::error::OutputError;
use crate::fade::{self, FadeJob, FadeStep};
use crate::output::PwmOutput;
use crate::types::{Level, MAX_LEVEL, TogglingDirection};

use super::CompletionHook;

/// Mutable part of a channel.
#[derive(Debug)]
pub(crate) struct ChannelState {
    level: f64,
    target: f64,
    last_on_level: f64,
    toggling: TogglingDirection,
    job: Option<FadeJob>,
    generation: u64,
}

impl ChannelState {
    pub(crate) fn target(&self) -> f64 {
        self.target
    }

    pub(crate) fn toggling(&self) -> TogglingDirection {
        self.toggling
    }

    pub(crate) fn clear_toggling(&mut self) {
        self.toggling = TogglingDirection::Idle;
    }

    fn cancel_job(&mut self) {
        if let Some(job) = self.job.take() {
            job.cancel();
        }
    }
}

/// Result of applying one scheduled step.
enum StepOutcome {
    Continue,
    Finished,
    Stopped,
}

/// A dimmable output (direct PWM pin or driver channel).
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use std::time::Duration;
/// use ledctl_lib::device::Channel;
/// use ledctl_lib::output::{MemoryGpio, PwmOutput};
/// use ledctl_lib::types::Level;
///
/// let gpio = Arc::new(MemoryGpio::new());
/// let channel = Channel::new("desk", PwmOutput::pin(gpio.clone(), 18), Level::MIN).unwrap();
///
/// // A zero-duration fade is applied synchronously
/// channel.fade(Level::clamped(50.0), Duration::ZERO).unwrap();
/// assert_eq!(channel.level().rounded(), 50);
/// assert_eq!(gpio.duty(18), Some(512));
/// ```
pub struct Channel {
    name: String,
    output: PwmOutput,
    min_step: f64,
    state: Mutex<ChannelState>,
    on_complete: RwLock<Option<CompletionHook>>,
}

impl Channel {
    /// Creates a channel and writes its initial level.
    ///
    /// `last_on_level` starts at the initial level when it is lit, otherwise at
    /// full brightness.
    ///
    /// # Errors
    ///
    /// Returns the output error if the initial write fails.
    pub fn new(
        name: impl Into<String>,
        output: PwmOutput,
        initial: Level,
    ) -> Result<Arc<Self>, OutputError> {
        let level = initial.value();
        output.write(initial)?;

        Ok(Arc::new(Self {
            name: name.into(),
            min_step: fade::min_step_size(output.resolution()),
            output,
            state: Mutex::new(ChannelState {
                level,
                target: level,
                last_on_level: if initial.is_on() { level } else { MAX_LEVEL },
                toggling: TogglingDirection::Idle,
                job: None,
                generation: 0,
            }),
            on_complete: RwLock::new(None),
        }))
    }

    /// Returns the channel name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the output this channel writes to.
    #[must_use]
    pub fn output(&self) -> &PwmOutput {
        &self.output
    }

    /// Returns the live level (moves while a fade runs).
    #[must_use]
    pub fn level(&self) -> Level {
        Level::clamped(self.state.lock().level)
    }

    /// Returns the level the channel is driving toward.
    #[must_use]
    pub fn target(&self) -> Level {
        Level::clamped(self.state.lock().target)
    }

    /// Returns the level restored by [`on`](Self::on).
    #[must_use]
    pub fn last_on_level(&self) -> Level {
        Level::clamped(self.state.lock().last_on_level)
    }

    /// Returns the direction of the toggle in progress, if any.
    #[must_use]
    pub fn toggling(&self) -> TogglingDirection {
        self.state.lock().toggling
    }

    /// Returns `true` while a fade job is scheduled.
    #[must_use]
    pub fn is_fading(&self) -> bool {
        self.state.lock().job.is_some()
    }

    /// Registers the hook called when a scheduled fade reaches its target.
    ///
    /// Replaces any previous hook. Instantaneous changes do not call it.
    pub fn on_fade_complete(&self, hook: CompletionHook) {
        *self.on_complete.write() = Some(hook);
    }

    pub(crate) fn lock(&self) -> MutexGuard<'_, ChannelState> {
        self.state.lock()
    }

    // ========================================================================
    // Operations
    // ========================================================================

    /// Fades to `level` over `duration`, cancelling any fade in progress.
    ///
    /// # Errors
    ///
    /// Returns the output error if an immediate write fails. The level stays
    /// at the last value written.
    pub fn fade(self: &Arc<Self>, level: Level, duration: Duration) -> Result<(), OutputError> {
        let mut state = self.state.lock();
        self.fade_locked(&mut state, level.value(), duration, TogglingDirection::Idle)
    }

    /// Sets `level` immediately.
    ///
    /// # Errors
    ///
    /// Returns the output error if the write fails.
    pub fn set(self: &Arc<Self>, level: Level) -> Result<(), OutputError> {
        self.fade(level, Duration::ZERO)
    }

    /// Fades back to the last lit level.
    ///
    /// # Errors
    ///
    /// Returns the output error if an immediate write fails.
    pub fn on(self: &Arc<Self>, duration: Duration) -> Result<(), OutputError> {
        let mut state = self.state.lock();
        self.on_locked(&mut state, duration, TogglingDirection::Idle)
    }

    /// Fades to zero, remembering the current target for the next `on`.
    ///
    /// # Errors
    ///
    /// Returns the output error if an immediate write fails.
    pub fn off(self: &Arc<Self>, duration: Duration) -> Result<(), OutputError> {
        let mut state = self.state.lock();
        self.off_locked(&mut state, duration, TogglingDirection::Idle)
    }

    /// Turns the channel off if it is lit or going on, on otherwise.
    ///
    /// A toggle issued while an earlier toggle is still fading reverses it.
    ///
    /// # Errors
    ///
    /// Returns the output error if an immediate write fails.
    pub fn toggle(self: &Arc<Self>, duration: Duration) -> Result<(), OutputError> {
        let mut state = self.state.lock();
        let direction = state.toggling.next(state.target > 0.0);
        tracing::debug!(channel = %self.name, ?direction, "Toggling");
        self.toggle_locked(&mut state, direction, duration)
    }

    /// Raises the target by `delta`.
    ///
    /// # Errors
    ///
    /// Returns the output error if an immediate write fails.
    pub fn increase(self: &Arc<Self>, delta: f64, duration: Duration) -> Result<(), OutputError> {
        let mut state = self.state.lock();
        let target = state.target + delta;
        self.fade_locked(&mut state, target, duration, TogglingDirection::Idle)
    }

    /// Lowers the target by `delta`.
    ///
    /// # Errors
    ///
    /// Returns the output error if an immediate write fails.
    pub fn decrease(self: &Arc<Self>, delta: f64, duration: Duration) -> Result<(), OutputError> {
        self.increase(-delta, duration)
    }

    /// Fades up to `level` if the target is below it; otherwise leaves the
    /// level alone.
    ///
    /// # Errors
    ///
    /// Returns the output error if an immediate write fails.
    pub fn ramp_up_to(self: &Arc<Self>, level: Level, duration: Duration) -> Result<(), OutputError> {
        let mut state = self.state.lock();
        self.ramp_locked(&mut state, level.value(), duration, |target, bound| target < bound)
    }

    /// Fades down to `level` if the target is above it; otherwise leaves the
    /// level alone.
    ///
    /// # Errors
    ///
    /// Returns the output error if an immediate write fails.
    pub fn ramp_down_to(
        self: &Arc<Self>,
        level: Level,
        duration: Duration,
    ) -> Result<(), OutputError> {
        let mut state = self.state.lock();
        self.ramp_locked(&mut state, level.value(), duration, |target, bound| target > bound)
    }

    // ========================================================================
    // Locked primitives (shared with ColorLight)
    // ========================================================================

    pub(crate) fn on_locked(
        self: &Arc<Self>,
        state: &mut ChannelState,
        duration: Duration,
        toggling: TogglingDirection,
    ) -> Result<(), OutputError> {
        let target = state.last_on_level;
        self.fade_locked(state, target, duration, toggling)
    }

    pub(crate) fn off_locked(
        self: &Arc<Self>,
        state: &mut ChannelState,
        duration: Duration,
        toggling: TogglingDirection,
    ) -> Result<(), OutputError> {
        if state.toggling.is_idle() && state.target > 0.0 {
            state.last_on_level = state.target;
        }
        self.fade_locked(state, 0.0, duration, toggling)
    }

    pub(crate) fn toggle_locked(
        self: &Arc<Self>,
        state: &mut ChannelState,
        direction: TogglingDirection,
        duration: Duration,
    ) -> Result<(), OutputError> {
        match direction {
            TogglingDirection::GoingOn => self.on_locked(state, duration, direction),
            TogglingDirection::GoingOff => self.off_locked(state, duration, direction),
            TogglingDirection::Idle => Ok(()),
        }
    }

    pub(crate) fn ramp_locked(
        self: &Arc<Self>,
        state: &mut ChannelState,
        bound: f64,
        duration: Duration,
        needs_move: impl Fn(f64, f64) -> bool,
    ) -> Result<(), OutputError> {
        state.clear_toggling();
        if needs_move(state.target, bound) {
            self.fade_locked(state, bound, duration, TogglingDirection::Idle)
        } else {
            Ok(())
        }
    }

    /// Starts a fade with the lock held.
    ///
    /// Cancels the current job. With no distance or no time the target is
    /// written right away; otherwise a step task is spawned.
    pub(crate) fn fade_locked(
        self: &Arc<Self>,
        state: &mut ChannelState,
        target: f64,
        duration: Duration,
        toggling: TogglingDirection,
    ) -> Result<(), OutputError> {
        let target = Level::clamped(target).value();
        state.cancel_job();
        state.generation = state.generation.wrapping_add(1);
        state.toggling = toggling;

        #[allow(clippy::float_cmp)]
        let settled = state.level == target;
        if settled || duration.is_zero() {
            return self.write_now(state, target);
        }

        let Ok(runtime) = Handle::try_current() else {
            tracing::warn!(channel = %self.name, "No async runtime, applying fade immediately");
            return self.write_now(state, target);
        };

        state.target = target;
        let deadline = Instant::now() + duration;
        let generation = state.generation;
        let task = runtime.spawn(run_steps(Arc::downgrade(self), generation));
        state.job = Some(FadeJob::new(
            state.level,
            target,
            deadline,
            generation,
            task.abort_handle(),
        ));

        tracing::debug!(
            channel = %self.name,
            from = state.level,
            to = target,
            duration_ms = duration.as_millis(),
            "Fade started"
        );
        Ok(())
    }

    fn write_now(&self, state: &mut ChannelState, target: f64) -> Result<(), OutputError> {
        state.toggling = TogglingDirection::Idle;
        if let Err(e) = self.output.write(Level::clamped(target)) {
            state.target = state.level;
            return Err(e);
        }
        state.level = target;
        state.target = target;
        tracing::trace!(channel = %self.name, level = target, "Level set");
        Ok(())
    }

    // ========================================================================
    // Step chain
    // ========================================================================

    fn plan(&self, generation: u64) -> Option<FadeStep> {
        let state = self.state.lock();
        let job = state.job.as_ref().filter(|j| j.generation() == generation)?;
        Some(fade::next_step(
            state.level,
            state.target,
            job.deadline(),
            Instant::now(),
            self.min_step,
        ))
    }

    fn apply_step(&self, generation: u64, candidate: f64) -> StepOutcome {
        let mut state = self.state.lock();
        let Some(deadline) = state
            .job
            .as_ref()
            .filter(|j| j.generation() == generation)
            .map(FadeJob::deadline)
        else {
            return StepOutcome::Stopped;
        };

        let terminal =
            fade::is_terminal(state.level, state.target, candidate, deadline, Instant::now());
        let next = if terminal { state.target } else { candidate };

        if let Err(e) = self.output.write(Level::clamped(next)) {
            tracing::error!(channel = %self.name, error = %e, "Fade step write failed, stopping");
            state.target = state.level;
            state.toggling = TogglingDirection::Idle;
            state.job = None;
            return StepOutcome::Stopped;
        }

        state.level = next;
        tracing::trace!(channel = %self.name, level = next, "Fade step");

        if terminal {
            state.toggling = TogglingDirection::Idle;
            state.job = None;
            tracing::debug!(channel = %self.name, level = next, "Fade complete");
            StepOutcome::Finished
        } else {
            StepOutcome::Continue
        }
    }

    fn notify_complete(&self) {
        let hook = self.on_complete.read().clone();
        if let Some(hook) = hook {
            hook();
        }
    }
}

impl std::fmt::Debug for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock();
        f.debug_struct("Channel")
            .field("name", &self.name)
            .field("output", &self.output)
            .field("level", &state.level)
            .field("target", &state.target)
            .field("toggling", &state.toggling)
            .finish_non_exhaustive()
    }
}

/// Drives one fade job until it finishes, fails, or is superseded.
async fn run_steps(channel: Weak<Channel>, generation: u64) {
    loop {
        let Some(step) = channel.upgrade().and_then(|c| c.plan(generation)) else {
            return;
        };

        tokio::time::sleep(step.interval).await;

        let Some(channel) = channel.upgrade() else {
            return;
        };
        match channel.apply_step(generation, step.level) {
            StepOutcome::Continue => {}
            StepOutcome::Finished => {
                channel.notify_complete();
                return;
            }
            StepOutcome::Stopped => return,
        }
    }
}

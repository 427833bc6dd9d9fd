// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Three-channel color light.
//!
//! A [`ColorLight`] owns a red, a green and a blue [`Channel`]. Color requests
//! are split into three per-channel fades of the same duration; the color is
//! never stored, it is derived from the channel levels when read.
//!
//! Operations that touch more than one channel take the remembered color lock
//! first, then the channel locks in red, green, blue order. Channel step tasks
//! only ever hold their own lock, so this order cannot deadlock against them.
//!
//! Each channel reports fade completion to the light through a hook holding a
//! weak reference. Once no channel is fading any more the light forwards the
//! completion to its own listener.

use std::sync::{Arc, Weak};
use std::time::Duration;

use parking_lot::{Mutex, MutexGuard, RwLock};

use crate::error::OutputError;
use crate::output::PwmOutput;
use crate::types::{Level, RgbColor, TogglingDirection};

use super::channel::ChannelState;
use super::{Channel, CompletionHook};

const CHANNEL_NAMES: [&str; 3] = ["red", "green", "blue"];

/// A color light made of three dimmable channels.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use std::time::Duration;
/// use ledctl_lib::device::ColorLight;
/// use ledctl_lib::output::{MemoryGpio, PwmOutput};
/// use ledctl_lib::types::RgbColor;
///
/// let gpio = Arc::new(MemoryGpio::new());
/// let outputs = [17, 27, 22].map(|pin| PwmOutput::pin(gpio.clone(), pin));
/// let light = ColorLight::new("shelf", outputs, RgbColor::black()).unwrap();
///
/// light.fade_to(RgbColor::new(255, 0, 0), Duration::ZERO).unwrap();
/// assert_eq!(light.color().to_html(), "#ff0000");
/// assert_eq!(gpio.duty(17), Some(1024));
/// ```
pub struct ColorLight {
    name: String,
    channels: [Arc<Channel>; 3],
    last_on: Mutex<RgbColor>,
    listener: RwLock<Option<CompletionHook>>,
}

impl ColorLight {
    /// Creates a color light and writes its initial color.
    ///
    /// The remembered color starts at the initial color when it is lit,
    /// otherwise at white.
    ///
    /// # Errors
    ///
    /// Returns the output error if any initial write fails.
    pub fn new(
        name: impl Into<String>,
        outputs: [PwmOutput; 3],
        initial: RgbColor,
    ) -> Result<Arc<Self>, OutputError> {
        let name = name.into();
        let [red, green, blue] = outputs;
        let [r, g, b] = initial.levels();

        let channels = [
            Channel::new(format!("{name}.{}", CHANNEL_NAMES[0]), red, r)?,
            Channel::new(format!("{name}.{}", CHANNEL_NAMES[1]), green, g)?,
            Channel::new(format!("{name}.{}", CHANNEL_NAMES[2]), blue, b)?,
        ];

        let light = Arc::new(Self {
            name,
            channels,
            last_on: Mutex::new(if initial.is_lit() {
                initial
            } else {
                RgbColor::white()
            }),
            listener: RwLock::new(None),
        });

        for channel in &light.channels {
            let parent = Arc::downgrade(&light);
            channel.on_fade_complete(Arc::new(move || Self::channel_settled(&parent)));
        }

        Ok(light)
    }

    /// Returns the light name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the red, green and blue channels.
    #[must_use]
    pub fn channels(&self) -> &[Arc<Channel>; 3] {
        &self.channels
    }

    /// Returns the live color derived from the channel levels.
    #[must_use]
    pub fn color(&self) -> RgbColor {
        RgbColor::from_levels(self.channels.each_ref().map(|c| c.level()))
    }

    /// Returns the color the channels are driving toward.
    #[must_use]
    pub fn target_color(&self) -> RgbColor {
        RgbColor::from_levels(self.channels.each_ref().map(|c| c.target()))
    }

    /// Returns the color restored by [`on`](Self::on).
    #[must_use]
    pub fn last_on_color(&self) -> RgbColor {
        *self.last_on.lock()
    }

    /// Returns `true` while any channel is fading.
    #[must_use]
    pub fn is_fading(&self) -> bool {
        self.channels.iter().any(|c| c.is_fading())
    }

    /// Registers the hook called once all channels have settled.
    pub fn on_fade_complete(&self, hook: CompletionHook) {
        *self.listener.write() = Some(hook);
    }

    // ========================================================================
    // Operations
    // ========================================================================

    /// Fades all three channels to `color` over `duration`.
    ///
    /// # Errors
    ///
    /// Returns the first output error. Every channel is still attempted.
    pub fn fade_to(&self, color: RgbColor, duration: Duration) -> Result<(), OutputError> {
        tracing::debug!(light = %self.name, color = %color, "Fading to color");
        let _last_on = self.last_on.lock();
        self.fade_channels(color, duration, TogglingDirection::Idle)
    }

    /// Fades back to the remembered color.
    ///
    /// # Errors
    ///
    /// Returns the first output error.
    pub fn on(&self, duration: Duration) -> Result<(), OutputError> {
        let last_on = self.last_on.lock();
        self.fade_channels(*last_on, duration, TogglingDirection::Idle)
    }

    /// Fades to black, remembering the current target color.
    ///
    /// # Errors
    ///
    /// Returns the first output error.
    pub fn off(&self, duration: Duration) -> Result<(), OutputError> {
        let mut last_on = self.last_on.lock();
        let mut states = self.channels.each_ref().map(|c| c.lock());
        let target = Self::target_of(&states);
        if states.iter().all(|s| s.toggling().is_idle()) && target.is_lit() {
            *last_on = target;
        }
        Self::apply(&self.channels, &mut states, RgbColor::black(), duration, TogglingDirection::Idle)
    }

    /// Toggles all three channels in the same direction.
    ///
    /// A channel still going off (or on) from an earlier toggle decides the
    /// direction; otherwise a lit light goes off and a dark one goes on.
    ///
    /// # Errors
    ///
    /// Returns the first output error.
    pub fn toggle(&self, duration: Duration) -> Result<(), OutputError> {
        let mut last_on = self.last_on.lock();
        let mut states = self.channels.each_ref().map(|c| c.lock());

        let toggling = states.iter().map(|s| s.toggling()).fold(
            TogglingDirection::Idle,
            |acc, dir| match (acc, dir) {
                (TogglingDirection::GoingOff, _) | (_, TogglingDirection::GoingOff) => {
                    TogglingDirection::GoingOff
                }
                (TogglingDirection::GoingOn, _) | (_, TogglingDirection::GoingOn) => {
                    TogglingDirection::GoingOn
                }
                _ => TogglingDirection::Idle,
            },
        );
        let target = Self::target_of(&states);
        let direction = toggling.next(target.lightness() > 0.0);
        tracing::debug!(light = %self.name, ?direction, "Toggling");

        let color = match direction {
            TogglingDirection::GoingOff => {
                if toggling.is_idle() && target.is_lit() {
                    *last_on = target;
                }
                RgbColor::black()
            }
            _ => *last_on,
        };
        Self::apply(&self.channels, &mut states, color, duration, direction)
    }

    /// Raises each channel target by the matching delta.
    ///
    /// # Errors
    ///
    /// Returns the first output error.
    pub fn increase(&self, deltas: [f64; 3], duration: Duration) -> Result<(), OutputError> {
        let _last_on = self.last_on.lock();
        let mut states = self.channels.each_ref().map(|c| c.lock());
        let mut result = Ok(());
        for ((channel, state), delta) in self.channels.iter().zip(states.iter_mut()).zip(deltas) {
            let target = state.target() + delta;
            let outcome = channel.fade_locked(state, target, duration, TogglingDirection::Idle);
            result = result.and(outcome);
        }
        result
    }

    /// Lowers each channel target by the matching delta.
    ///
    /// # Errors
    ///
    /// Returns the first output error.
    pub fn decrease(&self, deltas: [f64; 3], duration: Duration) -> Result<(), OutputError> {
        self.increase(deltas.map(|d| -d), duration)
    }

    /// Fades every channel below `level` up to it.
    ///
    /// # Errors
    ///
    /// Returns the first output error.
    pub fn ramp_up_to(&self, level: Level, duration: Duration) -> Result<(), OutputError> {
        self.ramp(level, duration, |target, bound| target < bound)
    }

    /// Fades every channel above `level` down to it.
    ///
    /// # Errors
    ///
    /// Returns the first output error.
    pub fn ramp_down_to(&self, level: Level, duration: Duration) -> Result<(), OutputError> {
        self.ramp(level, duration, |target, bound| target > bound)
    }

    fn ramp(
        &self,
        level: Level,
        duration: Duration,
        needs_move: fn(f64, f64) -> bool,
    ) -> Result<(), OutputError> {
        let _last_on = self.last_on.lock();
        let mut states = self.channels.each_ref().map(|c| c.lock());
        let mut result = Ok(());
        for (channel, state) in self.channels.iter().zip(states.iter_mut()) {
            result = result.and(channel.ramp_locked(state, level.value(), duration, needs_move));
        }
        result
    }

    fn fade_channels(
        &self,
        color: RgbColor,
        duration: Duration,
        toggling: TogglingDirection,
    ) -> Result<(), OutputError> {
        let mut states = self.channels.each_ref().map(|c| c.lock());
        Self::apply(&self.channels, &mut states, color, duration, toggling)
    }

    fn apply(
        channels: &[Arc<Channel>; 3],
        states: &mut [MutexGuard<'_, ChannelState>; 3],
        color: RgbColor,
        duration: Duration,
        toggling: TogglingDirection,
    ) -> Result<(), OutputError> {
        let mut result = Ok(());
        for ((channel, state), level) in channels.iter().zip(states.iter_mut()).zip(color.levels()) {
            result = result.and(channel.fade_locked(state, level.value(), duration, toggling));
        }
        result
    }

    fn target_of(states: &[MutexGuard<'_, ChannelState>; 3]) -> RgbColor {
        RgbColor::from_levels(states.each_ref().map(|s| Level::clamped(s.target())))
    }

    fn channel_settled(parent: &Weak<Self>) {
        let Some(light) = parent.upgrade() else {
            return;
        };
        if light.is_fading() {
            return;
        }
        tracing::debug!(light = %light.name, color = %light.color(), "Color fade complete");
        let listener = light.listener.read().clone();
        if let Some(listener) = listener {
            listener();
        }
    }
}

impl std::fmt::Debug for ColorLight {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ColorLight")
            .field("name", &self.name)
            .field("channels", &self.channels)
            .finish_non_exhaustive()
    }
}

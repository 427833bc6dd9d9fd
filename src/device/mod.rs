// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Controllable lighting devices.
//!
//! A [`Device`] is a named output of one [`DeviceKind`]. The kind decides the
//! [`Light`] variant that does the work:
//!
//! | Kind | Light | Writes to |
//! |------|-------|-----------|
//! | `onoff` | [`Switch`] | one digital pin |
//! | `pwm` | [`Channel`] | one PWM pin |
//! | `pca9685` | [`Channel`] | one driver channel |
//! | `rgb` | [`ColorLight`] | three PWM pins |
//! | `pcargb` | [`ColorLight`] | three driver channels |
//!
//! Pin-backed and driver-backed variants behave the same; only the
//! [`PwmOutput`] handed to them differs.
//!
//! # Examples
//!
//! ```
//! use std::sync::Arc;
//! use std::time::Duration;
//! use ledctl_lib::device::Device;
//! use ledctl_lib::output::{MemoryGpio, PwmOutput};
//! use ledctl_lib::types::{DeviceKind, Level};
//!
//! let gpio = Arc::new(MemoryGpio::new());
//! let kitchen = Device::dimmer("kitchen", PwmOutput::pin(gpio, 18), Level::MAX).unwrap();
//! assert_eq!(kitchen.kind(), DeviceKind::Pwm);
//!
//! kitchen.off(Duration::ZERO).unwrap();
//! assert_eq!(kitchen.status().level(), 0);
//!
//! kitchen.on(Duration::ZERO).unwrap();
//! assert_eq!(kitchen.status().level(), 100);
//! ```

mod channel;
mod color;
mod switch;

pub use channel::Channel;
pub use color::ColorLight;
pub use switch::Switch;

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use crate::command::{self, Action, CommandRequest, CommandSpec};
use crate::error::{Error, OutputError};
use crate::output::{DigitalOutput, PwmOutput};
use crate::state::StatusDocument;
use crate::types::{DeviceKind, Level, RgbColor, SwitchState};

/// Callback fired when a scheduled fade settles.
pub type CompletionHook = Arc<dyn Fn() + Send + Sync>;

/// The output implementation behind a device.
#[derive(Debug)]
pub enum Light {
    /// Binary output.
    Switch(Switch),
    /// Single dimmable channel.
    Dimmer(Arc<Channel>),
    /// Three-channel color light.
    Color(Arc<ColorLight>),
}

/// A named, controllable output.
#[derive(Debug)]
pub struct Device {
    name: String,
    kind: DeviceKind,
    light: Light,
    error: Mutex<Option<String>>,
}

impl Device {
    /// Creates an on/off device on a digital pin.
    ///
    /// # Errors
    ///
    /// Returns the output error if the initial write fails.
    pub fn switch(
        name: impl Into<String>,
        output: DigitalOutput,
        initial: Level,
    ) -> Result<Self, OutputError> {
        let light = Light::Switch(Switch::new(output, initial)?);
        Ok(Self::with_light(name.into(), DeviceKind::OnOff, light))
    }

    /// Creates a dimmable device on a PWM pin or driver channel.
    ///
    /// # Errors
    ///
    /// Returns the output error if the initial write fails.
    pub fn dimmer(
        name: impl Into<String>,
        output: PwmOutput,
        initial: Level,
    ) -> Result<Self, OutputError> {
        let name = name.into();
        let kind = if output.is_driver() {
            DeviceKind::DriverPwm
        } else {
            DeviceKind::Pwm
        };
        let light = Light::Dimmer(Channel::new(name.clone(), output, initial)?);
        Ok(Self::with_light(name, kind, light))
    }

    /// Creates a color device on three PWM pins or driver channels.
    ///
    /// # Errors
    ///
    /// Returns the output error if an initial write fails.
    pub fn color(
        name: impl Into<String>,
        outputs: [PwmOutput; 3],
        initial: RgbColor,
    ) -> Result<Self, OutputError> {
        let name = name.into();
        let kind = if outputs[0].is_driver() {
            DeviceKind::DriverRgb
        } else {
            DeviceKind::Rgb
        };
        let light = Light::Color(ColorLight::new(name.clone(), outputs, initial)?);
        Ok(Self::with_light(name, kind, light))
    }

    fn with_light(name: String, kind: DeviceKind, light: Light) -> Self {
        tracing::debug!(device = %name, kind = %kind, "Device created");
        Self {
            name,
            kind,
            light,
            error: Mutex::new(None),
        }
    }

    /// Returns the device name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the device kind.
    #[must_use]
    pub fn kind(&self) -> DeviceKind {
        self.kind
    }

    /// Returns the output implementation.
    #[must_use]
    pub fn light(&self) -> &Light {
        &self.light
    }

    /// Returns the commands this device accepts.
    #[must_use]
    pub fn commands(&self) -> &'static [CommandSpec] {
        command::commands_for(self.kind)
    }

    /// Returns `true` while a fade is running.
    #[must_use]
    pub fn is_fading(&self) -> bool {
        match &self.light {
            Light::Switch(_) => false,
            Light::Dimmer(channel) => channel.is_fading(),
            Light::Color(light) => light.is_fading(),
        }
    }

    /// Registers the hook fired when a scheduled fade settles.
    ///
    /// On/off devices never fade, so the hook is never called for them.
    pub fn on_fade_complete(&self, hook: CompletionHook) {
        match &self.light {
            Light::Switch(_) => {}
            Light::Dimmer(channel) => channel.on_fade_complete(hook),
            Light::Color(light) => light.on_fade_complete(hook),
        }
    }

    // ========================================================================
    // Errors reported through status
    // ========================================================================

    /// Records a message for the next status document.
    pub fn record_error(&self, message: impl Into<String>) {
        let message = message.into();
        tracing::warn!(device = %self.name, error = %message, "Recorded device error");
        *self.error.lock() = Some(message);
    }

    /// Takes (and clears) the recorded message.
    #[must_use]
    pub fn take_error(&self) -> Option<String> {
        self.error.lock().take()
    }

    // ========================================================================
    // Operations
    // ========================================================================

    /// Turns the device on, restoring its last lit level or color.
    ///
    /// # Errors
    ///
    /// Returns the output error if a write fails.
    pub fn on(&self, duration: Duration) -> Result<(), OutputError> {
        self.perform(&Action::On { duration })
    }

    /// Turns the device off.
    ///
    /// # Errors
    ///
    /// Returns the output error if a write fails.
    pub fn off(&self, duration: Duration) -> Result<(), OutputError> {
        self.perform(&Action::Off { duration })
    }

    /// Toggles the device.
    ///
    /// # Errors
    ///
    /// Returns the output error if a write fails.
    pub fn toggle(&self, duration: Duration) -> Result<(), OutputError> {
        self.perform(&Action::Toggle { duration })
    }

    /// Fades to `level` over `duration`.
    ///
    /// # Errors
    ///
    /// Returns the output error if a write fails.
    pub fn fade(&self, level: Level, duration: Duration) -> Result<(), OutputError> {
        self.perform(&Action::Fade { level, duration })
    }

    /// Runs a resolved action.
    ///
    /// Color devices treat a plain level as on (non-zero) or off; on/off
    /// devices treat a color as on (lit) or off.
    ///
    /// # Errors
    ///
    /// Returns the output error if a write fails.
    pub fn perform(&self, action: &Action) -> Result<(), OutputError> {
        match &self.light {
            Light::Switch(switch) => Self::perform_switch(switch, action),
            Light::Dimmer(channel) => Self::perform_dimmer(channel, action),
            Light::Color(light) => Self::perform_color(light, action),
        }
    }

    /// Parses and runs a command, see [`command::dispatch`].
    ///
    /// # Errors
    ///
    /// Returns the dispatch error.
    pub fn execute(&self, request: &CommandRequest) -> Result<StatusDocument, Error> {
        command::dispatch(self, request)
    }

    fn perform_switch(switch: &Switch, action: &Action) -> Result<(), OutputError> {
        let current = switch.level().value();
        match *action {
            Action::On { .. } => switch.on(),
            Action::Off { .. } => switch.off(),
            Action::Toggle { .. } => switch.toggle(),
            Action::Set { level } | Action::Fade { level, .. } => switch.set(level),
            Action::FadeColor { color, .. } => switch.set(if color.is_lit() { Level::MAX } else { Level::MIN }),
            Action::Increase { delta, .. } => switch.set(Level::clamped(current + delta.level)),
            Action::Decrease { delta, .. } => switch.set(Level::clamped(current - delta.level)),
            Action::RampUpTo { level, .. } if current < level.value() => switch.set(level),
            Action::RampDownTo { level, .. } if current > level.value() => switch.set(level),
            Action::RampUpTo { .. } | Action::RampDownTo { .. } => Ok(()),
        }
    }

    fn perform_dimmer(channel: &Arc<Channel>, action: &Action) -> Result<(), OutputError> {
        match *action {
            Action::On { duration } => channel.on(duration),
            Action::Off { duration } => channel.off(duration),
            Action::Toggle { duration } => channel.toggle(duration),
            Action::Set { level } => channel.set(level),
            Action::Fade { level, duration } => channel.fade(level, duration),
            Action::FadeColor { color, duration } => channel.fade(color.lightness_level(), duration),
            Action::Increase { delta, duration } => channel.increase(delta.level, duration),
            Action::Decrease { delta, duration } => channel.decrease(delta.level, duration),
            Action::RampUpTo { level, duration } => channel.ramp_up_to(level, duration),
            Action::RampDownTo { level, duration } => channel.ramp_down_to(level, duration),
        }
    }

    fn perform_color(light: &ColorLight, action: &Action) -> Result<(), OutputError> {
        match *action {
            Action::On { duration } => light.on(duration),
            Action::Off { duration } => light.off(duration),
            Action::Toggle { duration } => light.toggle(duration),
            Action::Set { level } if level.is_on() => light.on(Duration::ZERO),
            Action::Set { .. } => light.off(Duration::ZERO),
            Action::Fade { level, duration } if level.is_on() => light.on(duration),
            Action::Fade { duration, .. } => light.off(duration),
            Action::FadeColor { color, duration } => light.fade_to(color, duration),
            Action::Increase { delta, duration } => light.increase(delta.per_channel(), duration),
            Action::Decrease { delta, duration } => light.decrease(delta.per_channel(), duration),
            Action::RampUpTo { level, duration } => light.ramp_up_to(level, duration),
            Action::RampDownTo { level, duration } => light.ramp_down_to(level, duration),
        }
    }

    // ========================================================================
    // Status
    // ========================================================================

    /// Returns the current status document.
    ///
    /// Dimmers report their target level. Color devices report the color
    /// their channels show right now and its lightness.
    #[must_use]
    pub fn status(&self) -> StatusDocument {
        match &self.light {
            Light::Switch(switch) => StatusDocument::new(switch.level().rounded(), switch.state()),
            Light::Dimmer(channel) => {
                let level = channel.target().rounded();
                StatusDocument::new(level, SwitchState::from(level > 0))
            }
            Light::Color(light) => {
                let color = light.color();
                StatusDocument::new(
                    color.lightness_level().rounded(),
                    SwitchState::from(color.lightness() > 0.0),
                )
                .with_color(color)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::Delta;
    use crate::output::{MemoryDriver, MemoryGpio};

    #[test]
    fn kinds_follow_outputs() {
        let gpio = Arc::new(MemoryGpio::new());
        let driver = Arc::new(MemoryDriver::new());

        let pwm = Device::dimmer("a", PwmOutput::pin(gpio.clone(), 1), Level::MIN).unwrap();
        let pca = Device::dimmer("b", PwmOutput::driver(driver.clone(), 0), Level::MIN).unwrap();
        let rgb = Device::color("c", [2, 3, 4].map(|p| PwmOutput::pin(gpio.clone(), p)), RgbColor::black())
            .unwrap();
        let pcargb = Device::color(
            "d",
            [1, 2, 3].map(|c| PwmOutput::driver(driver.clone(), c)),
            RgbColor::black(),
        )
        .unwrap();

        assert_eq!(pwm.kind(), DeviceKind::Pwm);
        assert_eq!(pca.kind(), DeviceKind::DriverPwm);
        assert_eq!(rgb.kind(), DeviceKind::Rgb);
        assert_eq!(pcargb.kind(), DeviceKind::DriverRgb);
    }

    #[test]
    fn color_status_reports_lightness() {
        let gpio = Arc::new(MemoryGpio::new());
        let device = Device::color(
            "shelf",
            [2, 3, 4].map(|p| PwmOutput::pin(gpio.clone(), p)),
            RgbColor::new(0, 0, 255),
        )
        .unwrap();

        let status = device.status();
        assert_eq!(status.level(), 50);
        assert_eq!(status.color(), Some("#0000ff"));
        assert_eq!(status.switch(), SwitchState::On);
    }

    #[test]
    fn fractional_dimmer_target_reports_off() {
        let gpio = Arc::new(MemoryGpio::new());
        let device = Device::dimmer("desk", PwmOutput::pin(gpio, 18), Level::clamped(10.0)).unwrap();

        device
            .perform(&Action::Decrease {
                delta: Delta::level(9.7),
                duration: Duration::ZERO,
            })
            .unwrap();
        let status = device.status();
        assert_eq!(status.level(), 0);
        assert_eq!(status.switch(), SwitchState::Off);
    }

    #[test]
    fn switch_status_is_zero_or_hundred() {
        let gpio = Arc::new(MemoryGpio::new());
        let device = Device::switch("porch", DigitalOutput::new(gpio, 23), Level::clamped(70.0)).unwrap();
        assert_eq!(device.status().level(), 100);

        device
            .perform(&Action::Decrease {
                delta: Delta::level(60.0),
                duration: Duration::ZERO,
            })
            .unwrap();
        assert_eq!(device.status().level(), 100);

        device
            .perform(&Action::Decrease {
                delta: Delta::level(100.0),
                duration: Duration::ZERO,
            })
            .unwrap();
        assert_eq!(device.status().level(), 0);
        assert_eq!(device.status().switch(), SwitchState::Off);
    }

    #[test]
    fn color_set_level_maps_to_on_off() {
        let gpio = Arc::new(MemoryGpio::new());
        let device = Device::color(
            "shelf",
            [2, 3, 4].map(|p| PwmOutput::pin(gpio.clone(), p)),
            RgbColor::new(255, 0, 0),
        )
        .unwrap();

        device.perform(&Action::Set { level: Level::MIN }).unwrap();
        assert_eq!(device.status().color(), Some("#000000"));

        device.perform(&Action::Set { level: Level::clamped(30.0) }).unwrap();
        assert_eq!(device.status().color(), Some("#ff0000"));
    }

    #[test]
    fn error_is_taken_once() {
        let gpio = Arc::new(MemoryGpio::new());
        let device = Device::dimmer("desk", PwmOutput::pin(gpio, 18), Level::MIN).unwrap();
        device.record_error("something odd");
        assert_eq!(device.take_error().as_deref(), Some("something odd"));
        assert_eq!(device.take_error(), None);
    }
}

// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Physical write primitives.
//!
//! Devices never talk to hardware directly. They receive an output strategy
//! at construction:
//!
//! - [`DigitalOutput`] - a GPIO pin driven high or low
//! - [`PwmOutput::Pin`] - a GPIO pin driven with a PWM duty cycle
//! - [`PwmOutput::Driver`] - one channel of an external multi-channel PWM driver
//!
//! The hardware itself sits behind the [`GpioBackend`] and [`ChannelDriver`]
//! traits. A process creates one of each at startup and shares them with every
//! device through [`Hardware`].
//!
//! # Backends
//!
//! - [`MemoryGpio`] / [`MemoryDriver`] - record every write, can inject failures
//! - [`LogGpio`] / [`LogDriver`] - only trace writes, for running without hardware

mod logging;
mod memory;

pub use logging::{LogDriver, LogGpio};
pub use memory::{MemoryDriver, MemoryGpio, Write};

use std::fmt;
use std::sync::Arc;

use crate::error::OutputError;
use crate::types::Level;

/// Duty-cycle resolution of a direct PWM pin.
pub const PWM_RESOLUTION: u32 = 1024;

/// Duty-cycle resolution of the external multi-channel driver.
pub const DRIVER_RESOLUTION: u32 = 65535;

/// Access to the GPIO pins of the host.
pub trait GpioBackend: Send + Sync {
    /// Drives a digital pin high (`true`) or low (`false`).
    ///
    /// # Errors
    ///
    /// Returns `OutputError::Gpio` if the write fails.
    fn write_digital(&self, pin: u32, high: bool) -> Result<(), OutputError>;

    /// Writes a PWM duty cycle in the range `0..=PWM_RESOLUTION`.
    ///
    /// # Errors
    ///
    /// Returns `OutputError::Gpio` if the write fails.
    fn write_duty_cycle(&self, pin: u32, duty: u32) -> Result<(), OutputError>;
}

/// An external multi-channel PWM driver (for example on an I2C bus).
pub trait ChannelDriver: Send + Sync {
    /// Writes a duty cycle in the range `0..=DRIVER_RESOLUTION` to a channel.
    ///
    /// # Errors
    ///
    /// Returns `OutputError::Driver` if the write fails.
    fn write_channel(&self, channel: u32, duty: u32) -> Result<(), OutputError>;
}

/// The process-wide hardware handles shared by all devices.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use ledctl_lib::output::{Hardware, MemoryDriver, MemoryGpio};
///
/// let gpio = Arc::new(MemoryGpio::new());
/// let driver = Arc::new(MemoryDriver::new());
/// let hardware = Hardware::new(gpio).with_driver(driver);
/// assert!(hardware.driver().is_some());
/// ```
#[derive(Clone)]
pub struct Hardware {
    gpio: Arc<dyn GpioBackend>,
    driver: Option<Arc<dyn ChannelDriver>>,
}

impl Hardware {
    /// Creates a hardware bundle with GPIO access and no external driver.
    #[must_use]
    pub fn new(gpio: Arc<dyn GpioBackend>) -> Self {
        Self { gpio, driver: None }
    }

    /// Creates a bundle whose writes are only traced.
    #[must_use]
    pub fn simulated() -> Self {
        Self::new(Arc::new(LogGpio)).with_driver(Arc::new(LogDriver))
    }

    /// Attaches the multi-channel driver.
    #[must_use]
    pub fn with_driver(mut self, driver: Arc<dyn ChannelDriver>) -> Self {
        self.driver = Some(driver);
        self
    }

    /// Returns the GPIO backend.
    #[must_use]
    pub fn gpio(&self) -> &Arc<dyn GpioBackend> {
        &self.gpio
    }

    /// Returns the multi-channel driver, if one is attached.
    #[must_use]
    pub fn driver(&self) -> Option<&Arc<dyn ChannelDriver>> {
        self.driver.as_ref()
    }
}

impl fmt::Debug for Hardware {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hardware")
            .field("driver", &self.driver.is_some())
            .finish_non_exhaustive()
    }
}

/// A binary output on one GPIO pin.
#[derive(Clone)]
pub struct DigitalOutput {
    gpio: Arc<dyn GpioBackend>,
    pin: u32,
}

impl DigitalOutput {
    /// Creates a digital output on `pin`.
    #[must_use]
    pub fn new(gpio: Arc<dyn GpioBackend>, pin: u32) -> Self {
        Self { gpio, pin }
    }

    /// Returns the pin number.
    #[must_use]
    pub fn pin(&self) -> u32 {
        self.pin
    }

    /// Drives the pin.
    ///
    /// # Errors
    ///
    /// Propagates the backend failure.
    pub fn write(&self, high: bool) -> Result<(), OutputError> {
        self.gpio.write_digital(self.pin, high)
    }
}

impl fmt::Debug for DigitalOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DigitalOutput")
            .field("pin", &self.pin)
            .finish_non_exhaustive()
    }
}

/// Where a dimmable channel writes its duty cycle.
#[derive(Clone)]
pub enum PwmOutput {
    /// A PWM-capable GPIO pin.
    Pin {
        /// Shared GPIO backend.
        gpio: Arc<dyn GpioBackend>,
        /// Pin number.
        pin: u32,
    },
    /// A channel of the external multi-channel driver.
    Driver {
        /// Shared driver handle.
        driver: Arc<dyn ChannelDriver>,
        /// Channel index on the driver.
        channel: u32,
    },
}

impl PwmOutput {
    /// Creates an output on a PWM pin.
    #[must_use]
    pub fn pin(gpio: Arc<dyn GpioBackend>, pin: u32) -> Self {
        Self::Pin { gpio, pin }
    }

    /// Creates an output on a driver channel.
    #[must_use]
    pub fn driver(driver: Arc<dyn ChannelDriver>, channel: u32) -> Self {
        Self::Driver { driver, channel }
    }

    /// Returns `true` if this output is a driver channel.
    #[must_use]
    pub fn is_driver(&self) -> bool {
        matches!(self, Self::Driver { .. })
    }

    /// Returns the number of discrete duty steps of this output.
    #[must_use]
    pub fn resolution(&self) -> u32 {
        match self {
            Self::Pin { .. } => PWM_RESOLUTION,
            Self::Driver { .. } => DRIVER_RESOLUTION,
        }
    }

    /// Writes a logical level, scaled to this output's resolution.
    ///
    /// # Errors
    ///
    /// Propagates the backend failure.
    pub fn write(&self, level: Level) -> Result<(), OutputError> {
        let duty = level.to_duty(self.resolution());
        match self {
            Self::Pin { gpio, pin } => gpio.write_duty_cycle(*pin, duty),
            Self::Driver { driver, channel } => driver.write_channel(*channel, duty),
        }
    }
}

impl fmt::Debug for PwmOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pin { pin, .. } => f.debug_struct("Pin").field("pin", pin).finish_non_exhaustive(),
            Self::Driver { channel, .. } => f
                .debug_struct("Driver")
                .field("channel", channel)
                .finish_non_exhaustive(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pin_output_scales_to_pwm_resolution() {
        let gpio = Arc::new(MemoryGpio::new());
        let output = PwmOutput::pin(gpio.clone(), 18);

        output.write(Level::clamped(50.0)).unwrap();

        assert_eq!(output.resolution(), PWM_RESOLUTION);
        assert_eq!(gpio.duty(18), Some(512));
    }

    #[test]
    fn driver_output_scales_to_driver_resolution() {
        let driver = Arc::new(MemoryDriver::new());
        let output = PwmOutput::driver(driver.clone(), 4);

        output.write(Level::MAX).unwrap();

        assert_eq!(output.resolution(), DRIVER_RESOLUTION);
        assert_eq!(driver.duty(4), Some(65535));
    }

    #[test]
    fn digital_output_writes_pin() {
        let gpio = Arc::new(MemoryGpio::new());
        let output = DigitalOutput::new(gpio.clone(), 5);

        output.write(true).unwrap();

        assert_eq!(output.pin(), 5);
        assert_eq!(gpio.digital(5), Some(true));
    }

    #[test]
    fn hardware_without_driver() {
        let hardware = Hardware::new(Arc::new(MemoryGpio::new()));
        assert!(hardware.driver().is_none());
        assert!(Hardware::simulated().driver().is_some());
    }
}

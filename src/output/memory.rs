// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! In-memory backends that record every write.

use std::collections::{HashMap, HashSet};

use parking_lot::Mutex;

use crate::error::OutputError;

use super::{ChannelDriver, GpioBackend};

/// One recorded write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Write {
    /// A digital pin write.
    Digital {
        /// Pin number.
        pin: u32,
        /// Level written.
        high: bool,
    },
    /// A PWM pin or driver channel write.
    Duty {
        /// Pin number or driver channel.
        target: u32,
        /// Duty cycle written.
        duty: u32,
    },
}

#[derive(Debug, Default)]
struct Recorder {
    writes: Vec<Write>,
    digital: HashMap<u32, bool>,
    duty: HashMap<u32, u32>,
    failing: HashSet<u32>,
}

impl Recorder {
    fn record(&mut self, write: Write) {
        match write {
            Write::Digital { pin, high } => {
                self.digital.insert(pin, high);
            }
            Write::Duty { target, duty } => {
                self.duty.insert(target, duty);
            }
        }
        self.writes.push(write);
    }
}

/// A GPIO backend that keeps the last value of every pin.
///
/// Pins can be marked as failing to exercise error paths.
///
/// # Examples
///
/// ```
/// use ledctl_lib::output::{GpioBackend, MemoryGpio};
///
/// let gpio = MemoryGpio::new();
/// gpio.write_duty_cycle(18, 512).unwrap();
/// assert_eq!(gpio.duty(18), Some(512));
///
/// gpio.fail_pin(18);
/// assert!(gpio.write_duty_cycle(18, 0).is_err());
/// assert_eq!(gpio.duty(18), Some(512));
/// ```
#[derive(Debug, Default)]
pub struct MemoryGpio {
    inner: Mutex<Recorder>,
}

impl MemoryGpio {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the last digital value written to `pin`.
    #[must_use]
    pub fn digital(&self, pin: u32) -> Option<bool> {
        self.inner.lock().digital.get(&pin).copied()
    }

    /// Returns the last duty cycle written to `pin`.
    #[must_use]
    pub fn duty(&self, pin: u32) -> Option<u32> {
        self.inner.lock().duty.get(&pin).copied()
    }

    /// Returns every write in order.
    #[must_use]
    pub fn writes(&self) -> Vec<Write> {
        self.inner.lock().writes.clone()
    }

    /// Returns the number of writes so far.
    #[must_use]
    pub fn write_count(&self) -> usize {
        self.inner.lock().writes.len()
    }

    /// Makes every further write to `pin` fail.
    pub fn fail_pin(&self, pin: u32) {
        self.inner.lock().failing.insert(pin);
    }

    /// Lets writes to `pin` succeed again.
    pub fn heal_pin(&self, pin: u32) {
        self.inner.lock().failing.remove(&pin);
    }

    fn check(recorder: &Recorder, pin: u32) -> Result<(), OutputError> {
        if recorder.failing.contains(&pin) {
            return Err(OutputError::Gpio {
                pin,
                message: "injected failure".to_string(),
            });
        }
        Ok(())
    }
}

impl GpioBackend for MemoryGpio {
    fn write_digital(&self, pin: u32, high: bool) -> Result<(), OutputError> {
        let mut recorder = self.inner.lock();
        Self::check(&recorder, pin)?;
        recorder.record(Write::Digital { pin, high });
        Ok(())
    }

    fn write_duty_cycle(&self, pin: u32, duty: u32) -> Result<(), OutputError> {
        let mut recorder = self.inner.lock();
        Self::check(&recorder, pin)?;
        recorder.record(Write::Duty { target: pin, duty });
        Ok(())
    }
}

/// A multi-channel driver that keeps the last duty of every channel.
#[derive(Debug, Default)]
pub struct MemoryDriver {
    inner: Mutex<Recorder>,
}

impl MemoryDriver {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the last duty cycle written to `channel`.
    #[must_use]
    pub fn duty(&self, channel: u32) -> Option<u32> {
        self.inner.lock().duty.get(&channel).copied()
    }

    /// Returns the number of writes so far.
    #[must_use]
    pub fn write_count(&self) -> usize {
        self.inner.lock().writes.len()
    }

    /// Makes every further write to `channel` fail.
    pub fn fail_channel(&self, channel: u32) {
        self.inner.lock().failing.insert(channel);
    }
}

impl ChannelDriver for MemoryDriver {
    fn write_channel(&self, channel: u32, duty: u32) -> Result<(), OutputError> {
        let mut recorder = self.inner.lock();
        if recorder.failing.contains(&channel) {
            return Err(OutputError::Driver {
                channel,
                message: "injected failure".to_string(),
            });
        }
        recorder.record(Write::Duty {
            target: channel,
            duty,
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_writes_in_order() {
        let gpio = MemoryGpio::new();
        gpio.write_digital(3, true).unwrap();
        gpio.write_duty_cycle(18, 100).unwrap();

        assert_eq!(
            gpio.writes(),
            vec![
                Write::Digital { pin: 3, high: true },
                Write::Duty {
                    target: 18,
                    duty: 100
                },
            ]
        );
        assert_eq!(gpio.write_count(), 2);
    }

    #[test]
    fn failing_pin_keeps_last_value() {
        let gpio = MemoryGpio::new();
        gpio.write_digital(7, true).unwrap();
        gpio.fail_pin(7);

        let err = gpio.write_digital(7, false).unwrap_err();
        assert!(matches!(err, OutputError::Gpio { pin: 7, .. }));
        assert_eq!(gpio.digital(7), Some(true));

        gpio.heal_pin(7);
        gpio.write_digital(7, false).unwrap();
        assert_eq!(gpio.digital(7), Some(false));
    }

    #[test]
    fn failing_driver_channel() {
        let driver = MemoryDriver::new();
        driver.fail_channel(2);
        assert!(driver.write_channel(2, 10).is_err());
        assert!(driver.write_channel(1, 10).is_ok());
        assert_eq!(driver.duty(2), None);
        assert_eq!(driver.write_count(), 1);
    }
}

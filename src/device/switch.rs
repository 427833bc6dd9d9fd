// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Binary on/off output.

use parking_lot::Mutex;

use crate::error::OutputError;
use crate::output::DigitalOutput;
use crate::types::{Level, SwitchState};

/// An output that is either fully on or fully off.
///
/// Every level request is rounded: anything above 0.5 is on. Writes are always
/// immediate; durations are ignored.
#[derive(Debug)]
pub struct Switch {
    output: DigitalOutput,
    state: Mutex<SwitchState>,
}

impl Switch {
    /// Creates a switch and writes its initial state.
    ///
    /// # Errors
    ///
    /// Returns the output error if the initial write fails.
    pub fn new(output: DigitalOutput, initial: Level) -> Result<Self, OutputError> {
        let state = Self::round(initial);
        output.write(state.is_on())?;
        Ok(Self {
            output,
            state: Mutex::new(state),
        })
    }

    /// Returns the current state.
    #[must_use]
    pub fn state(&self) -> SwitchState {
        *self.state.lock()
    }

    /// Returns the logical level (0 or 100).
    #[must_use]
    pub fn level(&self) -> Level {
        if self.state().is_on() {
            Level::MAX
        } else {
            Level::MIN
        }
    }

    /// Returns the pin this switch drives.
    #[must_use]
    pub fn pin(&self) -> u32 {
        self.output.pin()
    }

    /// Sets the switch from a level, rounding to on or off.
    ///
    /// # Errors
    ///
    /// Returns the output error if the write fails; the state is unchanged.
    pub fn set(&self, level: Level) -> Result<(), OutputError> {
        self.write(Self::round(level))
    }

    /// Turns the output on.
    ///
    /// # Errors
    ///
    /// Returns the output error if the write fails.
    pub fn on(&self) -> Result<(), OutputError> {
        self.write(SwitchState::On)
    }

    /// Turns the output off.
    ///
    /// # Errors
    ///
    /// Returns the output error if the write fails.
    pub fn off(&self) -> Result<(), OutputError> {
        self.write(SwitchState::Off)
    }

    /// Flips the output.
    ///
    /// # Errors
    ///
    /// Returns the output error if the write fails.
    pub fn toggle(&self) -> Result<(), OutputError> {
        let mut state = self.state.lock();
        let next = SwitchState::from(!state.is_on());
        self.output.write(next.is_on())?;
        *state = next;
        Ok(())
    }

    fn write(&self, next: SwitchState) -> Result<(), OutputError> {
        let mut state = self.state.lock();
        self.output.write(next.is_on())?;
        tracing::trace!(pin = self.output.pin(), state = %next, "Switch set");
        *state = next;
        Ok(())
    }

    fn round(level: Level) -> SwitchState {
        SwitchState::from(level.value() > 0.5)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::output::MemoryGpio;

    fn switch(initial: f64) -> (Switch, Arc<MemoryGpio>) {
        let gpio = Arc::new(MemoryGpio::new());
        let switch = Switch::new(DigitalOutput::new(gpio.clone(), 4), Level::clamped(initial)).unwrap();
        (switch, gpio)
    }

    #[test]
    fn levels_round_to_on_or_off() {
        let (switch, gpio) = switch(0.0);
        assert_eq!(gpio.digital(4), Some(false));

        switch.set(Level::clamped(0.4)).unwrap();
        assert_eq!(switch.state(), SwitchState::Off);

        switch.set(Level::clamped(10.0)).unwrap();
        assert_eq!(switch.state(), SwitchState::On);
        assert_eq!(switch.level(), Level::MAX);
        assert_eq!(gpio.digital(4), Some(true));

        switch.set(Level::MIN).unwrap();
        assert_eq!(gpio.digital(4), Some(false));
    }

    #[test]
    fn dim_initial_level_starts_on() {
        let (switch, gpio) = switch(5.0);
        assert_eq!(switch.state(), SwitchState::On);
        assert_eq!(gpio.digital(4), Some(true));
    }

    #[test]
    fn toggle_flips() {
        let (switch, gpio) = switch(100.0);
        switch.toggle().unwrap();
        assert_eq!(switch.state(), SwitchState::Off);
        assert_eq!(gpio.digital(4), Some(false));
        switch.toggle().unwrap();
        assert_eq!(switch.state(), SwitchState::On);
    }

    #[test]
    fn failed_write_keeps_state() {
        let (switch, gpio) = switch(0.0);
        gpio.fail_pin(4);
        assert!(switch.on().is_err());
        assert_eq!(switch.state(), SwitchState::Off);
    }
}

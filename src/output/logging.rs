// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Backends that only trace their writes.

use crate::error::OutputError;

use super::{ChannelDriver, GpioBackend};

/// GPIO backend for hosts without pins. Every write succeeds.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogGpio;

impl GpioBackend for LogGpio {
    fn write_digital(&self, pin: u32, high: bool) -> Result<(), OutputError> {
        tracing::trace!(pin, high, "digital write");
        Ok(())
    }

    fn write_duty_cycle(&self, pin: u32, duty: u32) -> Result<(), OutputError> {
        tracing::trace!(pin, duty, "duty cycle write");
        Ok(())
    }
}

/// Multi-channel driver for hosts without one. Every write succeeds.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogDriver;

impl ChannelDriver for LogDriver {
    fn write_channel(&self, channel: u32, duty: u32) -> Result<(), OutputError> {
        tracing::trace!(channel, duty, "driver channel write");
        Ok(())
    }
}

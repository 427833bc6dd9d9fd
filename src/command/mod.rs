// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Command requests, command tables and dispatch.
//!
//! Transports turn whatever they receive into a [`CommandRequest`]: a command
//! name plus named and/or positional arguments. [`dispatch`] resolves the name
//! against the device's command table, fills defaults, coerces the arguments
//! into an [`Action`] and runs it, returning a [`StatusDocument`] whose
//! `isStateChange` flag tells whether anything visible changed.
//!
//! # Command Tables
//!
//! | Command | Kinds | Arguments (default) |
//! |---------|-------|---------------------|
//! | `on`, `off`, `toggle` | all | `duration` (1) |
//! | `set` | on/off, dimmable | `level` (100) |
//! | `fade` | on/off, dimmable | `level` (100), `duration` (1) |
//! | `fade` | color | `color` (white), `duration` (1) |
//! | `color` | color | `color` (black), `duration` (0) |
//! | `increase` / `inc`, `decrease` / `dec` | dimmable | `level` (10), `duration` (0.5) |
//! | `increase` / `inc`, `decrease` / `dec` | color | `level` (10), `duration` (0.5), `red`, `green`, `blue` (0) |
//! | `upto` / `rampUntilAtLeast` | dimmable, color | `level` (100), `duration` (1) |
//! | `downto` / `rampUntilAtMost` | dimmable, color | `level` (0), `duration` (1) |
//!
//! # Examples
//!
//! ```
//! use std::sync::Arc;
//! use ledctl_lib::command::{dispatch, CommandRequest};
//! use ledctl_lib::device::Device;
//! use ledctl_lib::output::{MemoryGpio, PwmOutput};
//! use ledctl_lib::types::Level;
//!
//! let gpio = Arc::new(MemoryGpio::new());
//! let device = Device::dimmer("desk", PwmOutput::pin(gpio, 18), Level::MIN).unwrap();
//!
//! let request = CommandRequest::positional("set", vec!["40".into()]);
//! let status = dispatch(&device, &request).unwrap();
//! assert_eq!(status.level(), 40);
//! assert!(status.is_state_change());
//! ```

mod args;
mod dispatch;
mod table;

pub use args::{ArgSpec, ArgType, ArgValue, Arguments, DefaultValue, is_placeholder, normalize};
pub use dispatch::dispatch;
pub use table::{
    COLOR_COMMANDS, CommandSpec, DIMMER_COMMANDS, Operation, SWITCH_COMMANDS, commands_for, find,
};

use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::CommandError;
use crate::types::{Level, RgbColor};

/// A command addressed to one device.
///
/// # Examples
///
/// ```
/// use ledctl_lib::command::CommandRequest;
/// use serde_json::json;
///
/// // From a URL path: /kitchen/fade/50/2
/// let request = CommandRequest::positional("fade", vec![json!("50"), json!("2")]);
/// assert_eq!(request.positional_arg(1), Some(&json!("2")));
///
/// // From a message payload
/// let request = CommandRequest::from_json(json!({"cmd": "fade", "level": 50})).unwrap();
/// assert_eq!(request.name(), "fade");
/// assert_eq!(request.named_arg("level"), Some(&json!(50)));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CommandRequest {
    name: String,
    #[serde(default)]
    args: Map<String, Value>,
    #[serde(default)]
    positional: Vec<Value>,
}

impl CommandRequest {
    /// Creates a request without arguments.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Creates a request with positional arguments.
    #[must_use]
    pub fn positional(name: impl Into<String>, args: Vec<Value>) -> Self {
        Self {
            name: name.into(),
            args: Map::new(),
            positional: args,
        }
    }

    /// Adds a named argument.
    #[must_use]
    pub fn with_arg(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.args.insert(name.into(), value.into());
        self
    }

    /// Builds a request from a JSON object with a `cmd` field.
    ///
    /// Every other field is a named argument.
    ///
    /// # Errors
    ///
    /// Returns `CommandError::Validation` if the value is not an object or
    /// `cmd` is missing or not a string.
    pub fn from_json(value: Value) -> Result<Self, CommandError> {
        let Value::Object(mut args) = value else {
            return Err(CommandError::validation("cmd", "payload is not an object"));
        };
        match args.remove("cmd") {
            Some(Value::String(name)) => Ok(Self {
                name,
                args,
                positional: Vec::new(),
            }),
            _ => Err(CommandError::validation("cmd", "missing command name")),
        }
    }

    /// Returns the command name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns a named argument.
    #[must_use]
    pub fn named_arg(&self, name: &str) -> Option<&Value> {
        self.args.get(name)
    }

    /// Returns a positional argument.
    #[must_use]
    pub fn positional_arg(&self, index: usize) -> Option<&Value> {
        self.positional.get(index)
    }
}

/// A level difference for `increase` / `decrease`.
///
/// Color devices use the per-channel deltas; when all three are zero the
/// `level` delta applies to every channel.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Delta {
    /// Delta for dimmers, and for all color channels when no channel delta is given.
    pub level: f64,
    /// Red channel delta.
    pub red: f64,
    /// Green channel delta.
    pub green: f64,
    /// Blue channel delta.
    pub blue: f64,
}

impl Delta {
    /// Creates a uniform delta.
    #[must_use]
    pub fn level(level: f64) -> Self {
        Self {
            level,
            ..Self::default()
        }
    }

    /// Returns the red, green and blue deltas.
    #[must_use]
    pub fn per_channel(&self) -> [f64; 3] {
        let channels = [self.red, self.green, self.blue];
        if channels.iter().all(|d| d.abs() < f64::EPSILON) {
            [self.level; 3]
        } else {
            channels
        }
    }
}

/// A device operation with its arguments resolved.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Action {
    /// Restore the last lit level or color.
    On {
        /// Fade duration.
        duration: Duration,
    },
    /// Fade to dark.
    Off {
        /// Fade duration.
        duration: Duration,
    },
    /// Flip between on and off.
    Toggle {
        /// Fade duration.
        duration: Duration,
    },
    /// Set a level immediately.
    Set {
        /// Requested level.
        level: Level,
    },
    /// Fade to a level.
    Fade {
        /// Requested level.
        level: Level,
        /// Fade duration.
        duration: Duration,
    },
    /// Fade to a color.
    FadeColor {
        /// Requested color.
        color: RgbColor,
        /// Fade duration.
        duration: Duration,
    },
    /// Raise the target level.
    Increase {
        /// Amount to add.
        delta: Delta,
        /// Fade duration.
        duration: Duration,
    },
    /// Lower the target level.
    Decrease {
        /// Amount to subtract.
        delta: Delta,
        /// Fade duration.
        duration: Duration,
    },
    /// Raise the level to at least `level`.
    RampUpTo {
        /// Floor.
        level: Level,
        /// Fade duration.
        duration: Duration,
    },
    /// Lower the level to at most `level`.
    RampDownTo {
        /// Ceiling.
        level: Level,
        /// Fade duration.
        duration: Duration,
    },
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn request_from_payload() {
        let request =
            CommandRequest::from_json(json!({"cmd": "fade", "color": "red", "duration": 2})).unwrap();
        assert_eq!(request.name(), "fade");
        assert_eq!(request.named_arg("color"), Some(&json!("red")));
        assert_eq!(request.named_arg("cmd"), None);
    }

    #[test]
    fn request_without_cmd_is_rejected() {
        assert!(CommandRequest::from_json(json!({"level": 5})).is_err());
        assert!(CommandRequest::from_json(json!({"cmd": 5})).is_err());
        assert!(CommandRequest::from_json(json!(["on"])).is_err());
    }

    #[test]
    fn delta_spreads_level_when_no_channel_given() {
        assert_eq!(Delta::level(10.0).per_channel(), [10.0; 3]);

        let delta = Delta {
            level: 10.0,
            red: 5.0,
            ..Delta::default()
        };
        assert_eq!(delta.per_channel(), [5.0, 0.0, 0.0]);
    }
}

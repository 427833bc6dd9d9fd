// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for the `ledctl` library.
//!
//! Errors fall into three groups:
//!
//! - **Fatal at construction**: [`ConfigError`] stops a device from being
//!   created at all (missing pin, unknown kind, bad default state).
//! - **Per request**: [`CommandError`] rejects a single command without
//!   touching the device (unknown command, argument that does not coerce).
//! - **Per write**: [`OutputError`] reports that a physical write failed. The
//!   device keeps the last level that was successfully written.
//!
//! Invalid color literals inside a command are not errors at this level: the
//! device substitutes black and reports the problem in the next status
//! document.

use thiserror::Error;

/// The main error type for this library.
#[derive(Debug, Error)]
pub enum Error {
    /// Device configuration is invalid.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// A command was rejected before it reached the device.
    #[error("command error: {0}")]
    Command(#[from] CommandError),

    /// A physical output write failed.
    #[error("output error: {0}")]
    Output(#[from] OutputError),

    /// A value was outside its valid domain.
    #[error("value error: {0}")]
    Value(#[from] ValueError),

    /// Transport setup or communication failed.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// No device is registered under the given name.
    #[error("device not found: {0}")]
    DeviceNotFound(String),
}

impl Error {
    /// Returns `true` if the transport should answer "not found".
    ///
    /// Unknown devices and unknown commands both map to not-found.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::DeviceNotFound(_) | Self::Command(CommandError::UnknownCommand { .. })
        )
    }

    /// Returns `true` if the request carried an argument that did not validate.
    #[must_use]
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Command(CommandError::Validation { .. }))
    }
}

/// Errors raised while building devices from configuration.
///
/// These are fatal for the device being constructed.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required pin or driver channel was not configured.
    #[error("[{device}] missing {channel} pin number")]
    MissingPin {
        /// The device being configured.
        device: String,
        /// Which pin is missing (`pin`, `red`, `green`, `blue`).
        channel: String,
    },

    /// A pin value could not be parsed as a pin number.
    #[error("[{device}] invalid pin number '{value}'")]
    InvalidPin {
        /// The device being configured.
        device: String,
        /// The offending value.
        value: String,
    },

    /// The device kind is not one of the supported kinds.
    #[error("[{device}] unknown pin type '{kind}'")]
    UnknownKind {
        /// The device being configured.
        device: String,
        /// The unrecognized kind string.
        kind: String,
    },

    /// The initial state token could not be interpreted.
    #[error("[{device}] invalid default state '{value}'")]
    InvalidDefault {
        /// The device being configured.
        device: String,
        /// The offending token.
        value: String,
    },

    /// Two devices share the same name.
    #[error("duplicate device name '{0}'")]
    DuplicateDevice(String),

    /// A driver-backed device was configured but no driver is available.
    #[error("[{0}] requires a multi-channel driver but none is available")]
    DriverUnavailable(String),

    /// The configuration document is not valid JSON.
    #[error("invalid configuration document: {0}")]
    Json(#[from] serde_json::Error),
}

/// Per-request command errors.
///
/// These never change device state.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CommandError {
    /// The device has no command with this name.
    #[error("[{device}] unknown command '{command}'")]
    UnknownCommand {
        /// The device the command was addressed to.
        device: String,
        /// The unrecognized command name.
        command: String,
    },

    /// An argument could not be coerced to its declared type.
    #[error("invalid argument '{argument}': {message}")]
    Validation {
        /// The argument name.
        argument: String,
        /// Why the value was rejected.
        message: String,
    },
}

impl CommandError {
    /// Creates a validation error for an argument.
    #[must_use]
    pub fn validation(argument: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            argument: argument.into(),
            message: message.into(),
        }
    }
}

/// Failures of the physical write primitives.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum OutputError {
    /// Writing to a GPIO pin (digital or PWM) failed.
    #[error("write to pin {pin} failed: {message}")]
    Gpio {
        /// The pin number.
        pin: u32,
        /// Backend-specific description.
        message: String,
    },

    /// Writing to a channel of the external multi-channel driver failed.
    #[error("write to driver channel {channel} failed: {message}")]
    Driver {
        /// The driver channel index.
        channel: u32,
        /// Backend-specific description.
        message: String,
    },
}

/// Errors related to value validation and constraints.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ValueError {
    /// A numeric value is outside the allowed range.
    #[error("value {actual} is out of range [{min}, {max}]")]
    OutOfRange {
        /// Minimum allowed value.
        min: f64,
        /// Maximum allowed value.
        max: f64,
        /// The actual value that was provided.
        actual: f64,
    },

    /// A color literal could not be parsed.
    #[error("invalid color '{0}'")]
    InvalidColor(String),

    /// A device kind string is not recognized.
    #[error("unknown device kind '{0}'")]
    InvalidKind(String),
}

/// Errors raised by the transport adapters.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// MQTT client request failed.
    #[cfg(feature = "mqtt")]
    #[error("MQTT error: {0}")]
    Mqtt(#[from] rumqttc::ClientError),

    /// Binding or serving a socket failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid URL or address.
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    /// The broker connection could not be established.
    #[error("connection failed: {0}")]
    ConnectionFailed(String),
}

/// A specialized Result type for this library.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_pin_names_channel() {
        let err = ConfigError::MissingPin {
            device: "strip".to_string(),
            channel: "green".to_string(),
        };
        assert_eq!(err.to_string(), "[strip] missing green pin number");
    }

    #[test]
    fn unknown_kind_display() {
        let err = ConfigError::UnknownKind {
            device: "porch".to_string(),
            kind: "laser".to_string(),
        };
        assert_eq!(err.to_string(), "[porch] unknown pin type 'laser'");
    }

    #[test]
    fn not_found_classification() {
        let unknown: Error = CommandError::UnknownCommand {
            device: "kitchen".to_string(),
            command: "blink".to_string(),
        }
        .into();
        assert!(unknown.is_not_found());
        assert!(Error::DeviceNotFound("attic".to_string()).is_not_found());

        let invalid: Error = CommandError::validation("level", "not a number").into();
        assert!(!invalid.is_not_found());
        assert!(invalid.is_validation());
    }

    #[test]
    fn output_error_display() {
        let err = OutputError::Driver {
            channel: 3,
            message: "i2c nack".to_string(),
        };
        assert_eq!(err.to_string(), "write to driver channel 3 failed: i2c nack");
    }
}

// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Argument declarations, defaults and coercion.
//!
//! Every command declares an ordered list of [`ArgSpec`]s. A request may give
//! an argument by name, by position, or not at all; a missing argument or a
//! positional placeholder (`null`, `""` or `"_"`) takes the declared default.
//! All arguments are coerced before the command runs, so a request that fails
//! validation never reaches the device.

use std::time::Duration;

use serde_json::Value;

use crate::error::CommandError;
use crate::types::{Level, RgbColor};

use super::CommandRequest;

/// Declared type of an argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgType {
    /// A level, clamped to 0-100.
    Level,
    /// A duration in seconds, non-negative.
    Duration,
    /// A signed level difference.
    Delta,
    /// A color literal. Invalid literals become black with a warning.
    Color,
}

/// Default used when an argument is missing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DefaultValue {
    /// A numeric default (levels, deltas, seconds).
    Number(f64),
    /// A color literal default.
    Color(&'static str),
}

/// Declaration of one command argument.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArgSpec {
    /// Argument name in named requests.
    pub name: &'static str,
    /// How the value is coerced.
    pub kind: ArgType,
    /// Value used when the argument is missing.
    pub default: DefaultValue,
}

impl ArgSpec {
    /// Declares a level argument.
    #[must_use]
    pub const fn level(name: &'static str, default: f64) -> Self {
        Self {
            name,
            kind: ArgType::Level,
            default: DefaultValue::Number(default),
        }
    }

    /// Declares a duration argument, in seconds.
    #[must_use]
    pub const fn duration(default: f64) -> Self {
        Self {
            name: "duration",
            kind: ArgType::Duration,
            default: DefaultValue::Number(default),
        }
    }

    /// Declares a delta argument.
    #[must_use]
    pub const fn delta(name: &'static str, default: f64) -> Self {
        Self {
            name,
            kind: ArgType::Delta,
            default: DefaultValue::Number(default),
        }
    }

    /// Declares a color argument.
    #[must_use]
    pub const fn color(default: &'static str) -> Self {
        Self {
            name: "color",
            kind: ArgType::Color,
            default: DefaultValue::Color(default),
        }
    }

    fn default_json(&self) -> Value {
        match self.default {
            DefaultValue::Number(n) => Value::from(n),
            DefaultValue::Color(literal) => Value::from(literal),
        }
    }
}

/// A coerced argument value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ArgValue {
    /// Level argument.
    Level(Level),
    /// Duration argument.
    Duration(Duration),
    /// Delta argument.
    Delta(f64),
    /// Color argument.
    Color(RgbColor),
}

/// The normalized arguments of one request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Arguments {
    values: Vec<(&'static str, ArgValue)>,
    warnings: Vec<String>,
}

impl Arguments {
    /// Returns a coerced value by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<ArgValue> {
        self.values
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, value)| *value)
    }

    /// Returns a level argument.
    ///
    /// # Errors
    ///
    /// Returns `CommandError::Validation` if the argument is missing or not a level.
    pub fn level(&self, name: &str) -> Result<Level, CommandError> {
        match self.get(name) {
            Some(ArgValue::Level(level)) => Ok(level),
            _ => Err(CommandError::validation(name, "missing level")),
        }
    }

    /// Returns the duration argument.
    ///
    /// # Errors
    ///
    /// Returns `CommandError::Validation` if the argument is missing.
    pub fn duration(&self) -> Result<Duration, CommandError> {
        match self.get("duration") {
            Some(ArgValue::Duration(duration)) => Ok(duration),
            _ => Err(CommandError::validation("duration", "missing duration")),
        }
    }

    /// Returns a delta argument.
    ///
    /// # Errors
    ///
    /// Returns `CommandError::Validation` if the argument is missing.
    pub fn delta(&self, name: &str) -> Result<f64, CommandError> {
        match self.get(name) {
            Some(ArgValue::Delta(delta)) => Ok(delta),
            _ => Err(CommandError::validation(name, "missing delta")),
        }
    }

    /// Returns the color argument.
    ///
    /// # Errors
    ///
    /// Returns `CommandError::Validation` if the argument is missing.
    pub fn color(&self) -> Result<RgbColor, CommandError> {
        match self.get("color") {
            Some(ArgValue::Color(color)) => Ok(color),
            _ => Err(CommandError::validation("color", "missing color")),
        }
    }

    /// Returns recovered problems (invalid color literals) to report on the
    /// device.
    #[must_use]
    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }
}

/// Returns `true` for positional values that stand for "use the default".
#[must_use]
pub fn is_placeholder(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => {
            let s = s.trim();
            s.is_empty() || s == "_"
        }
        _ => false,
    }
}

/// Fills defaults and coerces every declared argument of `request`.
///
/// Named arguments take precedence over positional ones. Undeclared extra
/// arguments are ignored.
///
/// # Errors
///
/// Returns `CommandError::Validation` for the first argument that does not
/// coerce.
pub fn normalize(specs: &[ArgSpec], request: &CommandRequest) -> Result<Arguments, CommandError> {
    let mut arguments = Arguments::default();

    for (position, spec) in specs.iter().enumerate() {
        let given = request
            .named_arg(spec.name)
            .or_else(|| request.positional_arg(position))
            .filter(|value| !is_placeholder(value));

        let value = match given {
            Some(value) => coerce(spec, value, &mut arguments.warnings)?,
            None => coerce(spec, &spec.default_json(), &mut arguments.warnings)?,
        };
        arguments.values.push((spec.name, value));
    }

    Ok(arguments)
}

fn coerce(spec: &ArgSpec, value: &Value, warnings: &mut Vec<String>) -> Result<ArgValue, CommandError> {
    match spec.kind {
        ArgType::Level => number(spec.name, value).map(|n| ArgValue::Level(Level::clamped(n))),
        ArgType::Delta => number(spec.name, value).map(ArgValue::Delta),
        ArgType::Duration => {
            let seconds = number(spec.name, value)?;
            if seconds < 0.0 {
                return Err(CommandError::validation(spec.name, "must not be negative"));
            }
            Duration::try_from_secs_f64(seconds)
                .map(ArgValue::Duration)
                .map_err(|e| CommandError::validation(spec.name, e.to_string()))
        }
        ArgType::Color => {
            let literal = match value {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            match RgbColor::parse(&literal) {
                Ok(color) => Ok(ArgValue::Color(color)),
                Err(e) => {
                    tracing::warn!(literal = %literal, "Invalid color literal, using black");
                    warnings.push(e.to_string());
                    Ok(ArgValue::Color(RgbColor::black()))
                }
            }
        }
    }
}

fn number(name: &str, value: &Value) -> Result<f64, CommandError> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        _ => None,
    };
    match parsed {
        Some(n) if n.is_finite() => Ok(n),
        _ => Err(CommandError::validation(
            name,
            format!("expected a number, got {value}"),
        )),
    }
}

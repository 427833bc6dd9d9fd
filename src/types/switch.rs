// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Switch state and toggle direction.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Whether an output is visibly lit.
///
/// Serialized as `"on"` / `"off"` in status documents.
///
/// # Examples
///
/// ```
/// use ledctl_lib::types::SwitchState;
///
/// assert_eq!(SwitchState::from(true), SwitchState::On);
/// assert_eq!("OFF".parse::<SwitchState>().unwrap(), SwitchState::Off);
/// assert_eq!(SwitchState::On.to_string(), "on");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SwitchState {
    /// Output is dark.
    Off,
    /// Output is lit.
    On,
}

impl SwitchState {
    /// Returns the wire representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Off => "off",
            Self::On => "on",
        }
    }

    /// Returns `true` if the output is lit.
    #[must_use]
    pub const fn is_on(&self) -> bool {
        matches!(self, Self::On)
    }
}

impl fmt::Display for SwitchState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SwitchState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "off" | "0" | "false" => Ok(Self::Off),
            "on" | "1" | "true" => Ok(Self::On),
            _ => Err(format!("invalid switch state: {s}")),
        }
    }
}

impl From<bool> for SwitchState {
    fn from(value: bool) -> Self {
        if value { Self::On } else { Self::Off }
    }
}

/// Direction of a toggle that is still fading.
///
/// A second toggle issued before the first one finishes reverses the
/// recorded direction instead of re-reading the (still moving) level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TogglingDirection {
    /// No toggle in progress.
    #[default]
    Idle,
    /// A toggle is fading the output on.
    GoingOn,
    /// A toggle is fading the output off.
    GoingOff,
}

impl TogglingDirection {
    /// Picks the direction for a new toggle.
    ///
    /// A toggle in flight is reversed; otherwise a lit output goes off and a
    /// dark one goes on.
    #[must_use]
    pub fn next(self, lit: bool) -> Self {
        match self {
            Self::GoingOff => Self::GoingOn,
            Self::GoingOn => Self::GoingOff,
            Self::Idle if lit => Self::GoingOff,
            Self::Idle => Self::GoingOn,
        }
    }

    /// Returns `true` if no toggle is in progress.
    #[must_use]
    pub const fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }
}

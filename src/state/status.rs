// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Status document returned for every command.

use serde::{Deserialize, Serialize};

use crate::types::{RgbColor, SwitchState};

/// Observable state of one device, as sent back to clients.
///
/// Dimmable devices report their target level, so a client polling during a
/// fade sees where the device is heading. Color devices add the color their
/// channels currently show as an HTML literal and report its lightness as
/// `level`.
///
/// # Examples
///
/// ```
/// use ledctl_lib::state::StatusDocument;
/// use ledctl_lib::types::SwitchState;
///
/// let status = StatusDocument::new(0, SwitchState::Off);
/// assert_eq!(
///     status.to_json(),
///     r#"{"level":0,"switch":"off","isStateChange":false}"#
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusDocument {
    level: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    color: Option<String>,
    switch: SwitchState,
    #[serde(default)]
    is_state_change: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl StatusDocument {
    /// Creates a status with a level and switch state.
    #[must_use]
    pub fn new(level: u8, switch: SwitchState) -> Self {
        Self {
            level,
            color: None,
            switch,
            is_state_change: false,
            error: None,
        }
    }

    /// Adds the color of a color device.
    #[must_use]
    pub fn with_color(mut self, color: RgbColor) -> Self {
        self.color = Some(color.to_html());
        self
    }

    /// Marks whether the command changed the visible state.
    #[must_use]
    pub fn with_state_change(mut self, changed: bool) -> Self {
        self.is_state_change = changed;
        self
    }

    /// Attaches an error message recorded during the command.
    #[must_use]
    pub fn with_error(mut self, error: Option<String>) -> Self {
        self.error = error;
        self
    }

    /// Returns the reported level (0-100).
    #[must_use]
    pub fn level(&self) -> u8 {
        self.level
    }

    /// Returns the HTML color literal, for color devices.
    #[must_use]
    pub fn color(&self) -> Option<&str> {
        self.color.as_deref()
    }

    /// Returns the switch state.
    #[must_use]
    pub fn switch(&self) -> SwitchState {
        self.switch
    }

    /// Returns `true` if the command changed the visible state.
    #[must_use]
    pub fn is_state_change(&self) -> bool {
        self.is_state_change
    }

    /// Returns the error recorded during the command, if any.
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Serializes the document to a JSON string.
    #[must_use]
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| String::from("{}"))
    }
}

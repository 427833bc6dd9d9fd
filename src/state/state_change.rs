// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Before/after comparison of device status.
//!
//! A command changed the state when the serialized status before it differs
//! from the serialized status after it. Only the visible fields take part:
//! `isStateChange` and `error` describe the command, not the device.
//!
//! # Examples
//!
//! ```
//! use ledctl_lib::state::{StateChange, StateSnapshot, StatusDocument};
//! use ledctl_lib::types::SwitchState;
//!
//! let before = StateSnapshot::capture(&StatusDocument::new(0, SwitchState::Off));
//! let after = StateSnapshot::capture(
//!     &StatusDocument::new(0, SwitchState::Off).with_error(Some("oops".into())),
//! );
//! assert_eq!(StateChange::between(&before, &after), StateChange::Unchanged);
//! ```

use serde_json::{Value, json};

use super::StatusDocument;

/// The visible part of a status, as an order-independent JSON value.
#[derive(Debug, Clone, PartialEq)]
pub struct StateSnapshot(Value);

impl StateSnapshot {
    /// Captures the visible fields of `status`.
    #[must_use]
    pub fn capture(status: &StatusDocument) -> Self {
        Self(json!({
            "level": status.level(),
            "color": status.color(),
            "switch": status.switch(),
        }))
    }

    /// Returns the captured JSON value.
    #[must_use]
    pub fn as_json(&self) -> &Value {
        &self.0
    }
}

/// Whether a command changed the visible state of a device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateChange {
    /// Status before and after are identical.
    Unchanged,
    /// At least one visible field differs.
    Changed,
}

impl StateChange {
    /// Compares two snapshots.
    #[must_use]
    pub fn between(before: &StateSnapshot, after: &StateSnapshot) -> Self {
        if before == after {
            Self::Unchanged
        } else {
            Self::Changed
        }
    }

    /// Returns `true` for [`StateChange::Changed`].
    #[must_use]
    pub const fn is_change(self) -> bool {
        matches!(self, Self::Changed)
    }
}

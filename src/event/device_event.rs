// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Device event types.

use serde::Serialize;

use crate::state::StatusDocument;
use crate::types::DeviceKind;

/// Events published by the [`Controller`](crate::manager::Controller).
///
/// # Examples
///
/// ```
/// use ledctl_lib::event::DeviceEvent;
/// use ledctl_lib::state::StatusDocument;
/// use ledctl_lib::types::{DeviceKind, SwitchState};
///
/// let added = DeviceEvent::device_added("kitchen", DeviceKind::Pwm);
/// assert_eq!(added.device(), "kitchen");
///
/// let done = DeviceEvent::fade_completed("kitchen", StatusDocument::new(100, SwitchState::On));
/// assert!(done.is_fade_completed());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum DeviceEvent {
    /// A device was registered.
    DeviceAdded {
        /// Device name.
        device: String,
        /// Device kind.
        kind: DeviceKind,
    },

    /// A command changed the visible state of a device.
    StateChanged {
        /// Device name.
        device: String,
        /// Status after the command.
        status: StatusDocument,
    },

    /// A scheduled fade reached its target.
    FadeCompleted {
        /// Device name.
        device: String,
        /// Status once the fade settled.
        status: StatusDocument,
    },
}

impl DeviceEvent {
    /// Creates a device added event.
    #[must_use]
    pub fn device_added(device: impl Into<String>, kind: DeviceKind) -> Self {
        Self::DeviceAdded {
            device: device.into(),
            kind,
        }
    }

    /// Creates a state changed event.
    #[must_use]
    pub fn state_changed(device: impl Into<String>, status: StatusDocument) -> Self {
        Self::StateChanged {
            device: device.into(),
            status,
        }
    }

    /// Creates a fade completed event.
    #[must_use]
    pub fn fade_completed(device: impl Into<String>, status: StatusDocument) -> Self {
        Self::FadeCompleted {
            device: device.into(),
            status,
        }
    }

    /// Returns the name of the device the event is about.
    #[must_use]
    pub fn device(&self) -> &str {
        match self {
            Self::DeviceAdded { device, .. }
            | Self::StateChanged { device, .. }
            | Self::FadeCompleted { device, .. } => device,
        }
    }

    /// Returns the status carried by the event, if any.
    #[must_use]
    pub fn status(&self) -> Option<&StatusDocument> {
        match self {
            Self::DeviceAdded { .. } => None,
            Self::StateChanged { status, .. } | Self::FadeCompleted { status, .. } => Some(status),
        }
    }

    /// Returns `true` for [`DeviceEvent::StateChanged`].
    #[must_use]
    pub fn is_state_change(&self) -> bool {
        matches!(self, Self::StateChanged { .. })
    }

    /// Returns `true` for [`DeviceEvent::FadeCompleted`].
    #[must_use]
    pub fn is_fade_completed(&self) -> bool {
        matches!(self, Self::FadeCompleted { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SwitchState;

    #[test]
    fn status_only_on_state_events() {
        let added = DeviceEvent::device_added("porch", DeviceKind::OnOff);
        assert!(added.status().is_none());

        let changed = DeviceEvent::state_changed("porch", StatusDocument::new(100, SwitchState::On));
        assert!(changed.is_state_change());
        assert_eq!(changed.status().map(StatusDocument::level), Some(100));
    }

    #[test]
    fn serializes_with_event_tag() {
        let event = DeviceEvent::device_added("strip", DeviceKind::Rgb);
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "deviceAdded");
        assert_eq!(json["device"], "strip");
    }
}

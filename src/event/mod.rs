// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Device events.
//!
//! The [`Controller`](crate::manager::Controller) publishes a [`DeviceEvent`]
//! when a device is registered, when a command changes what a device shows,
//! and when a scheduled fade settles. Transports and applications subscribe
//! through the [`EventBus`].

mod device_event;
mod event_bus;

pub use device_event::DeviceEvent;
pub use event_bus::EventBus;

// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Device registry and configuration.
//!
//! [`ControllerConfig`] describes the devices a process drives, one
//! [`DeviceConfig`] record per device name. [`Controller`] builds them
//! against the process-wide [`Hardware`](crate::output::Hardware) and routes
//! commands to them by name.
//!
//! # Examples
//!
//! ```
//! use ledctl_lib::command::CommandRequest;
//! use ledctl_lib::manager::{Controller, ControllerConfig};
//! use ledctl_lib::output::Hardware;
//!
//! let config = ControllerConfig::from_json_str(r#"{
//!     "kitchen": { "type": "pwm", "pin": 18 },
//!     "shelf":   { "type": "rgb", "red": 17, "green": 27, "blue": 22 }
//! }"#).unwrap();
//!
//! let controller = Controller::from_config(&config, &Hardware::simulated()).unwrap();
//! let request = CommandRequest::new("color").with_arg("color", "teal");
//! let status = controller.execute("shelf", &request).unwrap();
//! assert_eq!(status.color(), Some("#008080"));
//! ```
//!
//! ## Event Subscription
//!
//! ```no_run
//! use ledctl_lib::event::DeviceEvent;
//! use ledctl_lib::manager::Controller;
//!
//! # fn example(controller: &Controller) {
//! let mut events = controller.subscribe();
//! tokio::spawn(async move {
//!     while let Ok(event) = events.recv().await {
//!         if let DeviceEvent::FadeCompleted { device, status } = event {
//!             println!("{device} settled at {}", status.level());
//!         }
//!     }
//! });
//! # }
//! ```

mod controller;
mod device_config;

pub use controller::Controller;
pub use device_config::{
    ControllerConfig, DeviceConfig, FALLBACK_DEVICE, FALLBACK_PIN, PinNumber,
};

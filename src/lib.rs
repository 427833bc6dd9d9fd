// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! `ledctl` Lib - Drive lighting outputs with smooth fades.
//!
//! This library controls on/off, dimmable and RGB lighting outputs wired to
//! GPIO pins or to a multi-channel PWM driver, and exposes them to HTTP and
//! MQTT clients.
//!
//! # Supported Features
//!
//! - **Devices**: on/off switches, PWM dimmers, RGB lights, driver-backed
//!   dimmers and RGB lights
//! - **Fades**: time-bounded level and color transitions with adaptive step
//!   size, reversible toggles, interruption by any later command
//! - **Commands**: one request shape for every transport, with per-kind
//!   defaults and state change detection
//! - **Events**: registration, state change and fade completion broadcasts
//!
//! # Quick Start
//!
//! ```
//! use ledctl_lib::{CommandRequest, Controller, ControllerConfig, Hardware};
//!
//! # fn main() -> ledctl_lib::Result<()> {
//! let config = ControllerConfig::from_json_str(r#"{
//!     "porch":   { "type": "onoff", "pin": 23 },
//!     "kitchen": { "type": "pwm", "pin": 18, "default": "30" }
//! }"#)?;
//!
//! let controller = Controller::from_config(&config, &Hardware::simulated())?;
//!
//! let status = controller.execute("porch", &CommandRequest::new("off"))?;
//! assert!(!status.is_state_change());
//!
//! let status = controller.execute("kitchen", &CommandRequest::new("set").with_arg("level", 75))?;
//! assert_eq!(status.level(), 75);
//! # Ok(())
//! # }
//! ```
//!
//! ## Serving HTTP and MQTT
//!
//! ```no_run
//! use ledctl_lib::{Controller, ControllerConfig, Hardware};
//! use ledctl_lib::protocol::{http, mqtt::MqttTransport};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ControllerConfig::from_json_str(r#"{"kitchen": {"type": "pwm", "pin": 18}}"#)?;
//!     let controller = Controller::from_config(&config, &Hardware::simulated())?;
//!
//!     let _mqtt = MqttTransport::builder()
//!         .host("192.168.1.50")
//!         .start(controller.clone())
//!         .await?;
//!
//!     http::serve(controller, "0.0.0.0:8080").await?;
//!     Ok(())
//! }
//! ```
//!
//! # Fades
//!
//! Dimmable channels animate on the tokio runtime. Each step sleeps at least
//! [`fade::MIN_STEP_TIME`] and moves a share of the remaining distance that
//! depends on how much time is left, so a fade lands on its target at its
//! deadline whatever the output resolution. A new command on the same
//! channel replaces the running fade. Outside a runtime, fades complete
//! immediately.

pub mod command;
pub mod device;
pub mod error;
pub mod event;
pub mod fade;
pub mod manager;
pub mod output;
pub mod protocol;
pub mod state;
pub mod types;

pub use command::{CommandRequest, dispatch};
pub use device::{Device, Light};
pub use error::{CommandError, ConfigError, Error, OutputError, ProtocolError, Result, ValueError};
pub use event::{DeviceEvent, EventBus};
pub use manager::{Controller, ControllerConfig, DeviceConfig};
pub use output::{ChannelDriver, GpioBackend, Hardware};
pub use state::StatusDocument;
pub use types::{DeviceKind, Level, RgbColor, SwitchState};

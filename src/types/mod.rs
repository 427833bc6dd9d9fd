// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Value types for lighting control.
//!
//! # Types
//!
//! - [`Level`] - Logical output level (0-100%)
//! - [`RgbColor`] - 8-bit RGB color with HTML and CSS-name parsing
//! - [`SwitchState`] - Whether an output is visibly lit
//! - [`TogglingDirection`] - Direction of a toggle that is still fading
//! - [`DeviceKind`] - Which kind of output a device drives

mod kind;
mod level;
mod rgb_color;
mod switch;

pub use kind::DeviceKind;
pub use level::{Level, MAX_LEVEL};
pub use rgb_color::RgbColor;
pub use switch::{SwitchState, TogglingDirection};

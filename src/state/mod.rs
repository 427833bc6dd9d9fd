// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Status reporting.
//!
//! [`StatusDocument`] is what every transport sends back after a command.
//! [`StateChange`] decides whether the command changed anything a client can
//! see, by comparing [`StateSnapshot`]s taken before and after it ran.

mod state_change;
mod status;

pub use state_change::{StateChange, StateSnapshot};
pub use status::StatusDocument;

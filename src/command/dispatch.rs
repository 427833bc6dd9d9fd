// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Command dispatch with before/after status comparison.

use crate::device::Device;
use crate::error::{CommandError, Error};
use crate::state::{StateChange, StateSnapshot, StatusDocument};

use super::{CommandRequest, args, table};

/// Runs `request` against `device` and reports the resulting status.
///
/// The steps are:
///
/// 1. Resolve the command name (or alias) in the device's table.
/// 2. Fill defaults and coerce every argument.
/// 3. Snapshot the status.
/// 4. Perform the operation.
/// 5. Compare the new status with the snapshot and attach (and clear) any
///    error message the device recorded. A failed write clears it too.
///
/// # Errors
///
/// - `CommandError::UnknownCommand` if the device has no such command
/// - `CommandError::Validation` if an argument does not coerce; the device is
///   left untouched
/// - `OutputError` if a physical write failed
pub fn dispatch(device: &Device, request: &CommandRequest) -> Result<StatusDocument, Error> {
    let spec = table::find(device.kind(), request.name()).ok_or_else(|| {
        CommandError::UnknownCommand {
            device: device.name().to_string(),
            command: request.name().to_string(),
        }
    })?;

    let arguments = args::normalize(spec.args, request)?;
    let action = spec.operation.bind(&arguments)?;

    let before = StateSnapshot::capture(&device.status());

    for warning in arguments.warnings() {
        device.record_error(warning.clone());
    }

    tracing::debug!(device = %device.name(), command = spec.name, ?action, "Dispatching command");
    if let Err(e) = device.perform(&action) {
        // Messages belong to this command only.
        let _ = device.take_error();
        return Err(e.into());
    }

    let status = device.status();
    let change = StateChange::between(&before, &StateSnapshot::capture(&status));

    Ok(status
        .with_state_change(change.is_change())
        .with_error(device.take_error()))
}

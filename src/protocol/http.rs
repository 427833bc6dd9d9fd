// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! HTTP adapter.
//!
//! Every command is a `GET` on `/<device>/<command>[/<arg1>[/<arg2>]]`.
//! Positional arguments follow the command's declared order; `_` or an
//! empty segment keeps the default.
//!
//! | Outcome | Status |
//! |---------|--------|
//! | success | 200, status document |
//! | unknown device, unknown command, malformed path | 404 |
//! | argument does not validate | 400 |
//! | output write failed | 500 |
//!
//! # Examples
//!
//! ```no_run
//! use ledctl_lib::manager::{Controller, ControllerConfig};
//! use ledctl_lib::output::Hardware;
//! use ledctl_lib::protocol::http;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ControllerConfig::from_json_str(r#"{"kitchen": {"type": "pwm", "pin": 18}}"#)?;
//! let controller = Controller::from_config(&config, &Hardware::simulated())?;
//!
//! // curl http://localhost:8080/kitchen/fade/50/2
//! http::serve(controller, "0.0.0.0:8080").await?;
//! # Ok(())
//! # }
//! ```

use axum::Json;
use axum::Router;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use serde_json::json;
use tokio::net::{TcpListener, ToSocketAddrs};

use crate::error::{Error, ProtocolError};
use crate::manager::Controller;

use super::parse_path;

/// Builds the router serving every device of `controller`.
#[must_use]
pub fn router(controller: Controller) -> Router {
    Router::new()
        .route("/{*path}", get(handle_command))
        .with_state(controller)
}

/// Binds `addr` and serves the router until the listener fails.
///
/// # Errors
///
/// Returns `ProtocolError::Io` if the address cannot be bound or serving fails.
pub async fn serve(controller: Controller, addr: impl ToSocketAddrs) -> Result<(), ProtocolError> {
    let listener = TcpListener::bind(addr).await?;
    serve_on(controller, listener).await
}

/// Serves the router on an already bound listener.
///
/// # Errors
///
/// Returns `ProtocolError::Io` if serving fails.
pub async fn serve_on(controller: Controller, listener: TcpListener) -> Result<(), ProtocolError> {
    tracing::info!(
        addr = ?listener.local_addr().ok(),
        devices = controller.device_count(),
        "HTTP transport listening"
    );
    axum::serve(listener, router(controller)).await?;
    Ok(())
}

async fn handle_command(State(controller): State<Controller>, Path(path): Path<String>) -> Response {
    let Some(request) = parse_path(&path) else {
        tracing::debug!(path = %path, "Malformed command path");
        return error_response(StatusCode::NOT_FOUND, format!("no route for /{path}"));
    };

    match controller.execute(&request.device, &request.to_command()) {
        Ok(status) => (StatusCode::OK, Json(status)).into_response(),
        Err(e) => {
            tracing::debug!(device = %request.device, command = %request.command, error = %e, "Command failed");
            error_response(status_code(&e), e.to_string())
        }
    }
}

/// Maps a command error to its HTTP status.
#[must_use]
pub fn status_code(error: &Error) -> StatusCode {
    if error.is_not_found() {
        StatusCode::NOT_FOUND
    } else if error.is_validation() {
        StatusCode::BAD_REQUEST
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    }
}

fn error_response(code: StatusCode, message: String) -> Response {
    (code, Json(json!({ "error": message }))).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{CommandError, OutputError};

    #[test]
    fn error_status_codes() {
        assert_eq!(
            status_code(&Error::DeviceNotFound("attic".into())),
            StatusCode::NOT_FOUND
        );

        let unknown = CommandError::UnknownCommand {
            device: "porch".into(),
            command: "blink".into(),
        };
        assert_eq!(status_code(&unknown.into()), StatusCode::NOT_FOUND);

        let invalid = CommandError::validation("level", "expected a number");
        assert_eq!(status_code(&invalid.into()), StatusCode::BAD_REQUEST);

        let failed = OutputError::Gpio {
            pin: 18,
            message: "busy".into(),
        };
        assert_eq!(status_code(&failed.into()), StatusCode::INTERNAL_SERVER_ERROR);
    }
}

// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Transport adapters.
//!
//! Both adapters are thin: they turn an incoming request into a
//! [`CommandRequest`], run it through a [`Controller`](crate::manager::Controller)
//! and render the [`StatusDocument`](crate::state::StatusDocument) as JSON.
//!
//! # Transports
//!
//! - `http` (feature `http`): `GET /<device>/<command>[/<arg1>[/<arg2>]]`
//! - `mqtt` (feature `mqtt`): JSON payloads on `<prefix>/<device>/req`,
//!   answers on `<prefix>/<device>/resp`
//!
//! The path and topic helpers below are always available.

#[cfg(feature = "http")]
pub mod http;
#[cfg(feature = "mqtt")]
pub mod mqtt;

use serde_json::Value;

use crate::command::CommandRequest;

/// Default topic prefix.
pub const DEFAULT_TOPIC_PREFIX: &str = "cmd";

/// Most positional arguments a path may carry.
pub const MAX_PATH_ARGS: usize = 2;

// ============================================================================
// Paths
// ============================================================================

/// A command addressed by URL path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathRequest {
    /// Device name.
    pub device: String,
    /// Command name.
    pub command: String,
    /// Positional arguments, percent-decoded.
    pub args: Vec<String>,
}

impl PathRequest {
    /// Converts into a positional [`CommandRequest`].
    #[must_use]
    pub fn to_command(&self) -> CommandRequest {
        CommandRequest::positional(
            self.command.clone(),
            self.args.iter().cloned().map(Value::String).collect(),
        )
    }
}

/// Splits `/<device>/<command>[/<arg1>[/<arg2>]]` into its parts.
///
/// Segments are percent-decoded. Empty argument segments are kept and act as
/// placeholders for the argument default. Returns `None` for fewer than two
/// or more than four segments, an empty device or command, or a segment that
/// does not decode.
///
/// # Examples
///
/// ```
/// use ledctl_lib::protocol::parse_path;
///
/// let request = parse_path("/kitchen/fade/50/2").unwrap();
/// assert_eq!(request.device, "kitchen");
/// assert_eq!(request.command, "fade");
/// assert_eq!(request.args, ["50", "2"]);
///
/// let request = parse_path("/shelf/color/%23ff8800").unwrap();
/// assert_eq!(request.args, ["#ff8800"]);
///
/// assert!(parse_path("/kitchen").is_none());
/// assert!(parse_path("/kitchen/fade/50/2/extra").is_none());
/// ```
#[must_use]
pub fn parse_path(path: &str) -> Option<PathRequest> {
    let trimmed = path.strip_prefix('/').unwrap_or(path);
    let trimmed = trimmed.strip_suffix('/').unwrap_or(trimmed);

    let segments = trimmed
        .split('/')
        .map(|segment| urlencoding::decode(segment).map(|s| s.into_owned()))
        .collect::<Result<Vec<_>, _>>()
        .ok()?;

    let [device, command, args @ ..] = segments.as_slice() else {
        return None;
    };
    if device.is_empty() || command.is_empty() || args.len() > MAX_PATH_ARGS {
        return None;
    }

    Some(PathRequest {
        device: device.clone(),
        command: command.clone(),
        args: args.to_vec(),
    })
}

// ============================================================================
// Topics
// ============================================================================

/// Returns the topic a device listens on: `<prefix>/<device>/req`.
#[must_use]
pub fn request_topic(prefix: &str, device: &str) -> String {
    format!("{prefix}/{device}/req")
}

/// Returns the topic a device answers on: `<prefix>/<device>/resp`.
#[must_use]
pub fn response_topic(prefix: &str, device: &str) -> String {
    format!("{prefix}/{device}/resp")
}

/// Extracts the device name from a request topic.
///
/// # Examples
///
/// ```
/// use ledctl_lib::protocol::parse_request_topic;
///
/// assert_eq!(parse_request_topic("cmd", "cmd/kitchen/req"), Some("kitchen"));
/// assert_eq!(parse_request_topic("cmd", "cmd/kitchen/resp"), None);
/// assert_eq!(parse_request_topic("cmd", "home/kitchen/req"), None);
/// ```
#[must_use]
pub fn parse_request_topic<'a>(prefix: &str, topic: &'a str) -> Option<&'a str> {
    let device = topic
        .strip_prefix(prefix)?
        .strip_prefix('/')?
        .strip_suffix("/req")?;
    (!device.is_empty() && !device.contains('/')).then_some(device)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn command_only_path() {
        let request = parse_path("/porch/on").unwrap();
        assert_eq!(request.device, "porch");
        assert_eq!(request.command, "on");
        assert!(request.args.is_empty());
    }

    #[test]
    fn trailing_slash_is_ignored() {
        assert_eq!(parse_path("/porch/on/"), parse_path("/porch/on"));
    }

    #[test]
    fn empty_argument_is_a_placeholder() {
        let request = parse_path("/kitchen/fade//3").unwrap();
        assert_eq!(request.args, ["", "3"]);

        let command = request.to_command();
        assert_eq!(command.name(), "fade");
        assert_eq!(command.positional_arg(0), Some(&json!("")));
        assert_eq!(command.positional_arg(1), Some(&json!("3")));
    }

    #[test]
    fn names_are_decoded() {
        let request = parse_path("/living%20room/on").unwrap();
        assert_eq!(request.device, "living room");
    }

    #[test]
    fn rejected_paths() {
        assert!(parse_path("/").is_none());
        assert!(parse_path("").is_none());
        assert!(parse_path("//on").is_none());
        assert!(parse_path("/kitchen/").is_none());
        assert!(parse_path("/kitchen/%FF").is_none());
    }

    #[test]
    fn topics_round_trip_device_name() {
        let topic = request_topic("home/leds", "kitchen");
        assert_eq!(topic, "home/leds/kitchen/req");
        assert_eq!(parse_request_topic("home/leds", &topic), Some("kitchen"));
        assert_eq!(response_topic("home/leds", "kitchen"), "home/leds/kitchen/resp");
    }

    #[test]
    fn nested_device_topics_are_rejected() {
        assert_eq!(parse_request_topic("cmd", "cmd/a/b/req"), None);
        assert_eq!(parse_request_topic("cmd", "cmd//req"), None);
    }
}

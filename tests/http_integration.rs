// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Integration tests for the HTTP adapter on an ephemeral port.

#![cfg(feature = "http")]

use std::net::SocketAddr;
use std::sync::Arc;

use ledctl_lib::output::{Hardware, MemoryGpio};
use ledctl_lib::protocol::http;
use ledctl_lib::{Controller, ControllerConfig};
use reqwest::StatusCode;
use serde_json::{Value, json};
use tokio::net::TcpListener;

const CONFIG: &str = r#"{
    "porch":   { "type": "onoff", "pin": 23 },
    "kitchen": { "type": "pwm", "pin": 18 },
    "shelf":   { "type": "rgb", "red": 17, "green": 27, "blue": 22 }
}"#;

/// Starts a server for the test configuration and returns its address.
async fn start_server() -> (SocketAddr, Controller, Arc<MemoryGpio>) {
    let gpio = Arc::new(MemoryGpio::new());
    let config = ControllerConfig::from_json_str(CONFIG).unwrap();
    let controller = Controller::from_config(&config, &Hardware::new(gpio.clone())).unwrap();

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server = controller.clone();
    tokio::spawn(async move {
        let _ = http::serve_on(server, listener).await;
    });

    (addr, controller, gpio)
}

async fn get(addr: SocketAddr, path: &str) -> (StatusCode, Value) {
    let response = reqwest::get(format!("http://{addr}{path}")).await.unwrap();
    let status = response.status();
    let body = response.json().await.unwrap();
    (status, body)
}

// ============================================================================
// Successful commands
// ============================================================================

mod commands {
    use super::*;

    #[tokio::test]
    async fn porch_off_when_already_off() {
        let (addr, _, _) = start_server().await;
        let (status, body) = get(addr, "/porch/off").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"level": 0, "switch": "off", "isStateChange": false}));
    }

    #[tokio::test]
    async fn set_level_by_position() {
        let (addr, _, gpio) = start_server().await;
        let (status, body) = get(addr, "/kitchen/set/75").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["level"], 75);
        assert_eq!(body["switch"], "on");
        assert_eq!(body["isStateChange"], true);
        assert_eq!(gpio.duty(18), Some(768));
    }

    #[tokio::test]
    async fn fade_reports_target_immediately() {
        let (addr, controller, _) = start_server().await;
        let (status, body) = get(addr, "/kitchen/fade/40/5").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["level"], 40);
        assert!(controller.device("kitchen").unwrap().is_fading());
    }

    #[tokio::test]
    async fn placeholder_keeps_default() {
        let (addr, _, _) = start_server().await;
        let (_, body) = get(addr, "/kitchen/fade/_/0").await;
        assert_eq!(body["level"], 100);
    }

    #[tokio::test]
    async fn encoded_color_argument() {
        let (addr, _, _) = start_server().await;
        let (status, body) = get(addr, "/shelf/color/%23ff8000").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["color"], "#ff8000");
    }

    #[tokio::test]
    async fn command_names_ignore_case() {
        let (addr, _, _) = start_server().await;
        let (status, body) = get(addr, "/porch/TOGGLE").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["switch"], "on");
    }
}

// ============================================================================
// Error responses
// ============================================================================

mod errors {
    use super::*;

    #[tokio::test]
    async fn unknown_device_is_404() {
        let (addr, _, _) = start_server().await;
        let (status, body) = get(addr, "/garage/on").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body["error"].as_str().unwrap().contains("garage"));
    }

    #[tokio::test]
    async fn unknown_command_is_404() {
        let (addr, _, _) = start_server().await;
        let (status, _) = get(addr, "/porch/increase").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn malformed_paths_are_404() {
        let (addr, _, _) = start_server().await;
        for path in ["/porch", "/kitchen/fade/1/2/3"] {
            let (status, _) = get(addr, path).await;
            assert_eq!(status, StatusCode::NOT_FOUND, "path {path}");
        }
    }

    #[tokio::test]
    async fn invalid_argument_is_400() {
        let (addr, _, gpio) = start_server().await;
        let writes = gpio.write_count();
        let (status, body) = get(addr, "/kitchen/fade/50/soon").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("duration"));
        assert_eq!(gpio.write_count(), writes);
    }

    #[tokio::test]
    async fn write_failure_is_500() {
        let (addr, _, gpio) = start_server().await;
        gpio.fail_pin(23);
        let (status, _) = get(addr, "/porch/on").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    }
}

// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Integration tests for the MQTT adapter using mockforge-mqtt.

#![cfg(feature = "mqtt")]

use std::time::Duration;

use ledctl_lib::output::Hardware;
use ledctl_lib::protocol::mqtt::MqttTransport;
use ledctl_lib::{Controller, ControllerConfig, DeviceConfig, ProtocolError};
use mockforge_mqtt::broker::MqttConfig;
use mockforge_mqtt::start_mqtt_server;
use tokio::time::sleep;

/// Helper to find an available port for testing.
fn get_test_port() -> u16 {
    use std::sync::atomic::{AtomicU16, Ordering};
    static PORT_COUNTER: AtomicU16 = AtomicU16::new(18950);
    PORT_COUNTER.fetch_add(1, Ordering::SeqCst)
}

/// Starts a mock MQTT broker on the given port.
async fn start_mock_broker(port: u16) {
    let config = MqttConfig {
        port,
        host: "127.0.0.1".to_string(),
        ..Default::default()
    };

    tokio::spawn(async move {
        let _ = start_mqtt_server(config).await;
    });

    // Give the broker time to bind
    sleep(Duration::from_millis(500)).await;
}

fn controller() -> Controller {
    let config = ControllerConfig::new()
        .with_device("porch", DeviceConfig::on_off(23))
        .with_device("kitchen", DeviceConfig::pwm(18));
    Controller::from_config(&config, &Hardware::simulated()).unwrap()
}

// ============================================================================
// Transport lifecycle
// ============================================================================

mod transport {
    use super::*;

    #[tokio::test]
    async fn connects_with_generated_client_id() {
        let port = get_test_port();
        start_mock_broker(port).await;

        let transport = MqttTransport::builder()
            .host("127.0.0.1")
            .port(port)
            .start(controller())
            .await;
        assert!(transport.is_ok(), "Failed to connect: {:?}", transport.err());

        let transport = transport.unwrap();
        assert!(transport.client_id().starts_with("ledctl-"));
        assert_eq!(transport.prefix(), "cmd");
        assert!(transport.is_running());

        transport.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn connects_from_broker_url() {
        let port = get_test_port();
        start_mock_broker(port).await;

        let transport = MqttTransport::builder()
            .broker(&format!("mqtt://127.0.0.1:{port}"))
            .unwrap()
            .client_id("kitchen-lights")
            .prefix("home/leds")
            .start(controller())
            .await
            .unwrap();

        assert_eq!(transport.client_id(), "kitchen-lights");
        assert_eq!(transport.prefix(), "home/leds");
    }

    #[tokio::test]
    async fn connects_without_devices() {
        let port = get_test_port();
        start_mock_broker(port).await;

        let result = MqttTransport::builder()
            .host("127.0.0.1")
            .port(port)
            .start(Controller::new())
            .await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn unreachable_broker_fails() {
        // Nothing listens on this port
        let port = get_test_port();

        let err = MqttTransport::builder()
            .host("127.0.0.1")
            .port(port)
            .connection_timeout(Duration::from_secs(2))
            .start(controller())
            .await
            .unwrap_err();
        assert!(matches!(err, ProtocolError::ConnectionFailed(_)));
    }

    #[tokio::test]
    async fn invalid_broker_url_fails() {
        let result = MqttTransport::builder().broker("mqtt://broker:port");
        assert!(matches!(result, Err(ProtocolError::InvalidAddress(_))));
    }
}

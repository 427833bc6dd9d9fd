// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! MQTT adapter.
//!
//! Each device listens on `<prefix>/<device>/req` for a JSON object whose
//! `cmd` field names the command and whose other fields are named arguments:
//!
//! ```json
//! {"cmd": "fade", "level": 40, "duration": 3}
//! ```
//!
//! A successful command publishes the status document on
//! `<prefix>/<device>/resp`. A payload that cannot be decoded or run records
//! an error on the device and publishes nothing; the error is reported with
//! the device's next status.

use std::time::Duration;

use rumqttc::{AsyncClient, EventLoop, MqttOptions, QoS, SubscribeFilter};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use crate::command::CommandRequest;
use crate::error::ProtocolError;
use crate::manager::Controller;

use super::{DEFAULT_TOPIC_PREFIX, parse_request_topic, request_topic, response_topic};

/// Default broker port.
pub const DEFAULT_PORT: u16 = 1883;

/// Default keep-alive interval.
pub const DEFAULT_KEEP_ALIVE: Duration = Duration::from_secs(30);

/// Default time to wait for the broker to accept the connection.
pub const DEFAULT_CONNECTION_TIMEOUT: Duration = Duration::from_secs(10);

/// Default pause before polling again after the connection drops.
pub const DEFAULT_RECONNECT_DELAY: Duration = Duration::from_secs(5);

/// Capacity of the client request queue.
const REQUEST_CAPACITY: usize = 64;

// ============================================================================
// Request handling
// ============================================================================

/// Runs one request payload against `device`.
///
/// Returns the status JSON to publish, or `None` when nothing should be
/// published: the device is unknown, or the payload failed and the failure
/// was recorded on the device.
///
/// # Examples
///
/// ```
/// use ledctl_lib::manager::{Controller, ControllerConfig, DeviceConfig};
/// use ledctl_lib::output::Hardware;
/// use ledctl_lib::protocol::mqtt::handle_request;
///
/// let config = ControllerConfig::new().with_device("porch", DeviceConfig::on_off(23));
/// let controller = Controller::from_config(&config, &Hardware::simulated()).unwrap();
///
/// let body = handle_request(&controller, "porch", br#"{"cmd": "on"}"#).unwrap();
/// assert!(body.contains(r#""isStateChange":true"#));
///
/// assert!(handle_request(&controller, "porch", b"not json").is_none());
/// ```
#[must_use]
pub fn handle_request(controller: &Controller, device: &str, payload: &[u8]) -> Option<String> {
    if controller.device(device).is_none() {
        tracing::debug!(device = %device, "Request for unknown device ignored");
        return None;
    }

    let request = serde_json::from_slice(payload)
        .map_err(|e| format!("malformed payload: {e}"))
        .and_then(|value| CommandRequest::from_json(value).map_err(|e| e.to_string()));

    let outcome = request.and_then(|request| {
        controller
            .execute(device, &request)
            .map_err(|e| e.to_string())
    });

    match outcome {
        Ok(status) => Some(status.to_json()),
        Err(message) => {
            tracing::warn!(device = %device, error = %message, "Rejected MQTT request");
            controller.record_error(device, message);
            None
        }
    }
}

// ============================================================================
// Transport
// ============================================================================

/// A running MQTT transport.
///
/// The event loop runs on a spawned task until [`shutdown`](Self::shutdown).
/// A dropped connection is retried after the reconnect delay and every
/// device is subscribed again once the broker accepts it.
#[derive(Debug)]
pub struct MqttTransport {
    client: AsyncClient,
    client_id: String,
    prefix: String,
    task: JoinHandle<()>,
}

impl MqttTransport {
    /// Returns a builder.
    #[must_use]
    pub fn builder() -> MqttTransportBuilder {
        MqttTransportBuilder::default()
    }

    /// Returns the client identifier used with the broker.
    #[must_use]
    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    /// Returns the topic prefix.
    #[must_use]
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Returns `true` while the event loop task is alive.
    #[must_use]
    pub fn is_running(&self) -> bool {
        !self.task.is_finished()
    }

    /// Disconnects from the broker and stops the event loop.
    ///
    /// # Errors
    ///
    /// Returns `ProtocolError::Mqtt` if the disconnect request cannot be queued.
    pub async fn shutdown(self) -> Result<(), ProtocolError> {
        let result = self.client.disconnect().await;
        self.task.abort();
        tracing::info!(client_id = %self.client_id, "MQTT transport stopped");
        result.map_err(ProtocolError::from)
    }
}

/// Builder for [`MqttTransport`].
///
/// # Examples
///
/// ```no_run
/// use std::time::Duration;
///
/// use ledctl_lib::manager::Controller;
/// use ledctl_lib::protocol::mqtt::MqttTransport;
///
/// # async fn example(controller: Controller) -> Result<(), ledctl_lib::error::ProtocolError> {
/// let transport = MqttTransport::builder()
///     .broker("mqtt://192.168.1.50:1883")?
///     .credentials("leds", "secret")
///     .keep_alive(Duration::from_secs(60))
///     .start(controller)
///     .await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct MqttTransportBuilder {
    host: String,
    port: u16,
    credentials: Option<(String, String)>,
    client_id: Option<String>,
    keep_alive: Duration,
    connection_timeout: Duration,
    reconnect_delay: Duration,
    prefix: String,
}

impl Default for MqttTransportBuilder {
    fn default() -> Self {
        Self {
            host: String::new(),
            port: DEFAULT_PORT,
            credentials: None,
            client_id: None,
            keep_alive: DEFAULT_KEEP_ALIVE,
            connection_timeout: DEFAULT_CONNECTION_TIMEOUT,
            reconnect_delay: DEFAULT_RECONNECT_DELAY,
            prefix: DEFAULT_TOPIC_PREFIX.to_string(),
        }
    }
}

impl MqttTransportBuilder {
    /// Sets the broker host.
    #[must_use]
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    /// Sets the broker port.
    #[must_use]
    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Sets host and port from a URL such as `mqtt://broker:1883`.
    ///
    /// # Errors
    ///
    /// Returns `ProtocolError::InvalidAddress` if the port is not a number.
    pub fn broker(mut self, url: &str) -> Result<Self, ProtocolError> {
        let (host, port) = parse_mqtt_url(url)?;
        self.host = host;
        self.port = port;
        Ok(self)
    }

    /// Sets broker credentials.
    #[must_use]
    pub fn credentials(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.credentials = Some((username.into(), password.into()));
        self
    }

    /// Sets the client identifier. Defaults to `ledctl-<uuid>`.
    #[must_use]
    pub fn client_id(mut self, id: impl Into<String>) -> Self {
        self.client_id = Some(id.into());
        self
    }

    /// Sets the keep-alive interval.
    #[must_use]
    pub fn keep_alive(mut self, duration: Duration) -> Self {
        self.keep_alive = duration;
        self
    }

    /// Sets how long [`start`](Self::start) waits for the broker.
    #[must_use]
    pub fn connection_timeout(mut self, timeout: Duration) -> Self {
        self.connection_timeout = timeout;
        self
    }

    /// Sets the pause before reconnecting after the connection drops.
    #[must_use]
    pub fn reconnect_delay(mut self, delay: Duration) -> Self {
        self.reconnect_delay = delay;
        self
    }

    /// Sets the topic prefix. Defaults to `cmd`.
    #[must_use]
    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Connects, subscribes every device of `controller` and spawns the
    /// event loop.
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - Host is not set
    /// - The broker does not accept the connection within the timeout
    pub async fn start(self, controller: Controller) -> Result<MqttTransport, ProtocolError> {
        if self.host.is_empty() {
            return Err(ProtocolError::InvalidAddress(
                "MQTT broker host is required".to_string(),
            ));
        }

        let client_id = self
            .client_id
            .unwrap_or_else(|| format!("ledctl-{}", uuid::Uuid::new_v4()));

        let mut options = MqttOptions::new(&client_id, &self.host, self.port);
        options.set_keep_alive(self.keep_alive);
        options.set_clean_session(true);
        if let Some((username, password)) = self.credentials {
            options.set_credentials(username, password);
        }

        let (client, event_loop) = AsyncClient::new(options, REQUEST_CAPACITY);
        let (connack_tx, connack_rx) = oneshot::channel();

        let task = tokio::spawn(run_event_loop(
            event_loop,
            client.clone(),
            controller.clone(),
            self.prefix.clone(),
            self.reconnect_delay,
            connack_tx,
        ));

        match tokio::time::timeout(self.connection_timeout, connack_rx).await {
            Ok(Ok(())) => {
                tracing::info!(
                    host = %self.host,
                    port = self.port,
                    client_id = %client_id,
                    devices = controller.device_count(),
                    "MQTT transport connected"
                );
            }
            Ok(Err(_)) => {
                task.abort();
                return Err(ProtocolError::ConnectionFailed(
                    "MQTT event loop terminated unexpectedly".to_string(),
                ));
            }
            Err(_) => {
                task.abort();
                return Err(ProtocolError::ConnectionFailed(format!(
                    "MQTT connection timeout after {}s",
                    self.connection_timeout.as_secs()
                )));
            }
        }

        Ok(MqttTransport {
            client,
            client_id,
            prefix: self.prefix,
            task,
        })
    }
}

/// Parses an MQTT URL into host and port.
fn parse_mqtt_url(url: &str) -> Result<(String, u16), ProtocolError> {
    let url = url
        .strip_prefix("mqtt://")
        .or_else(|| url.strip_prefix("tcp://"))
        .unwrap_or(url);

    match url.rsplit_once(':') {
        Some((host, port)) => {
            let port = port
                .parse()
                .map_err(|_| ProtocolError::InvalidAddress(format!("invalid port: {port}")))?;
            Ok((host.to_string(), port))
        }
        None => Ok((url.to_string(), DEFAULT_PORT)),
    }
}

/// What the event loop does after a connection error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Recovery {
    Stop,
    RetryAfter(Duration),
}

/// Errors before the first ConnAck end the loop so `start` can report them.
fn recovery(connected: bool, delay: Duration) -> Recovery {
    if connected {
        Recovery::RetryAfter(delay)
    } else {
        Recovery::Stop
    }
}

fn subscriptions(controller: &Controller, prefix: &str) -> Vec<SubscribeFilter> {
    controller
        .device_names()
        .iter()
        .map(|device| SubscribeFilter::new(request_topic(prefix, device), QoS::AtLeastOnce))
        .collect()
}

async fn run_event_loop(
    mut event_loop: EventLoop,
    client: AsyncClient,
    controller: Controller,
    prefix: String,
    reconnect_delay: Duration,
    connack_tx: oneshot::Sender<()>,
) {
    use rumqttc::{Event, Packet};

    let mut connack_tx = Some(connack_tx);

    loop {
        match event_loop.poll().await {
            Ok(Event::Incoming(Packet::ConnAck(connack))) => {
                tracing::debug!(?connack, "MQTT connected");
                // Clean sessions drop subscriptions across reconnects
                let filters = subscriptions(&controller, &prefix);
                if !filters.is_empty()
                    && let Err(e) = client.try_subscribe_many(filters)
                {
                    tracing::error!(error = %e, "Failed to queue MQTT subscriptions");
                }
                if let Some(tx) = connack_tx.take() {
                    let _ = tx.send(());
                }
            }
            Ok(Event::Incoming(Packet::SubAck(suback))) => {
                tracing::debug!(?suback, "MQTT subscription acknowledged");
            }
            Ok(Event::Incoming(Packet::Publish(publish))) => {
                let Some(device) = parse_request_topic(&prefix, &publish.topic) else {
                    continue;
                };
                tracing::debug!(topic = %publish.topic, bytes = publish.payload.len(), "MQTT request received");

                if let Some(body) = handle_request(&controller, device, &publish.payload) {
                    let topic = response_topic(&prefix, device);
                    let client = client.clone();
                    // Publishing from a separate task keeps the loop polling
                    tokio::spawn(async move {
                        if let Err(e) = client.publish(&topic, QoS::AtLeastOnce, false, body).await {
                            tracing::error!(topic = %topic, error = %e, "Failed to publish MQTT response");
                        }
                    });
                }
            }
            Ok(Event::Incoming(Packet::Disconnect)) => {
                tracing::info!("MQTT broker disconnected");
                break;
            }
            Ok(_) => {}
            Err(e) => match recovery(connack_tx.is_none(), reconnect_delay) {
                Recovery::Stop => {
                    tracing::error!(error = %e, "MQTT connection failed");
                    break;
                }
                Recovery::RetryAfter(delay) => {
                    tracing::warn!(
                        error = %e,
                        retry_ms = delay.as_millis(),
                        "MQTT connection lost, reconnecting"
                    );
                    tokio::time::sleep(delay).await;
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manager::{ControllerConfig, DeviceConfig};
    use crate::output::Hardware;

    fn controller() -> Controller {
        let config = ControllerConfig::new()
            .with_device("porch", DeviceConfig::on_off(23))
            .with_device("kitchen", DeviceConfig::pwm(18));
        Controller::from_config(&config, &Hardware::simulated()).unwrap()
    }

    #[test]
    fn parse_mqtt_url_with_port() {
        let (host, port) = parse_mqtt_url("mqtt://192.168.1.50:1884").unwrap();
        assert_eq!(host, "192.168.1.50");
        assert_eq!(port, 1884);
    }

    #[test]
    fn parse_mqtt_url_default_port() {
        let (host, port) = parse_mqtt_url("broker.local").unwrap();
        assert_eq!(host, "broker.local");
        assert_eq!(port, DEFAULT_PORT);
    }

    #[test]
    fn parse_mqtt_url_bad_port() {
        assert!(matches!(
            parse_mqtt_url("tcp://broker:http"),
            Err(ProtocolError::InvalidAddress(_))
        ));
    }

    #[test]
    fn builder_defaults() {
        let builder = MqttTransport::builder();
        assert!(builder.host.is_empty());
        assert_eq!(builder.port, DEFAULT_PORT);
        assert_eq!(builder.prefix, "cmd");
        assert_eq!(builder.keep_alive, DEFAULT_KEEP_ALIVE);
        assert!(builder.client_id.is_none());
    }

    #[test]
    fn builder_chain() {
        let builder = MqttTransport::builder()
            .host("broker")
            .port(8883)
            .credentials("user", "pass")
            .client_id("lights")
            .prefix("home/leds");
        assert_eq!(builder.host, "broker");
        assert_eq!(builder.port, 8883);
        assert_eq!(builder.credentials, Some(("user".into(), "pass".into())));
        assert_eq!(builder.client_id.as_deref(), Some("lights"));
        assert_eq!(builder.prefix, "home/leds");
    }

    #[tokio::test]
    async fn start_without_host_fails() {
        let err = MqttTransport::builder().start(controller()).await.unwrap_err();
        assert!(matches!(err, ProtocolError::InvalidAddress(_)));
    }

    #[test]
    fn errors_stop_the_loop_only_before_first_connection() {
        let delay = Duration::from_millis(250);
        assert_eq!(recovery(false, delay), Recovery::Stop);
        assert_eq!(recovery(true, delay), Recovery::RetryAfter(delay));
    }

    #[test]
    fn reconnect_delay_is_configurable() {
        let builder = MqttTransport::builder();
        assert_eq!(builder.reconnect_delay, DEFAULT_RECONNECT_DELAY);
        let builder = builder.reconnect_delay(Duration::from_secs(1));
        assert_eq!(builder.reconnect_delay, Duration::from_secs(1));
    }

    #[test]
    fn subscribes_every_device() {
        let filters = subscriptions(&controller(), "cmd");
        let topics: Vec<_> = filters.iter().map(|f| f.path.as_str()).collect();
        assert_eq!(topics, ["cmd/kitchen/req", "cmd/porch/req"]);
    }

    #[test]
    fn successful_request_returns_status() {
        let controller = controller();
        let body = handle_request(&controller, "kitchen", br#"{"cmd": "set", "level": 40}"#).unwrap();
        let json: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(json["level"], 40);
        assert_eq!(json["isStateChange"], true);
    }

    #[test]
    fn unknown_device_is_ignored() {
        assert!(handle_request(&controller(), "attic", br#"{"cmd": "on"}"#).is_none());
    }

    #[test]
    fn malformed_payloads_record_errors() {
        let controller = controller();
        let payloads: [&[u8]; 3] = [b"{not json", br#"{"level": 40}"#, br#"{"cmd": "blink"}"#];
        for payload in payloads {
            assert!(handle_request(&controller, "porch", payload).is_none());
            let device = controller.device("porch").unwrap();
            assert!(device.take_error().is_some(), "no error for {payload:?}");
        }

        // State was never touched
        let body = handle_request(&controller, "porch", br#"{"cmd": "off"}"#).unwrap();
        assert!(body.contains(r#""isStateChange":false"#));
    }

    #[test]
    fn rejected_request_error_is_reported_next_time() {
        let controller = controller();
        assert!(handle_request(&controller, "kitchen", br#"{"cmd": "fade", "duration": -1}"#).is_none());

        let body = handle_request(&controller, "kitchen", br#"{"cmd": "set", "level": 0}"#).unwrap();
        assert!(body.contains(r#""error":"#));
    }
}

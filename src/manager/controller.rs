// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Named device registry and command entry point.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tokio::sync::broadcast;

use crate::command::CommandRequest;
use crate::device::Device;
use crate::error::{ConfigError, Error};
use crate::event::{DeviceEvent, EventBus};
use crate::output::Hardware;
use crate::state::StatusDocument;

use super::ControllerConfig;

/// Registry of the devices a process drives.
///
/// Transports address devices by name through the controller. Every
/// successful command that changes what a device shows is published as
/// [`DeviceEvent::StateChanged`]; every scheduled fade that settles is
/// published as [`DeviceEvent::FadeCompleted`].
///
/// Cloning a controller is cheap; clones share devices and the event bus.
///
/// # Examples
///
/// ```
/// use ledctl_lib::command::CommandRequest;
/// use ledctl_lib::manager::{Controller, ControllerConfig, DeviceConfig};
/// use ledctl_lib::output::Hardware;
///
/// let config = ControllerConfig::new().with_device("porch", DeviceConfig::on_off(23));
/// let controller = Controller::from_config(&config, &Hardware::simulated()).unwrap();
///
/// let status = controller.execute("porch", &CommandRequest::new("on")).unwrap();
/// assert_eq!(status.level(), 100);
/// assert!(status.is_state_change());
///
/// let err = controller.execute("attic", &CommandRequest::new("on")).unwrap_err();
/// assert!(err.is_not_found());
/// ```
#[derive(Debug, Clone, Default)]
pub struct Controller {
    devices: Arc<RwLock<HashMap<String, Arc<Device>>>>,
    events: EventBus,
}

impl Controller {
    /// Creates an empty controller.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty controller whose event bus buffers `event_capacity`
    /// events per subscriber.
    #[must_use]
    pub fn with_capacity(event_capacity: usize) -> Self {
        Self {
            devices: Arc::default(),
            events: EventBus::with_capacity(event_capacity),
        }
    }

    /// Builds every configured device.
    ///
    /// # Errors
    ///
    /// Returns the first device construction error.
    pub fn from_config(config: &ControllerConfig, hardware: &Hardware) -> Result<Self, Error> {
        let controller = Self::new();
        for (name, device) in config.iter() {
            controller.add_device(device.build(name, hardware)?)?;
        }
        Ok(controller)
    }

    /// Subscribes to device events.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<DeviceEvent> {
        self.events.subscribe()
    }

    /// Returns the event bus.
    #[must_use]
    pub fn events(&self) -> &EventBus {
        &self.events
    }

    /// Registers a device.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::DuplicateDevice` if the name is taken.
    pub fn add_device(&self, device: Device) -> Result<Arc<Device>, Error> {
        let device = Arc::new(device);
        let name = device.name().to_string();

        {
            let mut devices = self.devices.write();
            if devices.contains_key(&name) {
                return Err(ConfigError::DuplicateDevice(name).into());
            }
            devices.insert(name.clone(), Arc::clone(&device));
        }

        let events = self.events.clone();
        let weak = Arc::downgrade(&device);
        device.on_fade_complete(Arc::new(move || {
            if let Some(device) = weak.upgrade() {
                events.publish(DeviceEvent::fade_completed(device.name(), device.status()));
            }
        }));

        tracing::info!(device = %name, kind = %device.kind(), "Device registered");
        self.events.publish(DeviceEvent::device_added(name, device.kind()));
        Ok(device)
    }

    /// Returns a device by name.
    #[must_use]
    pub fn device(&self, name: &str) -> Option<Arc<Device>> {
        self.devices.read().get(name).cloned()
    }

    /// Returns the registered names, sorted.
    #[must_use]
    pub fn device_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.devices.read().keys().cloned().collect();
        names.sort();
        names
    }

    /// Returns the number of registered devices.
    #[must_use]
    pub fn device_count(&self) -> usize {
        self.devices.read().len()
    }

    /// Runs a command on a named device.
    ///
    /// # Errors
    ///
    /// - `Error::DeviceNotFound` if no device has this name
    /// - any error of [`dispatch`](crate::command::dispatch)
    pub fn execute(&self, name: &str, request: &CommandRequest) -> Result<StatusDocument, Error> {
        let device = self
            .device(name)
            .ok_or_else(|| Error::DeviceNotFound(name.to_string()))?;

        let status = device.execute(request)?;
        if status.is_state_change() {
            self.events
                .publish(DeviceEvent::state_changed(name, status.clone()));
        }
        Ok(status)
    }

    /// Records an error on a named device, reported with its next status.
    ///
    /// Unknown names are ignored.
    pub fn record_error(&self, name: &str, message: impl Into<String>) {
        if let Some(device) = self.device(name) {
            device.record_error(message);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manager::DeviceConfig;

    fn controller() -> Controller {
        let config = ControllerConfig::new()
            .with_device("porch", DeviceConfig::on_off(23))
            .with_device("kitchen", DeviceConfig::pwm(18));
        Controller::from_config(&config, &Hardware::simulated()).unwrap()
    }

    #[test]
    fn registers_configured_devices() {
        let controller = controller();
        assert_eq!(controller.device_names(), ["kitchen", "porch"]);
        assert_eq!(controller.device_count(), 2);
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let controller = controller();
        let device = DeviceConfig::pwm(12).build("porch", &Hardware::simulated()).unwrap();
        let err = controller.add_device(device).unwrap_err();
        assert!(matches!(err, Error::Config(ConfigError::DuplicateDevice(_))));
    }

    #[test]
    fn unknown_device_is_not_found() {
        let err = controller()
            .execute("attic", &CommandRequest::new("on"))
            .unwrap_err();
        assert!(matches!(err, Error::DeviceNotFound(ref name) if name == "attic"));
    }

    #[test]
    fn state_changes_are_published() {
        let controller = controller();
        let mut rx = controller.subscribe();

        controller.execute("porch", &CommandRequest::new("on")).unwrap();
        controller.execute("porch", &CommandRequest::new("on")).unwrap();

        let event = rx.try_recv().unwrap();
        assert!(event.is_state_change());
        assert_eq!(event.device(), "porch");
        // The second command changed nothing
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn add_device_publishes_event() {
        let controller = Controller::new();
        let mut rx = controller.subscribe();
        let device = DeviceConfig::pwm(12).build("desk", &Hardware::simulated()).unwrap();
        controller.add_device(device).unwrap();

        let event = rx.try_recv().unwrap();
        assert_eq!(event, DeviceEvent::device_added("desk", crate::types::DeviceKind::Pwm));
    }

    #[test]
    fn recorded_error_reaches_next_status() {
        let controller = controller();
        controller.record_error("kitchen", "bad payload");
        controller.record_error("attic", "ignored");
        let status = controller
            .execute("kitchen", &CommandRequest::new("set").with_arg("level", 0))
            .unwrap();
        assert_eq!(status.error(), Some("bad payload"));
    }

    #[tokio::test(start_paused = true)]
    async fn fade_completion_is_published() {
        let controller = controller();
        let mut rx = controller.subscribe();

        let request = CommandRequest::new("fade")
            .with_arg("level", 60)
            .with_arg("duration", 1);
        controller.execute("kitchen", &request).unwrap();
        assert!(rx.recv().await.unwrap().is_state_change());

        let event = rx.recv().await.unwrap();
        assert!(event.is_fade_completed());
        assert_eq!(event.status().map(StatusDocument::level), Some(60));
    }
}

// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Device configuration records.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::device::Device;
use crate::error::{ConfigError, Error};
use crate::output::{DigitalOutput, Hardware, PwmOutput};
use crate::types::{DeviceKind, Level, RgbColor};

/// Name of the device created when the configuration is empty.
pub const FALLBACK_DEVICE: &str = "led";

/// PWM pin of the device created when the configuration is empty.
pub const FALLBACK_PIN: u32 = 18;

/// A pin or driver channel number, given as a number or a numeric string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PinNumber {
    /// Plain number.
    Number(u32),
    /// Number written as a string.
    Text(String),
}

impl PinNumber {
    fn resolve(&self, device: &str) -> Result<u32, ConfigError> {
        match self {
            Self::Number(n) => Ok(*n),
            Self::Text(s) => s.trim().parse().map_err(|_| ConfigError::InvalidPin {
                device: device.to_string(),
                value: s.clone(),
            }),
        }
    }
}

impl From<u32> for PinNumber {
    fn from(n: u32) -> Self {
        Self::Number(n)
    }
}

/// Configuration of one device.
///
/// Mirrors one record of the configuration document:
///
/// ```json
/// { "type": "rgb", "red": 17, "green": 27, "blue": 22, "default": "orange" }
/// ```
///
/// A missing `type` means an on/off device; a missing `default` means off.
///
/// # Examples
///
/// ```
/// use ledctl_lib::manager::DeviceConfig;
/// use ledctl_lib::output::Hardware;
/// use ledctl_lib::types::DeviceKind;
///
/// let config = DeviceConfig::pwm(18).with_default("40");
/// let device = config.build("kitchen", &Hardware::simulated()).unwrap();
/// assert_eq!(device.kind(), DeviceKind::Pwm);
/// assert_eq!(device.status().level(), 40);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeviceConfig {
    /// Device kind (`onoff`, `pwm`, `rgb`, `pca9685`, `pcargb`).
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    /// Pin (or driver channel) of single-output devices.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pin: Option<PinNumber>,
    /// Red pin (or driver channel) of color devices.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub red: Option<PinNumber>,
    /// Green pin (or driver channel) of color devices.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub green: Option<PinNumber>,
    /// Blue pin (or driver channel) of color devices.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blue: Option<PinNumber>,
    /// Initial state: `on`, `off`, a level, or a color literal.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
}

impl DeviceConfig {
    fn single(kind: DeviceKind, pin: u32) -> Self {
        Self {
            kind: Some(kind.as_str().to_string()),
            pin: Some(pin.into()),
            ..Self::default()
        }
    }

    fn triple(kind: DeviceKind, red: u32, green: u32, blue: u32) -> Self {
        Self {
            kind: Some(kind.as_str().to_string()),
            red: Some(red.into()),
            green: Some(green.into()),
            blue: Some(blue.into()),
            ..Self::default()
        }
    }

    /// Configures an on/off device on a digital pin.
    #[must_use]
    pub fn on_off(pin: u32) -> Self {
        Self::single(DeviceKind::OnOff, pin)
    }

    /// Configures a dimmable device on a PWM pin.
    #[must_use]
    pub fn pwm(pin: u32) -> Self {
        Self::single(DeviceKind::Pwm, pin)
    }

    /// Configures a dimmable device on a driver channel.
    #[must_use]
    pub fn driver_pwm(channel: u32) -> Self {
        Self::single(DeviceKind::DriverPwm, channel)
    }

    /// Configures a color device on three PWM pins.
    #[must_use]
    pub fn rgb(red: u32, green: u32, blue: u32) -> Self {
        Self::triple(DeviceKind::Rgb, red, green, blue)
    }

    /// Configures a color device on three driver channels.
    #[must_use]
    pub fn driver_rgb(red: u32, green: u32, blue: u32) -> Self {
        Self::triple(DeviceKind::DriverRgb, red, green, blue)
    }

    /// Sets the initial state token.
    #[must_use]
    pub fn with_default(mut self, token: impl Into<String>) -> Self {
        self.default = Some(Value::String(token.into()));
        self
    }

    /// Resolves the configured kind.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::UnknownKind` for an unrecognized kind string.
    pub fn device_kind(&self, name: &str) -> Result<DeviceKind, ConfigError> {
        match &self.kind {
            None => Ok(DeviceKind::OnOff),
            Some(kind) => kind.parse().map_err(|_| ConfigError::UnknownKind {
                device: name.to_string(),
                kind: kind.clone(),
            }),
        }
    }

    /// Builds the device, writing its initial state.
    ///
    /// # Errors
    ///
    /// - `ConfigError` if the kind is unknown, a pin is missing or invalid,
    ///   the default state does not parse, or a driver-backed device is
    ///   configured without a driver
    /// - `OutputError` if the initial write fails
    pub fn build(&self, name: &str, hardware: &Hardware) -> Result<Device, Error> {
        let kind = self.device_kind(name)?;
        tracing::debug!(device = %name, kind = %kind, "Building device");

        let device = match kind {
            DeviceKind::OnOff => {
                let pin = Self::required(name, "pin", self.pin.as_ref())?;
                let output = DigitalOutput::new(hardware.gpio().clone(), pin);
                Device::switch(name, output, self.initial_level(name)?)?
            }
            DeviceKind::Pwm | DeviceKind::DriverPwm => {
                let pin = Self::required(name, "pin", self.pin.as_ref())?;
                let output = Self::pwm_output(name, kind, hardware, pin)?;
                Device::dimmer(name, output, self.initial_level(name)?)?
            }
            DeviceKind::Rgb | DeviceKind::DriverRgb => {
                let [r, g, b] = [
                    Self::required(name, "red", self.red.as_ref())?,
                    Self::required(name, "green", self.green.as_ref())?,
                    Self::required(name, "blue", self.blue.as_ref())?,
                ];
                let outputs = [
                    Self::pwm_output(name, kind, hardware, r)?,
                    Self::pwm_output(name, kind, hardware, g)?,
                    Self::pwm_output(name, kind, hardware, b)?,
                ];
                Device::color(name, outputs, self.initial_color(name)?)?
            }
        };
        Ok(device)
    }

    fn required(
        name: &str,
        channel: &str,
        pin: Option<&PinNumber>,
    ) -> Result<u32, ConfigError> {
        pin.ok_or_else(|| ConfigError::MissingPin {
            device: name.to_string(),
            channel: channel.to_string(),
        })?
        .resolve(name)
    }

    fn pwm_output(
        name: &str,
        kind: DeviceKind,
        hardware: &Hardware,
        pin: u32,
    ) -> Result<PwmOutput, ConfigError> {
        if kind.is_driver_backed() {
            let driver = hardware
                .driver()
                .ok_or_else(|| ConfigError::DriverUnavailable(name.to_string()))?;
            Ok(PwmOutput::driver(driver.clone(), pin))
        } else {
            Ok(PwmOutput::pin(hardware.gpio().clone(), pin))
        }
    }

    fn token(&self) -> Option<String> {
        match &self.default {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) => Some(s.trim().to_lowercase()),
            Some(other) => Some(other.to_string()),
        }
    }

    fn initial_level(&self, name: &str) -> Result<Level, ConfigError> {
        match self.token().as_deref() {
            None | Some("off") => Ok(Level::MIN),
            Some("on") => Ok(Level::MAX),
            Some(token) => token
                .parse::<f64>()
                .ok()
                .filter(|n| n.is_finite())
                .map(Level::clamped)
                .ok_or_else(|| ConfigError::InvalidDefault {
                    device: name.to_string(),
                    value: token.to_string(),
                }),
        }
    }

    fn initial_color(&self, name: &str) -> Result<RgbColor, ConfigError> {
        match self.token().as_deref() {
            None | Some("off") => Ok(RgbColor::black()),
            Some("on") => Ok(RgbColor::white()),
            Some(token) => RgbColor::parse(token).map_err(|_| ConfigError::InvalidDefault {
                device: name.to_string(),
                value: token.to_string(),
            }),
        }
    }
}

/// The full device configuration: device name to record.
///
/// # Examples
///
/// ```
/// use ledctl_lib::manager::ControllerConfig;
///
/// let config = ControllerConfig::from_json_str(r#"{
///     "porch":   { "type": "onoff", "pin": 23 },
///     "kitchen": { "type": "pwm", "pin": "18", "default": "on" }
/// }"#).unwrap();
/// assert_eq!(config.len(), 2);
///
/// // An empty document still yields one PWM device on pin 18
/// let config = ControllerConfig::from_json_str("{}").unwrap();
/// assert!(config.device("led").is_some());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ControllerConfig {
    devices: BTreeMap<String, DeviceConfig>,
}

impl ControllerConfig {
    /// Creates an empty configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a JSON configuration document.
    ///
    /// An empty document is replaced by the fallback configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Json` if the document does not parse.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        Ok(config.or_fallback())
    }

    /// Replaces an empty configuration with a single PWM device named
    /// `led` on pin 18.
    #[must_use]
    pub fn or_fallback(self) -> Self {
        if self.devices.is_empty() {
            Self::new().with_device(FALLBACK_DEVICE, DeviceConfig::pwm(FALLBACK_PIN))
        } else {
            self
        }
    }

    /// Adds (or replaces) a device record.
    #[must_use]
    pub fn with_device(mut self, name: impl Into<String>, config: DeviceConfig) -> Self {
        self.devices.insert(name.into(), config);
        self
    }

    /// Returns the record of a device.
    #[must_use]
    pub fn device(&self, name: &str) -> Option<&DeviceConfig> {
        self.devices.get(name)
    }

    /// Iterates over the records in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &DeviceConfig)> {
        self.devices.iter().map(|(name, config)| (name.as_str(), config))
    }

    /// Returns the number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.devices.len()
    }

    /// Returns `true` if there are no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::output::{MemoryDriver, MemoryGpio};

    fn gpio_only() -> (Hardware, Arc<MemoryGpio>) {
        let gpio = Arc::new(MemoryGpio::new());
        (Hardware::new(gpio.clone()), gpio)
    }

    #[test]
    fn parses_records_with_string_pins() {
        let config = ControllerConfig::from_json_str(
            r#"{"strip": {"type": "RGB", "red": "17", "green": 27, "blue": 22, "default": "Orange"}}"#,
        )
        .unwrap();
        let (hardware, gpio) = gpio_only();
        let device = config.device("strip").unwrap().build("strip", &hardware).unwrap();
        assert_eq!(device.kind(), DeviceKind::Rgb);
        assert_eq!(device.status().color(), Some("#ffa500"));
        assert_eq!(gpio.duty(17), Some(1024));
    }

    #[test]
    fn missing_type_is_on_off() {
        let config: DeviceConfig = serde_json::from_str(r#"{"pin": 4, "default": "on"}"#).unwrap();
        let (hardware, gpio) = gpio_only();
        let device = config.build("porch", &hardware).unwrap();
        assert_eq!(device.kind(), DeviceKind::OnOff);
        assert_eq!(gpio.digital(4), Some(true));
    }

    #[test]
    fn numeric_default_is_accepted() {
        let config: DeviceConfig =
            serde_json::from_str(r#"{"type": "pwm", "pin": 12, "default": 30}"#).unwrap();
        let (hardware, _) = gpio_only();
        let device = config.build("desk", &hardware).unwrap();
        assert_eq!(device.status().level(), 30);
    }

    #[test]
    fn missing_color_pin_names_channel() {
        let config = DeviceConfig {
            green: None,
            ..DeviceConfig::rgb(1, 2, 3)
        };
        let (hardware, _) = gpio_only();
        let err = config.build("strip", &hardware).unwrap_err();
        assert_eq!(
            err.to_string(),
            "configuration error: [strip] missing green pin number"
        );
    }

    #[test]
    fn unknown_kind_is_rejected() {
        let config: DeviceConfig = serde_json::from_str(r#"{"type": "laser", "pin": 1}"#).unwrap();
        let (hardware, _) = gpio_only();
        let err = config.build("porch", &hardware).unwrap_err();
        assert!(matches!(err, Error::Config(ConfigError::UnknownKind { .. })));
    }

    #[test]
    fn bad_default_is_rejected() {
        let (hardware, _) = gpio_only();
        let err = DeviceConfig::pwm(18)
            .with_default("bright")
            .build("desk", &hardware)
            .unwrap_err();
        assert!(matches!(err, Error::Config(ConfigError::InvalidDefault { .. })));

        let err = DeviceConfig::rgb(1, 2, 3)
            .with_default("blurple")
            .build("strip", &hardware)
            .unwrap_err();
        assert!(matches!(err, Error::Config(ConfigError::InvalidDefault { .. })));
    }

    #[test]
    fn driver_devices_need_a_driver() {
        let (hardware, _) = gpio_only();
        let err = DeviceConfig::driver_pwm(0).build("cabinet", &hardware).unwrap_err();
        assert!(matches!(err, Error::Config(ConfigError::DriverUnavailable(_))));

        let driver = Arc::new(MemoryDriver::new());
        let hardware = hardware.with_driver(driver.clone());
        let device = DeviceConfig::driver_rgb(0, 1, 2)
            .with_default("white")
            .build("cabinet", &hardware)
            .unwrap();
        assert_eq!(device.kind(), DeviceKind::DriverRgb);
        assert_eq!(driver.duty(2), Some(65535));
    }

    #[test]
    fn driver_aliases_parse() {
        for kind in ["pca9685", "pca", "driverpwm"] {
            let config = DeviceConfig {
                kind: Some(kind.to_string()),
                ..DeviceConfig::pwm(3)
            };
            assert_eq!(config.device_kind("x").unwrap(), DeviceKind::DriverPwm);
        }
    }

    #[test]
    fn empty_document_falls_back() {
        let config = ControllerConfig::from_json_str("{}").unwrap();
        assert_eq!(config.len(), 1);
        assert_eq!(config.device(FALLBACK_DEVICE), Some(&DeviceConfig::pwm(FALLBACK_PIN)));
    }

    #[test]
    fn invalid_json_is_config_error() {
        assert!(matches!(
            ControllerConfig::from_json_str("{not json"),
            Err(ConfigError::Json(_))
        ));
    }
}

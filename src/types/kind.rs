// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Device kinds.

use std::fmt;
use std::str::FromStr;

use crate::error::ValueError;

/// The kind of output a device drives.
///
/// Direct-pin and driver-backed variants behave the same; they differ only
/// in where the duty cycle is written.
///
/// # Examples
///
/// ```
/// use ledctl_lib::types::DeviceKind;
///
/// let kind: DeviceKind = "pca9685".parse().unwrap();
/// assert_eq!(kind, DeviceKind::DriverPwm);
/// assert!(kind.is_driver_backed());
/// assert!(!kind.is_color());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeviceKind {
    /// Binary output on a digital pin.
    OnOff,
    /// Dimmable output on a PWM pin.
    Pwm,
    /// Three PWM pins driving an RGB LED.
    Rgb,
    /// Dimmable output on one channel of the multi-channel driver.
    DriverPwm,
    /// Three channels of the multi-channel driver driving an RGB LED.
    DriverRgb,
}

impl DeviceKind {
    /// Returns the canonical configuration name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::OnOff => "onoff",
            Self::Pwm => "pwm",
            Self::Rgb => "rgb",
            Self::DriverPwm => "pca9685",
            Self::DriverRgb => "pcargb",
        }
    }

    /// Returns `true` for the three-channel color kinds.
    #[must_use]
    pub const fn is_color(&self) -> bool {
        matches!(self, Self::Rgb | Self::DriverRgb)
    }

    /// Returns `true` for kinds written through the multi-channel driver.
    #[must_use]
    pub const fn is_driver_backed(&self) -> bool {
        matches!(self, Self::DriverPwm | Self::DriverRgb)
    }

    /// Returns `true` for kinds that support fades.
    #[must_use]
    pub const fn is_dimmable(&self) -> bool {
        !matches!(self, Self::OnOff)
    }
}

impl fmt::Display for DeviceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl serde::Serialize for DeviceKind {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl FromStr for DeviceKind {
    type Err = ValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "onoff" => Ok(Self::OnOff),
            "pwm" => Ok(Self::Pwm),
            "rgb" => Ok(Self::Rgb),
            "pca9685" | "pca" | "driverpwm" => Ok(Self::DriverPwm),
            "pcargb" | "pca9685rgb" | "driverrgb" => Ok(Self::DriverRgb),
            _ => Err(ValueError::InvalidKind(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_is_case_insensitive() {
        assert_eq!("PWM".parse::<DeviceKind>().unwrap(), DeviceKind::Pwm);
        assert_eq!("OnOff".parse::<DeviceKind>().unwrap(), DeviceKind::OnOff);
        assert_eq!("PCARGB".parse::<DeviceKind>().unwrap(), DeviceKind::DriverRgb);
    }

    #[test]
    fn parse_unknown_kind() {
        assert_eq!(
            "neon".parse::<DeviceKind>(),
            Err(ValueError::InvalidKind("neon".to_string()))
        );
    }

    #[test]
    fn canonical_name_roundtrip() {
        for kind in [
            DeviceKind::OnOff,
            DeviceKind::Pwm,
            DeviceKind::Rgb,
            DeviceKind::DriverPwm,
            DeviceKind::DriverRgb,
        ] {
            assert_eq!(kind.as_str().parse::<DeviceKind>().unwrap(), kind);
        }
    }
}

// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Logical output level.
//!
//! Levels are percentages in the range 0-100. They are held as `f64` so a
//! fade can move through fractional values between the integer levels that
//! clients request and that status documents report.

use std::fmt;

use crate::error::ValueError;

/// The highest logical level.
pub const MAX_LEVEL: f64 = 100.0;

/// Output level as a percentage (0-100).
///
/// # Examples
///
/// ```
/// use ledctl_lib::types::Level;
///
/// let level = Level::new(42.5).unwrap();
/// assert_eq!(level.rounded(), 43);
///
/// // Out-of-range values are clamped, not rejected
/// assert_eq!(Level::clamped(150.0), Level::MAX);
/// assert_eq!(Level::clamped(-3.0), Level::MIN);
///
/// assert!(Level::new(101.0).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default)]
pub struct Level(f64);

impl Level {
    /// Fully off.
    pub const MIN: Self = Self(0.0);

    /// Fully on.
    pub const MAX: Self = Self(MAX_LEVEL);

    /// Creates a level, rejecting values outside 0-100.
    ///
    /// # Errors
    ///
    /// Returns `ValueError::OutOfRange` if the value is outside 0-100 or not finite.
    pub fn new(value: f64) -> Result<Self, ValueError> {
        if !value.is_finite() || !(0.0..=MAX_LEVEL).contains(&value) {
            return Err(ValueError::OutOfRange {
                min: 0.0,
                max: MAX_LEVEL,
                actual: value,
            });
        }
        Ok(Self(value))
    }

    /// Creates a level, clamping to 0-100. `NaN` becomes 0.
    #[must_use]
    pub fn clamped(value: f64) -> Self {
        if value.is_nan() {
            Self::MIN
        } else {
            Self(value.clamp(0.0, MAX_LEVEL))
        }
    }

    /// Creates a level from an 8-bit color component (0-255).
    #[must_use]
    pub fn from_component(component: u8) -> Self {
        Self(f64::from(component) * MAX_LEVEL / 255.0)
    }

    /// Returns the raw percentage.
    #[must_use]
    pub const fn value(self) -> f64 {
        self.0
    }

    /// Returns the level rounded to the nearest whole percent.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn rounded(self) -> u8 {
        // Safe: the value is always within 0-100
        self.0.round() as u8
    }

    /// Returns the level as an 8-bit color component (0-255).
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn to_component(self) -> u8 {
        (self.0 * 255.0 / MAX_LEVEL).round() as u8
    }

    /// Returns `true` if the output is lit at all.
    #[must_use]
    pub fn is_on(self) -> bool {
        self.0 > 0.0
    }

    /// Scales the level to a duty cycle with the given resolution.
    ///
    /// The result is truncated, matching how the hardware interprets
    /// partial steps.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn to_duty(self, resolution: u32) -> u32 {
        (self.0 * f64::from(resolution) / MAX_LEVEL) as u32
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.rounded())
    }
}

impl From<Level> for f64 {
    fn from(level: Level) -> Self {
        level.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_rejects_out_of_range() {
        assert!(Level::new(-0.1).is_err());
        assert!(Level::new(100.1).is_err());
        assert!(Level::new(f64::NAN).is_err());
        assert!(Level::new(0.0).is_ok());
        assert!(Level::new(100.0).is_ok());
    }

    #[test]
    fn level_clamps_nan_to_zero() {
        assert_eq!(Level::clamped(f64::NAN), Level::MIN);
    }

    #[test]
    fn component_conversion() {
        assert_eq!(Level::from_component(255), Level::MAX);
        assert_eq!(Level::from_component(0), Level::MIN);
        assert_eq!(Level::clamped(50.0).to_component(), 128);
        assert_eq!(Level::from_component(200).to_component(), 200);
    }

    #[test]
    fn duty_scaling_truncates() {
        assert_eq!(Level::MAX.to_duty(1024), 1024);
        assert_eq!(Level::clamped(50.0).to_duty(1024), 512);
        assert_eq!(Level::clamped(33.3).to_duty(1024), 340);
        assert_eq!(Level::MAX.to_duty(65535), 65535);
    }

    #[test]
    fn level_display() {
        assert_eq!(Level::clamped(74.6).to_string(), "75%");
    }
}

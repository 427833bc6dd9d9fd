// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Per-kind command tables.

use crate::error::CommandError;
use crate::types::DeviceKind;

use super::args::{ArgSpec, Arguments};
use super::{Action, Delta};

/// The device operation a command maps to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    /// Restore the last lit level or color.
    On,
    /// Fade to dark.
    Off,
    /// Flip between on and off.
    Toggle,
    /// Set a level without fading.
    Set,
    /// Fade to a level.
    Fade,
    /// Fade to a color.
    FadeColor,
    /// Raise the level.
    Increase,
    /// Lower the level.
    Decrease,
    /// Raise the level to a floor.
    RampUpTo,
    /// Lower the level to a ceiling.
    RampDownTo,
}

impl Operation {
    /// Builds the action from normalized arguments.
    ///
    /// # Errors
    ///
    /// Returns `CommandError::Validation` if a declared argument is missing.
    pub fn bind(self, args: &Arguments) -> Result<Action, CommandError> {
        let action = match self {
            Self::On => Action::On {
                duration: args.duration()?,
            },
            Self::Off => Action::Off {
                duration: args.duration()?,
            },
            Self::Toggle => Action::Toggle {
                duration: args.duration()?,
            },
            Self::Set => Action::Set {
                level: args.level("level")?,
            },
            Self::Fade => Action::Fade {
                level: args.level("level")?,
                duration: args.duration()?,
            },
            Self::FadeColor => Action::FadeColor {
                color: args.color()?,
                duration: args.duration()?,
            },
            Self::Increase => Action::Increase {
                delta: Self::delta(args)?,
                duration: args.duration()?,
            },
            Self::Decrease => Action::Decrease {
                delta: Self::delta(args)?,
                duration: args.duration()?,
            },
            Self::RampUpTo => Action::RampUpTo {
                level: args.level("level")?,
                duration: args.duration()?,
            },
            Self::RampDownTo => Action::RampDownTo {
                level: args.level("level")?,
                duration: args.duration()?,
            },
        };
        Ok(action)
    }

    fn delta(args: &Arguments) -> Result<Delta, CommandError> {
        let level = args.delta("level")?;
        let channel = |name: &str| args.get(name).map_or(Ok(0.0), |_| args.delta(name));
        Ok(Delta {
            level,
            red: channel("red")?,
            green: channel("green")?,
            blue: channel("blue")?,
        })
    }
}

/// One entry of a command table.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CommandSpec {
    /// Canonical command name.
    pub name: &'static str,
    /// Alternative names.
    pub aliases: &'static [&'static str],
    /// Operation performed.
    pub operation: Operation,
    /// Declared arguments, in positional order.
    pub args: &'static [ArgSpec],
}

impl CommandSpec {
    const fn new(
        name: &'static str,
        aliases: &'static [&'static str],
        operation: Operation,
        args: &'static [ArgSpec],
    ) -> Self {
        Self {
            name,
            aliases,
            operation,
            args,
        }
    }

    /// Returns `true` if `name` is this command's name or one of its aliases.
    ///
    /// Matching ignores ASCII case.
    #[must_use]
    pub fn matches(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name) || self.aliases.iter().any(|a| a.eq_ignore_ascii_case(name))
    }
}

const DURATION: &[ArgSpec] = &[ArgSpec::duration(1.0)];
const SET: &[ArgSpec] = &[ArgSpec::level("level", 100.0)];
const FADE: &[ArgSpec] = &[ArgSpec::level("level", 100.0), ArgSpec::duration(1.0)];
const FADE_COLOR: &[ArgSpec] = &[ArgSpec::color("white"), ArgSpec::duration(1.0)];
const COLOR: &[ArgSpec] = &[ArgSpec::color("black"), ArgSpec::duration(0.0)];
const STEP: &[ArgSpec] = &[ArgSpec::delta("level", 10.0), ArgSpec::duration(0.5)];
const COLOR_STEP: &[ArgSpec] = &[
    ArgSpec::delta("level", 10.0),
    ArgSpec::duration(0.5),
    ArgSpec::delta("red", 0.0),
    ArgSpec::delta("green", 0.0),
    ArgSpec::delta("blue", 0.0),
];
const UP_TO: &[ArgSpec] = &[ArgSpec::level("level", 100.0), ArgSpec::duration(1.0)];
const DOWN_TO: &[ArgSpec] = &[ArgSpec::level("level", 0.0), ArgSpec::duration(1.0)];

const ON: CommandSpec = CommandSpec::new("on", &[], Operation::On, DURATION);
const OFF: CommandSpec = CommandSpec::new("off", &[], Operation::Off, DURATION);
const TOGGLE: CommandSpec = CommandSpec::new("toggle", &[], Operation::Toggle, DURATION);
const UPTO: CommandSpec = CommandSpec::new("upto", &["rampUntilAtLeast"], Operation::RampUpTo, UP_TO);
const DOWNTO: CommandSpec =
    CommandSpec::new("downto", &["rampUntilAtMost"], Operation::RampDownTo, DOWN_TO);

/// Commands of on/off devices.
pub static SWITCH_COMMANDS: &[CommandSpec] = &[
    ON,
    OFF,
    TOGGLE,
    CommandSpec::new("set", &[], Operation::Set, SET),
    CommandSpec::new("fade", &[], Operation::Fade, FADE),
];

/// Commands of dimmable devices.
pub static DIMMER_COMMANDS: &[CommandSpec] = &[
    ON,
    OFF,
    TOGGLE,
    CommandSpec::new("set", &[], Operation::Set, SET),
    CommandSpec::new("fade", &[], Operation::Fade, FADE),
    CommandSpec::new("increase", &["inc"], Operation::Increase, STEP),
    CommandSpec::new("decrease", &["dec"], Operation::Decrease, STEP),
    UPTO,
    DOWNTO,
];

/// Commands of color devices.
pub static COLOR_COMMANDS: &[CommandSpec] = &[
    ON,
    OFF,
    TOGGLE,
    CommandSpec::new("fade", &[], Operation::FadeColor, FADE_COLOR),
    CommandSpec::new("color", &[], Operation::FadeColor, COLOR),
    CommandSpec::new("increase", &["inc"], Operation::Increase, COLOR_STEP),
    CommandSpec::new("decrease", &["dec"], Operation::Decrease, COLOR_STEP),
    UPTO,
    DOWNTO,
];

/// Returns the command table of a device kind.
#[must_use]
pub fn commands_for(kind: DeviceKind) -> &'static [CommandSpec] {
    match kind {
        DeviceKind::OnOff => SWITCH_COMMANDS,
        DeviceKind::Pwm | DeviceKind::DriverPwm => DIMMER_COMMANDS,
        DeviceKind::Rgb | DeviceKind::DriverRgb => COLOR_COMMANDS,
    }
}

/// Looks up a command by name or alias.
#[must_use]
pub fn find(kind: DeviceKind, name: &str) -> Option<&'static CommandSpec> {
    commands_for(kind).iter().find(|spec| spec.matches(name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aliases_resolve() {
        let spec = find(DeviceKind::Pwm, "rampUntilAtLeast").unwrap();
        assert_eq!(spec.operation, Operation::RampUpTo);
        assert_eq!(find(DeviceKind::Pwm, "INC").unwrap().operation, Operation::Increase);
    }

    #[test]
    fn switch_has_no_relative_commands() {
        assert!(find(DeviceKind::OnOff, "increase").is_none());
        assert!(find(DeviceKind::OnOff, "set").is_some());
    }

    #[test]
    fn color_fade_takes_a_color() {
        let spec = find(DeviceKind::DriverRgb, "fade").unwrap();
        assert_eq!(spec.operation, Operation::FadeColor);
        assert_eq!(spec.args[0].name, "color");
        assert!(find(DeviceKind::Rgb, "set").is_none());
    }

    #[test]
    fn step_duration_is_second_for_every_kind() {
        for kind in [DeviceKind::Pwm, DeviceKind::Rgb, DeviceKind::DriverRgb] {
            let spec = find(kind, "dec").unwrap();
            assert_eq!(spec.args[0].name, "level", "{kind}");
            assert_eq!(spec.args[1].name, "duration", "{kind}");
        }
    }

    #[test]
    fn every_table_has_on_off_toggle() {
        for kind in [
            DeviceKind::OnOff,
            DeviceKind::Pwm,
            DeviceKind::Rgb,
            DeviceKind::DriverPwm,
            DeviceKind::DriverRgb,
        ] {
            for name in ["on", "off", "toggle"] {
                assert!(find(kind, name).is_some(), "{kind} lacks {name}");
            }
        }
    }
}

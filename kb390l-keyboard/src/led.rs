//! Backlight settings
//!
//! All four values live in the CONTROL flag response and are written through
//! with [`Keyboard::set_flag`].

use std::fmt;
use std::str::FromStr;

use kb390l_transport::protocol::{limits, offset};
use kb390l_transport::{cmd, Transport};

use crate::{Keyboard, KeyboardError};

/// Backlight animation as stored by the firmware.
///
/// Named effects occupy 1-16 and 51-55; any other value up to 240 is passed
/// through untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LightType(u8);

impl LightType {
    pub const OFF: Self = Self(0);
    pub const STATIC: Self = Self(1);
    pub const BREATH: Self = Self(2);
    pub const WAVE: Self = Self(3);
    pub const REACTIVE: Self = Self(4);
    pub const SIDEWINDER: Self = Self(5);
    pub const RIPPLE: Self = Self(6);
    pub const ALT_REACTIVE: Self = Self(7);
    pub const ALT_WAVE: Self = Self(8);
    pub const ALT_SIDEWINDER: Self = Self(9);
    pub const RAINDROP: Self = Self(10);
    pub const WORTEX: Self = Self(11);
    pub const SPOTLIGHT: Self = Self(12);
    pub const RADAR: Self = Self(13);
    pub const RUNNING_WATER: Self = Self(14);
    pub const RUNNING_MOLD: Self = Self(15);
    pub const SHADE_MOLD: Self = Self(16);
    pub const MASK1: Self = Self(51);
    pub const MASK2: Self = Self(52);
    pub const MASK3: Self = Self(53);
    pub const MASK4: Self = Self(54);
    pub const MASK5: Self = Self(55);

    /// Gap between the last animated effect and the first mask effect.
    ///
    /// Firmware-specific: the mask types are numbered from 51 rather than
    /// following on from 16.
    pub const MASK_OFFSET: u8 = 34;

    const NAMES: &'static [(u8, &'static str)] = &[
        (0, "Off"),
        (1, "Static"),
        (2, "Breath"),
        (3, "Wave"),
        (4, "Reactive"),
        (5, "Sidewinder"),
        (6, "Ripple"),
        (7, "AltReactive"),
        (8, "AltWave"),
        (9, "AltSidewinder"),
        (10, "Raindrop"),
        (11, "Wortex"),
        (12, "Spotlight"),
        (13, "Radar"),
        (14, "RunningWater"),
        (15, "RunningMold"),
        (16, "Shade"),
        (51, "Mask1"),
        (52, "Mask2"),
        (53, "Mask3"),
        (54, "Mask4"),
        (55, "Mask5"),
    ];

    pub fn new(raw: u8) -> Result<Self, KeyboardError> {
        if raw > limits::MAX_LIGHT_TYPE {
            return Err(KeyboardError::InvalidParameter(format!(
                "Light type must be 0-{}, got {raw}",
                limits::MAX_LIGHT_TYPE
            )));
        }
        Ok(Self(raw))
    }

    pub fn raw(self) -> u8 {
        self.0
    }

    pub fn name(self) -> Option<&'static str> {
        Self::NAMES
            .iter()
            .find(|(raw, _)| *raw == self.0)
            .map(|(_, name)| *name)
    }

    /// Position in the contiguous effect list (Static = 1 .. Mask5 = 21)
    pub fn list_index(self) -> u8 {
        if self.0 >= Self::MASK1.0 {
            self.0 - Self::MASK_OFFSET
        } else {
            self.0
        }
    }

    /// Inverse of [`LightType::list_index`]
    pub fn from_list_index(index: u8) -> Result<Self, KeyboardError> {
        let raw = if index > Self::SHADE_MOLD.0 {
            index.checked_add(Self::MASK_OFFSET).ok_or_else(|| {
                KeyboardError::InvalidParameter(format!("Light list index {index} too large"))
            })?
        } else {
            index
        };
        Self::new(raw)
    }

    /// Whether the effect animates, so the delay setting applies
    pub fn has_delay(self) -> bool {
        self != Self::STATIC && self.0 < Self::MASK1.0
    }

    /// Whether the effect moves across the board, so the direction applies
    pub fn has_direction(self) -> bool {
        matches!(
            self,
            Self::WAVE | Self::RADAR | Self::RUNNING_MOLD | Self::SHADE_MOLD
        )
    }
}

impl fmt::Display for LightType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => f.write_str(name),
            None => write!(f, "{}", self.0),
        }
    }
}

impl FromStr for LightType {
    type Err = KeyboardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Ok(raw) = s.parse::<u8>() {
            return Self::new(raw);
        }
        Self::NAMES
            .iter()
            .find(|(_, name)| name.eq_ignore_ascii_case(s))
            .map(|(raw, _)| Self(*raw))
            .ok_or_else(|| KeyboardError::InvalidParameter(format!("Unknown light type: {s}")))
    }
}

/// Direction of moving backlight effects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum LightDirection {
    #[default]
    None = 0,
    Right = 1,
    Left = 2,
    Up = 3,
    Down = 4,
}

impl TryFrom<u8> for LightDirection {
    type Error = KeyboardError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::None),
            1 => Ok(Self::Right),
            2 => Ok(Self::Left),
            3 => Ok(Self::Up),
            4 => Ok(Self::Down),
            _ => Err(KeyboardError::InvalidParameter(format!(
                "Light direction must be 0-{}, got {value}",
                limits::MAX_LIGHT_DIRECTION
            ))),
        }
    }
}

impl fmt::Display for LightDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::None => "none",
            Self::Right => "right",
            Self::Left => "left",
            Self::Up => "up",
            Self::Down => "down",
        };
        f.write_str(name)
    }
}

impl FromStr for LightDirection {
    type Err = KeyboardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "none" => Ok(Self::None),
            "right" => Ok(Self::Right),
            "left" => Ok(Self::Left),
            "up" => Ok(Self::Up),
            "down" => Ok(Self::Down),
            other => other
                .parse::<u8>()
                .map_err(|_| KeyboardError::InvalidParameter(format!("Unknown direction: {s}")))
                .and_then(Self::try_from),
        }
    }
}

/// All backlight settings at once
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LightSettings {
    pub kind: LightType,
    pub delay: u8,
    pub brightness: u8,
    pub direction: LightDirection,
}

impl fmt::Display for LightSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} delay={} brightness={} direction={}",
            self.kind, self.delay, self.brightness, self.direction
        )
    }
}

fn check_range(what: &str, value: u8, max: u8) -> Result<(), KeyboardError> {
    if value > max {
        return Err(KeyboardError::InvalidParameter(format!(
            "{what} must be 0-{max}, got {value}"
        )));
    }
    Ok(())
}

impl<T: Transport> Keyboard<T> {
    pub fn light_type(&mut self) -> Result<LightType, KeyboardError> {
        let raw = self.flag(cmd::CONTROL, offset::LIGHT_TYPE)?;
        Ok(LightType(raw))
    }

    pub fn set_light_type(&mut self, kind: LightType) -> Result<(), KeyboardError> {
        LightType::new(kind.raw())?;
        self.set_flag(cmd::CONTROL, kind.raw(), offset::LIGHT_TYPE)
    }

    pub fn light_delay(&mut self) -> Result<u8, KeyboardError> {
        self.flag(cmd::CONTROL, offset::LIGHT_DELAY)
    }

    /// Animation delay (0-10)
    pub fn set_light_delay(&mut self, delay: u8) -> Result<(), KeyboardError> {
        check_range("Light delay", delay, limits::MAX_LIGHT_DELAY)?;
        self.set_flag(cmd::CONTROL, delay, offset::LIGHT_DELAY)
    }

    pub fn light_brightness(&mut self) -> Result<u8, KeyboardError> {
        self.flag(cmd::CONTROL, offset::LIGHT_BRIGHTNESS)
    }

    /// Backlight brightness (0-50)
    pub fn set_light_brightness(&mut self, brightness: u8) -> Result<(), KeyboardError> {
        check_range("Light brightness", brightness, limits::MAX_LIGHT_BRIGHTNESS)?;
        self.set_flag(cmd::CONTROL, brightness, offset::LIGHT_BRIGHTNESS)
    }

    pub fn light_direction(&mut self) -> Result<LightDirection, KeyboardError> {
        let raw = self.flag(cmd::CONTROL, offset::LIGHT_DIRECTION)?;
        LightDirection::try_from(raw).map_err(|_| {
            KeyboardError::UnexpectedResponse(format!("light direction {raw} out of range"))
        })
    }

    pub fn set_light_direction(&mut self, direction: LightDirection) -> Result<(), KeyboardError> {
        self.set_flag(cmd::CONTROL, direction as u8, offset::LIGHT_DIRECTION)
    }

    pub fn light_settings(&mut self) -> Result<LightSettings, KeyboardError> {
        Ok(LightSettings {
            kind: self.light_type()?,
            delay: self.light_delay()?,
            brightness: self.light_brightness()?,
            direction: self.light_direction()?,
        })
    }

    /// Apply every backlight setting, validating all of them before any I/O
    pub fn set_light_settings(&mut self, settings: &LightSettings) -> Result<(), KeyboardError> {
        LightType::new(settings.kind.raw())?;
        check_range("Light delay", settings.delay, limits::MAX_LIGHT_DELAY)?;
        check_range(
            "Light brightness",
            settings.brightness,
            limits::MAX_LIGHT_BRIGHTNESS,
        )?;

        self.set_light_type(settings.kind)?;
        self.set_light_direction(settings.direction)?;
        self.set_light_delay(settings.delay)?;
        self.set_light_brightness(settings.brightness)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_types_map_to_contiguous_list() {
        assert_eq!(LightType::STATIC.list_index(), 1);
        assert_eq!(LightType::SHADE_MOLD.list_index(), 16);
        assert_eq!(LightType::MASK1.list_index(), 17);
        assert_eq!(LightType::MASK5.list_index(), 21);

        for index in 1..=21 {
            let kind = LightType::from_list_index(index).unwrap();
            assert_eq!(kind.list_index(), index);
        }
        assert_eq!(LightType::from_list_index(17).unwrap(), LightType::MASK1);
    }

    #[test]
    fn test_light_type_names() {
        assert_eq!("wave".parse::<LightType>().unwrap(), LightType::WAVE);
        assert_eq!("Mask3".parse::<LightType>().unwrap().raw(), 53);
        assert_eq!("200".parse::<LightType>().unwrap().to_string(), "200");
        assert!("241".parse::<LightType>().is_err());
        assert!("disco".parse::<LightType>().is_err());
    }

    #[test]
    fn test_effect_capabilities() {
        assert!(!LightType::STATIC.has_delay());
        assert!(LightType::BREATH.has_delay());
        assert!(!LightType::MASK2.has_delay());
        assert!(LightType::RADAR.has_direction());
        assert!(!LightType::RIPPLE.has_direction());
    }

    #[test]
    fn test_direction_parse() {
        assert_eq!("Up".parse::<LightDirection>().unwrap(), LightDirection::Up);
        assert_eq!("4".parse::<LightDirection>().unwrap(), LightDirection::Down);
        assert!("5".parse::<LightDirection>().is_err());
        assert!(LightDirection::try_from(7).is_err());
    }
}

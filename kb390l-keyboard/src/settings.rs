//! Speed settings: report rate, response time and game mode

use std::fmt;

use kb390l_transport::protocol::{limits, offset};
use kb390l_transport::{cmd, Transport};

use crate::{Keyboard, KeyboardError};

/// USB report rate, encoded as `125 << value` Hz
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportRate(u8);

impl ReportRate {
    pub fn new(value: u8) -> Result<Self, KeyboardError> {
        if value > limits::MAX_REPORT_RATE {
            return Err(KeyboardError::InvalidParameter(format!(
                "Report rate must be 0-{}, got {value}",
                limits::MAX_REPORT_RATE
            )));
        }
        Ok(Self(value))
    }

    /// Rate for a frequency of 125, 250, 500 or 1000 Hz
    pub fn from_hz(hz: u16) -> Result<Self, KeyboardError> {
        (0..=limits::MAX_REPORT_RATE)
            .map(Self)
            .find(|rate| rate.hz() == hz)
            .ok_or_else(|| {
                KeyboardError::InvalidParameter(format!(
                    "Report rate must be 125, 250, 500 or 1000 Hz, got {hz}"
                ))
            })
    }

    pub fn value(self) -> u8 {
        self.0
    }

    pub fn hz(self) -> u16 {
        125 << self.0
    }
}

impl fmt::Display for ReportRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} Hz", self.hz())
    }
}

/// Key response time, encoded as `value * 2` ms
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResponseTime(u8);

impl ResponseTime {
    pub fn new(value: u8) -> Result<Self, KeyboardError> {
        if !(limits::MIN_RESPONSE_TIME..=limits::MAX_RESPONSE_TIME).contains(&value) {
            return Err(KeyboardError::InvalidParameter(format!(
                "Response time must be {}-{}, got {value}",
                limits::MIN_RESPONSE_TIME,
                limits::MAX_RESPONSE_TIME
            )));
        }
        Ok(Self(value))
    }

    /// Nearest setting at or below `ms` milliseconds
    pub fn from_millis(ms: u16) -> Result<Self, KeyboardError> {
        let value = u8::try_from(ms / 2).unwrap_or(u8::MAX);
        Self::new(value)
    }

    pub fn value(self) -> u8 {
        self.0
    }

    pub fn millis(self) -> u16 {
        u16::from(self.0) * 2
    }
}

impl fmt::Display for ResponseTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ms", self.millis())
    }
}

impl<T: Transport> Keyboard<T> {
    pub fn report_rate(&mut self) -> Result<ReportRate, KeyboardError> {
        let value = self.flag(cmd::REPORT_RATE, offset::FLAG)?;
        ReportRate::new(value).map_err(|_| {
            KeyboardError::UnexpectedResponse(format!("report rate {value} out of range"))
        })
    }

    /// Set the report rate (0-3); takes effect immediately
    pub fn set_report_rate(&mut self, value: u8) -> Result<(), KeyboardError> {
        let rate = ReportRate::new(value)?;
        self.push_flag(cmd::REPORT_RATE, rate.value())
    }

    pub fn response_time(&mut self) -> Result<ResponseTime, KeyboardError> {
        let value = self.flag(cmd::RESPONSE_TIME, offset::FLAG)?;
        ResponseTime::new(value).map_err(|_| {
            KeyboardError::UnexpectedResponse(format!("response time {value} out of range"))
        })
    }

    /// Set the response time (1-10); takes effect immediately
    pub fn set_response_time(&mut self, value: u8) -> Result<(), KeyboardError> {
        let time = ResponseTime::new(value)?;
        self.push_flag(cmd::RESPONSE_TIME, time.value())
    }

    pub fn game_mode(&mut self) -> Result<bool, KeyboardError> {
        Ok(self.flag(cmd::GAME_MODE, offset::FLAG)? != 0)
    }

    pub fn set_game_mode(&mut self, enabled: bool) -> Result<(), KeyboardError> {
        self.push_flag(cmd::GAME_MODE, u8::from(enabled))
    }
}

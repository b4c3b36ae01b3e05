use std::{fmt, ops::RangeInclusive, str::FromStr};

use chrono::{NaiveTime, Timelike};

pub const BATTERY_PERCENT_RANGE: RangeInclusive<i64> = 1..=100;
pub const HOUR_RANGE: RangeInclusive<i64> = 0..=23;
pub const MINUTE_RANGE: RangeInclusive<i64> = 0..=59;

/// Message shown to the user whenever configuration capture fails.
pub const INVALID_CONFIGURATION_MESSAGE: &str = "Please enter valid time and battery percentage.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReminderField {
    BatteryPercent,
    Hour,
    Minute,
}

impl fmt::Display for ReminderField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ReminderField::BatteryPercent => "battery percent",
            ReminderField::Hour => "hour",
            ReminderField::Minute => "minute",
        };
        f.write_str(name)
    }
}

/// The only error surfaced to the user. `Display` is the generic message;
/// the variant keeps the reason for logs.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvalidConfiguration {
    #[error("{}", INVALID_CONFIGURATION_MESSAGE)]
    Unparseable { field: ReminderField, input: String },
    #[error("{}", INVALID_CONFIGURATION_MESSAGE)]
    OutOfRange { field: ReminderField, value: i64 },
}

impl InvalidConfiguration {
    pub fn field(&self) -> ReminderField {
        match self {
            InvalidConfiguration::Unparseable { field, .. }
            | InvalidConfiguration::OutOfRange { field, .. } => *field,
        }
    }

    pub fn reason(&self) -> String {
        match self {
            InvalidConfiguration::Unparseable { field, input } => {
                format!("{field} is not a number: {input:?}")
            }
            InvalidConfiguration::OutOfRange { field, value } => {
                format!("{field} is out of range: {value}")
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReminderFiringPeriod {
    OneOff,
    Daily,
}

impl ReminderFiringPeriod {
    pub fn from_daily_repeat(daily_repeat: bool) -> Self {
        if daily_repeat {
            ReminderFiringPeriod::Daily
        } else {
            ReminderFiringPeriod::OneOff
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatteryThreshold(u8);

impl BatteryThreshold {
    pub fn new(percent: i64) -> Result<Self, InvalidConfiguration> {
        let percent = check_range(ReminderField::BatteryPercent, percent, &BATTERY_PERCENT_RANGE)?;
        Ok(Self(percent as u8))
    }

    pub fn percent(&self) -> u8 {
        self.0
    }

    pub fn is_reached_by(&self, battery_percent: u8) -> bool {
        battery_percent <= self.0
    }
}

/// Target time of day. Only hour and minute matter, seconds are always zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReminderFireTime(NaiveTime);

impl ReminderFireTime {
    pub fn from_hm(hour: i64, minute: i64) -> Result<Self, InvalidConfiguration> {
        let hour = check_range(ReminderField::Hour, hour, &HOUR_RANGE)?;
        let minute = check_range(ReminderField::Minute, minute, &MINUTE_RANGE)?;

        let time = NaiveTime::from_hms_opt(hour as u32, minute as u32, 0)
            .expect("Hour and minute are range checked.");
        Ok(Self(time))
    }

    pub fn time(&self) -> &NaiveTime {
        &self.0
    }

    pub fn hour(&self) -> u32 {
        self.0.hour()
    }

    pub fn minute(&self) -> u32 {
        self.0.minute()
    }

    /// True only inside the single target minute.
    pub fn matches(&self, now: &NaiveTime) -> bool {
        now.hour() == self.0.hour() && now.minute() == self.0.minute()
    }
}

impl fmt::Display for ReminderFireTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour(), self.minute())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReminderConfig {
    pub threshold: BatteryThreshold,
    pub fire_at: ReminderFireTime,
    pub period: ReminderFiringPeriod,
}

/// Raw values as typed by the user.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Deserialize)]
pub struct ReminderInput {
    pub battery_percent: String,
    pub hour: String,
    pub minute: String,
    #[serde(default)]
    pub daily_repeat: bool,
}

impl ReminderInput {
    pub fn new(
        battery_percent: impl Into<String>,
        hour: impl Into<String>,
        minute: impl Into<String>,
        daily_repeat: bool,
    ) -> Self {
        Self {
            battery_percent: battery_percent.into(),
            hour: hour.into(),
            minute: minute.into(),
            daily_repeat,
        }
    }
}

impl TryFrom<&ReminderInput> for ReminderConfig {
    type Error = InvalidConfiguration;

    fn try_from(input: &ReminderInput) -> Result<Self, Self::Error> {
        let percent: i64 = parse_field(ReminderField::BatteryPercent, &input.battery_percent)?;
        let hour: i64 = parse_field(ReminderField::Hour, &input.hour)?;
        let minute: i64 = parse_field(ReminderField::Minute, &input.minute)?;

        Ok(ReminderConfig {
            threshold: BatteryThreshold::new(percent)?,
            fire_at: ReminderFireTime::from_hm(hour, minute)?,
            period: ReminderFiringPeriod::from_daily_repeat(input.daily_repeat),
        })
    }
}

pub fn parse_config(input: &ReminderInput) -> Result<ReminderConfig, InvalidConfiguration> {
    ReminderConfig::try_from(input)
}

pub fn parse_field<T: FromStr>(field: ReminderField, input: &str) -> Result<T, InvalidConfiguration> {
    input
        .trim()
        .parse::<T>()
        .map_err(|_| InvalidConfiguration::Unparseable {
            field,
            input: input.to_string(),
        })
}

pub fn check_range(
    field: ReminderField,
    value: i64,
    range: &RangeInclusive<i64>,
) -> Result<i64, InvalidConfiguration> {
    if range.contains(&value) {
        Ok(value)
    } else {
        Err(InvalidConfiguration::OutOfRange { field, value })
    }
}

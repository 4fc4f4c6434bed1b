//! Time and energy units used by device consumption figures.
//!
//! # Invariants
//! - Every unit carries a fixed conversion factor to its base unit
//!   (seconds, watt-seconds).
//! - Wire names are `SCREAMING_SNAKE_CASE` and never change.

use serde::{Deserialize, Serialize};

/// Time unit with a factor in seconds.
///
/// A month is 30.42 days and a year is 365 days.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TimeUnit {
    Second,
    Minute,
    Hour,
    Day,
    Week,
    Month,
    Year,
}

impl TimeUnit {
    pub const ALL: [TimeUnit; 7] = [
        Self::Second,
        Self::Minute,
        Self::Hour,
        Self::Day,
        Self::Week,
        Self::Month,
        Self::Year,
    ];

    /// Number of seconds in one unit.
    pub fn factor(self) -> u64 {
        match self {
            Self::Second => 1,
            Self::Minute => 60,
            Self::Hour => 3_600,
            Self::Day => 86_400,
            Self::Week => 604_800,
            Self::Month => 2_628_288,
            Self::Year => 31_536_000,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Second => "SECOND",
            Self::Minute => "MINUTE",
            Self::Hour => "HOUR",
            Self::Day => "DAY",
            Self::Week => "WEEK",
            Self::Month => "MONTH",
            Self::Year => "YEAR",
        }
    }

    /// German plural label shown by the desktop UI.
    pub fn label(self) -> &'static str {
        match self {
            Self::Second => "Sekunden",
            Self::Minute => "Minuten",
            Self::Hour => "Stunden",
            Self::Day => "Tage",
            Self::Week => "Wochen",
            Self::Month => "Monate",
            Self::Year => "Jahre",
        }
    }

    fn singular_label(self) -> &'static str {
        match self {
            Self::Second => "Sekunde",
            Self::Minute => "Minute",
            Self::Hour => "Stunde",
            Self::Day => "Tag",
            Self::Week => "Woche",
            Self::Month => "Monat",
            Self::Year => "Jahr",
        }
    }

    /// Parses a wire name or a singular/plural label.
    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|unit| {
            unit.as_str() == value || unit.label() == value || unit.singular_label() == value
        })
    }
}

/// Energy unit with a factor in watt-seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EnergyUnit {
    WattSecond,
    WattHour,
    KilowattHour,
}

impl EnergyUnit {
    pub const ALL: [EnergyUnit; 3] = [Self::WattSecond, Self::WattHour, Self::KilowattHour];

    /// Number of watt-seconds in one unit.
    pub fn factor(self) -> u64 {
        match self {
            Self::WattSecond => 1,
            Self::WattHour => 3_600,
            Self::KilowattHour => 3_600_000,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::WattSecond => "WATT_SECOND",
            Self::WattHour => "WATT_HOUR",
            Self::KilowattHour => "KILOWATT_HOUR",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::WattSecond => "Wattsekunden",
            Self::WattHour => "Wattstunden",
            Self::KilowattHour => "Kilowattstunden",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|unit| unit.as_str() == value || unit.label() == value)
    }
}

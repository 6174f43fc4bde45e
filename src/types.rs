//! This module defines the six telemetry metrics together with their wire
//! keys and validation ranges. [`Metric::ALL`] is the lookup table the
//! decoder walks, so the ranges below are the only place they are written down.

use core::fmt;
use core::ops::Range;

use snafu::{ensure, Snafu};

/// Milliseconds since process start.
pub type Millis = u64;

/// An integer metric value, as carried in the message payload.
pub type Value = i32;

/// Error type for this module
#[derive(Debug, Snafu, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum Error {
    /// The value is outside the sanity range of the metric.
    #[snafu(display("{} value {} is outside {}..{}", metric, value, min, end))]
    OutOfRange {
        metric: Metric,
        value: Value,
        min: Value,
        end: Value,
    },
}

/// One of the telemetry fields reported by the sensor controller.
#[derive(PartialEq, Eq, PartialOrd, Ord, Debug, Copy, Clone, Hash)]
pub enum Metric {
    /// CO2 concentration, ppm.
    Co2,
    /// PM2.5 particulates, µg/m³.
    Pm25,
    /// Ozone, ppb.
    O3,
    /// Temperature, °C.
    Temperature,
    /// Relative humidity, %.
    Humidity,
    /// Total volatile organic compounds, raw sensor units.
    Tvoc,
}

impl Metric {
    /// All metrics, in the order the decoder tests their prefixes.
    pub const ALL: [Metric; 6] = [
        Metric::Co2,
        Metric::Pm25,
        Metric::O3,
        Metric::Temperature,
        Metric::Humidity,
        Metric::Tvoc,
    ];

    /// The short key, used both on the wire and as the JSON field name.
    pub const fn key(self) -> &'static str {
        match self {
            Metric::Co2 => "co2",
            Metric::Pm25 => "pm25",
            Metric::O3 => "o3",
            Metric::Temperature => "temp",
            Metric::Humidity => "hum",
            Metric::Tvoc => "tvoc",
        }
    }

    /// The literal a message must start with to carry this metric.
    pub const fn prefix(self) -> &'static str {
        match self {
            Metric::Co2 => "co2V.val=",
            Metric::Pm25 => "pm25V.val=",
            Metric::O3 => "o3V.val=",
            Metric::Temperature => "tempV.val=",
            Metric::Humidity => "humV.val=",
            Metric::Tvoc => "tvocV.val=",
        }
    }

    /// Accepted values, lower bound inclusive, upper bound exclusive.
    pub const fn range(self) -> Range<Value> {
        match self {
            Metric::Co2 => 1..10_000,
            Metric::Pm25 | Metric::O3 | Metric::Tvoc => 0..2000,
            Metric::Temperature => -50..100,
            Metric::Humidity => 0..101,
        }
    }

    /// Human readable name for log lines.
    pub const fn label(self) -> &'static str {
        match self {
            Metric::Co2 => "CO2",
            Metric::Pm25 => "PM2.5",
            Metric::O3 => "O3",
            Metric::Temperature => "Temperature",
            Metric::Humidity => "Humidity",
            Metric::Tvoc => "TVOC",
        }
    }

    pub const fn unit(self) -> &'static str {
        match self {
            Metric::Co2 => "ppm",
            Metric::Pm25 => "µg/m³",
            Metric::O3 => "ppb",
            Metric::Temperature => "°C",
            Metric::Humidity => "%",
            Metric::Tvoc => "raw",
        }
    }

    /// Check `value` against the range of this metric.
    /// # Errors
    /// Returns [`Error::OutOfRange`] if the value fails the sanity check.
    pub fn validate(self, value: Value) -> Result<Value, Error> {
        let range = self.range();
        ensure!(
            range.contains(&value),
            OutOfRangeSnafu {
                metric: self,
                value,
                min: range.start,
                end: range.end,
            }
        );
        Ok(value)
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

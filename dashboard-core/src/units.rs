//! Temperature unit conversion.
//!
//! Everything stored by this crate is celsius. Conversion happens when a value
//! is read for display and keeps full precision; rounding is left to
//! [`format_degrees`].

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TemperatureUnit {
    #[default]
    Celsius,
    Fahrenheit,
}

impl TemperatureUnit {
    /// Short label shown next to a temperature.
    pub fn symbol(&self) -> &'static str {
        match self {
            TemperatureUnit::Celsius => "C",
            TemperatureUnit::Fahrenheit => "F",
        }
    }

    pub fn toggled(&self) -> Self {
        match self {
            TemperatureUnit::Celsius => TemperatureUnit::Fahrenheit,
            TemperatureUnit::Fahrenheit => TemperatureUnit::Celsius,
        }
    }
}

impl fmt::Display for TemperatureUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TemperatureUnit::Celsius => f.write_str("celsius"),
            TemperatureUnit::Fahrenheit => f.write_str("fahrenheit"),
        }
    }
}

impl TryFrom<&str> for TemperatureUnit {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.to_lowercase().as_str() {
            "c" | "celsius" => Ok(TemperatureUnit::Celsius),
            "f" | "fahrenheit" => Ok(TemperatureUnit::Fahrenheit),
            _ => Err(anyhow::anyhow!(
                "Unknown temperature unit '{value}'. Supported units: celsius, fahrenheit."
            )),
        }
    }
}

pub fn to_display_unit(celsius: f64, unit: TemperatureUnit) -> f64 {
    match unit {
        TemperatureUnit::Celsius => celsius,
        TemperatureUnit::Fahrenheit => celsius * 9.0 / 5.0 + 32.0,
    }
}

/// Inverse of [`to_display_unit`].
pub fn from_display_unit(value: f64, unit: TemperatureUnit) -> f64 {
    match unit {
        TemperatureUnit::Celsius => value,
        TemperatureUnit::Fahrenheit => (value - 32.0) * 5.0 / 9.0,
    }
}

/// Converts and renders a temperature as a whole number of degrees, e.g. `"59°"`.
pub fn format_degrees(celsius: f64, unit: TemperatureUnit) -> String {
    let rounded = to_display_unit(celsius, unit).round();
    // avoid rendering "-0°"
    let rounded = if rounded == 0.0 { 0.0 } else { rounded };
    format!("{rounded:.0}°")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn celsius_is_identity() {
        assert_eq!(to_display_unit(15.0, TemperatureUnit::Celsius), 15.0);
        assert_eq!(to_display_unit(-3.25, TemperatureUnit::Celsius), -3.25);
    }

    #[test]
    fn fahrenheit_known_points() {
        assert_eq!(to_display_unit(0.0, TemperatureUnit::Fahrenheit), 32.0);
        assert_eq!(to_display_unit(100.0, TemperatureUnit::Fahrenheit), 212.0);
        assert_eq!(to_display_unit(-40.0, TemperatureUnit::Fahrenheit), -40.0);
        assert_eq!(to_display_unit(15.0, TemperatureUnit::Fahrenheit), 59.0);
    }

    #[test]
    fn fahrenheit_roundtrip_within_epsilon() {
        for &c in &[-273.15, -40.0, -0.5, 0.0, 0.1, 15.0, 22.5, 36.6, 1.0e6] {
            let back = from_display_unit(
                to_display_unit(c, TemperatureUnit::Fahrenheit),
                TemperatureUnit::Fahrenheit,
            );
            let tolerance = f64::EPSILON * 16.0 * c.abs().max(1.0);
            assert!((back - c).abs() <= tolerance, "{c} came back as {back}");
        }
    }

    #[test]
    fn conversion_keeps_precision() {
        let f = to_display_unit(22.5, TemperatureUnit::Fahrenheit);
        assert_eq!(f, 72.5);
    }

    #[test]
    fn format_rounds_only_at_the_end() {
        assert_eq!(format_degrees(15.0, TemperatureUnit::Celsius), "15°");
        assert_eq!(format_degrees(15.0, TemperatureUnit::Fahrenheit), "59°");
        // 22.5C -> 72.5F -> 73
        assert_eq!(format_degrees(22.5, TemperatureUnit::Fahrenheit), "73°");
        assert_eq!(format_degrees(-0.3, TemperatureUnit::Celsius), "0°");
    }

    #[test]
    fn parse_unit_names() {
        assert_eq!(TemperatureUnit::try_from("F").unwrap(), TemperatureUnit::Fahrenheit);
        assert_eq!(TemperatureUnit::try_from("Celsius").unwrap(), TemperatureUnit::Celsius);
        assert!(TemperatureUnit::try_from("kelvin").is_err());
    }
}

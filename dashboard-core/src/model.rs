use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Where to fetch weather for: a free-text city name or a coordinate pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Location {
    City(String),
    Coordinates { latitude: f64, longitude: f64 },
}

impl Location {
    pub fn city(name: impl Into<String>) -> Self {
        Location::City(name.into())
    }

    pub fn coordinates(latitude: f64, longitude: f64) -> Self {
        Location::Coordinates { latitude, longitude }
    }
}

impl Default for Location {
    fn default() -> Self {
        Location::City("London".to_string())
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Location::City(name) => f.write_str(name),
            Location::Coordinates { latitude, longitude } => {
                write!(f, "{latitude:.2}°N, {longitude:.2}°E")
            }
        }
    }
}

/// Current conditions. Temperatures are celsius.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherSnapshot {
    pub temperature: f64,
    pub humidity: u8,
    /// Metres per second.
    pub wind_speed: f64,
    pub description: String,
    /// Provider icon token, stored as received (emoji, icon code or URL).
    pub icon: String,
    pub city: String,
    pub country: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastDay {
    pub date: String,
    pub temperature_max: f64,
    pub temperature_min: f64,
    pub description: String,
    pub icon: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherResponse {
    pub current: WeatherSnapshot,
    /// Chronological.
    pub forecast: Vec<ForecastDay>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AirQualitySample {
    pub aqi: i32,
    pub category: String,
    pub pm25: f64,
    pub pm10: f64,
    pub o3: f64,
    pub no2: f64,
    pub so2: f64,
    pub co: f64,
}

/// US EPA severity bands for an AQI value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AqiTier {
    Good,
    Moderate,
    UnhealthyForSensitiveGroups,
    Unhealthy,
    VeryUnhealthy,
    Hazardous,
}

impl AqiTier {
    pub fn from_aqi(aqi: i32) -> Self {
        match aqi {
            i32::MIN..=50 => AqiTier::Good,
            51..=100 => AqiTier::Moderate,
            101..=150 => AqiTier::UnhealthyForSensitiveGroups,
            151..=200 => AqiTier::Unhealthy,
            201..=300 => AqiTier::VeryUnhealthy,
            _ => AqiTier::Hazardous,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            AqiTier::Good => "Good",
            AqiTier::Moderate => "Moderate",
            AqiTier::UnhealthyForSensitiveGroups => "Unhealthy for Sensitive Groups",
            AqiTier::Unhealthy => "Unhealthy",
            AqiTier::VeryUnhealthy => "Very Unhealthy",
            AqiTier::Hazardous => "Hazardous",
        }
    }

    pub fn range(&self) -> &'static str {
        match self {
            AqiTier::Good => "0–50",
            AqiTier::Moderate => "51–100",
            AqiTier::UnhealthyForSensitiveGroups => "101–150",
            AqiTier::Unhealthy => "151–200",
            AqiTier::VeryUnhealthy => "201–300",
            AqiTier::Hazardous => "301+",
        }
    }

    pub fn color(&self) -> &'static str {
        match self {
            AqiTier::Good => "#00E400",
            AqiTier::Moderate => "#FFFF00",
            AqiTier::UnhealthyForSensitiveGroups => "#FF7E00",
            AqiTier::Unhealthy => "#FF0000",
            AqiTier::VeryUnhealthy => "#8F3F97",
            AqiTier::Hazardous => "#7E0023",
        }
    }
}

/// Label for the `offset`-th day after today.
pub fn forecast_day_label(offset: usize, date: NaiveDate) -> String {
    match offset {
        1 => "Tomorrow".to_string(),
        2 => "Day After".to_string(),
        _ => date.format("%A").to_string(),
    }
}

/// Maps precipitation and cloud cover to a description and emoji icon.
pub fn describe_conditions(
    cloud_cover: f64,
    rain: f64,
    showers: f64,
    snowfall: f64,
) -> (&'static str, &'static str) {
    if snowfall > 0.0 {
        ("Snow", "❄️")
    } else if rain > 0.0 || showers > 0.0 {
        ("Rain", "🌧️")
    } else if cloud_cover > 80.0 {
        ("Overcast", "☁️")
    } else if cloud_cover > 50.0 {
        ("Partly Cloudy", "⛅")
    } else if cloud_cover > 20.0 {
        ("Mostly Clear", "🌤️")
    } else {
        ("Clear", "☀️")
    }
}

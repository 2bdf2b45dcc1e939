use anyhow::Result;
use async_trait::async_trait;

use crate::model::{
    AirQualitySample, AqiTier, ForecastDay, Location, WeatherResponse, WeatherSnapshot,
};

use super::DataSource;

/// Synthetic data used when the real provider is unreachable.
///
/// Always succeeds and returns the same readings for every location; only the
/// city label echoes the request.
#[derive(Debug, Clone, Copy, Default)]
pub struct MockSource;

fn day(date: &str, max: f64, min: f64, description: &str, icon: &str) -> ForecastDay {
    ForecastDay {
        date: date.to_string(),
        temperature_max: max,
        temperature_min: min,
        description: description.to_string(),
        icon: icon.to_string(),
    }
}

#[async_trait]
impl DataSource for MockSource {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn weather(&self, location: &Location) -> Result<WeatherResponse> {
        let current = WeatherSnapshot {
            temperature: 22.5,
            humidity: 65,
            wind_speed: 3.2,
            description: "Partly cloudy".to_string(),
            icon: "⛅".to_string(),
            city: location.to_string(),
            country: "GMT".to_string(),
        };

        let forecast = vec![
            day("Tomorrow", 25.0, 18.0, "Sunny", "☀️"),
            day("Day After", 23.0, 16.0, "Partly cloudy", "⛅"),
            day("3 Days", 20.0, 14.0, "Light rain", "🌧️"),
        ];

        Ok(WeatherResponse { current, forecast })
    }

    async fn air_quality(&self, _location: &Location) -> Result<AirQualitySample> {
        let aqi = 45;

        Ok(AirQualitySample {
            aqi,
            category: AqiTier::from_aqi(aqi).label().to_string(),
            pm25: 12.5,
            pm10: 20.0,
            o3: 0.04,
            no2: 0.015,
            so2: 0.008,
            co: 0.3,
        })
    }
}

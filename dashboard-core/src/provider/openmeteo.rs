use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Client;
use serde::Deserialize;

use crate::model::{
    AirQualitySample, AqiTier, ForecastDay, Location, WeatherResponse, WeatherSnapshot,
    describe_conditions, forecast_day_label,
};

use super::{DataSource, fetch_json};

const FORECAST_BASE_URL: &str = "https://api.open-meteo.com";
const AIR_QUALITY_BASE_URL: &str = "https://air-quality-api.open-meteo.com";
const GEOCODING_BASE_URL: &str = "https://geocoding-api.open-meteo.com";

const CURRENT_VARS: &str =
    "temperature_2m,relative_humidity_2m,wind_speed_10m,cloud_cover,rain,showers,snowfall";
const DAILY_VARS: &str = "temperature_2m_max,temperature_2m_min,cloud_cover_mean,rain_sum,showers_sum,snowfall_sum";
const AIR_QUALITY_VARS: &str =
    "us_aqi,pm2_5,pm10,ozone,nitrogen_dioxide,sulphur_dioxide,carbon_monoxide";

/// Today plus the three days shown in the forecast.
const FORECAST_DAYS: usize = 4;

/// Keyless source backed by Open-Meteo. Icons are emoji derived from cloud
/// cover and precipitation.
#[derive(Debug, Clone)]
pub struct OpenMeteoSource {
    http: Client,
    forecast_url: String,
    air_quality_url: String,
    geocoding_url: String,
}

/// A location pinned to coordinates, with the labels to show for it.
#[derive(Debug, Clone, PartialEq)]
struct Place {
    latitude: f64,
    longitude: f64,
    name: Option<String>,
    country: Option<String>,
}

impl OpenMeteoSource {
    pub fn new(http: Client) -> Self {
        Self {
            http,
            forecast_url: FORECAST_BASE_URL.to_string(),
            air_quality_url: AIR_QUALITY_BASE_URL.to_string(),
            geocoding_url: GEOCODING_BASE_URL.to_string(),
        }
    }

    /// Point all three Open-Meteo APIs at one host.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        self.forecast_url = base_url.clone();
        self.air_quality_url = base_url.clone();
        self.geocoding_url = base_url;
        self
    }

    async fn resolve(&self, location: &Location) -> Result<Place> {
        match location {
            Location::Coordinates { latitude, longitude } => Ok(Place {
                latitude: *latitude,
                longitude: *longitude,
                name: None,
                country: None,
            }),
            Location::City(name) => {
                let url = format!("{}/v1/search", self.geocoding_url);
                let parsed: GeoResponse = fetch_json(
                    &self.http,
                    &url,
                    &[
                        ("name", name.clone()),
                        ("count", "1".to_string()),
                        ("format", "json".to_string()),
                    ],
                    "Open-Meteo geocoding",
                )
                .await?;

                let hit = parsed
                    .results
                    .into_iter()
                    .next()
                    .ok_or_else(|| anyhow!("No location found matching '{name}'"))?;

                tracing::debug!(city = %name, latitude = hit.latitude, longitude = hit.longitude, "geocoded");

                Ok(Place {
                    latitude: hit.latitude,
                    longitude: hit.longitude,
                    name: Some(hit.name),
                    country: hit.country_code.or(hit.country),
                })
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct GeoResult {
    name: String,
    latitude: f64,
    longitude: f64,
    country: Option<String>,
    country_code: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeoResponse {
    #[serde(default)]
    results: Vec<GeoResult>,
}

#[derive(Debug, Deserialize)]
struct OmCurrent {
    temperature_2m: f64,
    relative_humidity_2m: f64,
    wind_speed_10m: f64,
    #[serde(default)]
    cloud_cover: f64,
    #[serde(default)]
    rain: f64,
    #[serde(default)]
    showers: f64,
    #[serde(default)]
    snowfall: f64,
}

/// Column-oriented daily series; entries may be null.
#[derive(Debug, Deserialize)]
struct OmDaily {
    time: Vec<String>,
    temperature_2m_max: Vec<Option<f64>>,
    temperature_2m_min: Vec<Option<f64>>,
    #[serde(default)]
    cloud_cover_mean: Vec<Option<f64>>,
    #[serde(default)]
    rain_sum: Vec<Option<f64>>,
    #[serde(default)]
    showers_sum: Vec<Option<f64>>,
    #[serde(default)]
    snowfall_sum: Vec<Option<f64>>,
}

#[derive(Debug, Deserialize)]
struct OmForecastResponse {
    timezone: String,
    current: OmCurrent,
    daily: OmDaily,
}

#[derive(Debug, Deserialize)]
struct OmAirCurrent {
    us_aqi: Option<f64>,
    pm2_5: Option<f64>,
    pm10: Option<f64>,
    ozone: Option<f64>,
    nitrogen_dioxide: Option<f64>,
    sulphur_dioxide: Option<f64>,
    carbon_monoxide: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct OmAirResponse {
    current: OmAirCurrent,
}

fn value_at(series: &[Option<f64>], idx: usize) -> f64 {
    series.get(idx).copied().flatten().unwrap_or(0.0)
}

fn daily_rows(daily: &OmDaily) -> Result<Vec<ForecastDay>> {
    let mut rows = Vec::new();
    let Some(first) = daily.time.first() else {
        return Ok(rows);
    };
    let today = NaiveDate::parse_from_str(first, "%Y-%m-%d")
        .with_context(|| format!("Unexpected Open-Meteo date '{first}'"))?;

    for (idx, day) in daily.time.iter().enumerate().skip(1) {
        let (Some(Some(max)), Some(Some(min))) = (
            daily.temperature_2m_max.get(idx),
            daily.temperature_2m_min.get(idx),
        ) else {
            continue;
        };
        let date = NaiveDate::parse_from_str(day, "%Y-%m-%d")
            .with_context(|| format!("Unexpected Open-Meteo date '{day}'"))?;

        let (description, icon) = describe_conditions(
            value_at(&daily.cloud_cover_mean, idx),
            value_at(&daily.rain_sum, idx),
            value_at(&daily.showers_sum, idx),
            value_at(&daily.snowfall_sum, idx),
        );

        rows.push(ForecastDay {
            date: forecast_day_label((date - today).num_days().max(0) as usize, date),
            temperature_max: *max,
            temperature_min: *min,
            description: description.to_string(),
            icon: icon.to_string(),
        });
    }

    Ok(rows)
}

#[async_trait]
impl DataSource for OpenMeteoSource {
    fn name(&self) -> &'static str {
        "openmeteo"
    }

    async fn weather(&self, location: &Location) -> Result<WeatherResponse> {
        let place = self.resolve(location).await?;
        let url = format!("{}/v1/forecast", self.forecast_url);
        let parsed: OmForecastResponse = fetch_json(
            &self.http,
            &url,
            &[
                ("latitude", place.latitude.to_string()),
                ("longitude", place.longitude.to_string()),
                ("current", CURRENT_VARS.to_string()),
                ("daily", DAILY_VARS.to_string()),
                ("wind_speed_unit", "ms".to_string()),
                ("timezone", "auto".to_string()),
                ("forecast_days", FORECAST_DAYS.to_string()),
            ],
            "Open-Meteo forecast",
        )
        .await?;

        let now = &parsed.current;
        let (description, icon) =
            describe_conditions(now.cloud_cover, now.rain, now.showers, now.snowfall);

        let current = WeatherSnapshot {
            temperature: now.temperature_2m,
            humidity: now.relative_humidity_2m.round().clamp(0.0, 100.0) as u8,
            wind_speed: now.wind_speed_10m,
            description: description.to_string(),
            icon: icon.to_string(),
            city: place.name.unwrap_or_else(|| location.to_string()),
            country: place.country.unwrap_or(parsed.timezone),
        };

        Ok(WeatherResponse {
            current,
            forecast: daily_rows(&parsed.daily)?,
        })
    }

    async fn air_quality(&self, location: &Location) -> Result<AirQualitySample> {
        let place = self.resolve(location).await?;
        let url = format!("{}/v1/air-quality", self.air_quality_url);
        let parsed: OmAirResponse = fetch_json(
            &self.http,
            &url,
            &[
                ("latitude", place.latitude.to_string()),
                ("longitude", place.longitude.to_string()),
                ("current", AIR_QUALITY_VARS.to_string()),
            ],
            "Open-Meteo air quality",
        )
        .await?;

        let reading = parsed.current;
        let aqi = reading
            .us_aqi
            .ok_or_else(|| anyhow!("Open-Meteo returned no US AQI for this location"))?
            .round() as i32;

        Ok(AirQualitySample {
            aqi,
            category: AqiTier::from_aqi(aqi).label().to_string(),
            pm25: reading.pm2_5.unwrap_or_default(),
            pm10: reading.pm10.unwrap_or_default(),
            o3: reading.ozone.unwrap_or_default(),
            no2: reading.nitrogen_dioxide.unwrap_or_default(),
            so2: reading.sulphur_dioxide.unwrap_or_default(),
            co: reading.carbon_monoxide.unwrap_or_default(),
        })
    }
}

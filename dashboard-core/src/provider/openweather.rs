use anyhow::{Result, anyhow};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Timelike};
use reqwest::Client;
use serde::Deserialize;
use std::collections::BTreeMap;

use crate::model::{
    AirQualitySample, ForecastDay, Location, WeatherResponse, WeatherSnapshot, forecast_day_label,
};

use super::{DataSource, fetch_json};

const DEFAULT_BASE_URL: &str = "https://api.openweathermap.org";

/// Days after today folded out of the 3-hourly forecast.
const FORECAST_DAYS: usize = 3;

#[derive(Debug, Clone)]
pub struct OpenWeatherSource {
    api_key: String,
    http: Client,
    base_url: String,
}

impl OpenWeatherSource {
    pub fn new(api_key: String, http: Client) -> Self {
        Self {
            api_key,
            http,
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn query(&self, location: &Location) -> Vec<(&'static str, String)> {
        let mut query = match location {
            Location::City(name) => vec![("q", name.clone())],
            Location::Coordinates { latitude, longitude } => {
                vec![("lat", latitude.to_string()), ("lon", longitude.to_string())]
            }
        };
        query.push(("appid", self.api_key.clone()));
        query.push(("units", "metric".to_string()));
        query
    }

    /// Current conditions plus the observation time (unix seconds).
    async fn fetch_current(&self, location: &Location) -> Result<(WeatherSnapshot, i64)> {
        let url = format!("{}/data/2.5/weather", self.base_url);
        let parsed: OwCurrentResponse = fetch_json(
            &self.http,
            &url,
            &self.query(location),
            "OpenWeather (current weather)",
        )
        .await?;

        let (description, icon) = parsed
            .weather
            .into_iter()
            .next()
            .map(|w| (w.description, w.icon))
            .unwrap_or_else(|| ("Unknown".to_string(), "01d".to_string()));

        let snapshot = WeatherSnapshot {
            temperature: parsed.main.temp,
            humidity: parsed.main.humidity,
            wind_speed: parsed.wind.speed,
            description,
            icon,
            city: parsed.name,
            country: parsed.sys.country.unwrap_or_default(),
        };
        Ok((snapshot, parsed.dt))
    }

    /// Daily rows for the days after the local date of `now`.
    async fn fetch_forecast(&self, location: &Location, now: i64) -> Result<Vec<ForecastDay>> {
        let url = format!("{}/data/2.5/forecast", self.base_url);
        let parsed: OwForecastResponse = fetch_json(
            &self.http,
            &url,
            &self.query(location),
            "OpenWeather (5-day forecast)",
        )
        .await?;

        if parsed.list.is_empty() {
            return Err(anyhow!("OpenWeather forecast response contained no data"));
        }

        Ok(fold_daily(&parsed.list, parsed.city.timezone, now))
    }
}

#[derive(Debug, Deserialize)]
struct OwMain {
    temp: f64,
    humidity: u8,
}

#[derive(Debug, Deserialize)]
struct OwWeather {
    description: String,
    icon: String,
}

#[derive(Debug, Deserialize)]
struct OwWind {
    speed: f64,
}

#[derive(Debug, Deserialize)]
struct OwSys {
    country: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OwCurrentResponse {
    name: String,
    dt: i64,
    main: OwMain,
    weather: Vec<OwWeather>,
    wind: OwWind,
    sys: OwSys,
}

#[derive(Debug, Deserialize)]
struct OwCity {
    /// Shift from UTC in seconds.
    #[serde(default)]
    timezone: i64,
}

#[derive(Debug, Deserialize)]
struct OwForecastMain {
    temp_min: f64,
    temp_max: f64,
}

#[derive(Debug, Deserialize)]
struct OwForecastEntry {
    dt: i64,
    main: OwForecastMain,
    weather: Vec<OwWeather>,
}

#[derive(Debug, Deserialize)]
struct OwForecastResponse {
    city: OwCity,
    list: Vec<OwForecastEntry>,
}

/// Collapses 3-hourly entries into one row per local calendar day after the
/// local date of `now`. Description and icon come from the entry closest to
/// local noon.
fn fold_daily(entries: &[OwForecastEntry], tz_offset: i64, now: i64) -> Vec<ForecastDay> {
    let Some(today) = DateTime::from_timestamp(now + tz_offset, 0).map(|t| t.date_naive()) else {
        return Vec::new();
    };

    let mut days: BTreeMap<NaiveDate, Vec<(u32, &OwForecastEntry)>> = BTreeMap::new();
    for entry in entries {
        let Some(local) = DateTime::from_timestamp(entry.dt + tz_offset, 0) else {
            continue;
        };
        days.entry(local.date_naive())
            .or_default()
            .push((local.hour(), entry));
    }

    days.into_iter()
        .filter(|(date, _)| *date > today)
        .take(FORECAST_DAYS)
        .map(|(date, slots)| {
            let max = slots
                .iter()
                .map(|(_, e)| e.main.temp_max)
                .fold(f64::NEG_INFINITY, f64::max);
            let min = slots
                .iter()
                .map(|(_, e)| e.main.temp_min)
                .fold(f64::INFINITY, f64::min);
            let midday = slots
                .iter()
                .min_by_key(|(hour, _)| hour.abs_diff(12))
                .and_then(|(_, e)| e.weather.first());
            let offset = (date - today).num_days().max(0) as usize;

            ForecastDay {
                date: forecast_day_label(offset, date),
                temperature_max: max,
                temperature_min: min,
                description: midday
                    .map(|w| w.description.clone())
                    .unwrap_or_else(|| "Unknown".to_string()),
                icon: midday
                    .map(|w| w.icon.clone())
                    .unwrap_or_else(|| "01d".to_string()),
            }
        })
        .collect()
}

#[async_trait]
impl DataSource for OpenWeatherSource {
    fn name(&self) -> &'static str {
        "openweather"
    }

    async fn weather(&self, location: &Location) -> Result<WeatherResponse> {
        let (current, observed_at) = self.fetch_current(location).await?;
        let forecast = self.fetch_forecast(location, observed_at).await?;
        Ok(WeatherResponse { current, forecast })
    }

    async fn air_quality(&self, _location: &Location) -> Result<AirQualitySample> {
        Err(anyhow!(
            "US AQI readings are not provided by the OpenWeather free API"
        ))
    }
}

//! Presentation-neutral view of the acquisition state.
//!
//! This is the only place where stored celsius values are converted to the
//! preferred unit and where icon tokens are resolved. Front-ends render these
//! structs verbatim.

use crate::{
    controller::AcquisitionState,
    icon::IconKind,
    model::{AirQualitySample, AqiTier, ForecastDay, WeatherSnapshot},
    settings::AppSettings,
    units::{TemperatureUnit, format_degrees},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IconView {
    Glyph(String),
    Image { url: String, alt: String },
}

impl IconView {
    pub fn new(token: &str, description: &str) -> Self {
        let kind = IconKind::classify(token);
        if kind.is_glyph() {
            IconView::Glyph(kind.resolve())
        } else {
            IconView::Image {
                url: kind.resolve(),
                alt: description.to_string(),
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentConditionsView {
    pub heading: String,
    pub temperature: String,
    pub unit: &'static str,
    pub icon: IconView,
    pub description: String,
    pub humidity: String,
    pub wind_speed: String,
}

impl CurrentConditionsView {
    pub fn new(snapshot: &WeatherSnapshot, unit: TemperatureUnit) -> Self {
        let heading = if snapshot.country.is_empty() {
            snapshot.city.clone()
        } else {
            format!("{}, {}", snapshot.city, snapshot.country)
        };

        Self {
            heading,
            temperature: format_degrees(snapshot.temperature, unit),
            unit: unit.symbol(),
            icon: IconView::new(&snapshot.icon, &snapshot.description),
            description: snapshot.description.clone(),
            humidity: format!("{}%", snapshot.humidity),
            wind_speed: format!("{} m/s", snapshot.wind_speed),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForecastRowView {
    pub label: String,
    pub icon: IconView,
    pub description: String,
    pub high: String,
    pub low: String,
    pub unit: &'static str,
}

impl ForecastRowView {
    pub fn new(day: &ForecastDay, unit: TemperatureUnit) -> Self {
        Self {
            label: day.date.clone(),
            icon: IconView::new(&day.icon, &day.description),
            description: day.description.clone(),
            high: format_degrees(day.temperature_max, unit),
            low: format_degrees(day.temperature_min, unit),
            unit: unit.symbol(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollutantReading {
    pub name: &'static str,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AirQualityPanel {
    pub aqi: i32,
    pub category: String,
    pub tier: AqiTier,
    pub pollutants: Vec<PollutantReading>,
}

impl AirQualityPanel {
    pub fn new(sample: &AirQualitySample) -> Self {
        let reading = |name: &'static str, value: f64, unit: &str| PollutantReading {
            name,
            value: format!("{value} {unit}"),
        };

        Self {
            aqi: sample.aqi,
            category: sample.category.clone(),
            tier: AqiTier::from_aqi(sample.aqi),
            pollutants: vec![
                reading("PM2.5", sample.pm25, "μg/m³"),
                reading("PM10", sample.pm10, "μg/m³"),
                reading("O₃", sample.o3, "ppm"),
                reading("NO₂", sample.no2, "ppm"),
                reading("SO₂", sample.so2, "ppm"),
                reading("CO", sample.co, "ppm"),
            ],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DashboardView {
    /// Nothing fetched yet.
    Empty,
    Loading,
    Error {
        message: String,
        can_retry: bool,
    },
    Ready {
        current: CurrentConditionsView,
        forecast: Vec<ForecastRowView>,
        air_quality: Option<AirQualityPanel>,
    },
}

impl DashboardView {
    /// Data from earlier fetches is never shown while loading or failed.
    pub fn build(state: &AcquisitionState, settings: &AppSettings) -> Self {
        let unit = settings.temperature_unit;
        match state {
            AcquisitionState::Idle => DashboardView::Empty,
            AcquisitionState::Loading => DashboardView::Loading,
            AcquisitionState::Failed(err) => DashboardView::Error {
                message: err.to_string(),
                can_retry: true,
            },
            AcquisitionState::Ready {
                weather,
                air_quality,
            } => DashboardView::Ready {
                current: CurrentConditionsView::new(&weather.current, unit),
                forecast: weather
                    .forecast
                    .iter()
                    .map(|day| ForecastRowView::new(day, unit))
                    .collect(),
                air_quality: air_quality
                    .as_ref()
                    .filter(|_| settings.enable_air_quality)
                    .map(AirQualityPanel::new),
            },
        }
    }
}

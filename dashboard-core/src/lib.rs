//! Core library for the weather dashboard.
//!
//! This crate defines:
//! - Shared domain models (weather, forecast, air quality)
//! - Data sources and the primary/fallback provider abstraction
//! - The acquisition controller and its state machine
//! - Settings, configuration, and display-time normalization (units, icons)
//!
//! It is used by `dashboard-cli`, but can also be embedded in other front-ends.

pub mod config;
pub mod controller;
pub mod error;
pub mod icon;
pub mod model;
pub mod provider;
pub mod settings;
pub mod units;
pub mod view;

pub use config::{Config, SourceConfig};
pub use controller::{AcquisitionState, DataAcquisitionController, FetchOutcome, FetchTicket};
pub use error::{AcquisitionError, ProviderError, SettingsError};
pub use icon::{IconKind, resolve_icon};
pub use model::{
    AirQualitySample, AqiTier, ForecastDay, Location, WeatherResponse, WeatherSnapshot,
};
pub use provider::{Channel, ChannelProvider, Command, DataSource, SourceId, WeatherProvider};
pub use settings::{AppSettings, SettingsStore};
pub use units::{TemperatureUnit, format_degrees, from_display_unit, to_display_unit};
pub use view::DashboardView;

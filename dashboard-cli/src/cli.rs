use std::sync::Arc;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use dashboard_core::{
    AppSettings, ChannelProvider, Config, DashboardView, DataAcquisitionController, Location,
    SourceId, TemperatureUnit, WeatherProvider, provider::provider_from_config,
};
use inquire::{Confirm, Password};

use crate::{interactive, render};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "weather-dashboard", version, about = "Weather and air quality dashboard")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Configure credentials for a specific data source.
    Configure {
        /// Source short name, e.g. "openweather" or "openmeteo".
        source: String,
    },

    /// Fetch once and print the dashboard.
    Show(SettingsArgs),

    /// Browse the dashboard and change settings interactively.
    Interactive(SettingsArgs),
}

/// Overrides for the settings stored in the config file.
#[derive(Debug, Args)]
pub struct SettingsArgs {
    /// City name to look up.
    #[arg(long, conflicts_with_all = ["lat", "lon"])]
    pub city: Option<String>,

    /// Latitude in decimal degrees.
    #[arg(long, requires = "lon", allow_hyphen_values = true)]
    pub lat: Option<f64>,

    /// Longitude in decimal degrees.
    #[arg(long, requires = "lat", allow_hyphen_values = true)]
    pub lon: Option<f64>,

    /// Display unit: celsius or fahrenheit.
    #[arg(long, value_parser = parse_unit)]
    pub unit: Option<TemperatureUnit>,

    /// Skip the air-quality panel.
    #[arg(long)]
    pub no_air_quality: bool,

    /// Use synthetic data only, without network access.
    #[arg(long)]
    pub offline: bool,
}

fn parse_unit(value: &str) -> Result<TemperatureUnit, String> {
    TemperatureUnit::try_from(value).map_err(|e| e.to_string())
}

impl SettingsArgs {
    fn apply(&self, mut settings: AppSettings) -> AppSettings {
        if let Some(city) = &self.city {
            settings.location = Location::city(city.clone());
        }
        if let (Some(latitude), Some(longitude)) = (self.lat, self.lon) {
            settings.location = Location::coordinates(latitude, longitude);
        }
        if let Some(unit) = self.unit {
            settings.temperature_unit = unit;
        }
        if self.no_air_quality {
            settings.enable_air_quality = false;
        }
        settings
    }

    fn provider(&self, config: &Config) -> anyhow::Result<Arc<dyn WeatherProvider>> {
        if self.offline {
            return Ok(Arc::new(ChannelProvider::offline()));
        }
        Ok(Arc::new(provider_from_config(config)?))
    }
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command {
            Command::Configure { source } => configure(&source),
            Command::Show(args) => {
                let config = Config::load()?;
                let settings = args.apply(config.settings.clone());
                let controller =
                    DataAcquisitionController::new(args.provider(&config)?, settings.clone());

                controller.fetch(&settings).await;
                let view = DashboardView::build(&controller.state(), &settings);
                print!("{}", render::dashboard(&view));
                Ok(())
            }
            Command::Interactive(args) => {
                let config = Config::load()?;
                let settings = args.apply(config.settings.clone());
                let controller = Arc::new(DataAcquisitionController::new(
                    args.provider(&config)?,
                    settings.clone(),
                ));
                interactive::run(controller, settings).await
            }
        }
    }
}

fn configure(source: &str) -> anyhow::Result<()> {
    let id = SourceId::try_from(source)?;
    let mut config = Config::load()?;

    if id.requires_api_key() {
        let api_key = Password::new(&format!("API key for {id}:"))
            .without_confirmation()
            .prompt()
            .context("Failed to read API key")?;
        config.upsert_source_api_key(id, api_key.trim().to_string());
    }

    let make_primary = Confirm::new(&format!("Use {id} as the primary source?"))
        .with_default(true)
        .prompt()
        .context("Failed to read answer")?;
    if make_primary {
        config.set_primary_source(id);
    }

    config.save()?;
    println!("Saved configuration to {}", Config::config_file_path()?.display());
    Ok(())
}

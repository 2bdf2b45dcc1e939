use std::{fmt, sync::Arc};

use anyhow::Context;
use dashboard_core::{
    AcquisitionState, AppSettings, DashboardView, DataAcquisitionController, Location,
    SettingsStore, settings::parse_coordinate_or_default,
};
use inquire::{InquireError, Select, Text};
use tokio::sync::watch;

use crate::render;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    Refresh,
    ChangeCity,
    ChangeCoordinates,
    ToggleUnit,
    ToggleAirQuality,
    Quit,
}

impl Action {
    const ALL: [Action; 6] = [
        Action::Refresh,
        Action::ChangeCity,
        Action::ChangeCoordinates,
        Action::ToggleUnit,
        Action::ToggleAirQuality,
        Action::Quit,
    ];
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Action::Refresh => "Refresh / retry",
            Action::ChangeCity => "Change city",
            Action::ChangeCoordinates => "Change coordinates",
            Action::ToggleUnit => "Toggle °C / °F",
            Action::ToggleAirQuality => "Toggle air quality",
            Action::Quit => "Quit",
        })
    }
}

/// Menu loop. Location and air-quality changes go through the settings store,
/// which triggers the controller; unit changes only re-render.
pub async fn run(
    controller: Arc<DataAcquisitionController>,
    settings: AppSettings,
) -> anyhow::Result<()> {
    let mut store = SettingsStore::new(settings.clone());
    controller.attach(&mut store);
    let mut states = controller.watch();

    controller.fetch(&settings).await;

    loop {
        settled(&mut states).await?;
        let view = DashboardView::build(&controller.state(), store.get());
        println!();
        print!("{}", render::dashboard(&view));

        let action = match Select::new("What next?", Action::ALL.to_vec()).prompt() {
            Ok(action) => action,
            Err(InquireError::OperationCanceled | InquireError::OperationInterrupted) => {
                break;
            }
            Err(err) => return Err(err).context("Failed to read menu choice"),
        };

        match action {
            Action::Refresh => {
                controller.retry().await;
            }
            Action::ChangeCity => {
                let city = Text::new("City:")
                    .with_initial_value(&store.get().location.to_string())
                    .prompt()
                    .context("Failed to read city")?;
                let city = city.trim();
                if !city.is_empty() {
                    store.modify(|s| s.location = Location::city(city));
                }
            }
            Action::ChangeCoordinates => {
                let latitude = Text::new("Latitude:")
                    .with_placeholder("52.52")
                    .prompt()
                    .context("Failed to read latitude")?;
                let longitude = Text::new("Longitude:")
                    .with_placeholder("13.41")
                    .with_help_message("e.g. Berlin 52.52 / 13.41, London 51.51 / -0.13")
                    .prompt()
                    .context("Failed to read longitude")?;
                let location = Location::coordinates(
                    parse_coordinate_or_default("latitude", &latitude),
                    parse_coordinate_or_default("longitude", &longitude),
                );
                store.modify(|s| s.location = location);
            }
            Action::ToggleUnit => {
                store.modify(|s| s.temperature_unit = s.temperature_unit.toggled());
            }
            Action::ToggleAirQuality => {
                store.modify(|s| s.enable_air_quality = !s.enable_air_quality);
            }
            Action::Quit => break,
        }
    }

    Ok(())
}

/// Wait until no fetch is in flight.
async fn settled(states: &mut watch::Receiver<AcquisitionState>) -> anyhow::Result<()> {
    states
        .wait_for(|state| !state.is_loading())
        .await
        .context("Acquisition controller went away")?;
    Ok(())
}

use serde::{Deserialize, Serialize};

use crate::{error::SettingsError, model::Location, units::TemperatureUnit};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    pub location: Location,
    pub temperature_unit: TemperatureUnit,
    pub enable_air_quality: bool,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            location: Location::default(),
            temperature_unit: TemperatureUnit::Celsius,
            enable_air_quality: true,
        }
    }
}

impl AppSettings {
    /// Whether moving from `self` to `next` needs fresh data.
    ///
    /// The temperature unit is display-only and never does.
    pub fn requires_refetch(&self, next: &AppSettings) -> bool {
        self.location != next.location || self.enable_air_quality != next.enable_air_quality
    }
}

type Listener = Box<dyn Fn(&AppSettings) + Send + Sync>;

/// Process-wide settings holder.
///
/// Settings are replaced wholesale through [`SettingsStore::update`]. A single
/// listener can be registered; it runs after an update that changes the
/// location or the air-quality flag.
#[derive(Default)]
pub struct SettingsStore {
    current: AppSettings,
    listener: Option<Listener>,
}

impl std::fmt::Debug for SettingsStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SettingsStore")
            .field("current", &self.current)
            .field("listener", &self.listener.is_some())
            .finish()
    }
}

impl SettingsStore {
    pub fn new(initial: AppSettings) -> Self {
        Self {
            current: initial,
            listener: None,
        }
    }

    pub fn get(&self) -> &AppSettings {
        &self.current
    }

    /// Register the change listener, replacing any previous one.
    pub fn subscribe<F>(&mut self, listener: F)
    where
        F: Fn(&AppSettings) + Send + Sync + 'static,
    {
        if self.listener.is_some() {
            tracing::debug!("replacing settings listener");
        }
        self.listener = Some(Box::new(listener));
    }

    /// Replace the settings. Returns `true` if the listener was notified.
    pub fn update(&mut self, next: AppSettings) -> bool {
        let refetch = self.current.requires_refetch(&next);
        self.current = next;

        if !refetch {
            return false;
        }

        tracing::info!(
            location = %self.current.location,
            air_quality = self.current.enable_air_quality,
            "settings changed"
        );
        match &self.listener {
            Some(listener) => {
                listener(&self.current);
                true
            }
            None => false,
        }
    }

    /// Apply `change` to a copy of the current settings and store the result.
    pub fn modify(&mut self, change: impl FnOnce(&mut AppSettings)) -> bool {
        let mut next = self.current.clone();
        change(&mut next);
        self.update(next)
    }
}

/// Parse a latitude/longitude text field.
pub fn parse_coordinate(field: &'static str, input: &str) -> Result<f64, SettingsError> {
    input
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| SettingsError::InvalidSettingsInput {
            field,
            input: input.to_string(),
        })
}

/// Like [`parse_coordinate`], but malformed input becomes `0.0`.
pub fn parse_coordinate_or_default(field: &'static str, input: &str) -> f64 {
    parse_coordinate(field, input).unwrap_or_else(|err| {
        tracing::warn!("{err}; using 0");
        0.0
    })
}

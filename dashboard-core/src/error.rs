use thiserror::Error;

use crate::provider::{Channel, Command, Resource};

/// A single backend command failed.
#[derive(Debug, Error)]
#[error("`{command}` failed: {reason:#}")]
pub struct ProviderError {
    pub command: Command,
    pub reason: anyhow::Error,
}

impl ProviderError {
    pub fn new(command: Command, reason: anyhow::Error) -> Self {
        Self { command, reason }
    }

    pub fn channel(&self) -> Channel {
        self.command.channel()
    }
}

/// Failures the acquisition layer knows how to classify.
///
/// Only [`AcquisitionError::FallbackFailed`] ever reaches the state machine;
/// the other kinds are recovered locally and logged.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AcquisitionError {
    #[error("{resource} primary channel unavailable: {reason}")]
    ProviderUnavailable { resource: Resource, reason: String },

    #[error("Could not load weather data: primary failed ({primary}); fallback failed ({fallback})")]
    FallbackFailed { primary: String, fallback: String },

    #[error("Air quality unavailable: primary failed ({primary}); fallback failed ({fallback})")]
    AirQualityUnavailable { primary: String, fallback: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SettingsError {
    #[error("Invalid {field} '{input}': expected a number")]
    InvalidSettingsInput { field: &'static str, input: String },
}

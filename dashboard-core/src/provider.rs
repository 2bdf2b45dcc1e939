use crate::{
    Config,
    error::ProviderError,
    model::{AirQualitySample, Location, WeatherResponse},
    provider::{mock::MockSource, openmeteo::OpenMeteoSource, openweather::OpenWeatherSource},
};
use anyhow::{Context, anyhow};
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::{convert::TryFrom, fmt::Debug, time::Duration};

pub mod mock;
pub mod openmeteo;
pub mod openweather;

/// Which side of the primary/fallback pair a call goes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    Primary,
    Fallback,
}

impl Channel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Channel::Primary => "primary",
            Channel::Fallback => "fallback",
        }
    }
}

impl std::fmt::Display for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resource {
    Weather,
    AirQuality,
}

impl std::fmt::Display for Resource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Resource::Weather => f.write_str("weather"),
            Resource::AirQuality => f.write_str("air quality"),
        }
    }
}

/// Named backend operations. Each takes a single location argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    GetWeather,
    GetMockWeather,
    GetAirQuality,
    GetMockAirQuality,
}

impl Command {
    pub fn new(resource: Resource, channel: Channel) -> Self {
        match (resource, channel) {
            (Resource::Weather, Channel::Primary) => Command::GetWeather,
            (Resource::Weather, Channel::Fallback) => Command::GetMockWeather,
            (Resource::AirQuality, Channel::Primary) => Command::GetAirQuality,
            (Resource::AirQuality, Channel::Fallback) => Command::GetMockAirQuality,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Command::GetWeather => "get_weather",
            Command::GetMockWeather => "get_mock_weather",
            Command::GetAirQuality => "get_air_quality",
            Command::GetMockAirQuality => "get_mock_air_quality",
        }
    }

    pub fn channel(&self) -> Channel {
        match self {
            Command::GetWeather | Command::GetAirQuality => Channel::Primary,
            Command::GetMockWeather | Command::GetMockAirQuality => Channel::Fallback,
        }
    }

    pub fn resource(&self) -> Resource {
        match self {
            Command::GetWeather | Command::GetMockWeather => Resource::Weather,
            Command::GetAirQuality | Command::GetMockAirQuality => Resource::AirQuality,
        }
    }

    pub const fn all() -> &'static [Command] {
        &[
            Command::GetWeather,
            Command::GetMockWeather,
            Command::GetAirQuality,
            Command::GetMockAirQuality,
        ]
    }
}

impl std::fmt::Display for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for Command {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Command::all()
            .iter()
            .copied()
            .find(|c| c.as_str() == value)
            .ok_or_else(|| anyhow!("Unknown command '{value}'."))
    }
}

/// Channel-addressed access to weather and air-quality data.
///
/// Implementations hold no per-call state: every invocation is a fresh
/// request, and the two channels share no retry budget.
#[async_trait]
pub trait WeatherProvider: Send + Sync + Debug {
    async fn weather(
        &self,
        channel: Channel,
        location: &Location,
    ) -> Result<WeatherResponse, ProviderError>;

    async fn air_quality(
        &self,
        channel: Channel,
        location: &Location,
    ) -> Result<AirQualitySample, ProviderError>;
}

/// A concrete origin of weather data (a remote API or the synthetic generator).
#[async_trait]
pub trait DataSource: Send + Sync + Debug {
    fn name(&self) -> &'static str;

    async fn weather(&self, location: &Location) -> anyhow::Result<WeatherResponse>;

    async fn air_quality(&self, location: &Location) -> anyhow::Result<AirQualitySample>;
}

/// Routes the primary channel to one [`DataSource`] and the fallback channel
/// to another.
#[derive(Debug)]
pub struct ChannelProvider {
    primary: Box<dyn DataSource>,
    fallback: Box<dyn DataSource>,
}

impl ChannelProvider {
    pub fn new(primary: Box<dyn DataSource>, fallback: Box<dyn DataSource>) -> Self {
        Self { primary, fallback }
    }

    /// Both channels served by the synthetic source. No network access.
    pub fn offline() -> Self {
        Self::new(Box::new(MockSource), Box::new(MockSource))
    }

    fn source(&self, channel: Channel) -> &dyn DataSource {
        match channel {
            Channel::Primary => self.primary.as_ref(),
            Channel::Fallback => self.fallback.as_ref(),
        }
    }
}

#[async_trait]
impl WeatherProvider for ChannelProvider {
    async fn weather(
        &self,
        channel: Channel,
        location: &Location,
    ) -> Result<WeatherResponse, ProviderError> {
        let command = Command::new(Resource::Weather, channel);
        let source = self.source(channel);
        tracing::debug!(%command, source = source.name(), %location, "invoking");
        source
            .weather(location)
            .await
            .map_err(|e| ProviderError::new(command, e))
    }

    async fn air_quality(
        &self,
        channel: Channel,
        location: &Location,
    ) -> Result<AirQualitySample, ProviderError> {
        let command = Command::new(Resource::AirQuality, channel);
        let source = self.source(channel);
        tracing::debug!(%command, source = source.name(), %location, "invoking");
        source
            .air_quality(location)
            .await
            .map_err(|e| ProviderError::new(command, e))
    }
}

/// Remote APIs that can serve the primary channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceId {
    OpenWeather,
    OpenMeteo,
}

impl SourceId {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceId::OpenWeather => "openweather",
            SourceId::OpenMeteo => "openmeteo",
        }
    }

    pub const fn all() -> &'static [SourceId] {
        &[SourceId::OpenWeather, SourceId::OpenMeteo]
    }

    pub fn requires_api_key(&self) -> bool {
        matches!(self, SourceId::OpenWeather)
    }
}

impl std::fmt::Display for SourceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for SourceId {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let lower = value.to_lowercase();

        match lower.as_str() {
            "openweather" => Ok(SourceId::OpenWeather),
            "openmeteo" | "open-meteo" => Ok(SourceId::OpenMeteo),
            _ => Err(anyhow!(
                "Unknown source '{value}'. Supported sources: openweather, openmeteo."
            )),
        }
    }
}

/// HTTP client shared by the remote sources, honouring the configured timeout.
pub fn http_client(config: &Config) -> anyhow::Result<Client> {
    Client::builder()
        .timeout(Duration::from_secs(config.request_timeout_secs))
        .build()
        .context("Failed to build HTTP client")
}

/// Construct a data source from config and explicit SourceId.
pub fn source_from_config(id: SourceId, config: &Config) -> anyhow::Result<Box<dyn DataSource>> {
    let http = http_client(config)?;

    let boxed: Box<dyn DataSource> = match id {
        SourceId::OpenWeather => {
            let api_key = config.source_api_key(id).ok_or_else(|| {
                anyhow!(
                    "No API key configured for source '{id}'.\n\
                     Hint: run `weather-dashboard configure {id}` and enter your API key."
                )
            })?;
            Box::new(OpenWeatherSource::new(api_key.to_owned(), http))
        }
        SourceId::OpenMeteo => Box::new(OpenMeteoSource::new(http)),
    };

    Ok(boxed)
}

/// Stands in for a primary source that could not be built, e.g. for lack of
/// an API key. Every call fails, so requests go to the fallback channel.
#[derive(Debug)]
pub struct UnavailableSource {
    id: SourceId,
    reason: String,
}

impl UnavailableSource {
    pub fn new(id: SourceId, reason: &anyhow::Error) -> Self {
        Self {
            id,
            reason: format!("{reason:#}"),
        }
    }
}

#[async_trait]
impl DataSource for UnavailableSource {
    fn name(&self) -> &'static str {
        self.id.as_str()
    }

    async fn weather(&self, _location: &Location) -> anyhow::Result<WeatherResponse> {
        Err(anyhow!("{}", self.reason))
    }

    async fn air_quality(&self, _location: &Location) -> anyhow::Result<AirQualitySample> {
        Err(anyhow!("{}", self.reason))
    }
}

/// The configured primary source paired with the synthetic fallback.
///
/// A primary source that cannot be built is not fatal: its channel keeps
/// failing and every request is served by the fallback.
pub fn provider_from_config(config: &Config) -> anyhow::Result<ChannelProvider> {
    let id = config.primary_source_id()?;
    let primary = source_from_config(id, config).unwrap_or_else(|err| {
        tracing::warn!(source = %id, "primary source unavailable: {err:#}");
        Box::new(UnavailableSource::new(id, &err))
    });
    Ok(ChannelProvider::new(primary, Box::new(MockSource)))
}

/// GET `url`, check the status and decode the JSON body.
pub(crate) async fn fetch_json<T: DeserializeOwned>(
    http: &Client,
    url: &str,
    query: &[(&str, String)],
    what: &str,
) -> anyhow::Result<T> {
    let res = http
        .get(url)
        .query(query)
        .send()
        .await
        .with_context(|| format!("Failed to send request to {what}"))?;

    let status = res.status();
    let body = res
        .text()
        .await
        .with_context(|| format!("Failed to read {what} response body"))?;

    if !status.is_success() {
        return Err(anyhow!(
            "{what} request failed with status {}: {}",
            status,
            truncate_body(&body),
        ));
    }

    serde_json::from_str(&body).with_context(|| format!("Failed to parse {what} JSON"))
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    #[test]
    fn source_id_as_str_roundtrip() {
        for id in SourceId::all() {
            let parsed = SourceId::try_from(id.as_str()).expect("roundtrip should succeed");
            assert_eq!(*id, parsed);
        }
    }

    #[test]
    fn unknown_source_error() {
        let err = SourceId::try_from("doesnotexist").unwrap_err();
        assert!(err.to_string().contains("Unknown source"));
    }

    #[test]
    fn command_names_match_backend() {
        assert_eq!(Command::new(Resource::Weather, Channel::Primary).as_str(), "get_weather");
        assert_eq!(
            Command::new(Resource::Weather, Channel::Fallback).as_str(),
            "get_mock_weather"
        );
        assert_eq!(
            Command::new(Resource::AirQuality, Channel::Primary).as_str(),
            "get_air_quality"
        );
        assert_eq!(
            Command::new(Resource::AirQuality, Channel::Fallback).as_str(),
            "get_mock_air_quality"
        );
    }

    #[test]
    fn command_parts_roundtrip() {
        for command in Command::all() {
            assert_eq!(Command::new(command.resource(), command.channel()), *command);
            assert_eq!(Command::try_from(command.as_str()).unwrap(), *command);
        }
    }

    #[test]
    fn openweather_source_errors_when_missing_api_key() {
        let cfg = Config::default();
        let err = source_from_config(SourceId::OpenWeather, &cfg).unwrap_err();
        assert!(err.to_string().contains("No API key configured for source"));
    }

    #[test]
    fn openmeteo_source_needs_no_key() {
        let cfg = Config::default();
        let source = source_from_config(SourceId::OpenMeteo, &cfg).expect("keyless source");
        assert_eq!(source.name(), "openmeteo");
    }

    #[test]
    fn provider_from_config_works_when_primary_configured() {
        let mut cfg = Config::default();
        cfg.upsert_source_api_key(SourceId::OpenWeather, "KEY".to_string());
        cfg.set_primary_source(SourceId::OpenWeather);

        assert!(provider_from_config(&cfg).is_ok());
    }

    #[tokio::test]
    async fn unkeyed_primary_fails_over_to_mock() {
        let mut cfg = Config::default();
        cfg.set_primary_source(SourceId::OpenWeather);

        let provider = provider_from_config(&cfg).expect("missing key is not fatal");
        let london = Location::city("London");

        let err = provider
            .weather(Channel::Primary, &london)
            .await
            .unwrap_err();
        assert_eq!(err.channel(), Channel::Primary);
        assert!(err.to_string().contains("No API key configured"), "{err}");

        let synthetic = provider.weather(Channel::Fallback, &london).await.unwrap();
        assert_eq!(synthetic.current.temperature, 22.5);
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        let body = "é".repeat(300);
        let out = truncate_body(&body);
        assert!(out.ends_with("..."));
        assert_eq!(out.chars().count(), 203);
        assert_eq!(truncate_body("short"), "short");
    }

    #[tokio::test]
    async fn offline_provider_serves_both_channels() {
        let provider = ChannelProvider::offline();
        let location = Location::city("London");
        for channel in [Channel::Primary, Channel::Fallback] {
            assert!(provider.weather(channel, &location).await.is_ok());
            assert!(provider.air_quality(channel, &location).await.is_ok());
        }
    }
}

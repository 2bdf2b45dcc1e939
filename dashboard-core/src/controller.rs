//! Fetch orchestration and acquisition state.
//!
//! A fetch moves the controller to [`AcquisitionState::Loading`], asks the
//! provider for weather on the primary channel and, only if that fails, once on
//! the fallback channel. Weather is mandatory: losing both channels ends the
//! fetch in [`AcquisitionState::Failed`]. Air quality is best-effort and is
//! dropped from the result when both of its channels fail.
//!
//! Every fetch is stamped with a sequence token when it starts. Results are
//! written only if their token is still the latest one issued, so a slow fetch
//! started before a settings change can never overwrite the newer result.

use parking_lot::Mutex;
use std::{
    future::Future,
    sync::{Arc, Weak},
};
use tokio::sync::watch;

use crate::{
    error::{AcquisitionError, ProviderError},
    model::{AirQualitySample, WeatherResponse},
    provider::{Channel, Resource, WeatherProvider},
    settings::{AppSettings, SettingsStore},
};

#[derive(Debug, Clone, PartialEq, Default)]
pub enum AcquisitionState {
    #[default]
    Idle,
    Loading,
    Ready {
        weather: WeatherResponse,
        air_quality: Option<AirQualitySample>,
    },
    Failed(AcquisitionError),
}

impl AcquisitionState {
    pub fn is_loading(&self) -> bool {
        matches!(self, AcquisitionState::Loading)
    }

    pub fn error(&self) -> Option<&AcquisitionError> {
        match self {
            AcquisitionState::Failed(err) => Some(err),
            _ => None,
        }
    }

    pub fn weather(&self) -> Option<&WeatherResponse> {
        match self {
            AcquisitionState::Ready { weather, .. } => Some(weather),
            _ => None,
        }
    }

    pub fn air_quality(&self) -> Option<&AirQualitySample> {
        match self {
            AcquisitionState::Ready { air_quality, .. } => air_quality.as_ref(),
            _ => None,
        }
    }
}

/// Handed out by [`DataAcquisitionController::begin`]; identifies one fetch.
#[derive(Debug, Clone)]
pub struct FetchTicket {
    token: u64,
    settings: AppSettings,
}

impl FetchTicket {
    pub fn token(&self) -> u64 {
        self.token
    }

    pub fn settings(&self) -> &AppSettings {
        &self.settings
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    /// The result was written to the state.
    Applied,
    /// A newer fetch was started meanwhile; the result was dropped.
    Superseded,
}

#[derive(Debug)]
struct Ledger {
    latest: u64,
    settings: AppSettings,
    previous: Option<WeatherResponse>,
}

pub struct DataAcquisitionController {
    provider: Arc<dyn WeatherProvider>,
    ledger: Mutex<Ledger>,
    state: watch::Sender<AcquisitionState>,
}

impl std::fmt::Debug for DataAcquisitionController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DataAcquisitionController")
            .field("provider", &self.provider)
            .field("ledger", &*self.ledger.lock())
            .field("state", &*self.state.borrow())
            .finish()
    }
}

impl DataAcquisitionController {
    pub fn new(provider: Arc<dyn WeatherProvider>, settings: AppSettings) -> Self {
        let (state, _) = watch::channel(AcquisitionState::Idle);
        Self {
            provider,
            ledger: Mutex::new(Ledger {
                latest: 0,
                settings,
                previous: None,
            }),
            state,
        }
    }

    pub fn state(&self) -> AcquisitionState {
        self.state.borrow().clone()
    }

    /// Receiver that observes every state transition.
    pub fn watch(&self) -> watch::Receiver<AcquisitionState> {
        self.state.subscribe()
    }

    pub fn is_loading(&self) -> bool {
        self.state.borrow().is_loading()
    }

    pub fn error(&self) -> Option<AcquisitionError> {
        self.state.borrow().error().cloned()
    }

    /// Weather and air quality, only while the state is `Ready`.
    pub fn snapshot(&self) -> Option<(WeatherResponse, Option<AirQualitySample>)> {
        match &*self.state.borrow() {
            AcquisitionState::Ready {
                weather,
                air_quality,
            } => Some((weather.clone(), air_quality.clone())),
            _ => None,
        }
    }

    /// Last weather result that was applied, kept across later loads and
    /// failures.
    pub fn previous_snapshot(&self) -> Option<WeatherResponse> {
        self.ledger.lock().previous.clone()
    }

    /// Settings used by the most recent fetch.
    pub fn settings(&self) -> AppSettings {
        self.ledger.lock().settings.clone()
    }

    /// Start a fetch: issue a new token and enter `Loading` immediately.
    pub fn begin(&self, settings: &AppSettings) -> FetchTicket {
        let mut ledger = self.ledger.lock();
        ledger.latest += 1;
        ledger.settings = settings.clone();
        let token = ledger.latest;
        self.state.send_replace(AcquisitionState::Loading);

        tracing::info!(token, location = %settings.location, "fetch started");
        FetchTicket {
            token,
            settings: settings.clone(),
        }
    }

    /// Perform the acquisition for a ticket from [`begin`](Self::begin).
    pub async fn run(&self, ticket: FetchTicket) -> FetchOutcome {
        let next = self.acquire(&ticket.settings).await;
        self.commit(ticket.token, next)
    }

    pub async fn fetch(&self, settings: &AppSettings) -> FetchOutcome {
        let ticket = self.begin(settings);
        self.run(ticket).await
    }

    /// Re-run the whole sequence with the settings of the last fetch.
    pub async fn retry(&self) -> FetchOutcome {
        let settings = self.settings();
        self.fetch(&settings).await
    }

    /// Re-fetch whenever `store` reports a location or air-quality change.
    ///
    /// Each notification starts a fetch on the current Tokio runtime without
    /// waiting for earlier ones; stale results are discarded by token.
    pub fn attach(self: &Arc<Self>, store: &mut SettingsStore) {
        let controller: Weak<Self> = Arc::downgrade(self);
        store.subscribe(move |settings| {
            let Some(controller) = controller.upgrade() else {
                return;
            };
            let handle = match tokio::runtime::Handle::try_current() {
                Ok(handle) => handle,
                Err(err) => {
                    tracing::error!("cannot start fetch after settings change: {err}");
                    return;
                }
            };
            let ticket = controller.begin(settings);
            handle.spawn(async move {
                controller.run(ticket).await;
            });
        });
    }

    async fn acquire(&self, settings: &AppSettings) -> AcquisitionState {
        let provider = self.provider.as_ref();
        let location = &settings.location;

        let weather = match with_fallback(Resource::Weather, move |channel| {
            provider.weather(channel, location)
        })
        .await
        {
            Ok(weather) => weather,
            Err((primary, fallback)) => {
                let err = AcquisitionError::FallbackFailed {
                    primary: primary.to_string(),
                    fallback: fallback.to_string(),
                };
                tracing::error!("{err}");
                return AcquisitionState::Failed(err);
            }
        };

        let air_quality = if settings.enable_air_quality {
            match with_fallback(Resource::AirQuality, move |channel| {
                provider.air_quality(channel, location)
            })
            .await
            {
                Ok(sample) => Some(sample),
                Err((primary, fallback)) => {
                    let err = AcquisitionError::AirQualityUnavailable {
                        primary: primary.to_string(),
                        fallback: fallback.to_string(),
                    };
                    tracing::warn!("{err}");
                    None
                }
            }
        } else {
            None
        };

        AcquisitionState::Ready {
            weather,
            air_quality,
        }
    }

    fn commit(&self, token: u64, next: AcquisitionState) -> FetchOutcome {
        let mut ledger = self.ledger.lock();
        if token != ledger.latest {
            tracing::debug!(token, latest = ledger.latest, "discarding superseded fetch result");
            return FetchOutcome::Superseded;
        }

        if let AcquisitionState::Ready { weather, .. } = &next {
            ledger.previous = Some(weather.clone());
        }
        tracing::info!(
            token,
            ready = matches!(next, AcquisitionState::Ready { .. }),
            "fetch finished"
        );
        self.state.send_replace(next);
        FetchOutcome::Applied
    }
}

/// Primary attempt, then at most one fallback attempt if it failed.
async fn with_fallback<T, F, Fut>(
    resource: Resource,
    attempt: F,
) -> Result<T, (ProviderError, ProviderError)>
where
    F: Fn(Channel) -> Fut,
    Fut: Future<Output = Result<T, ProviderError>>,
{
    let primary = match attempt(Channel::Primary).await {
        Ok(value) => return Ok(value),
        Err(err) => err,
    };

    let unavailable = AcquisitionError::ProviderUnavailable {
        resource,
        reason: primary.to_string(),
    };
    tracing::warn!("{unavailable}; using fallback channel");

    attempt(Channel::Fallback)
        .await
        .map_err(|fallback| (primary, fallback))
}

//! HTTP data sources against a local mock server.

use dashboard_core::{
    AcquisitionState, AppSettings, Channel, ChannelProvider, Config, DataAcquisitionController,
    DataSource, Location, SourceId, TemperatureUnit, WeatherProvider,
    provider::{
        mock::MockSource,
        openmeteo::OpenMeteoSource,
        openweather::OpenWeatherSource,
        provider_from_config,
    },
};
use reqwest::Client;
use serde_json::json;
use std::sync::Arc;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{method, path, query_param},
};

// 2025-09-17T00:00:00Z
const DAY0: i64 = 1_758_067_200;
const HOUR: i64 = 3600;

fn ow_current() -> serde_json::Value {
    json!({
        "name": "London",
        "dt": DAY0 + 20 * HOUR,
        "main": { "temp": 15.0, "feels_like": 14.2, "humidity": 81 },
        "weather": [{ "description": "light rain", "icon": "09d" }],
        "wind": { "speed": 4.6 },
        "sys": { "country": "GB" }
    })
}

fn ow_entry(dt: i64, min: f64, max: f64, icon: &str) -> serde_json::Value {
    json!({
        "dt": dt,
        "main": { "temp": (min + max) / 2.0, "temp_min": min, "temp_max": max },
        "weather": [{ "description": format!("sky {icon}"), "icon": icon }]
    })
}

fn ow_forecast() -> serde_json::Value {
    json!({
        "city": { "name": "London", "country": "GB", "timezone": 0 },
        "list": [
            ow_entry(DAY0 + 21 * HOUR, 12.0, 13.0, "10n"),
            ow_entry(DAY0 + 24 * HOUR + 9 * HOUR, 11.0, 16.0, "03d"),
            ow_entry(DAY0 + 24 * HOUR + 12 * HOUR, 12.0, 18.5, "01d"),
            ow_entry(DAY0 + 48 * HOUR + 12 * HOUR, 9.5, 14.0, "10d"),
        ]
    })
}

async fn mount_openweather(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/data/2.5/weather"))
        .and(query_param("q", "London"))
        .and(query_param("appid", "KEY"))
        .and(query_param("units", "metric"))
        .respond_with(ResponseTemplate::new(200).set_body_json(ow_current()))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/data/2.5/forecast"))
        .respond_with(ResponseTemplate::new(200).set_body_json(ow_forecast()))
        .mount(server)
        .await;
}

#[tokio::test]
async fn openweather_current_and_daily_forecast() {
    let server = MockServer::start().await;
    mount_openweather(&server).await;

    let source = OpenWeatherSource::new("KEY".into(), Client::new()).with_base_url(server.uri());
    let response = source.weather(&Location::city("London")).await.unwrap();

    assert_eq!(response.current.temperature, 15.0);
    assert_eq!(response.current.humidity, 81);
    assert_eq!(response.current.icon, "09d");
    assert_eq!(response.current.city, "London");
    assert_eq!(response.current.country, "GB");

    assert_eq!(response.forecast.len(), 2);
    assert_eq!(response.forecast[0].date, "Tomorrow");
    assert_eq!(response.forecast[0].temperature_max, 18.5);
    assert_eq!(response.forecast[0].temperature_min, 11.0);
    assert_eq!(response.forecast[0].icon, "01d");
    assert_eq!(response.forecast[1].date, "Day After");
}

#[tokio::test]
async fn openweather_uses_coordinates_when_given() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/data/2.5/weather"))
        .and(query_param("lat", "52.52"))
        .and(query_param("lon", "13.41"))
        .respond_with(ResponseTemplate::new(200).set_body_json(ow_current()))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/data/2.5/forecast"))
        .respond_with(ResponseTemplate::new(200).set_body_json(ow_forecast()))
        .mount(&server)
        .await;

    let source = OpenWeatherSource::new("KEY".into(), Client::new()).with_base_url(server.uri());
    assert!(source.weather(&Location::coordinates(52.52, 13.41)).await.is_ok());
}

#[tokio::test]
async fn openweather_error_status_is_reported() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/data/2.5/weather"))
        .respond_with(ResponseTemplate::new(401).set_body_string(r#"{"cod":401,"message":"Invalid API key"}"#))
        .mount(&server)
        .await;

    let source = OpenWeatherSource::new("BAD".into(), Client::new()).with_base_url(server.uri());
    let err = source.weather(&Location::city("London")).await.unwrap_err();
    let msg = format!("{err:#}");
    assert!(msg.contains("401"), "{msg}");
    assert!(msg.contains("Invalid API key"), "{msg}");
}

#[tokio::test]
async fn openweather_has_no_air_quality() {
    let source = OpenWeatherSource::new("KEY".into(), Client::new());
    assert!(source.air_quality(&Location::city("London")).await.is_err());
}

async fn mount_openmeteo(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/v1/search"))
        .and(query_param("name", "Berlin"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": [{
                "name": "Berlin",
                "latitude": 52.52,
                "longitude": 13.41,
                "country": "Germany",
                "country_code": "DE"
            }]
        })))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/v1/forecast"))
        .and(query_param("latitude", "52.52"))
        .and(query_param("wind_speed_unit", "ms"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "latitude": 52.52,
            "longitude": 13.41,
            "timezone": "Europe/Berlin",
            "current": {
                "temperature_2m": 18.3,
                "relative_humidity_2m": 54.0,
                "wind_speed_10m": 2.7,
                "cloud_cover": 65.0,
                "rain": 0.0,
                "showers": 0.0,
                "snowfall": 0.0
            },
            "daily": {
                "time": ["2025-09-17", "2025-09-18", "2025-09-19", "2025-09-20"],
                "temperature_2m_max": [20.1, 22.4, 19.0, 17.2],
                "temperature_2m_min": [11.0, 12.3, 10.1, 8.8],
                "cloud_cover_mean": [40.0, 10.0, 90.0, 70.0],
                "rain_sum": [0.0, 0.0, 0.0, 4.5],
                "showers_sum": [0.0, 0.0, 0.0, 0.0],
                "snowfall_sum": [0.0, 0.0, 0.0, 0.0]
            }
        })))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/v1/air-quality"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "current": {
                "us_aqi": 74.6,
                "pm2_5": 23.1,
                "pm10": 31.0,
                "ozone": 61.0,
                "nitrogen_dioxide": 18.4,
                "sulphur_dioxide": 2.1,
                "carbon_monoxide": 210.0
            }
        })))
        .mount(server)
        .await;
}

#[tokio::test]
async fn openmeteo_geocodes_city_and_maps_conditions() {
    let server = MockServer::start().await;
    mount_openmeteo(&server).await;

    let source = OpenMeteoSource::new(Client::new()).with_base_url(server.uri());
    let response = source.weather(&Location::city("Berlin")).await.unwrap();

    assert_eq!(response.current.temperature, 18.3);
    assert_eq!(response.current.humidity, 54);
    assert_eq!(response.current.description, "Partly Cloudy");
    assert_eq!(response.current.icon, "⛅");
    assert_eq!(response.current.city, "Berlin");
    assert_eq!(response.current.country, "DE");

    let labels: Vec<_> = response.forecast.iter().map(|d| d.date.as_str()).collect();
    assert_eq!(labels, ["Tomorrow", "Day After", "Saturday"]);
    assert_eq!(response.forecast[0].icon, "☀️");
    assert_eq!(response.forecast[1].description, "Overcast");
    assert_eq!(response.forecast[2].description, "Rain");
}

#[tokio::test]
async fn openmeteo_coordinates_skip_geocoding() {
    let server = MockServer::start().await;
    mount_openmeteo(&server).await;

    let source = OpenMeteoSource::new(Client::new()).with_base_url(server.uri());
    let response = source
        .weather(&Location::coordinates(52.52, 13.41))
        .await
        .unwrap();

    assert_eq!(response.current.city, "52.52°N, 13.41°E");
    assert_eq!(response.current.country, "Europe/Berlin");
}

#[tokio::test]
async fn openmeteo_air_quality_uses_us_aqi() {
    let server = MockServer::start().await;
    mount_openmeteo(&server).await;

    let source = OpenMeteoSource::new(Client::new()).with_base_url(server.uri());
    let sample = source.air_quality(&Location::city("Berlin")).await.unwrap();

    assert_eq!(sample.aqi, 75);
    assert_eq!(sample.category, "Moderate");
    assert_eq!(sample.pm25, 23.1);
    assert_eq!(sample.co, 210.0);
}

#[tokio::test]
async fn openmeteo_unknown_city_is_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "generationtime_ms": 0.4 })))
        .mount(&server)
        .await;

    let source = OpenMeteoSource::new(Client::new()).with_base_url(server.uri());
    let err = source.weather(&Location::city("Atlantis")).await.unwrap_err();
    assert!(err.to_string().contains("No location found matching 'Atlantis'"));
}

#[tokio::test]
async fn channel_provider_routes_by_channel() {
    let server = MockServer::start().await;
    mount_openweather(&server).await;

    let primary = OpenWeatherSource::new("KEY".into(), Client::new()).with_base_url(server.uri());
    let provider = ChannelProvider::new(Box::new(primary), Box::new(MockSource));
    let london = Location::city("London");

    let real = provider.weather(Channel::Primary, &london).await.unwrap();
    let synthetic = provider.weather(Channel::Fallback, &london).await.unwrap();
    assert_eq!(real.current.temperature, 15.0);
    assert_eq!(synthetic.current.temperature, 22.5);

    let err = provider
        .air_quality(Channel::Primary, &london)
        .await
        .unwrap_err();
    assert_eq!(err.channel(), Channel::Primary);
    assert!(err.to_string().starts_with("`get_air_quality` failed"));
}

#[tokio::test]
async fn unreachable_primary_falls_back_to_synthetic_data() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let primary = OpenMeteoSource::new(Client::new()).with_base_url(server.uri());
    let provider = Arc::new(ChannelProvider::new(Box::new(primary), Box::new(MockSource)));
    let settings = AppSettings {
        location: Location::city("London"),
        temperature_unit: TemperatureUnit::Celsius,
        enable_air_quality: true,
    };
    let ctrl = DataAcquisitionController::new(provider, settings.clone());

    ctrl.fetch(&settings).await;

    let AcquisitionState::Ready {
        weather,
        air_quality,
    } = ctrl.state()
    else {
        panic!("expected ready state, got {:?}", ctrl.state());
    };
    assert_eq!(weather.current.temperature, 22.5);
    assert_eq!(weather.current.city, "London");
    assert_eq!(air_quality.map(|a| a.aqi), Some(45));
}

#[tokio::test]
async fn primary_without_api_key_still_shows_synthetic_data() {
    let mut config = Config::default();
    config.set_primary_source(SourceId::OpenWeather);
    let provider = Arc::new(provider_from_config(&config).unwrap());

    let settings = AppSettings::default();
    let ctrl = DataAcquisitionController::new(provider, settings.clone());
    ctrl.fetch(&settings).await;

    let AcquisitionState::Ready {
        weather,
        air_quality,
    } = ctrl.state()
    else {
        panic!("expected ready state, got {:?}", ctrl.state());
    };
    assert_eq!(weather.current.temperature, 22.5);
    assert_eq!(weather.current.description, "Partly cloudy");
    assert_eq!(air_quality.map(|a| a.aqi), Some(45));
}

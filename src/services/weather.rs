// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Venue weather lookup.
//!
//! Weather is best-effort: a failed or slow fetch yields `None` and never
//! blocks anything else. Readings are cached for a TTL so rapid logging
//! does not hit the forecast API once per throw. A failed fetch is
//! remembered for a shorter window so an outage costs one timeout per
//! window rather than one per score.

use async_trait::async_trait;
use chrono::Utc;
use serde::Deserialize;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

use crate::config::Config;
use crate::error::WeatherError;
use crate::models::WeatherSnapshot;

/// Source of the latest weather reading.
#[async_trait]
pub trait WeatherSnapshotProvider: Send + Sync {
    /// Latest reading, or `None` when weather is unavailable.
    async fn latest(&self) -> Option<WeatherSnapshot>;
}

/// How long a failed fetch suppresses further attempts (capped at the TTL).
const FAILURE_BACKOFF: Duration = Duration::from_secs(60);

/// Open-Meteo forecast client with a TTL cache.
pub struct OpenMeteoWeather {
    http: reqwest::Client,
    url: String,
    latitude: f64,
    longitude: f64,
    ttl: Duration,
    retry_after: Duration,
    /// Last reading, or when the last attempt failed. Held across the
    /// fetch so concurrent callers share one request.
    cache: Mutex<Option<Result<WeatherSnapshot, Instant>>>,
}

impl OpenMeteoWeather {
    pub fn new(config: &Config) -> Result<Self, WeatherError> {
        let http = reqwest::Client::builder()
            .timeout(config.remote_timeout)
            .build()
            .map_err(|e| WeatherError::Request(e.to_string()))?;

        Ok(Self {
            http,
            url: config.weather_url.clone(),
            latitude: config.venue_latitude,
            longitude: config.venue_longitude,
            ttl: config.weather_ttl,
            retry_after: FAILURE_BACKOFF.min(config.weather_ttl),
            cache: Mutex::new(None),
        })
    }

    async fn fetch(&self) -> Result<WeatherSnapshot, WeatherError> {
        let response = self
            .http
            .get(&self.url)
            .query(&[
                ("latitude", self.latitude.to_string()),
                ("longitude", self.longitude.to_string()),
                (
                    "current",
                    "temperature_2m,apparent_temperature,wind_speed_10m,wind_direction_10m,wind_gusts_10m"
                        .to_string(),
                ),
                ("temperature_unit", "fahrenheit".to_string()),
                ("wind_speed_unit", "mph".to_string()),
            ])
            .send()
            .await
            .map_err(|e| WeatherError::Request(e.to_string()))?;

        if !response.status().is_success() {
            return Err(WeatherError::Request(format!("HTTP {}", response.status())));
        }

        let forecast: ForecastResponse = response
            .json()
            .await
            .map_err(|e| WeatherError::Decode(e.to_string()))?;
        Ok(forecast.current.into_snapshot())
    }
}

#[async_trait]
impl WeatherSnapshotProvider for OpenMeteoWeather {
    async fn latest(&self) -> Option<WeatherSnapshot> {
        let mut cache = self.cache.lock().await;

        match cache.as_ref() {
            Some(Ok(cached)) if cached.is_fresh(self.ttl, Utc::now()) => {
                return Some(cached.clone());
            }
            Some(Err(failed_at)) if failed_at.elapsed() < self.retry_after => return None,
            _ => {}
        }

        match self.fetch().await {
            Ok(snapshot) => {
                tracing::debug!(temp = snapshot.temp, wind = snapshot.wind_speed, "Weather refreshed");
                *cache = Some(Ok(snapshot.clone()));
                Some(snapshot)
            }
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    retry_secs = self.retry_after.as_secs(),
                    "Weather unavailable, continuing without it"
                );
                *cache = Some(Err(Instant::now()));
                None
            }
        }
    }
}

/// `current` block of an Open-Meteo forecast.
#[derive(Debug, Deserialize)]
struct ForecastResponse {
    current: CurrentConditions,
}

#[derive(Debug, Deserialize)]
struct CurrentConditions {
    temperature_2m: f64,
    apparent_temperature: f64,
    wind_speed_10m: f64,
    wind_direction_10m: f64,
    wind_gusts_10m: f64,
}

impl CurrentConditions {
    fn into_snapshot(self) -> WeatherSnapshot {
        WeatherSnapshot {
            temp: self.temperature_2m,
            feels_like: self.apparent_temperature,
            wind_speed: self.wind_speed_10m,
            wind_gust: self.wind_gusts_10m,
            wind_dir: self.wind_direction_10m,
            fetched_at: Utc::now(),
        }
    }
}

/// Provider returning a fixed reading (or none). Counts calls.
#[derive(Default)]
pub struct StaticWeather {
    snapshot: Option<WeatherSnapshot>,
    calls: AtomicUsize,
}

impl StaticWeather {
    pub fn new(snapshot: Option<WeatherSnapshot>) -> Self {
        Self {
            snapshot,
            calls: AtomicUsize::new(0),
        }
    }

    /// Provider whose upstream is down.
    pub fn unavailable() -> Self {
        Self::new(None)
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl WeatherSnapshotProvider for StaticWeather {
    async fn latest(&self) -> Option<WeatherSnapshot> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.snapshot.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{http::StatusCode, routing::get, Json, Router};
    use std::sync::Arc;

    #[test]
    fn test_parse_open_meteo_current() {
        let forecast: ForecastResponse = serde_json::from_str(
            r#"{"latitude": 38.25, "longitude": -77.5,
                "current": {"time": "2026-06-01T18:00", "interval": 900,
                            "temperature_2m": 71.3, "apparent_temperature": 70.1,
                            "wind_speed_10m": 8.2, "wind_direction_10m": 225,
                            "wind_gusts_10m": 17.4}}"#,
        )
        .unwrap();

        let snapshot = forecast.current.into_snapshot();
        assert_eq!(snapshot.temp, 71.3);
        assert_eq!(snapshot.feels_like, 70.1);
        assert_eq!(snapshot.wind_dir, 225.0);
        assert_eq!(snapshot.wind_gust, 17.4);
    }

    #[test]
    fn test_snapshot_freshness() {
        let snapshot = WeatherSnapshot {
            temp: 60.0,
            feels_like: 58.0,
            wind_speed: 5.0,
            wind_gust: 9.0,
            wind_dir: 180.0,
            fetched_at: Utc::now() - chrono::Duration::seconds(601),
        };
        assert!(!snapshot.is_fresh(Duration::from_secs(600), Utc::now()));
        assert!(snapshot.is_fresh(Duration::from_secs(900), Utc::now()));
    }

    /// Local forecast endpoint answering with `status`. Returns its URL and hit counter.
    async fn forecast_stub(status: StatusCode) -> (String, Arc<AtomicUsize>) {
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();
        let app = Router::new().route(
            "/forecast",
            get(move || {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    (
                        status,
                        Json(serde_json::json!({
                            "current": {
                                "temperature_2m": 68.0, "apparent_temperature": 67.5,
                                "wind_speed_10m": 9.0, "wind_direction_10m": 300,
                                "wind_gusts_10m": 15.0
                            }
                        })),
                    )
                }
            }),
        );

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, app).await });
        (format!("http://{}/forecast", addr), hits)
    }

    fn weather_for(url: String) -> OpenMeteoWeather {
        let config = Config {
            weather_url: url,
            remote_timeout: Duration::from_secs(2),
            weather_ttl: Duration::from_secs(600),
            ..Config::default()
        };
        OpenMeteoWeather::new(&config).unwrap()
    }

    #[tokio::test]
    async fn test_reading_cached_within_ttl() {
        let (url, hits) = forecast_stub(StatusCode::OK).await;
        let weather = weather_for(url);

        let first = weather.latest().await.unwrap();
        let second = weather.latest().await.unwrap();

        assert_eq!(first, second);
        assert_eq!(first.temp, 68.0);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failure_is_remembered() {
        let (url, hits) = forecast_stub(StatusCode::INTERNAL_SERVER_ERROR).await;
        let weather = weather_for(url);

        assert_eq!(weather.latest().await, None);
        assert_eq!(weather.latest().await, None);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_stale_reading_is_refetched() {
        let (url, hits) = forecast_stub(StatusCode::OK).await;
        let weather = weather_for(url);
        weather.latest().await.unwrap();

        // Age the cached reading past the TTL.
        if let Some(Ok(cached)) = weather.cache.lock().await.as_mut() {
            cached.fetched_at = Utc::now() - chrono::Duration::seconds(601);
        }
        weather.latest().await.unwrap();

        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_yields_none() {
        let config = Config {
            weather_url: "http://127.0.0.1:9/forecast".to_string(),
            remote_timeout: Duration::from_millis(200),
            ..Config::default()
        };
        let weather = OpenMeteoWeather::new(&config).unwrap();
        assert_eq!(weather.latest().await, None);
    }
}

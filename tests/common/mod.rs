// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use axum::body::Body;
use axum::http::{header, Request, Response};
use mks_tracker::config::Config;
use mks_tracker::db::MemoryDataStore;
use mks_tracker::models::WeatherSnapshot;
use mks_tracker::routes::create_router;
use mks_tracker::services::{MemoryIdentity, StaticWeather};
use mks_tracker::AppState;
use std::collections::BTreeMap;
use std::sync::Arc;

pub const EMAIL: &str = "player@example.com";
pub const PASSWORD: &str = "chains";

/// Remote collaborators shared by every "process" started in a test.
pub struct Remotes {
    pub identity: Arc<MemoryIdentity>,
    pub db: Arc<MemoryDataStore>,
    pub weather: Arc<StaticWeather>,
}

impl Remotes {
    #[allow(dead_code)]
    pub fn new() -> Self {
        Self::with_weather(None)
    }

    pub fn with_weather(snapshot: Option<WeatherSnapshot>) -> Self {
        let identity = Arc::new(MemoryIdentity::new());
        identity.add_user(EMAIL, PASSWORD);
        Self {
            identity,
            db: Arc::new(MemoryDataStore::new()),
            weather: Arc::new(StaticWeather::new(snapshot)),
        }
    }

    /// A freshly started server process: no in-memory sessions, same remotes.
    pub fn start_process(&self) -> Arc<AppState> {
        Arc::new(AppState::new(
            Config::default(),
            self.identity.clone(),
            self.db.clone(),
            self.weather.clone(),
        ))
    }
}

/// Create a test app over in-memory collaborators.
/// Returns the router and the remotes behind it.
#[allow(dead_code)]
pub fn create_test_app() -> (axum::Router, Remotes) {
    let remotes = Remotes::new();
    (create_router(remotes.start_process()), remotes)
}

/// Minimal browser cookie jar: remembers `Set-Cookie` and replays it.
#[allow(dead_code)]
#[derive(Default)]
pub struct Browser {
    pub cookies: BTreeMap<String, String>,
}

#[allow(dead_code)]
impl Browser {
    pub fn request(&self, method: &str, uri: &str, body: Option<serde_json::Value>) -> Request<Body> {
        let mut builder = Request::builder().method(method).uri(uri);
        if !self.cookies.is_empty() {
            let cookie = self
                .cookies
                .iter()
                .map(|(name, value)| format!("{name}={value}"))
                .collect::<Vec<_>>()
                .join("; ");
            builder = builder.header(header::COOKIE, cookie);
        }
        match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        }
    }

    /// Apply the response's `Set-Cookie` headers.
    pub fn absorb(&mut self, response: &Response<Body>) {
        for value in response.headers().get_all(header::SET_COOKIE) {
            let raw = value.to_str().unwrap();
            let (pair, attributes) = raw.split_once(';').unwrap_or((raw, ""));
            let (name, value) = pair.split_once('=').unwrap();
            let removed = value.is_empty()
                || attributes
                    .split(';')
                    .any(|a| a.trim().eq_ignore_ascii_case("Max-Age=0"));
            if removed {
                self.cookies.remove(name.trim());
            } else {
                self.cookies
                    .insert(name.trim().to_string(), value.trim().to_string());
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.cookies.get(name).map(String::as_str)
    }
}

/// Collect a response body as JSON.
#[allow(dead_code)]
pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

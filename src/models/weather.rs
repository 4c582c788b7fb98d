//! Weather reading attached to score entries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Point-in-time weather at the venue (°F, mph, degrees).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherSnapshot {
    pub temp: f64,
    pub feels_like: f64,
    pub wind_speed: f64,
    pub wind_gust: f64,
    /// Direction the wind blows from, in degrees
    pub wind_dir: f64,
    pub fetched_at: DateTime<Utc>,
}

impl WeatherSnapshot {
    /// Whether the reading is still within `ttl` of when it was fetched.
    pub fn is_fresh(&self, ttl: std::time::Duration, now: DateTime<Utc>) -> bool {
        match chrono::Duration::from_std(ttl) {
            Ok(ttl) => now < self.fetched_at + ttl,
            Err(_) => true,
        }
    }
}

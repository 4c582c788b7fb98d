//! Application configuration loaded from environment variables.
//!
//! Missing Supabase credentials are not fatal: the server starts in offline
//! mode where login and all saves fail with an explicit offline error.

use chrono::{FixedOffset, Offset, Utc};
use std::env;
use std::time::Duration;

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Supabase project URL (`https://<ref>.supabase.co`)
    pub supabase_url: Option<String>,
    /// Supabase anon/public API key
    pub supabase_key: Option<String>,
    /// Server port
    pub port: u16,
    /// Set the `Secure` attribute on token cookies
    pub cookie_secure: bool,
    /// Upper bound for every call to a remote collaborator
    pub remote_timeout: Duration,
    /// How long a weather reading is reused
    pub weather_ttl: Duration,
    /// Forecast endpoint
    pub weather_url: String,
    pub venue_latitude: f64,
    pub venue_longitude: f64,
    /// Fixed venue time zone used to stamp score entries
    pub venue_offset: FixedOffset,
}

impl Default for Config {
    /// Default config for testing only.
    fn default() -> Self {
        Self {
            supabase_url: None,
            supabase_key: None,
            port: 8080,
            cookie_secure: false,
            remote_timeout: Duration::from_secs(DEFAULT_REMOTE_TIMEOUT_SECS),
            weather_ttl: Duration::from_secs(DEFAULT_WEATHER_TTL_SECS),
            weather_url: DEFAULT_WEATHER_URL.to_string(),
            venue_latitude: DEFAULT_VENUE_LATITUDE,
            venue_longitude: DEFAULT_VENUE_LONGITUDE,
            venue_offset: default_venue_offset(),
        }
    }
}

const DEFAULT_REMOTE_TIMEOUT_SECS: u64 = 10;
const DEFAULT_WEATHER_TTL_SECS: u64 = 600;
const DEFAULT_WEATHER_URL: &str = "https://api.open-meteo.com/v1/forecast";
// Loriella Park, Fredericksburg VA
const DEFAULT_VENUE_LATITUDE: f64 = 38.2478;
const DEFAULT_VENUE_LONGITUDE: f64 = -77.5097;
const DEFAULT_VENUE_UTC_OFFSET_SECS: i32 = -5 * 3600;

fn default_venue_offset() -> FixedOffset {
    FixedOffset::east_opt(DEFAULT_VENUE_UTC_OFFSET_SECS).unwrap_or_else(|| Utc.fix())
}

impl Config {
    /// Load configuration from environment variables (and `.env` if present).
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let supabase_url =
            non_empty_var("SUPABASE_URL").map(|u| u.trim_end_matches('/').to_string());
        let supabase_key = non_empty_var("SUPABASE_KEY");

        let venue_offset = match non_empty_var("VENUE_UTC_OFFSET") {
            Some(raw) => match parse_utc_offset(&raw) {
                Some(offset) => offset,
                None => return Err(ConfigError::Invalid("VENUE_UTC_OFFSET", raw)),
            },
            None => default_venue_offset(),
        };

        Ok(Self {
            supabase_url,
            supabase_key,
            port: parse_var("PORT")?.unwrap_or(8080),
            cookie_secure: parse_var("COOKIE_SECURE")?.unwrap_or(false),
            remote_timeout: Duration::from_secs(
                parse_var("REMOTE_TIMEOUT_SECS")?.unwrap_or(DEFAULT_REMOTE_TIMEOUT_SECS),
            ),
            weather_ttl: Duration::from_secs(
                parse_var("WEATHER_TTL_SECS")?.unwrap_or(DEFAULT_WEATHER_TTL_SECS),
            ),
            weather_url: non_empty_var("WEATHER_URL")
                .unwrap_or_else(|| DEFAULT_WEATHER_URL.to_string()),
            venue_latitude: parse_var("VENUE_LATITUDE")?.unwrap_or(DEFAULT_VENUE_LATITUDE),
            venue_longitude: parse_var("VENUE_LONGITUDE")?.unwrap_or(DEFAULT_VENUE_LONGITUDE),
            venue_offset,
        })
    }

    /// True when the Supabase secrets are missing.
    pub fn offline(&self) -> bool {
        self.supabase_url.is_none() || self.supabase_key.is_none()
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_var<T: std::str::FromStr>(name: &'static str) -> Result<Option<T>, ConfigError> {
    match non_empty_var(name) {
        Some(raw) => raw
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::Invalid(name, raw)),
        None => Ok(None),
    }
}

/// Parse `+HH:MM` / `-HH:MM` into a fixed offset.
pub fn parse_utc_offset(raw: &str) -> Option<FixedOffset> {
    let (sign, rest) = match raw.as_bytes().first()? {
        b'+' => (1, &raw[1..]),
        b'-' => (-1, &raw[1..]),
        _ => (1, raw),
    };
    let (hours, minutes) = rest.split_once(':').unwrap_or((rest, "0"));
    let hours: i32 = hours.parse().ok()?;
    let minutes: i32 = minutes.parse().ok()?;
    if !(0..=14).contains(&hours) || !(0..60).contains(&minutes) {
        return None;
    }
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}: {1}")]
    Invalid(&'static str, String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_utc_offset() {
        assert_eq!(
            parse_utc_offset("-05:00"),
            FixedOffset::west_opt(5 * 3600)
        );
        assert_eq!(
            parse_utc_offset("+05:30"),
            FixedOffset::east_opt(5 * 3600 + 30 * 60)
        );
        assert_eq!(parse_utc_offset("02"), FixedOffset::east_opt(2 * 3600));
        assert_eq!(parse_utc_offset("EST"), None);
        assert_eq!(parse_utc_offset("+25:00"), None);
        assert_eq!(parse_utc_offset(""), None);
    }

    #[test]
    fn test_default_config_is_offline() {
        let config = Config::default();
        assert!(config.offline());
        assert_eq!(config.weather_ttl, Duration::from_secs(600));
        assert_eq!(config.venue_offset.local_minus_utc(), -5 * 3600);
    }
}

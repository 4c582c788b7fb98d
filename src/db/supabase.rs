// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Supabase PostgREST client with typed operations.
//!
//! Provides high-level operations for:
//! - Rounds (start, lookup by id, history)
//! - Practice notes (score entries, per-hole and per-layout queries)
//!
//! PostgREST answers a filtered select with an array and a
//! `return=representation` insert with either an array or a single object
//! depending on headers. Both shapes are folded into one optional row here so
//! callers never see the ambiguity.

use async_trait::async_trait;
use serde::de::{DeserializeOwned, Error as _};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeSet;
use std::time::Duration;

use crate::db::{tables, RemoteDataStore};
use crate::error::PersistenceError;
use crate::models::score::split_stored_notes;
use crate::models::{Layout, NewRound, PracticeNote, Round, ScoreEntry, Session};

const ROUND_COLUMNS: &str = "id,name,layout,selected_discs,created_at";

/// Supabase database client.
#[derive(Clone)]
pub struct SupabaseDb {
    client: Option<RestClient>,
}

#[derive(Clone)]
struct RestClient {
    http: reqwest::Client,
    rest_url: String,
    api_key: String,
}

impl SupabaseDb {
    /// Create a client for the project at `url` (`https://<ref>.supabase.co`).
    pub fn new(url: &str, api_key: &str, timeout: Duration) -> Result<Self, PersistenceError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| PersistenceError::Unavailable(format!("HTTP client: {}", e)))?;

        tracing::info!(url, "Supabase data store configured");

        Ok(Self {
            client: Some(RestClient {
                http,
                rest_url: format!("{}/rest/v1", url.trim_end_matches('/')),
                api_key: api_key.to_string(),
            }),
        })
    }

    /// Client used when Supabase secrets are missing.
    ///
    /// All operations return `PersistenceError::Offline`.
    pub fn offline() -> Self {
        Self { client: None }
    }

    /// Helper to get the client or return an error if offline.
    fn get_client(&self) -> Result<&RestClient, PersistenceError> {
        self.client.as_ref().ok_or(PersistenceError::Offline)
    }
}

impl RestClient {
    fn request(
        &self,
        method: reqwest::Method,
        table: &str,
        session: &Session,
    ) -> reqwest::RequestBuilder {
        self.http
            .request(method, format!("{}/{}", self.rest_url, table))
            .header("apikey", &self.api_key)
            .bearer_auth(&session.access_token)
    }

    async fn select<T: DeserializeOwned>(
        &self,
        table: &str,
        session: &Session,
        query: &[(&str, String)],
    ) -> Result<Vec<T>, PersistenceError> {
        let response = self
            .request(reqwest::Method::GET, table, session)
            .query(query)
            .send()
            .await
            .map_err(transport_error)?;

        let rows: Option<OneOrMany<T>> = check_response_json(response).await?;
        Ok(rows.map(OneOrMany::into_vec).unwrap_or_default())
    }

    async fn insert<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        table: &str,
        session: &Session,
        body: &B,
    ) -> Result<T, PersistenceError> {
        let response = self
            .request(reqwest::Method::POST, table, session)
            .header("Prefer", "return=representation")
            .json(body)
            .send()
            .await
            .map_err(transport_error)?;

        let rows: Option<OneOrMany<T>> = check_response_json(response).await?;
        rows.and_then(OneOrMany::into_first)
            .ok_or_else(|| PersistenceError::Decode(format!("insert into {} returned no row", table)))
    }
}

#[async_trait]
impl RemoteDataStore for SupabaseDb {
    async fn insert_round(
        &self,
        session: &Session,
        round: &NewRound,
    ) -> Result<Round, PersistenceError> {
        let row: RoundRow = self
            .get_client()?
            .insert(tables::ROUNDS, session, round)
            .await?;
        Ok(row.into())
    }

    async fn fetch_round(
        &self,
        session: &Session,
        round_id: &str,
    ) -> Result<Option<Round>, PersistenceError> {
        let rows: Vec<RoundRow> = self
            .get_client()?
            .select(
                tables::ROUNDS,
                session,
                &[
                    ("select", ROUND_COLUMNS.to_string()),
                    ("id", format!("eq.{}", round_id)),
                    ("limit", "1".to_string()),
                ],
            )
            .await?;
        Ok(rows.into_iter().next().map(Round::from))
    }

    async fn list_rounds(&self, session: &Session) -> Result<Vec<Round>, PersistenceError> {
        let rows: Vec<RoundRow> = self
            .get_client()?
            .select(
                tables::ROUNDS,
                session,
                &[
                    ("select", ROUND_COLUMNS.to_string()),
                    ("order", "created_at.desc".to_string()),
                ],
            )
            .await?;
        Ok(rows.into_iter().map(Round::from).collect())
    }

    async fn insert_score_entry(
        &self,
        session: &Session,
        entry: &ScoreEntry,
    ) -> Result<PracticeNote, PersistenceError> {
        let row: NoteRow = self
            .get_client()?
            .insert(tables::PRACTICE_NOTES, session, &ScoreRow::from(entry))
            .await?;
        Ok(row.into())
    }

    async fn latest_note(
        &self,
        session: &Session,
        hole_number: u8,
        layout: Layout,
    ) -> Result<Option<PracticeNote>, PersistenceError> {
        let rows: Vec<NoteRow> = self
            .get_client()?
            .select(
                tables::PRACTICE_NOTES,
                session,
                &[
                    ("select", "*".to_string()),
                    ("hole_number", format!("eq.{}", hole_number)),
                    ("layout", format!("eq.{}", layout.as_str())),
                    ("order", "created_at.desc".to_string()),
                    ("limit", "1".to_string()),
                ],
            )
            .await?;
        Ok(rows.into_iter().next().map(PracticeNote::from))
    }

    async fn notes_for_layout(
        &self,
        session: &Session,
        layout: Layout,
    ) -> Result<Vec<PracticeNote>, PersistenceError> {
        let rows: Vec<NoteRow> = self
            .get_client()?
            .select(
                tables::PRACTICE_NOTES,
                session,
                &[
                    ("select", "*".to_string()),
                    ("layout", format!("eq.{}", layout.as_str())),
                    ("order", "hole_number".to_string()),
                ],
            )
            .await?;
        Ok(rows.into_iter().map(PracticeNote::from).collect())
    }

    async fn notes_for_round(
        &self,
        session: &Session,
        round_id: &str,
    ) -> Result<Vec<PracticeNote>, PersistenceError> {
        let rows: Vec<NoteRow> = self
            .get_client()?
            .select(
                tables::PRACTICE_NOTES,
                session,
                &[
                    ("select", "*".to_string()),
                    ("round_id", format!("eq.{}", round_id)),
                    ("order", "hole_number,created_at".to_string()),
                ],
            )
            .await?;
        Ok(rows.into_iter().map(PracticeNote::from).collect())
    }
}

// ─── Response handling ───────────────────────────────────────

fn transport_error(e: reqwest::Error) -> PersistenceError {
    if e.is_timeout() {
        PersistenceError::Unavailable("request timed out".to_string())
    } else {
        PersistenceError::Unavailable(e.to_string())
    }
}

/// Check response status and parse the JSON body.
async fn check_response_json<T: DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, PersistenceError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        let msg = format!("HTTP {}: {}", status, body);
        return Err(if status.is_server_error() {
            PersistenceError::Unavailable(msg)
        } else {
            PersistenceError::Rejected(msg)
        });
    }

    response
        .json()
        .await
        .map_err(|e| PersistenceError::Decode(format!("JSON parse error: {}", e)))
}

/// A PostgREST payload that is either a row or a list of rows.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum OneOrMany<T> {
    Many(Vec<T>),
    One(T),
}

impl<T> OneOrMany<T> {
    fn into_vec(self) -> Vec<T> {
        match self {
            OneOrMany::Many(rows) => rows,
            OneOrMany::One(row) => vec![row],
        }
    }

    fn into_first(self) -> Option<T> {
        self.into_vec().into_iter().next()
    }
}

/// Ids may be uuids (strings) or bigint identities (numbers).
fn de_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    de_opt_id(deserializer)?.ok_or_else(|| D::Error::custom("missing id"))
}

fn de_opt_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::Null => Ok(None),
        serde_json::Value::String(s) => Ok(Some(s)),
        serde_json::Value::Number(n) => Ok(Some(n.to_string())),
        other => Err(D::Error::custom(format!("unexpected id: {}", other))),
    }
}

// ─── Row types ───────────────────────────────────────────────

/// Row of the `rounds` table.
#[derive(Debug, Deserialize)]
struct RoundRow {
    #[serde(deserialize_with = "de_id")]
    id: String,
    #[serde(default)]
    name: Option<String>,
    layout: Layout,
    #[serde(default)]
    selected_discs: Option<Vec<String>>,
    #[serde(default)]
    created_at: Option<String>,
}

impl From<RoundRow> for Round {
    fn from(row: RoundRow) -> Self {
        Round {
            name: row
                .name
                .unwrap_or_else(|| format!("{} round", row.layout.short_name())),
            id: Some(row.id),
            layout: row.layout,
            selected_discs: row
                .selected_discs
                .unwrap_or_default()
                .into_iter()
                .collect::<BTreeSet<_>>(),
            created_at: row.created_at.unwrap_or_default(),
            ended: false,
        }
    }
}

/// Insert payload for the `practice_notes` table.
#[derive(Debug, Serialize)]
struct ScoreRow<'a> {
    round_id: Option<&'a str>,
    hole_number: u8,
    layout: Layout,
    disc_used: &'a str,
    strokes: u8,
    result_rating: u8,
    notes: String,
    temperature: Option<f64>,
    wind_speed: Option<f64>,
    wind_gust: Option<f64>,
    wind_direction: Option<f64>,
    created_at: &'a str,
}

impl<'a> From<&'a ScoreEntry> for ScoreRow<'a> {
    fn from(entry: &'a ScoreEntry) -> Self {
        let weather = entry.weather.as_ref();
        Self {
            round_id: entry.round_id.as_deref(),
            hole_number: entry.hole_number,
            layout: entry.layout,
            disc_used: &entry.disc_used,
            strokes: entry.strokes,
            result_rating: entry.rating,
            notes: entry.stored_notes(),
            temperature: weather.map(|w| w.temp),
            wind_speed: weather.map(|w| w.wind_speed),
            wind_gust: weather.map(|w| w.wind_gust),
            wind_direction: weather.map(|w| w.wind_dir),
            created_at: &entry.created_at,
        }
    }
}

/// Row of the `practice_notes` table.
#[derive(Debug, Deserialize)]
struct NoteRow {
    #[serde(default, deserialize_with = "de_opt_id")]
    id: Option<String>,
    #[serde(default, deserialize_with = "de_opt_id")]
    round_id: Option<String>,
    hole_number: u8,
    layout: Layout,
    disc_used: String,
    #[serde(default)]
    strokes: Option<u8>,
    #[serde(default)]
    result_rating: Option<u8>,
    #[serde(default)]
    notes: Option<String>,
    #[serde(default)]
    created_at: Option<String>,
}

impl From<NoteRow> for PracticeNote {
    fn from(row: NoteRow) -> Self {
        let (shot_shape, notes) = split_stored_notes(row.notes.as_deref().unwrap_or_default());
        PracticeNote {
            id: row.id,
            round_id: row.round_id,
            hole_number: row.hole_number,
            layout: row.layout,
            disc_used: row.disc_used,
            strokes: row.strokes,
            rating: row.result_rating,
            shot_shape,
            notes,
            created_at: row.created_at.unwrap_or_default(),
        }
    }
}

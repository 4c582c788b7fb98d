// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! HTTP route handlers.
//!
//! Each request is one interaction: the cookie jar is wrapped as the
//! `TokenStore`, the engine reconciles from it, and the (possibly
//! updated) jar goes back out with the response, error or not.

pub mod api;
pub mod auth;

use crate::error::{AppError, Result};
use crate::models::{Layout, Round};
use crate::services::{Action, PracticeState};
use crate::time_utils::format_utc_rfc3339;
use crate::token_store::CookieTokenStore;
use crate::AppState;
use axum::{routing::get, Json, Router};
use axum_extra::extract::cookie::CookieJar;
use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

/// Handler result that always carries the cookie jar back to the client.
pub type JarResult<T> = std::result::Result<(CookieJar, Json<T>), (CookieJar, AppError)>;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub build_id: String,
    /// False when Supabase secrets are missing
    pub online: bool,
}

/// Snapshot of the reconciled state, as the UI renders it.
#[derive(Debug, Serialize)]
pub struct StateView {
    pub logged_in: bool,
    pub email: Option<String>,
    /// UTC expiry of the current access token
    pub session_expires_at: Option<String>,
    pub round: Option<Round>,
    /// Layout of the active round
    pub layout: Option<Layout>,
    pub hole: u8,
    /// Why the session could not be restored, when it could not
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auth_notice: Option<String>,
    /// Why the persisted round could not be restored, when it could not
    #[serde(skip_serializing_if = "Option::is_none")]
    pub round_notice: Option<String>,
    pub server_time: String,
}

impl From<&PracticeState> for StateView {
    fn from(state: &PracticeState) -> Self {
        Self {
            logged_in: state.is_logged_in(),
            email: state.session.as_ref().and_then(|s| s.email.clone()),
            session_expires_at: state
                .session
                .as_ref()
                .map(|s| format_utc_rfc3339(s.expires_at)),
            round: state.round.clone(),
            layout: state.round.as_ref().map(|r| r.layout),
            hole: state.hole.hole(),
            auth_notice: state.auth_error.as_ref().map(ToString::to_string),
            round_notice: state.round_error.as_ref().map(ToString::to_string),
            server_time: format_utc_rfc3339(Utc::now()),
        }
    }
}

/// Health check response
async fn health_check(
    axum::extract::State(state): axum::extract::State<Arc<AppState>>,
) -> Json<HealthResponse> {
    let build_id = option_env!("BUILD_ID").unwrap_or("unknown").to_string();
    Json(HealthResponse {
        status: "ok".to_string(),
        build_id,
        online: !state.config.offline(),
    })
}

/// Wrap the request's cookies as the token store for this interaction.
pub(crate) fn token_store(app: &AppState, jar: CookieJar) -> CookieTokenStore {
    CookieTokenStore::new(jar, app.config.cookie_secure)
}

/// Pair a handler result with the store's pending cookies.
pub(crate) fn respond<T>(store: CookieTokenStore, result: Result<T>) -> JarResult<T> {
    let jar = store.into_jar();
    match result {
        Ok(value) => Ok((jar, Json(value))),
        Err(e) => Err((jar, e)),
    }
}

/// Reconcile, apply one action and answer with the resulting state.
pub(crate) async fn run_action(app: &AppState, jar: CookieJar, action: Action) -> JarResult<StateView> {
    let mut store = token_store(app, jar);
    let (state, outcome) = app.engine.interact(&mut store, action).await;
    respond(store, outcome.map(|_| StateView::from(&state)))
}

/// Build the complete router with all routes.
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .merge(auth::routes())
        .merge(api::routes())
        .layer(axum::middleware::from_fn(
            crate::middleware::security::add_security_headers,
        ))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .with_state(state)
}

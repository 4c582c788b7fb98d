// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Practice API: rounds, hole cursor, scores and review.

use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Json, Router,
};
use axum_extra::extract::cookie::CookieJar;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::Arc;
use validator::{Validate, ValidationError};

use super::{respond, run_action, token_store, JarResult, StateView};
use crate::error::{AppError, Result};
use crate::models::{Layout, LayoutReview, PracticeNote, Round, ScoreEntry};
use crate::services::hole::{FIRST_HOLE, LAST_HOLE};
use crate::services::{Action, Outcome, PracticeState, ScoreInput, Step};
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/state", get(get_state))
        .route("/api/rounds", get(list_rounds).post(start_round))
        .route("/api/rounds/end", post(end_round))
        .route("/api/rounds/{id}/entries", get(round_entries))
        .route("/api/hole", post(navigate).put(select_hole))
        .route("/api/scores", post(log_score))
        .route("/api/holes/{hole}/last", get(last_result))
        .route("/api/review", get(review))
}

// ─── State ───────────────────────────────────────────────────

/// Reconciled state with no action applied.
async fn get_state(State(state): State<Arc<AppState>>, jar: CookieJar) -> JarResult<StateView> {
    let mut store = token_store(&state, jar);
    let practice = state.engine.reconcile(&mut store).await;
    respond(store, Ok(StateView::from(&practice)))
}

// ─── Rounds ──────────────────────────────────────────────────

#[derive(Deserialize, Validate)]
pub struct StartRoundRequest {
    pub layout: Layout,
    #[serde(default)]
    #[validate(
        length(max = 40, message = "at most 40 discs per round"),
        custom(function = validate_disc_names)
    )]
    pub discs: Vec<String>,
    #[serde(default)]
    #[validate(length(max = 80, message = "round name is limited to 80 characters"))]
    pub name: Option<String>,
}

/// Same limit as a score's disc name.
const MAX_DISC_NAME_CHARS: usize = 64;

fn validate_disc_names(discs: &[String]) -> std::result::Result<(), ValidationError> {
    if discs
        .iter()
        .any(|d| d.trim().chars().count() > MAX_DISC_NAME_CHARS)
    {
        return Err(ValidationError::new("disc_name_length")
            .with_message("disc names are limited to 64 characters".into()));
    }
    Ok(())
}

async fn start_round(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Json(body): Json<StartRoundRequest>,
) -> JarResult<StateView> {
    if let Err(e) = body.validate() {
        return Err((jar, AppError::from(e)));
    }

    let discs: BTreeSet<String> = body
        .discs
        .iter()
        .map(|d| d.trim())
        .filter(|d| !d.is_empty())
        .map(str::to_string)
        .collect();

    let action = Action::StartRound {
        layout: body.layout,
        discs,
        name: body.name,
    };
    run_action(&state, jar, action).await
}

async fn end_round(State(state): State<Arc<AppState>>, jar: CookieJar) -> JarResult<StateView> {
    run_action(&state, jar, Action::EndRound).await
}

/// Round history, newest first.
async fn list_rounds(State(state): State<Arc<AppState>>, jar: CookieJar) -> JarResult<Vec<Round>> {
    let mut store = token_store(&state, jar);
    let practice = state.engine.reconcile(&mut store).await;
    let result = state.engine.history(&practice).await;
    respond(store, result)
}

/// Export of every entry logged in a round.
async fn round_entries(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Path(round_id): Path<String>,
) -> JarResult<Vec<PracticeNote>> {
    let mut store = token_store(&state, jar);
    let practice = state.engine.reconcile(&mut store).await;
    let result = state.engine.entries(&practice, &round_id).await;
    respond(store, result)
}

// ─── Hole cursor ─────────────────────────────────────────────

#[derive(Deserialize)]
pub struct NavigateRequest {
    pub step: Step,
}

async fn navigate(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Json(body): Json<NavigateRequest>,
) -> JarResult<StateView> {
    run_action(&state, jar, Action::Navigate(body.step)).await
}

#[derive(Deserialize, Validate)]
pub struct SelectHoleRequest {
    #[validate(range(min = 1, max = 18, message = "hole must be between 1 and 18"))]
    pub hole: u8,
}

async fn select_hole(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Json(body): Json<SelectHoleRequest>,
) -> JarResult<StateView> {
    if let Err(e) = body.validate() {
        return Err((jar, AppError::from(e)));
    }
    run_action(&state, jar, Action::SelectHole(body.hole)).await
}

// ─── Scores ──────────────────────────────────────────────────

#[derive(Serialize)]
pub struct LogScoreResponse {
    pub entry: ScoreEntry,
    /// State after the cursor advanced
    pub state: StateView,
}

async fn log_score(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Json(body): Json<ScoreInput>,
) -> JarResult<LogScoreResponse> {
    let mut store = token_store(&state, jar);
    let (practice, outcome) = state
        .engine
        .interact(&mut store, Action::LogScore(body))
        .await;

    let result = outcome.and_then(|outcome| match outcome {
        Outcome::ScoreLogged(entry) => Ok(LogScoreResponse {
            entry,
            state: StateView::from(&practice),
        }),
        other => Err(AppError::Internal(anyhow::anyhow!(
            "unexpected outcome for log_score: {:?}",
            other
        ))),
    });
    respond(store, result)
}

// ─── Review ──────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct LayoutQuery {
    #[serde(default)]
    pub layout: Option<Layout>,
}

/// Explicit layout, else the active round's.
fn resolve_layout(practice: &PracticeState, query: &LayoutQuery) -> Result<Layout> {
    query
        .layout
        .or_else(|| practice.round.as_ref().map(|r| r.layout))
        .ok_or_else(|| AppError::BadRequest("layout is required when no round is active".to_string()))
}

/// Most recent result on a hole, across rounds.
async fn last_result(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Path(hole): Path<u8>,
    Query(query): Query<LayoutQuery>,
) -> JarResult<Option<PracticeNote>> {
    let mut store = token_store(&state, jar);
    let practice = state.engine.reconcile(&mut store).await;

    let result = async {
        practice.require_session()?;
        if !(FIRST_HOLE..=LAST_HOLE).contains(&hole) {
            return Err(AppError::BadRequest(format!("no hole {}", hole)));
        }
        let layout = resolve_layout(&practice, &query)?;
        state.engine.last_result(&practice, hole, layout).await
    }
    .await;
    respond(store, result)
}

async fn review(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Query(query): Query<LayoutQuery>,
) -> JarResult<LayoutReview> {
    let mut store = token_store(&state, jar);
    let practice = state.engine.reconcile(&mut store).await;

    let result = async {
        practice.require_session()?;
        let layout = resolve_layout(&practice, &query)?;
        state.engine.review(&practice, layout).await
    }
    .await;
    respond(store, result)
}

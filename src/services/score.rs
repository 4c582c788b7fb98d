// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Score logging and the read side built on logged scores.

use chrono::FixedOffset;
use serde::Deserialize;
use std::sync::Arc;
use validator::Validate;

use crate::db::RemoteDataStore;
use crate::error::{AppError, PersistenceError};
use crate::models::{Layout, LayoutReview, PracticeNote, ScoreEntry, Session, ShotShape};
use crate::services::engine::PracticeState;
use crate::services::hole::Step;
use crate::services::weather::WeatherSnapshotProvider;
use crate::time_utils::{format_venue_rfc3339, venue_now};
use crate::token_store::TokenStore;

/// One throw as entered by the user.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ScoreInput {
    #[validate(length(min = 1, max = 64, message = "disc name must be 1-64 characters"))]
    pub disc: String,
    pub shape: ShotShape,
    #[validate(range(min = 1, max = 20, message = "strokes must be between 1 and 20"))]
    pub strokes: u8,
    #[validate(range(min = 1, max = 5, message = "rating must be between 1 and 5"))]
    pub rating: u8,
    #[serde(default)]
    #[validate(length(max = 2000, message = "notes are limited to 2000 characters"))]
    pub notes: String,
    /// Only consulted when no round is active
    #[serde(default)]
    pub layout: Option<Layout>,
}

#[derive(Clone)]
pub struct ScoreLogger {
    db: Arc<dyn RemoteDataStore>,
    weather: Arc<dyn WeatherSnapshotProvider>,
    venue_offset: FixedOffset,
}

impl ScoreLogger {
    pub fn new(
        db: Arc<dyn RemoteDataStore>,
        weather: Arc<dyn WeatherSnapshotProvider>,
        venue_offset: FixedOffset,
    ) -> Self {
        Self {
            db,
            weather,
            venue_offset,
        }
    }

    /// Write one score for the current hole and advance the cursor.
    ///
    /// The cursor only moves when the write succeeded, so a failed write
    /// can be retried on the same hole.
    pub async fn log_score(
        &self,
        store: &mut dyn TokenStore,
        state: &mut PracticeState,
        input: ScoreInput,
    ) -> Result<ScoreEntry, AppError> {
        input.validate()?;
        let session = state.session.as_ref().ok_or(AppError::Unauthorized)?;

        // The persisted round is unknown this pass; writing now would orphan the entry.
        if let Some(err) = &state.round_error {
            tracing::warn!(hole = state.hole.hole(), error = %err, "Round not restored, staying on hole");
            return Err(err.clone().into());
        }

        let layout = match (&state.round, input.layout) {
            (Some(round), _) => round.layout,
            (None, Some(layout)) => layout,
            (None, None) => {
                return Err(AppError::BadRequest(
                    "layout is required when no round is active".to_string(),
                ))
            }
        };

        let entry = ScoreEntry {
            round_id: state.round.as_ref().and_then(|r| r.id.clone()),
            hole_number: state.hole.hole(),
            layout,
            disc_used: input.disc.trim().to_string(),
            strokes: input.strokes,
            rating: input.rating,
            shot_shape: input.shape,
            notes: input.notes.trim().to_string(),
            weather: self.weather.latest().await,
            created_at: format_venue_rfc3339(venue_now(self.venue_offset)),
        };

        if let Err(e) = self.db.insert_score_entry(session, &entry).await {
            tracing::warn!(
                hole = entry.hole_number,
                round_id = ?entry.round_id,
                error = %e,
                "Score write failed, staying on hole"
            );
            return Err(e.into());
        }

        tracing::info!(
            hole = entry.hole_number,
            round_id = ?entry.round_id,
            disc = %entry.disc_used,
            strokes = entry.strokes,
            rating = entry.rating,
            weather = entry.weather.is_some(),
            "Score logged"
        );
        state.hole.navigate(store, Step::Next);
        Ok(entry)
    }

    /// Most recent score on `hole` for `layout`, across all rounds.
    pub async fn last_result(
        &self,
        session: &Session,
        hole: u8,
        layout: Layout,
    ) -> Result<Option<PracticeNote>, PersistenceError> {
        self.db.latest_note(session, hole, layout).await
    }

    /// Disc confidence and per-hole breakdown for `layout`.
    pub async fn review(
        &self,
        session: &Session,
        layout: Layout,
    ) -> Result<LayoutReview, PersistenceError> {
        let notes = self.db.notes_for_layout(session, layout).await?;
        Ok(LayoutReview::from_notes(layout, &notes))
    }
}

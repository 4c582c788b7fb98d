// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Round lifecycle: start, restore, end.
//!
//! Starting a round never fails once the user is logged in. When the store
//! cannot be reached the round continues locally without an id, and scores
//! logged against it are written without a round reference. A local round
//! lives in process memory per user until it is ended, replaced or the user
//! logs out.

use chrono::FixedOffset;
use dashmap::DashMap;
use std::collections::BTreeSet;
use std::sync::Arc;

use crate::db::RemoteDataStore;
use crate::error::{AppError, PersistenceError};
use crate::models::{Layout, NewRound, PracticeNote, Round, Session};
use crate::services::engine::PracticeState;
use crate::time_utils::{format_venue_rfc3339, venue_now};
use crate::token_store::{keys, TokenStore, ROUND_ID_TTL};

/// Local-only rounds keyed by user id.
pub type LocalRounds = Arc<DashMap<String, Round>>;

#[derive(Clone)]
pub struct RoundLifecycleManager {
    db: Arc<dyn RemoteDataStore>,
    venue_offset: FixedOffset,
    /// Nothing durable names these, so they are shared across passes here.
    local_rounds: LocalRounds,
}

impl RoundLifecycleManager {
    pub fn new(db: Arc<dyn RemoteDataStore>, venue_offset: FixedOffset) -> Self {
        Self {
            db,
            venue_offset,
            local_rounds: Arc::new(DashMap::new()),
        }
    }

    /// Start a round, replacing any round already in progress.
    ///
    /// Returns the round now active: remote-backed when the insert worked,
    /// local-only otherwise.
    pub async fn start(
        &self,
        store: &mut dyn TokenStore,
        state: &mut PracticeState,
        layout: Layout,
        selected_discs: BTreeSet<String>,
        name: Option<String>,
    ) -> Result<Round, AppError> {
        let session = state.session.as_ref().ok_or(AppError::Unauthorized)?;

        let now = venue_now(self.venue_offset);
        let name = name
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| {
                format!("{} {}", layout.short_name(), now.format("%Y-%m-%d %H:%M"))
            });
        let new_round = NewRound {
            name,
            layout,
            selected_discs,
            created_at: format_venue_rfc3339(now),
        };

        let round = match self.db.insert_round(session, &new_round).await {
            Ok(round) => {
                if let Some(id) = round.id.as_deref() {
                    store.set(keys::ROUND_ID, id, Some(ROUND_ID_TTL));
                }
                self.local_rounds.remove(&session.user_id);
                tracing::info!(
                    round_id = ?round.id,
                    layout = %round.layout,
                    discs = round.selected_discs.len(),
                    "Round started"
                );
                round
            }
            Err(e) => {
                // Nothing durable points at the local round.
                store.delete(keys::ROUND_ID);
                tracing::warn!(error = %e, layout = %layout, "Round insert failed, continuing locally");
                let round = new_round.into_round(None);
                self.local_rounds
                    .insert(session.user_id.clone(), round.clone());
                round
            }
        };

        state.round = Some(round.clone());
        Ok(round)
    }

    /// Bring back the round named by the persisted `round_id`, or the
    /// user's local-only round when nothing is persisted.
    ///
    /// A round that no longer exists is forgotten. An outage keeps the id
    /// so a later pass can retry.
    pub async fn restore(
        &self,
        store: &mut dyn TokenStore,
        state: &mut PracticeState,
    ) -> Result<(), PersistenceError> {
        if state.round.is_some() {
            return Ok(());
        }
        let Some(session) = state.session.as_ref() else {
            return Ok(());
        };
        let Some(round_id) = store.get(keys::ROUND_ID) else {
            if let Some(local) = self.local_rounds.get(&session.user_id) {
                tracing::debug!(layout = %local.layout, "Local round restored");
                state.round = Some(local.value().clone());
            }
            return Ok(());
        };

        match self.db.fetch_round(session, &round_id).await {
            Ok(Some(round)) => {
                tracing::debug!(round_id = %round_id, "Round restored");
                state.round = Some(round);
                Ok(())
            }
            Ok(None) => {
                tracing::info!(round_id = %round_id, "Persisted round no longer exists, forgetting it");
                store.delete(keys::ROUND_ID);
                Ok(())
            }
            Err(PersistenceError::Rejected(reason)) => {
                tracing::info!(round_id = %round_id, reason = %reason, "Persisted round not readable, forgetting it");
                store.delete(keys::ROUND_ID);
                Ok(())
            }
            Err(e) => {
                tracing::warn!(round_id = %round_id, error = %e, "Round restore failed, keeping id");
                Err(e)
            }
        }
    }

    /// End the active round. The remote row is left alone.
    pub fn end(&self, store: &mut dyn TokenStore, state: &mut PracticeState) -> Option<Round> {
        store.delete(keys::ROUND_ID);
        if let Some(session) = state.session.as_ref() {
            self.forget_local(&session.user_id);
        }
        let mut round = state.round.take()?;
        round.ended = true;
        tracing::info!(round_id = ?round.id, "Round ended");
        Some(round)
    }

    /// Drop the user's local-only round, if any.
    pub fn forget_local(&self, user_id: &str) {
        self.local_rounds.remove(user_id);
    }

    /// Rounds for this user, newest first.
    pub async fn history(&self, session: &Session) -> Result<Vec<Round>, PersistenceError> {
        self.db.list_rounds(session).await
    }

    /// Look up a round by id. An id the store refuses counts as unknown.
    pub async fn find(
        &self,
        session: &Session,
        round_id: &str,
    ) -> Result<Option<Round>, PersistenceError> {
        match self.db.fetch_round(session, round_id).await {
            Err(PersistenceError::Rejected(_)) => Ok(None),
            other => other,
        }
    }

    /// Every score logged against `round_id`, ordered by hole.
    pub async fn entries(
        &self,
        session: &Session,
        round_id: &str,
    ) -> Result<Vec<PracticeNote>, PersistenceError> {
        self.db.notes_for_round(session, round_id).await
    }
}

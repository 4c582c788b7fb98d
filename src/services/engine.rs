// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Reconcile pass and action dispatch.
//!
//! Every interaction starts from nothing but the `TokenStore`:
//! 1. Auth restore (refresh token -> live session)
//! 2. Round restore (round_id -> active round; needs a session)
//! 3. Cursor restore (hole_num -> current hole)
//!
//! followed by at most one user action against the reconciled state. No
//! step retries; a failed remote call is retried by the next interaction.

use std::collections::BTreeSet;

use crate::error::{AppError, AuthError, PersistenceError};
use crate::models::{Layout, LayoutReview, PracticeNote, Round, ScoreEntry, Session};
use crate::services::auth::AuthSessionManager;
use crate::services::hole::{HoleCursor, Step};
use crate::services::round::RoundLifecycleManager;
use crate::services::score::{ScoreInput, ScoreLogger};
use crate::token_store::TokenStore;

/// State reconstructed for one interaction.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PracticeState {
    pub session: Option<Session>,
    pub round: Option<Round>,
    pub hole: HoleCursor,
    /// Why the session could not be restored in this pass
    pub auth_error: Option<AuthError>,
    /// Why the persisted round could not be restored in this pass
    pub round_error: Option<PersistenceError>,
}

impl PracticeState {
    pub fn is_logged_in(&self) -> bool {
        self.session.is_some()
    }

    /// The session, or the reason there is none.
    ///
    /// An unreachable provider is reported as such rather than as a plain
    /// logged-out state so the caller can tell "try again" from "log in".
    pub fn require_session(&self) -> Result<&Session, AppError> {
        match (&self.session, &self.auth_error) {
            (Some(session), _) => Ok(session),
            (None, Some(err @ (AuthError::Unavailable(_) | AuthError::Offline))) => {
                Err(AppError::Auth(err.clone()))
            }
            (None, _) => Err(AppError::Unauthorized),
        }
    }
}

/// One user-triggered action.
#[derive(Debug, Clone)]
pub enum Action {
    Login { email: String, password: String },
    Logout,
    StartRound {
        layout: Layout,
        discs: BTreeSet<String>,
        name: Option<String>,
    },
    EndRound,
    Navigate(Step),
    SelectHole(u8),
    LogScore(ScoreInput),
}

impl Action {
    fn name(&self) -> &'static str {
        match self {
            Action::Login { .. } => "login",
            Action::Logout => "logout",
            Action::StartRound { .. } => "start_round",
            Action::EndRound => "end_round",
            Action::Navigate(_) => "navigate",
            Action::SelectHole(_) => "select_hole",
            Action::LogScore(_) => "log_score",
        }
    }

    fn needs_session(&self) -> bool {
        !matches!(self, Action::Login { .. } | Action::Logout)
    }
}

/// What an action did.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    LoggedIn,
    LoggedOut,
    RoundStarted(Round),
    /// The round that was active, if any
    RoundEnded(Option<Round>),
    /// Whether the cursor actually moved
    HoleChanged(bool),
    ScoreLogged(ScoreEntry),
}

/// Owns the three managers and runs reconcile passes over them.
#[derive(Clone)]
pub struct PracticeEngine {
    auth: AuthSessionManager,
    rounds: RoundLifecycleManager,
    scores: ScoreLogger,
}

impl PracticeEngine {
    pub fn new(
        auth: AuthSessionManager,
        rounds: RoundLifecycleManager,
        scores: ScoreLogger,
    ) -> Self {
        Self {
            auth,
            rounds,
            scores,
        }
    }

    /// Rebuild state from the persisted tokens.
    ///
    /// Never fails: restore errors are recorded on the returned state.
    pub async fn reconcile(&self, store: &mut dyn TokenStore) -> PracticeState {
        let mut state = PracticeState::default();

        if let Err(e) = self.auth.restore(store, &mut state).await {
            state.auth_error = Some(e);
        }
        if !state.is_logged_in() {
            return state;
        }

        if let Err(e) = self.rounds.restore(store, &mut state).await {
            state.round_error = Some(e);
        }
        state.hole = HoleCursor::restore(store);

        tracing::debug!(
            user_id = ?state.session.as_ref().map(|s| s.user_id.as_str()),
            round_id = ?state.round.as_ref().and_then(|r| r.id.as_deref()),
            hole = state.hole.hole(),
            "Reconciled"
        );
        state
    }

    /// Apply one action to a reconciled state.
    pub async fn apply(
        &self,
        store: &mut dyn TokenStore,
        state: &mut PracticeState,
        action: Action,
    ) -> Result<Outcome, AppError> {
        if action.needs_session() {
            state.require_session()?;
        }
        tracing::debug!(action = action.name(), "Applying action");

        match action {
            Action::Login { email, password } => {
                self.auth.login(store, state, &email, &password).await?;
                state.auth_error = None;
                Ok(Outcome::LoggedIn)
            }
            Action::Logout => {
                if let Some(session) = state.session.as_ref() {
                    self.rounds.forget_local(&session.user_id);
                }
                self.auth.logout(store, state).await;
                Ok(Outcome::LoggedOut)
            }
            Action::StartRound {
                layout,
                discs,
                name,
            } => {
                let round = self.rounds.start(store, state, layout, discs, name).await?;
                Ok(Outcome::RoundStarted(round))
            }
            Action::EndRound => Ok(Outcome::RoundEnded(self.rounds.end(store, state))),
            Action::Navigate(step) => Ok(Outcome::HoleChanged(state.hole.navigate(store, step))),
            Action::SelectHole(hole) => Ok(Outcome::HoleChanged(state.hole.select(store, hole))),
            Action::LogScore(input) => {
                let entry = self.scores.log_score(store, state, input).await?;
                Ok(Outcome::ScoreLogged(entry))
            }
        }
    }

    /// One full interaction: reconcile, then apply `action`.
    pub async fn interact(
        &self,
        store: &mut dyn TokenStore,
        action: Action,
    ) -> (PracticeState, Result<Outcome, AppError>) {
        let mut state = self.reconcile(store).await;
        let outcome = self.apply(store, &mut state, action).await;
        (state, outcome)
    }

    pub async fn history(&self, state: &PracticeState) -> Result<Vec<Round>, AppError> {
        let session = state.require_session()?;
        Ok(self.rounds.history(session).await?)
    }

    pub async fn entries(
        &self,
        state: &PracticeState,
        round_id: &str,
    ) -> Result<Vec<PracticeNote>, AppError> {
        let session = state.require_session()?;
        if self.rounds.find(session, round_id).await?.is_none() {
            return Err(AppError::NotFound(format!("round {}", round_id)));
        }
        Ok(self.rounds.entries(session, round_id).await?)
    }

    pub async fn last_result(
        &self,
        state: &PracticeState,
        hole: u8,
        layout: Layout,
    ) -> Result<Option<PracticeNote>, AppError> {
        let session = state.require_session()?;
        Ok(self.scores.last_result(session, hole, layout).await?)
    }

    pub async fn review(
        &self,
        state: &PracticeState,
        layout: Layout,
    ) -> Result<LayoutReview, AppError> {
        let session = state.require_session()?;
        Ok(self.scores.review(session, layout).await?)
    }
}

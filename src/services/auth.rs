// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Login, logout and session restore.
//!
//! The only durable piece of a session is the refresh token in the
//! `TokenStore`. Each reconcile pass turns it back into a live session:
//! 1. Reuse the session already in the pass state if it is still live
//! 2. Reuse a live session cached for this refresh token (no I/O)
//! 3. Otherwise make exactly one refresh call and persist the rotated token
//!
//! A rejected refresh token is deleted; an unreachable provider leaves the
//! token in place so the next interaction can try again.
//!
//! Refresh tokens are single use. Refreshes are serialized per token, and
//! the spent token stays mapped to the rotated session until that session
//! expires, so a request still carrying the old cookie picks up the
//! rotation instead of spending a consumed token.

use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::error::AuthError;
use crate::models::Session;
use crate::services::engine::PracticeState;
use crate::services::identity::RemoteAuthProvider;
use crate::token_store::{keys, TokenStore, REFRESH_TOKEN_TTL};

/// Live sessions keyed by the refresh token that produced them.
///
/// Shared by every request in this process so a live session is not
/// refreshed (and its token rotated) on every interaction.
pub type SessionCache = Arc<DashMap<String, Session>>;

/// Per-refresh-token mutex serializing refresh calls.
pub type RefreshLocks = Arc<DashMap<String, Arc<Mutex<()>>>>;

/// Owns the user session.
#[derive(Clone)]
pub struct AuthSessionManager {
    provider: Arc<dyn RemoteAuthProvider>,
    live_sessions: SessionCache,
    refresh_locks: RefreshLocks,
}

impl AuthSessionManager {
    pub fn new(
        provider: Arc<dyn RemoteAuthProvider>,
        live_sessions: SessionCache,
        refresh_locks: RefreshLocks,
    ) -> Self {
        Self {
            provider,
            live_sessions,
            refresh_locks,
        }
    }

    /// Rebuild the session for this pass. At most one refresh attempt.
    pub async fn restore(
        &self,
        store: &mut dyn TokenStore,
        state: &mut PracticeState,
    ) -> Result<(), AuthError> {
        if state.session.as_ref().is_some_and(Session::is_live) {
            return Ok(());
        }

        let refresh_token = match store
            .get(keys::REFRESH_TOKEN)
            .or_else(|| state.session.as_ref().map(|s| s.refresh_token.clone()))
        {
            Some(token) => token,
            None => {
                state.session = None;
                return Ok(());
            }
        };

        if let Some(session) = self.cached(&refresh_token) {
            self.adopt(store, state, &refresh_token, session);
            return Ok(());
        }

        let lock = self
            .refresh_locks
            .entry(refresh_token.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        let _guard = lock.lock().await;

        // Another request may have refreshed this token while we waited.
        if let Some(session) = self.cached(&refresh_token) {
            self.adopt(store, state, &refresh_token, session);
            return Ok(());
        }

        let result = self.provider.refresh_session(&refresh_token).await;
        self.refresh_locks.remove(&refresh_token);

        match result {
            Ok(session) => {
                self.remember(store, &session);
                self.live_sessions
                    .insert(refresh_token.clone(), session.clone());
                tracing::info!(user_id = %session.user_id, "Session restored from refresh token");
                state.session = Some(session);
                Ok(())
            }
            Err(e) => {
                state.session = None;
                self.live_sessions.remove(&refresh_token);
                match &e {
                    AuthError::Rejected(_) | AuthError::InvalidCredentials => {
                        store.delete(keys::REFRESH_TOKEN);
                        tracing::info!(error = %e, "Refresh token rejected, logged out");
                    }
                    _ => {
                        tracing::warn!(error = %e, "Session refresh failed, keeping token for next interaction");
                    }
                }
                Err(e)
            }
        }
    }

    /// Sign in with email and password. No state change on failure.
    pub async fn login(
        &self,
        store: &mut dyn TokenStore,
        state: &mut PracticeState,
        email: &str,
        password: &str,
    ) -> Result<(), AuthError> {
        let session = self
            .provider
            .sign_in_with_password(email, password)
            .await
            .inspect_err(|e| tracing::warn!(error = %e, "Login failed"))?;

        self.remember(store, &session);
        tracing::info!(user_id = %session.user_id, "Logged in");
        state.session = Some(session);
        Ok(())
    }

    /// Sign out and forget everything this device persisted.
    ///
    /// The provider call is best-effort; local state is cleared regardless.
    pub async fn logout(&self, store: &mut dyn TokenStore, state: &mut PracticeState) {
        if let Some(session) = state.session.take() {
            if let Err(e) = self.provider.sign_out(&session).await {
                tracing::debug!(error = %e, "Sign-out call failed, ignoring");
            }
            self.live_sessions.retain(|token, s| {
                token != &session.refresh_token && s.refresh_token != session.refresh_token
            });
            tracing::info!(user_id = %session.user_id, "Logged out");
        }
        if let Some(token) = store.get(keys::REFRESH_TOKEN) {
            self.live_sessions.remove(&token);
        }

        store.delete(keys::REFRESH_TOKEN);
        store.delete(keys::ROUND_ID);
        store.delete(keys::HOLE_NUM);
        *state = PracticeState::default();
    }

    /// Live cached session for `refresh_token`, if any.
    fn cached(&self, refresh_token: &str) -> Option<Session> {
        self.live_sessions
            .get(refresh_token)
            .map(|entry| entry.value().clone())
            .filter(Session::is_live)
    }

    /// Use a cached session, handing the client its rotated token if the
    /// cookie still carries the spent one.
    fn adopt(
        &self,
        store: &mut dyn TokenStore,
        state: &mut PracticeState,
        refresh_token: &str,
        session: Session,
    ) {
        if session.refresh_token != refresh_token {
            tracing::debug!(user_id = %session.user_id, "Spent refresh token, reusing rotated session");
            store.set(
                keys::REFRESH_TOKEN,
                &session.refresh_token,
                Some(REFRESH_TOKEN_TTL),
            );
        }
        state.session = Some(session);
    }

    /// Persist the (rotated) refresh token and cache the live session.
    fn remember(&self, store: &mut dyn TokenStore, session: &Session) {
        store.set(
            keys::REFRESH_TOKEN,
            &session.refresh_token,
            Some(REFRESH_TOKEN_TTL),
        );
        self.live_sessions.retain(|_, s| s.is_live());
        self.live_sessions
            .insert(session.refresh_token.clone(), session.clone());
    }
}

// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Identity provider clients.
//!
//! Handles:
//! - Password sign-in
//! - Session refresh (with refresh-token rotation)
//! - Sign-out
//!
//! `GoTrueClient` talks to Supabase Auth; `MemoryIdentity` is an in-process
//! provider with the same rotation rules, used in tests.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use serde::Deserialize;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};

use crate::error::AuthError;
use crate::models::Session;

/// External identity service issuing and refreshing sessions.
#[async_trait]
pub trait RemoteAuthProvider: Send + Sync {
    async fn sign_in_with_password(&self, email: &str, password: &str)
        -> Result<Session, AuthError>;

    /// Exchange a refresh token for a new session. Providers rotate refresh
    /// tokens, so the returned session carries a new one.
    async fn refresh_session(&self, refresh_token: &str) -> Result<Session, AuthError>;

    async fn sign_out(&self, session: &Session) -> Result<(), AuthError>;
}

// ─────────────────────────────────────────────────────────────────────────────
// GoTrueClient - Supabase Auth over HTTP
// ─────────────────────────────────────────────────────────────────────────────

/// Supabase Auth (GoTrue) client.
#[derive(Clone)]
pub struct GoTrueClient {
    http: Option<reqwest::Client>,
    auth_url: String,
    api_key: String,
}

impl GoTrueClient {
    /// Create a client for the project at `url`.
    pub fn new(
        url: &str,
        api_key: &str,
        timeout: std::time::Duration,
    ) -> Result<Self, AuthError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AuthError::Unavailable(format!("HTTP client: {}", e)))?;

        Ok(Self {
            http: Some(http),
            auth_url: format!("{}/auth/v1", url.trim_end_matches('/')),
            api_key: api_key.to_string(),
        })
    }

    /// Client used when Supabase secrets are missing; every call fails
    /// with `AuthError::Offline`.
    pub fn offline() -> Self {
        Self {
            http: None,
            auth_url: String::new(),
            api_key: String::new(),
        }
    }

    fn http(&self) -> Result<&reqwest::Client, AuthError> {
        self.http.as_ref().ok_or(AuthError::Offline)
    }

    async fn token_grant(
        &self,
        grant_type: &str,
        body: serde_json::Value,
    ) -> Result<Session, AuthError> {
        let response = self
            .http()?
            .post(format!("{}/token", self.auth_url))
            .query(&[("grant_type", grant_type)])
            .header("apikey", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(status = %status, grant_type, "Auth token grant failed");
            return Err(classify_failure(status, grant_type, body));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| AuthError::Unavailable(format!("JSON parse error: {}", e)))?;
        Ok(token.into_session(Utc::now()))
    }
}

fn transport_error(e: reqwest::Error) -> AuthError {
    if e.is_timeout() {
        AuthError::Unavailable("request timed out".to_string())
    } else {
        AuthError::Unavailable(e.to_string())
    }
}

/// Map a failed grant to the error the session managers act on.
fn classify_failure(status: reqwest::StatusCode, grant_type: &str, body: String) -> AuthError {
    if status.is_server_error() || status == reqwest::StatusCode::TOO_MANY_REQUESTS {
        return AuthError::Unavailable(format!("HTTP {}", status));
    }
    if grant_type == "password" {
        AuthError::InvalidCredentials
    } else {
        AuthError::Rejected(format!("HTTP {}: {}", status, body))
    }
}

#[async_trait]
impl RemoteAuthProvider for GoTrueClient {
    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Session, AuthError> {
        self.token_grant(
            "password",
            serde_json::json!({ "email": email, "password": password }),
        )
        .await
    }

    async fn refresh_session(&self, refresh_token: &str) -> Result<Session, AuthError> {
        self.token_grant(
            "refresh_token",
            serde_json::json!({ "refresh_token": refresh_token }),
        )
        .await
    }

    async fn sign_out(&self, session: &Session) -> Result<(), AuthError> {
        let response = self
            .http()?
            .post(format!("{}/logout", self.auth_url))
            .header("apikey", &self.api_key)
            .bearer_auth(&session.access_token)
            .send()
            .await
            .map_err(transport_error)?;

        if !response.status().is_success() {
            return Err(AuthError::Rejected(format!("HTTP {}", response.status())));
        }
        Ok(())
    }
}

/// Token response from Supabase Auth.
#[derive(Debug, Clone, Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
    #[serde(default)]
    expires_at: Option<i64>,
    user: AuthUser,
}

#[derive(Debug, Clone, Deserialize)]
struct AuthUser {
    id: String,
    #[serde(default)]
    email: Option<String>,
}

impl TokenResponse {
    fn into_session(self, now: DateTime<Utc>) -> Session {
        let expires_at = self
            .expires_at
            .and_then(|ts| DateTime::from_timestamp(ts, 0))
            .unwrap_or_else(|| now + Duration::seconds(self.expires_in.unwrap_or(3600)));

        Session {
            access_token: self.access_token,
            refresh_token: self.refresh_token,
            user_id: self.user.id,
            email: self.user.email,
            expires_at,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// MemoryIdentity - in-process provider
// ─────────────────────────────────────────────────────────────────────────────

struct Account {
    user_id: String,
    password: String,
}

/// In-process identity provider with single-use refresh tokens.
pub struct MemoryIdentity {
    accounts: DashMap<String, Account>,
    /// Outstanding refresh token -> (user id, email)
    refresh_tokens: DashMap<String, (String, String)>,
    access_ttl: Duration,
    counter: AtomicU64,
    unavailable: AtomicBool,
    refresh_calls: AtomicUsize,
    sign_out_calls: AtomicUsize,
}

impl Default for MemoryIdentity {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryIdentity {
    pub fn new() -> Self {
        Self {
            accounts: DashMap::new(),
            refresh_tokens: DashMap::new(),
            access_ttl: Duration::hours(1),
            counter: AtomicU64::new(0),
            unavailable: AtomicBool::new(false),
            refresh_calls: AtomicUsize::new(0),
            sign_out_calls: AtomicUsize::new(0),
        }
    }

    /// Lifetime of issued access tokens.
    pub fn with_access_ttl(mut self, ttl: Duration) -> Self {
        self.access_ttl = ttl;
        self
    }

    pub fn add_user(&self, email: &str, password: &str) -> String {
        let user_id = format!("user-{}", self.next());
        self.accounts.insert(
            email.to_string(),
            Account {
                user_id: user_id.clone(),
                password: password.to_string(),
            },
        );
        user_id
    }

    /// Invalidate every outstanding refresh token.
    pub fn revoke_all(&self) {
        self.refresh_tokens.clear();
    }

    /// Simulate an outage (`true`) or recovery (`false`).
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    pub fn refresh_calls(&self) -> usize {
        self.refresh_calls.load(Ordering::SeqCst)
    }

    pub fn sign_out_calls(&self) -> usize {
        self.sign_out_calls.load(Ordering::SeqCst)
    }

    fn next(&self) -> u64 {
        self.counter.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn check_available(&self) -> Result<(), AuthError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(AuthError::Unavailable("simulated outage".to_string()));
        }
        Ok(())
    }

    fn issue(&self, user_id: &str, email: &str) -> Session {
        let n = self.next();
        let refresh_token = format!("refresh-{}", n);
        self.refresh_tokens.insert(
            refresh_token.clone(),
            (user_id.to_string(), email.to_string()),
        );
        Session {
            access_token: format!("access-{}", n),
            refresh_token,
            user_id: user_id.to_string(),
            email: Some(email.to_string()),
            expires_at: Utc::now() + self.access_ttl,
        }
    }
}

#[async_trait]
impl RemoteAuthProvider for MemoryIdentity {
    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Session, AuthError> {
        self.check_available()?;
        let user_id = match self.accounts.get(email) {
            Some(account) if account.password == password => account.user_id.clone(),
            _ => return Err(AuthError::InvalidCredentials),
        };
        Ok(self.issue(&user_id, email))
    }

    async fn refresh_session(&self, refresh_token: &str) -> Result<Session, AuthError> {
        self.refresh_calls.fetch_add(1, Ordering::SeqCst);
        self.check_available()?;
        let (_, (user_id, email)) = self
            .refresh_tokens
            .remove(refresh_token)
            .ok_or_else(|| AuthError::Rejected("invalid refresh token".to_string()))?;
        Ok(self.issue(&user_id, &email))
    }

    async fn sign_out(&self, session: &Session) -> Result<(), AuthError> {
        self.sign_out_calls.fetch_add(1, Ordering::SeqCst);
        self.check_available()?;
        self.refresh_tokens
            .retain(|_, owner| owner.0 != session.user_id);
        Ok(())
    }
}

//! Authenticated user session.

use chrono::{DateTime, Duration, Utc};
use std::fmt;

/// Margin before access-token expiry at which a session stops counting as live.
const SESSION_EXPIRY_MARGIN_SECS: i64 = 60;

/// Session issued by the identity provider.
#[derive(Clone, PartialEq, Eq)]
pub struct Session {
    pub access_token: String,
    /// Single-use under rotation; the provider hands out a new one on refresh.
    pub refresh_token: String,
    pub user_id: String,
    pub email: Option<String>,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    /// Whether the access token can still be used at `now`.
    pub fn is_live_at(&self, now: DateTime<Utc>) -> bool {
        now + Duration::seconds(SESSION_EXPIRY_MARGIN_SECS) < self.expires_at
    }

    pub fn is_live(&self) -> bool {
        self.is_live_at(Utc::now())
    }
}

// Tokens stay out of logs.
impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("user_id", &self.user_id)
            .field("email", &self.email)
            .field("expires_at", &self.expires_at)
            .finish_non_exhaustive()
    }
}

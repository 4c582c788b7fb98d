//! In-process token store with TTL expiry.

use super::TokenStore;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::time::Duration;

#[derive(Debug, Clone)]
struct StoredToken {
    value: String,
    expires_at: Option<DateTime<Utc>>,
}

/// Token store backed by a map. Outlives the managers that use it, which
/// makes it the stand-in for a device across simulated restarts.
#[derive(Debug, Clone, Default)]
pub struct MemoryTokenStore {
    entries: HashMap<String, StoredToken>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of unexpired entries.
    pub fn len(&self) -> usize {
        let now = Utc::now();
        self.entries.values().filter(|t| is_live(t, now)).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Expiry recorded for `key`, if any.
    pub fn expires_at(&self, key: &str) -> Option<DateTime<Utc>> {
        self.entries.get(key).and_then(|t| t.expires_at)
    }
}

fn is_live(token: &StoredToken, now: DateTime<Utc>) -> bool {
    token.expires_at.map_or(true, |at| now < at)
}

impl TokenStore for MemoryTokenStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries
            .get(key)
            .filter(|t| is_live(t, Utc::now()))
            .map(|t| t.value.clone())
    }

    fn set(&mut self, key: &str, value: &str, ttl: Option<Duration>) {
        let expires_at = ttl
            .and_then(|ttl| chrono::Duration::from_std(ttl).ok())
            .map(|ttl| Utc::now() + ttl);
        self.entries.insert(
            key.to_string(),
            StoredToken {
                value: value.to_string(),
                expires_at,
            },
        );
    }

    fn delete(&mut self, key: &str) {
        self.entries.remove(key);
    }
}

// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Client-persisted key/value tokens.
//!
//! Everything that has to survive between interactions (the refresh token,
//! the active round, the current hole) lives here. Stores are best-effort
//! and device-scoped: there is no transaction and no ordering guarantee
//! between concurrent readers and writers on the same device.

pub mod cookie;
pub mod memory;

pub use cookie::CookieTokenStore;
pub use memory::MemoryTokenStore;

use std::time::Duration;

/// Key names as constants.
pub mod keys {
    pub const REFRESH_TOKEN: &str = "refresh_token";
    pub const ROUND_ID: &str = "round_id";
    pub const HOLE_NUM: &str = "hole_num";
}

/// Refresh tokens outlive the access token by far; the provider decides
/// whether they are still honoured.
pub const REFRESH_TOKEN_TTL: Duration = Duration::from_secs(30 * 24 * 60 * 60);

/// A round left open is forgotten after a day.
pub const ROUND_ID_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Durable client-side key/value store.
///
/// A `ttl` of `None` means "as long as the client session lasts".
pub trait TokenStore: Send {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: &str, ttl: Option<Duration>);
    fn delete(&mut self, key: &str);
}

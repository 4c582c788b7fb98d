// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Token store backed by HTTP cookies.
//!
//! Wraps the request's `CookieJar`; every `set`/`delete` becomes a
//! `Set-Cookie` header once the jar is returned from the handler.

use super::TokenStore;
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use std::time::Duration;

/// Cookie-backed token store for one request.
pub struct CookieTokenStore {
    jar: CookieJar,
    secure: bool,
}

impl CookieTokenStore {
    pub fn new(jar: CookieJar, secure: bool) -> Self {
        Self { jar, secure }
    }

    /// Hand the jar back so the handler can emit the pending cookies.
    pub fn into_jar(self) -> CookieJar {
        self.jar
    }

    fn base_cookie(&self, key: &str, value: &str) -> Cookie<'static> {
        Cookie::build((key.to_owned(), value.to_owned()))
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax)
            .secure(self.secure)
            .build()
    }
}

impl TokenStore for CookieTokenStore {
    fn get(&self, key: &str) -> Option<String> {
        self.jar
            .get(key)
            .map(|cookie| cookie.value().to_string())
            .filter(|value| !value.is_empty())
    }

    fn set(&mut self, key: &str, value: &str, ttl: Option<Duration>) {
        let mut cookie = self.base_cookie(key, value);
        if let Some(ttl) = ttl {
            let secs = i64::try_from(ttl.as_secs()).unwrap_or(i64::MAX);
            cookie.set_max_age(time::Duration::seconds(secs));
        }
        let jar = std::mem::take(&mut self.jar);
        self.jar = jar.add(cookie);
    }

    fn delete(&mut self, key: &str) {
        // Removal must carry the same path/attributes the cookie was set with.
        let cookie = self.base_cookie(key, "");
        let jar = std::mem::take(&mut self.jar);
        self.jar = jar.remove(cookie);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token_store::{keys, ROUND_ID_TTL};

    #[test]
    fn test_set_is_visible_within_request() {
        let mut store = CookieTokenStore::new(CookieJar::new(), false);
        store.set(keys::ROUND_ID, "42", Some(ROUND_ID_TTL));
        assert_eq!(store.get(keys::ROUND_ID).as_deref(), Some("42"));

        let jar = store.into_jar();
        let cookie = jar.get(keys::ROUND_ID).unwrap();
        assert_eq!(cookie.max_age(), Some(time::Duration::seconds(86_400)));
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.path(), Some("/"));
    }

    #[test]
    fn test_delete_hides_value() {
        let jar = CookieJar::new().add(Cookie::new(keys::HOLE_NUM, "4"));
        let mut store = CookieTokenStore::new(jar, true);
        assert_eq!(store.get(keys::HOLE_NUM).as_deref(), Some("4"));

        store.delete(keys::HOLE_NUM);
        assert_eq!(store.get(keys::HOLE_NUM), None);
    }

    #[test]
    fn test_session_cookie_has_no_max_age() {
        let mut store = CookieTokenStore::new(CookieJar::new(), true);
        store.set(keys::HOLE_NUM, "9", None);

        let jar = store.into_jar();
        let cookie = jar.get(keys::HOLE_NUM).unwrap();
        assert_eq!(cookie.max_age(), None);
        assert_eq!(cookie.secure(), Some(true));
    }
}

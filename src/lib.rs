// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! MKS Tracker: disc golf practice logging
//!
//! This crate provides the backend API that keeps a practice session
//! (login, round in progress, current hole) alive across stateless
//! requests by round-tripping small tokens through client cookies and
//! reconciling them against Supabase on every interaction.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;
pub mod token_store;

use config::Config;
use dashmap::DashMap;
use db::RemoteDataStore;
use services::{
    AuthSessionManager, PracticeEngine, RemoteAuthProvider, RoundLifecycleManager, ScoreLogger,
    WeatherSnapshotProvider,
};
use std::sync::Arc;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub engine: PracticeEngine,
}

impl AppState {
    /// Wire the engine over the given collaborators.
    pub fn new(
        config: Config,
        identity: Arc<dyn RemoteAuthProvider>,
        db: Arc<dyn RemoteDataStore>,
        weather: Arc<dyn WeatherSnapshotProvider>,
    ) -> Self {
        // Shared by every request served by this process
        let live_sessions = Arc::new(DashMap::new());
        let refresh_locks = Arc::new(DashMap::new());

        let engine = PracticeEngine::new(
            AuthSessionManager::new(identity, live_sessions, refresh_locks),
            RoundLifecycleManager::new(db.clone(), config.venue_offset),
            ScoreLogger::new(db, weather, config.venue_offset),
        );

        Self { config, engine }
    }
}

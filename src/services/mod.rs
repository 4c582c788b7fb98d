// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - session and round continuity.

pub mod auth;
pub mod engine;
pub mod hole;
pub mod identity;
pub mod round;
pub mod score;
pub mod weather;

pub use auth::{AuthSessionManager, SessionCache};
pub use engine::{Action, Outcome, PracticeEngine, PracticeState};
pub use hole::{HoleCursor, Step};
pub use identity::{GoTrueClient, MemoryIdentity, RemoteAuthProvider};
pub use round::RoundLifecycleManager;
pub use score::{ScoreInput, ScoreLogger};
pub use weather::{OpenMeteoWeather, StaticWeather, WeatherSnapshotProvider};

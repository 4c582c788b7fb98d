// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod round;
pub mod score;
pub mod session;
pub mod stats;
pub mod weather;

pub use round::{Layout, NewRound, Round};
pub use score::{PracticeNote, ScoreEntry, ShotShape};
pub use session::Session;
pub use stats::LayoutReview;
pub use weather::WeatherSnapshot;

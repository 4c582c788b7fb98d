// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Email/password login and logout.

use axum::{extract::State, routing::post, Json, Router};
use axum_extra::extract::cookie::CookieJar;
use serde::Deserialize;
use std::sync::Arc;
use validator::Validate;

use super::{run_action, JarResult, StateView};
use crate::error::AppError;
use crate::services::Action;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/auth/login", post(login))
        .route("/auth/logout", post(logout))
}

#[derive(Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "a valid email address is required"))]
    pub email: String,
    #[validate(length(min = 1, message = "password is required"))]
    pub password: String,
}

async fn login(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Json(body): Json<LoginRequest>,
) -> JarResult<StateView> {
    if let Err(e) = body.validate() {
        return Err((jar, AppError::from(e)));
    }

    let action = Action::Login {
        email: body.email.trim().to_string(),
        password: body.password,
    };
    run_action(&state, jar, action).await
}

/// Clears the session cookies even when the provider cannot be reached.
async fn logout(State(state): State<Arc<AppState>>, jar: CookieJar) -> JarResult<StateView> {
    run_action(&state, jar, Action::Logout).await
}

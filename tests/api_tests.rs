// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! HTTP API tests.
//!
//! A `Browser` carries cookies between requests exactly like a client
//! would, so every request is one stateless interaction.

use axum::http::{header, StatusCode};
use mks_tracker::routes::create_router;
use serde_json::json;
use tower::ServiceExt;

mod common;
use common::{body_json, create_test_app, Browser, EMAIL, PASSWORD};

fn set_cookie_for(response: &axum::http::Response<axum::body::Body>, name: &str) -> Option<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .map(|v| v.to_str().unwrap().to_string())
        .find(|v| v.starts_with(&format!("{name}=")))
}

async fn logged_in(app: &axum::Router) -> Browser {
    let mut browser = Browser::default();
    let response = app
        .clone()
        .oneshot(browser.request(
            "POST",
            "/auth/login",
            Some(json!({"email": EMAIL, "password": PASSWORD})),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    browser.absorb(&response);
    browser
}

#[tokio::test]
async fn test_health_reports_offline_config() {
    let (app, _) = create_test_app();
    let browser = Browser::default();

    let response = app
        .oneshot(browser.request("GET", "/health", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(header::CACHE_CONTROL).unwrap(),
        "no-store"
    );
    let body = body_json(response).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["online"], false);
}

#[tokio::test]
async fn test_state_without_cookies_is_logged_out() {
    let (app, _) = create_test_app();
    let browser = Browser::default();

    let response = app
        .oneshot(browser.request("GET", "/api/state", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().get(header::SET_COOKIE).is_none());
    let body = body_json(response).await;
    assert_eq!(body["logged_in"], false);
    assert_eq!(body["hole"], 1);
    assert!(body["round"].is_null());
}

#[tokio::test]
async fn test_login_sets_refresh_cookie() {
    let (app, _) = create_test_app();
    let mut browser = Browser::default();

    let response = app
        .oneshot(browser.request(
            "POST",
            "/auth/login",
            Some(json!({"email": EMAIL, "password": PASSWORD})),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let cookie = set_cookie_for(&response, "refresh_token").unwrap();
    assert!(cookie.contains("HttpOnly"));
    assert!(cookie.contains("SameSite=Lax"));
    assert!(cookie.contains("Path=/"));
    assert!(cookie.contains("Max-Age=2592000"));

    browser.absorb(&response);
    assert!(browser.get("refresh_token").is_some());
    let body = body_json(response).await;
    assert_eq!(body["logged_in"], true);
    assert_eq!(body["email"], EMAIL);
}

#[tokio::test]
async fn test_bad_password_is_rejected_without_cookies() {
    let (app, _) = create_test_app();
    let browser = Browser::default();

    let response = app
        .oneshot(browser.request(
            "POST",
            "/auth/login",
            Some(json!({"email": EMAIL, "password": "wrong"})),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(set_cookie_for(&response, "refresh_token").is_none());
    let body = body_json(response).await;
    assert_eq!(body["error"], "auth_failed");
}

#[tokio::test]
async fn test_malformed_email_is_bad_request() {
    let (app, _) = create_test_app();
    let browser = Browser::default();

    let response = app
        .oneshot(browser.request(
            "POST",
            "/auth/login",
            Some(json!({"email": "not-an-email", "password": PASSWORD})),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_practice_flow_survives_restart() {
    let (app, remotes) = create_test_app();
    let mut browser = logged_in(&app).await;

    let response = app
        .clone()
        .oneshot(browser.request(
            "POST",
            "/api/rounds",
            Some(json!({"layout": "Shorts", "discs": ["Firebird", "Zone", " "]})),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let round_cookie = set_cookie_for(&response, "round_id").unwrap();
    assert!(round_cookie.contains("Max-Age=86400"));
    browser.absorb(&response);
    let body = body_json(response).await;
    assert_eq!(body["layout"], "Shorts (Round 1)");
    assert_eq!(body["round"]["selected_discs"], json!(["Firebird", "Zone"]));

    let response = app
        .clone()
        .oneshot(browser.request(
            "POST",
            "/api/scores",
            Some(json!({
                "disc": "Firebird",
                "shape": "Hyzer Spike",
                "strokes": 3,
                "rating": 5,
                "notes": "parked"
            })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let hole_cookie = set_cookie_for(&response, "hole_num").unwrap();
    assert!(!hole_cookie.contains("Max-Age"));
    browser.absorb(&response);
    let body = body_json(response).await;
    assert_eq!(body["entry"]["hole_number"], 1);
    assert_eq!(body["entry"]["round_id"], "1");
    assert_eq!(body["state"]["hole"], 2);

    // A new process knows nothing but what the cookies carry.
    let restarted = create_router(remotes.start_process());
    let response = restarted
        .clone()
        .oneshot(browser.request("GET", "/api/state", None))
        .await
        .unwrap();
    browser.absorb(&response);
    let body = body_json(response).await;
    assert_eq!(body["logged_in"], true);
    assert_eq!(body["hole"], 2);
    assert_eq!(body["round"]["id"], "1");
    assert_eq!(body["round"]["selected_discs"], json!(["Firebird", "Zone"]));

    let response = restarted
        .clone()
        .oneshot(browser.request("GET", "/api/rounds/1/entries", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body.as_array().unwrap().len(), 1);
    assert_eq!(body[0]["shot_shape"], "Hyzer Spike");
    assert_eq!(body[0]["disc_used"], "Firebird");
}

#[tokio::test]
async fn test_hole_navigation_and_selection() {
    let (app, _) = create_test_app();
    let mut browser = logged_in(&app).await;

    let response = app
        .clone()
        .oneshot(browser.request("POST", "/api/hole", Some(json!({"step": "prev"}))))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    // Already on the first hole: nothing to persist.
    assert!(set_cookie_for(&response, "hole_num").is_none());

    let response = app
        .clone()
        .oneshot(browser.request("PUT", "/api/hole", Some(json!({"hole": 18}))))
        .await
        .unwrap();
    browser.absorb(&response);
    assert_eq!(browser.get("hole_num"), Some("18"));

    let response = app
        .clone()
        .oneshot(browser.request("POST", "/api/hole", Some(json!({"step": "next"}))))
        .await
        .unwrap();
    browser.absorb(&response);
    let body = body_json(response).await;
    assert_eq!(body["hole"], 18);

    let response = app
        .clone()
        .oneshot(browser.request("PUT", "/api/hole", Some(json!({"hole": 19}))))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_invalid_score_leaves_cursor() {
    let (app, remotes) = create_test_app();
    let mut browser = logged_in(&app).await;
    let response = app
        .clone()
        .oneshot(browser.request("POST", "/api/rounds", Some(json!({"layout": "Longs"}))))
        .await
        .unwrap();
    browser.absorb(&response);

    let response = app
        .clone()
        .oneshot(browser.request(
            "POST",
            "/api/scores",
            Some(json!({"disc": "Zone", "shape": "Roller", "strokes": 3, "rating": 9})),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(set_cookie_for(&response, "hole_num").is_none());
    assert!(remotes.db.notes().await.is_empty());
}

#[tokio::test]
async fn test_store_outage_is_bad_gateway() {
    let (app, remotes) = create_test_app();
    let browser = logged_in(&app).await;

    remotes.db.set_unavailable(true);
    let response = app
        .oneshot(browser.request(
            "POST",
            "/api/scores",
            Some(json!({
                "disc": "Zone",
                "shape": "Straight",
                "strokes": 2,
                "rating": 3,
                "layout": "Shorts"
            })),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    assert!(set_cookie_for(&response, "hole_num").is_none());
    let body = body_json(response).await;
    assert_eq!(body["error"], "persistence_error");
}

#[tokio::test]
async fn test_overlong_disc_name_is_rejected() {
    let (app, remotes) = create_test_app();
    let browser = logged_in(&app).await;

    let response = app
        .oneshot(browser.request(
            "POST",
            "/api/rounds",
            Some(json!({"layout": "Shorts", "discs": ["Zone", "x".repeat(65)]})),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(set_cookie_for(&response, "round_id").is_none());
    assert_eq!(remotes.db.calls(), 0);
}

#[tokio::test]
async fn test_unknown_round_entries_not_found() {
    let (app, _) = create_test_app();
    let browser = logged_in(&app).await;

    let response = app
        .oneshot(browser.request("GET", "/api/rounds/99/entries", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = body_json(response).await;
    assert_eq!(body["error"], "not_found");
}

#[tokio::test]
async fn test_local_round_survives_between_requests() {
    let (app, remotes) = create_test_app();
    let mut browser = logged_in(&app).await;

    remotes.db.set_unavailable(true);
    let response = app
        .clone()
        .oneshot(browser.request(
            "POST",
            "/api/rounds",
            Some(json!({"layout": "Longs", "discs": ["Teebird"]})),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    browser.absorb(&response);
    assert!(browser.get("round_id").is_none());

    remotes.db.set_unavailable(false);
    let response = app
        .oneshot(browser.request(
            "POST",
            "/api/scores",
            Some(json!({"disc": "Teebird", "shape": "Straight", "strokes": 3, "rating": 4})),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["entry"]["layout"], "Longs (Round 2)");
    assert_eq!(body["entry"]["round_id"], serde_json::Value::Null);
    assert_eq!(body["state"]["hole"], 2);
}

#[tokio::test]
async fn test_api_requires_login() {
    let (app, _) = create_test_app();
    let browser = Browser::default();

    for (method, uri, body) in [
        ("POST", "/api/rounds", Some(json!({"layout": "Shorts"}))),
        ("GET", "/api/rounds", None),
        ("POST", "/api/rounds/end", None),
        ("POST", "/api/hole", Some(json!({"step": "next"}))),
        ("GET", "/api/review?layout=Shorts", None),
        ("GET", "/api/holes/3/last?layout=Shorts", None),
    ] {
        let response = app
            .clone()
            .oneshot(browser.request(method, uri, body))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{method} {uri}");
    }
}

#[tokio::test]
async fn test_review_and_last_result() {
    let (app, _) = create_test_app();
    let mut browser = logged_in(&app).await;

    // No round and no layout: nothing to review.
    let response = app
        .clone()
        .oneshot(browser.request("GET", "/api/review", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .clone()
        .oneshot(browser.request("POST", "/api/rounds", Some(json!({"layout": "Shorts"}))))
        .await
        .unwrap();
    browser.absorb(&response);
    for rating in [2, 4] {
        let response = app
            .clone()
            .oneshot(browser.request(
                "POST",
                "/api/scores",
                Some(json!({"disc": "Zone", "shape": "Straight", "strokes": 3, "rating": rating})),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        browser.absorb(&response);
    }

    let response = app
        .clone()
        .oneshot(browser.request("GET", "/api/review", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["layout"], "Shorts (Round 1)");
    assert_eq!(body["disc_confidence"][0]["disc"], "Zone");
    assert_eq!(body["disc_confidence"][0]["average_rating"], 3.0);
    assert_eq!(body["holes"].as_array().unwrap().len(), 2);

    let response = app
        .clone()
        .oneshot(browser.request("GET", "/api/holes/2/last", None))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body["rating"], 4);

    let response = app
        .clone()
        .oneshot(browser.request("GET", "/api/holes/2/last?layout=Longs", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_json(response).await.is_null());
}

#[tokio::test]
async fn test_logout_clears_every_cookie() {
    let (app, _) = create_test_app();
    let mut browser = logged_in(&app).await;
    let response = app
        .clone()
        .oneshot(browser.request("POST", "/api/rounds", Some(json!({"layout": "Shorts"}))))
        .await
        .unwrap();
    browser.absorb(&response);
    let response = app
        .clone()
        .oneshot(browser.request("POST", "/api/hole", Some(json!({"step": "next"}))))
        .await
        .unwrap();
    browser.absorb(&response);
    assert_eq!(browser.cookies.len(), 3);

    let response = app
        .clone()
        .oneshot(browser.request("POST", "/auth/logout", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    for name in ["refresh_token", "round_id", "hole_num"] {
        let cookie = set_cookie_for(&response, name).unwrap();
        assert!(cookie.contains("Max-Age=0"), "{cookie}");
        assert!(cookie.contains("Path=/"), "{cookie}");
    }
    browser.absorb(&response);
    assert!(browser.cookies.is_empty());
}

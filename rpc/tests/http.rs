//! Handler tests driven through the router with `tower::ServiceExt::oneshot`.

use std::sync::Arc;
use std::time::Duration;

use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use fairdraw_draw::{DrawConfig, DrawMetrics, DrawService, GiveawayService};
use fairdraw_nullables::{NullClock, NullOracle, NullStore};
use fairdraw_rpc::{router, RpcState, StaticTokens, TokenEntry};
use fairdraw_store::GiveawayStore;
use fairdraw_types::{
    Giveaway, GiveawayId, GiveawayStatus, Participant, Role, Timestamp, UserId,
};
use serde_json::{json, Value};
use tower::ServiceExt;

struct App {
    router: Router,
    store: Arc<NullStore>,
    oracle: Arc<NullOracle>,
}

fn app() -> App {
    app_with(NullOracle::constant([11u8; 32]))
}

fn app_with(oracle: NullOracle) -> App {
    let store = Arc::new(NullStore::new());
    let oracle = Arc::new(oracle);
    let clock = Arc::new(NullClock::new(10_000));
    let draws = Arc::new(DrawService::new(
        store.clone(),
        oracle.clone(),
        &DrawConfig {
            oracle_timeout_ms: 1_000,
            commit_attempts: 2,
            commit_backoff_ms: 1,
        },
        Arc::new(DrawMetrics::new()),
        clock.clone(),
    ));
    let giveaways = Arc::new(GiveawayService::new(store.clone(), clock));
    let auth = StaticTokens::from_entries(&[
        token("t-carol", "carol", Role::User),
        token("t-amy", "amy", Role::User),
        token("t-bob", "bob", Role::User),
        token("t-cron", "scheduler", Role::Service),
    ])
    .unwrap();

    let state = Arc::new(RpcState {
        draws,
        giveaways,
        store: store.clone(),
        auth: Arc::new(auth),
    });
    App {
        router: router(state),
        store,
        oracle,
    }
}

fn token(token: &str, user: &str, role: Role) -> TokenEntry {
    TokenEntry {
        token: token.into(),
        user_id: user.into(),
        role,
    }
}

fn seed_ended(store: &NullStore, users: &[&str], num_winners: u32) -> GiveawayId {
    let id = GiveawayId::new("g-ended").unwrap();
    store.seed_giveaway(Giveaway {
        id: id.clone(),
        creator_id: UserId::new("carol").unwrap(),
        title: "Prize".into(),
        description: "desc".into(),
        prize_details: "a mug".into(),
        start_time: Timestamp::new(1_000),
        end_time: Timestamp::new(2_000),
        num_winners,
        status: GiveawayStatus::Ended,
        winner_info: None,
        vrf_request_tx_id: None,
        vrf_response_tx_id: None,
        created_at: Timestamp::new(900),
        ended_at: None,
    });
    for (i, user) in users.iter().enumerate() {
        store.seed_participant(Participant {
            giveaway_id: id.clone(),
            user_id: UserId::new(*user).unwrap(),
            joined_at: Timestamp::new(1_500 + i as u64),
        });
    }
    id
}

async fn send(
    router: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<&str>,
) -> (StatusCode, Value) {
    let mut req = Request::builder().method(method).uri(uri);
    if let Some(t) = token {
        req = req.header(header::AUTHORIZATION, format!("Bearer {t}"));
    }
    if body.is_some() {
        req = req.header(header::CONTENT_TYPE, "application/json");
    }
    let req = req
        .body(body.map(|b| Body::from(b.to_string())).unwrap_or_else(Body::empty))
        .unwrap();

    let response = router.clone().oneshot(req).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

async fn draw(app: &App, token: &str, id: &str) -> (StatusCode, Value) {
    send(
        &app.router,
        Method::POST,
        "/select-winners",
        Some(token),
        Some(&json!({ "giveaway_id": id }).to_string()),
    )
    .await
}

#[tokio::test]
async fn select_winners_success_and_idempotence() {
    let app = app();
    let id = seed_ended(&app.store, &["A", "B", "C"], 2);

    let (status, first) = draw(&app, "t-carol", id.as_str()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["success"], true);
    assert_eq!(first["giveawayId"], "g-ended");
    assert_eq!(first["alreadyDrawn"], false);
    assert_eq!(first["winners"].as_array().unwrap().len(), 2);
    assert!(first["vrfRequestTxId"].as_str().unwrap().starts_with("null:"));

    let (status, second) = draw(&app, "t-carol", id.as_str()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(second["alreadyDrawn"], true);
    assert_eq!(second["winners"], first["winners"]);
    assert_eq!(app.oracle.calls(), 1);
    assert_eq!(
        app.store.get_giveaway(&id).unwrap().status,
        GiveawayStatus::Drawn
    );
}

#[tokio::test]
async fn select_winners_without_participants() {
    let app = app();
    let id = seed_ended(&app.store, &[], 1);

    let (status, body) = draw(&app, "t-carol", id.as_str()).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body,
        json!({ "success": false, "error": "No participants found for this giveaway" })
    );
    assert_eq!(
        app.store.get_giveaway(&id).unwrap().status,
        GiveawayStatus::Ended
    );
}

#[tokio::test]
async fn select_winners_rejects_bad_input() {
    let app = app();

    let (status, body) = send(
        &app.router,
        Method::POST,
        "/select-winners",
        Some("t-carol"),
        Some("{not json"),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid JSON in request body");

    let (status, body) = send(
        &app.router,
        Method::POST,
        "/select-winners",
        Some("t-carol"),
        Some("{}"),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Missing giveaway_id in request body.");
}

#[tokio::test]
async fn select_winners_wrong_method() {
    let app = app();
    let (status, body) = send(&app.router, Method::GET, "/select-winners", None, None).await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(body, json!({ "success": false, "error": "Method not allowed" }));
}

#[tokio::test]
async fn select_winners_unknown_and_not_ended() {
    let app = app();
    let (status, body) = draw(&app, "t-carol", "missing").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], false);

    let id = seed_ended(&app.store, &["A"], 1);
    app.store
        .update_status(
            &id,
            GiveawayStatus::Ended,
            GiveawayStatus::Active,
            Timestamp::new(10_000),
        )
        .unwrap();
    let (status, _) = draw(&app, "t-carol", id.as_str()).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        app.store.get_giveaway(&id).unwrap().status,
        GiveawayStatus::Active
    );
}

#[tokio::test]
async fn draw_completes_after_client_disconnects() {
    let app = app_with(NullOracle::constant([11u8; 32]).with_delay(Duration::from_millis(100)));
    let id = seed_ended(&app.store, &["A", "B"], 1);

    let abandoned =
        tokio::time::timeout(Duration::from_millis(10), draw(&app, "t-carol", id.as_str())).await;
    assert!(abandoned.is_err(), "request should still be waiting on the oracle");

    for _ in 0..100 {
        if app.store.successful_commits() == 1 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert_eq!(app.store.successful_commits(), 1);
    assert_eq!(
        app.store.get_giveaway(&id).unwrap().status,
        GiveawayStatus::Drawn
    );

    let (status, body) = draw(&app, "t-carol", id.as_str()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["alreadyDrawn"], true);
    assert_eq!(app.oracle.calls(), 1);
}

#[tokio::test]
async fn join_after_end_time_is_rejected() {
    let app = app();
    let id = seed_ended(&app.store, &["A"], 1);
    app.store
        .update_status(
            &id,
            GiveawayStatus::Ended,
            GiveawayStatus::Active,
            Timestamp::new(10_000),
        )
        .unwrap();

    let (status, body) = send(
        &app.router,
        Method::POST,
        &format!("/giveaways/{}/join", id.as_str()),
        Some("t-amy"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["error"],
        "Giveaway has ended and is not accepting participants"
    );
}

#[tokio::test]
async fn select_winners_requires_authorization() {
    let app = app();
    let id = seed_ended(&app.store, &["A"], 1);

    let (status, body) = send(
        &app.router,
        Method::POST,
        "/select-winners",
        None,
        Some(&json!({ "giveaway_id": id.as_str() }).to_string()),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], false);

    let (status, _) = draw(&app, "t-amy", id.as_str()).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = draw(&app, "t-cron", id.as_str()).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn giveaway_lifecycle_over_http() {
    let app = app();
    let r = &app.router;

    let draft = json!({
        "title": "Launch",
        "description": "Two tickets",
        "prize_details": "VIP",
        "start_time": 9_000,
        "end_time": 12_000,
        "num_winners": 1
    });
    let (status, created) =
        send(r, Method::POST, "/giveaways", Some("t-carol"), Some(&draft.to_string())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(created["giveaway"]["status"], "draft");
    let id = created["giveaway"]["id"].as_str().unwrap().to_string();

    let join = format!("/giveaways/{id}/join");
    let (status, _) = send(r, Method::POST, &join, Some("t-amy"), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "draft giveaways are closed");

    let status_uri = format!("/giveaways/{id}/status");
    let (status, _) = send(
        r,
        Method::POST,
        &status_uri,
        Some("t-carol"),
        Some(r#"{"status":"published"}"#),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(r, Method::POST, &join, Some("t-amy"), None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, body) = send(r, Method::POST, &join, Some("t-amy"), None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["success"], false);

    let participants = format!("/giveaways/{id}/participants");
    let (status, _) = send(r, Method::GET, &participants, Some("t-amy"), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, body) = send(r, Method::GET, &participants, Some("t-carol"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["participants"][0]["user_id"], "amy");

    let (status, _) = send(
        r,
        Method::POST,
        &status_uri,
        Some("t-carol"),
        Some(r#"{"status":"drawn"}"#),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    send(
        r,
        Method::POST,
        &status_uri,
        Some("t-carol"),
        Some(r#"{"status":"ended"}"#),
    )
    .await;
    let (status, body) = draw(&app, "t-carol", &id).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["winners"], json!(["amy"]));

    let (status, body) = send(
        r,
        Method::GET,
        &format!("/giveaways/{id}"),
        Some("t-bob"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["giveaway"]["status"], "drawn");
    assert_eq!(body["giveaway"]["ended_at"], 10_000);
    assert_eq!(body["giveaway"]["winner_info"]["winners"], json!(["amy"]));

    let (status, body) = send(
        r,
        Method::GET,
        &format!("/giveaways/{id}/audit"),
        Some("t-bob"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["proofValid"], true);
    assert_eq!(body["selectionMatches"], true);

    let (status, body) = send(r, Method::GET, "/giveaways", Some("t-carol"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["giveaways"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn health_and_metrics() {
    let app = app();
    let id = seed_ended(&app.store, &["A"], 1);
    draw(&app, "t-carol", id.as_str()).await;

    let (status, body) = send(&app.router, Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["giveawayCount"], 1);

    let response = app
        .router
        .clone()
        .oneshot(
            Request::builder()
                .uri("/metrics")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let text = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let text = String::from_utf8(text.to_vec()).unwrap();
    assert!(text.contains("fairdraw_draws_committed_total 1"));
}

#[tokio::test]
async fn unknown_route_uses_envelope() {
    let app = app();
    let (status, body) = send(&app.router, Method::GET, "/nope", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], false);
}

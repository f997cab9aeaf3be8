use axum::http::StatusCode;
use chrono::{TimeZone, Utc};
use flagdesk_core::clock::FixedClock;
use flagdesk_core::config::Config;
use flagdesk_core::document::{bool_value, string_value, Document};
use flagdesk_core::session::RefreshSettings;
use flagdesk_core::store::{MemoryStore, RecordStore};
use flagdesk_server::AppState;
use http_body_util::BodyExt;
use std::sync::Arc;
use tower::ServiceExt;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// A router over the demo team with the timer idle.
fn demo_app() -> (axum::Router, Arc<MemoryStore>) {
    let clock = Arc::new(FixedClock::new(
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap(),
    ));
    let store = Arc::new(MemoryStore::demo(clock));
    let settings = RefreshSettings::new(false, RefreshSettings::MAX_INTERVAL_SECS).unwrap();
    let state = AppState::new(store.clone(), Config::default(), settings);
    (flagdesk_server::build_router(state), store)
}

async fn send(app: axum::Router, req: axum::http::Request<axum::body::Body>) -> (StatusCode, serde_json::Value) {
    let response = app.oneshot(req).await.unwrap();
    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap_or(serde_json::Value::Null);
    (status, json)
}

/// Send a GET request via `oneshot` and return (status, parsed JSON body).
async fn get(app: axum::Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let req = axum::http::Request::builder()
        .uri(uri)
        .body(axum::body::Body::empty())
        .unwrap();
    send(app, req).await
}

/// Send a request with a JSON body via `oneshot` and return (status, parsed JSON body).
async fn json_request(
    app: axum::Router,
    method: &str,
    uri: &str,
    body: serde_json::Value,
) -> (StatusCode, serde_json::Value) {
    let req = axum::http::Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(axum::body::Body::from(serde_json::to_vec(&body).unwrap()))
        .unwrap();
    send(app, req).await
}

async fn post_json(
    app: axum::Router,
    uri: &str,
    body: serde_json::Value,
) -> (StatusCode, serde_json::Value) {
    json_request(app, "POST", uri, body).await
}

async fn post_empty(app: axum::Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let req = axum::http::Request::builder()
        .method("POST")
        .uri(uri)
        .body(axum::body::Body::empty())
        .unwrap();
    send(app, req).await
}

// ---------------------------------------------------------------------------
// Dashboard
// ---------------------------------------------------------------------------

#[tokio::test]
async fn dashboard_lists_rows_newest_flag_first() {
    let (app, _) = demo_app();
    let (status, json) = get(app, "/api/dashboard").await;
    assert_eq!(status, StatusCode::OK);

    let rows = json["rows"].as_array().unwrap();
    let ids: Vec<&str> = rows.iter().map(|r| r["worker_id"].as_str().unwrap()).collect();
    assert_eq!(ids, vec!["JohnA", "PriyaK", "MarcoL"]);
    assert_eq!(json["panel"]["title"], "JohnA (software developer) has a ticket");
    assert_eq!(json["panel"]["controls"]["kind"], "submit");
    assert!(json["error"].is_null());
}

#[tokio::test]
async fn submit_resolves_record_and_refreshes() {
    let (app, store) = demo_app();
    let (status, json) = post_json(
        app,
        "/api/records/workerstatus/action",
        serde_json::json!({ "action": "warn" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    assert_eq!(json["panel"]["title"], "All tickets resolved");
    assert_eq!(json["panel"]["last_action"], "warn");
    assert_eq!(json["panel"]["controls"]["kind"], "set_flag");

    let doc = store.get_document("workerstatus").unwrap();
    assert_eq!(doc.bool(&["flag"]), Some(false));
    assert_eq!(doc.string(&["action"]).as_deref(), Some("warn"));
}

#[tokio::test]
async fn submit_rejects_unknown_action() {
    let (app, _) = demo_app();
    let (status, json) = post_json(
        app,
        "/api/records/workerstatus/action",
        serde_json::json!({ "action": "suspend" }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].as_str().unwrap().contains("suspend"));
}

#[tokio::test]
async fn malformed_body_is_400_with_json_error() {
    let (app, _) = demo_app();
    let req = axum::http::Request::builder()
        .method("POST")
        .uri("/api/records/workerstatus/action")
        .header("content-type", "application/json")
        .body(axum::body::Body::from("{\"action\":"))
        .unwrap();
    let (status, json) = send(app, req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].is_string());
}

#[tokio::test]
async fn body_missing_field_is_400_with_json_error() {
    let (app, _) = demo_app();
    let (status, json) = post_json(
        app,
        "/api/blocklist",
        serde_json::json!({ "url": "youtube.com" }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].as_str().unwrap().contains("category"));
}

#[tokio::test]
async fn submit_on_missing_record_is_404() {
    let (app, _) = demo_app();
    let (status, _) = post_json(
        app,
        "/api/records/ghost/action",
        serde_json::json!({ "action": "block" }),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn set_flag_copies_action_timestamp() {
    let (app, store) = demo_app();
    let (status, json) = post_empty(app, "/api/records/priya/flag").await;
    assert_eq!(status, StatusCode::OK);

    let doc = store.get_document("priya").unwrap();
    assert_eq!(doc.bool(&["flag"]), Some(true));
    assert_eq!(doc.fields["last flagged"], doc.fields["action_timestamp"]);

    // Priya's flag time is now 4h ago, still behind John's 3 minutes.
    assert_eq!(json["rows"][0]["worker_id"], "JohnA");
    assert_eq!(json["rows"][1]["flagged"], true);
}

#[tokio::test]
async fn duplicate_copies_template() {
    let (app, store) = demo_app();
    let (status, json) = post_json(
        app,
        "/api/records/duplicate",
        serde_json::json!({ "new_id": "newhire" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["id"], "newhire");
    assert_eq!(json["template_id"], "workerstatus");
    assert_eq!(json["dashboard"]["rows"].as_array().unwrap().len(), 4);
    assert_eq!(
        store.get_document("newhire").unwrap().fields,
        store.get_document("workerstatus").unwrap().fields
    );
}

#[tokio::test]
async fn duplicate_with_blank_id_is_400() {
    let (app, _) = demo_app();
    let (status, _) = post_json(
        app,
        "/api/records/duplicate",
        serde_json::json!({ "new_id": "   " }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn duplicate_without_template_is_404() {
    let store = Arc::new(MemoryStore::new("t"));
    store.insert(Document::new("someone").with_field("flag", bool_value(false)));
    let state = AppState::new(
        store,
        Config::default(),
        RefreshSettings::new(false, 60).unwrap(),
    );
    let (status, json) = post_json(
        flagdesk_server::build_router(state),
        "/api/records/duplicate",
        serde_json::json!({ "new_id": "x" }),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(json["error"].as_str().unwrap().contains("workerstatus"));
}

#[tokio::test]
async fn empty_collection_shows_notice() {
    let state = AppState::new(
        Arc::new(MemoryStore::new("t")),
        Config::default(),
        RefreshSettings::new(false, 60).unwrap(),
    );
    let (status, json) = get(flagdesk_server::build_router(state), "/api/dashboard").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["notice"], "No documents found in collection 'workerstatus'.");
    assert!(json["panel"].is_null());
}

#[tokio::test]
async fn unreachable_store_shows_error_banner() {
    let config = Config {
        credentials_path: "/definitely/not/here.json".into(),
        ..Config::default()
    };
    let store = Arc::new(flagdesk_core::store::FirestoreStore::new(config.clone()));
    let state = AppState::new(store, config, RefreshSettings::new(false, 60).unwrap());
    let (status, json) = post_empty(flagdesk_server::build_router(state), "/api/refresh").await;
    assert_eq!(status, StatusCode::OK);
    assert!(json["rows"].as_array().unwrap().is_empty());
    assert!(json["error"].as_str().unwrap().contains("credentials"));
}

#[tokio::test]
async fn mutation_on_unreachable_store_is_503() {
    let config = Config {
        credentials_path: "/definitely/not/here.json".into(),
        ..Config::default()
    };
    let store = Arc::new(flagdesk_core::store::FirestoreStore::new(config.clone()));
    let state = AppState::new(store, config, RefreshSettings::new(false, 60).unwrap());
    let (status, _) = post_empty(flagdesk_server::build_router(state), "/api/records/w1/flag").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}

// ---------------------------------------------------------------------------
// Refresh settings
// ---------------------------------------------------------------------------

#[tokio::test]
async fn refresh_settings_round_trip() {
    let (app, _) = demo_app();
    let (status, json) = json_request(
        app.clone(),
        "PUT",
        "/api/refresh-settings",
        serde_json::json!({ "enabled": true, "interval_secs": 30 }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["interval_secs"], 30);

    let (_, json) = get(app, "/api/refresh-settings").await;
    assert_eq!(json["enabled"], true);
    assert_eq!(json["interval_secs"], 30);
}

#[tokio::test]
async fn refresh_interval_out_of_range_is_400() {
    let (app, _) = demo_app();
    let (status, _) = json_request(
        app.clone(),
        "PUT",
        "/api/refresh-settings",
        serde_json::json!({ "interval_secs": 1 }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, json) = get(app, "/api/refresh-settings").await;
    assert_eq!(json["interval_secs"], RefreshSettings::MAX_INTERVAL_SECS);
}

// ---------------------------------------------------------------------------
// Block list
// ---------------------------------------------------------------------------

#[tokio::test]
async fn blocklist_add_normalizes_and_rejects_duplicates() {
    let (app, _) = demo_app();
    let (status, json) = post_json(
        app.clone(),
        "/api/blocklist",
        serde_json::json!({ "url": "YOUTUBE.com/", "category": "Social Media" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["message"], "Added to Social Media: https://youtube.com");
    assert!(json["lists"]["Social Media"]
        .as_array()
        .unwrap()
        .iter()
        .any(|u| *u == "https://youtube.com"));

    let (status, _) = post_json(
        app,
        "/api/blocklist",
        serde_json::json!({ "url": "https://youtube.com", "category": "Shopping" }),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn blocklist_add_rejects_bad_input() {
    let (app, _) = demo_app();
    let (status, _) = post_json(
        app.clone(),
        "/api/blocklist",
        serde_json::json!({ "url": "   ", "category": "Gambling" }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = post_json(
        app,
        "/api/blocklist",
        serde_json::json!({ "url": "example.org", "category": "Games" }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn blocklist_move_then_reset() {
    let (app, _) = demo_app();
    let (_, before) = get(app.clone(), "/api/blocklist").await;
    let url = before["lists"]["Gambling"][0].as_str().unwrap().to_string();

    let (status, json) = post_json(
        app.clone(),
        "/api/blocklist/move",
        serde_json::json!({ "from": "Gambling", "to": "Shopping", "urls": [url] }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["message"], "Moved 1 item(s) to Shopping");
    assert!(json["lists"]["Shopping"].as_array().unwrap().iter().any(|u| *u == url.as_str()));
    assert!(!json["lists"]["Gambling"].as_array().unwrap().iter().any(|u| *u == url.as_str()));

    let (status, json) = post_empty(app, "/api/blocklist/reset").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["lists"], before["lists"]);
}

#[tokio::test]
async fn blocklist_remove_entry() {
    let (app, _) = demo_app();
    let (_, before) = get(app.clone(), "/api/blocklist").await;
    let url = before["lists"]["Shopping"][0].as_str().unwrap().to_string();

    let (status, json) = post_json(
        app,
        "/api/blocklist/remove",
        serde_json::json!({ "category": "Shopping", "url": url }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["total"], before["total"].as_u64().unwrap() - 1);
}

#[tokio::test]
async fn blocklist_export_is_attachment() {
    let (app, _) = demo_app();
    let req = axum::http::Request::builder()
        .uri("/api/blocklist/export")
        .body(axum::body::Body::empty())
        .unwrap();
    let response = app.oneshot(req).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let disposition = response
        .headers()
        .get(axum::http::header::CONTENT_DISPOSITION)
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(disposition.contains("block_lists.json"));
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert!(json["Gambling"].is_array());
}

#[tokio::test]
async fn blocklist_import_overwrites_and_fills_known_categories() {
    let (app, _) = demo_app();
    let req = axum::http::Request::builder()
        .method("POST")
        .uri("/api/blocklist/import")
        .body(axum::body::Body::from(
            r#"{"Gambling": ["BET.example/", "bet.example", "not a url"], "Work": ["jira.example"]}"#,
        ))
        .unwrap();
    let (status, json) = send(app, req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["lists"]["Gambling"], serde_json::json!(["https://bet.example"]));
    assert_eq!(json["lists"]["Social Media"], serde_json::json!([]));
    assert_eq!(json["lists"]["Work"], serde_json::json!(["https://jira.example"]));
}

#[tokio::test]
async fn blocklist_import_rejects_malformed_json() {
    let (app, _) = demo_app();
    let (_, before) = get(app.clone(), "/api/blocklist").await;
    let req = axum::http::Request::builder()
        .method("POST")
        .uri("/api/blocklist/import")
        .body(axum::body::Body::from(r#"["not", "an", "object"]"#))
        .unwrap();
    let (status, _) = send(app.clone(), req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, after) = get(app, "/api/blocklist").await;
    assert_eq!(after, before);
}

// ---------------------------------------------------------------------------
// Static UI
// ---------------------------------------------------------------------------

#[tokio::test]
async fn unknown_paths_serve_dashboard_page() {
    let (app, _) = demo_app();
    let req = axum::http::Request::builder()
        .uri("/some/page")
        .body(axum::body::Body::empty())
        .unwrap();
    let response = app.oneshot(req).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = response.into_body().collect().await.unwrap().to_bytes();
    assert!(String::from_utf8_lossy(&body).contains("Manager Dashboard"));
}

#[tokio::test]
async fn records_written_outside_show_up_on_refresh() {
    let (app, store) = demo_app();
    let (_, json) = get(app.clone(), "/api/dashboard").await;
    assert_eq!(json["rows"].as_array().unwrap().len(), 3);

    store.insert(
        Document::new("late")
            .with_field("ID", string_value("LateJoiner"))
            .with_field("flag", bool_value(false)),
    );

    // The cached snapshot is served until the next cycle.
    let (_, json) = get(app.clone(), "/api/dashboard").await;
    assert_eq!(json["rows"].as_array().unwrap().len(), 3);

    let (_, json) = post_empty(app, "/api/refresh").await;
    assert_eq!(json["rows"].as_array().unwrap().len(), 4);
}

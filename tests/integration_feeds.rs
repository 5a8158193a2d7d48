mod common;

use axum::http::StatusCode;
use admitdesk_store::RecordStore;
use common::{open_events, send, setup_test_app};
use serde_json::json;

#[tokio::test]
async fn test_publish_and_read_newest_first() {
    let app = setup_test_app();

    for text in ["Admissions open", "Fee deadline extended"] {
        let (status, body) = send(
            &app.router,
            "POST",
            "/api/feeds/notice-new",
            Some(json!({ "text": text })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert!(body["key"].is_string());
        assert_eq!(body["text"], text);
    }

    let (status, body) = send(&app.router, "GET", "/api/feeds/notice-new", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["feed"], "notice-new");
    assert_eq!(body["total"], 2);
    assert_eq!(body["badge"], "2");

    let entries = body["entries"].as_array().unwrap();
    assert_eq!(entries[0]["text"], "Fee deadline extended");
    assert_eq!(entries[1]["text"], "Admissions open");
    assert_eq!(entries[0]["timeAgo"], "Just now");
}

#[tokio::test]
async fn test_entry_type_and_explicit_time() {
    let app = setup_test_app();

    let (status, body) = send(
        &app.router,
        "POST",
        "/api/feeds/notifications",
        Some(json!({ "text": "Sports day", "time": 0, "type": "event" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["type"], "event");
    assert_eq!(body["time"], 0);

    let (_, feed) = send(&app.router, "GET", "/api/feeds/notifications", None).await;
    let entry = &feed["entries"][0];
    assert_eq!(entry["type"], "event");
    assert!(entry["timeAgo"].as_str().unwrap().ends_with(" min"));
}

#[tokio::test]
async fn test_badge_caps_at_nine_plus() {
    let app = setup_test_app();
    for n in 0..11 {
        send(
            &app.router,
            "POST",
            "/api/feeds/notifications",
            Some(json!({ "text": format!("Notice {n}") })),
        )
        .await;
    }

    let (_, body) = send(&app.router, "GET", "/api/feeds/notifications", None).await;
    assert_eq!(body["total"], 11);
    assert_eq!(body["badge"], "9+");
}

#[tokio::test]
async fn test_clear_only_touches_one_feed() {
    let app = setup_test_app();
    send(&app.router, "POST", "/api/feeds/notice-new", Some(json!({ "text": "new" }))).await;
    send(&app.router, "POST", "/api/feeds/notice-old", Some(json!({ "text": "old" }))).await;

    let (status, _) = send(&app.router, "DELETE", "/api/feeds/notice-new", None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, cleared) = send(&app.router, "GET", "/api/feeds/notice-new", None).await;
    assert_eq!(cleared["total"], 0);
    assert_eq!(cleared["badge"], "0");
    assert_eq!(cleared["entries"], json!([]));

    let (_, kept) = send(&app.router, "GET", "/api/feeds/notice-old", None).await;
    assert_eq!(kept["total"], 1);
}

#[tokio::test]
async fn test_feed_errors() {
    let app = setup_test_app();

    let (status, body) = send(&app.router, "GET", "/api/feeds/announcements", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("unknown feed"));

    let (status, _) = send(
        &app.router,
        "POST",
        "/api/feeds/notifications",
        Some(json!({ "text": "" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, body) = send(
        &app.router,
        "POST",
        "/api/feeds/notifications",
        Some(json!({ "time": 5 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "text is required");
}

#[tokio::test]
async fn test_extreme_times_do_not_break_the_feed() {
    let app = setup_test_app();

    let (status, _) = send(
        &app.router,
        "POST",
        "/api/feeds/notifications",
        Some(json!({ "text": "x", "time": i64::MIN })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    // entries written by other clients are not validated
    app.store
        .push("notifications", json!({ "text": "old", "time": i64::MIN }))
        .await
        .unwrap();

    let (status, body) = send(&app.router, "GET", "/api/feeds/notifications", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 1);
    assert!(body["entries"][0]["timeAgo"].as_str().unwrap().ends_with(" min"));
}

#[tokio::test]
async fn test_feed_stream_tracks_badge_per_connection() {
    let app = setup_test_app();

    let (status, events) = open_events(&app.router, "/api/feeds/notifications/events").await;
    assert_eq!(status, StatusCode::OK);
    let mut events = events.unwrap();

    let (name, data) = events.next().await;
    assert_eq!(name, "feed");
    assert_eq!(data["feed"], "notifications");
    assert_eq!(data["badge"], "0");
    assert_eq!(data["alert"], false);
    assert!(data["entries"].as_array().unwrap().is_empty());

    send(
        &app.router,
        "POST",
        "/api/feeds/notifications",
        Some(json!({ "text": "Results published" })),
    )
    .await;
    let (_, data) = events.next().await;
    assert_eq!(data["badge"], "1");
    assert_eq!(data["alert"], true);
    assert_eq!(data["entries"][0]["text"], "Results published");
    assert_eq!(data["entries"][0]["timeAgo"], "Just now");

    send(&app.router, "DELETE", "/api/feeds/notifications", None).await;
    let (_, data) = events.next().await;
    assert_eq!(data["badge"], "0");
    assert_eq!(data["alert"], false);

    // Refilled to the previous size: no alert.
    send(
        &app.router,
        "POST",
        "/api/feeds/notifications",
        Some(json!({ "text": "Holiday on Friday" })),
    )
    .await;
    let (_, data) = events.next().await;
    assert_eq!(data["badge"], "1");
    assert_eq!(data["alert"], false);

    // A new connection starts from an empty badge.
    let (_, fresh) = open_events(&app.router, "/api/feeds/notifications/events").await;
    let (_, data) = fresh.unwrap().next().await;
    assert_eq!(data["badge"], "1");
    assert_eq!(data["alert"], true);
}

#[tokio::test]
async fn test_feed_stream_rejects_unknown_feed() {
    let app = setup_test_app();
    let (status, events) = open_events(&app.router, "/api/feeds/gossip/events").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(events.is_none());
}

mod common;

use axum::http::StatusCode;
use admitdesk_store::RecordStore;
use common::{TestApp, open_events, send, send_raw, setup_test_app};
use fake::Fake;
use fake::faker::name::en::Name;
use serde_json::{Value, json};

async fn create(app: &TestApp, body: Value) -> (StatusCode, Value) {
    send(&app.router, "POST", "/api/admissions", Some(body)).await
}

async fn create_ok(app: &TestApp, id: &str, class: &str, name: &str) -> Value {
    let (status, body) = create(
        app,
        json!({ "admissionId": id, "classApplied": class, "name": name }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    body
}

fn ids(body: &Value) -> Vec<&str> {
    body.as_array()
        .unwrap()
        .iter()
        .map(|r| r["admissionId"].as_str().unwrap())
        .collect()
}

#[tokio::test]
async fn test_create_fills_identifiers() {
    let app = setup_test_app();

    let (status, body) = create(
        &app,
        json!({ "classApplied": "LKG", "name": "Asha Rao", "fatherName": "Vikram Rao" }),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    let admission_id = body["admissionId"].as_str().unwrap();
    assert!(admission_id.starts_with("ADM"));
    assert_eq!(admission_id.len(), 9);

    let unique_id = body["uniqueId"].as_str().unwrap();
    assert!(unique_id.starts_with("MMPSM"));
    assert_eq!(unique_id.len(), 18);

    let registration_no = body["registrationNo"].as_str().unwrap();
    assert!(registration_no.starts_with("R-"));
    assert!(registration_no.contains(&format!("-{}-", &unique_id[14..])));

    let roll_number = body["rollNumber"].as_str().unwrap();
    assert_eq!(roll_number.len(), 7);
    assert!(roll_number.ends_with("02001"));

    assert_eq!(body["status"], "pending");
    assert_eq!(body["fatherName"], "Vikram Rao");
    assert!(body["createdAt"].as_i64().unwrap() > 0);
    assert!(body["createdDate"].as_str().unwrap().ends_with('Z'));

    let events = app.telemetry.named("admission_submitted");
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].properties["class"], "LKG");
}

#[tokio::test]
async fn test_create_keeps_supplied_identifiers() {
    let app = setup_test_app();

    let (status, body) = create(
        &app,
        json!({
            "admissionId": "ADM250001",
            "classApplied": "3",
            "uniqueId": "MMPSM0000000001234",
            "registrationNo": "R-2025-1234-100",
            "rollNumber": "2506009",
        }),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["admissionId"], "ADM250001");
    assert_eq!(body["registrationNo"], "R-2025-1234-100");
    assert_eq!(body["rollNumber"], "2506009");
}

#[tokio::test]
async fn test_roll_numbers_advance_per_class() {
    let app = setup_test_app();

    let first = create_ok(&app, "ADM250001", "7", "A").await;
    let second = create_ok(&app, "ADM250002", "7", "B").await;
    let other = create_ok(&app, "ADM250003", "Nursery", "C").await;

    assert!(first["rollNumber"].as_str().unwrap().ends_with("10001"));
    assert!(second["rollNumber"].as_str().unwrap().ends_with("10002"));
    assert!(other["rollNumber"].as_str().unwrap().ends_with("01001"));

    let (status, body) = send(&app.router, "GET", "/api/classes/7/count", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "class": "7", "count": 2 }));
}

#[tokio::test]
async fn test_create_rejects_bad_input() {
    let app = setup_test_app();

    let (status, body) = create(&app, json!({ "name": "No class" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "classApplied is required");

    let (status, _) = create(&app, json!({ "classApplied": "" })).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, body) = create(&app, json!({ "classApplied": "13" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("unknown class"));

    let (status, _) = create(&app, json!({ "admissionId": "ADM/1", "classApplied": "LKG" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    assert!(app.store.is_empty());
}

#[tokio::test]
async fn test_get_and_delete_admission() {
    let app = setup_test_app();
    create_ok(&app, "ADM250010", "UKG", "Meera").await;

    let (status, body) = send(&app.router, "GET", "/api/admissions/ADM250010", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "Meera");
    assert_eq!(body["classApplied"], "UKG");

    let (status, _) = send(&app.router, "DELETE", "/api/admissions/ADM250010", None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, body) = send(&app.router, "GET", "/api/admissions/ADM250010", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].as_str().unwrap().contains("not found"));

    // deleting again is not an error
    let (status, _) = send(&app.router, "DELETE", "/api/admissions/ADM250010", None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn test_list_filters_by_status_and_class() {
    let app = setup_test_app();
    create_ok(&app, "ADM250001", "LKG", "A").await;
    create_ok(&app, "ADM250002", "UKG", "B").await;
    create_ok(&app, "ADM250003", "LKG", "C").await;

    let (status, _) = send(
        &app.router,
        "PATCH",
        "/api/admissions/ADM250002/status",
        Some(json!({ "status": "approved" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, all) = send(&app.router, "GET", "/api/admissions", None).await;
    assert_eq!(all.as_array().unwrap().len(), 3);

    let (_, same) = send(&app.router, "GET", "/api/admissions?status=all", None).await;
    assert_eq!(same.as_array().unwrap().len(), 3);

    let (_, approved) = send(&app.router, "GET", "/api/admissions?status=approved", None).await;
    assert_eq!(ids(&approved), ["ADM250002"]);

    let (_, lkg) = send(&app.router, "GET", "/api/admissions?class=LKG", None).await;
    let mut lkg_ids = ids(&lkg);
    lkg_ids.sort_unstable();
    assert_eq!(lkg_ids, ["ADM250001", "ADM250003"]);

    let (status, _) = send(&app.router, "GET", "/api/admissions?status=waiting", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_update_status_records_remarks() {
    let app = setup_test_app();
    create_ok(&app, "ADM250020", "5", "Ravi").await;

    let (status, body) = send(
        &app.router,
        "PATCH",
        "/api/admissions/ADM250020/status",
        Some(json!({ "status": "rejected", "remarks": "Incomplete documents" })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "rejected");
    assert_eq!(body["remarks"], "Incomplete documents");
    assert!(body["lastUpdateDate"].is_string());
    assert!(body["updatedAt"].as_i64().unwrap() >= body["createdAt"].as_i64().unwrap());

    let events = app.telemetry.named("admission_status_updated");
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].properties["newStatus"], "rejected");

    let (status, _) = send(
        &app.router,
        "PATCH",
        "/api/admissions/ADM250020/status",
        Some(json!({ "status": "archived" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &app.router,
        "PATCH",
        "/api/admissions/ADM999999/status",
        Some(json!({ "status": "approved" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_pagination() {
    let app = setup_test_app();
    for n in 1..=5 {
        create_ok(&app, &format!("ADM25000{n}"), "1", "Student").await;
    }

    let (status, body) = send(&app.router, "GET", "/api/admissions/page?page=2&limit=2", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 5);
    assert_eq!(body["page"], 2);
    assert_eq!(body["limit"], 2);
    assert_eq!(body["totalPages"], 3);
    assert_eq!(body["data"].as_array().unwrap().len(), 2);

    let (_, past_end) = send(&app.router, "GET", "/api/admissions/page?page=9&limit=2", None).await;
    assert!(past_end["data"].as_array().unwrap().is_empty());

    let (status, _) = send(&app.router, "GET", "/api/admissions/page?page=0", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_search_is_case_insensitive() {
    let app = setup_test_app();
    create_ok(&app, "ADM250001", "2", "Priya Sharma").await;
    create_ok(&app, "ADM250002", "2", "Arjun Mehta").await;
    create_ok(&app, "ADM250003", "4", "priyanka Iyer").await;

    let (status, body) = send(&app.router, "GET", "/api/admissions/search?term=PRIYA", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ids(&body), ["ADM250001", "ADM250003"]);

    let (_, by_id) = send(
        &app.router,
        "GET",
        "/api/admissions/search?term=250002&field=admissionId",
        None,
    )
    .await;
    assert_eq!(ids(&by_id), ["ADM250002"]);

    let (_, everything) = send(&app.router, "GET", "/api/admissions/search", None).await;
    assert_eq!(everything.as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn test_recent_and_stats() {
    let app = setup_test_app();
    for (n, class) in ["LKG", "LKG", "1", "2"].iter().enumerate() {
        create_ok(&app, &format!("ADM25010{n}"), class, "Student").await;
        tokio::time::sleep(std::time::Duration::from_millis(3)).await;
    }
    send(
        &app.router,
        "PATCH",
        "/api/admissions/ADM250100/status",
        Some(json!({ "status": "approved" })),
    )
    .await;

    let (status, recent) = send(&app.router, "GET", "/api/admissions/recent?limit=2", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ids(&recent), ["ADM250103", "ADM250102"]);

    let (status, stats) = send(&app.router, "GET", "/api/admissions/stats", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stats["total"], 4);
    assert_eq!(stats["pending"], 3);
    assert_eq!(stats["approved"], 1);
    assert_eq!(stats["rejected"], 0);
    assert_eq!(stats["byClass"], json!({ "1": 1, "2": 1, "LKG": 2 }));
}

#[tokio::test]
async fn test_concurrent_creates_keep_exact_counter() {
    let app = setup_test_app();

    let tasks: Vec<_> = (0..25)
        .map(|n| {
            let router = app.router.clone();
            tokio::spawn(async move {
                let name: String = Name().fake();
                let body = json!({
                    "admissionId": format!("ADM25{n:04}"),
                    "classApplied": "9",
                    "name": name,
                });
                send(&router, "POST", "/api/admissions", Some(body)).await.0
            })
        })
        .collect();

    for task in tasks {
        assert_eq!(task.await.unwrap(), StatusCode::CREATED);
    }

    let (_, body) = send(&app.router, "GET", "/api/classes/9/count", None).await;
    assert_eq!(body["count"], 25);
}

#[tokio::test]
async fn test_offline_store_is_service_unavailable() {
    let app = setup_test_app();
    app.store.set_offline(true);

    let (status, body) = send(&app.router, "GET", "/api/admissions", None).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_document_upload_and_delete() {
    let app = setup_test_app();
    create_ok(&app, "ADM250030", "UKG", "Kiran").await;

    let (status, doc) = send_raw(
        &app.router,
        "POST",
        "/api/admissions/ADM250030/documents?name=birth%20certificate.pdf",
        b"%PDF-1.4 test".to_vec(),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{doc}");

    let key = doc["key"].as_str().unwrap();
    assert!(key.starts_with("admissions/ADM250030/"));
    assert!(key.ends_with("_birth_certificate.pdf"));
    let url = doc["url"].as_str().unwrap().to_string();
    assert_eq!(url, format!("/files/{key}"));
    assert!(app.upload_dir.join(key).exists());

    let (status, served) = send(&app.router, "GET", &url, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(served, "%PDF-1.4 test");

    // a document of another admission cannot be removed through this one
    let (status, _) = send(
        &app.router,
        "DELETE",
        &format!("/api/admissions/ADM250031/documents?url={url}"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &app.router,
        "DELETE",
        &format!("/api/admissions/ADM250030/documents?url={url}"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert!(!app.upload_dir.join(key).exists());

    let _ = std::fs::remove_dir_all(&app.upload_dir);
}

#[tokio::test]
async fn test_document_upload_requires_admission_and_body() {
    let app = setup_test_app();

    let (status, _) = send_raw(
        &app.router,
        "POST",
        "/api/admissions/ADM259999/documents?name=photo.jpg",
        b"jpeg".to_vec(),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    create_ok(&app, "ADM250040", "LKG", "Tara").await;
    let (status, _) = send_raw(
        &app.router,
        "POST",
        "/api/admissions/ADM250040/documents?name=photo.jpg",
        Vec::new(),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_records_with_foreign_status_are_counted() {
    let app = setup_test_app();
    app.store
        .put(
            "admissions/A1",
            json!({ "admissionId": "A1", "classApplied": "LKG", "status": "pending", "name": "Anu" }),
        )
        .await
        .unwrap();
    app.store
        .put(
            "admissions/A2",
            json!({ "admissionId": "A2", "classApplied": "UKG", "status": "waitlisted", "name": "Anand" }),
        )
        .await
        .unwrap();

    let (status, stats) = send(&app.router, "GET", "/api/admissions/stats", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stats["total"], 2);
    assert_eq!(stats["pending"], 1);
    assert_eq!(stats["byClass"], json!({ "LKG": 1, "UKG": 1 }));

    let (_, all) = send(&app.router, "GET", "/api/admissions", None).await;
    assert_eq!(all.as_array().unwrap().len(), 2);

    let (_, found) = send(&app.router, "GET", "/api/admissions/search?term=an", None).await;
    assert_eq!(found.as_array().unwrap().len(), 2);

    let (_, a2) = send(&app.router, "GET", "/api/admissions/A2", None).await;
    assert_eq!(a2["status"], "waitlisted");

    let (status, _) = create(&app, json!({ "classApplied": "LKG", "status": "waitlisted" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_admission_list_stream() {
    let app = setup_test_app();

    let (status, events) = open_events(&app.router, "/api/admissions/events").await;
    assert_eq!(status, StatusCode::OK);
    let mut events = events.unwrap();

    let (name, data) = events.next().await;
    assert_eq!(name, "admissions");
    assert_eq!(data, json!([]));

    create_ok(&app, "ADM100001", "LKG", "Asha Rao").await;
    let (_, data) = events.next().await;
    assert_eq!(ids(&data), ["ADM100001"]);
}

#[tokio::test]
async fn test_single_admission_stream() {
    let app = setup_test_app();

    let (status, events) = open_events(&app.router, "/api/admissions/ADM100002/events").await;
    assert_eq!(status, StatusCode::OK);
    let mut events = events.unwrap();

    let (name, data) = events.next().await;
    assert_eq!(name, "admission");
    assert!(data.is_null());

    create_ok(&app, "ADM100002", "UKG", "Ravi Menon").await;
    let (_, data) = events.next().await;
    assert_eq!(data["admissionId"], "ADM100002");
    assert_eq!(data["status"], "pending");

    let (status, _) = send(&app.router, "DELETE", "/api/admissions/ADM100002", None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (_, data) = events.next().await;
    assert!(data.is_null());

    let (status, events) = open_events(&app.router, "/api/admissions/ADM%24/events").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(events.is_none());
}

#[tokio::test]
async fn test_full_class_needs_supplied_roll_number() {
    let app = setup_test_app();
    app.store.put("classCounts/LKG", json!(999)).await.unwrap();

    let (status, body) = send(&app.router, "GET", "/api/classes/LKG/roll-number", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("outside 1..=999"));

    let (status, _) = create(&app, json!({ "classApplied": "LKG", "name": "Late Applicant" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = create(
        &app,
        json!({ "classApplied": "LKG", "name": "Late Applicant", "rollNumber": "2502A01" }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["rollNumber"], "2502A01");
}

//! Tests for the HTTP API, driven through the router without a socket.

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode, header};
use serde_json::{Value, json};
use std::sync::Arc;
use taskboard::api::{ApiServer, build_router};
use taskboard::config::ListingConfig;
use taskboard::db::Database;
use tower::ServiceExt;

fn setup_app() -> Router {
    let db = Database::open_in_memory().expect("Failed to create in-memory database");
    build_router(ApiServer::new(Arc::new(db), ListingConfig::default()))
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string())),
        None => builder.body(Body::empty()),
    }
    .expect("request");

    let response = app.clone().oneshot(request).await.expect("response");
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body bytes");
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("json body")
    };
    (status, value)
}

async fn create(app: &Router, title: &str, status: &str) -> Value {
    let (code, task) = send(
        app,
        "POST",
        "/tasks",
        Some(json!({"title": title, "status": status})),
    )
    .await;
    assert_eq!(code, StatusCode::OK);
    task
}

#[tokio::test]
async fn health_reports_ok() {
    let app = setup_app();
    let (code, body) = send(&app, "GET", "/api/health", None).await;
    assert_eq!(code, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn create_and_list_tasks() {
    let app = setup_app();

    let task = create(&app, "write tests", "ToDo").await;
    assert_eq!(task["title"], "write tests");
    assert_eq!(task["status"], "ToDo");
    assert_eq!(task["order_index"], 1);
    assert_eq!(task["tags"], json!([]));
    assert!(task["archives_at"].is_null());

    let (code, list) = send(&app, "GET", "/tasks", None).await;
    assert_eq!(code, StatusCode::OK);
    assert_eq!(list.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn done_task_reports_archive_time() {
    let app = setup_app();
    let task = create(&app, "finished", "Done").await;
    assert!(task["done_at"].is_string());
    assert!(task["archives_at"].is_string());
}

#[tokio::test]
async fn invalid_input_is_unprocessable() {
    let app = setup_app();

    let (code, body) = send(
        &app,
        "POST",
        "/tasks",
        Some(json!({"title": "x", "status": "Someday"})),
    )
    .await;
    assert_eq!(code, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["code"], "VALIDATION_ERROR");

    let (code, _) = send(&app, "POST", "/tasks", Some(json!({"status": "ToDo"}))).await;
    assert_eq!(code, StatusCode::UNPROCESSABLE_ENTITY);

    let (code, body) = send(
        &app,
        "POST",
        "/tasks",
        Some(json!({"title": "  ", "status": "ToDo"})),
    )
    .await;
    assert_eq!(code, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["field"], "title");
}

#[tokio::test]
async fn legacy_status_names_are_accepted() {
    let app = setup_app();
    let task = create(&app, "old client", "In Progress").await;
    assert_eq!(task["status"], "Ongoing");
}

#[tokio::test]
async fn reorder_endpoint() {
    let app = setup_app();
    let t1 = create(&app, "T1", "ToDo").await;
    let t2 = create(&app, "T2", "ToDo").await;

    let (code, body) = send(
        &app,
        "PUT",
        "/tasks/reorder",
        Some(json!({"status": "ToDo", "ordered_ids": [t2["id"], t1["id"], 999]})),
    )
    .await;

    assert_eq!(code, StatusCode::OK);
    let reordered = body.as_array().unwrap();
    assert_eq!(reordered.len(), 2);
    assert_eq!(reordered[0]["id"], t2["id"]);
    assert_eq!(reordered[0]["order_index"], 1);
    assert_eq!(reordered[1]["order_index"], 2);
}

#[tokio::test]
async fn patch_and_status_update() {
    let app = setup_app();
    let task = create(&app, "draft", "ToDo").await;
    let uri = format!("/tasks/{}", task["id"]);

    let (code, updated) = send(
        &app,
        "PUT",
        &uri,
        Some(json!({"description": "more detail", "tags": "a, A, b"})),
    )
    .await;
    assert_eq!(code, StatusCode::OK);
    assert_eq!(updated["title"], "draft");
    assert_eq!(updated["tags"], json!(["a", "b"]));

    let (_, cleared) = send(&app, "PUT", &uri, Some(json!({"description": null}))).await;
    assert!(cleared["description"].is_null());
    assert_eq!(cleared["tags"], json!(["a", "b"]));

    let (code, moved) = send(
        &app,
        "PUT",
        &format!("{}/status", uri),
        Some(json!({"status": "Done"})),
    )
    .await;
    assert_eq!(code, StatusCode::OK);
    assert_eq!(moved["status"], "Done");
    assert!(moved["done_at"].is_string());
}

#[tokio::test]
async fn delete_restore_and_purge() {
    let app = setup_app();
    let task = create(&app, "temporary", "ToDo").await;
    let uri = format!("/tasks/{}", task["id"]);

    let (code, archived) = send(&app, "DELETE", &uri, None).await;
    assert_eq!(code, StatusCode::OK);
    assert!(archived["deleted_at"].is_string());

    let (_, archive) = send(&app, "GET", "/tasks/archived", None).await;
    assert_eq!(archive.as_array().unwrap().len(), 1);

    let (code, restored) = send(&app, "PUT", &format!("{}/restore", uri), None).await;
    assert_eq!(code, StatusCode::OK);
    assert!(restored["deleted_at"].is_null());
    assert_eq!(restored["status"], "ToDo");

    send(&app, "DELETE", &uri, None).await;
    let (code, purged) = send(&app, "DELETE", "/tasks/archived", None).await;
    assert_eq!(code, StatusCode::OK);
    assert_eq!(purged["deleted_count"], 1);

    let (code, body) = send(&app, "DELETE", &uri, None).await;
    assert_eq!(code, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "NOT_FOUND");
}

#[tokio::test]
async fn second_delete_removes_permanently() {
    let app = setup_app();
    let task = create(&app, "gone", "ToDo").await;
    let uri = format!("/tasks/{}", task["id"]);

    send(&app, "DELETE", &uri, None).await;
    let (code, _) = send(&app, "DELETE", &uri, None).await;
    assert_eq!(code, StatusCode::OK);

    let (code, _) = send(&app, "DELETE", &uri, None).await;
    assert_eq!(code, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn tags_endpoint_lists_suggestions() {
    let app = setup_app();
    send(
        &app,
        "POST",
        "/tasks",
        Some(json!({"title": "t", "status": "ToDo", "tags": "Zeta, alpha"})),
    )
    .await;

    let (code, tags) = send(&app, "GET", "/tags", None).await;
    assert_eq!(code, StatusCode::OK);
    assert_eq!(tags, json!(["alpha", "Zeta"]));
}

#[tokio::test]
async fn list_paging_parameters() {
    let app = setup_app();
    for i in 0..3 {
        create(&app, &format!("t{}", i), "ToDo").await;
    }

    let (code, page) = send(&app, "GET", "/tasks?skip=1&limit=1", None).await;
    assert_eq!(code, StatusCode::OK);
    let page = page.as_array().unwrap();
    assert_eq!(page.len(), 1);
    assert_eq!(page[0]["title"], "t1");
}

#[tokio::test]
async fn malformed_ids_and_paging_are_unprocessable() {
    let app = setup_app();

    for (method, uri) in [
        ("GET", "/tasks/abc"),
        ("DELETE", "/tasks/abc"),
        ("PUT", "/tasks/abc/restore"),
        ("GET", "/tasks?skip=abc"),
        ("GET", "/tasks/archived?limit=many"),
    ] {
        let (code, body) = send(&app, method, uri, None).await;
        assert_eq!(code, StatusCode::UNPROCESSABLE_ENTITY, "{} {}", method, uri);
        assert_eq!(body["code"], "VALIDATION_ERROR", "{} {}", method, uri);
    }

    let (code, body) = send(
        &app,
        "PUT",
        "/tasks/abc/status",
        Some(json!({"status": "Done"})),
    )
    .await;
    assert_eq!(code, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["code"], "VALIDATION_ERROR");
}

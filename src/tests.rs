use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt; // for `oneshot`

use crate::{auth::TokenService, create_app, db, AppState};

async fn setup_app() -> Router {
    // In-memory SQLite database with the real migrations
    let pool = db::test_pool().await;
    create_app(AppState {
        pool,
        tokens: TokenService::new("test-secret"),
    })
}

async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

async fn register(app: &Router, username: &str) -> String {
    let (status, body) = send(
        app,
        "POST",
        "/api/auth/register",
        None,
        Some(json!({
            "username": username,
            "email": format!("{username}@example.com"),
            "password": "Password1",
            "firstName": "Test",
            "lastName": "User"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "register failed: {body}");
    body["token"].as_str().unwrap().to_string()
}

async fn create_todo(app: &Router, token: &str, title: &str) -> i64 {
    let (status, body) = send(
        app,
        "POST",
        "/api/todos",
        Some(token),
        Some(json!({ "title": title, "priority": 1 })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    body["id"].as_i64().unwrap()
}

#[tokio::test]
async fn test_health() {
    let app = setup_app().await;
    let (status, body) = send(&app, "GET", "/api/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "Healthy");
}

#[tokio::test]
async fn test_register_and_login() {
    let app = setup_app().await;
    register(&app, "alice").await;

    let (status, body) = send(
        &app,
        "POST",
        "/api/auth/login",
        None,
        Some(json!({ "username": "alice", "password": "Password1" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["token"].is_string());
    assert_eq!(body["user"]["username"], "alice");
    assert_eq!(body["user"]["firstName"], "Test");
    assert!(body["expiresAt"].is_string());
    assert!(body["user"].get("passwordHash").is_none());

    let (status, body) = send(
        &app,
        "POST",
        "/api/auth/login",
        None,
        Some(json!({ "username": "alice", "password": "Password2" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Invalid credentials");
}

#[tokio::test]
async fn test_register_rejects_duplicates_and_weak_passwords() {
    let app = setup_app().await;
    register(&app, "alice").await;

    let (status, body) = send(
        &app,
        "POST",
        "/api/auth/register",
        None,
        Some(json!({
            "username": "alice",
            "email": "new@example.com",
            "password": "Password1",
            "firstName": "A",
            "lastName": "B"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Username already exists");

    let (status, _) = send(
        &app,
        "POST",
        "/api/auth/register",
        None,
        Some(json!({
            "username": "bob",
            "email": "bob@example.com",
            "password": "password1",
            "firstName": "B",
            "lastName": "B"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_protected_routes_require_a_valid_token() {
    let app = setup_app().await;

    let (status, _) = send(&app, "GET", "/api/todos", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(&app, "GET", "/api/todos", Some("garbage"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let foreign = register(&setup_app().await, "mallory").await;
    let other_app = create_app(AppState {
        pool: db::test_pool().await,
        tokens: TokenService::new("a-different-secret"),
    });
    let (status, _) = send(&other_app, "GET", "/api/todos", Some(&foreign), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_todo_of_another_user_is_not_found() {
    let app = setup_app().await;
    let alice = register(&app, "alice").await;
    let bob = register(&app, "bob").await;
    let todo_id = create_todo(&app, &alice, "private").await;

    let uri = format!("/api/todos/{todo_id}");
    let (status, _) = send(&app, "GET", &uri, Some(&bob), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, "DELETE", &uri, Some(&bob), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(
        &app,
        "POST",
        &format!("/api/todos/{todo_id}/subtasks"),
        Some(&bob),
        Some(json!({ "title": "sneaky", "order": 0 })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = send(&app, "GET", &uri, Some(&alice), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["subtasks"], json!([]));
}

#[tokio::test]
async fn test_delete_hides_todo() {
    let app = setup_app().await;
    let token = register(&app, "alice").await;
    let todo_id = create_todo(&app, &token, "short-lived").await;
    let uri = format!("/api/todos/{todo_id}");

    let (status, _) = send(&app, "DELETE", &uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = send(&app, "GET", &uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, "DELETE", &uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, list) = send(&app, "GET", "/api/todos", Some(&token), None).await;
    assert_eq!(list, json!([]));
}

#[tokio::test]
async fn test_reorder_todos() {
    let app = setup_app().await;
    let token = register(&app, "alice").await;
    let a = create_todo(&app, &token, "a").await;
    let b = create_todo(&app, &token, "b").await;

    let (status, body) = send(
        &app,
        "POST",
        "/api/todos/reorder",
        Some(&token),
        Some(json!({ "todoIds": [b] })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());

    let (status, _) = send(
        &app,
        "POST",
        "/api/todos/reorder",
        Some(&token),
        Some(json!({ "todoIds": [b, a] })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, list) = send(&app, "GET", "/api/todos", Some(&token), None).await;
    assert_eq!(list[0]["id"], b);
    assert_eq!(list[0]["order"], 0);
    assert_eq!(list[1]["id"], a);
    assert_eq!(list[1]["order"], 1);
}

#[tokio::test]
async fn test_end_to_end_subtask_reorder() {
    let app = setup_app().await;
    let token = register(&app, "user1").await;
    let todo_id = create_todo(&app, &token, "T1").await;
    let subtasks_uri = format!("/api/todos/{todo_id}/subtasks");

    let (status, first) = send(
        &app,
        "POST",
        &subtasks_uri,
        Some(&token),
        Some(json!({ "title": "first", "order": 0 })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let (_, second) = send(
        &app,
        "POST",
        &subtasks_uri,
        Some(&token),
        Some(json!({ "title": "second", "order": 1 })),
    )
    .await;
    let first_id = first["id"].as_i64().unwrap();
    let second_id = second["id"].as_i64().unwrap();

    let (status, _) = send(
        &app,
        "POST",
        &format!("{subtasks_uri}/reorder"),
        Some(&token),
        Some(json!({ "subtaskIds": [second_id, first_id] })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, todo) = send(&app, "GET", &format!("/api/todos/{todo_id}"), Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(todo["priority"], 1);
    assert_eq!(todo["status"], 0);
    let subtasks = todo["subtasks"].as_array().unwrap();
    assert_eq!(subtasks.len(), 2);
    assert_eq!(subtasks[0]["id"], second_id);
    assert_eq!(subtasks[0]["order"], 0);
    assert_eq!(subtasks[1]["id"], first_id);
    assert_eq!(subtasks[1]["order"], 1);
}

#[tokio::test]
async fn test_subtask_under_wrong_todo_path_is_not_found() {
    let app = setup_app().await;
    let token = register(&app, "alice").await;
    let t1 = create_todo(&app, &token, "t1").await;
    let t2 = create_todo(&app, &token, "t2").await;

    let (_, sub) = send(
        &app,
        "POST",
        &format!("/api/todos/{t1}/subtasks"),
        Some(&token),
        Some(json!({ "title": "s" })),
    )
    .await;
    let sub_id = sub["id"].as_i64().unwrap();

    let (status, _) = send(
        &app,
        "GET",
        &format!("/api/todos/{t2}/subtasks/{sub_id}"),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(
        &app,
        "PUT",
        &format!("/api/todos/{t2}/subtasks/{sub_id}"),
        Some(&token),
        Some(json!({ "title": "moved", "description": "", "status": 2, "order": 0 })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = send(
        &app,
        "GET",
        &format!("/api/todos/{t1}/subtasks/{sub_id}"),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["title"], "s");
    assert_eq!(body["todoId"], t1);
}

#[tokio::test]
async fn test_malformed_body_uses_error_shape() {
    let app = setup_app().await;
    let token = register(&app, "alice").await;
    let todo_id = create_todo(&app, &token, "t").await;

    let (status, body) = send(
        &app,
        "PUT",
        &format!("/api/todos/{todo_id}"),
        Some(&token),
        Some(json!({ "title": "t", "description": "", "status": 7, "priority": 1 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string(), "unexpected body: {body}");

    let (status, body) = send(
        &app,
        "POST",
        "/api/todos",
        Some(&token),
        Some(json!({ "title": "   " })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "title is required");
}

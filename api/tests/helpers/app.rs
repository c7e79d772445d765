use api::auth::generate_jwt;
use api::routes::routes;
use api::ws::ws_routes;
use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode, header};
use db::models::user::{Model as UserModel, Role};
use db::test_utils::setup_test_db;
use serde_json::Value;
use tower::ServiceExt;
use util::{state::AppState, ws::WebSocketManager};

/// Builds the full application router against a fresh in-memory database.
pub async fn make_test_app() -> (Router, AppState) {
    let db = setup_test_db().await;
    let state = AppState::new(db, WebSocketManager::new());

    let app = Router::new()
        .nest("/api", routes(state.clone()))
        .nest("/ws", ws_routes(state.clone()));

    (app, state)
}

/// Inserts a user directly and mints a bearer token for them.
pub async fn seed_user(
    state: &AppState,
    email: &str,
    name: &str,
    role: Role,
    department: Option<&str>,
    student_number: Option<&str>,
) -> (UserModel, String) {
    let user = UserModel::create(
        state.db(),
        email,
        "password123",
        name,
        role,
        department,
        student_number,
    )
    .await
    .expect("seeding user failed");

    let (token, _) = generate_jwt(&user.id);
    (user, token)
}

/// Fires one request at the app and decodes the JSON body.
pub async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }

    let request = match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };

    (status, json)
}

pub async fn get(app: &Router, uri: &str, token: &str) -> (StatusCode, Value) {
    send(app, "GET", uri, Some(token), None).await
}

pub async fn post_json(app: &Router, uri: &str, token: &str, body: Value) -> (StatusCode, Value) {
    send(app, "POST", uri, Some(token), Some(body)).await
}

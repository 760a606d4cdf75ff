use axum::{
    extract::DefaultBodyLimit,
    http::StatusCode,
    middleware,
    response::Json,
    routing::{get, post},
    Router,
};
use serde::Serialize;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tower_sessions::{MemoryStore, SessionManagerLayer};

use crate::handlers;
use crate::middleware::auth_layer;
use crate::state::AppState;

pub mod health;

/// API response wrapper
#[derive(Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub code: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            code: true,
            message: "success".to_string(),
            data: Some(data),
        }
    }
}

impl ApiResponse<()> {
    pub fn success_msg(message: impl Into<String>) -> Self {
        Self {
            code: true,
            message: message.into(),
            data: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            code: false,
            message: message.into(),
            data: None,
        }
    }
}

/// Create the main router
pub fn create_router(state: AppState) -> Router {
    // Session store (in-memory for now)
    let session_store = MemoryStore::default();
    let session_layer = SessionManagerLayer::new(session_store)
        .with_secure(state.config.session.secure)
        .with_http_only(true);

    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_routes = Router::new()
        // Health check
        .route("/health", get(health::health_check))
        // Auth routes
        .route("/login", post(handlers::auth::login))
        .route("/logout", post(handlers::auth::logout))
        .route("/user/current", get(handlers::auth::current_user))
        // Group routes
        .route("/group/find", get(handlers::group::find_groups))
        .route("/group/isMember", get(handlers::group::is_member))
        .route(
            "/group/save",
            post(handlers::group::save_group)
                .layer(DefaultBodyLimit::max(state.config.max_request_size)),
        )
        .route("/group/membership", post(handlers::group::update_membership))
        .route("/group/listing", post(handlers::group::update_listing))
        .route("/group/:id", get(handlers::group::get_group));

    Router::new()
        .nest("/api", api_routes)
        .fallback(fallback)
        .layer(middleware::from_fn_with_state(state.clone(), auth_layer))
        .layer(session_layer)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Fallback handler for 404
pub async fn fallback() -> (StatusCode, Json<ApiResponse<()>>) {
    (StatusCode::NOT_FOUND, Json(ApiResponse::error("Not Found")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request};
    use serde_json::{json, Value};
    use std::sync::Arc;
    use tower::ServiceExt;

    use crate::config::Config;
    use crate::model::User;
    use crate::store::MemoryStore as GroupMemoryStore;

    fn app() -> (Arc<GroupMemoryStore>, Router) {
        let store = Arc::new(GroupMemoryStore::new());
        let hash = bcrypt::hash("secret", 4).unwrap();
        for name in ["alice", "bob"] {
            store.insert_user(User {
                id: format!("id-{}", name),
                username: name.to_string(),
                full_name: name.to_uppercase(),
                password_hash: hash.clone(),
            });
        }
        let state = AppState::with_memory(store.clone(), Config::default());
        (store, create_router(state))
    }

    async fn send(app: &Router, method: &str, uri: &str, cookie: Option<&str>, body: Option<Value>) -> (StatusCode, Option<String>, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(c) = cookie {
            builder = builder.header(header::COOKIE, c);
        }
        let request = match body {
            Some(b) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(b.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let set_cookie = response
            .headers()
            .get(header::SET_COOKIE)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(';').next())
            .map(|v| v.to_string());
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, set_cookie, value)
    }

    async fn login(app: &Router, username: &str) -> String {
        let (status, cookie, _) = send(
            app,
            "POST",
            "/api/login",
            None,
            Some(json!({"username": username, "password": "secret"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        cookie.expect("session cookie")
    }

    #[tokio::test]
    async fn test_health() {
        let (_, app) = app();
        let (status, _, body) = send(&app, "GET", "/api/health", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["status"], "healthy");
        assert_eq!(body["data"]["storage"], "memory");
    }

    #[tokio::test]
    async fn test_wrong_password() {
        let (_, app) = app();
        let (status, _, body) = send(
            &app,
            "POST",
            "/api/login",
            None,
            Some(json!({"username": "alice", "password": "nope"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], 400);
    }

    #[tokio::test]
    async fn test_anonymous_create_is_rejected() {
        let (_, app) = app();
        let (status, _, body) = send(
            &app,
            "POST",
            "/api/group/save",
            None,
            Some(json!({"groupId": "create", "changes": {"name": "Anon"}})),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["code"], 401);
    }

    #[tokio::test]
    async fn test_anonymous_membership_is_silent() {
        let (_, app) = app();
        let (status, _, body) = send(
            &app,
            "POST",
            "/api/group/membership",
            None,
            Some(json!({"userId": "id-bob", "groupId": "whatever", "join": true})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["code"], true);
    }

    #[tokio::test]
    async fn test_group_flow() {
        let (store, app) = app();
        let alice = login(&app, "alice").await;

        let (status, _, body) = send(
            &app,
            "POST",
            "/api/group/save",
            Some(&alice),
            Some(json!({"groupId": "create", "changes": {"name": "Chess", "shortName": "chess"}})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["result"], "created");
        let group_id = body["data"]["id"].as_str().unwrap().to_string();

        let (_, _, body) = send(&app, "GET", "/api/group/find?own=true", Some(&alice), None).await;
        assert_eq!(body["data"]["total"], 1);
        assert_eq!(body["data"]["groups"][0]["shortName"], "chess");

        let (_, _, body) = send(&app, "GET", "/api/group/find?user=", Some(&alice), None).await;
        assert_eq!(body["data"]["total"], 0);

        let (status, _, _) = send(
            &app,
            "POST",
            "/api/group/membership",
            Some(&alice),
            Some(json!({"userId": "id-bob", "groupId": group_id, "join": true})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let uri = format!("/api/group/isMember?userId=id-bob&groupId={}", group_id);
        let (_, _, body) = send(&app, "GET", &uri, None, None).await;
        assert_eq!(body["data"]["member"], true);

        store.insert_course("course-1");
        let (status, _, _) = send(
            &app,
            "POST",
            "/api/group/listing",
            Some(&alice),
            Some(json!({"thingId": "course-1", "groupId": group_id, "join": true})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (status, _, body) = send(
            &app,
            "POST",
            "/api/group/listing",
            Some(&alice),
            Some(json!({"thingId": "nowhere", "groupId": group_id, "join": true})),
        )
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["message"], "Query affected 0 documents, expected 1");

        let (status, _, body) = send(&app, "GET", &format!("/api/group/{}", group_id), None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["members"], json!(["id-alice", "id-bob"]));
    }

    #[tokio::test]
    async fn test_large_description_is_accepted_and_capped() {
        let (_, app) = app();
        let alice = login(&app, "alice").await;

        let description = "d".repeat(3 * 1024 * 1024);
        let (status, _, body) = send(
            &app,
            "POST",
            "/api/group/save",
            Some(&alice),
            Some(json!({"groupId": "create", "changes": {"name": "Big", "description": description}})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let group_id = body["data"]["id"].as_str().unwrap().to_string();

        let (status, _, body) = send(&app, "GET", &format!("/api/group/{}", group_id), None, None).await;
        assert_eq!(status, StatusCode::OK);
        let stored = body["data"]["description"].as_str().unwrap();
        assert_eq!(stored.chars().count(), crate::sanitize::DESCRIPTION_MAX);
    }

    #[tokio::test]
    async fn test_unknown_group_is_404() {
        let (_, app) = app();
        let (status, _, body) = send(&app, "GET", "/api/group/missing", None, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "Group not found");
    }
}

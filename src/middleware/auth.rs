//! Authentication middleware
//!
//! Resolves the session into a [`Caller`]. Requests are never rejected here:
//! anonymous callers pass through as `Caller(None)` and the group operations
//! decide what that means.

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::Response,
};
use tower_sessions::Session;

use crate::model::User;
use crate::state::AppState;

/// Session key for storing the user id
pub const SESSION_USER_KEY: &str = "user";
pub const SESSION_TIMESTAMP_KEY: &str = "timestamp";

/// Logged-in user
#[derive(Clone, Debug)]
pub struct CurrentUser {
    pub id: String,
    pub username: String,
    pub full_name: String,
}

impl From<User> for CurrentUser {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            full_name: user.full_name,
        }
    }
}

/// Identity of whoever sent the request, if anyone
#[derive(Clone, Debug, Default)]
pub struct Caller(pub Option<CurrentUser>);

impl Caller {
    pub fn id(&self) -> Option<&str> {
        self.0.as_ref().map(|u| u.id.as_str())
    }
}

/// Authentication middleware
pub async fn auth_layer(
    State(state): State<AppState>,
    session: Session,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let user_id: Option<String> = session.get(SESSION_USER_KEY).await.unwrap_or(None);

    let caller = match user_id {
        Some(id) => match state.users.get_user(&id).await {
            Ok(Some(user)) => Caller(Some(user.into())),
            Ok(None) => {
                tracing::warn!("Session user not found: {}", id);
                Caller(None)
            }
            Err(e) => {
                tracing::error!("Database error during auth: {}", e);
                Caller(None)
            }
        },
        None => Caller(None),
    };

    request.extensions_mut().insert(caller);
    next.run(request).await
}

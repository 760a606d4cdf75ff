//! Group handlers
//!
//! Remote entry points for the group library. The caller identity comes from
//! the session via the [`Caller`] extension.

use axum::{
    extract::{Path, Query, State},
    response::Json,
    Extension,
};
use serde::{Deserialize, Serialize};

use crate::error::AppResult;
use crate::group::{GroupFilter, SaveOutcome};
use crate::middleware::Caller;
use crate::model::{Group, GroupChanges};
use crate::routes::ApiResponse;
use crate::state::AppState;

/// Query parameters for GET /api/group/find
#[derive(Debug, Default, Deserialize)]
pub struct FindQuery {
    #[serde(default)]
    pub own: bool,
    /// Present but empty means "no such user"
    pub user: Option<String>,
    pub limit: Option<u64>,
}

impl FindQuery {
    fn filter(&self) -> GroupFilter {
        GroupFilter {
            own: self.own,
            user: self.user.clone().map(Some),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct FindResponse {
    pub groups: Vec<Group>,
    pub total: u64,
}

#[derive(Debug, Deserialize)]
pub struct MemberQuery {
    #[serde(rename = "userId")]
    pub user_id: String,
    #[serde(rename = "groupId")]
    pub group_id: String,
}

#[derive(Debug, Serialize)]
pub struct MemberResponse {
    pub member: bool,
}

#[derive(Debug, Deserialize)]
pub struct SaveGroupRequest {
    #[serde(rename = "groupId")]
    pub group_id: String,
    #[serde(default)]
    pub changes: GroupChanges,
}

#[derive(Debug, Deserialize)]
pub struct MembershipRequest {
    #[serde(rename = "userId")]
    pub user_id: String,
    #[serde(rename = "groupId")]
    pub group_id: String,
    pub join: bool,
}

#[derive(Debug, Deserialize)]
pub struct ListingRequest {
    #[serde(rename = "thingId")]
    pub thing_id: String,
    #[serde(rename = "groupId")]
    pub group_id: String,
    pub join: bool,
}

/// GET /api/group/find
pub async fn find_groups(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Query(query): Query<FindQuery>,
) -> AppResult<Json<ApiResponse<FindResponse>>> {
    let cursor = state.groups.lib().find(caller.id(), &query.filter(), query.limit);
    let groups = cursor.fetch().await?;
    let total = cursor.count().await?;
    Ok(Json(ApiResponse::success(FindResponse { groups, total })))
}

/// GET /api/group/isMember
pub async fn is_member(
    State(state): State<AppState>,
    Query(query): Query<MemberQuery>,
) -> AppResult<Json<ApiResponse<MemberResponse>>> {
    let member = state.groups.lib().is_member(&query.user_id, &query.group_id).await?;
    Ok(Json(ApiResponse::success(MemberResponse { member })))
}

/// GET /api/group/:id
pub async fn get_group(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<ApiResponse<Group>>> {
    let group = state.groups.get_group(&id).await?;
    Ok(Json(ApiResponse::success(group)))
}

/// POST /api/group/save
pub async fn save_group(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Json(req): Json<SaveGroupRequest>,
) -> AppResult<Json<ApiResponse<SaveOutcome>>> {
    let outcome = state
        .groups
        .save_group(caller.id(), &req.group_id, &req.changes)
        .await?;
    Ok(Json(ApiResponse::success(outcome)))
}

/// POST /api/group/membership
pub async fn update_membership(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Json(req): Json<MembershipRequest>,
) -> AppResult<Json<ApiResponse<()>>> {
    state
        .groups
        .update_group_membership(caller.id(), &req.user_id, &req.group_id, req.join)
        .await?;
    Ok(Json(ApiResponse::success_msg("success")))
}

/// POST /api/group/listing
pub async fn update_listing(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Json(req): Json<ListingRequest>,
) -> AppResult<Json<ApiResponse<()>>> {
    state
        .groups
        .update_group_listing(caller.id(), &req.thing_id, &req.group_id, req.join)
        .await?;
    Ok(Json(ApiResponse::success_msg("success")))
}

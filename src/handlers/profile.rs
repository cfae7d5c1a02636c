use axum::{
    extract::{Path, State},
    Extension,
};
use serde::Serialize;
use uuid::Uuid;

use super::extract::JsonBody;
use crate::auth::AuthContext;
use crate::middleware::{ApiResponse, ApiResult};
use crate::profile::{Profile, ProfileInput, ProfilePatch, ProfileStatus};
use crate::server::AppState;
use crate::types::Role;

/// Short acknowledgement returned by the write endpoints.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileSaved {
    pub id: Uuid,
    pub role: Role,
    pub is_complete: bool,
    pub message: &'static str,
}

impl ProfileSaved {
    fn new(profile: &Profile, message: &'static str) -> Self {
        Self {
            id: profile.id,
            role: profile.role,
            is_complete: profile.is_complete,
            message,
        }
    }
}

/// GET /api/profile/check
pub async fn profile_check(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
) -> ApiResult<ProfileStatus> {
    let status = state.profiles.check(&ctx).await?;
    Ok(ApiResponse::success(status))
}

/// GET /api/profile/:userId
pub async fn profile_get(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Path(user_id): Path<String>,
) -> ApiResult<Profile> {
    let profile = state.profiles.get(&ctx, &user_id).await?;
    Ok(ApiResponse::success(profile))
}

/// POST /api/profile/create - create or replace the caller's profile
pub async fn profile_create(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    JsonBody(input): JsonBody<ProfileInput>,
) -> ApiResult<ProfileSaved> {
    let profile = state.profiles.upsert(&ctx, input).await?;
    let message = if profile.is_complete {
        "Profile created successfully!"
    } else {
        "Profile saved as draft"
    };
    Ok(ApiResponse::success(ProfileSaved::new(&profile, message)))
}

/// PATCH /api/profile/:userId
pub async fn profile_update(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Path(user_id): Path<String>,
    JsonBody(patch): JsonBody<ProfilePatch>,
) -> ApiResult<ProfileSaved> {
    let profile = state.profiles.update(&ctx, &user_id, patch).await?;
    Ok(ApiResponse::success(ProfileSaved::new(&profile, "Profile updated successfully")))
}

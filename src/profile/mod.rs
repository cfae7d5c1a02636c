//! Per-experience founder and investor profiles.

pub mod schema;
pub mod service;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use uuid::Uuid;

use crate::store::StoreError;
use crate::types::Role;

pub use schema::{AmountRange, FounderData, InvestorData, ProfileData, StartupStage, Strictness, Violations};
pub use service::ProfileService;

#[derive(Debug, Error)]
pub enum ProfileError {
    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Profile not found")]
    NotFound,

    #[error("Invalid profile data")]
    InvalidPayload(Violations),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// One profile per `(user_id, experience_id)`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub id: Uuid,
    pub user_id: String,
    pub experience_id: String,
    pub role: Role,
    pub data: ProfileData,
    pub is_complete: bool,
    /// First time the profile was saved complete. Locks the role.
    #[serde(skip_serializing)]
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Profile {
    pub fn role_locked(&self) -> bool {
        self.completed_at.is_some()
    }
}

/// Answer to "does the caller have a profile here?".
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileStatus {
    pub has_profile: bool,
    pub is_complete: bool,
    pub role: Option<Role>,
}

impl ProfileStatus {
    pub fn missing() -> Self {
        Self { has_profile: false, is_complete: false, role: None }
    }
}

impl From<&Profile> for ProfileStatus {
    fn from(profile: &Profile) -> Self {
        Self {
            has_profile: true,
            is_complete: profile.is_complete,
            role: Some(profile.role),
        }
    }
}

/// Create-or-replace request for the caller's own profile.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileInput {
    pub user_id: String,
    pub role: Role,
    #[serde(default = "empty_object")]
    pub data: Value,
    #[serde(default)]
    pub is_complete: bool,
}

/// Partial update; absent fields keep their stored values.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfilePatch {
    pub data: Option<Value>,
    pub is_complete: Option<bool>,
}

fn empty_object() -> Value {
    Value::Object(Default::default())
}

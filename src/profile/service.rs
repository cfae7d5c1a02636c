use std::sync::Arc;

use chrono::{DateTime, Duration, SubsecRound, Utc};
use serde_json::Value;
use tracing::{debug, info};
use uuid::Uuid;

use super::{Profile, ProfileData, ProfileError, ProfileInput, ProfilePatch, ProfileStatus, Strictness};
use crate::auth::AuthContext;
use crate::store::{ProfileStore, StoreError};
use crate::types::Role;

/// Profile lifecycle: ownership, role schema, draft/complete transitions.
#[derive(Clone)]
pub struct ProfileService {
    store: Arc<dyn ProfileStore>,
}

impl ProfileService {
    pub fn new(store: Arc<dyn ProfileStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<dyn ProfileStore> {
        &self.store
    }

    pub async fn check(&self, ctx: &AuthContext) -> Result<ProfileStatus, ProfileError> {
        let profile = self.store.find(&ctx.user_id, &ctx.experience_id).await?;
        Ok(profile.as_ref().map(ProfileStatus::from).unwrap_or_else(ProfileStatus::missing))
    }

    pub async fn get(&self, ctx: &AuthContext, target_user_id: &str) -> Result<Profile, ProfileError> {
        self.store
            .find(target_user_id, &ctx.experience_id)
            .await?
            .ok_or(ProfileError::NotFound)
    }

    pub async fn upsert(&self, ctx: &AuthContext, input: ProfileInput) -> Result<Profile, ProfileError> {
        if ctx.user_id != input.user_id {
            return Err(ProfileError::Forbidden(
                "You can only create your own profile".to_string(),
            ));
        }

        let strictness = Strictness::for_completion(input.is_complete);
        let data = ProfileData::parse(input.role, input.data, strictness)
            .map_err(ProfileError::InvalidPayload)?;

        let existing = self.store.find(&ctx.user_id, &ctx.experience_id).await?;
        if let Some(current) = &existing {
            if current.role_locked() && current.role != input.role {
                return Err(role_conflict(current.role));
            }
        }

        let now = next_timestamp(existing.as_ref().map(|p| p.updated_at));
        let profile = match existing {
            Some(current) => Profile {
                role: input.role,
                data,
                is_complete: input.is_complete,
                completed_at: completion_time(current.completed_at, input.is_complete, now),
                updated_at: now,
                ..current
            },
            None => Profile {
                id: Uuid::new_v4(),
                user_id: ctx.user_id.clone(),
                experience_id: ctx.experience_id.clone(),
                role: input.role,
                data,
                is_complete: input.is_complete,
                completed_at: completion_time(None, input.is_complete, now),
                created_at: now,
                updated_at: now,
            },
        };

        // The store re-checks the lock atomically against concurrent writers.
        let saved = self.store.save(&profile).await.map_err(|e| match e {
            StoreError::RoleLocked(role) => role_conflict(role),
            other => other.into(),
        })?;
        info!(
            profile_id = %saved.id,
            role = %saved.role,
            is_complete = saved.is_complete,
            "Profile saved"
        );
        Ok(saved)
    }

    pub async fn update(
        &self,
        ctx: &AuthContext,
        target_user_id: &str,
        patch: ProfilePatch,
    ) -> Result<Profile, ProfileError> {
        if ctx.user_id != target_user_id {
            return Err(ProfileError::Forbidden(
                "You can only update your own profile".to_string(),
            ));
        }

        let current = self
            .store
            .find(target_user_id, &ctx.experience_id)
            .await?
            .ok_or(ProfileError::NotFound)?;

        let is_complete = patch.is_complete.unwrap_or(current.is_complete);
        let strictness = Strictness::for_completion(is_complete);

        // The whole resulting payload is validated, not just the supplied part.
        let data = match patch.data {
            Some(changes) => {
                let merged = overlay(current.data.to_value(), changes);
                ProfileData::parse(current.role, merged, strictness)
            }
            None => current.data.check(strictness).map(|_| current.data.clone()),
        }
        .map_err(ProfileError::InvalidPayload)?;

        let now = next_timestamp(Some(current.updated_at));
        let profile = Profile {
            data,
            is_complete,
            completed_at: completion_time(current.completed_at, is_complete, now),
            updated_at: now,
            ..current
        };

        let saved = self.store.save(&profile).await?;
        debug!(profile_id = %saved.id, is_complete = saved.is_complete, "Profile updated");
        Ok(saved)
    }
}

fn role_conflict(current: Role) -> ProfileError {
    ProfileError::Conflict(format!(
        "Role cannot be changed from {} after the profile has been completed",
        current
    ))
}

/// Top-level keys of `changes` replace those of `base`; a non-object
/// change replaces the whole payload and fails schema parsing.
fn overlay(base: Value, changes: Value) -> Value {
    match (base, changes) {
        (Value::Object(mut base), Value::Object(changes)) => {
            base.extend(changes);
            Value::Object(base)
        }
        (_, changes) => changes,
    }
}

fn completion_time(
    previous: Option<DateTime<Utc>>,
    is_complete: bool,
    now: DateTime<Utc>,
) -> Option<DateTime<Utc>> {
    previous.or_else(|| is_complete.then_some(now))
}

/// Microsecond precision (what Postgres keeps), strictly after `previous`.
fn next_timestamp(previous: Option<DateTime<Utc>>) -> DateTime<Utc> {
    let now = Utc::now().trunc_subsecs(6);
    match previous {
        Some(previous) if now <= previous => previous + Duration::microseconds(1),
        _ => now,
    }
}

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{ProfileStore, StoreError};
use crate::profile::Profile;

type Key = (String, String);

/// In-process profile store with the same upsert contract as Postgres.
#[derive(Default)]
pub struct MemoryProfileStore {
    profiles: RwLock<HashMap<Key, Profile>>,
}

impl MemoryProfileStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.profiles.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.profiles.read().await.is_empty()
    }
}

#[async_trait]
impl ProfileStore for MemoryProfileStore {
    async fn find(&self, user_id: &str, experience_id: &str) -> Result<Option<Profile>, StoreError> {
        let profiles = self.profiles.read().await;
        Ok(profiles
            .get(&(user_id.to_string(), experience_id.to_string()))
            .cloned())
    }

    async fn save(&self, profile: &Profile) -> Result<Profile, StoreError> {
        let key = (profile.user_id.clone(), profile.experience_id.clone());
        let mut profiles = self.profiles.write().await;

        let saved = match profiles.get(&key) {
            Some(existing) if existing.role_locked() && existing.role != profile.role => {
                return Err(StoreError::RoleLocked(existing.role));
            }
            Some(existing) => Profile {
                id: existing.id,
                created_at: existing.created_at,
                completed_at: existing.completed_at.or(profile.completed_at),
                ..profile.clone()
            },
            None => profile.clone(),
        };
        profiles.insert(key, saved.clone());
        Ok(saved)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

//! Keyed persistence for profiles.
//!
//! Backends implement [`ProfileStore`]; the server picks one from
//! `DATABASE_URL` (`memory://` selects the in-process map).

pub mod memory;
pub mod postgres;

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::config::DatabaseConfig;
use crate::profile::Profile;
use crate::types::Role;

pub use memory::MemoryProfileStore;
pub use postgres::PgProfileStore;

pub const MEMORY_URL_SCHEME: &str = "memory://";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Store connection failed: {0}")]
    Connection(String),

    #[error("Store query failed: {0}")]
    Query(String),

    #[error("Stored profile is unreadable: {0}")]
    Decode(String),

    #[error("Migration failed: {0}")]
    Migration(String),

    #[error("Profile role is locked to {0}")]
    RoleLocked(Role),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::Io(_)
            | sqlx::Error::Tls(_) => StoreError::Connection(err.to_string()),
            other => StoreError::Query(other.to_string()),
        }
    }
}

/// Profiles keyed by `(user_id, experience_id)`.
#[async_trait]
pub trait ProfileStore: Send + Sync {
    async fn find(&self, user_id: &str, experience_id: &str) -> Result<Option<Profile>, StoreError>;

    /// Atomic upsert on the composite key. An existing row keeps its `id`,
    /// `created_at` and any `completed_at`; the rest takes the new values.
    /// Fails with [`StoreError::RoleLocked`] when the row has been completed
    /// under a different role.
    async fn save(&self, profile: &Profile) -> Result<Profile, StoreError>;

    async fn ping(&self) -> Result<(), StoreError>;
}

/// Opens the backend named by the database URL, applying migrations first
/// when asked to.
pub async fn connect(config: &DatabaseConfig, migrate: bool) -> Result<Arc<dyn ProfileStore>, StoreError> {
    if config.url.starts_with(MEMORY_URL_SCHEME) {
        tracing::warn!("Using in-memory profile store; data is lost on restart");
        return Ok(Arc::new(MemoryProfileStore::new()));
    }

    let store = PgProfileStore::connect(config).await?;
    if migrate {
        store.migrate().await?;
    }
    Ok(Arc::new(store))
}

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::{postgres::PgPoolOptions, postgres::PgRow, PgPool, Row};
use tracing::info;
use uuid::Uuid;

use super::{ProfileStore, StoreError};
use crate::config::DatabaseConfig;
use crate::profile::{Profile, ProfileData};
use crate::types::Role;

const PROFILE_COLUMNS: &str =
    "id, user_id, experience_id, role, data, is_complete, completed_at, created_at, updated_at";

/// Postgres-backed profile store over a shared connection pool.
#[derive(Clone)]
pub struct PgProfileStore {
    pool: PgPool,
}

impl PgProfileStore {
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.connection_timeout))
            .connect(&config.url)
            .await
            .map_err(|e| StoreError::Connection(e.to_string()))?;

        info!(max_connections = config.max_connections, "Created database pool");
        Ok(Self { pool })
    }

    /// Applies the embedded SQL migrations.
    pub async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| StoreError::Migration(e.to_string()))?;
        info!("Database migrations applied");
        Ok(())
    }
}

#[async_trait]
impl ProfileStore for PgProfileStore {
    async fn find(&self, user_id: &str, experience_id: &str) -> Result<Option<Profile>, StoreError> {
        let query = format!(
            "SELECT {} FROM profiles WHERE user_id = $1 AND experience_id = $2",
            PROFILE_COLUMNS
        );
        let row = sqlx::query(&query)
            .bind(user_id)
            .bind(experience_id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(|row| profile_from_row(&row)).transpose()
    }

    async fn save(&self, profile: &Profile) -> Result<Profile, StoreError> {
        // completed_at is sticky: once set it survives a revert to draft and
        // pins the role. A locked row matches no update and returns nothing.
        let query = format!(
            "INSERT INTO profiles ({cols})
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
             ON CONFLICT (user_id, experience_id) DO UPDATE SET
                 role = EXCLUDED.role,
                 data = EXCLUDED.data,
                 is_complete = EXCLUDED.is_complete,
                 completed_at = COALESCE(profiles.completed_at, EXCLUDED.completed_at),
                 updated_at = EXCLUDED.updated_at
             WHERE profiles.completed_at IS NULL OR profiles.role = EXCLUDED.role
             RETURNING {cols}",
            cols = PROFILE_COLUMNS
        );

        let row = sqlx::query(&query)
            .bind(profile.id)
            .bind(&profile.user_id)
            .bind(&profile.experience_id)
            .bind(profile.role.as_str())
            .bind(profile.data.to_value())
            .bind(profile.is_complete)
            .bind(profile.completed_at)
            .bind(profile.created_at)
            .bind(profile.updated_at)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => profile_from_row(&row),
            None => {
                let current = self.find(&profile.user_id, &profile.experience_id).await?;
                let role = current.map(|p| p.role).ok_or_else(|| {
                    StoreError::Query("upsert matched no row".to_string())
                })?;
                Err(StoreError::RoleLocked(role))
            }
        }
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::Connection(e.to_string()))?;
        Ok(())
    }
}

fn profile_from_row(row: &PgRow) -> Result<Profile, StoreError> {
    let role: String = row.try_get("role")?;
    let role: Role = role.parse().map_err(StoreError::Decode)?;
    let data: Value = row.try_get("data")?;
    let data = ProfileData::from_stored(role, data).map_err(|e| StoreError::Decode(e.to_string()))?;

    Ok(Profile {
        id: row.try_get::<Uuid, _>("id")?,
        user_id: row.try_get("user_id")?,
        experience_id: row.try_get("experience_id")?,
        role,
        data,
        is_complete: row.try_get("is_complete")?,
        completed_at: row.try_get::<Option<DateTime<Utc>>, _>("completed_at")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

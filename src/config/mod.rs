use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;
use thiserror::Error;

/// MIME types accepted for pitch decks unless `UPLOAD_ALLOWED_TYPES` says otherwise.
pub const DEFAULT_UPLOAD_TYPES: [&str; 3] = [
    "application/pdf",
    "application/vnd.ms-powerpoint",
    "application/vnd.openxmlformats-officedocument.presentationml.presentation",
];

pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;
pub const DEFAULT_REQUEST_DEADLINE_MS: u64 = 5_000;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("Missing required configuration: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {name}: {value}")]
    Invalid { name: &'static str, value: String },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub host: HostConfig,
    pub blob: BlobConfig,
    pub database: DatabaseConfig,
    pub upload: UploadConfig,
    pub security: SecurityConfig,
    /// Deadline applied to each identity / access call, in milliseconds.
    pub request_deadline_ms: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HostConfig {
    #[serde(skip_serializing)]
    pub api_key: String,
    pub api_base_url: String,
    pub app_id: Option<String>,
    /// PEM-encoded ES256 key. When present, tokens are verified locally.
    #[serde(skip_serializing)]
    pub token_public_key: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlobConfig {
    #[serde(skip_serializing)]
    pub credentials: String,
    pub api_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(skip_serializing)]
    pub url: String,
    pub max_connections: u32,
    pub connection_timeout: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadConfig {
    pub max_bytes: usize,
    pub allowed_types: Vec<String>,
    /// Extra deadline granted per started MiB of payload.
    pub deadline_ms_per_mib: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    pub cors_origins: Vec<String>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        // Set defaults based on environment, then override with specific env vars
        let mut config = match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        };
        config.apply_env(|name| env::var(name).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Applies overrides from a variable lookup. Split out from `from_env`
    /// so tests can feed a map instead of mutating the process environment.
    fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        // Host platform
        if let Some(v) = lookup("HOST_API_KEY") {
            self.host.api_key = v;
        }
        if let Some(v) = lookup("HOST_API_BASE_URL") {
            self.host.api_base_url = v.trim_end_matches('/').to_string();
        }
        if let Some(v) = lookup("HOST_APP_ID") {
            self.host.app_id = Some(v).filter(|s| !s.is_empty());
        }
        if let Some(v) = lookup("HOST_TOKEN_PUBLIC_KEY") {
            self.host.token_public_key = Some(v).filter(|s| !s.trim().is_empty());
        }

        // Blob store
        if let Some(v) = lookup("BLOB_READ_WRITE_TOKEN") {
            self.blob.credentials = v;
        }
        if let Some(v) = lookup("BLOB_API_URL") {
            self.blob.api_url = v.trim_end_matches('/').to_string();
        }

        // Database
        if let Some(v) = lookup("DATABASE_URL") {
            self.database.url = v;
        }
        if let Some(v) = lookup("DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = parse_var("DATABASE_MAX_CONNECTIONS", &v)?;
        }
        if let Some(v) = lookup("DATABASE_CONNECTION_TIMEOUT") {
            self.database.connection_timeout = parse_var("DATABASE_CONNECTION_TIMEOUT", &v)?;
        }

        // Upload policy
        if let Some(v) = lookup("UPLOAD_MAX_BYTES") {
            self.upload.max_bytes = parse_var("UPLOAD_MAX_BYTES", &v)?;
        }
        if let Some(v) = lookup("UPLOAD_ALLOWED_TYPES") {
            self.upload.allowed_types = split_list(&v);
        }
        if let Some(v) = lookup("UPLOAD_DEADLINE_MS_PER_MIB") {
            self.upload.deadline_ms_per_mib = parse_var("UPLOAD_DEADLINE_MS_PER_MIB", &v)?;
        }

        if let Some(v) = lookup("REQUEST_DEADLINE_MS") {
            self.request_deadline_ms = parse_var("REQUEST_DEADLINE_MS", &v)?;
        }

        // Security overrides
        if let Some(v) = lookup("SECURITY_CORS_ORIGINS") {
            self.security.cors_origins = split_list(&v);
        }

        Ok(())
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.host.api_key.is_empty() {
            return Err(ConfigError::Missing("HOST_API_KEY"));
        }
        if self.blob.credentials.is_empty() {
            return Err(ConfigError::Missing("BLOB_READ_WRITE_TOKEN"));
        }
        if self.database.url.is_empty() {
            return Err(ConfigError::Missing("DATABASE_URL"));
        }
        if self.upload.max_bytes == 0 {
            return Err(ConfigError::Invalid {
                name: "UPLOAD_MAX_BYTES",
                value: "0".to_string(),
            });
        }
        if self.upload.allowed_types.is_empty() {
            return Err(ConfigError::Missing("UPLOAD_ALLOWED_TYPES"));
        }
        Ok(())
    }

    pub fn request_deadline(&self) -> Duration {
        Duration::from_millis(self.request_deadline_ms)
    }

    /// Deadline for a blob transfer of `size` bytes: the request deadline
    /// plus a fixed increment for every started MiB.
    pub fn upload_deadline(&self, size: usize) -> Duration {
        let mib = (size as u64).div_ceil(1024 * 1024);
        let extra = mib.saturating_mul(self.upload.deadline_ms_per_mib);
        Duration::from_millis(self.request_deadline_ms.saturating_add(extra))
    }

    pub fn is_production(&self) -> bool {
        self.environment == Environment::Production
    }

    pub fn development() -> Self {
        Self {
            environment: Environment::Development,
            host: HostConfig::default(),
            blob: BlobConfig::default(),
            database: DatabaseConfig {
                url: String::new(),
                max_connections: 10,
                connection_timeout: 30,
            },
            upload: UploadConfig::default(),
            security: SecurityConfig {
                cors_origins: vec!["http://localhost:3000".to_string()],
            },
            request_deadline_ms: DEFAULT_REQUEST_DEADLINE_MS,
        }
    }

    fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            database: DatabaseConfig {
                url: String::new(),
                max_connections: 20,
                connection_timeout: 10,
            },
            security: SecurityConfig {
                cors_origins: vec!["https://staging.example.com".to_string()],
            },
            ..Self::development()
        }
    }

    fn production() -> Self {
        Self {
            environment: Environment::Production,
            database: DatabaseConfig {
                url: String::new(),
                max_connections: 50,
                connection_timeout: 5,
            },
            security: SecurityConfig {
                cors_origins: vec!["https://whop.com".to_string()],
            },
            ..Self::development()
        }
    }
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            api_base_url: "https://api.whop.com/api/v5".to_string(),
            app_id: None,
            token_public_key: None,
        }
    }
}

impl Default for BlobConfig {
    fn default() -> Self {
        Self {
            credentials: String::new(),
            api_url: "https://blob.vercel-storage.com".to_string(),
        }
    }
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            allowed_types: DEFAULT_UPLOAD_TYPES.iter().map(|s| s.to_string()).collect(),
            deadline_ms_per_mib: 2_000,
        }
    }
}

fn parse_var<T: std::str::FromStr>(name: &'static str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::Invalid {
        name,
        value: value.to_string(),
    })
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

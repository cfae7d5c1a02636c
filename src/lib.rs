pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod host;
pub mod middleware;
pub mod profile;
pub mod server;
pub mod store;
pub mod types;
pub mod upload;

pub use config::AppConfig;
pub use error::ApiError;
pub use server::{app, AppState};

pub mod auth;
pub mod extract;
pub mod pages;
pub mod profile;
pub mod public;
pub mod upload;

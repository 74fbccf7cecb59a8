// Blog API - posts, comments, groups and follows over HTTP

// HTTP routes and handlers
pub mod api;
pub mod app_state;
pub mod config;

// Ent Framework - privacy rules applied to blog entities
pub mod ent_framework;

// Storage, viewer resolution, token checks and pagination
pub mod infrastructure;

pub mod models;
pub mod services;

// Common utilities
pub mod error;

// Re-exports for convenience
pub use api::{app, create_router};
pub use error::{AppError, AppResult};

// Core infrastructure modules
pub mod database;              // Storage trait shared by handlers and services
pub mod sqlite_database;       // SQLite implementation of the store
pub mod viewer;                // Viewer context
pub mod middleware;            // Viewer resolution middleware and extractor
pub mod security;              // Bearer token verification
pub mod pagination;            // Conditional limit/offset pagination

pub mod app;
pub mod authz;
pub mod config;
pub mod db;
pub mod docs;
pub mod errors;
pub mod jwt;
pub mod models;
pub mod routes;
pub mod storage;
pub mod utils;

// Re-export commonly used items for tests
pub use app::{build_router, create_app, AppState};

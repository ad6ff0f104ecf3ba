//! Repo Languages - per-user repository and language statistics
//!
//! Answers "which repositories does this user own, and in which languages?"
//! and "what share of their code is each language?" against GitHub, behind a
//! TTL cache with single-flight refreshes.

pub mod aggregate;
pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod models;
pub mod service;
pub mod tasks;
pub mod upstream;

pub use api::AppState;
pub use config::Config;
pub use error::{Result, ServiceError};
pub use service::LanguageService;
pub use tasks::spawn_cleanup_task;

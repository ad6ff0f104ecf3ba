//! API Module
//!
//! HTTP handlers and routing for the language service.
//!
//! # Endpoints
//! - `GET /repositories/:user` - Repositories and their languages
//! - `GET /languages/:user` - Language shares across all repositories
//! - `DELETE /cache/:user` - Evict a cached user
//! - `GET /stats` - Cache statistics
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;

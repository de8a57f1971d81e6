//! Axum webhook ingest service.
//!
//! Accepts table automation webhooks, validates each row, and enqueues
//! one ingest message per row onto the pipeline transport.

pub mod config;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod state;

pub use config::ApiConfig;
pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use state::AppState;

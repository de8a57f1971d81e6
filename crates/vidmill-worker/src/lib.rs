//! Pipeline stage worker.
//!
//! Consumes stage queues, runs the matching handler, and enqueues the next
//! stage's message. Retry and dead-letter policy lives in the executor;
//! handlers only do the stage's work.

pub mod config;
pub mod context;
pub mod error;
pub mod executor;
pub mod stages;

pub use config::WorkerConfig;
pub use context::StageContext;
pub use error::{StageError, StageResult};
pub use executor::Executor;

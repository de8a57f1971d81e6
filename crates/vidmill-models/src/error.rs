//! Contract error types.

use thiserror::Error;

/// Errors raised when a stage message fails its contract.
#[derive(Debug, Error)]
pub enum ContractError {
    #[error("missing or empty fields for {handler}: {fields}")]
    MissingFields { handler: &'static str, fields: String },

    #[error("record_id must be positive, got {0}")]
    NonPositiveRecordId(i64),

    #[error("invalid URL in field {field}: {value}")]
    InvalidUrl { field: &'static str, value: String },

    #[error("message {handler} is not valid on queue {queue}")]
    WrongQueue { handler: &'static str, queue: String },

    #[error("unknown stage: {0}")]
    UnknownStage(String),
}

impl ContractError {
    pub fn missing_fields(handler: &'static str, fields: Vec<&'static str>) -> Self {
        Self::MissingFields {
            handler,
            fields: fields.join(", "),
        }
    }
}

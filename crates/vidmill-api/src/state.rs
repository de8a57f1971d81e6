//! Application state.

use std::sync::Arc;

use vidmill_models::Stage;
use vidmill_queue::QueueTransport;

use crate::config::ApiConfig;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: ApiConfig,
    pub transport: Arc<QueueTransport>,
}

impl AppState {
    /// Create new application state. Fails when the broker is unreachable
    /// so deployment errors surface at startup, not on the first webhook.
    pub async fn new(config: ApiConfig) -> Result<Self, vidmill_queue::TransportError> {
        let transport = QueueTransport::from_env()?;
        transport.check_connection().await?;
        transport.init(&Stage::ALL).await?;

        Ok(Self {
            config,
            transport: Arc::new(transport),
        })
    }
}

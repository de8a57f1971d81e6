//! Shared stage context.

use std::sync::Arc;

use vidmill_queue::QueueTransport;
use vidmill_remote::{
    AnimationEngine, PassthroughEngine, RecordClient, ResolverClient, StorageClient, TtsClient,
};

use crate::config::WorkerConfig;
use crate::error::StageResult;

/// Everything a stage handler needs, constructed once at startup and
/// passed down explicitly. No handler reaches for process-global state.
pub struct StageContext {
    pub config: WorkerConfig,
    pub transport: Arc<QueueTransport>,
    pub resolver: ResolverClient,
    pub tts: TtsClient,
    pub animation: Box<dyn AnimationEngine>,
    pub storage: StorageClient,
    pub records: RecordClient,
}

impl StageContext {
    /// Build the context with clients configured from the environment.
    pub fn new(config: WorkerConfig, transport: Arc<QueueTransport>) -> StageResult<Self> {
        Ok(Self {
            config,
            transport,
            resolver: ResolverClient::from_env()?,
            tts: TtsClient::from_env()?,
            animation: Box::new(PassthroughEngine),
            storage: StorageClient::from_env()?,
            records: RecordClient::from_env()?,
        })
    }
}

//! Stage message executor.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use vidmill_models::Stage;
use vidmill_queue::{Delivery, QueueTransport};

use crate::config::WorkerConfig;
use crate::context::StageContext;
use crate::error::StageResult;
use crate::stages;

/// Max messages pulled per XREADGROUP call.
const CONSUME_BATCH: usize = 5;

/// Consumes stage queues and runs handlers under a concurrency bound.
pub struct Executor {
    config: WorkerConfig,
    ctx: Arc<StageContext>,
    slots: Arc<Semaphore>,
    shutdown: tokio::sync::watch::Sender<bool>,
    consumer_name: String,
}

impl Executor {
    /// Create a new executor.
    pub fn new(config: WorkerConfig, transport: Arc<QueueTransport>) -> StageResult<Self> {
        let slots = Arc::new(Semaphore::new(config.max_concurrent_jobs));
        let (shutdown, _) = tokio::sync::watch::channel(false);
        let consumer_name = format!("worker-{}", Uuid::new_v4());
        let ctx = Arc::new(StageContext::new(config.clone(), transport)?);

        Ok(Self {
            config,
            ctx,
            slots,
            shutdown,
            consumer_name,
        })
    }

    /// Start the executor.
    pub async fn run(&self) -> StageResult<()> {
        info!(
            consumer = %self.consumer_name,
            stages = ?self.config.stages.iter().map(|s| s.as_str()).collect::<Vec<_>>(),
            max_concurrent = self.config.max_concurrent_jobs,
            "Starting executor"
        );

        self.ctx.transport.init(&self.config.stages).await?;

        let mut shutdown_rx = self.shutdown.subscribe();

        // Periodically claim messages orphaned by crashed consumers
        let claim_task = self.spawn_claim_task();

        loop {
            tokio::select! {
                _ = shutdown_rx.changed() => {
                    if *shutdown_rx.borrow() {
                        info!("Shutdown signal received, stopping executor");
                        break;
                    }
                }
                result = self.consume_round() => {
                    if let Err(e) = result {
                        error!("Error consuming messages: {}", e);
                        tokio::time::sleep(Duration::from_secs(5)).await;
                    }
                }
            }
        }

        claim_task.abort();

        info!("Waiting for in-flight messages to complete...");
        let _ = tokio::time::timeout(self.config.shutdown_timeout, self.drain()).await;

        info!("Executor stopped");
        Ok(())
    }

    fn spawn_claim_task(&self) -> tokio::task::JoinHandle<()> {
        let ctx = Arc::clone(&self.ctx);
        let slots = Arc::clone(&self.slots);
        let consumer_name = self.consumer_name.clone();
        let stages = self.config.stages.clone();
        let interval = self.config.claim_interval;
        let min_idle_ms = self.config.claim_min_idle.as_millis() as u64;
        let mut shutdown_rx = self.shutdown.subscribe();

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                tokio::select! {
                    _ = shutdown_rx.changed() => {
                        if *shutdown_rx.borrow() {
                            break;
                        }
                    }
                    _ = ticker.tick() => {
                        for &stage in &stages {
                            let claimed = match ctx
                                .transport
                                .claim_pending(stage, &consumer_name, min_idle_ms, CONSUME_BATCH)
                                .await
                            {
                                Ok(claimed) => claimed,
                                Err(e) => {
                                    warn!(stage = %stage, "Failed to claim pending messages: {}", e);
                                    continue;
                                }
                            };

                            if !claimed.is_empty() {
                                info!(stage = %stage, count = claimed.len(), "Claimed pending messages");
                            }
                            for delivery in claimed {
                                let Ok(permit) = slots.clone().acquire_owned().await else {
                                    return;
                                };
                                let ctx = Arc::clone(&ctx);
                                tokio::spawn(async move {
                                    let _permit = permit;
                                    Self::execute(ctx, stage, delivery).await;
                                });
                            }
                        }
                    }
                }
            }
        })
    }

    /// One poll across all configured stages.
    async fn consume_round(&self) -> StageResult<()> {
        let available = self.slots.available_permits();
        if available == 0 {
            tokio::time::sleep(Duration::from_millis(100)).await;
            return Ok(());
        }

        // Block time is split across stages so one idle queue does not
        // starve the others.
        let block_ms = (self.config.consume_block_ms / self.config.stages.len() as u64).max(100);

        for &stage in &self.config.stages {
            let deliveries = self
                .ctx
                .transport
                .consume(stage, &self.consumer_name, block_ms, available.min(CONSUME_BATCH))
                .await?;

            if deliveries.is_empty() {
                continue;
            }
            debug!(stage = %stage, count = deliveries.len(), "Consumed messages");

            for delivery in deliveries {
                let Ok(permit) = self.slots.clone().acquire_owned().await else {
                    return Ok(());
                };
                let ctx = Arc::clone(&self.ctx);
                tokio::spawn(async move {
                    let _permit = permit;
                    Self::execute(ctx, stage, delivery).await;
                });
            }
        }

        Ok(())
    }

    /// Run one message through its handler with retry and DLQ policy.
    ///
    /// Non-retryable failures dead-letter immediately; retryable ones stay
    /// pending for redelivery until the retry bound, then dead-letter.
    async fn execute(ctx: Arc<StageContext>, stage: Stage, delivery: Delivery) {
        let Delivery { message_id, message } = delivery;
        let job = message.job_key().map(|k| k.to_string()).unwrap_or_default();

        info!(stage = %stage, %message_id, job = %job, handler = message.handler_name(), "Executing message");

        match stages::dispatch(&ctx, stage, &message).await {
            Ok(()) => {
                info!(stage = %stage, %message_id, job = %job, "Message completed");
                if let Err(e) = ctx.transport.ack(stage, &message_id).await {
                    error!(stage = %stage, %message_id, "Failed to ack message: {}", e);
                }
            }
            Err(e) if !e.is_retryable() => {
                error!(stage = %stage, %message_id, job = %job, "Message failed permanently: {}", e);
                if let Err(dlq_err) = ctx
                    .transport
                    .dead_letter(stage, &message_id, &message, &e.to_string())
                    .await
                {
                    error!(stage = %stage, %message_id, "Failed to dead-letter message: {}", dlq_err);
                }
            }
            Err(e) => {
                error!(stage = %stage, %message_id, job = %job, "Message failed: {}", e);

                let retry_count = ctx
                    .transport
                    .increment_retry(stage, &message_id)
                    .await
                    .unwrap_or(u32::MAX);
                let max_retries = ctx.transport.max_retries();

                if retry_count >= max_retries {
                    warn!(
                        stage = %stage, %message_id, job = %job, max_retries,
                        "Retries exhausted, moving to DLQ"
                    );
                    if let Err(dlq_err) = ctx
                        .transport
                        .dead_letter(stage, &message_id, &message, &e.to_string())
                        .await
                    {
                        error!(stage = %stage, %message_id, "Failed to dead-letter message: {}", dlq_err);
                    }
                } else {
                    info!(
                        stage = %stage, %message_id, job = %job,
                        attempt = retry_count, max_retries,
                        "Message left pending for redelivery"
                    );
                }
            }
        }
    }

    /// Wait for all in-flight messages to complete.
    async fn drain(&self) {
        loop {
            if self.slots.available_permits() == self.config.max_concurrent_jobs {
                break;
            }
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
    }

    /// Signal shutdown.
    pub fn shutdown(&self) {
        let _ = self.shutdown.send(true);
    }
}

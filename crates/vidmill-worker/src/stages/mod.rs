//! Stage handlers.
//!
//! One module per pipeline stage. Every handler follows the same shape:
//! validate the message, do the stage's one unit of work, enqueue exactly
//! one message downstream. Validation runs before any side effect, so a
//! bad message never leaves half-done work behind.

pub mod animate;
pub mod broll;
pub mod composite;
pub mod download;
pub mod ingest;
pub mod record_update;
pub mod upload;
pub mod voice;

use tracing::info;

use vidmill_models::{Stage, StageMessage};

use crate::context::StageContext;
use crate::error::StageResult;

/// Route a consumed message to its stage handler.
///
/// The queue/handler pairing is checked first: a message that arrived on
/// the wrong queue is a contract violation, not work.
pub async fn dispatch(
    ctx: &StageContext,
    stage: Stage,
    message: &StageMessage,
) -> StageResult<()> {
    message.check_queue(stage)?;

    match message {
        StageMessage::Ingest(job) => ingest::handle(ctx, job).await,
        StageMessage::Download(job) => download::handle(ctx, job).await,
        StageMessage::Voice(job) => voice::handle(ctx, job).await,
        StageMessage::Inference(job) => animate::handle(ctx, job).await,
        StageMessage::Broll(job) => broll::handle(ctx, job).await,
        StageMessage::Composite(job) => composite::handle(ctx, job).await,
        StageMessage::Upload(job) => upload::handle(ctx, job).await,
        StageMessage::RecordUpdate(job) => record_update::handle(ctx, job).await,
        StageMessage::Ping => {
            info!(stage = %stage, "pong");
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use vidmill_models::{DownloadJob, Stage, StageMessage};

    #[test]
    fn test_wrong_queue_is_contract_violation() {
        let msg = StageMessage::Download(DownloadJob {
            record_id: 7,
            table_id: "T1".to_string(),
            url: "https://example.com/v".to_string(),
            content: "text".to_string(),
        });
        assert!(msg.check_queue(Stage::Composite).is_err());
        assert!(msg.check_queue(Stage::Download).is_ok());
    }

    #[test]
    fn test_ping_routable_everywhere() {
        for stage in Stage::ALL {
            assert!(StageMessage::Ping.check_queue(stage).is_ok());
        }
    }
}

//! Webhook and health handlers.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use vidmill_models::{IngestJob, StageMessage};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// One row of the table webhook payload. Unknown columns are ignored.
#[derive(Debug, Deserialize)]
pub struct WebhookRow {
    #[serde(rename = "Id")]
    pub record_id: i64,
    #[serde(rename = "Title", default)]
    pub title: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(rename = "originaltext", default)]
    pub original_text: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct WebhookData {
    pub table_id: String,
    #[serde(default)]
    pub table_name: Option<String>,
    pub rows: Vec<WebhookRow>,
}

/// Table automation webhook envelope.
#[derive(Debug, Deserialize)]
pub struct WebhookPayload {
    #[serde(rename = "type", default)]
    pub event_type: Option<String>,
    pub data: WebhookData,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct WebhookAck {
    pub ok: bool,
    pub received_rows: usize,
}

/// Names of required row fields that are missing or empty.
fn missing_row_fields(row: &WebhookRow) -> Vec<&'static str> {
    let mut missing = Vec::new();
    if row.url.as_deref().map_or(true, |v| v.trim().is_empty()) {
        missing.push("url");
    }
    if row.content.as_deref().map_or(true, |v| v.trim().is_empty()) {
        missing.push("content");
    }
    missing
}

/// Ingest webhook. Every row is validated before anything is enqueued,
/// so a bad row rejects the whole batch with nothing in flight.
pub async fn webhook(
    State(state): State<AppState>,
    Json(payload): Json<WebhookPayload>,
) -> ApiResult<Json<WebhookAck>> {
    let data = payload.data;

    if data.table_id.trim().is_empty() {
        return Err(ApiError::bad_request("table_id must not be empty"));
    }
    if data.rows.is_empty() {
        return Err(ApiError::bad_request("No rows provided in payload"));
    }

    // Validate the whole batch before touching the queue.
    let mut jobs = Vec::with_capacity(data.rows.len());
    for row in &data.rows {
        let missing = missing_row_fields(row);
        if !missing.is_empty() {
            warn!(record_id = row.record_id, ?missing, "Rejecting webhook row");
            return Err(ApiError::bad_request(format!(
                "Row {} missing fields: {}",
                row.record_id,
                missing.join(", ")
            )));
        }

        let job = IngestJob {
            record_id: row.record_id,
            table_id: data.table_id.clone(),
            source_url: row.url.clone().unwrap_or_default(),
            content: row.content.clone().unwrap_or_default(),
        };
        job.validate()?;
        jobs.push(job);
    }

    let received_rows = jobs.len();
    for job in jobs {
        let record_id = job.record_id;
        let message_id = state.transport.enqueue(&StageMessage::Ingest(job)).await?;
        info!(
            record_id,
            table_id = %data.table_id,
            message_id = %message_id,
            "Accepted webhook row"
        );
        metrics::counter!("vidmill_webhook_rows_accepted_total").increment(1);
    }

    Ok(Json(WebhookAck {
        ok: true,
        received_rows,
    }))
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Health endpoint. Reports broker reachability.
pub async fn healthz(
    State(state): State<AppState>,
) -> Result<Json<HealthResponse>, (StatusCode, Json<HealthResponse>)> {
    match state.transport.check_connection().await {
        Ok(()) => Ok(Json(HealthResponse {
            status: "healthy".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            timestamp: Utc::now().to_rfc3339(),
            error: None,
        })),
        Err(e) => Err((
            StatusCode::SERVICE_UNAVAILABLE,
            Json(HealthResponse {
                status: "degraded".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                timestamp: Utc::now().to_rfc3339(),
                error: Some(e.to_string()),
            }),
        )),
    }
}

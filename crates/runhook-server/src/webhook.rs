//! `POST /webhook`: GitHub push receiver.
//!
//! A push to the configured branch runs the repository sync inside the
//! request; anything else is acknowledged with "no action".

use axum::{Json, body::Bytes, extract::State, http::HeaderMap};
use runhook_sync::{PushEvent, signature};
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::AppState;
use crate::api::ApiError;

pub async fn receive(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<serde_json::Value>, ApiError> {
    state.metrics.inc_webhook_deliveries();

    if let Some(secret) = state.settings.webhook.signing_secret() {
        let header = headers
            .get(signature::SIGNATURE_HEADER)
            .and_then(|v| v.to_str().ok());
        if let Err(e) = signature::verify(secret.as_bytes(), &body, header) {
            state.metrics.inc_auth_rejections();
            warn!(error = %e, "webhook signature check failed");
            return Err(e.into());
        }
    }

    debug!(payload = %String::from_utf8_lossy(&body), "webhook payload");

    let event = PushEvent::parse(&body).inspect_err(|e| error!(error = %e, "webhook handler failed"))?;

    if !event.targets_branch(&state.settings.webhook.branch) {
        debug!(git_ref = %event.git_ref, "push does not target the sync branch");
        return Ok(Json(json!({ "status": "no action" })));
    }

    match state.sync.sync().await {
        Ok(report) => {
            state.metrics.inc_syncs();
            info!(git_ref = %event.git_ref, sync = state.sync.name(), output = %report.output, "sync triggered");
            Ok(Json(json!({ "status": "success" })))
        }
        Err(e) => {
            state.metrics.inc_sync_failures();
            error!(git_ref = %event.git_ref, sync = state.sync.name(), error = %e, "sync failed");
            Err(e.into())
        }
    }
}

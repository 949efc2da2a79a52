//! Config API: read and patch the configuration document.
//!
//! Every failure leaves as the JSON envelope `{"status": "error", "message"}`.

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use runhook_core::{ConfigUpdate, Document, RunhookError};
use runhook_store::DocumentStore;
use serde_json::json;
use std::sync::Arc;
use tracing::{info, warn};

use crate::AppState;

/// Error envelope returned by every handler.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl From<RunhookError> for ApiError {
    fn from(err: RunhookError) -> Self {
        let status = match err {
            RunhookError::Auth(_) => StatusCode::UNAUTHORIZED,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self {
            status,
            message: err.to_string(),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: rejection.body_text(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(json!({ "status": "error", "message": self.message })),
        )
            .into_response()
    }
}

/// Run a store operation off the async executor.
pub(crate) async fn with_store<T, F>(store: &Arc<DocumentStore>, op: F) -> runhook_core::Result<T>
where
    F: FnOnce(&DocumentStore) -> runhook_core::Result<T> + Send + 'static,
    T: Send + 'static,
{
    let store = Arc::clone(store);
    tokio::task::spawn_blocking(move || op(&store))
        .await
        .map_err(|e| RunhookError::Other(e.into()))?
}

/// `GET /get-config`
pub async fn get_config(
    State(state): State<Arc<AppState>>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let doc: Document = with_store(&state.store, |store| store.load())
        .await
        .inspect_err(|e| warn!(error = %e, "failed to load configuration"))?;
    state.metrics.inc_config_reads();
    Ok(Json(json!({ "status": "success", "config": doc })))
}

/// `POST /save-config`
pub async fn save_config(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ConfigUpdate>, JsonRejection>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let Json(update) = payload.inspect_err(|e| warn!(error = %e, "rejected config payload"))?;

    let fields = update.touched_fields();
    with_store(&state.store, move |store| store.update(&update))
        .await
        .inspect_err(|e| warn!(error = %e, "failed to save configuration"))?;

    state.metrics.inc_config_saves();
    info!(?fields, "configuration saved via API");
    Ok(Json(json!({
        "status": "success",
        "message": "Configuration saved successfully",
    })))
}

//! # runhook-server
//!
//! HTTP API for runhook. Provides:
//!
//! - `GET /get-config` and `POST /save-config` over the configuration document
//! - `POST /webhook`, which syncs the working copy on a push to the trigger branch
//! - `GET /status`, `GET /health`, and `GET /metrics`
//!
//! Config and webhook routes sit behind the shared-token guard in [`auth`].

pub mod api;
pub mod auth;
pub mod metrics;
pub mod webhook;

use axum::{
    Json, Router,
    extract::State,
    http::{HeaderName, HeaderValue, Method, StatusCode, header},
    middleware,
    routing::{get, post},
};
use runhook_config::Settings;
use runhook_store::DocumentStore;
use runhook_sync::RepoSync;
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

/// Shared server state.
pub struct AppState {
    pub settings: Settings,
    pub store: Arc<DocumentStore>,
    pub sync: Arc<dyn RepoSync>,
    pub guard: auth::TokenGuard,
    pub metrics: metrics::Metrics,
}

impl AppState {
    pub fn new(settings: Settings, store: Arc<DocumentStore>, sync: Arc<dyn RepoSync>) -> Self {
        let guard = auth::TokenGuard::new(&settings.auth.header, settings.auth.access_token.as_deref());
        Self {
            settings,
            store,
            sync,
            guard,
            metrics: metrics::Metrics::new(),
        }
    }
}

/// Health check response.
#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    service: &'static str,
    version: &'static str,
}

/// Build the Axum router.
pub fn build_router(state: Arc<AppState>) -> Router {
    let guarded_routes = Router::new()
        .route("/get-config", get(api::get_config))
        .route("/save-config", post(api::save_config))
        .route("/webhook", post(webhook::receive))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_token,
        ));

    let mut router = Router::new()
        .route("/health", get(health_handler))
        .route("/status", get(status_handler))
        .route("/metrics", get(metrics_handler))
        .merge(guarded_routes)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            metrics::track_requests,
        ))
        .with_state(state.clone());

    if state.settings.server.cors {
        router = router.layer(cors_layer(
            &state.settings.server.allowed_origins,
            state.guard.header(),
        ));
    }

    router.layer(TraceLayer::new_for_http())
}

/// CORS restricted to the configured origins, allowing the token header.
fn cors_layer(origins: &[String], token_header: &str) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match o.parse::<HeaderValue>() {
            Ok(v) => Some(v),
            Err(_) => {
                warn!(origin = %o, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    let mut allow_headers = vec![header::CONTENT_TYPE];
    if let Ok(name) = token_header.parse::<HeaderName>() {
        allow_headers.push(name);
    }

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(allow_headers)
}

async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        service: "runhook",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Environment and feature flags. Unauthenticated; never exposes secrets.
async fn status_handler(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    let env = &state.settings.environment;
    let github = match api::with_store(&state.store, |store| store.load()).await {
        Ok(doc) => doc.github,
        Err(e) => {
            warn!(error = %e, "status: configuration unavailable");
            Default::default()
        }
    };

    Json(serde_json::json!({
        "environment": if env.cloud_available { "cloud" } else { "local" },
        "cloud_available": env.cloud_available,
        "notebook_execution_available": env.notebook_execution,
        "github_token_configured": env.github_token.as_deref().is_some_and(|t| !t.is_empty()),
        "config": {
            "source_repo": github.source_repo_url,
            "target_repo": github.target_repo,
            "notebook_path": github.notebook_path,
        },
    }))
}

/// Prometheus-compatible metrics endpoint.
async fn metrics_handler(
    State(state): State<Arc<AppState>>,
) -> (StatusCode, [(HeaderName, &'static str); 1], String) {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4; charset=utf-8")],
        state.metrics.render_prometheus(),
    )
}

/// Start the HTTP server.
pub async fn start_server(state: Arc<AppState>) -> runhook_core::Result<()> {
    let listen = state.settings.server.listen.clone();
    if state.settings.webhook.signing_secret().is_none() {
        warn!("webhook deliveries are trusted on the access token alone");
    }
    let router = build_router(state);

    info!(listen = %listen, "starting HTTP server");

    let listener = tokio::net::TcpListener::bind(&listen).await.map_err(|e| {
        runhook_core::RunhookError::Settings(format!("failed to bind {}: {}", listen, e))
    })?;

    axum::serve(listener, router)
        .await
        .map_err(|e| runhook_core::RunhookError::Other(e.into()))?;

    Ok(())
}

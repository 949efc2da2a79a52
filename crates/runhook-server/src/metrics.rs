//! Prometheus-compatible metrics for the runhook server.
//!
//! Tracks request counts, config traffic, and webhook/sync outcomes.

use axum::{
    extract::State,
    http::Request,
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use crate::AppState;

/// Metrics registry shared by all handlers.
#[derive(Debug, Clone)]
pub struct Metrics {
    inner: Arc<MetricsInner>,
}

#[derive(Debug)]
struct MetricsInner {
    /// Total HTTP requests served.
    http_requests_total: AtomicU64,
    /// Total HTTP errors (4xx + 5xx).
    http_errors_total: AtomicU64,
    /// Successful `/get-config` reads.
    config_reads_total: AtomicU64,
    /// Successful `/save-config` writes.
    config_saves_total: AtomicU64,
    /// Requests turned away by the token guard or signature check.
    auth_rejections_total: AtomicU64,
    /// Webhook deliveries received past the token guard.
    webhook_deliveries_total: AtomicU64,
    /// Syncs that completed.
    syncs_total: AtomicU64,
    /// Syncs that failed.
    sync_failures_total: AtomicU64,
    started_at: Instant,
}

impl Metrics {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(MetricsInner {
                http_requests_total: AtomicU64::new(0),
                http_errors_total: AtomicU64::new(0),
                config_reads_total: AtomicU64::new(0),
                config_saves_total: AtomicU64::new(0),
                auth_rejections_total: AtomicU64::new(0),
                webhook_deliveries_total: AtomicU64::new(0),
                syncs_total: AtomicU64::new(0),
                sync_failures_total: AtomicU64::new(0),
                started_at: Instant::now(),
            }),
        }
    }

    pub fn inc_http_requests(&self) {
        self.inner
            .http_requests_total
            .fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_http_errors(&self) {
        self.inner.http_errors_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_config_reads(&self) {
        self.inner.config_reads_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_config_saves(&self) {
        self.inner.config_saves_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_auth_rejections(&self) {
        self.inner
            .auth_rejections_total
            .fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_webhook_deliveries(&self) {
        self.inner
            .webhook_deliveries_total
            .fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_syncs(&self) {
        self.inner.syncs_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_sync_failures(&self) {
        self.inner
            .sync_failures_total
            .fetch_add(1, Ordering::Relaxed);
    }

    /// Seconds since the registry was created.
    pub fn uptime_secs(&self) -> u64 {
        self.inner.started_at.elapsed().as_secs()
    }

    /// Render metrics in Prometheus text exposition format.
    pub fn render_prometheus(&self) -> String {
        let m = &self.inner;

        format!(
            r#"# HELP runhook_uptime_seconds Time since the server started.
# TYPE runhook_uptime_seconds gauge
runhook_uptime_seconds {}

# HELP runhook_http_requests_total Total HTTP requests served.
# TYPE runhook_http_requests_total counter
runhook_http_requests_total {}

# HELP runhook_http_errors_total Total HTTP errors (4xx/5xx).
# TYPE runhook_http_errors_total counter
runhook_http_errors_total {}

# HELP runhook_config_reads_total Configuration documents served.
# TYPE runhook_config_reads_total counter
runhook_config_reads_total {}

# HELP runhook_config_saves_total Configuration updates persisted.
# TYPE runhook_config_saves_total counter
runhook_config_saves_total {}

# HELP runhook_auth_rejections_total Requests rejected for a bad token or signature.
# TYPE runhook_auth_rejections_total counter
runhook_auth_rejections_total {}

# HELP runhook_webhook_deliveries_total Webhook deliveries received.
# TYPE runhook_webhook_deliveries_total counter
runhook_webhook_deliveries_total {}

# HELP runhook_syncs_total Repository syncs completed.
# TYPE runhook_syncs_total counter
runhook_syncs_total {}

# HELP runhook_sync_failures_total Repository syncs that failed.
# TYPE runhook_sync_failures_total counter
runhook_sync_failures_total {}
"#,
            self.uptime_secs(),
            m.http_requests_total.load(Ordering::Relaxed),
            m.http_errors_total.load(Ordering::Relaxed),
            m.config_reads_total.load(Ordering::Relaxed),
            m.config_saves_total.load(Ordering::Relaxed),
            m.auth_rejections_total.load(Ordering::Relaxed),
            m.webhook_deliveries_total.load(Ordering::Relaxed),
            m.syncs_total.load(Ordering::Relaxed),
            m.sync_failures_total.load(Ordering::Relaxed),
        )
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Middleware counting every request and every 4xx/5xx response.
pub async fn track_requests(
    State(state): State<Arc<AppState>>,
    request: Request<axum::body::Body>,
    next: Next,
) -> Response {
    state.metrics.inc_http_requests();
    let response = next.run(request).await;
    let status = response.status();
    if status.is_client_error() || status.is_server_error() {
        state.metrics.inc_http_errors();
    }
    response
}

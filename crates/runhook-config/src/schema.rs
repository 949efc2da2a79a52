use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::PathBuf;

/// Root settings, mapped to `runhook.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub server: ServerConfig,
    pub auth: AuthConfig,
    pub store: StoreConfig,
    pub webhook: WebhookConfig,
    pub sync: SyncConfig,
    pub environment: EnvironmentConfig,
    pub logging: LoggingConfig,
}

// ── Server ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// HTTP listen address. `PORT` in the environment replaces the port.
    pub listen: String,
    /// Attach a CORS layer restricted to `allowed_origins`.
    pub cors: bool,
    /// Origins the config form may be served from.
    pub allowed_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: "0.0.0.0:8100".into(),
            cors: false,
            allowed_origins: vec![
                "http://localhost:8887".into(),
                "http://127.0.0.1:8887".into(),
            ],
        }
    }
}

// ── Auth ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Shared secret expected on guarded routes.
    /// Can also be set via RUNHOOK_ACCESS_TOKEN (or ACCESS_TOKEN).
    pub access_token: Option<String>,
    /// Request header carrying the token.
    pub header: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            access_token: None,
            header: "x-access-token".into(),
        }
    }
}

// ── Store ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// YAML document edited by the config form.
    pub path: PathBuf,
    /// Write an empty document on startup when the file does not exist.
    pub create_if_missing: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("config.yaml"),
            create_if_missing: true,
        }
    }
}

// ── Webhook ────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WebhookConfig {
    /// Pushes to this branch trigger a sync.
    pub branch: String,
    /// GitHub webhook secret. When set, `X-Hub-Signature-256` is mandatory.
    /// Can also be set via GITHUB_WEBHOOK_SECRET.
    pub secret: Option<String>,
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            branch: "main".into(),
            secret: None,
        }
    }
}

impl WebhookConfig {
    /// The secret deliveries must be signed with. An empty secret counts as unset.
    pub fn signing_secret(&self) -> Option<&str> {
        self.secret.as_deref().filter(|s| !s.is_empty())
    }
}

// ── Sync ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Working copy that `git pull` runs in.
    pub repo_dir: PathBuf,
    /// Remote to pull from (git's default when unset).
    pub remote: Option<String>,
    /// Branch to pull; only used together with `remote`.
    pub branch: Option<String>,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            repo_dir: PathBuf::from("/app"),
            remote: None,
            branch: None,
        }
    }
}

// ── Environment ────────────────────────────────────────────────

/// Feature flags reported by `/status`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EnvironmentConfig {
    /// Running on the managed cloud platform. Set automatically when K_SERVICE is present.
    pub cloud_available: bool,
    /// Whether the notebook runner is installed next to this service.
    pub notebook_execution: bool,
    /// GitHub token used by the notebook runner. Only its presence is reported.
    /// Can also be set via GITHUB_TOKEN.
    #[serde(skip_serializing)]
    pub github_token: Option<String>,
}

// ── Logging ────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: "trace", "debug", "info", "warn", "error".
    pub level: String,
    /// Output format: "pretty", "json", "compact".
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
            format: "pretty".into(),
        }
    }
}

// ── Validation ─────────────────────────────────────────────────

/// A single settings validation issue.
#[derive(Debug)]
pub struct ConfigWarning {
    pub field: String,
    pub message: String,
    pub severity: WarningSeverity,
    pub hint: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WarningSeverity {
    Error,
    Warning,
    Info,
}

impl std::fmt::Display for ConfigWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self.severity {
            WarningSeverity::Error => "error",
            WarningSeverity::Warning => "warning",
            WarningSeverity::Info => "info",
        };
        write!(f, "{}: {}: {}", label, self.field, self.message)?;
        if let Some(ref h) = self.hint {
            write!(f, "\n   ↳ {}", h)?;
        }
        Ok(())
    }
}

impl Settings {
    /// Every issue found, regardless of severity.
    pub fn findings(&self) -> Vec<ConfigWarning> {
        let mut warnings = Vec::new();

        // ── Listen address ───
        if self.server.listen.parse::<SocketAddr>().is_err() {
            warnings.push(ConfigWarning {
                field: "server.listen".into(),
                message: format!("'{}' is not a socket address", self.server.listen),
                severity: WarningSeverity::Error,
                hint: Some("Use host:port, e.g. '0.0.0.0:8100'".into()),
            });
        }

        // ── Access token ───
        match self.auth.access_token.as_deref() {
            None | Some("") => warnings.push(ConfigWarning {
                field: "auth.access_token".into(),
                message: "no access token set; every guarded route will answer 401".into(),
                severity: WarningSeverity::Warning,
                hint: Some("Set auth.access_token or RUNHOOK_ACCESS_TOKEN".into()),
            }),
            Some(_) => {}
        }
        if self.auth.header.trim().is_empty() {
            warnings.push(ConfigWarning {
                field: "auth.header".into(),
                message: "token header name is empty".into(),
                severity: WarningSeverity::Error,
                hint: Some("The config form sends 'x-access-token'".into()),
            });
        }

        // ── Store ───
        if self.store.path.as_os_str().is_empty() {
            warnings.push(ConfigWarning {
                field: "store.path".into(),
                message: "document path is empty".into(),
                severity: WarningSeverity::Error,
                hint: Some("Set to e.g. 'config.yaml'".into()),
            });
        }

        // ── Webhook ───
        if self.webhook.branch.trim().is_empty() {
            warnings.push(ConfigWarning {
                field: "webhook.branch".into(),
                message: "trigger branch is empty".into(),
                severity: WarningSeverity::Error,
                hint: Some("Set to e.g. 'main'".into()),
            });
        }
        if self.webhook.signing_secret().is_none() {
            warnings.push(ConfigWarning {
                field: "webhook.secret".into(),
                message: "webhook payloads are not signature-checked".into(),
                severity: WarningSeverity::Warning,
                hint: Some("Set webhook.secret or GITHUB_WEBHOOK_SECRET to the GitHub hook secret".into()),
            });
        }

        // ── Sync ───
        if !self.sync.repo_dir.is_dir() {
            warnings.push(ConfigWarning {
                field: "sync.repo_dir".into(),
                message: format!("{} does not exist; syncs will fail", self.sync.repo_dir.display()),
                severity: WarningSeverity::Warning,
                hint: None,
            });
        }
        if self.sync.branch.is_some() && self.sync.remote.is_none() {
            warnings.push(ConfigWarning {
                field: "sync.branch".into(),
                message: "branch is ignored without sync.remote".into(),
                severity: WarningSeverity::Info,
                hint: None,
            });
        }

        // ── Logging format ───
        let valid_formats = ["pretty", "json", "compact"];
        if !valid_formats.contains(&self.logging.format.as_str()) {
            warnings.push(ConfigWarning {
                field: "logging.format".into(),
                message: format!("unknown log format '{}'", self.logging.format),
                severity: WarningSeverity::Warning,
                hint: Some(format!("Valid values: {}", valid_formats.join(", "))),
            });
        }

        warnings
    }

    /// Validate the settings and return the non-fatal findings.
    /// Returns `Err` with all messages joined if any severity is Error.
    pub fn validate(&self) -> Result<Vec<ConfigWarning>, String> {
        let warnings = self.findings();

        let errors: Vec<String> = warnings
            .iter()
            .filter(|w| w.severity == WarningSeverity::Error)
            .map(|w| format!("{}: {}", w.field, w.message))
            .collect();

        if !errors.is_empty() {
            return Err(format!("Settings errors:\n  • {}", errors.join("\n  • ")));
        }

        Ok(warnings)
    }
}

use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::schema::Settings;

/// Loads the service settings once at startup.
pub struct SettingsLoader {
    settings: Settings,
    settings_path: PathBuf,
}

impl SettingsLoader {
    /// Resolve the settings path: explicit path > RUNHOOK_SETTINGS env > ./runhook.toml
    pub fn resolve_path(explicit: Option<&Path>) -> PathBuf {
        if let Some(p) = explicit {
            return p.to_path_buf();
        }
        if let Ok(p) = std::env::var("RUNHOOK_SETTINGS") {
            return PathBuf::from(p);
        }
        PathBuf::from("runhook.toml")
    }

    /// Load settings from disk and the process environment, falling back to defaults.
    pub fn load(path: Option<&Path>) -> runhook_core::Result<Self> {
        Self::load_with_env(path, |key| std::env::var(key).ok())
    }

    /// Like [`SettingsLoader::load`], but environment lookups go through `env`.
    pub fn load_with_env(
        path: Option<&Path>,
        env: impl Fn(&str) -> Option<String>,
    ) -> runhook_core::Result<Self> {
        let loader = Self::load_unchecked_with_env(path, env)?;

        match loader.settings.validate() {
            Ok(warnings) => {
                for w in &warnings {
                    warn!("{}", w);
                }
            }
            Err(e) => {
                return Err(runhook_core::RunhookError::Settings(e));
            }
        }

        Ok(loader)
    }

    /// Read settings without rejecting error-level findings, so they can be reported.
    pub fn load_unchecked(path: Option<&Path>) -> runhook_core::Result<Self> {
        Self::load_unchecked_with_env(path, |key| std::env::var(key).ok())
    }

    pub fn load_unchecked_with_env(
        path: Option<&Path>,
        env: impl Fn(&str) -> Option<String>,
    ) -> runhook_core::Result<Self> {
        let settings_path = Self::resolve_path(path);
        let settings = if settings_path.exists() {
            info!(?settings_path, "loading settings");
            let raw = std::fs::read_to_string(&settings_path)?;
            toml::from_str::<Settings>(&raw).map_err(|e| {
                runhook_core::RunhookError::Settings(format!(
                    "failed to parse {}: {}",
                    settings_path.display(),
                    e
                ))
            })?
        } else {
            info!(?settings_path, "settings file not found, using defaults");
            Settings::default()
        };

        Ok(Self {
            settings: Self::apply_env_overrides(settings, env),
            settings_path,
        })
    }

    /// A copy of the loaded settings.
    pub fn get(&self) -> Settings {
        self.settings.clone()
    }

    /// Path the settings were (or would have been) read from.
    pub fn path(&self) -> &Path {
        &self.settings_path
    }

    fn apply_env_overrides(mut settings: Settings, env: impl Fn(&str) -> Option<String>) -> Settings {
        if let Some(v) = env("RUNHOOK_LISTEN") {
            settings.server.listen = v;
        }
        if let Some(port) = env("PORT") {
            match port.parse::<u16>() {
                Ok(port) => settings.server.listen = with_port(&settings.server.listen, port),
                Err(_) => warn!(port = %port, "ignoring unparsable PORT"),
            }
        }
        if let Some(v) = env("RUNHOOK_CONFIG_PATH") {
            settings.store.path = PathBuf::from(v);
        }
        if let Some(v) = env("RUNHOOK_REPO_DIR") {
            settings.sync.repo_dir = PathBuf::from(v);
        }
        if let Some(v) = env("RUNHOOK_LOG_LEVEL") {
            settings.logging.level = v;
        }
        // Secrets: the environment fills in what the file leaves unset.
        if settings.auth.access_token.as_deref().is_none_or(str::is_empty) {
            settings.auth.access_token = env("RUNHOOK_ACCESS_TOKEN")
                .or_else(|| env("ACCESS_TOKEN"))
                .filter(|t| !t.is_empty());
        }
        if settings.webhook.signing_secret().is_none() {
            settings.webhook.secret = env("GITHUB_WEBHOOK_SECRET").filter(|s| !s.is_empty());
        }
        if settings.environment.github_token.as_deref().is_none_or(str::is_empty) {
            settings.environment.github_token = env("GITHUB_TOKEN").filter(|t| !t.is_empty());
        }
        if env("K_SERVICE").is_some() {
            settings.environment.cloud_available = true;
        }
        settings
    }
}

/// Replace the port of a `host:port` listen address.
fn with_port(listen: &str, port: u16) -> String {
    let host = listen
        .rsplit_once(':')
        .map(|(host, _)| host)
        .filter(|h| !h.is_empty())
        .unwrap_or("0.0.0.0");
    format!("{host}:{port}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_port_keeps_host() {
        assert_eq!(with_port("127.0.0.1:3000", 9000), "127.0.0.1:9000");
        assert_eq!(with_port("[::1]:3000", 9000), "[::1]:9000");
        assert_eq!(with_port("garbage", 9000), "0.0.0.0:9000");
    }
}

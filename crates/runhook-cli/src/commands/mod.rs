use clap::{Parser, Subcommand};
use std::path::PathBuf;

use runhook_config::{Settings, SettingsLoader, WarningSeverity};
use runhook_core::RunhookError;
use runhook_store::DocumentStore;
use runhook_sync::{GitPull, RepoSync};

mod serve;

/// Config form backend and GitHub push webhook
#[derive(Parser)]
#[command(name = "runhook", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to runhook.toml settings file
    #[arg(short, long, global = true, env = "RUNHOOK_SETTINGS")]
    settings: Option<PathBuf>,

    /// Log level override (e.g. debug, info, warn, error)
    #[arg(short, long, global = true)]
    log_level: Option<String>,

    /// Enable verbose output (debug logging)
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Suppress all log output (errors only)
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP server
    Serve {
        /// Listen address, overriding settings and PORT
        #[arg(short = 'L', long)]
        listen: Option<String>,
    },
    /// Create the configuration document if it does not exist
    Init,
    /// Print the configuration document
    Show {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Pull the working copy once, exactly as a push webhook would
    Sync,
    /// Report settings problems
    Doctor,
}

impl Cli {
    pub async fn run(self) -> runhook_core::Result<()> {
        // Load settings first so we can use them for log format.
        // `doctor` reports error-level findings instead of refusing to start.
        let loader = match self.command {
            Commands::Doctor => SettingsLoader::load_unchecked(self.settings.as_deref())?,
            _ => SettingsLoader::load(self.settings.as_deref())?,
        };
        let settings = loader.get();

        // Resolve log level: --verbose > --quiet > --log-level > settings
        let log_level = if self.verbose {
            "debug"
        } else if self.quiet {
            "error"
        } else {
            self.log_level
                .as_deref()
                .unwrap_or(settings.logging.level.as_str())
        };
        init_tracing(log_level, &settings.logging.format);

        match self.command {
            Commands::Serve { listen } => serve::cmd_serve(settings, listen).await,
            Commands::Init => Self::cmd_init(settings),
            Commands::Show { json } => Self::cmd_show(settings, json),
            Commands::Sync => Self::cmd_sync(settings).await,
            Commands::Doctor => Self::cmd_doctor(settings, loader.path()),
        }
    }

    fn cmd_init(settings: Settings) -> runhook_core::Result<()> {
        let store = DocumentStore::new(&settings.store.path);
        if store.init()? {
            println!("Created {}", store.path().display());
        } else {
            println!("{} already exists", store.path().display());
        }
        Ok(())
    }

    fn cmd_show(settings: Settings, json: bool) -> runhook_core::Result<()> {
        let doc = DocumentStore::new(&settings.store.path).load()?;
        if json {
            println!("{}", serde_json::to_string_pretty(&doc)?);
        } else {
            let yaml = serde_yaml::to_string(&doc)
                .map_err(|e| RunhookError::Other(e.into()))?;
            print!("{yaml}");
        }
        Ok(())
    }

    async fn cmd_sync(settings: Settings) -> runhook_core::Result<()> {
        let sync = git_pull(&settings);
        println!("Pulling in {}...", sync.repo_dir().display());
        let report = sync.sync().await?;
        if report.output.is_empty() {
            println!("Done.");
        } else {
            println!("{}", report.output);
        }
        Ok(())
    }

    fn cmd_doctor(settings: Settings, path: &std::path::Path) -> runhook_core::Result<()> {
        println!("Settings: {}", path.display());
        let findings = settings.findings();
        if findings.is_empty() {
            println!("No issues found.");
            return Ok(());
        }
        for finding in &findings {
            println!("{finding}");
        }
        let errors = findings
            .iter()
            .filter(|f| f.severity == WarningSeverity::Error)
            .count();
        if errors > 0 {
            return Err(RunhookError::SettingsValidation {
                field: "settings".into(),
                reason: format!("{errors} error(s) found"),
            });
        }
        Ok(())
    }
}

/// Initialize tracing with the configured format.
fn init_tracing(level: &str, format: &str) {
    let filter = || {
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level))
    };
    match format {
        "json" => tracing_subscriber::fmt()
            .with_env_filter(filter())
            .json()
            .with_target(true)
            .init(),
        "compact" => tracing_subscriber::fmt()
            .with_env_filter(filter())
            .compact()
            .with_target(false)
            .init(),
        _ => tracing_subscriber::fmt()
            .with_env_filter(filter())
            .with_target(false)
            .init(),
    }
}

/// The `git pull` sync described by `[sync]`.
pub(crate) fn git_pull(settings: &Settings) -> GitPull {
    let pull = GitPull::new(&settings.sync.repo_dir);
    match settings.sync.remote {
        Some(ref remote) => pull.with_remote(remote.clone(), settings.sync.branch.clone()),
        None => pull,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_serve_with_listen() {
        let cli = Cli::try_parse_from(["runhook", "serve", "--listen", "127.0.0.1:9000"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Serve { listen: Some(ref l) } if l == "127.0.0.1:9000"
        ));
    }

    #[test]
    fn test_verbose_conflicts_with_quiet() {
        assert!(Cli::try_parse_from(["runhook", "-v", "-q", "doctor"]).is_err());
    }

    #[test]
    fn test_git_pull_from_settings() {
        let mut settings = Settings::default();
        settings.sync.repo_dir = "/srv/app".into();
        assert_eq!(git_pull(&settings).args(), vec!["pull"]);

        settings.sync.remote = Some("origin".into());
        settings.sync.branch = Some("main".into());
        let pull = git_pull(&settings);
        assert_eq!(pull.args(), vec!["pull", "origin", "main"]);
        assert_eq!(pull.repo_dir(), std::path::Path::new("/srv/app"));
    }

    #[test]
    fn test_doctor_fails_on_error_findings() {
        let path = std::path::Path::new("runhook.toml");
        let mut settings = Settings::default();
        settings.auth.access_token = Some("t".into());
        assert!(Cli::cmd_doctor(settings.clone(), path).is_ok());

        settings.webhook.branch = String::new();
        let err = Cli::cmd_doctor(settings, path).unwrap_err();
        assert!(err.to_string().contains("1 error(s)"));
    }
}

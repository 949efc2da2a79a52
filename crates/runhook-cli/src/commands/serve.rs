use std::sync::Arc;

use runhook_config::Settings;
use runhook_server::AppState;
use runhook_store::DocumentStore;
use tracing::{info, warn};

use super::git_pull;

pub(super) async fn cmd_serve(mut settings: Settings, listen: Option<String>) -> runhook_core::Result<()> {
    if let Some(listen) = listen {
        settings.server.listen = listen;
    }

    // The loader ran before logging was up; surface its findings now.
    for finding in settings.findings() {
        warn!("{}", finding);
    }

    let store = Arc::new(DocumentStore::new(&settings.store.path));
    if settings.store.create_if_missing {
        store.init()?;
    }

    let sync = git_pull(&settings);
    info!(
        repo_dir = %sync.repo_dir().display(),
        branch = %settings.webhook.branch,
        "push webhook will run git pull"
    );

    let state = Arc::new(AppState::new(settings, store, Arc::new(sync)));
    runhook_server::start_server(state).await
}

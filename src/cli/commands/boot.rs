//! Wiring shared by the commands that talk to the network

use crate::cache::{CacheStorage, LifecycleEvent, RegisterOutcome, ShellRegistration};
use crate::config::{Config, ConfigManager};
use crate::draft::FileSurface;
use crate::error::IdeResult;
use crate::fetch::{parse_url, resolve_url, Fetcher, NetworkFetcher};
use crate::session::{LocalStore, SessionClient};
use crate::ui::{self, UiContext};
use crate::workspace::Workspace;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast::error::TryRecvError;
use tracing::{debug, warn};
use url::Url;

/// Shell origin and the asset list resolved against it
pub(crate) fn shell_assets(config: &Config) -> IdeResult<(Url, Vec<Url>)> {
    let origin = parse_url(&config.shell.origin)?;
    let assets = config
        .shell
        .assets
        .iter()
        .map(|asset| resolve_url(&origin, asset))
        .collect::<IdeResult<Vec<_>>>()?;
    Ok((origin, assets))
}

/// Registration backed by the real network, not yet attached to a worker
pub(crate) fn registration(config: &Config) -> IdeResult<ShellRegistration> {
    let (origin, _) = shell_assets(config)?;
    let network = NetworkFetcher::new(
        Duration::from_secs(config.backend.timeout_secs),
        Some(origin),
    );
    Ok(ShellRegistration::new(
        CacheStorage::new(ConfigManager::caches_dir()),
        ConfigManager::registration_path(),
        Arc::new(network),
    ))
}

/// Register the configured shell version, as loading the page would
pub(crate) async fn register_shell(
    ctx: &UiContext,
    registration: &mut ShellRegistration,
    config: &Config,
    force: bool,
) -> IdeResult<RegisterOutcome> {
    let (_, assets) = shell_assets(config)?;
    let mut events = registration.subscribe();

    let outcome = registration
        .register(&config.shell.version, assets, force)
        .await;

    loop {
        match events.try_recv() {
            Ok(LifecycleEvent::UpdateFound { version }) => {
                ui::step_info(ctx, &format!("A new shell version is available: {}", version));
            }
            Ok(LifecycleEvent::ControllerChanged { version }) => {
                debug!("Shell {} now controls the page", version);
            }
            Ok(LifecycleEvent::StateChanged { version, state }) => {
                debug!("Shell {} is {}", version, state);
            }
            Err(TryRecvError::Lagged(_)) => continue,
            Err(_) => break,
        }
    }

    outcome
}

/// Load the page: register the shell, then restore the session and drafts.
///
/// An install failure is reported and otherwise ignored: the previous
/// controller, if any, keeps serving.
pub(crate) async fn workspace(ctx: &UiContext, config: &Config) -> IdeResult<Workspace<FileSurface>> {
    let mut registration = registration(config)?;
    if let Err(e) = register_shell(ctx, &mut registration, config, false).await {
        warn!("Shell {} not installed: {}", config.shell.version, e);
    }
    load_workspace(config, registration.fetcher()).await
}

/// Restore the session and drafts without touching the shell cache.
///
/// For commands that never reach the backend.
pub(crate) async fn local_workspace(config: &Config) -> IdeResult<Workspace<FileSurface>> {
    load_workspace(config, registration(config)?.fetcher()).await
}

async fn load_workspace(
    config: &Config,
    fetcher: Arc<dyn Fetcher>,
) -> IdeResult<Workspace<FileSurface>> {
    let client = SessionClient::new(
        config.backend.endpoint.clone(),
        config.backend.credential_rejection_marker.clone(),
        fetcher,
        LocalStore::new(ConfigManager::local_storage_path()),
    );
    let surface = FileSurface::new(ConfigManager::editor_path(config));
    Workspace::load(client, surface, ConfigManager::workspace_path()).await
}

//! Shell worker: versioned install, activation cleanup and fetch policy
//!
//! One `ShellWorker` exists per shell version. Its state only moves
//! forward:
//!
//! | State | Meaning |
//! |-------|---------|
//! | Parsed | Created, nothing cached yet |
//! | Installing | Fetching the asset set |
//! | Installed | Every asset cached, waiting to activate |
//! | Activating | Deleting stale stores |
//! | Active | Controls pages, intercepts their fetches |
//! | Redundant | Install failed or replaced |

use crate::cache::storage::CacheStorage;
use crate::error::{IdeError, IdeResult};
use crate::fetch::{Fetcher, Request, Response};
use futures_util::future::try_join_all;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};
use url::Url;
use uuid::Uuid;

/// Lifecycle state of one worker instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkerState {
    Parsed,
    Installing,
    Installed,
    Activating,
    Active,
    Redundant,
}

impl fmt::Display for WorkerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Parsed => "parsed",
            Self::Installing => "installing",
            Self::Installed => "installed",
            Self::Activating => "activating",
            Self::Active => "active",
            Self::Redundant => "redundant",
        };
        write!(f, "{}", name)
    }
}

/// The worker for one shell version
pub struct ShellWorker {
    id: Uuid,
    version: String,
    assets: Vec<Url>,
    state: WorkerState,
    skip_waiting: bool,
    network: Arc<dyn Fetcher>,
    storage: CacheStorage,
}

impl ShellWorker {
    /// Create a worker that has not installed yet
    pub fn new(
        version: impl Into<String>,
        assets: Vec<Url>,
        network: Arc<dyn Fetcher>,
        storage: CacheStorage,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            version: version.into(),
            assets,
            state: WorkerState::Parsed,
            skip_waiting: false,
            network,
            storage,
        }
    }

    /// Bring back a worker that activated in an earlier run
    pub fn resume(
        id: Uuid,
        version: impl Into<String>,
        network: Arc<dyn Fetcher>,
        storage: CacheStorage,
    ) -> Self {
        Self {
            id,
            version: version.into(),
            assets: vec![],
            state: WorkerState::Active,
            skip_waiting: false,
            network,
            storage,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn state(&self) -> WorkerState {
        self.state
    }

    /// Whether the worker asked to skip the waiting phase
    pub fn skip_waiting_requested(&self) -> bool {
        self.skip_waiting
    }

    /// Mark the worker as replaced
    pub fn retire(&mut self) {
        self.state = WorkerState::Redundant;
    }

    /// Cache every asset under this version, all or nothing.
    ///
    /// Nothing is written until every asset has been fetched, and a failed
    /// write removes the store again unless it predates this install. On
    /// success the worker requests to skip waiting.
    pub async fn install(&mut self) -> IdeResult<()> {
        if self.state != WorkerState::Parsed {
            return Err(IdeError::Internal(format!(
                "cannot install worker in state {}",
                self.state
            )));
        }
        self.state = WorkerState::Installing;
        info!(
            "Installing shell {} ({} assets)",
            self.version,
            self.assets.len()
        );

        let result = try_join_all(self.assets.iter().map(|url| self.fetch_asset(url))).await;
        let fetched = match result {
            Ok(fetched) => fetched,
            Err(e) => {
                self.state = WorkerState::Redundant;
                return Err(e);
            }
        };

        let reinstall = self.storage.has(&self.version);
        if let Err(e) = self.populate(&fetched).await {
            self.state = WorkerState::Redundant;
            if reinstall {
                // The store may be serving the current controller
                warn!("Reinstall of shell {} failed; keeping its store", self.version);
            } else if let Err(cleanup) = self.storage.delete(&self.version).await {
                warn!("Failed to remove partial store {}: {}", self.version, cleanup);
            }
            return Err(e);
        }

        self.state = WorkerState::Installed;
        self.skip_waiting = true;
        info!("Installed shell {}", self.version);
        Ok(())
    }

    async fn fetch_asset(&self, url: &Url) -> IdeResult<(Request, Response)> {
        let request = Request::get(url.as_str());
        let install_error = |reason: String| IdeError::CacheInstall {
            version: self.version.clone(),
            url: url.to_string(),
            reason,
        };

        let response = self
            .network
            .fetch(request.clone())
            .await
            .map_err(|e| install_error(e.to_string()))?;

        if !response.ok() {
            return Err(install_error(format!("HTTP {}", response.status)));
        }
        Ok((request, response))
    }

    async fn populate(&self, fetched: &[(Request, Response)]) -> IdeResult<()> {
        let store = self.storage.open(&self.version).await?;
        for (request, response) in fetched {
            store.put(request, response).await?;
        }
        Ok(())
    }

    /// Delete every store but this version's, then take control.
    ///
    /// Returns the names of the deleted stores.
    pub async fn activate(&mut self) -> IdeResult<Vec<String>> {
        if self.state != WorkerState::Installed {
            return Err(IdeError::Internal(format!(
                "cannot activate worker in state {}",
                self.state
            )));
        }
        self.state = WorkerState::Activating;

        let mut deleted = vec![];
        for name in self.storage.keys().await? {
            if name != self.version && self.storage.delete(&name).await? {
                info!("Evicted stale shell cache {}", name);
                deleted.push(name);
            }
        }

        self.state = WorkerState::Active;
        info!("Shell {} is active", self.version);
        Ok(deleted)
    }

    /// Network-first fetch with cache fallback.
    ///
    /// Non-read requests, and any request while this worker is not active,
    /// go straight to the network and never touch the cache.
    pub async fn handle_fetch(&self, request: Request) -> IdeResult<Response> {
        if self.state != WorkerState::Active || !request.method.is_read() {
            return self.network.fetch(request).await;
        }

        match self.network.fetch(request.clone()).await {
            Ok(response) => {
                if response.is_cacheable() {
                    if let Err(e) = self.store_copy(&request, &response).await {
                        warn!("Failed to cache {}: {}", request.url, e);
                    }
                }
                Ok(response)
            }
            Err(e) => {
                debug!("Network failed for {}: {}", request.url, e);
                match self.storage.match_any(&request).await? {
                    Some(cached) => Ok(cached),
                    None => Err(IdeError::Offline(request.url)),
                }
            }
        }
    }

    async fn store_copy(&self, request: &Request, response: &Response) -> IdeResult<()> {
        let store = self.storage.open(&self.version).await?;
        store.put(request, response).await
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::fetch::{Method, ResponseType};
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Mutex;
    use tempfile::TempDir;

    /// Scripted network: fixed responses per URL, can be switched offline
    #[derive(Default)]
    pub(crate) struct FakeNetwork {
        pub responses: Mutex<HashMap<String, Response>>,
        pub offline: AtomicBool,
        pub calls: AtomicUsize,
        pub seen: Mutex<Vec<(Method, String)>>,
    }

    impl FakeNetwork {
        pub fn serve(&self, url: &str, status: u16, response_type: ResponseType, body: &str) {
            self.responses.lock().unwrap().insert(
                url.to_string(),
                Response {
                    status,
                    url: url.to_string(),
                    response_type,
                    headers: vec![],
                    body: body.as_bytes().to_vec(),
                },
            );
        }

        pub fn set_offline(&self, offline: bool) {
            self.offline.store(offline, Ordering::SeqCst);
        }
    }

    #[async_trait]
    impl Fetcher for FakeNetwork {
        async fn fetch(&self, request: Request) -> IdeResult<Response> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.seen
                .lock()
                .unwrap()
                .push((request.method, request.url.clone()));
            if self.offline.load(Ordering::SeqCst) {
                return Err(IdeError::connectivity("offline"));
            }
            self.responses
                .lock()
                .unwrap()
                .get(&request.url)
                .cloned()
                .ok_or_else(|| IdeError::connectivity(format!("no route to {}", request.url)))
        }
    }

    pub(crate) const ORIGIN: &str = "http://localhost:8080/";

    pub(crate) fn shell_assets() -> Vec<Url> {
        ["index.html", "app.js"]
            .iter()
            .map(|a| Url::parse(ORIGIN).unwrap().join(a).unwrap())
            .collect()
    }

    pub(crate) fn serving_network() -> Arc<FakeNetwork> {
        let network = Arc::new(FakeNetwork::default());
        network.serve(
            "http://localhost:8080/index.html",
            200,
            ResponseType::Basic,
            "<html>v2</html>",
        );
        network.serve(
            "http://localhost:8080/app.js",
            200,
            ResponseType::Basic,
            "app()",
        );
        network
    }

    async fn active_worker(temp: &TempDir, network: Arc<FakeNetwork>) -> ShellWorker {
        let storage = CacheStorage::new(temp.path());
        let mut worker = ShellWorker::new("v2", shell_assets(), network, storage);
        worker.install().await.unwrap();
        worker.activate().await.unwrap();
        worker
    }

    #[tokio::test]
    async fn install_caches_every_asset_and_skips_waiting() {
        let temp = TempDir::new().unwrap();
        let storage = CacheStorage::new(temp.path());
        let mut worker = ShellWorker::new("v2", shell_assets(), serving_network(), storage.clone());

        worker.install().await.unwrap();

        assert_eq!(worker.state(), WorkerState::Installed);
        assert!(worker.skip_waiting_requested());
        let store = storage.open("v2").await.unwrap();
        assert_eq!(store.len().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn install_is_all_or_nothing() {
        let temp = TempDir::new().unwrap();
        let storage = CacheStorage::new(temp.path());
        let network = serving_network();
        network.serve(
            "http://localhost:8080/app.js",
            404,
            ResponseType::Basic,
            "missing",
        );
        let mut worker = ShellWorker::new("v2", shell_assets(), network, storage.clone());

        let err = worker.install().await.unwrap_err();

        assert!(matches!(err, IdeError::CacheInstall { ref url, .. } if url.ends_with("app.js")));
        assert_eq!(worker.state(), WorkerState::Redundant);
        assert!(!storage.has("v2"));
    }

    #[tokio::test]
    async fn install_failure_leaves_previous_version_alone() {
        let temp = TempDir::new().unwrap();
        let storage = CacheStorage::new(temp.path());
        let network = serving_network();
        let mut old = ShellWorker::new("v1", shell_assets(), network.clone(), storage.clone());
        old.install().await.unwrap();
        old.activate().await.unwrap();

        network.set_offline(true);
        let mut new = ShellWorker::new("v2", shell_assets(), network, storage.clone());
        assert!(new.install().await.is_err());

        assert_eq!(storage.keys().await.unwrap(), vec!["v1".to_string()]);
        let cached = old
            .handle_fetch(Request::get("http://localhost:8080/app.js"))
            .await
            .unwrap();
        assert_eq!(cached.body, b"app()");
    }

    #[tokio::test]
    async fn failed_reinstall_keeps_the_serving_store() {
        let temp = TempDir::new().unwrap();
        let storage = CacheStorage::new(temp.path());
        let network = serving_network();
        let current = active_worker(&temp, network.clone()).await;

        // A directory where app.js's body goes makes the write fail
        let app = Request::get("http://localhost:8080/app.js");
        let body_path = temp
            .path()
            .join(hex::encode("v2"))
            .join(format!("{}.body", app.cache_key()));
        std::fs::remove_file(&body_path).unwrap();
        std::fs::create_dir(&body_path).unwrap();

        let mut forced = ShellWorker::new("v2", shell_assets(), network.clone(), storage.clone());
        assert!(forced.install().await.is_err());
        assert_eq!(forced.state(), WorkerState::Redundant);

        assert!(storage.has("v2"));
        network.set_offline(true);
        let cached = current
            .handle_fetch(Request::get("http://localhost:8080/index.html"))
            .await
            .unwrap();
        assert_eq!(cached.body, b"<html>v2</html>");
    }

    #[tokio::test]
    async fn activate_evicts_every_other_store() {
        let temp = TempDir::new().unwrap();
        let storage = CacheStorage::new(temp.path());
        storage.open("ide-network-first-v1").await.unwrap();
        storage.open("something-else").await.unwrap();

        let mut worker = ShellWorker::new("v2", shell_assets(), serving_network(), storage.clone());
        worker.install().await.unwrap();
        let mut deleted = worker.activate().await.unwrap();
        deleted.sort();

        assert_eq!(deleted, vec!["ide-network-first-v1", "something-else"]);
        assert_eq!(storage.keys().await.unwrap(), vec!["v2".to_string()]);
        assert_eq!(worker.state(), WorkerState::Active);
    }

    #[tokio::test]
    async fn activate_requires_install() {
        let temp = TempDir::new().unwrap();
        let mut worker = ShellWorker::new(
            "v2",
            shell_assets(),
            serving_network(),
            CacheStorage::new(temp.path()),
        );
        assert!(worker.activate().await.is_err());
    }

    #[tokio::test]
    async fn fetch_is_network_first_and_refreshes_cache() {
        let temp = TempDir::new().unwrap();
        let network = serving_network();
        let worker = active_worker(&temp, network.clone()).await;

        network.serve(
            "http://localhost:8080/app.js",
            200,
            ResponseType::Basic,
            "app_v2()",
        );
        let live = worker
            .handle_fetch(Request::get("http://localhost:8080/app.js"))
            .await
            .unwrap();
        assert_eq!(live.body, b"app_v2()");

        network.set_offline(true);
        let cached = worker
            .handle_fetch(Request::get("http://localhost:8080/app.js"))
            .await
            .unwrap();
        assert_eq!(cached.body, b"app_v2()");
    }

    #[tokio::test]
    async fn offline_miss_is_an_error() {
        let temp = TempDir::new().unwrap();
        let network = serving_network();
        let worker = active_worker(&temp, network.clone()).await;

        network.set_offline(true);
        let err = worker
            .handle_fetch(Request::get("http://localhost:8080/never-seen.css"))
            .await
            .unwrap_err();
        assert!(matches!(err, IdeError::Offline(_)));
    }

    #[tokio::test]
    async fn cross_origin_and_non_200_are_not_cached() {
        let temp = TempDir::new().unwrap();
        let network = serving_network();
        let worker = active_worker(&temp, network.clone()).await;
        network.serve("https://cdn.test/lib.js", 200, ResponseType::Cors, "lib");
        network.serve(
            "http://localhost:8080/partial",
            206,
            ResponseType::Basic,
            "part",
        );

        worker
            .handle_fetch(Request::get("https://cdn.test/lib.js"))
            .await
            .unwrap();
        worker
            .handle_fetch(Request::get("http://localhost:8080/partial"))
            .await
            .unwrap();

        network.set_offline(true);
        assert!(worker
            .handle_fetch(Request::get("https://cdn.test/lib.js"))
            .await
            .is_err());
        assert!(worker
            .handle_fetch(Request::get("http://localhost:8080/partial"))
            .await
            .is_err());
    }

    #[tokio::test]
    async fn mutating_request_never_served_from_cache() {
        let temp = TempDir::new().unwrap();
        let network = serving_network();
        let worker = active_worker(&temp, network.clone()).await;
        let endpoint = "http://localhost:8080/exec";
        network.serve(endpoint, 200, ResponseType::Basic, "{\"success\":true}");

        // A successful GET of the same URL lands in the cache
        worker.handle_fetch(Request::get(endpoint)).await.unwrap();

        network.set_offline(true);
        let before = network.calls.load(Ordering::SeqCst);
        let err = worker
            .handle_fetch(Request::post(endpoint, "{\"action\":\"SAVE_PROJECT\"}"))
            .await
            .unwrap_err();

        assert!(matches!(err, IdeError::Connectivity(_)));
        assert_eq!(network.calls.load(Ordering::SeqCst), before + 1);
    }

    #[tokio::test]
    async fn mutating_request_is_not_written_to_cache() {
        let temp = TempDir::new().unwrap();
        let storage = CacheStorage::new(temp.path());
        let network = serving_network();
        let worker = active_worker(&temp, network.clone()).await;
        let endpoint = "http://localhost:8080/exec";
        network.serve(endpoint, 200, ResponseType::Basic, "ok");

        let post = Request::post(endpoint, "{}");
        worker.handle_fetch(post.clone()).await.unwrap();

        assert!(storage.match_any(&post).await.unwrap().is_none());
        assert_eq!(storage.open("v2").await.unwrap().len().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn inactive_worker_does_not_intercept() {
        let temp = TempDir::new().unwrap();
        let network = serving_network();
        let storage = CacheStorage::new(temp.path());
        let mut worker = ShellWorker::new("v2", shell_assets(), network.clone(), storage);
        worker.install().await.unwrap();

        network.set_offline(true);
        assert!(worker
            .handle_fetch(Request::get("http://localhost:8080/app.js"))
            .await
            .is_err());
    }
}

//! Worker registration and the page/worker message channel
//!
//! The worker runs in its own task and owns its `ShellWorker`. The page
//! only holds a [`WorkerHandle`] (an mpsc sender) and a broadcast
//! receiver for [`LifecycleEvent`]s; nothing else is shared.

use crate::cache::storage::CacheStorage;
use crate::cache::worker::{ShellWorker, WorkerState};
use crate::error::{IdeError, IdeResult};
use crate::fetch::{Fetcher, Request, Response};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tokio::sync::{broadcast, mpsc, oneshot};
use tracing::{debug, info, warn};
use url::Url;
use uuid::Uuid;

/// Messages the page sends to the worker
pub enum WorkerMessage {
    Install {
        reply: oneshot::Sender<IdeResult<()>>,
    },
    Activate {
        reply: oneshot::Sender<IdeResult<Vec<String>>>,
    },
    Fetch {
        request: Request,
        reply: oneshot::Sender<IdeResult<Response>>,
    },
    Status {
        reply: oneshot::Sender<WorkerStatus>,
    },
    /// Another worker took control; stop intercepting
    Retire,
}

/// Point-in-time view of a worker
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WorkerStatus {
    pub id: Uuid,
    pub version: String,
    pub state: WorkerState,
    pub skip_waiting: bool,
}

/// Events broadcast by workers and the registration
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LifecycleEvent {
    StateChanged { version: String, state: WorkerState },
    /// A new version installed while an older one controls the page
    UpdateFound { version: String },
    /// A worker claimed the page
    ControllerChanged { version: String },
}

/// Page-side handle to a running worker
#[derive(Clone)]
pub struct WorkerHandle {
    version: String,
    tx: mpsc::Sender<WorkerMessage>,
}

impl WorkerHandle {
    /// Version of the worker behind this handle
    pub fn version(&self) -> &str {
        &self.version
    }

    async fn request<T>(
        &self,
        build: impl FnOnce(oneshot::Sender<T>) -> WorkerMessage,
    ) -> IdeResult<T> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(build(reply))
            .await
            .map_err(|_| IdeError::WorkerUnavailable)?;
        rx.await.map_err(|_| IdeError::WorkerUnavailable)
    }

    pub async fn install(&self) -> IdeResult<()> {
        self.request(|reply| WorkerMessage::Install { reply }).await?
    }

    pub async fn activate(&self) -> IdeResult<Vec<String>> {
        self.request(|reply| WorkerMessage::Activate { reply })
            .await?
    }

    pub async fn status(&self) -> IdeResult<WorkerStatus> {
        self.request(|reply| WorkerMessage::Status { reply }).await
    }

    async fn retire(&self) {
        if self.tx.send(WorkerMessage::Retire).await.is_err() {
            debug!("Worker {} already stopped", self.version);
        }
    }
}

#[async_trait]
impl Fetcher for WorkerHandle {
    async fn fetch(&self, request: Request) -> IdeResult<Response> {
        self.request(|reply| WorkerMessage::Fetch { request, reply })
            .await?
    }
}

/// Run `worker` in its own task
pub fn spawn_worker(
    worker: ShellWorker,
    events: broadcast::Sender<LifecycleEvent>,
) -> WorkerHandle {
    let (tx, mut rx) = mpsc::channel(32);
    let version = worker.version().to_string();

    tokio::spawn(async move {
        let mut worker = worker;
        while let Some(message) = rx.recv().await {
            match message {
                WorkerMessage::Install { reply } => {
                    let result = worker.install().await;
                    notify_state(&events, &worker);
                    let _ = reply.send(result);
                }
                WorkerMessage::Activate { reply } => {
                    let result = worker.activate().await;
                    notify_state(&events, &worker);
                    let _ = reply.send(result);
                }
                WorkerMessage::Fetch { request, reply } => {
                    let _ = reply.send(worker.handle_fetch(request).await);
                }
                WorkerMessage::Status { reply } => {
                    let _ = reply.send(WorkerStatus {
                        id: worker.id(),
                        version: worker.version().to_string(),
                        state: worker.state(),
                        skip_waiting: worker.skip_waiting_requested(),
                    });
                }
                WorkerMessage::Retire => {
                    worker.retire();
                    notify_state(&events, &worker);
                }
            }
        }
        debug!("Worker {} stopped", worker.version());
    });

    WorkerHandle { version, tx }
}

fn notify_state(events: &broadcast::Sender<LifecycleEvent>, worker: &ShellWorker) {
    // No subscribers is fine
    let _ = events.send(LifecycleEvent::StateChanged {
        version: worker.version().to_string(),
        state: worker.state(),
    });
}

/// Persisted record of the controlling worker
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistrationRecord {
    pub worker_id: Uuid,
    pub version: String,
    pub activated_at: DateTime<Utc>,
}

impl RegistrationRecord {
    /// Load the record, if any
    pub async fn load(path: &Path) -> IdeResult<Option<Self>> {
        if !path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(path)
            .await
            .map_err(|e| IdeError::io(format!("reading {}", path.display()), e))?;
        Ok(Some(serde_json::from_str(&content)?))
    }

    async fn save(&self, path: &Path) -> IdeResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| IdeError::io("creating state directory", e))?;
        }
        fs::write(path, serde_json::to_string_pretty(self)?)
            .await
            .map_err(|e| IdeError::io(format!("writing {}", path.display()), e))
    }
}

/// What `register` did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegisterOutcome {
    /// The configured version already controls the page
    Current { version: String },
    /// A new version installed and took control
    Activated {
        version: String,
        replaced: Option<String>,
        evicted: Vec<String>,
    },
}

/// What `reset` removed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResetReport {
    pub unregistered: Option<String>,
    pub deleted_stores: Vec<String>,
}

/// Page-side registration of the shell worker
pub struct ShellRegistration {
    storage: CacheStorage,
    record_path: PathBuf,
    network: Arc<dyn Fetcher>,
    events: broadcast::Sender<LifecycleEvent>,
    controller: Option<WorkerHandle>,
}

impl ShellRegistration {
    pub fn new(storage: CacheStorage, record_path: PathBuf, network: Arc<dyn Fetcher>) -> Self {
        let (events, _) = broadcast::channel(64);
        Self {
            storage,
            record_path,
            network,
            events,
            controller: None,
        }
    }

    /// Subscribe to lifecycle events
    pub fn subscribe(&self) -> broadcast::Receiver<LifecycleEvent> {
        self.events.subscribe()
    }

    /// The worker controlling the page, if any
    pub fn controller(&self) -> Option<&WorkerHandle> {
        self.controller.as_ref()
    }

    /// The fetcher pages should use: the controller, or the plain network
    pub fn fetcher(&self) -> Arc<dyn Fetcher> {
        match &self.controller {
            Some(handle) => Arc::new(handle.clone()),
            None => self.network.clone(),
        }
    }

    /// Cache storage the workers write to
    pub fn storage(&self) -> &CacheStorage {
        &self.storage
    }

    /// Re-attach the worker recorded by an earlier run
    pub async fn restore(&mut self) -> IdeResult<Option<String>> {
        if self.controller.is_some() {
            return Ok(self.controller.as_ref().map(|c| c.version.clone()));
        }
        let Some(record) = RegistrationRecord::load(&self.record_path).await? else {
            return Ok(None);
        };
        if !self.storage.has(&record.version) {
            warn!(
                "Registered shell {} has no cache store, ignoring registration",
                record.version
            );
            return Ok(None);
        }

        let worker = ShellWorker::resume(
            record.worker_id,
            record.version.clone(),
            self.network.clone(),
            self.storage.clone(),
        );
        self.controller = Some(spawn_worker(worker, self.events.clone()));
        debug!("Restored shell worker {}", record.version);
        Ok(Some(record.version))
    }

    /// Register the worker for `version`.
    ///
    /// If that version already controls the page nothing happens unless
    /// `force` is set. Otherwise a new worker installs; because it skips
    /// waiting it activates and claims the page right away. When install
    /// fails the previous controller stays in place.
    pub async fn register(
        &mut self,
        version: &str,
        assets: Vec<Url>,
        force: bool,
    ) -> IdeResult<RegisterOutcome> {
        self.restore().await?;

        let current = self.controller.as_ref().map(|c| c.version.clone());
        if !force && current.as_deref() == Some(version) {
            return Ok(RegisterOutcome::Current {
                version: version.to_string(),
            });
        }

        let worker = ShellWorker::new(
            version,
            assets,
            self.network.clone(),
            self.storage.clone(),
        );
        let worker_id = worker.id();
        let handle = spawn_worker(worker, self.events.clone());

        handle.install().await?;

        if current.is_some() {
            info!("Update found: shell {}", version);
            let _ = self.events.send(LifecycleEvent::UpdateFound {
                version: version.to_string(),
            });
        }

        let status = handle.status().await?;
        if !status.skip_waiting {
            return Err(IdeError::Internal(format!(
                "shell {} installed but did not skip waiting",
                version
            )));
        }
        let evicted = handle.activate().await?;

        if let Some(old) = self.controller.take() {
            old.retire().await;
        }

        RegistrationRecord {
            worker_id,
            version: version.to_string(),
            activated_at: Utc::now(),
        }
        .save(&self.record_path)
        .await?;

        self.controller = Some(handle);
        let _ = self.events.send(LifecycleEvent::ControllerChanged {
            version: version.to_string(),
        });

        Ok(RegisterOutcome::Activated {
            version: version.to_string(),
            replaced: current,
            evicted,
        })
    }

    /// Unregister every worker and delete every cache store.
    ///
    /// Callers follow this with a hard reload, i.e. a fresh `register`.
    pub async fn reset(&mut self) -> IdeResult<ResetReport> {
        let mut report = ResetReport::default();

        if let Some(old) = self.controller.take() {
            old.retire().await;
            report.unregistered = Some(old.version.clone());
        } else if let Some(record) = RegistrationRecord::load(&self.record_path).await? {
            report.unregistered = Some(record.version);
        }

        if self.record_path.exists() {
            fs::remove_file(&self.record_path).await.map_err(|e| {
                IdeError::io(format!("removing {}", self.record_path.display()), e)
            })?;
        }

        for name in self.storage.keys().await? {
            if self.storage.delete(&name).await? {
                report.deleted_stores.push(name);
            }
        }

        info!(
            "Shell reset: {} cache store(s) deleted",
            report.deleted_stores.len()
        );
        Ok(report)
    }
}

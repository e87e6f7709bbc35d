//! Authenticated RPC dispatch and failure classification

use crate::config::DEFAULT_REJECTION_MARKER;
use crate::error::{IdeError, IdeResult};
use crate::fetch::{Fetcher, Request};
use crate::session::busy::BusyGauge;
use crate::session::protocol::{
    Action, CreatedProject, DeployResult, EncodedFiles, ProjectFiles, ProjectSummary, RpcEnvelope,
};
use crate::session::state::{ActiveProject, Session};
use crate::session::storage::{LocalStore, ACCESS_KEY};
use serde::de::DeserializeOwned;
use serde_json::{json, Map, Value};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info, warn};

/// Fallback when a failure carries no message
const UNKNOWN_ERROR: &str = "Unknown Error";

/// Owns the credential and performs every backend call
pub struct SessionClient {
    endpoint: String,
    rejection_marker: String,
    fetcher: Arc<dyn Fetcher>,
    store: LocalStore,
    session: Mutex<Session>,
    busy: BusyGauge,
}

impl SessionClient {
    /// Create a logged-out client.
    ///
    /// A blank `rejection_marker` falls back to the default one.
    pub fn new(
        endpoint: impl Into<String>,
        rejection_marker: impl Into<String>,
        fetcher: Arc<dyn Fetcher>,
        store: LocalStore,
    ) -> Self {
        let mut rejection_marker = rejection_marker.into();
        if rejection_marker.trim().is_empty() {
            warn!("Blank credential rejection marker, using {:?}", DEFAULT_REJECTION_MARKER);
            rejection_marker = DEFAULT_REJECTION_MARKER.to_string();
        }
        Self {
            endpoint: endpoint.into(),
            rejection_marker,
            fetcher,
            store,
            session: Mutex::new(Session::default()),
            busy: BusyGauge::new(),
        }
    }

    fn session(&self) -> MutexGuard<'_, Session> {
        // A panic while holding the lock cannot leave Session half-updated
        self.session.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Load the persisted credential. Returns whether one was found.
    pub async fn restore(&self) -> IdeResult<bool> {
        match self.store.get(ACCESS_KEY).await? {
            Some(key) if !key.is_empty() => {
                *self.session() = Session::with_key(key);
                debug!("Restored persisted access key");
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    /// Adopt and persist a new credential
    pub async fn login(&self, access_key: &str) -> IdeResult<()> {
        let access_key = access_key.trim();
        if access_key.is_empty() {
            return Err(IdeError::User("Enter password".to_string()));
        }
        self.store.set(ACCESS_KEY, access_key).await?;
        *self.session() = Session::with_key(access_key);
        info!("Logged in");
        Ok(())
    }

    /// Clear the credential, in memory and on disk
    pub async fn logout(&self) -> IdeResult<()> {
        self.session().reset();
        self.store.remove(ACCESS_KEY).await?;
        info!("Logged out");
        Ok(())
    }

    pub fn is_logged_in(&self) -> bool {
        self.session().is_authenticated()
    }

    pub fn active_project(&self) -> Option<ActiveProject> {
        self.session().project().cloned()
    }

    pub fn set_active_project(&self, project: ActiveProject) {
        self.session().set_project(project);
    }

    pub fn close_project(&self) -> Option<ActiveProject> {
        self.session().close_project()
    }

    /// Gauge behind the busy indicator
    pub fn busy(&self) -> &BusyGauge {
        &self.busy
    }

    /// Perform one action.
    ///
    /// Sends `{action, accessKey, ...params}` and returns `data` on success.
    /// `params` cannot shadow `action` or `accessKey`. A failure whose
    /// message carries the rejection marker tears the session down before
    /// returning `Authentication`. Nothing is retried.
    pub async fn dispatch(&self, action: Action, params: Map<String, Value>) -> IdeResult<Value> {
        let access_key = self
            .session()
            .access_key()
            .map(str::to_string)
            .ok_or(IdeError::NotLoggedIn)?;

        if self.endpoint.is_empty() {
            return Err(IdeError::User(
                "Backend endpoint not configured. Run: pocketide config set backend.endpoint <url>"
                    .to_string(),
            ));
        }

        let mut body = params;
        body.insert("action".to_string(), json!(action));
        body.insert("accessKey".to_string(), json!(access_key));
        let payload = serde_json::to_vec(&Value::Object(body))?;

        let request = Request::post(&self.endpoint, payload)
            .header("Content-Type", "text/plain;charset=utf-8");

        let _busy = self.busy.enter();
        debug!("Dispatching {}", action);

        let response = self
            .fetcher
            .fetch(request)
            .await
            .map_err(|e| match e {
                IdeError::Connectivity(_) => e,
                other => IdeError::connectivity(other.to_string()),
            })?;

        let envelope: RpcEnvelope = response
            .text()
            .ok()
            .and_then(|text| serde_json::from_str(&text).ok())
            .ok_or_else(|| {
                IdeError::connectivity(format!(
                    "server returned HTML (error page, HTTP {}) instead of JSON",
                    response.status
                ))
            })?;

        if !envelope.success {
            let message = envelope
                .error
                .filter(|m| !m.is_empty())
                .unwrap_or_else(|| UNKNOWN_ERROR.to_string());

            if message.contains(&self.rejection_marker) {
                warn!("{} rejected the access key, logging out", action);
                self.logout().await?;
                return Err(IdeError::Authentication(message));
            }
            return Err(IdeError::Application(message));
        }

        Ok(envelope.data.unwrap_or(Value::Null))
    }

    async fn call<T: DeserializeOwned>(
        &self,
        action: Action,
        params: Map<String, Value>,
    ) -> IdeResult<T> {
        let data = self.dispatch(action, params).await?;
        serde_json::from_value(data).map_err(|e| {
            IdeError::connectivity(format!("unexpected {} payload: {}", action, e))
        })
    }

    pub async fn list_projects(&self) -> IdeResult<Vec<ProjectSummary>> {
        self.call(Action::GetProjects, Map::new()).await
    }

    pub async fn create_project(&self, name: &str) -> IdeResult<CreatedProject> {
        self.call(Action::CreateProject, params([("name", json!(name))]))
            .await
    }

    pub async fn get_files(&self, script_id: &str) -> IdeResult<ProjectFiles> {
        self.call(Action::GetFiles, params([("scriptId", json!(script_id))]))
            .await
    }

    pub async fn save_project(&self, id: &str, files: &EncodedFiles) -> IdeResult<()> {
        self.dispatch(
            Action::SaveProject,
            params([("id", json!(id)), ("files", json!(files))]),
        )
        .await?;
        Ok(())
    }

    pub async fn deploy_project(&self, id: &str, files: &EncodedFiles) -> IdeResult<DeployResult> {
        self.call(
            Action::DeployProject,
            params([("id", json!(id)), ("files", json!(files))]),
        )
        .await
    }

    pub async fn delete_project(&self, id: &str) -> IdeResult<()> {
        self.dispatch(Action::DeleteProject, params([("id", json!(id))]))
            .await?;
        Ok(())
    }
}

fn params<const N: usize>(pairs: [(&str, Value); N]) -> Map<String, Value> {
    pairs
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect()
}

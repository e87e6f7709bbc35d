//! Page controller: the only place a draft flush and an RPC meet
//!
//! Every user-level flow goes through [`Workspace`]. It owns the session
//! client and the draft buffers, and persists the open project together
//! with the drafts so unsaved edits survive between invocations.

use crate::draft::{DraftBuffer, DraftBufferStore, EditorSurface, Slot};
use crate::error::{IdeError, IdeResult};
use crate::session::{ActiveProject, CreatedProject, DeployResult, ProjectSummary, SessionClient};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info, warn};

/// What survives between invocations
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WorkspaceState {
    pub project: Option<ActiveProject>,
    #[serde(default)]
    pub buffer: DraftBuffer,
}

impl WorkspaceState {
    async fn load(path: &Path) -> IdeResult<Option<Self>> {
        if !path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(path)
            .await
            .map_err(|e| IdeError::io(format!("reading {}", path.display()), e))?;
        match serde_json::from_str(&content) {
            Ok(state) => Ok(Some(state)),
            Err(e) => {
                warn!("Ignoring unreadable workspace file {}: {}", path.display(), e);
                Ok(None)
            }
        }
    }
}

/// The open project and its drafts, bound to one editor surface
pub struct Workspace<S: EditorSurface> {
    client: SessionClient,
    drafts: DraftBufferStore<S>,
    state_path: PathBuf,
}

impl<S: EditorSurface> Workspace<S> {
    /// Restore the credential and any persisted project with its drafts.
    ///
    /// The editor surface is left untouched so edits made since the last
    /// invocation are picked up by the next flush.
    pub async fn load(client: SessionClient, surface: S, state_path: PathBuf) -> IdeResult<Self> {
        client.restore().await?;

        let drafts = match WorkspaceState::load(&state_path).await? {
            Some(WorkspaceState {
                project: Some(project),
                buffer,
            }) if client.is_logged_in() => {
                debug!("Resuming project {}", project.name);
                client.set_active_project(project);
                DraftBufferStore::resume(buffer, surface)
            }
            _ => DraftBufferStore::new(surface),
        };

        Ok(Self {
            client,
            drafts,
            state_path,
        })
    }

    pub fn client(&self) -> &SessionClient {
        &self.client
    }

    pub fn drafts(&self) -> &DraftBufferStore<S> {
        &self.drafts
    }

    pub fn drafts_mut(&mut self) -> &mut DraftBufferStore<S> {
        &mut self.drafts
    }

    pub fn project(&self) -> Option<ActiveProject> {
        self.client.active_project()
    }

    fn require_project(&self) -> IdeResult<ActiveProject> {
        self.client.active_project().ok_or(IdeError::NoActiveProject)
    }

    async fn persist(&self) -> IdeResult<()> {
        let state = WorkspaceState {
            project: self.client.active_project(),
            buffer: self.drafts.buffer().clone(),
        };
        if let Some(parent) = self.state_path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| IdeError::io("creating state directory", e))?;
        }
        fs::write(&self.state_path, serde_json::to_string_pretty(&state)?)
            .await
            .map_err(|e| IdeError::io(format!("writing {}", self.state_path.display()), e))
    }

    async fn discard(&mut self) -> IdeResult<()> {
        self.client.close_project();
        self.drafts.close()?;
        if self.state_path.exists() {
            fs::remove_file(&self.state_path)
                .await
                .map_err(|e| IdeError::io(format!("removing {}", self.state_path.display()), e))?;
        }
        Ok(())
    }

    /// Drop local state if the backend just rejected the credential
    async fn settle<T>(&mut self, result: IdeResult<T>) -> IdeResult<T> {
        if let Err(IdeError::Authentication(_)) = &result {
            self.discard().await?;
        }
        result
    }

    pub async fn login(&mut self, access_key: &str) -> IdeResult<()> {
        self.client.login(access_key).await
    }

    /// Log out and discard the drafts
    pub async fn logout(&mut self) -> IdeResult<()> {
        self.client.logout().await?;
        self.discard().await
    }

    pub async fn list_projects(&mut self) -> IdeResult<Vec<ProjectSummary>> {
        let result = self.client.list_projects().await;
        self.settle(result).await
    }

    /// Find a project by exact id, then by name
    pub async fn find_project(&mut self, needle: &str) -> IdeResult<ProjectSummary> {
        let mut projects = self.list_projects().await?;
        let index = projects
            .iter()
            .position(|p| p.id == needle)
            .or_else(|| projects.iter().position(|p| p.name == needle))
            .ok_or_else(|| IdeError::ProjectNotFound(needle.to_string()))?;
        Ok(projects.swap_remove(index))
    }

    /// Make `project` active and load its files.
    ///
    /// The drafts show placeholders until `GET_FILES` answers. On failure the
    /// project stays open with the error text in the editor.
    pub async fn open(&mut self, project: ActiveProject) -> IdeResult<()> {
        if !self.client.is_logged_in() {
            return Err(IdeError::NotLoggedIn);
        }
        let script_id = project.script_id.clone();
        info!("Opening {}", project.name);
        self.client.set_active_project(project);

        let ticket = self.drafts.open_project(None)?;
        match self.client.get_files(&script_id).await {
            Ok(files) => {
                if let Some(ticket) = ticket {
                    self.drafts.complete_load(ticket, files)?;
                }
                self.persist().await
            }
            Err(e) => {
                if let (Some(ticket), false) = (ticket, matches!(e, IdeError::Authentication(_))) {
                    self.drafts.fail_load(ticket)?;
                    self.persist().await?;
                }
                self.settle(Err(e)).await
            }
        }
    }

    /// Create a project and open it with the files the backend returned
    pub async fn create(&mut self, name: &str) -> IdeResult<CreatedProject> {
        let name = name.trim();
        if name.is_empty() {
            return Err(IdeError::User("Project name cannot be empty".to_string()));
        }
        let result = self.client.create_project(name).await;
        let created = self.settle(result).await?;

        self.client.set_active_project(ActiveProject {
            id: created.id.clone(),
            name: created.name.clone(),
            script_id: created.script_id.clone(),
        });
        self.drafts.open_project(Some(created.files.clone()))?;
        self.persist().await?;
        Ok(created)
    }

    /// Flush, then bind another slot to the editor
    pub async fn switch_slot(&mut self, slot: Slot) -> IdeResult<()> {
        self.require_project()?;
        self.drafts.switch_slot(slot)?;
        self.persist().await
    }

    /// Upload the drafts
    pub async fn save(&mut self) -> IdeResult<ActiveProject> {
        let project = self.require_project()?;
        let files = self.drafts.snapshot_for_upload()?;
        self.persist().await?;

        let result = self.client.save_project(&project.id, &files).await;
        self.settle(result).await?;
        info!("Saved {}", project.name);
        Ok(project)
    }

    /// Upload the drafts and publish them
    pub async fn deploy(&mut self) -> IdeResult<DeployResult> {
        let project = self.require_project()?;
        let files = self.drafts.snapshot_for_upload()?;
        self.persist().await?;

        let result = self.client.deploy_project(&project.id, &files).await;
        let deployed = self.settle(result).await?;
        info!("Deployed {} to {}", project.name, deployed.app_url);
        Ok(deployed)
    }

    /// Delete a project, closing it first if it is the open one
    pub async fn delete(&mut self, id: &str) -> IdeResult<()> {
        let result = self.client.delete_project(id).await;
        self.settle(result).await?;

        if self.project().is_some_and(|p| p.id == id) {
            self.close().await?;
        }
        Ok(())
    }

    /// Close the project and discard its drafts
    pub async fn close(&mut self) -> IdeResult<Option<ActiveProject>> {
        let project = self.client.active_project();
        self.discard().await?;
        Ok(project)
    }
}

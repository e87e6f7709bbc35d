//! In-memory session state

use crate::session::protocol::ProjectSummary;
use serde::{Deserialize, Serialize};

/// The project currently open in the editor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveProject {
    /// Backend project id
    pub id: String,

    /// Display name
    pub name: String,

    /// Backend script id the files live in
    pub script_id: String,
}

impl From<ProjectSummary> for ActiveProject {
    fn from(summary: ProjectSummary) -> Self {
        Self {
            id: summary.id,
            name: summary.name,
            script_id: summary.script_id,
        }
    }
}

/// Credential plus the open project
#[derive(Debug, Clone, Default)]
pub struct Session {
    access_key: Option<String>,
    project: Option<ActiveProject>,
}

impl Session {
    /// Session holding `access_key` and no project
    pub fn with_key(access_key: impl Into<String>) -> Self {
        Self {
            access_key: Some(access_key.into()),
            project: None,
        }
    }

    pub fn access_key(&self) -> Option<&str> {
        self.access_key.as_deref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.access_key.is_some()
    }

    pub fn project(&self) -> Option<&ActiveProject> {
        self.project.as_ref()
    }

    pub fn set_project(&mut self, project: ActiveProject) {
        self.project = Some(project);
    }

    /// Forget the open project, keep the credential
    pub fn close_project(&mut self) -> Option<ActiveProject> {
        self.project.take()
    }

    /// Forget everything
    pub fn reset(&mut self) {
        self.access_key = None;
        self.project = None;
    }
}

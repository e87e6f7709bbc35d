//! Backend RPC protocol
//!
//! Every call is a POST of one flat JSON object
//! `{action, accessKey, ...params}` to a single endpoint; every answer is
//! `{success: true, data}` or `{success: false, error}`.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Named backend actions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Action {
    GetProjects,
    CreateProject,
    GetFiles,
    SaveProject,
    DeployProject,
    DeleteProject,
}

impl Action {
    /// Wire name of the action
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::GetProjects => "GET_PROJECTS",
            Self::CreateProject => "CREATE_PROJECT",
            Self::GetFiles => "GET_FILES",
            Self::SaveProject => "SAVE_PROJECT",
            Self::DeployProject => "DEPLOY_PROJECT",
            Self::DeleteProject => "DELETE_PROJECT",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Response envelope
#[derive(Debug, Clone, Deserialize)]
pub struct RpcEnvelope {
    pub success: bool,
    #[serde(default)]
    pub data: Option<Value>,
    #[serde(default)]
    pub error: Option<String>,
}

/// One entry of `GET_PROJECTS`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectSummary {
    pub id: String,
    pub name: String,
    pub script_id: String,
    /// ISO timestamp or epoch milliseconds, depending on the backend revision
    #[serde(default)]
    pub updated: Option<Value>,
    /// Deployed web app URL, once deployed
    #[serde(default)]
    pub url: Option<String>,
}

impl ProjectSummary {
    /// Last update time, if the backend sent a usable one
    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        match self.updated.as_ref()? {
            Value::String(s) => DateTime::parse_from_rfc3339(s)
                .ok()
                .map(|d| d.with_timezone(&Utc)),
            Value::Number(n) => n
                .as_i64()
                .and_then(|ms| Utc.timestamp_millis_opt(ms).single()),
            _ => None,
        }
    }
}

/// Plain-text content of a project's two files
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectFiles {
    pub script: String,
    pub markup: String,
}

/// File content as transmitted on save and deploy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncodedFiles {
    pub script: String,
    pub markup: String,
}

/// Result of `CREATE_PROJECT`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedProject {
    pub id: String,
    pub name: String,
    pub script_id: String,
    #[serde(default)]
    pub files: ProjectFiles,
}

/// Result of `DEPLOY_PROJECT`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeployResult {
    pub app_url: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn action_wire_names() {
        assert_eq!(
            serde_json::to_value(Action::GetProjects).unwrap(),
            "GET_PROJECTS"
        );
        assert_eq!(Action::DeployProject.to_string(), "DEPLOY_PROJECT");
        assert_eq!(
            serde_json::to_value(Action::DeleteProject).unwrap(),
            Action::DeleteProject.as_str()
        );
    }

    #[test]
    fn envelope_failure() {
        let env: RpcEnvelope =
            serde_json::from_str(r#"{"success":false,"error":"Wrong Password"}"#).unwrap();
        assert!(!env.success);
        assert_eq!(env.error.as_deref(), Some("Wrong Password"));
        assert!(env.data.is_none());
    }

    #[test]
    fn project_summary_parses_camel_case() {
        let list: Vec<ProjectSummary> = serde_json::from_str(
            r#"[{"id":"p1","name":"Demo","scriptId":"s1","updated":"2026-03-01T10:00:00Z"},
                {"id":"p2","name":"Shop","scriptId":"s2","updated":1767225600000,"url":"https://app.test/exec"}]"#,
        )
        .unwrap();

        assert_eq!(list[0].script_id, "s1");
        assert!(list[0].url.is_none());
        assert_eq!(
            list[0].updated_at().unwrap().to_rfc3339(),
            "2026-03-01T10:00:00+00:00"
        );
        assert_eq!(list[1].updated_at().unwrap().timestamp(), 1_767_225_600);
        assert_eq!(list[1].url.as_deref(), Some("https://app.test/exec"));
    }

    #[test]
    fn created_project_with_files() {
        let created: CreatedProject = serde_json::from_str(
            r#"{"id":"p1","name":"Demo","scriptId":"s1","files":{"script":"","markup":""}}"#,
        )
        .unwrap();
        assert_eq!(created.files, ProjectFiles::default());
    }

    #[test]
    fn deploy_result_app_url() {
        let result: DeployResult =
            serde_json::from_str(r#"{"appUrl":"https://script.test/macros/s/abc/exec"}"#).unwrap();
        assert!(result.app_url.ends_with("/exec"));
    }
}

//! Database models for projects, their issue owner settings and code mappings.

use chrono::{DateTime, Utc};
use sqlx::FromRow;

use crate::types::{CodeMappingId, OrganizationId, ProjectId};

#[derive(Debug, Clone, FromRow)]
pub struct ProjectDBResponse {
    pub id: ProjectId,
    pub organization_id: OrganizationId,
    pub slug: String,
    pub name: String,
    pub platform: Option<String>,
    pub date_added: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct ProjectCreateDBRequest {
    pub organization_id: OrganizationId,
    pub slug: String,
    pub name: String,
    pub platform: Option<String>,
}

/// Stored issue owner settings. Projects without a row use the defaults from
/// [`crate::ownership::ProjectOwnership::default_for`].
#[derive(Debug, Clone, FromRow)]
pub struct ProjectOwnershipDBResponse {
    pub id: i64,
    pub project_id: ProjectId,
    pub raw: Option<String>,
    pub schema: Option<serde_json::Value>,
    pub fallthrough: bool,
    pub auto_assignment: bool,
    pub codeowners_auto_sync: bool,
    pub date_created: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct ProjectOwnershipUpsertDBRequest {
    pub project_id: ProjectId,
    pub raw: Option<String>,
    pub schema: Option<serde_json::Value>,
    pub fallthrough: bool,
    pub auto_assignment: bool,
}

/// Repository path configuration: maps `source_root` in the repository onto `stack_root`
/// in stack traces.
#[derive(Debug, Clone, FromRow)]
pub struct CodeMappingDBResponse {
    pub id: CodeMappingId,
    pub project_id: ProjectId,
    pub repository_name: String,
    pub provider: Option<String>,
    pub stack_root: String,
    pub source_root: String,
    pub default_branch: Option<String>,
    pub date_added: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct CodeMappingCreateDBRequest {
    pub project_id: ProjectId,
    pub repository_name: String,
    pub provider: Option<String>,
    pub stack_root: String,
    pub source_root: String,
    pub default_branch: Option<String>,
}

//! Database models for project CODEOWNERS records and external actor associations.

use chrono::{DateTime, Utc};
use sqlx::FromRow;

use crate::types::{CodeMappingId, CodeOwnersId, OrganizationId, ProjectId, TeamId, UserId};

#[derive(Debug, Clone, FromRow)]
pub struct CodeOwnersDBResponse {
    pub id: CodeOwnersId,
    pub project_id: ProjectId,
    pub code_mapping_id: CodeMappingId,
    pub raw: String,
    pub schema: serde_json::Value,
    pub date_added: DateTime<Utc>,
    pub date_updated: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct CodeOwnersCreateDBRequest {
    pub project_id: ProjectId,
    pub code_mapping_id: CodeMappingId,
    pub raw: String,
    pub schema: serde_json::Value,
}

/// Partial update; `None` keeps the stored value
#[derive(Debug, Clone, Default)]
pub struct CodeOwnersUpdateDBRequest {
    pub code_mapping_id: Option<CodeMappingId>,
    pub raw: Option<String>,
    pub schema: Option<serde_json::Value>,
}

/// An external handle (e.g. `@octocat` or `@acme/backend`) linked to a user or a team
#[derive(Debug, Clone, FromRow)]
pub struct ExternalActorDBResponse {
    pub id: i64,
    pub organization_id: OrganizationId,
    pub provider: String,
    pub external_name: String,
    pub user_id: Option<UserId>,
    pub team_id: Option<TeamId>,
    pub date_added: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct ExternalActorCreateDBRequest {
    pub organization_id: OrganizationId,
    pub provider: String,
    pub external_name: String,
    pub user_id: Option<UserId>,
    pub team_id: Option<TeamId>,
}

/// External handle joined with what it resolves to
#[derive(Debug, Clone, FromRow)]
pub struct ResolvedExternalActor {
    pub external_name: String,
    pub user_id: Option<UserId>,
    pub user_email: Option<String>,
    pub team_id: Option<TeamId>,
    pub team_slug: Option<String>,
}

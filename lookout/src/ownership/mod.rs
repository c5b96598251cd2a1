//! Issue ownership: project ownership settings, CODEOWNERS handling and the serializer that
//! validates CODEOWNERS updates.
//!
//! Handlers reach project ownership through the [`OwnershipLookup`] capability stored in
//! [`crate::AppState`], so tests and alternative stores can swap the lookup out.

pub mod codeowners;
pub mod rules;
pub mod serializer;

use sqlx::PgConnection;
use tracing::instrument;

use crate::db::handlers::ProjectOwnerships;
use crate::db::models::projects::{ProjectDBResponse, ProjectOwnershipDBResponse};
use crate::errors::Result;
use crate::types::ProjectId;

/// Issue owner settings of one project
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectOwnership {
    pub project_id: ProjectId,
    pub raw: Option<String>,
    pub schema: Option<serde_json::Value>,
    pub fallthrough: bool,
    pub auto_assignment: bool,
    pub codeowners_auto_sync: bool,
    /// false for the defaults handed out when nothing is stored yet
    pub persisted: bool,
}

impl ProjectOwnership {
    /// Settings a project has before anyone configures ownership
    pub fn default_for(project_id: ProjectId) -> Self {
        Self {
            project_id,
            raw: None,
            schema: None,
            fallthrough: true,
            auto_assignment: false,
            codeowners_auto_sync: true,
            persisted: false,
        }
    }
}

impl From<ProjectOwnershipDBResponse> for ProjectOwnership {
    fn from(db: ProjectOwnershipDBResponse) -> Self {
        Self {
            project_id: db.project_id,
            raw: db.raw,
            schema: db.schema,
            fallthrough: db.fallthrough,
            auto_assignment: db.auto_assignment,
            codeowners_auto_sync: db.codeowners_auto_sync,
            persisted: true,
        }
    }
}

/// Resolve the ownership settings of a project.
///
/// Takes the caller's connection so the lookup sees the same transaction as the handler.
#[async_trait::async_trait]
pub trait OwnershipLookup: Send + Sync {
    async fn get_ownership(&self, conn: &mut PgConnection, project: &ProjectDBResponse) -> Result<ProjectOwnership>;
}

/// [`OwnershipLookup`] backed by the `project_ownership` table
#[derive(Debug, Clone, Copy, Default)]
pub struct PostgresOwnershipLookup;

#[async_trait::async_trait]
impl OwnershipLookup for PostgresOwnershipLookup {
    #[instrument(skip_all, fields(project_id = project.id), err)]
    async fn get_ownership(&self, conn: &mut PgConnection, project: &ProjectDBResponse) -> Result<ProjectOwnership> {
        let stored = ProjectOwnerships::new(conn).get_for_project(project.id).await?;
        Ok(stored
            .map(ProjectOwnership::from)
            .unwrap_or_else(|| ProjectOwnership::default_for(project.id)))
    }
}

//! Database repositories for projects, project ownership settings and code mappings.

use sqlx::PgConnection;
use tracing::instrument;

use crate::db::errors::Result;
use crate::db::models::projects::{
    CodeMappingCreateDBRequest, CodeMappingDBResponse, ProjectCreateDBRequest, ProjectDBResponse, ProjectOwnershipDBResponse,
    ProjectOwnershipUpsertDBRequest,
};
use crate::types::{CodeMappingId, OrganizationId, ProjectId};

pub struct Projects<'c> {
    db: &'c mut PgConnection,
}

impl<'c> Projects<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    #[instrument(skip(self, request), fields(slug = %request.slug), err)]
    pub async fn create(&mut self, request: &ProjectCreateDBRequest) -> Result<ProjectDBResponse> {
        let project = sqlx::query_as::<_, ProjectDBResponse>(
            r#"
            INSERT INTO projects (organization_id, slug, name, platform)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(request.organization_id)
        .bind(&request.slug)
        .bind(&request.name)
        .bind(request.platform.as_deref())
        .fetch_one(&mut *self.db)
        .await?;

        Ok(project)
    }

    #[instrument(skip(self), err)]
    pub async fn get_by_slug(&mut self, organization_id: OrganizationId, slug: &str) -> Result<Option<ProjectDBResponse>> {
        let project = sqlx::query_as::<_, ProjectDBResponse>("SELECT * FROM projects WHERE organization_id = $1 AND slug = $2")
            .bind(organization_id)
            .bind(slug)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(project)
    }
}

pub struct ProjectOwnerships<'c> {
    db: &'c mut PgConnection,
}

impl<'c> ProjectOwnerships<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    #[instrument(skip(self), err)]
    pub async fn get_for_project(&mut self, project_id: ProjectId) -> Result<Option<ProjectOwnershipDBResponse>> {
        let ownership = sqlx::query_as::<_, ProjectOwnershipDBResponse>("SELECT * FROM project_ownership WHERE project_id = $1")
            .bind(project_id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(ownership)
    }

    #[instrument(skip(self, request), fields(project_id = request.project_id), err)]
    pub async fn upsert(&mut self, request: &ProjectOwnershipUpsertDBRequest) -> Result<ProjectOwnershipDBResponse> {
        let ownership = sqlx::query_as::<_, ProjectOwnershipDBResponse>(
            r#"
            INSERT INTO project_ownership (project_id, raw, schema, fallthrough, auto_assignment)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (project_id) DO UPDATE SET
                raw = EXCLUDED.raw,
                schema = EXCLUDED.schema,
                fallthrough = EXCLUDED.fallthrough,
                auto_assignment = EXCLUDED.auto_assignment,
                last_updated = NOW()
            RETURNING *
            "#,
        )
        .bind(request.project_id)
        .bind(request.raw.as_deref())
        .bind(request.schema.as_ref())
        .bind(request.fallthrough)
        .bind(request.auto_assignment)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(ownership)
    }
}

pub struct CodeMappings<'c> {
    db: &'c mut PgConnection,
}

impl<'c> CodeMappings<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    #[instrument(skip(self, request), fields(project_id = request.project_id), err)]
    pub async fn create(&mut self, request: &CodeMappingCreateDBRequest) -> Result<CodeMappingDBResponse> {
        let mapping = sqlx::query_as::<_, CodeMappingDBResponse>(
            r#"
            INSERT INTO code_mappings (project_id, repository_name, provider, stack_root, source_root, default_branch)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(request.project_id)
        .bind(&request.repository_name)
        .bind(request.provider.as_deref())
        .bind(&request.stack_root)
        .bind(&request.source_root)
        .bind(request.default_branch.as_deref())
        .fetch_one(&mut *self.db)
        .await?;

        Ok(mapping)
    }

    /// Code mappings are project scoped; a mapping from another project is reported as absent.
    #[instrument(skip(self), err)]
    pub async fn get_for_project(&mut self, id: CodeMappingId, project_id: ProjectId) -> Result<Option<CodeMappingDBResponse>> {
        let mapping = sqlx::query_as::<_, CodeMappingDBResponse>("SELECT * FROM code_mappings WHERE id = $1 AND project_id = $2")
            .bind(id)
            .bind(project_id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(mapping)
    }
}

use sqlx::PgConnection;
use tracing::instrument;

use crate::db::errors::Result;
use crate::db::models::code_owners::{ExternalActorCreateDBRequest, ExternalActorDBResponse, ResolvedExternalActor};
use crate::types::OrganizationId;

/// Repository for source control handles linked to users and teams.
pub struct ExternalActors<'c> {
    db: &'c mut PgConnection,
}

impl<'c> ExternalActors<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    #[instrument(skip(self, request), fields(external_name = %request.external_name), err)]
    pub async fn create(&mut self, request: &ExternalActorCreateDBRequest) -> Result<ExternalActorDBResponse> {
        let actor = sqlx::query_as::<_, ExternalActorDBResponse>(
            r#"
            INSERT INTO external_actors (organization_id, provider, external_name, user_id, team_id)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(request.organization_id)
        .bind(&request.provider)
        .bind(&request.external_name)
        .bind(request.user_id)
        .bind(request.team_id)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(actor)
    }

    /// Resolve handles to the users/teams they are linked to. Handles without an association
    /// are simply missing from the result.
    #[instrument(skip(self, names), fields(count = names.len()), err)]
    pub async fn resolve(&mut self, organization_id: OrganizationId, names: &[String]) -> Result<Vec<ResolvedExternalActor>> {
        if names.is_empty() {
            return Ok(Vec::new());
        }

        let actors = sqlx::query_as::<_, ResolvedExternalActor>(
            r#"
            SELECT
                a.external_name,
                u.id AS user_id,
                u.email AS user_email,
                t.id AS team_id,
                t.slug AS team_slug
            FROM external_actors a
            LEFT JOIN users u ON u.id = a.user_id
            LEFT JOIN teams t ON t.id = a.team_id
            WHERE a.organization_id = $1 AND a.external_name = ANY($2)
            "#,
        )
        .bind(organization_id)
        .bind(names)
        .fetch_all(&mut *self.db)
        .await?;

        Ok(actors)
    }
}

//! Database repository for organizations, memberships and teams.

use sqlx::PgConnection;
use tracing::instrument;

use crate::api::models::users::Role;
use crate::db::errors::Result;
use crate::db::models::organizations::{
    OrganizationCreateDBRequest, OrganizationDBResponse, OrganizationMemberDBResponse, TeamCreateDBRequest, TeamDBResponse,
};
use crate::db::models::users::UserDBResponse;
use crate::types::{OrganizationId, UserId};

pub struct Organizations<'c> {
    db: &'c mut PgConnection,
}

impl<'c> Organizations<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    #[instrument(skip(self, request), fields(slug = %request.slug), err)]
    pub async fn create(&mut self, request: &OrganizationCreateDBRequest) -> Result<OrganizationDBResponse> {
        let organization =
            sqlx::query_as::<_, OrganizationDBResponse>("INSERT INTO organizations (slug, name) VALUES ($1, $2) RETURNING *")
                .bind(&request.slug)
                .bind(&request.name)
                .fetch_one(&mut *self.db)
                .await?;

        Ok(organization)
    }

    #[instrument(skip(self), err)]
    pub async fn get_by_slug(&mut self, slug: &str) -> Result<Option<OrganizationDBResponse>> {
        let organization = sqlx::query_as::<_, OrganizationDBResponse>("SELECT * FROM organizations WHERE slug = $1")
            .bind(slug)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(organization)
    }

    /// Add a user to an organization, or change the role of an existing member
    #[instrument(skip(self), err)]
    pub async fn add_member(&mut self, organization_id: OrganizationId, user_id: UserId, role: Role) -> Result<OrganizationMemberDBResponse> {
        let member = sqlx::query_as::<_, OrganizationMemberDBResponse>(
            r#"
            INSERT INTO organization_members (organization_id, user_id, role)
            VALUES ($1, $2, $3)
            ON CONFLICT (organization_id, user_id) DO UPDATE SET role = EXCLUDED.role
            RETURNING *
            "#,
        )
        .bind(organization_id)
        .bind(user_id)
        .bind(role)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(member)
    }

    #[instrument(skip(self), err)]
    pub async fn get_member(&mut self, organization_id: OrganizationId, user_id: UserId) -> Result<Option<OrganizationMemberDBResponse>> {
        let member = sqlx::query_as::<_, OrganizationMemberDBResponse>(
            "SELECT * FROM organization_members WHERE organization_id = $1 AND user_id = $2",
        )
        .bind(organization_id)
        .bind(user_id)
        .fetch_optional(&mut *self.db)
        .await?;

        Ok(member)
    }

    /// Users of the organization whose email is in `emails` (case-insensitive)
    #[instrument(skip(self, emails), fields(count = emails.len()), err)]
    pub async fn members_with_emails(&mut self, organization_id: OrganizationId, emails: &[String]) -> Result<Vec<UserDBResponse>> {
        let lowered: Vec<String> = emails.iter().map(|e| e.to_lowercase()).collect();
        let users = sqlx::query_as::<_, UserDBResponse>(
            r#"
            SELECT u.* FROM users u
            JOIN organization_members m ON m.user_id = u.id
            WHERE m.organization_id = $1 AND LOWER(u.email) = ANY($2)
            "#,
        )
        .bind(organization_id)
        .bind(&lowered)
        .fetch_all(&mut *self.db)
        .await?;

        Ok(users)
    }

    #[instrument(skip(self, request), fields(slug = %request.slug), err)]
    pub async fn create_team(&mut self, request: &TeamCreateDBRequest) -> Result<TeamDBResponse> {
        let team = sqlx::query_as::<_, TeamDBResponse>("INSERT INTO teams (organization_id, slug, name) VALUES ($1, $2, $3) RETURNING *")
            .bind(request.organization_id)
            .bind(&request.slug)
            .bind(&request.name)
            .fetch_one(&mut *self.db)
            .await?;

        Ok(team)
    }
}

//! Database models for organizations, their members and teams.

use chrono::{DateTime, Utc};
use sqlx::FromRow;

use crate::api::models::users::Role;
use crate::types::{OrganizationId, TeamId, UserId};

#[derive(Debug, Clone, FromRow)]
pub struct OrganizationDBResponse {
    pub id: OrganizationId,
    pub slug: String,
    pub name: String,
    pub date_added: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct OrganizationCreateDBRequest {
    pub slug: String,
    pub name: String,
}

/// A user's membership in one organization
#[derive(Debug, Clone, FromRow)]
pub struct OrganizationMemberDBResponse {
    pub id: i64,
    pub organization_id: OrganizationId,
    pub user_id: UserId,
    pub role: Role,
    pub date_added: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow)]
pub struct TeamDBResponse {
    pub id: TeamId,
    pub organization_id: OrganizationId,
    pub slug: String,
    pub name: String,
    pub date_added: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct TeamCreateDBRequest {
    pub organization_id: OrganizationId,
    pub slug: String,
    pub name: String,
}

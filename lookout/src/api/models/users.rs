use crate::types::UserId;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Organization membership role, ordered from least to most privileged
#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, PartialOrd, Ord, ToSchema)]
#[sqlx(type_name = "member_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Member,
    Admin,
    Manager,
    Owner,
}

/// The authenticated caller, resolved from the trusted proxy header
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CurrentUser {
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub name: Option<String>,
}

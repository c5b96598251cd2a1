//! HTTP request handlers for API endpoints.
//!
//! All handlers are project scoped: the project comes from the organization and project slugs
//! in the path, and the caller has to be a member of the organization holding the scope the
//! handler requires.

pub mod code_owners;
pub mod samples;

use sqlx::PgConnection;
use tracing::instrument;

use crate::api::models::users::CurrentUser;
use crate::auth::permissions::require_permission;
use crate::db::handlers::{Organizations, Projects};
use crate::db::models::projects::ProjectDBResponse;
use crate::errors::{Error, Result};
use crate::types::{Operation, Permission};

/// Resolve a project from its slugs and check the caller may act on it.
///
/// Unknown organizations and projects are 404s. Callers outside the organization, or without
/// `permission`, get a 403.
#[instrument(skip(conn, user), fields(user_id = user.id), err)]
pub(crate) async fn resolve_project(
    conn: &mut PgConnection,
    user: &CurrentUser,
    organization_slug: &str,
    project_slug: &str,
    permission: Permission,
) -> Result<ProjectDBResponse> {
    let mut organizations = Organizations::new(&mut *conn);
    let organization = organizations
        .get_by_slug(organization_slug)
        .await?
        .ok_or_else(|| Error::NotFound {
            resource: "Organization".to_string(),
            id: organization_slug.to_string(),
        })?;

    let Some(member) = organizations.get_member(organization.id, user.id).await? else {
        return Err(Error::InsufficientPermissions {
            required: permission,
            action: Operation::Read,
            resource: format!("organization {organization_slug}"),
        });
    };

    let project = Projects::new(&mut *conn)
        .get_by_slug(organization.id, project_slug)
        .await?
        .ok_or_else(|| Error::NotFound {
            resource: "Project".to_string(),
            id: format!("{organization_slug}/{project_slug}"),
        })?;

    require_permission(&member, permission, format!("project {organization_slug}/{project_slug}"))?;

    Ok(project)
}

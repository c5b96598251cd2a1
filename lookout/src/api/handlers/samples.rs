use axum::{
    Json,
    extract::{Path, State},
};
use tracing::info;

use crate::{
    AppState,
    api::{
        handlers::resolve_project,
        models::{events::EventResponse, projects::ProjectPathParams, users::CurrentUser},
    },
    db::{handlers::GroupInbox, models::events::GroupInboxReason},
    errors::{Error, Result},
    samples::create_sample_event,
    types::{Operation, Permission, Resource},
};

/// Create a sample event for a project.
///
/// The event is generated for the project's platform and its group is put in the inbox as new,
/// so it shows up like a real first error would.
#[utoipa::path(
    post,
    path = "/projects/{organization_slug}/{project_slug}/create-sample/",
    tag = "events",
    summary = "Create sample event",
    responses(
        (status = 200, description = "Sample event created", body = EventResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Missing event:write"),
        (status = 404, description = "Organization or project not found"),
        (status = 500, description = "Internal server error")
    ),
    params(
        ("organization_slug" = String, Path, description = "Organization slug"),
        ("project_slug" = String, Path, description = "Project slug")
    ),
    security(
        ("X-Lookout-User" = [])
    )
)]
#[tracing::instrument(skip_all)]
pub async fn create_sample(
    State(state): State<AppState>,
    Path(params): Path<ProjectPathParams>,
    current_user: CurrentUser,
) -> Result<Json<EventResponse>> {
    let mut tx = state.db.begin().await.map_err(|e| Error::Database(e.into()))?;

    let project = resolve_project(
        &mut tx,
        &current_user,
        &params.organization_slug,
        &params.project_slug,
        Permission::Allow(Resource::Events, Operation::Write),
    )
    .await?;

    let (event, group) = create_sample_event(&mut tx, &project).await?;
    GroupInbox::new(&mut tx).add(&group, GroupInboxReason::New, None).await?;

    tx.commit().await.map_err(|e| Error::Database(e.into()))?;

    info!(user_id = current_user.id, group_id = group.id, "Created sample event for project {}", project.id);
    Ok(Json(EventResponse::from(event)))
}

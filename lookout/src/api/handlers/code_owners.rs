//! Project CODEOWNERS detail endpoints.

use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
};
use serde_json::Value;
use tracing::info;

use crate::{
    AppState,
    api::{
        handlers::resolve_project,
        models::{
            code_owners::{CodeOwnersPathParams, CodeOwnersResponse, CodeOwnersUpdate},
            users::CurrentUser,
        },
    },
    db::{
        handlers::CodeOwners,
        models::{code_owners::CodeOwnersDBResponse, projects::ProjectDBResponse},
    },
    errors::{Error, Result},
    ownership::serializer::{ProjectCodeOwnerSerializer, ValidationContext},
    types::{CodeOwnersId, Operation, Permission, Resource},
};

fn not_found(params: &CodeOwnersPathParams) -> Error {
    Error::NotFound {
        resource: "ProjectCodeOwners".to_string(),
        id: params.codeowners_id.clone(),
    }
}

/// Load the record named in the path, only if it belongs to `project`
async fn load_code_owners(
    conn: &mut sqlx::PgConnection,
    params: &CodeOwnersPathParams,
    project: &ProjectDBResponse,
) -> Result<CodeOwnersDBResponse> {
    let id: CodeOwnersId = params.codeowners_id.trim().parse().map_err(|_| not_found(params))?;

    CodeOwners::new(conn)
        .get_for_project(id, project.id)
        .await?
        .ok_or_else(|| not_found(params))
}

#[utoipa::path(
    put,
    path = "/projects/{organization_slug}/{project_slug}/codeowners/{codeowners_id}/",
    tag = "codeowners",
    summary = "Update project CODEOWNERS",
    request_body = CodeOwnersUpdate,
    responses(
        (status = 200, description = "CODEOWNERS updated", body = CodeOwnersResponse),
        (status = 400, description = "Validation failed, errors keyed by field"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Missing project:write"),
        (status = 404, description = "Organization, project or CODEOWNERS record not found"),
        (status = 500, description = "Internal server error")
    ),
    params(
        ("organization_slug" = String, Path, description = "Organization slug"),
        ("project_slug" = String, Path, description = "Project slug"),
        ("codeowners_id" = String, Path, description = "CODEOWNERS record ID")
    ),
    security(
        ("X-Lookout-User" = [])
    )
)]
#[tracing::instrument(skip_all)]
pub async fn update_code_owners(
    State(state): State<AppState>,
    Path(params): Path<CodeOwnersPathParams>,
    current_user: CurrentUser,
    body: std::result::Result<Json<Value>, JsonRejection>,
) -> Result<Json<CodeOwnersResponse>> {
    let mut tx = state.db.begin().await.map_err(|e| Error::Database(e.into()))?;

    let project = resolve_project(
        &mut tx,
        &current_user,
        &params.organization_slug,
        &params.project_slug,
        Permission::Allow(Resource::Projects, Operation::Write),
    )
    .await?;
    let instance = load_code_owners(&mut tx, &params, &project).await?;

    let Json(body) = body?;
    let payload = CodeOwnersUpdate::from_json(body)?;

    let ownership = state.ownership.get_ownership(&mut tx, &project).await?;
    let context = ValidationContext { project, ownership };
    let validated = ProjectCodeOwnerSerializer::new(&context, &instance)
        .validate(&mut tx, &payload)
        .await?;

    let updated = CodeOwners::new(&mut tx).update(instance.id, &validated.to_update_request()).await?;
    tx.commit().await.map_err(|e| Error::Database(e.into()))?;

    info!(user_id = current_user.id, "Updated CODEOWNERS {}", updated.id);
    Ok(Json(CodeOwnersResponse::new(updated, validated.code_mapping.provider)))
}

#[utoipa::path(
    delete,
    path = "/projects/{organization_slug}/{project_slug}/codeowners/{codeowners_id}/",
    tag = "codeowners",
    summary = "Delete project CODEOWNERS",
    responses(
        (status = 204, description = "CODEOWNERS deleted"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Missing project:admin"),
        (status = 404, description = "Organization, project or CODEOWNERS record not found"),
        (status = 500, description = "Internal server error")
    ),
    params(
        ("organization_slug" = String, Path, description = "Organization slug"),
        ("project_slug" = String, Path, description = "Project slug"),
        ("codeowners_id" = String, Path, description = "CODEOWNERS record ID")
    ),
    security(
        ("X-Lookout-User" = [])
    )
)]
#[tracing::instrument(skip_all)]
pub async fn delete_code_owners(
    State(state): State<AppState>,
    Path(params): Path<CodeOwnersPathParams>,
    current_user: CurrentUser,
) -> Result<StatusCode> {
    let mut tx = state.db.begin().await.map_err(|e| Error::Database(e.into()))?;

    let project = resolve_project(
        &mut tx,
        &current_user,
        &params.organization_slug,
        &params.project_slug,
        Permission::Allow(Resource::Projects, Operation::Admin),
    )
    .await?;
    let instance = load_code_owners(&mut tx, &params, &project).await?;

    if !CodeOwners::new(&mut tx).delete(instance.id).await? {
        return Err(not_found(&params));
    }
    tx.commit().await.map_err(|e| Error::Database(e.into()))?;

    info!(user_id = current_user.id, "Deleted CODEOWNERS {}", instance.id);
    Ok(StatusCode::NO_CONTENT)
}

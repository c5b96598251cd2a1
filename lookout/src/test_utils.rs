//! Test utilities for integration testing.

use crate::{
    AppState,
    api::models::users::{CurrentUser, Role},
    config::{Config, PoolSettings, ProxyHeaderAuthConfig},
    db::{
        handlers::{CodeMappings, CodeOwners, ExternalActors, Organizations, Projects, Users},
        models::{
            code_owners::{CodeOwnersCreateDBRequest, CodeOwnersDBResponse, ExternalActorCreateDBRequest},
            organizations::{OrganizationCreateDBRequest, OrganizationDBResponse, TeamCreateDBRequest, TeamDBResponse},
            projects::{CodeMappingCreateDBRequest, CodeMappingDBResponse, ProjectCreateDBRequest, ProjectDBResponse},
            users::{UserCreateDBRequest, UserDBResponse},
        },
    },
};
use axum_test::TestServer;
use serde_json::json;
use sqlx::PgPool;

pub async fn create_test_app(pool: PgPool) -> TestServer {
    let config = create_test_config();

    let app = crate::Application::new_with_pool(config, Some(pool))
        .await
        .expect("Failed to create application");

    app.into_test_server()
}

pub fn create_test_config() -> Config {
    let mut config = Config {
        host: "127.0.0.1".to_string(),
        port: 0,
        ..Default::default()
    };
    config.database.pool = PoolSettings {
        max_connections: 2,
        min_connections: 0,
        ..Default::default()
    };
    // Nothing in tests should reach the real API
    config.vercel.base_url = "http://127.0.0.1:9".parse().expect("valid test URL");
    config
}

pub fn create_test_state(pool: PgPool) -> AppState {
    AppState::builder().db(pool).config(create_test_config()).build()
}

pub fn add_auth_headers(user: &UserDBResponse) -> (String, String) {
    let config = ProxyHeaderAuthConfig::default();
    (config.header_name, user.email.clone())
}

pub fn current_user(user: &UserDBResponse) -> CurrentUser {
    CurrentUser {
        id: user.id,
        username: user.username.clone(),
        email: user.email.clone(),
        name: user.name.clone(),
    }
}

pub async fn create_test_user(pool: &PgPool, email: &str) -> UserDBResponse {
    let mut conn = pool.acquire().await.expect("Failed to acquire connection");
    Users::new(&mut conn)
        .create(&UserCreateDBRequest {
            username: email.to_lowercase(),
            email: email.to_string(),
            name: Some("Test User".to_string()),
        })
        .await
        .expect("Failed to create test user")
}

pub async fn create_test_organization(pool: &PgPool, slug: &str) -> OrganizationDBResponse {
    let mut conn = pool.acquire().await.expect("Failed to acquire connection");
    Organizations::new(&mut conn)
        .create(&OrganizationCreateDBRequest {
            slug: slug.to_string(),
            name: format!("Test organization {slug}"),
        })
        .await
        .expect("Failed to create test organization")
}

pub async fn add_test_member(pool: &PgPool, organization: &OrganizationDBResponse, user: &UserDBResponse, role: Role) {
    let mut conn = pool.acquire().await.expect("Failed to acquire connection");
    Organizations::new(&mut conn)
        .add_member(organization.id, user.id, role)
        .await
        .expect("Failed to add test member");
}

pub async fn create_test_team(pool: &PgPool, organization: &OrganizationDBResponse, slug: &str) -> TeamDBResponse {
    let mut conn = pool.acquire().await.expect("Failed to acquire connection");
    Organizations::new(&mut conn)
        .create_team(&TeamCreateDBRequest {
            organization_id: organization.id,
            slug: slug.to_string(),
            name: format!("Test team {slug}"),
        })
        .await
        .expect("Failed to create test team")
}

pub async fn create_test_project(
    pool: &PgPool,
    organization: &OrganizationDBResponse,
    slug: &str,
    platform: Option<&str>,
) -> ProjectDBResponse {
    let mut conn = pool.acquire().await.expect("Failed to acquire connection");
    Projects::new(&mut conn)
        .create(&ProjectCreateDBRequest {
            organization_id: organization.id,
            slug: slug.to_string(),
            name: format!("Test project {slug}"),
            platform: platform.map(str::to_string),
        })
        .await
        .expect("Failed to create test project")
}

/// Code mapping on a github repository
pub async fn create_test_code_mapping(
    pool: &PgPool,
    project: &ProjectDBResponse,
    source_root: &str,
    stack_root: &str,
) -> CodeMappingDBResponse {
    let mut conn = pool.acquire().await.expect("Failed to acquire connection");
    CodeMappings::new(&mut conn)
        .create(&CodeMappingCreateDBRequest {
            project_id: project.id,
            repository_name: format!("acme/{}", project.slug),
            provider: Some("github".to_string()),
            stack_root: stack_root.to_string(),
            source_root: source_root.to_string(),
            default_branch: Some("main".to_string()),
        })
        .await
        .expect("Failed to create test code mapping")
}

/// CODEOWNERS record with an empty rule set, whatever `raw` says
pub async fn create_test_code_owners(
    pool: &PgPool,
    project: &ProjectDBResponse,
    code_mapping: &CodeMappingDBResponse,
    raw: &str,
) -> CodeOwnersDBResponse {
    let mut conn = pool.acquire().await.expect("Failed to acquire connection");
    CodeOwners::new(&mut conn)
        .create(&CodeOwnersCreateDBRequest {
            project_id: project.id,
            code_mapping_id: code_mapping.id,
            raw: raw.to_string(),
            schema: json!({"$version": 1, "rules": []}),
        })
        .await
        .expect("Failed to create test CODEOWNERS")
}

pub async fn link_external_user(pool: &PgPool, organization: &OrganizationDBResponse, external_name: &str, user: &UserDBResponse) {
    let mut conn = pool.acquire().await.expect("Failed to acquire connection");
    ExternalActors::new(&mut conn)
        .create(&ExternalActorCreateDBRequest {
            organization_id: organization.id,
            provider: "github".to_string(),
            external_name: external_name.to_string(),
            user_id: Some(user.id),
            team_id: None,
        })
        .await
        .expect("Failed to link external user");
}

pub async fn link_external_team(pool: &PgPool, organization: &OrganizationDBResponse, external_name: &str, team: &TeamDBResponse) {
    let mut conn = pool.acquire().await.expect("Failed to acquire connection");
    ExternalActors::new(&mut conn)
        .create(&ExternalActorCreateDBRequest {
            organization_id: organization.id,
            provider: "github".to_string(),
            external_name: external_name.to_string(),
            user_id: None,
            team_id: Some(team.id),
        })
        .await
        .expect("Failed to link external team");
}

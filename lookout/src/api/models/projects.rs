use serde::Deserialize;

/// Path parameters for project scoped routes
#[derive(Debug, Clone, Deserialize)]
pub struct ProjectPathParams {
    pub organization_slug: String,
    pub project_slug: String,
}

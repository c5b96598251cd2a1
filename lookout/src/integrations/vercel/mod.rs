//! Vercel REST API.
//!
//! [`VercelClient`] wraps the handful of endpoints the deployment integration needs: reading
//! the installing user or team and their projects, registering the deployment webhook, and
//! managing secrets and environment variables on a Vercel project.

mod client;

pub use client::{ApiError, VercelClient};

pub const DEFAULT_BASE_URL: &str = "https://api.vercel.com";

/// Items requested per page
pub const PAGE_LIMIT: usize = 20;
/// Nobody should have more than `PAGE_LIMIT * MAX_PAGES` projects
pub const MAX_PAGES: usize = 10;

/// Where Vercel delivers deployment webhooks, relative to `url_prefix`
pub const WEBHOOK_PATH: &str = "/extensions/vercel/webhook/";

const TEAMS_URL: &str = "/v1/teams/{team_id}";
const USER_URL: &str = "/www/user";
const PROJECT_URL: &str = "/v1/projects/{project_id}";
const PROJECTS_URL: &str = "/v4/projects/";
const WEBHOOK_URL: &str = "/v1/integrations/webhooks";
const ENV_VAR_URL: &str = "/v6/projects/{project_id}/env";
const SECRETS_URL: &str = "/v2/now/secrets";
const UPDATE_ENV_VAR_URL: &str = "/v6/projects/{project_id}/env/{env_var_id}";

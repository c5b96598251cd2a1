//! OpenAPI documentation for the project API at `/api/0/*`.
//!
//! Served as JSON at `/api/0/openapi.json` with a Scalar viewer at `/api/0/docs`.

use utoipa::{
    Modify, OpenApi,
    openapi::security::{ApiKey, ApiKeyValue, SecurityScheme},
};

use crate::api;

/// Documents the trusted proxy header every endpoint authenticates with
struct ProxyHeaderAddon;

impl Modify for ProxyHeaderAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.security_schemes.insert(
                "X-Lookout-User".to_string(),
                SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::with_description(
                    "x-lookout-user",
                    "Email of the authenticated user, set by the authenticating proxy in front of Lookout.",
                ))),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    info(title = "Lookout API", description = "Project CODEOWNERS and sample events"),
    servers(
        (url = "/api/0", description = "Lookout API")
    ),
    modifiers(&ProxyHeaderAddon),
    paths(
        api::handlers::code_owners::update_code_owners,
        api::handlers::code_owners::delete_code_owners,
        api::handlers::samples::create_sample,
    ),
    components(
        schemas(
            api::models::code_owners::CodeOwnersUpdate,
            api::models::code_owners::CodeOwnersResponse,
            api::models::events::EventResponse,
            api::models::events::EventTag,
        )
    ),
    tags(
        (name = "codeowners", description = "CODEOWNERS files synced from source control"),
        (name = "events", description = "Events and sample data"),
    )
)]
pub struct ApiDoc;

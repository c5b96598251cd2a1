use axum::{extract::FromRequestParts, http::request::Parts};
use sqlx::PgPool;
use tracing::{debug, instrument, trace};

use crate::{
    AppState,
    api::models::users::CurrentUser,
    config::Config,
    db::{errors::DbError, handlers::Users},
    errors::{Error, Result},
};

/// Extract user from proxy header if present and valid
/// Returns:
/// - None: No proxy header present
/// - Some(Ok(user)): Header present and maps to a known user
/// - Some(Err(error)): Header present but unusable or the user is unknown
#[instrument(skip(parts, config, db))]
async fn try_proxy_header_auth(parts: &Parts, config: &Config, db: &PgPool) -> Option<Result<CurrentUser>> {
    let header = parts.headers.get(&config.auth.proxy_header.header_name)?;

    let email = match header.to_str() {
        Ok(value) if !value.trim().is_empty() => value.trim(),
        _ => {
            return Some(Err(Error::Unauthenticated {
                message: Some("Invalid authentication header".to_string()),
            }));
        }
    };

    let mut conn = match db.acquire().await {
        Ok(conn) => conn,
        Err(e) => return Some(Err(DbError::from(e).into())),
    };

    match Users::new(&mut conn).get_by_email(email).await {
        Ok(Some(user)) => Some(Ok(CurrentUser {
            id: user.id,
            username: user.username,
            email: user.email,
            name: user.name,
        })),
        Ok(None) => Some(Err(Error::Unauthenticated {
            message: Some("Unknown user".to_string()),
        })),
        Err(e) => Some(Err(Error::Database(e))),
    }
}

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = Error;

    #[instrument(skip(parts, state))]
    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self> {
        if !state.config.auth.proxy_header.enabled {
            trace!("Proxy header authentication disabled");
            return Err(Error::Unauthenticated { message: None });
        }

        match try_proxy_header_auth(parts, &state.config, &state.db).await {
            Some(Ok(user)) => {
                debug!("Found proxy header authenticated user: {}", user.id);
                Ok(user)
            }
            Some(Err(e)) => {
                trace!("Proxy header authentication failed: {:?}", e);
                Err(e)
            }
            None => {
                trace!("No authentication credentials found in request");
                Err(Error::Unauthenticated { message: None })
            }
        }
    }
}

use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts, OriginalUri},
    http::{header, request::Parts, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use tracing::warn;

use super::{jwt::JwtKeys, repo_types::User};
use crate::{error::AppError, state::AppState};

/// The authenticated, active user behind the bearer access token.
///
/// Browsers (anything sending `Accept: text/html`) that fail authentication
/// are redirected to the login URL with a `next` parameter; API clients get
/// a 401.
pub struct CurrentUser(pub User);

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let unauthenticated = |reason: &str| -> Response {
            if accepts_html(&parts.headers) {
                // nested routers strip their prefix from `parts.uri`
                let uri = parts
                    .extensions
                    .get::<OriginalUri>()
                    .map(|o| &o.0)
                    .unwrap_or(&parts.uri);
                let target = uri
                    .path_and_query()
                    .map(|pq| pq.as_str())
                    .unwrap_or("/");
                let location = login_redirect(&state.config.login_url, target);
                (StatusCode::FOUND, [(header::LOCATION, location)]).into_response()
            } else {
                AppError::Unauthorized(reason.to_string()).into_response()
            }
        };

        let Some(auth) = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
        else {
            return Err(unauthenticated("Missing Authorization header"));
        };

        let Some(token) = auth
            .strip_prefix("Bearer ")
            .or_else(|| auth.strip_prefix("bearer "))
        else {
            return Err(unauthenticated("Invalid Authorization header"));
        };

        let keys = JwtKeys::from_ref(state);
        let claims = match keys.verify_access(token) {
            Ok(c) => c,
            Err(e) => {
                warn!(error = %e, "invalid or expired token");
                return Err(unauthenticated("Invalid or expired token"));
            }
        };

        let user = match User::find_by_id(&state.db, claims.sub).await {
            Ok(Some(u)) if u.is_active => u,
            Ok(Some(u)) => {
                warn!(user_id = %u.id, "token for inactive user");
                return Err(unauthenticated("User is inactive"));
            }
            Ok(None) => {
                warn!(user_id = %claims.sub, "token for unknown user");
                return Err(unauthenticated("User not found"));
            }
            Err(e) => return Err(AppError::from(e).into_response()),
        };

        Ok(CurrentUser(user))
    }
}

fn accepts_html(headers: &HeaderMap) -> bool {
    headers
        .get(header::ACCEPT)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.contains("text/html"))
        .unwrap_or(false)
}

fn login_redirect(login_url: &str, next: &str) -> String {
    let sep = if login_url.contains('?') { '&' } else { '?' };
    format!("{login_url}{sep}next={}", urlencoding::encode(next))
}

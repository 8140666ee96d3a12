//! services/api/src/web/middleware.rs
//!
//! Session guard for protecting routes.

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use tracing::{debug, error};
use virality_core::{ports::PortError, service::AnalysisError};

use crate::{error::ApiError, web::state::AppState};

const SESSION_COOKIE: &str = "session";

/// Middleware that resolves the caller's session and extracts the user_id.
///
/// If valid, inserts the user_id into request extensions for handlers to use.
/// If missing, unknown or expired, returns 401 before the handler runs.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = session_token(req.headers()).ok_or_else(|| {
        debug!("Rejected {} {}: no session token", req.method(), req.uri().path());
        ApiError::Analysis(AnalysisError::Unauthorized)
    })?;

    let user_id = state
        .sessions
        .resolve_session(&token)
        .await
        .map_err(|e| match e {
            PortError::Unauthorized => ApiError::Analysis(AnalysisError::Unauthorized),
            other => {
                error!("Failed to resolve session: {:?}", other);
                ApiError::Port(other)
            }
        })?;

    req.extensions_mut().insert(user_id);
    Ok(next.run(req).await)
}

/// The session token from the `session` cookie, or failing that a bearer token.
pub fn session_token(headers: &HeaderMap) -> Option<String> {
    let from_cookie = headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .find_map(|c| {
            c.trim()
                .strip_prefix(SESSION_COOKIE)
                .and_then(|rest| rest.strip_prefix('='))
        })
        .filter(|t| !t.is_empty())
        .map(str::to_string);

    from_cookie.or_else(|| {
        headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(pairs: &[(header::HeaderName, &str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.append(name.clone(), HeaderValue::from_str(value).unwrap());
        }
        map
    }

    #[test]
    fn reads_session_cookie_among_others() {
        let map = headers(&[(header::COOKIE, "theme=dark; session=abc123; lang=en")]);
        assert_eq!(session_token(&map).as_deref(), Some("abc123"));
    }

    #[test]
    fn ignores_cookies_that_only_share_the_prefix() {
        let map = headers(&[(header::COOKIE, "session_hint=zzz")]);
        assert_eq!(session_token(&map), None);
    }

    #[test]
    fn falls_back_to_bearer_token() {
        let map = headers(&[(header::AUTHORIZATION, "Bearer tok-9")]);
        assert_eq!(session_token(&map).as_deref(), Some("tok-9"));
    }

    #[test]
    fn empty_values_are_not_tokens() {
        let map = headers(&[(header::COOKIE, "session="), (header::AUTHORIZATION, "Bearer ")]);
        assert_eq!(session_token(&map), None);
    }
}

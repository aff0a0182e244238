//! Bearer-token authentication middleware
//!
//! Accepts `Authorization: Bearer <token>` or the bare token. A verified
//! token's user id is attached to the request as [`AuthUser`].

use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};
use lv_common::auth::{verify_token, TokenError};
use tracing::debug;
use uuid::Uuid;

use crate::{now_ms, ApiError, AppState};

/// User id proven by the request's bearer token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthUser(pub Uuid);

impl AuthUser {
    /// Fail with 403 unless the token belongs to `user_id`
    pub fn require(self, user_id: Uuid) -> Result<(), ApiError> {
        if self.0 == user_id {
            Ok(())
        } else {
            Err(ApiError::Forbidden(
                "Token does not belong to this user".to_string(),
            ))
        }
    }
}

/// Authentication middleware
///
/// Returns 401 when the header is missing or the token does not verify.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .map(bearer_token)
        .filter(|token| !token.is_empty())
        .ok_or_else(|| ApiError::Unauthorized("Please login to continue.".to_string()))?;

    let user_id = verify_token(token, &state.token_secret, now_ms()).map_err(|e| {
        match e {
            TokenError::Expired { expires_at_ms } => debug!(expires_at_ms, "Rejected expired token"),
            other => debug!(error = %other, "Rejected token"),
        }
        ApiError::Unauthorized("Invalid token. Please login to continue.".to_string())
    })?;

    request.extensions_mut().insert(AuthUser(user_id));
    Ok(next.run(request).await)
}

fn bearer_token(header: &str) -> &str {
    let header = header.trim();
    match header.split_once(' ') {
        Some((scheme, token)) if scheme.eq_ignore_ascii_case("bearer") => token.trim(),
        _ => header,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bearer_token_forms() {
        assert_eq!(bearer_token("Bearer abc.1.ff"), "abc.1.ff");
        assert_eq!(bearer_token("bearer  abc.1.ff "), "abc.1.ff");
        assert_eq!(bearer_token("abc.1.ff"), "abc.1.ff");
        assert_eq!(bearer_token("Bearer"), "Bearer");
    }

    #[test]
    fn test_require_other_user_is_forbidden() {
        let me = Uuid::new_v4();
        assert!(AuthUser(me).require(me).is_ok());
        assert!(matches!(
            AuthUser(me).require(Uuid::new_v4()),
            Err(ApiError::Forbidden(_))
        ));
    }
}

use std::convert::Infallible;

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header, request::Parts, HeaderMap},
};

use crate::auth::sessions::SESSION_COOKIE;
use crate::authz::{AuthenticatedUser, DenyReason, Identity};
use crate::error::ApiError;
use crate::state::AppState;

/// Pulls the session token out of the Cookie header, if any.
pub(crate) fn session_token(headers: &HeaderMap) -> Option<String> {
    let raw = headers.get(header::COOKIE)?.to_str().ok()?;
    raw.split(';').find_map(|pair| {
        let (name, value) = pair.trim().split_once('=')?;
        (name == SESSION_COOKIE).then(|| value.to_string())
    })
}

/// Resolves the request's session cookie into an Identity. Never rejects:
/// a missing, unknown or expired token is simply Anonymous.
#[async_trait]
impl FromRequestParts<AppState> for Identity {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let identity = match session_token(&parts.headers) {
            Some(token) => state.sessions.resolve(&token),
            None => Identity::Anonymous,
        };
        Ok(identity)
    }
}

/// Like [`Identity`], but rejects anonymous callers up front. For endpoints
/// that have no meaningful anonymous behavior (create, me, user listing).
pub struct CurrentUser(pub AuthenticatedUser);

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let identity = Identity::from_request_parts(parts, state)
            .await
            .unwrap_or(Identity::Anonymous);
        match identity {
            Identity::Authenticated(user) => Ok(CurrentUser(user)),
            Identity::Anonymous => Err(ApiError::Deny(DenyReason::NotAuthenticated)),
        }
    }
}

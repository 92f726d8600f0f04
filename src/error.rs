use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::json;
use tracing::{error, warn};

use crate::authz::DenyReason;
use crate::projects::membership::MembershipError;

/// Request-terminal error taxonomy. Every variant maps to one status code;
/// nothing here is retried and nothing crashes the process.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Bad input shape: password mismatch, duplicate email, empty name.
    #[error("{0}")]
    Validation(String),

    /// Login failure. One message for unknown email and wrong credential.
    #[error("Invalid email or password!")]
    Authentication,

    /// Project or referenced user absent. Checked before authorization.
    #[error("{0} not found")]
    NotFound(&'static str),

    /// Refused by the authorization engine. The reason goes to logs only.
    #[error("forbidden")]
    Deny(DenyReason),

    /// Store unreachable or write rejected. Not retried.
    #[error("internal server error")]
    Internal(#[from] anyhow::Error),
}

impl From<DenyReason> for ApiError {
    fn from(reason: DenyReason) -> Self {
        ApiError::Deny(reason)
    }
}

impl From<MembershipError> for ApiError {
    fn from(err: MembershipError) -> Self {
        ApiError::Validation(err.to_string())
    }
}

impl ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Authentication => StatusCode::UNAUTHORIZED,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Deny(DenyReason::NotAuthenticated) => StatusCode::UNAUTHORIZED,
            ApiError::Deny(_) => StatusCode::FORBIDDEN,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn client_message(&self) -> String {
        match self {
            // Generic body; the specific DenyReason is logged, not leaked.
            ApiError::Deny(DenyReason::NotAuthenticated) => "Login required".into(),
            ApiError::Deny(_) => "You do not have access to this project".into(),
            ApiError::Internal(_) => "Internal server error".into(),
            other => other.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        match &self {
            ApiError::Deny(reason) => {
                warn!(reason = reason.as_str(), "request denied");
            }
            ApiError::Internal(e) => {
                error!(error = %e, "store failure");
            }
            _ => {}
        }
        let status = self.status_code();
        let body = Json(json!({
            "error": true,
            "message": self.client_message(),
        }));
        (status, body).into_response()
    }
}

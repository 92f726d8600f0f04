use axum::{
    extract::State,
    http::{header, HeaderMap, HeaderValue, StatusCode},
    routing::{get, post},
    Json, Router,
};
use lazy_static::lazy_static;
use regex::Regex;
use tracing::{info, instrument, warn};

use crate::{
    auth::{
        dto::{LoginRequest, PublicUser, RegisterRequest},
        extractors::{session_token, CurrentUser},
        repo::{User, UserRef},
        sessions::SESSION_COOKIE,
    },
    error::ApiError,
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/logout", post(logout))
}

pub fn me_routes() -> Router<AppState> {
    Router::new()
        .route("/me", get(get_me))
        .route("/users", get(list_users))
}

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

fn session_cookie(token: &str, max_age_secs: i64) -> HeaderValue {
    format!("{SESSION_COOKIE}={token}; Path=/; HttpOnly; SameSite=Lax; Max-Age={max_age_secs}")
        .parse()
        .unwrap()
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<PublicUser>), ApiError> {
    if payload.password != payload.confirm_password {
        warn!(email = %payload.email, "register password mismatch");
        return Err(ApiError::Validation("Passwords do not match!".into()));
    }

    if !is_valid_email(&payload.email) {
        warn!(email = %payload.email, "register invalid email");
        return Err(ApiError::Validation("Invalid email".into()));
    }

    // Exact-match duplicate check; emails are compared case-sensitively.
    if User::find_by_email(&state.db, &payload.email).await?.is_some() {
        warn!(email = %payload.email, "register email already taken");
        return Err(ApiError::Validation(
            "User with this email already exists!".into(),
        ));
    }

    let user = User::create(&state.db, &payload.email, &payload.name, &payload.password).await?;

    info!(user_id = %user.id, email = %user.email, "user registered");
    Ok((
        StatusCode::CREATED,
        Json(PublicUser {
            id: user.id,
            email: user.email,
            name: user.name,
        }),
    ))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<(HeaderMap, Json<PublicUser>), ApiError> {
    let user = match User::find_by_email(&state.db, &payload.email).await? {
        Some(u) => u,
        None => {
            warn!(email = %payload.email, "login unknown email");
            return Err(ApiError::Authentication);
        }
    };

    // Verbatim credential comparison, same failure as unknown email.
    // TODO: argon2 verification once credentials are hashed
    if user.password != payload.password {
        warn!(email = %payload.email, user_id = %user.id, "login invalid password");
        return Err(ApiError::Authentication);
    }

    let token = state.sessions.create(&user);

    let mut headers = HeaderMap::new();
    headers.insert(
        header::SET_COOKIE,
        session_cookie(&token, state.sessions.ttl().whole_seconds()),
    );

    info!(user_id = %user.id, email = %user.email, "user logged in");
    Ok((
        headers,
        Json(PublicUser {
            id: user.id,
            email: user.email,
            name: user.name,
        }),
    ))
}

/// Destroys the caller's session, if any. Never fails.
#[instrument(skip(state, headers))]
pub async fn logout(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> (StatusCode, HeaderMap) {
    if let Some(token) = session_token(&headers) {
        state.sessions.destroy(&token);
    }
    let mut response_headers = HeaderMap::new();
    response_headers.insert(header::SET_COOKIE, session_cookie("", 0));
    (StatusCode::NO_CONTENT, response_headers)
}

/// Echoes the authenticated identity straight from the session.
#[instrument(skip_all)]
pub async fn get_me(CurrentUser(user): CurrentUser) -> Json<PublicUser> {
    Json(PublicUser {
        id: user.user_id,
        email: user.email,
        name: user.name,
    })
}

#[instrument(skip(state))]
pub async fn list_users(
    State(state): State<AppState>,
    CurrentUser(_user): CurrentUser,
) -> Result<Json<Vec<UserRef>>, ApiError> {
    let users = User::list_refs(&state.db).await?;
    Ok(Json(users))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_plain_addresses() {
        assert!(is_valid_email("ana@example.com"));
        assert!(is_valid_email("a.b+c@sub.example.org"));
    }

    #[test]
    fn rejects_malformed_addresses() {
        assert!(!is_valid_email("not-an-email"));
        assert!(!is_valid_email("two@@example.com"));
        assert!(!is_valid_email("spaces in@example.com"));
    }

    #[test]
    fn session_cookie_is_http_only() {
        let value = session_cookie("abc", 86400);
        let s = value.to_str().unwrap();
        assert!(s.starts_with("sid=abc;"));
        assert!(s.contains("HttpOnly"));
        assert!(s.contains("Max-Age=86400"));
    }

    #[test]
    fn public_user_serialization() {
        let user = PublicUser {
            id: uuid::Uuid::new_v4(),
            email: "test@example.com".to_string(),
            name: "Test".to_string(),
        };
        let json = serde_json::to_string(&user).unwrap();
        assert!(json.contains("test@example.com"));
        assert!(json.contains("id"));
    }
}

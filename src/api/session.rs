//! Session endpoints.
//!
//! - GET `/csrftoken` - Mint a CSRF pair: secret in a cookie, token in the body
//! - POST `/register` - Create an account (CSRF)
//! - POST `/login` - Check the password and set the access cookie (CSRF, rate limited)
//! - POST `/logout` - Clear the access cookie (CSRF)
//! - GET `/user` - Current subject, with a refreshed access cookie

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tracing::{error, info, warn};

use super::error::{ApiError, ResultExt};
use crate::auth::{AuthService, CsrfOnly, JwtRefresh};
use crate::db::{Database, UserStore, is_unique_violation};
use crate::impl_has_auth_service;
use crate::rate_limit::{RateLimitConfig, rate_limit_login};

/// Minimum password length accepted at registration.
const MIN_PASSWORD_LENGTH: usize = 6;

#[derive(Clone)]
pub struct SessionState {
    pub db: Database,
    pub auth: Arc<AuthService>,
    pub rate_limit_config: Arc<RateLimitConfig>,
    /// bcrypt cost for new password hashes
    pub password_cost: u32,
}

impl_has_auth_service!(SessionState);

pub fn router(state: SessionState) -> Router {
    let login_router = Router::new()
        .route("/login", post(login))
        .with_state(state.clone())
        .layer(middleware::from_fn_with_state(
            state.rate_limit_config.clone(),
            rate_limit_login,
        ));

    Router::new()
        .route("/csrftoken", get(csrf_token))
        .route("/register", post(register))
        .route("/logout", post(logout))
        .route("/user", get(current_user))
        .with_state(state)
        .merge(login_router)
}

#[derive(Deserialize)]
struct Credentials {
    email: String,
    password: String,
}

#[derive(Serialize)]
struct CsrfTokenResponse {
    csrf_token: String,
}

#[derive(Serialize)]
struct UserResponse {
    id: i64,
    email: String,
}

async fn csrf_token(State(state): State<SessionState>) -> impl IntoResponse {
    let (pair, cookie) = state.auth.new_csrf_pair();
    (
        cookie,
        Json(CsrfTokenResponse {
            csrf_token: pair.token,
        }),
    )
}

async fn register(
    State(state): State<SessionState>,
    _csrf: CsrfOnly,
    Json(payload): Json<Credentials>,
) -> Result<impl IntoResponse, ApiError> {
    info!("start: register");

    let email = payload.email.trim();
    if email.is_empty() {
        return Err(ApiError::bad_request("Email cannot be empty"));
    }
    if payload.password.len() < MIN_PASSWORD_LENGTH {
        return Err(ApiError::bad_request("Password too short"));
    }

    let password_hash = UserStore::hash_password(&payload.password, state.password_cost)
        .await
        .map_err(|e| {
            error!(error = %e, "Failed to hash password");
            ApiError::internal("Failed to create user")
        })?;

    let id = match state.db.users().create(email, &password_hash).await {
        Ok(id) => id,
        Err(e) if is_unique_violation(&e) => {
            return Err(ApiError::bad_request("Email is already taken"));
        }
        Err(e) => return Err(ApiError::db_error("Failed to create user", e)),
    };

    Ok((
        StatusCode::CREATED,
        Json(UserResponse {
            id,
            email: email.to_string(),
        }),
    ))
}

async fn login(
    State(state): State<SessionState>,
    _csrf: CsrfOnly,
    Json(payload): Json<Credentials>,
) -> Result<impl IntoResponse, ApiError> {
    info!("start: login");

    let user = state
        .db
        .users()
        .get_by_email(payload.email.trim())
        .await
        .db_err("Failed to get user")?;

    let verified = match &user {
        Some(user) => UserStore::verify_password(&payload.password, &user.password_hash)
            .await
            .map_err(|e| {
                error!(error = %e, "Failed to verify password");
                ApiError::internal("Failed to verify password")
            })?,
        None => false,
    };

    let Some(user) = user.filter(|_| verified) else {
        warn!("Login failed");
        return Err(ApiError::unauthorized("Invalid email or password"));
    };

    let token = state.auth.issue(&user.email).map_err(|e| {
        error!(error = %e, "Failed to issue credential");
        ApiError::internal("Failed to issue token")
    })?;

    info!(subject = %user.email, "Logged in");
    Ok((
        state.auth.session_cookie(&token),
        Json(json!({ "message": "Successfully logged-in" })),
    ))
}

async fn logout(State(state): State<SessionState>, _csrf: CsrfOnly) -> impl IntoResponse {
    info!("start: logout");
    (
        state.auth.clear_session_cookie(),
        Json(json!({ "message": "Successfully logged-out" })),
    )
}

async fn current_user(session: JwtRefresh) -> impl IntoResponse {
    (session.cookie, Json(json!({ "email": session.subject })))
}

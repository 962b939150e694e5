mod error;
mod session;
mod todos;

use axum::Router;
use std::sync::Arc;

use crate::auth::AuthService;
use crate::db::Database;
use crate::rate_limit::RateLimitConfig;

pub use error::ApiError;

/// Create the API router.
pub fn create_api_router(
    db: Database,
    auth: Arc<AuthService>,
    rate_limit_config: Arc<RateLimitConfig>,
    password_cost: u32,
) -> Router {
    let session_state = session::SessionState {
        db: db.clone(),
        auth: auth.clone(),
        rate_limit_config,
        password_cost,
    };

    let todos_state = todos::TodosState { db, auth };

    Router::new()
        .merge(session::router(session_state))
        .merge(todos::router(todos_state))
}

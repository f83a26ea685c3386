use crate::handlers;
use crate::AppState;
use axum::{
    routing::{delete, get},
    Router,
};
use std::sync::Arc;

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        // Health check
        .route("/health", get(handlers::health::health_check))
        // Session administration
        .route("/admin/sessions", get(handlers::admin::list_sessions))
        .route("/admin/sessions/:id", delete(handlers::admin::delete_session))
        .route("/admin/password-resets", get(handlers::admin::list_password_resets))
        .with_state(state)
}

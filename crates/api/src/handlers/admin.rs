use crate::handlers::{error_response, ApiError, ErrorResponse};
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use safety_auth::SessionRow;
use safety_models::{PasswordReset, SessionFilter};
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

const MAX_PAGE_SIZE: i64 = 1000;

#[derive(Debug, Deserialize)]
pub struct ListSessionsQuery {
    pub user_id: Option<Uuid>,
    pub limit: Option<i64>,
    pub skip: Option<i64>,
}

impl ListSessionsQuery {
    fn filter(&self) -> SessionFilter {
        let defaults = SessionFilter::default();
        SessionFilter {
            user_id: self.user_id,
            expired_as_of: None,
            limit: self.limit.unwrap_or(defaults.limit).clamp(1, MAX_PAGE_SIZE),
            skip: self.skip.unwrap_or(0).max(0),
        }
    }
}

/// List session records
/// GET /admin/sessions?user_id=xxx&limit=100&skip=0
pub async fn list_sessions(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListSessionsQuery>,
) -> Result<Json<Vec<SessionRow>>, ApiError> {
    let rows = state
        .admin
        .list(&params.filter())
        .await
        .map_err(error_response)?;
    Ok(Json(rows))
}

/// Delete a session record, which also ends the session in the store
/// DELETE /admin/sessions/:id
pub async fn delete_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    let deleted = state.admin.delete(id).await.map_err(error_response)?;
    if !deleted {
        return Err((
            StatusCode::NOT_FOUND,
            Json(ErrorResponse::new("not_found", &format!("Session {} not found", id))),
        ));
    }

    tracing::info!(session_id = id, "Session deleted by administrator");
    Ok(StatusCode::NO_CONTENT)
}

/// Users who still have to reset their password
/// GET /admin/password-resets
pub async fn list_password_resets(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<PasswordReset>>, ApiError> {
    let pending = state
        .admin
        .password_resets_pending()
        .await
        .map_err(error_response)?;
    Ok(Json(pending))
}

#[cfg(test)]
mod tests {
    use crate::routes::create_router;
    use crate::AppState;
    use axum::{
        body::{to_bytes, Body},
        http::{Request, StatusCode},
    };
    use chrono::{Duration, Utc};
    use safety_auth::{RequestContext, Resolvers, Safety};
    use safety_cache::{MemorySessionStore, SessionStore};
    use safety_database::{MemoryPasswordResetStore, MemorySessionRecordStore};
    use safety_models::AuthUser;
    use std::sync::Arc;
    use tower::ServiceExt;
    use uuid::Uuid;

    fn state() -> (Arc<AppState>, MemorySessionStore) {
        let store = MemorySessionStore::new();
        let safety = Safety::new(
            Arc::new(MemorySessionRecordStore::new()),
            Arc::new(MemoryPasswordResetStore::new()),
            Arc::new(store.clone()),
            Resolvers::default(),
        );
        (Arc::new(AppState::new(safety)), store)
    }

    async fn login(state: &AppState, user: &AuthUser, key: &str) -> i64 {
        let request = RequestContext::default()
            .with_remote_addr("1.2.3.4".parse().unwrap())
            .with_session(key, Utc::now() + Duration::days(1));
        state.safety.signals.user_logged_in(&request, user).await.unwrap();
        state
            .safety
            .sessions
            .find_for_request(&request, user)
            .await
            .unwrap()
            .unwrap()
            .id
    }

    async fn send(state: Arc<AppState>, method: &str, uri: &str) -> (StatusCode, serde_json::Value) {
        let response = create_router(state)
            .oneshot(
                Request::builder()
                    .method(method)
                    .uri(uri)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = if bytes.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, body)
    }

    #[tokio::test]
    async fn test_health() {
        let (state, _) = state();
        let (status, body) = send(state, "GET", "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn test_list_sessions_by_user() {
        let (state, _) = state();
        let alice = AuthUser::new(Uuid::new_v4(), "hash-a");
        let bob = AuthUser::new(Uuid::new_v4(), "hash-b");
        login(&state, &alice, "sk-a1").await;
        login(&state, &alice, "sk-a2").await;
        login(&state, &bob, "sk-b1").await;

        let (status, body) = send(state.clone(), "GET", "/admin/sessions").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().unwrap().len(), 3);

        let uri = format!("/admin/sessions?user_id={}&limit=1", alice.id);
        let (status, body) = send(state, "GET", &uri).await;
        assert_eq!(status, StatusCode::OK);
        let rows = body.as_array().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["user_id"], alice.id.to_string());
        assert_eq!(rows[0]["ip"], "1.2.3.4");
        assert_eq!(rows[0]["is_valid"], true);
        assert!(rows[0].get("session_key").is_none());
    }

    #[tokio::test]
    async fn test_delete_session_purges_store() {
        let (state, store) = state();
        let user = AuthUser::new(Uuid::new_v4(), "hash");
        store.insert("sk-abc").await;
        let id = login(&state, &user, "sk-abc").await;

        let (status, _) = send(state.clone(), "DELETE", &format!("/admin/sessions/{}", id)).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        assert!(!store.exists("sk-abc").await.unwrap());

        let (status, body) = send(state, "DELETE", &format!("/admin/sessions/{}", id)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "not_found");
    }

    #[tokio::test]
    async fn test_list_password_resets() {
        let (state, _) = state();
        let flagged = AuthUser::new(Uuid::new_v4(), "hash-1");
        let other = AuthUser::new(Uuid::new_v4(), "hash-2");
        state.safety.password_resets.require_reset(&flagged).await.unwrap();
        state.safety.password_resets.check_password(&other).await.unwrap();

        let (status, body) = send(state, "GET", "/admin/password-resets").await;
        assert_eq!(status, StatusCode::OK);
        let records = body.as_array().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0]["user_id"], flagged.id.to_string());
        assert_eq!(records[0]["reset_required"], true);
        assert!(records[0].get("last_password").is_none());
    }
}

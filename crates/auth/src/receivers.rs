//! Built-in observers wired up by [`crate::Safety`].

use crate::error::Result;
use crate::password_reset::PasswordResetManager;
use crate::request::RequestContext;
use crate::session::SessionManager;
use crate::signals::{LoginObserver, LogoutObserver, SessionDeletedObserver};
use safety_cache::SessionStore;
use safety_models::{AuthUser, Session};
use std::sync::Arc;

/// Records the login's session.
pub struct CreateSessionOnLogin {
    sessions: SessionManager,
}

impl CreateSessionOnLogin {
    pub fn new(sessions: SessionManager) -> Self {
        Self { sessions }
    }
}

#[async_trait::async_trait]
impl LoginObserver for CreateSessionOnLogin {
    async fn user_logged_in(&self, request: &RequestContext, user: &AuthUser) -> Result<()> {
        self.sessions.create_session(request, user).await?;
        Ok(())
    }
}

/// Notices password changes made since the previous login.
pub struct CheckPasswordOnLogin {
    password_resets: PasswordResetManager,
}

impl CheckPasswordOnLogin {
    pub fn new(password_resets: PasswordResetManager) -> Self {
        Self { password_resets }
    }
}

#[async_trait::async_trait]
impl LoginObserver for CheckPasswordOnLogin {
    async fn user_logged_in(&self, _request: &RequestContext, user: &AuthUser) -> Result<()> {
        self.password_resets.check_password(user).await?;
        Ok(())
    }
}

/// Removes the record of the session being logged out.
pub struct DeleteSessionOnLogout {
    sessions: SessionManager,
}

impl DeleteSessionOnLogout {
    pub fn new(sessions: SessionManager) -> Self {
        Self { sessions }
    }
}

#[async_trait::async_trait]
impl LogoutObserver for DeleteSessionOnLogout {
    async fn user_logged_out(&self, request: &RequestContext, user: Option<&AuthUser>) -> Result<()> {
        let Some(user) = user else {
            return Ok(());
        };

        match self.sessions.find_for_request(request, user).await? {
            Some(session) => {
                self.sessions.delete(session.id).await?;
            }
            None => {
                tracing::debug!(user_id = %user.id, "No session record to delete on logout");
            }
        }
        Ok(())
    }
}

/// Drops the external session store entry of a deleted record.
pub struct PurgeSessionStore {
    store: Arc<dyn SessionStore>,
}

impl PurgeSessionStore {
    pub fn new(store: Arc<dyn SessionStore>) -> Self {
        Self { store }
    }
}

#[async_trait::async_trait]
impl SessionDeletedObserver for PurgeSessionStore {
    async fn session_deleted(&self, session: &Session) -> Result<()> {
        if self.store.exists(&session.session_key).await? {
            self.store.delete(&session.session_key).await?;
            tracing::debug!(session_id = session.id, "Purged session store entry");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolvers::Resolvers;
    use chrono::{Duration, Utc};
    use safety_cache::MemorySessionStore;
    use safety_database::MemorySessionRecordStore;
    use uuid::Uuid;

    fn session(key: &str) -> Session {
        Session {
            id: 7,
            user_id: None,
            session_key: key.to_string(),
            ip: String::new(),
            user_agent: String::new(),
            location: "Unknown".to_string(),
            device: "Unknown".to_string(),
            expiration_date: Utc::now(),
            last_activity: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_purge_removes_existing_entry() {
        let store = MemorySessionStore::new();
        store.insert("sk-abc").await;
        store.insert("sk-other").await;

        let purge = PurgeSessionStore::new(Arc::new(store.clone()));
        purge.session_deleted(&session("sk-abc")).await.unwrap();

        assert!(!store.exists("sk-abc").await.unwrap());
        assert!(store.exists("sk-other").await.unwrap());
    }

    #[tokio::test]
    async fn test_purge_without_entry() {
        let store = MemorySessionStore::new();
        let purge = PurgeSessionStore::new(Arc::new(store.clone()));

        purge.session_deleted(&session("sk-abc")).await.unwrap();
        assert!(!store.exists("sk-abc").await.unwrap());
    }

    #[tokio::test]
    async fn test_logout_cases() {
        let records = MemorySessionRecordStore::new();
        let sessions = SessionManager::new(Arc::new(records.clone()), Resolvers::default());
        let receiver = DeleteSessionOnLogout::new(sessions.clone());
        let user = AuthUser::new(Uuid::new_v4(), "hash");
        let request = RequestContext::default().with_session("sk-abc", Utc::now() + Duration::days(1));

        // Anonymous logout and logout without a record are both fine
        receiver.user_logged_out(&request, None).await.unwrap();
        receiver.user_logged_out(&request, Some(&user)).await.unwrap();
        receiver
            .user_logged_out(&RequestContext::default(), Some(&user))
            .await
            .unwrap();

        sessions.create_session(&request, &user).await.unwrap();
        receiver.user_logged_out(&request, Some(&user)).await.unwrap();
        assert!(records.is_empty().await);
    }
}

//! Read-only views for administrators, plus session deletion.

use crate::error::Result;
use crate::password_reset::PasswordResetManager;
use crate::session::SessionManager;
use chrono::{DateTime, Utc};
use safety_models::{PasswordReset, Session, SessionFilter};
use serde::Serialize;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionRow {
    pub id: i64,
    pub user_id: Option<Uuid>,
    pub ip: String,
    pub last_activity: DateTime<Utc>,
    pub location: String,
    pub device: String,
    pub is_valid: bool,
}

impl SessionRow {
    pub fn from_session(session: &Session, now: DateTime<Utc>) -> Self {
        Self {
            id: session.id,
            user_id: session.user_id,
            ip: session.ip.clone(),
            last_activity: session.last_activity,
            location: session.location.clone(),
            device: session.device.clone(),
            is_valid: session.is_valid_at(now),
        }
    }
}

#[derive(Clone)]
pub struct SessionAdmin {
    sessions: SessionManager,
    password_resets: PasswordResetManager,
}

impl SessionAdmin {
    pub fn new(sessions: SessionManager, password_resets: PasswordResetManager) -> Self {
        Self {
            sessions,
            password_resets,
        }
    }

    pub async fn list(&self, filter: &SessionFilter) -> Result<Vec<SessionRow>> {
        self.list_at(filter, Utc::now()).await
    }

    pub async fn list_at(&self, filter: &SessionFilter, now: DateTime<Utc>) -> Result<Vec<SessionRow>> {
        let sessions = self.sessions.list(filter).await?;
        Ok(sessions
            .iter()
            .map(|session| SessionRow::from_session(session, now))
            .collect())
    }

    /// Returns whether a record was deleted.
    pub async fn delete(&self, id: i64) -> Result<bool> {
        Ok(self.sessions.delete(id).await?.is_some())
    }

    pub async fn password_resets_pending(&self) -> Result<Vec<PasswordReset>> {
        self.password_resets.users_requiring_reset().await
    }
}

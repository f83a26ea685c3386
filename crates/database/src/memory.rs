//! In-memory stores.
//!
//! Used by tests and by hosts that embed the managers without Postgres. The
//! uniqueness checks run under the same write lock as the insert, so they
//! give the same first-writer-wins behaviour as the database constraints.

use crate::error::{DatabaseError, Result};
use crate::store::{PasswordResetStore, SessionRecordStore};
use chrono::{DateTime, Utc};
use safety_models::{NewSession, PasswordReset, Session, SessionFilter};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Clone, Default)]
pub struct MemoryPasswordResetStore {
    records: Arc<RwLock<HashMap<Uuid, PasswordReset>>>,
}

impl MemoryPasswordResetStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

#[async_trait::async_trait]
impl PasswordResetStore for MemoryPasswordResetStore {
    async fn get(&self, user_id: Uuid) -> Result<Option<PasswordReset>> {
        Ok(self.records.read().await.get(&user_id).cloned())
    }

    async fn insert(&self, record: &PasswordReset) -> Result<PasswordReset> {
        let mut records = self.records.write().await;
        if records.contains_key(&record.user_id) {
            return Err(DatabaseError::duplicate("PasswordReset", "user_id"));
        }
        records.insert(record.user_id, record.clone());
        Ok(record.clone())
    }

    async fn update(&self, record: &PasswordReset) -> Result<PasswordReset> {
        let mut records = self.records.write().await;
        let existing = records
            .get_mut(&record.user_id)
            .ok_or_else(|| DatabaseError::not_found("PasswordReset", &record.user_id.to_string()))?;
        *existing = record.clone();
        Ok(record.clone())
    }

    async fn set_reset_required(&self, user_id: Uuid) -> Result<Option<PasswordReset>> {
        let mut records = self.records.write().await;
        Ok(records.get_mut(&user_id).map(|r| {
            r.reset_required = true;
            r.clone()
        }))
    }

    async fn list_reset_required(&self) -> Result<Vec<PasswordReset>> {
        let mut pending: Vec<PasswordReset> = self
            .records
            .read()
            .await
            .values()
            .filter(|r| r.reset_required)
            .cloned()
            .collect();
        // None sorts before Some, matching NULLS FIRST
        pending.sort_by_key(|r| r.last_reset);
        Ok(pending)
    }
}

#[derive(Default)]
struct SessionTable {
    next_id: i64,
    rows: HashMap<i64, Session>,
}

#[derive(Clone, Default)]
pub struct MemorySessionRecordStore {
    table: Arc<RwLock<SessionTable>>,
}

impl MemorySessionRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.table.read().await.rows.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.table.read().await.rows.is_empty()
    }
}

#[async_trait::async_trait]
impl SessionRecordStore for MemorySessionRecordStore {
    async fn insert(&self, new_session: &NewSession) -> Result<Session> {
        let mut table = self.table.write().await;
        if table
            .rows
            .values()
            .any(|s| s.session_key == new_session.session_key)
        {
            return Err(DatabaseError::duplicate("Session", "session_key"));
        }

        table.next_id += 1;
        let session = Session {
            id: table.next_id,
            user_id: new_session.user_id,
            session_key: new_session.session_key.clone(),
            ip: new_session.ip.clone(),
            user_agent: new_session.user_agent.clone(),
            location: new_session.location.clone(),
            device: new_session.device.clone(),
            expiration_date: new_session.expiration_date,
            last_activity: Utc::now(),
        };
        table.rows.insert(session.id, session.clone());
        Ok(session)
    }

    async fn get(&self, id: i64) -> Result<Option<Session>> {
        Ok(self.table.read().await.rows.get(&id).cloned())
    }

    async fn find_by_key(&self, user_id: Option<Uuid>, session_key: &str) -> Result<Option<Session>> {
        Ok(self
            .table
            .read()
            .await
            .rows
            .values()
            .find(|s| s.session_key == session_key && s.user_id == user_id)
            .cloned())
    }

    async fn list(&self, filter: &SessionFilter) -> Result<Vec<Session>> {
        let mut sessions: Vec<Session> = self
            .table
            .read()
            .await
            .rows
            .values()
            .filter(|s| filter.matches(s))
            .cloned()
            .collect();

        sessions.sort_by(|a, b| {
            b.last_activity
                .cmp(&a.last_activity)
                .then_with(|| b.id.cmp(&a.id))
        });

        Ok(sessions
            .into_iter()
            .skip(filter.skip.max(0) as usize)
            .take(filter.limit.max(0) as usize)
            .collect())
    }

    async fn touch(&self, id: i64, now: DateTime<Utc>) -> Result<Option<Session>> {
        let mut table = self.table.write().await;
        Ok(table.rows.get_mut(&id).map(|s| {
            s.last_activity = now;
            s.clone()
        }))
    }

    async fn delete(&self, id: i64) -> Result<Option<Session>> {
        Ok(self.table.write().await.rows.remove(&id))
    }
}

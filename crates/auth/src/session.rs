use crate::error::{Result, SafetyError};
use crate::request::RequestContext;
use crate::resolvers::Resolvers;
use crate::signals::SessionDeletedObserver;
use chrono::{DateTime, Utc};
use safety_database::SessionRecordStore;
use safety_models::{
    truncate_chars, truncate_user_agent, AuthUser, NewSession, Session, SessionFilter,
    DEVICE_MAX_LENGTH, LOCATION_MAX_LENGTH,
};
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

const SWEEP_BATCH: i64 = 100;

/// Records and removes login sessions.
///
/// Every deletion goes through [`SessionManager::delete`], which notifies the
/// registered [`SessionDeletedObserver`]s.
#[derive(Clone)]
pub struct SessionManager {
    store: Arc<dyn SessionRecordStore>,
    resolvers: Resolvers,
    deletion_observers: Vec<Arc<dyn SessionDeletedObserver>>,
}

impl SessionManager {
    pub fn new(store: Arc<dyn SessionRecordStore>, resolvers: Resolvers) -> Self {
        Self {
            store,
            resolvers,
            deletion_observers: Vec::new(),
        }
    }

    pub fn with_deletion_observer(mut self, observer: Arc<dyn SessionDeletedObserver>) -> Self {
        self.deletion_observers.push(observer);
        self
    }

    /// Record the request's current session for `user`.
    ///
    /// If the session key is already recorded for this user the existing
    /// record is returned unchanged.
    pub async fn create_session(&self, request: &RequestContext, user: &AuthUser) -> Result<Session> {
        let current = request.session.as_ref().ok_or(SafetyError::MissingSession)?;

        let new_session = NewSession {
            user_id: Some(user.id),
            session_key: current.key.clone(),
            ip: self.resolvers.ip.resolve(request),
            user_agent: truncate_user_agent(request.user_agent().unwrap_or_default()),
            location: truncate_chars(&self.resolvers.location.resolve(request), LOCATION_MAX_LENGTH),
            device: truncate_chars(&self.resolvers.device.resolve(request), DEVICE_MAX_LENGTH),
            expiration_date: current.expiry_date,
        };
        new_session.validate()?;

        match self.store.insert(&new_session).await {
            Ok(session) => {
                tracing::debug!(
                    session_id = session.id,
                    user_id = %user.id,
                    ip = %session.ip,
                    "Recorded session"
                );
                Ok(session)
            }
            Err(err) if err.is_duplicate() => {
                match self.store.find_by_key(Some(user.id), &current.key).await? {
                    Some(session) => {
                        tracing::debug!(
                            session_id = session.id,
                            user_id = %user.id,
                            "Session already recorded"
                        );
                        Ok(session)
                    }
                    None => {
                        tracing::warn!(
                            user_id = %user.id,
                            "Session key is recorded for a different user"
                        );
                        Err(SafetyError::SessionKeyConflict(current.key.clone()))
                    }
                }
            }
            Err(err) => Err(err.into()),
        }
    }

    /// The record of the request's current session, if `user` has one.
    pub async fn find_for_request(
        &self,
        request: &RequestContext,
        user: &AuthUser,
    ) -> Result<Option<Session>> {
        let Some(key) = request.session_key() else {
            return Ok(None);
        };
        Ok(self.store.find_by_key(Some(user.id), key).await?)
    }

    /// Bump `last_activity` on the request's session record.
    pub async fn touch(&self, request: &RequestContext, user: &AuthUser) -> Result<Option<Session>> {
        let Some(session) = self.find_for_request(request, user).await? else {
            return Ok(None);
        };
        Ok(self.store.touch(session.id, Utc::now()).await?)
    }

    pub async fn get(&self, id: i64) -> Result<Option<Session>> {
        Ok(self.store.get(id).await?)
    }

    pub async fn list(&self, filter: &SessionFilter) -> Result<Vec<Session>> {
        Ok(self.store.list(filter).await?)
    }

    /// Notify the deletion observers, then delete the record.
    ///
    /// An observer error leaves the record in place, so the deletion can be
    /// retried. Returns `None` without notifying anyone when there was no
    /// such record.
    pub async fn delete(&self, id: i64) -> Result<Option<Session>> {
        let Some(session) = self.store.get(id).await? else {
            return Ok(None);
        };

        for observer in &self.deletion_observers {
            observer.session_deleted(&session).await?;
        }

        let deleted = self.store.delete(id).await?;
        if deleted.is_some() {
            tracing::info!(
                session_id = session.id,
                user_id = ?session.user_id,
                "Deleted session"
            );
        }
        Ok(deleted)
    }

    /// Delete every session of a user, returning how many were removed.
    pub async fn delete_for_user(&self, user_id: Uuid) -> Result<usize> {
        self.sweep(SessionFilter::for_user(user_id)).await
    }

    /// Delete every session that expired at or before `now`.
    pub async fn clear_expired(&self, now: DateTime<Utc>) -> Result<usize> {
        let deleted = self
            .sweep(SessionFilter {
                expired_as_of: Some(now),
                ..Default::default()
            })
            .await?;
        if deleted > 0 {
            tracing::info!(deleted, "Cleared expired sessions");
        }
        Ok(deleted)
    }

    // Deleted rows drop out of the filter, so the first page is always re-read.
    async fn sweep(&self, filter: SessionFilter) -> Result<usize> {
        let filter = SessionFilter {
            limit: SWEEP_BATCH,
            skip: 0,
            ..filter
        };

        let mut deleted = 0;
        loop {
            let batch = self.store.list(&filter).await?;
            if batch.is_empty() {
                return Ok(deleted);
            }
            for session in batch {
                if self.delete(session.id).await?.is_some() {
                    deleted += 1;
                }
            }
        }
    }
}

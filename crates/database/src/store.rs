//! Storage traits for the two record types.
//!
//! The Postgres repositories in [`crate::repositories`] and the in-memory
//! stores in [`crate::memory`] both implement these, so the managers in
//! `safety-auth` never depend on a concrete backend.

use crate::error::Result;
use chrono::{DateTime, Utc};
use safety_models::{NewSession, PasswordReset, Session, SessionFilter};
use uuid::Uuid;

#[async_trait::async_trait]
pub trait PasswordResetStore: Send + Sync {
    /// Get the record for a user
    async fn get(&self, user_id: Uuid) -> Result<Option<PasswordReset>>;

    /// Insert a new record.
    ///
    /// Fails with [`DatabaseError::DuplicateEntry`](crate::DatabaseError::DuplicateEntry)
    /// when the user already has one.
    async fn insert(&self, record: &PasswordReset) -> Result<PasswordReset>;

    /// Overwrite the mutable fields of an existing record
    async fn update(&self, record: &PasswordReset) -> Result<PasswordReset>;

    /// Raise the reset flag without touching the password snapshot.
    ///
    /// Returns `None` when the user has no record.
    async fn set_reset_required(&self, user_id: Uuid) -> Result<Option<PasswordReset>>;

    /// Records with a pending reset, oldest reset first
    async fn list_reset_required(&self) -> Result<Vec<PasswordReset>>;
}

#[async_trait::async_trait]
pub trait SessionRecordStore: Send + Sync {
    /// Insert a new session atomically.
    ///
    /// Fails with [`DatabaseError::DuplicateEntry`](crate::DatabaseError::DuplicateEntry)
    /// when the session key is already recorded. Nothing is written in that case.
    async fn insert(&self, new_session: &NewSession) -> Result<Session>;

    /// Get a session by ID
    async fn get(&self, id: i64) -> Result<Option<Session>>;

    /// Find the session with this key belonging to `user_id` (`None` matches
    /// sessions without a user).
    async fn find_by_key(&self, user_id: Option<Uuid>, session_key: &str) -> Result<Option<Session>>;

    /// List sessions, most recent activity first
    async fn list(&self, filter: &SessionFilter) -> Result<Vec<Session>>;

    /// Set `last_activity` to `now`
    async fn touch(&self, id: i64, now: DateTime<Utc>) -> Result<Option<Session>>;

    /// Delete a session, returning the removed row if there was one
    async fn delete(&self, id: i64) -> Result<Option<Session>>;
}

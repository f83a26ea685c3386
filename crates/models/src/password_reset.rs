use crate::user::AuthUser;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use uuid::Uuid;

/// Per-user forced password reset state.
///
/// One row per user, keyed by the user id. `last_password` holds the
/// password hash observed at the last check so a change can be detected on
/// the next login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct PasswordReset {
    pub user_id: Uuid,
    pub reset_required: bool,

    #[serde(skip_serializing)]
    pub last_password: String,

    pub last_reset: Option<DateTime<Utc>>,
}

impl PasswordReset {
    /// Initial record for a user that has never been checked.
    pub fn for_user(user: &AuthUser) -> Self {
        Self {
            user_id: user.id,
            reset_required: false,
            last_password: user.password_hash.clone(),
            last_reset: None,
        }
    }

    /// Whether the user's password hash differs from the stored snapshot.
    pub fn password_changed(&self, user: &AuthUser) -> bool {
        self.last_password != user.password_hash
    }

    /// Record that the user has set a new password.
    pub fn record_reset(&mut self, user: &AuthUser, now: DateTime<Utc>) {
        self.last_password = user.password_hash.clone();
        self.last_reset = Some(now);
        self.reset_required = false;
    }
}

impl fmt::Display for PasswordReset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.last_reset {
            Some(at) => write!(f, "{} - {}", self.user_id, at),
            None => write!(f, "{} - never", self.user_id),
        }
    }
}

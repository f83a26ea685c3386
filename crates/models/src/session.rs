use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use uuid::Uuid;
use validator::Validate;

// Column widths; keep in sync with the validate attributes on NewSession.
pub const SESSION_KEY_MAX_LENGTH: usize = 40;
pub const IP_MAX_LENGTH: usize = 45;
pub const USER_AGENT_MAX_LENGTH: usize = 200;
pub const LOCATION_MAX_LENGTH: usize = 255;
pub const DEVICE_MAX_LENGTH: usize = 200;

/// A tracked login session.
///
/// `session_key` mirrors the key of the entry in the external session store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Session {
    pub id: i64,
    pub user_id: Option<Uuid>,
    pub session_key: String,
    pub ip: String,
    pub user_agent: String,
    pub location: String,
    pub device: String,
    pub expiration_date: DateTime<Utc>,
    pub last_activity: DateTime<Utc>,
}

impl Session {
    /// A session is valid until its expiration date has passed.
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        self.expiration_date > now
    }

    pub fn is_valid(&self) -> bool {
        self.is_valid_at(Utc::now())
    }
}

impl fmt::Display for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.user_id {
            Some(user_id) => write!(f, "{} ({})", user_id, self.device),
            None => write!(f, "anonymous ({})", self.device),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct NewSession {
    pub user_id: Option<Uuid>,

    #[validate(length(min = 1, max = 40))]
    pub session_key: String,

    #[validate(length(max = 45))]
    pub ip: String,

    pub user_agent: String,

    #[validate(length(max = 255))]
    pub location: String,

    #[validate(length(max = 200))]
    pub device: String,

    pub expiration_date: DateTime<Utc>,
}

/// Cut `value` down to `max` characters.
pub fn truncate_chars(value: &str, max: usize) -> String {
    value.chars().take(max).collect()
}

/// Cut a user agent header down to the stored length, on a char boundary.
pub fn truncate_user_agent(user_agent: &str) -> String {
    truncate_chars(user_agent, USER_AGENT_MAX_LENGTH)
}

/// Filter for listing sessions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionFilter {
    pub user_id: Option<Uuid>,

    /// Only sessions whose expiration date is at or before this instant.
    pub expired_as_of: Option<DateTime<Utc>>,

    #[serde(default = "default_limit")]
    pub limit: i64,

    #[serde(default)]
    pub skip: i64,
}

fn default_limit() -> i64 {
    100
}

impl Default for SessionFilter {
    fn default() -> Self {
        Self {
            user_id: None,
            expired_as_of: None,
            limit: default_limit(),
            skip: 0,
        }
    }
}

impl SessionFilter {
    pub fn for_user(user_id: Uuid) -> Self {
        Self {
            user_id: Some(user_id),
            ..Default::default()
        }
    }

    pub fn matches(&self, session: &Session) -> bool {
        if let Some(user_id) = self.user_id {
            if session.user_id != Some(user_id) {
                return false;
            }
        }
        if let Some(cutoff) = self.expired_as_of {
            if session.expiration_date > cutoff {
                return false;
            }
        }
        true
    }
}

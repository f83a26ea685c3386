use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The host application's user as seen by this crate.
///
/// Only the identifier and the current password hash are needed; the hash is
/// treated as an opaque string and only ever compared for equality.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: Uuid,

    #[serde(skip_serializing)]
    pub password_hash: String,
}

impl AuthUser {
    pub fn new(id: Uuid, password_hash: impl Into<String>) -> Self {
        Self {
            id,
            password_hash: password_hash.into(),
        }
    }
}

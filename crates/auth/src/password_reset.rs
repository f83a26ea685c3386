use crate::error::Result;
use chrono::Utc;
use safety_database::{DatabaseError, PasswordResetStore};
use safety_models::{AuthUser, PasswordReset};
use std::sync::Arc;

/// Tracks whether users must reset their password.
#[derive(Clone)]
pub struct PasswordResetManager {
    store: Arc<dyn PasswordResetStore>,
}

impl PasswordResetManager {
    pub fn new(store: Arc<dyn PasswordResetStore>) -> Self {
        Self { store }
    }

    /// Fetch the user's record, creating it from the current password hash
    /// if there is none yet.
    ///
    /// Two concurrent first calls for the same user both end up with the row
    /// written by whichever insert won.
    pub async fn get_or_create_for_user(&self, user: &AuthUser) -> Result<PasswordReset> {
        if let Some(record) = self.store.get(user.id).await? {
            return Ok(record);
        }

        match self.store.insert(&PasswordReset::for_user(user)).await {
            Ok(record) => {
                tracing::debug!(user_id = %user.id, "Created password reset record");
                Ok(record)
            }
            Err(err) if err.is_duplicate() => {
                tracing::debug!(
                    user_id = %user.id,
                    "Password reset record created concurrently, using existing row"
                );
                let record = self
                    .store
                    .get(user.id)
                    .await?
                    .ok_or_else(|| DatabaseError::not_found("PasswordReset", &user.id.to_string()))?;
                Ok(record)
            }
            Err(err) => Err(err.into()),
        }
    }

    pub async fn is_reset_required(&self, user: &AuthUser) -> Result<bool> {
        let record = self.get_or_create_for_user(user).await?;
        Ok(record.reset_required)
    }

    /// Compare the user's current password hash with the stored snapshot.
    ///
    /// A changed hash means the user has set a new password: the reset flag
    /// is cleared, the snapshot replaced and `last_reset` stamped. An
    /// unchanged hash writes nothing.
    pub async fn check_password(&self, user: &AuthUser) -> Result<PasswordReset> {
        let mut record = self.get_or_create_for_user(user).await?;
        if !record.password_changed(user) {
            return Ok(record);
        }

        record.record_reset(user, Utc::now());
        let record = self.store.update(&record).await?;

        tracing::info!(
            user_id = %user.id,
            "Password changed since last check, reset requirement cleared"
        );
        Ok(record)
    }

    /// Flag the user so they have to choose a new password.
    pub async fn require_reset(&self, user: &AuthUser) -> Result<PasswordReset> {
        let record = self.get_or_create_for_user(user).await?;
        if record.reset_required {
            return Ok(record);
        }

        // Only the flag is written; a password change racing with this keeps its snapshot.
        let record = self
            .store
            .set_reset_required(user.id)
            .await?
            .ok_or_else(|| DatabaseError::not_found("PasswordReset", &user.id.to_string()))?;

        tracing::info!(user_id = %user.id, "Password reset required");
        Ok(record)
    }

    pub async fn users_requiring_reset(&self) -> Result<Vec<PasswordReset>> {
        Ok(self.store.list_reset_required().await?)
    }
}

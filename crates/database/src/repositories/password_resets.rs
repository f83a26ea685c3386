use crate::error::{DatabaseError, Result};
use crate::store::PasswordResetStore;
use safety_models::PasswordReset;
use sqlx::PgPool;
use uuid::Uuid;

pub struct PasswordResetRepository {
    pool: PgPool,
}

impl PasswordResetRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl PasswordResetStore for PasswordResetRepository {
    async fn get(&self, user_id: Uuid) -> Result<Option<PasswordReset>> {
        let record = sqlx::query_as::<_, PasswordReset>(
            "SELECT * FROM safety_password_resets WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    async fn insert(&self, record: &PasswordReset) -> Result<PasswordReset> {
        let mut tx = self.pool.begin().await?;

        let inserted = sqlx::query_as::<_, PasswordReset>(
            r#"
            INSERT INTO safety_password_resets (user_id, reset_required, last_password, last_reset)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(record.user_id)
        .bind(record.reset_required)
        .bind(&record.last_password)
        .bind(record.last_reset)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(inserted)
    }

    async fn update(&self, record: &PasswordReset) -> Result<PasswordReset> {
        let updated = sqlx::query_as::<_, PasswordReset>(
            r#"
            UPDATE safety_password_resets
            SET reset_required = $2,
                last_password = $3,
                last_reset = $4
            WHERE user_id = $1
            RETURNING *
            "#,
        )
        .bind(record.user_id)
        .bind(record.reset_required)
        .bind(&record.last_password)
        .bind(record.last_reset)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DatabaseError::not_found("PasswordReset", &record.user_id.to_string()))?;

        Ok(updated)
    }

    async fn set_reset_required(&self, user_id: Uuid) -> Result<Option<PasswordReset>> {
        let record = sqlx::query_as::<_, PasswordReset>(
            r#"
            UPDATE safety_password_resets
            SET reset_required = TRUE
            WHERE user_id = $1
            RETURNING *
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    async fn list_reset_required(&self) -> Result<Vec<PasswordReset>> {
        let records = sqlx::query_as::<_, PasswordReset>(
            r#"
            SELECT * FROM safety_password_resets
            WHERE reset_required = TRUE
            ORDER BY last_reset ASC NULLS FIRST
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }
}

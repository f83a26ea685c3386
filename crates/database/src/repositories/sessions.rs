use crate::error::Result;
use crate::store::SessionRecordStore;
use chrono::{DateTime, Utc};
use safety_models::{NewSession, Session, SessionFilter};
use sqlx::PgPool;
use uuid::Uuid;

pub struct SessionRepository {
    pool: PgPool,
}

impl SessionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl SessionRecordStore for SessionRepository {
    async fn insert(&self, new_session: &NewSession) -> Result<Session> {
        let mut tx = self.pool.begin().await?;

        // A unique violation aborts here and the transaction rolls back on drop
        let session = sqlx::query_as::<_, Session>(
            r#"
            INSERT INTO safety_sessions (
                user_id, session_key, ip, user_agent,
                location, device, expiration_date
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(new_session.user_id)
        .bind(&new_session.session_key)
        .bind(&new_session.ip)
        .bind(&new_session.user_agent)
        .bind(&new_session.location)
        .bind(&new_session.device)
        .bind(new_session.expiration_date)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(session)
    }

    async fn get(&self, id: i64) -> Result<Option<Session>> {
        let session = sqlx::query_as::<_, Session>("SELECT * FROM safety_sessions WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(session)
    }

    async fn find_by_key(&self, user_id: Option<Uuid>, session_key: &str) -> Result<Option<Session>> {
        let session = sqlx::query_as::<_, Session>(
            r#"
            SELECT * FROM safety_sessions
            WHERE session_key = $1 AND user_id IS NOT DISTINCT FROM $2
            "#,
        )
        .bind(session_key)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(session)
    }

    async fn list(&self, filter: &SessionFilter) -> Result<Vec<Session>> {
        let mut query = String::from("SELECT * FROM safety_sessions WHERE 1=1");
        let mut param = 0;

        if filter.user_id.is_some() {
            param += 1;
            query.push_str(&format!(" AND user_id = ${}", param));
        }
        if filter.expired_as_of.is_some() {
            param += 1;
            query.push_str(&format!(" AND expiration_date <= ${}", param));
        }

        query.push_str(&format!(
            " ORDER BY last_activity DESC, id DESC LIMIT ${} OFFSET ${}",
            param + 1,
            param + 2
        ));

        let mut sql_query = sqlx::query_as::<_, Session>(&query);
        if let Some(user_id) = filter.user_id {
            sql_query = sql_query.bind(user_id);
        }
        if let Some(cutoff) = filter.expired_as_of {
            sql_query = sql_query.bind(cutoff);
        }

        let sessions = sql_query
            .bind(filter.limit)
            .bind(filter.skip)
            .fetch_all(&self.pool)
            .await?;

        Ok(sessions)
    }

    async fn touch(&self, id: i64, now: DateTime<Utc>) -> Result<Option<Session>> {
        let session = sqlx::query_as::<_, Session>(
            "UPDATE safety_sessions SET last_activity = $2 WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(now)
        .fetch_optional(&self.pool)
        .await?;

        Ok(session)
    }

    async fn delete(&self, id: i64) -> Result<Option<Session>> {
        let session = sqlx::query_as::<_, Session>(
            "DELETE FROM safety_sessions WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(session)
    }
}

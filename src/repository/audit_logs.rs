//! Audit log repository

use sqlx::{Pool, Postgres};

use crate::{error::AppResult, models::AuditEntry};

#[derive(Clone)]
pub struct AuditLogsRepository {
    pool: Pool<Postgres>,
}

impl AuditLogsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Append an entry; runs on the pool, never inside an admission transaction
    pub async fn insert(&self, entry: &AuditEntry) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO audit_logs (actor_id, action, entity_type, entity_id, description)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(entry.actor_id)
        .bind(&entry.action)
        .bind(&entry.entity_type)
        .bind(&entry.entity_id)
        .bind(&entry.description)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

//! Visitors repository (read-only view used by the eligibility check)

use sqlx::{FromRow, Pool, Postgres};
use uuid::Uuid;

use crate::error::AppResult;

/// Eligibility-relevant columns of a visitor
#[derive(Debug, Clone, Copy, FromRow)]
pub struct VisitorStanding {
    pub is_active: bool,
    pub documents_verified: bool,
}

#[derive(Clone)]
pub struct VisitorsRepository {
    pool: Pool<Postgres>,
}

impl VisitorsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    pub async fn standing(&self, visitor_id: Uuid) -> AppResult<Option<VisitorStanding>> {
        let row = sqlx::query_as::<_, VisitorStanding>(
            "SELECT is_active, documents_verified FROM visitors WHERE id = $1",
        )
        .bind(visitor_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }
}

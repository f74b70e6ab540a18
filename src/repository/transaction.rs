//! Postgres admission transaction

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{Postgres, Transaction};
use uuid::Uuid;

use super::{help_requests, visit_capacity, AdmissionTx};
use crate::{
    error::AppResult,
    models::{help_request::HelpRequestRow, CapacityDefaults, Category, HelpRequest, VisitCapacity},
};

/// Wraps a `READ COMMITTED` transaction; row locks are taken with
/// `SELECT ... FOR UPDATE` and released on commit or rollback.
pub struct PgAdmissionTx {
    tx: Transaction<'static, Postgres>,
}

impl PgAdmissionTx {
    pub fn new(tx: Transaction<'static, Postgres>) -> Self {
        Self { tx }
    }
}

#[async_trait]
impl AdmissionTx for PgAdmissionTx {
    async fn lock_request(&mut self, id: Uuid) -> AppResult<Option<HelpRequest>> {
        sqlx::query_as::<_, HelpRequestRow>("SELECT * FROM help_requests WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await?
            .map(HelpRequest::try_from)
            .transpose()
    }

    async fn lock_request_by_ticket(&mut self, ticket_number: &str) -> AppResult<Option<HelpRequest>> {
        sqlx::query_as::<_, HelpRequestRow>(
            "SELECT * FROM help_requests WHERE ticket_number = $1 FOR UPDATE",
        )
        .bind(ticket_number)
        .fetch_optional(&mut *self.tx)
        .await?
        .map(HelpRequest::try_from)
        .transpose()
    }

    async fn lock_capacity(
        &mut self,
        date: NaiveDate,
        defaults: CapacityDefaults,
        now: DateTime<Utc>,
    ) -> AppResult<VisitCapacity> {
        visit_capacity::lock_or_create(&mut self.tx, date, defaults, now).await
    }

    async fn reserve_capacity(
        &mut self,
        date: NaiveDate,
        category: &Category,
        n: i32,
        now: DateTime<Utc>,
    ) -> AppResult<Option<VisitCapacity>> {
        visit_capacity::reserve(&mut self.tx, date, category, n, now).await
    }

    async fn save_capacity(&mut self, capacity: &VisitCapacity) -> AppResult<()> {
        visit_capacity::update(&mut self.tx, capacity).await
    }

    async fn next_ticket_sequence(&mut self, date: NaiveDate) -> AppResult<i32> {
        visit_capacity::next_ticket_sequence(&mut self.tx, date).await
    }

    async fn lock_approved_candidates(
        &mut self,
        date: NaiveDate,
        category: &Category,
    ) -> AppResult<Vec<HelpRequest>> {
        sqlx::query_as::<_, HelpRequestRow>(
            r#"
            SELECT * FROM help_requests
            WHERE status = 'approved' AND visit_day = $1 AND category = $2
            ORDER BY created_at, reference
            FOR UPDATE
            "#,
        )
        .bind(date)
        .bind(category.as_str())
        .fetch_all(&mut *self.tx)
        .await?
        .into_iter()
        .map(HelpRequest::try_from)
        .collect()
    }

    async fn save_request(&mut self, request: &HelpRequest) -> AppResult<()> {
        help_requests::update_on(&mut self.tx, request).await
    }

    async fn commit(self: Box<Self>) -> AppResult<()> {
        self.tx
            .commit()
            .await
            .map_err(|e| help_requests::unique_violation_as_conflict(e, "Ticket number already assigned"))
    }
}

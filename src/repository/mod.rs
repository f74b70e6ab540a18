//! Repository layer for database operations
//!
//! Admission logic talks to storage through [`AdmissionStore`] and the
//! transactions it opens. [`Repository`] is the Postgres implementation;
//! [`memory::MemoryStore`] keeps the same transactional guarantees in process.

pub mod audit_logs;
pub mod help_requests;
pub mod memory;
pub mod transaction;
pub mod visit_capacity;
pub mod visitors;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{Category, CapacityDefaults, HelpRequest, HelpRequestQuery, VisitCapacity},
};

/// Entry point to admission storage
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AdmissionStore: Send + Sync {
    /// Open an atomic unit of work. Dropping it without `commit` rolls back.
    async fn begin(&self) -> AppResult<Box<dyn AdmissionTx>>;

    async fn insert_request(&self, request: &HelpRequest) -> AppResult<()>;

    async fn find_request(&self, id: Uuid) -> AppResult<Option<HelpRequest>>;

    /// Requests matching the filter, oldest first
    async fn list_requests(&self, query: &HelpRequestQuery) -> AppResult<Vec<HelpRequest>>;

    async fn find_capacity(&self, date: NaiveDate) -> AppResult<Option<VisitCapacity>>;

    async fn ping(&self) -> AppResult<()>;
}

/// One open admission transaction.
///
/// Every `lock_*` method holds its rows until commit or rollback, so status
/// and capacity checks made after locking stay valid for the whole unit.
#[async_trait]
pub trait AdmissionTx: Send {
    async fn lock_request(&mut self, id: Uuid) -> AppResult<Option<HelpRequest>>;

    async fn lock_request_by_ticket(&mut self, ticket_number: &str) -> AppResult<Option<HelpRequest>>;

    /// Get or lazily create the capacity row for `date`, then lock it
    async fn lock_capacity(
        &mut self,
        date: NaiveDate,
        defaults: CapacityDefaults,
        now: DateTime<Utc>,
    ) -> AppResult<VisitCapacity>;

    /// Single conditional increment of `current[category]` by `n`.
    /// Returns `None` and changes nothing when the ceiling would be passed.
    async fn reserve_capacity(
        &mut self,
        date: NaiveDate,
        category: &Category,
        n: i32,
        now: DateTime<Utc>,
    ) -> AppResult<Option<VisitCapacity>>;

    async fn save_capacity(&mut self, capacity: &VisitCapacity) -> AppResult<()>;

    /// Atomically advance and return the ticket sequence for `date` (1-based)
    async fn next_ticket_sequence(&mut self, date: NaiveDate) -> AppResult<i32>;

    /// Approved requests for a day and category in submission order
    async fn lock_approved_candidates(
        &mut self,
        date: NaiveDate,
        category: &Category,
    ) -> AppResult<Vec<HelpRequest>>;

    async fn save_request(&mut self, request: &HelpRequest) -> AppResult<()>;

    async fn commit(self: Box<Self>) -> AppResult<()>;
}

/// Reject writes that would break the ticket/status invariant
pub(crate) fn ensure_ticket_invariant(request: &HelpRequest) -> AppResult<()> {
    if request.ticket_invariant_holds() {
        Ok(())
    } else {
        Err(AppError::Internal(format!(
            "Request {} in status {} has inconsistent ticket number",
            request.id, request.status
        )))
    }
}

/// Main repository struct holding database connection pool
#[derive(Clone)]
pub struct Repository {
    pub pool: Pool<Postgres>,
    pub help_requests: help_requests::HelpRequestsRepository,
    pub visit_capacity: visit_capacity::VisitCapacityRepository,
    pub visitors: visitors::VisitorsRepository,
    pub audit_logs: audit_logs::AuditLogsRepository,
}

impl Repository {
    /// Create a new repository with the given database pool
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self {
            help_requests: help_requests::HelpRequestsRepository::new(pool.clone()),
            visit_capacity: visit_capacity::VisitCapacityRepository::new(pool.clone()),
            visitors: visitors::VisitorsRepository::new(pool.clone()),
            audit_logs: audit_logs::AuditLogsRepository::new(pool.clone()),
            pool,
        }
    }
}

#[async_trait]
impl AdmissionStore for Repository {
    async fn begin(&self) -> AppResult<Box<dyn AdmissionTx>> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(transaction::PgAdmissionTx::new(tx)))
    }

    async fn insert_request(&self, request: &HelpRequest) -> AppResult<()> {
        self.help_requests.insert(request).await
    }

    async fn find_request(&self, id: Uuid) -> AppResult<Option<HelpRequest>> {
        self.help_requests.find_by_id(id).await
    }

    async fn list_requests(&self, query: &HelpRequestQuery) -> AppResult<Vec<HelpRequest>> {
        self.help_requests.list(query).await
    }

    async fn find_capacity(&self, date: NaiveDate) -> AppResult<Option<VisitCapacity>> {
        self.visit_capacity.find(date).await
    }

    async fn ping(&self) -> AppResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

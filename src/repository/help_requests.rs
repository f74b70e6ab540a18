//! Help requests repository

use sqlx::{PgConnection, Pool, Postgres};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::help_request::{HelpRequest, HelpRequestQuery, HelpRequestRow},
};

#[derive(Clone)]
pub struct HelpRequestsRepository {
    pool: Pool<Postgres>,
}

impl HelpRequestsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get a request by ID
    pub async fn find_by_id(&self, id: Uuid) -> AppResult<Option<HelpRequest>> {
        sqlx::query_as::<_, HelpRequestRow>("SELECT * FROM help_requests WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .map(HelpRequest::try_from)
            .transpose()
    }

    /// List requests, optionally filtered by status, category and visit day
    pub async fn list(&self, query: &HelpRequestQuery) -> AppResult<Vec<HelpRequest>> {
        let mut conditions = Vec::new();
        let mut idx = 1;

        if query.status.is_some() {
            conditions.push(format!("status = ${}", idx));
            idx += 1;
        }
        if query.category.is_some() {
            conditions.push(format!("category = ${}", idx));
            idx += 1;
        }
        if query.visit_day.is_some() {
            conditions.push(format!("visit_day = ${}", idx));
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        let sql = format!(
            "SELECT * FROM help_requests {} ORDER BY created_at, reference",
            where_clause
        );

        let mut builder = sqlx::query_as::<_, HelpRequestRow>(&sql);
        if let Some(status) = query.status {
            builder = builder.bind(status.as_str());
        }
        if let Some(ref category) = query.category {
            builder = builder.bind(category.as_str().to_string());
        }
        if let Some(day) = query.visit_day {
            builder = builder.bind(day);
        }

        builder
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(HelpRequest::try_from)
            .collect()
    }

    /// Insert a newly submitted request
    pub async fn insert(&self, request: &HelpRequest) -> AppResult<()> {
        super::ensure_ticket_invariant(request)?;

        sqlx::query(
            r#"
            INSERT INTO help_requests (
                id, reference, visitor_id, category, status, visit_day, time_slot,
                created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(request.id)
        .bind(&request.reference)
        .bind(request.visitor_id)
        .bind(request.category.as_str())
        .bind(request.status.as_str())
        .bind(request.visit_day)
        .bind(&request.time_slot)
        .bind(request.created_at)
        .bind(request.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| unique_violation_as_conflict(e, "Help request reference already exists"))?;

        Ok(())
    }
}

/// Write every mutable column of a request on the given connection
pub(crate) async fn update_on(conn: &mut PgConnection, request: &HelpRequest) -> AppResult<()> {
    super::ensure_ticket_invariant(request)?;

    let result = sqlx::query(
        r#"
        UPDATE help_requests SET
            status = $2, visit_day = $3, time_slot = $4, ticket_number = $5, qr_code = $6,
            admin_notes = $7, eligibility_notes = $8,
            approved_by = $9, approved_at = $10,
            rejected_by = $11, rejected_at = $12, rejection_reason = $13,
            cancelled_by = $14, cancelled_at = $15,
            ticket_issued_at = $16, completed_at = $17, updated_at = $18
        WHERE id = $1
        "#,
    )
    .bind(request.id)
    .bind(request.status.as_str())
    .bind(request.visit_day)
    .bind(&request.time_slot)
    .bind(&request.ticket_number)
    .bind(&request.qr_code)
    .bind(&request.admin_notes)
    .bind(&request.eligibility_notes)
    .bind(request.approved_by)
    .bind(request.approved_at)
    .bind(request.rejected_by)
    .bind(request.rejected_at)
    .bind(&request.rejection_reason)
    .bind(request.cancelled_by)
    .bind(request.cancelled_at)
    .bind(request.ticket_issued_at)
    .bind(request.completed_at)
    .bind(request.updated_at)
    .execute(conn)
    .await
    .map_err(|e| unique_violation_as_conflict(e, "Ticket number already assigned"))?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound(format!(
            "Help request with id {} not found",
            request.id
        )));
    }
    Ok(())
}

pub(crate) fn unique_violation_as_conflict(e: sqlx::Error, message: &str) -> AppError {
    let is_unique = e
        .as_database_error()
        .map(|db| db.is_unique_violation())
        .unwrap_or(false);

    if is_unique {
        AppError::Conflict(message.to_string())
    } else {
        AppError::Database(e)
    }
}

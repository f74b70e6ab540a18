//! Visit capacity repository

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{PgConnection, Pool, Postgres};

use crate::{
    error::AppResult,
    models::{CapacityDefaults, Category, VisitCapacity},
};

#[derive(Clone)]
pub struct VisitCapacityRepository {
    pool: Pool<Postgres>,
}

impl VisitCapacityRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get the capacity row for a date without creating it
    pub async fn find(&self, date: NaiveDate) -> AppResult<Option<VisitCapacity>> {
        let row = sqlx::query_as::<_, VisitCapacity>("SELECT * FROM visit_capacity WHERE date = $1")
            .bind(date)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }
}

/// Materialize the row with default ceilings if missing, then lock it
pub(crate) async fn lock_or_create(
    conn: &mut PgConnection,
    date: NaiveDate,
    defaults: CapacityDefaults,
    now: DateTime<Utc>,
) -> AppResult<VisitCapacity> {
    let fresh = VisitCapacity::with_defaults(date, defaults, now);

    sqlx::query(
        r#"
        INSERT INTO visit_capacity (date, day_of_week, max_food, max_general, updated_at)
        VALUES ($1, $2, $3, $4, $5)
        ON CONFLICT (date) DO NOTHING
        "#,
    )
    .bind(fresh.date)
    .bind(&fresh.day_of_week)
    .bind(fresh.max_food)
    .bind(fresh.max_general)
    .bind(fresh.updated_at)
    .execute(&mut *conn)
    .await?;

    let row = sqlx::query_as::<_, VisitCapacity>(
        "SELECT * FROM visit_capacity WHERE date = $1 FOR UPDATE",
    )
    .bind(date)
    .fetch_one(&mut *conn)
    .await?;

    Ok(row)
}

/// Conditional increment: matches no row when the ceiling would be passed
pub(crate) async fn reserve(
    conn: &mut PgConnection,
    date: NaiveDate,
    category: &Category,
    n: i32,
    now: DateTime<Utc>,
) -> AppResult<Option<VisitCapacity>> {
    let (current, max) = match category {
        Category::Food => ("current_food", "max_food"),
        Category::General => ("current_general", "max_general"),
        _ => return Ok(None),
    };

    let sql = format!(
        r#"
        UPDATE visit_capacity
        SET {current} = {current} + $2, updated_at = $3
        WHERE date = $1 AND is_operating_day AND {current} + $2 <= {max}
        RETURNING *
        "#,
        current = current,
        max = max,
    );

    let row = sqlx::query_as::<_, VisitCapacity>(&sql)
        .bind(date)
        .bind(n)
        .bind(now)
        .fetch_optional(conn)
        .await?;

    Ok(row)
}

pub(crate) async fn update(conn: &mut PgConnection, capacity: &VisitCapacity) -> AppResult<()> {
    sqlx::query(
        r#"
        UPDATE visit_capacity
        SET max_food = $2, max_general = $3, is_operating_day = $4, updated_at = $5
        WHERE date = $1
        "#,
    )
    .bind(capacity.date)
    .bind(capacity.max_food)
    .bind(capacity.max_general)
    .bind(capacity.is_operating_day)
    .bind(capacity.updated_at)
    .execute(conn)
    .await?;

    Ok(())
}

/// Upsert-increment of the per-day ticket counter
pub(crate) async fn next_ticket_sequence(conn: &mut PgConnection, date: NaiveDate) -> AppResult<i32> {
    let seq: i32 = sqlx::query_scalar(
        r#"
        INSERT INTO ticket_sequences (visit_day, last_seq)
        VALUES ($1, 1)
        ON CONFLICT (visit_day) DO UPDATE SET last_seq = ticket_sequences.last_seq + 1
        RETURNING last_seq
        "#,
    )
    .bind(date)
    .fetch_one(conn)
    .await?;

    Ok(seq)
}

//! Capacity bookkeeping per day and category

use chrono::{DateTime, NaiveDate, Utc};

use crate::{
    config::AdmissionConfig,
    error::{AppError, AppResult},
    models::{CapacityDefaults, Category, VisitCapacity},
    repository::AdmissionTx,
};

/// Reads and consumes admission capacity inside a caller's transaction.
/// [`CapacityLedger::reserve`] is the only way capacity gets consumed.
#[derive(Debug, Clone, Copy)]
pub struct CapacityLedger {
    defaults: CapacityDefaults,
}

impl CapacityLedger {
    pub fn new(defaults: CapacityDefaults) -> Self {
        Self { defaults }
    }

    pub fn from_config(config: &AdmissionConfig) -> Self {
        Self::new(CapacityDefaults {
            max_food: config.default_max_food,
            max_general: config.default_max_general,
        })
    }

    pub fn defaults(&self) -> CapacityDefaults {
        self.defaults
    }

    /// Existing row for `date`, or a new one with default ceilings. The row
    /// stays locked until the transaction ends.
    pub async fn get_or_create(
        &self,
        tx: &mut dyn AdmissionTx,
        date: NaiveDate,
        now: DateTime<Utc>,
    ) -> AppResult<VisitCapacity> {
        tx.lock_capacity(date, self.defaults, now).await
    }

    /// `max - current`, clamped at zero; zero for untracked categories
    pub async fn available(
        &self,
        tx: &mut dyn AdmissionTx,
        date: NaiveDate,
        category: &Category,
        now: DateTime<Utc>,
    ) -> AppResult<i32> {
        let capacity = self.get_or_create(tx, date, now).await?;
        let available = capacity.available(category);
        tracing::debug!(%date, %category, available, "Capacity read");
        Ok(available)
    }

    /// Consume `n` slots in one conditional update, or fail with
    /// `CapacityExceeded` leaving the counts untouched.
    pub async fn reserve(
        &self,
        tx: &mut dyn AdmissionTx,
        date: NaiveDate,
        category: &Category,
        n: i32,
        now: DateTime<Utc>,
    ) -> AppResult<VisitCapacity> {
        if n <= 0 {
            return Err(AppError::Validation(format!(
                "Reservation size must be positive, got {}",
                n
            )));
        }

        // Materialize the row so the conditional update has something to match.
        let before = self.get_or_create(tx, date, now).await?;

        match tx.reserve_capacity(date, category, n, now).await? {
            Some(after) => Ok(after),
            None => Err(AppError::CapacityExceeded {
                date,
                category: category.to_string(),
                requested: n,
                available: before.available(category),
            }),
        }
    }

    /// Change ceilings or the operating flag without dropping below what is
    /// already consumed
    pub async fn configure(
        &self,
        tx: &mut dyn AdmissionTx,
        date: NaiveDate,
        max_food: Option<i32>,
        max_general: Option<i32>,
        is_operating_day: Option<bool>,
        now: DateTime<Utc>,
    ) -> AppResult<VisitCapacity> {
        let mut capacity = self.get_or_create(tx, date, now).await?;

        if let Some(max) = max_food {
            if max < capacity.current_food {
                return Err(AppError::Validation(format!(
                    "Food ceiling {} is below the {} slots already issued",
                    max, capacity.current_food
                )));
            }
            capacity.max_food = max;
        }
        if let Some(max) = max_general {
            if max < capacity.current_general {
                return Err(AppError::Validation(format!(
                    "General ceiling {} is below the {} slots already issued",
                    max, capacity.current_general
                )));
            }
            capacity.max_general = max;
        }
        if let Some(open) = is_operating_day {
            capacity.is_operating_day = open;
        }
        capacity.updated_at = now;

        tx.save_capacity(&capacity).await?;
        Ok(capacity)
    }
}

//! Per-day admission capacity

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

use super::enums::Category;

/// Ceilings used when a date has no capacity record yet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CapacityDefaults {
    pub max_food: i32,
    pub max_general: i32,
}

/// Capacity record for one calendar date
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct VisitCapacity {
    pub date: NaiveDate,
    pub day_of_week: String,
    pub max_food: i32,
    pub max_general: i32,
    pub current_food: i32,
    pub current_general: i32,
    pub is_operating_day: bool,
    pub updated_at: DateTime<Utc>,
}

impl VisitCapacity {
    pub fn with_defaults(date: NaiveDate, defaults: CapacityDefaults, now: DateTime<Utc>) -> Self {
        Self {
            date,
            day_of_week: date.weekday().to_string(),
            max_food: defaults.max_food,
            max_general: defaults.max_general,
            current_food: 0,
            current_general: 0,
            is_operating_day: true,
            updated_at: now,
        }
    }

    /// `(max, current)` for a tracked category
    pub fn counts(&self, category: &Category) -> Option<(i32, i32)> {
        match category {
            Category::Food => Some((self.max_food, self.current_food)),
            Category::General => Some((self.max_general, self.current_general)),
            _ => None,
        }
    }

    /// Remaining slots, never negative; zero for untracked categories
    /// and non-operating days
    pub fn available(&self, category: &Category) -> i32 {
        if !self.is_operating_day {
            return 0;
        }
        self.counts(category)
            .map(|(max, current)| (max - current).max(0))
            .unwrap_or(0)
    }

    /// Consume `n` slots if the ceiling allows it. Returns false without
    /// touching the counts otherwise.
    pub fn try_consume(&mut self, category: &Category, n: i32) -> bool {
        if n <= 0 || self.available(category) < n {
            return false;
        }
        match category {
            Category::Food => self.current_food += n,
            Category::General => self.current_general += n,
            _ => return false,
        }
        true
    }

    pub fn within_bounds(&self) -> bool {
        (0..=self.max_food).contains(&self.current_food)
            && (0..=self.max_general).contains(&self.current_general)
    }
}

/// Admin update of a date's ceilings
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct UpdateCapacity {
    pub max_food: Option<i32>,
    pub max_general: Option<i32>,
    pub is_operating_day: Option<bool>,
}

/// Capacity with computed availability for display
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CapacityView {
    #[serde(flatten)]
    pub capacity: VisitCapacity,
    pub available_food: i32,
    pub available_general: i32,
}

impl From<VisitCapacity> for CapacityView {
    fn from(capacity: VisitCapacity) -> Self {
        Self {
            available_food: capacity.available(&Category::Food),
            available_general: capacity.available(&Category::General),
            capacity,
        }
    }
}

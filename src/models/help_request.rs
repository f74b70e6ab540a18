//! Help request model and related types

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use super::enums::{Category, RequestStatus};
use crate::error::AppError;

/// A visitor's request for assistance, tracked through approval and ticketing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct HelpRequest {
    pub id: Uuid,
    /// Human-facing reference, fixed at creation
    pub reference: String,
    pub visitor_id: Uuid,
    #[schema(value_type = String, example = "food")]
    pub category: Category,
    pub status: RequestStatus,
    pub visit_day: Option<NaiveDate>,
    pub time_slot: Option<String>,
    pub ticket_number: Option<String>,
    /// Check-in payload rendered as a QR code
    pub qr_code: Option<String>,
    pub admin_notes: Option<String>,
    pub eligibility_notes: Option<String>,
    pub approved_by: Option<Uuid>,
    pub approved_at: Option<DateTime<Utc>>,
    pub rejected_by: Option<Uuid>,
    pub rejected_at: Option<DateTime<Utc>>,
    pub rejection_reason: Option<String>,
    pub cancelled_by: Option<Uuid>,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub ticket_issued_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl HelpRequest {
    /// Build a freshly submitted request in `Pending` status
    pub fn new_pending(data: &NewHelpRequest, now: DateTime<Utc>) -> Self {
        let id = Uuid::new_v4();
        Self {
            id,
            reference: Self::make_reference(id, now),
            visitor_id: data.visitor_id,
            category: data.category.clone(),
            status: RequestStatus::Pending,
            visit_day: data.visit_day,
            time_slot: data.time_slot.clone(),
            ticket_number: None,
            qr_code: None,
            admin_notes: None,
            eligibility_notes: None,
            approved_by: None,
            approved_at: None,
            rejected_by: None,
            rejected_at: None,
            rejection_reason: None,
            cancelled_by: None,
            cancelled_at: None,
            ticket_issued_at: None,
            completed_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// `REQ-{YYYYMMDD}-{6 hex}` derived from the id and submission date
    fn make_reference(id: Uuid, now: DateTime<Utc>) -> String {
        let hex = id.simple().to_string().to_ascii_uppercase();
        format!("REQ-{}-{}", now.format("%Y%m%d"), &hex[..6])
    }

    /// A ticket number is present exactly when the status holds a ticket
    pub fn ticket_invariant_holds(&self) -> bool {
        let has_ticket = self
            .ticket_number
            .as_deref()
            .map(|t| !t.is_empty())
            .unwrap_or(false);
        has_ticket == self.status.holds_ticket()
    }
}

/// Raw database row for `help_requests`
#[derive(Debug, FromRow)]
pub struct HelpRequestRow {
    pub id: Uuid,
    pub reference: String,
    pub visitor_id: Uuid,
    pub category: String,
    pub status: String,
    pub visit_day: Option<NaiveDate>,
    pub time_slot: Option<String>,
    pub ticket_number: Option<String>,
    pub qr_code: Option<String>,
    pub admin_notes: Option<String>,
    pub eligibility_notes: Option<String>,
    pub approved_by: Option<Uuid>,
    pub approved_at: Option<DateTime<Utc>>,
    pub rejected_by: Option<Uuid>,
    pub rejected_at: Option<DateTime<Utc>>,
    pub rejection_reason: Option<String>,
    pub cancelled_by: Option<Uuid>,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub ticket_issued_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<HelpRequestRow> for HelpRequest {
    type Error = AppError;

    fn try_from(row: HelpRequestRow) -> Result<Self, Self::Error> {
        let status = row.status.parse::<RequestStatus>().map_err(AppError::Internal)?;
        Ok(Self {
            id: row.id,
            reference: row.reference,
            visitor_id: row.visitor_id,
            category: Category::from(row.category),
            status,
            visit_day: row.visit_day,
            time_slot: row.time_slot,
            ticket_number: row.ticket_number,
            qr_code: row.qr_code,
            admin_notes: row.admin_notes,
            eligibility_notes: row.eligibility_notes,
            approved_by: row.approved_by,
            approved_at: row.approved_at,
            rejected_by: row.rejected_by,
            rejected_at: row.rejected_at,
            rejection_reason: row.rejection_reason,
            cancelled_by: row.cancelled_by,
            cancelled_at: row.cancelled_at,
            ticket_issued_at: row.ticket_issued_at,
            completed_at: row.completed_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Intake data for a new help request
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct NewHelpRequest {
    pub visitor_id: Uuid,
    #[schema(value_type = String, example = "food")]
    pub category: Category,
    /// Preferred visit day (YYYY-MM-DD)
    pub visit_day: Option<NaiveDate>,
    pub time_slot: Option<String>,
}

/// Filters for listing help requests
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
pub struct HelpRequestQuery {
    pub status: Option<RequestStatus>,
    #[param(value_type = Option<String>)]
    pub category: Option<Category>,
    pub visit_day: Option<NaiveDate>,
}

impl HelpRequestQuery {
    pub fn matches(&self, request: &HelpRequest) -> bool {
        self.status.map_or(true, |s| request.status == s)
            && self.category.as_ref().map_or(true, |c| &request.category == c)
            && self.visit_day.map_or(true, |d| request.visit_day == Some(d))
    }
}

/// Options accompanying an approval
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct ApprovalOptions {
    pub notes: Option<String>,
    /// Issue the ticket in the same transaction
    #[serde(default)]
    pub issue_ticket_now: bool,
    /// Overrides the visitor's preferred visit day
    pub visit_day: Option<NaiveDate>,
    pub time_slot: Option<String>,
}

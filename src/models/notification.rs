//! Post-commit notification and audit payloads

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Kind of event sent to a visitor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    ApprovalGranted,
    ApprovalRejected,
    TicketIssued,
}

/// Event queued for the visitor once an admission decision is committed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationEvent {
    pub kind: NotificationKind,
    pub request_id: Uuid,
    pub recipient: Uuid,
    pub reference: String,
    pub ticket_number: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

/// Audit trail entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub actor_id: Uuid,
    pub action: String,
    pub entity_type: String,
    pub entity_id: String,
    pub description: String,
}

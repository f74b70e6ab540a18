//! Data models for the admission server

pub mod enums;
pub mod help_request;
pub mod notification;
pub mod user;
pub mod visit_capacity;

// Re-export commonly used types
pub use enums::{Category, RequestStatus};
pub use help_request::{ApprovalOptions, HelpRequest, HelpRequestQuery, NewHelpRequest};
pub use notification::{AuditEntry, NotificationEvent, NotificationKind};
pub use user::{Role, UserClaims};
pub use visit_capacity::{CapacityDefaults, CapacityView, UpdateCapacity, VisitCapacity};

//! Help request status transitions
//!
//! ```text
//! Pending ──► Approved ──► TicketIssued ──► Completed
//!    │           │
//!    ├──► Rejected
//!    └───────────┴──► Cancelled
//! ```
//!
//! `Rejected`, `Completed` and `Cancelled` are terminal. Every status change
//! in the crate goes through [`validate`].

use thiserror::Error;

use crate::{error::AppError, models::RequestStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("Illegal transition from {from} to {to}")]
pub struct TransitionError {
    pub from: RequestStatus,
    pub to: RequestStatus,
}

impl From<TransitionError> for AppError {
    fn from(e: TransitionError) -> Self {
        AppError::IllegalState(e.to_string())
    }
}

const TRANSITIONS: &[(RequestStatus, RequestStatus)] = &[
    (RequestStatus::Pending, RequestStatus::Approved),
    (RequestStatus::Pending, RequestStatus::Rejected),
    (RequestStatus::Pending, RequestStatus::Cancelled),
    (RequestStatus::Approved, RequestStatus::TicketIssued),
    (RequestStatus::Approved, RequestStatus::Cancelled),
    (RequestStatus::TicketIssued, RequestStatus::Completed),
];

pub fn validate(current: RequestStatus, next: RequestStatus) -> Result<(), TransitionError> {
    if TRANSITIONS.contains(&(current, next)) {
        Ok(())
    } else {
        Err(TransitionError { from: current, to: next })
    }
}

pub fn is_terminal(status: RequestStatus) -> bool {
    !TRANSITIONS.iter().any(|(from, _)| *from == status)
}

//! Door check-in: completes a visit for an issued ticket

use std::sync::Arc;

use chrono_tz::Tz;
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{HelpRequest, RequestStatus},
    repository::AdmissionStore,
    services::{
        admission::{audit_entry, state_machine},
        audit::AuditLog,
        clock::{local_date, Clock},
    },
};

#[derive(Clone)]
pub struct CheckInService {
    store: Arc<dyn AdmissionStore>,
    audit: Arc<dyn AuditLog>,
    clock: Arc<dyn Clock>,
    timezone: Tz,
}

impl CheckInService {
    pub fn new(
        store: Arc<dyn AdmissionStore>,
        audit: Arc<dyn AuditLog>,
        clock: Arc<dyn Clock>,
        timezone: Tz,
    ) -> Self {
        Self { store, audit, clock, timezone }
    }

    /// Mark the ticket holder's visit as completed. Only valid on the visit
    /// day, counted in the service timezone.
    pub async fn check_in(&self, ticket_number: &str, actor_id: Uuid) -> AppResult<HelpRequest> {
        let now = self.clock.now();
        let mut tx = self.store.begin().await?;

        let mut request = tx
            .lock_request_by_ticket(ticket_number)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Ticket {} not found", ticket_number)))?;
        state_machine::validate(request.status, RequestStatus::Completed)?;

        if request.visit_day != Some(local_date(now, self.timezone)) {
            return Err(AppError::IllegalState(format!(
                "Ticket {} is not valid today",
                ticket_number
            )));
        }

        request.status = RequestStatus::Completed;
        request.completed_at = Some(now);
        request.updated_at = now;

        tx.save_request(&request).await?;
        tx.commit().await?;

        tracing::info!(request_id = %request.id, ticket = ticket_number, "Visitor checked in");

        let entry = audit_entry(
            actor_id,
            "check_in",
            &request,
            format!("Checked in ticket {}", ticket_number),
        );
        if let Err(e) = self.audit.record(&entry).await {
            tracing::warn!(error = %e, "Audit entry failed");
        }

        Ok(request)
    }
}

//! Visit admission: approval, rejection, ticket issuance and cancellation
//!
//! [`AdmissionController`] is the only writer of capacity and ticket state.
//! Each operation re-reads the request under a row lock inside one
//! transaction, validates the status change with [`state_machine`], consumes
//! capacity through [`CapacityLedger::reserve`] and only after commit tells
//! the notification outbox and the audit log.

pub mod ledger;
pub mod state_machine;
pub mod tickets;

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

pub use ledger::CapacityLedger;
pub use tickets::TicketIssuer;

use crate::{
    config::AdmissionConfig,
    error::{AppError, AppResult},
    models::{
        ApprovalOptions, AuditEntry, CapacityView, Category, HelpRequest, HelpRequestQuery,
        NotificationEvent, NotificationKind, RequestStatus, UpdateCapacity, VisitCapacity,
    },
    repository::{AdmissionStore, AdmissionTx},
    services::{
        audit::AuditLog, clock::Clock, eligibility::EligibilityGate,
        notifications::NotificationDispatcher,
    },
};

/// External services the controller consults or informs
#[derive(Clone)]
pub struct Collaborators {
    pub eligibility: Arc<dyn EligibilityGate>,
    pub notifier: Arc<dyn NotificationDispatcher>,
    pub audit: Arc<dyn AuditLog>,
    pub clock: Arc<dyn Clock>,
}

#[derive(Clone)]
pub struct AdmissionController {
    store: Arc<dyn AdmissionStore>,
    ledger: CapacityLedger,
    issuer: TicketIssuer,
    eligibility: Arc<dyn EligibilityGate>,
    notifier: Arc<dyn NotificationDispatcher>,
    audit: Arc<dyn AuditLog>,
    clock: Arc<dyn Clock>,
}

impl AdmissionController {
    pub fn new(
        store: Arc<dyn AdmissionStore>,
        config: &AdmissionConfig,
        collaborators: Collaborators,
    ) -> Self {
        Self {
            store,
            ledger: CapacityLedger::from_config(config),
            issuer: TicketIssuer::from_config(config),
            eligibility: collaborators.eligibility,
            notifier: collaborators.notifier,
            audit: collaborators.audit,
            clock: collaborators.clock,
        }
    }

    /// Get a request by ID
    pub async fn get(&self, request_id: Uuid) -> AppResult<HelpRequest> {
        self.store
            .find_request(request_id)
            .await?
            .ok_or_else(|| not_found(request_id))
    }

    /// List requests matching the filter, oldest first
    pub async fn list(&self, query: &HelpRequestQuery) -> AppResult<Vec<HelpRequest>> {
        self.store.list_requests(query).await
    }

    /// Approve a pending request, optionally issuing its ticket in the same
    /// transaction. A failed reservation leaves the request `Pending`.
    pub async fn approve(
        &self,
        request_id: Uuid,
        admin_id: Uuid,
        options: ApprovalOptions,
    ) -> AppResult<HelpRequest> {
        let snapshot = self.get(request_id).await?;
        state_machine::validate(snapshot.status, RequestStatus::Approved)?;

        let decision = self.eligibility.check(snapshot.visitor_id).await?;
        if !decision.allowed {
            return Err(AppError::EligibilityDenied(decision.reason));
        }

        let now = self.clock.now();
        let mut tx = self.store.begin().await?;

        let mut request = tx
            .lock_request(request_id)
            .await?
            .ok_or_else(|| not_found(request_id))?;
        state_machine::validate(request.status, RequestStatus::Approved)?;

        if options.visit_day.is_some() {
            request.visit_day = options.visit_day;
        }
        if options.time_slot.is_some() {
            request.time_slot = options.time_slot;
        }
        request.status = RequestStatus::Approved;
        request.approved_by = Some(admin_id);
        request.approved_at = Some(now);
        request.admin_notes = options.notes;
        request.eligibility_notes = Some(decision.reason);
        request.updated_at = now;

        if options.issue_ticket_now {
            let day = request.visit_day.ok_or_else(|| {
                AppError::Validation("A visit day is required to issue a ticket".to_string())
            })?;
            self.ledger
                .reserve(tx.as_mut(), day, &request.category, 1, now)
                .await?;
            self.issue_ticket(tx.as_mut(), &mut request, day, now).await?;
        }

        tx.save_request(&request).await?;
        tx.commit().await?;

        tracing::info!(
            request_id = %request.id,
            status = %request.status,
            ticket = request.ticket_number.as_deref().unwrap_or("-"),
            "Help request approved"
        );

        let kind = if request.ticket_number.is_some() {
            NotificationKind::TicketIssued
        } else {
            NotificationKind::ApprovalGranted
        };
        self.after_commit(
            vec![self.event(kind, &request, now)],
            vec![audit_entry(
                admin_id,
                "approve_request",
                &request,
                match &request.ticket_number {
                    Some(ticket) => format!("Approved {} and issued ticket {}", request.reference, ticket),
                    None => format!("Approved {}", request.reference),
                },
            )],
        )
        .await;

        Ok(request)
    }

    /// Reject a pending request
    pub async fn reject(
        &self,
        request_id: Uuid,
        admin_id: Uuid,
        reason: &str,
    ) -> AppResult<HelpRequest> {
        let reason = reason.trim();
        if reason.is_empty() {
            return Err(AppError::Validation("A rejection reason is required".to_string()));
        }

        let now = self.clock.now();
        let mut tx = self.store.begin().await?;

        let mut request = tx
            .lock_request(request_id)
            .await?
            .ok_or_else(|| not_found(request_id))?;
        state_machine::validate(request.status, RequestStatus::Rejected)?;

        request.status = RequestStatus::Rejected;
        request.rejected_by = Some(admin_id);
        request.rejected_at = Some(now);
        request.rejection_reason = Some(reason.to_string());
        request.updated_at = now;

        tx.save_request(&request).await?;
        tx.commit().await?;

        tracing::info!(request_id = %request.id, "Help request rejected");

        self.after_commit(
            vec![self.event(NotificationKind::ApprovalRejected, &request, now)],
            vec![audit_entry(
                admin_id,
                "reject_request",
                &request,
                format!("Rejected {}: {}", request.reference, reason),
            )],
        )
        .await;

        Ok(request)
    }

    /// Issue tickets to approved requests for one day and category, earliest
    /// submissions first. At most `max_tickets` (unbounded when zero or
    /// negative) and never more than the remaining capacity. Returns an empty
    /// list when nothing can be issued.
    pub async fn batch_issue_tickets(
        &self,
        visit_day: NaiveDate,
        category: &Category,
        max_tickets: i32,
        admin_id: Uuid,
    ) -> AppResult<Vec<HelpRequest>> {
        let now = self.clock.now();
        let mut tx = self.store.begin().await?;

        // Lock capacity before candidates so the count cannot move underneath us.
        let available = self
            .ledger
            .available(tx.as_mut(), visit_day, category, now)
            .await?;
        let candidates = tx.lock_approved_candidates(visit_day, category).await?;

        let limit = if max_tickets > 0 { max_tickets as usize } else { usize::MAX };
        let n = candidates.len().min(limit).min(available.max(0) as usize);

        if n == 0 {
            tracing::info!(
                %visit_day, %category,
                candidates = candidates.len(),
                available,
                "Nothing to issue"
            );
            return Ok(Vec::new());
        }

        self.ledger
            .reserve(tx.as_mut(), visit_day, category, n as i32, now)
            .await?;

        let mut issued = Vec::with_capacity(n);
        for mut request in candidates.into_iter().take(n) {
            self.issue_ticket(tx.as_mut(), &mut request, visit_day, now).await?;
            tx.save_request(&request).await?;
            issued.push(request);
        }

        tx.commit().await?;

        tracing::info!(%visit_day, %category, issued = issued.len(), "Batch tickets issued");

        let events = issued
            .iter()
            .map(|r| self.event(NotificationKind::TicketIssued, r, now))
            .collect();
        let audit = vec![AuditEntry {
            actor_id: admin_id,
            action: "batch_issue_tickets".to_string(),
            entity_type: "visit_capacity".to_string(),
            entity_id: visit_day.to_string(),
            description: format!("Issued {} {} tickets for {}", issued.len(), category, visit_day),
        }];
        self.after_commit(events, audit).await;

        Ok(issued)
    }

    /// Cancel a request that has not been ticketed yet
    pub async fn cancel(&self, request_id: Uuid, actor_id: Uuid) -> AppResult<HelpRequest> {
        let now = self.clock.now();
        let mut tx = self.store.begin().await?;

        let mut request = tx
            .lock_request(request_id)
            .await?
            .ok_or_else(|| not_found(request_id))?;

        if state_machine::is_terminal(request.status) {
            return Err(AppError::IllegalState(format!(
                "Request {} is already {}",
                request.reference, request.status
            )));
        }
        // Capacity is only consumed at ticket issuance, so nothing to release.
        state_machine::validate(request.status, RequestStatus::Cancelled)?;

        request.status = RequestStatus::Cancelled;
        request.cancelled_by = Some(actor_id);
        request.cancelled_at = Some(now);
        request.updated_at = now;

        tx.save_request(&request).await?;
        tx.commit().await?;

        tracing::info!(request_id = %request.id, "Help request cancelled");

        self.after_commit(
            Vec::new(),
            vec![audit_entry(
                actor_id,
                "cancel_request",
                &request,
                format!("Cancelled {}", request.reference),
            )],
        )
        .await;

        Ok(request)
    }

    /// Capacity for a date with availability. Dates without a record report
    /// the default ceilings without creating one.
    pub async fn capacity_for(&self, date: NaiveDate) -> AppResult<CapacityView> {
        let capacity = match self.store.find_capacity(date).await? {
            Some(capacity) => capacity,
            None => VisitCapacity::with_defaults(date, self.ledger.defaults(), self.clock.now()),
        };
        Ok(capacity.into())
    }

    /// Change a date's ceilings or operating flag
    pub async fn configure_capacity(
        &self,
        date: NaiveDate,
        update: &UpdateCapacity,
        admin_id: Uuid,
    ) -> AppResult<CapacityView> {
        for max in [update.max_food, update.max_general].into_iter().flatten() {
            if max < 0 {
                return Err(AppError::Validation("Ceilings cannot be negative".to_string()));
            }
        }

        let now = self.clock.now();
        let mut tx = self.store.begin().await?;
        let capacity = self
            .ledger
            .configure(
                tx.as_mut(),
                date,
                update.max_food,
                update.max_general,
                update.is_operating_day,
                now,
            )
            .await?;
        tx.commit().await?;

        tracing::info!(
            %date,
            max_food = capacity.max_food,
            max_general = capacity.max_general,
            open = capacity.is_operating_day,
            "Capacity configured"
        );

        self.after_commit(
            Vec::new(),
            vec![AuditEntry {
                actor_id: admin_id,
                action: "configure_capacity".to_string(),
                entity_type: "visit_capacity".to_string(),
                entity_id: date.to_string(),
                description: format!(
                    "Food {} / General {} / operating {}",
                    capacity.max_food, capacity.max_general, capacity.is_operating_day
                ),
            }],
        )
        .await;

        Ok(capacity.into())
    }

    /// `Approved → TicketIssued` with a fresh number and check-in code.
    /// Capacity must already be reserved by the caller.
    async fn issue_ticket(
        &self,
        tx: &mut dyn AdmissionTx,
        request: &mut HelpRequest,
        day: NaiveDate,
        now: DateTime<Utc>,
    ) -> AppResult<()> {
        state_machine::validate(request.status, RequestStatus::TicketIssued)?;

        let ticket = self.issuer.next_ticket_number(tx, day).await?;
        request.qr_code = Some(TicketIssuer::derive_check_in_code(&ticket, day));
        request.ticket_number = Some(ticket);
        request.status = RequestStatus::TicketIssued;
        request.ticket_issued_at = Some(now);
        request.updated_at = now;
        Ok(())
    }

    fn event(&self, kind: NotificationKind, request: &HelpRequest, now: DateTime<Utc>) -> NotificationEvent {
        NotificationEvent {
            kind,
            request_id: request.id,
            recipient: request.visitor_id,
            reference: request.reference.clone(),
            ticket_number: request.ticket_number.clone(),
            occurred_at: now,
        }
    }

    /// Best effort: the admission decision is already committed
    async fn after_commit(&self, events: Vec<NotificationEvent>, entries: Vec<AuditEntry>) {
        for event in &events {
            if let Err(e) = self.notifier.notify(event).await {
                tracing::warn!(request_id = %event.request_id, error = %e, "Notification failed");
            }
        }
        for entry in &entries {
            if let Err(e) = self.audit.record(entry).await {
                tracing::warn!(action = %entry.action, error = %e, "Audit entry failed");
            }
        }
    }
}

fn not_found(request_id: Uuid) -> AppError {
    AppError::NotFound(format!("Help request with id {} not found", request_id))
}

pub(crate) fn audit_entry(
    actor_id: Uuid,
    action: &str,
    request: &HelpRequest,
    description: String,
) -> AuditEntry {
    AuditEntry {
        actor_id,
        action: action.to_string(),
        entity_type: "help_request".to_string(),
        entity_id: request.id.to_string(),
        description,
    }
}

//! Admission lifecycle tests against the in-memory store

mod common;

use std::collections::HashSet;

use chrono::Duration;
use uuid::Uuid;

use common::{visit_day, Harness};
use ldh_admission_server::{
    error::AppError,
    models::{ApprovalOptions, Category, NotificationKind, RequestStatus},
};

#[tokio::test]
async fn test_batch_issues_to_earliest_within_capacity() {
    let h = Harness::new();
    h.set_food_capacity(5).await;

    let mut approved = Vec::new();
    for _ in 0..7 {
        approved.push(h.approved(Category::Food).await);
    }

    let issued = h
        .services
        .admission
        .batch_issue_tickets(visit_day(), &Category::Food, 0, h.admin)
        .await
        .unwrap();

    let issued_ids: Vec<Uuid> = issued.iter().map(|r| r.id).collect();
    let earliest: Vec<Uuid> = approved[..5].iter().map(|r| r.id).collect();
    assert_eq!(issued_ids, earliest);
    assert!(issued.iter().all(|r| r.status == RequestStatus::TicketIssued));

    let capacity = h.services.admission.capacity_for(visit_day()).await.unwrap();
    assert_eq!(capacity.capacity.current_food, 5);
    assert_eq!(capacity.available_food, 0);

    for late in &approved[5..] {
        let current = h.services.admission.get(late.id).await.unwrap();
        assert_eq!(current.status, RequestStatus::Approved);
        assert!(current.ticket_number.is_none());
    }

    // Nothing left to give: empty result, no error, nothing touched.
    let before = h.services.admission.list(&Default::default()).await.unwrap();
    let again = h
        .services
        .admission
        .batch_issue_tickets(visit_day(), &Category::Food, 0, h.admin)
        .await
        .unwrap();
    assert!(again.is_empty());
    assert_eq!(h.services.admission.list(&Default::default()).await.unwrap(), before);
}

#[tokio::test]
async fn test_batch_respects_max_tickets() {
    let h = Harness::new();
    let first = h.approved(Category::General).await;
    let second = h.approved(Category::General).await;
    h.approved(Category::General).await;

    let issued = h
        .services
        .admission
        .batch_issue_tickets(visit_day(), &Category::General, 2, h.admin)
        .await
        .unwrap();

    assert_eq!(
        issued.iter().map(|r| r.id).collect::<Vec<_>>(),
        vec![first.id, second.id]
    );
    assert_eq!(
        issued
            .iter()
            .map(|r| r.ticket_number.clone().unwrap())
            .collect::<Vec<_>>(),
        vec!["LDH20240701001".to_string(), "LDH20240701002".to_string()]
    );
    let capacity = h.services.admission.capacity_for(visit_day()).await.unwrap();
    assert_eq!(capacity.capacity.current_general, 2);
}

#[tokio::test]
async fn test_batch_ignores_other_days_and_categories() {
    let h = Harness::new();
    h.approved(Category::General).await;
    let food = h.approved(Category::Food).await;

    let issued = h
        .services
        .admission
        .batch_issue_tickets(visit_day(), &Category::Food, 0, h.admin)
        .await
        .unwrap();
    assert_eq!(issued.len(), 1);
    assert_eq!(issued[0].id, food.id);

    let other_day = visit_day() + Duration::days(1);
    let none = h
        .services
        .admission
        .batch_issue_tickets(other_day, &Category::General, 0, h.admin)
        .await
        .unwrap();
    assert!(none.is_empty());
}

#[tokio::test]
async fn test_batch_with_no_capacity_leaves_requests_alone() {
    let h = Harness::new();
    h.set_food_capacity(0).await;
    let request = h.approved(Category::Food).await;

    let issued = h
        .services
        .admission
        .batch_issue_tickets(visit_day(), &Category::Food, 0, h.admin)
        .await
        .unwrap();

    assert!(issued.is_empty());
    assert_eq!(h.services.admission.get(request.id).await.unwrap(), request);
    assert!(h
        .notifier
        .events
        .lock()
        .unwrap()
        .iter()
        .all(|e| e.kind != NotificationKind::TicketIssued));
}

#[tokio::test]
async fn test_approve_with_ticket_fails_when_full() {
    let h = Harness::new();
    h.set_food_capacity(1).await;

    let first = h.submit(Category::Food).await;
    let second = h.submit(Category::Food).await;

    h.services
        .admission
        .approve(first.id, h.admin, Harness::issue_now())
        .await
        .unwrap();

    let err = h
        .services
        .admission
        .approve(second.id, h.admin, Harness::issue_now())
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::CapacityExceeded { available: 0, .. }));
    let untouched = h.services.admission.get(second.id).await.unwrap();
    assert_eq!(untouched, second);
    assert_eq!(untouched.status, RequestStatus::Pending);
}

#[tokio::test]
async fn test_approve_with_ticket_sets_ticket_and_code() {
    let h = Harness::new();
    let request = h.submit(Category::Food).await;

    let ticketed = h
        .services
        .admission
        .approve(
            request.id,
            h.admin,
            ApprovalOptions {
                notes: Some("priority family".to_string()),
                issue_ticket_now: true,
                visit_day: None,
                time_slot: Some("10:00-11:00".to_string()),
            },
        )
        .await
        .unwrap();

    assert_eq!(ticketed.status, RequestStatus::TicketIssued);
    assert_eq!(ticketed.ticket_number.as_deref(), Some("LDH20240701001"));
    assert_eq!(
        ticketed.qr_code.as_deref(),
        Some(r#"{"ticket":"LDH20240701001","action":"checkin","date":"2024-07-01"}"#)
    );
    assert_eq!(ticketed.approved_by, Some(h.admin));
    assert_eq!(ticketed.admin_notes.as_deref(), Some("priority family"));
    assert_eq!(ticketed.eligibility_notes.as_deref(), Some("documents verified"));
    assert_eq!(ticketed.time_slot.as_deref(), Some("10:00-11:00"));
    assert_eq!(ticketed.reference, request.reference);

    let events = h.notifier.events.lock().unwrap().clone();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].kind, NotificationKind::TicketIssued);
    assert_eq!(events[0].recipient, request.visitor_id);
}

#[tokio::test]
async fn test_approve_without_ticket_consumes_nothing() {
    let h = Harness::new();
    let approved = h.approved(Category::Food).await;

    assert_eq!(approved.status, RequestStatus::Approved);
    assert!(approved.ticket_number.is_none());
    assert!(approved.qr_code.is_none());
    let capacity = h.services.admission.capacity_for(visit_day()).await.unwrap();
    assert_eq!(capacity.capacity.current_food, 0);
    assert_eq!(
        h.notifier.events.lock().unwrap()[0].kind,
        NotificationKind::ApprovalGranted
    );
}

#[tokio::test]
async fn test_approve_twice_is_illegal() {
    let h = Harness::new();
    let approved = h.approved(Category::Food).await;

    let err = h
        .services
        .admission
        .approve(approved.id, h.admin, Harness::issue_now())
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::IllegalState(_)));
}

#[tokio::test]
async fn test_unknown_request_is_not_found() {
    let h = Harness::new();
    let id = Uuid::new_v4();

    assert!(matches!(
        h.services.admission.approve(id, h.admin, ApprovalOptions::default()).await,
        Err(AppError::NotFound(_))
    ));
    assert!(matches!(
        h.services.admission.reject(id, h.admin, "no").await,
        Err(AppError::NotFound(_))
    ));
    assert!(matches!(
        h.services.admission.cancel(id, h.admin).await,
        Err(AppError::NotFound(_))
    ));
}

#[tokio::test]
async fn test_reject_approved_request_is_illegal() {
    let h = Harness::new();
    let approved = h.approved(Category::General).await;

    let err = h
        .services
        .admission
        .reject(approved.id, h.admin, "duplicate")
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::IllegalState(_)));
    assert_eq!(h.services.admission.get(approved.id).await.unwrap(), approved);
}

#[tokio::test]
async fn test_second_reject_changes_nothing() {
    let h = Harness::new();
    let request = h.submit(Category::Food).await;

    let rejected = h
        .services
        .admission
        .reject(request.id, h.admin, "outside service area")
        .await
        .unwrap();
    assert_eq!(rejected.status, RequestStatus::Rejected);
    assert_eq!(rejected.rejected_by, Some(h.admin));
    assert_eq!(rejected.rejection_reason.as_deref(), Some("outside service area"));

    h.clock.advance(Duration::hours(1));
    let err = h
        .services
        .admission
        .reject(request.id, Uuid::new_v4(), "again")
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::IllegalState(_)));
    assert_eq!(h.services.admission.get(request.id).await.unwrap(), rejected);
}

#[tokio::test]
async fn test_reject_requires_reason() {
    let h = Harness::new();
    let request = h.submit(Category::Food).await;

    let err = h
        .services
        .admission
        .reject(request.id, h.admin, "   ")
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
}

#[tokio::test]
async fn test_cancel_from_pending_and_approved_only() {
    let h = Harness::new();
    let pending = h.submit(Category::Food).await;
    let approved = h.approved(Category::Food).await;

    let cancelled = h.services.admission.cancel(pending.id, pending.visitor_id).await.unwrap();
    assert_eq!(cancelled.status, RequestStatus::Cancelled);
    assert_eq!(cancelled.cancelled_by, Some(pending.visitor_id));

    let cancelled = h.services.admission.cancel(approved.id, h.admin).await.unwrap();
    assert_eq!(cancelled.status, RequestStatus::Cancelled);

    let ticketed = h.submit(Category::Food).await;
    h.services
        .admission
        .approve(ticketed.id, h.admin, Harness::issue_now())
        .await
        .unwrap();
    assert!(matches!(
        h.services.admission.cancel(ticketed.id, h.admin).await,
        Err(AppError::IllegalState(_))
    ));
    assert!(matches!(
        h.services.admission.cancel(pending.id, h.admin).await,
        Err(AppError::IllegalState(_))
    ));
}

#[tokio::test]
async fn test_cancelled_request_is_skipped_by_batch() {
    let h = Harness::new();
    let cancelled = h.approved(Category::Food).await;
    let kept = h.approved(Category::Food).await;
    h.services.admission.cancel(cancelled.id, h.admin).await.unwrap();

    let issued = h
        .services
        .admission
        .batch_issue_tickets(visit_day(), &Category::Food, 0, h.admin)
        .await
        .unwrap();
    assert_eq!(issued.len(), 1);
    assert_eq!(issued[0].id, kept.id);
}

#[tokio::test]
async fn test_check_in_completes_ticket_on_visit_day() {
    let h = Harness::new();
    let request = h.submit(Category::Food).await;
    let ticketed = h
        .services
        .admission
        .approve(request.id, h.admin, Harness::issue_now())
        .await
        .unwrap();
    let ticket = ticketed.ticket_number.clone().unwrap();

    // Too early.
    let err = h.services.check_in.check_in(&ticket, h.admin).await.unwrap_err();
    assert!(matches!(err, AppError::IllegalState(_)));

    h.clock.advance(Duration::days(3));
    let completed = h.services.check_in.check_in(&ticket, h.admin).await.unwrap();
    assert_eq!(completed.status, RequestStatus::Completed);
    assert_eq!(completed.ticket_number.as_deref(), Some(ticket.as_str()));
    assert!(completed.completed_at.is_some());

    let err = h.services.check_in.check_in(&ticket, h.admin).await.unwrap_err();
    assert!(matches!(err, AppError::IllegalState(_)));
    assert!(matches!(
        h.services.check_in.check_in("LDH20240701999", h.admin).await,
        Err(AppError::NotFound(_))
    ));
}

#[tokio::test]
async fn test_emergency_requests_have_no_tracked_capacity() {
    let h = Harness::new();
    let request = h.submit(Category::Emergency).await;

    let err = h
        .services
        .admission
        .approve(request.id, h.admin, Harness::issue_now())
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::CapacityExceeded { .. }));
    assert_eq!(
        h.services.admission.get(request.id).await.unwrap().status,
        RequestStatus::Pending
    );
}

#[tokio::test]
async fn test_closed_day_blocks_issuance() {
    let h = Harness::new();
    h.services
        .admission
        .configure_capacity(
            visit_day(),
            &ldh_admission_server::models::UpdateCapacity {
                is_operating_day: Some(false),
                ..Default::default()
            },
            h.admin,
        )
        .await
        .unwrap();
    h.approved(Category::Food).await;

    let issued = h
        .services
        .admission
        .batch_issue_tickets(visit_day(), &Category::Food, 0, h.admin)
        .await
        .unwrap();
    assert!(issued.is_empty());
}

#[tokio::test]
async fn test_no_request_ever_pending_with_ticket() {
    let h = Harness::new();
    h.set_food_capacity(2).await;

    for i in 0..6 {
        let request = h.submit(Category::Food).await;
        let _ = match i % 3 {
            0 => h.services.admission.approve(request.id, h.admin, Harness::issue_now()).await,
            1 => h.services.admission.reject(request.id, h.admin, "no").await,
            _ => h.services.admission.approve(request.id, h.admin, ApprovalOptions::default()).await,
        };
    }
    let _ = h
        .services
        .admission
        .batch_issue_tickets(visit_day(), &Category::Food, 0, h.admin)
        .await;

    let all = h.services.admission.list(&Default::default()).await.unwrap();
    assert_eq!(all.len(), 6);
    assert!(all.iter().all(|r| r.ticket_invariant_holds()));
    assert!(all
        .iter()
        .filter(|r| r.status == RequestStatus::Pending)
        .all(|r| r.ticket_number.is_none()));

    let tickets: HashSet<_> = all.iter().filter_map(|r| r.ticket_number.clone()).collect();
    assert_eq!(tickets.len(), 2);

    let capacity = h.services.admission.capacity_for(visit_day()).await.unwrap();
    assert_eq!(capacity.capacity.current_food, 2);
}

#[tokio::test]
async fn test_audit_written_after_each_decision() {
    let h = Harness::new();
    let request = h.submit(Category::Food).await;
    h.services.admission.reject(request.id, h.admin, "incomplete").await.unwrap();

    let entries = h.audit.entries.lock().unwrap().clone();
    let last = entries.last().unwrap();
    assert_eq!(last.action, "reject_request");
    assert_eq!(last.entity_type, "help_request");
    assert_eq!(last.entity_id, request.id.to_string());
    assert_eq!(last.actor_id, h.admin);
}

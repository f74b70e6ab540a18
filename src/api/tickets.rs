//! Ticket endpoints: batch issuance and check-in

use axum::{
    extract::{Path, State},
    Json,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::{Category, HelpRequest},
    AppState,
};

use super::AuthenticatedUser;

/// Batch issuance request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct BatchIssueRequest {
    pub visit_day: NaiveDate,
    #[schema(value_type = String, example = "food")]
    pub category: Category,
    /// Upper bound on tickets to issue; 0 or absent means no bound
    #[validate(range(min = 0, message = "max_tickets cannot be negative"))]
    pub max_tickets: Option<i32>,
}

/// Batch issuance result
#[derive(Debug, Serialize, ToSchema)]
pub struct BatchIssueResponse {
    pub issued: usize,
    pub tickets: Vec<HelpRequest>,
}

/// Issue tickets to approved requests in submission order
#[utoipa::path(
    post,
    path = "/tickets/batch",
    tag = "tickets",
    security(("bearer_auth" = [])),
    request_body = BatchIssueRequest,
    responses(
        (status = 200, description = "Tickets issued (possibly none)", body = BatchIssueResponse),
        (status = 409, description = "Ticket sequence exhausted")
    )
)]
pub async fn batch_issue(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(body): Json<BatchIssueRequest>,
) -> AppResult<Json<BatchIssueResponse>> {
    claims.require_admin()?;
    body.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let tickets = state
        .services
        .admission
        .batch_issue_tickets(body.visit_day, &body.category, body.max_tickets.unwrap_or(0), claims.sub)
        .await?;

    Ok(Json(BatchIssueResponse {
        issued: tickets.len(),
        tickets,
    }))
}

/// Check a ticket holder in on the visit day
#[utoipa::path(
    post,
    path = "/tickets/{ticket_number}/check-in",
    tag = "tickets",
    security(("bearer_auth" = [])),
    params(
        ("ticket_number" = String, Path, description = "Ticket number")
    ),
    responses(
        (status = 200, description = "Visit completed", body = HelpRequest),
        (status = 404, description = "Unknown ticket"),
        (status = 409, description = "Ticket already used or not valid today")
    )
)]
pub async fn check_in(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(ticket_number): Path<String>,
) -> AppResult<Json<HelpRequest>> {
    claims.require_staff()?;

    let request = state.services.check_in.check_in(&ticket_number, claims.sub).await?;
    Ok(Json(request))
}

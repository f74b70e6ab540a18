//! Help request endpoints: intake, review and cancellation

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::{ApprovalOptions, HelpRequest, HelpRequestQuery, NewHelpRequest},
    AppState,
};

use super::AuthenticatedUser;

/// Reject request body
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RejectRequest {
    /// Reason shown to the visitor
    #[validate(length(min = 1, max = 1000, message = "Reason must be 1 to 1000 characters"))]
    pub reason: String,
}

/// Approve request body
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ApproveRequest {
    #[validate(length(max = 2000, message = "Notes are limited to 2000 characters"))]
    pub notes: Option<String>,
    /// Issue the ticket immediately
    pub issue_ticket_now: Option<bool>,
    /// Visit day override (YYYY-MM-DD)
    pub visit_day: Option<chrono::NaiveDate>,
    pub time_slot: Option<String>,
}

/// Submit a new help request
#[utoipa::path(
    post,
    path = "/help-requests",
    tag = "help_requests",
    security(("bearer_auth" = [])),
    request_body = NewHelpRequest,
    responses(
        (status = 201, description = "Request recorded", body = HelpRequest),
        (status = 400, description = "Invalid request")
    )
)]
pub async fn submit_request(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(data): Json<NewHelpRequest>,
) -> AppResult<(StatusCode, Json<HelpRequest>)> {
    claims.require_self_or_admin(data.visitor_id)?;

    let created = state.services.intake.submit(&data).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// List help requests
#[utoipa::path(
    get,
    path = "/help-requests",
    tag = "help_requests",
    security(("bearer_auth" = [])),
    params(HelpRequestQuery),
    responses(
        (status = 200, description = "Matching requests, oldest first", body = Vec<HelpRequest>),
        (status = 403, description = "Admin rights required")
    )
)]
pub async fn list_requests(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Query(query): Query<HelpRequestQuery>,
) -> AppResult<Json<Vec<HelpRequest>>> {
    claims.require_admin()?;

    let requests = state.services.admission.list(&query).await?;
    Ok(Json(requests))
}

/// Get a help request
#[utoipa::path(
    get,
    path = "/help-requests/{id}",
    tag = "help_requests",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Help request ID")
    ),
    responses(
        (status = 200, description = "Help request", body = HelpRequest),
        (status = 404, description = "Request not found")
    )
)]
pub async fn get_request(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<HelpRequest>> {
    let request = state.services.admission.get(id).await?;
    claims.require_self_or_admin(request.visitor_id)?;
    Ok(Json(request))
}

/// Approve a pending help request
#[utoipa::path(
    post,
    path = "/help-requests/{id}/approve",
    tag = "help_requests",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Help request ID")
    ),
    request_body = ApproveRequest,
    responses(
        (status = 200, description = "Request approved", body = HelpRequest),
        (status = 403, description = "Visitor not eligible"),
        (status = 404, description = "Request not found"),
        (status = 409, description = "Wrong status or capacity exhausted")
    )
)]
pub async fn approve_request(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(body): Json<ApproveRequest>,
) -> AppResult<Json<HelpRequest>> {
    claims.require_admin()?;
    body.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let options = ApprovalOptions {
        notes: body.notes,
        issue_ticket_now: body.issue_ticket_now.unwrap_or(false),
        visit_day: body.visit_day,
        time_slot: body.time_slot,
    };

    let request = state.services.admission.approve(id, claims.sub, options).await?;
    Ok(Json(request))
}

/// Reject a pending help request
#[utoipa::path(
    post,
    path = "/help-requests/{id}/reject",
    tag = "help_requests",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Help request ID")
    ),
    request_body = RejectRequest,
    responses(
        (status = 200, description = "Request rejected", body = HelpRequest),
        (status = 404, description = "Request not found"),
        (status = 409, description = "Request is not pending")
    )
)]
pub async fn reject_request(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(body): Json<RejectRequest>,
) -> AppResult<Json<HelpRequest>> {
    claims.require_admin()?;
    body.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let request = state.services.admission.reject(id, claims.sub, &body.reason).await?;
    Ok(Json(request))
}

/// Cancel a help request before its ticket is issued
#[utoipa::path(
    post,
    path = "/help-requests/{id}/cancel",
    tag = "help_requests",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Help request ID")
    ),
    responses(
        (status = 200, description = "Request cancelled", body = HelpRequest),
        (status = 404, description = "Request not found"),
        (status = 409, description = "Request can no longer be cancelled")
    )
)]
pub async fn cancel_request(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<HelpRequest>> {
    let current = state.services.admission.get(id).await?;
    claims.require_self_or_admin(current.visitor_id)?;

    let request = state.services.admission.cancel(id, claims.sub).await?;
    Ok(Json(request))
}

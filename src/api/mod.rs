//! API handlers for the admission REST endpoints

pub mod capacity;
pub mod health;
pub mod help_requests;
pub mod openapi;
pub mod tickets;

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{error::AppError, models::UserClaims, AppState};

/// Extractor for authenticated user from JWT token
pub struct AuthenticatedUser(pub UserClaims);

#[async_trait]
impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| AppError::Authentication("Missing authorization header".to_string()))?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or_else(|| AppError::Authentication("Invalid authorization header format".to_string()))?;

        let claims = UserClaims::from_token(token, &state.config.auth.jwt_secret)
            .map_err(|e| AppError::Authentication(e.to_string()))?;

        Ok(AuthenticatedUser(claims))
    }
}

/// Create the application router with all routes
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_v1 = Router::new()
        // Health check
        .route("/health", get(health::health_check))
        .route("/ready", get(health::readiness_check))
        // Help requests
        .route(
            "/help-requests",
            get(help_requests::list_requests).post(help_requests::submit_request),
        )
        .route("/help-requests/:id", get(help_requests::get_request))
        .route("/help-requests/:id/approve", post(help_requests::approve_request))
        .route("/help-requests/:id/reject", post(help_requests::reject_request))
        .route("/help-requests/:id/cancel", post(help_requests::cancel_request))
        // Tickets
        .route("/tickets/batch", post(tickets::batch_issue))
        .route("/tickets/:ticket_number/check-in", post(tickets::check_in))
        // Capacity
        .route(
            "/capacity/:date",
            get(capacity::get_capacity).put(capacity::update_capacity),
        )
        .with_state(state);

    Router::new()
        .nest("/api/v1", api_v1)
        .merge(openapi::create_openapi_router())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

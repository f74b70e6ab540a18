//! OpenAPI documentation

use axum::Router;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{capacity, health, help_requests, tickets};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "LDH Admission API",
        version = "0.1.0",
        description = "Help request admission and visit ticketing REST API",
        license(name = "AGPL-3.0", url = "https://www.gnu.org/licenses/agpl-3.0.html")
    ),
    servers(
        (url = "/api/v1", description = "API v1")
    ),
    paths(
        // Health
        health::health_check,
        health::readiness_check,
        // Help requests
        help_requests::submit_request,
        help_requests::list_requests,
        help_requests::get_request,
        help_requests::approve_request,
        help_requests::reject_request,
        help_requests::cancel_request,
        // Tickets
        tickets::batch_issue,
        tickets::check_in,
        // Capacity
        capacity::get_capacity,
        capacity::update_capacity,
    ),
    components(
        schemas(
            // Help requests
            crate::models::help_request::HelpRequest,
            crate::models::help_request::NewHelpRequest,
            crate::models::enums::RequestStatus,
            help_requests::ApproveRequest,
            help_requests::RejectRequest,
            // Tickets
            tickets::BatchIssueRequest,
            tickets::BatchIssueResponse,
            // Capacity
            crate::models::visit_capacity::VisitCapacity,
            crate::models::visit_capacity::CapacityView,
            crate::models::visit_capacity::UpdateCapacity,
            // Health
            health::HealthResponse,
            // Errors
            crate::error::ErrorResponse,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "help_requests", description = "Help request intake and review"),
        (name = "tickets", description = "Visit ticket issuance and check-in"),
        (name = "capacity", description = "Daily admission capacity")
    )
)]
pub struct ApiDoc;

/// Create the OpenAPI documentation router
pub fn create_openapi_router() -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}

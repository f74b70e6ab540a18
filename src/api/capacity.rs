//! Visit capacity endpoints

use axum::{
    extract::{Path, State},
    Json,
};
use chrono::NaiveDate;

use crate::{
    error::AppResult,
    models::{CapacityView, UpdateCapacity},
    AppState,
};

use super::AuthenticatedUser;

/// Capacity and availability for a date
#[utoipa::path(
    get,
    path = "/capacity/{date}",
    tag = "capacity",
    security(("bearer_auth" = [])),
    params(
        ("date" = String, Path, description = "Visit day (YYYY-MM-DD)")
    ),
    responses(
        (status = 200, description = "Capacity for the date", body = CapacityView)
    )
)]
pub async fn get_capacity(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(date): Path<NaiveDate>,
) -> AppResult<Json<CapacityView>> {
    claims.require_staff()?;

    let view = state.services.admission.capacity_for(date).await?;
    Ok(Json(view))
}

/// Set ceilings or close a date
#[utoipa::path(
    put,
    path = "/capacity/{date}",
    tag = "capacity",
    security(("bearer_auth" = [])),
    params(
        ("date" = String, Path, description = "Visit day (YYYY-MM-DD)")
    ),
    request_body = UpdateCapacity,
    responses(
        (status = 200, description = "Capacity updated", body = CapacityView),
        (status = 400, description = "Ceiling below issued tickets")
    )
)]
pub async fn update_capacity(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(date): Path<NaiveDate>,
    Json(update): Json<UpdateCapacity>,
) -> AppResult<Json<CapacityView>> {
    claims.require_admin()?;

    let view = state
        .services
        .admission
        .configure_capacity(date, &update, claims.sub)
        .await?;
    Ok(Json(view))
}

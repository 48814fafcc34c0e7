use crate::controller::ApiResponse;
use crate::extractors::{
    authenticated_user::AuthenticatedUser, compare_api_version::CompareApiVersion,
};
use crate::params::ride::{AssignDriverParams, CancelParams, DriverSwapParams};
use crate::{AppState, Error};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use domain::error::Error as DomainError;
use domain::{ride as RideApi, Id};
use service::config::ApiVersion;

use log::*;

/// PUT assign (or replace) the driver on a ride. Admin only; notifies the
/// new driver, any displaced driver, and the rider over their live
/// connections.
#[utoipa::path(
    put,
    path = "/rides/{id}/driver",
    params(
        ApiVersion,
        ("id" = Id, Path, description = "Id of the ride")
    ),
    request_body = AssignDriverParams,
    responses(
        (status = 200, description = "Successfully assigned the driver", body = domain::rides::Model),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Ride or driver not found"),
        (status = 422, description = "User is not a verified driver")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn assign_driver(
    CompareApiVersion(_v): CompareApiVersion,
    AuthenticatedUser(admin): AuthenticatedUser,
    State(app_state): State<AppState>,
    Path(ride_id): Path<Id>,
    Json(params): Json<AssignDriverParams>,
) -> Result<impl IntoResponse, Error> {
    debug!(
        "PUT assign driver {} to Ride {ride_id} by admin {}",
        params.driver_id, admin.sub
    );

    let ride = RideApi::assign_driver(
        app_state.db_conn_ref(),
        &app_state.event_publisher,
        ride_id,
        params.driver_id,
    )
    .await?;

    Ok(Json(ApiResponse::new(StatusCode::OK.into(), ride)))
}

/// PUT cancel a ride. Allowed for the ride's participants and admins;
/// both participants are notified.
#[utoipa::path(
    put,
    path = "/rides/{id}/cancel",
    params(
        ApiVersion,
        ("id" = Id, Path, description = "Id of the ride to cancel")
    ),
    request_body = CancelParams,
    responses(
        (status = 200, description = "Successfully cancelled the ride", body = domain::rides::Model),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Ride not found"),
        (status = 422, description = "Ride is already completed")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn cancel(
    CompareApiVersion(_v): CompareApiVersion,
    AuthenticatedUser(caller): AuthenticatedUser,
    State(app_state): State<AppState>,
    Path(ride_id): Path<Id>,
    Json(params): Json<CancelParams>,
) -> Result<impl IntoResponse, Error> {
    debug!("PUT cancel Ride {ride_id} by user {}", caller.sub);

    let ride = RideApi::find_by_id(app_state.db_conn_ref(), ride_id).await?;
    let is_participant = ride.rider_id == caller.sub || ride.driver_id == Some(caller.sub);
    if !caller.is_admin() && !is_participant {
        debug!("User {} may not cancel ride {ride_id}", caller.sub);
        return Err(DomainError::invalid().into());
    }

    let ride = RideApi::cancel(
        app_state.db_conn_ref(),
        &app_state.event_publisher,
        ride_id,
        params.reason,
    )
    .await?;

    Ok(Json(ApiResponse::new(StatusCode::OK.into(), ride)))
}

/// POST request a different driver for a ride. Rider only; alerts the
/// admin group.
#[utoipa::path(
    post,
    path = "/rides/{id}/driver_swap",
    params(
        ApiVersion,
        ("id" = Id, Path, description = "Id of the ride")
    ),
    request_body = DriverSwapParams,
    responses(
        (status = 200, description = "Swap request recorded"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Ride not found"),
        (status = 422, description = "Caller is not the rider on this ride")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn request_driver_swap(
    CompareApiVersion(_v): CompareApiVersion,
    AuthenticatedUser(caller): AuthenticatedUser,
    State(app_state): State<AppState>,
    Path(ride_id): Path<Id>,
    Json(params): Json<DriverSwapParams>,
) -> Result<impl IntoResponse, Error> {
    debug!("POST driver swap for Ride {ride_id} by user {}", caller.sub);

    RideApi::request_driver_swap(
        app_state.db_conn_ref(),
        &app_state.event_publisher,
        ride_id,
        caller.sub,
        params.reason,
    )
    .await?;

    Ok(Json(ApiResponse::new(
        StatusCode::OK.into(),
        serde_json::json!({ "ride_id": ride_id, "status": "swap_requested" }),
    )))
}

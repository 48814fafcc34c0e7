use crate::controller::ApiResponse;
use crate::extractors::{
    authenticated_user::AuthenticatedUser, compare_api_version::CompareApiVersion,
};
use crate::params::emergency::SosParams;
use crate::{AppState, Error};
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use domain::emergency::{self, SosRequest};
use service::config::ApiVersion;

use log::*;

/// POST an SOS from outside a socket context. Validates the caller
/// against the ride's participants, writes an activity-log record, and
/// fans out the dual-audience emergency broadcast (full detail to the
/// admin group, sanitized notice to the ride room).
#[utoipa::path(
    post,
    path = "/emergency/sos",
    params(ApiVersion),
    request_body = SosParams,
    responses(
        (status = 200, description = "SOS recorded and broadcast"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Ride not found"),
        (status = 422, description = "Caller is not a participant of this ride")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn sos(
    CompareApiVersion(_v): CompareApiVersion,
    AuthenticatedUser(caller): AuthenticatedUser,
    State(app_state): State<AppState>,
    Json(params): Json<SosParams>,
) -> Result<impl IntoResponse, Error> {
    debug!("POST SOS for Ride {} by user {}", params.ride_id, caller.sub);

    let contacts = emergency::trigger_sos(
        app_state.db_conn_ref(),
        &app_state.event_publisher,
        caller.sub,
        &caller.role,
        SosRequest {
            ride_id: params.ride_id,
            lat: params.lat,
            lng: params.lng,
            emergency_type: params.emergency_type,
            message: params.message,
        },
    )
    .await?;

    Ok(Json(ApiResponse::new(
        StatusCode::OK.into(),
        serde_json::json!({
            "acknowledged": true,
            "contacts_notified": contacts.len(),
        }),
    )))
}

use crate::controller::ApiResponse;
use crate::extractors::{
    authenticated_user::AuthenticatedUser, compare_api_version::CompareApiVersion,
};
use crate::params::user::BlockParams;
use crate::{AppState, Error};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use domain::{user as UserApi, Id};
use service::config::ApiVersion;

use log::*;

/// PUT verify a driver's account. Admin only; pushes an `account_update`
/// notification to the driver's live connection if they have one.
#[utoipa::path(
    put,
    path = "/admin/users/{id}/verify",
    params(
        ApiVersion,
        ("id" = Id, Path, description = "Id of the driver to verify")
    ),
    responses(
        (status = 200, description = "Successfully verified the driver", body = domain::users::Model),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "User not found"),
        (status = 422, description = "User is not a driver")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn verify(
    CompareApiVersion(_v): CompareApiVersion,
    AuthenticatedUser(admin): AuthenticatedUser,
    State(app_state): State<AppState>,
    Path(user_id): Path<Id>,
) -> Result<impl IntoResponse, Error> {
    debug!("PUT verify User {user_id} by admin {}", admin.sub);

    let user = UserApi::verify(
        app_state.db_conn_ref(),
        &app_state.event_publisher,
        user_id,
    )
    .await?;

    Ok(Json(ApiResponse::new(StatusCode::OK.into(), user)))
}

/// PUT block a user. Admin only.
#[utoipa::path(
    put,
    path = "/admin/users/{id}/block",
    params(
        ApiVersion,
        ("id" = Id, Path, description = "Id of the user to block")
    ),
    request_body = BlockParams,
    responses(
        (status = 200, description = "Successfully blocked the user", body = domain::users::Model),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "User not found")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn block(
    CompareApiVersion(_v): CompareApiVersion,
    AuthenticatedUser(admin): AuthenticatedUser,
    State(app_state): State<AppState>,
    Path(user_id): Path<Id>,
    Json(params): Json<BlockParams>,
) -> Result<impl IntoResponse, Error> {
    debug!("PUT block User {user_id} by admin {}", admin.sub);

    let user = UserApi::block(
        app_state.db_conn_ref(),
        &app_state.event_publisher,
        user_id,
        params.reason,
    )
    .await?;

    Ok(Json(ApiResponse::new(StatusCode::OK.into(), user)))
}

/// PUT unblock a user. Admin only.
#[utoipa::path(
    put,
    path = "/admin/users/{id}/unblock",
    params(
        ApiVersion,
        ("id" = Id, Path, description = "Id of the user to unblock")
    ),
    responses(
        (status = 200, description = "Successfully unblocked the user", body = domain::users::Model),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "User not found")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn unblock(
    CompareApiVersion(_v): CompareApiVersion,
    AuthenticatedUser(admin): AuthenticatedUser,
    State(app_state): State<AppState>,
    Path(user_id): Path<Id>,
) -> Result<impl IntoResponse, Error> {
    debug!("PUT unblock User {user_id} by admin {}", admin.sub);

    let user = UserApi::unblock(
        app_state.db_conn_ref(),
        &app_state.event_publisher,
        user_id,
    )
    .await?;

    Ok(Json(ApiResponse::new(StatusCode::OK.into(), user)))
}

use crate::controller::health_check_controller;
use crate::middleware::auth::{require_admin, require_auth};
use crate::{params, ws, AppState};
use axum::{
    http::{header, HeaderValue, Method},
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post, put},
    Router,
};
use log::*;
use tower_http::cors::CorsLayer;

use crate::controller::{emergency_controller, ride_controller, user_controller};

use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_rapidoc::RapiDoc;

// This is the global definition of our OpenAPI spec. To be a part
// of the rendered spec, a path and schema must be listed here.
#[derive(OpenApi)]
#[openapi(
        info(
            title = "RideLink Platform API"
        ),
        paths(
            health_check_controller::health_check,
            user_controller::verify,
            user_controller::block,
            user_controller::unblock,
            ride_controller::assign_driver,
            ride_controller::cancel,
            ride_controller::request_driver_swap,
            emergency_controller::sos,
        ),
        components(
            schemas(
                domain::users::Model,
                domain::rides::Model,
                domain::emergency_contacts::Model,
                domain::activity_logs::Model,
                domain::role::Role,
                domain::ride_status::RideStatus,
                params::user::BlockParams,
                params::ride::AssignDriverParams,
                params::ride::CancelParams,
                params::ride::DriverSwapParams,
                params::emergency::SosParams,
            )
        ),
        modifiers(&SecurityAddon),
        tags(
            (name = "ridelink_platform", description = "RideLink ride-hailing API")
        )
    )]
struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            )
        }
    }
}

pub fn define_routes(app_state: AppState) -> Router {
    Router::new()
        .merge(health_routes())
        .merge(admin_user_routes(app_state.clone()))
        .merge(ride_admin_routes(app_state.clone()))
        .merge(ride_routes(app_state.clone()))
        .merge(emergency_routes(app_state.clone()))
        .merge(realtime_routes(app_state.clone()))
        .merge(RapiDoc::with_openapi("/api-docs/openapi.json", ApiDoc::openapi()).path("/rapidoc"))
        .layer(cors_layer(&app_state))
}

fn health_routes() -> Router {
    Router::new().route("/health", get(health_check_controller::health_check))
}

fn admin_user_routes(app_state: AppState) -> Router {
    Router::new()
        .route("/admin/users/:id/verify", put(user_controller::verify))
        .route("/admin/users/:id/block", put(user_controller::block))
        .route("/admin/users/:id/unblock", put(user_controller::unblock))
        .route_layer(from_fn(require_admin))
        .route_layer(from_fn_with_state(app_state.clone(), require_auth))
        .with_state(app_state)
}

fn ride_admin_routes(app_state: AppState) -> Router {
    Router::new()
        .route("/rides/:id/driver", put(ride_controller::assign_driver))
        .route_layer(from_fn(require_admin))
        .route_layer(from_fn_with_state(app_state.clone(), require_auth))
        .with_state(app_state)
}

fn ride_routes(app_state: AppState) -> Router {
    Router::new()
        .route("/rides/:id/cancel", put(ride_controller::cancel))
        .route(
            "/rides/:id/driver_swap",
            post(ride_controller::request_driver_swap),
        )
        .route_layer(from_fn_with_state(app_state.clone(), require_auth))
        .with_state(app_state)
}

fn emergency_routes(app_state: AppState) -> Router {
    Router::new()
        .route("/emergency/sos", post(emergency_controller::sos))
        .route_layer(from_fn_with_state(app_state.clone(), require_auth))
        .with_state(app_state)
}

fn realtime_routes(app_state: AppState) -> Router {
    Router::new()
        .route("/ws", get(ws::handler::ws_handler))
        .with_state(app_state)
}

fn cors_layer(app_state: &AppState) -> CorsLayer {
    let origins: Vec<HeaderValue> = app_state
        .config
        .allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(origin) => Some(origin),
            Err(_) => {
                warn!("Skipping unparseable CORS origin: {origin}");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_credentials(true)
}

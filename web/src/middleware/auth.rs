use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use domain::jwt::{self, Claims};
use log::*;
use service::AppState;

/// Authentication middleware that verifies the bearer token and stashes
/// its claims in the request extensions for extractors and later
/// middleware. Returns 401 Unauthorized for missing or invalid tokens;
/// API endpoints get proper status codes, never redirects.
pub async fn require_auth(
    State(app_state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let token = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "));

    let Some(token) = token else {
        return (StatusCode::UNAUTHORIZED, "Unauthorized").into_response();
    };

    match jwt::verify_token(app_state.config.jwt_secret(), token) {
        Ok(claims) => {
            request.extensions_mut().insert(claims);
            next.run(request).await
        }
        Err(e) => {
            debug!("Rejecting request with invalid bearer token: {e}");
            (StatusCode::UNAUTHORIZED, "Unauthorized").into_response()
        }
    }
}

/// Authorization middleware for admin-only routes. Must run after
/// `require_auth`, which provides the claims.
pub async fn require_admin(request: Request, next: Next) -> Response {
    match request.extensions().get::<Claims>() {
        Some(claims) if claims.is_admin() => next.run(request).await,
        Some(claims) => {
            debug!("User {} is not an admin", claims.sub);
            (StatusCode::FORBIDDEN, "Forbidden").into_response()
        }
        None => (StatusCode::UNAUTHORIZED, "Unauthorized").into_response(),
    }
}

#[cfg(test)]
#[cfg(feature = "mock")]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
        middleware::from_fn_with_state,
        routing::get,
        Router,
    };
    use events::EventPublisher;
    use service::config::Config;
    use std::sync::Arc;
    use tower::ServiceExt;

    async fn test_handler() -> &'static str {
        "authenticated"
    }

    fn test_state() -> AppState {
        let config = Config::default();
        let db = Arc::new(
            sea_orm::MockDatabase::new(sea_orm::DatabaseBackend::Postgres).into_connection(),
        );
        AppState::new(config, &db, EventPublisher::new(), None)
    }

    fn test_app(app_state: AppState) -> Router {
        Router::new()
            .route("/test", get(test_handler))
            .route_layer(from_fn_with_state(app_state.clone(), require_auth))
            .with_state(app_state)
    }

    #[tokio::test]
    async fn missing_bearer_token_is_unauthorized() {
        let app = test_app(test_state());

        let request = Request::builder().uri("/test").body(Body::empty()).unwrap();
        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn garbage_bearer_token_is_unauthorized() {
        let app = test_app(test_state());

        let request = Request::builder()
            .uri("/test")
            .header("Authorization", "Bearer not-a-jwt")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn valid_bearer_token_passes_through() {
        let app_state = test_state();
        let token =
            domain::jwt::generate_token(app_state.config.jwt_secret(), 7, "rider", 60).unwrap();
        let app = test_app(app_state);

        let request = Request::builder()
            .uri("/test")
            .header("Authorization", format!("Bearer {token}"))
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }
}

use crate::extractors::RejectionType;
use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
};
use semver::Version;

static X_VERSION: &str = "x-version";

/// Validates the x-version request header against the API versions this
/// build exposes.
pub(crate) struct CompareApiVersion(pub Version);

#[async_trait]
impl<S> FromRequestParts<S> for CompareApiVersion
where
    S: Send + Sync,
{
    type Rejection = RejectionType;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(X_VERSION)
            .ok_or((StatusCode::BAD_REQUEST, "Missing x-version header".to_string()))?;

        let version = header
            .to_str()
            .ok()
            .and_then(|value| Version::parse(value).ok())
            .ok_or((StatusCode::BAD_REQUEST, "Invalid x-version header".to_string()))?;

        let supported = service::config::supported_versions()
            .iter()
            .any(|candidate| *candidate == version.to_string());
        if !supported {
            return Err((
                StatusCode::BAD_REQUEST,
                format!("Unsupported API version {version}"),
            ));
        }

        Ok(CompareApiVersion(version))
    }
}

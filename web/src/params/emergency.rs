use domain::Id;
use serde::Deserialize;
use utoipa::ToSchema;

/// Body of an SOS request.
#[derive(Debug, Deserialize, ToSchema)]
pub(crate) struct SosParams {
    pub ride_id: Id,
    pub lat: f64,
    pub lng: f64,
    /// e.g. "accident", "harassment", "medical"
    pub emergency_type: String,
    pub message: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_a_full_request() {
        let params: SosParams = serde_json::from_str(
            r#"{"ride_id":42,"lat":6.52,"lng":3.37,"emergency_type":"accident","message":"rear-ended"}"#,
        )
        .unwrap();
        assert_eq!(params.ride_id, 42);
        assert_eq!(params.emergency_type, "accident");
        assert_eq!(params.message.as_deref(), Some("rear-ended"));
    }

    #[test]
    fn location_fields_are_required() {
        assert!(serde_json::from_str::<SosParams>(
            r#"{"ride_id":42,"emergency_type":"accident"}"#
        )
        .is_err());
    }
}

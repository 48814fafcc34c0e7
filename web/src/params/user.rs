use serde::Deserialize;
use utoipa::ToSchema;

/// Body of an admin block request.
#[derive(Debug, Deserialize, ToSchema)]
pub(crate) struct BlockParams {
    /// Shown to the blocked user in their notification
    pub reason: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reason_is_optional() {
        let params: BlockParams = serde_json::from_str("{}").unwrap();
        assert!(params.reason.is_none());

        let params: BlockParams =
            serde_json::from_str(r#"{"reason":"fraudulent activity"}"#).unwrap();
        assert_eq!(params.reason.as_deref(), Some("fraudulent activity"));
    }
}

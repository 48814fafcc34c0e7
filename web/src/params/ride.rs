use domain::Id;
use serde::Deserialize;
use utoipa::ToSchema;

/// Body of an admin driver-assignment request.
#[derive(Debug, Deserialize, ToSchema)]
pub(crate) struct AssignDriverParams {
    pub driver_id: Id,
}

/// Body of a ride cancellation request.
#[derive(Debug, Deserialize, ToSchema)]
pub(crate) struct CancelParams {
    pub reason: Option<String>,
}

/// Body of a rider's driver-swap request.
#[derive(Debug, Deserialize, ToSchema)]
pub(crate) struct DriverSwapParams {
    pub reason: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assign_driver_requires_a_driver_id() {
        assert!(serde_json::from_str::<AssignDriverParams>("{}").is_err());

        let params: AssignDriverParams = serde_json::from_str(r#"{"driver_id":9}"#).unwrap();
        assert_eq!(params.driver_id, 9);
    }
}

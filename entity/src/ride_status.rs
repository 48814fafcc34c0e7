use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Status of a ride through its lifecycle.
#[derive(
    Debug, Clone, Copy, Eq, PartialEq, EnumIter, Deserialize, Default, Serialize, DeriveActiveEnum, ToSchema,
)]
#[serde(rename_all = "snake_case")]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "ride_status")]
pub enum RideStatus {
    /// Rider has requested the trip but no driver has taken it yet
    #[sea_orm(string_value = "requested")]
    #[default]
    Requested,
    /// A driver accepted the request
    #[sea_orm(string_value = "accepted")]
    Accepted,
    /// Driver has picked up the rider
    #[sea_orm(string_value = "in_progress")]
    InProgress,
    /// Trip finished normally
    #[sea_orm(string_value = "completed")]
    Completed,
    /// Trip was cancelled by either party or an admin
    #[sea_orm(string_value = "cancelled")]
    Cancelled,
}

impl std::fmt::Display for RideStatus {
    fn fmt(&self, fmt: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RideStatus::Requested => write!(fmt, "requested"),
            RideStatus::Accepted => write!(fmt, "accepted"),
            RideStatus::InProgress => write!(fmt, "in_progress"),
            RideStatus::Completed => write!(fmt, "completed"),
            RideStatus::Cancelled => write!(fmt, "cancelled"),
        }
    }
}

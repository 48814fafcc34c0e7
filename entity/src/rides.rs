//! SeaORM Entity for the rides table.

use crate::ride_status::RideStatus;
use crate::Id;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[schema(as = entity::rides::Model)]
#[sea_orm(schema_name = "ridelink", table_name = "rides")]
pub struct Model {
    #[serde(skip_deserializing)]
    #[sea_orm(primary_key)]
    pub id: Id,

    pub rider_id: Id,

    /// Unset until a driver accepts or an admin assigns one
    pub driver_id: Option<Id>,

    pub pickup_address: String,

    pub dropoff_address: String,

    pub pickup_lat: f64,

    pub pickup_lng: f64,

    pub dropoff_lat: f64,

    pub dropoff_lng: f64,

    pub status: RideStatus,

    /// Agreed fare, set once negotiation concludes
    pub fare: Option<f64>,

    #[serde(skip_deserializing)]
    #[schema(value_type = String, format = DateTime)]
    pub created_at: DateTimeWithTimeZone,

    #[serde(skip_deserializing)]
    #[schema(value_type = String, format = DateTime)]
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::RiderId",
        to = "super::users::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Rider,
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::DriverId",
        to = "super::users::Column::Id",
        on_update = "NoAction",
        on_delete = "SetNull"
    )]
    Driver,
}

impl ActiveModelBehavior for ActiveModel {}

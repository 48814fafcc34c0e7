//! SeaORM Entity for the activity_logs table.
//! Append-only audit records written by admin actions and emergency SOS.

use crate::Id;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[schema(as = entity::activity_logs::Model)]
#[sea_orm(schema_name = "ridelink", table_name = "activity_logs")]
pub struct Model {
    #[serde(skip_deserializing)]
    #[sea_orm(primary_key)]
    pub id: Id,

    pub user_id: Id,

    pub ride_id: Option<Id>,

    /// Machine-readable action name, e.g. "emergency_sos"
    pub action: String,

    /// Free-form context for the action
    #[schema(value_type = Option<Object>)]
    pub details: Option<Json>,

    #[serde(skip_deserializing)]
    #[schema(value_type = String, format = DateTime)]
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::UserId",
        to = "super::users::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    User,
    #[sea_orm(
        belongs_to = "super::rides::Entity",
        from = "Column::RideId",
        to = "super::rides::Column::Id",
        on_update = "NoAction",
        on_delete = "SetNull"
    )]
    Ride,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl Related<super::rides::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Ride.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

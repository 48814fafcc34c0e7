//! Append operations for the activity_logs table.

use super::error::Error;
use entity::activity_logs::{ActiveModel, Model};
use entity::Id;
use log::*;
use sea_orm::{ActiveModelTrait, ActiveValue::Set, DatabaseConnection, TryIntoModel};

pub async fn create(
    db: &DatabaseConnection,
    user_id: Id,
    ride_id: Option<Id>,
    action: &str,
    details: Option<serde_json::Value>,
) -> Result<Model, Error> {
    debug!("Recording activity '{action}' for user {user_id}");

    let active_model = ActiveModel {
        user_id: Set(user_id),
        ride_id: Set(ride_id),
        action: Set(action.to_string()),
        details: Set(details),
        created_at: Set(chrono::Utc::now().into()),
        ..Default::default()
    };

    Ok(active_model.save(db).await?.try_into_model()?)
}

//! CRUD operations for the rides table.

use super::error::{EntityApiErrorKind, Error};
use entity::ride_status::RideStatus;
use entity::rides::{ActiveModel, Entity, Model};
use entity::Id;
use log::*;
use sea_orm::{
    entity::prelude::*,
    ActiveValue::{Set, Unchanged},
    DatabaseConnection, TryIntoModel,
};

pub async fn find_by_id(db: &DatabaseConnection, ride_id: Id) -> Result<Model, Error> {
    match Entity::find_by_id(ride_id).one(db).await? {
        Some(ride) => Ok(ride),
        None => {
            debug!("Ride with id {ride_id} not found");
            Err(Error {
                source: None,
                error_kind: EntityApiErrorKind::RecordNotFound,
            })
        }
    }
}

pub async fn update_status(
    db: &DatabaseConnection,
    ride_id: Id,
    status: RideStatus,
) -> Result<Model, Error> {
    let existing = find_by_id(db, ride_id).await?;

    debug!("Updating ride {ride_id} status to {status}");

    let active_model = unchanged(&existing);
    let active_model = ActiveModel {
        status: Set(status),
        updated_at: Set(chrono::Utc::now().into()),
        ..active_model
    };

    Ok(active_model.update(db).await?.try_into_model()?)
}

/// Assigns (or replaces) the driver on a ride. Also moves a freshly
/// requested ride into the accepted state.
pub async fn update_driver(
    db: &DatabaseConnection,
    ride_id: Id,
    driver_id: Id,
) -> Result<Model, Error> {
    let existing = find_by_id(db, ride_id).await?;

    debug!("Assigning driver {driver_id} to ride {ride_id}");

    let status = match existing.status {
        RideStatus::Requested => RideStatus::Accepted,
        other => other,
    };

    let active_model = unchanged(&existing);
    let active_model = ActiveModel {
        driver_id: Set(Some(driver_id)),
        status: Set(status),
        updated_at: Set(chrono::Utc::now().into()),
        ..active_model
    };

    Ok(active_model.update(db).await?.try_into_model()?)
}

fn unchanged(existing: &Model) -> ActiveModel {
    ActiveModel {
        id: Unchanged(existing.id),
        rider_id: Unchanged(existing.rider_id),
        driver_id: Unchanged(existing.driver_id),
        pickup_address: Unchanged(existing.pickup_address.clone()),
        dropoff_address: Unchanged(existing.dropoff_address.clone()),
        pickup_lat: Unchanged(existing.pickup_lat),
        pickup_lng: Unchanged(existing.pickup_lng),
        dropoff_lat: Unchanged(existing.dropoff_lat),
        dropoff_lng: Unchanged(existing.dropoff_lng),
        status: Unchanged(existing.status),
        fare: Unchanged(existing.fare),
        created_at: Unchanged(existing.created_at),
        updated_at: Unchanged(existing.updated_at),
    }
}

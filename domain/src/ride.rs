//! Ride operations that originate real-time notifications: driver
//! assignment and replacement, cancellation, and rider-initiated driver
//! swap requests.

use crate::error::Error;
use crate::{rides, Id};
use entity::ride_status::RideStatus;
use entity::role::Role;
use events::{DomainEvent, EventPublisher};
use log::*;
use sea_orm::DatabaseConnection;

pub use entity_api::ride::find_by_id;

/// Assigns a driver to a ride, replacing any current driver. The new
/// driver must be a verified driver account.
pub async fn assign_driver(
    db: &DatabaseConnection,
    publisher: &EventPublisher,
    ride_id: Id,
    driver_id: Id,
) -> Result<rides::Model, Error> {
    let driver = entity_api::user::find_by_id(db, driver_id).await?;
    if driver.role != Role::Driver || !driver.verified {
        debug!("Refusing to assign unverified or non-driver user {driver_id} to ride {ride_id}");
        return Err(Error::invalid());
    }

    let ride = entity_api::ride::find_by_id(db, ride_id).await?;
    let previous_driver_id = ride.driver_id.filter(|previous| *previous != driver_id);

    let updated = entity_api::ride::update_driver(db, ride_id, driver_id).await?;
    info!("Driver {driver_id} assigned to ride {ride_id}");

    publisher
        .publish(DomainEvent::DriverAssigned {
            ride_id,
            driver_id,
            rider_id: updated.rider_id,
            previous_driver_id,
        })
        .await;

    Ok(updated)
}

/// Cancels a ride and notifies both participants. Completed rides cannot
/// be cancelled.
pub async fn cancel(
    db: &DatabaseConnection,
    publisher: &EventPublisher,
    ride_id: Id,
    reason: Option<String>,
) -> Result<rides::Model, Error> {
    let ride = entity_api::ride::find_by_id(db, ride_id).await?;
    if ride.status == RideStatus::Completed {
        debug!("Refusing to cancel completed ride {ride_id}");
        return Err(Error::invalid());
    }

    let updated = entity_api::ride::update_status(db, ride_id, RideStatus::Cancelled).await?;
    info!("Ride {ride_id} cancelled");

    let mut notify_user_ids = vec![updated.rider_id];
    if let Some(driver_id) = updated.driver_id {
        notify_user_ids.push(driver_id);
    }

    publisher
        .publish(DomainEvent::RideCancelled {
            ride_id,
            reason,
            notify_user_ids,
        })
        .await;

    Ok(updated)
}

/// Records a rider's request for a different driver and alerts the admin
/// group. Only the ride's own rider may request a swap.
pub async fn request_driver_swap(
    db: &DatabaseConnection,
    publisher: &EventPublisher,
    ride_id: Id,
    rider_id: Id,
    reason: Option<String>,
) -> Result<(), Error> {
    let ride = entity_api::ride::find_by_id(db, ride_id).await?;
    if ride.rider_id != rider_id {
        debug!("User {rider_id} is not the rider on ride {ride_id}");
        return Err(Error::invalid());
    }

    entity_api::activity_log::create(
        db,
        rider_id,
        Some(ride_id),
        "driver_swap_requested",
        reason
            .as_ref()
            .map(|reason| serde_json::json!({ "reason": reason })),
    )
    .await?;

    publisher
        .publish(DomainEvent::DriverSwapRequested {
            ride_id,
            rider_id,
            reason,
        })
        .await;

    Ok(())
}

//! Emergency SOS outside a socket context. Validates the caller against
//! the ride's participants, records the alert, gathers the user's
//! emergency contacts, and publishes the event that drives the
//! dual-audience broadcast (full detail to admins, sanitized notice to the
//! ride room).

use crate::error::Error;
use crate::{emergency_contacts, Id};
use events::{DomainEvent, EventPublisher};
use log::*;
use sea_orm::DatabaseConnection;
use serde_json::json;

pub struct SosRequest {
    pub ride_id: Id,
    pub lat: f64,
    pub lng: f64,
    pub emergency_type: String,
    pub message: Option<String>,
}

/// Triggers an SOS for `user_id`. Returns the emergency contacts on file
/// so the caller can surface who is being notified.
pub async fn trigger_sos(
    db: &DatabaseConnection,
    publisher: &EventPublisher,
    user_id: Id,
    role: &str,
    request: SosRequest,
) -> Result<Vec<emergency_contacts::Model>, Error> {
    let ride = entity_api::ride::find_by_id(db, request.ride_id).await?;

    let is_participant = ride.rider_id == user_id || ride.driver_id == Some(user_id);
    if !is_participant {
        debug!("User {user_id} is not a participant of ride {}", request.ride_id);
        return Err(Error::invalid());
    }

    let contacts = entity_api::emergency_contact::find_by_user_id(db, user_id).await?;

    entity_api::activity_log::create(
        db,
        user_id,
        Some(request.ride_id),
        "emergency_sos",
        Some(json!({
            "emergency_type": request.emergency_type,
            "location": { "lat": request.lat, "lng": request.lng },
            "contacts_on_file": contacts.len(),
        })),
    )
    .await?;

    warn!(
        "SOS ({}) from user {user_id} on ride {}",
        request.emergency_type, request.ride_id
    );

    publisher
        .publish(DomainEvent::EmergencySos {
            ride_id: request.ride_id,
            user_id,
            role: role.to_string(),
            lat: request.lat,
            lng: request.lng,
            emergency_type: request.emergency_type,
            message: request.message,
        })
        .await;

    Ok(contacts)
}

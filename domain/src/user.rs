//! Admin-originated account operations. Each one mutates the user record
//! and publishes a domain event; the real-time layer turns the event into
//! an `account_update` notification on the user's personal channel.

use crate::error::Error;
use crate::{users, Id};
use entity::role::Role;
use events::{DomainEvent, EventPublisher};
use log::*;
use sea_orm::DatabaseConnection;

pub use entity_api::user::find_by_id;

/// Marks a driver as verified. Verifying a non-driver account is rejected.
pub async fn verify(
    db: &DatabaseConnection,
    publisher: &EventPublisher,
    user_id: Id,
) -> Result<users::Model, Error> {
    let user = entity_api::user::find_by_id(db, user_id).await?;
    if user.role != Role::Driver {
        debug!("Refusing to verify non-driver user {user_id}");
        return Err(Error::invalid());
    }

    let updated = entity_api::user::set_verified(db, user_id, true).await?;
    info!("User {user_id} verified");

    publisher.publish(DomainEvent::UserVerified { user_id }).await;

    Ok(updated)
}

pub async fn block(
    db: &DatabaseConnection,
    publisher: &EventPublisher,
    user_id: Id,
    reason: Option<String>,
) -> Result<users::Model, Error> {
    let updated = entity_api::user::set_blocked(db, user_id, true).await?;
    info!("User {user_id} blocked");

    publisher
        .publish(DomainEvent::UserBlocked { user_id, reason })
        .await;

    Ok(updated)
}

pub async fn unblock(
    db: &DatabaseConnection,
    publisher: &EventPublisher,
    user_id: Id,
) -> Result<users::Model, Error> {
    let updated = entity_api::user::set_blocked(db, user_id, false).await?;
    info!("User {user_id} unblocked");

    publisher.publish(DomainEvent::UserUnblocked { user_id }).await;

    Ok(updated)
}

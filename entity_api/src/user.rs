//! CRUD operations for the users table.

use super::error::{EntityApiErrorKind, Error};
use entity::users::{ActiveModel, Entity, Model};
use entity::Id;
use log::*;
use sea_orm::{
    entity::prelude::*,
    ActiveValue::{Set, Unchanged},
    DatabaseConnection, TryIntoModel,
};

pub async fn find_by_id(db: &DatabaseConnection, user_id: Id) -> Result<Model, Error> {
    match Entity::find_by_id(user_id).one(db).await? {
        Some(user) => Ok(user),
        None => {
            debug!("User with id {user_id} not found");
            Err(Error {
                source: None,
                error_kind: EntityApiErrorKind::RecordNotFound,
            })
        }
    }
}

/// Flips the admin-controlled verification flag on a user record.
pub async fn set_verified(
    db: &DatabaseConnection,
    user_id: Id,
    verified: bool,
) -> Result<Model, Error> {
    let existing = find_by_id(db, user_id).await?;

    debug!("Setting verified = {verified} for user {user_id}");

    let active_model = ActiveModel {
        id: Unchanged(existing.id),
        name: Unchanged(existing.name),
        email: Unchanged(existing.email),
        phone: Unchanged(existing.phone),
        role: Unchanged(existing.role),
        verified: Set(verified),
        blocked: Unchanged(existing.blocked),
        created_at: Unchanged(existing.created_at),
        updated_at: Set(chrono::Utc::now().into()),
    };

    Ok(active_model.update(db).await?.try_into_model()?)
}

/// Flips the admin-controlled block flag on a user record.
pub async fn set_blocked(
    db: &DatabaseConnection,
    user_id: Id,
    blocked: bool,
) -> Result<Model, Error> {
    let existing = find_by_id(db, user_id).await?;

    debug!("Setting blocked = {blocked} for user {user_id}");

    let active_model = ActiveModel {
        id: Unchanged(existing.id),
        name: Unchanged(existing.name),
        email: Unchanged(existing.email),
        phone: Unchanged(existing.phone),
        role: Unchanged(existing.role),
        verified: Unchanged(existing.verified),
        blocked: Set(blocked),
        created_at: Unchanged(existing.created_at),
        updated_at: Set(chrono::Utc::now().into()),
    };

    Ok(active_model.update(db).await?.try_into_model()?)
}

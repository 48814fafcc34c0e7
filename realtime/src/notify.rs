use crate::manager::Manager;
use crate::message::{ServerEvent, UserId};
use log::*;

/// Where a notification should land.
#[derive(Debug, Clone)]
pub enum EmitTarget {
    /// A user's live connection, looked up through the registry.
    User(UserId),
    /// A named broadcast room (a ride room, a role group, the admin group).
    Room(String),
}

/// Defensive fan-out used by REST-side collaborators (admin actions, the
/// emergency SOS controller) that must not care whether the real-time layer
/// is running.
///
/// Returns `true` on apparent success. Returns `false` and logs a warning
/// when the real-time layer is not initialized; returns `false` without a
/// warning when the target user simply has no live connection (recipient
/// offline is a best-effort miss, not an error). Never panics.
pub fn safe_emit(manager: Option<&Manager>, target: &EmitTarget, event: &ServerEvent) -> bool {
    let Some(manager) = manager else {
        warn!("Dropping notification: real-time layer is not running");
        return false;
    };

    match target {
        EmitTarget::User(user_id) => manager.emit_to_user(*user_id, event),
        EmitTarget::Room(room) => {
            // Emitting to an empty room is still a successful emission.
            manager.emit_to_room(room, event);
            true
        }
    }
}

use crate::connection::ConnectionId;
use crate::message::{RideId, UserId};
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

/// Group joined by every authenticated driver connection.
pub const DRIVERS_GROUP: &str = "drivers";

/// Group joined by every authenticated rider connection.
pub const RIDERS_GROUP: &str = "riders";

/// Group for cross-cutting broadcasts: emergency alerts, driver-swap
/// requests. Joined by authenticated admin connections.
pub const ADMIN_GROUP: &str = "admin";

/// The broadcast room for one ride's lifecycle events.
pub fn ride_room(ride_id: RideId) -> String {
    format!("ride_{ride_id}")
}

/// A user's personal channel, used for targeted notifications.
pub fn user_room(user_id: UserId) -> String {
    format!("user_{user_id}")
}

#[derive(Default)]
struct RoomsInner {
    /// room name -> member connections
    rooms: HashMap<String, HashSet<ConnectionId>>,
    /// connection -> rooms it joined, for disconnect cleanup
    memberships: HashMap<ConnectionId, HashSet<String>>,
}

/// Membership table for broadcast groups.
///
/// The transport (a plain WebSocket) has no native group-addressing
/// primitive, so the join/leave/disconnect-cleanup bookkeeping lives here.
/// Join is idempotent, leave is a no-op for non-members, and both indices
/// are kept consistent under one lock.
pub struct RoomDirectory {
    inner: Mutex<RoomsInner>,
}

impl RoomDirectory {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(RoomsInner::default()),
        }
    }

    pub fn join(&self, room: &str, connection_id: &ConnectionId) {
        let mut inner = self.inner.lock().expect("room directory lock poisoned");
        inner
            .rooms
            .entry(room.to_string())
            .or_default()
            .insert(connection_id.clone());
        inner
            .memberships
            .entry(connection_id.clone())
            .or_default()
            .insert(room.to_string());
    }

    pub fn leave(&self, room: &str, connection_id: &ConnectionId) {
        let mut inner = self.inner.lock().expect("room directory lock poisoned");

        if let Some(members) = inner.rooms.get_mut(room) {
            members.remove(connection_id);
            if members.is_empty() {
                inner.rooms.remove(room);
            }
        }
        if let Some(rooms) = inner.memberships.get_mut(connection_id) {
            rooms.remove(room);
            if rooms.is_empty() {
                inner.memberships.remove(connection_id);
            }
        }
    }

    /// Drops the connection from every room it joined. Called on
    /// disconnect; a no-op for connections that never joined anything.
    pub fn leave_all(&self, connection_id: &ConnectionId) {
        let mut inner = self.inner.lock().expect("room directory lock poisoned");

        let Some(rooms) = inner.memberships.remove(connection_id) else {
            return;
        };
        for room in rooms {
            if let Some(members) = inner.rooms.get_mut(&room) {
                members.remove(connection_id);
                if members.is_empty() {
                    inner.rooms.remove(&room);
                }
            }
        }
    }

    pub fn members(&self, room: &str) -> Vec<ConnectionId> {
        let inner = self.inner.lock().expect("room directory lock poisoned");
        inner
            .rooms
            .get(room)
            .map(|members| members.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub fn contains(&self, room: &str, connection_id: &ConnectionId) -> bool {
        let inner = self.inner.lock().expect("room directory lock poisoned");
        inner
            .rooms
            .get(room)
            .map(|members| members.contains(connection_id))
            .unwrap_or(false)
    }
}

impl Default for RoomDirectory {
    fn default() -> Self {
        Self::new()
    }
}

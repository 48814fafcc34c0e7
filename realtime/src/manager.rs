use crate::connection::{ConnectionHandle, ConnectionId, ConnectionRegistry};
use crate::message::{Coordinates, EventType, RideId, Role, ServerEvent, UserId};
use crate::room::{ride_room, user_room, RoomDirectory, ADMIN_GROUP, DRIVERS_GROUP, RIDERS_GROUP};
use axum::extract::ws::Message;
use chrono::Utc;
use dashmap::DashMap;
use log::*;
use serde_json::json;
use tokio::sync::mpsc::UnboundedSender;

/// Sanitized text broadcast to the ride room when an emergency alert
/// fires; the identifying detail goes to the admin group only.
pub const EMERGENCY_ROOM_NOTICE: &str = "Emergency alert received. Help is on the way.";

/// The owned service object for the real-time layer.
///
/// Holds the three pieces of shared state: the flat table of live
/// connections (authenticated or not), the user ↔ connection registry, and
/// the room membership table. One instance is constructed at startup and
/// injected into the transport and the REST side; tests construct their own.
pub struct Manager {
    registry: ConnectionRegistry,
    rooms: RoomDirectory,
    /// Every open socket, keyed by connection id. Entries live from
    /// `open_connection` to `close_connection` regardless of
    /// authentication state.
    connections: DashMap<ConnectionId, ConnectionHandle>,
}

impl Manager {
    pub fn new() -> Self {
        Self {
            registry: ConnectionRegistry::new(),
            rooms: RoomDirectory::new(),
            connections: DashMap::new(),
        }
    }

    /// Registry access for targeted lookups and introspection.
    pub fn registry(&self) -> &ConnectionRegistry {
        &self.registry
    }

    /// Admits a new socket. The returned handle is what the transport actor
    /// and the session router hold on to.
    pub fn open_connection(&self, sender: UnboundedSender<Message>) -> ConnectionHandle {
        let handle = ConnectionHandle::new(sender);
        self.connections.insert(handle.id().clone(), handle.clone());
        debug!("Connection {} opened", handle.id());
        handle
    }

    /// Final cleanup for a socket: drops it from the live table, from every
    /// room, and from the registry. Idempotent; returns the user that was
    /// authenticated on it, if any.
    pub fn close_connection(&self, connection_id: &ConnectionId) -> Option<UserId> {
        self.connections.remove(connection_id);
        self.rooms.leave_all(connection_id);
        let user_id = self.registry.unregister_by_connection(connection_id);
        match user_id {
            Some(user_id) => debug!("Connection {connection_id} closed (user {user_id})"),
            None => debug!("Connection {connection_id} closed (unauthenticated)"),
        }
        user_id
    }

    /// Binds a connection to a user identity and joins its personal channel
    /// and role group. Re-authentication overwrites; a different connection
    /// previously bound to this user is asked to close rather than left
    /// dangling with no personal-channel delivery.
    pub fn authenticate(&self, user_id: UserId, role: Role, handle: &ConnectionHandle) {
        if let Some(superseded) = self.registry.register(user_id, handle.clone()) {
            info!(
                "User {user_id} authenticated on connection {}; closing superseded connection {}",
                handle.id(),
                superseded.id()
            );
            superseded.close();
        }

        self.rooms.join(&user_room(user_id), handle.id());
        let group = match role {
            Role::Rider => RIDERS_GROUP,
            Role::Driver => DRIVERS_GROUP,
            Role::Admin => ADMIN_GROUP,
        };
        self.rooms.join(group, handle.id());

        info!("User {user_id} authenticated as {role:?} on connection {}", handle.id());
    }

    /// Adds a connection to a ride's broadcast room. Idempotent; no
    /// ownership check against the ride's actual participants is performed.
    pub fn join_ride(&self, connection_id: &ConnectionId, ride_id: RideId) {
        self.rooms.join(&ride_room(ride_id), connection_id);
        debug!("Connection {connection_id} joined ride room {ride_id}");
    }

    /// Removes a connection from a ride's broadcast room. No-op for
    /// non-members.
    pub fn leave_ride(&self, connection_id: &ConnectionId, ride_id: RideId) {
        self.rooms.leave(&ride_room(ride_id), connection_id);
        debug!("Connection {connection_id} left ride room {ride_id}");
    }

    pub fn is_room_member(&self, room: &str, connection_id: &ConnectionId) -> bool {
        self.rooms.contains(room, connection_id)
    }

    /// Fans an event out to every current member of a room. Returns how
    /// many connections accepted the frame; zero is not an error (empty
    /// rooms are normal).
    pub fn emit_to_room(&self, room: &str, event: &ServerEvent) -> usize {
        let Some(frame) = frame(event) else {
            return 0;
        };

        let mut delivered = 0;
        for member in self.rooms.members(room) {
            if let Some(handle) = self.connections.get(&member) {
                if handle.send(frame.clone()) {
                    delivered += 1;
                } else {
                    warn!("Failed to send {} to connection {member}; it will be cleaned up", event.event_type());
                }
            }
        }
        delivered
    }

    /// Delivers an event to a user's live connection, if they have one.
    /// Returns false when the user is offline; callers treat that as
    /// "deliver nothing", never an error.
    pub fn emit_to_user(&self, user_id: UserId, event: &ServerEvent) -> bool {
        let Some(handle) = self.registry.connection_for_user(user_id) else {
            return false;
        };
        self.emit_to_connection(handle.id(), event)
    }

    /// Delivers an event to one specific connection.
    pub fn emit_to_connection(&self, connection_id: &ConnectionId, event: &ServerEvent) -> bool {
        let Some(frame) = frame(event) else {
            return false;
        };
        let Some(handle) = self.connections.get(connection_id) else {
            return false;
        };
        handle.send(frame)
    }

    /// The dual-audience emergency broadcast: full identifying detail to
    /// the admin group, a sanitized notice to the ride room. Both emissions
    /// happen regardless of whether anyone is currently in either room.
    /// Shared by the session router and the REST-side SOS path.
    pub fn broadcast_emergency(
        &self,
        ride_id: RideId,
        user_id: UserId,
        role: Option<Role>,
        location: Coordinates,
        emergency_type: &str,
        message: Option<String>,
    ) {
        let timestamp = Utc::now();

        warn!("Emergency alert ({emergency_type}) from user {user_id} on ride {ride_id}");

        self.emit_to_room(
            ADMIN_GROUP,
            &ServerEvent::EmergencyAlertAdmin {
                ride_id,
                user_id,
                role,
                location,
                emergency_type: emergency_type.to_string(),
                message,
                timestamp,
            },
        );
        self.emit_to_room(
            &ride_room(ride_id),
            &ServerEvent::EmergencyAlertRoom {
                emergency_type: emergency_type.to_string(),
                message: EMERGENCY_ROOM_NOTICE.to_string(),
                timestamp,
            },
        );
    }
}

impl Default for Manager {
    fn default() -> Self {
        Self::new()
    }
}

/// Builds the wire frame for an event: `{"event": name, "data": payload}`
/// as a text message. Serialization failure is logged and swallowed; a bad
/// frame must never take a connection down.
fn frame(event: &ServerEvent) -> Option<Message> {
    let data = match serde_json::to_value(event) {
        Ok(data) => data,
        Err(e) => {
            error!("Failed to serialize {} event: {e}", event.event_type());
            return None;
        }
    };
    let envelope = json!({ "event": event.event_type(), "data": data });
    Some(Message::Text(envelope.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc::{self, UnboundedReceiver};

    fn open(manager: &Manager) -> (ConnectionHandle, UnboundedReceiver<Message>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (manager.open_connection(tx), rx)
    }

    fn try_frame(rx: &mut UnboundedReceiver<Message>) -> Option<serde_json::Value> {
        match rx.try_recv().ok()? {
            Message::Text(text) => Some(serde_json::from_str(&text).unwrap()),
            other => panic!("expected a text frame, got {other:?}"),
        }
    }

    fn frame_from(rx: &mut UnboundedReceiver<Message>) -> serde_json::Value {
        try_frame(rx).expect("expected a frame")
    }

    #[test]
    fn events_to_a_room_only_reach_its_members() {
        let manager = Manager::new();
        let (a, mut rx_a) = open(&manager);
        let (_b, mut rx_b) = open(&manager);

        manager.join_ride(a.id(), 1);

        manager.emit_to_room(
            &ride_room(1),
            &ServerEvent::RideStatusChanged {
                status: "accepted".to_string(),
                update_by: "driver".to_string(),
                timestamp: Utc::now(),
            },
        );

        let frame = try_frame(&mut rx_a).expect("room member should receive the event");
        assert_eq!(frame["event"], "ride_status_changed");
        assert_eq!(frame["data"]["status"], "accepted");
        assert!(try_frame(&mut rx_b).is_none());
    }

    #[test]
    fn emit_to_an_empty_room_delivers_nothing() {
        let manager = Manager::new();
        let delivered = manager.emit_to_room(
            &ride_room(99),
            &ServerEvent::RideStatusChanged {
                status: "completed".to_string(),
                update_by: "driver".to_string(),
                timestamp: Utc::now(),
            },
        );
        assert_eq!(delivered, 0);
    }

    #[test]
    fn emit_to_user_requires_authentication() {
        let manager = Manager::new();
        let (conn, mut rx) = open(&manager);

        let event = ServerEvent::AccountUpdate {
            kind: crate::message::AccountUpdateKind::Verification,
            message: "verified".to_string(),
            timestamp: Utc::now(),
        };

        assert!(!manager.emit_to_user(7, &event));

        manager.authenticate(7, Role::Driver, &conn);
        assert!(manager.emit_to_user(7, &event));

        let frame = try_frame(&mut rx).unwrap();
        assert_eq!(frame["event"], "account_update");
        assert_eq!(frame["data"]["type"], "verification");
    }

    #[test]
    fn re_authentication_closes_the_superseded_connection() {
        let manager = Manager::new();
        let (first, mut rx_first) = open(&manager);
        let (second, _rx_second) = open(&manager);

        manager.authenticate(7, Role::Rider, &first);
        manager.authenticate(7, Role::Rider, &second);

        match rx_first.try_recv() {
            Ok(Message::Close(_)) => {}
            other => panic!("superseded connection should get a close frame, got {other:?}"),
        }
        assert_eq!(manager.registry().connection_for_user(7).unwrap().id(), second.id());
    }

    #[test]
    fn close_connection_purges_registry_and_rooms() {
        let manager = Manager::new();
        let (conn, _rx) = open(&manager);
        manager.authenticate(9, Role::Driver, &conn);
        manager.join_ride(conn.id(), 42);

        assert_eq!(manager.close_connection(conn.id()), Some(9));

        assert!(manager.registry().connection_for_user(9).is_none());
        assert!(!manager.is_room_member(&ride_room(42), conn.id()));
        assert!(!manager.is_room_member(DRIVERS_GROUP, conn.id()));

        // closing again is a no-op
        assert_eq!(manager.close_connection(conn.id()), None);
    }

    #[test]
    fn emergency_broadcast_reaches_both_audiences_with_distinct_payloads() {
        let manager = Manager::new();
        let (admin, mut rx_admin) = open(&manager);
        let (rider, mut rx_rider) = open(&manager);

        manager.authenticate(1, Role::Admin, &admin);
        manager.authenticate(2, Role::Rider, &rider);
        manager.join_ride(rider.id(), 42);

        manager.broadcast_emergency(
            42,
            2,
            Some(Role::Rider),
            Coordinates { lat: 1.0, lng: 2.0 },
            "accident",
            None,
        );

        let admin_frame = frame_from(&mut rx_admin);
        assert_eq!(admin_frame["event"], "emergency_alert");
        assert_eq!(admin_frame["data"]["rideId"], 42);
        assert_eq!(admin_frame["data"]["userId"], 2);
        assert_eq!(admin_frame["data"]["location"]["lat"], 1.0);

        let room_frame = frame_from(&mut rx_rider);
        assert_eq!(room_frame["event"], "emergency_alert");
        assert_eq!(room_frame["data"]["message"], EMERGENCY_ROOM_NOTICE);
        assert!(room_frame["data"].get("userId").is_none());
        assert!(room_frame["data"].get("location").is_none());

        // exactly one frame each
        assert!(rx_admin.try_recv().is_err());
        assert!(rx_rider.try_recv().is_err());
    }

    #[test]
    fn emergency_broadcast_proceeds_with_no_admin_online() {
        let manager = Manager::new();
        let (rider, mut rx_rider) = open(&manager);
        manager.authenticate(2, Role::Rider, &rider);
        manager.join_ride(rider.id(), 42);

        manager.broadcast_emergency(
            42,
            2,
            None,
            Coordinates { lat: 0.0, lng: 0.0 },
            "harassment",
            Some("please help".to_string()),
        );

        let room_frame = frame_from(&mut rx_rider);
        assert_eq!(room_frame["event"], "emergency_alert");
        assert_eq!(room_frame["data"]["emergencyType"], "harassment");
    }
}

use crate::connection::ConnectionHandle;
use crate::manager::Manager;
use crate::message::{ClientEvent, RideId, Role, ServerEvent, UserId};
use crate::room::ride_room;
use chrono::Utc;
use log::*;
use std::sync::Arc;

/// Per-connection event router.
///
/// One `Session` lives inside each transport actor, from socket accept to
/// disconnect. It starts anonymous; an `authenticate` event binds it to a
/// user identity, and re-authentication overwrites. Room membership is not
/// a state of its own: an authenticated connection joins and leaves ride
/// rooms freely.
///
/// Every handler is defensive. An event missing required fields never got
/// past decoding and is dropped in [`Session::handle_frame`]; semantically
/// empty values (a non-positive ride id, a blank chat message) are dropped
/// here. Dropped events are logged, never answered with an error frame, and
/// never allowed to panic the connection task.
pub struct Session {
    manager: Arc<Manager>,
    handle: ConnectionHandle,
    identity: Option<(UserId, Role)>,
}

impl Session {
    pub fn new(manager: Arc<Manager>, handle: ConnectionHandle) -> Self {
        Self {
            manager,
            handle,
            identity: None,
        }
    }

    pub fn connection(&self) -> &ConnectionHandle {
        &self.handle
    }

    /// Decodes one inbound text frame and routes it. Malformed frames are
    /// dropped silently (logged at debug), per the at-most-once, best-effort
    /// contract of this layer.
    pub fn handle_frame(&mut self, text: &str) {
        match serde_json::from_str::<ClientEvent>(text) {
            Ok(event) => self.handle_event(event),
            Err(e) => {
                debug!("Dropping malformed frame on connection {}: {e}", self.handle.id());
            }
        }
    }

    pub fn handle_event(&mut self, event: ClientEvent) {
        match event {
            ClientEvent::Authenticate { user_id, role } => self.authenticate(user_id, role),
            ClientEvent::JoinRide { ride_id } => self.join_ride(ride_id),
            ClientEvent::LeaveRide { ride_id } => self.leave_ride(ride_id),
            ClientEvent::LocationUpdate {
                ride_id,
                location,
                user_id,
            } => self.location_update(ride_id, location, user_id),
            ClientEvent::SendMessage {
                ride_id,
                sender_id,
                receiver_id,
                message,
            } => self.send_message(ride_id, sender_id, receiver_id, message),
            ClientEvent::FareOffer {
                ride_id,
                user_id,
                role,
                amount,
                message,
            } => self.fare_offer(ride_id, user_id, role, amount, message),
            ClientEvent::EmergencyAlert {
                ride_id,
                user_id,
                role,
                location,
                emergency_type,
                message,
            } => self.emergency_alert(ride_id, user_id, role, location, emergency_type, message),
            ClientEvent::RideStatusUpdate {
                ride_id,
                status,
                update_by,
            } => self.ride_status_update(ride_id, status, update_by),
        }
    }

    fn authenticate(&mut self, user_id: UserId, role: Role) {
        if user_id <= 0 {
            debug!("Dropping authenticate with invalid user id {user_id}");
            return;
        }
        self.manager.authenticate(user_id, role, &self.handle);
        self.identity = Some((user_id, role));
        // fire-and-forget: no acknowledgment frame goes back
    }

    fn join_ride(&mut self, ride_id: RideId) {
        if !valid_ride(ride_id, "join_ride") {
            return;
        }
        self.manager.join_ride(self.handle.id(), ride_id);
    }

    fn leave_ride(&mut self, ride_id: RideId) {
        if !valid_ride(ride_id, "leave_ride") {
            return;
        }
        self.manager.leave_ride(self.handle.id(), ride_id);
    }

    fn location_update(
        &mut self,
        ride_id: RideId,
        location: crate::message::Coordinates,
        user_id: UserId,
    ) {
        if !valid_ride(ride_id, "location_update") {
            return;
        }
        self.manager.emit_to_room(
            &ride_room(ride_id),
            &ServerEvent::LocationUpdate {
                user_id,
                location,
                timestamp: Utc::now(),
            },
        );
    }

    fn send_message(
        &mut self,
        ride_id: RideId,
        sender_id: UserId,
        receiver_id: UserId,
        message: String,
    ) {
        if !valid_ride(ride_id, "send_message") {
            return;
        }
        if message.is_empty() {
            debug!("Dropping empty chat message on ride {ride_id}");
            return;
        }

        let room = ride_room(ride_id);
        let timestamp = Utc::now();

        self.manager.emit_to_room(
            &room,
            &ServerEvent::ReceiveMessage {
                sender_id,
                message: message.clone(),
                ride_id: None,
                timestamp,
            },
        );

        // A receiver who is online but has not joined the room yet would
        // otherwise miss the message; deliver a direct copy carrying the
        // ride id. A receiver in the room already got the broadcast.
        if let Some(receiver) = self.manager.registry().connection_for_user(receiver_id) {
            if !self.manager.is_room_member(&room, receiver.id()) {
                self.manager.emit_to_connection(
                    receiver.id(),
                    &ServerEvent::ReceiveMessage {
                        sender_id,
                        message,
                        ride_id: Some(ride_id),
                        timestamp,
                    },
                );
            }
        }
    }

    fn fare_offer(
        &mut self,
        ride_id: RideId,
        user_id: UserId,
        role: Role,
        amount: f64,
        message: Option<String>,
    ) {
        if !valid_ride(ride_id, "fare_offer") {
            return;
        }
        self.manager.emit_to_room(
            &ride_room(ride_id),
            &ServerEvent::FareUpdate {
                user_id,
                role,
                amount,
                message,
                timestamp: Utc::now(),
            },
        );
    }

    fn emergency_alert(
        &mut self,
        ride_id: RideId,
        user_id: UserId,
        role: Option<Role>,
        location: crate::message::Coordinates,
        emergency_type: String,
        message: Option<String>,
    ) {
        if !valid_ride(ride_id, "emergency_alert") {
            return;
        }
        self.manager
            .broadcast_emergency(ride_id, user_id, role, location, &emergency_type, message);
    }

    fn ride_status_update(&mut self, ride_id: RideId, status: String, update_by: String) {
        if !valid_ride(ride_id, "ride_status_update") {
            return;
        }
        self.manager.emit_to_room(
            &ride_room(ride_id),
            &ServerEvent::RideStatusChanged {
                status,
                update_by,
                timestamp: Utc::now(),
            },
        );
    }
}

fn valid_ride(ride_id: RideId, event: &str) -> bool {
    if ride_id <= 0 {
        debug!("Dropping {event} with invalid ride id {ride_id}");
        return false;
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::Coordinates;
    use axum::extract::ws::Message;
    use tokio::sync::mpsc::{self, UnboundedReceiver};

    struct Client {
        session: Session,
        rx: UnboundedReceiver<Message>,
    }

    impl Client {
        fn connect(manager: &Arc<Manager>) -> Self {
            let (tx, rx) = mpsc::unbounded_channel();
            let handle = manager.open_connection(tx);
            Self {
                session: Session::new(manager.clone(), handle),
                rx,
            }
        }

        fn authenticate(&mut self, user_id: UserId, role: Role) {
            self.session.handle_event(ClientEvent::Authenticate { user_id, role });
        }

        fn join_ride(&mut self, ride_id: RideId) {
            self.session.handle_event(ClientEvent::JoinRide { ride_id });
        }

        fn next_frame(&mut self) -> Option<serde_json::Value> {
            match self.rx.try_recv().ok()? {
                Message::Text(text) => Some(serde_json::from_str(&text).unwrap()),
                other => panic!("expected a text frame, got {other:?}"),
            }
        }

        fn disconnect(&mut self) {
            let id = self.session.connection().id().clone();
            self.session.manager.close_connection(&id);
        }
    }

    fn manager() -> Arc<Manager> {
        Arc::new(Manager::new())
    }

    #[test]
    fn location_update_reaches_exactly_the_other_room_members() {
        let manager = manager();
        let mut rider = Client::connect(&manager);
        let mut driver = Client::connect(&manager);
        let mut bystander = Client::connect(&manager);

        rider.authenticate(7, Role::Rider);
        driver.authenticate(9, Role::Driver);
        bystander.authenticate(11, Role::Rider);

        rider.join_ride(42);
        driver.join_ride(42);
        bystander.join_ride(43);

        rider.session.handle_event(ClientEvent::LocationUpdate {
            ride_id: 42,
            location: Coordinates { lat: 1.0, lng: 2.0 },
            user_id: 7,
        });

        let frame = driver.next_frame().expect("driver should receive the update");
        assert_eq!(frame["event"], "location_update");
        assert_eq!(frame["data"]["userId"], 7);
        assert_eq!(frame["data"]["location"]["lat"], 1.0);
        assert_eq!(frame["data"]["location"]["lng"], 2.0);
        assert!(frame["data"]["timestamp"].is_string());

        // the sender is a room member too and receives its own broadcast
        assert!(rider.next_frame().is_some());
        // a connection in another ride room sees nothing
        assert!(bystander.next_frame().is_none());
    }

    #[test]
    fn chat_reaches_a_room_member_exactly_once_via_the_room() {
        let manager = manager();
        let mut sender = Client::connect(&manager);
        let mut receiver = Client::connect(&manager);

        sender.authenticate(7, Role::Rider);
        receiver.authenticate(9, Role::Driver);
        sender.join_ride(42);
        receiver.join_ride(42);

        sender.session.handle_event(ClientEvent::SendMessage {
            ride_id: 42,
            sender_id: 7,
            receiver_id: 9,
            message: "here in two minutes".to_string(),
        });

        let frame = receiver.next_frame().expect("receiver should get the room copy");
        assert_eq!(frame["event"], "receive_message");
        assert_eq!(frame["data"]["senderId"], 7);
        // the room copy carries no ride id
        assert!(frame["data"].get("rideId").is_none());
        // and no second (direct) copy arrives
        assert!(receiver.next_frame().is_none());
    }

    #[test]
    fn chat_reaches_an_out_of_room_receiver_exactly_once_directly() {
        let manager = manager();
        let mut sender = Client::connect(&manager);
        let mut receiver = Client::connect(&manager);

        sender.authenticate(7, Role::Rider);
        receiver.authenticate(9, Role::Driver);
        sender.join_ride(42);
        // receiver never joins ride_42

        sender.session.handle_event(ClientEvent::SendMessage {
            ride_id: 42,
            sender_id: 7,
            receiver_id: 9,
            message: "where are you?".to_string(),
        });

        let frame = receiver.next_frame().expect("receiver should get a direct copy");
        assert_eq!(frame["event"], "receive_message");
        // the direct copy tells the client which ride it belongs to
        assert_eq!(frame["data"]["rideId"], 42);
        assert!(receiver.next_frame().is_none());
    }

    #[test]
    fn chat_to_an_offline_receiver_still_broadcasts_to_the_room() {
        let manager = manager();
        let mut sender = Client::connect(&manager);
        let mut other_member = Client::connect(&manager);

        sender.authenticate(7, Role::Rider);
        other_member.authenticate(8, Role::Rider);
        sender.join_ride(42);
        other_member.join_ride(42);

        // receiver 9 disconnected earlier
        let mut receiver = Client::connect(&manager);
        receiver.authenticate(9, Role::Driver);
        receiver.disconnect();

        sender.session.handle_event(ClientEvent::SendMessage {
            ride_id: 42,
            sender_id: 7,
            receiver_id: 9,
            message: "hello?".to_string(),
        });

        assert!(manager.registry().connection_for_user(9).is_none());
        assert!(other_member.next_frame().is_some());
        assert!(receiver.next_frame().is_none());
    }

    #[test]
    fn fare_offer_stays_in_the_room() {
        let manager = manager();
        let mut rider = Client::connect(&manager);
        let mut driver = Client::connect(&manager);
        let mut outsider = Client::connect(&manager);

        rider.authenticate(7, Role::Rider);
        driver.authenticate(9, Role::Driver);
        outsider.authenticate(11, Role::Driver);
        rider.join_ride(42);
        driver.join_ride(42);

        rider.session.handle_event(ClientEvent::FareOffer {
            ride_id: 42,
            user_id: 7,
            role: Role::Rider,
            amount: 18.0,
            message: Some("can you do 18?".to_string()),
        });

        let frame = driver.next_frame().expect("driver should see the offer");
        assert_eq!(frame["event"], "fare_update");
        assert_eq!(frame["data"]["amount"], 18.0);
        assert_eq!(frame["data"]["role"], "rider");
        assert!(outsider.next_frame().is_none());
    }

    #[test]
    fn emergency_alert_fans_out_to_admins_and_room_with_different_payloads() {
        let manager = manager();
        let mut admin = Client::connect(&manager);
        let mut rider = Client::connect(&manager);
        let mut driver = Client::connect(&manager);

        admin.authenticate(1, Role::Admin);
        rider.authenticate(7, Role::Rider);
        driver.authenticate(9, Role::Driver);
        rider.join_ride(42);
        driver.join_ride(42);

        rider.session.handle_event(ClientEvent::EmergencyAlert {
            ride_id: 42,
            user_id: 7,
            role: Some(Role::Rider),
            location: Coordinates { lat: 5.0, lng: 6.0 },
            emergency_type: "accident".to_string(),
            message: None,
        });

        let admin_frame = admin.next_frame().expect("admin group should be alerted");
        assert_eq!(admin_frame["event"], "emergency_alert");
        assert_eq!(admin_frame["data"]["rideId"], 42);
        assert_eq!(admin_frame["data"]["userId"], 7);
        assert_eq!(admin_frame["data"]["emergencyType"], "accident");
        assert!(admin.next_frame().is_none(), "exactly one admin emission");

        let room_frame = driver.next_frame().expect("room should get the sanitized notice");
        assert_eq!(room_frame["event"], "emergency_alert");
        assert!(room_frame["data"].get("userId").is_none());
        assert!(room_frame["data"].get("location").is_none());
        assert!(driver.next_frame().is_none(), "exactly one room emission");
    }

    #[test]
    fn ride_status_update_broadcasts_to_the_room_only() {
        let manager = manager();
        let mut rider = Client::connect(&manager);
        let mut driver = Client::connect(&manager);

        rider.authenticate(7, Role::Rider);
        driver.authenticate(9, Role::Driver);
        rider.join_ride(42);
        driver.join_ride(42);

        driver.session.handle_event(ClientEvent::RideStatusUpdate {
            ride_id: 42,
            status: "in_progress".to_string(),
            update_by: "driver".to_string(),
        });

        let frame = rider.next_frame().expect("rider should see the status change");
        assert_eq!(frame["event"], "ride_status_changed");
        assert_eq!(frame["data"]["status"], "in_progress");
        assert_eq!(frame["data"]["updateBy"], "driver");
    }

    #[test]
    fn disconnected_driver_gets_nothing_but_the_room_still_works() {
        let manager = manager();
        let mut rider = Client::connect(&manager);
        let mut driver = Client::connect(&manager);

        rider.authenticate(7, Role::Rider);
        driver.authenticate(9, Role::Driver);
        rider.join_ride(42);
        driver.join_ride(42);

        driver.disconnect();
        assert!(manager.registry().connection_for_user(9).is_none());

        rider.session.handle_event(ClientEvent::SendMessage {
            ride_id: 42,
            sender_id: 7,
            receiver_id: 9,
            message: "are you still there?".to_string(),
        });

        // rider remains joined, so the room broadcast still happens
        let frame = rider.next_frame().expect("room broadcast should proceed");
        assert_eq!(frame["event"], "receive_message");
        assert!(driver.next_frame().is_none());
    }

    #[test]
    fn malformed_frames_are_dropped_without_a_reply() {
        let manager = manager();
        let mut client = Client::connect(&manager);
        client.authenticate(7, Role::Rider);
        client.join_ride(42);

        client.session.handle_frame("not json at all");
        client.session.handle_frame(r#"{"event":"location_update","data":{"rideId":42}}"#);
        client.session.handle_frame(r#"{"event":"no_such_event","data":{}}"#);

        assert!(client.next_frame().is_none());
    }

    #[test]
    fn events_with_non_positive_ride_ids_are_dropped() {
        let manager = manager();
        let mut client = Client::connect(&manager);
        client.authenticate(7, Role::Rider);
        client.join_ride(42);

        client.session.handle_event(ClientEvent::LocationUpdate {
            ride_id: 0,
            location: Coordinates { lat: 1.0, lng: 2.0 },
            user_id: 7,
        });
        client.session.handle_event(ClientEvent::SendMessage {
            ride_id: -1,
            sender_id: 7,
            receiver_id: 9,
            message: "lost".to_string(),
        });

        assert!(client.next_frame().is_none());
    }

    #[test]
    fn leaving_a_ride_stops_delivery() {
        let manager = manager();
        let mut rider = Client::connect(&manager);
        let mut driver = Client::connect(&manager);

        rider.authenticate(7, Role::Rider);
        driver.authenticate(9, Role::Driver);
        rider.join_ride(42);
        driver.join_ride(42);

        driver.session.handle_event(ClientEvent::LeaveRide { ride_id: 42 });

        rider.session.handle_event(ClientEvent::LocationUpdate {
            ride_id: 42,
            location: Coordinates { lat: 1.0, lng: 2.0 },
            user_id: 7,
        });

        assert!(driver.next_frame().is_none());
    }
}

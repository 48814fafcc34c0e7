use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// User ids as stored in the relational schema. The core only references
/// them; it never creates or validates users.
pub type UserId = i64;

/// Ride ids, used to derive room names.
pub type RideId = i64;

/// The part a participant plays in a ride session. Mirrors the `role`
/// column of the users table; redeclared here so the wire vocabulary has no
/// dependency on the entity layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Rider,
    Driver,
    Admin,
}

/// A geographic point as clients report it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

/// Trait for getting the outbound event name of a server event.
pub trait EventType {
    fn event_type(&self) -> &'static str;
}

/// Inbound events, client → server. The wire shape is a JSON text frame
/// `{"event": "<name>", "data": {...}}` with camelCase payload fields.
/// A frame that fails to decode into one of these variants is a malformed
/// event and is dropped by the session handler.
#[derive(Debug, Clone, Deserialize)]
#[serde(
    tag = "event",
    content = "data",
    rename_all = "snake_case",
    rename_all_fields = "camelCase"
)]
pub enum ClientEvent {
    Authenticate {
        user_id: UserId,
        role: Role,
    },
    JoinRide {
        ride_id: RideId,
    },
    LeaveRide {
        ride_id: RideId,
    },
    LocationUpdate {
        ride_id: RideId,
        location: Coordinates,
        user_id: UserId,
    },
    SendMessage {
        ride_id: RideId,
        sender_id: UserId,
        receiver_id: UserId,
        message: String,
    },
    FareOffer {
        ride_id: RideId,
        user_id: UserId,
        role: Role,
        amount: f64,
        #[serde(default)]
        message: Option<String>,
    },
    EmergencyAlert {
        ride_id: RideId,
        user_id: UserId,
        #[serde(default)]
        role: Option<Role>,
        location: Coordinates,
        emergency_type: String,
        #[serde(default)]
        message: Option<String>,
    },
    RideStatusUpdate {
        ride_id: RideId,
        status: String,
        update_by: String,
    },
}

/// What an `account_update` notification is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountUpdateKind {
    Verification,
    Block,
    Unblock,
}

/// What a `ride_update` notification is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RideUpdateKind {
    Reassigned,
    Assigned,
    DriverChanged,
    Cancelled,
    SwapRequested,
}

/// Outbound events, server → client. Serialized untagged; the event name
/// travels in the frame envelope, which lets the two `emergency_alert`
/// payload shapes share one wire name. Every variant carries a timestamp.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged, rename_all_fields = "camelCase")]
pub enum ServerEvent {
    LocationUpdate {
        user_id: UserId,
        location: Coordinates,
        timestamp: DateTime<Utc>,
    },
    ReceiveMessage {
        sender_id: UserId,
        message: String,
        /// Present only on the direct copy delivered to a receiver who has
        /// not joined the ride room, so their client knows which ride the
        /// message belongs to.
        #[serde(skip_serializing_if = "Option::is_none")]
        ride_id: Option<RideId>,
        timestamp: DateTime<Utc>,
    },
    FareUpdate {
        user_id: UserId,
        role: Role,
        amount: f64,
        #[serde(skip_serializing_if = "Option::is_none")]
        message: Option<String>,
        timestamp: DateTime<Utc>,
    },
    /// Full identifying detail, admin group only.
    EmergencyAlertAdmin {
        ride_id: RideId,
        user_id: UserId,
        #[serde(skip_serializing_if = "Option::is_none")]
        role: Option<Role>,
        location: Coordinates,
        emergency_type: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        message: Option<String>,
        timestamp: DateTime<Utc>,
    },
    /// Sanitized notice for the ride room.
    EmergencyAlertRoom {
        emergency_type: String,
        message: String,
        timestamp: DateTime<Utc>,
    },
    RideStatusChanged {
        status: String,
        update_by: String,
        timestamp: DateTime<Utc>,
    },
    AccountUpdate {
        #[serde(rename = "type")]
        kind: AccountUpdateKind,
        message: String,
        timestamp: DateTime<Utc>,
    },
    RideUpdate {
        #[serde(rename = "type")]
        kind: RideUpdateKind,
        ride_id: RideId,
        message: String,
        timestamp: DateTime<Utc>,
    },
}

impl EventType for ServerEvent {
    fn event_type(&self) -> &'static str {
        match self {
            ServerEvent::LocationUpdate { .. } => "location_update",
            ServerEvent::ReceiveMessage { .. } => "receive_message",
            ServerEvent::FareUpdate { .. } => "fare_update",
            ServerEvent::EmergencyAlertAdmin { .. } => "emergency_alert",
            ServerEvent::EmergencyAlertRoom { .. } => "emergency_alert",
            ServerEvent::RideStatusChanged { .. } => "ride_status_changed",
            ServerEvent::AccountUpdate { .. } => "account_update",
            ServerEvent::RideUpdate { .. } => "ride_update",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_authenticate_frame() {
        let frame = r#"{"event":"authenticate","data":{"userId":7,"role":"driver"}}"#;
        let event: ClientEvent = serde_json::from_str(frame).unwrap();
        match event {
            ClientEvent::Authenticate { user_id, role } => {
                assert_eq!(user_id, 7);
                assert_eq!(role, Role::Driver);
            }
            other => panic!("decoded wrong variant: {other:?}"),
        }
    }

    #[test]
    fn decodes_camel_case_payload_fields() {
        let frame = r#"{"event":"send_message","data":{"rideId":42,"senderId":7,"receiverId":9,"message":"on my way"}}"#;
        let event: ClientEvent = serde_json::from_str(frame).unwrap();
        match event {
            ClientEvent::SendMessage {
                ride_id,
                sender_id,
                receiver_id,
                message,
            } => {
                assert_eq!(ride_id, 42);
                assert_eq!(sender_id, 7);
                assert_eq!(receiver_id, 9);
                assert_eq!(message, "on my way");
            }
            other => panic!("decoded wrong variant: {other:?}"),
        }
    }

    #[test]
    fn missing_required_field_fails_to_decode() {
        // location_update without its location is a malformed event
        let frame = r#"{"event":"location_update","data":{"rideId":42,"userId":7}}"#;
        assert!(serde_json::from_str::<ClientEvent>(frame).is_err());
    }

    #[test]
    fn fare_offer_message_is_optional() {
        let frame = r#"{"event":"fare_offer","data":{"rideId":1,"userId":2,"role":"rider","amount":12.5}}"#;
        let event: ClientEvent = serde_json::from_str(frame).unwrap();
        match event {
            ClientEvent::FareOffer { amount, message, .. } => {
                assert_eq!(amount, 12.5);
                assert!(message.is_none());
            }
            other => panic!("decoded wrong variant: {other:?}"),
        }
    }

    #[test]
    fn both_emergency_shapes_share_one_event_name() {
        let admin = ServerEvent::EmergencyAlertAdmin {
            ride_id: 1,
            user_id: 2,
            role: Some(Role::Rider),
            location: Coordinates { lat: 0.0, lng: 0.0 },
            emergency_type: "accident".to_string(),
            message: None,
            timestamp: Utc::now(),
        };
        let room = ServerEvent::EmergencyAlertRoom {
            emergency_type: "accident".to_string(),
            message: "Emergency alert received. Help is on the way.".to_string(),
            timestamp: Utc::now(),
        };
        assert_eq!(admin.event_type(), "emergency_alert");
        assert_eq!(room.event_type(), "emergency_alert");
    }

    #[test]
    fn server_event_serializes_camel_case_fields() {
        let event = ServerEvent::RideUpdate {
            kind: RideUpdateKind::DriverChanged,
            ride_id: 42,
            message: "Your driver has changed".to_string(),
            timestamp: Utc::now(),
        };
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["type"], "driver_changed");
        assert_eq!(value["rideId"], 42);
        assert!(value["timestamp"].is_string());
    }
}

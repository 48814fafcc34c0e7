use crate::manager::Manager;
use crate::message::{AccountUpdateKind, Coordinates, RideUpdateKind, Role, ServerEvent};
use crate::notify::{safe_emit, EmitTarget};
use crate::room::ADMIN_GROUP;
use async_trait::async_trait;
use chrono::Utc;
use events::{DomainEvent, EventHandler};
use log::*;
use std::sync::Arc;

/// Handles domain events by converting them into real-time notifications
/// for the affected users.
///
/// The domain layer decides who should be notified and carries their ids in
/// the event; this handler only routes. It is constructed with
/// `None` when the real-time layer is disabled, in which case every
/// notification is a logged no-op (the REST operations themselves still
/// succeed).
pub struct RealtimeEventHandler {
    manager: Option<Arc<Manager>>,
}

impl RealtimeEventHandler {
    pub fn new(manager: Option<Arc<Manager>>) -> Self {
        Self { manager }
    }

    fn emit(&self, target: EmitTarget, event: ServerEvent) -> bool {
        safe_emit(self.manager.as_deref(), &target, &event)
    }

    fn account_update(&self, user_id: events::Id, kind: AccountUpdateKind, message: String) {
        let delivered = self.emit(
            EmitTarget::User(user_id),
            ServerEvent::AccountUpdate {
                kind,
                message,
                timestamp: Utc::now(),
            },
        );
        debug!("account_update ({kind:?}) for user {user_id}, delivered: {delivered}");
    }

    fn ride_update(
        &self,
        target: EmitTarget,
        kind: RideUpdateKind,
        ride_id: events::Id,
        message: String,
    ) {
        let delivered = self.emit(
            target,
            ServerEvent::RideUpdate {
                kind,
                ride_id,
                message,
                timestamp: Utc::now(),
            },
        );
        debug!("ride_update ({kind:?}) for ride {ride_id}, delivered: {delivered}");
    }
}

#[async_trait]
impl EventHandler for RealtimeEventHandler {
    async fn handle(&self, event: &DomainEvent) {
        match event {
            DomainEvent::UserVerified { user_id } => {
                self.account_update(
                    *user_id,
                    AccountUpdateKind::Verification,
                    "Your account has been verified".to_string(),
                );
            }

            DomainEvent::UserBlocked { user_id, reason } => {
                let message = match reason {
                    Some(reason) => format!("Your account has been blocked: {reason}"),
                    None => "Your account has been blocked".to_string(),
                };
                self.account_update(*user_id, AccountUpdateKind::Block, message);
            }

            DomainEvent::UserUnblocked { user_id } => {
                self.account_update(
                    *user_id,
                    AccountUpdateKind::Unblock,
                    "Your account has been unblocked".to_string(),
                );
            }

            DomainEvent::DriverAssigned {
                ride_id,
                driver_id,
                rider_id,
                previous_driver_id,
            } => {
                self.ride_update(
                    EmitTarget::User(*driver_id),
                    RideUpdateKind::Assigned,
                    *ride_id,
                    "You have been assigned to a ride".to_string(),
                );
                if let Some(previous) = previous_driver_id {
                    self.ride_update(
                        EmitTarget::User(*previous),
                        RideUpdateKind::Reassigned,
                        *ride_id,
                        "You have been reassigned off this ride".to_string(),
                    );
                    self.ride_update(
                        EmitTarget::User(*rider_id),
                        RideUpdateKind::DriverChanged,
                        *ride_id,
                        "Your driver has changed".to_string(),
                    );
                }
            }

            DomainEvent::RideCancelled {
                ride_id,
                reason,
                notify_user_ids,
            } => {
                let message = match reason {
                    Some(reason) => format!("Ride cancelled: {reason}"),
                    None => "Ride cancelled".to_string(),
                };
                for user_id in notify_user_ids {
                    self.ride_update(
                        EmitTarget::User(*user_id),
                        RideUpdateKind::Cancelled,
                        *ride_id,
                        message.clone(),
                    );
                }
            }

            DomainEvent::DriverSwapRequested {
                ride_id,
                rider_id,
                reason,
            } => {
                let message = match reason {
                    Some(reason) => format!("Rider {rider_id} requested a driver swap: {reason}"),
                    None => format!("Rider {rider_id} requested a driver swap"),
                };
                self.ride_update(
                    EmitTarget::Room(ADMIN_GROUP.to_string()),
                    RideUpdateKind::SwapRequested,
                    *ride_id,
                    message,
                );
            }

            DomainEvent::EmergencySos {
                ride_id,
                user_id,
                role,
                lat,
                lng,
                emergency_type,
                message,
            } => match &self.manager {
                Some(manager) => {
                    manager.broadcast_emergency(
                        *ride_id,
                        *user_id,
                        parse_role(role),
                        Coordinates { lat: *lat, lng: *lng },
                        emergency_type,
                        message.clone(),
                    );
                }
                None => {
                    warn!("Dropping SOS broadcast for ride {ride_id}: real-time layer is not running");
                }
            },
        }
    }
}

fn parse_role(role: &str) -> Option<Role> {
    match role {
        "rider" => Some(Role::Rider),
        "driver" => Some(Role::Driver),
        "admin" => Some(Role::Admin),
        _ => None,
    }
}

//! Event system infrastructure for the RideLink Platform.
//!
//! This crate provides the event system that enables loose coupling between
//! domain logic and infrastructure concerns (like real-time notifications).
//!
//! # Architecture
//!
//! - **DomainEvent**: Enum representing all business events in the system
//! - **EventHandler**: Trait for implementing event handlers
//! - **EventPublisher**: Publishes events to registered handlers
//!
//! This crate has no dependencies on internal crates (entity, domain, etc.),
//! avoiding circular dependencies. Event payloads are primitive ids and
//! strings; anything richer is carried as serialized JSON values.

use async_trait::async_trait;
use std::sync::Arc;

/// A type alias that represents any Entity's internal id field data type.
/// This matches the definition in the entity crate to maintain compatibility.
pub type Id = i64;

/// Domain events that represent business-level changes in the system.
/// These events are emitted when domain operations complete successfully.
///
/// Events include user IDs for notification routing. The domain layer is
/// responsible for determining which users should be notified.
#[derive(Debug, Clone)]
pub enum DomainEvent {
    /// An admin verified a driver's account. Triggers an `account_update`
    /// notification on the driver's personal channel.
    UserVerified { user_id: Id },

    /// An admin blocked a user. The optional reason is forwarded verbatim
    /// in the notification message.
    UserBlocked { user_id: Id, reason: Option<String> },

    /// An admin lifted a block.
    UserUnblocked { user_id: Id },

    /// A driver was assigned to a ride, possibly displacing a previous
    /// driver. Produces `ride_update` notifications for the new driver
    /// (assigned), the displaced driver (reassigned) and the rider
    /// (driver_changed).
    DriverAssigned {
        ride_id: Id,
        driver_id: Id,
        rider_id: Id,
        previous_driver_id: Option<Id>,
    },

    /// A ride was cancelled. Every id in `notify_user_ids` receives a
    /// `ride_update` notification on their personal channel.
    RideCancelled {
        ride_id: Id,
        reason: Option<String>,
        notify_user_ids: Vec<Id>,
    },

    /// A rider asked for a different driver. Broadcast to the admin group
    /// so any online admin can act on it.
    DriverSwapRequested {
        ride_id: Id,
        rider_id: Id,
        reason: Option<String>,
    },

    /// A participant triggered an SOS through the REST endpoint. The
    /// real-time layer fans this out with the same dual-audience shape as
    /// socket-originated alerts: full detail to admins, a sanitized notice
    /// to the ride room.
    EmergencySos {
        ride_id: Id,
        user_id: Id,
        role: String,
        lat: f64,
        lng: f64,
        emergency_type: String,
        message: Option<String>,
    },
}

/// Trait for handling domain events.
/// Implementations can perform side effects like sending notifications,
/// updating caches, logging, etc.
#[async_trait]
pub trait EventHandler: Send + Sync {
    async fn handle(&self, event: &DomainEvent);
}

/// Publishes domain events to registered handlers.
/// Handlers are called sequentially in registration order.
#[derive(Clone)]
pub struct EventPublisher {
    handlers: Arc<Vec<Arc<dyn EventHandler>>>,
}

impl EventPublisher {
    pub fn new() -> Self {
        Self {
            handlers: Arc::new(Vec::new()),
        }
    }

    /// Register a new event handler.
    /// Note: This creates a new publisher instance with the additional handler.
    /// Store the returned publisher in your application state.
    pub fn with_handler(mut self, handler: Arc<dyn EventHandler>) -> Self {
        let mut handlers = (*self.handlers).clone();
        handlers.push(handler);
        self.handlers = Arc::new(handlers);
        self
    }

    /// Publish an event to all registered handlers.
    /// Handlers are called sequentially. If a handler panics or errors,
    /// we log it but continue with remaining handlers.
    pub async fn publish(&self, event: DomainEvent) {
        for handler in self.handlers.iter() {
            handler.handle(&event).await;
        }
    }
}

impl Default for EventPublisher {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct Recorder {
        label: &'static str,
        seen: Arc<Mutex<Vec<String>>>,
    }

    #[async_trait]
    impl EventHandler for Recorder {
        async fn handle(&self, event: &DomainEvent) {
            let tag = match event {
                DomainEvent::UserVerified { user_id } => format!("{}:verified:{user_id}", self.label),
                _ => format!("{}:other", self.label),
            };
            self.seen.lock().unwrap().push(tag);
        }
    }

    #[tokio::test]
    async fn publish_calls_handlers_in_registration_order() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let publisher = EventPublisher::new()
            .with_handler(Arc::new(Recorder {
                label: "first",
                seen: seen.clone(),
            }))
            .with_handler(Arc::new(Recorder {
                label: "second",
                seen: seen.clone(),
            }));

        publisher.publish(DomainEvent::UserVerified { user_id: 7 }).await;

        let seen = seen.lock().unwrap();
        assert_eq!(*seen, vec!["first:verified:7", "second:verified:7"]);
    }

    #[tokio::test]
    async fn publish_with_no_handlers_is_a_no_op() {
        let publisher = EventPublisher::new();
        publisher
            .publish(DomainEvent::UserUnblocked { user_id: 1 })
            .await;
    }
}

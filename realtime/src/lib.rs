//! Real-time ride-session coordination layer.
//!
//! This crate maps logical participants (rider, driver, admin) to live
//! WebSocket connections, tracks room membership for each ride, and routes
//! the ride lifecycle events (location updates, chat, fare negotiation,
//! status transitions, emergency alerts) between them.
//!
//! # Architecture
//!
//! - **Single connection per user**: Authenticating binds a user id to one
//!   live connection; a later authentication for the same user supersedes
//!   the earlier connection, which is asked to close.
//! - **Explicit room table**: The WebSocket transport has no native
//!   group-addressing primitive, so ride rooms, role groups and personal
//!   channels are tracked in a dual-index table with disconnect cleanup.
//! - **Owned service object**: All shared state hangs off [`Manager`],
//!   constructed once and injected wherever connections are held. Tests
//!   build as many independent instances as they like.
//! - **Ephemeral events**: Nothing is persisted here. A participant that is
//!   offline when an event fires simply misses it.
//! - **Best-effort delivery**: Emission is fire-and-forget over unbounded
//!   channels. Malformed inbound events are logged and dropped; no error
//!   frame goes back to the client, and no handler failure ever tears down
//!   another connection.
//!
//! # Message Flow
//!
//! 1. The transport accepts a socket and calls `Manager::open_connection`
//! 2. The client sends `authenticate` with its user id and role; the
//!    registry records the mapping and the connection joins its personal
//!    channel and role group
//! 3. The client joins a ride room with `join_ride`
//! 4. Ride-scoped events fan out to the room; chat additionally reaches a
//!    receiver who has a live connection but has not joined the room
//! 5. On disconnect the registry entry and all room memberships are purged
//!
//! # Modules
//!
//! - `connection`: ConnectionRegistry binding user ids to live connections
//! - `room`: room membership table and room-name helpers
//! - `session`: per-connection event router state machine
//! - `manager`: the owned service object tying the pieces together
//! - `message`: inbound/outbound event vocabulary
//! - `notify`: `safe_emit` fan-out helper for REST-side collaborators
//! - `domain_event_handler`: bridges `events::DomainEvent` into emissions

pub mod connection;
pub mod domain_event_handler;
pub mod manager;
pub mod message;
pub mod notify;
pub mod room;
pub mod session;

pub use manager::Manager;
pub use notify::{safe_emit, EmitTarget};

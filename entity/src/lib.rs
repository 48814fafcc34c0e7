pub mod prelude;

// Core entities
pub mod activity_logs;
pub mod emergency_contacts;
pub mod rides;
pub mod users;

// Shared column enums
pub mod ride_status;
pub mod role;

/// A type alias that represents any Entity's internal id field data type.
/// Aliased so that it's easy to change the underlying type if necessary.
pub type Id = i64;

pub use entity::{activity_logs, emergency_contacts, ride_status, rides, role, users, Id};

pub mod activity_log;
pub mod emergency_contact;
pub mod error;
pub mod ride;
pub mod user;

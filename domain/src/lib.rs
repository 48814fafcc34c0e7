//! This module re-exports various items from the `entity_api` crate.
//!
//! The purpose of this re-export is to ensure that consumers of the `domain` crate do not need to
//! directly depend on the `entity_api` crate. By re-exporting these items, we provide a clear and
//! consistent interface for the web layer while the underlying implementation details remain in
//! the `entity_api` crate.
pub use entity_api::{activity_logs, emergency_contacts, ride_status, rides, role, users, Id};

pub mod emergency;
pub mod error;
pub mod jwt;
pub mod ride;
pub mod user;

pub(crate) use error::Error;
pub(crate) use service::AppState;

mod controller;
mod error;
mod extractors;
mod middleware;
mod params;
mod router;
mod ws;

pub use router::define_routes;

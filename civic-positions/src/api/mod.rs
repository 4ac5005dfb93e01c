//! HTTP API handlers for civic-positions
//!
//! Thin adapter over the services: handlers parse the request, call one
//! operation and map errors through `ApiError`.

pub mod elections;
pub mod health;
pub mod imports;
pub mod positions;
pub mod sse;

pub use elections::election_routes;
pub use health::health_routes;
pub use imports::import_routes;
pub use positions::position_routes;
pub use sse::event_routes;

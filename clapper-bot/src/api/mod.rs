//! HTTP API handlers for clapper-bot

pub mod health;
pub mod interactions;

pub use health::health_routes;
pub use interactions::interaction_routes;

//! clapper-bot library - movie night bot service
//!
//! Crowd-sources movie suggestions per community, picks one at random for
//! administrators to confirm, and collects member reviews of the selected
//! movies. Interactions arrive over HTTP and are answered with structured
//! replies.

use axum::Router;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

pub mod affordance;
pub mod api;
pub mod ledger;
pub mod metadata;
pub mod pagination;
pub mod router;
pub mod selection;
pub mod sink;
pub mod view;

use router::{CommandRouter, Services};

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    pub router: Arc<CommandRouter>,
}

impl AppState {
    /// Create new application state
    pub fn new(services: Services) -> Self {
        Self {
            router: Arc::new(CommandRouter::new(services)),
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(api::interaction_routes())
        .merge(api::health_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

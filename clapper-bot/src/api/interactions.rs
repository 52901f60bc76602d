//! Interaction endpoint
//!
//! `POST /api/interactions` takes one interaction and answers with the
//! [`Reply`] to show. Handler failures are part of the reply, so a well-formed
//! request always gets `200 OK`.

use axum::extract::{DefaultBodyLimit, State};
use axum::routing::post;
use axum::{Json, Router};

use crate::router::Interaction;
use crate::view::Reply;
use crate::AppState;

/// Interactions are small JSON documents
pub const MAX_BODY_BYTES: usize = 64 * 1024;

/// POST /api/interactions
pub async fn post_interaction(
    State(state): State<AppState>,
    Json(interaction): Json<Interaction>,
) -> Json<Reply> {
    Json(state.router.dispatch(&interaction).await)
}

/// Build interaction routes
pub fn interaction_routes() -> Router<AppState> {
    Router::new()
        .route("/api/interactions", post(post_interaction))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
}

//! `/pickmovie` with its Reroll and Confirm buttons

use super::Context;
use crate::selection::{self, Progress};
use crate::view::{score_label, Reply, View};
use clapper_common::db::Suggestion;
use clapper_common::Result;
use tracing::debug;

async fn candidate_view(
    ctx: &Context<'_>,
    title: String,
    description: &str,
    movie: &Suggestion,
    progress: Progress,
    footer: String,
) -> View {
    View::new(title)
        .description(description)
        .field("⭐ Rating", score_label(movie.score), true)
        .field("🎭 Genres", movie.genre_summary.as_str(), true)
        .field("📅 Year", movie.release_year.as_str(), true)
        .field("👤 Suggested by", movie.proposer_name.as_str(), false)
        .field("📈 Progress", progress.label(), false)
        .image(ctx.poster_for(movie.external_ref).await)
        .footer(footer)
}

async fn candidate_reply(ctx: &Context<'_>, movie: &Suggestion, footer: String) -> Result<Reply> {
    let progress = selection::progress(ctx.db(), ctx.tenant_id).await?;
    let view = candidate_view(
        ctx,
        format!("🎬 Movie Suggestion: {} ({})", movie.title, movie.release_year),
        "This movie has been randomly selected!\n\nAdmins can reroll or confirm the selection.",
        movie,
        progress,
        footer,
    )
    .await;

    Ok(Reply::with_view(view).buttons(selection::candidate_buttons(ctx.tenant_id, movie.id)))
}

pub(super) async fn pick_movie(ctx: &Context<'_>) -> Result<Reply> {
    match selection::pick_random(ctx.db(), ctx.tenant_id).await? {
        Some(movie) => candidate_reply(ctx, &movie, format!("Picked by {}", ctx.actor.name)).await,
        None => Ok(Reply::message(
            "❌ No available movies to pick! All suggestions have been selected or there are no suggestions yet.",
        )),
    }
}

pub(super) async fn reroll(ctx: &Context<'_>, previous_id: i64) -> Result<Reply> {
    let candidate = selection::reroll(ctx.db(), ctx.tenant_id, ctx.actor).await?;
    debug!(tenant_id = ctx.tenant_id, previous_id, "Reroll requested");

    match candidate {
        Some(movie) => Ok(candidate_reply(ctx, &movie, format!("Rerolled by {}", ctx.actor.name))
            .await?
            .updating()),
        None => Ok(Reply::message("❌ No more available movies to pick!").updating()),
    }
}

pub(super) async fn confirm(ctx: &Context<'_>, suggestion_id: i64) -> Result<Reply> {
    let movie = selection::confirm(ctx.db(), ctx.tenant_id, ctx.actor, suggestion_id).await?;
    let progress = selection::progress(ctx.db(), ctx.tenant_id).await?;

    let view = candidate_view(
        ctx,
        format!("🎉 Selected Movie: {} ({})", movie.title, movie.release_year),
        "This movie has been confirmed!",
        &movie,
        progress,
        format!("Confirmed by {}", ctx.actor.name),
    )
    .await;

    // No buttons: the candidate message is closed
    Ok(Reply::with_view(view).updating())
}

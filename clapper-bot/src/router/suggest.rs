//! `/suggestion` and `/removesuggestion`

use super::Context;
use crate::metadata::{genre_summary, parse_catalog_link, CatalogItem};
use crate::view::{score_label, truncate, Reply, View};
use clapper_common::db::{suggestions, tenant_config, NewSuggestion, Suggestion};
use clapper_common::{Error, Result};
use tracing::info;

const NOT_CONFIGURED: &str = "This server has not been configured yet!\n\nAn administrator needs to run `/setup` to configure the suggestion channel before movies can be suggested.";

const SUMMARY_CHARS: usize = 300;

fn already_suggested(title: &str, existing: &Suggestion) -> Reply {
    Reply::private(format!(
        "⚠️ **{}** has already been suggested by **{}** in this server!",
        title, existing.proposer_name
    ))
}

/// Resolve the member's input to a catalog entry: a pasted link, else a title search
async fn resolve(ctx: &Context<'_>, input: &str) -> Result<CatalogItem> {
    match parse_catalog_link(input) {
        Some(id) => ctx.services.lookup.get_by_id(id).await.ok_or_else(|| {
            Error::NotFound(format!(
                "Could not find a movie with TMDB ID {}. Please check the link and try again.",
                id
            ))
        }),
        None => ctx.services.lookup.search_by_title(input).await.ok_or_else(|| {
            Error::NotFound(format!(
                "Could not find a movie named \"{}\". Please check the spelling and try again.",
                input
            ))
        }),
    }
}

pub(super) async fn suggest(ctx: &Context<'_>) -> Result<Reply> {
    let input = ctx.option("movie")?;

    let config = tenant_config::get(ctx.db(), ctx.tenant_id)
        .await?
        .ok_or_else(|| Error::NotFound(NOT_CONFIGURED.to_string()))?;

    let movie = resolve(ctx, input).await?;

    if let Some(existing) = suggestions::find_by_external_ref(ctx.db(), ctx.tenant_id, movie.id).await? {
        return Ok(already_suggested(&movie.title, &existing));
    }

    let year = movie.release_year();
    let genres = genre_summary(&movie.genre_ids);
    let poster = movie
        .poster_ref
        .as_deref()
        .and_then(|poster_ref| ctx.services.lookup.poster_url(poster_ref));

    let mut announcement = View::new(format!("🎬 {} ({})", movie.title, year))
        .field("⭐ Rating", score_label(movie.score), true)
        .field("🎭 Genres", genres.as_str(), true)
        .field("📅 Release Year", year.as_str(), true)
        .image(poster)
        .footer(format!("Suggested by {}", ctx.actor.name));
    if !movie.summary.is_empty() {
        announcement = announcement.description(truncate(&movie.summary, SUMMARY_CHARS));
    }

    // Persist only once the announcement is out
    ctx.services
        .sink
        .post_message(&config.output_channel, &announcement)
        .await?;

    let proposed = suggestions::propose(
        ctx.db(),
        ctx.tenant_id,
        &NewSuggestion {
            title: movie.title.clone(),
            external_ref: movie.id,
            proposer_id: ctx.actor.id.clone(),
            proposer_name: ctx.actor.name.clone(),
            score: movie.score,
            genre_summary: genres,
            release_year: year,
        },
    )
    .await;

    match proposed {
        Ok(_) => Ok(Reply::private(format!(
            "✅ Successfully suggested **{}**! Your suggestion has been posted in <#{}>.",
            movie.title, config.output_channel
        ))),
        // Another member proposed the same movie between the check and the insert
        Err(Error::DuplicateSuggestion { .. }) => {
            match suggestions::find_by_external_ref(ctx.db(), ctx.tenant_id, movie.id).await? {
                Some(existing) => Ok(already_suggested(&movie.title, &existing)),
                None => Err(Error::DuplicateSuggestion {
                    external_ref: movie.id,
                }),
            }
        }
        Err(e) => Err(e),
    }
}

pub(super) async fn remove(ctx: &Context<'_>) -> Result<Reply> {
    let title = ctx.option("movie")?;
    let is_admin = ctx.actor.is_admin;

    // Members may only remove their own suggestions
    let scope = if is_admin { None } else { Some(ctx.actor.id.as_str()) };
    let found = suggestions::find_by_fuzzy_title(ctx.db(), ctx.tenant_id, title, scope).await?;

    let Some(movie) = found else {
        let message = if is_admin {
            format!("Could not find a movie suggestion matching \"{}\".", title)
        } else {
            format!(
                "Could not find a movie named \"{}\" in your suggestions.\nYou can only remove movies that you suggested.",
                title
            )
        };
        return Err(Error::NotFound(message));
    };

    if !is_admin && movie.proposer_id != ctx.actor.id {
        return Err(Error::Unauthorized(
            "You can only remove movies that you suggested.".to_string(),
        ));
    }

    suggestions::remove(ctx.db(), ctx.tenant_id, movie.id).await?;
    info!(
        tenant_id = ctx.tenant_id,
        suggestion_id = movie.id,
        actor = %ctx.actor.id,
        "Suggestion removed by request"
    );

    let suggester = if movie.proposer_id != ctx.actor.id {
        format!(" (suggested by {})", movie.proposer_name)
    } else {
        String::new()
    };

    Ok(Reply::private(format!(
        "✅ Successfully removed **{}**{} from suggestions.",
        movie.title, suggester
    )))
}

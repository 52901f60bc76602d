//! `/ratemovie`, `/moviereviews` and `/selectedmovies`

use super::Context;
use crate::ledger;
use crate::view::{plural, score_label, truncate, Reply, View};
use clapper_common::db::{suggestions, RateOutcome, Suggestion};
use clapper_common::{Error, Result};

/// Reviews listed per view
const MAX_REVIEWS_SHOWN: usize = 5;
/// Selected movies listed per view
const MAX_MOVIES_SHOWN: usize = 10;
const COMMENT_CHARS: usize = 200;

async fn find_selected(ctx: &Context<'_>, title: &str) -> Result<Option<Suggestion>> {
    suggestions::find_selected_by_fuzzy_title(ctx.db(), ctx.tenant_id, title).await
}

pub(super) async fn rate_movie(ctx: &Context<'_>) -> Result<Reply> {
    let title = ctx.option("movie")?;
    let score = ledger::parse_score(ctx.option("rating")?)?;
    let comment = ctx.optional("review");

    let movie = match find_selected(ctx, title).await? {
        Some(movie) => movie,
        None => {
            // A proposed but unselected movie falls through to the ledger,
            // which reports it as not selected
            match suggestions::find_by_fuzzy_title(ctx.db(), ctx.tenant_id, title, None).await? {
                Some(movie) => movie,
                None => {
                    return Err(Error::NotFound(format!(
                        "Could not find a selected movie matching \"{}\".\nYou can only rate movies that have already been selected.",
                        title
                    )))
                }
            }
        }
    };

    let outcome = ledger::rate(ctx.db(), ctx.tenant_id, movie.id, ctx.actor, score, comment).await?;
    let (average, count) = ledger::average_and_count(ctx.db(), ctx.tenant_id, movie.id).await?;

    let action = match outcome {
        RateOutcome::Added => "added",
        RateOutcome::Updated => "updated",
    };

    let mut view = View::new(format!("⭐ Review {} for {}", action, movie.title))
        .description(format!("Your rating: **{}**", score_label(score)));
    if let Some(comment) = comment {
        view = view.field("📝 Your Review", comment, false);
    }
    let view = view
        .field(
            "📊 Community Rating",
            format!("{} ({} review{})", score_label(average), count, plural(count)),
            true,
        )
        .field("🎭 TMDB Rating", score_label(movie.score), true)
        .image(ctx.poster_for(movie.external_ref).await);

    Ok(Reply::with_view(view).ephemeral())
}

pub(super) async fn movie_reviews(ctx: &Context<'_>) -> Result<Reply> {
    let title = ctx.option("movie")?;
    let movie = find_selected(ctx, title).await?.ok_or_else(|| {
        Error::NotFound(format!("Could not find a selected movie matching \"{}\".", title))
    })?;

    let reviews = ledger::list_reviews(ctx.db(), ctx.tenant_id, movie.id).await?;
    let (average, count) = ledger::average_and_count(ctx.db(), ctx.tenant_id, movie.id).await?;

    let mut view = View::new(format!("🎬 Reviews for {} ({})", movie.title, movie.release_year));
    if count > 0 {
        view = view.field(
            "📊 Community Rating",
            format!("⭐ **{}** based on {} review{}", score_label(average), count, plural(count)),
            false,
        );
    } else {
        view = view.description("No reviews yet. Be the first to rate this movie with `/ratemovie`!");
    }
    view = view
        .field("🎭 TMDB Rating", score_label(movie.score), true)
        .field("🎭 Genres", movie.genre_summary.as_str(), true);

    if !reviews.is_empty() {
        view = view.field("━━━━━━━━━━━━━━━━━━━━", "**User Reviews**", false);

        for (position, review) in reviews.iter().take(MAX_REVIEWS_SHOWN).enumerate() {
            let mut value = format!("⭐ **{}**", score_label(review.score));
            if let Some(comment) = &review.comment {
                value.push_str(&format!("\n*\"{}\"*", truncate(comment, COMMENT_CHARS)));
            }
            value.push_str(&format!("\n— {}", review.reviewer_name));
            view = view.field(format!("Review #{}", position + 1), value, false);
        }

        if reviews.len() > MAX_REVIEWS_SHOWN {
            view = view.footer(format!(
                "Showing {} of {} reviews",
                MAX_REVIEWS_SHOWN,
                reviews.len()
            ));
        }
    }

    let view = view.image(ctx.poster_for(movie.external_ref).await);
    Ok(Reply::with_view(view).ephemeral())
}

pub(super) async fn selected_movies(ctx: &Context<'_>) -> Result<Reply> {
    let movies = ledger::selected_movies(ctx.db(), ctx.tenant_id).await?;
    if movies.is_empty() {
        return Ok(Reply::private("❌ No movies have been selected yet!"));
    }

    let mut view = View::new("🎬 Selected Movies").description(format!(
        "Total movies selected: **{}**\n━━━━━━━━━━━━━━━━━━━━",
        movies.len()
    ));

    for (position, entry) in movies.iter().take(MAX_MOVIES_SHOWN).enumerate() {
        let movie = &entry.suggestion;
        let community = if entry.review_count > 0 {
            format!(
                "{} ({} review{})",
                score_label(entry.average_score),
                entry.review_count,
                plural(entry.review_count)
            )
        } else {
            "No reviews yet".to_string()
        };

        let value = format!(
            "**{}** ({})\n🎭 TMDB: {}\n⭐ Community: {}\n👤 Suggested by: {}",
            movie.title,
            movie.release_year,
            score_label(movie.score),
            community,
            movie.proposer_name
        );
        view = view.field(format!("#{}", position + 1), value, false);
    }

    if movies.len() > MAX_MOVIES_SHOWN {
        view = view.footer(format!(
            "Showing {} of {} movies",
            MAX_MOVIES_SHOWN,
            movies.len()
        ));
    }

    Ok(Reply::with_view(view).ephemeral())
}

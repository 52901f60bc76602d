//! `/mysuggestions`, `/suggestions` and their page buttons

use super::Context;
use crate::affordance::{Affordance, BrowseScope, Direction};
use crate::pagination::{self, Page};
use crate::view::{score_label, truncate, Button, Reply, View};
use clapper_common::db::{suggestions, SuggestionListing};
use clapper_common::time::format_date;
use clapper_common::Result;

const SUMMARY_CHARS: usize = 200;

async fn load(ctx: &Context<'_>, scope: &BrowseScope) -> Result<Vec<SuggestionListing>> {
    match scope {
        BrowseScope::Tenant(tenant) => suggestions::list_all(ctx.db(), tenant).await,
        BrowseScope::User(tenant, user) => suggestions::list_for_user(ctx.db(), tenant, user).await,
    }
}

fn empty_message(scope: &BrowseScope) -> &'static str {
    match scope {
        BrowseScope::Tenant(_) => "❌ No movies have been suggested in this server yet!",
        BrowseScope::User(..) => "❌ You haven't suggested any movies yet!",
    }
}

pub(super) async fn my_suggestions(ctx: &Context<'_>) -> Result<Reply> {
    let scope = BrowseScope::User(ctx.tenant_id.to_string(), ctx.actor.id.clone());
    first_page(ctx, scope).await
}

pub(super) async fn all_suggestions(ctx: &Context<'_>) -> Result<Reply> {
    let scope = BrowseScope::Tenant(ctx.tenant_id.to_string());
    first_page(ctx, scope).await
}

async fn first_page(ctx: &Context<'_>, scope: BrowseScope) -> Result<Reply> {
    let listings = load(ctx, &scope).await?;
    match Page::at(0, listings.len()) {
        Some(page) => Ok(render(ctx, &scope, &listings, page).await),
        None => Ok(Reply::private(empty_message(&scope))),
    }
}

/// Step from the page shown when the button was rendered
///
/// The list is re-read on every step; the index is clamped against its
/// current length.
pub(super) async fn navigate(
    ctx: &Context<'_>,
    scope: &BrowseScope,
    direction: Direction,
    index: i64,
) -> Result<Reply> {
    let listings = load(ctx, scope).await?;
    match pagination::navigate(index, direction, listings.len()) {
        Some(page) => Ok(render(ctx, scope, &listings, page).await.updating()),
        None => Ok(Reply::private(empty_message(scope)).updating()),
    }
}

async fn render(
    ctx: &Context<'_>,
    scope: &BrowseScope,
    listings: &[SuggestionListing],
    page: Page,
) -> Reply {
    let listing = &listings[page.index];
    let movie = &listing.suggestion;

    let (status_emoji, status_text) = if listing.is_selected {
        ("✅", "Already selected")
    } else {
        ("⏳", "Not selected yet")
    };

    let mut description = format!(
        "**Status:** {}\n**Suggested:** {}",
        status_text,
        format_date(&movie.proposed_at)
    );
    if let BrowseScope::Tenant(_) = scope {
        description.push_str(&format!("\n**Suggested by:** {}", movie.proposer_name));
    }

    let mut image = None;
    if let Some(item) = ctx.services.lookup.get_by_id(movie.external_ref).await {
        if !item.summary.is_empty() {
            description.push_str("\n\n");
            description.push_str(&truncate(&item.summary, SUMMARY_CHARS));
        }
        image = item
            .poster_ref
            .as_deref()
            .and_then(|poster_ref| ctx.services.lookup.poster_url(poster_ref));
    }

    let view = View::new(format!("{} {} ({})", status_emoji, movie.title, movie.release_year))
        .description(description)
        .field("⭐ Rating", score_label(movie.score), true)
        .field("🎭 Genres", movie.genre_summary.as_str(), true)
        .field("📅 Year", movie.release_year.as_str(), true)
        .image(image)
        .footer(page.label());

    Reply::with_view(view)
        .buttons(page_buttons(scope, page))
        .ephemeral()
}

/// Previous and Next buttons; both carry the index currently shown
fn page_buttons(scope: &BrowseScope, page: Page) -> Vec<Button> {
    let token = |direction: Direction| {
        Affordance::Browse {
            scope: scope.clone(),
            direction,
            index: page.index as i64,
        }
        .encode()
    };

    vec![
        Button::new("⬅️ Previous", token(Direction::Previous), page.has_previous),
        Button::new("➡️ Next", token(Direction::Next), page.has_next),
    ]
}

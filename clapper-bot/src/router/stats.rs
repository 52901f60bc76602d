//! `/mystats` and `/moviestats`

use super::Context;
use crate::selection;
use crate::view::{score_label, Reply, View};
use clapper_common::db::suggestions;
use clapper_common::Result;

pub(super) async fn my_stats(ctx: &Context<'_>) -> Result<Reply> {
    let stats = suggestions::user_stats(ctx.db(), ctx.tenant_id, &ctx.actor.id).await?;

    let view = View::new(format!("📊 {}'s Statistics", ctx.actor.name))
        .field("Total Suggestions", stats.count.to_string(), true)
        .field("Average Rating", score_label(stats.average_score), true);

    Ok(Reply::with_view(view).ephemeral())
}

pub(super) async fn movie_stats(ctx: &Context<'_>) -> Result<Reply> {
    let progress = selection::progress(ctx.db(), ctx.tenant_id).await?;

    let mut view = View::new("📊 Server Movie Statistics")
        .field("Total Suggestions", progress.total.to_string(), true)
        .field("Movies Selected", progress.selected.to_string(), true)
        .field("Movies Remaining", progress.remaining().to_string(), true);

    if progress.total > 0 {
        let percentage = progress.selected as f64 / progress.total as f64 * 100.0;
        view = view.field(
            "Progress",
            format!("{:.1}% of suggestions have been selected", percentage),
            false,
        );
    }

    Ok(Reply::with_view(view))
}

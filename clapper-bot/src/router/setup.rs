//! `/setup` and `/config`

use super::Context;
use crate::view::{Reply, View};
use clapper_common::db::tenant_config;
use clapper_common::time::format_date;
use clapper_common::{Error, Result};

/// Channel id from either a raw id or a `<#id>` mention
fn channel_id(raw: &str) -> &str {
    raw.strip_prefix("<#")
        .and_then(|rest| rest.strip_suffix('>'))
        .unwrap_or(raw)
}

pub(super) async fn setup(ctx: &Context<'_>) -> Result<Reply> {
    let channel = channel_id(ctx.option("channel")?);
    if channel.is_empty() {
        return Err(Error::InvalidInput(
            "Please select a text channel for movie suggestions.".to_string(),
        ));
    }

    if !ctx.actor.is_admin {
        return Err(Error::Unauthorized(
            "Only administrators can configure the bot!".to_string(),
        ));
    }

    let config = tenant_config::save(ctx.db(), ctx.tenant_id, channel).await?;

    let view = View::new("✅ Bot Configuration Updated")
        .description(format!(
            "Movie suggestions will now be posted in <#{}>",
            config.output_channel
        ))
        .field(
            "📝 What's Next?",
            "Members can now use `/suggestion` to suggest movies!",
            false,
        );

    Ok(Reply::with_view(view).ephemeral())
}

pub(super) async fn show_config(ctx: &Context<'_>) -> Result<Reply> {
    let view = match tenant_config::get(ctx.db(), ctx.tenant_id).await? {
        Some(config) => View::new("⚙️ Server Configuration")
            .field(
                "📢 Suggestion Channel",
                format!("<#{}>", config.output_channel),
                false,
            )
            .field("📅 Configured At", format_date(&config.configured_at), false),
        None => View::new("⚙️ Bot Configuration")
            .description("This server has not been configured yet.")
            .field(
                "🛠️ Setup Required",
                "An administrator needs to run `/setup` to choose the suggestion channel.",
                false,
            ),
    };

    Ok(Reply::with_view(view).ephemeral())
}

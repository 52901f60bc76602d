//! Output sink
//!
//! Accepted suggestions are announced in the tenant's configured channel.
//! [`ChatApiSink`] posts the view as an embed through the chat platform's
//! REST API.

use crate::view::View;
use async_trait::async_trait;
use clapper_common::config::BotConfig;
use clapper_common::{Error, Result};
use serde::Serialize;
use std::time::Duration;
use tracing::{info, warn};

const USER_AGENT: &str = concat!("clapper/", env!("CARGO_PKG_VERSION"));

/// Message shown to the actor when posting fails
pub const POST_FAILED_MESSAGE: &str = "Could not post to the suggestion channel. The channel may have been deleted or the bot may not have permissions. Please contact an administrator to run `/setup` again.";

#[async_trait]
pub trait OutputSink: Send + Sync {
    /// Post a message to `channel`; fails with [`Error::TransportFailure`]
    async fn post_message(&self, channel: &str, view: &View) -> Result<()>;
}

#[derive(Serialize)]
struct MessagePayload<'a> {
    embeds: [Embed<'a>; 1],
}

#[derive(Serialize)]
struct Embed<'a> {
    title: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<&'a str>,
    fields: Vec<EmbedField<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    image: Option<EmbedUrl<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    footer: Option<EmbedFooter<'a>>,
}

#[derive(Serialize)]
struct EmbedField<'a> {
    name: &'a str,
    value: &'a str,
    inline: bool,
}

#[derive(Serialize)]
struct EmbedUrl<'a> {
    url: &'a str,
}

#[derive(Serialize)]
struct EmbedFooter<'a> {
    text: &'a str,
}

impl<'a> From<&'a View> for MessagePayload<'a> {
    fn from(view: &'a View) -> Self {
        MessagePayload {
            embeds: [Embed {
                title: &view.title,
                description: view.description.as_deref(),
                fields: view
                    .fields
                    .iter()
                    .map(|f| EmbedField {
                        name: &f.name,
                        value: &f.value,
                        inline: f.inline,
                    })
                    .collect(),
                image: view.image.as_deref().map(|url| EmbedUrl { url }),
                footer: view.footer.as_deref().map(|text| EmbedFooter { text }),
            }],
        }
    }
}

/// Chat platform REST client
pub struct ChatApiSink {
    http_client: reqwest::Client,
    api_base: String,
    bot_token: String,
}

impl ChatApiSink {
    pub fn new(api_base: &str, bot_token: &str, timeout: Duration) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Internal(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            api_base: api_base.trim_end_matches('/').to_string(),
            bot_token: bot_token.to_string(),
        })
    }

    pub fn from_config(config: &BotConfig) -> Result<Self> {
        Self::new(&config.chat_api_base, &config.bot_token, config.http_timeout)
    }
}

#[async_trait]
impl OutputSink for ChatApiSink {
    async fn post_message(&self, channel: &str, view: &View) -> Result<()> {
        let url = format!("{}/channels/{}/messages", self.api_base, channel);

        let response = self
            .http_client
            .post(&url)
            .header(reqwest::header::AUTHORIZATION, format!("Bot {}", self.bot_token))
            .json(&MessagePayload::from(view))
            .send()
            .await
            .map_err(|e| {
                warn!(channel, error = %e, "Posting message failed");
                Error::TransportFailure(POST_FAILED_MESSAGE.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            warn!(channel, status = status.as_u16(), "Chat API rejected message");
            return Err(Error::TransportFailure(POST_FAILED_MESSAGE.to_string()));
        }

        info!(channel, title = %view.title, "Posted message");
        Ok(())
    }
}

//! Command router
//!
//! Maps inbound interactions to handlers. Slash commands are resolved
//! through a [`CommandTable`] built once at startup; button clicks carry an
//! affordance token that is decoded and dispatched on its variant.
//! Administrator checks happen inside each handler, right before the call
//! that mutates state.

mod browse;
mod pick;
mod rating;
mod setup;
mod stats;
mod suggest;

use crate::affordance::Affordance;
use crate::metadata::MetadataLookup;
use crate::sink::OutputSink;
use crate::view::Reply;
use clapper_common::{Error, Result};
use serde::Deserialize;
use sqlx::SqlitePool;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tracing::{debug, error, warn};

/// Member performing the interaction
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Actor {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub is_admin: bool,
}

/// Inbound interaction as delivered to `POST /api/interactions`
#[derive(Debug, Clone, Deserialize)]
pub struct Interaction {
    /// Absent for direct messages
    #[serde(default)]
    pub tenant_id: Option<String>,
    pub actor: Actor,
    #[serde(flatten)]
    pub kind: InteractionKind,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InteractionKind {
    Command {
        name: String,
        #[serde(default)]
        options: BTreeMap<String, String>,
    },
    Component {
        token: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    Setup,
    Config,
    Suggestion,
    MyStats,
    MySuggestions,
    Suggestions,
    PickMovie,
    MovieStats,
    RemoveSuggestion,
    RateMovie,
    MovieReviews,
    SelectedMovies,
}

impl Command {
    pub const ALL: [Command; 12] = [
        Command::Setup,
        Command::Config,
        Command::Suggestion,
        Command::MyStats,
        Command::MySuggestions,
        Command::Suggestions,
        Command::PickMovie,
        Command::MovieStats,
        Command::RemoveSuggestion,
        Command::RateMovie,
        Command::MovieReviews,
        Command::SelectedMovies,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Command::Setup => "setup",
            Command::Config => "config",
            Command::Suggestion => "suggestion",
            Command::MyStats => "mystats",
            Command::MySuggestions => "mysuggestions",
            Command::Suggestions => "suggestions",
            Command::PickMovie => "pickmovie",
            Command::MovieStats => "moviestats",
            Command::RemoveSuggestion => "removesuggestion",
            Command::RateMovie => "ratemovie",
            Command::MovieReviews => "moviereviews",
            Command::SelectedMovies => "selectedmovies",
        }
    }
}

/// Command name to command, fixed at construction
#[derive(Debug, Clone)]
pub struct CommandTable {
    commands: HashMap<&'static str, Command>,
}

impl CommandTable {
    pub fn new() -> Self {
        let commands = Command::ALL.iter().map(|c| (c.name(), *c)).collect();
        Self { commands }
    }

    /// Names are matched case-insensitively, with or without a leading `/`
    pub fn lookup(&self, name: &str) -> Option<Command> {
        let name = name.trim().trim_start_matches('/').to_ascii_lowercase();
        self.commands.get(name.as_str()).copied()
    }

    /// Registered names, sorted
    pub fn names(&self) -> Vec<&'static str> {
        let mut names: Vec<&'static str> = self.commands.keys().copied().collect();
        names.sort_unstable();
        names
    }
}

impl Default for CommandTable {
    fn default() -> Self {
        Self::new()
    }
}

/// Collaborators shared by every handler
#[derive(Clone)]
pub struct Services {
    pub db: SqlitePool,
    pub lookup: Arc<dyn MetadataLookup>,
    pub sink: Arc<dyn OutputSink>,
}

/// Per-interaction view handed to handlers
pub(crate) struct Context<'a> {
    pub services: &'a Services,
    pub tenant_id: &'a str,
    pub actor: &'a Actor,
    options: Option<&'a BTreeMap<String, String>>,
}

impl<'a> Context<'a> {
    /// Required, non-blank option
    pub fn option(&self, name: &str) -> Result<&'a str> {
        self.optional(name)
            .ok_or_else(|| Error::InvalidInput(format!("Missing required option `{}`.", name)))
    }

    pub fn optional(&self, name: &str) -> Option<&'a str> {
        self.options
            .and_then(|options| options.get(name))
            .map(|value| value.trim())
            .filter(|value| !value.is_empty())
    }

    pub fn db(&self) -> &'a SqlitePool {
        &self.services.db
    }

    /// Poster URL for a catalog item, when the lookup knows one
    pub async fn poster_for(&self, external_ref: i64) -> Option<String> {
        let item = self.services.lookup.get_by_id(external_ref).await?;
        let poster_ref = item.poster_ref?;
        self.services.lookup.poster_url(&poster_ref)
    }
}

/// Routes interactions to handlers and renders every outcome as a [`Reply`]
pub struct CommandRouter {
    table: CommandTable,
    services: Services,
}

impl CommandRouter {
    pub fn new(services: Services) -> Self {
        Self {
            table: CommandTable::new(),
            services,
        }
    }

    pub fn table(&self) -> &CommandTable {
        &self.table
    }

    pub fn services(&self) -> &Services {
        &self.services
    }

    /// Handle one interaction; failures become user-facing replies
    pub async fn dispatch(&self, interaction: &Interaction) -> Reply {
        match self.handle(interaction).await {
            Ok(reply) => reply,
            Err(e) => error_reply(&e),
        }
    }

    async fn handle(&self, interaction: &Interaction) -> Result<Reply> {
        let tenant_id = interaction
            .tenant_id
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| {
                Error::InvalidInput("This command can only be used in a server.".to_string())
            })?;

        match &interaction.kind {
            InteractionKind::Command { name, options } => {
                let command = self
                    .table
                    .lookup(name)
                    .ok_or_else(|| Error::InvalidInput(format!("Unknown command `/{}`.", name)))?;

                debug!(tenant_id, command = command.name(), actor = %interaction.actor.id, "Dispatching command");

                let ctx = Context {
                    services: &self.services,
                    tenant_id,
                    actor: &interaction.actor,
                    options: Some(options),
                };
                self.run_command(command, &ctx).await
            }
            InteractionKind::Component { token } => {
                let affordance = Affordance::decode(token)?;
                if affordance.tenant() != tenant_id {
                    warn!(
                        tenant_id,
                        token_tenant = affordance.tenant(),
                        actor = %interaction.actor.id,
                        "Rejected token from another tenant"
                    );
                    return Err(Error::TenantMismatch);
                }

                let ctx = Context {
                    services: &self.services,
                    tenant_id,
                    actor: &interaction.actor,
                    options: None,
                };
                match affordance {
                    Affordance::Browse {
                        scope,
                        direction,
                        index,
                    } => browse::navigate(&ctx, &scope, direction, index).await,
                    Affordance::Reroll { suggestion_id, .. } => pick::reroll(&ctx, suggestion_id).await,
                    Affordance::Confirm { suggestion_id, .. } => {
                        pick::confirm(&ctx, suggestion_id).await
                    }
                }
            }
        }
    }

    async fn run_command(&self, command: Command, ctx: &Context<'_>) -> Result<Reply> {
        match command {
            Command::Setup => setup::setup(ctx).await,
            Command::Config => setup::show_config(ctx).await,
            Command::Suggestion => suggest::suggest(ctx).await,
            Command::MyStats => stats::my_stats(ctx).await,
            Command::MySuggestions => browse::my_suggestions(ctx).await,
            Command::Suggestions => browse::all_suggestions(ctx).await,
            Command::PickMovie => pick::pick_movie(ctx).await,
            Command::MovieStats => stats::movie_stats(ctx).await,
            Command::RemoveSuggestion => suggest::remove(ctx).await,
            Command::RateMovie => rating::rate_movie(ctx).await,
            Command::MovieReviews => rating::movie_reviews(ctx).await,
            Command::SelectedMovies => rating::selected_movies(ctx).await,
        }
    }
}

/// Render a failure for the actor; storage and internal failures are logged
/// and shown as a generic retry message
pub fn error_reply(err: &Error) -> Reply {
    let content = match err {
        Error::InvalidInput(message)
        | Error::NotFound(message)
        | Error::Unauthorized(message)
        | Error::TransportFailure(message) => format!("❌ {}", message),
        Error::InvalidScore(message) => format!("❌ Invalid rating! {}", message),
        Error::DuplicateSuggestion { .. } => {
            "⚠️ This movie has already been suggested in this server!".to_string()
        }
        Error::AlreadySelected { .. } => "⚠️ This movie has already been selected.".to_string(),
        Error::NotSelected { .. } => {
            "❌ You can only rate movies that have already been selected.".to_string()
        }
        Error::MalformedToken(reason) => {
            debug!(reason = %reason, "Rejected malformed token");
            "❌ This button is no longer valid. Please run the command again.".to_string()
        }
        Error::TenantMismatch => "❌ This selection is for a different server.".to_string(),
        Error::Database(_) | Error::Io(_) | Error::Config(_) | Error::Internal(_) => {
            error!(error = %err, "Interaction failed");
            "❌ An error occurred. Please try again.".to_string()
        }
    };

    Reply::private(content)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_contains_every_command() {
        let table = CommandTable::new();
        assert_eq!(table.names().len(), Command::ALL.len());
        for command in Command::ALL {
            assert_eq!(table.lookup(command.name()), Some(command));
        }
    }

    #[test]
    fn test_lookup_normalizes_name() {
        let table = CommandTable::new();
        assert_eq!(table.lookup("/PickMovie"), Some(Command::PickMovie));
        assert_eq!(table.lookup(" ratemovie "), Some(Command::RateMovie));
        assert_eq!(table.lookup("dance"), None);
    }

    #[test]
    fn test_interaction_json_shapes() {
        let command: Interaction = serde_json::from_str(
            r#"{"tenant_id":"g1","actor":{"id":"u1","name":"Ana"},
                "type":"command","name":"ratemovie",
                "options":{"movie":"heat","rating":"8,4"}}"#,
        )
        .unwrap();
        assert!(!command.actor.is_admin);
        match command.kind {
            InteractionKind::Command { name, options } => {
                assert_eq!(name, "ratemovie");
                assert_eq!(options["rating"], "8,4");
            }
            other => panic!("unexpected kind {:?}", other),
        }

        let component: Interaction = serde_json::from_str(
            r#"{"actor":{"id":"u1","name":"Ana","is_admin":true},"type":"component","token":"v1.x"}"#,
        )
        .unwrap();
        assert!(component.tenant_id.is_none());
        assert!(matches!(component.kind, InteractionKind::Component { ref token } if token == "v1.x"));
    }

    #[test]
    fn test_error_reply_hides_internal_details() {
        let reply = error_reply(&Error::Internal("pool exhausted".to_string()));
        let content = reply.content.unwrap();
        assert!(!content.contains("pool"));
        assert!(reply.ephemeral);

        let reply = error_reply(&Error::TenantMismatch);
        assert_eq!(reply.content.as_deref(), Some("❌ This selection is for a different server."));
    }
}

//! Affordance tokens
//!
//! Buttons carry every piece of state the next interaction needs, so the
//! bot keeps no session storage. A token is `v1.` followed by the URL-safe,
//! unpadded base64 of a JSON array `[kind, tenant, user, value]`:
//!
//! | kind        | user        | value          |
//! |-------------|-------------|----------------|
//! | `mine_prev` | browsing    | current index  |
//! | `mine_next` | browsing    | current index  |
//! | `all_prev`  | empty       | current index  |
//! | `all_next`  | empty       | current index  |
//! | `reroll`    | empty       | suggestion id  |
//! | `confirm`   | empty       | suggestion id  |
//!
//! Decoding is total: anything [`Affordance::encode`] did not produce is
//! rejected with [`Error::MalformedToken`].

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use clapper_common::{Error, Result};

const TOKEN_PREFIX: &str = "v1.";

/// Longest token accepted by [`Affordance::decode`]
pub const MAX_TOKEN_LEN: usize = 512;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Previous,
    Next,
}

/// Which list a browse view walks through
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BrowseScope {
    /// Every suggestion of the tenant
    Tenant(String),
    /// One user's suggestions: (tenant, user)
    User(String, String),
}

impl BrowseScope {
    pub fn tenant(&self) -> &str {
        match self {
            BrowseScope::Tenant(tenant) | BrowseScope::User(tenant, _) => tenant,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Affordance {
    Browse {
        scope: BrowseScope,
        direction: Direction,
        /// Index of the page currently shown
        index: i64,
    },
    Reroll {
        tenant: String,
        suggestion_id: i64,
    },
    Confirm {
        tenant: String,
        suggestion_id: i64,
    },
}

impl Affordance {
    /// Tenant the token was issued for
    pub fn tenant(&self) -> &str {
        match self {
            Affordance::Browse { scope, .. } => scope.tenant(),
            Affordance::Reroll { tenant, .. } | Affordance::Confirm { tenant, .. } => tenant,
        }
    }

    pub fn encode(&self) -> String {
        let (kind, tenant, user, value) = match self {
            Affordance::Browse {
                scope,
                direction,
                index,
            } => {
                let (prefix, tenant, user) = match scope {
                    BrowseScope::Tenant(tenant) => ("all", tenant.as_str(), ""),
                    BrowseScope::User(tenant, user) => ("mine", tenant.as_str(), user.as_str()),
                };
                let step = match direction {
                    Direction::Previous => "prev",
                    Direction::Next => "next",
                };
                (format!("{}_{}", prefix, step), tenant, user, *index)
            }
            Affordance::Reroll {
                tenant,
                suggestion_id,
            } => ("reroll".to_string(), tenant.as_str(), "", *suggestion_id),
            Affordance::Confirm {
                tenant,
                suggestion_id,
            } => ("confirm".to_string(), tenant.as_str(), "", *suggestion_id),
        };

        // A tuple of strings and an integer always serializes
        let payload = serde_json::to_vec(&(kind, tenant, user, value)).unwrap_or_default();
        format!("{}{}", TOKEN_PREFIX, URL_SAFE_NO_PAD.encode(payload))
    }

    pub fn decode(token: &str) -> Result<Self> {
        if token.len() > MAX_TOKEN_LEN {
            return Err(malformed("token too long"));
        }

        let body = token
            .strip_prefix(TOKEN_PREFIX)
            .ok_or_else(|| malformed("unknown version"))?;

        let payload = URL_SAFE_NO_PAD
            .decode(body)
            .map_err(|e| malformed(&format!("bad encoding: {}", e)))?;

        let (kind, tenant, user, value): (String, String, String, i64) =
            serde_json::from_slice(&payload).map_err(|e| malformed(&format!("bad payload: {}", e)))?;

        if tenant.is_empty() {
            return Err(malformed("missing tenant"));
        }

        let browse = |scope: BrowseScope, direction: Direction| Affordance::Browse {
            scope,
            direction,
            index: value,
        };

        let affordance = match kind.as_str() {
            "mine_prev" | "mine_next" => {
                if user.is_empty() {
                    return Err(malformed("missing user"));
                }
                let direction = if kind == "mine_prev" {
                    Direction::Previous
                } else {
                    Direction::Next
                };
                browse(BrowseScope::User(tenant, user), direction)
            }
            "all_prev" | "all_next" | "reroll" | "confirm" if !user.is_empty() => {
                return Err(malformed("unexpected user"));
            }
            "all_prev" => browse(BrowseScope::Tenant(tenant), Direction::Previous),
            "all_next" => browse(BrowseScope::Tenant(tenant), Direction::Next),
            "reroll" => Affordance::Reroll {
                tenant,
                suggestion_id: value,
            },
            "confirm" => Affordance::Confirm {
                tenant,
                suggestion_id: value,
            },
            other => return Err(malformed(&format!("unknown kind {:?}", other))),
        };

        Ok(affordance)
    }
}

fn malformed(reason: &str) -> Error {
    Error::MalformedToken(reason.to_string())
}

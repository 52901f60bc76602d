//! Selection engine
//!
//! A suggestion moves one way, from proposed to selected. Picking and
//! rerolling only read; confirming writes the selection row, whose primary
//! key admits a single winner when confirmations race.

use crate::affordance::Affordance;
use crate::router::Actor;
use crate::view::Button;
use clapper_common::db::{selections, suggestions, Suggestion};
use clapper_common::{Error, Result};
use rand::seq::SliceRandom;
use sqlx::SqlitePool;
use tracing::{debug, info};

/// Selected versus total suggestions of a tenant
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    pub selected: i64,
    pub total: i64,
}

impl Progress {
    pub fn remaining(&self) -> i64 {
        (self.total - self.selected).max(0)
    }

    /// `3/10 movies selected (7 remaining)`
    pub fn label(&self) -> String {
        format!(
            "{}/{} movies selected ({} remaining)",
            self.selected,
            self.total,
            self.remaining()
        )
    }
}

/// Uniform random choice among the tenant's unselected suggestions
///
/// `None` when every suggestion has been selected or none exist.
pub async fn pick_random(db: &SqlitePool, tenant_id: &str) -> Result<Option<Suggestion>> {
    let mut pool = suggestions::unselected_ids(db, tenant_id).await?;

    while !pool.is_empty() {
        let chosen = pool.choose(&mut rand::thread_rng()).copied();
        let Some(id) = chosen else { break };

        // The candidate may have been removed since the pool was read
        match suggestions::get(db, tenant_id, id).await? {
            Some(suggestion) => {
                debug!(tenant_id, suggestion_id = id, pool = pool.len(), "Picked candidate");
                return Ok(Some(suggestion));
            }
            None => pool.retain(|other| *other != id),
        }
    }

    Ok(None)
}

/// Draw another candidate; administrators only
///
/// Never touches selections. The previous candidate stays in the pool and
/// may be drawn again.
pub async fn reroll(db: &SqlitePool, tenant_id: &str, actor: &Actor) -> Result<Option<Suggestion>> {
    if !actor.is_admin {
        return Err(Error::Unauthorized(
            "Only administrators can reroll movies!".to_string(),
        ));
    }
    pick_random(db, tenant_id).await
}

/// Record the candidate as the tenant's selection; administrators only
///
/// Exactly one of several concurrent confirmations succeeds, the others get
/// [`Error::AlreadySelected`].
pub async fn confirm(
    db: &SqlitePool,
    tenant_id: &str,
    actor: &Actor,
    suggestion_id: i64,
) -> Result<Suggestion> {
    if !actor.is_admin {
        return Err(Error::Unauthorized(
            "Only administrators can confirm movie selections!".to_string(),
        ));
    }

    selections::insert(db, tenant_id, suggestion_id).await?;
    info!(tenant_id, suggestion_id, actor = %actor.id, "Selection confirmed");

    suggestions::get(db, tenant_id, suggestion_id)
        .await?
        .ok_or_else(|| Error::NotFound("Could not find movie information.".to_string()))
}

pub async fn progress(db: &SqlitePool, tenant_id: &str) -> Result<Progress> {
    Ok(Progress {
        selected: suggestions::count_selected(db, tenant_id).await?,
        total: suggestions::count_all(db, tenant_id).await?,
    })
}

/// Reroll and Confirm affordances for a candidate
pub fn candidate_buttons(tenant_id: &str, suggestion_id: i64) -> Vec<Button> {
    let reroll = Affordance::Reroll {
        tenant: tenant_id.to_string(),
        suggestion_id,
    };
    let confirm = Affordance::Confirm {
        tenant: tenant_id.to_string(),
        suggestion_id,
    };

    vec![
        Button::new("🔄 Reroll", reroll.encode(), true),
        Button::new("✅ Confirm Selection", confirm.encode(), true),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use clapper_common::db::{init_memory_database, NewSuggestion};
    use std::collections::HashSet;

    fn admin() -> Actor {
        Actor {
            id: "admin".to_string(),
            name: "Admin".to_string(),
            is_admin: true,
        }
    }

    fn member() -> Actor {
        Actor {
            id: "member".to_string(),
            name: "Member".to_string(),
            is_admin: false,
        }
    }

    async fn propose(db: &SqlitePool, tenant: &str, title: &str, external_ref: i64) -> i64 {
        suggestions::propose(
            db,
            tenant,
            &NewSuggestion {
                title: title.to_string(),
                external_ref,
                proposer_id: "u1".to_string(),
                proposer_name: "Ana".to_string(),
                score: 7.0,
                genre_summary: "Drama".to_string(),
                release_year: "2000".to_string(),
            },
        )
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn test_pick_from_empty_pool() {
        let db = init_memory_database().await.unwrap();
        assert!(pick_random(&db, "g1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_pick_never_returns_selected() {
        let db = init_memory_database().await.unwrap();
        let a = propose(&db, "g1", "A", 1).await;
        let b = propose(&db, "g1", "B", 2).await;
        confirm(&db, "g1", &admin(), a).await.unwrap();

        for _ in 0..20 {
            let picked = pick_random(&db, "g1").await.unwrap().unwrap();
            assert_eq!(picked.id, b);
        }

        confirm(&db, "g1", &admin(), b).await.unwrap();
        assert!(pick_random(&db, "g1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_pick_covers_pool() {
        let db = init_memory_database().await.unwrap();
        let expected: HashSet<i64> = [
            propose(&db, "g1", "A", 1).await,
            propose(&db, "g1", "B", 2).await,
            propose(&db, "g1", "C", 3).await,
        ]
        .into_iter()
        .collect();

        let mut seen = HashSet::new();
        for _ in 0..200 {
            seen.insert(pick_random(&db, "g1").await.unwrap().unwrap().id);
        }
        assert_eq!(seen, expected);
    }

    #[tokio::test]
    async fn test_pick_is_tenant_scoped() {
        let db = init_memory_database().await.unwrap();
        propose(&db, "g2", "Other", 1).await;
        assert!(pick_random(&db, "g1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_member_cannot_reroll_or_confirm() {
        let db = init_memory_database().await.unwrap();
        let id = propose(&db, "g1", "A", 1).await;

        assert!(matches!(reroll(&db, "g1", &member()).await, Err(Error::Unauthorized(_))));
        assert!(matches!(confirm(&db, "g1", &member(), id).await, Err(Error::Unauthorized(_))));
        assert!(!selections::is_selected(&db, "g1", id).await.unwrap());
    }

    #[tokio::test]
    async fn test_reroll_does_not_select() {
        let db = init_memory_database().await.unwrap();
        let id = propose(&db, "g1", "A", 1).await;

        let candidate = reroll(&db, "g1", &admin()).await.unwrap().unwrap();
        assert_eq!(candidate.id, id);
        assert_eq!(progress(&db, "g1").await.unwrap().selected, 0);
    }

    #[tokio::test]
    async fn test_second_confirm_is_already_selected() {
        let db = init_memory_database().await.unwrap();
        let id = propose(&db, "g1", "A", 1).await;

        let selected = confirm(&db, "g1", &admin(), id).await.unwrap();
        assert_eq!(selected.id, id);
        assert!(matches!(
            confirm(&db, "g1", &admin(), id).await,
            Err(Error::AlreadySelected { .. })
        ));

        let progress = progress(&db, "g1").await.unwrap();
        assert_eq!(progress, Progress { selected: 1, total: 1 });
        assert_eq!(progress.label(), "1/1 movies selected (0 remaining)");
    }

    #[test]
    fn test_candidate_buttons_encode_affordances() {
        let buttons = candidate_buttons("g1", 42);
        assert_eq!(buttons.len(), 2);
        assert_eq!(
            Affordance::decode(&buttons[0].token).unwrap(),
            Affordance::Reroll {
                tenant: "g1".to_string(),
                suggestion_id: 42
            }
        );
        assert_eq!(
            Affordance::decode(&buttons[1].token).unwrap(),
            Affordance::Confirm {
                tenant: "g1".to_string(),
                suggestion_id: 42
            }
        );
    }
}

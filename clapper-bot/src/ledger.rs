//! Review ledger
//!
//! One review per member per selected movie. Scores are validated before
//! the store is touched.

use crate::router::Actor;
use clapper_common::db::{reviews, NewReview, RateOutcome, Review, SelectedMovie};
use clapper_common::{Error, Result};
use sqlx::SqlitePool;

pub const MIN_SCORE: f64 = 0.0;
pub const MAX_SCORE: f64 = 10.0;

/// Parse a score typed by a member; `8,4` and `8.4` are equivalent
pub fn parse_score(text: &str) -> Result<f64> {
    let normalized = text.trim().replace(',', ".");
    let score = normalized.parse::<f64>().map_err(|_| {
        Error::InvalidScore("Please provide a valid number (e.g., 8.4 or 9).".to_string())
    })?;
    validate_score(score)?;
    Ok(score)
}

pub fn validate_score(score: f64) -> Result<()> {
    if !score.is_finite() || !(MIN_SCORE..=MAX_SCORE).contains(&score) {
        return Err(Error::InvalidScore(
            "Please provide a rating between 0 and 10.".to_string(),
        ));
    }
    Ok(())
}

/// Add or replace the actor's review of a selected suggestion
pub async fn rate(
    db: &SqlitePool,
    tenant_id: &str,
    suggestion_id: i64,
    reviewer: &Actor,
    score: f64,
    comment: Option<&str>,
) -> Result<RateOutcome> {
    validate_score(score)?;

    let review = NewReview {
        suggestion_id,
        reviewer_id: reviewer.id.clone(),
        reviewer_name: reviewer.name.clone(),
        score,
        comment: comment
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(str::to_string),
    };

    reviews::upsert(db, tenant_id, &review).await
}

/// Mean score and number of reviews; (0, 0) without reviews
pub async fn average_and_count(
    db: &SqlitePool,
    tenant_id: &str,
    suggestion_id: i64,
) -> Result<(f64, i64)> {
    reviews::average_and_count(db, tenant_id, suggestion_id).await
}

/// Every review of a suggestion, newest first
pub async fn list_reviews(db: &SqlitePool, tenant_id: &str, suggestion_id: i64) -> Result<Vec<Review>> {
    reviews::list(db, tenant_id, suggestion_id).await
}

/// Selected movies with their community rating, newest selection first
pub async fn selected_movies(db: &SqlitePool, tenant_id: &str) -> Result<Vec<SelectedMovie>> {
    reviews::selected_movies(db, tenant_id).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use clapper_common::db::{init_memory_database, selections, suggestions, NewSuggestion};

    fn reviewer(id: &str) -> Actor {
        Actor {
            id: id.to_string(),
            name: id.to_uppercase(),
            is_admin: false,
        }
    }

    #[test]
    fn test_parse_score_accepts_comma() {
        assert_eq!(parse_score(" 8,4 ").unwrap(), 8.4);
        assert_eq!(parse_score("9").unwrap(), 9.0);
        assert_eq!(parse_score("0").unwrap(), 0.0);
        assert_eq!(parse_score("10").unwrap(), 10.0);
    }

    #[test]
    fn test_parse_score_rejects_out_of_range_and_garbage() {
        for text in ["", "abc", "10.01", "-0.5", "NaN", "inf", "8.4.1"] {
            assert!(
                matches!(parse_score(text), Err(Error::InvalidScore(_))),
                "accepted {:?}",
                text
            );
        }
    }

    #[tokio::test]
    async fn test_invalid_score_checked_before_store() {
        let db = init_memory_database().await.unwrap();
        // No such suggestion: the score check must fail first
        let result = rate(&db, "g1", 999, &reviewer("u2"), f64::NAN, None).await;
        assert!(matches!(result, Err(Error::InvalidScore(_))));

        let result = rate(&db, "g1", 999, &reviewer("u2"), 11.0, None).await;
        assert!(matches!(result, Err(Error::InvalidScore(_))));
    }

    #[tokio::test]
    async fn test_rate_then_rerate() {
        let db = init_memory_database().await.unwrap();
        let id = suggestions::propose(
            &db,
            "g1",
            &NewSuggestion {
                title: "Heat".to_string(),
                external_ref: 949,
                proposer_id: "u1".to_string(),
                proposer_name: "Ana".to_string(),
                score: 7.9,
                genre_summary: "Crime".to_string(),
                release_year: "1995".to_string(),
            },
        )
        .await
        .unwrap();

        let before = rate(&db, "g1", id, &reviewer("u2"), 5.0, None).await;
        assert!(matches!(before, Err(Error::NotSelected { .. })));

        selections::insert(&db, "g1", id).await.unwrap();

        let first = rate(&db, "g1", id, &reviewer("u2"), 8.4, Some(" Great ")).await.unwrap();
        assert_eq!(first, RateOutcome::Added);
        let second = rate(&db, "g1", id, &reviewer("u2"), 6.0, Some("   ")).await.unwrap();
        assert_eq!(second, RateOutcome::Updated);

        let reviews = list_reviews(&db, "g1", id).await.unwrap();
        assert_eq!(reviews.len(), 1);
        assert_eq!(reviews[0].comment, None);
        assert_eq!(average_and_count(&db, "g1", id).await.unwrap(), (6.0, 1));
    }
}

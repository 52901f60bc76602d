//! Review queries
//!
//! One review per (tenant, suggestion, reviewer). Resubmission replaces the
//! earlier score and comment; it never adds a second row.

use crate::db::models::{NewReview, RateOutcome, Review, SelectedMovie, Suggestion};
use crate::{Error, Result};
use chrono::{DateTime, Utc};
use sqlx::{FromRow, SqlitePool};
use tracing::info;

/// Insert or replace a review on a selected suggestion
///
/// The update is attempted first so the transaction holds the write lock
/// before it checks the selection; two submissions from the same reviewer
/// therefore serialize and the second reports [`RateOutcome::Updated`].
pub async fn upsert(db: &SqlitePool, tenant_id: &str, review: &NewReview) -> Result<RateOutcome> {
    let reviewed_at = crate::time::now();
    let mut tx = db.begin().await?;

    let updated = sqlx::query(
        r#"
        UPDATE reviews
        SET reviewer_name = ?, score = ?, comment = ?, reviewed_at = ?
        WHERE tenant_id = ? AND suggestion_id = ? AND reviewer_id = ?
        "#,
    )
    .bind(&review.reviewer_name)
    .bind(review.score)
    .bind(&review.comment)
    .bind(reviewed_at)
    .bind(tenant_id)
    .bind(review.suggestion_id)
    .bind(&review.reviewer_id)
    .execute(&mut *tx)
    .await?
    .rows_affected();

    let outcome = if updated > 0 {
        RateOutcome::Updated
    } else {
        let selected: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM selections WHERE tenant_id = ? AND suggestion_id = ?)",
        )
        .bind(tenant_id)
        .bind(review.suggestion_id)
        .fetch_one(&mut *tx)
        .await?;

        if !selected {
            return Err(Error::NotSelected {
                suggestion_id: review.suggestion_id,
            });
        }

        sqlx::query(
            r#"
            INSERT INTO reviews (tenant_id, suggestion_id, reviewer_id, reviewer_name,
                                 score, comment, reviewed_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(tenant_id)
        .bind(review.suggestion_id)
        .bind(&review.reviewer_id)
        .bind(&review.reviewer_name)
        .bind(review.score)
        .bind(&review.comment)
        .bind(reviewed_at)
        .execute(&mut *tx)
        .await?;

        RateOutcome::Added
    };

    tx.commit().await?;

    info!(
        tenant_id,
        suggestion_id = review.suggestion_id,
        reviewer_id = %review.reviewer_id,
        outcome = outcome.as_str(),
        "Review saved"
    );
    Ok(outcome)
}

/// A reviewer's current review of a suggestion
pub async fn get(
    db: &SqlitePool,
    tenant_id: &str,
    suggestion_id: i64,
    reviewer_id: &str,
) -> Result<Option<Review>> {
    let review = sqlx::query_as::<_, Review>(
        r#"
        SELECT id, tenant_id, suggestion_id, reviewer_id, reviewer_name, score, comment, reviewed_at
        FROM reviews
        WHERE tenant_id = ? AND suggestion_id = ? AND reviewer_id = ?
        "#,
    )
    .bind(tenant_id)
    .bind(suggestion_id)
    .bind(reviewer_id)
    .fetch_optional(db)
    .await?;

    Ok(review)
}

/// Average score and review count; the average is 0 without reviews
pub async fn average_and_count(
    db: &SqlitePool,
    tenant_id: &str,
    suggestion_id: i64,
) -> Result<(f64, i64)> {
    let (average, count): (f64, i64) = sqlx::query_as(
        r#"
        SELECT COALESCE(AVG(score), 0.0), COUNT(*)
        FROM reviews
        WHERE tenant_id = ? AND suggestion_id = ?
        "#,
    )
    .bind(tenant_id)
    .bind(suggestion_id)
    .fetch_one(db)
    .await?;

    Ok((average, count))
}

/// All reviews of a suggestion, newest first
pub async fn list(db: &SqlitePool, tenant_id: &str, suggestion_id: i64) -> Result<Vec<Review>> {
    let reviews = sqlx::query_as::<_, Review>(
        r#"
        SELECT id, tenant_id, suggestion_id, reviewer_id, reviewer_name, score, comment, reviewed_at
        FROM reviews
        WHERE tenant_id = ? AND suggestion_id = ?
        ORDER BY reviewed_at DESC, id DESC
        "#,
    )
    .bind(tenant_id)
    .bind(suggestion_id)
    .fetch_all(db)
    .await?;

    Ok(reviews)
}

#[derive(FromRow)]
struct SelectedRow {
    id: i64,
    tenant_id: String,
    title: String,
    external_ref: i64,
    proposer_id: String,
    proposer_name: String,
    score: f64,
    genre_summary: String,
    release_year: String,
    proposed_at: DateTime<Utc>,
    selected_at: DateTime<Utc>,
    average_score: f64,
    review_count: i64,
}

/// Selected suggestions with their review aggregates, newest selection first
pub async fn selected_movies(db: &SqlitePool, tenant_id: &str) -> Result<Vec<SelectedMovie>> {
    let rows = sqlx::query_as::<_, SelectedRow>(
        r#"
        SELECT s.id AS id, s.tenant_id AS tenant_id, s.title AS title,
               s.external_ref AS external_ref, s.proposer_id AS proposer_id,
               s.proposer_name AS proposer_name, s.score AS score,
               s.genre_summary AS genre_summary, s.release_year AS release_year,
               s.proposed_at AS proposed_at, sel.selected_at AS selected_at,
               COALESCE(AVG(r.score), 0.0) AS average_score,
               COUNT(r.id) AS review_count
        FROM suggestions s
        INNER JOIN selections sel ON sel.suggestion_id = s.id AND sel.tenant_id = s.tenant_id
        LEFT JOIN reviews r ON r.suggestion_id = s.id AND r.tenant_id = s.tenant_id
        WHERE s.tenant_id = ?
        GROUP BY s.id
        ORDER BY sel.selected_at DESC, s.id DESC
        "#,
    )
    .bind(tenant_id)
    .fetch_all(db)
    .await?;

    Ok(rows
        .into_iter()
        .map(|row| SelectedMovie {
            suggestion: Suggestion {
                id: row.id,
                tenant_id: row.tenant_id,
                title: row.title,
                external_ref: row.external_ref,
                proposer_id: row.proposer_id,
                proposer_name: row.proposer_name,
                score: row.score,
                genre_summary: row.genre_summary,
                release_year: row.release_year,
                proposed_at: row.proposed_at,
            },
            selected_at: row.selected_at,
            average_score: row.average_score,
            review_count: row.review_count,
        })
        .collect())
}

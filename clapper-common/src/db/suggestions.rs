//! Suggestion repository
//!
//! Durable store of per-tenant movie suggestions. The (tenant_id,
//! external_ref) unique constraint is the source of truth for duplicate
//! detection; removal deletes dependent selections and reviews in the same
//! transaction.

use crate::db::models::{NewSuggestion, Suggestion, SuggestionListing, UserStats};
use crate::{Error, Result};
use chrono::{DateTime, Utc};
use sqlx::{FromRow, SqlitePool};
use tracing::{debug, info};

const SUGGESTION_COLUMNS: &str = "s.id AS id, s.tenant_id AS tenant_id, s.title AS title, \
     s.external_ref AS external_ref, s.proposer_id AS proposer_id, s.proposer_name AS proposer_name, \
     s.score AS score, s.genre_summary AS genre_summary, s.release_year AS release_year, \
     s.proposed_at AS proposed_at";

#[derive(FromRow)]
struct ListingRow {
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
    is_selected: bool,
}

impl From<ListingRow> for SuggestionListing {
    fn from(row: ListingRow) -> Self {
        SuggestionListing {
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
            is_selected: row.is_selected,
        }
    }
}

/// Insert a suggestion and return its id
///
/// Fails with [`Error::DuplicateSuggestion`] when the catalog item was
/// already suggested in this tenant.
pub async fn propose(db: &SqlitePool, tenant_id: &str, new: &NewSuggestion) -> Result<i64> {
    let result = sqlx::query(
        r#"
        INSERT INTO suggestions (tenant_id, title, external_ref, proposer_id, proposer_name,
                                 score, genre_summary, release_year, proposed_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(tenant_id)
    .bind(&new.title)
    .bind(new.external_ref)
    .bind(&new.proposer_id)
    .bind(&new.proposer_name)
    .bind(new.score)
    .bind(&new.genre_summary)
    .bind(&new.release_year)
    .bind(crate::time::now())
    .execute(db)
    .await
    .map_err(Error::from);

    match result {
        Ok(done) => {
            let id = done.last_insert_rowid();
            info!(tenant_id, suggestion_id = id, title = %new.title, "Suggestion saved");
            Ok(id)
        }
        Err(e) if e.is_unique_violation() => Err(Error::DuplicateSuggestion {
            external_ref: new.external_ref,
        }),
        Err(e) => Err(e),
    }
}

/// Fetch one suggestion by id within the tenant
pub async fn get(db: &SqlitePool, tenant_id: &str, id: i64) -> Result<Option<Suggestion>> {
    let sql = format!(
        "SELECT {} FROM suggestions s WHERE s.tenant_id = ? AND s.id = ?",
        SUGGESTION_COLUMNS
    );
    let suggestion = sqlx::query_as::<_, Suggestion>(&sql)
        .bind(tenant_id)
        .bind(id)
        .fetch_optional(db)
        .await?;

    Ok(suggestion)
}

/// Find the suggestion for a catalog item
pub async fn find_by_external_ref(
    db: &SqlitePool,
    tenant_id: &str,
    external_ref: i64,
) -> Result<Option<Suggestion>> {
    let sql = format!(
        "SELECT {} FROM suggestions s WHERE s.tenant_id = ? AND s.external_ref = ?",
        SUGGESTION_COLUMNS
    );
    let suggestion = sqlx::query_as::<_, Suggestion>(&sql)
        .bind(tenant_id)
        .bind(external_ref)
        .fetch_optional(db)
        .await?;

    Ok(suggestion)
}

/// Case-insensitive substring match on title, first match by id
///
/// No relevance ranking: with overlapping titles the earliest suggestion
/// wins. When `proposer_id` is given only that user's suggestions match.
/// Case folding uses SQLite's `lower()`, which only folds ASCII letters:
/// "AMÉLIE" does not match "Amélie".
pub async fn find_by_fuzzy_title(
    db: &SqlitePool,
    tenant_id: &str,
    text: &str,
    proposer_id: Option<&str>,
) -> Result<Option<Suggestion>> {
    let sql = format!(
        r#"
        SELECT {}
        FROM suggestions s
        WHERE s.tenant_id = ?
          AND instr(lower(s.title), lower(?)) > 0
          AND (? IS NULL OR s.proposer_id = ?)
        ORDER BY s.id ASC
        LIMIT 1
        "#,
        SUGGESTION_COLUMNS
    );
    let suggestion = sqlx::query_as::<_, Suggestion>(&sql)
        .bind(tenant_id)
        .bind(text.trim())
        .bind(proposer_id)
        .bind(proposer_id)
        .fetch_optional(db)
        .await?;

    Ok(suggestion)
}

/// Same matching as [`find_by_fuzzy_title`], restricted to selected suggestions
pub async fn find_selected_by_fuzzy_title(
    db: &SqlitePool,
    tenant_id: &str,
    text: &str,
) -> Result<Option<Suggestion>> {
    let sql = format!(
        r#"
        SELECT {}
        FROM suggestions s
        INNER JOIN selections sel ON sel.suggestion_id = s.id AND sel.tenant_id = s.tenant_id
        WHERE s.tenant_id = ?
          AND instr(lower(s.title), lower(?)) > 0
        ORDER BY s.id ASC
        LIMIT 1
        "#,
        SUGGESTION_COLUMNS
    );
    let suggestion = sqlx::query_as::<_, Suggestion>(&sql)
        .bind(tenant_id)
        .bind(text.trim())
        .fetch_optional(db)
        .await?;

    Ok(suggestion)
}

/// Delete a suggestion together with its selection and reviews
///
/// Runs as one transaction; a concurrent reader sees either all rows or none.
pub async fn remove(db: &SqlitePool, tenant_id: &str, id: i64) -> Result<()> {
    let mut tx = db.begin().await?;

    // First statement is a write so the transaction takes the write lock up front
    let reviews = sqlx::query("DELETE FROM reviews WHERE tenant_id = ? AND suggestion_id = ?")
        .bind(tenant_id)
        .bind(id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

    let selections = sqlx::query("DELETE FROM selections WHERE tenant_id = ? AND suggestion_id = ?")
        .bind(tenant_id)
        .bind(id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

    let removed = sqlx::query("DELETE FROM suggestions WHERE tenant_id = ? AND id = ?")
        .bind(tenant_id)
        .bind(id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

    if removed == 0 {
        // Dropping the transaction rolls back the dependent deletes
        return Err(Error::NotFound(format!("suggestion {}", id)));
    }

    tx.commit().await?;

    info!(
        tenant_id,
        suggestion_id = id,
        reviews,
        selections,
        "Suggestion removed"
    );
    Ok(())
}

/// Number of suggestions in the tenant
pub async fn count_all(db: &SqlitePool, tenant_id: &str) -> Result<i64> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM suggestions WHERE tenant_id = ?")
        .bind(tenant_id)
        .fetch_one(db)
        .await?;
    Ok(count)
}

/// Number of selected suggestions in the tenant
pub async fn count_selected(db: &SqlitePool, tenant_id: &str) -> Result<i64> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM selections WHERE tenant_id = ?")
        .bind(tenant_id)
        .fetch_one(db)
        .await?;
    Ok(count)
}

async fn list(
    db: &SqlitePool,
    tenant_id: &str,
    proposer_id: Option<&str>,
) -> Result<Vec<SuggestionListing>> {
    let sql = format!(
        r#"
        SELECT {}, (sel.suggestion_id IS NOT NULL) AS is_selected
        FROM suggestions s
        LEFT JOIN selections sel ON sel.suggestion_id = s.id AND sel.tenant_id = s.tenant_id
        WHERE s.tenant_id = ?
          AND (? IS NULL OR s.proposer_id = ?)
        ORDER BY s.proposed_at DESC, s.id DESC
        "#,
        SUGGESTION_COLUMNS
    );
    let rows = sqlx::query_as::<_, ListingRow>(&sql)
        .bind(tenant_id)
        .bind(proposer_id)
        .bind(proposer_id)
        .fetch_all(db)
        .await?;

    debug!(tenant_id, ?proposer_id, count = rows.len(), "Listed suggestions");
    Ok(rows.into_iter().map(SuggestionListing::from).collect())
}

/// A user's suggestions, newest first
pub async fn list_for_user(
    db: &SqlitePool,
    tenant_id: &str,
    proposer_id: &str,
) -> Result<Vec<SuggestionListing>> {
    list(db, tenant_id, Some(proposer_id)).await
}

/// All of the tenant's suggestions, newest first
pub async fn list_all(db: &SqlitePool, tenant_id: &str) -> Result<Vec<SuggestionListing>> {
    list(db, tenant_id, None).await
}

/// Suggestion count and average catalog score for a proposer
pub async fn user_stats(db: &SqlitePool, tenant_id: &str, proposer_id: &str) -> Result<UserStats> {
    let (count, average_score): (i64, f64) = sqlx::query_as(
        r#"
        SELECT COUNT(*), COALESCE(AVG(score), 0.0)
        FROM suggestions
        WHERE tenant_id = ? AND proposer_id = ?
        "#,
    )
    .bind(tenant_id)
    .bind(proposer_id)
    .fetch_one(db)
    .await?;

    Ok(UserStats {
        count,
        average_score,
    })
}

/// Ids of the tenant's suggestions that have not been selected yet
pub async fn unselected_ids(db: &SqlitePool, tenant_id: &str) -> Result<Vec<i64>> {
    let ids: Vec<i64> = sqlx::query_scalar(
        r#"
        SELECT s.id
        FROM suggestions s
        LEFT JOIN selections sel ON sel.suggestion_id = s.id AND sel.tenant_id = s.tenant_id
        WHERE s.tenant_id = ? AND sel.suggestion_id IS NULL
        ORDER BY s.id ASC
        "#,
    )
    .bind(tenant_id)
    .fetch_all(db)
    .await?;

    Ok(ids)
}

//! Selection queries
//!
//! A row in `selections` moves a suggestion from proposed to selected.
//! The (tenant_id, suggestion_id) primary key guarantees at most one row per
//! suggestion even when confirmations race.

use crate::db::models::Selection;
use crate::{Error, Result};
use sqlx::SqlitePool;
use tracing::info;

/// Record the selection of a suggestion
///
/// Single statement: the row is only inserted when the suggestion exists in
/// the tenant. Returns [`Error::AlreadySelected`] when another confirmation
/// won, [`Error::NotFound`] when the suggestion does not exist.
pub async fn insert(db: &SqlitePool, tenant_id: &str, suggestion_id: i64) -> Result<Selection> {
    let selected_at = crate::time::now();

    let result = sqlx::query(
        r#"
        INSERT INTO selections (tenant_id, suggestion_id, selected_at)
        SELECT s.tenant_id, s.id, ?
        FROM suggestions s
        WHERE s.tenant_id = ? AND s.id = ?
        "#,
    )
    .bind(selected_at)
    .bind(tenant_id)
    .bind(suggestion_id)
    .execute(db)
    .await
    .map_err(Error::from);

    match result {
        Ok(done) if done.rows_affected() == 0 => {
            Err(Error::NotFound(format!(
                "Could not find movie suggestion {}.",
                suggestion_id
            )))
        }
        Ok(_) => {
            info!(tenant_id, suggestion_id, "Selection recorded");
            Ok(Selection {
                tenant_id: tenant_id.to_string(),
                suggestion_id,
                selected_at,
            })
        }
        Err(e) if e.is_unique_violation() => Err(Error::AlreadySelected { suggestion_id }),
        Err(e) => Err(e),
    }
}

/// Load the selection for a suggestion, if any
pub async fn get(db: &SqlitePool, tenant_id: &str, suggestion_id: i64) -> Result<Option<Selection>> {
    let selection = sqlx::query_as::<_, Selection>(
        r#"
        SELECT tenant_id, suggestion_id, selected_at
        FROM selections
        WHERE tenant_id = ? AND suggestion_id = ?
        "#,
    )
    .bind(tenant_id)
    .bind(suggestion_id)
    .fetch_optional(db)
    .await?;

    Ok(selection)
}

/// Whether the suggestion has been selected
pub async fn is_selected(db: &SqlitePool, tenant_id: &str, suggestion_id: i64) -> Result<bool> {
    Ok(get(db, tenant_id, suggestion_id).await?.is_some())
}

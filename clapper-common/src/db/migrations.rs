//! Database schema migrations
//!
//! Versioned schema migrations applied once at initialization, in order,
//! before any query code runs. Applied versions are tracked in the
//! `schema_version` table.
//!
//! # Migration Guidelines
//!
//! 1. **Never modify existing migrations** - They must remain stable for users upgrading from older versions
//! 2. **Always add new migrations** - Append a new entry to [`MIGRATIONS`] for each schema change
//! 3. **Keep statements idempotent** - `IF NOT EXISTS` everywhere, so a partially applied
//!    version can be re-run safely
//!
//! Each migration runs inside one transaction together with its
//! `schema_version` row, so a version is either fully applied or not at all.

use crate::Result;
use sqlx::SqlitePool;
use tracing::{info, warn};

/// One schema change: an ordered list of idempotent statements
#[derive(Debug)]
pub struct Migration {
    pub version: i32,
    pub description: &'static str,
    pub statements: &'static [&'static str],
}

/// All migrations, ordered by version
pub const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        description: "Create suggestions, selections and reviews tables",
        statements: &[
            r#"
            CREATE TABLE IF NOT EXISTS suggestions (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                tenant_id TEXT NOT NULL,
                title TEXT NOT NULL,
                external_ref INTEGER NOT NULL,
                proposer_id TEXT NOT NULL,
                proposer_name TEXT NOT NULL,
                score REAL NOT NULL DEFAULT 0,
                genre_summary TEXT NOT NULL DEFAULT '',
                release_year TEXT NOT NULL DEFAULT '',
                proposed_at TIMESTAMP NOT NULL,
                UNIQUE (tenant_id, external_ref)
            )
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS selections (
                tenant_id TEXT NOT NULL,
                suggestion_id INTEGER NOT NULL,
                selected_at TIMESTAMP NOT NULL,
                PRIMARY KEY (tenant_id, suggestion_id),
                FOREIGN KEY (suggestion_id) REFERENCES suggestions(id) ON DELETE CASCADE
            )
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS reviews (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                tenant_id TEXT NOT NULL,
                suggestion_id INTEGER NOT NULL,
                reviewer_id TEXT NOT NULL,
                reviewer_name TEXT NOT NULL,
                score REAL NOT NULL CHECK (score >= 0 AND score <= 10),
                comment TEXT,
                reviewed_at TIMESTAMP NOT NULL,
                UNIQUE (tenant_id, suggestion_id, reviewer_id),
                FOREIGN KEY (suggestion_id) REFERENCES suggestions(id) ON DELETE CASCADE
            )
            "#,
            "CREATE INDEX IF NOT EXISTS idx_suggestions_tenant ON suggestions(tenant_id)",
            "CREATE INDEX IF NOT EXISTS idx_suggestions_tenant_proposer ON suggestions(tenant_id, proposer_id)",
            "CREATE INDEX IF NOT EXISTS idx_selections_suggestion ON selections(suggestion_id)",
            "CREATE INDEX IF NOT EXISTS idx_reviews_tenant_suggestion ON reviews(tenant_id, suggestion_id)",
        ],
    },
    Migration {
        version: 2,
        description: "Create tenant_configs table",
        statements: &[
            r#"
            CREATE TABLE IF NOT EXISTS tenant_configs (
                tenant_id TEXT PRIMARY KEY,
                output_channel TEXT NOT NULL,
                configured_at TIMESTAMP NOT NULL
            )
            "#,
        ],
    },
    Migration {
        version: 3,
        description: "Add ordering indexes for newest-first listings",
        statements: &[
            "CREATE INDEX IF NOT EXISTS idx_suggestions_tenant_proposed_at ON suggestions(tenant_id, proposed_at)",
            "CREATE INDEX IF NOT EXISTS idx_selections_tenant_selected_at ON selections(tenant_id, selected_at)",
            "CREATE INDEX IF NOT EXISTS idx_reviews_reviewed_at ON reviews(tenant_id, suggestion_id, reviewed_at)",
        ],
    },
];

/// Current schema version (highest entry in [`MIGRATIONS`])
pub fn current_schema_version() -> i32 {
    MIGRATIONS.last().map(|m| m.version).unwrap_or(0)
}

async fn create_schema_version_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Get current schema version from database
///
/// Returns 0 if schema_version table doesn't exist or has no rows
pub async fn get_schema_version(pool: &SqlitePool) -> Result<i32> {
    let table_exists: bool = sqlx::query_scalar(
        r#"
        SELECT EXISTS(
            SELECT 1 FROM sqlite_master
            WHERE type='table' AND name='schema_version'
        )
        "#,
    )
    .fetch_one(pool)
    .await?;

    if !table_exists {
        return Ok(0);
    }

    let version: Option<i32> =
        sqlx::query_scalar("SELECT version FROM schema_version ORDER BY version DESC LIMIT 1")
            .fetch_optional(pool)
            .await?;

    Ok(version.unwrap_or(0))
}

async fn apply_migration(pool: &SqlitePool, migration: &Migration) -> Result<()> {
    let mut tx = pool.begin().await?;

    for statement in migration.statements {
        sqlx::query(statement).execute(&mut *tx).await?;
    }

    sqlx::query("INSERT OR IGNORE INTO schema_version (version) VALUES (?)")
        .bind(migration.version)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    Ok(())
}

/// Run all pending migrations
pub async fn run_migrations(pool: &SqlitePool) -> Result<()> {
    create_schema_version_table(pool).await?;

    let current_version = get_schema_version(pool).await?;
    let target_version = current_schema_version();

    if current_version == target_version {
        info!("Database schema is up to date (v{})", current_version);
        return Ok(());
    }

    if current_version > target_version {
        warn!(
            "Database schema version ({}) is newer than code version ({})",
            current_version, target_version
        );
        warn!("This may indicate a downgrade. Proceeding with caution.");
        return Ok(());
    }

    info!(
        "Running database migrations: v{} -> v{}",
        current_version, target_version
    );

    for migration in MIGRATIONS.iter().filter(|m| m.version > current_version) {
        info!("Running migration v{}: {}", migration.version, migration.description);
        apply_migration(pool, migration).await?;
        info!("✓ Migration v{} completed", migration.version);
    }

    info!("All migrations completed successfully");
    Ok(())
}

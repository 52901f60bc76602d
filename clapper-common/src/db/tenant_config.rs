//! Tenant configuration queries
//!
//! Maps a tenant to the channel its suggestions are posted to.

use crate::db::models::TenantConfig;
use crate::Result;
use sqlx::SqlitePool;

/// Create or overwrite the tenant's output channel
pub async fn save(db: &SqlitePool, tenant_id: &str, output_channel: &str) -> Result<TenantConfig> {
    let config = sqlx::query_as::<_, TenantConfig>(
        r#"
        INSERT INTO tenant_configs (tenant_id, output_channel, configured_at)
        VALUES (?, ?, ?)
        ON CONFLICT(tenant_id)
        DO UPDATE SET output_channel = excluded.output_channel,
                      configured_at = excluded.configured_at
        RETURNING tenant_id, output_channel, configured_at
        "#,
    )
    .bind(tenant_id)
    .bind(output_channel)
    .bind(crate::time::now())
    .fetch_one(db)
    .await?;

    tracing::info!(tenant_id, output_channel, "Tenant configuration saved");
    Ok(config)
}

/// Load the tenant's configuration, if an administrator has set one
pub async fn get(db: &SqlitePool, tenant_id: &str) -> Result<Option<TenantConfig>> {
    let config = sqlx::query_as::<_, TenantConfig>(
        "SELECT tenant_id, output_channel, configured_at FROM tenant_configs WHERE tenant_id = ?",
    )
    .bind(tenant_id)
    .fetch_optional(db)
    .await?;

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_memory_database;

    #[tokio::test]
    async fn test_get_missing_config() {
        let pool = init_memory_database().await.unwrap();
        assert!(get(&pool, "guild-1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_save_overwrites_existing_channel() {
        let pool = init_memory_database().await.unwrap();

        save(&pool, "guild-1", "channel-a").await.unwrap();
        let updated = save(&pool, "guild-1", "channel-b").await.unwrap();
        assert_eq!(updated.output_channel, "channel-b");

        let loaded = get(&pool, "guild-1").await.unwrap().unwrap();
        assert_eq!(loaded.output_channel, "channel-b");

        let rows: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM tenant_configs")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(rows, 1);
    }

    #[tokio::test]
    async fn test_configs_are_per_tenant() {
        let pool = init_memory_database().await.unwrap();

        save(&pool, "guild-1", "channel-a").await.unwrap();
        save(&pool, "guild-2", "channel-b").await.unwrap();

        assert_eq!(get(&pool, "guild-1").await.unwrap().unwrap().output_channel, "channel-a");
        assert_eq!(get(&pool, "guild-2").await.unwrap().unwrap().output_channel, "channel-b");
    }
}

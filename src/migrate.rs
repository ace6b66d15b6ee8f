//! Idempotent schema setup for the `reviews` table.

use anyhow::Result;
use sqlx::SqlitePool;

use crate::config::Config;
use crate::db;

pub async fn run_migrations(config: &Config) -> Result<()> {
    let pool = db::connect(config).await?;
    migrate_pool(&pool).await?;
    pool.close().await;
    Ok(())
}

/// Create tables and indexes on an open pool. Safe to run repeatedly.
pub async fn migrate_pool(pool: &SqlitePool) -> Result<()> {
    // authors, tags and impact metrics are JSON text; timestamps are unix seconds
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS reviews (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            nid TEXT NOT NULL,
            slug TEXT NOT NULL,
            title TEXT NOT NULL,
            review_summary TEXT NOT NULL DEFAULT '',
            content TEXT NOT NULL DEFAULT '',
            authors_json TEXT NOT NULL DEFAULT '[]',
            doi TEXT NOT NULL DEFAULT '',
            domain TEXT NOT NULL DEFAULT '',
            tags_json TEXT NOT NULL DEFAULT '[]',
            version TEXT NOT NULL DEFAULT '1.0',
            word_count INTEGER NOT NULL DEFAULT 0,
            estimated_reading_time INTEGER NOT NULL DEFAULT 0,
            review_author TEXT,
            impact_metrics_json TEXT,
            reuse_license TEXT,
            source_attribution TEXT,
            published INTEGER NOT NULL DEFAULT 1,
            created_at INTEGER NOT NULL,
            last_updated INTEGER NOT NULL,
            UNIQUE(nid, slug)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_reviews_domain ON reviews(domain)")
        .execute(pool)
        .await?;
    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_reviews_last_updated ON reviews(last_updated DESC)",
    )
    .execute(pool)
    .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_reviews_published ON reviews(published)")
        .execute(pool)
        .await?;

    Ok(())
}

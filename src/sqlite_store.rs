//! SQLite-backed [`ReviewStore`] implementation.
//!
//! Domain and year narrowing run in SQL; tag matching and fuzzy ranking
//! then run in memory through [`coarse_search`], so the server and the
//! discovery controller share one search semantics.

use anyhow::{bail, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

use mlp_reviews_core::models::{NewReview, RepositoryFilters, Review};
use mlp_reviews_core::store::{coarse_search, distinct_tags, ReviewStore};

const REVIEW_COLUMNS: &str = "id, nid, slug, title, review_summary, content, authors_json, doi, \
    domain, tags_json, version, word_count, estimated_reading_time, review_author, \
    impact_metrics_json, reuse_license, source_attribution, published, created_at, last_updated";

/// SQLite implementation of the [`ReviewStore`] trait.
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn count(&self) -> Result<i64> {
        let n: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM reviews")
            .fetch_one(&self.pool)
            .await?;
        Ok(n)
    }

    /// Insert a fully-formed review, keeping its timestamps. Used by seeding.
    pub async fn insert_review(&self, review: &Review) -> Result<i64> {
        let authors_json = serde_json::to_string(&review.authors)?;
        let tags_json = serde_json::to_string(&review.tags)?;
        let impact_json = review
            .impact_metrics
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;

        let result = sqlx::query(
            r#"
            INSERT INTO reviews (nid, slug, title, review_summary, content, authors_json, doi,
                                 domain, tags_json, version, word_count, estimated_reading_time,
                                 review_author, impact_metrics_json, reuse_license,
                                 source_attribution, published, created_at, last_updated)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&review.nid)
        .bind(&review.slug)
        .bind(&review.title)
        .bind(&review.review_summary)
        .bind(&review.content)
        .bind(&authors_json)
        .bind(&review.doi)
        .bind(&review.domain)
        .bind(&tags_json)
        .bind(&review.version)
        .bind(review.word_count as i64)
        .bind(review.estimated_reading_time as i64)
        .bind(&review.review_author)
        .bind(&impact_json)
        .bind(&review.reuse_license)
        .bind(&review.source_attribution)
        .bind(review.published)
        .bind(review.created_at.timestamp())
        .bind(review.last_updated.timestamp())
        .execute(&self.pool)
        .await?;

        Ok(result.last_insert_rowid())
    }

    async fn fetch_published(&self, extra_where: &str, binds: &[String]) -> Result<Vec<Review>> {
        let sql = format!(
            "SELECT {} FROM reviews WHERE published = 1{} ORDER BY last_updated DESC, id DESC",
            REVIEW_COLUMNS, extra_where
        );
        let mut query = sqlx::query(&sql);
        for value in binds {
            query = query.bind(value);
        }
        let rows = query.fetch_all(&self.pool).await?;
        Ok(rows.iter().map(row_to_review).collect())
    }

    async fn exists(&self, nid: &str, slug: &str) -> Result<bool> {
        let n: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM reviews WHERE nid = ? AND slug = ?")
            .bind(nid)
            .bind(slug)
            .fetch_one(&self.pool)
            .await?;
        Ok(n > 0)
    }
}

fn from_unix(secs: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(secs, 0).unwrap_or_default()
}

fn row_to_review(row: &SqliteRow) -> Review {
    let authors_json: String = row.get("authors_json");
    let tags_json: String = row.get("tags_json");
    let impact_json: Option<String> = row.get("impact_metrics_json");
    let word_count: i64 = row.get("word_count");
    let reading_time: i64 = row.get("estimated_reading_time");

    Review {
        id: row.get("id"),
        nid: row.get("nid"),
        slug: row.get("slug"),
        title: row.get("title"),
        review_summary: row.get("review_summary"),
        content: row.get("content"),
        authors: serde_json::from_str(&authors_json).unwrap_or_default(),
        doi: row.get("doi"),
        domain: row.get("domain"),
        tags: serde_json::from_str(&tags_json).unwrap_or_default(),
        version: row.get("version"),
        word_count: word_count.max(0) as u32,
        estimated_reading_time: reading_time.max(0) as u32,
        review_author: row.get("review_author"),
        impact_metrics: impact_json.and_then(|s| serde_json::from_str(&s).ok()),
        reuse_license: row.get("reuse_license"),
        source_attribution: row.get("source_attribution"),
        published: row.get("published"),
        created_at: from_unix(row.get("created_at")),
        last_updated: from_unix(row.get("last_updated")),
    }
}

#[async_trait]
impl ReviewStore for SqliteStore {
    async fn list_published(&self) -> Result<Vec<Review>> {
        self.fetch_published("", &[]).await
    }

    async fn search(&self, query: &str, filters: &RepositoryFilters) -> Result<Vec<Review>> {
        let mut clauses = String::new();
        let mut binds = Vec::new();

        if let Some(domain) = filters.domain.as_deref().filter(|d| !d.trim().is_empty()) {
            clauses.push_str(" AND domain = ?");
            binds.push(domain.to_string());
        }
        if let Some(year) = filters.year_constraint() {
            clauses.push_str(" AND strftime('%Y', last_updated, 'unixepoch') = ?");
            binds.push(format!("{:04}", year));
        }

        let candidates = self.fetch_published(&clauses, &binds).await?;
        Ok(coarse_search(candidates, query, filters))
    }

    async fn get_by_nid_and_slug(&self, nid: &str, slug: &str) -> Result<Option<Review>> {
        let sql = format!(
            "SELECT {} FROM reviews WHERE nid = ? AND slug = ? AND published = 1",
            REVIEW_COLUMNS
        );
        let row = sqlx::query(&sql)
            .bind(nid)
            .bind(slug)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.as_ref().map(row_to_review))
    }

    async fn list_domains(&self) -> Result<Vec<String>> {
        let domains: Vec<String> = sqlx::query_scalar(
            "SELECT DISTINCT domain FROM reviews WHERE published = 1 AND domain != '' ORDER BY domain",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(domains)
    }

    async fn list_tags(&self) -> Result<Vec<String>> {
        let published = self.list_published().await?;
        Ok(distinct_tags(&published))
    }

    async fn list_by_domain(&self, domain: &str) -> Result<Vec<Review>> {
        self.fetch_published(" AND domain = ?", &[domain.to_string()])
            .await
    }

    async fn list_by_tag(&self, tag: &str) -> Result<Vec<Review>> {
        Ok(self
            .list_published()
            .await?
            .into_iter()
            .filter(|r| r.tags.iter().any(|t| t == tag))
            .collect())
    }

    async fn create_review(&self, review: NewReview) -> Result<Review> {
        let review = review.validate()?;
        if self.exists(&review.nid, &review.slug).await? {
            bail!(
                "invalid review: nid '{}' with slug '{}' already exists",
                review.nid,
                review.slug
            );
        }

        // stored at second precision; return exactly what a later read sees
        let now = from_unix(Utc::now().timestamp());
        let mut stored = review.into_review(0, now);
        stored.id = self.insert_review(&stored).await?;

        tracing::info!(id = stored.id, nid = %stored.nid, slug = %stored.slug, "created review");
        Ok(stored)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;
    use crate::migrate::migrate_pool;
    use chrono::TimeZone;
    use tempfile::TempDir;

    async fn setup() -> (TempDir, SqliteStore) {
        let tmp = TempDir::new().unwrap();
        let pool = db::connect_path(&tmp.path().join("test.sqlite")).await.unwrap();
        migrate_pool(&pool).await.unwrap();
        (tmp, SqliteStore::new(pool))
    }

    fn new_review(nid: &str, slug: &str, title: &str) -> NewReview {
        NewReview {
            nid: nid.to_string(),
            slug: slug.to_string(),
            title: title.to_string(),
            review_summary: "A summary".to_string(),
            content: "Body".to_string(),
            authors: vec!["Chen, L.".to_string()],
            doi: "10.1000/1".to_string(),
            domain: "Machine Learning".to_string(),
            tags: vec!["NLP".to_string(), "NLP".to_string(), "Attention".to_string()],
            version: "1.0".to_string(),
            word_count: 1200,
            estimated_reading_time: 6,
            review_author: None,
            impact_metrics: Some(serde_json::json!({ "citations": 12 })),
            reuse_license: None,
            source_attribution: None,
            published: true,
        }
    }

    #[tokio::test]
    async fn test_create_and_lookup() {
        let (_tmp, store) = setup().await;
        let created = store
            .create_review(new_review("1", "transformers", "Transformers"))
            .await
            .unwrap();
        assert_eq!(created.tags, vec!["NLP", "Attention"]);

        let fetched = store
            .get_by_nid_and_slug("1", "transformers")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(fetched, created);
        assert!(store.get_by_nid_and_slug("1", "nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_rejected() {
        let (_tmp, store) = setup().await;
        store.create_review(new_review("1", "a", "A")).await.unwrap();
        let err = store.create_review(new_review("1", "a", "A")).await.unwrap_err();
        assert!(err.to_string().contains("already exists"));
    }

    #[tokio::test]
    async fn test_drafts_hidden() {
        let (_tmp, store) = setup().await;
        let mut draft = new_review("2", "draft", "Draft");
        draft.published = false;
        draft.domain = "Hidden".to_string();
        store.create_review(draft).await.unwrap();
        store.create_review(new_review("1", "a", "A")).await.unwrap();

        assert_eq!(store.list_published().await.unwrap().len(), 1);
        assert_eq!(store.list_domains().await.unwrap(), vec!["Machine Learning"]);
        assert!(store.get_by_nid_and_slug("2", "draft").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_search_narrows_by_year_and_query() {
        let (_tmp, store) = setup().await;
        let mut old = new_review("1", "old", "Quantum Cryptography").into_review(0, Utc::now());
        old.last_updated = Utc.with_ymd_and_hms(2022, 3, 1, 0, 0, 0).unwrap();
        store.insert_review(&old).await.unwrap();
        let mut new = new_review("2", "new", "Energy Storage").into_review(0, Utc::now());
        new.last_updated = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
        store.insert_review(&new).await.unwrap();

        let filters = RepositoryFilters {
            year: Some("2022".to_string()),
            ..Default::default()
        };
        let hits = store.search("", &filters).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].nid, "1");

        let hits = store
            .search("quantum", &RepositoryFilters::default())
            .await
            .unwrap();
        assert_eq!(hits.iter().map(|r| r.nid.as_str()).collect::<Vec<_>>(), vec!["1"]);

        let all = store.search("", &RepositoryFilters::default()).await.unwrap();
        assert_eq!(all.iter().map(|r| r.nid.as_str()).collect::<Vec<_>>(), vec!["2", "1"]);
    }

    #[tokio::test]
    async fn test_by_tag_and_domain() {
        let (_tmp, store) = setup().await;
        store.create_review(new_review("1", "a", "A")).await.unwrap();
        let mut other = new_review("2", "b", "B");
        other.domain = "Quantum Computing".to_string();
        other.tags = vec!["Security".to_string()];
        store.create_review(other).await.unwrap();

        assert_eq!(store.list_by_tag("Security").await.unwrap().len(), 1);
        assert_eq!(store.list_by_domain("Machine Learning").await.unwrap().len(), 1);
        assert_eq!(
            store.list_tags().await.unwrap(),
            vec!["Attention", "NLP", "Security"]
        );
    }
}

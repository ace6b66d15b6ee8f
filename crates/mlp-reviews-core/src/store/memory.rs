//! In-memory [`ReviewStore`] implementation for testing and embedding.
//!
//! Uses a `Vec` behind `std::sync::RwLock` for thread safety. Queries scan
//! the whole list.

use std::sync::RwLock;

use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;
use chrono::Utc;

use crate::models::{NewReview, RepositoryFilters, Review};

use super::{coarse_search, distinct_tags, ReviewStore};

/// In-memory review store.
pub struct InMemoryStore {
    reviews: RwLock<Vec<Review>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            reviews: RwLock::new(Vec::new()),
        }
    }

    /// Store pre-built reviews as-is (ids and timestamps included).
    pub fn with_reviews(reviews: Vec<Review>) -> Self {
        Self {
            reviews: RwLock::new(reviews),
        }
    }

    fn snapshot(&self) -> Result<Vec<Review>> {
        let reviews = self
            .reviews
            .read()
            .map_err(|_| anyhow!("review store lock poisoned"))?;
        Ok(reviews.clone())
    }

    fn published_newest_first(&self) -> Result<Vec<Review>> {
        let mut published: Vec<Review> = self
            .snapshot()?
            .into_iter()
            .filter(|r| r.published)
            .collect();
        published.sort_by(|a, b| b.last_updated.cmp(&a.last_updated));
        Ok(published)
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ReviewStore for InMemoryStore {
    async fn list_published(&self) -> Result<Vec<Review>> {
        self.published_newest_first()
    }

    async fn search(&self, query: &str, filters: &RepositoryFilters) -> Result<Vec<Review>> {
        Ok(coarse_search(self.published_newest_first()?, query, filters))
    }

    async fn get_by_nid_and_slug(&self, nid: &str, slug: &str) -> Result<Option<Review>> {
        let reviews = self
            .reviews
            .read()
            .map_err(|_| anyhow!("review store lock poisoned"))?;
        Ok(reviews
            .iter()
            .find(|r| r.published && r.nid == nid && r.slug == slug)
            .cloned())
    }

    async fn list_domains(&self) -> Result<Vec<String>> {
        let mut domains: Vec<String> = self
            .published_newest_first()?
            .into_iter()
            .map(|r| r.domain)
            .filter(|d| !d.is_empty())
            .collect();
        domains.sort();
        domains.dedup();
        Ok(domains)
    }

    async fn list_tags(&self) -> Result<Vec<String>> {
        Ok(distinct_tags(&self.published_newest_first()?))
    }

    async fn list_by_domain(&self, domain: &str) -> Result<Vec<Review>> {
        Ok(self
            .published_newest_first()?
            .into_iter()
            .filter(|r| r.domain == domain)
            .collect())
    }

    async fn list_by_tag(&self, tag: &str) -> Result<Vec<Review>> {
        Ok(self
            .published_newest_first()?
            .into_iter()
            .filter(|r| r.tags.iter().any(|t| t == tag))
            .collect())
    }

    async fn create_review(&self, review: NewReview) -> Result<Review> {
        let review = review.validate()?;
        let mut reviews = self
            .reviews
            .write()
            .map_err(|_| anyhow!("review store lock poisoned"))?;

        if reviews
            .iter()
            .any(|r| r.nid == review.nid && r.slug == review.slug)
        {
            bail!(
                "invalid review: nid '{}' with slug '{}' already exists",
                review.nid,
                review.slug
            );
        }

        let id = reviews.iter().map(|r| r.id).max().unwrap_or(0) + 1;
        let stored = review.into_review(id, Utc::now());
        reviews.push(stored.clone());
        Ok(stored)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fuzzy::tests::review;
    use chrono::TimeZone;

    fn store() -> InMemoryStore {
        let mut a = review(1, "Transformer Architecture", "", "");
        a.domain = "Machine Learning".to_string();
        a.tags = vec!["NLP".to_string(), "Transformers".to_string()];
        a.last_updated = Utc.with_ymd_and_hms(2023, 5, 1, 0, 0, 0).unwrap();

        let mut b = review(2, "Quantum Cryptography", "", "");
        b.domain = "Quantum Computing".to_string();
        b.tags = vec!["Security".to_string()];
        b.last_updated = Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap();

        let mut draft = review(3, "Unreleased Draft", "", "");
        draft.domain = "Hidden".to_string();
        draft.tags = vec!["Secret".to_string()];
        draft.published = false;

        InMemoryStore::with_reviews(vec![a, b, draft])
    }

    fn new_review(nid: &str, slug: &str) -> NewReview {
        NewReview {
            nid: nid.to_string(),
            slug: slug.to_string(),
            title: "Graph Learning".to_string(),
            review_summary: String::new(),
            content: String::new(),
            authors: vec!["Lee, S.".to_string()],
            doi: "10.1000/9".to_string(),
            domain: "Machine Learning".to_string(),
            tags: vec![],
            version: "1.0".to_string(),
            word_count: 0,
            estimated_reading_time: 0,
            review_author: None,
            impact_metrics: None,
            reuse_license: None,
            source_attribution: None,
            published: true,
        }
    }

    #[tokio::test]
    async fn test_list_published_excludes_drafts() {
        let ids: Vec<i64> = store()
            .list_published()
            .await
            .unwrap()
            .iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(ids, vec![2, 1]);
    }

    #[tokio::test]
    async fn test_domains_and_tags_published_only() {
        let s = store();
        assert_eq!(
            s.list_domains().await.unwrap(),
            vec!["Machine Learning", "Quantum Computing"]
        );
        assert_eq!(
            s.list_tags().await.unwrap(),
            vec!["NLP", "Security", "Transformers"]
        );
    }

    #[tokio::test]
    async fn test_lookup_by_nid_and_slug() {
        let s = store();
        assert!(s.get_by_nid_and_slug("1", "review-1").await.unwrap().is_some());
        assert!(s.get_by_nid_and_slug("1", "wrong").await.unwrap().is_none());
        assert!(s.get_by_nid_and_slug("3", "review-3").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_search_uses_fuzzy_query_and_filters() {
        let s = store();
        let hits = s.search("cryptografy", &RepositoryFilters::default()).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, 2);

        let filters = RepositoryFilters {
            year: Some("2023".to_string()),
            ..Default::default()
        };
        let hits = s.search("", &filters).await.unwrap();
        assert_eq!(hits.iter().map(|r| r.id).collect::<Vec<_>>(), vec![1]);
    }

    #[tokio::test]
    async fn test_create_assigns_id_and_rejects_duplicates() {
        let s = store();
        let created = s.create_review(new_review("10", "graph-learning")).await.unwrap();
        assert_eq!(created.id, 4);
        assert_eq!(created.created_at, created.last_updated);
        assert!(s.create_review(new_review("10", "graph-learning")).await.is_err());
    }
}

//! Storage abstraction for MLP Reviews.
//!
//! The [`ReviewStore`] trait defines every repository operation the HTTP
//! surface and the discovery controller need, enabling pluggable backends
//! (SQLite, in-memory).
//!
//! Implementations must be `Send + Sync` to work with async runtimes.

pub mod memory;

use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;

use crate::filter::matches_filters;
use crate::fuzzy::SearchIndex;
use crate::models::{NewReview, RepositoryFilters, Review, SearchFilters};

/// Abstract review repository.
///
/// # Operations
///
/// | Method | Purpose |
/// |--------|---------|
/// | [`list_published`](ReviewStore::list_published) | All published reviews, newest first |
/// | [`search`](ReviewStore::search) | Fuzzy query plus domain/year/tag filters |
/// | [`get_by_nid_and_slug`](ReviewStore::get_by_nid_and_slug) | Public lookup |
/// | [`list_domains`](ReviewStore::list_domains) | Distinct published domains |
/// | [`list_tags`](ReviewStore::list_tags) | Distinct published tags |
/// | [`list_by_domain`](ReviewStore::list_by_domain) | Published reviews in one domain |
/// | [`list_by_tag`](ReviewStore::list_by_tag) | Published reviews carrying one tag |
/// | [`create_review`](ReviewStore::create_review) | Validate and insert |
#[async_trait]
pub trait ReviewStore: Send + Sync {
    /// Published reviews, last-updated descending.
    async fn list_published(&self) -> Result<Vec<Review>>;

    /// Search published reviews. See [`coarse_search`] for semantics.
    async fn search(&self, query: &str, filters: &RepositoryFilters) -> Result<Vec<Review>>;

    /// Look up a review by its public key. Unpublished reviews are not found.
    async fn get_by_nid_and_slug(&self, nid: &str, slug: &str) -> Result<Option<Review>>;

    /// Distinct domains of published reviews, sorted.
    async fn list_domains(&self) -> Result<Vec<String>>;

    /// Distinct tags of published reviews, sorted.
    async fn list_tags(&self) -> Result<Vec<String>>;

    async fn list_by_domain(&self, domain: &str) -> Result<Vec<Review>>;

    async fn list_by_tag(&self, tag: &str) -> Result<Vec<Review>>;

    /// Validate and insert a review, returning the stored record.
    async fn create_review(&self, review: NewReview) -> Result<Review>;
}

/// Canonical repository search over an already-narrowed candidate list.
///
/// Applies the domain, year, and match-any tag filters, then, for a
/// non-empty query, keeps only fuzzy hits in relevance order. With an
/// empty query the candidates keep their incoming order.
pub fn coarse_search(candidates: Vec<Review>, query: &str, filters: &RepositoryFilters) -> Vec<Review> {
    let search_filters = SearchFilters {
        domain: filters.domain.clone(),
        year: filters.year.clone(),
        tags: filters.tags.clone(),
        ..Default::default()
    };

    let narrowed: Vec<Arc<Review>> = candidates
        .into_iter()
        .filter(|r| r.published && matches_filters(r, &search_filters))
        .map(Arc::new)
        .collect();

    if query.trim().is_empty() {
        return narrowed.iter().map(|r| Review::clone(r)).collect();
    }

    let mut index = SearchIndex::default();
    index.initialize(&narrowed);
    index
        .search(query)
        .into_iter()
        .map(|hit| Review::clone(&hit.review))
        .collect()
}

/// Sorted, de-duplicated tag list across `reviews`.
pub fn distinct_tags<'a>(reviews: impl IntoIterator<Item = &'a Review>) -> Vec<String> {
    let mut tags: Vec<String> = reviews
        .into_iter()
        .flat_map(|r| r.tags.iter().cloned())
        .collect();
    tags.sort();
    tags.dedup();
    tags
}

//! Structured filtering and sorting of a candidate result set.
//!
//! Pure and total: every filter combination, including empty lists and
//! malformed values, produces a defined result.
//!
//! Filters narrow in a fixed order: domain, year, tags (match-any),
//! reading-time bucket. Sorting is stable, so equal keys keep their
//! input order and pagination stays deterministic across re-renders.

use std::cmp::Ordering;

use crate::models::{Review, SearchFilters, SearchResult, SortKey};

/// Does `review` satisfy every set dimension of `filters`?
///
/// The query text is not considered here.
pub fn matches_filters(review: &Review, filters: &SearchFilters) -> bool {
    if let Some(domain) = filters.domain_constraint() {
        if review.domain != domain {
            return false;
        }
    }

    if let Some(year) = filters.year_constraint() {
        if review.year() != year {
            return false;
        }
    }

    if let Some(tags) = filters.tag_constraint() {
        if !tags.iter().any(|t| review.tags.contains(t)) {
            return false;
        }
    }

    if let Some(bucket) = filters.reading_time {
        if !bucket.contains(review.estimated_reading_time) {
            return false;
        }
    }

    true
}

pub fn apply_filters(results: Vec<SearchResult>, filters: &SearchFilters) -> Vec<SearchResult> {
    results
        .into_iter()
        .filter(|r| matches_filters(&r.review, filters))
        .collect()
}

/// Title order: case-insensitive first, then by raw text so "alpha"
/// and "Alpha" still have a fixed order.
pub fn compare_titles(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}

pub fn compare_reviews(a: &Review, b: &Review, key: SortKey) -> Ordering {
    match key {
        SortKey::MostRecent => b.last_updated.cmp(&a.last_updated),
        SortKey::Alphabetical => compare_titles(&a.title, &b.title),
        SortKey::ReadingTime => a.estimated_reading_time.cmp(&b.estimated_reading_time),
    }
}

pub fn sort_results(results: &mut [SearchResult], key: SortKey) {
    results.sort_by(|a, b| compare_reviews(&a.review, &b.review, key));
}

/// Filter then sort.
pub fn filter_and_sort(
    results: Vec<SearchResult>,
    filters: &SearchFilters,
    key: SortKey,
) -> Vec<SearchResult> {
    let mut filtered = apply_filters(results, filters);
    sort_results(&mut filtered, key);
    filtered
}

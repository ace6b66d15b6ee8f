//! Core data models used throughout MLP Reviews.
//!
//! These types represent the reviews, filters, and search results that flow
//! through the discovery pipeline.

use anyhow::{bail, Result};
use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// A published (or draft) research review.
///
/// Immutable once fetched. The `(nid, slug)` pair is the public lookup key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub id: i64,
    /// Stable external identifier used in permalinks.
    pub nid: String,
    /// URL-safe title token.
    pub slug: String,
    pub title: String,
    pub review_summary: String,
    /// Markdown body.
    pub content: String,
    pub authors: Vec<String>,
    pub doi: String,
    pub domain: String,
    pub tags: Vec<String>,
    pub version: String,
    pub word_count: u32,
    /// Estimated reading time in minutes.
    pub estimated_reading_time: u32,
    pub review_author: Option<String>,
    pub impact_metrics: Option<serde_json::Value>,
    pub reuse_license: Option<String>,
    pub source_attribution: Option<String>,
    pub published: bool,
    pub created_at: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
}

impl Review {
    /// Calendar year of the last update, used by the year filter.
    pub fn year(&self) -> i32 {
        self.last_updated.year()
    }

    pub fn reading_time_bucket(&self) -> ReadingTimeBucket {
        ReadingTimeBucket::classify(self.estimated_reading_time)
    }
}

/// Request body for creating a review.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewReview {
    pub nid: String,
    pub slug: String,
    pub title: String,
    pub review_summary: String,
    pub content: String,
    pub authors: Vec<String>,
    pub doi: String,
    pub domain: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default = "default_version")]
    pub version: String,
    #[serde(default)]
    pub word_count: u32,
    #[serde(default)]
    pub estimated_reading_time: u32,
    #[serde(default)]
    pub review_author: Option<String>,
    #[serde(default)]
    pub impact_metrics: Option<serde_json::Value>,
    #[serde(default)]
    pub reuse_license: Option<String>,
    #[serde(default)]
    pub source_attribution: Option<String>,
    #[serde(default = "default_published")]
    pub published: bool,
}

fn default_version() -> String {
    "1.0".to_string()
}

fn default_published() -> bool {
    true
}

impl NewReview {
    /// Check required fields and normalize the tag list.
    ///
    /// Tags keep set semantics: duplicates are dropped, first occurrence wins.
    pub fn validate(mut self) -> Result<Self> {
        if self.nid.trim().is_empty() {
            bail!("invalid review: nid must not be empty");
        }
        if self.title.trim().is_empty() {
            bail!("invalid review: title must not be empty");
        }
        if !is_url_safe_slug(&self.slug) {
            bail!(
                "invalid review: slug '{}' must be non-empty and contain only [a-z0-9-]",
                self.slug
            );
        }
        self.authors.retain(|a| !a.trim().is_empty());
        if self.authors.is_empty() {
            bail!("invalid review: at least one author is required");
        }
        if !is_dotted_version(&self.version) {
            bail!(
                "invalid review: version '{}' must be dotted numeric",
                self.version
            );
        }

        let mut seen: Vec<String> = Vec::with_capacity(self.tags.len());
        for tag in self.tags.drain(..) {
            let tag = tag.trim().to_string();
            if !tag.is_empty() && !seen.contains(&tag) {
                seen.push(tag);
            }
        }
        self.tags = seen;

        Ok(self)
    }

    /// Materialize a stored review with the given id and timestamp.
    pub fn into_review(self, id: i64, now: DateTime<Utc>) -> Review {
        Review {
            id,
            nid: self.nid,
            slug: self.slug,
            title: self.title,
            review_summary: self.review_summary,
            content: self.content,
            authors: self.authors,
            doi: self.doi,
            domain: self.domain,
            tags: self.tags,
            version: self.version,
            word_count: self.word_count,
            estimated_reading_time: self.estimated_reading_time,
            review_author: self.review_author,
            impact_metrics: self.impact_metrics,
            reuse_license: self.reuse_license,
            source_attribution: self.source_attribution,
            published: self.published,
            created_at: now,
            last_updated: now,
        }
    }
}

pub fn is_url_safe_slug(slug: &str) -> bool {
    !slug.is_empty()
        && slug
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
}

pub fn is_dotted_version(version: &str) -> bool {
    !version.is_empty()
        && version
            .split('.')
            .all(|part| !part.is_empty() && part.chars().all(|c| c.is_ascii_digit()))
}

/// Named partition of estimated reading time.
///
/// `Quick` is under 10 minutes, `Medium` is 10 through 20 inclusive,
/// `Long` is over 20.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReadingTimeBucket {
    Quick,
    Medium,
    Long,
}

impl ReadingTimeBucket {
    pub fn classify(minutes: u32) -> Self {
        match minutes {
            0..=9 => ReadingTimeBucket::Quick,
            10..=20 => ReadingTimeBucket::Medium,
            _ => ReadingTimeBucket::Long,
        }
    }

    pub fn contains(self, minutes: u32) -> bool {
        Self::classify(minutes) == self
    }

    /// Parse a bucket key, treating anything unrecognized as "no bucket".
    pub fn parse_lenient(raw: &str) -> Option<Self> {
        raw.parse().ok()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ReadingTimeBucket::Quick => "quick",
            ReadingTimeBucket::Medium => "medium",
            ReadingTimeBucket::Long => "long",
        }
    }
}

impl FromStr for ReadingTimeBucket {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "quick" => Ok(ReadingTimeBucket::Quick),
            "medium" => Ok(ReadingTimeBucket::Medium),
            "long" => Ok(ReadingTimeBucket::Long),
            other => bail!(
                "Unknown reading time bucket: '{}'. Use quick, medium, or long.",
                other
            ),
        }
    }
}

impl fmt::Display for ReadingTimeBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result ordering for the discovery list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortKey {
    /// Descending last-updated timestamp.
    #[default]
    #[serde(rename = "recent")]
    MostRecent,
    /// Ascending by title.
    #[serde(rename = "alphabetical")]
    Alphabetical,
    /// Ascending estimated minutes.
    #[serde(rename = "reading-time")]
    ReadingTime,
}

impl SortKey {
    pub fn as_str(self) -> &'static str {
        match self {
            SortKey::MostRecent => "recent",
            SortKey::Alphabetical => "alphabetical",
            SortKey::ReadingTime => "reading-time",
        }
    }
}

impl FromStr for SortKey {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "recent" | "most-recent" => Ok(SortKey::MostRecent),
            "alphabetical" => Ok(SortKey::Alphabetical),
            "reading-time" => Ok(SortKey::ReadingTime),
            other => bail!(
                "Unknown sort key: '{}'. Use recent, alphabetical, or reading-time.",
                other
            ),
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// User-selected query text and structured filters.
///
/// An unset dimension (None, empty string, empty tag list) places no
/// constraint on the result set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchFilters {
    #[serde(default)]
    pub query: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    /// Four-digit year matched against the last-updated year.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reading_time: Option<ReadingTimeBucket>,
}

impl SearchFilters {
    pub fn has_query(&self) -> bool {
        !self.query.trim().is_empty()
    }

    pub fn domain_constraint(&self) -> Option<&str> {
        self.domain.as_deref().filter(|d| !d.is_empty())
    }

    /// Parsed year, or `None` when unset or malformed.
    pub fn year_constraint(&self) -> Option<i32> {
        parse_year(self.year.as_deref()?)
    }

    pub fn tag_constraint(&self) -> Option<&[String]> {
        if self.tags.is_empty() {
            None
        } else {
            Some(&self.tags)
        }
    }

    /// True when any structured dimension (not the query) is set.
    pub fn has_active_filter(&self) -> bool {
        self.domain_constraint().is_some()
            || self.year_constraint().is_some()
            || !self.tags.is_empty()
            || self.reading_time.is_some()
    }

    /// Same filters with the query text cleared.
    pub fn without_query(&self) -> Self {
        Self {
            query: String::new(),
            ..self.clone()
        }
    }
}

fn parse_year(raw: &str) -> Option<i32> {
    let raw = raw.trim();
    if raw.len() != 4 || !raw.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    raw.parse().ok()
}

/// Coarse filters accepted by the repository search.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RepositoryFilters {
    pub domain: Option<String>,
    pub year: Option<String>,
    pub tags: Vec<String>,
}

impl RepositoryFilters {
    pub fn is_empty(&self) -> bool {
        self.domain.as_deref().map_or(true, str::is_empty)
            && self.year.as_deref().map_or(true, str::is_empty)
            && self.tags.is_empty()
    }

    pub fn year_constraint(&self) -> Option<i32> {
        parse_year(self.year.as_deref()?)
    }
}

impl From<&SearchFilters> for RepositoryFilters {
    fn from(filters: &SearchFilters) -> Self {
        Self {
            domain: filters.domain.clone(),
            year: filters.year.clone(),
            tags: filters.tags.clone(),
        }
    }
}

/// Highlighted markup for the list view. Not sanitized.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Highlighted {
    pub title: String,
    pub summary: String,
}

/// One row of the discovery list for the current render pass.
#[derive(Debug, Clone, Serialize)]
pub struct SearchResult {
    pub review: Arc<Review>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub highlighted: Option<Highlighted>,
}

impl SearchResult {
    pub fn plain(review: Arc<Review>) -> Self {
        Self {
            review,
            highlighted: None,
        }
    }
}

/// Format a timestamp as ISO 8601 (second precision).
pub fn format_ts_iso(ts: &DateTime<Utc>) -> String {
    ts.format("%Y-%m-%dT%H:%M:%SZ").to_string()
}

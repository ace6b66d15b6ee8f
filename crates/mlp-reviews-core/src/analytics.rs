//! Best-effort search analytics.
//!
//! A [`SearchRecorder`] appends meaningful searches to a bounded,
//! newest-first history held by a [`HistoryStorage`] backend and derives
//! popularity statistics from it. Storage failures are logged at debug
//! level and otherwise ignored: a broken backend reads as an empty history
//! and never fails a search.

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::RwLock;

use crate::models::SearchFilters;

/// Default cap on stored events.
pub const DEFAULT_MAX_EVENTS: usize = 100;

/// Tokens shorter than this are not counted as search terms.
const MIN_TERM_CHARS: usize = 3;

/// One committed search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsEvent {
    pub query: String,
    /// Filter snapshot; its `query` field is always empty.
    pub filters: SearchFilters,
    pub results_count: usize,
    /// Unix milliseconds.
    pub timestamp: u64,
}

/// A search is worth logging when it has query text or any active filter.
pub fn is_meaningful(filters: &SearchFilters) -> bool {
    filters.has_query() || filters.has_active_filter()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TermCount {
    pub term: String,
    pub count: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterUsage {
    pub domain: usize,
    pub year: usize,
    pub tags: usize,
    pub reading_time: usize,
    pub total: usize,
}

/// Most frequent query terms across `events`, highest count first.
///
/// Equal counts keep first-seen order (newest event first).
pub fn popular_terms(events: &[AnalyticsEvent], limit: usize) -> Vec<TermCount> {
    let mut order: Vec<String> = Vec::new();
    let mut counts: HashMap<String, usize> = HashMap::new();

    for event in events {
        for term in event.query.to_lowercase().split_whitespace() {
            if term.chars().count() < MIN_TERM_CHARS {
                continue;
            }
            let count = counts.entry(term.to_string()).or_insert(0);
            if *count == 0 {
                order.push(term.to_string());
            }
            *count += 1;
        }
    }

    let mut terms: Vec<TermCount> = order
        .into_iter()
        .map(|term| {
            let count = counts[&term];
            TermCount { term, count }
        })
        .collect();
    terms.sort_by(|a, b| b.count.cmp(&a.count));
    terms.truncate(limit);
    terms
}

pub fn filter_usage(events: &[AnalyticsEvent]) -> FilterUsage {
    let mut usage = FilterUsage {
        total: events.len(),
        ..Default::default()
    };
    for event in events {
        let f = &event.filters;
        if f.domain_constraint().is_some() {
            usage.domain += 1;
        }
        if f.year_constraint().is_some() {
            usage.year += 1;
        }
        if !f.tags.is_empty() {
            usage.tags += 1;
        }
        if f.reading_time.is_some() {
            usage.reading_time += 1;
        }
    }
    usage
}

/// Persistence backend for the analytics history.
pub trait HistoryStorage: Send + Sync {
    /// Load the stored history, newest first.
    fn load(&self) -> Result<Vec<AnalyticsEvent>>;

    /// Replace the stored history.
    fn save(&self, events: &[AnalyticsEvent]) -> Result<()>;
}

/// In-memory history backend.
#[derive(Debug, Default)]
pub struct MemoryHistory {
    events: RwLock<Vec<AnalyticsEvent>>,
}

impl MemoryHistory {
    pub fn new() -> Self {
        Self::default()
    }
}

impl HistoryStorage for MemoryHistory {
    fn load(&self) -> Result<Vec<AnalyticsEvent>> {
        let events = self
            .events
            .read()
            .map_err(|_| anyhow!("analytics history lock poisoned"))?;
        Ok(events.clone())
    }

    fn save(&self, events: &[AnalyticsEvent]) -> Result<()> {
        let mut stored = self
            .events
            .write()
            .map_err(|_| anyhow!("analytics history lock poisoned"))?;
        *stored = events.to_vec();
        Ok(())
    }
}

/// Bounded analytics log over a [`HistoryStorage`].
pub struct SearchRecorder<S: HistoryStorage> {
    storage: S,
    max_events: usize,
}

impl<S: HistoryStorage> SearchRecorder<S> {
    pub fn new(storage: S, max_events: usize) -> Self {
        Self {
            storage,
            max_events: max_events.max(1),
        }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn max_events(&self) -> usize {
        self.max_events
    }

    /// Record a search. Returns whether an event was written.
    ///
    /// Searches that are not [meaningful](is_meaningful) are skipped.
    pub fn log_search(&self, filters: &SearchFilters, results_count: usize, now_ms: u64) -> bool {
        if !is_meaningful(filters) {
            return false;
        }

        let event = AnalyticsEvent {
            query: filters.query.trim().to_string(),
            filters: filters.without_query(),
            results_count,
            timestamp: now_ms,
        };

        let mut history = self.history();
        history.insert(0, event);
        history.truncate(self.max_events);

        match self.storage.save(&history) {
            Ok(()) => true,
            Err(e) => {
                tracing::debug!("analytics logging failed: {:#}", e);
                false
            }
        }
    }

    /// Stored events, newest first. Empty when storage is unavailable.
    pub fn history(&self) -> Vec<AnalyticsEvent> {
        match self.storage.load() {
            Ok(events) => events,
            Err(e) => {
                tracing::debug!("analytics history unreadable: {:#}", e);
                Vec::new()
            }
        }
    }

    pub fn popular_search_terms(&self, limit: usize) -> Vec<TermCount> {
        popular_terms(&self.history(), limit)
    }

    pub fn filter_usage(&self) -> FilterUsage {
        filter_usage(&self.history())
    }
}

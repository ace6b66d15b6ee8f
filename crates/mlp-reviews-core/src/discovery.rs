//! The discovery controller: the only stateful part of the pipeline.
//!
//! [`DiscoveryController`] owns the loaded review list, its [`SearchIndex`],
//! the committed query and filters, the sort key, and the current page. Every
//! query, filter, or sort change re-runs search → filter/sort and resets the
//! page to 1; a page change only re-slices.
//!
//! # Lifecycle
//!
//! ```text
//! Idle ──begin_load──▶ Loading ──finish_load(Ok)──▶ Ready ◀─┐
//!                         │                           │      │ query / filter /
//!                         └──finish_load(Err)──▶ Failed      │ sort / page
//!                                                     └──────┘
//! ```
//!
//! Time is passed in as unix milliseconds. Typed query text is debounced by
//! [`DiscoveryController::input_query`] and committed on [`tick`]; analytics
//! commits have their own independent timer and are handed back to the
//! caller from [`tick`] rather than written here.
//!
//! [`tick`]: DiscoveryController::tick

use serde::Serialize;
use std::sync::Arc;

use crate::analytics::{is_meaningful, HistoryStorage, SearchRecorder};
use crate::fetch::{FetchGuard, FetchTicket};
use crate::filter::filter_and_sort;
use crate::fuzzy::{FieldKey, FuzzyOptions, MatchLocation, SearchIndex};
use crate::highlight::{highlight_field, highlight_field_html};
use crate::models::{
    Highlighted, ReadingTimeBucket, Review, SearchFilters, SearchResult, SortKey,
};
use crate::pagination::{
    clamp_page, page_window, paginate, total_pages, Page, PageLink, DEFAULT_PAGE_SIZE,
};
use crate::store::ReviewStore;
use crate::timer::DebounceTimer;

/// Controller tunables.
#[derive(Debug, Clone)]
pub struct DiscoveryOptions {
    pub page_size: usize,
    pub fuzzy: FuzzyOptions,
    /// Quiet period before typed query text is committed.
    pub search_debounce_ms: u64,
    /// Quiet period before a search is written to analytics.
    pub analytics_debounce_ms: u64,
    /// Escape highlighted titles and summaries for an HTML sink.
    pub html_highlights: bool,
}

impl Default for DiscoveryOptions {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            fuzzy: FuzzyOptions::default(),
            search_debounce_ms: 300,
            analytics_debounce_ms: 1000,
            html_highlights: false,
        }
    }
}

/// Outcome of the review-list fetch.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadState {
    Idle,
    Loading,
    Ready,
    Failed(String),
}

/// What the list view should render.
///
/// `LoadError` (the fetch failed) and `NoResults` (a successful search that
/// matched nothing) are always distinct.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ViewStatus {
    Idle,
    Loading,
    LoadError { message: String },
    NoResults,
    Results,
}

/// One rendered page of the discovery list.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscoveryView {
    pub status: ViewStatus,
    pub page: Page<SearchResult>,
    pub page_links: Vec<PageLink>,
    /// Reviews left after search and filters.
    pub total_matches: usize,
    /// Reviews loaded before search and filters.
    pub total_reviews: usize,
    pub filters: SearchFilters,
    pub sort: SortKey,
}

/// A search due for analytics, handed back from [`DiscoveryController::tick`].
#[derive(Debug, Clone, PartialEq)]
pub struct AnalyticsCommit {
    pub filters: SearchFilters,
    pub results_count: usize,
}

pub struct DiscoveryController {
    options: DiscoveryOptions,
    reviews: Vec<Arc<Review>>,
    index: SearchIndex,
    load_state: LoadState,
    list_fetch: FetchGuard,
    filters: SearchFilters,
    sort: SortKey,
    page: usize,
    results: Vec<SearchResult>,
    pending_query: Option<String>,
    query_timer: DebounceTimer,
    analytics_timer: DebounceTimer,
    fuzzy_queries: usize,
    mounted: bool,
}

impl DiscoveryController {
    pub fn new(options: DiscoveryOptions) -> Self {
        let index = SearchIndex::new(options.fuzzy.clone());
        let query_timer = DebounceTimer::new(options.search_debounce_ms);
        let analytics_timer = DebounceTimer::new(options.analytics_debounce_ms);
        Self {
            options,
            reviews: Vec::new(),
            index,
            load_state: LoadState::Idle,
            list_fetch: FetchGuard::new(),
            filters: SearchFilters::default(),
            sort: SortKey::default(),
            page: 1,
            results: Vec::new(),
            pending_query: None,
            query_timer,
            analytics_timer,
            fuzzy_queries: 0,
            mounted: true,
        }
    }

    // ============ Loading ============

    /// Start a review-list fetch. Any earlier in-flight fetch is superseded.
    pub fn begin_load(&mut self) -> FetchTicket {
        if self.load_state != LoadState::Ready {
            self.load_state = LoadState::Loading;
        }
        self.list_fetch.issue()
    }

    /// Apply a fetch result. Returns false when the response was stale or
    /// the controller is unmounted, in which case nothing changes.
    pub fn finish_load(&mut self, ticket: FetchTicket, result: anyhow::Result<Vec<Review>>) -> bool {
        if !self.mounted || !self.list_fetch.complete(ticket) {
            tracing::debug!("discarding stale review list response");
            return false;
        }

        match result {
            Ok(reviews) => {
                self.reviews = reviews
                    .into_iter()
                    .filter(|r| r.published)
                    .map(Arc::new)
                    .collect();
                self.index.initialize(&self.reviews);
                self.load_state = LoadState::Ready;
                self.recompute();
                self.page = 1;
            }
            Err(e) => {
                tracing::warn!("failed to load reviews: {:#}", e);
                self.reviews.clear();
                self.results.clear();
                self.load_state = LoadState::Failed(e.to_string());
            }
        }
        true
    }

    /// Fetch the published list from `store` and apply it.
    pub async fn load<S: ReviewStore + ?Sized>(&mut self, store: &S) -> bool {
        let ticket = self.begin_load();
        let result = store.list_published().await;
        self.finish_load(ticket, result)
    }

    // ============ Input ============

    /// Record typed query text; it commits after the search debounce.
    pub fn input_query(&mut self, text: &str, now_ms: u64) {
        if !self.mounted {
            return;
        }
        self.pending_query = Some(text.to_string());
        self.query_timer.reset(now_ms);
    }

    /// Commit query text immediately.
    pub fn set_query(&mut self, text: &str, now_ms: u64) {
        self.pending_query = None;
        self.query_timer.cancel();
        let mut next = self.filters.clone();
        next.query = text.to_string();
        self.set_filters(next, now_ms);
    }

    pub fn set_domain(&mut self, domain: Option<String>, now_ms: u64) {
        let next = SearchFilters {
            domain,
            ..self.filters.clone()
        };
        self.set_filters(next, now_ms);
    }

    pub fn set_year(&mut self, year: Option<String>, now_ms: u64) {
        let next = SearchFilters {
            year,
            ..self.filters.clone()
        };
        self.set_filters(next, now_ms);
    }

    pub fn set_tags(&mut self, tags: Vec<String>, now_ms: u64) {
        let next = SearchFilters {
            tags,
            ..self.filters.clone()
        };
        self.set_filters(next, now_ms);
    }

    /// Add the tag if absent, remove it if present.
    pub fn toggle_tag(&mut self, tag: &str, now_ms: u64) {
        let mut tags = self.filters.tags.clone();
        if let Some(pos) = tags.iter().position(|t| t == tag) {
            tags.remove(pos);
        } else {
            tags.push(tag.to_string());
        }
        self.set_tags(tags, now_ms);
    }

    pub fn set_reading_time(&mut self, bucket: Option<ReadingTimeBucket>, now_ms: u64) {
        let next = SearchFilters {
            reading_time: bucket,
            ..self.filters.clone()
        };
        self.set_filters(next, now_ms);
    }

    /// Replace query and filters together.
    pub fn set_filters(&mut self, filters: SearchFilters, now_ms: u64) {
        if !self.mounted || filters == self.filters {
            return;
        }
        self.filters = filters;
        self.on_criteria_changed();
        self.schedule_analytics(now_ms);
    }

    pub fn clear_filters(&mut self, now_ms: u64) {
        self.pending_query = None;
        self.query_timer.cancel();
        self.set_filters(SearchFilters::default(), now_ms);
    }

    /// Change the sort key. Resets the page but is not logged to analytics.
    pub fn set_sort(&mut self, sort: SortKey) {
        if !self.mounted || sort == self.sort {
            return;
        }
        self.sort = sort;
        self.on_criteria_changed();
    }

    /// Move to `page`, clamped into `[1, total_pages]`.
    pub fn set_page(&mut self, page: usize) {
        if !self.mounted {
            return;
        }
        self.page = clamp_page(page, self.total_pages());
    }

    // ============ Timers ============

    /// Advance the debounce timers.
    ///
    /// Commits pending query text once its quiet period has passed, and
    /// returns a search for analytics once the analytics quiet period has
    /// passed.
    pub fn tick(&mut self, now_ms: u64) -> Option<AnalyticsCommit> {
        if !self.mounted {
            return None;
        }

        if self.query_timer.fire_if_due(now_ms) {
            if let Some(text) = self.pending_query.take() {
                let mut next = self.filters.clone();
                next.query = text;
                self.set_filters(next, now_ms);
            }
        }

        if self.analytics_timer.fire_if_due(now_ms) && is_meaningful(&self.filters) {
            return Some(AnalyticsCommit {
                filters: self.filters.clone(),
                results_count: self.results.len(),
            });
        }
        None
    }

    /// [`tick`](Self::tick) and write any due search to `recorder`.
    pub fn tick_and_record<S: HistoryStorage>(
        &mut self,
        now_ms: u64,
        recorder: &SearchRecorder<S>,
    ) -> bool {
        match self.tick(now_ms) {
            Some(commit) => recorder.log_search(&commit.filters, commit.results_count, now_ms),
            None => false,
        }
    }

    /// Commit pending query text and any pending analytics immediately.
    pub fn flush(&mut self, now_ms: u64) -> Option<AnalyticsCommit> {
        if let Some(deadline) = self.query_timer.deadline_ms() {
            // the analytics deadline may fall before the query deadline
            if let Some(commit) = self.tick(deadline.max(now_ms)) {
                return Some(commit);
            }
        }
        match self.analytics_timer.deadline_ms() {
            Some(deadline) => self.tick(deadline.max(now_ms)),
            None => None,
        }
    }

    /// Tear down: cancel timers and discard in-flight fetches.
    ///
    /// Every later input, tick, or fetch response is ignored.
    pub fn unmount(&mut self) {
        self.mounted = false;
        self.query_timer.cancel();
        self.analytics_timer.cancel();
        self.list_fetch.cancel_all();
        self.pending_query = None;
    }

    // ============ Read side ============

    pub fn load_state(&self) -> &LoadState {
        &self.load_state
    }

    pub fn filters(&self) -> &SearchFilters {
        &self.filters
    }

    pub fn pending_query(&self) -> Option<&str> {
        self.pending_query.as_deref()
    }

    pub fn sort(&self) -> SortKey {
        self.sort
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn total_pages(&self) -> usize {
        total_pages(self.results.len(), self.options.page_size)
    }

    /// Full filtered and sorted list (all pages).
    pub fn results(&self) -> &[SearchResult] {
        &self.results
    }

    pub fn reviews(&self) -> &[Arc<Review>] {
        &self.reviews
    }

    /// How many times the fuzzy index has been queried.
    pub fn fuzzy_queries(&self) -> usize {
        self.fuzzy_queries
    }

    pub fn has_pending_timers(&self) -> bool {
        self.query_timer.is_pending() || self.analytics_timer.is_pending()
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    pub fn view(&self) -> DiscoveryView {
        let status = match &self.load_state {
            LoadState::Idle => ViewStatus::Idle,
            LoadState::Loading => ViewStatus::Loading,
            LoadState::Failed(message) => ViewStatus::LoadError {
                message: message.clone(),
            },
            LoadState::Ready if self.results.is_empty() => ViewStatus::NoResults,
            LoadState::Ready => ViewStatus::Results,
        };

        let page = paginate(&self.results, self.options.page_size, self.page);
        let page_links = page_window(page.page, page.total_pages);

        DiscoveryView {
            status,
            page,
            page_links,
            total_matches: self.results.len(),
            total_reviews: self.reviews.len(),
            filters: self.filters.clone(),
            sort: self.sort,
        }
    }

    // ============ Pipeline ============

    fn on_criteria_changed(&mut self) {
        self.recompute();
        self.page = 1;
    }

    fn schedule_analytics(&mut self, now_ms: u64) {
        if is_meaningful(&self.filters) {
            self.analytics_timer.reset(now_ms);
        } else {
            self.analytics_timer.cancel();
        }
    }

    fn recompute(&mut self) {
        if self.load_state != LoadState::Ready {
            self.results.clear();
            return;
        }

        let html = self.options.html_highlights;
        let candidates: Vec<SearchResult> = if self.filters.has_query() {
            self.fuzzy_queries += 1;
            self.index
                .search(&self.filters.query)
                .into_iter()
                .map(|hit| {
                    let mark: fn(&str, FieldKey, &[MatchLocation]) -> String = if html {
                        highlight_field_html
                    } else {
                        highlight_field
                    };
                    let highlighted = Highlighted {
                        title: mark(&hit.review.title, FieldKey::Title, &hit.matches),
                        summary: mark(&hit.review.review_summary, FieldKey::Summary, &hit.matches),
                    };
                    SearchResult {
                        review: hit.review,
                        highlighted: Some(highlighted),
                    }
                })
                .collect()
        } else {
            self.reviews
                .iter()
                .map(|r| SearchResult::plain(Arc::clone(r)))
                .collect()
        };

        self.results = filter_and_sort(candidates, &self.filters, self.sort);
    }
}

impl Default for DiscoveryController {
    fn default() -> Self {
        Self::new(DiscoveryOptions::default())
    }
}

// ============ Detail page ============

/// State of the single-review page.
#[derive(Debug, Clone, PartialEq)]
pub enum DetailState {
    Idle,
    Loading,
    Loaded(Arc<Review>),
    NotFound,
    Failed(String),
}

/// Fetch state for the `(nid, slug)` detail page.
///
/// A new request supersedes the previous one; late responses are dropped.
pub struct DetailLoader {
    state: DetailState,
    fetch: FetchGuard,
    mounted: bool,
}

impl DetailLoader {
    pub fn new() -> Self {
        Self {
            state: DetailState::Idle,
            fetch: FetchGuard::new(),
            mounted: true,
        }
    }

    pub fn state(&self) -> &DetailState {
        &self.state
    }

    pub fn begin(&mut self) -> FetchTicket {
        self.state = DetailState::Loading;
        self.fetch.issue()
    }

    pub fn finish(&mut self, ticket: FetchTicket, result: anyhow::Result<Option<Review>>) -> bool {
        if !self.mounted || !self.fetch.complete(ticket) {
            return false;
        }
        self.state = match result {
            Ok(Some(review)) => DetailState::Loaded(Arc::new(review)),
            Ok(None) => DetailState::NotFound,
            Err(e) => DetailState::Failed(e.to_string()),
        };
        true
    }

    pub async fn load<S: ReviewStore + ?Sized>(&mut self, store: &S, nid: &str, slug: &str) -> bool {
        let ticket = self.begin();
        let result = store.get_by_nid_and_slug(nid, slug).await;
        self.finish(ticket, result)
    }

    pub fn unmount(&mut self) {
        self.mounted = false;
        self.fetch.cancel_all();
    }
}

impl Default for DetailLoader {
    fn default() -> Self {
        Self::new()
    }
}

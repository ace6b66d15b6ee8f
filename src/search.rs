//! Discovery runs outside the browser: `mlp search` and `GET /api/discover`.
//!
//! Both build a fresh [`DiscoveryController`] per request, load the
//! published list from a [`ReviewStore`], apply the requested filters, sort
//! and page, then read the resulting [`DiscoveryView`].

use anyhow::{bail, Result};
use chrono::Utc;

use mlp_reviews_core::discovery::{DiscoveryController, DiscoveryOptions, DiscoveryView, ViewStatus};
use mlp_reviews_core::models::{SearchFilters, SortKey};
use mlp_reviews_core::store::ReviewStore;

use crate::analytics;
use crate::config::Config;
use crate::db;
use crate::sqlite_store::SqliteStore;

/// Current time in unix milliseconds.
pub fn now_ms() -> u64 {
    Utc::now().timestamp_millis().max(0) as u64
}

/// Query, filters, sort and page for one discovery pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DiscoveryRequest {
    pub filters: SearchFilters,
    pub sort: SortKey,
    pub page: usize,
}

/// Load, filter, sort and page in a fresh controller.
///
/// The controller is returned with its analytics debounce still pending;
/// callers that log searches call [`DiscoveryController::flush`].
pub async fn discover<S: ReviewStore + ?Sized>(
    store: &S,
    options: DiscoveryOptions,
    request: &DiscoveryRequest,
) -> DiscoveryController {
    let now = now_ms();
    let mut controller = DiscoveryController::new(options);
    controller.load(store).await;
    controller.set_filters(request.filters.clone(), now);
    controller.set_sort(request.sort);
    controller.set_page(request.page.max(1));
    controller
}

/// CLI entry point for `mlp search`.
pub async fn run_search(config: &Config, request: &DiscoveryRequest) -> Result<()> {
    let pool = db::connect(config).await?;
    let store = SqliteStore::new(pool);

    let mut controller = discover(&store, config.discovery_options(), request).await;
    let view = controller.view();

    if let ViewStatus::LoadError { message } = &view.status {
        store.pool().close().await;
        bail!("unable to load reviews: {}", message);
    }

    if let Some(rec) = analytics::recorder(config) {
        if let Some(commit) = controller.flush(now_ms()) {
            rec.log_search(&commit.filters, commit.results_count, now_ms());
        }
    }
    controller.unmount();

    print_view(&view);
    store.pool().close().await;
    Ok(())
}

fn print_view(view: &DiscoveryView) {
    if view.status == ViewStatus::NoResults || view.page.items.is_empty() {
        println!("No results.");
        return;
    }

    println!(
        "Showing {}-{} of {} reviews (page {} of {})",
        view.page.start_item,
        view.page.end_item,
        view.total_matches,
        view.page.page,
        view.page.total_pages
    );
    println!();

    for (i, result) in view.page.items.iter().enumerate() {
        let review = &result.review;
        println!(
            "{}. {} [{}]",
            view.page.start_item + i,
            review.title,
            review.domain
        );
        println!("    authors: {}", review.authors.join(", "));
        println!("    updated: {}", review.last_updated.format("%Y-%m-%d"));
        println!(
            "    reading: {} min ({})",
            review.estimated_reading_time,
            review.reading_time_bucket()
        );
        if !review.tags.is_empty() {
            println!("    tags: {}", review.tags.join(", "));
        }
        println!("    summary: \"{}\"", review.review_summary.replace('\n', " ").trim());
        println!("    key: {} {}", review.nid, review.slug);
        println!();
    }
}

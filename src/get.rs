//! Single-review lookup by its public `(nid, slug)` key.

use anyhow::Result;

use mlp_reviews_core::discovery::{DetailLoader, DetailState};
use mlp_reviews_core::models::format_ts_iso;

use crate::config::Config;
use crate::db;
use crate::sqlite_store::SqliteStore;

/// CLI entry point for `mlp get`. Exits with status 1 when the review is
/// absent or unpublished.
pub async fn run_get(config: &Config, nid: &str, slug: &str) -> Result<()> {
    let pool = db::connect(config).await?;
    let store = SqliteStore::new(pool);

    let mut loader = DetailLoader::new();
    loader.load(&store, nid, slug).await;
    store.pool().close().await;

    let review = match loader.state() {
        DetailState::Loaded(review) => review.clone(),
        DetailState::NotFound => {
            eprintln!("Error: review not found: {}/{}", nid, slug);
            std::process::exit(1);
        }
        DetailState::Failed(message) => anyhow::bail!("unable to load review: {}", message),
        DetailState::Idle | DetailState::Loading => unreachable!("load() always settles"),
    };

    println!("--- Review ---");
    println!("title:        {}", review.title);
    println!("key:          {}/{}", review.nid, review.slug);
    println!("authors:      {}", review.authors.join(", "));
    println!("domain:       {}", review.domain);
    if !review.tags.is_empty() {
        println!("tags:         {}", review.tags.join(", "));
    }
    println!("doi:          {}", review.doi);
    println!("version:      {}", review.version);
    println!("created_at:   {}", format_ts_iso(&review.created_at));
    println!("updated_at:   {}", format_ts_iso(&review.last_updated));
    println!(
        "reading time: {} min ({})",
        review.estimated_reading_time,
        review.reading_time_bucket()
    );
    println!("word count:   {}", review.word_count);
    if let Some(ref license) = review.reuse_license {
        println!("license:      {}", license);
    }
    println!();
    println!("{}", review.review_summary);
    println!();
    println!("--- Content ---");
    println!("{}", review.content);

    Ok(())
}

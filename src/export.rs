//! Export a review list as Markdown or JSON.
//!
//! The renderers are pure; [`run_export`] runs the discovery pipeline over
//! the published catalog and writes the full filtered list (all pages) to a
//! file or stdout.

use anyhow::Result;
use chrono::{DateTime, Datelike, NaiveDate, Utc};
use clap::ValueEnum;
use serde::Serialize;
use std::path::{Path, PathBuf};

use mlp_reviews_core::discovery::ViewStatus;
use mlp_reviews_core::models::{format_ts_iso, Review};

use crate::config::Config;
use crate::db;
use crate::search::{discover, DiscoveryRequest};
use crate::sqlite_store::SqliteStore;

pub const PLATFORM: &str = "MLP Research";
pub const PERMALINK_BASE: &str = "https://mlp-research.com";

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ExportFormat {
    Markdown,
    Json,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Markdown => "md",
            ExportFormat::Json => "json",
        }
    }
}

/// `mlp-reviews-YYYY-MM-DD.{md,json}`
pub fn default_file_name(format: ExportFormat, date: NaiveDate) -> String {
    format!("mlp-reviews-{}.{}", date.format("%Y-%m-%d"), format.extension())
}

pub fn citation(review: &Review) -> String {
    format!(
        "{} ({}). {}. MLP Research Reviews. DOI: {}",
        review.authors.join(", "),
        review.last_updated.year(),
        review.title,
        review.doi
    )
}

pub fn permalink(base: &str, review: &Review) -> String {
    format!(
        "{}/mlp/reviews/{}/{}",
        base.trim_end_matches('/'),
        review.nid,
        review.slug
    )
}

/// `2847` → `2,847`
fn group_thousands(n: u32) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

pub fn to_markdown(reviews: &[Review]) -> String {
    reviews
        .iter()
        .map(|review| {
            format!(
                "# {title}\n\n\
                 **Authors:** {authors}\n\
                 **Domain:** {domain}\n\
                 **DOI:** {doi}\n\
                 **Version:** {version}\n\
                 **Last Updated:** {updated}\n\
                 **Reading Time:** {minutes} minutes\n\
                 **Word Count:** {words}\n\n\
                 ## Summary\n\n{summary}\n\n\
                 ## Content\n\n{content}\n\n\
                 ---\n\n",
                title = review.title,
                authors = review.authors.join(", "),
                domain = review.domain,
                doi = review.doi,
                version = review.version,
                updated = review.last_updated.format("%Y-%m-%d"),
                minutes = review.estimated_reading_time,
                words = group_thousands(review.word_count),
                summary = review.review_summary,
                content = review.content,
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[derive(Serialize)]
struct ExportedMetadata {
    citation: String,
    permalink: String,
}

#[derive(Serialize)]
struct ExportedReview<'a> {
    #[serde(flatten)]
    review: &'a Review,
    exported_metadata: ExportedMetadata,
}

#[derive(Serialize)]
struct ExportDocument<'a> {
    exported_at: String,
    platform: &'static str,
    review_count: usize,
    reviews: Vec<ExportedReview<'a>>,
}

pub fn to_json(reviews: &[Review], exported_at: DateTime<Utc>, base: &str) -> Result<String> {
    let doc = ExportDocument {
        exported_at: format_ts_iso(&exported_at),
        platform: PLATFORM,
        review_count: reviews.len(),
        reviews: reviews
            .iter()
            .map(|review| ExportedReview {
                review,
                exported_metadata: ExportedMetadata {
                    citation: citation(review),
                    permalink: permalink(base, review),
                },
            })
            .collect(),
    };
    Ok(serde_json::to_string_pretty(&doc)?)
}

pub fn render(format: ExportFormat, reviews: &[Review], now: DateTime<Utc>) -> Result<String> {
    match format {
        ExportFormat::Markdown => Ok(to_markdown(reviews)),
        ExportFormat::Json => to_json(reviews, now, PERMALINK_BASE),
    }
}

/// CLI entry point for `mlp export`.
///
/// `output` of `Some("-")` writes to stdout; `None` writes the default file
/// name in the current directory.
pub async fn run_export(
    config: &Config,
    format: ExportFormat,
    request: &DiscoveryRequest,
    output: Option<&Path>,
) -> Result<()> {
    let pool = db::connect(config).await?;
    let store = SqliteStore::new(pool);

    let controller = discover(&store, config.discovery_options(), request).await;
    if let ViewStatus::LoadError { message } = controller.view().status {
        store.pool().close().await;
        anyhow::bail!("unable to load reviews: {}", message);
    }

    let reviews: Vec<Review> = controller
        .results()
        .iter()
        .map(|r| Review::clone(&r.review))
        .collect();

    let now = Utc::now();
    let rendered = render(format, &reviews, now)?;

    match output {
        Some(path) if path == Path::new("-") => {
            println!("{}", rendered);
        }
        _ => {
            let path = output
                .map(Path::to_path_buf)
                .unwrap_or_else(|| PathBuf::from(default_file_name(format, now.date_naive())));
            if let Some(parent) = path.parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent)?;
                }
            }
            std::fs::write(&path, &rendered)?;
            eprintln!("Exported {} reviews to {}", reviews.len(), path.display());
        }
    }

    store.pool().close().await;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seed::sample_reviews;
    use chrono::TimeZone;

    fn reviews() -> Vec<Review> {
        let at = Utc.with_ymd_and_hms(2024, 6, 3, 12, 0, 0).unwrap();
        sample_reviews()
            .into_iter()
            .enumerate()
            .map(|(i, r)| r.into_review(i as i64 + 1, at))
            .collect()
    }

    #[test]
    fn test_file_name() {
        let date = NaiveDate::from_ymd_opt(2024, 6, 3).unwrap();
        assert_eq!(
            default_file_name(ExportFormat::Json, date),
            "mlp-reviews-2024-06-03.json"
        );
        assert_eq!(
            default_file_name(ExportFormat::Markdown, date),
            "mlp-reviews-2024-06-03.md"
        );
    }

    #[test]
    fn test_group_thousands() {
        assert_eq!(group_thousands(7), "7");
        assert_eq!(group_thousands(2847), "2,847");
        assert_eq!(group_thousands(1234567), "1,234,567");
    }

    #[test]
    fn test_markdown_layout() {
        let md = to_markdown(&reviews()[..1]);
        assert!(md.starts_with("# Transformer Architecture"));
        assert!(md.contains("**Authors:** Smith, J., Johnson, M., Chen, L.\n"));
        assert!(md.contains("**Last Updated:** 2024-06-03\n"));
        assert!(md.contains("**Word Count:** 2,847\n"));
        assert!(md.contains("## Summary\n\nComprehensive analysis"));
        assert!(md.trim_end().ends_with("---"));
    }

    #[test]
    fn test_json_metadata() {
        let at = Utc.with_ymd_and_hms(2024, 6, 4, 0, 0, 0).unwrap();
        let json = to_json(&reviews(), at, PERMALINK_BASE).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["platform"], "MLP Research");
        assert_eq!(value["review_count"], 3);
        assert_eq!(value["exported_at"], "2024-06-04T00:00:00Z");

        let second = &value["reviews"][1];
        assert_eq!(second["title"], "Quantum Computing Applications in Cryptography");
        assert_eq!(
            second["exported_metadata"]["citation"],
            "Williams, R., Davis, K. (2024). Quantum Computing Applications in Cryptography. MLP Research Reviews. DOI: 10.1000/183"
        );
        assert_eq!(
            second["exported_metadata"]["permalink"],
            "https://mlp-research.com/mlp/reviews/2/quantum-computing-cryptography-applications"
        );
    }
}

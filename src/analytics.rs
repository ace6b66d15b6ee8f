//! File-backed search analytics and the `mlp analytics` commands.
//!
//! The history is a JSON array of events, newest first. A missing or
//! corrupt file reads as an empty history.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use mlp_reviews_core::analytics::{AnalyticsEvent, HistoryStorage, SearchRecorder};

use crate::config::Config;

/// [`HistoryStorage`] over a single JSON file.
#[derive(Debug, Clone)]
pub struct JsonFileHistory {
    path: PathBuf,
}

impl JsonFileHistory {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl HistoryStorage for JsonFileHistory {
    fn load(&self) -> Result<Vec<AnalyticsEvent>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let raw = std::fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read analytics file: {}", self.path.display()))?;
        match serde_json::from_str(&raw) {
            Ok(events) => Ok(events),
            Err(e) => {
                tracing::debug!("ignoring corrupt analytics file {}: {}", self.path.display(), e);
                Ok(Vec::new())
            }
        }
    }

    fn save(&self, events: &[AnalyticsEvent]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let json = serde_json::to_string_pretty(events)?;
        std::fs::write(&self.path, json)
            .with_context(|| format!("Failed to write analytics file: {}", self.path.display()))?;
        Ok(())
    }
}

/// Recorder for the configured analytics file, or `None` when disabled.
pub fn recorder(config: &Config) -> Option<SearchRecorder<JsonFileHistory>> {
    if !config.analytics.enabled {
        return None;
    }
    Some(SearchRecorder::new(
        JsonFileHistory::new(&config.analytics.path),
        config.analytics.max_events,
    ))
}

pub fn run_popular(config: &Config, limit: usize) -> Result<()> {
    let rec = SearchRecorder::new(
        JsonFileHistory::new(&config.analytics.path),
        config.analytics.max_events,
    );
    let terms = rec.popular_search_terms(limit);
    if terms.is_empty() {
        println!("No searches recorded.");
        return Ok(());
    }
    for (i, t) in terms.iter().enumerate() {
        println!("{:>2}. {:<24} {}", i + 1, t.term, t.count);
    }
    Ok(())
}

pub fn run_usage(config: &Config) -> Result<()> {
    let rec = SearchRecorder::new(
        JsonFileHistory::new(&config.analytics.path),
        config.analytics.max_events,
    );
    let usage = rec.filter_usage();
    println!("searches:      {}", usage.total);
    println!("domain:        {}", usage.domain);
    println!("year:          {}", usage.year);
    println!("tags:          {}", usage.tags);
    println!("reading time:  {}", usage.reading_time);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use mlp_reviews_core::models::SearchFilters;
    use tempfile::TempDir;

    fn query(q: &str) -> SearchFilters {
        SearchFilters {
            query: q.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_missing_file_is_empty() {
        let tmp = TempDir::new().unwrap();
        let history = JsonFileHistory::new(tmp.path().join("none.json"));
        assert!(history.load().unwrap().is_empty());
    }

    #[test]
    fn test_corrupt_file_is_empty() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("a.json");
        std::fs::write(&path, "{not json").unwrap();
        assert!(JsonFileHistory::new(&path).load().unwrap().is_empty());
    }

    #[test]
    fn test_persists_newest_first_across_instances() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("nested/analytics.json");

        let rec = SearchRecorder::new(JsonFileHistory::new(&path), 2);
        rec.log_search(&query("transformers"), 1, 1);
        rec.log_search(&query("quantum"), 1, 2);
        rec.log_search(&query("energy"), 1, 3);

        let reopened = SearchRecorder::new(JsonFileHistory::new(&path), 2);
        let history = reopened.history();
        let queries: Vec<&str> = history.iter().map(|e| e.query.as_str()).collect();
        assert_eq!(queries, vec!["energy", "quantum"]);
    }

    #[test]
    fn test_disabled_recorder() {
        let mut config = Config::minimal();
        config.analytics.enabled = false;
        assert!(recorder(&config).is_none());
    }
}

//! # MLP Reviews Core
//!
//! Runtime-free logic for the MLP Reviews catalog: the review data model,
//! the fuzzy search index, highlighting, the filter/sort engine,
//! pagination, search analytics, and the discovery controller that ties
//! them together.
//!
//! This crate contains no tokio, sqlx, filesystem I/O, or other
//! native-only dependencies. Time is passed in explicitly (milliseconds)
//! so every component is deterministic under test.
//!
//! ## Pipeline
//!
//! ```text
//! ReviewStore ──▶ SearchIndex ──▶ highlight
//!                      │
//!                      ▼
//!               filter_and_sort ──▶ paginate ──▶ DiscoveryView
//!                      │
//!                      └──────▶ SearchRecorder (debounced)
//! ```

pub mod analytics;
pub mod discovery;
pub mod fetch;
pub mod filter;
pub mod fuzzy;
pub mod highlight;
pub mod models;
pub mod pagination;
pub mod store;
pub mod timer;

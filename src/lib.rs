//! # MLP Reviews
//!
//! A research review catalog: SQLite storage, fuzzy discovery with
//! filters, sorting and pagination, search analytics, export, and an HTTP
//! API. The runtime-free pipeline lives in [`mlp_reviews_core`]; this crate
//! wires it to a database, a config file, a CLI and a server.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐   ┌───────────────────────┐   ┌──────────────┐
//! │    SQLite    │──▶│  DiscoveryController   │──▶│ CLI / HTTP   │
//! │ SqliteStore  │   │ fuzzy → filter → page  │   │ mlp, /api/*  │
//! └──────────────┘   └───────────┬───────────┘   └──────────────┘
//!                                ▼
//!                       JsonFileHistory (analytics)
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! mlp init
//! mlp seed
//! mlp search "quantum" --sort alphabetical
//! mlp serve
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`db`] | Database connection |
//! | [`migrate`] | Schema migrations |
//! | [`sqlite_store`] | SQLite `ReviewStore` |
//! | [`seed`] | Sample catalog |
//! | [`search`] | Discovery runs for CLI and server |
//! | [`get`] | Single-review lookup |
//! | [`export`] | Markdown and JSON export |
//! | [`analytics`] | File-backed search analytics |
//! | [`server`] | HTTP API |

pub mod analytics;
pub mod config;
pub mod db;
pub mod export;
pub mod get;
pub mod migrate;
pub mod search;
pub mod seed;
pub mod server;
pub mod sqlite_store;

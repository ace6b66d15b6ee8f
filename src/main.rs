//! # MLP Reviews CLI (`mlp`)
//!
//! ## Usage
//!
//! ```bash
//! mlp --config ./config/mlp.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `mlp init` | Create the SQLite database and run schema migrations |
//! | `mlp seed` | Insert the sample reviews into an empty catalog |
//! | `mlp search [QUERY]` | Fuzzy search with filters, sort and paging |
//! | `mlp get <nid> <slug>` | Print one review |
//! | `mlp export` | Export the filtered list as Markdown or JSON |
//! | `mlp analytics popular` | Most searched terms |
//! | `mlp analytics usage` | How often each filter is used |
//! | `mlp serve` | Start the HTTP server |

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use mlp_reviews::export::ExportFormat;
use mlp_reviews::search::DiscoveryRequest;
use mlp_reviews::sqlite_store::SqliteStore;
use mlp_reviews::{analytics, config, db, export, get, migrate, search, seed, server};
use mlp_reviews_core::models::{ReadingTimeBucket, SearchFilters, SortKey};

/// MLP Reviews: research review catalog with fuzzy discovery.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. See `config/mlp.example.toml` for a full example.
#[derive(Parser)]
#[command(
    name = "mlp",
    about = "MLP Reviews: research review catalog with fuzzy discovery",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/mlp.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the database schema. Idempotent.
    Init,

    /// Insert the sample reviews when the catalog is empty.
    Seed,

    /// Search published reviews.
    ///
    /// An empty query lists everything that passes the filters.
    Search {
        /// Search terms (fuzzy, typo tolerant).
        #[arg(default_value = "")]
        query: String,

        #[command(flatten)]
        filters: FilterArgs,

        /// Page number (1-based, clamped to the last page).
        #[arg(long, default_value_t = 1)]
        page: usize,
    },

    /// Print a review by its public key.
    Get {
        nid: String,
        slug: String,
    },

    /// Export the filtered review list.
    Export {
        #[arg(long, value_enum, default_value = "markdown")]
        format: ExportFormat,

        /// Output file, or `-` for stdout. Defaults to `mlp-reviews-YYYY-MM-DD.<ext>`.
        #[arg(long, short)]
        output: Option<PathBuf>,

        /// Search terms applied before export.
        #[arg(long, default_value = "")]
        query: String,

        #[command(flatten)]
        filters: FilterArgs,
    },

    /// Inspect recorded searches.
    Analytics {
        #[command(subcommand)]
        action: AnalyticsAction,
    },

    /// Start the HTTP server on `[server].bind`.
    Serve,
}

#[derive(Subcommand)]
enum AnalyticsAction {
    /// Most frequent search terms.
    Popular {
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },
    /// Filter usage counts.
    Usage,
}

#[derive(Args)]
struct FilterArgs {
    /// Exact domain, e.g. "Machine Learning".
    #[arg(long)]
    domain: Option<String>,

    /// Four-digit year of last update.
    #[arg(long)]
    year: Option<String>,

    /// Tag filter (repeatable, match-any).
    #[arg(long = "tag")]
    tags: Vec<String>,

    /// Reading time bucket: quick, medium or long.
    #[arg(long)]
    reading_time: Option<ReadingTimeBucket>,

    /// Sort key: recent, alphabetical or reading-time.
    #[arg(long, default_value = "recent")]
    sort: SortKey,
}

impl FilterArgs {
    fn into_request(self, query: String, page: usize) -> DiscoveryRequest {
        DiscoveryRequest {
            filters: SearchFilters {
                query,
                domain: self.domain,
                year: self.year,
                tags: self.tags,
                reading_time: self.reading_time,
            },
            sort: self.sort,
            page,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mlp=info,mlp_reviews=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Init => {
            migrate::run_migrations(&cfg).await?;
            println!("Database initialized successfully.");
        }
        Commands::Seed => {
            migrate::run_migrations(&cfg).await?;
            let store = SqliteStore::new(db::connect(&cfg).await?);
            let inserted = seed::seed_reviews(&store).await?;
            store.pool().close().await;
            println!("Seeded {} reviews.", inserted);
        }
        Commands::Search {
            query,
            filters,
            page,
        } => {
            search::run_search(&cfg, &filters.into_request(query, page)).await?;
        }
        Commands::Get { nid, slug } => {
            get::run_get(&cfg, &nid, &slug).await?;
        }
        Commands::Export {
            format,
            output,
            query,
            filters,
        } => {
            let request = filters.into_request(query, 1);
            export::run_export(&cfg, format, &request, output.as_deref()).await?;
        }
        Commands::Analytics { action } => match action {
            AnalyticsAction::Popular { limit } => analytics::run_popular(&cfg, limit)?,
            AnalyticsAction::Usage => analytics::run_usage(&cfg)?,
        },
        Commands::Serve => {
            server::run_server(&cfg).await?;
        }
    }

    Ok(())
}

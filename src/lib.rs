pub mod cache;
pub mod cli;
pub mod config;
pub mod domain;
pub mod error;
pub mod ingest;
pub mod metrics;
pub mod provider;
pub mod store;

pub use cache::{CacheKey, ResponseCache};
pub use config::AppConfig;
pub use error::{CourtlineError, Result};
pub use ingest::{IngestTotals, IngestionPipeline};
pub use metrics::{GameLogEntry, MarketComparison, MetricsEngine};
pub use provider::{ProviderClient, SportsDataSource};
pub use store::SqliteStore;

//! Repository layer: index generation, retrieval, caching and chart lookup
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐     ┌──────────────┐     ┌──────────────┐
//! │ ChartLocator │────▶│   Resolution │     │   Fetcher    │
//! │  (resolve)   │     │    Cache     │     │ (HTTP, mock) │
//! └──────────────┘     └──────────────┘     └──────────────┘
//!        │                                         ▲
//!        ▼                                         │
//! ┌──────────────┐     ┌──────────────┐            │
//! │  Repository  │────▶│ ArchiveLoader│            │
//! │  Aggregator  │─────┼──────────────┼────────────┘
//! └──────────────┘     └──────────────┘
//! ```
//!
//! # Modules
//!
//! - [`aggregator`]: Builds indexes from chart directories and fetches remote ones
//! - [`archive`]: Chart metadata loading and archive digests
//! - [`cache`]: TTL-bounded in-memory index cache
//! - [`connection`]: Repository connection parameters
//! - [`error`]: Error type for repository operations
//! - [`fetcher`]: Fetch capability trait
//! - [`http`]: reqwest-backed fetcher
//! - [`locator`]: Cache-backed chart version lookup
//! - [`location`]: URL joining helpers

pub mod aggregator;
pub mod archive;
pub mod cache;
pub mod connection;
pub mod error;
pub mod fetcher;
pub mod http;
pub mod location;
pub mod locator;

pub use aggregator::{RepositoryAggregator, index_directory, update_index};
pub use cache::ResolutionCache;
pub use connection::RepositoryConnection;
pub use error::RepoError;
pub use fetcher::{FetchError, FetchOptions, Fetcher};
pub use http::HttpFetcher;
pub use locator::ChartLocator;

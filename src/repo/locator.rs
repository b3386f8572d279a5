//! Chart version lookup against a repository
//!
//! `ChartLocator` answers "where do I download chart P at constraint C from
//! repository R", consulting the shared index cache first and refetching the
//! index once when the cached copy does not know the chart.

use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::index::catalog::{VersionCatalog, VersionRecord};
use crate::index::error::IndexError;
use crate::repo::aggregator::RepositoryAggregator;
use crate::repo::cache::ResolutionCache;
use crate::repo::connection::RepositoryConnection;
use crate::repo::error::RepoError;
use crate::repo::fetcher::Fetcher;
use crate::repo::location::resolve_reference_url;

pub struct ChartLocator {
    cache: Arc<ResolutionCache>,
    fetcher: Arc<dyn Fetcher>,
    mirror_dir: PathBuf,
    /// Serializes whole lookups, fetches included, across all repositories
    lock: Mutex<()>,
}

impl ChartLocator {
    pub fn new(cache: Arc<ResolutionCache>, fetcher: Arc<dyn Fetcher>, mirror_dir: PathBuf) -> Self {
        Self {
            cache,
            fetcher,
            mirror_dir,
            lock: Mutex::new(()),
        }
    }

    pub fn cache(&self) -> &Arc<ResolutionCache> {
        &self.cache
    }

    /// Resolve `name` at `constraint` to an absolute download URL.
    ///
    /// A cached index that lacks the chart is dropped and fetched again, once.
    /// Only a missing chart triggers that refetch; every other failure is
    /// returned as is.
    pub async fn resolve(
        &self,
        connection: &RepositoryConnection,
        name: &str,
        constraint: &str,
    ) -> Result<String, RepoError> {
        let _guard = self.lock.lock().await;
        let locator = connection.url.as_str();

        let catalog = match self.cache.get(locator) {
            Some(catalog) => {
                debug!("Index cache hit for {}", locator);
                catalog
            }
            None => {
                debug!("Index cache miss for {}", locator);
                self.fetch_and_cache(connection).await?
            }
        };

        let record = match lookup(&catalog, name, constraint)? {
            Some(record) => record,
            None => {
                info!(
                    "Chart {} {:?} not in cached index of {}, refreshing",
                    name, constraint, locator
                );
                self.cache.delete(locator);
                let refreshed = self.fetch_and_cache(connection).await?;
                lookup(&refreshed, name, constraint)?.ok_or_else(|| RepoError::ChartNotFound {
                    name: name.to_string(),
                    constraint: constraint.to_string(),
                    locator: locator.to_string(),
                })?
            }
        };

        let Some(chart_url) = record.urls.first() else {
            return Err(RepoError::NoDownloadableUrl {
                name: name.to_string(),
                constraint: constraint.to_string(),
            });
        };

        resolve_reference_url(locator, chart_url)
    }

    async fn fetch_and_cache(
        &self,
        connection: &RepositoryConnection,
    ) -> Result<Arc<VersionCatalog>, RepoError> {
        let aggregator = RepositoryAggregator::new(
            connection.clone(),
            Arc::clone(&self.fetcher),
            self.mirror_dir.clone(),
        );

        let (catalog, _) = aggregator.fetch_remote_index().await.inspect_err(|e| {
            warn!(
                "{} is not a valid chart repository or cannot be reached: {}",
                connection.url, e
            )
        })?;

        let catalog = Arc::new(catalog);
        self.cache
            .set(&connection.url, Arc::clone(&catalog), self.cache.default_ttl());
        Ok(catalog)
    }
}

/// `Ok(None)` when the chart or a matching version is missing
fn lookup(
    catalog: &VersionCatalog,
    name: &str,
    constraint: &str,
) -> Result<Option<VersionRecord>, RepoError> {
    match catalog.get(name, constraint) {
        Ok(record) => Ok(Some(record.clone())),
        Err(IndexError::ChartNotFound { .. }) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

//! Repository index generation and remote index retrieval
//!
//! `RepositoryAggregator` builds an index from a directory of packaged charts
//! and downloads the index of a remote repository, mirroring it to disk.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::config::{ARCHIVE_SUFFIX, INDEX_FILE_NAME};
use crate::index::catalog::{VersionCatalog, VersionRecord};
use crate::index::codec::{load_index, load_index_file, write_index_file};
use crate::repo::archive::{ArchiveLoader, ChartMetadata, TarballLoader, digest_file};
use crate::repo::connection::RepositoryConnection;
use crate::repo::error::RepoError;
use crate::repo::fetcher::{FetchOptions, Fetcher};
use crate::repo::location::{index_url, resolve_reference_url};

pub struct RepositoryAggregator {
    connection: RepositoryConnection,
    /// Absent for aggregators that only index local archives
    fetcher: Option<Arc<dyn Fetcher>>,
    loader: Arc<dyn ArchiveLoader>,
    mirror_dir: PathBuf,
    index_file_name: String,
    root: Option<PathBuf>,
    chart_paths: Vec<PathBuf>,
    catalog: VersionCatalog,
}

impl RepositoryAggregator {
    pub fn new(
        connection: RepositoryConnection,
        fetcher: Arc<dyn Fetcher>,
        mirror_dir: PathBuf,
    ) -> Self {
        Self {
            fetcher: Some(fetcher),
            mirror_dir,
            ..Self::local(connection)
        }
    }

    /// Aggregator for indexing archives on disk, with no remote access.
    ///
    /// [`fetch_remote_index`](Self::fetch_remote_index) fails on it.
    pub fn local(connection: RepositoryConnection) -> Self {
        Self {
            connection,
            fetcher: None,
            loader: Arc::new(TarballLoader),
            mirror_dir: PathBuf::new(),
            index_file_name: INDEX_FILE_NAME.to_string(),
            root: None,
            chart_paths: Vec::new(),
            catalog: VersionCatalog::new(),
        }
    }

    pub fn with_loader(mut self, loader: Arc<dyn ArchiveLoader>) -> Self {
        self.loader = loader;
        self
    }

    /// Name of the existing index file picked up by [`scan_local`](Self::scan_local)
    pub fn with_index_file_name(mut self, name: &str) -> Self {
        self.index_file_name = name.to_string();
        self
    }

    pub fn catalog(&self) -> &VersionCatalog {
        &self.catalog
    }

    pub fn into_catalog(self) -> VersionCatalog {
        self.catalog
    }

    pub fn chart_paths(&self) -> &[PathBuf] {
        &self.chart_paths
    }

    /// Scan `root` for chart archives and an existing index.
    ///
    /// An existing index replaces the current catalog; a malformed one is
    /// skipped. More than one index file under `root` is an error.
    pub fn scan_local(&mut self, root: &Path) -> Result<(), RepoError> {
        let (chart_paths, index_files) = self.walk(root)?;

        let index = match index_files.as_slice() {
            [] => None,
            [path] => match load_index_file(path) {
                Ok(catalog) => Some(catalog),
                Err(e) => {
                    warn!("Skipping malformed index {:?}: {}", path, e);
                    None
                }
            },
            _ => return Err(RepoError::AmbiguousIndex(index_files)),
        };

        if let Some(catalog) = index {
            self.catalog = catalog;
        }
        self.commit_scan(root, chart_paths);
        Ok(())
    }

    /// Scan `root` for chart archives only, ignoring any index files.
    pub fn scan_archives(&mut self, root: &Path) -> Result<(), RepoError> {
        let (chart_paths, _) = self.walk(root)?;
        self.commit_scan(root, chart_paths);
        Ok(())
    }

    fn commit_scan(&mut self, root: &Path, chart_paths: Vec<PathBuf>) {
        debug!("Found {} chart archives under {:?}", chart_paths.len(), root);
        self.root = Some(root.to_path_buf());
        self.chart_paths = chart_paths;
    }

    /// Returns (archive paths, index file paths) found under `root`
    fn walk(&self, root: &Path) -> Result<(Vec<PathBuf>, Vec<PathBuf>), RepoError> {
        let metadata = std::fs::metadata(root).map_err(|source| RepoError::Io {
            path: root.to_path_buf(),
            source,
        })?;
        if !metadata.is_dir() {
            return Err(RepoError::NotADirectory(root.to_path_buf()));
        }

        let mut chart_paths = Vec::new();
        let mut index_files = Vec::new();

        for entry in WalkDir::new(root).sort_by_file_name() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!("Skipping unreadable entry under {:?}: {}", root, e);
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }

            let file_name = entry.file_name().to_string_lossy().into_owned();
            if file_name == self.index_file_name.as_str() {
                index_files.push(entry.into_path());
            } else if file_name.ends_with(ARCHIVE_SUFFIX) {
                chart_paths.push(entry.into_path());
            }
        }

        Ok((chart_paths, index_files))
    }

    /// Add every scanned archive that is not indexed yet, then sort.
    ///
    /// An archive whose version is already indexed is left alone even when its
    /// digest no longer matches the indexed one.
    pub fn generate_index(&mut self) -> Result<(), RepoError> {
        for path in &self.chart_paths {
            let metadata = self.loader.load(path)?;
            let digest = digest_file(path)?;

            if self.catalog.has(&metadata.name, &metadata.version) {
                debug!(
                    "{}/{} already indexed, keeping existing record for {:?}",
                    metadata.name, metadata.version, path
                );
                continue;
            }

            let url = self.download_url(path)?;
            self.catalog.add(new_record(metadata, digest, url));
        }

        self.catalog.sort_entries();
        info!(
            "Indexed {} charts from {} archives",
            self.catalog.entries.len(),
            self.chart_paths.len()
        );
        Ok(())
    }

    /// Archive path relative to the scanned root, resolved against the
    /// repository URL when one is configured
    fn download_url(&self, path: &Path) -> Result<String, RepoError> {
        let relative = self
            .root
            .as_deref()
            .and_then(|root| path.strip_prefix(root).ok())
            .unwrap_or(path);
        let relative = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");

        if self.connection.url.is_empty() {
            Ok(relative)
        } else {
            resolve_reference_url(&self.connection.url, &relative)
        }
    }

    pub fn write_index(&self, destination: &Path) -> Result<(), RepoError> {
        Ok(write_index_file(&self.catalog, destination)?)
    }

    /// Download the repository index and mirror it into the cache directory.
    ///
    /// Returns the parsed index and the path of the raw mirrored copy.
    pub async fn fetch_remote_index(&self) -> Result<(VersionCatalog, PathBuf), RepoError> {
        let url = index_url(&self.connection.url)?;
        let Some(fetcher) = &self.fetcher else {
            return Err(RepoError::RemoteAccessUnavailable(url));
        };
        let options = FetchOptions::from(&self.connection);

        info!("Fetching repository index {}", url);
        let data = fetcher
            .get(&url, &options)
            .await
            .map_err(|source| RepoError::Fetch {
                url: url.clone(),
                source,
            })?;

        let catalog = load_index(&data)?;

        let key = self.connection.cache_key();
        let chart_list: String = catalog
            .chart_names()
            .map(|name| format!("{}\n", name))
            .collect();
        let charts_file = self.mirror_dir.join(format!("{}-charts.txt", key));
        write_mirror(&charts_file, chart_list.as_bytes()).await?;

        let index_file = self.mirror_dir.join(format!("{}-{}", key, INDEX_FILE_NAME));
        write_mirror(&index_file, &data).await?;

        debug!(
            "Mirrored index of {} ({} charts) to {:?}",
            self.connection.url,
            catalog.entries.len(),
            index_file
        );
        Ok((catalog, index_file))
    }
}

fn new_record(metadata: ChartMetadata, digest: String, url: String) -> VersionRecord {
    VersionRecord {
        name: metadata.name,
        version: metadata.version,
        app_version: metadata.app_version,
        description: metadata.description,
        digest,
        urls: vec![url],
        created: Utc::now(),
    }
}

async fn write_mirror(path: &Path, data: &[u8]) -> Result<(), RepoError> {
    let io_error = |source: std::io::Error| RepoError::Io {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await.map_err(io_error)?;
    }
    tokio::fs::write(path, data).await.map_err(io_error)
}

/// Build an index from the chart archives under `dir`.
///
/// Download URLs are relative to `dir`, or resolved against `base_url` when it
/// is non-empty. Any index file already in `dir` is ignored.
pub fn index_directory(dir: &Path, base_url: &str) -> Result<VersionCatalog, RepoError> {
    let mut aggregator = RepositoryAggregator::local(RepositoryConnection::new(base_url));
    aggregator.scan_archives(dir)?;
    aggregator.generate_index()?;
    Ok(aggregator.into_catalog())
}

/// Regenerate `dir/index.yaml`, optionally merging an existing index into it.
///
/// Charts found in `dir` take priority over entries of `merge_into`. A missing
/// `merge_into` file is created as an empty index first. Returns the path of
/// the written index.
pub fn update_index(
    dir: &Path,
    base_url: &str,
    merge_into: Option<&Path>,
) -> Result<PathBuf, RepoError> {
    let mut generated = index_directory(dir, base_url)?;

    if let Some(merge_path) = merge_into {
        let existing = if merge_path.exists() {
            load_index_file(merge_path)?
        } else {
            info!("Creating empty index at {:?} to merge into", merge_path);
            let empty = VersionCatalog::new();
            write_index_file(&empty, merge_path)?;
            empty
        };
        generated.merge(&existing);
    }

    generated.sort_entries();
    let out = dir.join(INDEX_FILE_NAME);
    write_index_file(&generated, &out)?;
    Ok(out)
}

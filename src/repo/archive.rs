//! Chart archive metadata and digests

#[cfg(test)]
use mockall::automock;

use std::ffi::OsStr;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use flate2::read::GzDecoder;
use serde::Deserialize;
use sha2::{Digest, Sha256};

use crate::repo::error::RepoError;

/// Name of the metadata file inside a chart archive
const CHART_FILE_NAME: &str = "Chart.yaml";

/// The subset of chart metadata recorded in an index
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartMetadata {
    pub name: String,
    pub version: String,
    #[serde(default)]
    pub app_version: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

/// Trait for reading chart metadata out of a packaged archive
#[cfg_attr(test, automock)]
pub trait ArchiveLoader: Send + Sync {
    fn load(&self, path: &Path) -> Result<ChartMetadata, RepoError>;
}

/// Loader for gzip-compressed tarballs holding `<chart>/Chart.yaml`
#[derive(Debug, Default, Clone, Copy)]
pub struct TarballLoader;

impl ArchiveLoader for TarballLoader {
    fn load(&self, path: &Path) -> Result<ChartMetadata, RepoError> {
        let io_error = |source: std::io::Error| RepoError::Io {
            path: path.to_path_buf(),
            source,
        };
        let invalid = |reason: String| RepoError::Archive {
            path: path.to_path_buf(),
            reason,
        };

        let file = File::open(path).map_err(io_error)?;
        let mut archive = tar::Archive::new(GzDecoder::new(file));

        for entry in archive.entries().map_err(io_error)? {
            let mut entry = entry.map_err(io_error)?;
            let entry_path = entry.path().map_err(io_error)?.into_owned();

            let is_chart_file = entry_path.components().count() == 2
                && entry_path.file_name() == Some(OsStr::new(CHART_FILE_NAME));
            if !is_chart_file {
                continue;
            }

            let mut contents = String::new();
            entry.read_to_string(&mut contents).map_err(io_error)?;

            let metadata: ChartMetadata = serde_yaml_ng::from_str(&contents)
                .map_err(|e| invalid(format!("malformed {}: {}", CHART_FILE_NAME, e)))?;
            if metadata.name.is_empty() || metadata.version.is_empty() {
                return Err(invalid(format!(
                    "{} must set name and version",
                    CHART_FILE_NAME
                )));
            }
            return Ok(metadata);
        }

        Err(invalid(format!("no {} found", CHART_FILE_NAME)))
    }
}

/// Hex-encoded SHA-256 of a file's contents
pub fn digest_file(path: &Path) -> Result<String, RepoError> {
    let io_error = |source: std::io::Error| RepoError::Io {
        path: path.to_path_buf(),
        source,
    };

    let mut file = File::open(path).map_err(io_error)?;
    let mut hasher = Sha256::new();
    std::io::copy(&mut file, &mut hasher).map_err(io_error)?;

    Ok(hex::encode(hasher.finalize()))
}

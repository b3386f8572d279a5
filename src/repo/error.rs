use std::path::PathBuf;

use thiserror::Error;

use crate::index::error::{IndexError, describe_chart};
use crate::repo::fetcher::FetchError;

#[derive(Debug, Error)]
pub enum RepoError {
    #[error(transparent)]
    Index(#[from] IndexError),

    #[error("{0:?} is not a directory")]
    NotADirectory(PathBuf),

    #[error("Found more than one index file: {0:?}")]
    AmbiguousIndex(Vec<PathBuf>),

    #[error("{} not found in {locator} repository", describe_chart(.name, .constraint))]
    ChartNotFound {
        name: String,
        constraint: String,
        locator: String,
    },

    #[error("{} has no downloadable URLs", describe_chart(.name, .constraint))]
    NoDownloadableUrl { name: String, constraint: String },

    #[error("Failed to parse {url} as URL: {source}")]
    UrlResolution {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("IO error on {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to fetch {url}: {source}")]
    Fetch {
        url: String,
        #[source]
        source: FetchError,
    },

    #[error("Cannot fetch {0}: aggregator has no fetcher")]
    RemoteAccessUnavailable(String),

    #[error("Invalid chart archive {path:?}: {reason}")]
    Archive { path: PathBuf, reason: String },
}

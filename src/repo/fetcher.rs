//! Fetch capability for retrieving repository content

#[cfg(test)]
use mockall::automock;

use std::path::PathBuf;

use thiserror::Error;

use crate::repo::connection::RepositoryConnection;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Unexpected status {status} for {url}")]
    Status { status: u16, url: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Client certificate requires both a certificate file and a key file")]
    IncompleteClientCertificate,
}

/// Transport options for a single fetch
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchOptions {
    pub base_url: String,
    pub insecure_skip_tls_verify: bool,
    pub cert_file: Option<PathBuf>,
    pub key_file: Option<PathBuf>,
    pub ca_file: Option<PathBuf>,
    pub username: Option<String>,
    pub password: Option<String>,
}

impl FetchOptions {
    /// Whether the fetch needs a client configured beyond the defaults
    pub fn has_tls_settings(&self) -> bool {
        self.insecure_skip_tls_verify
            || self.ca_file.is_some()
            || self.cert_file.is_some()
            || self.key_file.is_some()
    }
}

impl From<&RepositoryConnection> for FetchOptions {
    fn from(connection: &RepositoryConnection) -> Self {
        Self {
            base_url: connection.url.clone(),
            insecure_skip_tls_verify: connection.insecure_skip_tls_verify,
            cert_file: connection.cert_file.clone(),
            key_file: connection.key_file.clone(),
            ca_file: connection.ca_file.clone(),
            username: connection.username.clone(),
            password: connection.password.clone(),
        }
    }
}

/// Trait for retrieving raw bytes from a repository
#[cfg_attr(test, automock)]
#[async_trait::async_trait]
pub trait Fetcher: Send + Sync {
    /// Fetches the content at `url`
    ///
    /// # Returns
    /// * `Ok(Vec<u8>)` - The response body
    /// * `Err(FetchError)` - If the transport fails or the server rejects the request
    async fn get(&self, url: &str, options: &FetchOptions) -> Result<Vec<u8>, FetchError>;
}

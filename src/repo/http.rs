//! reqwest-backed fetcher

use std::time::Duration;

use reqwest::{Certificate, Client, Identity};
use tracing::{debug, warn};

use crate::config::FETCH_TIMEOUT_MS;
use crate::repo::fetcher::{FetchError, FetchOptions, Fetcher};

const USER_AGENT: &str = concat!("chart-index/", env!("CARGO_PKG_VERSION"));

/// Fetcher implementation for HTTP(S) repositories
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new() -> Self {
        Self {
            client: build_client(&FetchOptions::default()).expect("Failed to create HTTP client"),
        }
    }
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new()
    }
}

fn build_client(options: &FetchOptions) -> Result<Client, FetchError> {
    let mut builder = Client::builder()
        .user_agent(USER_AGENT)
        .timeout(Duration::from_millis(FETCH_TIMEOUT_MS));

    if options.insecure_skip_tls_verify {
        builder = builder.danger_accept_invalid_certs(true);
    }

    if let Some(ca_file) = &options.ca_file {
        let pem = std::fs::read(ca_file)?;
        builder = builder.add_root_certificate(Certificate::from_pem(&pem)?);
    }

    // reqwest wants the certificate chain and private key in one PEM buffer
    match (&options.cert_file, &options.key_file) {
        (Some(cert_file), Some(key_file)) => {
            let mut pem = std::fs::read(cert_file)?;
            pem.push(b'\n');
            pem.extend(std::fs::read(key_file)?);
            builder = builder.identity(Identity::from_pem(&pem)?);
        }
        (None, None) => {}
        _ => {
            warn!(
                "Client certificate for {} needs both cert and key files",
                options.base_url
            );
            return Err(FetchError::IncompleteClientCertificate);
        }
    }

    Ok(builder.build()?)
}

#[async_trait::async_trait]
impl Fetcher for HttpFetcher {
    async fn get(&self, url: &str, options: &FetchOptions) -> Result<Vec<u8>, FetchError> {
        let client = if options.has_tls_settings() {
            build_client(options)?
        } else {
            self.client.clone()
        };

        let mut request = client.get(url);
        if let Some(username) = &options.username {
            request = request.basic_auth(username, options.password.as_ref());
        }

        debug!("GET {}", url);
        let response = request.send().await?;

        let status = response.status();
        if !status.is_success() {
            warn!("Repository returned status {}: {}", status, url);
            return Err(FetchError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        Ok(response.bytes().await?.to_vec())
    }
}

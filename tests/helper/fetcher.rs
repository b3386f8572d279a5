//! Fetcher test utilities

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use chart_index::repo::{FetchError, FetchOptions, Fetcher};

/// Fetcher that serves queued index documents in order.
///
/// The last document keeps being served once the queue is drained.
pub struct SequenceFetcher {
    responses: Mutex<VecDeque<Result<String, u16>>>,
    last: Mutex<Option<Result<String, u16>>>,
    calls: AtomicUsize,
    urls: Mutex<Vec<String>>,
    delay: Duration,
}

impl SequenceFetcher {
    pub fn new() -> Self {
        Self {
            responses: Mutex::new(VecDeque::new()),
            last: Mutex::new(None),
            calls: AtomicUsize::new(0),
            urls: Mutex::new(Vec::new()),
            delay: Duration::ZERO,
        }
    }

    pub fn then_index(self, body: &str) -> Self {
        self.responses.lock().unwrap().push_back(Ok(body.to_string()));
        self
    }

    pub fn then_status(self, status: u16) -> Self {
        self.responses.lock().unwrap().push_back(Err(status));
        self
    }

    /// Delay every response, to widen race windows in concurrency tests
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn requested_urls(&self) -> Vec<String> {
        self.urls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Fetcher for SequenceFetcher {
    async fn get(&self, url: &str, _options: &FetchOptions) -> Result<Vec<u8>, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.urls.lock().unwrap().push(url.to_string());

        let response = {
            let mut last = self.last.lock().unwrap();
            if let Some(next) = self.responses.lock().unwrap().pop_front() {
                *last = Some(next);
            }
            last.clone().expect("SequenceFetcher has no responses queued")
        };

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        match response {
            Ok(body) => Ok(body.into_bytes()),
            Err(status) => Err(FetchError::Status {
                status,
                url: url.to_string(),
            }),
        }
    }
}

/// Build an index document with one record per (chart, version)
pub fn index_yaml(charts: &[(&str, &[&str])]) -> String {
    if charts.is_empty() {
        return String::from("apiVersion: v1\nentries: {}\n");
    }
    let mut yaml = String::from("apiVersion: v1\nentries:\n");
    for (name, versions) in charts {
        yaml.push_str(&format!("  {}:\n", name));
        for version in *versions {
            yaml.push_str(&format!(
                "    - name: {name}\n      version: {version}\n      digest: sha-{name}-{version}\n      urls: [{name}-{version}.tgz]\n"
            ));
        }
    }
    yaml
}

//! Byte transport for repositories.
//!
//! Transports expose the capability surface the registry needs (probe,
//! fetch descriptor, fetch artifact, fetch version index), dispatched as a
//! tagged variant over the repository URL scheme. Transport-level failures
//! are retried with exponential backoff a bounded number of times; a
//! not-found answer is never retried.

use std::path::PathBuf;
use std::time::Duration;

use reqwest::{Client, ClientBuilder};

use garner_core::error::{GarnerError, GarnerResult};
use garner_core::types::Coordinate;

use crate::repository::Repository;

/// Configuration for exponential backoff retry logic
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of retry attempts after the first try
    pub max_retries: u32,
    /// Initial delay before first retry
    pub initial_delay: Duration,
    /// Maximum delay between retries
    pub max_delay: Duration,
    /// Multiplier for exponential backoff
    pub multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            // A failing probe is retried once before the registry falls
            // through to the next repository
            max_retries: 1,
            initial_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(5),
            multiplier: 2.0,
        }
    }
}

/// Transport dispatched by repository URL scheme
#[derive(Debug, Clone)]
pub enum Transport {
    Http(HttpTransport),
    File(FileTransport),
}

/// HTTP(S) transport with connection pooling and per-call timeout
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    retry: RetryConfig,
}

/// Local-filesystem transport for `file://` repositories
#[derive(Debug, Clone)]
pub struct FileTransport {
    root: PathBuf,
    retry: RetryConfig,
}

impl Transport {
    /// Select a transport for the repository's URL scheme
    pub fn for_repository(repository: &Repository) -> GarnerResult<Self> {
        Self::with_retry_config(repository, RetryConfig::default())
    }

    /// Select a transport with an explicit retry configuration
    pub fn with_retry_config(
        repository: &Repository,
        retry: RetryConfig,
    ) -> GarnerResult<Self> {
        if repository.url().starts_with("file://") {
            let parsed =
                url::Url::parse(repository.url()).map_err(|e| GarnerError::ConfigValidation {
                    field: "repository.url".to_string(),
                    reason: format!("'{}': {}", repository.url(), e),
                })?;
            let root = parsed
                .to_file_path()
                .map_err(|_| GarnerError::ConfigValidation {
                    field: "repository.url".to_string(),
                    reason: format!("'{}' is not a local path", repository.url()),
                })?;
            Ok(Transport::File(FileTransport { root, retry }))
        } else {
            Ok(Transport::Http(HttpTransport::new(retry)?))
        }
    }

    /// Check whether the repository can supply the coordinate's descriptor
    pub async fn probe(&self, repository: &Repository, coordinate: &Coordinate) -> GarnerResult<bool> {
        let path = repository.layout().descriptor_path(coordinate)?;
        match self {
            Transport::Http(http) => http.probe(repository, &path).await,
            Transport::File(file) => file.probe(&path).await,
        }
    }

    /// Fetch raw descriptor bytes for a pinned coordinate
    pub async fn fetch_descriptor(
        &self,
        repository: &Repository,
        coordinate: &Coordinate,
    ) -> GarnerResult<Vec<u8>> {
        let path = repository.layout().descriptor_path(coordinate)?;
        self.fetch(repository, &path, &coordinate.to_string()).await
    }

    /// Fetch raw artifact bytes for a pinned coordinate
    pub async fn fetch_artifact(
        &self,
        repository: &Repository,
        coordinate: &Coordinate,
    ) -> GarnerResult<Vec<u8>> {
        let path = repository.layout().artifact_path(coordinate)?;
        self.fetch(repository, &path, &coordinate.to_string()).await
    }

    /// Fetch the version index for a (group, name)
    pub async fn fetch_version_index(
        &self,
        repository: &Repository,
        group: &str,
        name: &str,
    ) -> GarnerResult<Vec<u8>> {
        let path = repository.layout().index_path(group, name);
        self.fetch(repository, &path, &format!("{}:{}", group, name)).await
    }

    async fn fetch(
        &self,
        repository: &Repository,
        path: &str,
        subject: &str,
    ) -> GarnerResult<Vec<u8>> {
        match self {
            Transport::Http(http) => http.fetch(repository, path, subject).await,
            Transport::File(file) => file.fetch(repository, path, subject).await,
        }
    }
}

/// Execute an operation with exponential backoff on transient failures.
/// Not-found and other data errors are returned immediately.
async fn with_retry<F, Fut, T>(retry: &RetryConfig, operation: F) -> GarnerResult<T>
where
    F: Fn() -> Fut,
    Fut: std::future::Future<Output = GarnerResult<T>>,
{
    let mut delay = retry.initial_delay;
    let mut last_error = None;

    for attempt in 0..=retry.max_retries {
        match operation().await {
            Ok(result) => return Ok(result),
            Err(error) => {
                let transient = error.is_transient();
                last_error = Some(error);

                if !transient || attempt == retry.max_retries {
                    break;
                }

                tokio::time::sleep(delay).await;
                delay = std::cmp::min(
                    Duration::from_millis((delay.as_millis() as f64 * retry.multiplier) as u64),
                    retry.max_delay,
                );
            }
        }
    }

    Err(last_error.unwrap_or(GarnerError::Transport {
        message: "retry loop completed without result".to_string(),
        source: None,
    }))
}

impl HttpTransport {
    fn new(retry: RetryConfig) -> GarnerResult<Self> {
        let client = ClientBuilder::new()
            .pool_max_idle_per_host(16)
            .pool_idle_timeout(Duration::from_secs(90))
            .timeout(Duration::from_secs(30))
            .gzip(true)
            .user_agent(concat!("garner/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| {
                GarnerError::transport("Failed to create HTTP client".to_string(), e)
            })?;
        Ok(Self { client, retry })
    }

    fn url_for(&self, repository: &Repository, path: &str) -> String {
        format!("{}/{}", repository.url(), path)
    }

    async fn probe(&self, repository: &Repository, path: &str) -> GarnerResult<bool> {
        let url = self.url_for(repository, path);
        with_retry(&self.retry, || async {
            let response = self
                .client
                .head(&url)
                .send()
                .await
                .map_err(|e| GarnerError::transport(format!("HEAD {} failed", url), e))?;

            match response.status() {
                status if status.is_success() => Ok(true),
                reqwest::StatusCode::NOT_FOUND => Ok(false),
                status => Err(GarnerError::Transport {
                    message: format!("HEAD {} returned status {}", url, status),
                    source: None,
                }),
            }
        })
        .await
    }

    async fn fetch(
        &self,
        repository: &Repository,
        path: &str,
        subject: &str,
    ) -> GarnerResult<Vec<u8>> {
        let url = self.url_for(repository, path);
        with_retry(&self.retry, || async {
            let response = self
                .client
                .get(&url)
                .send()
                .await
                .map_err(|e| GarnerError::transport(format!("GET {} failed", url), e))?;

            match response.status() {
                status if status.is_success() => {
                    let bytes = response
                        .bytes()
                        .await
                        .map_err(|e| {
                            GarnerError::transport(format!("Failed to read body of {}", url), e)
                        })?
                        .to_vec();
                    Ok(bytes)
                }
                reqwest::StatusCode::NOT_FOUND => Err(GarnerError::NotFound {
                    coordinate: subject.to_string(),
                    attempted: vec![repository.id().to_string()],
                }),
                status => Err(GarnerError::Transport {
                    message: format!("GET {} returned status {}", url, status),
                    source: None,
                }),
            }
        })
        .await
    }
}

impl FileTransport {
    async fn probe(&self, path: &str) -> GarnerResult<bool> {
        Ok(tokio::fs::try_exists(self.root.join(path))
            .await
            .unwrap_or(false))
    }

    async fn fetch(
        &self,
        repository: &Repository,
        path: &str,
        subject: &str,
    ) -> GarnerResult<Vec<u8>> {
        let full = self.root.join(path);
        with_retry(&self.retry, || async {
            match tokio::fs::read(&full).await {
                Ok(bytes) => Ok(bytes),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    Err(GarnerError::NotFound {
                        coordinate: subject.to_string(),
                        attempted: vec![repository.id().to_string()],
                    })
                }
                Err(e) => Err(GarnerError::io(
                    format!("Failed to read {}", full.display()),
                    e,
                )),
            }
        })
        .await
    }
}

//! Ordered repository registry.
//!
//! Owns the configured repositories and their transports, and answers
//! locate/fetch requests by iterating repositories in registration order.
//! Transport-level failures (already retried inside the transport) make a
//! repository fall through to the next one; data-correctness failures such
//! as a malformed descriptor are fatal and never fall through.

use tracing::{debug, warn};

use garner_core::error::{GarnerError, GarnerResult};
use garner_core::types::{Coordinate, Version};

use crate::descriptor::{Descriptor, VersionIndex};
use crate::repository::Repository;
use crate::transport::{RetryConfig, Transport};

#[derive(Debug)]
struct RegistryEntry {
    repository: Repository,
    transport: Transport,
}

/// Ordered collection of named artifact sources
#[derive(Debug, Default)]
pub struct RepositoryRegistry {
    entries: Vec<RegistryEntry>,
    retry: RetryConfig,
}

impl RepositoryRegistry {
    /// Create an empty registry with default retry behavior
    pub fn new() -> Self {
        Self::with_retry_config(RetryConfig::default())
    }

    /// Create an empty registry with explicit transport retry behavior
    pub fn with_retry_config(retry: RetryConfig) -> Self {
        Self {
            entries: Vec::new(),
            retry,
        }
    }

    /// Register a repository. Priority is registration order; ids must be
    /// unique.
    pub fn register(&mut self, repository: Repository) -> GarnerResult<()> {
        if self.entries.iter().any(|e| e.repository.id() == repository.id()) {
            return Err(GarnerError::ConfigValidation {
                field: "repository.id".to_string(),
                reason: format!("duplicate repository id '{}'", repository.id()),
            });
        }
        let transport = Transport::with_retry_config(&repository, self.retry.clone())?;
        self.entries.push(RegistryEntry {
            repository,
            transport,
        });
        Ok(())
    }

    /// Configured repositories in priority order
    pub fn repositories(&self) -> impl Iterator<Item = &Repository> {
        self.entries.iter().map(|e| &e.repository)
    }

    /// Number of configured repositories
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if no repositories are configured
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Locate the first repository able to supply the coordinate's
    /// descriptor, returning it with the raw bytes
    pub async fn locate<'a>(
        &'a self,
        coordinate: &'a Coordinate,
    ) -> GarnerResult<(&'a Repository, Vec<u8>)> {
        self.first_success(coordinate, |entry| async move {
            entry
                .transport
                .fetch_descriptor(&entry.repository, coordinate)
                .await
        })
        .await
    }

    /// Fetch and parse the descriptor for a pinned coordinate.
    /// A parse failure is fatal; later repositories are not consulted for
    /// a repaired copy.
    pub async fn fetch_descriptor(&self, coordinate: &Coordinate) -> GarnerResult<Descriptor> {
        let (repository, bytes) = self.locate(coordinate).await?;
        debug!(
            coordinate = %coordinate,
            repository = repository.id(),
            "fetched descriptor"
        );
        Descriptor::parse(coordinate, &bytes)
    }

    /// Fetch artifact bytes for a pinned coordinate from the first
    /// repository able to supply them
    pub async fn fetch_artifact(&self, coordinate: &Coordinate) -> GarnerResult<Vec<u8>> {
        let (repository, bytes) = self
            .first_success(coordinate, |entry| async move {
                entry
                    .transport
                    .fetch_artifact(&entry.repository, coordinate)
                    .await
            })
            .await?;
        debug!(
            coordinate = %coordinate,
            repository = repository.id(),
            size = bytes.len(),
            "fetched artifact"
        );
        Ok(bytes)
    }

    /// Union of the versions offered for (group, name) across all
    /// repositories, ascending and deduplicated. Repositories without an
    /// index simply contribute nothing.
    pub async fn versions(&self, group: &str, name: &str) -> GarnerResult<Vec<Version>> {
        let mut offered: Vec<Version> = Vec::new();
        for entry in &self.entries {
            match entry
                .transport
                .fetch_version_index(&entry.repository, group, name)
                .await
            {
                Ok(bytes) => {
                    let index = VersionIndex::parse(group, name, &bytes)?;
                    offered.extend(index.offered());
                }
                Err(GarnerError::NotFound { .. }) => {}
                Err(e) if e.is_transient() => {
                    warn!(
                        repository = entry.repository.id(),
                        error = %e,
                        "skipping version index"
                    );
                }
                Err(e) => return Err(e),
            }
        }
        offered.sort();
        offered.dedup();
        Ok(offered)
    }

    /// Iterate entries in priority order, returning the first success.
    /// Not-found and transport failures fall through; anything else is
    /// fatal.
    async fn first_success<'a, F, Fut>(
        &'a self,
        coordinate: &'a Coordinate,
        operation: F,
    ) -> GarnerResult<(&'a Repository, Vec<u8>)>
    where
        F: Fn(&'a RegistryEntry) -> Fut,
        Fut: std::future::Future<Output = GarnerResult<Vec<u8>>> + 'a,
    {
        let mut attempted = Vec::with_capacity(self.entries.len());
        for entry in &self.entries {
            attempted.push(entry.repository.id().to_string());
            match operation(entry).await {
                Ok(bytes) => return Ok((&entry.repository, bytes)),
                Err(GarnerError::NotFound { .. }) => {
                    debug!(
                        coordinate = %coordinate,
                        repository = entry.repository.id(),
                        "not available, trying next repository"
                    );
                }
                Err(e) if e.is_transient() => {
                    warn!(
                        coordinate = %coordinate,
                        repository = entry.repository.id(),
                        error = %e,
                        "transport failure, trying next repository"
                    );
                }
                Err(e) => return Err(e),
            }
        }

        Err(GarnerError::NotFound {
            coordinate: coordinate.to_string(),
            attempted,
        })
    }
}

#[cfg(test)]
mod tests;

//! Single-flight descriptor cache.
//!
//! Memoizes parsed descriptors per pinned coordinate for the duration of
//! one resolution run. Each entry is guarded by a per-key in-flight cell:
//! concurrent expansion of the same coordinate collapses into a single
//! registry fetch and later requesters await the in-flight result.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::OnceCell;

use garner_core::error::GarnerResult;
use garner_core::types::Coordinate;
use garner_registry::{Descriptor, RepositoryRegistry};

/// Memoizing descriptor cache over a repository registry
pub struct DescriptorCache {
    registry: Arc<RepositoryRegistry>,
    entries: DashMap<Coordinate, Arc<OnceCell<Arc<Descriptor>>>>,
}

impl DescriptorCache {
    /// Create a cache over the given registry
    pub fn new(registry: Arc<RepositoryRegistry>) -> Self {
        Self {
            registry,
            entries: DashMap::new(),
        }
    }

    /// The registry this cache fetches through
    pub fn registry(&self) -> &RepositoryRegistry {
        &self.registry
    }

    /// Get the descriptor for a pinned coordinate, fetching at most once
    /// per resolution run. A failed fetch is not cached; the next caller
    /// retries.
    pub async fn get(&self, coordinate: &Coordinate) -> GarnerResult<Arc<Descriptor>> {
        let cell = self
            .entries
            .entry(coordinate.clone())
            .or_insert_with(|| Arc::new(OnceCell::new()))
            .clone();

        let descriptor = cell
            .get_or_try_init(|| async {
                let descriptor = self.registry.fetch_descriptor(coordinate).await?;
                Ok::<_, garner_core::error::GarnerError>(Arc::new(descriptor))
            })
            .await?;
        Ok(descriptor.clone())
    }

    /// Number of cached descriptors
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the cache is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop all entries. Called between independent resolution runs.
    pub fn clear(&self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;
    use std::time::Duration;

    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use garner_registry::{LayoutKind, Repository};

    const DESCRIPTOR: &str = r#"{"group":"org.example","name":"widget","version":"1.0"}"#;

    async fn cache_over(server: &MockServer) -> DescriptorCache {
        let mut registry = RepositoryRegistry::new();
        registry
            .register(
                Repository::builder()
                    .id("mock")
                    .url(server.uri())
                    .layout(LayoutKind::Maven2)
                    .build()
                    .unwrap(),
            )
            .unwrap();
        DescriptorCache::new(Arc::new(registry))
    }

    fn coordinate() -> Coordinate {
        Coordinate::from_str("org.example:widget:1.0").unwrap()
    }

    #[tokio::test]
    async fn test_memoizes_fetches() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/org/example/widget/1.0/widget-1.0.json"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(DESCRIPTOR, "application/json"))
            .expect(1)
            .mount(&server)
            .await;

        let cache = cache_over(&server).await;
        let first = cache.get(&coordinate()).await.unwrap();
        let second = cache.get(&coordinate()).await.unwrap();
        assert_eq!(first.name, second.name);
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_requests_collapse_into_one_fetch() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/org/example/widget/1.0/widget-1.0.json"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_raw(DESCRIPTOR, "application/json")
                    .set_delay(Duration::from_millis(50)),
            )
            .expect(1)
            .mount(&server)
            .await;

        let cache = Arc::new(cache_over(&server).await);
        let mut tasks = tokio::task::JoinSet::new();
        for _ in 0..8 {
            let cache = cache.clone();
            tasks.spawn(async move { cache.get(&coordinate()).await });
        }
        while let Some(result) = tasks.join_next().await {
            assert!(result.unwrap().is_ok());
        }
    }

    #[tokio::test]
    async fn test_failed_fetch_is_not_cached() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/org/example/widget/1.0/widget-1.0.json"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let cache = cache_over(&server).await;
        assert!(cache.get(&coordinate()).await.is_err());
        assert_eq!(cache.len(), 1);
        // The entry is an empty in-flight cell, not a cached failure;
        // clearing resets everything
        cache.clear();
        assert!(cache.is_empty());
    }
}

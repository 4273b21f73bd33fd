//! High-level resolution engine.
//!
//! Composes the pipeline: graph expansion runs to completion, then conflict
//! resolution, then (separately) materialization. The stages never overlap;
//! a later-discovered shallower path can still change an outcome, so no
//! winner is declared before the graph is fully expanded.

use std::sync::Arc;

use camino::Utf8PathBuf;

use garner_cache::ArtifactStore;
use garner_core::error::GarnerResult;
use garner_core::types::{Coordinate, Dependency};
use garner_registry::RepositoryRegistry;

use crate::builder::{CancelToken, GraphBuilder, ResolutionPolicy};
use crate::cache::DescriptorCache;
use crate::conflict::{ConflictResolver, ResolvedGraph};
use crate::materialize::materialize;

/// Resolution engine over a repository registry and a local artifact store
pub struct Resolver {
    registry: Arc<RepositoryRegistry>,
    cache: Arc<DescriptorCache>,
    store: ArtifactStore,
    policy: ResolutionPolicy,
    cancel: CancelToken,
}

impl Resolver {
    /// Create a resolver with the default policy
    pub fn new(registry: Arc<RepositoryRegistry>, store: ArtifactStore) -> Self {
        Self {
            cache: Arc::new(DescriptorCache::new(registry.clone())),
            registry,
            store,
            policy: ResolutionPolicy::default(),
            cancel: CancelToken::new(),
        }
    }

    /// Replace the resolution policy
    pub fn with_policy(mut self, policy: ResolutionPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Token for cancelling runs cooperatively from another task
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// The local artifact store
    pub fn store(&self) -> &ArtifactStore {
        &self.store
    }

    /// Resolve root dependency edges into an immutable resolved graph.
    /// All-or-nothing: any fatal failure yields an error, never a partial
    /// result.
    pub async fn resolve(&self, roots: Vec<Dependency>) -> GarnerResult<ResolvedGraph> {
        // Descriptor cache entries live for one run unless configured to
        // persist
        if !self.policy.retain_descriptor_cache {
            self.cache.clear();
        }

        let raw = GraphBuilder::new(self.cache.clone(), self.policy.clone())
            .with_cancel_token(self.cancel.clone())
            .expand(roots)
            .await?;
        ConflictResolver::new(self.policy.mediation).resolve(&raw)
    }

    /// Materialize every winning node through the artifact store
    pub async fn materialize(
        &self,
        resolved: &ResolvedGraph,
    ) -> GarnerResult<Vec<(Coordinate, Utf8PathBuf)>> {
        materialize(resolved, &self.registry, &self.store, &self.cancel).await
    }
}

//! Materialization of a resolved graph.
//!
//! Fetches artifact bytes (distinct from descriptor fetches) for each
//! winning node and writes them through the local artifact store. Fetches
//! for distinct coordinates run concurrently; results come back in the
//! resolved graph's stable topological order. Already-cached coordinates
//! trigger no fetch at all.

use std::sync::Arc;

use camino::Utf8PathBuf;
use tokio::task::JoinSet;
use tracing::debug;

use garner_cache::ArtifactStore;
use garner_core::error::{GarnerError, GarnerResult};
use garner_core::types::Coordinate;
use garner_registry::RepositoryRegistry;

use crate::builder::CancelToken;
use crate::conflict::ResolvedGraph;

/// Materialize every winning node, returning (coordinate, local path)
/// pairs in stable topological order. Idempotent: a second run over the
/// same graph performs zero artifact fetches.
pub async fn materialize(
    resolved: &ResolvedGraph,
    registry: &Arc<RepositoryRegistry>,
    store: &ArtifactStore,
    cancel: &CancelToken,
) -> GarnerResult<Vec<(Coordinate, Utf8PathBuf)>> {
    let mut slots: Vec<Option<(Coordinate, Utf8PathBuf)>> =
        (0..resolved.len()).map(|_| None).collect();
    let mut tasks = JoinSet::new();

    for (slot, (_, node)) in resolved.iter().enumerate() {
        // Cache hit: return the existing path without touching the network
        if let Some(path) = store.get(&node.coordinate)? {
            slots[slot] = Some((node.coordinate.clone(), path));
            continue;
        }

        cancel.check()?;
        let registry = registry.clone();
        let store = store.clone();
        let coordinate = node.coordinate.clone();
        let checksum = node.checksum.clone();
        tasks.spawn(async move {
            let bytes = registry.fetch_artifact(&coordinate).await?;
            let path = store.put(&coordinate, &bytes, checksum.as_deref())?;
            debug!(coordinate = %coordinate, path = %path, "materialized");
            Ok::<_, GarnerError>((slot, coordinate, path))
        });
    }

    while let Some(joined) = tasks.join_next().await {
        let (slot, coordinate, path) = joined.map_err(|e| GarnerError::Transport {
            message: format!("artifact fetch task failed: {}", e),
            source: None,
        })??;
        slots[slot] = Some((coordinate, path));
    }

    Ok(slots.into_iter().flatten().collect())
}

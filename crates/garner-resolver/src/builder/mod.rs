//! Breadth-first dependency graph expansion.
//!
//! The builder drives resolution: starting from the root dependency edges
//! at depth 0 it fetches descriptors through the single-flight cache,
//! applies exclusion, scope and optional-dependency policy, and records
//! every distinct pinned coordinate once. Sibling edges of one BFS level
//! fetch concurrently; integration into the graph is sequential so depth
//! and discovery order stay deterministic.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use petgraph::graph::NodeIndex;
use tokio::task::JoinSet;
use tracing::{debug, warn};

use garner_core::error::{GarnerError, GarnerResult};
use garner_core::types::{Coordinate, Dependency, Exclusion, Scope};
use garner_registry::Descriptor;

use crate::cache::DescriptorCache;
use crate::graph::{EdgeInfo, GraphNode, RawGraph};
use crate::select::{pick_version, Mediation};

/// Policy knobs governing one resolution run
#[derive(Debug, Clone, Default)]
pub struct ResolutionPolicy {
    /// Include optional dependencies declared below the root artifacts
    pub include_optional: bool,
    /// Conflict mediation rule
    pub mediation: Mediation,
    /// Keep descriptor cache entries alive across resolution runs
    pub retain_descriptor_cache: bool,
}

/// Cooperative cancellation flag shared between a caller and a running
/// resolution. Cancelling stops new fetches; the run unwinds with
/// `GarnerError::Cancelled`.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    /// Create an un-cancelled token
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Check whether cancellation was requested
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    pub(crate) fn check(&self) -> GarnerResult<()> {
        if self.is_cancelled() {
            Err(GarnerError::Cancelled)
        } else {
            Ok(())
        }
    }
}

/// One frontier entry: a dependency edge awaiting realization
struct Frontier {
    dependency: Dependency,
    depth: usize,
    parent: Option<NodeIndex>,
    /// Effective scope this edge is reached with
    effective: Scope,
    /// Pinned coordinates along the path from the root to the parent
    path: Arc<Vec<Coordinate>>,
    /// Exclusion patterns accumulated from ancestor edges
    inherited: Arc<Vec<Exclusion>>,
}

/// Breadth-first graph builder over a descriptor cache
pub struct GraphBuilder {
    cache: Arc<DescriptorCache>,
    policy: ResolutionPolicy,
    cancel: CancelToken,
}

impl GraphBuilder {
    /// Create a builder with the given policy
    pub fn new(cache: Arc<DescriptorCache>, policy: ResolutionPolicy) -> Self {
        Self {
            cache,
            policy,
            cancel: CancelToken::new(),
        }
    }

    /// Attach a cancellation token
    pub fn with_cancel_token(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Expand the root dependency edges into a raw graph. Multiple
    /// candidate versions per identity key are permitted; conflict
    /// resolution runs afterwards.
    pub async fn expand(&self, roots: Vec<Dependency>) -> GarnerResult<RawGraph> {
        let mut graph = RawGraph::new();
        let mut next_order = 0usize;

        let empty_path: Arc<Vec<Coordinate>> = Arc::new(Vec::new());
        let no_exclusions: Arc<Vec<Exclusion>> = Arc::new(Vec::new());
        let mut frontier: Vec<Frontier> = roots
            .into_iter()
            .map(|dependency| Frontier {
                effective: dependency.scope,
                dependency,
                depth: 0,
                parent: None,
                path: empty_path.clone(),
                inherited: no_exclusions.clone(),
            })
            .collect();

        while !frontier.is_empty() {
            let outcomes = self.fetch_level(&frontier).await?;

            let mut next = Vec::new();
            for (item, outcome) in frontier.into_iter().zip(outcomes) {
                let Some(outcome) = outcome else { continue };
                self.integrate(&mut graph, &mut next, &mut next_order, item, outcome)?;
            }
            frontier = next;
        }

        debug!(
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            "expansion complete"
        );
        Ok(graph)
    }

    /// Fetch descriptors for a whole BFS level concurrently. Results come
    /// back indexed so integration order matches declaration order.
    async fn fetch_level(
        &self,
        frontier: &[Frontier],
    ) -> GarnerResult<Vec<Option<GarnerResult<(Coordinate, Arc<Descriptor>)>>>> {
        let mut tasks = JoinSet::new();
        for (index, item) in frontier.iter().enumerate() {
            self.cancel.check()?;
            let cache = self.cache.clone();
            let dependency = item.dependency.clone();
            tasks.spawn(async move { (index, fetch_one(cache, dependency).await) });
        }

        let mut outcomes: Vec<Option<GarnerResult<(Coordinate, Arc<Descriptor>)>>> =
            (0..frontier.len()).map(|_| None).collect();
        while let Some(joined) = tasks.join_next().await {
            let (index, outcome) = joined.map_err(|e| GarnerError::Transport {
                message: format!("descriptor fetch task failed: {}", e),
                source: None,
            })?;
            outcomes[index] = Some(outcome);
        }
        Ok(outcomes)
    }

    /// Integrate one fetched frontier entry into the graph and queue its
    /// children.
    fn integrate(
        &self,
        graph: &mut RawGraph,
        next: &mut Vec<Frontier>,
        next_order: &mut usize,
        item: Frontier,
        outcome: GarnerResult<(Coordinate, Arc<Descriptor>)>,
    ) -> GarnerResult<()> {
        let (pinned, descriptor) = match outcome {
            Ok(ready) => ready,
            Err(error) => {
                if item.dependency.optional {
                    warn!(
                        coordinate = %item.dependency.coordinate,
                        error = %error,
                        "pruning optional dependency"
                    );
                    return Ok(());
                }
                return Err(error);
            }
        };

        // Cycle guard: an ancestor reappearing on its own path is an error,
        // never a silent drop
        if let Some(start) = item.path.iter().position(|c| c == &pinned) {
            let mut cycle: Vec<String> =
                item.path[start..].iter().map(|c| c.to_string()).collect();
            cycle.push(pinned.to_string());
            return Err(GarnerError::Cycle {
                path: cycle.join(" -> "),
            });
        }

        let info = EdgeInfo {
            scope: item.effective,
            optional: item.dependency.optional,
            requested: item.dependency.coordinate.version.clone(),
        };

        // Re-encounter of an exact coordinate: record the edge, skip
        // re-expansion
        if let Some(existing) = graph.lookup(&pinned) {
            match item.parent {
                Some(parent) => graph.add_edge(parent, existing, info),
                None => graph.add_root(existing),
            }
            return Ok(());
        }

        let declared = match descriptor.declared_dependencies() {
            Ok(declared) => declared,
            Err(error) => {
                if item.dependency.optional {
                    warn!(
                        coordinate = %pinned,
                        error = %error,
                        "pruning optional dependency with malformed descriptor"
                    );
                    return Ok(());
                }
                return Err(error);
            }
        };

        let node_index = graph.add_node(GraphNode {
            coordinate: pinned.clone(),
            depth: item.depth,
            order: *next_order,
            parent: item.parent,
            scope: item.effective,
            checksum: descriptor.checksum.clone(),
        });
        *next_order += 1;
        match item.parent {
            Some(parent) => graph.add_edge(parent, node_index, info),
            None => graph.add_root(node_index),
        }

        // Exclusions active below this node: inherited plus this edge's own
        let mut active = (*item.inherited).clone();
        active.extend(item.dependency.exclusions.iter().cloned());
        let active = Arc::new(active);

        let mut child_path = (*item.path).clone();
        child_path.push(pinned);
        let child_path = Arc::new(child_path);

        for declared_dependency in declared {
            let key = declared_dependency.coordinate.key();
            if active.iter().any(|exclusion| exclusion.excludes(&key)) {
                debug!(coordinate = %declared_dependency.coordinate, "excluded by ancestor");
                continue;
            }

            // Optional edges declared below the roots are skipped unless
            // the policy opts in
            if declared_dependency.optional && item.depth > 0 && !self.policy.include_optional {
                debug!(coordinate = %declared_dependency.coordinate, "skipping optional");
                continue;
            }

            let effective = match item.effective.transitive(declared_dependency.scope) {
                Some(scope) => scope,
                // Direct dependencies of a root keep their declared scope
                None if item.depth == 0 => declared_dependency.scope,
                None => {
                    debug!(
                        coordinate = %declared_dependency.coordinate,
                        scope = %declared_dependency.scope,
                        "scope not propagated"
                    );
                    continue;
                }
            };

            next.push(Frontier {
                dependency: declared_dependency,
                depth: item.depth + 1,
                parent: Some(node_index),
                effective,
                path: child_path.clone(),
                inherited: active.clone(),
            });
        }

        Ok(())
    }
}

/// Pin a frontier dependency (resolving a range against the offered
/// versions) and fetch its descriptor through the cache.
async fn fetch_one(
    cache: Arc<DescriptorCache>,
    dependency: Dependency,
) -> GarnerResult<(Coordinate, Arc<Descriptor>)> {
    let pinned = match dependency.coordinate.pinned_version() {
        Some(_) => dependency.coordinate.clone(),
        None => {
            let offered = cache
                .registry()
                .versions(&dependency.coordinate.group, &dependency.coordinate.name)
                .await?;
            let version = pick_version(&dependency.coordinate.version, &offered).ok_or_else(
                || GarnerError::UnsatisfiedRange {
                    coordinate: dependency.coordinate.to_string(),
                    available: offered.iter().map(|v| v.to_string()).collect(),
                },
            )?;
            debug!(
                coordinate = %dependency.coordinate,
                pinned = %version,
                "pinned range"
            );
            dependency.coordinate.with_version(version)
        }
    };

    let descriptor = cache.get(&pinned).await?;
    Ok((pinned, descriptor))
}

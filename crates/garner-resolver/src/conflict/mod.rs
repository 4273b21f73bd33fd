//! Conflict resolution over a fully-expanded raw graph.
//!
//! Groups candidate nodes by identity key, applies the mediation policy per
//! group, prunes subtrees only reachable through losing versions (an edge
//! into a losing version redirects to that key's winner, so multi-path
//! subtrees stay alive), and orders the surviving keys topologically.
//! Resolution is all-or-nothing: a residual cycle among identity keys fails
//! the whole run.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap, HashSet, VecDeque};

use indexmap::IndexMap;
use petgraph::graph::NodeIndex;
use tracing::debug;

use garner_core::error::{GarnerError, GarnerResult};
use garner_core::types::{ArtifactKey, Coordinate, Scope};

use crate::graph::RawGraph;
use crate::select::{select, Candidate, Mediation};

/// Winning node for one identity key
#[derive(Debug, Clone)]
pub struct ResolvedNode {
    /// Pinned winning coordinate
    pub coordinate: Coordinate,
    /// First-discovery depth of the winner
    pub depth: usize,
    /// BFS discovery order of the winner
    pub order: usize,
    /// Effective scope the winner was first reached with
    pub scope: Scope,
    /// Published artifact checksum, when the descriptor carried one
    pub checksum: Option<String>,
}

/// Immutable result of conflict resolution: exactly one entry per surviving
/// identity key, iterated in stable topological order (parents before
/// children, ties by first-discovery order)
#[derive(Debug, Default)]
pub struct ResolvedGraph {
    entries: IndexMap<ArtifactKey, ResolvedNode>,
}

impl ResolvedGraph {
    /// Winning node for an identity key
    pub fn get(&self, key: &ArtifactKey) -> Option<&ResolvedNode> {
        self.entries.get(key)
    }

    /// Check whether a key survived resolution
    pub fn contains_key(&self, key: &ArtifactKey) -> bool {
        self.entries.contains_key(key)
    }

    /// Number of resolved artifacts
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if nothing was resolved
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in stable topological order
    pub fn iter(&self) -> impl Iterator<Item = (&ArtifactKey, &ResolvedNode)> {
        self.entries.iter()
    }
}

/// Applies the mediation policy and pruning to a raw graph
#[derive(Debug, Clone, Default)]
pub struct ConflictResolver {
    mediation: Mediation,
}

impl ConflictResolver {
    /// Create a resolver with the given mediation rule
    pub fn new(mediation: Mediation) -> Self {
        Self { mediation }
    }

    /// Reduce the raw graph to one winning version per identity key
    pub fn resolve(&self, raw: &RawGraph) -> GarnerResult<ResolvedGraph> {
        let winners = self.pick_winners(raw);
        let reachable = reachable_keys(raw, &winners);

        // Identity-key edges among survivors, following winners' edges only
        // and redirecting each target to its key's winner
        let mut key_edges: HashSet<(ArtifactKey, ArtifactKey)> = HashSet::new();
        for (key, &winner) in &winners {
            if !reachable.contains(key) {
                continue;
            }
            for (child, _) in raw.children(winner) {
                let child_key = raw.node(child).coordinate.key();
                if child_key != *key && reachable.contains(&child_key) {
                    key_edges.insert((key.clone(), child_key));
                }
            }
        }

        let order = toposort_keys(raw, &winners, &reachable, &key_edges)?;

        let mut entries = IndexMap::with_capacity(order.len());
        for key in order {
            let node = raw.node(winners[&key]);
            entries.insert(
                key,
                ResolvedNode {
                    coordinate: node.coordinate.clone(),
                    depth: node.depth,
                    order: node.order,
                    scope: node.scope,
                    checksum: node.checksum.clone(),
                },
            );
        }

        debug!(
            candidates = raw.node_count(),
            resolved = entries.len(),
            "conflict resolution complete"
        );
        Ok(ResolvedGraph { entries })
    }

    /// One winning node per identity key under the mediation policy
    fn pick_winners(&self, raw: &RawGraph) -> HashMap<ArtifactKey, NodeIndex> {
        let mut winners = HashMap::new();
        for (key, members) in raw.candidates() {
            let candidates: Vec<(NodeIndex, Candidate)> = members
                .iter()
                .filter_map(|&index| {
                    let node = raw.node(index);
                    node.coordinate.pinned_version().map(|version| {
                        (
                            index,
                            Candidate {
                                version: version.clone(),
                                depth: node.depth,
                                order: node.order,
                            },
                        )
                    })
                })
                .collect();
            let list: Vec<Candidate> =
                candidates.iter().map(|(_, candidate)| candidate.clone()).collect();
            if let Some(winner_at) = select(self.mediation, &list) {
                winners.insert(key, candidates[winner_at].0);
            }
        }
        winners
    }
}

/// Keys reachable from the roots through winning nodes, with edges into a
/// losing version redirected to that key's winner
fn reachable_keys(
    raw: &RawGraph,
    winners: &HashMap<ArtifactKey, NodeIndex>,
) -> HashSet<ArtifactKey> {
    let mut reachable = HashSet::new();
    let mut queue = VecDeque::new();

    for &root in raw.roots() {
        let key = raw.node(root).coordinate.key();
        if let Some(&winner) = winners.get(&key) {
            if reachable.insert(key) {
                queue.push_back(winner);
            }
        }
    }

    while let Some(node) = queue.pop_front() {
        for (child, _) in raw.children(node) {
            let key = raw.node(child).coordinate.key();
            if let Some(&winner) = winners.get(&key) {
                if reachable.insert(key) {
                    queue.push_back(winner);
                }
            }
        }
    }
    reachable
}

/// Kahn's algorithm over the surviving identity keys. Ready keys are
/// released smallest discovery order first, making the result order stable.
fn toposort_keys(
    raw: &RawGraph,
    winners: &HashMap<ArtifactKey, NodeIndex>,
    reachable: &HashSet<ArtifactKey>,
    key_edges: &HashSet<(ArtifactKey, ArtifactKey)>,
) -> GarnerResult<Vec<ArtifactKey>> {
    let mut in_degree: HashMap<&ArtifactKey, usize> =
        reachable.iter().map(|key| (key, 0)).collect();
    let mut adjacency: HashMap<&ArtifactKey, Vec<&ArtifactKey>> = HashMap::new();
    for (from, to) in key_edges {
        adjacency.entry(from).or_default().push(to);
        *in_degree.entry(to).or_default() += 1;
    }

    let discovery = |key: &ArtifactKey| raw.node(winners[key]).order;

    let mut ready: BinaryHeap<Reverse<(usize, ArtifactKey)>> = BinaryHeap::new();
    for (&key, &degree) in &in_degree {
        if degree == 0 {
            ready.push(Reverse((discovery(key), key.clone())));
        }
    }

    let mut sorted = Vec::with_capacity(reachable.len());
    while let Some(Reverse((_, key))) = ready.pop() {
        if let Some(children) = adjacency.get(&key) {
            for &child in children {
                let degree = in_degree.get_mut(child).map(|d| {
                    *d -= 1;
                    *d
                });
                if degree == Some(0) {
                    ready.push(Reverse((discovery(child), child.clone())));
                }
            }
        }
        sorted.push(key);
    }

    if sorted.len() != reachable.len() {
        let remaining: HashSet<&ArtifactKey> = reachable
            .iter()
            .filter(|key| !sorted.contains(*key))
            .collect();
        return Err(GarnerError::Cycle {
            path: format_key_cycle(&remaining, key_edges),
        });
    }
    Ok(sorted)
}

/// Render a residual identity-key cycle as `a -> b -> a`. Walks predecessor
/// links inside the stuck set, which always loops back.
fn format_key_cycle(
    remaining: &HashSet<&ArtifactKey>,
    key_edges: &HashSet<(ArtifactKey, ArtifactKey)>,
) -> String {
    let mut predecessors: HashMap<&ArtifactKey, Vec<&ArtifactKey>> = HashMap::new();
    for (from, to) in key_edges {
        if remaining.contains(from) && remaining.contains(to) {
            predecessors.entry(to).or_default().push(from);
        }
    }

    let Some(start) = remaining.iter().min().copied() else {
        return "<empty>".to_string();
    };

    let mut path: Vec<&ArtifactKey> = Vec::new();
    let mut current = start;
    loop {
        if let Some(position) = path.iter().position(|&key| key == current) {
            // path[position..] walked backward along edges; flip for display
            let mut names: Vec<String> =
                path[position..].iter().rev().map(|key| key.to_string()).collect();
            names.push(names[0].clone());
            return names.join(" -> ");
        }
        path.push(current);
        match predecessors
            .get(current)
            .and_then(|sources| sources.iter().min().copied())
        {
            Some(previous) => current = previous,
            None => {
                // Stuck set without an internal predecessor; render what we
                // walked
                let names: Vec<String> =
                    path.iter().rev().map(|key| key.to_string()).collect();
                return names.join(" -> ");
            }
        }
    }
}

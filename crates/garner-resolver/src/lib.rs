//! Dependency resolution engine for Garner.
//!
//! This crate computes a consistent, deduplicated, acyclic dependency graph
//! from a root set of requested coordinates and a prioritized repository
//! list: breadth-first expansion with exclusion/scope/optional policy, a
//! single-flight descriptor cache, deterministic conflict mediation, and
//! materialization through the local artifact store.

pub mod builder;
pub mod cache;
pub mod conflict;
pub mod engine;
pub mod graph;
pub mod materialize;
pub mod select;

#[cfg(test)]
mod testutil;

// Re-export main types
pub use builder::{CancelToken, GraphBuilder, ResolutionPolicy};
pub use cache::DescriptorCache;
pub use conflict::{ConflictResolver, ResolvedGraph, ResolvedNode};
pub use engine::Resolver;
pub use graph::{EdgeInfo, GraphNode, RawGraph};
pub use materialize::materialize;
pub use select::Mediation;

use garner_core::error::GarnerError;

/// Result type for resolver operations
pub type ResolverResult<T> = Result<T, GarnerError>;

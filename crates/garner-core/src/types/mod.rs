//! Core data types for Garner artifact resolution.
//!
//! This module provides the fundamental types used throughout the Garner
//! workspace:
//! - Coordinate and ArtifactKey identity types
//! - Version, VersionRange and VersionSpec with numeric-segment ordering
//! - Scope and the transitive scope-combination table
//! - Dependency and Exclusion declaration types

pub mod coordinate;
pub mod dependency;
pub mod scope;
pub mod version;

// Re-export all public types
pub use coordinate::{ArtifactKey, Coordinate, DEFAULT_PACKAGING};
pub use dependency::{Dependency, Exclusion};
pub use scope::Scope;
pub use version::{Version, VersionError, VersionRange, VersionSpec};

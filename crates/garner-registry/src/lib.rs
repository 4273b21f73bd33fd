//! Artifact repository client for the Garner resolver.
//!
//! This crate provides the repository configuration entity, layout
//! conventions, byte transports (HTTP and filesystem) with bounded retry,
//! descriptor parsing, and the ordered repository registry the resolution
//! engine consults.

pub mod descriptor;
pub mod layout;
pub mod registry;
pub mod repository;
pub mod transport;

// Re-export main types
pub use descriptor::{DependencyDecl, Descriptor, ExclusionDecl, VersionIndex};
pub use layout::LayoutKind;
pub use registry::RepositoryRegistry;
pub use repository::{Repository, RepositoryBuilder};
pub use transport::{RetryConfig, Transport};

use garner_core::error::GarnerError;

/// Result type for registry operations
pub type RegistryResult<T> = Result<T, GarnerError>;

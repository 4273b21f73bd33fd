//! Local artifact cache for the Garner resolver.
//!
//! Provides the durable, write-once artifact store that materialization
//! writes through. Entries are keyed by coordinate identity + version and
//! verified against published checksums.

pub mod store;

// Re-export main types
pub use store::ArtifactStore;

use garner_core::error::GarnerError;

/// Result type for cache operations
pub type CacheResult<T> = Result<T, GarnerError>;

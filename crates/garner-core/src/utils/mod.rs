//! Utility functions shared across Garner crates.

pub mod checksum;

pub use checksum::{blake3_digest, sha1_digest, verify_checksum};

//! Local artifact store.
//!
//! Durable on-disk cache of materialized artifact bytes, keyed by
//! coordinate identity + version. Writes are write-once: bytes land in a
//! unique temp file and are committed with a no-clobber rename, so
//! concurrent writers for the same key converge on the first writer's file
//! and a cancelled run never leaves a partially-written entry visible.

use std::fs;
use std::io::Write;

use camino::{Utf8Path, Utf8PathBuf};

use garner_core::error::{GarnerError, GarnerResult};
use garner_core::types::Coordinate;
use garner_core::utils::checksum::verify_checksum;

/// Coordinate-keyed artifact cache on durable storage
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    root: Utf8PathBuf,
}

impl ArtifactStore {
    /// Open (and create if needed) a store rooted at `root`
    pub fn new<P: AsRef<Utf8Path>>(root: P) -> GarnerResult<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root)
            .map_err(|e| GarnerError::io(format!("Failed to create store at {}", root), e))?;
        Ok(Self { root })
    }

    /// The store's root directory
    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    /// Absolute path an artifact is (or would be) cached at
    pub fn path_for(&self, coordinate: &Coordinate) -> GarnerResult<Utf8PathBuf> {
        let version = coordinate.require_pinned()?;
        let mut file = format!("{}-{}", coordinate.name, version);
        if let Some(ref classifier) = coordinate.classifier {
            file.push('-');
            file.push_str(classifier);
        }
        file.push('.');
        file.push_str(&coordinate.packaging);

        let mut path = self.root.clone();
        for part in coordinate.group.split('.') {
            path.push(part);
        }
        path.push(&coordinate.name);
        path.push(version.to_string());
        path.push(file);
        Ok(path)
    }

    /// Check if an artifact is already cached
    pub fn contains(&self, coordinate: &Coordinate) -> bool {
        self.path_for(coordinate)
            .map(|path| path.exists())
            .unwrap_or(false)
    }

    /// Path of a cached artifact, or None when absent
    pub fn get(&self, coordinate: &Coordinate) -> GarnerResult<Option<Utf8PathBuf>> {
        let path = self.path_for(coordinate)?;
        Ok(path.exists().then_some(path))
    }

    /// Path of a cached artifact after re-verifying its bytes against a
    /// prefixed checksum
    pub fn get_verified(
        &self,
        coordinate: &Coordinate,
        checksum: &str,
    ) -> GarnerResult<Option<Utf8PathBuf>> {
        let Some(path) = self.get(coordinate)? else {
            return Ok(None);
        };
        let bytes = fs::read(&path)
            .map_err(|e| GarnerError::io(format!("Failed to read {}", path), e))?;
        verify_checksum(&coordinate.to_string(), &bytes, checksum)?;
        Ok(Some(path))
    }

    /// Store artifact bytes, verifying the checksum when one is known.
    /// Write-once: if the entry already exists the bytes are discarded and
    /// the existing path returned.
    pub fn put(
        &self,
        coordinate: &Coordinate,
        bytes: &[u8],
        checksum: Option<&str>,
    ) -> GarnerResult<Utf8PathBuf> {
        let path = self.path_for(coordinate)?;
        if path.exists() {
            return Ok(path);
        }

        if let Some(expected) = checksum {
            verify_checksum(&coordinate.to_string(), bytes, expected)?;
        }

        let parent = path
            .parent()
            .ok_or_else(|| GarnerError::ConfigValidation {
                field: "store.root".to_string(),
                reason: format!("cache path {} has no parent", path),
            })?;
        fs::create_dir_all(parent)
            .map_err(|e| GarnerError::io(format!("Failed to create {}", parent), e))?;

        let mut temp = tempfile::NamedTempFile::new_in(parent)
            .map_err(|e| GarnerError::io(format!("Failed to create temp file in {}", parent), e))?;
        temp.write_all(bytes)
            .map_err(|e| GarnerError::io(format!("Failed to write {}", path), e))?;

        match temp.persist_noclobber(path.as_std_path()) {
            Ok(_) => Ok(path),
            // Another writer committed first; their bytes win
            Err(e) if e.error.kind() == std::io::ErrorKind::AlreadyExists => Ok(path),
            Err(e) => Err(GarnerError::io(format!("Failed to commit {}", path), e.error)),
        }
    }

    /// Remove every cached artifact
    pub fn clear(&self) -> GarnerResult<()> {
        fs::remove_dir_all(&self.root)
            .map_err(|e| GarnerError::io(format!("Failed to clear {}", self.root), e))?;
        fs::create_dir_all(&self.root)
            .map_err(|e| GarnerError::io(format!("Failed to recreate {}", self.root), e))?;
        Ok(())
    }
}

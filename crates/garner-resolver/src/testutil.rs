//! File-backed repository fixtures for resolver tests.

use std::collections::HashMap;
use std::fs;
use std::sync::Arc;

use serde_json::{json, Value};

use garner_registry::{LayoutKind, Repository, RepositoryRegistry};

/// A scratch repository on disk, laid out like a hierarchical remote.
/// Published descriptors also get a synthetic artifact file and an updated
/// version index.
pub struct FixtureRepo {
    dir: tempfile::TempDir,
    versions: HashMap<(String, String), Vec<String>>,
}

impl FixtureRepo {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().unwrap(),
            versions: HashMap::new(),
        }
    }

    pub fn url(&self) -> String {
        format!("file://{}", self.dir.path().display())
    }

    pub fn repository(&self, id: &str) -> Repository {
        Repository::builder()
            .id(id)
            .url(self.url())
            .layout(LayoutKind::Maven2)
            .build()
            .unwrap()
    }

    pub fn registry(&self, id: &str) -> Arc<RepositoryRegistry> {
        let mut registry = RepositoryRegistry::new();
        registry.register(self.repository(id)).unwrap();
        Arc::new(registry)
    }

    /// Publish a descriptor document plus a synthetic artifact with
    /// deterministic bytes, and refresh the version index.
    pub fn publish(&mut self, descriptor: Value) {
        let group = descriptor["group"].as_str().unwrap().to_string();
        let name = descriptor["name"].as_str().unwrap().to_string();
        let version = descriptor["version"].as_str().unwrap().to_string();
        let packaging = descriptor["packaging"].as_str().unwrap_or("jar").to_string();

        let base = self
            .dir
            .path()
            .join(group.replace('.', "/"))
            .join(&name)
            .join(&version);
        fs::create_dir_all(&base).unwrap();
        fs::write(
            base.join(format!("{}-{}.json", name, version)),
            serde_json::to_vec_pretty(&descriptor).unwrap(),
        )
        .unwrap();
        fs::write(
            base.join(format!("{}-{}.{}", name, version, packaging)),
            Self::artifact_bytes(&name, &version),
        )
        .unwrap();

        let entry = self.versions.entry((group.clone(), name.clone())).or_default();
        if !entry.contains(&version) {
            entry.push(version);
        }
        let index_dir = self
            .dir
            .path()
            .join(group.replace('.', "/"))
            .join(&name);
        let index = json!({
            "group": group,
            "name": name,
            "versions": self.versions[&(group.clone(), name.clone())],
        });
        fs::write(
            index_dir.join("versions.json"),
            serde_json::to_vec_pretty(&index).unwrap(),
        )
        .unwrap();
    }

    /// The synthetic artifact bytes `publish` writes
    pub fn artifact_bytes(name: &str, version: &str) -> Vec<u8> {
        format!("{}-{}-bytes", name, version).into_bytes()
    }

    /// Delete every published file, keeping the (empty) repository root
    pub fn remove_all(&mut self) {
        for entry in fs::read_dir(self.dir.path()).unwrap() {
            let path = entry.unwrap().path();
            if path.is_dir() {
                fs::remove_dir_all(path).unwrap();
            } else {
                fs::remove_file(path).unwrap();
            }
        }
        self.versions.clear();
    }
}

/// Shorthand for a dependency declaration inside a fixture descriptor
pub fn dep(group: &str, name: &str, version: &str) -> Value {
    json!({"group": group, "name": name, "version": version})
}

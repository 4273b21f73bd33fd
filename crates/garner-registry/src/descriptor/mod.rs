//! Dependency descriptor and version index documents.
//!
//! A descriptor is the JSON manifest a repository serves for one artifact
//! version, declaring the artifact's own dependencies and an optional
//! content checksum. A version index lists the versions a repository offers
//! for one (group, name).

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use garner_core::error::{GarnerError, GarnerResult};
use garner_core::types::{Coordinate, Dependency, Exclusion, Scope, Version, VersionSpec};

fn default_packaging() -> String {
    garner_core::types::DEFAULT_PACKAGING.to_string()
}

fn wildcard() -> String {
    "*".to_string()
}

/// Parsed dependency descriptor for one artifact version
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Descriptor {
    /// Group identifier
    pub group: String,
    /// Artifact name
    pub name: String,
    /// Concrete version this descriptor describes
    pub version: String,
    /// Packaging of the artifact bytes
    #[serde(default = "default_packaging")]
    pub packaging: String,
    /// Prefixed content checksum of the artifact bytes, when published
    #[serde(default)]
    pub checksum: Option<String>,
    /// Declared dependencies
    #[serde(default)]
    pub dependencies: Vec<DependencyDecl>,
}

/// One declared dependency inside a descriptor
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DependencyDecl {
    pub group: String,
    pub name: String,
    /// Exact version or range expression
    pub version: String,
    #[serde(default)]
    pub scope: Option<String>,
    #[serde(default)]
    pub optional: bool,
    #[serde(default)]
    pub classifier: Option<String>,
    #[serde(default)]
    pub packaging: Option<String>,
    #[serde(default)]
    pub exclusions: Vec<ExclusionDecl>,
}

/// Exclusion pattern inside a dependency declaration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ExclusionDecl {
    pub group: String,
    #[serde(default = "wildcard")]
    pub name: String,
}

/// Version index document for one (group, name)
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct VersionIndex {
    pub group: String,
    pub name: String,
    #[serde(default)]
    pub versions: Vec<String>,
}

impl Descriptor {
    /// Parse descriptor bytes fetched for `coordinate`
    pub fn parse(coordinate: &Coordinate, bytes: &[u8]) -> GarnerResult<Self> {
        serde_json::from_slice(bytes).map_err(|e| GarnerError::DescriptorParse {
            coordinate: coordinate.to_string(),
            message: e.to_string(),
        })
    }

    /// The coordinate this descriptor describes
    pub fn coordinate(&self) -> GarnerResult<Coordinate> {
        let version = Version::from_str(&self.version).map_err(GarnerError::from)?;
        Ok(Coordinate::new(
            self.group.clone(),
            self.name.clone(),
            VersionSpec::Exact(version),
        )
        .with_packaging(self.packaging.clone()))
    }

    /// Convert the declared dependencies into resolution-ready values.
    /// A malformed declaration makes the whole descriptor malformed.
    pub fn declared_dependencies(&self) -> GarnerResult<Vec<Dependency>> {
        let own = format!("{}:{}:{}", self.group, self.name, self.version);
        let malformed = |message: String| GarnerError::DescriptorParse {
            coordinate: own.clone(),
            message,
        };

        let mut dependencies = Vec::with_capacity(self.dependencies.len());
        for decl in &self.dependencies {
            let version = VersionSpec::from_str(&decl.version)
                .map_err(|e| malformed(format!("dependency {}:{}: {}", decl.group, decl.name, e)))?;

            let scope = match decl.scope.as_deref() {
                Some(s) => Scope::from_str(s)
                    .map_err(|_| malformed(format!("dependency {}:{}: unknown scope '{}'", decl.group, decl.name, s)))?,
                None => Scope::Compile,
            };

            let mut coordinate = Coordinate::new(decl.group.clone(), decl.name.clone(), version);
            if let Some(ref classifier) = decl.classifier {
                coordinate = coordinate.with_classifier(classifier.clone());
            }
            if let Some(ref packaging) = decl.packaging {
                coordinate = coordinate.with_packaging(packaging.clone());
            }

            let exclusions = decl
                .exclusions
                .iter()
                .map(|e| Exclusion::new(e.group.clone(), e.name.clone()))
                .collect();

            dependencies.push(Dependency {
                coordinate,
                scope,
                optional: decl.optional,
                exclusions,
            });
        }
        Ok(dependencies)
    }
}

impl VersionIndex {
    /// Parse a version index document
    pub fn parse(group: &str, name: &str, bytes: &[u8]) -> GarnerResult<Self> {
        serde_json::from_slice(bytes).map_err(|e| GarnerError::DescriptorParse {
            coordinate: format!("{}:{}", group, name),
            message: format!("version index: {}", e),
        })
    }

    /// Offered versions, ignoring entries that fail to parse
    pub fn offered(&self) -> Vec<Version> {
        self.versions
            .iter()
            .filter_map(|v| Version::from_str(v).ok())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "group": "org.example",
        "name": "widget",
        "version": "1.2.0",
        "checksum": "blake3:abc123",
        "dependencies": [
            {"group": "org.example", "name": "gadget", "version": "[1.0,2.0)"},
            {"group": "org.util", "name": "strings", "version": "3.1",
             "scope": "runtime", "optional": true,
             "exclusions": [{"group": "org.legacy"}]}
        ]
    }"#;

    fn coordinate() -> Coordinate {
        Coordinate::from_str("org.example:widget:1.2.0").unwrap()
    }

    #[test]
    fn test_parse_descriptor() {
        let descriptor = Descriptor::parse(&coordinate(), SAMPLE.as_bytes()).unwrap();
        assert_eq!(descriptor.name, "widget");
        assert_eq!(descriptor.packaging, "jar");
        assert_eq!(descriptor.checksum.as_deref(), Some("blake3:abc123"));
        assert_eq!(descriptor.dependencies.len(), 2);
    }

    #[test]
    fn test_parse_rejects_malformed_json() {
        let err = Descriptor::parse(&coordinate(), b"{ not json").unwrap_err();
        assert!(matches!(err, GarnerError::DescriptorParse { .. }));
        assert!(err.to_string().contains("org.example:widget"));
    }

    #[test]
    fn test_declared_dependencies() {
        let descriptor = Descriptor::parse(&coordinate(), SAMPLE.as_bytes()).unwrap();
        let dependencies = descriptor.declared_dependencies().unwrap();

        assert_eq!(dependencies[0].coordinate.name, "gadget");
        assert!(dependencies[0].coordinate.version.is_range());
        assert_eq!(dependencies[0].scope, Scope::Compile);
        assert!(!dependencies[0].optional);

        assert_eq!(dependencies[1].scope, Scope::Runtime);
        assert!(dependencies[1].optional);
        // Omitted exclusion name defaults to the wildcard
        assert_eq!(dependencies[1].exclusions[0].name, "*");
    }

    #[test]
    fn test_bad_dependency_version_is_malformed_descriptor() {
        let raw = r#"{"group": "g", "name": "n", "version": "1.0",
            "dependencies": [{"group": "a", "name": "b", "version": "oops"}]}"#;
        let descriptor = Descriptor::parse(&coordinate(), raw.as_bytes()).unwrap();
        let err = descriptor.declared_dependencies().unwrap_err();
        assert!(matches!(err, GarnerError::DescriptorParse { .. }));
    }

    #[test]
    fn test_descriptor_coordinate() {
        let descriptor = Descriptor::parse(&coordinate(), SAMPLE.as_bytes()).unwrap();
        let own = descriptor.coordinate().unwrap();
        assert_eq!(own.to_string(), "org.example:widget:1.2.0");
    }

    #[test]
    fn test_version_index() {
        let raw = r#"{"group": "org.example", "name": "widget",
            "versions": ["1.0", "1.5", "2.0", "not-a-version"]}"#;
        let index = VersionIndex::parse("org.example", "widget", raw.as_bytes()).unwrap();
        let offered = index.offered();
        assert_eq!(offered.len(), 3);
        assert!(offered.contains(&Version::from_str("1.5").unwrap()));
    }
}

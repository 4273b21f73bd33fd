//! Artifact coordinate types.
//!
//! A Coordinate names one artifact: group, name, version spec, optional
//! classifier and packaging. The ArtifactKey drops the version so that
//! different versions of the "same" artifact collide for conflict detection.

use std::fmt;
use std::str::FromStr;

use crate::error::GarnerError;
use super::{Version, VersionSpec};

/// Default packaging when none is declared
pub const DEFAULT_PACKAGING: &str = "jar";

/// Immutable artifact coordinate
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Coordinate {
    pub group: String,
    pub name: String,
    pub version: VersionSpec,
    pub classifier: Option<String>,
    pub packaging: String,
}

/// Version-independent identity: (group, name, classifier, packaging).
/// Used to group candidate versions during conflict resolution.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ArtifactKey {
    pub group: String,
    pub name: String,
    pub classifier: Option<String>,
    pub packaging: String,
}

impl Coordinate {
    /// Create a coordinate with default packaging and no classifier
    pub fn new(group: impl Into<String>, name: impl Into<String>, version: VersionSpec) -> Self {
        Self {
            group: group.into(),
            name: name.into(),
            version,
            classifier: None,
            packaging: DEFAULT_PACKAGING.to_string(),
        }
    }

    /// Set the classifier
    pub fn with_classifier(mut self, classifier: impl Into<String>) -> Self {
        self.classifier = Some(classifier.into());
        self
    }

    /// Set the packaging
    pub fn with_packaging(mut self, packaging: impl Into<String>) -> Self {
        self.packaging = packaging.into();
        self
    }

    /// Pin this coordinate to a concrete version
    pub fn with_version(&self, version: Version) -> Self {
        Self {
            version: VersionSpec::Exact(version),
            ..self.clone()
        }
    }

    /// The version-independent identity key
    pub fn key(&self) -> ArtifactKey {
        ArtifactKey {
            group: self.group.clone(),
            name: self.name.clone(),
            classifier: self.classifier.clone(),
            packaging: self.packaging.clone(),
        }
    }

    /// The concrete version, if this coordinate is pinned
    pub fn pinned_version(&self) -> Option<&Version> {
        self.version.pinned()
    }

    /// The concrete version, or an error for range coordinates.
    /// Fetch and cache paths require a pinned coordinate.
    pub fn require_pinned(&self) -> Result<&Version, GarnerError> {
        self.pinned_version()
            .ok_or_else(|| GarnerError::UnpinnedVersion {
                coordinate: self.to_string(),
            })
    }
}

impl FromStr for Coordinate {
    type Err = GarnerError;

    /// Parse `group:name:version`, `group:name:packaging:version` or
    /// `group:name:packaging:classifier:version`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.trim().split(':').collect();
        let invalid = |reason: &str| GarnerError::CoordinateParse {
            input: s.to_string(),
            reason: reason.to_string(),
        };

        if parts.iter().any(|part| part.is_empty()) {
            return Err(invalid("empty segment"));
        }

        let (group, name, packaging, classifier, version_str) = match parts.as_slice() {
            [group, name, version] => (*group, *name, DEFAULT_PACKAGING, None, *version),
            [group, name, packaging, version] => (*group, *name, *packaging, None, *version),
            [group, name, packaging, classifier, version] => {
                (*group, *name, *packaging, Some(*classifier), *version)
            }
            _ => return Err(invalid("expected 3 to 5 colon-separated segments")),
        };

        let version = VersionSpec::from_str(version_str)?;

        Ok(Coordinate {
            group: group.to_string(),
            name: name.to_string(),
            version,
            classifier: classifier.map(str::to_string),
            packaging: packaging.to_string(),
        })
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.group, self.name)?;
        if self.packaging != DEFAULT_PACKAGING || self.classifier.is_some() {
            write!(f, ":{}", self.packaging)?;
        }
        if let Some(ref classifier) = self.classifier {
            write!(f, ":{}", classifier)?;
        }
        write!(f, ":{}", self.version)
    }
}

impl fmt::Display for ArtifactKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.group, self.name)?;
        if self.packaging != DEFAULT_PACKAGING {
            write!(f, ":{}", self.packaging)?;
        }
        if let Some(ref classifier) = self.classifier {
            write!(f, ":{}", classifier)?;
        }
        Ok(())
    }
}

//! Dependency declaration types.
//!
//! A Dependency is the declared form of a graph edge: the requested
//! coordinate plus scope, optionality and exclusion patterns. Root requests
//! and descriptor entries both use this shape.

use super::{ArtifactKey, Coordinate, Scope};

/// Exclusion pattern: a (group, name) pair where either part may be `*`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Exclusion {
    pub group: String,
    pub name: String,
}

/// Declared dependency edge
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dependency {
    pub coordinate: Coordinate,
    pub scope: Scope,
    pub optional: bool,
    pub exclusions: Vec<Exclusion>,
}

impl Exclusion {
    /// Create an exclusion pattern
    pub fn new(group: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            group: group.into(),
            name: name.into(),
        }
    }

    /// Check if this pattern excludes the given identity
    pub fn excludes(&self, key: &ArtifactKey) -> bool {
        fn part_matches(pattern: &str, value: &str) -> bool {
            pattern == "*" || pattern == value
        }
        part_matches(&self.group, &key.group) && part_matches(&self.name, &key.name)
    }
}

impl Dependency {
    /// Create a compile-scope, non-optional dependency
    pub fn new(coordinate: Coordinate) -> Self {
        Self {
            coordinate,
            scope: Scope::Compile,
            optional: false,
            exclusions: Vec::new(),
        }
    }

    /// Set the scope
    pub fn with_scope(mut self, scope: Scope) -> Self {
        self.scope = scope;
        self
    }

    /// Mark this dependency optional
    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    /// Add an exclusion pattern
    pub fn exclude(mut self, group: impl Into<String>, name: impl Into<String>) -> Self {
        self.exclusions.push(Exclusion::new(group, name));
        self
    }

    /// The identity key of the requested coordinate
    pub fn key(&self) -> ArtifactKey {
        self.coordinate.key()
    }
}

//! Repository layout conventions.
//!
//! A layout maps a coordinate to the relative path of its artifact,
//! descriptor and version index within a repository. Layouts are a tagged
//! variant dispatched by kind, not a trait hierarchy.

use std::fmt;
use std::str::FromStr;

use garner_core::error::{GarnerError, GarnerResult};
use garner_core::types::Coordinate;

/// Layout convention tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LayoutKind {
    /// Hierarchical `group/as/path/name/version/` layout
    #[default]
    Maven2,
    /// All files directly under the repository root
    Flat,
}

impl LayoutKind {
    /// Relative path of the artifact bytes for a pinned coordinate
    pub fn artifact_path(&self, coordinate: &Coordinate) -> GarnerResult<String> {
        let version = coordinate.require_pinned()?;
        let mut file = format!("{}-{}", coordinate.name, version);
        if let Some(ref classifier) = coordinate.classifier {
            file.push('-');
            file.push_str(classifier);
        }
        file.push('.');
        file.push_str(&coordinate.packaging);
        Ok(self.join(coordinate, &version.to_string(), &file))
    }

    /// Relative path of the dependency descriptor for a pinned coordinate
    pub fn descriptor_path(&self, coordinate: &Coordinate) -> GarnerResult<String> {
        let version = coordinate.require_pinned()?;
        let file = format!("{}-{}.json", coordinate.name, version);
        Ok(self.join(coordinate, &version.to_string(), &file))
    }

    /// Relative path of the version index for an artifact name
    pub fn index_path(&self, group: &str, name: &str) -> String {
        match self {
            LayoutKind::Maven2 => {
                format!("{}/{}/versions.json", group.replace('.', "/"), name)
            }
            LayoutKind::Flat => format!("{}-versions.json", name),
        }
    }

    fn join(&self, coordinate: &Coordinate, version: &str, file: &str) -> String {
        match self {
            LayoutKind::Maven2 => format!(
                "{}/{}/{}/{}",
                coordinate.group.replace('.', "/"),
                coordinate.name,
                version,
                file
            ),
            LayoutKind::Flat => file.to_string(),
        }
    }
}

impl FromStr for LayoutKind {
    type Err = GarnerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "default" | "maven2" => Ok(LayoutKind::Maven2),
            "flat" => Ok(LayoutKind::Flat),
            other => Err(GarnerError::ConfigValidation {
                field: "repository.layout".to_string(),
                reason: format!("unknown layout '{}'", other),
            }),
        }
    }
}

impl fmt::Display for LayoutKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LayoutKind::Maven2 => write!(f, "maven2"),
            LayoutKind::Flat => write!(f, "flat"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coordinate(s: &str) -> Coordinate {
        Coordinate::from_str(s).unwrap()
    }

    #[test]
    fn test_maven2_artifact_path() {
        let path = LayoutKind::Maven2
            .artifact_path(&coordinate("org.example.util:widget:1.2.3"))
            .unwrap();
        assert_eq!(path, "org/example/util/widget/1.2.3/widget-1.2.3.jar");
    }

    #[test]
    fn test_maven2_classifier_and_packaging() {
        let path = LayoutKind::Maven2
            .artifact_path(&coordinate("org.example:widget:zip:sources:2.0"))
            .unwrap();
        assert_eq!(path, "org/example/widget/2.0/widget-2.0-sources.zip");
    }

    #[test]
    fn test_maven2_descriptor_and_index_paths() {
        let layout = LayoutKind::Maven2;
        assert_eq!(
            layout
                .descriptor_path(&coordinate("org.example:widget:1.0"))
                .unwrap(),
            "org/example/widget/1.0/widget-1.0.json"
        );
        assert_eq!(
            layout.index_path("org.example", "widget"),
            "org/example/widget/versions.json"
        );
    }

    #[test]
    fn test_flat_paths() {
        let layout = LayoutKind::Flat;
        assert_eq!(
            layout
                .artifact_path(&coordinate("org.example:widget:1.0"))
                .unwrap(),
            "widget-1.0.jar"
        );
        assert_eq!(layout.index_path("org.example", "widget"), "widget-versions.json");
    }

    #[test]
    fn test_range_coordinate_has_no_path() {
        let result = LayoutKind::Maven2.artifact_path(&coordinate("org.example:widget:[1.0,2.0)"));
        assert!(matches!(result, Err(GarnerError::UnpinnedVersion { .. })));
    }

    #[test]
    fn test_layout_parse_and_display() {
        assert_eq!(LayoutKind::from_str("maven2").unwrap(), LayoutKind::Maven2);
        assert_eq!(LayoutKind::from_str("default").unwrap(), LayoutKind::Maven2);
        assert_eq!(LayoutKind::from_str("flat").unwrap(), LayoutKind::Flat);
        assert!(LayoutKind::from_str("p2").is_err());
        assert_eq!(LayoutKind::Maven2.to_string(), "maven2");
    }
}

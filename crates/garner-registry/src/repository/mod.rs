//! Repository configuration entity.
//!
//! A Repository is the immutable value describing one named artifact source:
//! identifier, access URL and layout convention. Values are produced by the
//! fluent RepositoryBuilder and never mutated afterwards; the registry
//! compares them by id.

use std::fmt;

use garner_core::error::{GarnerError, GarnerResult};

use crate::layout::LayoutKind;

/// Named artifact source: id, access URL, layout convention
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Repository {
    id: String,
    url: String,
    layout: LayoutKind,
}

/// Fluent builder producing an immutable Repository
#[derive(Debug, Clone, Default)]
pub struct RepositoryBuilder {
    id: Option<String>,
    url: Option<String>,
    layout: LayoutKind,
}

impl Repository {
    /// Start building a repository
    pub fn builder() -> RepositoryBuilder {
        RepositoryBuilder::default()
    }

    /// The repository identifier
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The repository base URL
    pub fn url(&self) -> &str {
        &self.url
    }

    /// The layout convention
    pub fn layout(&self) -> LayoutKind {
        self.layout
    }
}

impl fmt::Display for Repository {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.id, self.url)
    }
}

impl RepositoryBuilder {
    /// Create an empty builder with the default layout
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the repository identifier
    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Set the repository base URL
    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Set the layout convention
    pub fn layout(mut self, layout: LayoutKind) -> Self {
        self.layout = layout;
        self
    }

    /// Validate and build the immutable Repository value
    pub fn build(self) -> GarnerResult<Repository> {
        let id = self.id.filter(|id| !id.is_empty()).ok_or_else(|| {
            GarnerError::ConfigValidation {
                field: "repository.id".to_string(),
                reason: "identifier must be non-empty".to_string(),
            }
        })?;

        let url = self.url.ok_or_else(|| GarnerError::ConfigValidation {
            field: "repository.url".to_string(),
            reason: "url is required".to_string(),
        })?;

        let parsed = url::Url::parse(&url).map_err(|e| GarnerError::ConfigValidation {
            field: "repository.url".to_string(),
            reason: format!("'{}' is not a valid URL: {}", url, e),
        })?;
        if !matches!(parsed.scheme(), "http" | "https" | "file") {
            return Err(GarnerError::ConfigValidation {
                field: "repository.url".to_string(),
                reason: format!("unsupported scheme '{}'", parsed.scheme()),
            });
        }

        // Normalize away a trailing slash so path joining stays uniform
        let url = url.trim_end_matches('/').to_string();

        Ok(Repository {
            id,
            url,
            layout: self.layout,
        })
    }
}

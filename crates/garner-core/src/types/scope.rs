//! Dependency scopes and transitive scope combination.

use std::fmt;
use std::str::FromStr;

use crate::error::GarnerError;

/// Declared usage context of a dependency edge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Scope {
    #[default]
    Compile,
    Runtime,
    Test,
    Provided,
    System,
}

impl Scope {
    /// Check if edges of this scope propagate past the node that declares
    /// them. Test, provided and system dependencies are visible to their
    /// declaring node only.
    pub fn is_transitive(self) -> bool {
        matches!(self, Scope::Compile | Scope::Runtime)
    }

    /// Combine the scope a node was reached with and a scope it declares,
    /// yielding the effective downstream scope. `None` drops the edge.
    ///
    /// Combination table:
    /// compile+compile -> compile, compile+runtime -> runtime,
    /// runtime+anything transitive -> runtime; test and provided roots keep
    /// their own scope downstream; system edges carry nothing transitively.
    pub fn transitive(self, declared: Scope) -> Option<Scope> {
        if !declared.is_transitive() {
            return None;
        }
        match self {
            Scope::Compile => Some(declared),
            Scope::Runtime => Some(Scope::Runtime),
            Scope::Test => Some(Scope::Test),
            Scope::Provided => Some(Scope::Provided),
            Scope::System => None,
        }
    }
}

impl FromStr for Scope {
    type Err = GarnerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "compile" => Ok(Scope::Compile),
            "runtime" => Ok(Scope::Runtime),
            "test" => Ok(Scope::Test),
            "provided" => Ok(Scope::Provided),
            "system" => Ok(Scope::System),
            other => Err(GarnerError::ConfigValidation {
                field: "scope".to_string(),
                reason: format!("unknown scope '{}'", other),
            }),
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Scope::Compile => "compile",
            Scope::Runtime => "runtime",
            Scope::Test => "test",
            Scope::Provided => "provided",
            Scope::System => "system",
        };
        write!(f, "{}", name)
    }
}

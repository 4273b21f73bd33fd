//! Artifact version types with numeric-segment ordering.
//!
//! Provides Version, VersionRange and VersionSpec types. Ordering is
//! numeric-segment-aware rather than lexical: `1.10` sorts above `1.9`,
//! missing trailing segments count as zero, and a qualified version
//! (`1.0-alpha`) sorts below its unqualified release (`1.0`).

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;
use thiserror::Error;

/// Artifact version: dotted numeric segments plus an optional qualifier
/// (`1.0`, `2.3.1`, `1.0-alpha`)
#[derive(Debug, Clone, Eq)]
pub struct Version {
    segments: Vec<u64>,
    qualifier: Option<String>,
}

/// Version range in interval notation: `[1.0,2.0)`, `(,1.5]`, `[1.2]`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VersionRange {
    lower: Option<Version>,
    lower_inclusive: bool,
    upper: Option<Version>,
    upper_inclusive: bool,
}

/// Either an exact version token or a range expression
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum VersionSpec {
    Exact(Version),
    Range(VersionRange),
}

/// Version parsing and validation errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VersionError {
    #[error("Invalid version format: {input}")]
    InvalidFormat { input: String },

    #[error("Invalid number '{segment}' in version '{input}'")]
    InvalidSegment { input: String, segment: String },

    #[error("Invalid range expression '{input}': {reason}")]
    InvalidRange { input: String, reason: String },
}

impl VersionError {
    /// The offending input text
    pub fn input(&self) -> &str {
        match self {
            VersionError::InvalidFormat { input } => input,
            VersionError::InvalidSegment { input, .. } => input,
            VersionError::InvalidRange { input, .. } => input,
        }
    }
}

impl Version {
    /// Create a version from explicit numeric segments
    pub fn new(segments: Vec<u64>) -> Self {
        Self {
            segments,
            qualifier: None,
        }
    }

    /// Create a version with a qualifier
    pub fn with_qualifier(segments: Vec<u64>, qualifier: impl Into<String>) -> Self {
        Self {
            segments,
            qualifier: Some(qualifier.into()),
        }
    }

    /// Numeric segments as parsed
    pub fn segments(&self) -> &[u64] {
        &self.segments
    }

    /// Pre-release qualifier, if any
    pub fn qualifier(&self) -> Option<&str> {
        self.qualifier.as_deref()
    }

    /// Check if this is a pre-release version
    pub fn is_prerelease(&self) -> bool {
        self.qualifier.is_some()
    }

    /// Segments with trailing zeros stripped, so that `1.0` and `1.0.0`
    /// compare and hash identically
    fn canonical_segments(&self) -> &[u64] {
        let mut len = self.segments.len();
        while len > 0 && self.segments[len - 1] == 0 {
            len -= 1;
        }
        &self.segments[..len]
    }
}

impl FromStr for Version {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let input = s.trim();
        if input.is_empty() {
            return Err(VersionError::InvalidFormat {
                input: s.to_string(),
            });
        }

        // Split on the first '-' for the qualifier
        let (core_part, qualifier) = match input.split_once('-') {
            Some((c, q)) if !q.is_empty() => (c, Some(q.to_string())),
            Some(_) => {
                return Err(VersionError::InvalidFormat {
                    input: input.to_string(),
                })
            }
            None => (input, None),
        };

        let mut segments = Vec::new();
        for part in core_part.split('.') {
            let value = part.parse().map_err(|_| VersionError::InvalidSegment {
                input: input.to_string(),
                segment: part.to_string(),
            })?;
            segments.push(value);
        }

        Ok(Version {
            segments,
            qualifier,
        })
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for segment in &self.segments {
            if !first {
                write!(f, ".")?;
            }
            write!(f, "{}", segment)?;
            first = false;
        }
        if let Some(ref qualifier) = self.qualifier {
            write!(f, "-{}", qualifier)?;
        }
        Ok(())
    }
}

impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        self.canonical_segments() == other.canonical_segments()
            && self.qualifier == other.qualifier
    }
}

impl Hash for Version {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.canonical_segments().hash(state);
        self.qualifier.hash(state);
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        let len = self.segments.len().max(other.segments.len());
        for i in 0..len {
            let a = self.segments.get(i).copied().unwrap_or(0);
            let b = other.segments.get(i).copied().unwrap_or(0);
            match a.cmp(&b) {
                Ordering::Equal => continue,
                other => return other,
            }
        }
        // Equal segments: a qualified version precedes its release
        match (&self.qualifier, &other.qualifier) {
            (None, None) => Ordering::Equal,
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (Some(a), Some(b)) => a.cmp(b),
        }
    }
}

impl VersionRange {
    /// Check if a version falls inside this range
    pub fn contains(&self, version: &Version) -> bool {
        if let Some(ref lower) = self.lower {
            match version.cmp(lower) {
                Ordering::Less => return false,
                Ordering::Equal if !self.lower_inclusive => return false,
                _ => {}
            }
        }
        if let Some(ref upper) = self.upper {
            match version.cmp(upper) {
                Ordering::Greater => return false,
                Ordering::Equal if !self.upper_inclusive => return false,
                _ => {}
            }
        }
        true
    }

    /// Lower bound, if bounded below
    pub fn lower(&self) -> Option<&Version> {
        self.lower.as_ref()
    }

    /// Upper bound, if bounded above
    pub fn upper(&self) -> Option<&Version> {
        self.upper.as_ref()
    }
}

impl FromStr for VersionRange {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let input = s.trim();
        let invalid = |reason: &str| VersionError::InvalidRange {
            input: input.to_string(),
            reason: reason.to_string(),
        };

        let mut chars = input.chars();
        let lower_inclusive = match chars.next() {
            Some('[') => true,
            Some('(') => false,
            _ => return Err(invalid("must start with '[' or '('")),
        };
        let upper_inclusive = match input.chars().last() {
            Some(']') => true,
            Some(')') => false,
            _ => return Err(invalid("must end with ']' or ')'")),
        };

        let inner = &input[1..input.len() - 1];
        let (lower_str, upper_str) = match inner.split_once(',') {
            Some((l, u)) => (l.trim(), u.trim()),
            // Single element: `[1.2]` pins exactly that version
            None => {
                if !(lower_inclusive && upper_inclusive) {
                    return Err(invalid("a single-version range must use '[v]'"));
                }
                (inner.trim(), inner.trim())
            }
        };

        let lower = if lower_str.is_empty() {
            None
        } else {
            Some(Version::from_str(lower_str)?)
        };
        let upper = if upper_str.is_empty() {
            None
        } else {
            Some(Version::from_str(upper_str)?)
        };

        if lower.is_none() && upper.is_none() {
            return Err(invalid("at least one bound is required"));
        }
        if let (Some(l), Some(u)) = (&lower, &upper) {
            if l > u {
                return Err(invalid("lower bound exceeds upper bound"));
            }
        }

        Ok(VersionRange {
            lower,
            lower_inclusive,
            upper,
            upper_inclusive,
        })
    }
}

impl fmt::Display for VersionRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", if self.lower_inclusive { '[' } else { '(' })?;
        if let Some(ref lower) = self.lower {
            write!(f, "{}", lower)?;
        }
        write!(f, ",")?;
        if let Some(ref upper) = self.upper {
            write!(f, "{}", upper)?;
        }
        write!(f, "{}", if self.upper_inclusive { ']' } else { ')' })
    }
}

impl VersionSpec {
    /// Check if a concrete version satisfies this spec
    pub fn matches(&self, version: &Version) -> bool {
        match self {
            VersionSpec::Exact(exact) => exact == version,
            VersionSpec::Range(range) => range.contains(version),
        }
    }

    /// The pinned version, if this spec is exact
    pub fn pinned(&self) -> Option<&Version> {
        match self {
            VersionSpec::Exact(version) => Some(version),
            VersionSpec::Range(_) => None,
        }
    }

    /// Check if this spec is a range expression
    pub fn is_range(&self) -> bool {
        matches!(self, VersionSpec::Range(_))
    }
}

impl FromStr for VersionSpec {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let input = s.trim();
        if input.starts_with('[') || input.starts_with('(') {
            Ok(VersionSpec::Range(VersionRange::from_str(input)?))
        } else {
            Ok(VersionSpec::Exact(Version::from_str(input)?))
        }
    }
}

impl fmt::Display for VersionSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VersionSpec::Exact(version) => write!(f, "{}", version),
            VersionSpec::Range(range) => write!(f, "{}", range),
        }
    }
}

impl From<Version> for VersionSpec {
    fn from(version: Version) -> Self {
        VersionSpec::Exact(version)
    }
}

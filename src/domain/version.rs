use crate::error::{ReleaseError, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// Dotted numeric version with an optional opaque suffix
///
/// Unlike SemVer, any number of components is allowed (`1`, `1.10`, `1.2.3.4`)
/// and the suffix is never interpreted: its presence only marks the version as
/// not releasable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Version {
    pub components: Vec<u64>,
    pub suffix: Option<String>,
}

impl Version {
    /// Create a version from raw parts
    pub fn new(components: Vec<u64>, suffix: Option<String>) -> Self {
        Version { components, suffix }
    }

    /// Parse a version string (e.g., "1.10.2" or "1-SNAPSHOT")
    ///
    /// Leading text such as a tag prefix is not stripped here.
    ///
    /// # Returns
    /// * `Some(Version)` - If the whole string is a version
    /// * `None` - Otherwise
    pub fn parse(text: &str) -> Option<Self> {
        let captures = Regex::new(r"^(\d+(?:\.\d+)*)(?:-(.+))?$")
            .ok()
            .and_then(|re| re.captures(text))?;

        let components = captures
            .get(1)?
            .as_str()
            .split('.')
            .map(|part| part.parse::<u64>().ok())
            .collect::<Option<Vec<_>>>()?;
        let suffix = captures.get(2).map(|m| m.as_str().to_string());

        Some(Version { components, suffix })
    }

    pub fn has_suffix(&self) -> bool {
        self.suffix.is_some()
    }

    /// Compare numeric components, treating missing trailing components as 0.
    ///
    /// The suffix takes no part in ordering: `1.0` and `1.0-rc1` compare equal.
    pub fn compare(&self, other: &Version) -> Ordering {
        let len = self.components.len().max(other.components.len());
        for index in 0..len {
            let left = self.components.get(index).copied().unwrap_or(0);
            let right = other.components.get(index).copied().unwrap_or(0);
            match left.cmp(&right) {
                Ordering::Equal => continue,
                unequal => return unequal,
            }
        }
        Ordering::Equal
    }

    /// Increment the component selected by `mode`
    ///
    /// Missing components up to the target are zero-filled. Components after
    /// the target are kept as they are, so a major increment of `1.5` is `2.5`.
    ///
    /// # Returns
    /// * `Err(InvalidVersion)` - If the version has a suffix or no components
    pub fn increment(&self, mode: VersionIncrementMode) -> Result<Version> {
        if self.has_suffix() {
            return Err(ReleaseError::version(format!(
                "Version has suffix: {}",
                self
            )));
        }
        if self.components.is_empty() {
            return Err(ReleaseError::version(format!(
                "Version doesn't have numbers: '{}'",
                self
            )));
        }

        let index = mode.component_index();
        let mut components = self.components.clone();
        while components.len() <= index {
            components.push(0);
        }
        components[index] = components[index].checked_add(1).ok_or_else(|| {
            ReleaseError::version(format!("Version component overflows: {}", self))
        })?;

        Ok(Version::new(components, None))
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let numbers: Vec<String> = self.components.iter().map(|n| n.to_string()).collect();
        write!(f, "{}", numbers.join("."))?;
        if let Some(suffix) = &self.suffix {
            write!(f, "-{}", suffix)?;
        }
        Ok(())
    }
}

/// Which version component a release increments
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VersionIncrementMode {
    Major,
    #[default]
    Minor,
    Patch,
}

impl VersionIncrementMode {
    pub fn component_index(self) -> usize {
        match self {
            VersionIncrementMode::Major => 0,
            VersionIncrementMode::Minor => 1,
            VersionIncrementMode::Patch => 2,
        }
    }
}

impl FromStr for VersionIncrementMode {
    type Err = ReleaseError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "major" => Ok(VersionIncrementMode::Major),
            "minor" => Ok(VersionIncrementMode::Minor),
            "patch" => Ok(VersionIncrementMode::Patch),
            _ => Err(ReleaseError::UnsupportedIncrementMode {
                mode: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for VersionIncrementMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VersionIncrementMode::Major => write!(f, "major"),
            VersionIncrementMode::Minor => write!(f, "minor"),
            VersionIncrementMode::Patch => write!(f, "patch"),
        }
    }
}

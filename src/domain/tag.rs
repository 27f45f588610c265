use crate::domain::Version;

/// Represents a repository tag
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag {
    pub name: String,
    pub commit_sha: String,
}

impl Tag {
    /// Create a new tag pointing at a commit
    pub fn new(name: impl Into<String>, commit_sha: impl Into<String>) -> Self {
        Tag {
            name: name.into(),
            commit_sha: commit_sha.into(),
        }
    }
}

/// A tag whose name decodes to a version after stripping an accepted prefix
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionTag {
    pub version: Version,
    pub tag: Tag,
}

/// Accepted tag prefixes, most specific first
///
/// The empty prefix is always present as the last fallback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagPrefixes {
    prefixes: Vec<String>,
}

impl TagPrefixes {
    pub fn new<I, S>(prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut sorted: Vec<String> = Vec::new();
        for prefix in prefixes.into_iter().map(Into::into).chain([String::new()]) {
            if !sorted.contains(&prefix) {
                sorted.push(prefix);
            }
        }
        // stable: equal-length prefixes keep their configured order
        sorted.sort_by(|a, b| b.len().cmp(&a.len()));
        TagPrefixes { prefixes: sorted }
    }

    pub fn as_slice(&self) -> &[String] {
        &self.prefixes
    }

    /// Decode a tag name into a version
    ///
    /// Each prefix is tried as `{prefix}-` and then `{prefix}`; the first
    /// remainder that parses as a version wins.
    pub fn decode(&self, tag_name: &str) -> Option<Version> {
        for prefix in &self.prefixes {
            for candidate in [format!("{}-", prefix), prefix.clone()] {
                if let Some(rest) = tag_name.strip_prefix(candidate.as_str()) {
                    if let Some(version) = Version::parse(rest) {
                        return Some(version);
                    }
                }
            }
        }
        None
    }
}

/// Decode all version tags and sort them, newest version first
pub fn version_tags(tags: &[Tag], prefixes: &TagPrefixes) -> Vec<VersionTag> {
    let mut result: Vec<VersionTag> = tags
        .iter()
        .filter_map(|tag| {
            prefixes.decode(&tag.name).map(|version| VersionTag {
                version,
                tag: tag.clone(),
            })
        })
        .collect();

    result.sort_by(|a, b| b.version.compare(&a.version));
    result
}

/// The most recent version tag, if any tag qualifies
pub fn last_version_tag(tags: &[Tag], prefixes: &TagPrefixes) -> Option<VersionTag> {
    version_tags(tags, prefixes).into_iter().next()
}

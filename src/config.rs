use crate::domain::VersionIncrementMode;
use crate::error::{ReleaseError, Result};
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};
use std::fs;
use std::path::Path;

/// Default configuration file name
pub const CONFIG_FILE_NAME: &str = "release-gate.toml";

/// Represents the complete configuration for release-gate.
///
/// Built once at startup from defaults, an optional TOML file and action
/// inputs, then passed by reference to the engine.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Default)]
#[serde(default)]
pub struct Config {
    /// Prefix of the tag created for the release, e.g. `v`
    pub version_tag_prefix: String,

    /// Additional prefixes accepted when reading existing version tags
    pub allowed_version_tag_prefixes: Vec<String>,

    /// Glob patterns; at least one changed file must match
    pub expected_files_to_change: Vec<String>,

    pub ignore_expected_files_to_change: bool,

    pub allowed_commit_prefixes: Vec<String>,

    /// Label conditions: exact text, `/regex/` or `!/regex/`
    pub allowed_pull_request_labels: Vec<String>,

    pub skipped_changelog_commit_prefixes: Vec<String>,

    pub dependency_updates_pull_request_labels: Vec<String>,

    pub dependency_updates_authors: Vec<String>,

    pub misc_pull_request_labels: Vec<String>,

    #[serde(deserialize_with = "deserialize_increment_mode")]
    pub version_increment_mode: VersionIncrementMode,

    pub check_actors_allowed_to_fail: Vec<String>,

    /// Workflow file paths whose failed runs don't block the release
    pub action_paths_allowed_to_fail: Vec<String>,

    pub fail_on_not_allowed_commits: bool,

    pub dry_run: bool,
}

fn deserialize_increment_mode<'de, D>(
    deserializer: D,
) -> std::result::Result<VersionIncrementMode, D::Error>
where
    D: Deserializer<'de>,
{
    let text = String::deserialize(deserializer)?;
    text.parse().map_err(serde::de::Error::custom)
}

impl Config {
    /// Actors whose failed check runs don't block the release
    ///
    /// Dependency update authors are always included.
    pub fn check_actors_allowed_to_fail(&self) -> Vec<String> {
        let mut actors = self.check_actors_allowed_to_fail.clone();
        for author in &self.dependency_updates_authors {
            if !actors.contains(author) {
                actors.push(author.clone());
            }
        }
        actors
    }

    /// Prefixes accepted when reading version tags
    pub fn version_tag_prefixes(&self) -> Vec<String> {
        let mut prefixes = self.allowed_version_tag_prefixes.clone();
        if !prefixes.contains(&self.version_tag_prefix) {
            prefixes.push(self.version_tag_prefix.clone());
        }
        prefixes
    }

    /// Overlay action inputs on top of this configuration
    ///
    /// `lookup` receives the camelCase input name and returns its raw value.
    /// Missing or blank inputs keep the current value.
    pub fn apply_inputs<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let input = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        if let Some(value) = input("versionTagPrefix") {
            self.version_tag_prefix = value.trim().to_string();
        }
        if let Some(value) = input("versionIncrementMode") {
            self.version_increment_mode = value.parse()?;
        }

        let lists: [(&str, &mut Vec<String>); 10] = [
            (
                "allowedVersionTagPrefixes",
                &mut self.allowed_version_tag_prefixes,
            ),
            ("expectedFilesToChange", &mut self.expected_files_to_change),
            ("allowedCommitPrefixes", &mut self.allowed_commit_prefixes),
            (
                "allowedPullRequestLabels",
                &mut self.allowed_pull_request_labels,
            ),
            (
                "skippedChangelogCommitPrefixes",
                &mut self.skipped_changelog_commit_prefixes,
            ),
            (
                "dependencyUpdatesPullRequestLabels",
                &mut self.dependency_updates_pull_request_labels,
            ),
            (
                "dependencyUpdatesAuthors",
                &mut self.dependency_updates_authors,
            ),
            ("miscPullRequestLabels", &mut self.misc_pull_request_labels),
            (
                "checkActorsAllowedToFail",
                &mut self.check_actors_allowed_to_fail,
            ),
            (
                "actionPathsAllowedToFail",
                &mut self.action_paths_allowed_to_fail,
            ),
        ];
        for (name, target) in lists {
            if let Some(value) = input(name) {
                *target = split_list(&value);
            }
        }

        let flags: [(&str, &mut bool); 3] = [
            (
                "ignoreExpectedFilesToChange",
                &mut self.ignore_expected_files_to_change,
            ),
            (
                "failOnNotAllowedCommits",
                &mut self.fail_on_not_allowed_commits,
            ),
            ("dryRun", &mut self.dry_run),
        ];
        for (name, target) in flags {
            if let Some(value) = input(name) {
                *target = parse_bool(name, &value)?;
            }
        }

        Ok(())
    }

    /// Overlay inputs from `INPUT_<NAME>` environment variables
    pub fn apply_env(&mut self) -> Result<()> {
        self.apply_inputs(|name| std::env::var(input_env_name(name)).ok())
    }
}

/// Environment variable carrying an action input
pub fn input_env_name(name: &str) -> String {
    format!("INPUT_{}", name.to_uppercase())
}

/// Split a list input on whitespace, commas and semicolons
pub fn split_list(value: &str) -> Vec<String> {
    match Regex::new(r"[\s,;]+") {
        Ok(separator) => separator
            .split(value)
            .map(str::trim)
            .filter(|item| !item.is_empty())
            .map(str::to_string)
            .collect(),
        Err(_) => Vec::new(),
    }
}

/// Parse a boolean input, accepting `true`/`false` in any case
pub fn parse_bool(name: &str, value: &str) -> Result<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(ReleaseError::config(format!(
            "Input '{}' must be 'true' or 'false', got '{}'",
            name, value
        ))),
    }
}

/// Loads configuration from file or returns defaults.
///
/// Attempts to load configuration in the following order:
/// 1. Custom path provided as parameter
/// 2. `release-gate.toml` in current directory
/// 3. `release-gate.toml` in user config directory
/// 4. Default configuration if no file found
///
/// # Arguments
/// * `config_path` - Optional path to custom configuration file
///
/// # Returns
/// * `Ok(Config)` - Loaded or default configuration
/// * `Err` - If file exists but cannot be read or parsed
pub fn load_config(config_path: Option<&str>) -> Result<Config> {
    let local = Path::new(".").join(CONFIG_FILE_NAME);
    let config_str = if let Some(path) = config_path {
        fs::read_to_string(path)?
    } else if local.exists() {
        fs::read_to_string(local)?
    } else if let Some(config_dir) = dirs::config_dir() {
        let config_path = config_dir.join(CONFIG_FILE_NAME);
        if config_path.exists() {
            fs::read_to_string(config_path)?
        } else {
            return Ok(Config::default());
        }
    } else {
        return Ok(Config::default());
    };

    let config: Config = toml::from_str(&config_str)?;
    Ok(config)
}

/// Load the file layer, then overlay `INPUT_*` environment inputs
pub fn load_with_env(config_path: Option<&str>) -> Result<Config> {
    let mut config = load_config(config_path)?;
    config.apply_env()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn inputs(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.version_tag_prefix, "");
        assert_eq!(config.version_increment_mode, VersionIncrementMode::Minor);
        assert!(!config.dry_run);
        assert!(!config.fail_on_not_allowed_commits);
        assert!(!config.ignore_expected_files_to_change);
        assert!(config.allowed_commit_prefixes.is_empty());
    }

    #[test]
    fn test_split_list() {
        assert_eq!(
            split_list("feat, fix;chore\n docs\n\n"),
            vec!["feat", "fix", "chore", "docs"]
        );
        assert!(split_list("  ,; \n").is_empty());
    }

    #[test]
    fn test_parse_bool() {
        assert!(parse_bool("dryRun", "TRUE").unwrap());
        assert!(!parse_bool("dryRun", " false ").unwrap());
        assert!(matches!(
            parse_bool("dryRun", "yes"),
            Err(ReleaseError::Config(_))
        ));
    }

    #[test]
    fn test_apply_inputs() {
        let values = inputs(&[
            ("versionTagPrefix", "v"),
            ("allowedCommitPrefixes", "feat\nfix"),
            ("dependencyUpdatesAuthors", "dependabot,renovate"),
            ("versionIncrementMode", "Patch"),
            ("dryRun", "True"),
            ("miscPullRequestLabels", "   "),
        ]);
        let mut config = Config {
            misc_pull_request_labels: vec!["misc".to_string()],
            ..Config::default()
        };
        config.apply_inputs(|name| values.get(name).cloned()).unwrap();

        assert_eq!(config.version_tag_prefix, "v");
        assert_eq!(config.allowed_commit_prefixes, vec!["feat", "fix"]);
        assert_eq!(config.version_increment_mode, VersionIncrementMode::Patch);
        assert!(config.dry_run);
        // blank input keeps the file value
        assert_eq!(config.misc_pull_request_labels, vec!["misc"]);
    }

    #[test]
    fn test_apply_inputs_rejects_unknown_mode() {
        let values = inputs(&[("versionIncrementMode", "huge")]);
        let mut config = Config::default();
        let err = config
            .apply_inputs(|name| values.get(name).cloned())
            .unwrap_err();
        assert!(matches!(err, ReleaseError::UnsupportedIncrementMode { .. }));
    }

    #[test]
    fn test_check_actors_union() {
        let config = Config {
            check_actors_allowed_to_fail: vec!["octocat".to_string(), "renovate".to_string()],
            dependency_updates_authors: vec!["renovate".to_string(), "dependabot".to_string()],
            ..Config::default()
        };
        assert_eq!(
            config.check_actors_allowed_to_fail(),
            vec!["octocat", "renovate", "dependabot"]
        );
    }

    #[test]
    fn test_version_tag_prefixes() {
        let config = Config {
            version_tag_prefix: "v".to_string(),
            allowed_version_tag_prefixes: vec!["release".to_string(), "v".to_string()],
            ..Config::default()
        };
        assert_eq!(config.version_tag_prefixes(), vec!["release", "v"]);

        let config = Config::default();
        assert_eq!(config.version_tag_prefixes(), vec![""]);
    }

    #[test]
    fn test_toml_mode_is_case_insensitive() {
        let config: Config = toml::from_str("version_increment_mode = \"MAJOR\"").unwrap();
        assert_eq!(config.version_increment_mode, VersionIncrementMode::Major);
        assert!(toml::from_str::<Config>("version_increment_mode = \"huge\"").is_err());
    }

    #[test]
    fn test_input_env_name() {
        assert_eq!(input_env_name("versionTagPrefix"), "INPUT_VERSIONTAGPREFIX");
    }
}

//! Label conditions, commit-prefix matching and login comparison

use crate::error::{ReleaseError, Result};
use regex::Regex;

/// Predicate over pull request labels
///
/// Parsed from one configured entry:
/// - `!/regex/` - label does not match the regex
/// - `/regex/` - label matches the regex anywhere
/// - anything else - label equals the text exactly
#[derive(Debug, Clone)]
pub enum LabelCondition {
    Exact(String),
    Pattern(Regex),
    Not(Box<LabelCondition>),
}

impl LabelCondition {
    pub fn parse(text: &str) -> Result<Self> {
        if text.len() > 3 && text.starts_with("!/") && text.ends_with('/') {
            let inner = LabelCondition::parse(&text[1..])?;
            return Ok(LabelCondition::Not(Box::new(inner)));
        }

        if text.len() > 2 && text.starts_with('/') && text.ends_with('/') {
            let source = &text[1..text.len() - 1];
            let regex = Regex::new(source).map_err(|e| {
                ReleaseError::config(format!("Invalid label regex '{}': {}", text, e))
            })?;
            return Ok(LabelCondition::Pattern(regex));
        }

        Ok(LabelCondition::Exact(text.to_string()))
    }

    pub fn matches(&self, label: &str) -> bool {
        match self {
            LabelCondition::Exact(expected) => label == expected,
            LabelCondition::Pattern(regex) => regex.is_match(label),
            LabelCondition::Not(inner) => !inner.matches(label),
        }
    }
}

/// Parse every configured label condition
pub fn parse_label_conditions(entries: &[String]) -> Result<Vec<LabelCondition>> {
    entries.iter().map(|text| LabelCondition::parse(text)).collect()
}

/// True if any label satisfies any of the conditions
pub fn any_label_matches(labels: &[String], conditions: &[LabelCondition]) -> bool {
    labels
        .iter()
        .any(|label| conditions.iter().any(|condition| condition.matches(label)))
}

fn is_word_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Whether `message` starts with `prefix` as a whole token
///
/// `fix` matches `fix: x`, `fix` and `fix(api): x` but not `fixture: x`.
/// A prefix ending in punctuation (`chore:`) matches tightly against the
/// following word.
pub fn prefix_boundary_match(message: &str, prefix: &str) -> bool {
    let Some(rest) = message.strip_prefix(prefix) else {
        return false;
    };

    rest.is_empty()
        || rest.chars().next().is_some_and(|c| !is_word_char(c))
        || prefix.chars().last().is_some_and(|c| !is_word_char(c))
}

/// First configured prefix the message starts with under the boundary rule
pub fn find_boundary_prefix<'a>(message: &str, prefixes: &'a [String]) -> Option<&'a str> {
    prefixes
        .iter()
        .find(|prefix| prefix_boundary_match(message, prefix))
        .map(String::as_str)
}

/// True if the two slices share at least one element
pub fn has_not_empty_intersection<T: PartialEq>(left: &[T], right: &[T]) -> bool {
    left.iter().any(|item| right.contains(item))
}

/// Strip the `[bot]` suffix GitHub appends to app accounts
pub fn strip_bot_suffix(login: &str) -> &str {
    login.strip_suffix("[bot]").unwrap_or(login)
}

/// Whether `login` is in the allow-list, ignoring `[bot]` suffixes on both sides
pub fn login_allowed(login: &str, allowed: &[String]) -> bool {
    let login = strip_bot_suffix(login);
    allowed
        .iter()
        .any(|entry| strip_bot_suffix(entry) == login)
}

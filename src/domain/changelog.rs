//! Changelog accumulation and Markdown rendering
//!
//! Items are deduplicated by `(message, author)`: a repeated key merges its
//! pull request numbers and commits into the first occurrence.

use crate::domain::Commit;
use crate::matcher::{prefix_boundary_match, strip_bot_suffix};
use std::fmt;
use tracing::info;

/// Heading for items without a known section
pub const DEFAULT_HEADING: &str = "What's Changed";

/// Section a changelog item is filed under
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeLogItemType {
    Dependency,
    Misc,
}

impl fmt::Display for ChangeLogItemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChangeLogItemType::Dependency => write!(f, "dependency"),
            ChangeLogItemType::Misc => write!(f, "misc"),
        }
    }
}

/// Section order used for release notes
pub const RELEASE_SECTIONS: [(ChangeLogItemType, &str); 2] = [
    (ChangeLogItemType::Dependency, "Dependency updates"),
    (ChangeLogItemType::Misc, "Misc"),
];

/// One deduplicated bullet of the release notes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeLogItem {
    pub message: String,
    pub author: Option<String>,
    /// Unique, in insertion order
    pub pull_request_numbers: Vec<u64>,
    /// Unique by sha, in insertion order
    pub commits: Vec<Commit>,
    pub item_type: Option<ChangeLogItemType>,
}

/// Input for [`ChangelogAggregator::add`]
#[derive(Debug, Clone)]
pub struct ChangeLogEntry<'a> {
    pub commit: &'a Commit,
    pub item_type: Option<ChangeLogItemType>,
    pub message: &'a str,
    /// Text tested against the skipped prefixes
    pub original_message: &'a str,
    pub author: Option<&'a str>,
    pub pull_request_number: Option<u64>,
}

/// Collects changelog items, dropping skipped ones and merging duplicates
#[derive(Debug, Clone, Default)]
pub struct ChangelogAggregator {
    skipped_prefixes: Vec<String>,
    items: Vec<ChangeLogItem>,
}

impl ChangelogAggregator {
    pub fn new(skipped_prefixes: Vec<String>) -> Self {
        ChangelogAggregator {
            skipped_prefixes,
            items: Vec::new(),
        }
    }

    pub fn add(&mut self, entry: ChangeLogEntry<'_>) {
        let message = entry.message.trim();
        if message.is_empty() {
            return;
        }

        if let Some(prefix) = self
            .skipped_prefixes
            .iter()
            .find(|prefix| prefix_boundary_match(entry.original_message, prefix))
        {
            info!(
                prefix = %prefix,
                sha = %entry.commit.sha,
                "Skipping changelog item: {}",
                entry.original_message
            );
            return;
        }

        let author = entry.author.map(str::to_string);
        let existing = self
            .items
            .iter_mut()
            .find(|item| item.message == message && item.author == author);

        match existing {
            Some(item) => {
                if let Some(number) = entry.pull_request_number {
                    if !item.pull_request_numbers.contains(&number) {
                        item.pull_request_numbers.push(number);
                    }
                }
                if !item.commits.iter().any(|c| c.sha == entry.commit.sha) {
                    item.commits.push(entry.commit.clone());
                }
                if item.item_type.is_none() {
                    item.item_type = entry.item_type;
                }
            }
            None => self.items.push(ChangeLogItem {
                message: message.to_string(),
                author,
                pull_request_numbers: entry.pull_request_number.into_iter().collect(),
                commits: vec![entry.commit.clone()],
                item_type: entry.item_type,
            }),
        }
    }

    pub fn items(&self) -> &[ChangeLogItem] {
        &self.items
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn into_items(self) -> Vec<ChangeLogItem> {
        self.items
    }
}

/// Render items as Markdown
///
/// Items whose type is unset or has no entry in `sections` come first under
/// [`DEFAULT_HEADING`]; then one `##` section per entry of `sections`, in
/// order. Empty groups produce no heading.
pub fn render(items: &[ChangeLogItem], sections: &[(ChangeLogItemType, &str)]) -> String {
    let mut groups: Vec<String> = Vec::new();

    let unsectioned: Vec<&ChangeLogItem> = items
        .iter()
        .filter(|item| match item.item_type {
            None => true,
            Some(item_type) => !sections.iter().any(|(t, _)| *t == item_type),
        })
        .collect();
    if !unsectioned.is_empty() {
        groups.push(render_group("#", DEFAULT_HEADING, &unsectioned));
    }

    for (section_type, title) in sections {
        let section: Vec<&ChangeLogItem> = items
            .iter()
            .filter(|item| item.item_type == Some(*section_type))
            .collect();
        if !section.is_empty() {
            groups.push(render_group("##", title, &section));
        }
    }

    groups.join("\n\n")
}

fn render_group(level: &str, title: &str, items: &[&ChangeLogItem]) -> String {
    let mut out = format!("{} {}\n", level, title);
    for item in items {
        out.push('\n');
        out.push_str(&render_line(item));
    }
    out
}

fn render_line(item: &ChangeLogItem) -> String {
    let mut parts: Vec<String> = vec!["*".to_string(), item.message.clone()];

    let item_author = item.author.as_deref().map(strip_bot_suffix);

    if !item.pull_request_numbers.is_empty() {
        let numbers: Vec<String> = item
            .pull_request_numbers
            .iter()
            .map(|n| format!("#{}", n))
            .collect();
        parts.push(format!("({})", numbers.join(", ")));
    } else if !item.commits.is_empty() {
        let shas: Vec<&str> = item.commits.iter().map(|c| c.sha.as_str()).collect();
        parts.push(format!("({})", shas.join(", ")));

        let mut handles: Vec<&str> = Vec::new();
        for login in item.commits.iter().filter_map(|c| c.author_login.as_deref()) {
            let login = strip_bot_suffix(login);
            if Some(login) != item_author && !handles.contains(&login) {
                handles.push(login);
            }
        }
        parts.extend(handles.into_iter().map(|login| format!("@{}", login)));
    }

    if let Some(author) = item_author {
        parts.push(format!("@{}", author));
    }

    parts.retain(|part| !part.is_empty());
    parts.join(" ")
}

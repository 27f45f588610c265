//! Domain logic - pure release rules independent of the hosting platform

pub mod changelog;
pub mod commit;
pub mod tag;
pub mod version;

pub use changelog::{
    render, ChangeLogEntry, ChangeLogItem, ChangeLogItemType, ChangelogAggregator,
    RELEASE_SECTIONS,
};
pub use commit::Commit;
pub use tag::{last_version_tag, version_tags, Tag, TagPrefixes, VersionTag};
pub use version::{Version, VersionIncrementMode};

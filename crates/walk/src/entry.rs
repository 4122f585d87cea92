use serde::Serialize;

use crate::fs::StatRecord;

/// Entry produced by the listing.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ListEntry {
    pub(crate) path: String,
    pub(crate) name: String,
    pub(crate) depth: usize,
    pub(crate) stat: StatRecord,
}

impl ListEntry {
    /// Creates an entry.
    pub fn new(path: impl Into<String>, name: impl Into<String>, depth: usize, stat: StatRecord) -> Self {
        Self {
            path: path.into(),
            name: name.into(),
            depth,
            stat,
        }
    }

    /// Path of the entry: the root path with `/name` appended per level.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Final component of the path.
    ///
    /// For the root this is the text after the last `/` of the root path.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Nesting level relative to the root (root depth is `0`).
    #[must_use]
    pub const fn depth(&self) -> usize {
        self.depth
    }

    /// Metadata captured for the entry.
    #[must_use]
    pub const fn stat(&self) -> &StatRecord {
        &self.stat
    }

    /// Returns `true` for the listing root.
    #[must_use]
    pub const fn is_root(&self) -> bool {
        self.depth == 0
    }
}

/// Name of the root entry for `path`.
pub(crate) fn root_name(path: &str) -> &str {
    path.rsplit_once('/').map_or(path, |(_, name)| name)
}

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::entry::ListEntry;

/// Whether and how the listing descends below the root's children.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Recurse {
    /// List only the root's direct children.
    #[default]
    Off,
    /// Descend; emit each directory before its descendants.
    Preorder,
    /// Descend; emit each directory after its descendants.
    Postorder,
}

impl Recurse {
    /// Returns `true` unless recursion is off.
    pub const fn is_on(self) -> bool {
        !matches!(self, Self::Off)
    }
}

impl From<bool> for Recurse {
    fn from(recurse: bool) -> Self {
        if recurse { Self::Preorder } else { Self::Off }
    }
}

/// Error returned when parsing an unknown [`Recurse`] value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParseRecurseError {
    input: String,
}

impl fmt::Display for ParseRecurseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unknown recurse mode '{}' (expected postorder, preorder, true or false)",
            self.input
        )
    }
}

impl std::error::Error for ParseRecurseError {}

impl FromStr for Recurse {
    type Err = ParseRecurseError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        match input {
            "postorder" => Ok(Self::Postorder),
            "preorder" | "true" => Ok(Self::Preorder),
            "false" => Ok(Self::Off),
            other => Err(ParseRecurseError {
                input: other.to_owned(),
            }),
        }
    }
}

/// Predicate deciding whether an entry (and everything below it) is listed.
pub type Accept = Arc<dyn Fn(&ListEntry) -> bool + Send + Sync>;

/// Configures a listing.
#[derive(Clone, Default)]
pub struct ListOptions {
    pub(crate) recurse: Recurse,
    pub(crate) accept: Option<Accept>,
}

impl ListOptions {
    /// Options listing the root's children without recursion or filtering.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the recursion mode.
    #[must_use]
    pub fn recurse(mut self, recurse: impl Into<Recurse>) -> Self {
        self.recurse = recurse.into();
        self
    }

    /// Keeps only entries for which `accept` returns `true`.
    ///
    /// A rejected directory is neither emitted nor descended into.
    #[must_use]
    pub fn accept<F>(mut self, accept: F) -> Self
    where
        F: Fn(&ListEntry) -> bool + Send + Sync + 'static,
    {
        self.accept = Some(Arc::new(accept));
        self
    }

    /// Configured recursion mode.
    pub const fn recurse_mode(&self) -> Recurse {
        self.recurse
    }

    pub(crate) fn accepts(&self, entry: &ListEntry) -> bool {
        self.accept.as_ref().is_none_or(|accept| accept(entry))
    }
}

impl fmt::Debug for ListOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListOptions")
            .field("recurse", &self.recurse)
            .field("accept", &self.accept.is_some())
            .finish()
    }
}

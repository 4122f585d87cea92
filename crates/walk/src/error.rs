use std::error::Error;
use std::fmt;
use std::io;

/// Error returned when a listing fails.
///
/// Reaches consumers wrapped in [`stream::StreamError::Upstream`]; use
/// [`stream::StreamError::upstream_as`] to recover it.
#[derive(Debug)]
pub struct WalkError {
    kind: WalkErrorKind,
}

impl WalkError {
    pub(crate) fn new(kind: WalkErrorKind) -> Self {
        Self { kind }
    }

    pub(crate) fn stat(path: impl Into<String>, source: io::Error) -> Self {
        Self::new(WalkErrorKind::Stat {
            path: path.into(),
            source,
        })
    }

    pub(crate) fn read_dir(path: impl Into<String>, source: io::Error) -> Self {
        Self::new(WalkErrorKind::ReadDir {
            path: path.into(),
            source,
        })
    }

    /// Returns the specific failure that terminated the listing.
    #[must_use]
    pub fn kind(&self) -> &WalkErrorKind {
        &self.kind
    }

    /// Returns the path the failure happened on.
    #[must_use]
    pub fn path(&self) -> &str {
        self.kind.path()
    }
}

impl fmt::Display for WalkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            WalkErrorKind::Stat { path, source } => {
                write!(f, "failed to stat '{path}': {source}")
            }
            WalkErrorKind::ReadDir { path, source } => {
                write!(f, "failed to read directory '{path}': {source}")
            }
        }
    }
}

impl Error for WalkError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match &self.kind {
            WalkErrorKind::Stat { source, .. } | WalkErrorKind::ReadDir { source, .. } => {
                Some(source)
            }
        }
    }
}

/// Classification of listing failures.
#[derive(Debug)]
pub enum WalkErrorKind {
    /// Failed to stat an entry.
    Stat {
        /// Path that could not be inspected.
        path: String,
        /// Underlying error reported by the filesystem.
        source: io::Error,
    },
    /// Failed to list a directory, including entries whose names are not
    /// valid UTF-8.
    ReadDir {
        /// Directory whose contents could not be read.
        path: String,
        /// Underlying error reported by the filesystem.
        source: io::Error,
    },
}

impl WalkErrorKind {
    /// Returns the path tied to the failure.
    #[must_use]
    pub fn path(&self) -> &str {
        match self {
            Self::Stat { path, .. } | Self::ReadDir { path, .. } => path,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn io_error(message: &'static str) -> io::Error {
        io::Error::other(message)
    }

    #[test]
    fn walk_error_path_matches_variant_path() {
        let stat = WalkError::stat("root/a", io_error("stat"));
        assert_eq!(stat.path(), "root/a");

        let read_dir = WalkError::read_dir("root/sub", io_error("dir"));
        assert_eq!(read_dir.kind().path(), "root/sub");
    }

    #[test]
    fn walk_error_display_is_specific_per_variant() {
        let stat = WalkError::stat("meta", io_error("boom"));
        assert_eq!(stat.to_string(), "failed to stat 'meta': boom");

        let read_dir = WalkError::read_dir("dir", io_error("boom"));
        assert_eq!(read_dir.to_string(), "failed to read directory 'dir': boom");
    }

    #[test]
    fn walk_error_source_refers_to_underlying_io_error() {
        let error = WalkError::read_dir("dir", io_error("source"));
        let source_ref = error
            .source()
            .and_then(|err| err.downcast_ref::<io::Error>())
            .expect("walk error should expose the underlying io::Error");
        assert_eq!(source_ref.to_string(), "source");
    }
}

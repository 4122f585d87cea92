//! Filesystem collaborator used by the listing.

use std::fs::Metadata;
use std::io;
use std::time::{SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use serde::{Serialize, Serializer};

/// Kind of a filesystem entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    /// Regular file.
    File,
    /// Directory.
    Dir,
    /// Symbolic link (only seen when the filesystem does not follow links).
    Symlink,
    /// Anything else: sockets, devices, fifos.
    Other,
}

impl FileKind {
    /// Short label used in listings.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::File => "file",
            Self::Dir => "dir",
            Self::Symlink => "symlink",
            Self::Other => "other",
        }
    }
}

/// Snapshot of an entry's metadata.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct StatRecord {
    kind: FileKind,
    len: u64,
    #[serde(serialize_with = "unix_seconds")]
    modified: Option<SystemTime>,
    readonly: bool,
}

fn unix_seconds<S: Serializer>(time: &Option<SystemTime>, serializer: S) -> Result<S::Ok, S::Error> {
    match time.and_then(|time| time.duration_since(UNIX_EPOCH).ok()) {
        Some(elapsed) => serializer.serialize_some(&elapsed.as_secs()),
        None => serializer.serialize_none(),
    }
}

impl StatRecord {
    /// Creates a record with no modification time.
    pub const fn new(kind: FileKind, len: u64) -> Self {
        Self {
            kind,
            len,
            modified: None,
            readonly: false,
        }
    }

    /// Record for a directory.
    pub const fn dir() -> Self {
        Self::new(FileKind::Dir, 0)
    }

    /// Record for a regular file of `len` bytes.
    pub const fn file(len: u64) -> Self {
        Self::new(FileKind::File, len)
    }

    /// Sets the modification time.
    pub const fn with_modified(mut self, modified: SystemTime) -> Self {
        self.modified = Some(modified);
        self
    }

    /// Sets the read-only flag.
    pub const fn with_readonly(mut self, readonly: bool) -> Self {
        self.readonly = readonly;
        self
    }

    /// Kind of the entry.
    pub const fn kind(&self) -> FileKind {
        self.kind
    }

    /// Returns `true` for directories.
    pub const fn is_dir(&self) -> bool {
        matches!(self.kind, FileKind::Dir)
    }

    /// Returns `true` for regular files.
    pub const fn is_file(&self) -> bool {
        matches!(self.kind, FileKind::File)
    }

    /// Size in bytes.
    pub const fn len(&self) -> u64 {
        self.len
    }

    /// Returns `true` when the size is zero.
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Last modification time, when the platform reports one.
    pub const fn modified(&self) -> Option<SystemTime> {
        self.modified
    }

    /// Returns `true` when the entry is read-only.
    pub const fn readonly(&self) -> bool {
        self.readonly
    }
}

impl From<Metadata> for StatRecord {
    fn from(metadata: Metadata) -> Self {
        let file_type = metadata.file_type();
        let kind = if file_type.is_dir() {
            FileKind::Dir
        } else if file_type.is_file() {
            FileKind::File
        } else if file_type.is_symlink() {
            FileKind::Symlink
        } else {
            FileKind::Other
        };
        Self {
            kind,
            len: metadata.len(),
            modified: metadata.modified().ok(),
            readonly: metadata.permissions().readonly(),
        }
    }
}

/// Filesystem operations needed by the listing.
///
/// Paths are `/`-joined strings exactly as the listing builds them.
#[async_trait]
pub trait FileSystem: Send + Sync {
    /// Metadata for `path`, following symbolic links.
    async fn stat(&self, path: &str) -> io::Result<StatRecord>;

    /// Names of the entries of directory `path`, in enumeration order.
    async fn read_dir(&self, path: &str) -> io::Result<Vec<String>>;
}

/// [`FileSystem`] backed by `tokio::fs`.
#[derive(Clone, Copy, Debug, Default)]
pub struct LocalFs;

#[async_trait]
impl FileSystem for LocalFs {
    async fn stat(&self, path: &str) -> io::Result<StatRecord> {
        tokio::fs::metadata(path).await.map(StatRecord::from)
    }

    async fn read_dir(&self, path: &str) -> io::Result<Vec<String>> {
        let mut entries = tokio::fs::read_dir(path).await?;
        let mut names = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name().into_string().map_err(|name| {
                io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!("entry name is not valid UTF-8: {}", name.to_string_lossy()),
                )
            })?;
            names.push(name);
        }
        Ok(names)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn local_stat_follows_metadata() {
        let temp = tempfile::tempdir().expect("tempdir");
        let file = temp.path().join("data.txt");
        std::fs::write(&file, b"12345").expect("write");

        let record = LocalFs
            .stat(file.to_str().expect("utf-8 path"))
            .await
            .expect("stat");
        assert!(record.is_file());
        assert_eq!(record.len(), 5);
        assert!(record.modified().is_some());

        let dir = LocalFs
            .stat(temp.path().to_str().expect("utf-8 path"))
            .await
            .expect("stat dir");
        assert!(dir.is_dir());
    }

    #[tokio::test]
    async fn local_read_dir_lists_names() {
        let temp = tempfile::tempdir().expect("tempdir");
        std::fs::write(temp.path().join("a"), b"").expect("write");
        std::fs::create_dir(temp.path().join("b")).expect("mkdir");

        let mut names = LocalFs
            .read_dir(temp.path().to_str().expect("utf-8 path"))
            .await
            .expect("read_dir");
        names.sort();
        assert_eq!(names, vec!["a".to_owned(), "b".to_owned()]);
    }

    #[tokio::test]
    async fn local_stat_missing_path_fails() {
        let err = LocalFs
            .stat("/definitely/missing/ezs/path")
            .await
            .expect_err("missing");
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }

    #[test]
    fn stat_record_serializes_kind_and_seconds() {
        let record = StatRecord::file(3).with_modified(UNIX_EPOCH + std::time::Duration::from_secs(10));
        let json = serde_json::to_value(&record).expect("serialize");
        assert_eq!(
            json,
            serde_json::json!({"kind": "file", "len": 3, "modified": 10, "readonly": false})
        );
    }
}

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! # Overview
//!
//! `walk` lists a directory tree as a [`stream::Reader`] of [`ListEntry`]
//! values. The listing is a generator built with
//! [`stream::ReaderExt::transform`]: entries are produced on demand, one at a
//! time, while the consumer reads them.
//!
//! # Design
//!
//! - [`list`] drives a [`FileSystem`] collaborator through `stat` and
//!   `read_dir`. [`LocalFs`] talks to `tokio::fs`; [`MemoryFs`] keeps a tree in
//!   memory and records every call.
//! - Traversal uses an explicit work stack instead of recursion, so deep trees
//!   do not grow the task's stack.
//! - [`ListOptions`] selects the [`Recurse`] mode and an optional `accept`
//!   predicate. A rejected entry prunes its whole subtree: it is not emitted,
//!   and nothing below it is stat'ed or read.
//!
//! # Invariants
//!
//! - Every entry's metadata is resolved before the entry is filtered or
//!   emitted.
//! - Depth grows by exactly one per level; the root has depth `0`.
//! - Children are visited in the order the filesystem enumerates them.
//! - Without recursion only depth-1 entries are emitted, and depth-1
//!   directories are never read.
//!
//! # Errors
//!
//! The first stat or read-dir failure ends the listing. It reaches the
//! consumer's `read` as [`stream::StreamError::Upstream`] wrapping a
//! [`WalkError`] that names the offending path.
//!
//! # Examples
//!
//! ```
//! use std::sync::Arc;
//! use stream::ReaderExt;
//! use walk::{ListOptions, MemoryFs, Recurse, list};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), stream::StreamError> {
//! let fs = MemoryFs::new();
//! fs.file("root/a.txt", 3).file("root/sub/b.txt", 5);
//!
//! let entries = list(Arc::new(fs), "root", ListOptions::new().recurse(Recurse::Postorder))
//!     .to_vec()
//!     .await?;
//! let paths: Vec<&str> = entries.iter().map(|entry| entry.path()).collect();
//! assert_eq!(paths, ["root/a.txt", "root/sub/b.txt", "root/sub", "root"]);
//! # Ok(())
//! # }
//! ```

mod entry;
mod error;
mod fs;
mod list;
mod memory;
mod options;

pub use entry::ListEntry;
pub use error::{WalkError, WalkErrorKind};
pub use fs::{FileKind, FileSystem, LocalFs, StatRecord};
pub use list::{list, list_local, list_with};
pub use memory::{FsCall, MemoryFs};
pub use options::{Accept, ListOptions, ParseRecurseError, Recurse};

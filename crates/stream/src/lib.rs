#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! # Overview
//!
//! `stream` defines the pull/push contract every ezs pipeline is built from:
//! [`Reader`] produces a lazy sequence of values, [`Writer`] accepts one, and
//! both suspend on tokio futures instead of blocking. [`ReaderExt::transform`]
//! composes new readers by running producer logic on its own task against a
//! paired writer.
//!
//! # Design
//!
//! - End-of-sequence is `Ok(None)` from [`Reader::read`] and [`Writer::end`]
//!   on the push side. It is never a valid value.
//! - Every stream owns a [`StopHandle`]. Stopping is idempotent, wakes a
//!   blocked `read` or `write`, and releases the stream's resources before
//!   `stop` returns.
//! - The traits are object safe through `async-trait`, so heterogeneous
//!   pipelines use [`BoxReader`] and [`BoxWriter`].
//! - Between a producer and its consumer at most one value is in flight.
//!
//! # Invariants
//!
//! - After end-of-sequence or `stop`, `read` keeps returning `Ok(None)`.
//! - A failure is reported once, on the `read` during which it happened.
//! - A stop reason is reported once, as [`StreamError::Cancelled`].
//!
//! # Errors
//!
//! All operations return [`StreamError`]. Causes from devices and
//! collaborators travel inside [`StreamError::Upstream`].
//!
//! # Examples
//!
//! A generator that writes three values, consumed through `map`:
//!
//! ```
//! use stream::{ReaderExt, Writer, empty_reader};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), stream::StreamError> {
//! let numbers = empty_reader::<()>().transform(|_, mut sink| async move {
//!     for n in 1..=3u32 {
//!         sink.write(n).await?;
//!     }
//!     Ok(())
//! });
//!
//! let squares = numbers.map(|n| n * n).to_vec().await?;
//! assert_eq!(squares, vec![1, 4, 9]);
//! # Ok(())
//! # }
//! ```

mod empty;
mod error;
mod reader;
mod shared;
mod stop;
pub mod transform;
mod writer;

pub use empty::{EmptyReader, empty_reader};
pub use error::{BoxError, StreamError};
pub use reader::{BoxReader, Reader, ReaderExt};
pub use shared::SharedWriter;
pub use stop::StopHandle;
pub use transform::{ChannelWriter, TransformReader};
pub use writer::{BoxWriter, Collected, Writer};

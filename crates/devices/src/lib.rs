#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! # Overview
//!
//! `devices` turns loosely specified sources and sinks into [`stream`]
//! readers and writers. [`reader`] and [`writer`] accept a [`DeviceArg`]: a
//! device spec resolved through a [`Factory`], an in-memory sequence, or a
//! raw byte buffer.
//!
//! # Design
//!
//! - Specs are resolved when dispatched, so an unknown device fails
//!   immediately with [`StreamError::UnknownDevice`]. The device's own stream
//!   is built later, on first use ([`LazyReader`], [`LazyWriter`]), at most
//!   once.
//! - [`Registry`] is the default [`Factory`]: it maps `scheme:rest` specs to
//!   registered constructors and sends bare specs to a default scheme.
//!   [`Registry::with_defaults`] installs the `file` scheme.
//! - Values flowing through byte-oriented devices implement [`Payload`].
//!
//! # Errors
//!
//! Dispatch fails with [`StreamError::InvalidArgument`] for JSON values that
//! are neither strings nor arrays and with [`StreamError::UnknownDevice`] for
//! unresolvable specs. File I/O failures reach the consumer as
//! [`StreamError::Upstream`] wrapping a [`DeviceError`].
//!
//! # Examples
//!
//! ```
//! use devices::{DeviceArg, Registry, reader};
//! use stream::ReaderExt;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), stream::StreamError> {
//! let registry = Registry::<String>::with_defaults();
//! let words = reader(DeviceArg::Sequence(vec!["a".into(), "b".into()]), &registry)?;
//! assert_eq!(words.to_vec().await?, vec!["a".to_owned(), "b".to_owned()]);
//! # Ok(())
//! # }
//! ```
//!
//! [`StreamError::UnknownDevice`]: stream::StreamError::UnknownDevice
//! [`StreamError::InvalidArgument`]: stream::StreamError::InvalidArgument
//! [`StreamError::Upstream`]: stream::StreamError::Upstream

mod device;
mod dispatch;
mod file;
mod lazy;
mod memory;
mod payload;

pub use device::{Device, Factory, Registry};
pub use dispatch::{DeviceArg, reader, writer};
pub use file::{DEFAULT_CHUNK_SIZE, DeviceError, FileDevice, FileReader, FileWriter};
pub use lazy::{LazyReader, LazyWriter};
pub use memory::{ArrayReader, ArrayWriter, BufferReader, BufferWriter};
pub use payload::Payload;

//! Push side of the stream contract.

use async_trait::async_trait;

use crate::error::{BoxError, StreamError};
use crate::stop::StopHandle;

/// Output accumulated by an in-memory writer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Collected<T> {
    /// Values gathered by a sequence writer.
    Items(Vec<T>),
    /// Bytes gathered by a buffer writer.
    Bytes(Vec<u8>),
}

impl<T> Collected<T> {
    /// Returns the gathered values, if this is a sequence result.
    pub fn into_items(self) -> Option<Vec<T>> {
        match self {
            Self::Items(items) => Some(items),
            Self::Bytes(_) => None,
        }
    }

    /// Returns the gathered bytes, if this is a buffer result.
    pub fn into_bytes(self) -> Option<Vec<u8>> {
        match self {
            Self::Bytes(bytes) => Some(bytes),
            Self::Items(_) => None,
        }
    }
}

/// Sink accepting values one at a time.
///
/// `write` suspends until the value has been accepted. `end` writes the
/// end-of-sequence marker and closes the writer; after `end` or `stop`, no
/// value is accepted.
#[async_trait]
pub trait Writer<T: Send + 'static>: Send {
    /// Suspends until `value` has been accepted.
    ///
    /// Fails with [`StreamError::WriteAfterClose`] once the writer is ended.
    async fn write(&mut self, value: T) -> Result<(), StreamError>;

    /// Writes end-of-sequence and closes the writer. Idempotent.
    async fn end(&mut self) -> Result<(), StreamError>;

    /// Closes the writer and releases what it owns. Idempotent.
    async fn stop(&mut self, reason: Option<BoxError>);

    /// Handle that stops this writer from outside its flow of control.
    fn stop_handle(&self) -> StopHandle;

    /// Accumulated output, for writers that keep one.
    fn result(&mut self) -> Result<Option<Collected<T>>, StreamError> {
        Ok(None)
    }
}

/// Boxed writer for heterogeneous pipelines.
pub type BoxWriter<T> = Box<dyn Writer<T>>;

#[async_trait]
impl<T, W> Writer<T> for Box<W>
where
    T: Send + 'static,
    W: Writer<T> + ?Sized,
{
    async fn write(&mut self, value: T) -> Result<(), StreamError> {
        (**self).write(value).await
    }

    async fn end(&mut self) -> Result<(), StreamError> {
        (**self).end().await
    }

    async fn stop(&mut self, reason: Option<BoxError>) {
        (**self).stop(reason).await;
    }

    fn stop_handle(&self) -> StopHandle {
        (**self).stop_handle()
    }

    fn result(&mut self) -> Result<Option<Collected<T>>, StreamError> {
        (**self).result()
    }
}

//! Pull side of the stream contract.

use std::future::Future;

use async_trait::async_trait;

use crate::error::{BoxError, StreamError};
use crate::stop::StopHandle;
use crate::transform::{ChannelWriter, TransformReader};
use crate::writer::Writer;

/// Lazy source of values.
///
/// `read` returns `Ok(Some(value))` for each value in order and `Ok(None)`
/// once the sequence has ended. After end-of-sequence or `stop`, every later
/// `read` returns `Ok(None)`. A failure of the backing resource is returned
/// once, from the `read` during which it happened, and closes the reader.
/// Stopping a reader that already ended or failed changes nothing, even with
/// a reason.
#[async_trait]
pub trait Reader<T: Send + 'static>: Send {
    /// Suspends until the next value, end-of-sequence or a failure.
    async fn read(&mut self) -> Result<Option<T>, StreamError>;

    /// Closes the reader and releases what it owns.
    ///
    /// Idempotent. With a reason, the next `read` fails with
    /// [`StreamError::Cancelled`] carrying it.
    async fn stop(&mut self, reason: Option<BoxError>);

    /// Handle that stops this reader from outside its flow of control.
    fn stop_handle(&self) -> StopHandle;
}

/// Boxed reader for heterogeneous pipelines.
pub type BoxReader<T> = Box<dyn Reader<T>>;

#[async_trait]
impl<T, R> Reader<T> for Box<R>
where
    T: Send + 'static,
    R: Reader<T> + ?Sized,
{
    async fn read(&mut self) -> Result<Option<T>, StreamError> {
        (**self).read().await
    }

    async fn stop(&mut self, reason: Option<BoxError>) {
        (**self).stop(reason).await;
    }

    fn stop_handle(&self) -> StopHandle {
        (**self).stop_handle()
    }
}

/// Combinators available on every sized reader.
pub trait ReaderExt<T: Send + 'static>: Reader<T> + Sized + 'static {
    /// Derives a reader whose values are written by `producer`.
    ///
    /// `producer` receives this reader and the writer feeding the derived
    /// reader. It runs on its own task from the first `read` on; see
    /// [`TransformReader`].
    fn transform<U, F, Fut>(self, producer: F) -> TransformReader<U>
    where
        U: Send + 'static,
        F: FnOnce(Self, ChannelWriter<U>) -> Fut + Send + 'static,
        Fut: Future<Output = Result<(), StreamError>> + Send + 'static,
    {
        TransformReader::new::<T, Self, F, Fut>(self, producer)
    }

    /// Derives a reader applying `f` to every value.
    fn map<U, F>(self, mut f: F) -> TransformReader<U>
    where
        U: Send + 'static,
        F: FnMut(T) -> U + Send + 'static,
    {
        self.transform(move |mut source, mut sink| async move {
            while let Some(value) = source.read().await? {
                sink.write(f(value)).await?;
            }
            Ok(())
        })
    }

    /// Reads every remaining value into a vector.
    fn to_vec(mut self) -> impl Future<Output = Result<Vec<T>, StreamError>> + Send {
        async move {
            let mut values = Vec::new();
            while let Some(value) = self.read().await? {
                values.push(value);
            }
            Ok(values)
        }
    }

    /// Copies every value into `writer`, then ends it.
    ///
    /// When either side fails, the other one is stopped and the error is
    /// returned. On success the writer is handed back so its result can be
    /// inspected.
    fn pipe<W>(mut self, mut writer: W) -> impl Future<Output = Result<W, StreamError>> + Send
    where
        W: Writer<T>,
    {
        async move {
            loop {
                let value = match self.read().await {
                    Ok(Some(value)) => value,
                    Ok(None) => break,
                    Err(err) => {
                        writer.stop(None).await;
                        return Err(err);
                    }
                };
                if let Err(err) = writer.write(value).await {
                    self.stop(None).await;
                    return Err(err);
                }
            }
            writer.end().await?;
            Ok(writer)
        }
    }

    /// Boxes the reader.
    fn boxed(self) -> BoxReader<T> {
        Box::new(self)
    }
}

impl<T: Send + 'static, R: Reader<T> + Sized + 'static> ReaderExt<T> for R {}

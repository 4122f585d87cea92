//! Writer shared by several producers.

use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::error::{BoxError, StreamError};
use crate::stop::StopHandle;
use crate::writer::{Collected, Writer};

/// Cloneable wrapper that serializes access to one writer.
///
/// Each clone can be moved to a different producer task. Writes go through an
/// async mutex held for the whole `write`, so at most one write is in flight
/// and values from one producer are never interleaved inside another's write.
///
/// Stopping any clone, or the wrapped writer's [`StopHandle`], wakes every
/// clone waiting for the lock as well as the one holding it.
pub struct SharedWriter<T, W> {
    inner: Arc<Mutex<W>>,
    stop: StopHandle,
    _marker: PhantomData<fn(T)>,
}

impl<T: Send + 'static, W: Writer<T>> SharedWriter<T, W> {
    /// Wraps `writer`.
    pub fn new(writer: W) -> Self {
        let stop = writer.stop_handle();
        Self {
            inner: Arc::new(Mutex::new(writer)),
            stop,
            _marker: PhantomData,
        }
    }

    /// Returns the wrapped writer if this is the last clone.
    pub fn try_unwrap(self) -> Result<W, Self> {
        let stop = self.stop;
        Arc::try_unwrap(self.inner)
            .map(Mutex::into_inner)
            .map_err(|inner| Self {
                inner,
                stop,
                _marker: PhantomData,
            })
    }
}

impl<T, W> Clone for SharedWriter<T, W> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            stop: self.stop.clone(),
            _marker: PhantomData,
        }
    }
}

#[async_trait]
impl<T: Send + 'static, W: Writer<T>> Writer<T> for SharedWriter<T, W> {
    async fn write(&mut self, value: T) -> Result<(), StreamError> {
        if self.stop.is_stopped() {
            return Err(self.stop.write_error());
        }
        let stop = self.stop.clone();
        let inner = Arc::clone(&self.inner);
        tokio::select! {
            biased;
            () = stop.stopped() => Err(stop.write_error()),
            written = async move { inner.lock().await.write(value).await } => written,
        }
    }

    async fn end(&mut self) -> Result<(), StreamError> {
        if self.stop.is_stopped() {
            return Ok(());
        }
        let stop = self.stop.clone();
        let inner = Arc::clone(&self.inner);
        tokio::select! {
            biased;
            () = stop.stopped() => Ok(()),
            ended = async move { inner.lock().await.end().await } => ended,
        }
    }

    async fn stop(&mut self, reason: Option<BoxError>) {
        // Wakes a write blocked while holding the lock.
        self.stop.stop(reason);
        self.inner.lock().await.stop(None).await;
    }

    fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    /// Result of the wrapped writer.
    ///
    /// Returns `Ok(None)` while another clone is inside `write` or `end`;
    /// read it once every producer has finished.
    fn result(&mut self) -> Result<Option<Collected<T>>, StreamError> {
        match self.inner.try_lock() {
            Ok(mut writer) => writer.result(),
            Err(_) => Ok(None),
        }
    }
}

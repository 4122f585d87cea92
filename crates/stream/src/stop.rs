//! Cooperative cancellation shared between a stream and its callers.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio_util::sync::CancellationToken;

use crate::error::{BoxError, StreamError};

/// Cloneable stop handle for a reader or writer.
///
/// Stopping is idempotent: the first call marks the handle stopped and keeps
/// its reason, later calls are ignored. Every clone observes the same state,
/// so a handle taken with `stop_handle()` can cancel a stream from another
/// task while that stream is blocked in `read` or `write`.
///
/// Handles can be [linked](Self::link): stopping this handle then stops the
/// linked ones too (without a reason). Derived readers link themselves to
/// their upstream this way.
#[derive(Clone, Default)]
pub struct StopHandle {
    inner: Arc<StopInner>,
}

#[derive(Default)]
struct StopInner {
    token: CancellationToken,
    reason: Mutex<Option<BoxError>>,
    linked: Mutex<Vec<StopHandle>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl StopHandle {
    /// Creates a handle that is not stopped.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stops the handle, keeping `reason` if this is the first stop.
    ///
    /// Returns `true` when this call performed the stop.
    pub fn stop(&self, reason: Option<BoxError>) -> bool {
        if !self.cancel(reason) {
            return false;
        }
        logging::trace_stop!("stop handle cancelled");
        self.stop_linked();
        true
    }

    /// Marks the stream closed after it reported end-of-sequence or a failure.
    ///
    /// A closed handle behaves as if stopped without a reason, and a reason
    /// passed to a later [`stop`](Self::stop) is discarded. Linked handles
    /// are stopped. Returns `true` when this call closed the handle.
    pub fn close(&self) -> bool {
        if !self.cancel(None) {
            return false;
        }
        logging::trace_stream!("stream closed");
        self.stop_linked();
        true
    }

    fn cancel(&self, reason: Option<BoxError>) -> bool {
        let mut slot = lock(&self.inner.reason);
        if self.inner.token.is_cancelled() {
            return false;
        }
        *slot = reason;
        self.inner.token.cancel();
        true
    }

    fn stop_linked(&self) {
        let linked = std::mem::take(&mut *lock(&self.inner.linked));
        for handle in linked {
            handle.stop(None);
        }
    }

    /// Returns `true` once the handle has been stopped.
    #[must_use]
    pub fn is_stopped(&self) -> bool {
        self.inner.token.is_cancelled()
    }

    /// Completes when the handle is stopped.
    pub async fn stopped(&self) {
        self.inner.token.cancelled().await;
    }

    /// Takes the stop reason, leaving `None` behind.
    pub fn take_reason(&self) -> Option<BoxError> {
        lock(&self.inner.reason).take()
    }

    /// Stops `other` whenever this handle stops.
    ///
    /// If this handle is already stopped, `other` is stopped immediately.
    pub fn link(&self, other: Self) {
        if Arc::ptr_eq(&self.inner, &other.inner) {
            return;
        }
        let mut linked = lock(&self.inner.linked);
        if self.inner.token.is_cancelled() {
            drop(linked);
            other.stop(None);
        } else {
            linked.push(other);
        }
    }

    /// Result for a `read` on a stopped stream.
    ///
    /// The first call after a stop with a reason reports
    /// [`StreamError::Cancelled`] carrying it; every other call is
    /// end-of-sequence.
    pub fn read_result<T>(&self) -> Result<Option<T>, StreamError> {
        match self.take_reason() {
            Some(reason) => Err(StreamError::Cancelled {
                reason: Some(reason),
            }),
            None => Ok(None),
        }
    }

    /// Error for a `write` on a stopped stream.
    pub fn write_error(&self) -> StreamError {
        StreamError::Cancelled {
            reason: self.take_reason(),
        }
    }
}

impl fmt::Debug for StopHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StopHandle")
            .field("stopped", &self.is_stopped())
            .finish()
    }
}

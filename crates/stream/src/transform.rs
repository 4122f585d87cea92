//! Transform engine: derived readers fed by a producer task.
//!
//! [`TransformReader`] owns a producer closure and the upstream reader it
//! consumes. On the first `read` the engine spawns the producer on its own
//! tokio task and connects it to the consumer through a bounded channel of
//! capacity one, so the producer is suspended in `write` until the consumer
//! takes the previous value.
//!
//! # Termination
//!
//! - A producer returning `Ok(())`, or a stop without a reason, closes the
//!   sequence.
//! - A producer returning any other error delivers that error to the
//!   consumer's next `read`; every later `read` is end-of-sequence.
//! - A panicking producer is reported as [`StreamError::Upstream`].
//!
//! # Cancellation
//!
//! The derived reader and the [`ChannelWriter`] handed to the producer share
//! one [`StopHandle`], linked to the upstream reader's handle. Stopping the
//! derived reader aborts the producer task and waits for it, so the upstream
//! reader has been dropped by the time `stop` returns.

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::error::{BoxError, StreamError};
use crate::reader::Reader;
use crate::stop::StopHandle;
use crate::writer::Writer;

/// Channel capacity between producer and consumer.
pub const TRANSFORM_CHANNEL_CAPACITY: usize = 1;

enum Frame<U> {
    Item(U),
    End,
    Failed(StreamError),
}

type Launch<U> =
    Box<dyn FnOnce(mpsc::Sender<Frame<U>>, StopHandle, Arc<AtomicBool>) -> JoinHandle<()> + Send>;

enum State<U> {
    Idle(Launch<U>),
    Running {
        rx: mpsc::Receiver<Frame<U>>,
        task: JoinHandle<()>,
    },
    Done,
}

/// Reader whose values come from a producer task.
///
/// Built by [`ReaderExt::transform`](crate::ReaderExt::transform) or
/// [`TransformReader::new`].
pub struct TransformReader<U> {
    state: State<U>,
    stop: StopHandle,
}

impl<U: Send + 'static> TransformReader<U> {
    /// Creates a derived reader over `source`.
    ///
    /// `producer` receives the upstream reader and the internal writer. It is
    /// not invoked until the first `read`.
    pub fn new<T, R, F, Fut>(source: R, producer: F) -> Self
    where
        T: Send + 'static,
        R: Reader<T> + 'static,
        F: FnOnce(R, ChannelWriter<U>) -> Fut + Send + 'static,
        Fut: Future<Output = Result<(), StreamError>> + Send + 'static,
    {
        let stop = StopHandle::new();
        stop.link(source.stop_handle());

        let launch: Launch<U> = Box::new(move |tx, stop, ended| {
            tokio::spawn(run_producer::<T, R, F, Fut, U>(
                source, producer, tx, stop, ended,
            ))
        });

        Self {
            state: State::Idle(launch),
            stop,
        }
    }

    fn ensure_started(&mut self) {
        let state = std::mem::replace(&mut self.state, State::Done);
        self.state = match state {
            State::Idle(launch) => {
                let (tx, rx) = mpsc::channel(TRANSFORM_CHANNEL_CAPACITY);
                logging::trace_transform!("starting producer");
                let task = launch(tx, self.stop.clone(), Arc::new(AtomicBool::new(false)));
                State::Running { rx, task }
            }
            other => other,
        };
    }

    /// Aborts the producer, if any, and waits for it to finish.
    async fn shutdown(&mut self) {
        if let State::Running { rx, task } = std::mem::replace(&mut self.state, State::Done) {
            drop(rx);
            task.abort();
            let _ = task.await;
            logging::trace_transform!("producer shut down");
        }
    }

    /// Releases the channel once the producer has delivered its last frame
    /// and marks the reader closed.
    ///
    /// The producer task is detached, not aborted, so it can finish on its own.
    fn finish(&mut self) {
        self.state = State::Done;
        self.stop.close();
    }

    /// Handles a channel that closed without an end frame.
    async fn closed_without_end(&mut self) -> Result<Option<U>, StreamError> {
        let mut panicked = false;
        if let State::Running { task, .. } = std::mem::replace(&mut self.state, State::Done) {
            panicked = task.await.is_err_and(|err| err.is_panic());
        }
        let result = if panicked {
            Err(StreamError::upstream("transform producer panicked"))
        } else {
            self.stop.read_result()
        };
        self.stop.close();
        result
    }
}

async fn run_producer<T, R, F, Fut, U>(
    source: R,
    producer: F,
    tx: mpsc::Sender<Frame<U>>,
    stop: StopHandle,
    ended: Arc<AtomicBool>,
) where
    T: Send + 'static,
    R: Reader<T>,
    F: FnOnce(R, ChannelWriter<U>) -> Fut,
    Fut: Future<Output = Result<(), StreamError>>,
    U: Send + 'static,
{
    let sink = ChannelWriter {
        tx: Some(tx.clone()),
        stop,
        ended: Arc::clone(&ended),
    };
    let frame = match producer(source, sink).await {
        Ok(()) => Frame::End,
        Err(err) if err.is_quiet_stop() => Frame::End,
        Err(err) => {
            logging::trace_transform!(error = %err, "producer failed");
            Frame::Failed(err)
        }
    };
    if matches!(frame, Frame::End) && ended.load(Ordering::Acquire) {
        return;
    }
    // The consumer may already be gone.
    let _ = tx.send(frame).await;
}

#[async_trait]
impl<U: Send + 'static> Reader<U> for TransformReader<U> {
    async fn read(&mut self) -> Result<Option<U>, StreamError> {
        if self.stop.is_stopped() {
            self.shutdown().await;
            return self.stop.read_result();
        }
        self.ensure_started();

        let State::Running { rx, .. } = &mut self.state else {
            return Ok(None);
        };
        let frame = tokio::select! {
            biased;
            () = self.stop.stopped() => None,
            frame = rx.recv() => Some(frame),
        };

        match frame {
            None => {
                self.shutdown().await;
                self.stop.read_result()
            }
            Some(Some(Frame::Item(value))) => Ok(Some(value)),
            Some(Some(Frame::End)) => {
                self.finish();
                Ok(None)
            }
            Some(Some(Frame::Failed(err))) => {
                self.finish();
                Err(err)
            }
            Some(None) => self.closed_without_end().await,
        }
    }

    async fn stop(&mut self, reason: Option<BoxError>) {
        self.stop.stop(reason);
        self.shutdown().await;
    }

    fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }
}

impl<U> Drop for TransformReader<U> {
    fn drop(&mut self) {
        if let State::Running { task, .. } = &self.state {
            task.abort();
        }
    }
}

/// Writer handed to a transform producer.
///
/// Each `write` suspends until the consumer has room for the value. Once the
/// consumer is stopped or dropped, `write` fails with a quiet
/// [`StreamError::Cancelled`], which the producer can propagate with `?`.
pub struct ChannelWriter<U> {
    tx: Option<mpsc::Sender<Frame<U>>>,
    stop: StopHandle,
    ended: Arc<AtomicBool>,
}

const fn quiet_stop() -> StreamError {
    StreamError::Cancelled { reason: None }
}

#[async_trait]
impl<U: Send + 'static> Writer<U> for ChannelWriter<U> {
    async fn write(&mut self, value: U) -> Result<(), StreamError> {
        let Some(tx) = &self.tx else {
            return Err(StreamError::WriteAfterClose);
        };
        if self.stop.is_stopped() {
            return Err(quiet_stop());
        }
        tokio::select! {
            biased;
            () = self.stop.stopped() => Err(quiet_stop()),
            sent = tx.send(Frame::Item(value)) => sent.map_err(|_| quiet_stop()),
        }
    }

    async fn end(&mut self) -> Result<(), StreamError> {
        if let Some(tx) = self.tx.take() {
            self.ended.store(true, Ordering::Release);
            logging::trace_stream!("producer ended the sequence");
            tokio::select! {
                biased;
                () = self.stop.stopped() => {}
                _ = tx.send(Frame::End) => {}
            }
        }
        Ok(())
    }

    async fn stop(&mut self, reason: Option<BoxError>) {
        self.tx = None;
        self.stop.stop(reason);
    }

    fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }
}

//! Readers and writers that construct their device stream on first use.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use stream::{BoxError, BoxReader, BoxWriter, Collected, Reader, StopHandle, StreamError, Writer};

use crate::device::Device;

/// Two-phase delegate slot.
enum Slot<D> {
    Pending,
    Ready(D),
    Failed,
}

impl<D> Slot<D> {
    const fn is_pending(&self) -> bool {
        matches!(self, Self::Pending)
    }
}

/// Builds the delegate held by `slot` if it has not been attempted yet.
///
/// A construction failure is returned once; afterwards the slot reports
/// `Ok(None)`.
fn delegate<'a, D>(
    slot: &'a mut Slot<D>,
    stop: &StopHandle,
    build: impl FnOnce() -> Result<D, StreamError>,
    handle: impl Fn(&D) -> StopHandle,
) -> Result<Option<&'a mut D>, StreamError> {
    if slot.is_pending() {
        match build() {
            Ok(built) => {
                stop.link(handle(&built));
                logging::trace_device!("delegate constructed");
                *slot = Slot::Ready(built);
            }
            Err(err) => {
                *slot = Slot::Failed;
                return Err(err);
            }
        }
    }
    match slot {
        Slot::Ready(delegate) => Ok(Some(delegate)),
        Slot::Pending | Slot::Failed => Ok(None),
    }
}

/// Reader over a device, constructed on the first `read` or `stop`.
pub struct LazyReader<T: Send + 'static> {
    device: Arc<dyn Device<T>>,
    slot: Slot<BoxReader<T>>,
    stop: StopHandle,
}

impl<T: Send + 'static> LazyReader<T> {
    /// Wraps `device`; nothing is constructed yet.
    pub fn new(device: Arc<dyn Device<T>>) -> Self {
        Self {
            device,
            slot: Slot::Pending,
            stop: StopHandle::new(),
        }
    }

    /// Returns `true` once the delegate reader has been built.
    pub fn is_constructed(&self) -> bool {
        matches!(self.slot, Slot::Ready(_))
    }

    fn delegate(&mut self) -> Result<Option<&mut BoxReader<T>>, StreamError> {
        let device = &self.device;
        delegate(
            &mut self.slot,
            &self.stop,
            || device.reader(),
            |reader| reader.stop_handle(),
        )
    }
}

#[async_trait]
impl<T: Send + 'static> Reader<T> for LazyReader<T> {
    async fn read(&mut self) -> Result<Option<T>, StreamError> {
        if self.stop.is_stopped() {
            return self.stop.read_result();
        }
        let stop = self.stop.clone();
        let outcome = match self.delegate() {
            Ok(Some(reader)) => {
                let outcome = tokio::select! {
                    biased;
                    () = stop.stopped() => None,
                    item = reader.read() => Some(item),
                };
                if outcome.is_none() {
                    reader.stop(None).await;
                }
                outcome
            }
            Ok(None) => Some(Ok(None)),
            Err(err) => Some(Err(err)),
        };

        match outcome {
            None => stop.read_result(),
            Some(Ok(Some(value))) => Ok(Some(value)),
            Some(ended) => {
                stop.close();
                ended
            }
        }
    }

    async fn stop(&mut self, reason: Option<BoxError>) {
        if let Ok(Some(reader)) = self.delegate() {
            reader.stop(None).await;
        }
        self.stop.stop(reason);
    }

    fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }
}

impl<T: Send + 'static> fmt::Debug for LazyReader<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LazyReader")
            .field("constructed", &self.is_constructed())
            .field("stop", &self.stop)
            .finish_non_exhaustive()
    }
}

/// Writer into a device, constructed on the first `write`, `end`, `stop` or
/// `result`.
pub struct LazyWriter<T: Send + 'static> {
    device: Arc<dyn Device<T>>,
    slot: Slot<BoxWriter<T>>,
    stop: StopHandle,
}

impl<T: Send + 'static> LazyWriter<T> {
    /// Wraps `device`; nothing is constructed yet.
    pub fn new(device: Arc<dyn Device<T>>) -> Self {
        Self {
            device,
            slot: Slot::Pending,
            stop: StopHandle::new(),
        }
    }

    /// Returns `true` once the delegate writer has been built.
    pub fn is_constructed(&self) -> bool {
        matches!(self.slot, Slot::Ready(_))
    }

    fn delegate(&mut self) -> Result<Option<&mut BoxWriter<T>>, StreamError> {
        let device = &self.device;
        delegate(
            &mut self.slot,
            &self.stop,
            || device.writer(),
            |writer| writer.stop_handle(),
        )
    }
}

#[async_trait]
impl<T: Send + 'static> Writer<T> for LazyWriter<T> {
    async fn write(&mut self, value: T) -> Result<(), StreamError> {
        if self.stop.is_stopped() {
            return Err(self.stop.write_error());
        }
        match self.delegate()? {
            Some(writer) => writer.write(value).await,
            None => Err(StreamError::WriteAfterClose),
        }
    }

    async fn end(&mut self) -> Result<(), StreamError> {
        if self.stop.is_stopped() {
            return Ok(());
        }
        match self.delegate()? {
            Some(writer) => writer.end().await,
            None => Ok(()),
        }
    }

    async fn stop(&mut self, reason: Option<BoxError>) {
        if let Ok(Some(writer)) = self.delegate() {
            writer.stop(None).await;
        }
        self.stop.stop(reason);
    }

    fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    fn result(&mut self) -> Result<Option<Collected<T>>, StreamError> {
        match self.delegate()? {
            Some(writer) => writer.result(),
            None => Ok(None),
        }
    }
}

impl<T: Send + 'static> fmt::Debug for LazyWriter<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LazyWriter")
            .field("constructed", &self.is_constructed())
            .field("stop", &self.stop)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{ArrayReader, ArrayWriter};
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::time::Duration;

    /// Reader that never produces a value.
    struct Silent {
        stopped: Arc<AtomicBool>,
        stop: StopHandle,
    }

    #[async_trait]
    impl Reader<u32> for Silent {
        async fn read(&mut self) -> Result<Option<u32>, StreamError> {
            std::future::pending().await
        }

        async fn stop(&mut self, reason: Option<BoxError>) {
            self.stopped.store(true, Ordering::SeqCst);
            self.stop.stop(reason);
        }

        fn stop_handle(&self) -> StopHandle {
            self.stop.clone()
        }
    }

    #[derive(Default)]
    struct SilentDevice {
        stopped: Arc<AtomicBool>,
    }

    impl Device<u32> for SilentDevice {
        fn reader(&self) -> Result<BoxReader<u32>, StreamError> {
            Ok(Box::new(Silent {
                stopped: Arc::clone(&self.stopped),
                stop: StopHandle::new(),
            }))
        }

        fn writer(&self) -> Result<BoxWriter<u32>, StreamError> {
            Ok(Box::new(ArrayWriter::new()))
        }
    }

    #[derive(Default)]
    struct Counting {
        readers: AtomicUsize,
        writers: AtomicUsize,
        fail: bool,
    }

    impl Device<u32> for Counting {
        fn reader(&self) -> Result<BoxReader<u32>, StreamError> {
            self.readers.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(StreamError::upstream("no such device"));
            }
            Ok(Box::new(ArrayReader::new(vec![7, 8])))
        }

        fn writer(&self) -> Result<BoxWriter<u32>, StreamError> {
            self.writers.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(StreamError::upstream("no such device"));
            }
            Ok(Box::new(ArrayWriter::new()))
        }
    }

    #[tokio::test]
    async fn reader_constructs_once_on_first_read() {
        let device = Arc::new(Counting::default());
        let mut reader = LazyReader::new(device.clone() as Arc<dyn Device<u32>>);
        assert!(!reader.is_constructed());
        assert_eq!(device.readers.load(Ordering::SeqCst), 0);

        assert_eq!(reader.read().await.expect("read"), Some(7));
        assert_eq!(reader.read().await.expect("read"), Some(8));
        assert_eq!(reader.read().await.expect("read"), None);
        assert_eq!(device.readers.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn stop_constructs_then_stops_unused_delegate() {
        let device = Arc::new(Counting::default());
        let mut reader = LazyReader::new(device.clone() as Arc<dyn Device<u32>>);
        reader.stop(None).await;
        reader.stop(None).await;
        assert!(reader.is_constructed());
        assert_eq!(device.readers.load(Ordering::SeqCst), 1);
        assert_eq!(reader.read().await.expect("stopped"), None);
    }

    #[tokio::test]
    async fn external_stop_wakes_pending_read_with_reason() {
        let device = Arc::new(SilentDevice::default());
        let mut reader = LazyReader::new(device.clone() as Arc<dyn Device<u32>>);
        let handle = reader.stop_handle();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            handle.stop(Some("abort".into()));
        });

        let first = tokio::time::timeout(Duration::from_secs(1), reader.read())
            .await
            .expect("read resolves");
        let err = first.expect_err("reason surfaces");
        assert_eq!(err.to_string(), "stopped: abort");
        assert!(device.stopped.load(Ordering::SeqCst));
        assert_eq!(reader.read().await.expect("stopped"), None);
        assert_eq!(reader.read().await.expect("stopped"), None);
    }

    #[tokio::test]
    async fn external_stop_without_reason_ends_pending_read() {
        let device = Arc::new(SilentDevice::default());
        let mut reader = LazyReader::new(device as Arc<dyn Device<u32>>);
        let handle = reader.stop_handle();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            handle.stop(None);
        });

        let first = tokio::time::timeout(Duration::from_secs(1), reader.read())
            .await
            .expect("read resolves");
        assert_eq!(first.expect("quiet stop"), None);
    }

    #[tokio::test]
    async fn stop_after_end_keeps_end() {
        let device = Arc::new(Counting::default());
        let mut reader = LazyReader::new(device as Arc<dyn Device<u32>>);
        assert_eq!(reader.read().await.expect("read"), Some(7));
        assert_eq!(reader.read().await.expect("read"), Some(8));
        assert_eq!(reader.read().await.expect("read"), None);

        reader.stop_handle().stop(Some("late".into()));
        assert_eq!(reader.read().await.expect("read"), None);
        reader.stop(Some("later".into())).await;
        assert_eq!(reader.read().await.expect("read"), None);
    }

    #[tokio::test]
    async fn construction_failure_reported_once() {
        let device = Arc::new(Counting {
            fail: true,
            ..Counting::default()
        });
        let mut reader = LazyReader::new(device.clone() as Arc<dyn Device<u32>>);
        let err = reader.read().await.expect_err("construction fails");
        assert_eq!(err.to_string(), "no such device");
        assert_eq!(reader.read().await.expect("closed"), None);
        assert_eq!(device.readers.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn writer_result_forces_construction() {
        let device = Arc::new(Counting::default());
        let mut writer = LazyWriter::new(device.clone() as Arc<dyn Device<u32>>);
        let collected = writer.result().expect("result");
        assert_eq!(collected, Some(Collected::Items(Vec::new())));
        assert_eq!(device.writers.load(Ordering::SeqCst), 1);

        writer.write(3).await.expect("write");
        writer.end().await.expect("end");
        let collected = writer.result().expect("result").and_then(Collected::into_items);
        assert_eq!(collected, Some(vec![3]));
        assert_eq!(device.writers.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn stopping_wrapper_stops_delegate() {
        let device = Arc::new(Counting::default());
        let mut writer = LazyWriter::new(device as Arc<dyn Device<u32>>);
        writer.write(1).await.expect("write");
        writer.stop(Some("user abort".into())).await;
        let err = writer.write(2).await.expect_err("stopped");
        assert_eq!(err.to_string(), "stopped: user abort");
    }
}

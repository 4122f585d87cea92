//! In-memory devices backed by sequences and byte buffers.

use std::collections::VecDeque;
use std::marker::PhantomData;

use async_trait::async_trait;
use stream::{BoxError, Collected, Reader, StopHandle, StreamError, Writer};

use crate::payload::Payload;

/// Reader yielding the elements of a sequence in order.
#[derive(Debug)]
pub struct ArrayReader<T> {
    items: VecDeque<T>,
    stop: StopHandle,
}

impl<T> ArrayReader<T> {
    /// Creates a reader over `items`.
    pub fn new(items: Vec<T>) -> Self {
        Self {
            items: items.into(),
            stop: StopHandle::new(),
        }
    }
}

#[async_trait]
impl<T: Send + 'static> Reader<T> for ArrayReader<T> {
    async fn read(&mut self) -> Result<Option<T>, StreamError> {
        if self.stop.is_stopped() {
            self.items.clear();
            return self.stop.read_result();
        }
        let item = self.items.pop_front();
        if item.is_none() {
            self.stop.close();
        }
        Ok(item)
    }

    async fn stop(&mut self, reason: Option<BoxError>) {
        self.stop.stop(reason);
        self.items.clear();
    }

    fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }
}

/// Writer collecting values into a fresh sequence.
#[derive(Debug)]
pub struct ArrayWriter<T> {
    items: Vec<T>,
    ended: bool,
    stop: StopHandle,
}

impl<T> Default for ArrayWriter<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            ended: false,
            stop: StopHandle::new(),
        }
    }
}

impl<T> ArrayWriter<T> {
    /// Creates an empty writer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Values written so far.
    pub fn items(&self) -> &[T] {
        &self.items
    }
}

/// Shared write checks for the in-memory writers.
fn check_open(ended: bool, stop: &StopHandle) -> Result<(), StreamError> {
    if ended {
        return Err(StreamError::WriteAfterClose);
    }
    if stop.is_stopped() {
        return Err(stop.write_error());
    }
    Ok(())
}

#[async_trait]
impl<T: Clone + Send + 'static> Writer<T> for ArrayWriter<T> {
    async fn write(&mut self, value: T) -> Result<(), StreamError> {
        check_open(self.ended, &self.stop)?;
        self.items.push(value);
        Ok(())
    }

    async fn end(&mut self) -> Result<(), StreamError> {
        self.ended = true;
        Ok(())
    }

    async fn stop(&mut self, reason: Option<BoxError>) {
        self.stop.stop(reason);
    }

    fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    fn result(&mut self) -> Result<Option<Collected<T>>, StreamError> {
        Ok(Some(Collected::Items(self.items.clone())))
    }
}

/// Reader yielding a byte buffer as a single chunk.
///
/// An empty buffer yields nothing.
#[derive(Debug)]
pub struct BufferReader<T> {
    chunk: Option<Vec<u8>>,
    stop: StopHandle,
    _marker: PhantomData<fn() -> T>,
}

impl<T> BufferReader<T> {
    /// Creates a reader over `bytes`.
    pub fn new(bytes: Vec<u8>) -> Self {
        Self {
            chunk: Some(bytes).filter(|bytes| !bytes.is_empty()),
            stop: StopHandle::new(),
            _marker: PhantomData,
        }
    }
}

#[async_trait]
impl<T: Payload> Reader<T> for BufferReader<T> {
    async fn read(&mut self) -> Result<Option<T>, StreamError> {
        if self.stop.is_stopped() {
            self.chunk = None;
            return self.stop.read_result();
        }
        match self.chunk.take() {
            Some(bytes) => T::from_bytes(bytes).map(Some).inspect_err(|_| {
                self.stop.close();
            }),
            None => {
                self.stop.close();
                Ok(None)
            }
        }
    }

    async fn stop(&mut self, reason: Option<BoxError>) {
        self.stop.stop(reason);
        self.chunk = None;
    }

    fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }
}

/// Writer concatenating payload bytes into a fresh buffer.
#[derive(Debug)]
pub struct BufferWriter<T> {
    bytes: Vec<u8>,
    ended: bool,
    stop: StopHandle,
    _marker: PhantomData<fn(T)>,
}

impl<T> Default for BufferWriter<T> {
    fn default() -> Self {
        Self {
            bytes: Vec::new(),
            ended: false,
            stop: StopHandle::new(),
            _marker: PhantomData,
        }
    }
}

impl<T> BufferWriter<T> {
    /// Creates an empty writer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Bytes written so far.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }
}

#[async_trait]
impl<T: Payload> Writer<T> for BufferWriter<T> {
    async fn write(&mut self, value: T) -> Result<(), StreamError> {
        check_open(self.ended, &self.stop)?;
        self.bytes.extend(value.into_bytes()?);
        Ok(())
    }

    async fn end(&mut self) -> Result<(), StreamError> {
        self.ended = true;
        Ok(())
    }

    async fn stop(&mut self, reason: Option<BoxError>) {
        self.stop.stop(reason);
    }

    fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    fn result(&mut self) -> Result<Option<Collected<T>>, StreamError> {
        Ok(Some(Collected::Bytes(self.bytes.clone())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use stream::ReaderExt;

    #[tokio::test]
    async fn array_reader_yields_in_order_then_end() {
        let mut reader = ArrayReader::new(vec!["a", "b"]);
        assert_eq!(reader.read().await.expect("read"), Some("a"));
        assert_eq!(reader.read().await.expect("read"), Some("b"));
        assert_eq!(reader.read().await.expect("read"), None);
        assert_eq!(reader.read().await.expect("read"), None);
    }

    #[tokio::test]
    async fn array_reader_stop_discards_remaining() {
        let mut reader = ArrayReader::new(vec![1, 2, 3]);
        assert_eq!(reader.read().await.expect("read"), Some(1));
        reader.stop(None).await;
        reader.stop(None).await;
        assert_eq!(reader.read().await.expect("read"), None);
    }

    #[tokio::test]
    async fn array_reader_stays_ended_after_late_stop() {
        let mut reader = ArrayReader::new(vec![1]);
        assert_eq!(reader.read().await.expect("read"), Some(1));
        assert_eq!(reader.read().await.expect("read"), None);

        reader.stop_handle().stop(Some("late".into()));
        assert_eq!(reader.read().await.expect("read"), None);
        reader.stop(Some("later".into())).await;
        assert_eq!(reader.read().await.expect("read"), None);
    }

    #[tokio::test]
    async fn array_writer_rejects_write_after_end() {
        let mut writer = ArrayWriter::new();
        writer.write(1).await.expect("write");
        writer.end().await.expect("end");
        writer.end().await.expect("end is idempotent");
        assert!(matches!(writer.write(2).await, Err(StreamError::WriteAfterClose)));
        assert_eq!(writer.items(), &[1]);
    }

    #[tokio::test]
    async fn stopped_writer_reports_reason_once() {
        let mut writer = ArrayWriter::<u8>::new();
        writer.stop(Some("cancelled by user".into())).await;
        let err = writer.write(1).await.expect_err("stopped");
        assert_eq!(err.to_string(), "stopped: cancelled by user");
        let err = writer.write(1).await.expect_err("still stopped");
        assert!(err.is_quiet_stop());
    }

    #[tokio::test]
    async fn buffer_reader_single_chunk() {
        let mut reader = BufferReader::<Vec<u8>>::new(b"payload".to_vec());
        assert_eq!(reader.read().await.expect("read"), Some(b"payload".to_vec()));
        assert_eq!(reader.read().await.expect("read"), None);
    }

    #[tokio::test]
    async fn empty_buffer_reader_yields_nothing() {
        let mut reader = BufferReader::<Vec<u8>>::new(Vec::new());
        assert_eq!(reader.read().await.expect("read"), None);

        reader.stop(Some("late".into())).await;
        assert_eq!(reader.read().await.expect("read"), None);
    }

    #[tokio::test]
    async fn buffer_writer_concatenates_strings() {
        let mut writer = BufferWriter::<String>::new();
        writer.write("ab".to_owned()).await.expect("write");
        writer.write("cd".to_owned()).await.expect("write");
        writer.end().await.expect("end");
        let collected = writer.result().expect("result").expect("bytes");
        assert_eq!(collected, Collected::Bytes(b"abcd".to_vec()));
    }

    proptest! {
        #[test]
        fn array_round_trip_preserves_order(items in proptest::collection::vec(any::<i64>(), 0..64)) {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .build()
                .expect("runtime");
            let expected = items.clone();
            let collected = runtime.block_on(async move {
                ArrayReader::new(items).pipe(ArrayWriter::new()).await
            });
            let mut writer = collected.expect("pipe");
            let result = writer.result().expect("result").and_then(Collected::into_items);
            prop_assert_eq!(result, Some(expected));
        }
    }
}

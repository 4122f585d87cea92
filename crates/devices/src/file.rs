//! File device: chunked reads and buffered writes through `tokio::fs`.

use std::io;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use stream::{BoxError, BoxReader, BoxWriter, Reader, StopHandle, StreamError, Writer};
use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncWriteExt};

use crate::device::Device;
use crate::payload::Payload;

/// Bytes requested from the file per read.
pub const DEFAULT_CHUNK_SIZE: usize = 64 * 1024;

/// I/O failure of a file device, with the path it happened on.
#[derive(Debug, thiserror::Error)]
#[error("{action} {}: {source}", .path.display())]
pub struct DeviceError {
    action: &'static str,
    path: PathBuf,
    #[source]
    source: io::Error,
}

impl DeviceError {
    /// Creates an error for `action` ("open", "read", ...) on `path`.
    pub fn new(action: &'static str, path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self {
            action,
            path: path.into(),
            source,
        }
    }

    /// Path the failure happened on.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Kind of the underlying I/O error.
    pub fn kind(&self) -> io::ErrorKind {
        self.source.kind()
    }
}

/// Maps I/O results to [`DeviceError`] with path context.
trait IoResultExt<T> {
    fn with_path(self, action: &'static str, path: &Path) -> Result<T, DeviceError>;
}

impl<T> IoResultExt<T> for io::Result<T> {
    fn with_path(self, action: &'static str, path: &Path) -> Result<T, DeviceError> {
        self.map_err(|source| DeviceError::new(action, path, source))
    }
}

/// Device reading and writing a file on the local filesystem.
#[derive(Clone, Debug)]
pub struct FileDevice {
    path: PathBuf,
    chunk_size: usize,
}

impl FileDevice {
    /// Creates a device for `path`. Nothing is opened yet.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }

    /// Overrides the read chunk size (minimum 1).
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    /// Path of the file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl<T: Payload> Device<T> for FileDevice {
    fn reader(&self) -> Result<BoxReader<T>, StreamError> {
        Ok(Box::new(FileReader::<T>::new(&self.path, self.chunk_size)))
    }

    fn writer(&self) -> Result<BoxWriter<T>, StreamError> {
        Ok(Box::new(FileWriter::<T>::new(&self.path)))
    }
}

enum ReadState {
    Unopened,
    Open(File),
    Closed,
}

/// Reader yielding a file's contents in chunks.
///
/// The file is opened on the first `read` and closed at end of file, on
/// failure or on `stop`.
pub struct FileReader<T> {
    path: PathBuf,
    chunk_size: usize,
    state: ReadState,
    pending: Vec<u8>,
    stop: StopHandle,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Payload> FileReader<T> {
    /// Creates a reader for `path`.
    pub fn new(path: impl Into<PathBuf>, chunk_size: usize) -> Self {
        Self {
            path: path.into(),
            chunk_size: chunk_size.max(1),
            state: ReadState::Unopened,
            pending: Vec::new(),
            stop: StopHandle::new(),
            _marker: PhantomData,
        }
    }

    /// Returns `true` while the file handle is held.
    pub fn is_open(&self) -> bool {
        matches!(self.state, ReadState::Open(_))
    }

    fn close(&mut self) {
        if !matches!(self.state, ReadState::Closed) {
            logging::trace_device!(path = %self.path.display(), "closing reader");
        }
        self.state = ReadState::Closed;
        self.pending = Vec::new();
        self.stop.close();
    }

    /// Next complete chunk, or `None` at end of file.
    async fn next_chunk(&mut self) -> Result<Option<Vec<u8>>, DeviceError> {
        if matches!(self.state, ReadState::Unopened) {
            let file = File::open(&self.path).await.with_path("open", &self.path)?;
            logging::trace_device!(path = %self.path.display(), "opened for reading");
            self.state = ReadState::Open(file);
        }

        loop {
            let ReadState::Open(file) = &mut self.state else {
                return Ok(None);
            };
            let start = self.pending.len();
            self.pending.resize(start + self.chunk_size, 0);
            let read = file
                .read(&mut self.pending[start..])
                .await
                .with_path("read", &self.path)?;
            self.pending.truncate(start + read);

            if read == 0 {
                self.close_file();
                if self.pending.is_empty() {
                    return Ok(None);
                }
                return Ok(Some(std::mem::take(&mut self.pending)));
            }

            let complete = T::complete_prefix(&self.pending);
            if complete > 0 {
                let rest = self.pending.split_off(complete);
                return Ok(Some(std::mem::replace(&mut self.pending, rest)));
            }
        }
    }

    fn close_file(&mut self) {
        self.state = ReadState::Closed;
    }
}

#[async_trait]
impl<T: Payload> Reader<T> for FileReader<T> {
    async fn read(&mut self) -> Result<Option<T>, StreamError> {
        if self.stop.is_stopped() {
            self.close();
            return self.stop.read_result();
        }

        let stop = self.stop.clone();
        let outcome = tokio::select! {
            biased;
            () = stop.stopped() => None,
            chunk = self.next_chunk() => Some(chunk),
        };

        match outcome {
            None => {
                self.close();
                stop.read_result()
            }
            Some(Ok(Some(bytes))) => T::from_bytes(bytes).map(Some).inspect_err(|_| self.close()),
            Some(Ok(None)) => {
                self.close();
                Ok(None)
            }
            Some(Err(err)) => {
                self.close();
                Err(StreamError::upstream(err))
            }
        }
    }

    async fn stop(&mut self, reason: Option<BoxError>) {
        self.stop.stop(reason);
        self.close();
    }

    fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }
}

enum WriteState {
    Unopened,
    Open(File),
    Closed,
}

/// Writer creating (or truncating) a file.
///
/// The file is created on the first `write`, or by `end` when nothing was
/// written, and flushed and closed by `end`.
pub struct FileWriter<T> {
    path: PathBuf,
    state: WriteState,
    ended: bool,
    stop: StopHandle,
    _marker: PhantomData<fn(T)>,
}

impl<T: Payload> FileWriter<T> {
    /// Creates a writer for `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            state: WriteState::Unopened,
            ended: false,
            stop: StopHandle::new(),
            _marker: PhantomData,
        }
    }

    async fn file(&mut self) -> Result<&mut File, DeviceError> {
        if matches!(self.state, WriteState::Unopened) {
            let file = File::create(&self.path).await.with_path("create", &self.path)?;
            logging::trace_device!(path = %self.path.display(), "created for writing");
            self.state = WriteState::Open(file);
        }
        match &mut self.state {
            WriteState::Open(file) => Ok(file),
            WriteState::Unopened | WriteState::Closed => Err(DeviceError::new(
                "write",
                &self.path,
                io::Error::from(io::ErrorKind::BrokenPipe),
            )),
        }
    }

    async fn write_bytes(&mut self, bytes: &[u8]) -> Result<(), DeviceError> {
        let path = self.path.clone();
        self.file()
            .await?
            .write_all(bytes)
            .await
            .with_path("write", &path)
    }

    async fn finish(&mut self) -> Result<(), DeviceError> {
        let path = self.path.clone();
        self.file().await?.flush().await.with_path("flush", &path)?;
        self.state = WriteState::Closed;
        logging::trace_device!(path = %path.display(), "closed writer");
        Ok(())
    }
}

#[async_trait]
impl<T: Payload> Writer<T> for FileWriter<T> {
    async fn write(&mut self, value: T) -> Result<(), StreamError> {
        if self.ended {
            return Err(StreamError::WriteAfterClose);
        }
        if self.stop.is_stopped() {
            self.state = WriteState::Closed;
            return Err(self.stop.write_error());
        }
        let bytes = value.into_bytes()?;

        let stop = self.stop.clone();
        tokio::select! {
            biased;
            () = stop.stopped() => {
                self.state = WriteState::Closed;
                Err(stop.write_error())
            }
            written = self.write_bytes(&bytes) => written.map_err(StreamError::upstream),
        }
    }

    async fn end(&mut self) -> Result<(), StreamError> {
        if self.ended || self.stop.is_stopped() {
            return Ok(());
        }
        self.ended = true;
        self.finish().await.map_err(StreamError::upstream)
    }

    async fn stop(&mut self, reason: Option<BoxError>) {
        self.stop.stop(reason);
        self.state = WriteState::Closed;
    }

    fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }
}

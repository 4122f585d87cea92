//! Always-empty reader, the seed for generators.

use std::marker::PhantomData;

use async_trait::async_trait;

use crate::error::{BoxError, StreamError};
use crate::reader::Reader;
use crate::stop::StopHandle;

/// Reader that yields nothing.
///
/// Generators such as directory listings transform it and ignore the source.
#[derive(Debug)]
pub struct EmptyReader<T> {
    stop: StopHandle,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Default for EmptyReader<T> {
    fn default() -> Self {
        Self {
            stop: StopHandle::new(),
            _marker: PhantomData,
        }
    }
}

/// Returns a new [`EmptyReader`].
#[must_use]
pub fn empty_reader<T>() -> EmptyReader<T> {
    EmptyReader::default()
}

#[async_trait]
impl<T: Send + 'static> Reader<T> for EmptyReader<T> {
    async fn read(&mut self) -> Result<Option<T>, StreamError> {
        self.stop.close();
        self.stop.read_result()
    }

    async fn stop(&mut self, reason: Option<BoxError>) {
        self.stop.stop(reason);
    }

    fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn stop_after_end_stays_ended() {
        let mut reader = empty_reader::<u8>();
        assert_eq!(reader.read().await.expect("read"), None);

        reader.stop_handle().stop(Some("late".into()));
        assert_eq!(reader.read().await.expect("read"), None);
    }

    #[tokio::test]
    async fn reason_before_first_read_is_reported() {
        let mut reader = empty_reader::<u8>();
        reader.stop(Some("early".into())).await;

        let err = reader.read().await.expect_err("reason surfaces");
        assert!(err.is_cancelled());
        assert_eq!(reader.read().await.expect("read"), None);
    }
}

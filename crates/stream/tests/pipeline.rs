//! Integration tests for composing readers, writers and transforms.

use std::io;
use std::time::Duration;

use async_trait::async_trait;
use stream::{
    BoxError, BoxReader, ChannelWriter, Collected, Reader, ReaderExt, SharedWriter, StopHandle,
    StreamError, Writer, empty_reader,
};

// ============================================================================
// Helper Types
// ============================================================================

/// Minimal in-memory writer used as a pipeline sink.
#[derive(Debug, Default)]
struct VecSink {
    values: Vec<u32>,
    ended: bool,
    stop: StopHandle,
}

#[async_trait]
impl Writer<u32> for VecSink {
    async fn write(&mut self, value: u32) -> Result<(), StreamError> {
        if self.ended {
            return Err(StreamError::WriteAfterClose);
        }
        if self.stop.is_stopped() {
            return Err(self.stop.write_error());
        }
        self.values.push(value);
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

    fn result(&mut self) -> Result<Option<Collected<u32>>, StreamError> {
        Ok(Some(Collected::Items(self.values.clone())))
    }
}

fn numbers(limit: u32) -> BoxReader<u32> {
    empty_reader::<()>()
        .transform(move |_, mut sink| async move {
            for value in 1..=limit {
                sink.write(value).await?;
            }
            Ok(())
        })
        .boxed()
}

// ============================================================================
// Failure Propagation Tests
// ============================================================================

/// Verifies value, value, error, then end-of-sequence.
#[tokio::test]
async fn producer_failure_after_two_values() {
    let mut reader = empty_reader::<()>().transform(|_, mut sink| async move {
        sink.write(1u32).await?;
        sink.write(2u32).await?;
        Err(StreamError::upstream(io::Error::other("disk on fire")))
    });

    assert_eq!(reader.read().await.expect("first"), Some(1));
    assert_eq!(reader.read().await.expect("second"), Some(2));
    let err = reader.read().await.expect_err("third read fails");
    assert_eq!(err.to_string(), "disk on fire");
    assert!(err.upstream_as::<io::Error>().is_some());
    assert_eq!(reader.read().await.expect("fourth"), None);
    assert_eq!(reader.read().await.expect("fifth"), None);
}

/// Verifies an upstream failure flows through a derived reader.
#[tokio::test]
async fn upstream_failure_flows_through_map() {
    let failing = empty_reader::<()>().transform(|_, mut sink| async move {
        sink.write(10u32).await?;
        Err(StreamError::upstream("source broke"))
    });
    let mut doubled = failing.map(|value| value * 2);

    assert_eq!(doubled.read().await.expect("value"), Some(20));
    let err = doubled.read().await.expect_err("failure");
    assert_eq!(err.to_string(), "source broke");
    assert_eq!(doubled.read().await.expect("closed"), None);
}

// ============================================================================
// Composition Tests
// ============================================================================

/// Verifies transforms chain and preserve order.
#[tokio::test]
async fn chained_transforms_preserve_order() {
    let evens = numbers(10).transform(|mut source, mut sink| async move {
        while let Some(value) = source.read().await? {
            if value % 2 == 0 {
                sink.write(value).await?;
            }
        }
        Ok(())
    });
    let values = evens.map(|value| value + 1).to_vec().await.expect("drain");
    assert_eq!(values, vec![3, 5, 7, 9, 11]);
}

/// Verifies pipe copies everything and ends the writer.
#[tokio::test]
async fn pipe_fills_writer() {
    let mut sink = numbers(4).pipe(VecSink::default()).await.expect("pipe");
    assert!(sink.ended);
    let collected = sink.result().expect("result").expect("collected");
    assert_eq!(collected.into_items(), Some(vec![1, 2, 3, 4]));
}

/// Verifies pipe stops the writer when the reader fails.
#[tokio::test]
async fn pipe_stops_writer_on_read_failure() {
    let failing = empty_reader::<()>().transform(|_, mut sink| async move {
        sink.write(1u32).await?;
        Err(StreamError::upstream("boom"))
    });
    let sink = VecSink::default();
    let sink_stop = sink.stop_handle();

    let err = failing.pipe(sink).await.err().expect("pipe fails");
    assert_eq!(err.to_string(), "boom");
    assert!(sink_stop.is_stopped());
}

/// Verifies a producer may interleave reads, writes and other awaits.
#[tokio::test]
async fn producer_interleaves_suspension_points() {
    let reader = numbers(3).transform(|mut source, mut sink| async move {
        while let Some(value) = source.read().await? {
            tokio::time::sleep(Duration::from_millis(1)).await;
            sink.write(value).await?;
            sink.write(value * 100).await?;
        }
        Ok(())
    });
    let values = reader.to_vec().await.expect("drain");
    assert_eq!(values, vec![1, 100, 2, 200, 3, 300]);
}

// ============================================================================
// Shared Writer Tests
// ============================================================================

/// Verifies several producers can feed one writer.
#[tokio::test]
async fn shared_writer_serializes_producers() {
    let shared = SharedWriter::new(VecSink::default());

    let mut tasks = Vec::new();
    for base in [0u32, 100, 200] {
        let mut writer = shared.clone();
        tasks.push(tokio::spawn(async move {
            for offset in 0..5 {
                writer.write(base + offset).await?;
                tokio::task::yield_now().await;
            }
            Ok::<(), StreamError>(())
        }));
    }
    for task in tasks {
        task.await.expect("join").expect("writes");
    }

    let mut sink = shared.try_unwrap().ok().expect("last clone");
    let mut values = sink
        .result()
        .expect("result")
        .and_then(Collected::into_items)
        .expect("items");
    assert_eq!(values.len(), 15);

    for base in [0u32, 100, 200] {
        let from_base: Vec<u32> = values
            .iter()
            .copied()
            .filter(|value| (base..base + 5).contains(value))
            .collect();
        assert_eq!(from_base, (base..base + 5).collect::<Vec<_>>());
    }
    values.sort_unstable();
    assert_eq!(values[0], 0);
}

/// Verifies stopping a shared writer rejects later writes from every clone.
#[tokio::test]
async fn shared_writer_stop_reaches_every_clone() {
    let mut first = SharedWriter::new(VecSink::default());
    let mut second = first.clone();

    first.stop(None).await;
    let err = second.write(1).await.expect_err("stopped");
    assert!(err.is_cancelled());
}

// ============================================================================
// Cancellation Tests
// ============================================================================

fn silent() -> BoxReader<u32> {
    empty_reader::<()>()
        .transform(|_, _sink: ChannelWriter<u32>| async move {
            std::future::pending::<()>().await;
            Ok(())
        })
        .boxed()
}

/// Verifies a pipe waiting on a silent source ends when the source is stopped.
#[tokio::test]
async fn pipe_ends_when_source_stopped_elsewhere() {
    let source = silent();
    let handle = source.stop_handle();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(10)).await;
        handle.stop(None);
    });

    let mut sink = tokio::time::timeout(Duration::from_secs(1), source.pipe(VecSink::default()))
        .await
        .expect("pipe resolves")
        .expect("quiet stop ends the pipe");
    assert_eq!(
        sink.result().expect("result"),
        Some(Collected::Items(Vec::new()))
    );
}

/// Verifies a stop reason fails the pipe once and stops the sink.
#[tokio::test]
async fn pipe_fails_with_stop_reason() {
    let source = silent();
    let handle = source.stop_handle();
    let sink = VecSink::default();
    let sink_stop = sink.stop_handle();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(10)).await;
        handle.stop(Some("operator abort".into()));
    });

    let err = tokio::time::timeout(Duration::from_secs(1), source.pipe(sink))
        .await
        .expect("pipe resolves")
        .expect_err("reason surfaces");
    assert_eq!(err.to_string(), "stopped: operator abort");
    assert!(sink_stop.is_stopped());
}

//! Dispatch of tagged arguments to readers and writers.

use serde_json::Value;
use stream::{BoxReader, BoxWriter, StreamError};

use crate::device::Factory;
use crate::lazy::{LazyReader, LazyWriter};
use crate::memory::{ArrayReader, ArrayWriter, BufferReader, BufferWriter};
use crate::payload::Payload;

/// What a reader or writer should be built from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DeviceArg<T> {
    /// A device spec, resolved through a [`Factory`].
    Spec(String),
    /// An ordered sequence of values.
    Sequence(Vec<T>),
    /// A raw byte buffer.
    Buffer(Vec<u8>),
}

impl<T> DeviceArg<T> {
    /// Argument naming a raw byte buffer.
    pub fn buffer(bytes: impl Into<Vec<u8>>) -> Self {
        Self::Buffer(bytes.into())
    }

    /// Short name of the argument kind, used in diagnostics.
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Spec(_) => "spec",
            Self::Sequence(_) => "sequence",
            Self::Buffer(_) => "buffer",
        }
    }
}

impl<T> From<&str> for DeviceArg<T> {
    fn from(spec: &str) -> Self {
        Self::Spec(spec.to_owned())
    }
}

impl<T> From<String> for DeviceArg<T> {
    fn from(spec: String) -> Self {
        Self::Spec(spec)
    }
}

impl<T> From<Vec<T>> for DeviceArg<T> {
    fn from(items: Vec<T>) -> Self {
        Self::Sequence(items)
    }
}

const fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Strings are specs and arrays are sequences; anything else is rejected.
impl TryFrom<Value> for DeviceArg<Value> {
    type Error = StreamError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::String(spec) => Ok(Self::Spec(spec)),
            Value::Array(items) => Ok(Self::Sequence(items)),
            other => Err(StreamError::invalid_argument(json_type(&other))),
        }
    }
}

impl TryFrom<&Value> for DeviceArg<Value> {
    type Error = StreamError;

    fn try_from(value: &Value) -> Result<Self, Self::Error> {
        match value {
            Value::String(_) | Value::Array(_) => Self::try_from(value.clone()),
            other => Err(StreamError::invalid_argument(json_type(other))),
        }
    }
}

/// Builds a reader for `arg`.
///
/// A spec is resolved through `factory` now, but the device's reader is only
/// built on the first `read` or `stop`.
pub fn reader<T: Payload>(
    arg: DeviceArg<T>,
    factory: &dyn Factory<T>,
) -> Result<BoxReader<T>, StreamError> {
    logging::trace_dispatch!(kind = arg.kind(), "dispatching reader");
    match arg {
        DeviceArg::Spec(spec) => Ok(Box::new(LazyReader::new(factory.resolve(&spec)?))),
        DeviceArg::Sequence(items) => Ok(Box::new(ArrayReader::new(items))),
        DeviceArg::Buffer(bytes) => Ok(Box::new(BufferReader::<T>::new(bytes))),
    }
}

/// Builds a writer for `arg`.
///
/// Sequences and buffers produce fresh in-memory writers; the argument's
/// contents are not used.
pub fn writer<T: Payload>(
    arg: DeviceArg<T>,
    factory: &dyn Factory<T>,
) -> Result<BoxWriter<T>, StreamError> {
    logging::trace_dispatch!(kind = arg.kind(), "dispatching writer");
    match arg {
        DeviceArg::Spec(spec) => Ok(Box::new(LazyWriter::new(factory.resolve(&spec)?))),
        DeviceArg::Sequence(_) => Ok(Box::new(ArrayWriter::<T>::new())),
        DeviceArg::Buffer(_) => Ok(Box::new(BufferWriter::<T>::new())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::Registry;
    use serde_json::json;
    use stream::{Collected, ReaderExt, Writer};

    #[test]
    fn json_strings_and_arrays_are_accepted() {
        assert_eq!(
            DeviceArg::<Value>::try_from(&json!("file:/tmp/a")).expect("spec"),
            DeviceArg::Spec("file:/tmp/a".to_owned())
        );
        assert_eq!(
            DeviceArg::<Value>::try_from(json!([1, "two"])).expect("sequence"),
            DeviceArg::Sequence(vec![json!(1), json!("two")])
        );
    }

    #[test]
    fn json_other_types_are_invalid_arguments() {
        for (value, name) in [
            (json!(42), "number"),
            (json!({"a": 1}), "object"),
            (json!(true), "boolean"),
            (Value::Null, "null"),
        ] {
            let err = DeviceArg::<Value>::try_from(&value).expect_err("rejected");
            assert_eq!(err.to_string(), format!("invalid argument {name}"));
        }
    }

    #[tokio::test]
    async fn sequence_reader_yields_elements() {
        let registry = Registry::<Value>::new();
        let values = reader(DeviceArg::Sequence(vec![json!(1), json!(2)]), &registry)
            .expect("dispatch")
            .to_vec()
            .await
            .expect("drain");
        assert_eq!(values, vec![json!(1), json!(2)]);
    }

    #[tokio::test]
    async fn buffer_reader_yields_one_chunk() {
        let registry = Registry::<Vec<u8>>::new();
        let chunks = reader(DeviceArg::buffer(b"xyz".to_vec()), &registry)
            .expect("dispatch")
            .to_vec()
            .await
            .expect("drain");
        assert_eq!(chunks, vec![b"xyz".to_vec()]);
    }

    #[tokio::test]
    async fn sequence_writer_ignores_initial_contents() {
        let registry = Registry::<String>::new();
        let initial = vec!["stale".to_owned()];
        let mut sink = writer(DeviceArg::Sequence(initial.clone()), &registry).expect("dispatch");
        sink.write("a".to_owned()).await.expect("write");
        sink.write("b".to_owned()).await.expect("write");
        sink.end().await.expect("end");

        let collected = sink.result().expect("result").and_then(Collected::into_items);
        assert_eq!(collected, Some(vec!["a".to_owned(), "b".to_owned()]));
        assert_eq!(initial, vec!["stale".to_owned()]);
    }

    #[tokio::test]
    async fn buffer_writer_ignores_initial_bytes() {
        let registry = Registry::<String>::new();
        let mut sink = writer(DeviceArg::buffer(b"old".to_vec()), &registry).expect("dispatch");
        sink.write("new".to_owned()).await.expect("write");
        sink.end().await.expect("end");
        let collected = sink.result().expect("result").and_then(Collected::into_bytes);
        assert_eq!(collected, Some(b"new".to_vec()));
    }

    #[test]
    fn unknown_spec_fails_at_dispatch() {
        let registry = Registry::<String>::new();
        let err = reader(DeviceArg::from("nowhere:x"), &registry).err().expect("unknown");
        assert!(matches!(err, StreamError::UnknownDevice { .. }));
    }
}

//! Device collaborators and the scheme-keyed registry.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use stream::{BoxReader, BoxWriter, StreamError};

use crate::file::FileDevice;
use crate::payload::Payload;

/// Anything that can hand out a reader and a writer.
///
/// Constructing the streams should be cheap; opening the underlying resource
/// belongs in the first `read` or `write`.
pub trait Device<T: Send + 'static>: Send + Sync {
    /// Creates a reader over the device.
    fn reader(&self) -> Result<BoxReader<T>, StreamError>;

    /// Creates a writer into the device.
    fn writer(&self) -> Result<BoxWriter<T>, StreamError>;
}

/// Resolves device specs to devices.
pub trait Factory<T: Send + 'static>: Send + Sync {
    /// Looks up the device for `spec`.
    ///
    /// Fails with [`StreamError::UnknownDevice`] when nothing handles it.
    fn resolve(&self, spec: &str) -> Result<Arc<dyn Device<T>>, StreamError>;
}

type Constructor<T> = Arc<dyn Fn(&str) -> Result<Arc<dyn Device<T>>, StreamError> + Send + Sync>;

/// Factory keyed by the scheme of a `scheme:rest` spec.
///
/// The constructor registered for the scheme receives `rest` with any leading
/// `//` removed, so `file:/tmp/a` and `file:///tmp/a` both name `/tmp/a`.
/// Specs without a scheme go to the default scheme, if one is set.
///
/// A scheme is at least two characters long, starts with an ASCII letter and
/// continues with letters, digits, `+`, `-` or `.`; anything else before the
/// first `:` is treated as part of a scheme-less spec.
pub struct Registry<T: Send + 'static> {
    schemes: BTreeMap<String, Constructor<T>>,
    default_scheme: Option<String>,
}

impl<T: Send + 'static> Default for Registry<T> {
    fn default() -> Self {
        Self {
            schemes: BTreeMap::new(),
            default_scheme: None,
        }
    }
}

impl<T: Send + 'static> Registry<T> {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `constructor` for `scheme`, replacing any previous one.
    pub fn register<F>(&mut self, scheme: impl Into<String>, constructor: F) -> &mut Self
    where
        F: Fn(&str) -> Result<Arc<dyn Device<T>>, StreamError> + Send + Sync + 'static,
    {
        self.schemes.insert(scheme.into(), Arc::new(constructor));
        self
    }

    /// Routes scheme-less specs to `scheme`.
    pub fn set_default_scheme(&mut self, scheme: impl Into<String>) -> &mut Self {
        self.default_scheme = Some(scheme.into());
        self
    }

    /// Registered schemes in sorted order.
    pub fn schemes(&self) -> impl Iterator<Item = &str> {
        self.schemes.keys().map(String::as_str)
    }
}

impl<T: Payload> Registry<T> {
    /// Registry with the built-in `file` scheme, also used as default.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry
            .register("file", |path| {
                Ok(Arc::new(FileDevice::new(path)) as Arc<dyn Device<T>>)
            })
            .set_default_scheme("file");
        registry
    }
}

impl<T: Send + 'static> fmt::Debug for Registry<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("schemes", &self.schemes.keys().collect::<Vec<_>>())
            .field("default_scheme", &self.default_scheme)
            .finish()
    }
}

fn is_scheme(candidate: &str) -> bool {
    let mut chars = candidate.chars();
    candidate.len() >= 2
        && chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}

/// Splits `spec` into scheme and remainder.
fn split_spec(spec: &str) -> (Option<&str>, &str) {
    match spec.split_once(':') {
        Some((scheme, rest)) if is_scheme(scheme) => {
            (Some(scheme), rest.strip_prefix("//").unwrap_or(rest))
        }
        _ => (None, spec),
    }
}

impl<T: Send + 'static> Factory<T> for Registry<T> {
    fn resolve(&self, spec: &str) -> Result<Arc<dyn Device<T>>, StreamError> {
        let (scheme, rest) = split_spec(spec);
        let scheme = scheme.or(self.default_scheme.as_deref());
        let constructor = scheme
            .and_then(|scheme| self.schemes.get(scheme))
            .ok_or_else(|| StreamError::UnknownDevice {
                spec: spec.to_owned(),
            })?;
        logging::trace_dispatch!(spec, scheme = scheme.unwrap_or_default(), "resolved device");
        constructor(rest)
    }
}

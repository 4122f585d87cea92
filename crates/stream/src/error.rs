//! Error type shared by every reader and writer.

use std::error::Error;

/// Boxed error carried as an upstream cause or a stop reason.
pub type BoxError = Box<dyn Error + Send + Sync + 'static>;

/// Errors surfaced by stream operations and the dispatcher.
#[derive(Debug, thiserror::Error)]
pub enum StreamError {
    /// The dispatcher received an argument shape it does not support.
    #[error("invalid argument {received}")]
    InvalidArgument {
        /// Name of the received argument's type.
        received: String,
    },

    /// The device factory has nothing registered for the spec.
    #[error("no device for spec {spec:?}")]
    UnknownDevice {
        /// The unresolved device spec.
        spec: String,
    },

    /// The backing resource, a collaborator or a producer failed.
    #[error("{source}")]
    Upstream {
        /// The original failure.
        #[source]
        source: BoxError,
    },

    /// A value was written after the writer was closed.
    #[error("write after close")]
    WriteAfterClose,

    /// The stream was stopped.
    #[error("{}", cancelled_message(.reason))]
    Cancelled {
        /// Reason supplied to `stop`, if any.
        reason: Option<BoxError>,
    },
}

#[allow(clippy::ref_option)]
fn cancelled_message(reason: &Option<BoxError>) -> String {
    match reason {
        Some(reason) => format!("stopped: {reason}"),
        None => "stopped".to_owned(),
    }
}

impl StreamError {
    /// Wraps a failure of an underlying resource.
    pub fn upstream(source: impl Into<BoxError>) -> Self {
        Self::Upstream {
            source: source.into(),
        }
    }

    /// Creates an [`InvalidArgument`](Self::InvalidArgument) error naming the received type.
    pub fn invalid_argument(received: impl Into<String>) -> Self {
        Self::InvalidArgument {
            received: received.into(),
        }
    }

    /// Returns `true` for errors produced by `stop`.
    #[must_use]
    pub const fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }

    /// Returns `true` for a stop without a reason, which is normal termination.
    #[must_use]
    pub const fn is_quiet_stop(&self) -> bool {
        matches!(self, Self::Cancelled { reason: None })
    }

    /// Returns the upstream cause downcast to `E`, if that is what this error carries.
    #[must_use]
    pub fn upstream_as<E: Error + 'static>(&self) -> Option<&E> {
        match self {
            Self::Upstream { source } => source.downcast_ref::<E>(),
            _ => None,
        }
    }
}

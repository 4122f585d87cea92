//! Convenience macros for ezs-specific tracing.
//!
//! These macros wrap the standard tracing macros with the targets that
//! `EzLayer` maps to verbosity flags. Callers must depend on
//! `tracing` directly.

/// Emit a stream state trace.
///
/// # Example
/// ```ignore
/// trace_stream!("writer closed");
/// ```
#[macro_export]
macro_rules! trace_stream {
    ($($arg:tt)*) => {
        ::tracing::debug!(target: "ezs::stream", $($arg)*)
    };
}

/// Emit a transform producer trace.
///
/// # Example
/// ```ignore
/// trace_transform!("producer finished");
/// ```
#[macro_export]
macro_rules! trace_transform {
    ($($arg:tt)*) => {
        ::tracing::debug!(target: "ezs::transform", $($arg)*)
    };
}

/// Emit a stop propagation trace.
#[macro_export]
macro_rules! trace_stop {
    ($($arg:tt)*) => {
        ::tracing::debug!(target: "ezs::stop", $($arg)*)
    };
}

/// Emit a dispatcher trace.
///
/// # Example
/// ```ignore
/// trace_dispatch!("resolving {}", spec);
/// ```
#[macro_export]
macro_rules! trace_dispatch {
    ($($arg:tt)*) => {
        ::tracing::info!(target: "ezs::dispatch", $($arg)*)
    };
}

/// Emit a device trace.
#[macro_export]
macro_rules! trace_device {
    ($($arg:tt)*) => {
        ::tracing::debug!(target: "ezs::device", $($arg)*)
    };
}

/// Emit a traversal trace.
///
/// # Example
/// ```ignore
/// trace_walk!(depth, "visiting {}", path);
/// ```
#[macro_export]
macro_rules! trace_walk {
    ($($arg:tt)*) => {
        ::tracing::debug!(target: "ezs::walk", $($arg)*)
    };
}

/// Emit a listing progress trace.
#[macro_export]
macro_rules! trace_list {
    ($($arg:tt)*) => {
        ::tracing::info!(target: "ezs::list", $($arg)*)
    };
}

/// Emit a statistics trace.
///
/// # Example
/// ```ignore
/// trace_stats!("copied {} chunks", count);
/// ```
#[macro_export]
macro_rules! trace_stats {
    ($($arg:tt)*) => {
        ::tracing::info!(target: "ezs::stats", $($arg)*)
    };
}

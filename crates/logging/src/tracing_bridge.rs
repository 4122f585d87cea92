//! Bridge between the tracing crate and the ezs verbosity system.
//!
//! This module provides a tracing subscriber layer that maps tracing events to
//! the info and debug flags in [`VerbosityConfig`]. Library code keeps using the
//! standard tracing macros (usually through the `trace_*!` wrappers) while the
//! command-line front-end decides which of them reach the user.
//!
//! # Architecture
//!
//! - [`EzLayer`]: a tracing-subscriber layer that filters and records events
//! - Events are mapped to flags by the last segment of their target
//!   (`ezs::walk` maps to [`DebugFlag::Walk`])
//! - The thread-local verbosity configuration decides whether an event is kept
//!
//! # Usage
//!
//! ```rust,ignore
//! use logging::{VerbosityConfig, init_tracing};
//!
//! let config = VerbosityConfig::from_verbose_level(2);
//! init_tracing(config)?;
//!
//! tracing::debug!(target: "ezs::walk", "visiting {}", path);
//! ```

use super::config::VerbosityConfig;
use super::levels::{DebugFlag, InfoFlag};
use super::thread_local::{debug_gte, emit_debug, emit_info, info_gte};
use std::fmt::Write as _;
use tracing::{Level, Subscriber};
use tracing_subscriber::layer::{Context, Layer};
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::TryInitError;

/// A tracing layer that bridges tracing events to the ezs verbosity system.
///
/// Events whose target does not name a known subsystem are ignored.
#[derive(Clone, Copy, Debug, Default)]
pub struct EzLayer;

impl EzLayer {
    /// Create a new layer.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    fn subsystem(target: &str) -> &str {
        target.rsplit("::").next().unwrap_or(target)
    }

    /// Map a tracing target to an info flag.
    fn target_to_info_flag(target: &str) -> Option<InfoFlag> {
        match Self::subsystem(target) {
            "dispatch" | "dispatcher" => Some(InfoFlag::Dispatch),
            "list" => Some(InfoFlag::List),
            "stats" => Some(InfoFlag::Stats),
            _ => None,
        }
    }

    /// Map a tracing target to a debug flag.
    fn target_to_debug_flag(target: &str) -> Option<DebugFlag> {
        match Self::subsystem(target) {
            "device" | "devices" => Some(DebugFlag::Device),
            "stop" => Some(DebugFlag::Stop),
            "stream" => Some(DebugFlag::Stream),
            "transform" => Some(DebugFlag::Transform),
            "walk" => Some(DebugFlag::Walk),
            _ => None,
        }
    }

    /// Map a tracing level to an info verbosity level.
    const fn info_level(level: &Level) -> u8 {
        match *level {
            Level::ERROR | Level::WARN | Level::INFO => 1,
            Level::DEBUG => 2,
            Level::TRACE => 3,
        }
    }

    /// Map a tracing level to a debug verbosity level.
    const fn debug_level(level: &Level) -> u8 {
        match *level {
            Level::ERROR | Level::WARN | Level::INFO | Level::DEBUG => 1,
            Level::TRACE => 2,
        }
    }
}

impl<S> Layer<S> for EzLayer
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
        let metadata = event.metadata();
        let target = metadata.target();
        let level = metadata.level();

        if let Some(flag) = Self::target_to_debug_flag(target) {
            let verbosity = Self::debug_level(level);
            if debug_gte(flag, verbosity) {
                let mut visitor = MessageVisitor::default();
                event.record(&mut visitor);
                if let Some(message) = visitor.finish() {
                    emit_debug(flag, verbosity, message);
                }
            }
            return;
        }

        if let Some(flag) = Self::target_to_info_flag(target) {
            let verbosity = Self::info_level(level);
            if info_gte(flag, verbosity) {
                let mut visitor = MessageVisitor::default();
                event.record(&mut visitor);
                if let Some(message) = visitor.finish() {
                    emit_info(flag, verbosity, message);
                }
            }
        }
    }
}

/// Visitor that renders the message and trailing `key=value` fields.
#[derive(Default)]
struct MessageVisitor {
    message: Option<String>,
    fields: String,
}

impl MessageVisitor {
    fn finish(self) -> Option<String> {
        let mut message = self.message?;
        message.push_str(&self.fields);
        Some(message)
    }
}

impl tracing::field::Visit for MessageVisitor {
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            self.message = Some(format!("{value:?}"));
        } else {
            let _ = write!(self.fields, " {}={value:?}", field.name());
        }
    }

    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        if field.name() == "message" {
            self.message = Some(value.to_owned());
        } else {
            let _ = write!(self.fields, " {}={value}", field.name());
        }
    }
}

/// Initialize tracing with the given verbosity configuration.
///
/// Installs [`EzLayer`] as the global subscriber and stores `config` in the
/// calling thread. Fails when a global subscriber is already installed; the
/// thread-local configuration is updated either way.
pub fn init_tracing(config: VerbosityConfig) -> Result<(), TryInitError> {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    super::thread_local::init(config);

    tracing_subscriber::registry().with(EzLayer::new()).try_init()
}

/// Initialize tracing with an extra filter in front of the verbosity flags.
///
/// # Example
///
/// ```rust,ignore
/// use logging::{VerbosityConfig, init_tracing_with_filter};
/// use tracing_subscriber::EnvFilter;
///
/// let config = VerbosityConfig::from_verbose_level(2);
/// let filter = EnvFilter::try_from_env("EZS_LOG").unwrap_or_else(|_| EnvFilter::new("trace"));
/// init_tracing_with_filter(config, filter)?;
/// ```
pub fn init_tracing_with_filter<F>(config: VerbosityConfig, filter: F) -> Result<(), TryInitError>
where
    F: Layer<tracing_subscriber::Registry> + Send + Sync + 'static,
{
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    super::thread_local::init(config);

    tracing_subscriber::registry()
        .with(filter)
        .with(EzLayer::new())
        .try_init()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::thread_local::{DiagnosticEvent, drain_events, init};
    use tracing_subscriber::layer::SubscriberExt;

    #[test]
    fn test_target_to_info_flag() {
        assert_eq!(
            EzLayer::target_to_info_flag("ezs::list"),
            Some(InfoFlag::List)
        );
        assert_eq!(
            EzLayer::target_to_info_flag("ezs::dispatch"),
            Some(InfoFlag::Dispatch)
        );
        assert_eq!(EzLayer::target_to_info_flag("stats"), Some(InfoFlag::Stats));
        assert_eq!(EzLayer::target_to_info_flag("ezs::walk"), None);
        assert_eq!(EzLayer::target_to_info_flag("unknown"), None);
    }

    #[test]
    fn test_target_to_debug_flag() {
        assert_eq!(
            EzLayer::target_to_debug_flag("ezs::walk"),
            Some(DebugFlag::Walk)
        );
        assert_eq!(
            EzLayer::target_to_debug_flag("ezs::transform"),
            Some(DebugFlag::Transform)
        );
        assert_eq!(
            EzLayer::target_to_debug_flag("ezs::devices"),
            Some(DebugFlag::Device)
        );
        assert_eq!(EzLayer::target_to_debug_flag("ezs::walker"), None);
        assert_eq!(EzLayer::target_to_debug_flag("unknown"), None);
    }

    #[test]
    fn test_level_mapping() {
        assert_eq!(EzLayer::info_level(&Level::INFO), 1);
        assert_eq!(EzLayer::info_level(&Level::DEBUG), 2);
        assert_eq!(EzLayer::info_level(&Level::TRACE), 3);
        assert_eq!(EzLayer::debug_level(&Level::DEBUG), 1);
        assert_eq!(EzLayer::debug_level(&Level::TRACE), 2);
    }

    #[test]
    fn layer_records_only_enabled_flags() {
        let mut config = VerbosityConfig::default();
        config.debug.walk = 1;
        init(config);
        drain_events();

        let subscriber = tracing_subscriber::registry().with(EzLayer::new());
        tracing::subscriber::with_default(subscriber, || {
            tracing::debug!(target: "ezs::walk", path = "root/sub", "visit");
            tracing::trace!(target: "ezs::walk", "too detailed");
            tracing::debug!(target: "ezs::stream", "disabled flag");
            tracing::info!(target: "ezs::list", "disabled info");
        });

        let events = drain_events();
        assert_eq!(events.len(), 1);
        match &events[0] {
            DiagnosticEvent::Debug { flag, message, .. } => {
                assert_eq!(*flag, DebugFlag::Walk);
                assert_eq!(message, "visit path=root/sub");
            }
            DiagnosticEvent::Info { .. } => panic!("expected debug event"),
        }
    }
}

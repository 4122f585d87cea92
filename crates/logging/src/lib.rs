#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! # Overview
//!
//! `logging` holds the verbosity flag system shared by every ezs crate. Library
//! code emits events through the standard `tracing` macros (usually via the
//! `trace_*!` wrappers exported here); the front-end decides which of them are
//! kept by installing a [`VerbosityConfig`].
//!
//! # Design
//!
//! - [`InfoFlag`] and [`DebugFlag`] name the diagnostic categories. Each flag
//!   carries a numeric level; an event is kept when the configured level is at
//!   or above the event's level.
//! - The configuration and the collected [`DiagnosticEvent`]s live in
//!   thread-local storage, so concurrent pipelines on different threads do not
//!   see each other's output.
//! - With the `tracing` feature, `EzLayer` bridges tracing targets such as
//!   `ezs::walk` onto the flags.
//!
//! # Examples
//!
//! ```
//! use logging::{InfoFlag, VerbosityConfig, info_gte, init};
//!
//! let mut config = VerbosityConfig::from_verbose_level(1);
//! config.apply_info_list("list2").unwrap();
//! init(config);
//!
//! assert!(info_gte(InfoFlag::List, 2));
//! assert!(!info_gte(InfoFlag::Dispatch, 1));
//! ```

mod config;
mod levels;
mod thread_local;
#[cfg(feature = "tracing")]
mod tracing_bridge;
mod tracing_macros;

pub use config::VerbosityConfig;
pub use levels::{DebugFlag, DebugLevels, InfoFlag, InfoLevels};
pub use thread_local::{
    DiagnosticEvent, debug_gte, drain_events, emit_debug, emit_info, info_gte, init,
};
#[cfg(feature = "tracing")]
pub use tracing_bridge::{EzLayer, init_tracing, init_tracing_with_filter};

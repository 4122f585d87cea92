#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! # Overview
//!
//! `cli` implements the `ezs` command-line front-end. It parses arguments
//! with [`clap`](https://docs.rs/clap/), configures diagnostics through the
//! `logging` crate and runs one of three commands:
//!
//! - `list PATH [-r] [--postorder] [--exclude NAME]... [--json]` lists a
//!   directory tree through `walk::list_local`.
//! - `cat SPEC` dispatches `SPEC` through the default device registry and
//!   copies every chunk to standard output.
//! - `copy SRC DST` pipes one dispatched device into another.
//!
//! # Design
//!
//! [`run`] accepts the argument iterator together with handles for standard
//! output and error, so tests drive it with in-memory buffers. Commands run on
//! a current-thread tokio runtime; every producer task of a pipeline therefore
//! shares the caller's thread and its diagnostic buffer, which is drained to
//! standard error once the command finishes.
//!
//! Verbosity starts from the `-v` count and is refined by `--info` and
//! `--debug` flag lists (`list2,stats`, `walk`, `ALL`, `NONE`). The `EZS_LOG`
//! environment variable, when set, is an additional `tracing` filter.
//!
//! # Errors
//!
//! [`run`] returns [`EXIT_USAGE`] for invalid arguments and [`EXIT_STREAM`]
//! when a stream fails. Diagnostics are written to standard error with an
//! `ezs error:` prefix.
//!
//! # Examples
//!
//! ```
//! let mut stdout = Vec::new();
//! let mut stderr = Vec::new();
//! let status = cli::run(["ezs", "--version"], &mut stdout, &mut stderr);
//!
//! assert_eq!(status, cli::EXIT_OK);
//! assert!(String::from_utf8_lossy(&stdout).starts_with("ezs "));
//! ```

use std::ffi::OsString;
use std::io::Write;

use clap::error::ErrorKind;
use logging::VerbosityConfig;
use tracing_subscriber::EnvFilter;

mod command;
mod error;
mod execute;

use command::parse_args;
use error::CliError;

pub use error::{EXIT_OK, EXIT_STREAM, EXIT_USAGE};

/// Environment variable holding an extra `tracing` filter directive.
pub const LOG_ENV: &str = "EZS_LOG";

/// Maximum exit code representable by a Unix process.
const MAX_EXIT_CODE: i32 = u8::MAX as i32;

/// Prefix of every diagnostic written to standard error.
const ERROR_PREFIX: &str = "ezs error:";

/// Runs the CLI using the provided argument iterator and output handles.
///
/// Returns the process exit code.
pub fn run<I, S, Out, Err>(arguments: I, stdout: &mut Out, stderr: &mut Err) -> i32
where
    I: IntoIterator<Item = S>,
    S: Into<OsString> + Clone,
    Out: Write,
    Err: Write,
{
    let parsed = match parse_args(arguments) {
        Ok(parsed) => parsed,
        Err(error) => return report_clap_error(&error, stdout, stderr),
    };

    let config = match verbosity_config(parsed.verbosity, &parsed.info, &parsed.debug) {
        Ok(config) => config,
        Err(error) => return report(&error, stderr),
    };
    install_tracing(config);
    drop(logging::drain_events());

    let result = execute::execute(parsed.command, stdout);
    for event in logging::drain_events() {
        let _ = writeln!(stderr, "{event}");
    }

    match result {
        Ok(()) => EXIT_OK,
        Err(error) => report(&error, stderr),
    }
}

/// Converts a status returned by [`run`] into an [`std::process::ExitCode`].
pub fn exit_code_from(status: i32) -> std::process::ExitCode {
    let clamped = status.clamp(0, MAX_EXIT_CODE);
    std::process::ExitCode::from(clamped as u8)
}

fn verbosity_config(
    verbosity: u8,
    info: &[String],
    debug: &[String],
) -> Result<VerbosityConfig, CliError> {
    let mut config = VerbosityConfig::from_verbose_level(verbosity);
    for list in info {
        config
            .apply_info_list(list)
            .map_err(|message| CliError::Usage(format!("--info={list}: {message}")))?;
    }
    for list in debug {
        config
            .apply_debug_list(list)
            .map_err(|message| CliError::Usage(format!("--debug={list}: {message}")))?;
    }
    Ok(config)
}

/// Installs the global subscriber once; later calls only update the calling
/// thread's verbosity.
fn install_tracing(config: VerbosityConfig) {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("trace"));
    let _ = logging::init_tracing_with_filter(config, filter);
}

fn report<Err: Write>(error: &CliError, stderr: &mut Err) -> i32 {
    let _ = writeln!(stderr, "{ERROR_PREFIX} {error}");
    error.exit_code()
}

fn report_clap_error<Out: Write, Err: Write>(
    error: &clap::Error,
    stdout: &mut Out,
    stderr: &mut Err,
) -> i32 {
    let rendered = error.render().to_string();
    match error.kind() {
        ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
            let _ = stdout.write_all(rendered.as_bytes());
            EXIT_OK
        }
        _ => {
            let text = rendered.strip_prefix("error: ").unwrap_or(&rendered);
            let _ = write!(stderr, "{ERROR_PREFIX} {text}");
            EXIT_USAGE
        }
    }
}

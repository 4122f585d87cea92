use std::io;

use stream::StreamError;

/// Successful run.
pub const EXIT_OK: i32 = 0;
/// Invalid command line or verbosity flags.
pub const EXIT_USAGE: i32 = 1;
/// A stream, device or listing failed.
pub const EXIT_STREAM: i32 = 2;

/// Failure of a command.
#[derive(Debug, thiserror::Error)]
pub(crate) enum CliError {
    /// Rejected arguments.
    #[error("{0}")]
    Usage(String),
    /// Failure reported by a stream.
    #[error(transparent)]
    Stream(#[from] StreamError),
    /// Failure writing command output.
    #[error("writing output: {0}")]
    Output(#[from] io::Error),
}

impl CliError {
    /// Process exit code for the failure.
    pub(crate) const fn exit_code(&self) -> i32 {
        match self {
            Self::Usage(_) => EXIT_USAGE,
            Self::Stream(_) | Self::Output(_) => EXIT_STREAM,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_by_kind() {
        assert_eq!(CliError::Usage("bad".into()).exit_code(), EXIT_USAGE);
        let stream = CliError::from(StreamError::upstream("broken"));
        assert_eq!(stream.exit_code(), EXIT_STREAM);
        assert_eq!(stream.to_string(), "broken");
        let output = CliError::from(io::Error::from(io::ErrorKind::BrokenPipe));
        assert_eq!(output.exit_code(), EXIT_STREAM);
    }
}

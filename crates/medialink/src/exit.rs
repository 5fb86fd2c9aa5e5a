use std::fmt;
use std::io;

use medialink_core::{ErrorKind, MediaError};

// Exit codes follow the sysexits/timeout conventions.
pub const SUCCESS: i32 = 0;
pub const FAILURE: i32 = 1;
pub const CONNECTION_CLOSED: i32 = 3;
pub const PERMISSION_DENIED: i32 = 50;
pub const DATA_INVALID: i32 = 60;
pub const USAGE: i32 = 64;
pub const TIMEOUT: i32 = 124;
pub const INTERNAL: i32 = 125;

pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug)]
pub struct CliError {
    pub code: i32,
    pub message: String,
}

impl CliError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

pub fn io_error(context: &str, err: &io::Error) -> CliError {
    let code = match err.kind() {
        io::ErrorKind::PermissionDenied => PERMISSION_DENIED,
        io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => TIMEOUT,
        io::ErrorKind::NotFound => USAGE,
        _ => CONNECTION_CLOSED,
    };
    CliError::new(code, format!("{context}: {err}"))
}

/// Map a media error to an exit code, rendering its message in `language`.
pub fn media_error(context: &str, err: MediaError, language: &str) -> CliError {
    if let MediaError::Transport { source } = &err {
        return io_error(context, source);
    }
    let code = match err.kind() {
        ErrorKind::ConnectionClosed => CONNECTION_CLOSED,
        ErrorKind::UnknownEnum | ErrorKind::InvalidArgument | ErrorKind::ArgumentOutOfRange => {
            USAGE
        }
        ErrorKind::BufferTooSmall => DATA_INVALID,
        ErrorKind::StateChangeRejected => FAILURE,
    };
    CliError::new(code, format!("{context}: {}", err.localized(language)))
}

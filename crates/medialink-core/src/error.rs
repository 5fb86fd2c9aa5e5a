use std::fmt;

use crate::localize;
use crate::state::MediaState;

/// Closed set of failure categories every media operation maps into.
///
/// Callers that need to branch on failures (retry, report, abort) should
/// match on the kind rather than on [`MediaError`] variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Textual enum value could not be parsed.
    UnknownEnum,
    /// The media is not open, or the transport went away.
    ConnectionClosed,
    /// An argument or request is invalid for the current media.
    InvalidArgument,
    /// A numeric argument is outside its accepted range.
    ArgumentOutOfRange,
    /// Not enough bytes to decode the requested type.
    BufferTooSmall,
    /// A state-change listener rejected the transition.
    StateChangeRejected,
}

impl ErrorKind {
    /// All kinds, in catalog order.
    pub const ALL: [ErrorKind; 6] = [
        ErrorKind::UnknownEnum,
        ErrorKind::ConnectionClosed,
        ErrorKind::InvalidArgument,
        ErrorKind::ArgumentOutOfRange,
        ErrorKind::BufferTooSmall,
        ErrorKind::StateChangeRejected,
    ];

    /// Stable catalog key for this kind.
    pub fn key(self) -> &'static str {
        match self {
            ErrorKind::UnknownEnum => "error.unknown_enum",
            ErrorKind::ConnectionClosed => "error.connection_closed",
            ErrorKind::InvalidArgument => "error.invalid_argument",
            ErrorKind::ArgumentOutOfRange => "error.argument_out_of_range",
            ErrorKind::BufferTooSmall => "error.buffer_too_small",
            ErrorKind::StateChangeRejected => "error.state_change_rejected",
        }
    }

    /// Localized message for this kind.
    ///
    /// Never fails: unsupported languages fall back to English.
    pub fn message(self, language: &str) -> &'static str {
        localize::message(self, language)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message(localize::DEFAULT_LANGUAGE))
    }
}

/// Errors that can occur in media operations.
#[derive(Debug, thiserror::Error)]
pub enum MediaError {
    /// A textual enum value did not match any known value.
    #[error("unknown enum value: {0:?}")]
    UnknownEnum(String),

    /// The media is closed, or was closed while the operation was waiting.
    #[error("connection closed")]
    ConnectionClosed,

    /// The underlying transport failed; the connection is considered lost.
    #[error("connection closed: {source}")]
    Transport {
        #[source]
        source: std::io::Error,
    },

    /// Invalid argument or request.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Argument outside its accepted range.
    #[error("argument out of range: {name} = {value}")]
    ArgumentOutOfRange { name: &'static str, value: i64 },

    /// Not enough bytes to decode the requested value.
    #[error("buffer too small ({available} bytes, need {needed})")]
    BufferTooSmall { needed: usize, available: usize },

    /// A state-change listener vetoed the transition.
    #[error("transition to {state} rejected by listener")]
    StateChangeRejected { state: MediaState },
}

impl MediaError {
    /// Shorthand for [`MediaError::InvalidArgument`].
    pub fn invalid(reason: impl Into<String>) -> Self {
        Self::InvalidArgument(reason.into())
    }

    /// The category this error belongs to.
    pub fn kind(&self) -> ErrorKind {
        match self {
            MediaError::UnknownEnum(_) => ErrorKind::UnknownEnum,
            MediaError::ConnectionClosed | MediaError::Transport { .. } => {
                ErrorKind::ConnectionClosed
            }
            MediaError::InvalidArgument(_) => ErrorKind::InvalidArgument,
            MediaError::ArgumentOutOfRange { .. } => ErrorKind::ArgumentOutOfRange,
            MediaError::BufferTooSmall { .. } => ErrorKind::BufferTooSmall,
            MediaError::StateChangeRejected { .. } => ErrorKind::StateChangeRejected,
        }
    }

    /// Render the error with the kind message in `language`.
    pub fn localized(&self, language: &str) -> String {
        let head = self.kind().message(language);
        match self {
            MediaError::UnknownEnum(value) => format!("{head} {value:?}"),
            MediaError::ConnectionClosed => head.to_string(),
            MediaError::Transport { source } => format!("{head} {source}"),
            MediaError::InvalidArgument(reason) => format!("{head} {reason}"),
            MediaError::ArgumentOutOfRange { name, value } => format!("{head} {name} = {value}"),
            MediaError::BufferTooSmall { needed, available } => {
                format!("{head} {available}/{needed}")
            }
            MediaError::StateChangeRejected { state } => format!("{head} {state}"),
        }
    }
}

impl From<std::io::Error> for MediaError {
    fn from(source: std::io::Error) -> Self {
        MediaError::Transport { source }
    }
}

pub type Result<T> = std::result::Result<T, MediaError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_variant_has_a_kind() {
        let cases = [
            (MediaError::UnknownEnum("x".into()), ErrorKind::UnknownEnum),
            (MediaError::ConnectionClosed, ErrorKind::ConnectionClosed),
            (
                MediaError::from(std::io::Error::from(std::io::ErrorKind::BrokenPipe)),
                ErrorKind::ConnectionClosed,
            ),
            (MediaError::invalid("bad"), ErrorKind::InvalidArgument),
            (
                MediaError::ArgumentOutOfRange {
                    name: "wait_time",
                    value: -2,
                },
                ErrorKind::ArgumentOutOfRange,
            ),
            (
                MediaError::BufferTooSmall {
                    needed: 4,
                    available: 1,
                },
                ErrorKind::BufferTooSmall,
            ),
            (
                MediaError::StateChangeRejected {
                    state: MediaState::Open,
                },
                ErrorKind::StateChangeRejected,
            ),
        ];

        for (err, kind) in cases {
            assert_eq!(err.kind(), kind, "{err}");
        }
    }

    #[test]
    fn transport_error_keeps_source() {
        use std::error::Error as _;

        let err = MediaError::from(std::io::Error::new(
            std::io::ErrorKind::ConnectionReset,
            "peer reset",
        ));
        assert!(err.source().is_some());
        assert!(err.to_string().contains("peer reset"));
    }

    #[test]
    fn localized_rendering_uses_catalog() {
        let err = MediaError::BufferTooSmall {
            needed: 2,
            available: 1,
        };
        assert_eq!(err.localized("fi"), "Puskuri on liian pieni. 1/2");
        assert_eq!(err.localized("xx"), "Buffer too small. 1/2");
    }
}

use std::fmt;
use std::sync::Arc;

use bytes::Bytes;
use chrono::{DateTime, Local};
use medialink_core::{MediaError, MediaState, TraceTypes};
use medialink_frame::{to_hex, Value};

/// Bytes delivered by one low-level read of the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceiveEvent {
    data: Bytes,
    sender: String,
}

impl ReceiveEvent {
    pub fn new(data: impl Into<Bytes>, sender: impl Into<String>) -> Self {
        Self {
            data: data.into(),
            sender: sender.into(),
        }
    }

    /// Received payload.
    pub fn data(&self) -> &Bytes {
        &self.data
    }

    /// Media dependent sender information, e.g. the remote address.
    pub fn sender(&self) -> &str {
        &self.sender
    }
}

impl fmt::Display for ReceiveEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}\t{}", self.sender, to_hex(&self.data))
    }
}

/// A media state transition.
///
/// Listeners may clear `accepted` to veto the transition. A veto of the
/// `Opening` or `Open` notification makes `open()` fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MediaStateEvent {
    state: MediaState,
    accepted: bool,
}

impl MediaStateEvent {
    pub fn new(state: MediaState) -> Self {
        Self {
            state,
            accepted: true,
        }
    }

    pub fn state(&self) -> MediaState {
        self.state
    }

    pub fn accepted(&self) -> bool {
        self.accepted
    }

    pub fn set_accepted(&mut self, accepted: bool) {
        self.accepted = accepted;
    }
}

/// A diagnostic trace record.
#[derive(Debug, Clone, PartialEq)]
pub struct TraceEvent {
    timestamp: DateTime<Local>,
    kind: TraceTypes,
    data: Option<Value>,
    receiver: Option<String>,
}

impl TraceEvent {
    pub fn new(kind: TraceTypes, data: Option<Value>, receiver: Option<String>) -> Self {
        Self {
            timestamp: Local::now(),
            kind,
            data,
            receiver,
        }
    }

    pub fn timestamp(&self) -> DateTime<Local> {
        self.timestamp
    }

    /// Trace category.
    pub fn kind(&self) -> TraceTypes {
        self.kind
    }

    pub fn data(&self) -> Option<&Value> {
        self.data.as_ref()
    }

    /// Media dependent receiver information, if any.
    pub fn receiver(&self) -> Option<&str> {
        self.receiver.as_deref()
    }
}

impl fmt::Display for TraceEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}\t{}\t", self.timestamp.format("%H:%M:%S%.3f"), self.kind)?;
        if let Some(data) = &self.data {
            write!(f, "{data}")?;
        }
        Ok(())
    }
}

/// An asynchronous failure reported by a media, e.g. a lost connection.
#[derive(Debug, Clone)]
pub struct ErrorEvent {
    error: Arc<MediaError>,
    message: String,
}

impl ErrorEvent {
    /// Wrap `error`, rendering its message in `language`.
    pub fn new(error: MediaError, language: &str) -> Self {
        let message = error.localized(language);
        Self {
            error: Arc::new(error),
            message,
        }
    }

    pub fn error(&self) -> &MediaError {
        &self.error
    }

    /// Localized message.
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for ErrorEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

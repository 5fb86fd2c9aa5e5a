//! Shared vocabulary of the medialink media layer.
//!
//! Everything here is transport-independent:
//! - [`MediaError`] and the closed [`ErrorKind`] taxonomy
//! - the localized error message catalog ([`localize`])
//! - textual enums for media state, tracing and serial line settings
//!
//! The higher layers (`medialink-frame`, `medialink-media`) build on these
//! types.

pub mod error;
pub mod localize;
pub mod serial;
pub mod state;
pub mod trace;

mod text;

pub use error::{ErrorKind, MediaError, Result};
pub use serial::{BaudRate, Parity, SerialSettings, StopBits};
pub use state::MediaState;
pub use trace::{TraceLevel, TraceTypes};

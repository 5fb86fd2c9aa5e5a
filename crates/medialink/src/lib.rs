//! Transport-agnostic media layer for device communication stacks.
//!
//! medialink lets a protocol stack talk to a meter or controller over TCP,
//! a recorded capture or any other byte stream through one contract, and
//! reassembles typed replies from the chunks a transport delivers.
//!
//! # Crate Structure
//!
//! - [`core`]: error taxonomy, localized messages and textual enums
//! - [`frame`]: byte codec, end-of-packet matching and the synchronous receive engine
//! - [`media`]: the [`media::Media`] contract, state machine and transports

/// Re-export core types.
pub mod core {
    pub use medialink_core::*;
}

/// Re-export frame types.
pub mod frame {
    pub use medialink_frame::*;
}

/// Re-export media types.
pub mod media {
    pub use medialink_media::*;
}

pub use medialink_core::{ErrorKind, MediaError, Result};
pub use medialink_media::Media;

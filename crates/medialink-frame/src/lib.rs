//! Frame assembly for the medialink media layer.
//!
//! Turns the chunked byte stream a transport delivers into typed replies:
//! - [`codec`]: decode/encode bytes as [`Value`]s of a [`DataType`] under an
//!   explicit [`ByteOrder`], plus hex rendering for diagnostics
//! - [`eop`]: end-of-packet terminators and an incremental matcher that
//!   survives terminators split across deliveries
//! - [`SyncBuffer`]: the accumulation buffer a transport pushes into and
//!   synchronous readers block on
//!
//! Callers never see partial frames: a read either completes with a decoded
//! reply, times out without error, or fails.

pub mod codec;
pub mod eop;
pub mod params;
pub mod sync_buffer;

pub use codec::{decode, encode, from_hex, to_hex, ByteOrder, DataType, Value};
pub use eop::{find_eop, Eop, EopMatcher, FrameMatch};
pub use params::{ReceiveParameters, WAIT_INFINITE};
pub use sync_buffer::{SyncBuffer, DEFAULT_MAX_BUFFER_SIZE};

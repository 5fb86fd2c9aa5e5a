//! Media capability contract and transports.
//!
//! A media is one endpoint a protocol stack exchanges bytes with. Every
//! transport implements [`Media`]:
//!
//! - [`TcpMedia`]: TCP client
//! - [`FileMedia`]: replays a recorded byte stream
//! - [`LoopbackMedia`]: in-memory double for tests
//!
//! The shared [`MediaCore`] runs the `Closed -> Opening -> Open -> Closing`
//! state machine, keeps byte counters, buffers data for synchronous reads
//! and delivers events to listeners on a dedicated worker thread.
//!
//! ```no_run
//! use medialink_frame::{DataType, ReceiveParameters};
//! use medialink_media::{Media, TcpMedia, TcpSettings};
//!
//! # fn main() -> medialink_core::Result<()> {
//! let media = TcpMedia::new(TcpSettings::new("127.0.0.1", 4059));
//! media.open()?;
//! let _sync = media.synchronous();
//! media.send(b"/?!\r\n", None)?;
//! let mut params = ReceiveParameters::new(DataType::String)
//!     .with_eop("\r\n")
//!     .with_wait_time(1_000);
//! if media.receive(&mut params)? {
//!     println!("{:?}", params.reply);
//! }
//! # Ok(())
//! # }
//! ```

pub mod base;
pub mod config;
pub mod dispatch;
pub mod events;
pub mod file;
pub mod loopback;
pub mod registry;
pub mod tcp;
pub mod traits;

mod reader;

pub use base::{ByteCounters, MediaCore, SynchronousGuard};
pub use config::MediaConfig;
pub use dispatch::{ErrorHandler, EventDispatcher, ReceivedHandler, StateHandler, TraceHandler};
pub use events::{ErrorEvent, MediaStateEvent, ReceiveEvent, TraceEvent};
pub use file::{FileMedia, FileSettings};
pub use loopback::{LoopbackMedia, LoopbackSettings};
pub use tcp::{TcpMedia, TcpSettings};
pub use traits::Media;

use std::time::{Duration, Instant};

use medialink_core::{MediaError, Result};

use crate::codec::{ByteOrder, DataType, Value};
use crate::eop::Eop;

/// Wait time meaning "block until the reply is complete or the media closes".
pub const WAIT_INFINITE: i64 = -1;

/// Arguments and result slot for one synchronous read.
///
/// Completion criteria, in order of precedence:
/// 1. `eop` set: complete once the terminator has arrived.
/// 2. `count > 0`: complete once `count` bytes are buffered.
/// 3. neither: complete as soon as any bytes are buffered.
///
/// With [`media_eop`](Self::media_eop) set, a request without `eop` falls
/// back to the terminator configured on the media.
///
/// In every mode the read gives up after `wait_time` milliseconds.
#[derive(Debug, Clone, PartialEq)]
pub struct ReceiveParameters {
    /// Leave matched bytes buffered for the next read.
    pub peek: bool,
    /// Terminator that ends a reply.
    pub eop: Option<Eop>,
    /// Use the media's terminator when `eop` is not set.
    pub media_eop: bool,
    /// Exact number of reply bytes; 0 means unbounded.
    pub count: usize,
    /// Milliseconds to wait, [`WAIT_INFINITE`] for no limit.
    pub wait_time: i64,
    /// Return everything buffered instead of only the matched frame.
    pub all_data: bool,
    /// Type the reply bytes are decoded into.
    pub reply_type: DataType,
    /// Byte order for multi-byte reply types.
    pub byte_order: ByteOrder,
    /// Decoded reply, set when the read completes.
    pub reply: Option<Value>,
}

impl ReceiveParameters {
    /// Consuming read with infinite wait, decoding into `reply_type`.
    pub fn new(reply_type: DataType) -> Self {
        Self {
            peek: false,
            eop: None,
            media_eop: false,
            count: 0,
            wait_time: WAIT_INFINITE,
            all_data: false,
            reply_type,
            byte_order: ByteOrder::default(),
            reply: None,
        }
    }

    pub fn with_eop(mut self, eop: impl Into<Eop>) -> Self {
        self.eop = Some(eop.into());
        self
    }

    /// Terminate on the media's own EOP unless `eop` is given.
    pub fn with_media_eop(mut self) -> Self {
        self.media_eop = true;
        self
    }

    pub fn with_count(mut self, count: usize) -> Self {
        self.count = count;
        self
    }

    pub fn with_wait_time(mut self, millis: i64) -> Self {
        self.wait_time = millis;
        self
    }

    pub fn with_byte_order(mut self, order: ByteOrder) -> Self {
        self.byte_order = order;
        self
    }

    pub fn with_peek(mut self, peek: bool) -> Self {
        self.peek = peek;
        self
    }

    pub fn with_all_data(mut self, all_data: bool) -> Self {
        self.all_data = all_data;
        self
    }

    /// Take the decoded reply out of the parameters.
    pub fn take_reply(&mut self) -> Option<Value> {
        self.reply.take()
    }

    /// Check the request is well formed.
    pub fn validate(&self) -> Result<()> {
        if self.wait_time < WAIT_INFINITE {
            return Err(MediaError::ArgumentOutOfRange {
                name: "wait_time",
                value: self.wait_time,
            });
        }
        if let Some(eop) = &self.eop {
            if !eop.is_valid() {
                return Err(MediaError::invalid("end of packet is empty"));
            }
        }
        Ok(())
    }

    /// Wait budget as a duration, `None` when infinite.
    pub fn timeout(&self) -> Option<Duration> {
        u64::try_from(self.wait_time).ok().map(Duration::from_millis)
    }

    /// `None` when the wait is infinite or too far out to represent.
    pub(crate) fn deadline(&self, start: Instant) -> Option<Instant> {
        self.timeout().and_then(|timeout| start.checked_add(timeout))
    }
}

impl Default for ReceiveParameters {
    fn default() -> Self {
        Self::new(DataType::default())
    }
}

use medialink_core::{MediaError, MediaState, Result, TraceLevel, TraceTypes};
use medialink_frame::{ByteOrder, Eop, ReceiveParameters, Value};

use crate::base::{MediaCore, SynchronousGuard};
use crate::dispatch::{ErrorHandler, ReceivedHandler, StateHandler, TraceHandler};

/// Capability contract every transport satisfies.
///
/// A transport implements the I/O specific operations and hands out its
/// [`MediaCore`]; everything else has a provided implementation on top of
/// the core. The trait is object safe, so callers can hold a
/// `Box<dyn Media>` picked at runtime.
pub trait Media: Send + Sync {
    /// Shared state machine, counters and event dispatch.
    fn core(&self) -> &MediaCore;

    /// Connect to the endpoint described by the current settings.
    fn open(&self) -> Result<()>;

    /// Disconnect. Closing a closed media is a no-op.
    fn close(&self) -> Result<()>;

    /// Write `data` without waiting for a reply.
    ///
    /// `receiver` is a media dependent destination hint; transports with a
    /// single peer ignore it. Fails with `ConnectionClosed` unless open.
    fn send(&self, data: &[u8], receiver: Option<&str>) -> Result<()>;

    /// Transport settings as a JSON string.
    fn settings(&self) -> String;

    /// Replace the transport settings from a JSON string.
    fn set_settings(&self, settings: &str) -> Result<()>;

    /// Check the current settings are usable for `open`.
    fn validate(&self) -> Result<()>;

    /// Synchronous read into `params.reply`.
    ///
    /// Returns `Ok(false)` when the wait time elapsed first. Fails with
    /// `ConnectionClosed` unless open, or when the media closes while
    /// waiting.
    fn receive(&self, params: &mut ReceiveParameters) -> Result<bool> {
        self.core().receive(params)
    }

    /// Encode `value` and send it.
    fn send_value(&self, value: &Value, order: ByteOrder, receiver: Option<&str>) -> Result<()> {
        self.send(&value.encode(order), receiver)
    }

    fn media_type(&self) -> &'static str {
        self.core().media_type()
    }

    fn name(&self) -> String {
        self.core().name()
    }

    fn state(&self) -> MediaState {
        self.core().state()
    }

    fn is_open(&self) -> bool {
        self.core().is_open()
    }

    fn trace(&self) -> TraceLevel {
        self.core().trace_level()
    }

    fn set_trace(&self, level: TraceLevel) {
        self.core().set_trace_level(level);
    }

    fn trace_mask(&self) -> TraceTypes {
        self.core().trace_mask()
    }

    fn set_trace_mask(&self, mask: TraceTypes) {
        self.core().set_trace_mask(mask);
    }

    fn eop(&self) -> Option<Eop> {
        self.core().eop()
    }

    fn set_eop(&self, eop: Option<Eop>) -> Result<()> {
        self.core().set_eop(eop)
    }

    fn bytes_sent(&self) -> u64 {
        self.core().bytes_sent()
    }

    fn bytes_received(&self) -> u64 {
        self.core().bytes_received()
    }

    fn reset_byte_counters(&self) {
        self.core().reset_byte_counters();
    }

    /// Suppress received events until the guard drops.
    fn synchronous(&self) -> SynchronousGuard<'_> {
        self.core().synchronous()
    }

    fn is_synchronous(&self) -> bool {
        self.core().is_synchronous()
    }

    fn reset_synchronous_buffer(&self) {
        self.core().reset_synchronous_buffer();
    }

    fn on_received(&self, handler: ReceivedHandler) {
        self.core().on_received(handler);
    }

    fn on_error(&self, handler: ErrorHandler) {
        self.core().on_error(handler);
    }

    /// State listeners run synchronously on the thread changing the state
    /// and may veto `Opening` or `Open`.
    fn on_media_state_change(&self, handler: StateHandler) {
        self.core().on_state_change(handler);
    }

    fn on_trace(&self, handler: TraceHandler) {
        self.core().on_trace(handler);
    }

    /// Language for error event messages, e.g. `"de"` or `"fi-FI"`.
    fn localize(&self, language: &str) {
        self.core().localize(language);
    }

    /// Copy configuration to `target`: settings, trace level and mask, EOP
    /// and language. Connection state is not copied.
    fn copy_to(&self, target: &dyn Media) -> Result<()> {
        if target.media_type() != self.media_type() {
            return Err(MediaError::invalid(format!(
                "cannot copy {} settings to {} media",
                self.media_type(),
                target.media_type()
            )));
        }
        target.set_settings(&self.settings())?;
        target.set_trace(self.trace());
        target.set_trace_mask(self.trace_mask());
        target.set_eop(self.eop())?;
        target.localize(&self.core().language());
        Ok(())
    }
}

use std::sync::atomic::{AtomicUsize, Ordering};

use medialink_core::{MediaError, MediaState, Result, TraceLevel, TraceTypes};
use medialink_frame::{Eop, ReceiveParameters, SyncBuffer, Value};
use parking_lot::{Mutex, RwLock};
use tracing::{debug, info, trace, warn};

use crate::config::MediaConfig;
use crate::dispatch::{ErrorHandler, EventDispatcher, ReceivedHandler, StateHandler, TraceHandler};
use crate::events::{ErrorEvent, MediaStateEvent, ReceiveEvent, TraceEvent};
use crate::registry;

/// Cumulative traffic of a media since open or the last reset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ByteCounters {
    pub sent: u64,
    pub received: u64,
}

#[derive(Debug, Clone, Copy)]
struct TraceFilter {
    level: TraceLevel,
    mask: TraceTypes,
}

/// Transport-independent half of a media.
///
/// Owns the connection state machine, byte counters, synchronous receive
/// buffer, event dispatch and trace filtering. A transport embeds one
/// `MediaCore`, drives the lifecycle through [`open_with`](Self::open_with)
/// and [`close_with`](Self::close_with), and feeds every chunk it reads into
/// [`handle_received`](Self::handle_received).
pub struct MediaCore {
    media_type: &'static str,
    name: RwLock<String>,
    state: Mutex<MediaState>,
    // Loss reported by the read loop before `Open` was reached.
    lost: Mutex<Option<MediaError>>,
    claimed: Mutex<Option<String>>,
    counters: Mutex<ByteCounters>,
    buffer: SyncBuffer,
    events: EventDispatcher,
    trace: RwLock<TraceFilter>,
    eop: RwLock<Option<Eop>>,
    synchronous: AtomicUsize,
    language: RwLock<String>,
}

impl MediaCore {
    pub fn new(media_type: &'static str, name: impl Into<String>, config: MediaConfig) -> Self {
        Self {
            media_type,
            name: RwLock::new(name.into()),
            state: Mutex::new(MediaState::Closed),
            lost: Mutex::new(None),
            claimed: Mutex::new(None),
            counters: Mutex::new(ByteCounters::default()),
            buffer: SyncBuffer::with_max_size(config.max_buffer_size),
            events: EventDispatcher::new(media_type),
            trace: RwLock::new(TraceFilter {
                level: config.trace,
                mask: config.trace_mask,
            }),
            eop: RwLock::new(None),
            synchronous: AtomicUsize::new(0),
            language: RwLock::new(config.language),
        }
    }

    pub fn media_type(&self) -> &'static str {
        self.media_type
    }

    pub fn name(&self) -> String {
        self.name.read().clone()
    }

    /// Rename the media. Not allowed while open.
    pub fn set_name(&self, name: impl Into<String>) -> Result<()> {
        if self.state() != MediaState::Closed {
            return Err(MediaError::invalid("cannot rename an open media"));
        }
        *self.name.write() = name.into();
        Ok(())
    }

    pub fn state(&self) -> MediaState {
        *self.state.lock()
    }

    pub fn is_open(&self) -> bool {
        self.state() == MediaState::Open
    }

    /// Fail with `ConnectionClosed` unless the media is open.
    pub fn ensure_open(&self) -> Result<()> {
        if self.is_open() {
            Ok(())
        } else {
            Err(MediaError::ConnectionClosed)
        }
    }

    /// Run the open sequence around the transport's `connect`.
    ///
    /// `Opening` is announced before `connect` runs and `Open` after it
    /// succeeds. A veto of either notification fails the open with
    /// `StateChangeRejected`; if the veto comes after `connect`, `rollback`
    /// undoes the connection. A failed open always ends `Closed`.
    pub fn open_with<C, R>(&self, connect: C, rollback: R) -> Result<()>
    where
        C: FnOnce() -> Result<()>,
        R: FnOnce(),
    {
        {
            let mut state = self.state.lock();
            if *state == MediaState::Open {
                return Err(MediaError::invalid("media is already open"));
            }
            if !state.can_transition_to(MediaState::Opening) {
                return Err(MediaError::invalid(format!("media is {}", *state)));
            }
            *state = MediaState::Opening;
            *self.lost.lock() = None;
        }

        if !self.announce(MediaState::Opening) {
            warn!(media = %self.name(), "open vetoed by listener");
            self.finish_closed();
            return Err(MediaError::StateChangeRejected {
                state: MediaState::Opening,
            });
        }

        let name = self.name();
        if let Err(err) = registry::claim(&name) {
            self.finish_closed();
            return Err(err);
        }
        *self.claimed.lock() = Some(name.clone());
        self.buffer.open();

        if let Err(err) = connect() {
            debug!(media = %name, error = %err, "connect failed");
            self.trace_event(TraceTypes::ERROR, Some(Value::from(err.to_string())), None);
            self.buffer.close();
            self.release_name();
            self.finish_closed();
            return Err(err);
        }

        // State stays `Opening` until listeners accept `Open`.
        if !self.announce(MediaState::Open) {
            warn!(media = %name, "open vetoed by listener");
            rollback();
            self.buffer.close();
            self.release_name();
            self.finish_closed();
            return Err(MediaError::StateChangeRejected {
                state: MediaState::Open,
            });
        }

        let lost = {
            let mut state = self.state.lock();
            match self.lost.lock().take() {
                None if state.can_transition_to(MediaState::Open) => {
                    *state = MediaState::Open;
                    None
                }
                None => Some(MediaError::invalid(format!("media is {}", *state))),
                lost => lost,
            }
        };
        if let Some(err) = lost {
            warn!(media = %name, error = %err, "connection lost while opening");
            self.trace_event(TraceTypes::ERROR, Some(Value::from(err.to_string())), None);
            rollback();
            self.announce(MediaState::Closing);
            self.buffer.close();
            self.release_name();
            self.finish_closed();
            return Err(err);
        }

        info!(media = %name, media_type = self.media_type, "media opened");
        Ok(())
    }

    /// Run the close sequence around the transport's `disconnect`.
    ///
    /// Blocked receivers are released with `ConnectionClosed` before
    /// `disconnect` runs. Closing a closed media only runs `disconnect`,
    /// which must therefore be idempotent.
    pub fn close_with<D>(&self, disconnect: D) -> Result<()>
    where
        D: FnOnce() -> Result<()>,
    {
        {
            let mut state = self.state.lock();
            if *state == MediaState::Closed {
                drop(state);
                return disconnect();
            }
            if !state.can_transition_to(MediaState::Closing) {
                return Err(MediaError::invalid(format!("media is {}", *state)));
            }
            *state = MediaState::Closing;
        }

        if !self.announce(MediaState::Closing) {
            warn!(media = %self.name(), "close cannot be vetoed, closing anyway");
        }
        self.buffer.close();
        let result = disconnect();
        self.release_name();
        self.finish_closed();
        info!(media = %self.name(), "media closed");
        result
    }

    /// Close after the transport lost its connection on its own.
    ///
    /// Called from the transport's read loop. A loss while `Opening` is
    /// kept and fails the pending open. In any state other than `Open` and
    /// `Opening` this does nothing, so a read loop ending because of
    /// `close()` is quiet.
    pub fn connection_lost(&self, error: Option<MediaError>) {
        {
            let mut state = self.state.lock();
            if *state == MediaState::Opening {
                debug!(media = %self.name(), "connection lost before open completed");
                *self.lost.lock() = Some(error.unwrap_or(MediaError::ConnectionClosed));
                return;
            }
            if !state.can_transition_to(MediaState::Closing) {
                return;
            }
            *state = MediaState::Closing;
        }

        warn!(media = %self.name(), "connection lost");
        if let Some(error) = error {
            self.report_error(error);
        }
        self.announce(MediaState::Closing);
        self.buffer.close();
        self.release_name();
        self.finish_closed();
    }

    /// Announce that settings changed while open.
    pub fn settings_changed(&self) {
        if self.state().can_transition_to(MediaState::Changed)
            && !self.announce(MediaState::Changed)
        {
            warn!(media = %self.name(), "settings change notification vetoed, ignored");
        }
    }

    /// Feed one chunk read by the transport.
    ///
    /// Counts the bytes, appends them to the synchronous buffer and, unless
    /// a synchronous guard is held, queues a received event.
    pub fn handle_received(&self, data: &[u8], sender: &str) {
        if data.is_empty() {
            return;
        }
        trace!(media = %self.name(), len = data.len(), "received chunk");
        self.counters.lock().received += data.len() as u64;

        let dropped = self.buffer.push(data);
        if dropped > 0 {
            self.trace_event(
                TraceTypes::WARNING,
                Some(Value::from(format!("dropped {dropped} buffered bytes"))),
                None,
            );
        }

        self.trace_event(TraceTypes::RECEIVED, Some(Value::from(data)), None);
        if !self.is_synchronous() && self.events.has_received_listeners() {
            self.events.received(ReceiveEvent::new(data.to_vec(), sender));
        }
    }

    /// Account for bytes the transport has written.
    pub fn record_sent(&self, data: &[u8], receiver: Option<&str>) {
        trace!(media = %self.name(), len = data.len(), "sent chunk");
        self.counters.lock().sent += data.len() as u64;
        self.trace_event(
            TraceTypes::SENT,
            Some(Value::from(data)),
            receiver.map(str::to_string),
        );
    }

    /// Synchronous read.
    ///
    /// The request is used as given. Only a request built with
    /// [`ReceiveParameters::with_media_eop`] and no `eop` of its own is
    /// terminated by the media's EOP.
    pub fn receive(&self, params: &mut ReceiveParameters) -> Result<bool> {
        self.ensure_open()?;
        if params.media_eop && params.eop.is_none() {
            params.eop = self.eop();
            let completed = self.buffer.receive(params);
            params.eop = None;
            return completed;
        }
        self.buffer.receive(params)
    }

    pub fn counters(&self) -> ByteCounters {
        *self.counters.lock()
    }

    pub fn bytes_sent(&self) -> u64 {
        self.counters.lock().sent
    }

    pub fn bytes_received(&self) -> u64 {
        self.counters.lock().received
    }

    /// Zero both counters in one step.
    pub fn reset_byte_counters(&self) {
        *self.counters.lock() = ByteCounters::default();
    }

    pub fn trace_level(&self) -> TraceLevel {
        self.trace.read().level
    }

    pub fn set_trace_level(&self, level: TraceLevel) {
        self.trace.write().level = level;
    }

    pub fn trace_mask(&self) -> TraceTypes {
        self.trace.read().mask
    }

    pub fn set_trace_mask(&self, mask: TraceTypes) {
        self.trace.write().mask = mask;
    }

    pub fn eop(&self) -> Option<Eop> {
        self.eop.read().clone()
    }

    pub fn set_eop(&self, eop: Option<Eop>) -> Result<()> {
        if eop.as_ref().is_some_and(|eop| !eop.is_valid()) {
            return Err(MediaError::invalid("end of packet is empty"));
        }
        *self.eop.write() = eop;
        Ok(())
    }

    /// Enter synchronous mode until the returned guard drops.
    pub fn synchronous(&self) -> SynchronousGuard<'_> {
        self.synchronous.fetch_add(1, Ordering::SeqCst);
        SynchronousGuard { core: self }
    }

    pub fn is_synchronous(&self) -> bool {
        self.synchronous.load(Ordering::SeqCst) > 0
    }

    /// Discard everything buffered for synchronous reads.
    pub fn reset_synchronous_buffer(&self) {
        self.buffer.clear();
    }

    /// Bytes waiting in the synchronous buffer.
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    pub fn language(&self) -> String {
        self.language.read().clone()
    }

    /// Language for messages of subsequent error events.
    pub fn localize(&self, language: &str) {
        *self.language.write() = language.to_string();
    }

    pub fn on_received(&self, handler: ReceivedHandler) {
        self.events.on_received(handler);
    }

    pub fn on_error(&self, handler: ErrorHandler) {
        self.events.on_error(handler);
    }

    /// State listeners run on the thread performing the transition.
    pub fn on_state_change(&self, handler: StateHandler) {
        self.events.on_state_change(handler);
    }

    pub fn on_trace(&self, handler: TraceHandler) {
        self.events.on_trace(handler);
    }

    /// Report an asynchronous failure to error listeners.
    pub fn report_error(&self, error: MediaError) {
        warn!(media = %self.name(), error = %error, "media error");
        self.trace_event(TraceTypes::ERROR, Some(Value::from(error.to_string())), None);
        self.events.error(ErrorEvent::new(error, &self.language()));
    }

    /// Queue a trace event if the level and mask both let `kind` through.
    pub fn trace_event(&self, kind: TraceTypes, data: Option<Value>, receiver: Option<String>) {
        let filter = *self.trace.read();
        if !filter.level.allows(kind) || !filter.mask.contains(kind) {
            return;
        }
        if self.events.has_trace_listeners() {
            self.events.trace(TraceEvent::new(kind, data, receiver));
        }
    }

    /// Wait until every queued event has reached its listeners.
    pub fn flush_events(&self) {
        self.events.flush();
    }

    fn announce(&self, state: MediaState) -> bool {
        debug!(media = %self.name(), %state, "state change");
        self.trace_event(TraceTypes::INFO, Some(Value::from(state.to_string())), None);
        self.events.state_changed(&mut MediaStateEvent::new(state))
    }

    fn finish_closed(&self) {
        *self.state.lock() = MediaState::Closed;
        self.announce(MediaState::Closed);
    }

    fn release_name(&self) {
        if let Some(name) = self.claimed.lock().take() {
            registry::release(&name);
        }
    }
}

impl Drop for MediaCore {
    fn drop(&mut self) {
        self.buffer.close();
        self.release_name();
    }
}

/// Keeps a media in synchronous mode while alive.
///
/// Received events are suppressed in synchronous mode; bytes still reach
/// the synchronous buffer.
#[must_use = "synchronous mode ends when the guard is dropped"]
pub struct SynchronousGuard<'a> {
    core: &'a MediaCore,
}

impl Drop for SynchronousGuard<'_> {
    fn drop(&mut self) {
        self.core.synchronous.fetch_sub(1, Ordering::SeqCst);
    }
}

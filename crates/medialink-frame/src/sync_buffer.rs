use std::time::Instant;

use bytes::{Buf, Bytes, BytesMut};
use medialink_core::{MediaError, Result};
use parking_lot::{Condvar, Mutex, MutexGuard};
use tracing::{debug, warn};

use crate::codec::decode;
use crate::eop::{EopMatcher, FrameMatch};
use crate::params::ReceiveParameters;

const INITIAL_BUFFER_CAPACITY: usize = 8 * 1024;

/// Default upper bound for buffered bytes: 1 MiB.
pub const DEFAULT_MAX_BUFFER_SIZE: usize = 1024 * 1024;

/// Accumulation buffer between a transport's read loop and synchronous readers.
///
/// The transport calls [`push`](Self::push) with every chunk it reads; callers
/// block in [`receive`](Self::receive) until a reply is complete. All state
/// lives behind one mutex, so a push never interleaves with a partially
/// consumed read.
pub struct SyncBuffer {
    state: Mutex<BufferState>,
    ready: Condvar,
    max_size: usize,
}

struct BufferState {
    data: BytesMut,
    open: bool,
    receiving: bool,
    /// Bumped whenever bytes are removed by anything other than the reader,
    /// so an in-flight matcher knows its offsets are stale.
    epoch: u64,
}

impl SyncBuffer {
    pub fn new() -> Self {
        Self::with_max_size(DEFAULT_MAX_BUFFER_SIZE)
    }

    /// Buffer that keeps at most `max_size` bytes, dropping the oldest.
    pub fn with_max_size(max_size: usize) -> Self {
        Self {
            state: Mutex::new(BufferState {
                data: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY.min(max_size)),
                open: false,
                receiving: false,
                epoch: 0,
            }),
            ready: Condvar::new(),
            max_size: max_size.max(1),
        }
    }

    /// Accept pushes and reads. Starts from an empty buffer.
    pub fn open(&self) {
        let mut state = self.state.lock();
        state.data.clear();
        state.epoch += 1;
        state.open = true;
    }

    /// Stop accepting pushes and wake every blocked reader.
    ///
    /// Readers waiting at that moment fail with [`MediaError::ConnectionClosed`].
    pub fn close(&self) {
        let mut state = self.state.lock();
        state.open = false;
        self.ready.notify_all();
    }

    pub fn is_open(&self) -> bool {
        self.state.lock().open
    }

    /// Whether a [`receive`](Self::receive) call is currently in flight.
    pub fn is_receiving(&self) -> bool {
        self.state.lock().receiving
    }

    /// Append a chunk read by the transport.
    ///
    /// Returns the number of old bytes dropped to stay within the size limit.
    /// Pushes on a closed buffer are ignored.
    pub fn push(&self, chunk: &[u8]) -> usize {
        if chunk.is_empty() {
            return 0;
        }
        let mut state = self.state.lock();
        if !state.open {
            debug!(len = chunk.len(), "dropping chunk pushed to closed buffer");
            return 0;
        }

        let mut dropped = 0;
        let overflow = (state.data.len() + chunk.len()).saturating_sub(self.max_size);
        let chunk = if overflow > 0 {
            let from_buffer = overflow.min(state.data.len());
            state.data.advance(from_buffer);
            state.epoch += 1;
            dropped = overflow;
            warn!(dropped, max = self.max_size, "synchronous buffer full, dropping oldest bytes");
            &chunk[overflow - from_buffer..]
        } else {
            chunk
        };

        state.data.extend_from_slice(chunk);
        self.ready.notify_all();
        dropped
    }

    /// Discard everything buffered.
    pub fn clear(&self) {
        let mut state = self.state.lock();
        state.data.clear();
        state.epoch += 1;
    }

    /// Number of buffered bytes.
    pub fn len(&self) -> usize {
        self.state.lock().data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Copy of the buffered bytes, without consuming them.
    pub fn snapshot(&self) -> Bytes {
        Bytes::copy_from_slice(&self.state.lock().data)
    }

    /// Block until the reply described by `params` is complete.
    ///
    /// Returns `Ok(true)` with `params.reply` set on completion, and
    /// `Ok(false)` when the wait time elapses first; a timeout is not an
    /// error and leaves partial data buffered. Only one read may be in
    /// flight at a time: a concurrent call fails with
    /// [`MediaError::InvalidArgument`].
    pub fn receive(&self, params: &mut ReceiveParameters) -> Result<bool> {
        params.validate()?;
        let deadline = params.deadline(Instant::now());

        let mut state = self.state.lock();
        if !state.open {
            return Err(MediaError::ConnectionClosed);
        }
        if state.receiving {
            return Err(MediaError::invalid("a synchronous receive is already in progress"));
        }

        state.receiving = true;
        let result = self.wait_for_reply(&mut state, params, deadline);
        state.receiving = false;
        result
    }

    fn wait_for_reply(
        &self,
        state: &mut MutexGuard<'_, BufferState>,
        params: &mut ReceiveParameters,
        deadline: Option<Instant>,
    ) -> Result<bool> {
        let mut matcher = params.eop.as_ref().map(EopMatcher::new);
        let mut epoch = state.epoch;

        loop {
            if !state.open {
                return Err(MediaError::ConnectionClosed);
            }
            if state.epoch != epoch {
                epoch = state.epoch;
                if let Some(matcher) = matcher.as_mut() {
                    matcher.reset();
                }
            }

            if let Some(end) = frame_end(&state.data, params, matcher.as_mut())? {
                let take = if params.all_data {
                    state.data.len()
                } else {
                    end
                };
                let reply = decode(&state.data[..take], params.reply_type, params.byte_order)?;
                if !params.peek {
                    state.data.advance(take);
                }
                debug!(len = take, peek = params.peek, "synchronous reply complete");
                params.reply = Some(reply);
                return Ok(true);
            }

            match deadline {
                None => self.ready.wait(state),
                Some(deadline) => {
                    if Instant::now() >= deadline {
                        return Ok(false);
                    }
                    let _ = self.ready.wait_until(state, deadline);
                }
            }
        }
    }
}

impl Default for SyncBuffer {
    fn default() -> Self {
        Self::new()
    }
}

/// End offset of the reply in `data`, or `None` if it is not complete yet.
fn frame_end(
    data: &[u8],
    params: &ReceiveParameters,
    matcher: Option<&mut EopMatcher>,
) -> Result<Option<usize>> {
    if let Some(matcher) = matcher {
        return match matcher.scan(data) {
            FrameMatch::Complete(end) => Ok(Some(end)),
            FrameMatch::Incomplete => Ok(None),
            FrameMatch::InvalidTerminator => Err(MediaError::invalid("end of packet is empty")),
        };
    }

    if params.count > 0 {
        return Ok((data.len() >= params.count).then_some(params.count));
    }

    // Drain mode: fixed-width replies wait for a whole value, the rest take
    // whatever has arrived.
    match params.reply_type.width() {
        Some(width) => Ok((data.len() >= width).then_some(width)),
        None => Ok((!data.is_empty()).then_some(data.len())),
    }
}

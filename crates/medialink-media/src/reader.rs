use std::io::{ErrorKind, Read};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use medialink_core::{MediaError, MediaState, TraceTypes};
use medialink_frame::Value;
use tracing::debug;

use crate::base::MediaCore;

pub(crate) const READ_CHUNK_SIZE: usize = 8 * 1024;

/// What a read loop does when its source reports end of stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum EndOfStream {
    /// The peer went away: close the media.
    Disconnect,
    /// Nothing more to read: stay open.
    Idle,
}

/// Options for [`spawn`].
#[derive(Debug, Clone)]
pub(crate) struct ReadLoop {
    pub sender: String,
    pub chunk_size: usize,
    pub pace: Option<Duration>,
    pub end: EndOfStream,
}

/// Start a thread that pushes everything read from `source` into `core`.
pub(crate) fn spawn<R>(core: Arc<MediaCore>, source: R, options: ReadLoop) -> std::io::Result<JoinHandle<()>>
where
    R: Read + Send + 'static,
{
    thread::Builder::new()
        .name(format!("medialink-read-{}", core.media_type()))
        .spawn(move || run(&core, source, &options))
}

fn run<R: Read>(core: &MediaCore, mut source: R, options: &ReadLoop) {
    let mut chunk = vec![0u8; options.chunk_size.max(1)];
    loop {
        let read = match source.read(&mut chunk) {
            Ok(n) => n,
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            Err(err) => {
                debug!(media = %core.name(), error = %err, "read loop failed");
                core.connection_lost(Some(MediaError::from(err)));
                return;
            }
        };

        if read == 0 {
            match options.end {
                EndOfStream::Disconnect => {
                    debug!(media = %core.name(), "peer closed the connection");
                    core.connection_lost(Some(MediaError::ConnectionClosed));
                }
                EndOfStream::Idle => {
                    debug!(media = %core.name(), "end of input");
                    core.trace_event(TraceTypes::INFO, Some(Value::from("end of input")), None);
                }
            }
            return;
        }

        core.handle_received(&chunk[..read], &options.sender);
        if matches!(core.state(), MediaState::Closing | MediaState::Closed) {
            return;
        }
        if let Some(pace) = options.pace {
            thread::sleep(pace);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use medialink_frame::{DataType, ReceiveParameters};

    use super::*;
    use crate::config::MediaConfig;

    fn open_core(name: &str) -> Arc<MediaCore> {
        let core = Arc::new(MediaCore::new("test", name, MediaConfig::default()));
        core.open_with(|| Ok(()), || {}).unwrap();
        core
    }

    #[test]
    fn idle_end_keeps_media_open() {
        let core = open_core("reader-idle");
        let handle = spawn(
            Arc::clone(&core),
            Cursor::new(b"abc\ndef\n".to_vec()),
            ReadLoop {
                sender: "cursor".into(),
                chunk_size: 3,
                pace: None,
                end: EndOfStream::Idle,
            },
        )
        .unwrap();
        handle.join().unwrap();

        assert!(core.is_open());
        assert_eq!(core.bytes_received(), 8);
        let mut params = ReceiveParameters::new(DataType::String)
            .with_eop(b'\n')
            .with_wait_time(0);
        assert!(core.receive(&mut params).unwrap());
        assert_eq!(params.reply.unwrap().as_str(), Some("abc\n"));
    }

    #[test]
    fn disconnect_end_closes_media() {
        let core = open_core("reader-disconnect");
        spawn(
            Arc::clone(&core),
            Cursor::new(Vec::new()),
            ReadLoop {
                sender: "cursor".into(),
                chunk_size: READ_CHUNK_SIZE,
                pace: None,
                end: EndOfStream::Disconnect,
            },
        )
        .unwrap()
        .join()
        .unwrap();

        assert_eq!(core.state(), MediaState::Closed);
    }
}

use std::io::Write;
use std::net::{Shutdown, SocketAddr, TcpStream, ToSocketAddrs};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use medialink_core::{MediaError, Result};
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::base::MediaCore;
use crate::config::MediaConfig;
use crate::reader::{self, EndOfStream, ReadLoop, READ_CHUNK_SIZE};
use crate::traits::Media;

/// Settings of a [`TcpMedia`], serialized as its settings string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TcpSettings {
    pub host: String,
    pub port: u16,
    /// Connect timeout in milliseconds, 0 for the system default.
    pub connect_timeout_ms: u64,
    /// Disable Nagle's algorithm.
    pub no_delay: bool,
}

impl Default for TcpSettings {
    fn default() -> Self {
        Self {
            host: String::new(),
            port: 0,
            connect_timeout_ms: 5_000,
            no_delay: true,
        }
    }
}

impl TcpSettings {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            ..Self::default()
        }
    }

    /// `host:port`, also used as the media name.
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn validate(&self) -> Result<()> {
        if self.host.trim().is_empty() {
            return Err(MediaError::invalid("host name is empty"));
        }
        if self.port == 0 {
            return Err(MediaError::ArgumentOutOfRange {
                name: "port",
                value: 0,
            });
        }
        Ok(())
    }

    fn resolve(&self) -> Result<SocketAddr> {
        (self.host.as_str(), self.port)
            .to_socket_addrs()?
            .next()
            .ok_or_else(|| MediaError::invalid(format!("cannot resolve {}", self.address())))
    }
}

/// TCP client media.
///
/// A read thread pushes every chunk the peer sends into the media; the peer
/// closing the socket closes the media and raises an error event.
pub struct TcpMedia {
    core: Arc<MediaCore>,
    settings: RwLock<TcpSettings>,
    stream: Mutex<Option<TcpStream>>,
    reader: Mutex<Option<JoinHandle<()>>>,
}

impl TcpMedia {
    pub const MEDIA_TYPE: &'static str = "Net";

    pub fn new(settings: TcpSettings) -> Self {
        Self::with_config(settings, MediaConfig::default())
    }

    pub fn with_config(settings: TcpSettings, config: MediaConfig) -> Self {
        Self {
            core: Arc::new(MediaCore::new(Self::MEDIA_TYPE, settings.address(), config)),
            settings: RwLock::new(settings),
            stream: Mutex::new(None),
            reader: Mutex::new(None),
        }
    }

    pub fn tcp_settings(&self) -> TcpSettings {
        self.settings.read().clone()
    }

    /// Address of the connected peer.
    pub fn peer_addr(&self) -> Option<SocketAddr> {
        self.stream.lock().as_ref().and_then(|s| s.peer_addr().ok())
    }

    fn connect(&self, settings: &TcpSettings) -> Result<()> {
        self.disconnect()?;

        let addr = settings.resolve()?;
        debug!(%addr, "connecting");
        let stream = if settings.connect_timeout_ms == 0 {
            TcpStream::connect(addr)?
        } else {
            TcpStream::connect_timeout(&addr, Duration::from_millis(settings.connect_timeout_ms))?
        };
        stream.set_nodelay(settings.no_delay)?;
        let peer = stream.peer_addr().map_or_else(|_| addr.to_string(), |a| a.to_string());

        let handle = reader::spawn(
            Arc::clone(&self.core),
            stream.try_clone()?,
            ReadLoop {
                sender: peer.clone(),
                chunk_size: READ_CHUNK_SIZE,
                pace: None,
                end: EndOfStream::Disconnect,
            },
        )?;

        *self.stream.lock() = Some(stream);
        *self.reader.lock() = Some(handle);
        info!(%peer, "tcp connected");
        Ok(())
    }

    fn disconnect(&self) -> Result<()> {
        if let Some(stream) = self.stream.lock().take() {
            // The peer may already be gone.
            let _ = stream.shutdown(Shutdown::Both);
        }
        if let Some(handle) = self.reader.lock().take() {
            if handle.thread().id() != thread::current().id() {
                let _ = handle.join();
            }
        }
        Ok(())
    }
}

impl Media for TcpMedia {
    fn core(&self) -> &MediaCore {
        &self.core
    }

    fn open(&self) -> Result<()> {
        let settings = self.tcp_settings();
        settings.validate()?;
        if !self.core.is_open() {
            self.core.set_name(settings.address())?;
        }
        self.core.open_with(
            || self.connect(&settings),
            || {
                let _ = self.disconnect();
            },
        )
    }

    fn close(&self) -> Result<()> {
        self.core.close_with(|| self.disconnect())
    }

    fn send(&self, data: &[u8], receiver: Option<&str>) -> Result<()> {
        self.core.ensure_open()?;
        if let Some(receiver) = receiver {
            debug!(receiver, "receiver hint ignored by tcp client");
        }
        {
            let mut stream = self.stream.lock();
            let stream = stream.as_mut().ok_or(MediaError::ConnectionClosed)?;
            stream.write_all(data)?;
        }
        self.core.record_sent(data, receiver);
        Ok(())
    }

    fn settings(&self) -> String {
        serde_json::to_string(&*self.settings.read()).unwrap_or_default()
    }

    fn set_settings(&self, settings: &str) -> Result<()> {
        let parsed: TcpSettings = serde_json::from_str(settings)
            .map_err(|err| MediaError::invalid(format!("tcp settings: {err}")))?;
        if !self.core.is_open() {
            self.core.set_name(parsed.address())?;
        }
        *self.settings.write() = parsed;
        self.core.settings_changed();
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        self.settings.read().validate()
    }
}

impl Drop for TcpMedia {
    fn drop(&mut self) {
        let _ = self.close();
    }
}

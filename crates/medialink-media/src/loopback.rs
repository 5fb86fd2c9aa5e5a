use std::io;

use bytes::Bytes;
use medialink_core::{MediaError, Result};
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};

use crate::base::MediaCore;
use crate::config::MediaConfig;
use crate::traits::Media;

/// Settings of a [`LoopbackMedia`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LoopbackSettings {
    pub name: String,
    /// Deliver every sent payload back as received data.
    pub echo: bool,
}

impl Default for LoopbackSettings {
    fn default() -> Self {
        Self {
            name: "loopback".to_string(),
            echo: false,
        }
    }
}

impl LoopbackSettings {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_echo(mut self, echo: bool) -> Self {
        self.echo = echo;
        self
    }
}

/// In-memory media without I/O.
///
/// Tests drive the receive side with [`inject`](Self::inject) and inspect
/// what was sent with [`sent`](Self::sent).
pub struct LoopbackMedia {
    core: MediaCore,
    settings: RwLock<LoopbackSettings>,
    sent: Mutex<Vec<Bytes>>,
}

impl LoopbackMedia {
    pub const MEDIA_TYPE: &'static str = "Loopback";

    pub fn new(settings: LoopbackSettings) -> Self {
        Self::with_config(settings, MediaConfig::default())
    }

    pub fn with_config(settings: LoopbackSettings, config: MediaConfig) -> Self {
        Self {
            core: MediaCore::new(Self::MEDIA_TYPE, settings.name.clone(), config),
            settings: RwLock::new(settings),
            sent: Mutex::new(Vec::new()),
        }
    }

    /// Deliver `data` as if the peer sent it.
    pub fn inject(&self, data: &[u8]) -> Result<()> {
        self.core.ensure_open()?;
        self.core.handle_received(data, "loopback");
        Ok(())
    }

    /// Simulate the peer dropping the connection.
    pub fn drop_connection(&self) {
        self.core.connection_lost(Some(MediaError::from(io::Error::from(
            io::ErrorKind::ConnectionReset,
        ))));
    }

    /// Payloads sent so far, oldest first.
    pub fn sent(&self) -> Vec<Bytes> {
        self.sent.lock().clone()
    }
}

impl Media for LoopbackMedia {
    fn core(&self) -> &MediaCore {
        &self.core
    }

    fn open(&self) -> Result<()> {
        self.validate()?;
        if !self.core.is_open() {
            self.core.set_name(self.settings.read().name.clone())?;
        }
        self.core.open_with(|| Ok(()), || {})
    }

    fn close(&self) -> Result<()> {
        self.core.close_with(|| Ok(()))
    }

    fn send(&self, data: &[u8], receiver: Option<&str>) -> Result<()> {
        self.core.ensure_open()?;
        self.sent.lock().push(Bytes::copy_from_slice(data));
        self.core.record_sent(data, receiver);
        if self.settings.read().echo {
            self.core.handle_received(data, receiver.unwrap_or("loopback"));
        }
        Ok(())
    }

    fn settings(&self) -> String {
        serde_json::to_string(&*self.settings.read()).unwrap_or_default()
    }

    fn set_settings(&self, settings: &str) -> Result<()> {
        let parsed: LoopbackSettings = serde_json::from_str(settings)
            .map_err(|err| MediaError::invalid(format!("loopback settings: {err}")))?;
        if !self.core.is_open() {
            self.core.set_name(parsed.name.clone())?;
        }
        *self.settings.write() = parsed;
        self.core.settings_changed();
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        if self.settings.read().name.is_empty() {
            return Err(MediaError::invalid("media name is empty"));
        }
        Ok(())
    }
}

impl Drop for LoopbackMedia {
    fn drop(&mut self) {
        let _ = self.close();
    }
}

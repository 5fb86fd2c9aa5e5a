use std::fs::{File, OpenOptions};
use std::io::{BufReader, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use medialink_core::{MediaError, Result};
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::base::MediaCore;
use crate::config::MediaConfig;
use crate::reader::{self, EndOfStream, ReadLoop};
use crate::traits::Media;

const DEFAULT_CHUNK_SIZE: usize = 256;

/// Settings of a [`FileMedia`], serialized as its settings string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FileSettings {
    /// Capture to replay as received data.
    pub path: PathBuf,
    /// File that sent data is appended to. Sending fails without one.
    pub output: Option<PathBuf>,
    /// Bytes delivered per simulated read.
    pub chunk_size: usize,
    /// Pause between deliveries in milliseconds.
    pub delay_ms: u64,
}

impl Default for FileSettings {
    fn default() -> Self {
        Self {
            path: PathBuf::new(),
            output: None,
            chunk_size: DEFAULT_CHUNK_SIZE,
            delay_ms: 0,
        }
    }
}

impl FileSettings {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.path.as_os_str().is_empty() {
            return Err(MediaError::invalid("file path is empty"));
        }
        if self.chunk_size == 0 {
            return Err(MediaError::ArgumentOutOfRange {
                name: "chunk_size",
                value: 0,
            });
        }
        Ok(())
    }
}

/// Replays a recorded byte stream as if a device sent it.
///
/// The file is read in `chunk_size` pieces, each delivered like one
/// transport read. Reaching the end of the file leaves the media open.
pub struct FileMedia {
    core: Arc<MediaCore>,
    settings: RwLock<FileSettings>,
    output: Mutex<Option<File>>,
    reader: Mutex<Option<JoinHandle<()>>>,
}

impl FileMedia {
    pub const MEDIA_TYPE: &'static str = "File";

    pub fn new(settings: FileSettings) -> Self {
        Self::with_config(settings, MediaConfig::default())
    }

    pub fn with_config(settings: FileSettings, config: MediaConfig) -> Self {
        Self {
            core: Arc::new(MediaCore::new(
                Self::MEDIA_TYPE,
                settings.path.display().to_string(),
                config,
            )),
            settings: RwLock::new(settings),
            output: Mutex::new(None),
            reader: Mutex::new(None),
        }
    }

    pub fn file_settings(&self) -> FileSettings {
        self.settings.read().clone()
    }

    /// Wait until the whole file has been delivered.
    pub fn wait_replayed(&self) {
        if let Some(handle) = self.reader.lock().take() {
            let _ = handle.join();
        }
    }

    fn connect(&self, settings: &FileSettings) -> Result<()> {
        self.disconnect()?;

        let input = File::open(&settings.path)?;
        if let Some(path) = &settings.output {
            let output = OpenOptions::new().create(true).append(true).open(path)?;
            *self.output.lock() = Some(output);
        }

        let sender = settings.path.display().to_string();
        let handle = reader::spawn(
            Arc::clone(&self.core),
            BufReader::new(input),
            ReadLoop {
                sender: sender.clone(),
                chunk_size: settings.chunk_size,
                pace: (settings.delay_ms > 0).then(|| Duration::from_millis(settings.delay_ms)),
                end: EndOfStream::Idle,
            },
        )?;
        *self.reader.lock() = Some(handle);
        info!(path = %sender, "file replay started");
        Ok(())
    }

    fn disconnect(&self) -> Result<()> {
        if let Some(mut output) = self.output.lock().take() {
            output.flush()?;
        }
        // The read loop stops after its next delivery once the media is closing.
        if let Some(handle) = self.reader.lock().take() {
            if handle.thread().id() != thread::current().id() {
                let _ = handle.join();
            }
        }
        Ok(())
    }
}

impl Media for FileMedia {
    fn core(&self) -> &MediaCore {
        &self.core
    }

    fn open(&self) -> Result<()> {
        let settings = self.file_settings();
        settings.validate()?;
        if !self.core.is_open() {
            self.core.set_name(settings.path.display().to_string())?;
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
        {
            let mut output = self.output.lock();
            let output = output
                .as_mut()
                .ok_or_else(|| MediaError::invalid("file media has no output file"))?;
            output.write_all(data)?;
        }
        debug!(len = data.len(), "appended to output file");
        self.core.record_sent(data, receiver);
        Ok(())
    }

    fn settings(&self) -> String {
        serde_json::to_string(&*self.settings.read()).unwrap_or_default()
    }

    fn set_settings(&self, settings: &str) -> Result<()> {
        let parsed: FileSettings = serde_json::from_str(settings)
            .map_err(|err| MediaError::invalid(format!("file settings: {err}")))?;
        if !self.core.is_open() {
            self.core.set_name(parsed.path.display().to_string())?;
        }
        *self.settings.write() = parsed;
        self.core.settings_changed();
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        self.settings.read().validate()
    }
}

impl Drop for FileMedia {
    fn drop(&mut self) {
        let _ = self.close();
    }
}

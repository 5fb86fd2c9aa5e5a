use medialink_core::localize::DEFAULT_LANGUAGE;
use medialink_core::{TraceLevel, TraceTypes};
use medialink_frame::DEFAULT_MAX_BUFFER_SIZE;
use serde::{Deserialize, Serialize};

/// Transport-independent media configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MediaConfig {
    /// Upper bound for bytes held for synchronous reads. Oldest bytes are
    /// dropped beyond it.
    pub max_buffer_size: usize,
    /// Initial trace verbosity.
    pub trace: TraceLevel,
    /// Initial trace category mask.
    pub trace_mask: TraceTypes,
    /// Language of localized error messages.
    pub language: String,
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            max_buffer_size: DEFAULT_MAX_BUFFER_SIZE,
            trace: TraceLevel::Off,
            trace_mask: TraceTypes::ALL,
            language: DEFAULT_LANGUAGE.to_string(),
        }
    }
}

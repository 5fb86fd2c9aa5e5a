use clap::ValueEnum;
use medialink_core::{TraceLevel, TraceTypes};
use medialink_media::{Media, TraceEvent};
use tracing::level_filters::LevelFilter;
use tracing::{debug, error, info, warn};

/// Log target of forwarded media trace events.
pub const MEDIA_TRACE_TARGET: &str = "medialink::trace";

#[derive(Copy, Clone, Debug, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
pub enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn as_filter(self) -> LevelFilter {
        match self {
            LogLevel::Off => LevelFilter::OFF,
            LogLevel::Error => LevelFilter::ERROR,
            LogLevel::Warn => LevelFilter::WARN,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Trace => LevelFilter::TRACE,
        }
    }

    /// Media trace level shown at this log level.
    ///
    /// Media warnings and errors are already logged by the library, so
    /// traces start at `info`. Payload traces need `debug` or finer.
    pub fn media_trace_level(self) -> TraceLevel {
        match self {
            LogLevel::Off | LogLevel::Error | LogLevel::Warn => TraceLevel::Off,
            LogLevel::Info => TraceLevel::Info,
            LogLevel::Debug | LogLevel::Trace => TraceLevel::Verbose,
        }
    }
}

/// Log to stderr so stdout stays machine readable.
pub fn init_logging(format: LogFormat, level: LogLevel) {
    let builder = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(level.as_filter())
        .with_ansi(false)
        .with_thread_names(true);

    match format {
        LogFormat::Text => {
            let _ = builder.try_init();
        }
        LogFormat::Json => {
            let _ = builder.json().try_init();
        }
    }
}

/// Route the trace events of `media` into the log.
pub fn forward_media_traces(media: &dyn Media, level: LogLevel) {
    let trace_level = level.media_trace_level();
    media.set_trace(trace_level);
    if trace_level == TraceLevel::Off {
        return;
    }
    let name = media.name();
    media.on_trace(Box::new(move |event| log_media_trace(&name, event)));
}

fn log_media_trace(media: &str, event: &TraceEvent) {
    let kind = event.kind();
    let data = event.data().map(ToString::to_string).unwrap_or_default();
    let receiver = event.receiver().unwrap_or("-");
    if kind == TraceTypes::ERROR {
        error!(target: MEDIA_TRACE_TARGET, media, %kind, receiver, "{data}");
    } else if kind == TraceTypes::WARNING {
        warn!(target: MEDIA_TRACE_TARGET, media, %kind, receiver, "{data}");
    } else if kind == TraceTypes::INFO {
        info!(target: MEDIA_TRACE_TARGET, media, %kind, receiver, "{data}");
    } else {
        debug!(target: MEDIA_TRACE_TARGET, media, %kind, receiver, "{data}");
    }
}

use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Subcommand, ValueEnum};
use medialink_frame::{from_hex, ByteOrder, DataType, Eop};

use crate::exit::{CliError, CliResult, USAGE};
use crate::logging::LogLevel;
use crate::output::OutputFormat;

pub mod enums;
pub mod replay;
pub mod send;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Connect over TCP, send a payload and optionally wait for the reply.
    Send(SendArgs),
    /// Replay a recorded capture and print the frames it contains.
    Replay(ReplayArgs),
    /// List the textual encodings of the media enums.
    Enums(EnumsArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat, log_level: LogLevel) -> CliResult<i32> {
    match command {
        Command::Send(args) => send::run(args, format, log_level),
        Command::Replay(args) => replay::run(args, format, log_level),
        Command::Enums(args) => enums::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

/// How a reply is terminated.
#[derive(Args, Debug, Clone, Default)]
pub struct FramingArgs {
    /// End-of-packet text; accepts \r, \n, \t, \\ and \xNN escapes.
    #[arg(long, conflicts_with = "eop_hex")]
    pub eop: Option<String>,
    /// End-of-packet bytes as hex, e.g. "0D 0A".
    #[arg(long, value_name = "HEX")]
    pub eop_hex: Option<String>,
    /// Exact reply size in bytes, used when no end-of-packet is given.
    #[arg(long, default_value_t = 0)]
    pub count: usize,
    /// Type the reply is decoded into.
    #[arg(long, value_enum, default_value_t = ReplyType::Bytes)]
    pub reply_type: ReplyType,
    /// Byte order of integer replies.
    #[arg(long, value_enum, default_value_t = Endian::Big)]
    pub byte_order: Endian,
}

impl FramingArgs {
    pub fn terminator(&self) -> CliResult<Option<Eop>> {
        if let Some(text) = &self.eop {
            return parse_escaped(text).map(|bytes| Some(Eop::from(bytes)));
        }
        if let Some(hex) = &self.eop_hex {
            let bytes = from_hex(hex)
                .map_err(|err| CliError::new(USAGE, format!("--eop-hex: {err}")))?;
            if bytes.is_empty() {
                return Err(CliError::new(USAGE, "--eop-hex must not be empty"));
            }
            return Ok(Some(Eop::Bytes(bytes)));
        }
        Ok(None)
    }
}

#[derive(Args, Debug)]
pub struct SendArgs {
    /// Endpoint as host:port.
    pub address: String,
    /// Text payload; accepts the same escapes as --eop.
    #[arg(long, conflicts_with_all = ["hex", "file"])]
    pub data: Option<String>,
    /// Payload as hex bytes.
    #[arg(long, conflicts_with_all = ["data", "file"])]
    pub hex: Option<String>,
    /// Read payload from file.
    #[arg(long, conflicts_with_all = ["data", "hex"])]
    pub file: Option<PathBuf>,
    /// Wait for one reply and print it.
    #[arg(long)]
    pub wait: bool,
    /// Maximum time to wait for the reply (e.g. 5s, 500ms).
    #[arg(long, default_value = "5s")]
    pub wait_timeout: String,
    /// Connect timeout (e.g. 5s, 500ms).
    #[arg(long, default_value = "5s")]
    pub connect_timeout: String,
    /// Language of error messages.
    #[arg(long, env = "MEDIALINK_LANGUAGE", default_value = "en-US")]
    pub language: String,
    #[command(flatten)]
    pub framing: FramingArgs,
}

#[derive(Args, Debug)]
pub struct ReplayArgs {
    /// Capture file to replay.
    pub path: PathBuf,
    /// Bytes delivered per simulated read.
    #[arg(long, default_value_t = 256)]
    pub chunk_size: usize,
    /// Pause between simulated reads in milliseconds.
    #[arg(long, default_value_t = 0)]
    pub delay_ms: u64,
    /// Stop after N frames.
    #[arg(long)]
    pub frames: Option<usize>,
    /// Stop when no frame completes within this time (e.g. 500ms).
    #[arg(long, default_value = "500ms")]
    pub idle_timeout: String,
    /// Keep waiting for frames until interrupted.
    #[arg(long, conflicts_with = "idle_timeout")]
    pub follow: bool,
    /// Language of error messages.
    #[arg(long, env = "MEDIALINK_LANGUAGE", default_value = "en-US")]
    pub language: String,
    #[command(flatten)]
    pub framing: FramingArgs,
}

#[derive(Args, Debug)]
pub struct EnumsArgs {
    /// Only list this enum.
    #[arg(value_enum)]
    pub kind: Option<EnumKind>,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build information.
    #[arg(long)]
    pub extended: bool,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum ReplyType {
    String,
    #[default]
    Bytes,
    Byte,
    Int16,
    Int32,
    Int64,
    Uint16,
    Uint32,
    Uint64,
}

impl ReplyType {
    pub fn data_type(self) -> DataType {
        match self {
            ReplyType::String => DataType::String,
            ReplyType::Bytes => DataType::Bytes,
            ReplyType::Byte => DataType::Byte,
            ReplyType::Int16 => DataType::Int16,
            ReplyType::Int32 => DataType::Int32,
            ReplyType::Int64 => DataType::Int64,
            ReplyType::Uint16 => DataType::UInt16,
            ReplyType::Uint32 => DataType::UInt32,
            ReplyType::Uint64 => DataType::UInt64,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ReplyType::String => "string",
            ReplyType::Bytes => "bytes",
            ReplyType::Byte => "byte",
            ReplyType::Int16 => "int16",
            ReplyType::Int32 => "int32",
            ReplyType::Int64 => "int64",
            ReplyType::Uint16 => "uint16",
            ReplyType::Uint32 => "uint32",
            ReplyType::Uint64 => "uint64",
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum Endian {
    #[default]
    Big,
    Little,
}

impl Endian {
    pub fn byte_order(self) -> ByteOrder {
        match self {
            Endian::Big => ByteOrder::BigEndian,
            Endian::Little => ByteOrder::LittleEndian,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum EnumKind {
    BaudRate,
    Parity,
    StopBits,
    TraceLevel,
    TraceTypes,
    MediaState,
    ErrorKind,
}

pub fn parse_duration(input: &str) -> CliResult<Duration> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CliError::new(USAGE, "duration must not be empty"));
    }

    let (number, unit) = if let Some(num) = input.strip_suffix("ms") {
        (num, "ms")
    } else if let Some(num) = input.strip_suffix('s') {
        (num, "s")
    } else {
        (input, "s")
    };

    let value: u64 = number
        .parse()
        .map_err(|_| CliError::new(USAGE, format!("invalid duration value: {input}")))?;

    if value == 0 {
        return Err(CliError::new(USAGE, "duration must be greater than zero"));
    }

    match unit {
        "ms" => Ok(Duration::from_millis(value)),
        _ => Ok(Duration::from_secs(value)),
    }
}

/// Wait time in milliseconds as the receive engine expects it.
pub fn wait_millis(duration: Duration) -> i64 {
    i64::try_from(duration.as_millis()).unwrap_or(i64::MAX)
}

/// Expand `\r`, `\n`, `\t`, `\0`, `\\` and `\xNN` escapes.
pub fn parse_escaped(text: &str) -> CliResult<Vec<u8>> {
    let mut out = Vec::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            let mut buf = [0u8; 4];
            out.extend_from_slice(c.encode_utf8(&mut buf).as_bytes());
            continue;
        }
        match chars.next() {
            Some('r') => out.push(b'\r'),
            Some('n') => out.push(b'\n'),
            Some('t') => out.push(b'\t'),
            Some('0') => out.push(0),
            Some('\\') => out.push(b'\\'),
            Some('x') => {
                let hex: String = chars.by_ref().take(2).collect();
                let byte = u8::from_str_radix(&hex, 16)
                    .map_err(|_| CliError::new(USAGE, format!("invalid escape \\x{hex}")))?;
                out.push(byte);
            }
            Some(other) => {
                return Err(CliError::new(USAGE, format!("unknown escape \\{other}")));
            }
            None => return Err(CliError::new(USAGE, "dangling backslash")),
        }
    }
    if out.is_empty() {
        return Err(CliError::new(USAGE, "end of packet must not be empty"));
    }
    Ok(out)
}

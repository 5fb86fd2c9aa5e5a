use std::fs;

use medialink_frame::ReceiveParameters;
use medialink_media::{Media, TcpMedia, TcpSettings};
use tracing::info;

use crate::cmd::{parse_duration, parse_escaped, wait_millis, SendArgs};
use crate::exit::{io_error, media_error, CliError, CliResult, SUCCESS, TIMEOUT, USAGE};
use crate::logging::{forward_media_traces, LogLevel};
use crate::output::{print_frame, FrameRecord, OutputFormat};

pub fn run(args: SendArgs, format: OutputFormat, log_level: LogLevel) -> CliResult<i32> {
    let (host, port) = parse_address(&args.address)?;
    let wait_timeout = parse_duration(&args.wait_timeout)?;
    let connect_timeout = parse_duration(&args.connect_timeout)?;
    let eop = args.framing.terminator()?;
    let payload = resolve_payload(&args)?;
    let language = args.language.as_str();

    let mut settings = TcpSettings::new(host, port);
    settings.connect_timeout_ms = u64::try_from(connect_timeout.as_millis()).unwrap_or(u64::MAX);
    let media = TcpMedia::new(settings);
    media.localize(language);
    forward_media_traces(&media, log_level);
    media
        .open()
        .map_err(|err| media_error("connect failed", err, language))?;

    // Replies go to the synchronous buffer only.
    let _sync = args.wait.then(|| media.synchronous());
    media
        .send(&payload, None)
        .map_err(|err| media_error("send failed", err, language))?;
    info!(bytes = payload.len(), media = %media.name(), "payload sent");

    if args.wait {
        let order = args.framing.byte_order.byte_order();
        let mut params = ReceiveParameters::new(args.framing.reply_type.data_type())
            .with_count(args.framing.count)
            .with_wait_time(wait_millis(wait_timeout))
            .with_byte_order(order);
        params.eop = eop;

        let completed = media
            .receive(&mut params)
            .map_err(|err| media_error("receive failed", err, language))?;
        if !completed {
            return Err(CliError::new(
                TIMEOUT,
                format!("no reply within {}", args.wait_timeout),
            ));
        }
        if let Some(reply) = params.take_reply() {
            let record = FrameRecord::new(0, &media.name(), args.framing.reply_type.name(), &reply, order);
            print_frame(&record, format);
        }
    }

    media
        .close()
        .map_err(|err| media_error("close failed", err, language))?;
    Ok(SUCCESS)
}

fn resolve_payload(args: &SendArgs) -> CliResult<Vec<u8>> {
    if let Some(data) = &args.data {
        return parse_escaped(data);
    }
    if let Some(hex) = &args.hex {
        return medialink_frame::from_hex(hex)
            .map(|bytes| bytes.to_vec())
            .map_err(|err| CliError::new(USAGE, format!("--hex: {err}")));
    }
    if let Some(path) = &args.file {
        return fs::read(path)
            .map_err(|err| io_error(&format!("failed reading {}", path.display()), &err));
    }
    Err(CliError::new(USAGE, "one of --data, --hex or --file is required"))
}

/// Split `host:port`; IPv6 hosts may be bracketed.
fn parse_address(address: &str) -> CliResult<(String, u16)> {
    let (host, port) = address
        .rsplit_once(':')
        .ok_or_else(|| CliError::new(USAGE, format!("expected host:port, got {address:?}")))?;
    let host = host.trim_start_matches('[').trim_end_matches(']');
    if host.is_empty() {
        return Err(CliError::new(USAGE, format!("missing host in {address:?}")));
    }
    let port: u16 = port
        .parse()
        .map_err(|_| CliError::new(USAGE, format!("invalid port in {address:?}")))?;
    Ok((host.to_string(), port))
}

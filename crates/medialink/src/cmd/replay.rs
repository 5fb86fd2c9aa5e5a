use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use medialink_frame::{ReceiveParameters, WAIT_INFINITE};
use medialink_media::{FileMedia, FileSettings, Media};
use tracing::{debug, info};

use crate::cmd::{parse_duration, wait_millis, ReplayArgs};
use crate::exit::{media_error, CliError, CliResult, INTERNAL, SUCCESS, USAGE};
use crate::logging::{forward_media_traces, LogLevel};
use crate::output::{print_frame, print_frames, FrameRecord, OutputFormat};

pub fn run(args: ReplayArgs, format: OutputFormat, log_level: LogLevel) -> CliResult<i32> {
    let eop = args.framing.terminator()?;
    if eop.is_none() && args.framing.count == 0 {
        return Err(CliError::new(
            USAGE,
            "replay needs --eop, --eop-hex or --count to split frames",
        ));
    }
    let wait_time = if args.follow {
        WAIT_INFINITE
    } else {
        wait_millis(parse_duration(&args.idle_timeout)?)
    };
    let language = args.language.as_str();
    let order = args.framing.byte_order.byte_order();
    let reply_type = args.framing.reply_type;

    let mut settings = FileSettings::new(&args.path);
    settings.chunk_size = args.chunk_size;
    settings.delay_ms = args.delay_ms;
    let media = Arc::new(FileMedia::new(settings));
    media.localize(language);
    forward_media_traces(&*media, log_level);
    media
        .open()
        .map_err(|err| media_error("replay failed", err, language))?;

    let interrupted = Arc::new(AtomicBool::new(false));
    if args.follow {
        install_ctrlc_handler(Arc::clone(&media), Arc::clone(&interrupted))?;
    }

    let _sync = media.synchronous();
    let name = media.name();
    let mut table = Vec::new();
    let mut index = 0usize;
    while !args.frames.is_some_and(|limit| index >= limit) {
        let mut params = ReceiveParameters::new(reply_type.data_type())
            .with_count(args.framing.count)
            .with_wait_time(wait_time)
            .with_byte_order(order);
        params.eop = eop.clone();

        match media.receive(&mut params) {
            Ok(true) => {}
            Ok(false) => break,
            Err(err) if interrupted.load(Ordering::SeqCst) => {
                debug!(error = %err, "replay interrupted");
                break;
            }
            Err(err) => return Err(media_error("replay failed", err, language)),
        }
        let Some(value) = params.take_reply() else {
            break;
        };

        let record = FrameRecord::new(index, &name, reply_type.name(), &value, order);
        if matches!(format, OutputFormat::Table) {
            table.push(record);
        } else {
            print_frame(&record, format);
        }
        index += 1;
    }
    print_frames(&table, format);

    let leftover = media.core().buffered();
    if leftover > 0 {
        info!(bytes = leftover, "unterminated data left after last frame");
    }
    info!(frames = index, path = %name, "replay finished");

    // After Ctrl-C the signal handler owns the close.
    if !interrupted.load(Ordering::SeqCst) {
        media
            .close()
            .map_err(|err| media_error("close failed", err, language))?;
    }
    Ok(SUCCESS)
}

fn install_ctrlc_handler(media: Arc<FileMedia>, interrupted: Arc<AtomicBool>) -> CliResult<()> {
    ctrlc::set_handler(move || {
        interrupted.store(true, Ordering::SeqCst);
        // Closing wakes the pending receive.
        let _ = media.close();
    })
    .map_err(|err| CliError::new(INTERNAL, format!("signal handler setup failed: {err}")))
}

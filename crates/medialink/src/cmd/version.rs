use medialink_core::localize::{supported_languages, DEFAULT_LANGUAGE};
use medialink_frame::DEFAULT_MAX_BUFFER_SIZE;
use medialink_media::{FileMedia, LoopbackMedia, TcpMedia};

use crate::cmd::VersionArgs;
use crate::exit::{CliResult, SUCCESS};

pub fn run(args: VersionArgs) -> CliResult<i32> {
    if !args.extended {
        println!("medialink {}", env!("CARGO_PKG_VERSION"));
        return Ok(SUCCESS);
    }

    println!("name: medialink");
    println!("version: {}", env!("CARGO_PKG_VERSION"));
    println!("target_os: {}", std::env::consts::OS);
    println!("target_arch: {}", std::env::consts::ARCH);
    println!(
        "media: {}, {}, {}",
        TcpMedia::MEDIA_TYPE,
        FileMedia::MEDIA_TYPE,
        LoopbackMedia::MEDIA_TYPE
    );
    println!(
        "languages: {} (default {DEFAULT_LANGUAGE})",
        supported_languages().join(", ")
    );
    println!("max_buffer_size: {DEFAULT_MAX_BUFFER_SIZE}");

    Ok(SUCCESS)
}

use std::io::{IsTerminal, Write};

use chrono::{SecondsFormat, Utc};
use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use medialink_frame::{to_hex, ByteOrder, Value};
use serde::Serialize;

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
    Raw,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

/// One reply or replayed frame.
#[derive(Debug, Serialize)]
pub struct FrameRecord {
    pub index: usize,
    pub media: String,
    pub data_type: &'static str,
    pub size: usize,
    pub value: String,
    pub hex: String,
    #[serde(skip)]
    pub raw: Vec<u8>,
    pub timestamp: String,
}

impl FrameRecord {
    /// `order` is the byte order the value was decoded with.
    pub fn new(
        index: usize,
        media: &str,
        data_type: &'static str,
        value: &Value,
        order: ByteOrder,
    ) -> Self {
        let raw = value.encode(order).to_vec();
        Self {
            index,
            media: media.to_string(),
            data_type,
            size: raw.len(),
            value: display_value(value),
            hex: to_hex(&raw),
            raw,
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        }
    }
}

/// One textual encoding of an enum value.
#[derive(Debug, Serialize)]
pub struct EnumRow {
    pub kind: &'static str,
    pub name: String,
    pub value: String,
}

pub fn print_frame(frame: &FrameRecord, format: OutputFormat) {
    print_frames(std::slice::from_ref(frame), format);
}

pub fn print_frames(frames: &[FrameRecord], format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            for frame in frames {
                println!(
                    "{}",
                    serde_json::to_string(frame).unwrap_or_else(|_| "{}".to_string())
                );
            }
        }
        OutputFormat::Table => {
            if frames.is_empty() {
                return;
            }
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["#", "MEDIA", "TYPE", "SIZE", "VALUE", "HEX"]);
            for frame in frames {
                table.add_row(vec![
                    frame.index.to_string(),
                    frame.media.clone(),
                    frame.data_type.to_string(),
                    frame.size.to_string(),
                    frame.value.clone(),
                    frame.hex.clone(),
                ]);
            }
            println!("{table}");
        }
        OutputFormat::Pretty => {
            for frame in frames {
                println!(
                    "#{} media={} type={} size={} value={}",
                    frame.index, frame.media, frame.data_type, frame.size, frame.value
                );
            }
        }
        OutputFormat::Raw => {
            for frame in frames {
                print_raw(&frame.raw);
            }
        }
    }
}

pub fn print_enums(rows: &[EnumRow], format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string(rows).unwrap_or_else(|_| "[]".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["KIND", "NAME", "VALUE"]);
            for row in rows {
                table.add_row(vec![row.kind.to_string(), row.name.clone(), row.value.clone()]);
            }
            println!("{table}");
        }
        OutputFormat::Pretty => {
            for row in rows {
                println!("{}: {} = {}", row.kind, row.name, row.value);
            }
        }
        OutputFormat::Raw => {
            for row in rows {
                println!("{}", row.value);
            }
        }
    }
}

pub fn print_raw(data: &[u8]) {
    let mut out = std::io::stdout();
    let _ = out.write_all(data);
    let _ = out.flush();
}

/// Text values are shown with control characters escaped.
fn display_value(value: &Value) -> String {
    match value {
        Value::String(text) => text.escape_debug().to_string(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_record_for_text() {
        let record = FrameRecord::new(
            1,
            "capture.bin",
            "string",
            &Value::from("OK\r\n"),
            ByteOrder::BigEndian,
        );
        assert_eq!(record.size, 4);
        assert_eq!(record.value, "OK\\r\\n");
        assert_eq!(record.hex, "4F 4B 0D 0A");
    }

    #[test]
    fn frame_record_for_integer_uses_big_endian_bytes() {
        let record = FrameRecord::new(0, "net", "uint16", &Value::UInt16(0x0102), ByteOrder::BigEndian);
        assert_eq!(record.value, "258");
        assert_eq!(record.hex, "01 02");
    }

    #[test]
    fn frame_record_keeps_decode_byte_order() {
        let record = FrameRecord::new(
            0,
            "net",
            "uint16",
            &Value::UInt16(0x0102),
            ByteOrder::LittleEndian,
        );
        assert_eq!(record.hex, "02 01");
    }

    #[test]
    fn frame_record_json_omits_raw_bytes() {
        let record = FrameRecord::new(2, "m", "bytes", &Value::from(vec![0xAA]), ByteOrder::BigEndian);
        let json = serde_json::to_string(&record).expect("record should serialize");
        assert!(json.contains(r#""hex":"AA""#));
        assert!(!json.contains("raw"));
    }
}

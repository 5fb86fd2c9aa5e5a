use medialink_core::localize::DEFAULT_LANGUAGE;
use medialink_core::{BaudRate, ErrorKind, MediaState, Parity, StopBits, TraceLevel, TraceTypes};

use crate::cmd::{EnumKind, EnumsArgs};
use crate::exit::{CliResult, SUCCESS};
use crate::output::{print_enums, EnumRow, OutputFormat};

const KINDS: [EnumKind; 7] = [
    EnumKind::BaudRate,
    EnumKind::Parity,
    EnumKind::StopBits,
    EnumKind::TraceLevel,
    EnumKind::TraceTypes,
    EnumKind::MediaState,
    EnumKind::ErrorKind,
];

pub fn run(args: EnumsArgs, format: OutputFormat) -> CliResult<i32> {
    let rows: Vec<EnumRow> = match args.kind {
        Some(kind) => rows(kind),
        None => KINDS.into_iter().flat_map(rows).collect(),
    };
    print_enums(&rows, format);
    Ok(SUCCESS)
}

fn rows(kind: EnumKind) -> Vec<EnumRow> {
    match kind {
        EnumKind::BaudRate => BaudRate::ALL
            .iter()
            .map(|rate| row("baud-rate", format!("{rate:?}"), rate.to_string()))
            .collect(),
        EnumKind::Parity => textual("parity", Parity::ALL),
        EnumKind::StopBits => textual("stop-bits", StopBits::ALL),
        EnumKind::TraceLevel => textual("trace-level", TraceLevel::ALL),
        EnumKind::MediaState => textual("media-state", MediaState::ALL),
        EnumKind::TraceTypes => TraceTypes::categories()
            .map(|kind| row("trace-types", kind.to_string(), kind.bits().to_string()))
            .collect(),
        EnumKind::ErrorKind => ErrorKind::ALL
            .iter()
            .map(|kind| {
                row(
                    "error-kind",
                    kind.key().to_string(),
                    kind.message(DEFAULT_LANGUAGE).to_string(),
                )
            })
            .collect(),
    }
}

fn textual<T: std::fmt::Debug + std::fmt::Display>(kind: &'static str, values: &[T]) -> Vec<EnumRow> {
    values
        .iter()
        .map(|value| row(kind, format!("{value:?}"), value.to_string()))
        .collect()
}

fn row(kind: &'static str, name: String, value: String) -> EnumRow {
    EnumRow { kind, name, value }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_kind_has_rows() {
        for kind in KINDS {
            assert!(!rows(kind).is_empty(), "{kind:?} should list values");
        }
    }

    #[test]
    fn baud_rate_value_is_bits_per_second() {
        let rows = rows(EnumKind::BaudRate);
        let row = rows
            .iter()
            .find(|row| row.name == "Baud9600")
            .expect("9600 baud should be listed");
        assert_eq!(row.value, "9600");
    }

    #[test]
    fn trace_types_list_single_categories() {
        let values: Vec<_> = rows(EnumKind::TraceTypes)
            .into_iter()
            .map(|row| row.name)
            .collect();
        assert_eq!(values, ["SENT", "RECEIVED", "ERROR", "WARNING", "INFO"]);
    }
}

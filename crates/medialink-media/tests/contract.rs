use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use medialink_core::{ErrorKind, MediaState, TraceLevel, TraceTypes};
use medialink_frame::{ByteOrder, DataType, Eop, ReceiveParameters, Value};
use medialink_media::{
    FileMedia, FileSettings, LoopbackMedia, LoopbackSettings, Media, MediaConfig,
};
use parking_lot::Mutex;

fn loopback(name: &str) -> LoopbackMedia {
    LoopbackMedia::new(LoopbackSettings::new(name))
}

#[test]
fn operations_on_closed_media_fail_with_connection_closed() {
    let media: Box<dyn Media> = Box::new(loopback("contract-closed"));
    assert_eq!(
        media.send(b"x", None).expect_err("send").kind(),
        ErrorKind::ConnectionClosed
    );
    let mut params = ReceiveParameters::new(DataType::Bytes).with_wait_time(0);
    assert_eq!(
        media.receive(&mut params).expect_err("receive").kind(),
        ErrorKind::ConnectionClosed
    );
    media.close().expect("closing a closed media is a no-op");
}

#[test]
fn double_open_fails_with_invalid_argument() {
    let media = loopback("contract-double-open");
    media.open().expect("open");
    assert_eq!(
        media.open().expect_err("second open").kind(),
        ErrorKind::InvalidArgument
    );
    assert!(media.is_open());
}

#[test]
fn opening_veto_fails_open() {
    let media = loopback("contract-veto-opening");
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    media.on_media_state_change(Box::new(move |event| {
        counter.fetch_add(1, Ordering::SeqCst);
        if event.state() == MediaState::Opening {
            event.set_accepted(false);
        }
    }));

    assert_eq!(
        media.open().expect_err("vetoed").kind(),
        ErrorKind::StateChangeRejected
    );
    assert_eq!(media.state(), MediaState::Closed);
    // Opening, then Closed.
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[test]
fn settings_change_while_open_is_announced() {
    let media = loopback("contract-changed");
    let states = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&states);
    media.on_media_state_change(Box::new(move |event| sink.lock().push(event.state())));

    media.set_settings(r#"{"name":"contract-changed","echo":true}"#).expect("closed update");
    media.open().expect("open");
    media.set_settings(r#"{"name":"contract-changed","echo":false}"#).expect("open update");

    assert_eq!(
        *states.lock(),
        vec![MediaState::Opening, MediaState::Open, MediaState::Changed]
    );
}

#[test]
fn counter_reset_is_atomic_under_concurrent_traffic() {
    let media = Arc::new(loopback("contract-counters"));
    media.open().expect("open");
    let stop = Arc::new(AtomicBool::new(false));

    let senders: Vec<_> = (0..4)
        .map(|_| {
            let media = Arc::clone(&media);
            let stop = Arc::clone(&stop);
            thread::spawn(move || {
                while !stop.load(Ordering::SeqCst) {
                    media.send(&[0u8; 16], None).expect("send");
                }
            })
        })
        .collect();

    for _ in 0..50 {
        media.reset_byte_counters();
        // Every send adds 16 bytes at once, so a torn reset would show as a
        // count that is not a multiple of 16.
        assert_eq!(media.bytes_sent() % 16, 0);
    }
    stop.store(true, Ordering::SeqCst);
    for sender in senders {
        sender.join().expect("sender thread");
    }
    media.reset_byte_counters();
    assert_eq!(media.bytes_sent(), 0);
    assert_eq!(media.bytes_received(), 0);
}

#[test]
fn slow_listener_does_not_stall_the_push_path() {
    let media = loopback("contract-slow-listener");
    media.on_received(Box::new(|_| thread::sleep(Duration::from_millis(100))));
    media.open().expect("open");

    let start = Instant::now();
    for _ in 0..10 {
        media.inject(b"chunk").expect("inject");
    }
    assert!(start.elapsed() < Duration::from_millis(100));
    assert_eq!(media.bytes_received(), 50);
}

#[test]
fn received_events_are_one_per_delivery() {
    let media = loopback("contract-one-per-delivery");
    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&events);
    media.on_received(Box::new(move |event| sink.lock().push(event.to_string())));
    media.open().expect("open");

    media.inject(b"OK\nex").expect("inject");
    media.inject(b"tra").expect("inject");
    media.core().flush_events();

    assert_eq!(
        *events.lock(),
        vec!["loopback\t4F 4B 0A 65 78".to_string(), "loopback\t74 72 61".to_string()]
    );
}

#[test]
fn eop_frame_leaves_the_rest_buffered() {
    let media = loopback("contract-leftover");
    media.open().expect("open");
    media.inject(b"OK\n").expect("inject");
    media.inject(b"extra").expect("inject");

    let mut params = ReceiveParameters::new(DataType::String)
        .with_eop(b'\n')
        .with_wait_time(0);
    assert!(media.receive(&mut params).expect("receive"));
    assert_eq!(params.reply, Some(Value::from("OK\n")));

    let mut params = ReceiveParameters::new(DataType::String)
        .with_count(5)
        .with_wait_time(0);
    assert!(media.receive(&mut params).expect("receive"));
    assert_eq!(params.reply, Some(Value::from("extra")));
}

#[test]
fn drain_returns_buffered_bytes_despite_media_eop() {
    let media = loopback("contract-drain");
    media.set_eop(Some(Eop::Byte(b'\n'))).expect("eop");
    media.open().expect("open");
    media.inject(b"partial").expect("inject");

    let mut params = ReceiveParameters::new(DataType::Bytes).with_wait_time(100);
    assert!(media.receive(&mut params).expect("receive"));
    assert_eq!(params.reply, Some(Value::from(b"partial".to_vec())));
}

#[test]
fn typed_values_travel_with_explicit_byte_order() {
    let media = LoopbackMedia::new(LoopbackSettings::new("contract-typed").with_echo(true));
    media.open().expect("open");
    media
        .send_value(&Value::UInt32(0x0102_0304), ByteOrder::LittleEndian, None)
        .expect("send");
    assert_eq!(media.sent()[0].as_ref(), &[0x04, 0x03, 0x02, 0x01]);

    let mut params = ReceiveParameters::new(DataType::UInt32)
        .with_byte_order(ByteOrder::LittleEndian)
        .with_wait_time(0);
    assert!(media.receive(&mut params).expect("receive"));
    assert_eq!(params.reply, Some(Value::UInt32(0x0102_0304)));
}

#[test]
fn copy_transfers_configuration_only() {
    let source = LoopbackMedia::new(LoopbackSettings::new("contract-copy-src").with_echo(true));
    source.set_trace(TraceLevel::Info);
    source.set_trace_mask(TraceTypes::ERROR);
    source.set_eop(Some(Eop::Byte(0x7E))).expect("eop");
    source.localize("sv");
    source.open().expect("open");

    let target = loopback("contract-copy-dst");
    source.copy_to(&target).expect("copy");

    assert_eq!(target.settings(), source.settings());
    assert_eq!(target.trace(), TraceLevel::Info);
    assert_eq!(target.trace_mask(), TraceTypes::ERROR);
    assert_eq!(target.eop(), Some(Eop::Byte(0x7E)));
    assert_eq!(target.core().language(), "sv");
    assert!(!target.is_open());
}

#[test]
fn copy_between_media_types_is_rejected() {
    let source = loopback("contract-copy-mismatch");
    let target = FileMedia::new(FileSettings::new("capture.bin"));
    assert_eq!(
        source.copy_to(&target).expect_err("mismatch").kind(),
        ErrorKind::InvalidArgument
    );
}

#[test]
fn overflow_drops_oldest_bytes_and_warns() {
    let config = MediaConfig {
        max_buffer_size: 4,
        trace: TraceLevel::Warning,
        ..MediaConfig::default()
    };
    let media = LoopbackMedia::with_config(LoopbackSettings::new("contract-overflow"), config);
    let warnings = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&warnings);
    media.on_trace(Box::new(move |event| {
        if event.kind() == TraceTypes::WARNING {
            counter.fetch_add(1, Ordering::SeqCst);
        }
    }));
    media.open().expect("open");
    media.inject(b"abcdef").expect("inject");
    media.core().flush_events();

    assert_eq!(warnings.load(Ordering::SeqCst), 1);
    let mut params = ReceiveParameters::new(DataType::String).with_wait_time(0);
    assert!(media.receive(&mut params).expect("receive"));
    assert_eq!(params.reply, Some(Value::from("cdef")));
}

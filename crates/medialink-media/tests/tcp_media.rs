use std::io::{Read, Write};
use std::net::TcpListener;
use std::sync::mpsc;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use medialink_core::{ErrorKind, MediaState, TraceLevel, TraceTypes};
use medialink_frame::{DataType, ReceiveParameters, Value};
use medialink_media::{Media, MediaStateEvent, TcpMedia, TcpSettings};
use parking_lot::Mutex;

fn listener() -> (TcpListener, TcpSettings) {
    let listener = TcpListener::bind("127.0.0.1:0").expect("listener should bind");
    let port = listener
        .local_addr()
        .expect("listener should have an address")
        .port();
    (listener, TcpSettings::new("127.0.0.1", port))
}

/// Accepts one client and echoes everything it sends.
fn spawn_echo(listener: TcpListener) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        let (mut stream, _) = listener.accept().expect("listener should accept");
        let mut buf = [0u8; 1024];
        loop {
            match stream.read(&mut buf) {
                Ok(0) | Err(_) => break,
                Ok(n) => {
                    if stream.write_all(&buf[..n]).is_err() {
                        break;
                    }
                }
            }
        }
    })
}

fn wait_until(condition: impl Fn() -> bool) {
    for _ in 0..200 {
        if condition() {
            return;
        }
        thread::sleep(Duration::from_millis(10));
    }
    panic!("condition not reached within 2s");
}

#[test]
fn request_reply_over_echo_server() {
    let (listener, settings) = listener();
    let server = spawn_echo(listener);

    let media = TcpMedia::new(settings);
    media.open().expect("media should open");
    assert!(media.is_open());
    {
        let _sync = media.synchronous();
        media.send(b"AT+CSQ\r\n", None).expect("send should succeed");
        let mut params = ReceiveParameters::new(DataType::String)
            .with_eop("\r\n")
            .with_wait_time(2_000);
        assert!(media.receive(&mut params).expect("receive should succeed"));
        assert_eq!(params.reply, Some(Value::from("AT+CSQ\r\n")));
    }
    assert_eq!(media.bytes_sent(), 8);
    assert_eq!(media.bytes_received(), 8);

    media.close().expect("media should close");
    assert_eq!(media.state(), MediaState::Closed);
    server.join().expect("server thread should complete");
}

#[test]
fn reply_split_across_segments_is_reassembled() {
    let (listener, settings) = listener();
    let server = thread::spawn(move || {
        let (mut stream, _) = listener.accept().expect("listener should accept");
        for part in [&b"+CSQ: 2"[..], b"0\r", b"\nOK\r\n"] {
            stream.write_all(part).expect("write should succeed");
            stream.flush().expect("flush should succeed");
            thread::sleep(Duration::from_millis(20));
        }
        thread::sleep(Duration::from_millis(200));
    });

    let media = TcpMedia::new(settings);
    media.open().expect("media should open");
    let _sync = media.synchronous();

    let mut params = ReceiveParameters::new(DataType::String)
        .with_eop("\r\n")
        .with_wait_time(2_000);
    assert!(media.receive(&mut params).expect("receive should succeed"));
    assert_eq!(params.reply, Some(Value::from("+CSQ: 20\r\n")));

    let mut params = ReceiveParameters::new(DataType::String)
        .with_eop("\r\n")
        .with_wait_time(2_000);
    assert!(media.receive(&mut params).expect("receive should succeed"));
    assert_eq!(params.reply, Some(Value::from("OK\r\n")));

    server.join().expect("server thread should complete");
}

#[test]
fn receive_times_out_without_error() {
    let (listener, settings) = listener();
    let server = spawn_echo(listener);

    let media = TcpMedia::new(settings);
    media.open().expect("media should open");
    let mut params = ReceiveParameters::new(DataType::Bytes)
        .with_count(4)
        .with_wait_time(100);
    assert!(!media.receive(&mut params).expect("timeout is not an error"));
    assert!(params.reply.is_none());

    media.close().expect("media should close");
    server.join().expect("server thread should complete");
}

#[test]
fn close_unblocks_pending_receive() {
    let (listener, settings) = listener();
    let server = spawn_echo(listener);

    let media = Arc::new(TcpMedia::new(settings));
    media.open().expect("media should open");

    let reader = {
        let media = Arc::clone(&media);
        thread::spawn(move || {
            let mut params = ReceiveParameters::new(DataType::Bytes).with_eop(b'\n');
            media.receive(&mut params)
        })
    };
    thread::sleep(Duration::from_millis(100));
    media.close().expect("media should close");

    let err = reader
        .join()
        .expect("reader thread should complete")
        .expect_err("receive should fail");
    assert_eq!(err.kind(), ErrorKind::ConnectionClosed);
    server.join().expect("server thread should complete");
}

#[test]
fn peer_close_reports_error_and_closes() {
    let (listener, settings) = listener();
    let server = thread::spawn(move || {
        let (stream, _) = listener.accept().expect("listener should accept");
        thread::sleep(Duration::from_millis(50));
        drop(stream);
    });

    let media = TcpMedia::new(settings);
    let (tx, rx) = mpsc::channel();
    let tx = Mutex::new(tx);
    media.on_error(Box::new(move |event| {
        let _ = tx.lock().send(event.error().kind());
    }));
    media.open().expect("media should open");
    server.join().expect("server thread should complete");

    let kind = rx
        .recv_timeout(Duration::from_secs(2))
        .expect("error event should arrive");
    assert_eq!(kind, ErrorKind::ConnectionClosed);
    wait_until(|| media.state() == MediaState::Closed);
    assert_eq!(
        media.send(b"x", None).expect_err("send should fail").kind(),
        ErrorKind::ConnectionClosed
    );
}

#[test]
fn veto_fails_open_and_leaves_media_closed() {
    let (listener, settings) = listener();
    let media = TcpMedia::new(settings);
    media.on_media_state_change(Box::new(|event: &mut MediaStateEvent| {
        if event.state() == MediaState::Open {
            event.set_accepted(false);
        }
    }));

    let err = media.open().expect_err("open should be vetoed");
    assert_eq!(err.kind(), ErrorKind::StateChangeRejected);
    assert_eq!(media.state(), MediaState::Closed);
    drop(listener);
}

#[test]
fn peer_close_during_open_fails_the_open() {
    let (listener, settings) = listener();
    let server = thread::spawn(move || {
        let (mut stream, _) = listener.accept().expect("listener should accept");
        stream.write_all(b"bye\n").expect("write should succeed");
    });

    let media = TcpMedia::new(settings);
    media.on_media_state_change(Box::new(|event: &mut MediaStateEvent| {
        if event.state() == MediaState::Open {
            thread::sleep(Duration::from_millis(200));
        }
    }));

    let err = media.open().expect_err("open should fail after the peer left");
    assert_eq!(err.kind(), ErrorKind::ConnectionClosed);
    assert_eq!(media.state(), MediaState::Closed);

    let mut params = ReceiveParameters::new(DataType::Bytes);
    assert_eq!(
        media
            .receive(&mut params)
            .expect_err("receive on a closed media should fail")
            .kind(),
        ErrorKind::ConnectionClosed
    );
    server.join().expect("server thread should complete");
}

#[test]
fn connect_refused_is_connection_closed() {
    let (listener, settings) = listener();
    drop(listener);
    let media = TcpMedia::new(settings);
    assert_eq!(
        media.open().expect_err("connect should fail").kind(),
        ErrorKind::ConnectionClosed
    );
    assert!(!media.is_open());
}

#[test]
fn received_events_follow_arrival_order() {
    let (listener, settings) = listener();
    let server = thread::spawn(move || {
        let (mut stream, _) = listener.accept().expect("listener should accept");
        for i in 0..20u8 {
            stream.write_all(&[i]).expect("write should succeed");
            thread::sleep(Duration::from_millis(2));
        }
        thread::sleep(Duration::from_millis(200));
    });

    let media = TcpMedia::new(settings);
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    media.on_received(Box::new(move |event| {
        sink.lock().extend_from_slice(event.data());
    }));
    media.open().expect("media should open");
    server.join().expect("server thread should complete");
    media.core().flush_events();

    assert_eq!(*seen.lock(), (0..20u8).collect::<Vec<_>>());
}

#[test]
fn verbose_trace_reports_traffic() {
    let (listener, settings) = listener();
    let server = spawn_echo(listener);

    let media = TcpMedia::new(settings);
    media.set_trace(TraceLevel::Verbose);
    media.set_trace_mask(TraceTypes::SENT | TraceTypes::RECEIVED);
    let kinds = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&kinds);
    media.on_trace(Box::new(move |event| sink.lock().push(event.kind())));

    media.open().expect("media should open");
    let _sync = media.synchronous();
    media.send(b"ping\n", None).expect("send should succeed");
    let mut params = ReceiveParameters::new(DataType::Bytes)
        .with_eop(b'\n')
        .with_wait_time(2_000);
    assert!(media.receive(&mut params).expect("receive should succeed"));
    media.core().flush_events();

    let kinds = kinds.lock().clone();
    assert_eq!(kinds.first(), Some(&TraceTypes::SENT));
    assert!(kinds.contains(&TraceTypes::RECEIVED));
    assert!(!kinds.contains(&TraceTypes::INFO));

    media.close().expect("media should close");
    server.join().expect("server thread should complete");
}

#[test]
fn second_open_of_same_endpoint_is_rejected() {
    let (listener, settings) = listener();
    let server = spawn_echo(listener);

    let first = TcpMedia::new(settings.clone());
    first.open().expect("first media should open");
    let second = TcpMedia::new(settings);
    assert_eq!(
        second.open().expect_err("duplicate name").kind(),
        ErrorKind::InvalidArgument
    );

    first.close().expect("media should close");
    server.join().expect("server thread should complete");
}


//! Tests for serial-line listen sessions
//!
//! These tests verify:
//! - Frames become notifications with per-edge events
//! - The transport timeout is restored on every exit path
//! - Cancellation between poll slices
//! - Single-use session lifecycle

use std::time::Duration;

use chrono::{Local, TimeZone};
use sdi_client::listen::{FrameSource, LineFrameSource, ListenSummary};
use sdi_client::{
    decode, CancelToken, CommandClient, ListenOptions, ListenSession, Notification, SdiError,
    SessionState, Snapshot, Transport,
};

use crate::common::{ReadStep, ScriptedTransport};

// =============================================================================
// Helper Functions
// =============================================================================

const ORIGINAL: Option<Duration> = Some(Duration::from_secs(1));
const POLL: Option<Duration> = Some(Duration::from_millis(10));

fn options() -> ListenOptions {
    ListenOptions { poll_interval: POLL }
}

fn client() -> CommandClient<ScriptedTransport> {
    CommandClient::new(ScriptedTransport::new(ORIGINAL))
}

/// Run a session that cancels itself after `stop_after` notifications
fn run_until(
    client: &mut CommandClient<ScriptedTransport>,
    stop_after: usize,
) -> (sdi_client::Result<ListenSummary>, Vec<Notification>) {
    let cancel = CancelToken::new();
    let mut received = Vec::new();
    let mut session = client.listen(options());

    let result = session.run(&cancel, |notification| {
        received.push(notification);
        if received.len() >= stop_after {
            cancel.cancel();
        }
        Ok(())
    });
    assert_eq!(session.state(), SessionState::Stopped);

    (result, received)
}

fn assert_restored(client: &CommandClient<ScriptedTransport>) {
    assert_eq!(client.timeout(), ORIGINAL);
    assert_eq!(client.transport().timeout_history, vec![POLL, ORIGINAL]);
}

// =============================================================================
// Notification Tests
// =============================================================================

#[test]
fn test_frames_become_notifications() {
    let mut client = client();
    client
        .transport_mut()
        .push_data(&[0x00, 0x01, b'\r', b'\n'])
        .push_data(&[0x01, 0x81, b'\n']);

    let (result, received) = run_until(&mut client, 2);
    let summary = result.unwrap();

    assert_eq!(summary, ListenSummary { frames: 2, edges: 2 });
    assert_eq!(received.len(), 2);

    let first = &received[0];
    assert_eq!(first.previous, Snapshot(0x00));
    assert_eq!(first.current, Snapshot(0x01));
    assert_eq!(first.source, None);
    assert_eq!(first.edges.len(), 1);
    assert_eq!(first.edges[0].channel.letter(), 'A');

    let second = &received[1];
    assert_eq!(second.edges.len(), 1);
    assert_eq!(second.edges[0].channel.letter(), 'H');

    for notification in &received {
        assert!(notification.edges.iter().all(|e| e.timestamp == notification.received_at));
    }
    assert_restored(&client);
}

#[test]
fn test_unchanged_frame_still_notifies() {
    let mut client = client();
    client.transport_mut().push_data(&[0x42, 0x42, b'\n']);

    let (result, received) = run_until(&mut client, 1);

    assert_eq!(result.unwrap(), ListenSummary { frames: 1, edges: 0 });
    assert!(received[0].edges.is_empty());
}

#[test]
fn test_newline_valued_payload_bytes() {
    let mut client = client();
    client.transport_mut().push_data(&[b'\n', b'\r', b'\r', b'\n']);

    let (result, received) = run_until(&mut client, 1);
    result.unwrap();

    assert_eq!(received[0].previous, Snapshot(0x0A));
    assert_eq!(received[0].current, Snapshot(0x0D));
}

#[test]
fn test_frame_split_across_poll_slices() {
    let mut client = client();
    client
        .transport_mut()
        .push(ReadStep::Timeout)
        .push_data(&[0x00])
        .push(ReadStep::Timeout)
        .push(ReadStep::Timeout)
        .push_data(&[0x04, b'\r'])
        .push(ReadStep::Timeout)
        .push_data(&[b'\n']);

    let (result, received) = run_until(&mut client, 1);
    result.unwrap();

    assert_eq!(received.len(), 1);
    assert_eq!(received[0].current, Snapshot(0x04));
    assert_eq!(received[0].edges[0].channel.letter(), 'C');
}

#[test]
fn test_split_reply_terminator_is_not_payload() {
    let mut client = client();
    client.transport_mut().push_data(b"OK\r");
    assert_eq!(client.query("*RST").unwrap(), "OK");

    // The reply's `\n` shows up after the session has armed
    client
        .transport_mut()
        .push_data(b"\n")
        .push_data(&[0x00, 0x01, b'\n']);

    let (result, received) = run_until(&mut client, 1);
    assert_eq!(result.unwrap(), ListenSummary { frames: 1, edges: 1 });
    assert_eq!(received[0].previous, Snapshot(0x00));
    assert_eq!(received[0].current, Snapshot(0x01));
}

#[test]
fn test_lf_payload_kept_after_complete_reply() {
    let mut client = client();
    client.transport_mut().push_data(b"OK\r\n");
    client.query("*RST").unwrap();

    client.transport_mut().push_data(&[b'\n', 0x02, b'\n']);

    let (result, received) = run_until(&mut client, 1);
    result.unwrap();
    assert_eq!(received[0].previous, Snapshot(0x0A));
    assert_eq!(received[0].current, Snapshot(0x02));
}

// =============================================================================
// Cancellation Tests
// =============================================================================

#[test]
fn test_cancel_before_run_reads_nothing() {
    let mut client = client();
    client.transport_mut().push_data(&[0x00, 0x01, b'\n']);

    let cancel = CancelToken::new();
    cancel.cancel();

    let summary = {
        let mut session = client.listen(options());
        session.run(&cancel, |_| panic!("no frame expected")).unwrap()
    };

    assert_eq!(summary, ListenSummary::default());
    assert_restored(&client);

    // The pending frame is still on the line
    let mut buf = [0u8; 3];
    assert_eq!(client.transport_mut().read_raw(&mut buf).unwrap(), 3);
}

#[test]
fn test_cancel_token_is_shared_between_clones() {
    let token = CancelToken::new();
    let clone = token.clone();
    assert!(!token.is_cancelled());
    clone.cancel();
    assert!(token.is_cancelled());
}

// =============================================================================
// Exit Path Tests
// =============================================================================

#[test]
fn test_closed_line_ends_session_and_restores_timeout() {
    let mut client = client();
    client.transport_mut().push_data(&[0x00, 0x01, b'\n']);

    let (result, received) = run_until(&mut client, 10);

    match result {
        Err(SdiError::Io(e)) => assert_eq!(e.kind(), std::io::ErrorKind::UnexpectedEof),
        other => panic!("Expected IO error, got {:?}", other),
    }
    assert_eq!(received.len(), 1);
    assert_restored(&client);
}

#[test]
fn test_short_frame_is_protocol_error() {
    let mut client = client();
    client.transport_mut().push_data(&[0x00]);

    let (result, received) = run_until(&mut client, 1);

    assert!(matches!(result, Err(SdiError::Protocol(_))));
    assert!(received.is_empty());
    assert_restored(&client);
}

#[test]
fn test_malformed_line_is_protocol_error() {
    let mut client = client();
    client.transport_mut().push_data(&[0x00, 0x01, 0x02, b'\n']);

    let (result, _) = run_until(&mut client, 1);

    assert!(matches!(result, Err(SdiError::Protocol(_))));
    assert_restored(&client);
}

#[test]
fn test_read_failure_restores_timeout() {
    let mut client = client();
    client
        .transport_mut()
        .push(ReadStep::Fail(std::io::ErrorKind::ConnectionReset));

    let (result, _) = run_until(&mut client, 1);

    assert!(matches!(result, Err(SdiError::Io(_))));
    assert_restored(&client);
}

#[test]
fn test_sink_error_ends_session() {
    let mut client = client();
    client
        .transport_mut()
        .push_data(&[0x00, 0x01, b'\n'])
        .push_data(&[0x01, 0x00, b'\n']);

    let cancel = CancelToken::new();
    let mut calls = 0;
    let result = {
        let mut session = client.listen(options());
        session.run(&cancel, |_| {
            calls += 1;
            Err(SdiError::ConsumerDisconnected)
        })
    };

    assert!(matches!(result, Err(SdiError::ConsumerDisconnected)));
    assert_eq!(calls, 1);
    assert_restored(&client);
}

#[test]
fn test_failed_arm_leaves_timeout_untouched() {
    let mut client = client();
    client.transport_mut().fail_set_timeout = true;

    let mut session = client.listen(options());
    let result = session.run(&CancelToken::new(), |_| Ok(()));

    assert!(matches!(result, Err(SdiError::Io(_))));
    assert_eq!(session.state(), SessionState::Stopped);
    drop(session);

    assert_eq!(client.timeout(), ORIGINAL);
    assert!(client.transport().timeout_history.is_empty());
}

#[test]
fn test_queries_work_after_listening() {
    let mut client = client();
    client.transport_mut().push_data(&[0x00, 0x01, b'\n']);

    let (result, _) = run_until(&mut client, 1);
    result.unwrap();

    client.transport_mut().push_data(b"pulsegen\r\n");
    assert_eq!(client.query("*IDN?").unwrap(), "pulsegen");
}

// =============================================================================
// Lifecycle Tests
// =============================================================================

#[test]
fn test_session_runs_once() {
    let mut client = client();
    let cancel = CancelToken::new();
    cancel.cancel();

    let mut session = client.listen(options());
    assert_eq!(session.state(), SessionState::Idle);
    session.run(&cancel, |_| Ok(())).unwrap();
    assert_eq!(session.state(), SessionState::Stopped);

    assert!(matches!(
        session.run(&cancel, |_| Ok(())),
        Err(SdiError::InvalidState(_))
    ));
}

#[test]
fn test_dropping_armed_source_restores_timeout() {
    let mut transport = ScriptedTransport::new(ORIGINAL);
    {
        let mut source = LineFrameSource::new(&mut transport, options());
        source.arm().unwrap();
        assert!(source.is_armed());
    }
    assert_eq!(transport.timeout(), ORIGINAL);
    assert_eq!(transport.timeout_history, vec![POLL, ORIGINAL]);
}

#[test]
fn test_disarm_restores_exactly_once() {
    let mut transport = ScriptedTransport::new(ORIGINAL);
    {
        let mut source = LineFrameSource::new(&mut transport, options());
        source.arm().unwrap();
        source.disarm().unwrap();
        source.disarm().unwrap();
        assert!(!source.is_armed());
    }
    assert_eq!(transport.timeout_history, vec![POLL, ORIGINAL]);
}

#[test]
fn test_double_arm_rejected() {
    let mut transport = ScriptedTransport::new(ORIGINAL);
    let mut source = LineFrameSource::new(&mut transport, options());
    source.arm().unwrap();
    assert!(matches!(source.arm(), Err(SdiError::InvalidState(_))));
}

#[test]
fn test_blocking_poll_interval() {
    let mut transport = ScriptedTransport::new(ORIGINAL);
    transport.push_data(&[0x00, 0x02, b'\n']);

    let cancel = CancelToken::new();
    let mut session = ListenSession::new(LineFrameSource::new(
        &mut transport,
        ListenOptions { poll_interval: None },
    ));
    let summary = session
        .run(&cancel, |_| {
            cancel.cancel();
            Ok(())
        })
        .unwrap();
    drop(session);

    assert_eq!(summary.frames, 1);
    assert_eq!(transport.timeout_history, vec![None, ORIGINAL]);
}

// =============================================================================
// Formatting Tests
// =============================================================================

fn notification(source: Option<&str>, previous: u8, current: u8) -> Notification {
    let received_at = Local.with_ymd_and_hms(2024, 3, 5, 14, 7, 9).unwrap();
    Notification {
        received_at,
        source: source.map(|s| s.parse().unwrap()),
        previous: Snapshot(previous),
        current: Snapshot(current),
        edges: decode(Snapshot(previous), Snapshot(current))
            .into_iter()
            .map(|e| e.at(received_at))
            .collect(),
    }
}

#[test]
fn test_notification_display() {
    assert_eq!(
        notification(None, 0x05, 0x04).to_string(),
        "2024-03-05 14:07:09.000000 0x5 -> 0x4 {A: FALLING}"
    );
    assert_eq!(
        notification(Some("10.0.0.7:5000"), 0x00, 0x81).to_string(),
        "2024-03-05 14:07:09.000000 10.0.0.7 0x0 -> 0x81 {A: RISING, H: RISING}"
    );
    assert_eq!(
        notification(None, 0x11, 0x11).to_string(),
        "2024-03-05 14:07:09.000000 0x11 -> 0x11 {}"
    );
}

#[test]
fn test_notification_json() {
    let json = serde_json::to_value(notification(Some("10.0.0.7:5000"), 0x00, 0x01)).unwrap();
    assert_eq!(json["source"], "10.0.0.7:5000");
    assert_eq!(json["edges"][0]["channel"], "A");
    assert_eq!(json["edges"][0]["direction"], "RISING");
}

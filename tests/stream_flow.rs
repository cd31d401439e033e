//! End-to-end flow tests: decoder output driven through the reducer,
//! without a terminal.

use std::io::Cursor;

use mdtail::decode::{read_events, read_raw};
use mdtail::events::{StreamEvent, UiEvent};
use mdtail::state::{AppState, RenderOptions};
use mdtail::update::update;
use tokio::sync::mpsc;

/// Runs a decoder over fixed input and feeds every event to a fresh state.
/// Returns the final state and the raw event list.
fn drive(decode: impl FnOnce(&mpsc::UnboundedSender<StreamEvent>)) -> (AppState, Vec<StreamEvent>) {
    let (tx, mut rx) = mpsc::unbounded_channel();
    decode(&tx);

    let mut events = Vec::new();
    while let Ok(ev) = rx.try_recv() {
        events.push(ev);
    }

    let mut state = AppState::new(RenderOptions::default());
    for ev in &events {
        update(&mut state, UiEvent::Stream(ev.clone()));
    }
    (state, events)
}

#[test]
fn test_raw_stream_renders_and_quits() {
    let (state, events) = drive(|tx| read_raw(Cursor::new(b"Hello **world**".to_vec()), tx));

    let closed = events.iter().filter(|e| **e == StreamEvent::Closed).count();
    assert_eq!(closed, 1);
    assert!(events.last() == Some(&StreamEvent::Closed));

    assert_eq!(state.buffer, "Hello **world**");
    assert!(!state.rendered.is_empty());
    // Trailing whitespace is trimmed: the final line has visible content.
    let last = state.rendered.last().unwrap();
    assert!(last.spans.iter().any(|s| !s.content.trim().is_empty()));
    assert!(state.should_quit);
}

#[test]
fn test_structured_stream_accumulates_and_tracks_status() {
    let input = concat!(
        r#"{"Text":"A","Tool":"","Event":"received-text"}"#,
        r#"{"Text":"B","Tool":"calc","Event":"constructing-tool"}"#,
    );
    let (state, events) = drive(|tx| read_events(Cursor::new(input.as_bytes().to_vec()), tx));

    assert_eq!(state.buffer, "AB");
    assert_eq!(state.status.label(), "Constructing info for tool calc...");
    let closed = events.iter().filter(|e| **e == StreamEvent::Closed).count();
    assert_eq!(closed, 1);
    assert!(state.should_quit);
}

#[test]
fn test_malformed_json_keeps_prior_content() {
    let input = r#"{"Text":"kept","Tool":"","Event":""}garbage"#;
    let (state, events) = drive(|tx| read_events(Cursor::new(input.as_bytes().to_vec()), tx));

    // Content decoded before the error survives; the stream still closes.
    assert_eq!(state.buffer, "kept");
    assert!(!state.rendered.is_empty());
    let closed = events.iter().filter(|e| **e == StreamEvent::Closed).count();
    assert_eq!(closed, 1);
    assert!(state.should_quit);
}

//! Input decoders: translate the external byte stream into stream events.
//!
//! Both decoders run to completion on a blocking task, emit events through an
//! unbounded channel, and finish with exactly one [`StreamEvent::Closed`].
//! Read and decode errors are reported to stderr (the operator-visible
//! channel, never the content area) and terminate the stream; there are no
//! retries and no partial-object recovery.

use std::io::{ErrorKind, Read};

use serde::Deserialize;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use crate::events::StreamEvent;
use crate::state::InputMode;

/// Bytes read per chunk in raw mode.
pub const READ_CHUNK_SIZE: usize = 1024;

/// One structured event object on the wire.
///
/// All three keys must be present; any value may be the empty string.
#[derive(Debug, Deserialize)]
pub struct WireEvent {
    #[serde(rename = "Text")]
    pub text: String,
    #[serde(rename = "Tool")]
    pub tool: String,
    #[serde(rename = "Event")]
    pub event: String,
}

/// Spawns the decoder for standard input on a blocking task and returns the
/// receiving end of the event channel.
pub fn spawn_stdin_decoder(mode: InputMode) -> UnboundedReceiver<StreamEvent> {
    let (tx, rx) = mpsc::unbounded_channel();
    tokio::task::spawn_blocking(move || {
        let stdin = std::io::stdin().lock();
        match mode {
            InputMode::Raw => read_raw(stdin, &tx),
            InputMode::Events => read_events(stdin, &tx),
        }
    });
    rx
}

/// Raw mode: forward bytes verbatim in bounded chunks.
///
/// Emits one `Chunk` per non-empty read, `Closed` on end-of-stream, and on
/// any other read error reports it and closes the stream. A multi-byte
/// UTF-8 sequence split across a read boundary is held back until its
/// remaining bytes arrive; whatever is still incomplete when the stream
/// ends is flushed lossily.
pub fn read_raw(mut reader: impl Read, tx: &UnboundedSender<StreamEvent>) {
    let mut buf = [0u8; READ_CHUNK_SIZE];
    let mut pending: Vec<u8> = Vec::new();
    loop {
        match reader.read(&mut buf) {
            Ok(0) => {
                flush_pending(&mut pending, tx);
                tracing::debug!("input stream reached end-of-file");
                let _ = tx.send(StreamEvent::Closed);
                return;
            }
            Ok(n) => {
                pending.extend_from_slice(&buf[..n]);
                let keep = utf8_tail_len(&pending);
                let ready = pending.len() - keep;
                if ready > 0 {
                    let text = String::from_utf8_lossy(&pending[..ready]).into_owned();
                    let _ = tx.send(StreamEvent::Chunk(text));
                    pending.drain(..ready);
                }
            }
            Err(e) if e.kind() == ErrorKind::Interrupted => {}
            Err(e) => {
                eprintln!("Error reading input: {e}");
                flush_pending(&mut pending, tx);
                let _ = tx.send(StreamEvent::Closed);
                return;
            }
        }
    }
}

fn flush_pending(pending: &mut Vec<u8>, tx: &UnboundedSender<StreamEvent>) {
    if !pending.is_empty() {
        let text = String::from_utf8_lossy(pending).into_owned();
        let _ = tx.send(StreamEvent::Chunk(text));
        pending.clear();
    }
}

/// Length of a trailing unfinished multi-byte UTF-8 sequence (0..=3).
///
/// Only a leading byte whose announced sequence is still missing bytes is
/// held back; invalid bytes are not (they pass through lossily).
fn utf8_tail_len(bytes: &[u8]) -> usize {
    for (i, &b) in bytes.iter().rev().take(3).enumerate() {
        if b < 0x80 {
            return 0; // ASCII, nothing pending
        }
        if b >= 0xC0 {
            let have = i + 1;
            let need = if b >= 0xF0 {
                4
            } else if b >= 0xE0 {
                3
            } else {
                2
            };
            return if have < need { have } else { 0 };
        }
        // Continuation byte, keep scanning for its leading byte.
    }
    0
}

/// Structured mode: decode consecutive JSON objects, no delimiter required.
///
/// Each object fans out as `ToolName`, `EventCode`, `Chunk` in that fixed
/// order, even when the values are empty. A clean end of input closes the
/// stream silently; a decode error (including a truncated final object) is
/// reported and closes the stream.
pub fn read_events(reader: impl Read, tx: &UnboundedSender<StreamEvent>) {
    let stream = serde_json::Deserializer::from_reader(reader).into_iter::<WireEvent>();
    for object in stream {
        match object {
            Ok(ev) => {
                let _ = tx.send(StreamEvent::ToolName(ev.tool));
                let _ = tx.send(StreamEvent::EventCode(ev.event));
                let _ = tx.send(StreamEvent::Chunk(ev.text));
            }
            Err(e) => {
                eprintln!("Error decoding input: {e}");
                let _ = tx.send(StreamEvent::Closed);
                return;
            }
        }
    }
    tracing::debug!("event stream reached end-of-file");
    let _ = tx.send(StreamEvent::Closed);
}

#[cfg(test)]
mod tests {
    use std::io::{self, Cursor};

    use super::*;

    /// Yields its data on the first read, then a hard I/O error.
    struct FailingReader {
        data: Vec<u8>,
    }

    impl Read for FailingReader {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if self.data.is_empty() {
                return Err(io::Error::other("device gone"));
            }
            let n = self.data.len().min(buf.len());
            buf[..n].copy_from_slice(&self.data[..n]);
            self.data.drain(..n);
            Ok(n)
        }
    }

    fn drain(rx: &mut UnboundedReceiver<StreamEvent>) -> Vec<StreamEvent> {
        let mut events = Vec::new();
        while let Ok(ev) = rx.try_recv() {
            events.push(ev);
        }
        events
    }

    fn run_raw(input: &[u8]) -> Vec<StreamEvent> {
        let (tx, mut rx) = mpsc::unbounded_channel();
        read_raw(Cursor::new(input.to_vec()), &tx);
        drain(&mut rx)
    }

    fn run_events(input: &str) -> Vec<StreamEvent> {
        let (tx, mut rx) = mpsc::unbounded_channel();
        read_events(Cursor::new(input.as_bytes().to_vec()), &tx);
        drain(&mut rx)
    }

    #[test]
    fn test_raw_passes_bytes_through_then_closes() {
        let events = run_raw(b"Hello **world**");
        assert_eq!(
            events,
            vec![
                StreamEvent::Chunk("Hello **world**".to_string()),
                StreamEvent::Closed,
            ]
        );
    }

    #[test]
    fn test_raw_chunks_are_bounded_and_ordered() {
        let input = vec![b'a'; READ_CHUNK_SIZE + 10];
        let events = run_raw(&input);
        assert_eq!(events.len(), 3); // two chunks + Closed
        assert_eq!(
            events[0],
            StreamEvent::Chunk("a".repeat(READ_CHUNK_SIZE))
        );
        assert_eq!(events[1], StreamEvent::Chunk("a".repeat(10)));
        assert_eq!(events[2], StreamEvent::Closed);
    }

    #[test]
    fn test_raw_empty_input_closes_immediately() {
        assert_eq!(run_raw(b""), vec![StreamEvent::Closed]);
    }

    #[test]
    fn test_raw_multibyte_char_split_across_reads_stays_intact() {
        // 1023 ASCII bytes push the 2-byte 'é' across the 1024-byte read
        // boundary; its first byte is held back until the second read.
        let input = format!("{}é", "a".repeat(1023));
        let events = run_raw(input.as_bytes());

        let text: String = events
            .iter()
            .filter_map(|e| match e {
                StreamEvent::Chunk(t) => Some(t.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(text, input);
        assert!(!text.contains('\u{FFFD}'));
        assert_eq!(events[0], StreamEvent::Chunk("a".repeat(1023)));
        assert_eq!(events[1], StreamEvent::Chunk("é".to_string()));
    }

    #[test]
    fn test_raw_partial_sequence_at_eof_flushes_lossily() {
        // 0xC3 announces a 2-byte sequence that never completes.
        let events = run_raw(&[b'a', 0xC3]);
        assert_eq!(
            events,
            vec![
                StreamEvent::Chunk("a".to_string()),
                StreamEvent::Chunk("\u{FFFD}".to_string()),
                StreamEvent::Closed,
            ]
        );
    }

    #[test]
    fn test_raw_invalid_bytes_pass_through_replaced() {
        // An invalid byte followed by ASCII is not held back for more input.
        let events = run_raw(&[0xFF, b'a']);
        assert_eq!(
            events,
            vec![
                StreamEvent::Chunk("\u{FFFD}a".to_string()),
                StreamEvent::Closed,
            ]
        );
    }

    #[test]
    fn test_raw_read_error_closes_once_after_prior_chunks() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        read_raw(
            FailingReader {
                data: b"partial".to_vec(),
            },
            &tx,
        );
        let events = drain(&mut rx);

        assert_eq!(events[0], StreamEvent::Chunk("partial".to_string()));
        let closed = events.iter().filter(|e| **e == StreamEvent::Closed).count();
        assert_eq!(closed, 1);
        assert_eq!(events.last(), Some(&StreamEvent::Closed));
    }

    #[test]
    fn test_events_fixed_fanout_order() {
        let events = run_events(r#"{"Text":"hi","Tool":"t1","Event":"requires-tool"}"#);
        assert_eq!(
            events,
            vec![
                StreamEvent::ToolName("t1".to_string()),
                StreamEvent::EventCode("requires-tool".to_string()),
                StreamEvent::Chunk("hi".to_string()),
                StreamEvent::Closed,
            ]
        );
    }

    #[test]
    fn test_events_emitted_even_when_fields_empty() {
        let events = run_events(r#"{"Text":"","Tool":"","Event":""}"#);
        assert_eq!(
            events,
            vec![
                StreamEvent::ToolName(String::new()),
                StreamEvent::EventCode(String::new()),
                StreamEvent::Chunk(String::new()),
                StreamEvent::Closed,
            ]
        );
    }

    #[test]
    fn test_events_need_no_delimiter_between_objects() {
        let events = run_events(
            r#"{"Text":"A","Tool":"","Event":"received-text"}{"Text":"B","Tool":"calc","Event":"constructing-tool"}"#,
        );
        assert_eq!(events.len(), 7);
        assert_eq!(events[2], StreamEvent::Chunk("A".to_string()));
        assert_eq!(events[3], StreamEvent::ToolName("calc".to_string()));
        assert_eq!(events[5], StreamEvent::Chunk("B".to_string()));
        assert_eq!(events[6], StreamEvent::Closed);
    }

    #[test]
    fn test_events_malformed_json_closes_after_prior_objects() {
        let events = run_events(r#"{"Text":"ok","Tool":"","Event":""}{not json"#);
        // The first object went through, then one Closed - no recovery.
        assert_eq!(events.len(), 4);
        assert_eq!(events[2], StreamEvent::Chunk("ok".to_string()));
        assert_eq!(events[3], StreamEvent::Closed);
    }

    #[test]
    fn test_events_missing_key_is_a_decode_error() {
        let events = run_events(r#"{"Text":"hi","Tool":"t1"}"#);
        assert_eq!(events, vec![StreamEvent::Closed]);
    }

    #[test]
    fn test_events_clean_eof_closes_once() {
        assert_eq!(run_events(""), vec![StreamEvent::Closed]);
        assert_eq!(run_events("   \n"), vec![StreamEvent::Closed]);
    }
}

//! Event types for the viewer.
//!
//! All inputs are converted to [`UiEvent`] before being processed by the
//! reducer. Stream events are produced by the input decoders on a background
//! task; terminal events (keys, mouse, resize) come from crossterm.

use crossterm::event::Event as CrosstermEvent;

/// One message decoded from the input stream.
///
/// Created by an input decoder, consumed exactly once by the reducer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    /// Newly arrived text content, verbatim.
    Chunk(String),
    /// Name of the tool the producer is currently working with (may be empty).
    ToolName(String),
    /// Semantic phase code from the producer (may be empty).
    EventCode(String),
    /// The stream has ended; no further events will arrive.
    Closed,
}

/// Unified event enum for the viewer loop.
#[derive(Debug)]
pub enum UiEvent {
    /// Timer tick (spinner animation).
    Tick,
    /// Terminal input event (key, mouse, resize).
    Terminal(CrosstermEvent),
    /// Decoded input stream event.
    Stream(StreamEvent),
}

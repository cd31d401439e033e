//! The reducer: all state mutations happen here.
//!
//! The runtime feeds every event through [`update`]; append-and-re-render is
//! a single synchronous step inside the single-threaded loop, so buffer,
//! rendered output, and scroll position need no lock and two events can
//! never interleave their effects.

use crossterm::event::{
    Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseEvent, MouseEventKind,
};
use ratatui::text::{Line, Span};

use crate::events::{StreamEvent, UiEvent};
use crate::state::AppState;

/// Lines to scroll per mouse wheel tick.
const MOUSE_SCROLL_LINES: usize = 1;

/// Processes one event against the current state.
pub fn update(state: &mut AppState, event: UiEvent) {
    match event {
        UiEvent::Tick => {
            state.spinner_frame = state.spinner_frame.wrapping_add(1);
        }
        UiEvent::Terminal(term_event) => handle_terminal(state, term_event),
        UiEvent::Stream(stream_event) => handle_stream(state, stream_event),
    }
}

fn handle_terminal(state: &mut AppState, event: Event) {
    match event {
        // Dimensions only; the next chunk re-renders at the new width.
        Event::Resize(width, height) => state.viewport.resize(width, height),
        Event::Key(key) => handle_key(state, key),
        Event::Mouse(mouse) => handle_mouse(state, mouse),
        _ => {}
    }
}

fn handle_key(state: &mut AppState, key: KeyEvent) {
    if key.kind != KeyEventKind::Press {
        return;
    }
    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => state.should_quit = true,
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            state.should_quit = true;
        }
        KeyCode::Up | KeyCode::Char('k') => state.viewport.scroll_up(1),
        KeyCode::Down | KeyCode::Char('j') => state.viewport.scroll_down(1),
        KeyCode::PageUp => state.viewport.page_up(),
        KeyCode::PageDown => state.viewport.page_down(),
        KeyCode::Home => state.viewport.scroll_to_top(),
        KeyCode::End => state.viewport.scroll_to_bottom(),
        _ => {}
    }
}

fn handle_mouse(state: &mut AppState, mouse: MouseEvent) {
    match mouse.kind {
        MouseEventKind::ScrollUp => state.viewport.scroll_up(MOUSE_SCROLL_LINES),
        MouseEventKind::ScrollDown => state.viewport.scroll_down(MOUSE_SCROLL_LINES),
        _ => {}
    }
}

fn handle_stream(state: &mut AppState, event: StreamEvent) {
    match event {
        StreamEvent::Chunk(text) => {
            state.buffer.push_str(&text);
            rerender(state);
        }
        StreamEvent::ToolName(tool) => state.status.set_tool(tool),
        StreamEvent::EventCode(code) => state.status.set_event_code(code),
        StreamEvent::Closed => state.should_quit = true,
    }
}

/// Formats the full buffer and swaps in the result.
///
/// On failure the previous output and line count stay untouched; the buffer
/// already holds the new text, so the next chunk's render picks it up.
fn rerender(state: &mut AppState) {
    let width = state.content_width();
    match state.formatter.format(&state.buffer, width) {
        Ok(lines) => {
            let lines = tidy(lines);
            state.viewport.set_line_count(lines.len());
            state.rendered = lines;
        }
        Err(e) => {
            state.skipped_renders += 1;
            tracing::debug!(error = %e, skipped = state.skipped_renders, "format skipped");
        }
    }
}

/// Post-format cleanup: drop trailing blank lines and expand literal tabs
/// to four spaces. Applied uniformly to both input modes.
fn tidy(mut lines: Vec<Line<'static>>) -> Vec<Line<'static>> {
    while lines
        .last()
        .is_some_and(|l| l.spans.iter().all(|s| s.content.trim().is_empty()))
    {
        lines.pop();
    }
    for line in &mut lines {
        for span in &mut line.spans {
            if span.content.contains('\t') {
                *span = Span::styled(span.content.replace('\t', "    "), span.style);
            }
        }
    }
    lines
}

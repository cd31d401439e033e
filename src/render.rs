//! Pure view functions.
//!
//! Functions here take `&AppState`, draw to a ratatui frame, and never
//! mutate state. The content area shows either the full rendered output or,
//! when it no longer fits, the viewport window at the current scroll offset;
//! the bottom row always carries the status line.

use ratatui::Frame;
use ratatui::layout::{Constraint, Layout};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::Paragraph;

use crate::state::{AppState, STATUS_HEIGHT};

/// Spinner animation glyphs, advanced once per tick.
pub const SPINNER_FRAMES: &[&str] = &["✶", "✸", "✹", "✺", "✹", "✷"];

/// Renders one frame.
pub fn render(state: &AppState, frame: &mut Frame) {
    let [content_area, status_area] =
        Layout::vertical([Constraint::Min(0), Constraint::Length(STATUS_HEIGHT)])
            .areas(frame.area());

    let lines: Vec<Line<'static>> = if state.viewport.needs_scroll() {
        let offset = state.viewport.offset();
        let end = (offset + state.viewport.content_height()).min(state.rendered.len());
        state.rendered[offset..end].to_vec()
    } else {
        state.rendered.clone()
    };
    // Paragraph clips to the area width; the formatter already wrapped at
    // the content width, so this only truncates stray over-wide lines.
    frame.render_widget(Paragraph::new(Text::from(lines)), content_area);

    frame.render_widget(Paragraph::new(status_line(state)), status_area);
}

/// Builds the status line: spinner glyph (when enabled) plus activity label.
pub fn status_line(state: &AppState) -> Line<'static> {
    let mut spans = Vec::new();
    if state.options.spinner {
        let glyph = SPINNER_FRAMES[state.spinner_frame % SPINNER_FRAMES.len()];
        spans.push(Span::styled(glyph, Style::new().fg(Color::Magenta)));
        spans.push(Span::raw(" "));
    }
    spans.push(Span::styled(
        state.status.display(),
        Style::new().add_modifier(Modifier::ITALIC),
    ));
    Line::from(spans)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{InputMode, RenderOptions};

    fn options(spinner: bool) -> RenderOptions {
        RenderOptions {
            spinner,
            mode: InputMode::Raw,
        }
    }

    #[test]
    fn test_status_line_includes_spinner_and_label() {
        let state = AppState::new(options(true));
        let line = status_line(&state);
        assert_eq!(line.spans[0].content, SPINNER_FRAMES[0]);
        assert_eq!(line.spans[2].content, "Loading...");
    }

    #[test]
    fn test_spinner_advances_with_frame_counter() {
        let mut state = AppState::new(options(true));
        state.spinner_frame = 2;
        assert_eq!(status_line(&state).spans[0].content, SPINNER_FRAMES[2]);
        state.spinner_frame = SPINNER_FRAMES.len() + 1;
        assert_eq!(status_line(&state).spans[0].content, SPINNER_FRAMES[1]);
    }

    #[test]
    fn test_no_spinner_variant_shows_label_only() {
        let state = AppState::new(options(false));
        let line = status_line(&state);
        assert_eq!(line.spans.len(), 1);
        assert_eq!(line.spans[0].content, "Loading...");
    }
}

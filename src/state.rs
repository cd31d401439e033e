//! Viewer state.
//!
//! All mutable state lives here, separate from terminal ownership, so the
//! render pass can borrow it immutably while the runtime owns the terminal.
//!
//! The content buffer is append-only: chunks are concatenated in arrival
//! order and the buffer never shrinks or reorders. `rendered` always holds
//! the most recent *successful* formatting of the whole buffer; a failed
//! format leaves it stale but valid.

use ratatui::text::Line;

use crate::markdown::{Formatter, MarkdownFormatter};
use crate::status::StatusState;

/// Wrap width used before the terminal has reported its size.
pub const DEFAULT_WRAP_WIDTH: u16 = 80;

/// Rows reserved for the status line at the bottom of the screen.
pub const STATUS_HEIGHT: u16 = 1;

/// Which decoder to run against standard input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    /// Arbitrary bytes, passed through verbatim in bounded chunks.
    Raw,
    /// A sequence of JSON objects carrying text plus tool/phase metadata.
    Events,
}

/// Viewer configuration derived from the command line.
#[derive(Debug, Clone, Copy)]
pub struct RenderOptions {
    /// Whether the status-line spinner animates.
    pub spinner: bool,
    /// Input decoding mode.
    pub mode: InputMode,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            spinner: true,
            mode: InputMode::Raw,
        }
    }
}

// ============================================================================
// Viewport
// ============================================================================

/// Scroll position for the content area.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollMode {
    /// Stick to the bottom: new content keeps the latest lines visible.
    FollowLatest,
    /// User scrolled away; `offset` is a line index from the top and is
    /// preserved verbatim across re-renders (clamped at read time).
    Anchored { offset: usize },
}

/// Terminal dimensions plus scroll position.
///
/// Width and height are zero until the first resize report, which means
/// "no clipping applied yet" - the full rendered output is drawn.
#[derive(Debug, Clone)]
pub struct ViewportState {
    pub width: u16,
    pub height: u16,
    pub scroll: ScrollMode,
    /// Height of the rendered output, updated after each successful format.
    pub line_count: usize,
}

impl Default for ViewportState {
    fn default() -> Self {
        Self {
            width: 0,
            height: 0,
            scroll: ScrollMode::FollowLatest,
            line_count: 0,
        }
    }
}

impl ViewportState {
    /// Records new terminal dimensions. Does not trigger a re-render.
    pub fn resize(&mut self, width: u16, height: u16) {
        self.width = width;
        self.height = height;
    }

    /// Rows available for content (terminal height minus the status line).
    pub fn content_height(&self) -> usize {
        self.height.saturating_sub(STATUS_HEIGHT) as usize
    }

    /// True if the rendered output is taller than the content area.
    ///
    /// Always false before the first resize report (no clipping yet).
    pub fn needs_scroll(&self) -> bool {
        self.height > 0 && self.line_count > self.content_height()
    }

    /// True when pinned to the bottom (auto-follow).
    pub fn is_following(&self) -> bool {
        matches!(self.scroll, ScrollMode::FollowLatest)
    }

    /// Largest valid scroll offset for the current content.
    pub fn max_offset(&self) -> usize {
        self.line_count.saturating_sub(self.content_height())
    }

    /// Current scroll offset.
    ///
    /// Follow mode derives the offset from the latest line count, so growth
    /// auto-follows; an anchored offset is clamped to the valid range.
    pub fn offset(&self) -> usize {
        match self.scroll {
            ScrollMode::FollowLatest => self.max_offset(),
            ScrollMode::Anchored { offset } => offset.min(self.max_offset()),
        }
    }

    /// Records the height of freshly rendered output.
    pub fn set_line_count(&mut self, line_count: usize) {
        self.line_count = line_count;
    }

    /// Scrolls up, anchoring away from the bottom.
    pub fn scroll_up(&mut self, lines: usize) {
        let offset = self.offset().saturating_sub(lines);
        self.scroll = ScrollMode::Anchored { offset };
    }

    /// Scrolls down; reaching the bottom re-enters follow mode.
    pub fn scroll_down(&mut self, lines: usize) {
        if self.is_following() {
            return;
        }
        let next = (self.offset() + lines).min(self.max_offset());
        self.scroll = if next >= self.max_offset() {
            ScrollMode::FollowLatest
        } else {
            ScrollMode::Anchored { offset: next }
        };
    }

    pub fn scroll_to_top(&mut self) {
        self.scroll = ScrollMode::Anchored { offset: 0 };
    }

    pub fn scroll_to_bottom(&mut self) {
        self.scroll = ScrollMode::FollowLatest;
    }

    pub fn page_up(&mut self) {
        self.scroll_up(self.content_height().max(1));
    }

    pub fn page_down(&mut self) {
        self.scroll_down(self.content_height().max(1));
    }
}

// ============================================================================
// AppState
// ============================================================================

/// Top-level viewer state, owned by the runtime and mutated only by the
/// reducer in `update.rs`.
pub struct AppState {
    /// Flag indicating the viewer should quit.
    pub should_quit: bool,
    /// Append-only accumulation of every chunk received so far.
    pub buffer: String,
    /// Most recent successful formatting of the full buffer.
    pub rendered: Vec<Line<'static>>,
    /// Terminal dimensions and scroll position.
    pub viewport: ViewportState,
    /// Producer activity for the status line.
    pub status: StatusState,
    /// Spinner animation frame counter.
    pub spinner_frame: usize,
    /// Viewer configuration.
    pub options: RenderOptions,
    /// Count of formats that failed and were silently skipped.
    pub skipped_renders: u64,
    /// Formatter invoked on the full buffer after each chunk.
    pub formatter: Box<dyn Formatter>,
}

impl AppState {
    pub fn new(options: RenderOptions) -> Self {
        Self::with_formatter(options, Box::new(MarkdownFormatter))
    }

    /// Creates state with a custom formatter (used by tests to exercise the
    /// formatting-failure path).
    pub fn with_formatter(options: RenderOptions, formatter: Box<dyn Formatter>) -> Self {
        Self {
            should_quit: false,
            buffer: String::new(),
            rendered: Vec::new(),
            viewport: ViewportState::default(),
            status: StatusState::default(),
            spinner_frame: 0,
            options,
            skipped_renders: 0,
            formatter,
        }
    }

    /// Width passed to the formatter: the terminal width once known,
    /// otherwise a fixed default.
    pub fn content_width(&self) -> u16 {
        if self.viewport.width > 0 {
            self.viewport.width
        } else {
            DEFAULT_WRAP_WIDTH
        }
    }
}

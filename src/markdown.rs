//! Markdown formatting for the content area.
//!
//! [`Formatter`] is the seam between the accumulator and the formatting
//! engine: the full buffer goes in, styled word-wrapped lines come out, and
//! the call may fail (the reducer then keeps the previous output). The
//! production implementation parses with pulldown-cmark and wraps with
//! display-width awareness.

use anyhow::Result;
use pulldown_cmark::{CodeBlockKind, Event, HeadingLevel, Parser, Tag, TagEnd};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// Formats accumulated text into styled lines at a target width.
///
/// Implementations must be pure: formatting the same text at the same width
/// twice yields identical output.
pub trait Formatter: Send {
    fn format(&self, text: &str, width: u16) -> Result<Vec<Line<'static>>>;
}

/// The pulldown-cmark backed formatter.
pub struct MarkdownFormatter;

impl Formatter for MarkdownFormatter {
    fn format(&self, text: &str, width: u16) -> Result<Vec<Line<'static>>> {
        let mut writer = Writer::new(width as usize);
        for event in Parser::new(text) {
            writer.handle(event);
        }
        Ok(writer.finish())
    }
}

// ============================================================================
// Styles
// ============================================================================

fn base_style() -> Style {
    Style::new()
}

fn heading_style(level: HeadingLevel) -> Style {
    match level {
        HeadingLevel::H1 => Style::new().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        HeadingLevel::H2 => Style::new().fg(Color::Cyan),
        _ => Style::new().add_modifier(Modifier::BOLD),
    }
}

fn code_style() -> Style {
    Style::new().fg(Color::Yellow)
}

fn quote_style() -> Style {
    Style::new().fg(Color::Green).add_modifier(Modifier::ITALIC)
}

fn link_style() -> Style {
    Style::new().fg(Color::Blue).add_modifier(Modifier::UNDERLINED)
}

fn marker_style() -> Style {
    Style::new().fg(Color::DarkGray)
}

// ============================================================================
// Inline content
// ============================================================================

/// A run of inline text with one style.
///
/// `verbatim` marks inline code: whitespace is preserved and the run wraps
/// as a single unit (broken by character only when it cannot fit a line).
#[derive(Debug, Clone)]
struct Piece {
    text: String,
    style: Style,
    verbatim: bool,
}

/// Wrap tokens derived from pieces.
enum Token {
    Word(Span<'static>),
    Space(Style),
    Break,
}

fn tokenize(pieces: &[Piece]) -> Vec<Token> {
    let mut tokens = Vec::new();
    for piece in pieces {
        if piece.verbatim {
            tokens.push(Token::Word(Span::styled(piece.text.clone(), piece.style)));
            continue;
        }
        for (i, segment) in piece.text.split('\n').enumerate() {
            if i > 0 {
                tokens.push(Token::Break);
            }
            if segment.starts_with(char::is_whitespace) {
                tokens.push(Token::Space(piece.style));
            }
            let mut first = true;
            for word in segment.split_whitespace() {
                if !first {
                    tokens.push(Token::Space(piece.style));
                }
                first = false;
                tokens.push(Token::Word(Span::styled(word.to_string(), piece.style)));
            }
            if segment.ends_with(char::is_whitespace) {
                tokens.push(Token::Space(piece.style));
            }
        }
    }
    tokens
}

/// Breaks an over-long span into width-bounded fragments.
fn split_span(span: &Span<'static>, width: usize) -> Vec<Span<'static>> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut current_width = 0;
    for ch in span.content.chars() {
        let w = ch.width().unwrap_or(0);
        if current_width + w > width && !current.is_empty() {
            parts.push(Span::styled(std::mem::take(&mut current), span.style));
            current_width = 0;
        }
        current.push(ch);
        current_width += w;
    }
    if !current.is_empty() {
        parts.push(Span::styled(current, span.style));
    }
    parts
}

/// Greedy word wrap over styled tokens with a hanging indent.
fn wrap_tokens(
    tokens: Vec<Token>,
    width: usize,
    first_prefix: &[Span<'static>],
    rest_prefix: &[Span<'static>],
) -> Vec<Line<'static>> {
    let prefix_width = |prefix: &[Span]| -> usize {
        prefix.iter().map(|s| s.content.width()).sum()
    };
    let mut lines: Vec<Line<'static>> = Vec::new();
    let mut current: Vec<Span<'static>> = Vec::new();
    let mut current_width = 0usize;
    let mut pending_space: Option<Style> = None;

    let avail = |lines: &[Line<'static>]| -> usize {
        let pw = if lines.is_empty() {
            prefix_width(first_prefix)
        } else {
            prefix_width(rest_prefix)
        };
        width.saturating_sub(pw).max(1)
    };

    let flush = |lines: &mut Vec<Line<'static>>, current: &mut Vec<Span<'static>>| {
        let prefix = if lines.is_empty() { first_prefix } else { rest_prefix };
        let mut spans = prefix.to_vec();
        spans.append(current);
        lines.push(Line::from(spans));
    };

    for token in tokens {
        match token {
            Token::Break => {
                flush(&mut lines, &mut current);
                current_width = 0;
                pending_space = None;
            }
            Token::Space(style) => {
                if !current.is_empty() {
                    pending_space = Some(style);
                }
            }
            Token::Word(span) => {
                let word_width = span.content.width();
                let space_width = usize::from(pending_space.is_some());
                if current_width + space_width + word_width <= avail(&lines) {
                    if let Some(style) = pending_space.take() {
                        current.push(Span::styled(" ", style));
                        current_width += 1;
                    }
                    current.push(span);
                    current_width += word_width;
                    continue;
                }
                // Start a fresh line for the word.
                if !current.is_empty() {
                    flush(&mut lines, &mut current);
                    current_width = 0;
                }
                pending_space = None;
                if word_width <= avail(&lines) {
                    current_width = word_width;
                    current.push(span);
                } else {
                    // Word wider than the line: hard-break by character.
                    for frag in split_span(&span, avail(&lines)) {
                        let frag_width = frag.content.width();
                        if current_width + frag_width > avail(&lines) && !current.is_empty() {
                            flush(&mut lines, &mut current);
                            current_width = 0;
                        }
                        current_width += frag_width;
                        current.push(frag);
                    }
                }
            }
        }
    }
    if !current.is_empty() {
        flush(&mut lines, &mut current);
    }
    if lines.is_empty() {
        lines.push(Line::from(first_prefix.to_vec()));
    }
    lines
}

// ============================================================================
// Block structure
// ============================================================================

#[derive(Debug)]
struct ListLevel {
    /// None for bullets, Some(n) for an ordered list at item n.
    number: Option<u64>,
}

/// Streaming writer that turns pulldown-cmark events into styled lines.
struct Writer {
    width: usize,
    lines: Vec<Line<'static>>,
    inline: Vec<Piece>,
    styles: Vec<Style>,
    lists: Vec<ListLevel>,
    in_blockquote: bool,
    /// Some(language) while inside a fenced/indented code block.
    code_lang: Option<String>,
    code_text: String,
}

impl Writer {
    fn new(width: usize) -> Self {
        Self {
            width: width.max(1),
            lines: Vec::new(),
            inline: Vec::new(),
            styles: vec![base_style()],
            lists: Vec::new(),
            in_blockquote: false,
            code_lang: None,
            code_text: String::new(),
        }
    }

    fn style(&self) -> Style {
        *self.styles.last().expect("style stack never empty")
    }

    fn push_style(&mut self, style: Style) {
        self.styles.push(style);
    }

    fn pop_style(&mut self) {
        if self.styles.len() > 1 {
            self.styles.pop();
        }
    }

    fn handle(&mut self, event: Event) {
        match event {
            Event::Start(tag) => self.start(tag),
            Event::End(tag) => self.end(tag),
            Event::Text(text) => {
                if self.code_lang.is_some() {
                    self.code_text.push_str(&text);
                } else {
                    self.push_inline(text.to_string(), false);
                }
            }
            Event::Code(code) => self.inline.push(Piece {
                text: code.to_string(),
                style: code_style(),
                verbatim: true,
            }),
            Event::SoftBreak => self.push_inline(" ".to_string(), false),
            Event::HardBreak => self.push_inline("\n".to_string(), false),
            Event::Rule => {
                self.flush_paragraph();
                self.lines.push(Line::from(Span::styled(
                    "─".repeat(self.width.min(40)),
                    marker_style(),
                )));
                self.lines.push(Line::default());
            }
            Event::TaskListMarker(checked) => {
                let mark = if checked { "[x] " } else { "[ ] " };
                self.push_inline(mark.to_string(), false);
            }
            // HTML is not rendered in the terminal; math passes through as-is.
            Event::Html(_) | Event::InlineHtml(_) | Event::FootnoteReference(_) => {}
            Event::InlineMath(math) | Event::DisplayMath(math) => {
                self.push_inline(math.to_string(), false);
            }
        }
    }

    fn push_inline(&mut self, text: String, verbatim: bool) {
        let style = self.style();
        self.inline.push(Piece {
            text,
            style,
            verbatim,
        });
    }

    fn start(&mut self, tag: Tag) {
        match tag {
            Tag::Heading { level, .. } => self.push_style(heading_style(level)),
            Tag::CodeBlock(kind) => {
                self.flush_paragraph();
                self.code_lang = Some(match kind {
                    CodeBlockKind::Fenced(lang) if !lang.is_empty() => lang.to_string(),
                    _ => String::new(),
                });
            }
            Tag::List(start) => {
                self.flush_paragraph();
                self.lists.push(ListLevel { number: start });
            }
            Tag::Item => self.flush_paragraph(),
            Tag::BlockQuote(_) => {
                self.flush_paragraph();
                self.in_blockquote = true;
                self.push_style(quote_style());
            }
            Tag::Emphasis => {
                let style = self.style().add_modifier(Modifier::ITALIC);
                self.push_style(style);
            }
            Tag::Strong => {
                let style = self.style().add_modifier(Modifier::BOLD);
                self.push_style(style);
            }
            Tag::Strikethrough => {
                let style = self.style().add_modifier(Modifier::CROSSED_OUT);
                self.push_style(style);
            }
            Tag::Link { .. } => self.push_style(link_style()),
            _ => {}
        }
    }

    fn end(&mut self, tag: TagEnd) {
        match tag {
            TagEnd::Paragraph => {
                self.flush_paragraph();
                if self.lists.is_empty() {
                    self.lines.push(Line::default());
                }
            }
            TagEnd::Heading(_) => {
                self.flush_paragraph();
                self.pop_style();
                self.lines.push(Line::default());
            }
            TagEnd::CodeBlock => {
                self.flush_code_block();
                self.lines.push(Line::default());
            }
            TagEnd::List(_) => {
                self.lists.pop();
                if self.lists.is_empty() {
                    self.lines.push(Line::default());
                }
            }
            TagEnd::Item => {
                self.flush_list_item();
            }
            TagEnd::BlockQuote(_) => {
                self.flush_paragraph();
                self.in_blockquote = false;
                self.pop_style();
                self.lines.push(Line::default());
            }
            TagEnd::Emphasis | TagEnd::Strong | TagEnd::Strikethrough | TagEnd::Link => {
                self.pop_style();
            }
            _ => {}
        }
    }

    fn flush_paragraph(&mut self) {
        if self.inline.is_empty() {
            return;
        }
        let pieces = std::mem::take(&mut self.inline);
        let tokens = tokenize(&pieces);
        let prefix = if self.in_blockquote {
            vec![Span::styled("│ ", marker_style())]
        } else {
            Vec::new()
        };
        self.lines
            .extend(wrap_tokens(tokens, self.width, &prefix, &prefix));
    }

    fn flush_list_item(&mut self) {
        if self.inline.is_empty() {
            return;
        }
        let pieces = std::mem::take(&mut self.inline);
        let tokens = tokenize(&pieces);

        let marker = match self.lists.last().and_then(|l| l.number) {
            Some(n) => format!("{n}. "),
            None => "• ".to_string(),
        };
        let indent = "  ".repeat(self.lists.len().saturating_sub(1));
        let first = vec![
            Span::raw(indent.clone()),
            Span::styled(marker.clone(), marker_style()),
        ];
        let rest = vec![Span::raw(format!("{indent}{}", " ".repeat(marker.width())))];
        self.lines.extend(wrap_tokens(tokens, self.width, &first, &rest));

        if let Some(level) = self.lists.last_mut()
            && let Some(n) = level.number.as_mut()
        {
            *n += 1;
        }
    }

    fn flush_code_block(&mut self) {
        let lang = self.code_lang.take().unwrap_or_default();
        let text = std::mem::take(&mut self.code_text);

        self.lines.push(Line::from(Span::styled(
            format!("```{lang}"),
            marker_style(),
        )));
        for line in text.trim_end_matches('\n').split('\n') {
            self.lines
                .push(Line::from(Span::styled(line.to_string(), code_style())));
        }
        self.lines
            .push(Line::from(Span::styled("```", marker_style())));
    }

    fn finish(mut self) -> Vec<Line<'static>> {
        if self.code_lang.is_some() {
            // Unterminated fence at end of buffer; render what we have.
            self.flush_code_block();
        } else {
            self.flush_paragraph();
        }
        while self.lines.last().is_some_and(|l| l.spans.is_empty()) {
            self.lines.pop();
        }
        self.lines
    }
}

//! Viewer runtime: owns the terminal, runs the event loop.
//!
//! One synchronous loop owns all mutable state and processes events to
//! completion one at a time: stream events are drained from the decoder
//! channel, terminal events are polled with a tick-bounded timeout, and a
//! tick fires at the frame cadence to keep the spinner moving even when the
//! external source stalls. The decoder never blocks on this loop.

use std::io::Stdout;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use crossterm::event;
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use tokio::sync::mpsc::UnboundedReceiver;

use crate::events::{StreamEvent, UiEvent};
use crate::state::{AppState, RenderOptions};
use crate::{render, terminal, update};

/// Tick cadence for spinner animation and frame pacing (~30fps).
pub const TICK_INTERVAL: Duration = Duration::from_millis(33);

/// Full-screen viewer runtime.
///
/// Terminal state is restored on drop, panic, or Ctrl+C.
pub struct Runtime {
    terminal: Terminal<CrosstermBackend<Stdout>>,
    pub state: AppState,
    stream_rx: UnboundedReceiver<StreamEvent>,
    last_tick: Instant,
}

impl Runtime {
    /// Creates the runtime and takes over the terminal.
    pub fn new(
        options: RenderOptions,
        stream_rx: UnboundedReceiver<StreamEvent>,
    ) -> Result<Self> {
        // Panic hook BEFORE entering the alternate screen.
        terminal::install_panic_hook();
        let terminal = terminal::setup_terminal().context("Failed to setup terminal")?;

        Ok(Self {
            terminal,
            state: AppState::new(options),
            stream_rx,
            last_tick: Instant::now(),
        })
    }

    /// Runs the event loop until the stream closes or the user quits.
    pub fn run(&mut self) -> Result<()> {
        // Seed dimensions; later changes arrive as resize events.
        let size = self.terminal.size()?;
        self.state.viewport.resize(size.width, size.height);

        while !self.state.should_quit {
            // Every event drained in a batch is applied before the single
            // draw below; intermediate states within a batch never reach
            // the screen.
            let events = self.collect_events()?;
            for event in events {
                update::update(&mut self.state, event);
            }
            self.terminal.draw(|frame| {
                render::render(&self.state, frame);
            })?;
        }

        Ok(())
    }

    /// Collects pending events from the decoder channel and the terminal.
    fn collect_events(&mut self) -> Result<Vec<UiEvent>> {
        let mut events = Vec::new();

        // Drain decoded stream events (non-blocking; the decoder task keeps
        // feeding the channel independently).
        while let Ok(ev) = self.stream_rx.try_recv() {
            events.push(UiEvent::Stream(ev));
        }

        // Poll terminal input. With stream events in hand, don't delay the
        // render; otherwise block until the next tick is due.
        let poll_duration = if events.is_empty() {
            TICK_INTERVAL.saturating_sub(self.last_tick.elapsed())
        } else {
            Duration::ZERO
        };
        if event::poll(poll_duration)? {
            events.push(UiEvent::Terminal(event::read()?));
            while event::poll(Duration::ZERO)? {
                events.push(UiEvent::Terminal(event::read()?));
            }
        }

        if self.last_tick.elapsed() >= TICK_INTERVAL {
            events.push(UiEvent::Tick);
            self.last_tick = Instant::now();
        }

        Ok(events)
    }
}

impl Drop for Runtime {
    fn drop(&mut self) {
        let _ = terminal::restore_terminal();
    }
}

//! Terminal lifecycle management.
//!
//! Raw mode, alternate screen, and mouse capture are enabled for the
//! duration of the viewer and restored on normal exit (Drop), panic, and
//! Ctrl+C. Restoration is idempotent.
//!
//! Frames draw to stdout; crossterm reads input from the controlling tty,
//! so standard input stays free for the content stream.

use std::io::{self, Stdout};
use std::panic;

use anyhow::{Context, Result};
use crossterm::event::{DisableMouseCapture, EnableMouseCapture};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;

/// Sets up the terminal: raw mode, alternate screen, mouse capture.
///
/// Call `install_panic_hook()` first so a panic mid-setup still restores.
///
/// # Errors
/// Returns an error if the terminal cannot be configured.
pub fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>> {
    enable_raw_mode().context("Failed to enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)
        .context("Failed to enter alternate screen")?;
    let terminal = Terminal::new(CrosstermBackend::new(stdout))
        .context("Failed to create terminal")?;
    Ok(terminal)
}

/// Restores terminal state. Safe to call multiple times.
///
/// # Errors
/// Returns an error if the terminal cannot be restored.
pub fn restore_terminal() -> Result<()> {
    // Mouse capture must go before leaving raw mode; ignore failure in case
    // it was never enabled.
    let _ = execute!(io::stdout(), DisableMouseCapture);
    execute!(io::stdout(), LeaveAlternateScreen).context("Failed to leave alternate screen")?;
    disable_raw_mode().context("Failed to disable raw mode")?;
    Ok(())
}

/// Installs a panic hook that restores the terminal before printing the
/// panic. Call BEFORE `setup_terminal()`.
pub fn install_panic_hook() {
    let original_hook = panic::take_hook();
    panic::set_hook(Box::new(move |panic_info| {
        let _ = restore_terminal();
        original_hook(panic_info);
    }));
}

#[cfg(test)]
mod tests {
    // Terminal setup needs a real tty, so these guarantees are checked
    // manually rather than in CI:
    // - Terminal is restored on normal exit (via Drop)
    // - Terminal is restored on panic
    // - Mouse capture is disabled on all exit paths
}

//! mdtail: prettified streaming markdown for your terminal.
//!
//! Tails an unbounded text stream from standard input and keeps it rendered
//! as word-wrapped, scrollable markdown, with a status line describing the
//! producer's current activity. Designed as the terminal-facing end of a
//! generation or tool-calling pipeline; mdtail owns only presentation.

pub mod decode;
pub mod events;
pub mod markdown;
pub mod render;
pub mod runtime;
pub mod state;
pub mod status;
pub mod terminal;
pub mod update;

use std::io::{IsTerminal, stdout};

use anyhow::Result;
pub use runtime::Runtime;
pub use state::{InputMode, RenderOptions};

use crate::decode::spawn_stdin_decoder;

/// Runs the viewer until the input stream ends or the user quits.
///
/// Must be called within a tokio runtime (the stdin decoder runs on a
/// blocking task).
///
/// # Errors
/// Returns an error if stdout is not a terminal or terminal setup fails.
pub fn run_viewer(options: RenderOptions) -> Result<()> {
    // The display surface has to be a terminal; content arrives on stdin.
    if !stdout().is_terminal() {
        anyhow::bail!(
            "mdtail needs a terminal on stdout.\n\
             Pipe content into it: `producer | mdtail`"
        );
    }

    let stream_rx = spawn_stdin_decoder(options.mode);
    let mut runtime = Runtime::new(options, stream_rx)?;
    runtime.run()
}

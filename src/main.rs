use anyhow::Result;
use clap::Parser;
use mdtail::{InputMode, RenderOptions};

#[derive(Parser)]
#[command(name = "mdtail")]
#[command(version)]
#[command(about = "Prettified streaming markdown for your terminal")]
struct Cli {
    /// Decode structured JSON tool events instead of raw markdown bytes
    #[arg(long)]
    events: bool,

    /// Disable the status-line spinner animation
    #[arg(long = "no-spinner")]
    no_spinner: bool,
}

fn main() {
    if let Err(e) = run() {
        eprintln!("{e:#}"); // pretty anyhow chain
        std::process::exit(1);
    }
}

#[tokio::main]
async fn run() -> Result<()> {
    init_logging();

    let cli = Cli::parse();
    let options = RenderOptions {
        spinner: !cli.no_spinner,
        mode: if cli.events {
            InputMode::Events
        } else {
            InputMode::Raw
        },
    };

    mdtail::run_viewer(options)
}

/// Diagnostics go to stderr, filtered by `MDTAIL_LOG`; silent by default so
/// nothing ever leaks into the rendered content.
fn init_logging() {
    use tracing_subscriber::EnvFilter;

    let filter =
        EnvFilter::try_from_env("MDTAIL_LOG").unwrap_or_else(|_| EnvFilter::new("error"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

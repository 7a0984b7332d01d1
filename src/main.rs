//! agemark - find directories older than a given number of days.
//!
//! Usage:
//!   agemark [PATH]                 Report every directory under PATH
//!   agemark [PATH] -d 30           Report directories at least 30 days old
//!   agemark [PATH] -f json         Print the final result as JSON
//!   agemark --help                 Show help

use std::path::PathBuf;

use clap::{ArgAction, Parser, ValueEnum};
use color_eyre::eyre::{Context, Result};
use tokio::sync::{broadcast, mpsc};
use tracing_subscriber::EnvFilter;

use agemark_scan::{ScanConfig, ScanCoordinator, ScanEvent, ScanProgress, ScanResult, parse_min_days};

/// Exit status used when the scan was interrupted.
const EXIT_CANCELLED: i32 = 130;

#[derive(Parser)]
#[command(
    name = "agemark",
    version,
    about = "Find directories older than a given number of days",
    long_about = "agemark walks a directory tree in parallel and reports every \
                  sub-directory whose creation time (or modification time, where \
                  creation time is unavailable) is at least --min-days old.\n\n\
                  Press Ctrl-C to stop a scan early."
)]
struct Cli {
    /// Directory to scan (defaults to current directory)
    #[arg(default_value = ".")]
    path: PathBuf,

    /// Minimum age in days; anything unparsable means 0 (report everything)
    #[arg(short = 'd', long, default_value = "0", allow_hyphen_values = true)]
    min_days: String,

    /// Worker threads (0 = one per CPU)
    #[arg(short = 'j', long, default_value = "0")]
    threads: usize,

    /// Do not descend into symbolic links to directories
    #[arg(long)]
    no_follow_symlinks: bool,

    /// Print progress to stderr while scanning
    #[arg(long)]
    progress: bool,

    /// Output format
    #[arg(short, long, default_value = "text")]
    format: OutputFormat,

    /// Increase log verbosity (-v info, -vv debug); RUST_LOG takes precedence
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

#[derive(Debug, Clone, Copy, ValueEnum, Default, PartialEq, Eq)]
enum OutputFormat {
    /// Stream one line per finding or error as they are found
    #[default]
    Text,
    /// Print the final result as JSON
    Json,
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = ScanConfig::builder()
        .root(cli.path)
        .min_days(parse_min_days(&cli.min_days))
        .threads(cli.threads)
        .follow_symlinks(!cli.no_follow_symlinks)
        .build()
        .context("Invalid configuration")?;

    let result = run_scan(config, cli.format, cli.progress).await?;

    match cli.format {
        OutputFormat::Text => print_summary(&result),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&result)?),
    }

    if result.cancelled {
        std::process::exit(EXIT_CANCELLED);
    }
    Ok(())
}

/// Run one scan to a terminal state, cancelling it on Ctrl-C.
async fn run_scan(config: ScanConfig, format: OutputFormat, show_progress: bool) -> Result<ScanResult> {
    let mut handle = ScanCoordinator::new()
        .stream_events(format == OutputFormat::Text)
        .start(config)
        .context("Could not start scan")?;

    let canceller = handle.canceller();
    let progress_task = show_progress.then(|| tokio::spawn(print_progress(handle.subscribe_progress())));
    let printer = handle.take_events().map(|events| tokio::spawn(print_events(events)));

    // The scan blocks its driver thread, so wait for it off the runtime.
    let mut scan_task = tokio::task::spawn_blocking(move || handle.wait());
    let joined = tokio::select! {
        joined = &mut scan_task => joined,
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("interrupt received, cancelling scan");
            canceller.cancel();
            scan_task.await
        }
    };
    drop(canceller);

    if let Some(task) = progress_task {
        task.abort();
    }
    if let Some(printer) = printer {
        printer.await.context("Event printer failed")?;
    }

    joined.context("Scan thread failed")?.context("Scan failed")
}

/// Print every streamed event as one line.
async fn print_events(mut events: mpsc::UnboundedReceiver<ScanEvent>) {
    while let Some(event) = events.recv().await {
        println!("{event}");
        if event.is_terminal() {
            break;
        }
    }
}

/// Print throttled progress snapshots to stderr.
async fn print_progress(mut progress_rx: broadcast::Receiver<ScanProgress>) {
    loop {
        match progress_rx.recv().await {
            Ok(progress) => eprintln!(
                "{}/{} directories ({:.1}%)",
                progress.processed,
                progress.total,
                progress.ratio() * 100.0
            ),
            Err(broadcast::error::RecvError::Lagged(_)) => continue,
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}

fn print_summary(result: &ScanResult) {
    eprintln!();
    eprintln!("{}", "─".repeat(60));
    eprintln!(" {}", result.root.display());
    eprintln!(
        " {} matching directories, {} errors",
        result.finding_count(),
        result.error_count()
    );
    eprintln!(
        " {} of {} directories checked in {:.2}s ({:.0} dirs/s)",
        result.progress.processed,
        result.progress.total,
        result.duration.as_secs_f64(),
        result.progress.dirs_per_second()
    );
    eprintln!("{}", "─".repeat(60));
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

use std::{fs::OpenOptions, io, path::PathBuf, sync::Mutex};

use anyhow::Context;
use chrono::{Local, TimeDelta};
use clap::Parser;
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::prelude::*;
use tracing_subscriber::EnvFilter;

use tick_pin::{
    app::{self, App},
    codec,
    config::{self, ConfigWatcher},
};

// ============================================================================
// CLI Arguments
// ============================================================================

#[derive(Parser)]
#[command(author, version, about = "⏱ tick-pin - a countdown widget pinned on top of your terminal")]
struct Args {
    /// Settings file (default: appsettings.json next to the executable)
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Start counting down right away, e.g. 25:00 or 1h30m
    #[arg(short, long, value_parser = codec::parse, allow_hyphen_values = true)]
    start: Option<TimeDelta>,
    #[arg(long)]
    no_sound: bool,
    /// Write logs to this file
    #[arg(long)]
    log_file: Option<PathBuf>,
    #[arg(short, long)]
    verbose: bool,
}

fn init_logging(args: &Args) -> anyhow::Result<()> {
    // stdout belongs to the terminal UI
    let Some(path) = &args.log_file else {
        return Ok(());
    };
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("cannot open log file {}", path.display()))?;

    let level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(format!("tick_pin={level}"))),
        )
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

// ============================================================================
// Main
// ============================================================================

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging(&args)?;

    let config_path = args.config.clone().unwrap_or_else(config::default_path);
    tracing::info!("starting tick-pin v{}", env!("CARGO_PKG_VERSION"));
    let watcher = ConfigWatcher::open(config_path);

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(watcher, args.no_sound, terminal.size()?, Local::now());
    if let Some(duration) = args.start {
        app.controller.start(duration, None, Local::now());
    }

    let res = app::run(&mut terminal, &mut app);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen, DisableMouseCapture)?;
    terminal.show_cursor()?;

    tracing::info!("exiting");
    res
}

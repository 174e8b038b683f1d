mod audio;
mod cli;
mod controls;
mod focus;
mod settings;
mod timer;
mod tone;
mod utils;
mod viewer;

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;

pub use audio::{AudioEngine, AudioEngineHandle, StereoGraph};
pub use focus::{FocusController, FocusSnapshot};
pub use settings::{AppSettings, ToneSettings};
pub use timer::{format_clock, TimerController, TimerSnapshot, TimerStatus};
pub use tone::{ToneSession, ToneSnapshot};
pub use viewer::{ClipPlayer, WaveformViewer};

pub fn run() -> Result<()> {
    let args = cli::Args::parse();

    utils::logging::init();
    log::info!("binaural-focus starting up...");

    let settings = AppSettings::load(args.config.as_deref())?.with_overrides(
        args.base,
        args.beat,
        args.duration,
    );

    let engine = AudioEngineHandle::new();
    let focus = Arc::new(FocusController::new(
        &settings,
        Box::new(engine.clone()),
        Box::new(ClipPlayer::new(engine)),
    ));

    // Commands and ticks are handled one at a time on a single thread
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to build async runtime")?;

    runtime.block_on(cli::repl(focus))
}

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::controls;
use crate::focus::FocusController;
use crate::timer::TimerStatus;

#[derive(Parser, Debug)]
#[command(version, about = "Binaural beats with a countdown focus timer")]
pub struct Args {
    /// JSON file with baseFrequencyHz, beatFrequencyHz and timerDurationMinutes
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Left ear frequency in Hz (100-1000)
    #[arg(long)]
    pub base: Option<f32>,

    /// Offset added for the right ear in Hz (1-30)
    #[arg(long)]
    pub beat: Option<f32>,

    /// Timer length in minutes (1-120)
    #[arg(long)]
    pub duration: Option<u32>,
}

#[derive(Parser)]
#[command(name = "focus", no_binary_name = true)]
struct Prompt {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug, PartialEq)]
enum Command {
    StartTimer,
    PauseTimer,
    ResetTimer,
    /// Start the timer and the beats together
    StartAll,
    StartBeats,
    StopBeats,
    /// Set the base frequency for the next start
    Base {
        #[arg(allow_negative_numbers = true)]
        hz: f32,
    },
    /// Set the beat frequency for the next start
    Beat {
        #[arg(allow_negative_numbers = true)]
        hz: f32,
    },
    /// Set the timer duration in minutes
    Duration { minutes: u32 },
    /// Load an audio file to play alongside the beats
    Load { path: PathBuf },
    /// Play or pause the loaded audio file
    PlayPause,
    Status {
        #[arg(long)]
        json: bool,
    },
    #[command(alias = "quit")]
    Exit,
}

fn parse_line(line: &str) -> Result<Option<Command>, String> {
    let args = shlex::split(line).ok_or("error: Invalid quoting")?;
    let prompt = Prompt::try_parse_from(args).map_err(|e| e.to_string())?;
    Ok(prompt.command)
}

fn print_flush(text: &str) -> Result<()> {
    let mut stdout = std::io::stdout();
    write!(stdout, "{text}")?;
    stdout.flush()?;
    Ok(())
}

/// Reads commands from stdin until `exit` or end of input.
pub async fn repl(focus: Arc<FocusController>) -> Result<()> {
    let mut events = focus.timer_events();
    let notifier = tokio::spawn(async move {
        let mut last = events.borrow().status;
        while events.changed().await.is_ok() {
            let status = events.borrow_and_update().status;
            if status == TimerStatus::Expired && last != TimerStatus::Expired {
                println!("\nTimer finished (0:00)");
            }
            last = status;
        }
    });

    println!("{}", focus.snapshot().await.timer.display);
    println!("Type `help` for commands.");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print_flush("> ")?;
        let Some(line) = lines.next_line().await? else {
            break;
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let command = match parse_line(line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(err) => {
                print_flush(&err)?;
                continue;
            }
        };

        match respond(command, &focus).await {
            Ok(true) => break,
            Ok(false) => {}
            Err(err) => println!("error: {err:#}"),
        }
    }

    notifier.abort();
    focus.shutdown().await
}

/// Runs one command; returns `true` when the session should end.
async fn respond(command: Command, focus: &FocusController) -> Result<bool> {
    match command {
        Command::StartTimer => {
            if !focus.start_timer().await {
                println!("timer already running");
            }
        }
        Command::PauseTimer => {
            if focus.pause_timer().await {
                println!("paused at {}", focus.snapshot().await.timer.display);
            }
        }
        Command::ResetTimer => println!("{}", focus.reset_timer().await.display),
        Command::StartAll => focus.start_timer_and_beats().await?,
        Command::StartBeats => {
            if !focus.start_beats().await? {
                println!("beats already playing");
            }
        }
        Command::StopBeats => {
            focus.stop_beats().await?;
        }
        Command::Base { hz } => {
            let tone = focus.set_base_frequency(controls::base_frequency(hz)).await;
            println!("base frequency {} Hz", tone.base_frequency_hz);
        }
        Command::Beat { hz } => {
            let tone = focus.set_beat_frequency(controls::beat_frequency(hz)).await;
            println!("beat frequency {} Hz", tone.beat_frequency_hz);
        }
        Command::Duration { minutes } => {
            let timer = focus
                .set_timer_duration(controls::timer_duration(minutes))
                .await;
            println!("{} minutes, showing {}", timer.duration_minutes, timer.display);
        }
        Command::Load { path } => {
            let waveform = focus.load_clip(&path).await?;
            println!("{waveform}");
        }
        Command::PlayPause => {
            let playing = focus.toggle_clip().await?;
            println!("{}", if playing { "playing" } else { "paused" });
        }
        Command::Status { json } => {
            let snapshot = focus.snapshot().await;
            if json {
                println!("{}", serde_json::to_string_pretty(&snapshot)?);
            } else {
                println!(
                    "timer {} ({:?}) | beats {} | base {} Hz, beat {} Hz{}",
                    snapshot.timer.display,
                    snapshot.timer.status,
                    if snapshot.tone.is_active { "on" } else { "off" },
                    snapshot.settings.base_frequency_hz,
                    snapshot.settings.beat_frequency_hz,
                    if snapshot.clip_loaded { " | clip loaded" } else { "" },
                );
            }
        }
        Command::Exit => return Ok(true),
    }
    Ok(false)
}

//! `boxtrack` command-line tool.
//!
//! Subcommands:
//! - `replay`: run a recorded JSON Lines frame stream through the tracker and
//!   write a session report,
//! - `capture-reference`: build an initial reference set from the first frame
//!   that has complete marker poses,
//! - `check-layout`: validate the box layout of a config,
//! - `init-config`: write a default config to start from.

mod commands;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "boxtrack", version, about = "Fiducial-marker box pose and rotation tracker")]
struct Cli {
    /// Log level: off, error, warn, info, debug, trace.
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Emit logs as JSON lines (only with the `tracing` feature).
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Replay recorded frames and write a JSON session report.
    Replay {
        /// Tracker config JSON.
        #[arg(long)]
        config: PathBuf,
        /// Frame stream (JSON Lines); overrides `frames_path` from the config.
        #[arg(long)]
        frames: Option<PathBuf>,
        /// Report path; overrides `output_path` from the config.
        #[arg(long)]
        output: Option<PathBuf>,
        /// Log a progress line every N frames (0 disables).
        #[arg(long, default_value_t = 0)]
        log_every: u64,
    },
    /// Capture an initial reference set from recorded frames.
    CaptureReference {
        #[arg(long)]
        frames: PathBuf,
        #[arg(long)]
        output: PathBuf,
    },
    /// Validate the faces and adjacency table of a config.
    CheckLayout {
        #[arg(long)]
        config: PathBuf,
    },
    /// Write a default config file.
    InitConfig {
        #[arg(long)]
        output: PathBuf,
        /// Overwrite an existing file.
        #[arg(long)]
        force: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = boxtrack_core::parse_level_filter(&cli.log_level);
    #[cfg(not(feature = "tracing"))]
    {
        if let Err(err) = boxtrack_core::init_with_level(level) {
            eprintln!("failed to install logger: {err}");
        }
        if cli.log_json {
            log::warn!("--log-json needs the `tracing` feature; using plain text");
        }
    }
    #[cfg(feature = "tracing")]
    boxtrack_core::init_tracing(level, cli.log_json);

    let result = match cli.command {
        Command::Replay {
            config,
            frames,
            output,
            log_every,
        } => commands::replay(&config, frames.as_deref(), output.as_deref(), log_every),
        Command::CaptureReference { frames, output } => {
            commands::capture_reference(&frames, &output)
        }
        Command::CheckLayout { config } => commands::check_layout(&config),
        Command::InitConfig { output, force } => commands::init_config(&output, force),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

// SPDX-License-Identifier: GPL-3.0-only

use clap::{Parser, Subcommand};
use shutter::config::Config;
use shutter::constants::APP_DIR_NAME;
use std::path::PathBuf;

mod cli;

#[derive(Parser)]
#[command(name = "shutter")]
#[command(about = "Single-screen camera: live preview, shutter, camera switch")]
#[command(version = env!("GIT_VERSION"))]
#[command(subcommand_required = false)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// List available cameras
    List,

    /// Take a photo without the preview
    Photo {
        /// Use the front camera
        #[arg(short, long)]
        front: bool,

        /// Output directory (default: ~/Pictures/Camera)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Set RUST_LOG environment variable to control log level
    // Examples: RUST_LOG=debug, RUST_LOG=shutter=debug, RUST_LOG=info
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));

    match cli.command {
        Some(Commands::List) => {
            init_stderr_logging(filter);
            cli::list_cameras()
        }
        Some(Commands::Photo { front, output }) => {
            init_stderr_logging(filter);
            cli::take_photo(front, output)
        }
        None => {
            // Log lines would tear the full-screen preview
            init_file_logging(filter);
            shutter::terminal::run(Config::load())
        }
    }
}

fn init_stderr_logging(filter: tracing_subscriber::EnvFilter) {
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_level(true)
        .with_writer(std::io::stderr)
        .init();
}

fn init_file_logging(filter: tracing_subscriber::EnvFilter) {
    let log_file = dirs::cache_dir().and_then(|dir| {
        let dir = dir.join(APP_DIR_NAME);
        std::fs::create_dir_all(&dir).ok()?;
        std::fs::File::create(dir.join("shutter.log")).ok()
    });

    match log_file {
        Some(file) => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_ansi(false)
            .with_writer(std::sync::Mutex::new(file))
            .init(),
        None => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::sink)
            .init(),
    }
}

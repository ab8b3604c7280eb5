// crates/stinger-cli/src/main.rs
//
// `stinger`: inspect stinger files and drive the transition headlessly.

mod commands;
mod compose;
mod headless;
mod yuv;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use commands::{probe::ProbeArgs, render::RenderArgs};

#[derive(Parser, Debug)]
#[command(name = "stinger", version, about = "Stinger transition tools")]
struct Cli {
    /// Log at debug level regardless of RUST_LOG.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Decode a stinger file once and report frame count, rate and slider range.
    Probe(ProbeArgs),
    /// Simulate transitions and optionally write every composited tick as PNG.
    Render(RenderArgs),
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    ffmpeg_the_third::init().context("FFmpeg init failed")?;

    match cli.cmd {
        Command::Probe(args)  => commands::probe::run(args),
        Command::Render(args) => commands::render::run(args),
    }
}

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! sj: inspect and repair sequencing job directories

mod color;
mod commands;
mod exit_error;
mod output;

use clap::{CommandFactory, Parser, Subcommand};
use commands::{checkpoint, deferred, orphans, scatter};
use exit_error::ExitError;
use output::OutputFormat;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "sj",
    version,
    about = "Inspect and repair sequencing job directories",
    styles = color::styles()
)]
struct Cli {
    /// Output format
    #[arg(short = 'o', long = "format", value_enum, default_value_t, global = true)]
    format: OutputFormat,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Inspect task checkpoints
    Checkpoint(checkpoint::CheckpointArgs),
    /// Inspect or replay deferred-delete logs
    Deferred(deferred::DeferredArgs),
    /// Plan scatter intervals from a reference dictionary
    Scatter(scatter::ScatterArgs),
    /// Report orphaned files in an analysis directory
    Orphans(orphans::OrphansArgs),
}

fn main() {
    init_tracing();
    if let Err(e) = run() {
        if let Some(exit) = e.downcast_ref::<ExitError>() {
            if !exit.message.is_empty() {
                eprintln!("{}", exit.message);
            }
            std::process::exit(exit.code);
        }
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}

fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let format = cli.format;
    tracing::debug!(?format, "starting");
    match cli.command {
        None => {
            Cli::command().print_help()?;
            Ok(())
        }
        Some(Commands::Checkpoint(args)) => checkpoint::handle(args.command, format),
        Some(Commands::Deferred(args)) => deferred::handle(args.command, format),
        Some(Commands::Scatter(args)) => scatter::handle(args.command, format),
        Some(Commands::Orphans(args)) => orphans::handle(args, format),
    }
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(sj_engine::env::log_filter()))
        .with_writer(std::io::stderr)
        .init();
}

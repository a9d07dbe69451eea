//! `mdcast` -- convert markdown into chat/wiki markup dialects.
//!
//! Reads markdown from a file (or stdin when no file is given), converts it
//! to the requested dialect, and writes the result to stdout or a file:
//!
//! ```text
//! mdcast --to jira NOTES.md
//! cat NOTES.md | mdcast --to slack
//! mdcast --to jira NOTES.md -o notes.jira
//! ```

use std::fs;
use std::io::{self, Read, Write};
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use mdcast_core::{Dialect, DialectDispatcher};

/// Convert markdown to JIRA wiki markup or Slack mrkdwn.
#[derive(Parser)]
#[command(name = "mdcast", about = "Convert markdown to JIRA or Slack markup", version)]
struct Cli {
    /// Target dialect (jira, slack).
    #[arg(short, long)]
    to: Dialect,

    /// Input markdown file (reads stdin when omitted).
    input: Option<PathBuf>,

    /// Write output to a file instead of stdout.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Enable verbose (debug-level) logging.
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with_writer(io::stderr)
        .init();

    let markdown = match &cli.input {
        Some(path) => fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?,
        None => {
            let mut buffer = String::new();
            io::stdin()
                .read_to_string(&mut buffer)
                .context("failed to read stdin")?;
            buffer
        }
    };

    tracing::debug!(dialect = %cli.to, bytes = markdown.len(), "converting");
    let converted = DialectDispatcher::new().convert_to(cli.to, &markdown);

    match &cli.output {
        Some(path) => fs::write(path, &converted)
            .with_context(|| format!("failed to write {}", path.display()))?,
        None => {
            let mut stdout = io::stdout().lock();
            stdout.write_all(converted.as_bytes())?;
            stdout.write_all(b"\n")?;
        }
    }

    Ok(())
}

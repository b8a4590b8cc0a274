use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::commands::{self, CommandReport};
use crate::logging;

#[derive(Debug, Parser)]
#[command(
    name = "tg-inbox",
    version,
    about = "Capture Telegram notes and photos into monthly markdown logs"
)]
struct Cli {
    /// Print command reports as JSON.
    #[arg(long, global = true)]
    json: bool,
    /// Debug-level logging (overrides RUST_LOG).
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the bot until interrupted.
    Serve,
    /// Append a note to the current month's log.
    Note {
        #[arg(required = true)]
        text: Vec<String>,
    },
    /// List monthly logs.
    Ls,
    /// Print a log file (current month by default).
    Read { name: Option<String> },
    /// Zip the media tree.
    ExportMedia {
        #[arg(long)]
        dest: Option<PathBuf>,
    },
    /// Show resolved configuration and flag problems.
    Status,
}

fn print_report(report: &CommandReport, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
        return Ok(());
    }
    println!(
        "{}: {}",
        report.command,
        if report.ok { "ok" } else { "issues" }
    );
    for detail in &report.details {
        println!("  {detail}");
    }
    for issue in &report.issues {
        println!("  ! {issue}");
    }
    Ok(())
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let report = match cli.command {
        Command::Serve => return commands::serve::run(),
        Command::Read { name } => {
            println!("{}", commands::read::run(name.as_deref())?);
            return Ok(());
        }
        Command::Note { text } => commands::note::run(&text.join(" "))?,
        Command::Ls => commands::ls::run()?,
        Command::ExportMedia { dest } => {
            commands::export_media::run(&commands::export_media::ExportMediaOptions { dest })?
        }
        Command::Status => commands::status::run()?,
    };

    print_report(&report, cli.json)?;
    if !report.ok {
        anyhow::bail!(
            "{} reported {} issue(s)",
            report.command,
            report.issues.len()
        );
    }
    Ok(())
}

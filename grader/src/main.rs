//! Puzzle submission grader.
//!
//! Loads a level and a submission, runs the board to completion, and exits
//! with a stable code: 0 passed, 1 failed, 2 malformed input.

use std::fs;
use std::path::{Path, PathBuf};
use std::process;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use grader::check::{CheckOptions, check};
use grader::{exit_codes, logging};

#[derive(Parser)]
#[command(name = "grader", version, about = "Grade puzzle submissions")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run a submission against a level and report the verdict.
    Check {
        /// Level file: header, layout, ports, test vectors.
        level: PathBuf,
        /// Submission file: cells plus per-bot instruction grids.
        submission: PathBuf,
        /// Cycle budget before the run counts as failed.
        #[arg(long, default_value_t = 999)]
        max_cycles: usize,
        /// Print the resolved board to stdout before every cycle.
        #[arg(long)]
        trace_board: bool,
        /// Emit the verdict as JSON instead of a summary line.
        #[arg(long)]
        json: bool,
    },
}

fn main() {
    logging::init();
    let cli = Cli::parse();
    let code = match cli.command {
        Command::Check {
            level,
            submission,
            max_cycles,
            trace_board,
            json,
        } => match cmd_check(&level, &submission, max_cycles, trace_board, json) {
            Ok(code) => code,
            Err(err) => {
                eprintln!("{err:#}");
                exit_codes::MALFORMED
            }
        },
    };
    process::exit(code);
}

fn cmd_check(
    level: &Path,
    submission: &Path,
    max_cycles: usize,
    trace_board: bool,
    json: bool,
) -> Result<i32> {
    let level_text =
        fs::read_to_string(level).with_context(|| format!("read {}", level.display()))?;
    let submission_text = fs::read_to_string(submission)
        .with_context(|| format!("read {}", submission.display()))?;

    let options = CheckOptions {
        max_cycles,
        trace_board,
    };
    let report = check(&level_text, &submission_text, &options)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("{}", report.human());
    }
    Ok(if report.passed {
        exit_codes::OK
    } else {
        exit_codes::FAILED
    })
}

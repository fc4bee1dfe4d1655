//! Orchestration of one grading run: load, validate, run, verdict.

use anyhow::{Context, Result};
use tracing::info;

use crate::loader;
use crate::report::Report;

pub struct CheckOptions {
    pub max_cycles: usize,
    /// Print the resolved board to stdout before every cycle.
    pub trace_board: bool,
}

impl Default for CheckOptions {
    fn default() -> CheckOptions {
        CheckOptions {
            max_cycles: 999,
            trace_board: false,
        }
    }
}

/// Grades one submission against one level.
///
/// Format and validation problems come back as `Err`; a submission that
/// loads but fails its run is an `Ok` report with `passed` false.
pub fn check(level: &str, submission: &str, options: &CheckOptions) -> Result<Report> {
    let mut board = loader::load_level(level).context("level file")?;
    loader::apply_submission(&mut board, submission).context("submission file")?;
    board.reset_and_validate().context("validation")?;
    let (passed, _) = if options.trace_board {
        board.run_with(options.max_cycles, |board| {
            println!("Cycle {}", board.cycle());
            print!("{}", board.resolved_board());
        })
    } else {
        board.run(options.max_cycles)
    };
    info!(passed, cycles = board.cycle(), "check finished");
    Ok(Report::from_board(passed, &board))
}

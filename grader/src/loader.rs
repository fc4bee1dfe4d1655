//! Text formats for levels and submissions.
//!
//! A level file carries the puzzle: a header `rows cols bots inputs outputs`,
//! the layout grid, one `y x` line per input then output port, and the test
//! vectors (per case, one bit line per input port followed by one color
//! line). A submission file carries the answer: the cell grid, then a
//! direction grid and an operation grid for each bot.
//!
//! Grid rows are positional and padded to the board width, so blank and
//! short rows are fine inside a grid. Outside grids, blank lines are
//! skipped.

use anyhow::{Context, Result, bail};
use engine::Board;

/// Largest accepted board dimension and bot count. Real levels are tiny;
/// anything past this is a malformed file, not a puzzle.
const MAX_HEADER_FIELD: usize = 256;

/// Parses a level file into a board with no cells or instructions yet.
pub fn load_level(text: &str) -> Result<Board> {
    let mut lines = text.lines();
    let Some(header) = next_content(&mut lines) else {
        bail!("level file is empty");
    };
    let fields: Vec<usize> = header
        .split_whitespace()
        .map(str::parse)
        .collect::<Result<_, _>>()
        .with_context(|| format!("invalid level header {header:?}"))?;
    let &[rows, cols, bots, ninputs, noutputs] = fields.as_slice() else {
        bail!("level header {header:?} needs five fields: rows cols bots inputs outputs");
    };
    if fields.iter().any(|&field| field > MAX_HEADER_FIELD) {
        bail!("level header {header:?} exceeds the limit of {MAX_HEADER_FIELD}");
    }

    let mut board = Board::new(rows, cols, bots);
    let layout = take_grid(&mut lines, rows, cols).context("level layout")?;
    board.set_level(&layout)?;
    for k in 0..ninputs {
        let (y, x) = parse_port(&mut lines).with_context(|| format!("input port {k}"))?;
        board.add_input(y, x).with_context(|| format!("input port {k}"))?;
    }
    for k in 0..noutputs {
        let (y, x) = parse_port(&mut lines).with_context(|| format!("output port {k}"))?;
        board.add_output(y, x).with_context(|| format!("output port {k}"))?;
    }

    let mut input_bits: Vec<Vec<String>> = Vec::new();
    let mut output_colors: Vec<String> = Vec::new();
    while let Some(mut line) = next_content(&mut lines) {
        let mut case = Vec::with_capacity(ninputs);
        for _ in 0..ninputs {
            case.push(line.trim().to_string());
            line = next_content(&mut lines).with_context(|| {
                format!("test case {} is missing its color line", input_bits.len())
            })?;
        }
        input_bits.push(case);
        output_colors.push(line.trim().to_string());
    }
    board.set_input_bits(&input_bits)?;
    board.set_output_colors(&output_colors)?;
    Ok(board)
}

/// Parses a submission file and installs its cells and instruction grids.
pub fn apply_submission(board: &mut Board, text: &str) -> Result<()> {
    let rows = board.rows();
    let cols = board.cols();
    let mut lines = text.lines();
    let cells = take_grid(&mut lines, rows, cols).context("submission cells")?;
    board.set_cells(&cells)?;
    for k in 0..board.nbots() {
        let directions =
            take_grid(&mut lines, rows, cols).with_context(|| format!("bot {k} directions"))?;
        let operations =
            take_grid(&mut lines, rows, cols).with_context(|| format!("bot {k} operations"))?;
        board.set_instructions(k, &directions, &operations)?;
    }
    Ok(())
}

/// The next non-blank line.
fn next_content<'a>(lines: &mut impl Iterator<Item = &'a str>) -> Option<&'a str> {
    lines.find(|line| !line.trim().is_empty())
}

/// Takes `rows` consecutive lines and pads each to `cols` characters.
fn take_grid<'a>(
    lines: &mut impl Iterator<Item = &'a str>,
    rows: usize,
    cols: usize,
) -> Result<String> {
    let mut out = String::new();
    for k in 0..rows {
        let line = lines.next().with_context(|| format!("missing grid row {k}"))?;
        if line.len() > cols {
            bail!("grid row {k} is wider than {cols} columns");
        }
        out.push_str(line);
        for _ in line.len()..cols {
            out.push(' ');
        }
        out.push('\n');
    }
    Ok(out)
}

fn parse_port<'a>(lines: &mut impl Iterator<Item = &'a str>) -> Result<(usize, usize)> {
    let Some(line) = next_content(lines) else {
        bail!("missing port coordinates");
    };
    let fields: Vec<usize> = line
        .split_whitespace()
        .map(str::parse)
        .collect::<Result<_, _>>()
        .with_context(|| format!("invalid port coordinates {line:?}"))?;
    let &[y, x] = fields.as_slice() else {
        bail!("port line {line:?} needs two fields: y x");
    };
    Ok((y, x))
}

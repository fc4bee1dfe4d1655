//! Helpers for building small validated boards in tests.
//!
//! Grids are given as text blocks; lines are padded with spaces to the widest
//! line so callers can write ragged literals. Every board gets a minimal
//! one-step test vector so it validates and stays `Running` until a test
//! drives it further.

use crate::board::Board;
use crate::cell::Value;
use crate::geom::Coord;

fn dims(text: &str) -> (usize, usize) {
    let rows = text.lines().count().max(1);
    let cols = text.lines().map(str::len).max().unwrap_or(0).max(1);
    (rows, cols)
}

fn pad(text: &str, rows: usize, cols: usize) -> String {
    let mut out = String::new();
    let mut lines = text.lines();
    for _ in 0..rows {
        let line = lines.next().unwrap_or("");
        out.push_str(line);
        for _ in line.len()..cols {
            out.push(' ');
        }
        out.push('\n');
    }
    out
}

/// A validated board with the given cells, no bots, and no ports.
pub fn board(cells: &str) -> Board {
    board_with_bots(cells, &[])
}

/// A validated board with one bot.
pub fn board_with_bot(cells: &str, directions: &str, operations: &str) -> Board {
    board_with_bots(cells, &[(directions, operations)])
}

/// A validated board with any number of bots, each given as
/// `(directions, operations)`.
pub fn board_with_bots(cells: &str, bots: &[(&str, &str)]) -> Board {
    let (rows, cols) = dims(cells);
    let mut board = Board::new(rows, cols, bots.len());
    board
        .set_cells(&pad(cells, rows, cols))
        .expect("test cells should parse");
    for (k, (directions, operations)) in bots.iter().enumerate() {
        board
            .set_instructions(k, &pad(directions, rows, cols), &pad(operations, rows, cols))
            .expect("test instructions should parse");
    }
    board.set_input_bits(&[vec![]]).expect("test bits");
    board
        .set_output_colors(&[String::from("K")])
        .expect("test colors");
    board
        .reset_and_validate()
        .expect("test board should validate");
    board
}

/// The resolved value of the cell at `(y, x)`.
pub fn value_at(board: &Board, y: i32, x: i32) -> Value {
    board
        .cell(Coord::new(y, x))
        .expect("coordinate inside the board")
        .value
}

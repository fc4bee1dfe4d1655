//! End-to-end runs of small boards through the public setup API: build,
//! validate, run to completion, and check the verdict.

use engine::{Board, Color, ErrorReason, Status};

/// Two always-powered outputs, a blue and a red port cell, and a bot that
/// immediately emits. Expecting `colors` per test case.
fn mixer_board(cells: &str, operations: &str, colors: &[&str]) -> Board {
    let mut board = Board::new(2, 3, 1);
    board.add_output(0, 0).unwrap();
    board.add_output(0, 2).unwrap();
    board.set_cells(cells).unwrap();
    board.set_instructions(0, "   \n>  ", operations).unwrap();
    let cases: Vec<Vec<String>> = colors.iter().map(|_| vec![]).collect();
    board.set_input_bits(&cases).unwrap();
    let colors: Vec<String> = colors.iter().map(|c| String::from(*c)).collect();
    board.set_output_colors(&colors).unwrap();
    board.reset_and_validate().unwrap();
    board
}

#[test]
fn powered_outputs_mix_into_the_expected_color() {
    let mut board = mixer_board("/ -\n   ", "   \nSn ", &["P"]);
    assert_eq!(board.run(10), (true, false));
    assert_eq!(board.status(), Status::Done);
    assert_eq!(board.last_color(), Color::Purple);
    assert_eq!(board.cycle(), 1);
}

#[test]
fn complementary_outputs_mix_to_white() {
    let mut board = mixer_board("| /\n   ", "   \nSn ", &["W"]);
    assert_eq!(board.run(10), (true, false));
    assert_eq!(board.status(), Status::Done);
    assert_eq!(board.last_color(), Color::White);
}

#[test]
fn mismatched_output_color_fails_the_run() {
    let mut board = mixer_board("/ -\n   ", "   \nSn ", &["B"]);
    assert_eq!(board.run(10), (false, true));
    let err = board.error().unwrap();
    assert_eq!(err.message(), "Wrong output");
    assert_eq!(err.reason(), ErrorReason::WrongOutput);
}

#[test]
fn undetermined_output_cell_fails_the_run() {
    // The untethered cell on the first output never settles.
    let mut board = mixer_board("x -\n   ", "   \nSn ", &["R"]);
    assert_eq!(board.run(10), (false, true));
    let err = board.error().unwrap();
    assert_eq!(err.message(), "Output is in undetermined state");
    assert_eq!(err.reason(), ErrorReason::WrongOutput);
}

#[test]
fn exhausted_cycle_budget_is_recorded() {
    // The bot never reaches a next instruction.
    let mut board = mixer_board("/ -\n   ", "   \nS  ", &["P"]);
    assert_eq!(board.run(5), (false, false));
    assert_eq!(board.status(), Status::Running);
    let err = board.error().unwrap();
    assert_eq!(err.reason(), ErrorReason::TooManyCycles);
    assert_eq!(board.error_reason(), Some(ErrorReason::TooManyCycles));
}

#[test]
fn power_toggle_drops_an_output_from_the_mix() {
    let mut board = mixer_board("/ -\n   ", "   \nSpn", &["R"]);
    assert_eq!(board.run(10), (true, false));
    assert_eq!(board.last_color(), Color::Red);
    assert_eq!(board.cycle(), 2);
}

#[test]
fn test_cases_advance_after_their_last_step() {
    let mut board = mixer_board("/ -\n   ", "   \nSnn", &["P", "P"]);
    assert_eq!(board.run(10), (true, false));
    assert_eq!(board.test_case(), 1);
    assert_eq!(board.status(), Status::Done);
}

#[test]
fn input_bits_drive_the_output_across_io_steps() {
    // An input port feeds a coupled cell sitting on the output; the emitted
    // color tracks the bit stream one io step at a time.
    let mut board = Board::new(1, 5, 1);
    board.add_input(0, 0).unwrap();
    board.add_output(0, 2).unwrap();
    board.set_cells("x x  ").unwrap();
    board.set_instructions(0, "   > ", "   Sn").unwrap();
    board.set_input_bits(&[vec![String::from("10")]]).unwrap();
    board.set_output_colors(&[String::from("BG")]).unwrap();
    board.reset_and_validate().unwrap();
    assert_eq!(board.run(10), (true, false));
    assert_eq!(board.last_color(), Color::Green);
    assert_eq!(board.io_step(), 2);
}

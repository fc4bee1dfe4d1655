//! Board assembly, validation, and inspection.
//!
//! A board is built in two phases. Setup methods (`set_level`, `set_cells`,
//! `add_input`, ...) load text grids and declarations, failing fast on shape
//! problems. [`Board::reset_and_validate`] then cross-checks everything,
//! seeds the bots, and resolves the initial cell values; only after it
//! succeeds may the board be stepped.

use serde::Serialize;

use crate::cell::{Cell, Value};
use crate::color::Color;
use crate::error::{Error, ErrorReason};
use crate::geom::{Coord, Direction};
use crate::grid::Grid;
use crate::op::{Op, OpKind};
use crate::resolver::Resolver;

/// Lifecycle state derived from counters and the invalid flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    /// A fatal error occurred; the board no longer steps.
    Invalid,
    Running,
    /// Every step of every test vector has been checked.
    Done,
}

/// A mobile machine walking the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Bot {
    pub location: Coord,
    pub heading: Direction,
    pub holding: bool,
    pub rotating: bool,
}

impl Bot {
    fn at(location: Coord) -> Bot {
        Bot {
            location,
            // Bots that never see a heading instruction drift left.
            heading: Direction::Left,
            holding: false,
            rotating: false,
        }
    }
}

/// An input port: the cell on it is latched and driven from the test vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Input {
    pub location: Coord,
}

/// An output port; only powered ports contribute to the checked color.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Output {
    pub location: Coord,
    pub power: bool,
    pub(crate) toggle_power: bool,
}

/// The complete puzzle state: level, submission, bots, and test vectors.
#[derive(Debug)]
pub struct Board {
    pub(crate) nbots: usize,
    /// Level layout characters; `_` is a synonym for space.
    pub(crate) level: Grid<char>,
    /// Submission cells as loaded; `cells` is reset from this.
    pub(crate) initial_cells: Grid<Cell>,
    pub(crate) cells: Grid<Cell>,
    pub(crate) trespassable: Grid<bool>,
    pub(crate) directions: Vec<Grid<Direction>>,
    pub(crate) operations: Vec<Grid<Op>>,
    pub(crate) bots: Vec<Bot>,
    pub(crate) inputs: Vec<Input>,
    pub(crate) outputs: Vec<Output>,
    /// `input_bits[test][input][step]`
    pub(crate) input_bits: Vec<Vec<Vec<bool>>>,
    /// `output_colors[test][step]`
    pub(crate) output_colors: Vec<Vec<Color>>,
    pub(crate) last_color: Color,
    pub(crate) error: Option<Error>,
    pub(crate) invalid: bool,
    pub(crate) test_case: usize,
    pub(crate) io_step: usize,
    pub(crate) cycle: usize,
    pub(crate) resolver: Resolver,
}

impl Board {
    pub fn new(rows: usize, cols: usize, nbots: usize) -> Board {
        Board {
            nbots,
            level: Grid::filled(rows, cols, ' '),
            initial_cells: Grid::new(rows, cols),
            cells: Grid::new(rows, cols),
            trespassable: Grid::filled(rows, cols, true),
            directions: vec![Grid::new(rows, cols); nbots],
            operations: vec![Grid::new(rows, cols); nbots],
            bots: Vec::new(),
            inputs: Vec::new(),
            outputs: Vec::new(),
            input_bits: Vec::new(),
            output_colors: Vec::new(),
            last_color: Color::Invalid,
            error: None,
            invalid: false,
            test_case: 0,
            io_step: 0,
            cycle: 0,
            resolver: Resolver::default(),
        }
    }

    pub fn rows(&self) -> usize {
        self.level.rows()
    }

    pub fn cols(&self) -> usize {
        self.level.cols()
    }

    pub fn nbots(&self) -> usize {
        self.nbots
    }

    /// Records a fatal error, marks the board invalid, and returns the error.
    pub(crate) fn fail<T>(&mut self, error: Error) -> Result<T, Error> {
        self.invalid = true;
        self.error = Some(error.clone());
        Err(error)
    }

    // ---- setup -----------------------------------------------------------

    pub fn add_input(&mut self, y: usize, x: usize) -> Result<(), Error> {
        let at = Coord::new(y as i32, x as i32);
        if !self.level.contains(at) {
            return self.fail(Error::out_of_range("Input port outside the board"));
        }
        self.inputs.push(Input { location: at });
        Ok(())
    }

    pub fn add_output(&mut self, y: usize, x: usize) -> Result<(), Error> {
        let at = Coord::new(y as i32, x as i32);
        if !self.level.contains(at) {
            return self.fail(Error::out_of_range("Output port outside the board"));
        }
        self.outputs.push(Output {
            location: at,
            power: true,
            toggle_power: false,
        });
        Ok(())
    }

    /// Loads the level layout grid. `_` is kept verbatim and treated as a
    /// passable square everywhere it is checked.
    pub fn set_level(&mut self, text: &str) -> Result<(), Error> {
        let mut level = Grid::filled(self.rows(), self.cols(), ' ');
        if level.set_from_text(text, |c| c).is_err() {
            return self.fail(Error::board_size_mismatch());
        }
        self.level = level;
        Ok(())
    }

    /// Loads the submission cell grid.
    ///
    /// Diode arrows span two squares: the arrow square becomes the sink and
    /// the square the arrow points away from becomes the source, overwriting
    /// whatever character sat there.
    pub fn set_cells(&mut self, text: &str) -> Result<(), Error> {
        let mut raw = Grid::filled(self.rows(), self.cols(), ' ');
        if raw.set_from_text(text, |c| c).is_err() {
            return self.fail(Error::board_size_mismatch());
        }

        let mut cells: Grid<Cell> = Grid::new(self.rows(), self.cols());
        for at in raw.coords() {
            let (direction, source_at) = match raw[at] {
                '<' => (Direction::Left, at + Coord::new(0, 1)),
                'v' => (Direction::Down, at + Coord::new(-1, 0)),
                '>' => (Direction::Right, at + Coord::new(0, -1)),
                '^' => (Direction::Up, at + Coord::new(1, 0)),
                _ => continue,
            };
            if cells.contains(source_at) {
                let (source, sink) = Cell::diode(direction);
                cells[source_at] = source;
                cells[at] = sink;
            }
        }
        for at in raw.coords() {
            if !cells[at].exists {
                cells[at] = Cell::from_char(raw[at]);
            }
        }

        // Both halves of every pair must be present and agree.
        for at in cells.coords() {
            let cell = cells[at];
            if !cell.exists || cell.partner_delta.is_zero() {
                continue;
            }
            let consistent = match cells.partner(at) {
                Some(partner) => {
                    partner.partner_delta == -cell.partner_delta
                        && partner.offset == cell.offset
                        && if cell.offset {
                            partner.direction == cell.direction.opposite()
                        } else {
                            partner.direction == cell.direction
                        }
                }
                None => false,
            };
            if !consistent {
                return self.fail(Error::invalid_input("Mismatched cell pair"));
            }
        }

        self.initial_cells = cells;
        Ok(())
    }

    /// Loads one bot's heading and operation grids.
    pub fn set_instructions(
        &mut self,
        bot: usize,
        directions: &str,
        operations: &str,
    ) -> Result<(), Error> {
        if bot >= self.nbots {
            return self.fail(Error::out_of_range("Instruction grid for unknown bot"));
        }
        let mut dirs: Grid<Direction> = Grid::new(self.rows(), self.cols());
        let mut ops: Grid<Op> = Grid::new(self.rows(), self.cols());
        if dirs.set_from_text(directions, Direction::from_char).is_err()
            || ops.set_from_text(operations, Op::from_char).is_err()
        {
            return self.fail(Error::board_size_mismatch());
        }
        self.directions[bot] = dirs;
        self.operations[bot] = ops;
        Ok(())
    }

    pub fn set_input_bits(&mut self, bits: &[Vec<String>]) -> Result<(), Error> {
        let mut parsed = Vec::with_capacity(bits.len());
        for test in bits {
            let mut per_input = Vec::with_capacity(test.len());
            for line in test {
                let mut seq = Vec::with_capacity(line.len());
                for c in line.chars() {
                    match c {
                        '0' => seq.push(false),
                        '1' => seq.push(true),
                        _ => return self.fail(Error::invalid_level("Invalid input bit")),
                    }
                }
                per_input.push(seq);
            }
            parsed.push(per_input);
        }
        self.input_bits = parsed;
        Ok(())
    }

    pub fn set_output_colors(&mut self, colors: &[String]) -> Result<(), Error> {
        let mut parsed = Vec::with_capacity(colors.len());
        for line in colors {
            let mut seq = Vec::with_capacity(line.len());
            for c in line.chars() {
                let color = Color::from_char(c);
                if color == Color::Invalid {
                    return self.fail(Error::invalid_level("Invalid output color"));
                }
                seq.push(color);
            }
            parsed.push(seq);
        }
        self.output_colors = parsed;
        Ok(())
    }

    // ---- validation ------------------------------------------------------

    /// Cross-checks the level against the submission, seeds the bots, resets
    /// all runtime state, and resolves the initial values.
    pub fn reset_and_validate(&mut self) -> Result<(), Error> {
        self.error = None;
        self.invalid = false;
        self.last_color = Color::Invalid;

        self.compute_trespassable();
        self.check_layout()?;
        self.check_instruction_placement()?;
        self.seed_bots()?;
        self.check_vectors()?;

        self.cells = self.initial_cells.clone();
        self.test_case = 0;
        self.io_step = 0;
        self.cycle = 0;

        for k in 0..self.inputs.len() {
            let at = self.inputs[k].location;
            let c = self.cells[at].to_char();
            if c != 'x' && c != '+' {
                return self.fail(Error::invalid_input(
                    "Input port must hold a plain unlatched cell",
                ));
            }
            self.cells[at].latched = true;
        }
        for output in &mut self.outputs {
            output.power = true;
            output.toggle_power = false;
        }

        self.resolve();
        Ok(())
    }

    fn compute_trespassable(&mut self) {
        self.trespassable.fill(true);
        for at in self.level.coords() {
            if !matches!(self.level[at], ' ' | '_') {
                self.trespassable[at] = false;
            }
        }
        for k in 0..self.inputs.len() {
            self.trespassable[self.inputs[k].location] = false;
        }
        for k in 0..self.outputs.len() {
            self.trespassable[self.outputs[k].location] = false;
        }
    }

    /// Enforces the level's per-square constraints on the submission cells.
    fn check_layout(&mut self) -> Result<(), Error> {
        for at in self.level.coords() {
            let cell = self.initial_cells[at];
            match self.level[at] {
                ' ' | '_' => {}
                '.' => {
                    if cell.exists {
                        return self.fail(Error::invalid_input("Cell on a forbidden square"));
                    }
                }
                // An arrow in the layout requires the cell to repeat its
                // neighbor in that direction.
                c @ ('<' | 'v' | '>' | '^') => {
                    let other = at + Direction::from_char(c).delta();
                    let matches = self
                        .initial_cells
                        .get(other)
                        .is_some_and(|o| o.to_char() == cell.to_char());
                    if !matches {
                        return self.fail(Error::invalid_input("Cell does not repeat its neighbor"));
                    }
                }
                c => {
                    if cell.to_char() != c {
                        return self.fail(Error::invalid_input("Cell does not match the level"));
                    }
                }
            }
        }
        Ok(())
    }

    fn check_instruction_placement(&mut self) -> Result<(), Error> {
        for k in 0..self.nbots {
            for at in self.trespassable.coords() {
                if self.trespassable[at] {
                    continue;
                }
                if self.directions[k][at].is_some() || !self.operations[k][at].is_none() {
                    return self.fail(Error::invalid_input("Instruction on an impassable square"));
                }
            }
        }
        Ok(())
    }

    fn seed_bots(&mut self) -> Result<(), Error> {
        let mut bots = Vec::with_capacity(self.nbots);
        for k in 0..self.nbots {
            let mut start = None;
            for at in self.operations[k].coords() {
                if self.operations[k][at].kind == OpKind::Start {
                    if start.is_some() {
                        return self
                            .fail(Error::invalid_level("Bot has multiple START instructions"));
                    }
                    start = Some(at);
                }
            }
            match start {
                Some(at) => bots.push(Bot::at(at)),
                None => {
                    return self
                        .fail(Error::invalid_level("Bot does not have a START instruction"));
                }
            }
        }
        self.bots = bots;
        Ok(())
    }

    fn check_vectors(&mut self) -> Result<(), Error> {
        if self.output_colors.is_empty() {
            return self.fail(Error::invalid_level("Level has no test cases"));
        }
        if self.input_bits.len() != self.output_colors.len() {
            return self.fail(Error::invalid_level(
                "Input and output test case counts differ",
            ));
        }
        for t in 0..self.input_bits.len() {
            if self.input_bits[t].len() != self.inputs.len() {
                return self.fail(Error::invalid_level(
                    "Test case does not cover every input port",
                ));
            }
            let steps = self.output_colors[t].len();
            if steps == 0 {
                return self.fail(Error::invalid_level("Test case has no steps"));
            }
            if self.input_bits[t].iter().any(|seq| seq.len() != steps) {
                return self.fail(Error::invalid_level(
                    "Input bits do not align with output colors",
                ));
            }
        }
        Ok(())
    }

    // ---- queries ---------------------------------------------------------

    pub fn status(&self) -> Status {
        if self.invalid {
            return Status::Invalid;
        }
        match self.output_colors.last() {
            Some(last)
                if self.test_case + 1 == self.output_colors.len()
                    && self.io_step >= last.len() =>
            {
                Status::Done
            }
            _ => Status::Running,
        }
    }

    pub fn error(&self) -> Option<&Error> {
        self.error.as_ref()
    }

    pub fn error_reason(&self) -> Option<ErrorReason> {
        self.error.as_ref().map(Error::reason)
    }

    pub fn bots(&self) -> &[Bot] {
        &self.bots
    }

    pub fn cell(&self, at: Coord) -> Option<&Cell> {
        self.cells.get(at)
    }

    /// Whether bots and cells may occupy the square.
    pub fn trespassable(&self, at: Coord) -> bool {
        self.trespassable.get(at).copied().unwrap_or(false)
    }

    pub fn cycle(&self) -> usize {
        self.cycle
    }

    pub fn test_case(&self) -> usize {
        self.test_case
    }

    pub fn io_step(&self) -> usize {
        self.io_step
    }

    /// Color mixed at the most recent output check.
    pub fn last_color(&self) -> Color {
        self.last_color
    }

    /// The board drawn by latch state, ignoring current values.
    pub fn unresolved_board(&self) -> String {
        self.render(Cell::to_char)
    }

    /// The board drawn by current values.
    pub fn resolved_board(&self) -> String {
        self.render(Cell::resolved_char)
    }

    fn render(&self, glyph: impl Fn(Cell) -> char) -> String {
        let mut out = String::with_capacity(self.rows() * (self.cols() + 1));
        for y in 0..self.rows() {
            for x in 0..self.cols() {
                out.push(glyph(self.cells[Coord::new(y as i32, x as i32)]));
            }
            out.push('\n');
        }
        out
    }

    /// The input bit driving port `k` at the current test step.
    pub(crate) fn input_bit(&self, k: usize) -> Value {
        let bit = self.input_bits[self.test_case][k][self.io_step];
        if bit { Value::One } else { Value::Zero }
    }
}

#[cfg(test)]
mod tests {
    use super::{Board, Status};
    use crate::cell::Value;
    use crate::error::ErrorReason;
    use crate::geom::{Coord, Direction};

    fn minimal_vectors(board: &mut Board) {
        board.set_input_bits(&[vec![]]).unwrap();
        board
            .set_output_colors(&[String::from("K")])
            .unwrap();
    }

    #[test]
    fn port_bounds_are_checked() {
        let mut board = Board::new(2, 2, 0);
        assert!(board.add_input(1, 1).is_ok());
        let err = board.add_output(2, 0).unwrap_err();
        assert_eq!(err.reason(), ErrorReason::RuntimeError);
        assert_eq!(board.status(), Status::Invalid);
    }

    #[test]
    fn grid_shapes_are_checked() {
        let mut board = Board::new(2, 3, 1);
        assert!(board.set_cells("x  \n   ").is_ok());
        assert!(board.set_cells("x \n  ").is_err());
        assert!(board.set_level("....\n....").is_err());
        assert!(board.set_instructions(0, "   \n   ", "S  \n  ").is_err());
        assert!(board.set_instructions(1, "   \n   ", "S  \n   ").is_err());
    }

    #[test]
    fn validate_requires_a_start() {
        let mut board = Board::new(1, 3, 1);
        board.set_cells("   ").unwrap();
        minimal_vectors(&mut board);
        let err = board.reset_and_validate().unwrap_err();
        assert_eq!(err.reason(), ErrorReason::InvalidLevelFormat);
        assert_eq!(err.message(), "Bot does not have a START instruction");
    }

    #[test]
    fn validate_rejects_duplicate_starts() {
        let mut board = Board::new(1, 3, 1);
        board.set_cells("   ").unwrap();
        board.set_instructions(0, "   ", "S S").unwrap();
        minimal_vectors(&mut board);
        let err = board.reset_and_validate().unwrap_err();
        assert_eq!(err.message(), "Bot has multiple START instructions");
    }

    #[test]
    fn validate_matches_level_layout() {
        let mut board = Board::new(1, 3, 1);
        board.set_level("/. ").unwrap();
        board.set_cells("/x ").unwrap();
        board.set_instructions(0, "   ", "  S").unwrap();
        minimal_vectors(&mut board);
        let err = board.reset_and_validate().unwrap_err();
        assert_eq!(err.message(), "Cell on a forbidden square");

        board.set_cells("/  ").unwrap();
        assert!(board.reset_and_validate().is_ok());

        board.set_cells("\\  ").unwrap();
        let err = board.reset_and_validate().unwrap_err();
        assert_eq!(err.message(), "Cell does not match the level");
    }

    #[test]
    fn validate_rejects_instructions_on_walls() {
        let mut board = Board::new(1, 3, 1);
        board.set_level(".  ").unwrap();
        board.set_cells("   ").unwrap();
        minimal_vectors(&mut board);
        // The forbidden square is impassable but holds no instruction; fine.
        board.set_instructions(0, "   ", " S ").unwrap();
        assert!(board.reset_and_validate().is_ok());
        // An op on the impassable square is rejected.
        board.set_instructions(0, "   ", "uS ").unwrap();
        let err = board.reset_and_validate().unwrap_err();
        assert_eq!(err.message(), "Instruction on an impassable square");
    }

    #[test]
    fn validate_checks_vector_shapes() {
        let mut board = Board::new(1, 2, 1);
        board.set_cells("x ").unwrap();
        board.set_instructions(0, "  ", " S").unwrap();
        board.add_input(0, 0).unwrap();

        board.set_input_bits(&[vec![String::from("01")]]).unwrap();
        board.set_output_colors(&[String::from("KK")]).unwrap();
        assert!(board.reset_and_validate().is_ok());

        board.set_input_bits(&[vec![String::from("011")]]).unwrap();
        let err = board.reset_and_validate().unwrap_err();
        assert_eq!(err.message(), "Input bits do not align with output colors");

        board.set_input_bits(&[]).unwrap();
        let err = board.reset_and_validate().unwrap_err();
        assert_eq!(err.message(), "Input and output test case counts differ");
    }

    #[test]
    fn validate_rejects_empty_test_cases() {
        // A zero-step case would make the first resolve index past its bits.
        let mut board = Board::new(1, 2, 1);
        board.set_cells("x ").unwrap();
        board.set_instructions(0, "  ", " S").unwrap();
        board.add_input(0, 0).unwrap();
        board
            .set_input_bits(&[vec![String::new()], vec![String::from("1")]])
            .unwrap();
        board
            .set_output_colors(&[String::new(), String::from("B")])
            .unwrap();
        let err = board.reset_and_validate().unwrap_err();
        assert_eq!(err.message(), "Test case has no steps");
    }

    #[test]
    fn validate_latches_input_cells() {
        let mut board = Board::new(1, 2, 1);
        board.set_cells("x ").unwrap();
        board.set_instructions(0, "  ", " S").unwrap();
        board.add_input(0, 0).unwrap();
        board.set_input_bits(&[vec![String::from("1")]]).unwrap();
        board.set_output_colors(&[String::from("K")]).unwrap();
        assert!(board.reset_and_validate().is_ok());

        let cell = board.cell(Coord::new(0, 0)).copied().unwrap();
        assert!(cell.latched);
        // The first test bit already drives the port.
        assert_eq!(cell.value, Value::One);

        // A latched cell on the port is rejected.
        board.set_cells("/ ").unwrap();
        let err = board.reset_and_validate().unwrap_err();
        assert_eq!(err.message(), "Input port must hold a plain unlatched cell");
    }

    #[test]
    fn bots_spawn_at_start_heading_left() {
        let mut board = Board::new(2, 2, 1);
        board.set_cells("  \n  ").unwrap();
        board.set_instructions(0, "  \n  ", "  \n S").unwrap();
        minimal_vectors(&mut board);
        board.reset_and_validate().unwrap();
        assert_eq!(board.bots().len(), 1);
        assert_eq!(board.bots()[0].location, Coord::new(1, 1));
        assert_eq!(board.bots()[0].heading, Direction::Left);
        assert_eq!(board.status(), Status::Running);
    }

    #[test]
    fn mismatched_pairs_are_rejected() {
        let mut board = Board::new(1, 3, 0);
        // A lone offset half has no partner.
        let err = board.set_cells("]  ").unwrap_err();
        assert_eq!(err.message(), "Mismatched cell pair");
        assert!(board.set_cells("][ ").is_ok());
        // Two left halves point at each other inconsistently.
        assert!(board.set_cells("]] ").is_err());
    }

    #[test]
    fn diode_arrows_expand_to_pairs() {
        let mut board = Board::new(1, 3, 0);
        board.set_cells(" > ").unwrap();
        let source = board.initial_cells[Coord::new(0, 0)];
        let sink = board.initial_cells[Coord::new(0, 1)];
        assert!(source.is_diode() && !source.latched);
        assert!(sink.is_diode() && sink.latched);
        assert_eq!(source.partner_delta, Coord::new(0, 1));
        assert_eq!(sink.partner_delta, Coord::new(0, -1));
    }
}

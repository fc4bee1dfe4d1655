//! The machine cycle: decode, movement, latching, resolution, output checks.

use tracing::{debug, trace};

use crate::board::{Board, Status};
use crate::cell::Value;
use crate::color::Color;
use crate::error::Error;
use crate::geom::{Coord, Direction};
use crate::grid::Grid;
use crate::op::{Op, OpKind};

impl Board {
    /// Advances one cycle through the fixed phase order: decode and toggle,
    /// propose held-cell movement, collision check, move cells, move bots,
    /// latch and power toggles, resolve, relatch, output check.
    ///
    /// Instruction decoding happens at the bots' start-of-cycle positions;
    /// latch, power, and next take effect at their end-of-cycle positions.
    /// A fatal event marks the board invalid and is returned; no-op unless
    /// running.
    pub fn step(&mut self) -> Result<(), Error> {
        if self.status() != Status::Running {
            return Ok(());
        }
        let mut next = false;
        let mut syncing = 0usize;

        // Decode and toggle.
        for k in 0..self.nbots {
            let loc = self.bots[k].location;
            let dir = self.directions[k][loc];
            let op = self.operations[k][loc];
            if dir.is_some() {
                self.bots[k].heading = dir;
            }
            match op.kind {
                OpKind::Swap => {
                    let cell = &mut self.cells[loc];
                    if cell.is_grabbable() {
                        if self.bots[k].holding {
                            if op.value & Op::DROP_BIT != 0 {
                                self.bots[k].holding = false;
                                cell.held = false;
                            }
                        } else if !cell.held && op.value & Op::GRAB_BIT != 0 {
                            self.bots[k].holding = true;
                            cell.held = true;
                        }
                    }
                }
                OpKind::Sync => syncing += 1,
                OpKind::Branch => {
                    let cell = self.cells[loc];
                    if cell.exists {
                        let shift = 2 * u8::from(!cell.x);
                        match cell.value {
                            Value::One => {
                                if op.value & (0b01 << shift) != 0 {
                                    self.bots[k].heading = op.direction;
                                }
                            }
                            Value::Zero => {
                                if op.value & (0b10 << shift) != 0 {
                                    self.bots[k].heading = op.direction;
                                }
                            }
                            _ => {
                                if op.value & (0b11 << shift) != 0 {
                                    return self
                                        .fail(Error::runtime("Branch on undetermined state"));
                                }
                            }
                        }
                    }
                }
                OpKind::Rotate => {
                    self.bots[k].rotating = !self.bots[k].rotating;
                    let cell = &mut self.cells[loc];
                    if self.bots[k].rotating && cell.is_rotatable() {
                        cell.rotating = true;
                    }
                }
                // Latch, power, and next apply between movement and
                // resolution, at the bots' new positions.
                _ => {}
            }
        }

        // Propose held-cell movement.
        for k in 0..self.nbots {
            let bot = self.bots[k];
            if !bot.holding {
                continue;
            }
            let op = self.operations[k][bot.location];
            let dest = bot.location + bot.heading.delta();
            let passable = self.trespassable.get(dest).copied().unwrap_or(false);
            let waiting = op.kind == OpKind::Sync && syncing <= 1;
            self.cells[bot.location].moving = if waiting || bot.rotating || !passable {
                Direction::None
            } else {
                bot.heading
            };
        }

        // Collision check. An occupant must be co-moving, and a square may
        // be claimed once: two cells converging on the same empty square
        // would otherwise deadlock the movement phase below.
        let mut claims: Grid<Option<Coord>> = Grid::new(self.rows(), self.cols());
        for k in 0..self.nbots {
            let loc = self.bots[k].location;
            let moving = self.cells[loc].moving;
            if !moving.is_some() {
                continue;
            }
            let dest = loc + moving.delta();
            if !self.trespassable.get(dest).copied().unwrap_or(false) {
                // Unreachable: proposals stop at boundaries instead.
                return self.fail(Error::runtime("Collided with boundary"));
            }
            let occupant = self.cells[dest];
            if occupant.exists && occupant.moving != moving {
                return self.fail(Error::runtime("Cells collided"));
            }
            match claims[dest] {
                Some(claimant) if claimant != loc => {
                    return self.fail(Error::runtime("Cells collided"));
                }
                _ => claims[dest] = Some(loc),
            }
        }

        // Move cells, depth-first along movement chains so a blocking cell
        // vacates its square first. Pending rotations land here.
        let mut stack = Vec::new();
        for k in 0..self.nbots {
            stack.clear();
            stack.push(self.bots[k].location);
            while let Some(&loc) = stack.last() {
                if self.cells[loc].rotating {
                    let cell = &mut self.cells[loc];
                    cell.value = cell.value.negate();
                    cell.rotating = false;
                }
                let moving = self.cells[loc].moving;
                if moving.is_some() {
                    let dest = loc + moving.delta();
                    if self.cells[dest].exists {
                        stack.push(dest);
                        continue;
                    }
                    let mut cell = std::mem::take(&mut self.cells[loc]);
                    cell.moving = Direction::None;
                    self.cells[dest] = cell;
                }
                stack.pop();
            }
        }

        // Move bots.
        for k in 0..self.nbots {
            let bot = self.bots[k];
            let op = self.operations[k][bot.location];
            if (op.kind == OpKind::Sync && syncing <= 1) || bot.rotating {
                continue;
            }
            let dest = bot.location + bot.heading.delta();
            if self.trespassable.get(dest).copied().unwrap_or(false) {
                self.bots[k].location = dest;
            }
        }

        // Latches and power toggles at the new positions.
        for k in 0..self.nbots {
            let loc = self.bots[k].location;
            let op = self.operations[k][loc];
            match op.kind {
                OpKind::Latch => {
                    let cell = &mut self.cells[loc];
                    if cell.is_latchable() {
                        if cell.latched {
                            if op.value & Op::UNLATCH_BIT != 0 {
                                cell.latched = false;
                            }
                        } else if op.value & Op::LATCH_BIT != 0 {
                            cell.refreshing = true;
                        }
                    }
                }
                OpKind::Refresh => {
                    let cell = &mut self.cells[loc];
                    if cell.is_refreshable() {
                        cell.latched = false;
                        cell.refreshing = true;
                    }
                }
                OpKind::Power => {
                    if (op.value as usize) < self.outputs.len() {
                        self.outputs[op.value as usize].toggle_power = true;
                    }
                }
                OpKind::Next => next = true,
                _ => {}
            }
        }
        for output in &mut self.outputs {
            output.power ^= output.toggle_power;
            output.toggle_power = false;
        }

        self.resolve();

        // Mid-latch cells under a bot relatch onto the fresh value.
        for k in 0..self.nbots {
            let loc = self.bots[k].location;
            let cell = &mut self.cells[loc];
            if cell.refreshing {
                cell.latched = true;
                cell.refreshing = false;
            }
        }

        if next {
            let mut color = Color::Black;
            for k in 0..self.outputs.len() {
                if self.outputs[k].power {
                    color = color.mix(self.cells[self.outputs[k].location].color());
                }
            }
            self.last_color = color;
            if color == Color::Invalid {
                return self.fail(Error::wrong_output("Output is in undetermined state"));
            }
            if color != self.output_colors[self.test_case][self.io_step] {
                return self.fail(Error::wrong_output("Wrong output"));
            }
            trace!(
                test_case = self.test_case,
                step = self.io_step,
                color = %color.to_char(),
                "output checked"
            );
            self.io_step += 1;
            if self.io_step >= self.output_colors[self.test_case].len()
                && self.test_case + 1 < self.output_colors.len()
            {
                self.test_case += 1;
                self.io_step = 0;
            }
        }
        self.cycle += 1;
        Ok(())
    }

    /// Runs until done or until `max_cycles` cycles have elapsed.
    ///
    /// Returns `(passed, had_error)`. Exhausting the budget records a
    /// too-many-cycles error on the board but reports `had_error` false,
    /// matching the fatal/non-fatal split of [`Board::step`].
    pub fn run(&mut self, max_cycles: usize) -> (bool, bool) {
        self.run_with(max_cycles, |_| {})
    }

    /// Like [`Board::run`], calling `observe` on the freshly resolved board
    /// before every cycle and once more on completion.
    pub fn run_with<F: FnMut(&Board)>(&mut self, max_cycles: usize, mut observe: F) -> (bool, bool) {
        self.resolve();
        for _ in 0..max_cycles {
            observe(self);
            if self.step().is_err() {
                debug!(cycle = self.cycle, "run stopped on fatal error");
                return (false, true);
            }
            match self.status() {
                Status::Invalid => return (false, false),
                Status::Done => {
                    debug!(cycles = self.cycle, "run finished");
                    observe(self);
                    return (true, false);
                }
                Status::Running => {}
            }
        }
        self.error = Some(Error::too_many_cycles(max_cycles));
        (false, false)
    }
}

#[cfg(test)]
mod tests {
    use crate::cell::Value;
    use crate::error::ErrorReason;
    use crate::geom::Coord;
    use crate::test_support::{board_with_bot, board_with_bots, value_at};

    #[test]
    fn bot_walks_and_carries_a_cell() {
        let mut board = board_with_bot("/ x   ", " >    ", " Sg  d");
        // Walk onto the cell, grab it, carry it right, drop it at the end.
        for _ in 0..5 {
            board.step().unwrap();
        }
        assert_eq!(board.bots()[0].location, Coord::new(0, 5));
        assert!(!board.bots()[0].holding);
        let cell = board.cell(Coord::new(0, 5)).copied().unwrap();
        assert!(cell.exists && !cell.held);
        // Out of coupling range of the latched cell, the carried value sticks.
        assert_eq!(cell.value, Value::One);
        assert!(!board.cell(Coord::new(0, 2)).unwrap().exists);
        assert_eq!(board.unresolved_board(), "/    x\n");
    }

    #[test]
    fn carried_cell_collides_with_resting_cell() {
        let mut board = board_with_bot("xx ", ">  ", "gS ");
        board.step().unwrap();
        let err = board.step().unwrap_err();
        assert_eq!(err.message(), "Cells collided");
        assert_eq!(err.reason(), ErrorReason::RuntimeError);
        assert_eq!(board.status(), crate::board::Status::Invalid);
    }

    #[test]
    fn carried_cells_converging_on_one_square_collide() {
        // Both bots grab a cell next to the shared empty square and push
        // into it at once. The step must fail instead of looping forever.
        let mut board = board_with_bots(
            " x\nx ",
            &[("  \n><", "  \ngS"), (" v\n ^", " g\n S")],
        );
        board.step().unwrap();
        let err = board.step().unwrap_err();
        assert_eq!(err.message(), "Cells collided");
        assert_eq!(err.reason(), ErrorReason::RuntimeError);
    }

    #[test]
    fn carried_cell_stops_at_the_boundary() {
        // Heading left out of the board pins the cell instead of failing.
        let mut board = board_with_bot("x  ", "   ", "gS ");
        board.step().unwrap();
        board.step().unwrap();
        assert_eq!(board.bots()[0].location, Coord::new(0, 0));
        assert!(board.cell(Coord::new(0, 0)).unwrap().exists);
    }

    #[test]
    fn branch_turns_on_one() {
        let mut board = board_with_bot(" /\n  ", "> \n  ", "Sv\n  ");
        board.step().unwrap();
        board.step().unwrap();
        assert_eq!(board.bots()[0].location, Coord::new(1, 1));
    }

    #[test]
    fn branch_on_one_ignores_zero() {
        let mut board = board_with_bot(" \\\n  ", "> \n  ", "Sv\n  ");
        board.step().unwrap();
        board.step().unwrap();
        // The condition failed; the bot kept heading right into the wall.
        assert_eq!(board.bots()[0].location, Coord::new(0, 1));
    }

    #[test]
    fn branch_on_undetermined_is_fatal() {
        let mut board = board_with_bot(" x", "> ", "S<");
        board.step().unwrap();
        let err = board.step().unwrap_err();
        assert_eq!(err.message(), "Branch on undetermined state");
    }

    #[test]
    fn lone_sync_waits_forever() {
        let mut board = board_with_bot("  ", "  ", "sS");
        board.step().unwrap();
        assert_eq!(board.bots()[0].location, Coord::new(0, 0));
        for _ in 0..3 {
            board.step().unwrap();
        }
        assert_eq!(board.bots()[0].location, Coord::new(0, 0));
    }

    #[test]
    fn paired_syncs_release_together() {
        let mut board = board_with_bots(
            "    ",
            &[("    ", "s S "), ("    ", " s S")],
        );
        for _ in 0..3 {
            board.step().unwrap();
        }
        // Both bots reached their sync squares on the same cycle and moved on.
        assert_eq!(board.bots()[0].location, Coord::new(0, 0));
        assert_eq!(board.bots()[1].location, Coord::new(0, 0));
    }

    #[test]
    fn latch_freezes_a_cell() {
        let mut board = board_with_bot("x ", "  ", "lS");
        board.step().unwrap();
        let cell = board.cell(Coord::new(0, 0)).copied().unwrap();
        assert!(cell.latched);
        assert_eq!(cell.value, Value::Undefined);
    }

    #[test]
    fn unlatch_releases_a_cell_to_its_neighbors() {
        let mut board = board_with_bot("\\/ ", "   ", " uS");
        board.step().unwrap();
        let cell = board.cell(Coord::new(0, 1)).copied().unwrap();
        assert!(!cell.latched);
        assert_eq!(cell.value, Value::Zero);
    }

    #[test]
    fn refresh_recaptures_the_driven_value() {
        // The refreshed cell unlatches, resolves from its neighbor, and
        // relatches on the new value within one cycle.
        let mut board = board_with_bot("\\/ ", "   ", " *S");
        board.step().unwrap();
        let cell = board.cell(Coord::new(0, 1)).copied().unwrap();
        assert!(cell.latched);
        assert_eq!(cell.value, Value::Zero);
    }

    #[test]
    fn rotate_inverts_a_latched_cell_and_pins_the_bot() {
        let mut board = board_with_bot("// ", "   ", " rS");
        board.step().unwrap();
        board.step().unwrap();
        assert_eq!(value_at(&board, 0, 1), Value::Zero);
        // Rotation holds the bot in place for the cycle.
        assert_eq!(board.bots()[0].location, Coord::new(0, 1));
        board.step().unwrap();
        assert_eq!(board.bots()[0].location, Coord::new(0, 0));
        assert_eq!(value_at(&board, 0, 1), Value::Zero);
    }

    #[test]
    fn grab_of_a_held_cell_is_refused() {
        let mut board = board_with_bots("x ", &[("  ", "gS"), ("  ", "gS")]);
        board.step().unwrap();
        board.step().unwrap();
        let holders: Vec<bool> = board.bots().iter().map(|b| b.holding).collect();
        assert_eq!(holders, vec![true, false]);
    }
}

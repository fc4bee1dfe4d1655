//! Deterministic simulation engine for grid-based logic-circuit puzzles.
//!
//! A puzzle board holds a grid of tri-state logic cells, a set of mobile bots
//! with per-cell instruction grids, input ports fed from test vectors, and
//! output ports whose mixed color is checked against an expected sequence.
//! The architecture enforces a strict separation:
//!
//! - **Setup**: a [`Board`] is assembled from text grids and port/test-vector
//!   declarations, then checked and frozen by [`Board::reset_and_validate`].
//! - **Runtime**: [`Board::step`] advances one machine cycle through a fixed
//!   phase order, and [`Board::resolve`] recomputes every cell value as a
//!   constraint-propagation fixpoint. Both are pure state transitions: no
//!   I/O, fully deterministic across runs.
//!
//! Loading boards from files and reporting verdicts live in the `grader`
//! crate, not here.

pub mod board;
pub mod cell;
pub mod color;
pub mod error;
pub mod geom;
pub mod grid;
pub mod op;
mod resolver;
mod step;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use board::{Board, Bot, Status};
pub use cell::{Cell, Value};
pub use color::Color;
pub use error::{Error, ErrorReason};
pub use geom::{Coord, Direction};
pub use op::{Op, OpKind};

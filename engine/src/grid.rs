//! Fixed-size row-major grids addressed by signed coordinates.

use std::ops::{Index, IndexMut};

use crate::cell::Cell;
use crate::geom::Coord;

/// A `rows x cols` grid stored row-major.
///
/// Lookups take signed [`Coord`]s so callers can probe neighbor offsets
/// without pre-clamping; `get` answers `None` off the edge, while indexing
/// panics and is reserved for coordinates already known to be inside.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grid<T> {
    rows: usize,
    cols: usize,
    data: Vec<T>,
}

impl<T: Clone> Grid<T> {
    pub fn filled(rows: usize, cols: usize, value: T) -> Grid<T> {
        Grid {
            rows,
            cols,
            data: vec![value; rows * cols],
        }
    }

    pub fn fill(&mut self, value: T) {
        self.data.fill(value);
    }
}

impl<T: Clone + Default> Grid<T> {
    pub fn new(rows: usize, cols: usize) -> Grid<T> {
        Grid::filled(rows, cols, T::default())
    }
}

impl<T> Grid<T> {
    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn contains(&self, at: Coord) -> bool {
        at.y >= 0 && at.x >= 0 && (at.y as usize) < self.rows && (at.x as usize) < self.cols
    }

    fn offset(&self, at: Coord) -> Option<usize> {
        self.contains(at)
            .then(|| at.y as usize * self.cols + at.x as usize)
    }

    pub fn get(&self, at: Coord) -> Option<&T> {
        self.offset(at).map(|i| &self.data[i])
    }

    pub fn get_mut(&mut self, at: Coord) -> Option<&mut T> {
        self.offset(at).map(|i| &mut self.data[i])
    }

    /// All coordinates in row-major order. Iteration order matters: it is the
    /// deterministic tie-break order of the resolver.
    pub fn coords(&self) -> impl Iterator<Item = Coord> + use<T> {
        let cols = self.cols;
        (0..self.rows * self.cols).map(move |i| Coord::new((i / cols) as i32, (i % cols) as i32))
    }

    /// Replaces the whole grid from a block of text, one decoded value per
    /// character. The text must be exactly `rows` lines of `cols` characters.
    pub fn set_from_text<F>(&mut self, text: &str, decode: F) -> Result<(), ShapeError>
    where
        F: Fn(char) -> T,
    {
        let mut lines = text.lines();
        for y in 0..self.rows {
            let line = lines.next().ok_or(ShapeError)?;
            let mut chars = line.chars();
            for x in 0..self.cols {
                let c = chars.next().ok_or(ShapeError)?;
                self.data[y * self.cols + x] = decode(c);
            }
            if chars.next().is_some() {
                return Err(ShapeError);
            }
        }
        if lines.next().is_some() {
            return Err(ShapeError);
        }
        Ok(())
    }
}

impl<T> Index<Coord> for Grid<T> {
    type Output = T;

    fn index(&self, at: Coord) -> &T {
        let Some(i) = self.offset(at) else {
            panic!("coordinate ({}, {}) out of bounds", at.y, at.x);
        };
        &self.data[i]
    }
}

impl<T> IndexMut<Coord> for Grid<T> {
    fn index_mut(&mut self, at: Coord) -> &mut T {
        let Some(i) = self.offset(at) else {
            panic!("coordinate ({}, {}) out of bounds", at.y, at.x);
        };
        &mut self.data[i]
    }
}

/// The text block did not match the grid's dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShapeError;

impl Grid<Cell> {
    /// The partner of a two-square device, if the cell has one in bounds.
    pub fn partner(&self, at: Coord) -> Option<&Cell> {
        let delta = self.get(at)?.partner_delta;
        if delta.is_zero() {
            return None;
        }
        self.get(at + delta)
    }
}

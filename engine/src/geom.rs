//! Board geometry: signed integer coordinates and the four headings.
//!
//! Coordinates are `(y, x)` with `y` growing downward, matching the row-major
//! text grids boards are built from. Deltas use the same type, so positions
//! and offsets add freely.

use std::ops::{Add, Neg, Sub};

use serde::Serialize;

/// A grid position or offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Coord {
    pub y: i32,
    pub x: i32,
}

impl Coord {
    pub const ZERO: Coord = Coord { y: 0, x: 0 };

    pub const fn new(y: i32, x: i32) -> Coord {
        Coord { y, x }
    }

    pub fn is_zero(self) -> bool {
        self == Coord::ZERO
    }

    pub fn dot(self, other: Coord) -> i32 {
        self.y * other.y + self.x * other.x
    }

    /// Squared Euclidean length, used for neighbor distance classes.
    pub fn norm2(self) -> i32 {
        self.y * self.y + self.x * self.x
    }
}

impl Add for Coord {
    type Output = Coord;

    fn add(self, rhs: Coord) -> Coord {
        Coord::new(self.y + rhs.y, self.x + rhs.x)
    }
}

impl Sub for Coord {
    type Output = Coord;

    fn sub(self, rhs: Coord) -> Coord {
        Coord::new(self.y - rhs.y, self.x - rhs.x)
    }
}

impl Neg for Coord {
    type Output = Coord;

    fn neg(self) -> Coord {
        Coord::new(-self.y, -self.x)
    }
}

/// One of the four headings, or none.
///
/// `None` behaves as a zero delta: a bot or cell "moving" nowhere stays put.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    #[default]
    None,
    Left,
    Down,
    Right,
    Up,
}

impl Direction {
    /// Decodes a heading character; anything unrecognized is `None`.
    pub fn from_char(c: char) -> Direction {
        match c {
            '<' => Direction::Left,
            'v' => Direction::Down,
            '>' => Direction::Right,
            '^' => Direction::Up,
            _ => Direction::None,
        }
    }

    pub fn to_char(self) -> char {
        match self {
            Direction::None => ' ',
            Direction::Left => '<',
            Direction::Down => 'v',
            Direction::Right => '>',
            Direction::Up => '^',
        }
    }

    pub fn delta(self) -> Coord {
        match self {
            Direction::None => Coord::ZERO,
            Direction::Left => Coord::new(0, -1),
            Direction::Down => Coord::new(1, 0),
            Direction::Right => Coord::new(0, 1),
            Direction::Up => Coord::new(-1, 0),
        }
    }

    pub fn opposite(self) -> Direction {
        match self {
            Direction::None => Direction::None,
            Direction::Left => Direction::Right,
            Direction::Down => Direction::Up,
            Direction::Right => Direction::Left,
            Direction::Up => Direction::Down,
        }
    }

    pub fn is_some(self) -> bool {
        self != Direction::None
    }
}

#[cfg(test)]
mod tests {
    use super::{Coord, Direction};

    #[test]
    fn coord_arithmetic() {
        let a = Coord::new(1, -2);
        let b = Coord::new(3, 4);
        assert_eq!(a + b, Coord::new(4, 2));
        assert_eq!(a - b, Coord::new(-2, -6));
        assert_eq!(-a, Coord::new(-1, 2));
        assert_eq!(a.dot(b), -5);
        assert_eq!(b.norm2(), 25);
        assert!(Coord::ZERO.is_zero());
    }

    #[test]
    fn direction_char_round_trip() {
        for dir in [
            Direction::Left,
            Direction::Down,
            Direction::Right,
            Direction::Up,
        ] {
            assert_eq!(Direction::from_char(dir.to_char()), dir);
            assert_eq!(dir.opposite().opposite(), dir);
            assert_eq!(-dir.delta(), dir.opposite().delta());
        }
        assert_eq!(Direction::from_char('q'), Direction::None);
        assert!(Direction::None.delta().is_zero());
    }
}

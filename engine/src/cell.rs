//! Logic cells and the tri-state value lattice they carry.

use crate::color::Color;
use crate::geom::{Coord, Direction};

/// Tri-state logic value with a conflict state.
///
/// `Unknown` is the lattice bottom (no information); `Undefined` is the top
/// (conflicting information). Combining disagreeing booleans yields
/// `Undefined`, and `Undefined` never recovers to a boolean within a cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Value {
    #[default]
    Unknown,
    Zero,
    One,
    Undefined,
}

impl Value {
    /// Logical negation; `Unknown` and `Undefined` are self-inverse.
    pub fn negate(self) -> Value {
        match self {
            Value::Unknown => Value::Unknown,
            Value::Zero => Value::One,
            Value::One => Value::Zero,
            Value::Undefined => Value::Undefined,
        }
    }

    /// Lattice join: equal values keep, `Unknown` yields to anything, and any
    /// other disagreement is `Undefined`.
    pub fn combine(self, other: Value) -> Value {
        if self == other {
            self
        } else if self == Value::Unknown {
            other
        } else if other == Value::Unknown {
            self
        } else {
            Value::Undefined
        }
    }

    /// Whether any information has been assigned (anything but `Unknown`).
    pub fn is_set(self) -> bool {
        self != Value::Unknown
    }

    pub fn to_char(self) -> char {
        match self {
            Value::Unknown => '?',
            Value::Zero => '0',
            Value::One => '1',
            Value::Undefined => 'x',
        }
    }
}

/// One square of circuitry.
///
/// A default cell is empty (`exists == false`); every square of the board grid
/// holds one, empty or not. Multi-square devices (offset pairs, diodes) are
/// two cells linked through `partner_delta`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Cell {
    pub exists: bool,
    /// Orientation: `true` for the `x`/`/`/`\` family, `false` for `+`/`-`/`|`.
    pub x: bool,
    /// Latched cells hold their value instead of joining the fixpoint.
    pub latched: bool,
    /// Half of an offset pair (a device displaced half a square).
    pub offset: bool,
    /// Device facing for offset halves and diode halves; `None` otherwise.
    pub direction: Direction,
    /// Offset to this cell's partner half, zero for standalone cells.
    pub partner_delta: Coord,
    pub value: Value,
    pub previous_value: Value,
    /// Proposed heading for this cycle's movement phase.
    pub moving: Direction,
    pub held: bool,
    /// Pending value inversion, applied when movement settles.
    pub rotating: bool,
    /// Mid-latch: the cell relatches after the next resolution.
    pub refreshing: bool,
}

impl Cell {
    pub fn unlatched(x: bool) -> Cell {
        Cell {
            exists: true,
            x,
            ..Cell::default()
        }
    }

    pub fn latched(x: bool, value: Value) -> Cell {
        Cell {
            exists: true,
            x,
            latched: true,
            value,
            ..Cell::default()
        }
    }

    /// One half of an offset pair facing `direction`; the partner sits one
    /// square against the facing.
    pub fn offset(direction: Direction) -> Cell {
        Cell {
            exists: true,
            x: true,
            offset: true,
            direction,
            partner_delta: direction.opposite().delta(),
            ..Cell::default()
        }
    }

    /// A diode pair `(source, sink)` conducting toward `direction`.
    ///
    /// The source is an ordinary unlatched cell; the sink is latched and only
    /// ever updated through its partner edge.
    pub fn diode(direction: Direction) -> (Cell, Cell) {
        let source = Cell {
            exists: true,
            x: true,
            direction,
            partner_delta: direction.delta(),
            ..Cell::default()
        };
        let sink = Cell {
            exists: true,
            x: true,
            latched: true,
            direction,
            partner_delta: direction.opposite().delta(),
            ..Cell::default()
        };
        (source, sink)
    }

    /// Decodes a single-square cell character. Diode arrows span two squares
    /// and are handled by board setup, not here.
    pub fn from_char(c: char) -> Cell {
        match c {
            'x' => Cell::unlatched(true),
            '+' => Cell::unlatched(false),
            '/' => Cell::latched(true, Value::One),
            '\\' => Cell::latched(true, Value::Zero),
            '-' => Cell::latched(false, Value::One),
            '|' => Cell::latched(false, Value::Zero),
            ']' => Cell::offset(Direction::Left),
            '[' => Cell::offset(Direction::Right),
            'W' => Cell::offset(Direction::Up),
            'M' => Cell::offset(Direction::Down),
            _ => Cell::default(),
        }
    }

    /// Rendering for the unresolved board: latch state, not current value.
    pub fn to_char(self) -> char {
        if !self.exists {
            return ' ';
        }
        if self.offset {
            return match self.direction {
                Direction::Left => ']',
                Direction::Down => 'M',
                Direction::Right => '[',
                Direction::Up => 'W',
                Direction::None => ' ',
            };
        }
        if self.is_diode() {
            return if self.latched {
                self.direction.to_char()
            } else {
                'x'
            };
        }
        if self.latched {
            self.resolved_char()
        } else if self.x {
            'x'
        } else {
            '+'
        }
    }

    /// Rendering for the resolved board: the current value where boolean.
    pub fn resolved_char(self) -> char {
        if !self.exists {
            return ' ';
        }
        match self.value {
            Value::Zero => {
                if self.x {
                    '\\'
                } else {
                    '|'
                }
            }
            Value::One => {
                if self.x {
                    '/'
                } else {
                    '-'
                }
            }
            _ => {
                if self.x {
                    'x'
                } else {
                    '+'
                }
            }
        }
    }

    /// Color shown when this cell sits on a powered output port.
    pub fn color(self) -> Color {
        match self.to_char() {
            ' ' => Color::Black,
            '/' => Color::Blue,
            '\\' => Color::Green,
            '-' => Color::Red,
            '|' => Color::Orange,
            '+' => match self.value {
                Value::One => Color::Red,
                Value::Zero => Color::Orange,
                _ => Color::Invalid,
            },
            // Unlatched x-family squares, offset halves, diode arrows.
            _ => match self.value {
                Value::One => Color::Blue,
                Value::Zero => Color::Green,
                _ => Color::Invalid,
            },
        }
    }

    /// Standalone: occupies exactly one square.
    pub fn is_standalone(self) -> bool {
        self.exists && self.partner_delta.is_zero()
    }

    pub fn is_grabbable(self) -> bool {
        self.is_standalone()
    }

    pub fn is_latchable(self) -> bool {
        self.is_standalone()
    }

    pub fn is_rotatable(self) -> bool {
        self.is_standalone()
    }

    pub fn is_refreshable(self) -> bool {
        self.is_standalone() && self.latched
    }

    pub fn is_diode(self) -> bool {
        self.direction.is_some() && !self.offset
    }
}

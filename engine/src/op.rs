//! Bot instructions and their character encoding.

use crate::geom::Direction;

/// Instruction family; the `Op` payload distinguishes variants within one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OpKind {
    #[default]
    None,
    /// Grab and/or drop a held cell.
    Swap,
    /// Wait until every syncing bot is on a sync square.
    Sync,
    /// Turn if the cell under the bot matches the branch mask.
    Branch,
    /// Bot spawn point; inert at runtime.
    Start,
    /// Toggle rotation mode.
    Rotate,
    /// Latch and/or unlatch the cell under the bot.
    Latch,
    /// Unlatch now, relatch after the next resolution.
    Refresh,
    /// Toggle power on one output port (port index in the payload).
    Power,
    /// Check outputs and advance the test vector.
    Next,
}

/// One decoded instruction square.
///
/// `value` is a small bitmask or index whose meaning depends on the kind:
/// grab/drop bits for `Swap`, latch/unlatch bits for `Latch`, a condition
/// mask for `Branch`, a port index for `Power`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Op {
    pub kind: OpKind,
    pub value: u8,
    pub direction: Direction,
}

impl Op {
    pub const GRAB_BIT: u8 = 0b01;
    pub const DROP_BIT: u8 = 0b10;
    pub const UNLATCH_BIT: u8 = 0b01;
    pub const LATCH_BIT: u8 = 0b10;
    /// Condition mask matching ONE on either orientation.
    pub const BRANCH_ONE: u8 = 0b0101;
    /// Condition mask matching ZERO on either orientation.
    pub const BRANCH_ZERO: u8 = 0b1010;

    const fn new(kind: OpKind, value: u8, direction: Direction) -> Op {
        Op {
            kind,
            value,
            direction,
        }
    }

    pub fn from_char(c: char) -> Op {
        match c {
            'g' => Op::new(OpKind::Swap, Op::GRAB_BIT, Direction::None),
            'd' => Op::new(OpKind::Swap, Op::DROP_BIT, Direction::None),
            'w' => Op::new(OpKind::Swap, Op::GRAB_BIT | Op::DROP_BIT, Direction::None),
            's' => Op::new(OpKind::Sync, 0, Direction::None),
            '<' | 'v' | '>' | '^' => {
                Op::new(OpKind::Branch, Op::BRANCH_ONE, Direction::from_char(c))
            }
            '[' | 'W' | ']' | 'M' => {
                let direction = match c {
                    '[' => Direction::Left,
                    'W' => Direction::Down,
                    ']' => Direction::Right,
                    _ => Direction::Up,
                };
                Op::new(OpKind::Branch, Op::BRANCH_ZERO, direction)
            }
            'S' => Op::new(OpKind::Start, 0, Direction::None),
            'r' => Op::new(OpKind::Rotate, 0, Direction::None),
            'l' => Op::new(OpKind::Latch, Op::LATCH_BIT, Direction::None),
            'u' => Op::new(OpKind::Latch, Op::UNLATCH_BIT, Direction::None),
            't' => Op::new(OpKind::Latch, Op::LATCH_BIT | Op::UNLATCH_BIT, Direction::None),
            '*' => Op::new(OpKind::Refresh, 0, Direction::None),
            'p' => Op::new(OpKind::Power, 0, Direction::None),
            'P' => Op::new(OpKind::Power, 1, Direction::None),
            'n' => Op::new(OpKind::Next, 0, Direction::None),
            _ => Op::default(),
        }
    }

    pub fn to_char(self) -> char {
        match self.kind {
            OpKind::None => ' ',
            OpKind::Swap => match self.value {
                Op::GRAB_BIT => 'g',
                Op::DROP_BIT => 'd',
                _ => 'w',
            },
            OpKind::Sync => 's',
            OpKind::Branch => {
                if self.value == Op::BRANCH_ONE {
                    self.direction.to_char()
                } else {
                    match self.direction {
                        Direction::Left => '[',
                        Direction::Down => 'W',
                        Direction::Right => ']',
                        _ => 'M',
                    }
                }
            }
            OpKind::Start => 'S',
            OpKind::Rotate => 'r',
            OpKind::Latch => match self.value {
                Op::LATCH_BIT => 'l',
                Op::UNLATCH_BIT => 'u',
                _ => 't',
            },
            OpKind::Refresh => '*',
            OpKind::Power => {
                if self.value == 0 {
                    'p'
                } else {
                    'P'
                }
            }
            OpKind::Next => 'n',
        }
    }

    pub fn is_none(self) -> bool {
        self.kind == OpKind::None
    }
}

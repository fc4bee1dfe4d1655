//! Output colors and the commutative mixing operation.

use serde::Serialize;

/// A named output color, plus two sentinels.
///
/// `Invalid` marks an undetermined port (a cell that has not settled to a
/// boolean); it absorbs everything under mixing. `Unnamed` is a real but
/// nameless mixture, produced when two named colors have no entry in the
/// mixing table. Both render as `#`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Color {
    #[default]
    Invalid,
    Black,
    Brown,
    Red,
    Orange,
    Yellow,
    Green,
    Blue,
    Purple,
    White,
    Cyan,
    RedOrange,
    Unnamed,
}

impl Color {
    pub fn from_char(c: char) -> Color {
        match c {
            'K' => Color::Black,
            'N' => Color::Brown,
            'R' => Color::Red,
            'O' => Color::Orange,
            'Y' => Color::Yellow,
            'G' => Color::Green,
            'B' => Color::Blue,
            'P' => Color::Purple,
            'W' => Color::White,
            'C' => Color::Cyan,
            'E' => Color::RedOrange,
            _ => Color::Invalid,
        }
    }

    pub fn to_char(self) -> char {
        match self {
            Color::Black => 'K',
            Color::Brown => 'N',
            Color::Red => 'R',
            Color::Orange => 'O',
            Color::Yellow => 'Y',
            Color::Green => 'G',
            Color::Blue => 'B',
            Color::Purple => 'P',
            Color::White => 'W',
            Color::Cyan => 'C',
            Color::RedOrange => 'E',
            Color::Invalid | Color::Unnamed => '#',
        }
    }

    /// Mixes two colors. Commutative; `Black` is the identity.
    pub fn mix(self, other: Color) -> Color {
        if self == Color::Invalid || other == Color::Invalid {
            return Color::Invalid;
        }
        if self == other {
            return self;
        }
        // Black first: black + white stays white.
        if self == Color::Black {
            return other;
        }
        if other == Color::Black {
            return self;
        }
        if self == Color::White {
            return other;
        }
        if other == Color::White {
            return self;
        }
        named_mix(self, other)
            .or_else(|| named_mix(other, self))
            .unwrap_or(Color::Unnamed)
    }
}

/// One-sided mixing table; `Color::mix` tries both argument orders.
fn named_mix(a: Color, b: Color) -> Option<Color> {
    use Color::{Blue, Brown, Cyan, Green, Orange, Purple, Red, RedOrange, White, Yellow};
    match (a, b) {
        (Red, Orange) => Some(RedOrange),
        (Red, Yellow) => Some(Orange),
        (Red, Green) => Some(Yellow),
        (Red, Blue) => Some(Purple),
        (Red, Cyan) => Some(White),
        (Orange, Green) => Some(Brown),
        (Orange, Blue) => Some(White),
        (Yellow, Blue) => Some(White),
        (Green, Blue) => Some(Cyan),
        (Green, Purple) => Some(White),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::Color;

    #[test]
    fn invalid_absorbs() {
        assert_eq!(Color::Invalid.mix(Color::Red), Color::Invalid);
        assert_eq!(Color::Red.mix(Color::Invalid), Color::Invalid);
        assert_eq!(Color::Invalid.mix(Color::Invalid), Color::Invalid);
    }

    #[test]
    fn identities() {
        assert_eq!(Color::Black.mix(Color::Purple), Color::Purple);
        assert_eq!(Color::Purple.mix(Color::Black), Color::Purple);
        // Black wins over white when both are identities.
        assert_eq!(Color::Black.mix(Color::White), Color::White);
        assert_eq!(Color::White.mix(Color::Cyan), Color::Cyan);
        assert_eq!(Color::Green.mix(Color::Green), Color::Green);
    }

    #[test]
    fn named_mixes_are_commutative() {
        let table = [
            (Color::Red, Color::Orange, Color::RedOrange),
            (Color::Red, Color::Yellow, Color::Orange),
            (Color::Red, Color::Green, Color::Yellow),
            (Color::Red, Color::Blue, Color::Purple),
            (Color::Red, Color::Cyan, Color::White),
            (Color::Orange, Color::Green, Color::Brown),
            (Color::Orange, Color::Blue, Color::White),
            (Color::Yellow, Color::Blue, Color::White),
            (Color::Green, Color::Blue, Color::Cyan),
            (Color::Green, Color::Purple, Color::White),
        ];
        for (a, b, out) in table {
            assert_eq!(a.mix(b), out, "{a:?} + {b:?}");
            assert_eq!(b.mix(a), out, "{b:?} + {a:?}");
        }
    }

    #[test]
    fn unlisted_pairs_are_unnamed() {
        assert_eq!(Color::Brown.mix(Color::Cyan), Color::Unnamed);
        assert_eq!(Color::Yellow.mix(Color::Purple), Color::Unnamed);
    }

    #[test]
    fn char_codec() {
        for c in "KNROYGBPWCE".chars() {
            assert_eq!(Color::from_char(c).to_char(), c);
        }
        assert_eq!(Color::from_char('z'), Color::Invalid);
        assert_eq!(Color::Invalid.to_char(), '#');
        assert_eq!(Color::Unnamed.to_char(), '#');
    }
}

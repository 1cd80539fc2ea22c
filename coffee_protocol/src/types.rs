// Value types carried inside protocol messages.

use std::fmt;
use std::str::FromStr;

use crate::error::ProtocolError;

/// A board cell as written on the wire: one uppercase column letter (`A` is
/// column 0), `:`, and a 1-based row number. `C:4` is row 3, column 2.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct CellToken {
    col: u8,
    row: u32,
}

impl CellToken {
    /// Token for 0-based `(row, col)`. `None` if the column has no letter or
    /// the row does not fit the wire format.
    pub fn new(row: usize, col: usize) -> Option<Self> {
        let col = u8::try_from(col).ok().filter(|&c| c < 26)?;
        let row = u32::try_from(row).ok().filter(|&r| r < u32::MAX)?;
        Some(Self { col, row })
    }

    /// 0-based row.
    pub fn row(self) -> usize {
        self.row as usize
    }

    /// 0-based column.
    pub fn col(self) -> usize {
        usize::from(self.col)
    }
}

impl fmt::Display for CellToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", char::from(b'A' + self.col), self.row + 1)
    }
}

impl FromStr for CellToken {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bad = || ProtocolError::BadCellToken(s.to_string());
        let mut chars = s.chars();
        let letter = chars.next().filter(char::is_ascii_uppercase).ok_or_else(bad)?;
        if chars.next() != Some(':') {
            return Err(bad());
        }
        let digits = chars.as_str();
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(bad());
        }
        let row: u32 = digits.parse().map_err(|_| bad())?;
        if row == 0 {
            return Err(bad());
        }
        Ok(Self {
            col: letter as u8 - b'A',
            row: row - 1,
        })
    }
}

/// Result of a match from one player's point of view.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    Win,
    Loss,
    Draw,
}

impl Outcome {
    /// Compare claimed-cell counts.
    pub fn from_tally(own: u32, opponent: u32) -> Self {
        match own.cmp(&opponent) {
            std::cmp::Ordering::Greater => Outcome::Win,
            std::cmp::Ordering::Less => Outcome::Loss,
            std::cmp::Ordering::Equal => Outcome::Draw,
        }
    }

    pub(crate) fn wire_word(self) -> &'static str {
        match self {
            Outcome::Win => "GAGNE",
            Outcome::Loss => "PERDU",
            Outcome::Draw => "EGALITE",
        }
    }

    pub(crate) fn from_wire_word(word: &str) -> Option<Self> {
        match word {
            "GAGNE" => Some(Outcome::Win),
            "PERDU" => Some(Outcome::Loss),
            "EGALITE" => Some(Outcome::Draw),
            _ => None,
        }
    }
}

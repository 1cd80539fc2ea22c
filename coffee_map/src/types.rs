// Small value types shared by the map, the board and the lobby.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Flat, row-major cell index: `row * width + col`.
pub type CellIndex = usize;

/// Identifier of a plot group. Plot ids start at 1; 0 is never a plot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlotId(pub u16);

impl fmt::Display for PlotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "plot {}", self.0)
    }
}

/// What a grid cell is. Sea and forest can never be claimed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CellKind {
    Sea,
    Forest,
    Plot(PlotId),
}

impl CellKind {
    pub fn plot(self) -> Option<PlotId> {
        match self {
            CellKind::Plot(plot) => Some(plot),
            CellKind::Sea | CellKind::Forest => None,
        }
    }
}

/// One of the two players of a match. `First` moves first.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Side {
    First,
    Second,
}

impl Side {
    pub const BOTH: [Side; 2] = [Side::First, Side::Second];

    pub fn opponent(self) -> Side {
        match self {
            Side::First => Side::Second,
            Side::Second => Side::First,
        }
    }

    /// 1-based seat number announced in the welcome message.
    pub fn seat(self) -> u8 {
        match self {
            Side::First => 1,
            Side::Second => 2,
        }
    }

    /// Value stored in the board's claim mask.
    pub(crate) fn mark(self) -> i8 {
        match self {
            Side::First => 1,
            Side::Second => -1,
        }
    }

    pub(crate) fn from_mark(mark: i8) -> Option<Side> {
        match mark {
            1 => Some(Side::First),
            -1 => Some(Side::Second),
            _ => None,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::First => f.write_str("first"),
            Side::Second => f.write_str("second"),
        }
    }
}

/// How the map is encoded in the match-start message. Chosen per player at
/// registration.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RenderMode {
    /// Numeric wall masks, `:` between cells and `|` between rows.
    #[default]
    Verbose,
    /// One character per cell, `|` between rows.
    Compact,
}

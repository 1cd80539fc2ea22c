// Per-match placement engine.
//
// `MatchBoard` wraps a shared `MapDefinition` with the state one match
// mutates: a claim mask (0 = free, +1 first side, -1 second side), the last
// claimed cell and the plot claimed the move before that. `attempt_claim()`
// is the only mutator.
//
// The set of legal moves is derived data. It is kept in a `BTreeSet` (stable
// iteration order for rendering and tests) and marked stale after every
// successful claim; the next reader rebuilds it with `legal_moves_after()`,
// a pure function of `(map, claims, last move, previous plot)`.
//
// Claim rule after a move A at (Ay, Ax) in plot Ap, with Pp the plot claimed
// the move before A, a free plot cell B at (By, Bx) in plot Bp is legal iff
// `Ap != Bp`, `Ay == By || Ax == Bx`, and `Pp != Bp`. Before the first move
// every plot cell is legal.
//
// See also: `map.rs` for the static grid, `coffee_lobby::session` which owns
// one board per match and serializes all calls into it.

use std::collections::BTreeSet;
use std::sync::Arc;

use crate::map::MapDefinition;
use crate::types::{CellIndex, CellKind, PlotId, Side};

/// The most recent successful claim.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LastMove {
    pub row: usize,
    pub col: usize,
    pub plot: PlotId,
}

/// Mutable board state for one match.
#[derive(Clone, Debug)]
pub struct MatchBoard {
    map: Arc<MapDefinition>,
    claimed: Vec<i8>,
    legal: BTreeSet<CellIndex>,
    legal_stale: bool,
    last_move: Option<LastMove>,
    previous_plot: Option<PlotId>,
}

impl MatchBoard {
    /// Fresh board: nothing claimed, every plot cell legal.
    pub fn new(map: Arc<MapDefinition>) -> Self {
        let claimed = vec![0; map.area()];
        let legal = legal_moves_after(&map, &claimed, None, None);
        Self {
            map,
            claimed,
            legal,
            legal_stale: false,
            last_move: None,
            previous_plot: None,
        }
    }

    pub fn map(&self) -> &MapDefinition {
        &self.map
    }

    /// True while at least one cell can still be claimed.
    pub fn can_play(&mut self) -> bool {
        !self.legal_moves().is_empty()
    }

    /// Cells that may be claimed next.
    pub fn legal_moves(&mut self) -> &BTreeSet<CellIndex> {
        if self.legal_stale {
            self.legal = legal_moves_after(
                &self.map,
                &self.claimed,
                self.last_move,
                self.previous_plot,
            );
            self.legal_stale = false;
        }
        &self.legal
    }

    pub fn is_legal(&mut self, index: CellIndex) -> bool {
        self.legal_moves().contains(&index)
    }

    /// Claim `index` for `side` if it is currently legal. Returns whether the
    /// claim happened; a rejected claim changes nothing.
    pub fn attempt_claim(&mut self, index: CellIndex, side: Side) -> bool {
        if !self.is_legal(index) {
            return false;
        }
        let CellKind::Plot(plot) = self.map.cell(index) else {
            // Only plot cells are ever in the legal set.
            return false;
        };
        let (row, col) = self.map.coords(index);

        self.claimed[index] = side.mark();
        self.previous_plot = self.last_move.map(|m| m.plot);
        self.last_move = Some(LastMove { row, col, plot });
        self.legal_stale = true;
        true
    }

    /// `attempt_claim` by grid coordinates; off-grid cells are rejected.
    pub fn attempt_claim_at(&mut self, row: usize, col: usize, side: Side) -> bool {
        match self.map.index_of(row, col) {
            Some(index) => self.attempt_claim(index, side),
            None => false,
        }
    }

    /// Who claimed `index`, if anyone. Off-grid indices have no owner.
    pub fn owner(&self, index: CellIndex) -> Option<Side> {
        self.claimed.get(index).copied().and_then(Side::from_mark)
    }

    /// Number of cells claimed by `side`.
    pub fn claimed_count(&self, side: Side) -> usize {
        let mark = side.mark();
        self.claimed.iter().filter(|&&m| m == mark).count()
    }

    pub fn last_move(&self) -> Option<LastMove> {
        self.last_move
    }

    pub fn previous_plot(&self) -> Option<PlotId> {
        self.previous_plot
    }

    /// Diagnostic snapshot: `~` sea, `^` forest, `X`/`O` claimed by the
    /// first/second side, `*` legal now, `.` any other plot cell.
    pub fn render(&mut self) -> String {
        self.legal_moves();
        let width = self.map.width() as usize;
        let letters: Vec<String> = (0..width)
            .map(|c| char::from(b'A' + c as u8).to_string())
            .collect();
        let mut out = format!("   {}\n", letters.join(" "));

        for row in 0..self.map.height() as usize {
            let cells: Vec<&str> = (0..width)
                .map(|col| {
                    let i = row * width + col;
                    match (self.map.cell(i), self.owner(i)) {
                        (CellKind::Sea, _) => "~",
                        (CellKind::Forest, _) => "^",
                        (_, Some(Side::First)) => "X",
                        (_, Some(Side::Second)) => "O",
                        _ if self.legal.contains(&i) => "*",
                        _ => ".",
                    }
                })
                .collect();
            out.push_str(&format!("{:>2} {}\n", row + 1, cells.join(" ")));
        }
        out
    }
}

/// Legal cells for the given claim state. With no last move every plot cell
/// is legal.
pub fn legal_moves_after(
    map: &MapDefinition,
    claimed: &[i8],
    last_move: Option<LastMove>,
    previous_plot: Option<PlotId>,
) -> BTreeSet<CellIndex> {
    debug_assert!(
        last_move.is_some() || previous_plot.is_none(),
        "a previous plot without a last move"
    );
    map.plot_cells()
        .filter(|&(index, plot)| {
            if claimed[index] != 0 {
                return false;
            }
            let Some(last) = last_move else {
                return true;
            };
            let (row, col) = map.coords(index);
            last.plot != plot
                && (last.row == row || last.col == col)
                && previous_plot != Some(plot)
        })
        .map(|(index, _)| index)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 4x4 map, border-free, plots laid out as:
    ///   1 1 2 2
    ///   3 3 4 4
    ///   5 5 6 6
    ///   7 7 8 8
    fn pairs_map() -> Arc<MapDefinition> {
        let cells = (0..16u16)
            .map(|i| CellKind::Plot(PlotId(i / 2 + 1)))
            .collect();
        Arc::new(MapDefinition::new(4, 4, cells).unwrap())
    }

    fn idx(row: usize, col: usize) -> CellIndex {
        row * 4 + col
    }

    #[test]
    fn every_plot_cell_is_legal_before_first_move() {
        let mut board = MatchBoard::new(pairs_map());
        assert_eq!(board.legal_moves().len(), 16);
        assert!(board.can_play());
        assert_eq!(board.last_move(), None);
    }

    #[test]
    fn sea_and_forest_are_never_legal() {
        let cells = vec![
            CellKind::Sea,
            CellKind::Forest,
            CellKind::Plot(PlotId(1)),
        ];
        let map = Arc::new(MapDefinition::new(3, 1, cells).unwrap());
        let mut board = MatchBoard::new(map);
        assert_eq!(board.legal_moves().iter().copied().collect::<Vec<_>>(), vec![2]);
        assert!(!board.attempt_claim(0, Side::First));
        assert!(!board.attempt_claim(1, Side::First));
    }

    #[test]
    fn claim_restricts_to_row_and_column_outside_own_plot() {
        let mut board = MatchBoard::new(pairs_map());
        assert!(board.attempt_claim(idx(0, 0), Side::First));

        let legal: Vec<_> = board.legal_moves().iter().copied().collect();
        // Row 0 minus plot 1, column 0 minus plot 1.
        assert_eq!(legal, vec![idx(0, 2), idx(0, 3), idx(1, 0), idx(2, 0), idx(3, 0)]);
        assert_eq!(board.owner(idx(0, 0)), Some(Side::First));
        assert_eq!(
            board.last_move(),
            Some(LastMove {
                row: 0,
                col: 0,
                plot: PlotId(1)
            })
        );
        assert_eq!(board.previous_plot(), None);
    }

    #[test]
    fn plot_from_two_moves_ago_is_blocked() {
        let mut board = MatchBoard::new(pairs_map());
        assert!(board.attempt_claim(idx(0, 0), Side::First)); // plot 1
        assert!(board.attempt_claim(idx(0, 2), Side::Second)); // plot 2
        assert_eq!(board.previous_plot(), Some(PlotId(1)));

        // Row 0 and column 2: (0,1) is plot 1 (two moves ago), (0,3) plot 2
        // (last move), so only the column remains.
        let legal: Vec<_> = board.legal_moves().iter().copied().collect();
        assert_eq!(legal, vec![idx(1, 2), idx(2, 2), idx(3, 2)]);
        assert!(!board.is_legal(idx(0, 1)));
    }

    #[test]
    fn rejected_claim_leaves_state_untouched() {
        let mut board = MatchBoard::new(pairs_map());
        assert!(board.attempt_claim(idx(0, 0), Side::First));
        let before = (board.last_move(), board.previous_plot(), board.claimed.clone());

        // Diagonal, not on row/column.
        assert!(!board.attempt_claim(idx(1, 1), Side::Second));
        // Already claimed.
        assert!(!board.attempt_claim(idx(0, 0), Side::Second));
        // Same plot as the last move.
        assert!(!board.attempt_claim(idx(0, 1), Side::Second));
        // Off grid.
        assert!(!board.attempt_claim_at(0, 9, Side::Second));
        assert_eq!(board.owner(16), None);

        let after = (board.last_move(), board.previous_plot(), board.claimed.clone());
        assert_eq!(before, after);
    }

    #[test]
    fn claimed_cells_never_come_back() {
        let mut board = MatchBoard::new(pairs_map());
        let moves = [idx(0, 0), idx(0, 2), idx(2, 2), idx(2, 0)];
        let mut side = Side::First;
        for &m in &moves {
            assert!(board.attempt_claim(m, side), "move {m} rejected");
            side = side.opponent();
            for &done in &moves {
                assert!(!board.is_legal(done));
            }
        }
        assert_eq!(board.claimed_count(Side::First), 2);
        assert_eq!(board.claimed_count(Side::Second), 2);
    }

    #[test]
    fn board_can_run_out_of_moves() {
        // Two single-cell plots side by side: after both are claimed nothing
        // is left.
        let cells = vec![CellKind::Plot(PlotId(1)), CellKind::Plot(PlotId(2))];
        let map = Arc::new(MapDefinition::new(2, 1, cells).unwrap());
        let mut board = MatchBoard::new(map);
        assert!(board.attempt_claim(0, Side::First));
        assert!(board.can_play());
        assert!(board.attempt_claim(1, Side::Second));
        assert!(!board.can_play());
    }

    #[test]
    fn render_marks_owners_and_legal_cells() {
        let cells = vec![
            CellKind::Sea,
            CellKind::Plot(PlotId(1)),
            CellKind::Forest,
            CellKind::Plot(PlotId(2)),
        ];
        let map = Arc::new(MapDefinition::new(2, 2, cells).unwrap());
        let mut board = MatchBoard::new(map);
        assert!(board.attempt_claim(1, Side::Second));
        assert_eq!(board.render(), "   A B\n 1 ~ O\n 2 ^ *\n");
    }
}

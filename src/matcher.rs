//! Match detection: seven-cell runs and 3×3 squares of settled material.

use crate::grid::{Cell, CellState, Playfield, Point};

/// Cells in a run.
pub const RUN_LENGTH: usize = 7;
/// Side of a square.
pub const SQUARE_SIDE: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MatchKind {
    HorizontalRun,
    VerticalRun,
    Square,
}

impl MatchKind {
    /// Cells covered along x and y.
    pub const fn extent(self) -> (usize, usize) {
        match self {
            Self::HorizontalRun => (RUN_LENGTH, 1),
            Self::VerticalRun => (1, RUN_LENGTH),
            Self::Square => (SQUARE_SIDE, SQUARE_SIDE),
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::HorizontalRun => "h7",
            Self::VerticalRun => "v7",
            Self::Square => "square",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Match {
    pub kind: MatchKind,
    pub anchor: Point,
    pub extent: (usize, usize),
}

impl Match {
    fn new(kind: MatchKind, anchor: Point) -> Self {
        Self {
            kind,
            anchor,
            extent: kind.extent(),
        }
    }

    /// Every cell covered by the match.
    pub fn cells(&self) -> impl Iterator<Item = Point> + '_ {
        let (w, h) = self.extent;
        (0..h).flat_map(move |dy| (0..w).map(move |dx| self.anchor.offset(dx as i32, dy as i32)))
    }
}

const KINDS: [MatchKind; 3] = [
    MatchKind::HorizontalRun,
    MatchKind::VerticalRun,
    MatchKind::Square,
];

fn block_settled(playfield: &Playfield, anchor: Point, (w, h): (usize, usize)) -> bool {
    if anchor.x as usize + w > playfield.width || anchor.y as usize + h > playfield.height {
        return false;
    }
    (0..h).all(|dy| {
        (0..w).all(|dx| {
            playfield.cell_state(anchor.x + dx as i32, anchor.y + dy as i32) == CellState::Settled
        })
    })
}

/// Single pass over every anchor, column by column (x outer, y inner).
///
/// All three shapes are tested at an anchor before any of them is cleared, so
/// one anchor can report several matches. Cleared cells are emptied right
/// away and later anchors see the result; nothing is rescanned.
pub fn find_and_clear(playfield: &mut Playfield) -> Vec<Match> {
    let mut found = Vec::new();
    for x in 0..playfield.width as i32 {
        for y in 0..playfield.height as i32 {
            let anchor = Point::new(x, y);
            if playfield.cell_state(x, y) != CellState::Settled {
                continue;
            }
            let start = found.len();
            for kind in KINDS {
                if block_settled(playfield, anchor, kind.extent()) {
                    found.push(Match::new(kind, anchor));
                }
            }
            for m in &found[start..] {
                for cell in m.cells() {
                    playfield.set_state(cell.x, cell.y, Cell::Empty);
                }
            }
        }
    }
    found
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settle_row(pf: &mut Playfield, x0: i32, y: i32, len: i32) {
        for x in x0..x0 + len {
            pf.set_state(x, y, Cell::Settled(2));
        }
    }

    #[test]
    fn test_horizontal_run_of_seven() {
        let mut pf = Playfield::new(60, 45);
        settle_row(&mut pf, 10, 5, 7);
        let found = find_and_clear(&mut pf);
        assert_eq!(
            found,
            vec![Match {
                kind: MatchKind::HorizontalRun,
                anchor: Point::new(10, 5),
                extent: (7, 1),
            }]
        );
        for x in 10..17 {
            assert_eq!(pf.get(x, 5), Cell::Empty);
        }
        assert_eq!(pf.settled_count(), 0);
    }

    #[test]
    fn test_run_of_six_is_not_a_match() {
        let mut pf = Playfield::new(60, 45);
        settle_row(&mut pf, 10, 5, 6);
        for x in 30..36 {
            pf.set_state(x, 10, Cell::Settled(0));
        }
        pf.set_state(40, 2, Cell::Settled(0));
        for y in 2..8 {
            pf.set_state(40, y, Cell::Settled(0));
        }
        assert!(find_and_clear(&mut pf).is_empty());
        assert_eq!(pf.settled_count(), 18);
    }

    #[test]
    fn test_vertical_run() {
        let mut pf = Playfield::new(20, 20);
        for y in 4..11 {
            pf.set_state(6, y, Cell::Settled(1));
        }
        let found = find_and_clear(&mut pf);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].kind, MatchKind::VerticalRun);
        assert_eq!(found[0].anchor, Point::new(6, 4));
        assert_eq!(pf.settled_count(), 0);
    }

    #[test]
    fn test_square() {
        let mut pf = Playfield::new(20, 20);
        for y in 3..6 {
            settle_row(&mut pf, 8, y, 3);
        }
        let found = find_and_clear(&mut pf);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].kind, MatchKind::Square);
        assert_eq!(found[0].anchor, Point::new(8, 3));
        assert_eq!(found[0].extent, (3, 3));
        assert_eq!(pf.settled_count(), 0);
    }

    #[test]
    fn test_one_anchor_several_matches() {
        let mut pf = Playfield::new(20, 20);
        // Corner shared by a horizontal run, a vertical run and a square.
        settle_row(&mut pf, 2, 2, 7);
        for y in 2..9 {
            pf.set_state(2, y, Cell::Settled(0));
        }
        for y in 3..5 {
            settle_row(&mut pf, 3, y, 2);
        }
        let found = find_and_clear(&mut pf);
        let kinds: Vec<_> = found.iter().map(|m| m.kind).collect();
        assert_eq!(
            kinds,
            vec![
                MatchKind::HorizontalRun,
                MatchKind::VerticalRun,
                MatchKind::Square
            ]
        );
        assert!(found.iter().all(|m| m.anchor == Point::new(2, 2)));
        assert_eq!(pf.settled_count(), 0);
    }

    #[test]
    fn test_clears_are_seen_by_later_anchors() {
        let mut pf = Playfield::new(30, 20);
        // Eight in a row: the run at x=3 takes seven, the leftover never matches.
        settle_row(&mut pf, 3, 5, 8);
        let found = find_and_clear(&mut pf);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].anchor, Point::new(3, 5));
        assert_eq!(pf.get(10, 5), Cell::Settled(2));
    }

    #[test]
    fn test_scan_order_is_column_major() {
        let mut pf = Playfield::new(30, 30);
        settle_row(&mut pf, 12, 3, 7);
        for y in 10..17 {
            pf.set_state(4, y, Cell::Settled(0));
        }
        let found = find_and_clear(&mut pf);
        let anchors: Vec<_> = found.iter().map(|m| m.anchor).collect();
        assert_eq!(anchors, vec![Point::new(4, 10), Point::new(12, 3)]);
    }

    #[test]
    fn test_match_cells() {
        let m = Match::new(MatchKind::Square, Point::new(1, 1));
        let cells: Vec<_> = m.cells().collect();
        assert_eq!(cells.len(), 9);
        assert_eq!(cells[0], Point::new(1, 1));
        assert_eq!(cells[8], Point::new(3, 3));
    }
}

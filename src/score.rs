//! Score counter fed by matches.

use crate::matcher::{Match, MatchKind};

const RUN_POINTS: u32 = 10;
const SQUARE_POINTS: u32 = 15;

#[derive(Debug, Clone, Default)]
pub struct Scoreboard {
    pub score: u32,
    pub runs: u32,
    pub squares: u32,
}

impl Scoreboard {
    pub fn on_match(&mut self, m: &Match) {
        match m.kind {
            MatchKind::HorizontalRun | MatchKind::VerticalRun => {
                self.runs += 1;
                self.score += RUN_POINTS;
            }
            MatchKind::Square => {
                self.squares += 1;
                self.score += SQUARE_POINTS;
            }
        }
    }

    /// Score as five zero-padded digits.
    pub fn display(&self) -> String {
        format!("{:05}", self.score)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::Point;

    fn m(kind: MatchKind) -> Match {
        Match {
            kind,
            anchor: Point::new(3, 3),
            extent: kind.extent(),
        }
    }

    #[test]
    fn test_points_per_kind() {
        let mut board = Scoreboard::default();
        board.on_match(&m(MatchKind::HorizontalRun));
        board.on_match(&m(MatchKind::VerticalRun));
        board.on_match(&m(MatchKind::Square));
        assert_eq!(board.score, 35);
        assert_eq!((board.runs, board.squares), (2, 1));
        assert_eq!(board.display(), "00035");
    }
}

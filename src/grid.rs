//! Playfield grid: walls, settled material and collision queries.

use crate::atlas::Shape;

/// Integer grid coordinate. y=0 is the top row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub const fn offset(self, dx: i32, dy: i32) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }
}

/// What a cell is, without the colour of settled material.
/// Ordered by collision precedence: `Wall > Settled > Empty`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum CellState {
    Empty,
    Settled,
    Wall,
}

/// Single cell: empty, landed material of a colour index, or border wall.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cell {
    Empty,
    Settled(u8),
    Wall,
}

impl Cell {
    #[inline]
    pub fn state(self) -> CellState {
        match self {
            Self::Empty => CellState::Empty,
            Self::Settled(_) => CellState::Settled,
            Self::Wall => CellState::Wall,
        }
    }
}

/// Fixed-size playfield. Row-major storage (`y * width + x`).
#[derive(Debug, Clone)]
pub struct Playfield {
    pub width: usize,
    pub height: usize,
    cells: Vec<Cell>,
}

/// True for the cells the border layout of a `width × height` grid makes walls.
pub fn is_border(width: usize, height: usize, x: usize, y: usize) -> bool {
    y == 0 || y + 1 == height || ((x == 0 || x + 1 == width) && y >= 2)
}

impl Playfield {
    /// Empty playfield surrounded by the standard border: full rows at the top
    /// and bottom, side columns from y=2 down. (0,1) and (w-1,1) stay open.
    pub fn new(width: usize, height: usize) -> Self {
        let cells = (0..height)
            .flat_map(|y| (0..width).map(move |x| (x, y)))
            .map(|(x, y)| {
                if is_border(width, height, x, y) {
                    Cell::Wall
                } else {
                    Cell::Empty
                }
            })
            .collect();
        Self {
            width,
            height,
            cells,
        }
    }

    #[inline]
    fn index(&self, x: i32, y: i32) -> Option<usize> {
        if x < 0 || y < 0 || x as usize >= self.width || y as usize >= self.height {
            return None;
        }
        Some(y as usize * self.width + x as usize)
    }

    /// Cell at `(x, y)`; anything off the grid reads as wall.
    #[inline]
    pub fn get(&self, x: i32, y: i32) -> Cell {
        self.index(x, y).map_or(Cell::Wall, |i| self.cells[i])
    }

    #[inline]
    pub fn cell_state(&self, x: i32, y: i32) -> CellState {
        self.get(x, y).state()
    }

    /// Overwrite a cell. Border walls and off-grid coordinates are left alone,
    /// and walls cannot be placed elsewhere.
    pub fn set_state(&mut self, x: i32, y: i32, cell: Cell) {
        let Some(i) = self.index(x, y) else {
            return;
        };
        if self.cells[i] == Cell::Wall || cell == Cell::Wall {
            return;
        }
        self.cells[i] = cell;
    }

    /// Strongest obstruction under the occupied cells of `shape` placed at
    /// `top_left`: any wall gives `Wall`, else any settled cell gives `Settled`.
    pub fn check_move(&self, top_left: Point, shape: &Shape) -> CellState {
        let mut worst = CellState::Empty;
        for (dx, dy, _) in shape.occupied() {
            let state = self.cell_state(top_left.x + dx as i32, top_left.y + dy as i32);
            if state == CellState::Wall {
                return CellState::Wall;
            }
            worst = worst.max(state);
        }
        worst
    }

    /// Write the occupied cells of `shape` as settled material in its colours.
    pub fn stamp(&mut self, top_left: Point, shape: &Shape) {
        for (dx, dy, color) in shape.occupied() {
            self.set_state(
                top_left.x + dx as i32,
                top_left.y + dy as i32,
                Cell::Settled(color),
            );
        }
    }

    /// Number of settled cells.
    pub fn settled_count(&self) -> usize {
        self.cells
            .iter()
            .filter(|c| matches!(c, Cell::Settled(_)))
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_border_layout() {
        let pf = Playfield::new(60, 45);
        for x in 0..60 {
            assert_eq!(pf.cell_state(x, 0), CellState::Wall);
            assert_eq!(pf.cell_state(x, 44), CellState::Wall);
        }
        for y in 2..44 {
            assert_eq!(pf.cell_state(0, y), CellState::Wall);
            assert_eq!(pf.cell_state(59, y), CellState::Wall);
        }
        // Spawn chute corners stay open.
        assert_eq!(pf.cell_state(0, 1), CellState::Empty);
        assert_eq!(pf.cell_state(59, 1), CellState::Empty);
        assert_eq!(pf.cell_state(30, 20), CellState::Empty);
        for y in 0..45 {
            for x in 0..60 {
                assert_eq!(
                    pf.cell_state(x as i32, y as i32) == CellState::Wall,
                    is_border(60, 45, x, y)
                );
            }
        }
    }

    #[test]
    fn test_walls_never_mutate() {
        let mut pf = Playfield::new(10, 10);
        pf.set_state(0, 5, Cell::Empty);
        pf.set_state(4, 0, Cell::Settled(1));
        assert_eq!(pf.get(0, 5), Cell::Wall);
        assert_eq!(pf.get(4, 0), Cell::Wall);
        pf.set_state(4, 4, Cell::Wall);
        assert_eq!(pf.get(4, 4), Cell::Empty);
    }

    #[test]
    fn test_off_grid_reads_as_wall() {
        let pf = Playfield::new(10, 10);
        assert_eq!(pf.cell_state(-1, 1), CellState::Wall);
        assert_eq!(pf.cell_state(10, 1), CellState::Wall);
    }

    #[test]
    fn test_check_move_precedence() {
        let mut pf = Playfield::new(10, 10);
        let block = Shape::solid(2, 2, 0);
        assert_eq!(pf.check_move(Point::new(3, 3), &block), CellState::Empty);
        pf.set_state(4, 4, Cell::Settled(2));
        assert_eq!(pf.check_move(Point::new(3, 3), &block), CellState::Settled);
        // Settled at (1,3) and the wall at x=0 under the same footprint.
        pf.set_state(1, 3, Cell::Settled(2));
        assert_eq!(pf.check_move(Point::new(0, 3), &block), CellState::Wall);
    }

    #[test]
    fn test_check_move_ignores_empty_mask_cells() {
        let mut pf = Playfield::new(10, 10);
        pf.set_state(4, 3, Cell::Settled(0));
        // Empty top-right over the settled cell.
        let ell = Shape::from_rows(&[vec![Some(1), None], vec![Some(1), Some(1)]]);
        assert_eq!(pf.check_move(Point::new(3, 3), &ell), CellState::Empty);
    }

    #[test]
    fn test_stamp_skips_empty_cells() {
        let mut pf = Playfield::new(10, 10);
        let shape = Shape::from_rows(&[vec![Some(3), None], vec![Some(3), Some(4)]]);
        pf.stamp(Point::new(2, 2), &shape);
        assert_eq!(pf.get(2, 2), Cell::Settled(3));
        assert_eq!(pf.get(3, 2), Cell::Empty);
        assert_eq!(pf.get(3, 3), Cell::Settled(4));
        assert_eq!(pf.settled_count(), 3);
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn check_move_matches_cell_precedence(
                settled in prop::collection::vec((0_i32..12, 0_i32..12), 0..30),
                x in -1_i32..12,
                y in -1_i32..12,
                w in 1_usize..4,
                h in 1_usize..4,
            ) {
                let mut pf = Playfield::new(12, 12);
                for (sx, sy) in &settled {
                    pf.set_state(*sx, *sy, Cell::Settled(0));
                }
                let shape = Shape::solid(w, h, 0);
                let mut any_wall = false;
                let mut any_settled = false;
                for dy in 0..h as i32 {
                    for dx in 0..w as i32 {
                        match pf.cell_state(x + dx, y + dy) {
                            CellState::Wall => any_wall = true,
                            CellState::Settled => any_settled = true,
                            CellState::Empty => {}
                        }
                    }
                }
                let got = pf.check_move(Point::new(x, y), &shape);
                if any_wall {
                    prop_assert_eq!(got, CellState::Wall);
                } else if any_settled {
                    prop_assert_eq!(got, CellState::Settled);
                } else {
                    prop_assert_eq!(got, CellState::Empty);
                }
            }
        }
    }
}

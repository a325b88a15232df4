//! Emitter: patrols the playfield and launches the next piece.

use crate::atlas::Shape;
use crate::grid::Point;
use crate::piece::{AxisClock, Piece};

/// Distance kept between the patrol path and the outer edge of the grid.
pub const PATROL_INSET: i32 = 2;

/// Edge currently being travelled; the patrol runs clockwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment {
    /// Along the top edge, moving right.
    Top,
    /// Down the right edge.
    Right,
    /// Along the bottom edge, moving left.
    Bottom,
    /// Up the left edge.
    Left,
}

/// Linear congruential generator; enough for picking shapes.
#[derive(Debug, Clone)]
pub struct Lcg(u32);

impl Lcg {
    pub fn new(seed: u32) -> Self {
        Self(seed)
    }

    pub fn next_u32(&mut self) -> u32 {
        self.0 = self.0.wrapping_mul(1103515245).wrapping_add(12345);
        self.0 >> 16
    }

    /// Uniform-ish index in `0..n`.
    pub fn below(&mut self, n: usize) -> usize {
        (self.next_u32() as usize) % n.max(1)
    }
}

#[derive(Debug, Clone)]
pub struct Emitter {
    x: f64,
    y: f64,
    vx: f64,
    vy: f64,
    segment: Segment,
    speed: f64,
    min: Point,
    max: Point,
    target: (f64, f64),
    time_to_target: f64,
    shapes: Vec<Shape>,
    rng: Lcg,
    pending: Piece,
}

impl Emitter {
    /// Patrol inside a `width × height` playfield, starting at the top-left
    /// corner of the path. `shapes` must not be empty.
    pub fn new(
        width: usize,
        height: usize,
        shapes: Vec<Shape>,
        speed: f64,
        time_to_target: f64,
        seed: u32,
    ) -> Self {
        let max_w = shapes.iter().map(Shape::width).max().unwrap_or(1) as i32;
        let max_h = shapes.iter().map(Shape::height).max().unwrap_or(1) as i32;
        let min = Point::new(PATROL_INSET, PATROL_INSET);
        let max = Point::new(
            (width as i32 - PATROL_INSET - max_w).max(min.x),
            (height as i32 - PATROL_INSET - max_h).max(min.y),
        );
        let mut rng = Lcg::new(seed);
        let pending = Self::manufacture(&shapes, &mut rng);
        Self {
            x: f64::from(min.x),
            y: f64::from(min.y),
            vx: speed,
            vy: 0.0,
            segment: Segment::Top,
            speed,
            min,
            max,
            target: (width as f64 / 2.0, height as f64 / 2.0),
            time_to_target,
            shapes,
            rng,
            pending,
        }
    }

    fn manufacture(shapes: &[Shape], rng: &mut Lcg) -> Piece {
        let shape = shapes[rng.below(shapes.len())].clone();
        Piece::new(shape, 0.0, 0.0)
    }

    pub fn pending(&self) -> &Piece {
        &self.pending
    }

    /// Cell the emitter is over (and where the pending piece would launch).
    pub fn cell(&self) -> Point {
        Point::new(self.x.round() as i32, self.y.round() as i32)
    }

    /// Move along the patrol for `dt` seconds. Turning a corner sets the
    /// new direction and both axis speeds together.
    pub fn update(&mut self, dt: f64) {
        self.x += self.vx * dt;
        self.y += self.vy * dt;
        let (min_x, min_y) = (f64::from(self.min.x), f64::from(self.min.y));
        let (max_x, max_y) = (f64::from(self.max.x), f64::from(self.max.y));
        match self.segment {
            Segment::Top if self.x >= max_x => {
                self.x = max_x;
                self.turn(Segment::Right, 0.0, self.speed);
            }
            Segment::Right if self.y >= max_y => {
                self.y = max_y;
                self.turn(Segment::Bottom, -self.speed, 0.0);
            }
            Segment::Bottom if self.x <= min_x => {
                self.x = min_x;
                self.turn(Segment::Left, 0.0, -self.speed);
            }
            Segment::Left if self.y <= min_y => {
                self.y = min_y;
                self.turn(Segment::Top, self.speed, 0.0);
            }
            _ => {}
        }
    }

    fn turn(&mut self, segment: Segment, vx: f64, vy: f64) {
        self.segment = segment;
        self.vx = vx;
        self.vy = vy;
    }

    /// Hand over the pending piece, aimed at the target so it would arrive
    /// in `time_to_target` seconds without any field, and make the next one.
    pub fn promote(&mut self) -> (Piece, Point) {
        let at = self.cell();
        let next = Self::manufacture(&self.shapes, &mut self.rng);
        let mut piece = std::mem::replace(&mut self.pending, next);
        let vx = (self.target.0 - f64::from(at.x)) / self.time_to_target;
        let vy = (self.target.1 - f64::from(at.y)) / self.time_to_target;
        piece.x = AxisClock::new(vx);
        piece.y = AxisClock::new(vy);
        (piece, at)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn emitter(speed: f64) -> Emitter {
        Emitter::new(60, 45, vec![Shape::solid(2, 2, 0)], speed, 5.0, 7)
    }

    #[test]
    fn test_patrol_goes_clockwise() {
        let mut e = emitter(10.0);
        assert_eq!(e.cell(), Point::new(2, 2));
        assert_eq!(e.segment, Segment::Top);
        let mut seen = vec![e.segment];
        for _ in 0..2000 {
            e.update(0.05);
            if *seen.last().unwrap() != e.segment {
                seen.push(e.segment);
            }
        }
        assert_eq!(
            &seen[..5],
            &[
                Segment::Top,
                Segment::Right,
                Segment::Bottom,
                Segment::Left,
                Segment::Top
            ]
        );
    }

    #[test]
    fn test_corner_clamps_and_turns() {
        let mut e = emitter(10.0);
        // 54 cells of travel along the top; one big step overshoots.
        e.update(10.0);
        assert_eq!(e.segment, Segment::Right);
        assert_eq!(e.cell(), Point::new(56, 2));
        e.update(0.1);
        assert_eq!(e.cell(), Point::new(56, 3));
    }

    #[test]
    fn test_patrol_stays_inside() {
        let mut e = emitter(17.0);
        for _ in 0..5000 {
            e.update(0.033);
            let c = e.cell();
            assert!((2..=56).contains(&c.x), "{c:?}");
            assert!((2..=41).contains(&c.y), "{c:?}");
        }
    }

    #[test]
    fn test_promote_aims_at_target() {
        let mut e = emitter(10.0);
        let (piece, at) = e.promote();
        assert_eq!(at, Point::new(2, 2));
        let (vx, vy) = piece.velocity();
        assert!((vx - (30.0 - 2.0) / 5.0).abs() < 1e-12);
        assert!((vy - (22.5 - 2.0) / 5.0).abs() < 1e-12);
        assert_eq!(e.pending().velocity(), (0.0, 0.0));
    }

    #[test]
    fn test_shapes_drawn_from_set() {
        let shapes = vec![Shape::solid(1, 1, 0), Shape::solid(2, 1, 1), Shape::solid(3, 1, 2)];
        let mut e = Emitter::new(60, 45, shapes.clone(), 5.0, 5.0, 99);
        let mut hits = [0usize; 3];
        for _ in 0..300 {
            let (piece, _) = e.promote();
            let i = shapes.iter().position(|s| *s == piece.shape).unwrap();
            hits[i] += 1;
        }
        assert!(hits.iter().all(|&n| n > 0), "{hits:?}");
    }

    #[test]
    fn test_lcg_is_reproducible() {
        let mut a = Lcg::new(42);
        let mut b = Lcg::new(42);
        for _ in 0..10 {
            assert_eq!(a.next_u32(), b.next_u32());
        }
        assert!(a.below(3) < 3);
    }
}

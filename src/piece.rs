//! Falling pieces and the per-tick integrator.
//!
//! A piece never moves by fractions of a cell. Each axis keeps its own clock:
//! once the time waited on an axis reaches `1 / |v|` the piece steps one cell
//! along that axis. Diagonal motion therefore runs at a different apparent
//! speed on each axis, and the field keeps changing both speeds.

use crate::atlas::Shape;
use crate::field::VectorField;
use crate::grid::{CellState, Playfield, Point};

/// Timing state of one axis.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct AxisClock {
    /// Cells per second; the sign is the direction.
    pub velocity: f64,
    /// Seconds since the last step on this axis.
    pub waited: f64,
    /// Seconds between steps. Kept as-is while the velocity is zero.
    pub delay: f64,
}

impl AxisClock {
    pub fn new(velocity: f64) -> Self {
        Self {
            velocity,
            waited: 0.0,
            delay: step_delay(velocity).unwrap_or(0.0),
        }
    }

    /// Advance the clock and apply `accel` for `dt` seconds. Returns the
    /// step (-1, 0 or 1) to take on this axis.
    fn advance(&mut self, accel: f64, dt: f64) -> i32 {
        self.waited += dt;
        self.velocity += accel * dt;
        if let Some(delay) = step_delay(self.velocity) {
            self.delay = delay;
        }
        if self.velocity != 0.0 && self.waited >= self.delay {
            self.waited = 0.0;
            if self.velocity > 0.0 { 1 } else { -1 }
        } else {
            0
        }
    }
}

fn step_delay(velocity: f64) -> Option<f64> {
    (velocity != 0.0).then(|| 1.0 / velocity.abs())
}

/// A falling shape. Its position lives in the session's position table.
#[derive(Debug, Clone)]
pub struct Piece {
    pub shape: Shape,
    pub x: AxisClock,
    pub y: AxisClock,
}

/// Result of integrating one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// No axis fired.
    Held,
    /// Moved to a free position.
    Moved(Point),
    /// The next position overlaps settled material: install at the current position.
    Install,
    /// The next position overlaps a wall: discard.
    Destroy,
}

impl Piece {
    pub fn new(shape: Shape, vx: f64, vy: f64) -> Self {
        Self {
            shape,
            x: AxisClock::new(vx),
            y: AxisClock::new(vy),
        }
    }

    pub fn velocity(&self) -> (f64, f64) {
        (self.x.velocity, self.y.velocity)
    }

    /// Advance by `dt` seconds from `pos`, sampling the field at `pos`.
    /// Only `Moved` changes where the piece is; the caller commits it.
    pub fn integrate(
        &mut self,
        pos: Point,
        dt: f64,
        field: &VectorField,
        playfield: &Playfield,
    ) -> Step {
        let accel = field.force_at(pos.x, pos.y);
        let dx = self.x.advance(accel.ax, dt);
        let dy = self.y.advance(accel.ay, dt);
        if dx == 0 && dy == 0 {
            return Step::Held;
        }
        let next = pos.offset(dx, dy);
        match playfield.check_move(next, &self.shape) {
            CellState::Empty => Step::Moved(next),
            CellState::Settled => Step::Install,
            CellState::Wall => Step::Destroy,
        }
    }
}

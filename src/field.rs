//! Gravity field: per-attractor acceleration grids and their running sum.
//!
//! Every attractor owns a full W×H grid of accelerations. The sum grid is
//! rebuilt from all attractor grids whenever one of them changes, so a lookup
//! during integration is a single index into `sum`.

use crate::grid::Point;
use crate::session::EntityId;
use std::collections::BTreeMap;

/// Acceleration at one cell, in cells per second squared.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Accel {
    pub ax: f64,
    pub ay: f64,
}

#[derive(Debug, Clone)]
struct AttractorField {
    pos: Point,
    mass: f64,
    cells: Vec<Accel>,
}

/// Field of all attractors in a session. Row-major storage (`y * width + x`).
#[derive(Debug, Clone)]
pub struct VectorField {
    width: usize,
    height: usize,
    sum: Vec<Accel>,
    attractors: BTreeMap<EntityId, AttractorField>,
}

impl VectorField {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            sum: vec![Accel::default(); width * height],
            attractors: BTreeMap::new(),
        }
    }

    #[inline]
    fn index(&self, x: i32, y: i32) -> Option<usize> {
        if x < 0 || y < 0 || x as usize >= self.width || y as usize >= self.height {
            return None;
        }
        Some(y as usize * self.width + x as usize)
    }

    /// Register an attractor and rebuild its grid and the sum grid.
    /// Re-adding an existing id replaces it.
    pub fn add_attractor(&mut self, id: EntityId, pos: Point, mass: f64) {
        let mut attractor = AttractorField {
            pos,
            mass,
            cells: vec![Accel::default(); self.width * self.height],
        };
        self.rebuild_attractor(&mut attractor);
        self.attractors.insert(id, attractor);
        self.rebuild_sum();
        log::debug!("attractor {:?} added at {:?} (mass {})", id, pos, mass);
    }

    /// Move an attractor. Unknown ids are ignored.
    pub fn move_attractor(&mut self, id: EntityId, pos: Point) {
        let Some(mut attractor) = self.attractors.remove(&id) else {
            return;
        };
        attractor.pos = pos;
        self.rebuild_attractor(&mut attractor);
        self.attractors.insert(id, attractor);
        self.rebuild_sum();
        log::debug!("attractor {:?} moved to {:?}", id, pos);
    }

    pub fn attractor_count(&self) -> usize {
        self.attractors.len()
    }

    /// Combined acceleration at a cell; (0, 0) outside the field.
    pub fn force_at(&self, x: i32, y: i32) -> Accel {
        self.index(x, y).map(|i| self.sum[i]).unwrap_or_default()
    }

    fn rebuild_attractor(&self, attractor: &mut AttractorField) {
        for y in 0..self.height {
            for x in 0..self.width {
                attractor.cells[y * self.width + x] =
                    pull(attractor.pos, attractor.mass, x as i32, y as i32);
            }
        }
    }

    fn rebuild_sum(&mut self) {
        for (i, cell) in self.sum.iter_mut().enumerate() {
            let mut total = Accel::default();
            for attractor in self.attractors.values() {
                total.ax += attractor.cells[i].ax;
                total.ay += attractor.cells[i].ay;
            }
            *cell = total;
        }
    }
}

/// Pull of a point mass at `source` felt at `(x, y)`.
///
/// Each axis gets `mass * |d| / dist^3`, pointing toward the source. An axis
/// whose offset is zero gets exactly zero; since `dist > 0` whenever either
/// offset is non-zero, no division by zero can happen.
fn pull(source: Point, mass: f64, x: i32, y: i32) -> Accel {
    let dx = f64::from(source.x - x);
    let dy = f64::from(source.y - y);
    let dist = (dx * dx + dy * dy).sqrt();
    let axis = |d: f64| {
        if d == 0.0 {
            0.0
        } else {
            mass * d.abs() / dist.powi(3) * d.signum()
        }
    };
    Accel {
        ax: axis(dx),
        ay: axis(dy),
    }
}

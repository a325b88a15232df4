//! Pointer dragging of attractors.

use crate::grid::Point;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Drag {
    Idle,
    /// Pointer position at the last handled event.
    Dragging { grab: Point },
}

/// Drag state of one attractor. Its position is owned by the session.
#[derive(Debug, Clone)]
pub struct AttractorController {
    pub width: i32,
    pub height: i32,
    state: Drag,
}

impl AttractorController {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width: width as i32,
            height: height as i32,
            state: Drag::Idle,
        }
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.state, Drag::Dragging { .. })
    }

    /// True if `pointer` lies on the attractor's footprint at `pos`.
    pub fn hit(&self, pos: Point, pointer: Point) -> bool {
        (pos.x..pos.x + self.width).contains(&pointer.x)
            && (pos.y..pos.y + self.height).contains(&pointer.y)
    }

    /// Start dragging if the pointer went down on the footprint.
    pub fn pointer_down(&mut self, pos: Point, pointer: Point) -> bool {
        if self.hit(pos, pointer) {
            self.state = Drag::Dragging { grab: pointer };
            true
        } else {
            false
        }
    }

    /// Shift by the pointer delta, keeping the footprint inside a
    /// `bounds.0 × bounds.1` playfield. Returns the new position when the
    /// attractor moved.
    pub fn pointer_move(&mut self, pos: Point, pointer: Point, bounds: (usize, usize)) -> Option<Point> {
        let Drag::Dragging { grab } = self.state else {
            return None;
        };
        if pointer == grab {
            return None;
        }
        self.state = Drag::Dragging { grab: pointer };
        let max_x = (bounds.0 as i32 - self.width).max(0);
        let max_y = (bounds.1 as i32 - self.height).max(0);
        let next = Point::new(
            (pos.x + pointer.x - grab.x).clamp(0, max_x),
            (pos.y + pointer.y - grab.y).clamp(0, max_y),
        );
        (next != pos).then_some(next)
    }

    pub fn pointer_up(&mut self) {
        self.state = Drag::Idle;
    }
}

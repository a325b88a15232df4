//! Session: everything that lives for one game and dies on restart.
//!
//! Input reaches the session only as [`Event`]s. `dispatch` drains a FIFO
//! queue, so events raised while handling another one (a settle raising
//! matches, for instance) are fully processed before `dispatch` returns.

use crate::atlas::{self, Atlas, AtlasError, Shape};
use crate::attractor::AttractorController;
use crate::emitter::Emitter;
use crate::field::VectorField;
use crate::grid::{CellState, Playfield, Point};
use crate::matcher::{self, Match};
use crate::piece::{Piece, Step};
use std::collections::{HashMap, VecDeque};
use thiserror::Error;

/// Smallest playfield side that leaves room inside the border.
pub const MIN_SIDE: usize = 8;

/// Identifier of anything with a position: attractors, the emitter, pieces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EntityId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Event {
    /// Elapsed seconds since the previous tick.
    Tick(f64),
    PointerDown(Point),
    PointerUp(Point),
    PointerMove(Point),
    /// The piece touched settled material and becomes part of it.
    RequestInstall(EntityId),
    /// The piece touched a wall and is thrown away.
    RequestDestroy(EntityId),
    MatchFound(Match),
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("playfield {width}x{height} is too small (minimum 8x8)")]
    TooSmall { width: usize, height: usize },
    #[error("no piece shapes configured")]
    NoShapes,
    #[error(transparent)]
    Atlas(#[from] AtlasError),
}

/// Per-game settings.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub width: usize,
    pub height: usize,
    /// Mass of each attractor.
    pub mass: f64,
    /// Field positions of the attractors placed at start.
    pub attractors: Vec<Point>,
    /// Seconds a launched piece would need to reach the centre in an empty field.
    pub time_to_target: f64,
    /// Emitter patrol speed in cells per second.
    pub patrol_speed: f64,
    pub seed: u32,
    /// Atlas names of the shapes pieces are drawn from.
    pub piece_shapes: Vec<String>,
}

impl SessionConfig {
    /// Two attractors a third of the way in from each side.
    pub fn default_attractors(width: usize, height: usize) -> Vec<Point> {
        let (w, h) = (width as i32, height as i32);
        vec![Point::new(w / 6, h * 5 / 9), Point::new(w * 5 / 6, h * 5 / 9)]
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            width: 60,
            height: 45,
            mass: 150.0,
            attractors: Self::default_attractors(60, 45),
            time_to_target: 6.0,
            patrol_speed: 8.0,
            seed: 0x1234_5678,
            piece_shapes: atlas::DEFAULT_PIECES.iter().map(|s| s.to_string()).collect(),
        }
    }
}

#[derive(Debug, Clone)]
struct LivePiece {
    id: EntityId,
    piece: Piece,
}

#[derive(Debug)]
pub struct Session {
    field: VectorField,
    playfield: Playfield,
    emitter: Emitter,
    emitter_id: EntityId,
    live: Option<LivePiece>,
    attractors: Vec<(EntityId, AttractorController)>,
    attractor_shape: Shape,
    emitter_shape: Shape,
    /// Top-left cell of every placed entity.
    positions: HashMap<EntityId, Point>,
    next_id: u32,
    queue: VecDeque<Event>,
    outbox: Vec<Match>,
    overrun: bool,
    elapsed: f64,
}

impl Session {
    /// Build a fresh game: empty bordered grid, attractors from `config`, and
    /// a first piece already launched.
    pub fn new(config: &SessionConfig, atlas: &Atlas) -> Result<Self, SessionError> {
        if config.width < MIN_SIDE || config.height < MIN_SIDE {
            return Err(SessionError::TooSmall {
                width: config.width,
                height: config.height,
            });
        }
        if config.piece_shapes.is_empty() {
            return Err(SessionError::NoShapes);
        }
        let shapes = config
            .piece_shapes
            .iter()
            .map(|name| atlas.get(name).cloned())
            .collect::<Result<Vec<_>, _>>()?;
        let attractor_shape = atlas.get(atlas::ATTRACTOR)?.clone();
        let emitter_shape = atlas.get(atlas::EMITTER)?.clone();

        let mut session = Self {
            field: VectorField::new(config.width, config.height),
            playfield: Playfield::new(config.width, config.height),
            emitter: Emitter::new(
                config.width,
                config.height,
                shapes,
                config.patrol_speed,
                config.time_to_target,
                config.seed,
            ),
            emitter_id: EntityId(0),
            live: None,
            attractors: Vec::new(),
            attractor_shape,
            emitter_shape,
            positions: HashMap::new(),
            next_id: 1,
            queue: VecDeque::new(),
            outbox: Vec::new(),
            overrun: false,
            elapsed: 0.0,
        };
        session.positions.insert(session.emitter_id, session.emitter.cell());
        for &center in &config.attractors {
            session.add_attractor(center, config.mass);
        }
        session.launch();
        log::info!(
            "session started: {}x{} playfield, {} attractors, seed {:#x}",
            config.width,
            config.height,
            session.field.attractor_count(),
            config.seed
        );
        Ok(session)
    }

    /// Tear the session down.
    pub fn end(self) {
        log::info!(
            "session ended after {:.1}s with {} settled cells",
            self.elapsed,
            self.playfield.settled_count()
        );
    }

    /// Replace this session with a brand new one built from `config`.
    pub fn reset(&mut self, config: &SessionConfig, atlas: &Atlas) -> Result<(), SessionError> {
        let fresh = Self::new(config, atlas)?;
        std::mem::replace(self, fresh).end();
        Ok(())
    }

    fn alloc_id(&mut self) -> EntityId {
        let id = EntityId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Place an attractor whose field centre is `center`.
    pub fn add_attractor(&mut self, center: Point, mass: f64) -> EntityId {
        let id = self.alloc_id();
        let ctrl = AttractorController::new(self.attractor_shape.width(), self.attractor_shape.height());
        let top_left = center.offset(-ctrl.width / 2, -ctrl.height / 2);
        self.positions.insert(id, top_left);
        self.field.add_attractor(id, center, mass);
        self.attractors.push((id, ctrl));
        id
    }

    /// Queue `event` and process it together with everything it triggers.
    pub fn dispatch(&mut self, event: Event) {
        self.queue.push_back(event);
        while let Some(event) = self.queue.pop_front() {
            match event {
                Event::Tick(dt) => self.tick(dt),
                Event::PointerDown(p) => self.pointer_down(p),
                Event::PointerMove(p) => self.pointer_move(p),
                Event::PointerUp(_) => self.pointer_up(),
                Event::RequestInstall(id) => self.install(id),
                Event::RequestDestroy(id) => self.destroy(id),
                Event::MatchFound(m) => self.outbox.push(m),
            }
        }
    }

    fn tick(&mut self, dt: f64) {
        if !dt.is_finite() || dt <= 0.0 {
            return;
        }
        self.elapsed += dt;
        self.emitter.update(dt);
        self.positions.insert(self.emitter_id, self.emitter.cell());

        let Some(live) = self.live.as_mut() else {
            return;
        };
        let Some(&pos) = self.positions.get(&live.id) else {
            return;
        };
        match live.piece.integrate(pos, dt, &self.field, &self.playfield) {
            Step::Held => {}
            Step::Moved(next) => {
                self.positions.insert(live.id, next);
            }
            Step::Install => self.queue.push_back(Event::RequestInstall(live.id)),
            Step::Destroy => self.queue.push_back(Event::RequestDestroy(live.id)),
        }
    }

    fn take_live(&mut self, id: EntityId) -> Option<(Piece, Point)> {
        if self.live.as_ref().map(|l| l.id) != Some(id) {
            return None;
        }
        let live = self.live.take()?;
        let pos = self.positions.remove(&id)?;
        Some((live.piece, pos))
    }

    fn install(&mut self, id: EntityId) {
        let Some((piece, pos)) = self.take_live(id) else {
            return;
        };
        self.playfield.stamp(pos, &piece.shape);
        log::debug!("piece {:?} settled at {:?}", id, pos);
        for m in matcher::find_and_clear(&mut self.playfield) {
            log::info!("{} match at {:?}", m.kind.label(), m.anchor);
            self.queue.push_back(Event::MatchFound(m));
        }
        self.launch();
    }

    fn destroy(&mut self, id: EntityId) {
        if self.take_live(id).is_some() {
            log::debug!("piece {:?} destroyed", id);
            self.launch();
        }
    }

    /// Promote the emitter's pending piece to the live slot.
    fn launch(&mut self) {
        let (piece, at) = self.emitter.promote();
        if self.playfield.check_move(at, &piece.shape) != CellState::Empty {
            log::warn!("launch cell {:?} is blocked", at);
            self.overrun = true;
        }
        let id = self.alloc_id();
        log::debug!(
            "piece {:?} launched at {:?} with velocity {:?}",
            id,
            at,
            piece.velocity()
        );
        self.positions.insert(id, at);
        self.live = Some(LivePiece { id, piece });
    }

    fn pointer_down(&mut self, pointer: Point) {
        for (id, ctrl) in &mut self.attractors {
            let Some(&pos) = self.positions.get(id) else {
                continue;
            };
            if ctrl.pointer_down(pos, pointer) {
                break;
            }
        }
    }

    fn pointer_move(&mut self, pointer: Point) {
        let bounds = (self.playfield.width, self.playfield.height);
        for (id, ctrl) in &mut self.attractors {
            if !ctrl.is_dragging() {
                continue;
            }
            let Some(&pos) = self.positions.get(id) else {
                continue;
            };
            if let Some(next) = ctrl.pointer_move(pos, pointer, bounds) {
                self.positions.insert(*id, next);
                let center = next.offset(ctrl.width / 2, ctrl.height / 2);
                self.field.move_attractor(*id, center);
            }
        }
    }

    fn pointer_up(&mut self) {
        for (_, ctrl) in &mut self.attractors {
            ctrl.pointer_up();
        }
    }

    /// Matches found since the last call, oldest first.
    pub fn drain_matches(&mut self) -> Vec<Match> {
        std::mem::take(&mut self.outbox)
    }

    pub fn position(&self, id: EntityId) -> Option<Point> {
        self.positions.get(&id).copied()
    }

    pub fn playfield(&self) -> &Playfield {
        &self.playfield
    }

    /// Live piece and its top-left cell.
    pub fn live_piece(&self) -> Option<(&Piece, Point)> {
        let live = self.live.as_ref()?;
        Some((&live.piece, self.position(live.id)?))
    }

    /// Pending piece and the emitter cell it would launch from.
    pub fn pending_piece(&self) -> (&Piece, Point) {
        (self.emitter.pending(), self.emitter.cell())
    }

    /// Attractor top-left cells and whether each is being dragged.
    pub fn attractors(&self) -> impl Iterator<Item = (Point, bool)> + '_ {
        self.attractors
            .iter()
            .filter_map(|(id, ctrl)| Some((self.position(*id)?, ctrl.is_dragging())))
    }

    pub fn attractor_shape(&self) -> &Shape {
        &self.attractor_shape
    }

    /// Emitter marker and its cell.
    pub fn emitter(&self) -> (&Shape, Point) {
        let at = self.position(self.emitter_id).unwrap_or_else(|| self.emitter.cell());
        (&self.emitter_shape, at)
    }

    /// A launch landed on settled material.
    pub fn overrun(&self) -> bool {
        self.overrun
    }

    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }
}

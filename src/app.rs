//! App: terminal init, main loop, tick, key and mouse handling.

use crate::atlas::Atlas;
use crate::input::{self, Action, key_to_action};
use crate::score::Scoreboard;
use crate::session::{Event as GameEvent, Session, SessionConfig};
use crate::theme::Theme;
use crate::ui::{self, ClearFade};
use anyhow::Result;
use crossterm::event::{self, Event, KeyEvent, KeyEventKind};
use ratatui::DefaultTerminal;
use ratatui::layout::Rect;
use std::time::{Duration, Instant};

/// Longest step fed to the session in one frame. A stalled frame must not
/// turn into one huge velocity jump.
const MAX_TICK_SECS: f64 = 0.25;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Playing,
    Paused,
    GameOver,
}

pub struct App {
    config: SessionConfig,
    atlas: Atlas,
    theme: Theme,
    session: Session,
    scoreboard: Scoreboard,
    screen: Screen,
    frame_interval: Duration,
    last_tick: Instant,
    /// Board rect from the last draw, for mouse mapping.
    board: Rect,
    fade: ClearFade,
}

impl App {
    pub fn new(config: SessionConfig, atlas: Atlas, theme: Theme, frame_rate: f64) -> Result<Self> {
        let session = Session::new(&config, &atlas)?;
        let frame_rate = if frame_rate.is_finite() && frame_rate > 0.0 {
            frame_rate
        } else {
            30.0
        };
        Ok(Self {
            config,
            atlas,
            theme,
            session,
            scoreboard: Scoreboard::default(),
            screen: Screen::Playing,
            frame_interval: Duration::from_secs_f64(1.0 / frame_rate),
            last_tick: Instant::now(),
            board: Rect::default(),
            fade: ClearFade::default(),
        })
    }

    fn restart(&mut self) -> Result<()> {
        log::info!("restart with score {}", self.scoreboard.display());
        self.session.reset(&self.config, &self.atlas)?;
        self.scoreboard = Scoreboard::default();
        self.fade = ClearFade::default();
        self.screen = Screen::Playing;
        self.last_tick = Instant::now();
        Ok(())
    }

    pub fn run(mut self) -> Result<()> {
        use crossterm::{
            event::{DisableMouseCapture, EnableMouseCapture},
            execute,
            terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
        };

        enable_raw_mode()?;
        let mut stdout = std::io::stdout();
        execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
        let mut terminal =
            ratatui::DefaultTerminal::new(ratatui::backend::CrosstermBackend::new(stdout))?;

        let result = self.run_loop(&mut terminal);

        // Restore
        execute!(std::io::stdout(), DisableMouseCapture, LeaveAlternateScreen)?;
        disable_raw_mode()?;

        self.session.end();
        result
    }

    fn run_loop(&mut self, terminal: &mut DefaultTerminal) -> Result<()> {
        loop {
            let now = Instant::now();
            terminal.draw(|f| {
                let pf = self.session.playfield();
                self.board = ui::board_rect(f.area(), pf.width, pf.height);
                ui::draw(
                    f,
                    self.screen,
                    &self.session,
                    &self.scoreboard,
                    &self.theme,
                    &mut self.fade,
                    now,
                );
            })?;
            self.fade.finish_if_done();

            let timeout = self.frame_interval.saturating_sub(now.elapsed());
            if event::poll(timeout)? {
                while event::poll(Duration::ZERO)? {
                    match event::read()? {
                        Event::Key(key) if key.kind == KeyEventKind::Press => {
                            if self.handle_key(key)? {
                                return Ok(());
                            }
                        }
                        // Releases always get through so a drag never outlives a pause.
                        Event::Mouse(mouse) => match input::mouse_to_event(mouse, self.board) {
                            Some(ev @ GameEvent::PointerUp(_)) => self.session.dispatch(ev),
                            Some(ev) if self.screen == Screen::Playing => self.session.dispatch(ev),
                            _ => {}
                        },
                        _ => {}
                    }
                }
            }

            self.tick();
        }
    }

    /// Returns true when the app should quit.
    fn handle_key(&mut self, key: KeyEvent) -> Result<bool> {
        match (key_to_action(key), self.screen) {
            (Action::Quit, _) => return Ok(true),
            (Action::Pause, Screen::Playing) => self.screen = Screen::Paused,
            (Action::Pause, Screen::Paused) => self.screen = Screen::Playing,
            (Action::Restart, _) => self.restart()?,
            _ => {}
        }
        Ok(false)
    }

    /// Feed the time since the previous frame to the session and collect what
    /// it produced.
    fn tick(&mut self) {
        let now = Instant::now();
        let dt = now.duration_since(self.last_tick).as_secs_f64();
        self.last_tick = now;
        if self.screen != Screen::Playing {
            return;
        }
        self.session.dispatch(GameEvent::Tick(dt.min(MAX_TICK_SECS)));

        let found = self.session.drain_matches();
        if !found.is_empty() {
            for m in &found {
                self.scoreboard.on_match(m);
            }
            self.fade.start(found.iter().flat_map(|m| m.cells()));
        }
        if self.session.overrun() {
            log::info!(
                "game over: score {}, {} runs, {} squares",
                self.scoreboard.display(),
                self.scoreboard.runs,
                self.scoreboard.squares
            );
            self.screen = Screen::GameOver;
        }
    }
}

//! Layout and drawing: playfield, attractors, emitter, sidebar, pause and game over.

use crate::app::Screen;
use crate::grid::{Cell, Point};
use crate::score::Scoreboard;
use crate::session::Session;
use crate::theme::Theme;
use ratatui::Frame;
use ratatui::buffer::Buffer;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Position, Rect};
use ratatui::style::{Color, Style, Stylize};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Widget};
use std::collections::HashSet;
use std::time::Instant;
use tachyonfx::{
    CellFilter, Duration as TfxDuration, Effect, EffectRenderer, Interpolation, fx, ref_count,
};

const SIDEBAR_WIDTH: u16 = 24;

/// Duration of the fade over cleared cells, in ms.
const CLEAR_FADE_MS: u32 = 450;

/// Cleared cells and the fade running over them.
#[derive(Default)]
pub struct ClearFade {
    cells: Vec<Point>,
    effect: Option<Effect>,
    last_process: Option<Instant>,
}

impl ClearFade {
    /// Add freshly cleared cells; the fade restarts over all of them.
    pub fn start(&mut self, cells: impl IntoIterator<Item = Point>) {
        self.cells.extend(cells);
        self.effect = None;
        self.last_process = None;
    }

    pub fn is_active(&self) -> bool {
        !self.cells.is_empty()
    }

    /// Drop the fade once it has run to completion.
    pub fn finish_if_done(&mut self) {
        if self.effect.as_ref().is_some_and(|e| e.done()) {
            *self = Self::default();
        }
    }
}

/// Playfield panel (border included) and sidebar, centred in `area`.
fn panels(area: Rect, width: usize, height: usize) -> (Rect, Rect) {
    let pw = width as u16 + 2;
    let ph = height as u16 + 2;
    let total_w = pw + SIDEBAR_WIDTH;
    let x = area.x + area.width.saturating_sub(total_w) / 2;
    let y = area.y + area.height.saturating_sub(ph) / 2;
    (
        Rect::new(x, y, pw, ph),
        Rect::new(x + pw, y, SIDEBAR_WIDTH, ph),
    )
}

/// Terminal rect holding the grid, one terminal cell per grid cell. Also used
/// to map mouse positions back to grid cells.
pub fn board_rect(area: Rect, width: usize, height: usize) -> Rect {
    let (outer, _) = panels(area, width, height);
    Rect::new(outer.x + 1, outer.y + 1, width as u16, height as u16)
}

fn fits(area: Rect, width: usize, height: usize) -> bool {
    area.width >= width as u16 + 2 + SIDEBAR_WIDTH && area.height >= height as u16 + 2
}

/// Buffer positions covered by grid cells in `cells`.
fn clearing_buffer_positions(board: Rect, cells: &[Point]) -> HashSet<(u16, u16)> {
    cells
        .iter()
        .filter_map(|p| buffer_pos(board, *p))
        .map(|pos| (pos.x, pos.y))
        .collect()
}

fn buffer_pos(board: Rect, p: Point) -> Option<Position> {
    let x = board.x.checked_add(u16::try_from(p.x).ok()?)?;
    let y = board.y.checked_add(u16::try_from(p.y).ok()?)?;
    let pos = Position::new(x, y);
    board.contains(pos).then_some(pos)
}

fn put(buf: &mut Buffer, board: Rect, p: Point, symbol: &str, style: Style) {
    if let Some(pos) = buffer_pos(board, p) {
        buf[(pos.x, pos.y)].set_symbol(symbol).set_style(style);
    }
}

/// Run the fade over cleared cells: flash to white, then fade to background.
fn apply_clear_effect(frame: &mut Frame, board: Rect, theme: &Theme, fade: &mut ClearFade, now: Instant) {
    let delta = fade
        .last_process
        .map(|t| now.saturating_duration_since(t))
        .unwrap_or(std::time::Duration::ZERO);
    let delta_ms = delta.as_millis().min(u32::MAX as u128) as u32;
    fade.last_process = Some(now);

    if fade.effect.is_none() {
        let clearing = clearing_buffer_positions(board, &fade.cells);
        let filter = CellFilter::PositionFn(ref_count(move |pos: Position| {
            clearing.contains(&(pos.x, pos.y))
        }));
        let bg = theme.bg;
        let effect = fx::fade_to(bg, bg, (CLEAR_FADE_MS, Interpolation::Linear))
            .with_filter(filter)
            .with_area(board);
        fade.effect = Some(effect);
    }

    if let Some(effect) = fade.effect.as_mut() {
        frame.render_effect(effect, board, TfxDuration::from_millis(delta_ms));
    }
}

/// Draw the current screen. Pause and game over are overlays on the board.
pub fn draw(
    frame: &mut Frame,
    screen: Screen,
    session: &Session,
    scoreboard: &Scoreboard,
    theme: &Theme,
    fade: &mut ClearFade,
    now: Instant,
) {
    let area = frame.area();
    let pf = session.playfield();
    if !fits(area, pf.width, pf.height) {
        draw_too_small(frame, theme, area, pf.width, pf.height);
        return;
    }
    let (playfield_area, sidebar_area) = panels(area, pf.width, pf.height);
    let board = board_rect(area, pf.width, pf.height);

    draw_playfield(frame, session, theme, playfield_area, board, fade);
    draw_sidebar(frame, session, scoreboard, theme, sidebar_area);
    if fade.is_active() {
        apply_clear_effect(frame, board, theme, fade, now);
    }
    match screen {
        Screen::Playing => {}
        Screen::Paused => draw_pause_overlay(frame, theme, playfield_area),
        Screen::GameOver => draw_game_over(frame, scoreboard, theme, playfield_area),
    }
}

fn draw_too_small(frame: &mut Frame, theme: &Theme, area: Rect, width: usize, height: usize) {
    let lines = vec![
        Line::from(Span::styled("Terminal too small", Style::default().fg(theme.title))),
        Line::from(Span::styled(
            format!("need {}x{}", width as u16 + 2 + SIDEBAR_WIDTH, height + 2),
            Style::default().fg(theme.main_fg),
        )),
    ];
    Paragraph::new(lines)
        .alignment(Alignment::Center)
        .render(area, frame.buffer_mut());
}

fn draw_playfield(
    frame: &mut Frame,
    session: &Session,
    theme: &Theme,
    area: Rect,
    board: Rect,
    fade: &ClearFade,
) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.wall).bg(theme.bg))
        .title(Span::styled(" Indirectris ", theme.title));
    block.render(area, frame.buffer_mut());

    let buf = frame.buffer_mut();
    let pf = session.playfield();
    for y in 0..pf.height as i32 {
        for x in 0..pf.width as i32 {
            let (symbol, fg) = match pf.get(x, y) {
                Cell::Empty => (" ", theme.bg),
                Cell::Settled(c) => ("█", theme.tint(c)),
                Cell::Wall => ("█", theme.wall),
            };
            put(buf, board, Point::new(x, y), symbol, Style::default().fg(fg).bg(theme.bg));
        }
    }

    let flash = Style::default().fg(Color::White).bg(theme.bg);
    for &p in &fade.cells {
        if pf.get(p.x, p.y) == Cell::Empty {
            put(buf, board, p, "█", flash);
        }
    }

    let shape = session.attractor_shape();
    for (pos, dragging) in session.attractors() {
        for (dx, dy, c) in shape.occupied() {
            let fg = if dragging { theme.grab } else { theme.tint(c) };
            let style = Style::default().fg(fg).bg(theme.bg);
            put(buf, board, pos.offset(dx as i32, dy as i32), "▓", style);
        }
    }

    let (pending, at) = session.pending_piece();
    let style = Style::default().fg(theme.inactive_fg).bg(theme.bg);
    for (dx, dy, _) in pending.shape.occupied() {
        put(buf, board, at.offset(dx as i32, dy as i32), "░", style);
    }

    let (marker, at) = session.emitter();
    for (dx, dy, c) in marker.occupied() {
        let style = Style::default().fg(theme.tint(c)).bg(theme.bg);
        put(buf, board, at.offset(dx as i32, dy as i32), "◆", style);
    }

    if let Some((piece, at)) = session.live_piece() {
        for (dx, dy, c) in piece.shape.occupied() {
            let style = Style::default().fg(theme.tint(c)).bg(theme.bg);
            put(buf, board, at.offset(dx as i32, dy as i32), "█", style);
        }
    }
}

fn draw_sidebar(
    frame: &mut Frame,
    session: &Session,
    scoreboard: &Scoreboard,
    theme: &Theme,
    area: Rect,
) {
    let title_style = Style::default().fg(theme.title);
    let fg_style = Style::default().fg(theme.main_fg);
    let dim_style = Style::default().fg(theme.inactive_fg);
    let border_style = Style::default().fg(theme.wall).bg(theme.bg);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4), // Score
            Constraint::Length(1),
            Constraint::Length(6), // Stats
            Constraint::Length(1),
            Constraint::Length(7), // Controls
        ])
        .split(area);

    let score_block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style)
        .title(Span::styled(" Score ", title_style));
    let score_inner = score_block.inner(chunks[0]);
    score_block.render(chunks[0], frame.buffer_mut());
    Paragraph::new(Line::from(Span::styled(scoreboard.display(), title_style.bold())))
        .alignment(Alignment::Center)
        .render(score_inner, frame.buffer_mut());

    let secs = session.elapsed() as u64;
    let stat = |label: &'static str, value: String| {
        Line::from(vec![Span::styled(label, title_style), Span::styled(value, fg_style)])
    };
    let stats_block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style);
    let stats_inner = stats_block.inner(chunks[2]);
    stats_block.render(chunks[2], frame.buffer_mut());
    Paragraph::new(Text::from(vec![
        stat("Runs:    ", scoreboard.runs.to_string()),
        stat("Squares: ", scoreboard.squares.to_string()),
        stat("Settled: ", session.playfield().settled_count().to_string()),
        stat("Time:    ", format!("{:02}:{:02}", secs / 60, secs % 60)),
    ]))
    .render(stats_inner, frame.buffer_mut());

    let help_block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style)
        .title(Span::styled(" Controls ", title_style));
    let help_inner = help_block.inner(chunks[4]);
    help_block.render(chunks[4], frame.buffer_mut());
    Paragraph::new(Text::from(vec![
        Line::from(Span::styled("Drag ▓ to bend paths", dim_style)),
        Line::from(""),
        Line::from(Span::styled("P  Pause", dim_style)),
        Line::from(Span::styled("R  Restart", dim_style)),
        Line::from(Span::styled("Q  Quit", dim_style)),
    ]))
    .render(help_inner, frame.buffer_mut());
}

fn popup_rect(area: Rect, width: u16, height: u16) -> Rect {
    Rect {
        x: area.x + area.width.saturating_sub(width) / 2,
        y: area.y + area.height.saturating_sub(height) / 2,
        width: width.min(area.width),
        height: height.min(area.height),
    }
}

fn draw_pause_overlay(frame: &mut Frame, theme: &Theme, area: Rect) {
    let popup = popup_rect(area, 28, 5);
    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            " Paused ",
            Style::default().fg(Color::Black).bg(Color::Yellow),
        )),
        Line::from(""),
        Line::from(Span::styled(
            " P  Resume    Q  Quit ",
            Style::default().fg(theme.main_fg),
        )),
    ];
    Clear.render(popup, frame.buffer_mut());
    Paragraph::new(lines)
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(theme.wall).bg(theme.bg)),
        )
        .render(popup, frame.buffer_mut());
}

fn draw_game_over(frame: &mut Frame, scoreboard: &Scoreboard, theme: &Theme, area: Rect) {
    let popup = popup_rect(area, 30, 9);
    let fg = Style::default().fg(theme.main_fg);
    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            " Game Over ",
            Style::default().fg(Color::White).bg(Color::Red),
        )),
        Line::from(""),
        Line::from(Span::styled(format!(" Score: {} ", scoreboard.display()), fg)),
        Line::from(Span::styled(
            format!(" Runs: {}  Squares: {} ", scoreboard.runs, scoreboard.squares),
            fg,
        )),
        Line::from(""),
        Line::from(Span::styled(" R  Restart    Q  Quit ", fg)),
    ];
    Clear.render(popup, frame.buffer_mut());
    Paragraph::new(lines)
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(theme.wall).bg(theme.bg))
                .title(Span::styled(" Indirectris ", theme.title)),
        )
        .render(popup, frame.buffer_mut());
}

//! Key bindings and mouse translation.

use crate::grid::Point;
use crate::session::Event;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};
use ratatui::layout::Rect;

/// Action from a key press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Pause,
    Restart,
    Quit,
    None,
}

pub fn key_to_action(key: KeyEvent) -> Action {
    let KeyEvent { code, modifiers, .. } = key;
    if modifiers == KeyModifiers::CONTROL && code == KeyCode::Char('c') {
        return Action::Quit;
    }
    if !(modifiers.is_empty() || modifiers == KeyModifiers::SHIFT) {
        return Action::None;
    }
    match code {
        KeyCode::Char('q' | 'Q') | KeyCode::Esc => Action::Quit,
        KeyCode::Char('p' | 'P' | ' ') => Action::Pause,
        KeyCode::Char('r' | 'R') => Action::Restart,
        _ => Action::None,
    }
}

/// Grid cell under terminal position `(column, row)` for a board drawn in
/// `board`, one terminal cell per grid cell. Positions outside the board are
/// still translated so a drag can run past the edge.
pub fn to_grid(board: Rect, column: u16, row: u16) -> Point {
    Point::new(
        i32::from(column) - i32::from(board.x),
        i32::from(row) - i32::from(board.y),
    )
}

/// Pointer event for a left-button mouse event; other buttons are ignored.
pub fn mouse_to_event(mouse: MouseEvent, board: Rect) -> Option<Event> {
    let at = to_grid(board, mouse.column, mouse.row);
    match mouse.kind {
        MouseEventKind::Down(MouseButton::Left) => Some(Event::PointerDown(at)),
        MouseEventKind::Up(MouseButton::Left) => Some(Event::PointerUp(at)),
        MouseEventKind::Drag(MouseButton::Left) | MouseEventKind::Moved => {
            Some(Event::PointerMove(at))
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mouse(kind: MouseEventKind, column: u16, row: u16) -> MouseEvent {
        MouseEvent {
            kind,
            column,
            row,
            modifiers: KeyModifiers::NONE,
        }
    }

    #[test]
    fn test_keys() {
        let press = |code| KeyEvent::new(code, KeyModifiers::NONE);
        assert_eq!(key_to_action(press(KeyCode::Char('q'))), Action::Quit);
        assert_eq!(key_to_action(press(KeyCode::Esc)), Action::Quit);
        assert_eq!(key_to_action(press(KeyCode::Char('p'))), Action::Pause);
        assert_eq!(key_to_action(press(KeyCode::Char('r'))), Action::Restart);
        assert_eq!(key_to_action(press(KeyCode::Char('x'))), Action::None);
        assert_eq!(
            key_to_action(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)),
            Action::Quit
        );
        assert_eq!(
            key_to_action(KeyEvent::new(KeyCode::Char('r'), KeyModifiers::ALT)),
            Action::None
        );
    }

    #[test]
    fn test_mouse_translation() {
        let board = Rect::new(5, 2, 60, 45);
        assert_eq!(
            mouse_to_event(mouse(MouseEventKind::Down(MouseButton::Left), 15, 27), board),
            Some(Event::PointerDown(Point::new(10, 25)))
        );
        assert_eq!(
            mouse_to_event(mouse(MouseEventKind::Drag(MouseButton::Left), 1, 0), board),
            Some(Event::PointerMove(Point::new(-4, -2)))
        );
        assert_eq!(
            mouse_to_event(mouse(MouseEventKind::Down(MouseButton::Right), 15, 27), board),
            None
        );
    }
}

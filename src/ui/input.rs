/// Input collector.
///
/// Drains crossterm's queue once per frame and turns key, mouse and paste
/// events into `InputEvent`s for the controller. Ctrl+C and terminal
/// resizes are tracked separately since they bypass view-mode routing.
///
/// Only Press/Repeat key events count; Release events (sent by terminals
/// with keyboard enhancement) are dropped.

use std::time::Duration;

use crossterm::event::{
    self, poll, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEvent,
    MouseEventKind,
};

use crate::sim::event::InputEvent;

pub struct InputState {
    /// Events translated during the most recent `drain_events()` call.
    pub events: Vec<InputEvent>,
    ctrl_c: bool,
    /// Latest terminal size reported by a resize event.
    resized: Option<(u16, u16)>,
}

impl InputState {
    pub fn new() -> Self {
        InputState {
            events: Vec::with_capacity(8),
            ctrl_c: false,
            resized: None,
        }
    }

    /// Drain all pending terminal events.
    /// Call this once per frame, before routing.
    pub fn drain_events(&mut self) {
        self.events.clear();
        self.ctrl_c = false;
        self.resized = None;

        // Read all available events without blocking
        while poll(Duration::ZERO).unwrap_or(false) {
            match event::read() {
                Ok(Event::Resize(w, h)) => self.resized = Some((w, h)),
                Ok(Event::Key(key)) if is_ctrl_c(&key) => self.ctrl_c = true,
                Ok(ev) => self.events.extend(translate(ev)),
                Err(_) => break,
            }
        }
    }

    pub fn ctrl_c_pressed(&self) -> bool {
        self.ctrl_c
    }

    pub fn take_resize(&mut self) -> Option<(u16, u16)> {
        self.resized.take()
    }
}

fn is_ctrl_c(key: &KeyEvent) -> bool {
    key.kind != KeyEventKind::Release
        && key.modifiers.contains(KeyModifiers::CONTROL)
        && matches!(key.code, KeyCode::Char('c') | KeyCode::Char('C'))
}

/// Map one crossterm event to the controller's vocabulary.
pub fn translate(ev: Event) -> Option<InputEvent> {
    match ev {
        Event::Key(key) => translate_key(key),
        Event::Mouse(mouse) => translate_mouse(mouse),
        Event::Paste(text) => Some(InputEvent::Paste(text)),
        _ => None,
    }
}

fn translate_key(key: KeyEvent) -> Option<InputEvent> {
    if key.kind == KeyEventKind::Release {
        return None;
    }
    // Other control chords have no meaning here
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        return None;
    }
    let ev = match key.code {
        KeyCode::Char(c) => InputEvent::Char(c),
        KeyCode::Enter => InputEvent::Enter,
        KeyCode::Backspace => InputEvent::Backspace,
        KeyCode::Delete => InputEvent::Delete,
        KeyCode::Left => InputEvent::Left,
        KeyCode::Right => InputEvent::Right,
        KeyCode::Up => InputEvent::Up,
        KeyCode::Down => InputEvent::Down,
        KeyCode::Home => InputEvent::Home,
        KeyCode::End => InputEvent::End,
        KeyCode::PageUp => InputEvent::PageUp,
        KeyCode::PageDown => InputEvent::PageDown,
        KeyCode::Tab => InputEvent::Tab,
        KeyCode::Esc => InputEvent::Esc,
        KeyCode::F(n) => InputEvent::Function(n),
        _ => return None,
    };
    Some(ev)
}

fn translate_mouse(mouse: MouseEvent) -> Option<InputEvent> {
    match mouse.kind {
        MouseEventKind::Down(MouseButton::Left) => Some(InputEvent::Click {
            col: mouse.column,
            row: mouse.row,
        }),
        MouseEventKind::ScrollUp => Some(InputEvent::ScrollUp),
        MouseEventKind::ScrollDown => Some(InputEvent::ScrollDown),
        _ => None,
    }
}

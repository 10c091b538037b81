/// Popup windows: image viewer, text viewer and the archive password prompt.
///
/// Each exposes `show(payload)` / `hide()` / `visible`. The password window
/// does not validate anything itself: its confirm action hands the typed
/// password back to the caller, which runs the shared unzip routine.

use serde::{Deserialize, Serialize};

use crate::sim::event::InputEvent;

// ── Image ──

#[derive(Clone, PartialEq, Eq, Debug, Default, Serialize, Deserialize)]
pub struct ImageWindow {
    pub visible: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_path: Option<String>,
}

impl ImageWindow {
    pub fn show(&mut self, path: &str) {
        self.image_path = Some(path.to_string());
        self.visible = true;
    }

    pub fn hide(&mut self) {
        self.visible = false;
    }
}

// ── Text ──

#[derive(Clone, PartialEq, Eq, Debug, Default, Serialize, Deserialize)]
pub struct TextWindow {
    pub visible: bool,
    pub title: String,
    pub content: String,
    pub scroll: usize,
}

impl TextWindow {
    pub fn show(&mut self, title: &str, content: &str) {
        self.title = title.to_string();
        self.content = content.to_string();
        self.scroll = 0;
        self.visible = true;
    }

    pub fn hide(&mut self) {
        self.visible = false;
    }

    pub fn line_count(&self) -> usize {
        self.content.lines().count()
    }

    pub fn scroll_by(&mut self, delta: isize) {
        let max = self.line_count().saturating_sub(1) as isize;
        self.scroll = (self.scroll as isize + delta).clamp(0, max.max(0)) as usize;
    }

    pub fn handle_event(&mut self, event: &InputEvent) -> bool {
        match event {
            InputEvent::Up | InputEvent::ScrollUp => self.scroll_by(-1),
            InputEvent::Down | InputEvent::ScrollDown => self.scroll_by(1),
            InputEvent::PageUp => self.scroll_by(-10),
            InputEvent::PageDown => self.scroll_by(10),
            InputEvent::Esc | InputEvent::Enter => self.hide(),
            _ => return false,
        }
        true
    }
}

// ── Password prompt ──

#[derive(Clone, PartialEq, Eq, Debug)]
pub enum PasswordAction {
    Ignored,
    Consumed,
    Submit(String),
    Cancel,
}

#[derive(Clone, PartialEq, Eq, Debug, Default, Serialize, Deserialize)]
pub struct PasswordWindow {
    pub visible: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    #[serde(skip)]
    pub entry: String,
}

impl PasswordWindow {
    pub fn show(&mut self, target: &str) {
        self.target = Some(target.to_string());
        self.entry.clear();
        self.visible = true;
    }

    pub fn hide(&mut self) {
        self.visible = false;
        self.entry.clear();
    }

    /// Masked form of the typed password.
    pub fn masked(&self) -> String {
        "*".repeat(self.entry.chars().count())
    }

    pub fn handle_event(&mut self, event: &InputEvent) -> PasswordAction {
        if !self.visible {
            return PasswordAction::Ignored;
        }
        match event {
            InputEvent::Char(c) => {
                self.entry.push(*c);
                PasswordAction::Consumed
            }
            InputEvent::Paste(text) => {
                self.entry.extend(text.chars().filter(|c| *c != '\n' && *c != '\r'));
                PasswordAction::Consumed
            }
            InputEvent::Backspace => {
                self.entry.pop();
                PasswordAction::Consumed
            }
            InputEvent::Enter => {
                let password = std::mem::take(&mut self.entry);
                self.visible = false;
                PasswordAction::Submit(password)
            }
            InputEvent::Esc => {
                self.hide();
                PasswordAction::Cancel
            }
            _ => PasswordAction::Consumed,
        }
    }
}

// ── All popups ──

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Popup {
    Password,
    Image,
    Text,
}

#[derive(Clone, PartialEq, Eq, Debug, Default)]
pub struct Popups {
    pub image: ImageWindow,
    pub text: TextWindow,
    pub password: PasswordWindow,
}

impl Popups {
    pub fn hide_all(&mut self) {
        self.image.hide();
        self.text.hide();
        self.password.hide();
    }

    /// Topmost visible popup: password over image over text.
    pub fn topmost(&self) -> Option<Popup> {
        if self.password.visible {
            Some(Popup::Password)
        } else if self.image.visible {
            Some(Popup::Image)
        } else if self.text.visible {
            Some(Popup::Text)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_enter_submits_and_hides() {
        let mut w = PasswordWindow::default();
        w.show("encrypted.zip");
        for c in "pw1".chars() {
            assert_eq!(w.handle_event(&InputEvent::Char(c)), PasswordAction::Consumed);
        }
        w.handle_event(&InputEvent::Backspace);
        assert_eq!(w.masked(), "**");
        assert_eq!(w.handle_event(&InputEvent::Enter), PasswordAction::Submit("pw".into()));
        assert!(!w.visible);
    }

    #[test]
    fn password_esc_cancels() {
        let mut w = PasswordWindow::default();
        w.show("encrypted.zip");
        w.handle_event(&InputEvent::Char('x'));
        assert_eq!(w.handle_event(&InputEvent::Esc), PasswordAction::Cancel);
        assert!(w.entry.is_empty());
        assert_eq!(w.handle_event(&InputEvent::Char('y')), PasswordAction::Ignored);
    }

    #[test]
    fn topmost_order() {
        let mut p = Popups::default();
        assert_eq!(p.topmost(), None);
        p.text.show("a", "b");
        p.image.show("img.jpg");
        assert_eq!(p.topmost(), Some(Popup::Image));
        p.password.show("z.zip");
        assert_eq!(p.topmost(), Some(Popup::Password));
        p.hide_all();
        assert_eq!(p.topmost(), None);
    }

    #[test]
    fn text_scroll_clamps() {
        let mut w = TextWindow::default();
        w.show("t", "1\n2\n3");
        w.scroll_by(10);
        assert_eq!(w.scroll, 2);
        w.scroll_by(-10);
        assert_eq!(w.scroll, 0);
    }
}

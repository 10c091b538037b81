/// Closing credits: a fixed list of lines rolling up the screen.

use crate::sim::event::InputEvent;

pub const CREDIT_LINES: [&str; 24] = [
    "",
    "",
    "",
    "NullOS CTF Challenge",
    "",
    "Created by:",
    "",
    "Abdulrahman Majid",
    "Ayman Rasheed",
    "Maryam Talaat",
    "Faede Abdulrazaq",
    "",
    "",
    "",
    "Advisor:",
    "",
    "Dr.Ann Alkazaz",
    "",
    "",
    "",
    "Thank you for playing!",
    "",
    "",
    "",
];

pub const EXIT_PROMPT: &str = "[Press ESC or Click to Exit]";

/// Pixel-ish units per text row; scroll speed is given in these units.
const UNITS_PER_ROW: f32 = 30.0;

#[derive(Clone, Debug)]
pub struct CreditsScreen {
    /// Scrolled distance in rows.
    offset: f32,
    speed: f32,
}

impl CreditsScreen {
    pub fn new(scroll_speed: f32) -> Self {
        CreditsScreen { offset: 0.0, speed: scroll_speed.max(0.0) }
    }

    pub fn restart(&mut self) {
        self.offset = 0.0;
    }

    pub fn update(&mut self, dt: f32) {
        self.offset += dt * self.speed / UNITS_PER_ROW;
    }

    /// True when the player asked to leave.
    pub fn handle_event(&self, event: &InputEvent) -> bool {
        matches!(event, InputEvent::Esc | InputEvent::Enter | InputEvent::Click { .. })
    }

    /// Lines on screen for a viewport `height` rows tall, as (row, text).
    /// The roll starts just below the bottom edge and stops once the last
    /// line reaches the vertical middle.
    pub fn visible_lines(&self, height: u16) -> Vec<(u16, &'static str)> {
        let h = height as f32;
        let travel = (h + CREDIT_LINES.len() as f32 - h / 2.0).max(0.0);
        let top = h - self.offset.min(travel);
        CREDIT_LINES
            .iter()
            .enumerate()
            .filter_map(|(i, text)| {
                let row = (top + i as f32).floor();
                (row >= 0.0 && row < h).then_some((row as u16, *text))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_below_the_screen() {
        let c = CreditsScreen::new(70.0);
        assert!(c.visible_lines(20).is_empty());
    }

    #[test]
    fn lines_roll_upward() {
        let mut c = CreditsScreen::new(30.0);
        c.update(5.0);
        let lines = c.visible_lines(20);
        assert_eq!(lines.first(), Some(&(15, "")));
        c.update(1.0);
        assert_eq!(c.visible_lines(20).first(), Some(&(14, "")));
    }

    #[test]
    fn roll_stops_with_last_line_mid_screen() {
        let mut c = CreditsScreen::new(30.0);
        c.update(1000.0);
        let lines = c.visible_lines(20);
        let last_row = lines.last().map(|(r, _)| *r);
        assert_eq!(last_row, Some(9));
        assert!(lines.iter().any(|(_, t)| *t == "Thank you for playing!"));
    }

    #[test]
    fn exit_keys() {
        let c = CreditsScreen::new(70.0);
        assert!(c.handle_event(&InputEvent::Esc));
        assert!(c.handle_event(&InputEvent::Click { col: 1, row: 1 }));
        assert!(!c.handle_event(&InputEvent::Char('q')));
    }
}

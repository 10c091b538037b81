/// NullX presentation sequencer.
///
/// Plays a level's script one segment at a time with a typewriter reveal.
/// A click or Enter completes the current segment, the next one advances,
/// ESC ends the whole presentation. The session only cares about when it
/// starts and when it is no longer visible.

use serde::{Deserialize, Serialize};

use crate::domain::dialogue::{script_for, Language, Segment};
use crate::domain::level::LevelId;
use crate::error::GameError;
use crate::sim::event::InputEvent;

#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct PresentationProgress {
    pub level: LevelId,
    pub segment_index: usize,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Advance {
    /// Typing was cut short; the whole segment is now shown.
    Revealed,
    NextSegment,
    Finished,
}

#[derive(Clone, Debug)]
pub struct Presenter {
    pub visible: bool,
    level: Option<LevelId>,
    script: &'static [Segment],
    index: usize,
    revealed: usize,
    timer: f32,
    typing_speed: f32,
    language: Language,
}

impl Presenter {
    pub fn new(typing_speed: f32, language: Language) -> Self {
        Presenter {
            visible: false,
            level: None,
            script: &[],
            index: 0,
            revealed: 0,
            timer: 0.0,
            typing_speed,
            language,
        }
    }

    pub fn set_language(&mut self, language: Language) {
        self.language = language;
    }

    /// Begin the script for `level`. Returns false when the level has none.
    pub fn start(&mut self, level: LevelId) -> bool {
        match script_for(level, self.language) {
            Some(script) if !script.is_empty() => {
                self.level = Some(level);
                self.script = script;
                self.visible = true;
                self.load_segment(0);
                true
            }
            _ => {
                self.finish();
                false
            }
        }
    }

    fn load_segment(&mut self, index: usize) {
        self.index = index;
        self.revealed = 0;
        self.timer = 0.0;
    }

    /// Jump straight to `index` of the running script.
    pub fn fast_forward(&mut self, index: usize) -> Result<(), GameError> {
        let level = self.level.unwrap_or_default();
        if !self.visible || index >= self.script.len() {
            return Err(GameError::SegmentOutOfRange { level, index });
        }
        self.load_segment(index);
        Ok(())
    }

    pub fn finish(&mut self) {
        self.visible = false;
        self.level = None;
        self.script = &[];
        self.load_segment(0);
    }

    fn current_len(&self) -> usize {
        self.current().map_or(0, |s| s.text.chars().count())
    }

    pub fn update(&mut self, dt: f32) {
        if !self.visible {
            return;
        }
        let len = self.current_len();
        if self.typing_speed <= 0.0 {
            self.revealed = len;
            return;
        }
        self.timer += dt;
        while self.timer >= self.typing_speed && self.revealed < len {
            self.revealed += 1;
            self.timer -= self.typing_speed;
        }
    }

    pub fn advance(&mut self) -> Advance {
        if self.is_typing() {
            self.revealed = self.current_len();
            Advance::Revealed
        } else if self.index + 1 < self.script.len() {
            self.load_segment(self.index + 1);
            Advance::NextSegment
        } else {
            self.finish();
            Advance::Finished
        }
    }

    pub fn handle_event(&mut self, event: &InputEvent) -> Option<Advance> {
        if !self.visible {
            return None;
        }
        match event {
            InputEvent::Enter | InputEvent::Char(' ') | InputEvent::Click { .. } => Some(self.advance()),
            InputEvent::Esc => {
                self.finish();
                Some(Advance::Finished)
            }
            _ => None,
        }
    }

    // ── Queries ──

    pub fn current(&self) -> Option<&Segment> {
        self.script.get(self.index)
    }

    pub fn is_typing(&self) -> bool {
        self.visible && self.revealed < self.current_len()
    }

    /// The part of the current segment revealed so far.
    pub fn visible_text(&self) -> &str {
        let Some(seg) = self.current() else { return "" };
        let end = seg
            .text
            .char_indices()
            .nth(self.revealed)
            .map_or(seg.text.len(), |(i, _)| i);
        &seg.text[..end]
    }

    pub fn segment_index(&self) -> usize {
        self.index
    }

    pub fn segment_count(&self) -> usize {
        self.script.len()
    }

    pub fn progress(&self) -> Option<PresentationProgress> {
        match (self.visible, self.level) {
            (true, Some(level)) => Some(PresentationProgress { level, segment_index: self.index }),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn presenter() -> Presenter {
        Presenter::new(0.025, Language::English)
    }

    #[test]
    fn start_without_script_stays_hidden() {
        let mut p = presenter();
        assert!(!p.start(99));
        assert!(!p.visible);
        assert!(p.progress().is_none());
    }

    #[test]
    fn typing_reveals_one_char_per_tick() {
        let mut p = presenter();
        assert!(p.start(1));
        p.update(0.025 * 4.5);
        assert_eq!(p.visible_text().chars().count(), 4);
        assert!(p.is_typing());
    }

    #[test]
    fn click_completes_then_advances_then_finishes() {
        let mut p = presenter();
        p.start(1);
        assert_eq!(p.advance(), Advance::Revealed);
        assert_eq!(p.visible_text(), p.current().unwrap().text);
        assert_eq!(p.advance(), Advance::NextSegment);
        assert_eq!(p.segment_index(), 1);
        for _ in 0..3 {
            p.advance();
            p.advance();
        }
        assert_eq!(p.segment_index(), 4);
        p.advance();
        assert_eq!(p.advance(), Advance::Finished);
        assert!(!p.visible);
    }

    #[test]
    fn esc_finishes_immediately() {
        let mut p = presenter();
        p.start(3);
        assert_eq!(p.handle_event(&InputEvent::Esc), Some(Advance::Finished));
        assert!(!p.visible);
        assert_eq!(p.handle_event(&InputEvent::Enter), None);
    }

    #[test]
    fn fast_forward_lands_on_segment_with_fresh_typing() {
        let mut p = presenter();
        p.start(2);
        p.fast_forward(3).unwrap();
        assert_eq!(p.progress(), Some(PresentationProgress { level: 2, segment_index: 3 }));
        assert_eq!(p.visible_text(), "");
        assert!(p.fast_forward(5).is_err());
    }
}

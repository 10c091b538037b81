/// Main menu and settings menu.
///
/// Both are plain cursor lists: Up/Down move (wrapping), Enter or a click on
/// a row picks, ESC picks the list's escape item. The controller decides
/// what a pick means.

use crate::config::Preferences;
use crate::domain::dialogue::Language;
use crate::sim::event::InputEvent;

pub const TITLE: &str = "NullOS";

/// Cursor over `len` rows.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
struct Cursor {
    selected: usize,
}

impl Cursor {
    fn step(&mut self, len: usize, forward: bool) {
        if len == 0 {
            return;
        }
        self.selected = if forward {
            (self.selected + 1) % len
        } else {
            (self.selected + len - 1) % len
        };
    }

    /// Shared key handling. `clicked` is the row under a click, if any.
    fn handle(&mut self, event: &InputEvent, len: usize, clicked: Option<usize>) -> Option<usize> {
        match event {
            InputEvent::Up => {
                self.step(len, false);
                None
            }
            InputEvent::Down | InputEvent::Tab => {
                self.step(len, true);
                None
            }
            InputEvent::Enter | InputEvent::Char(' ') => Some(self.selected),
            InputEvent::Click { .. } => {
                let row = clicked.filter(|r| *r < len)?;
                self.selected = row;
                Some(row)
            }
            _ => None,
        }
    }
}

// ══════════════════════════════════════════════════════════════
// Main menu
// ══════════════════════════════════════════════════════════════

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum MainItem {
    Play,
    Settings,
    Language,
    Quit,
}

impl MainItem {
    pub const ALL: [MainItem; 4] = [MainItem::Play, MainItem::Settings, MainItem::Language, MainItem::Quit];
}

#[derive(Clone, Debug, Default)]
pub struct MainMenu {
    cursor: Cursor,
}

impl MainMenu {
    pub fn selected(&self) -> usize {
        self.cursor.selected
    }

    pub fn labels(&self, has_snapshot: bool, language: Language) -> Vec<String> {
        MainItem::ALL
            .iter()
            .map(|item| match item {
                MainItem::Play if has_snapshot => "Continue".to_string(),
                MainItem::Play => "Play".to_string(),
                MainItem::Settings => "Settings".to_string(),
                MainItem::Language => format!("Language: {}", language_name(language)),
                MainItem::Quit => "Quit".to_string(),
            })
            .collect()
    }

    pub fn handle_event(&mut self, event: &InputEvent, clicked: Option<usize>) -> Option<MainItem> {
        if *event == InputEvent::Esc {
            return Some(MainItem::Quit);
        }
        self.cursor
            .handle(event, MainItem::ALL.len(), clicked)
            .map(|i| MainItem::ALL[i])
    }
}

fn language_name(language: Language) -> &'static str {
    match language {
        Language::English => "English",
        Language::Arabic => "Arabic",
    }
}

// ══════════════════════════════════════════════════════════════
// Settings menu
// ══════════════════════════════════════════════════════════════

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum SettingsItem {
    Music,
    SoundEffects,
    Back,
}

impl SettingsItem {
    pub const ALL: [SettingsItem; 3] = [SettingsItem::Music, SettingsItem::SoundEffects, SettingsItem::Back];
}

#[derive(Clone, Debug, Default)]
pub struct SettingsMenu {
    cursor: Cursor,
}

impl SettingsMenu {
    pub fn selected(&self) -> usize {
        self.cursor.selected
    }

    pub fn labels(&self, prefs: &Preferences) -> Vec<String> {
        let on_off = |b: bool| if b { "On" } else { "Off" };
        SettingsItem::ALL
            .iter()
            .map(|item| match item {
                SettingsItem::Music => format!("Music: {}", on_off(prefs.music)),
                SettingsItem::SoundEffects => format!("Sound Effects: {}", on_off(prefs.sound_effects)),
                SettingsItem::Back => "Back".to_string(),
            })
            .collect()
    }

    pub fn handle_event(&mut self, event: &InputEvent, clicked: Option<usize>) -> Option<SettingsItem> {
        if *event == InputEvent::Esc {
            return Some(SettingsItem::Back);
        }
        self.cursor
            .handle(event, SettingsItem::ALL.len(), clicked)
            .map(|i| SettingsItem::ALL[i])
    }

    /// Flip the toggle behind `item`. Returns true if a preference changed.
    pub fn apply(item: SettingsItem, prefs: &mut Preferences) -> bool {
        match item {
            SettingsItem::Music => prefs.music = !prefs.music,
            SettingsItem::SoundEffects => prefs.sound_effects = !prefs.sound_effects,
            SettingsItem::Back => return false,
        }
        true
    }
}

// ══════════════════════════════════════════════════════════════
// Tests
// ══════════════════════════════════════════════════════════════

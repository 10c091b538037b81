/// Session state: the single mutable aggregate owned by the main loop.
///
/// Holds the current level and view mode, the desktop registries, the
/// terminal, popups, presentation progress, the pending transition and the
/// held snapshot. Lifecycle operations take the catalog by reference; the
/// session never stores it.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::TimingConfig;
use crate::domain::catalog::LevelCatalog;
use crate::domain::desktop::{Desktop, Scope};
use crate::domain::dialogue::Language;
use crate::domain::level::{FileAction, LevelId};
use crate::domain::terminal::{ClickScanner, SemanticColor, TerminalBuffer, TerminalSink};
use crate::error::GameError;
use crate::sim::event::GameEvent;
use crate::sim::presenter::Presenter;
use crate::sim::save::{self, Snapshot};
use crate::sim::windows::Popups;

pub const FIRST_LEVEL: LevelId = 1;

const FADE_SECS: f64 = 0.5;

// ══════════════════════════════════════════════════════════════
// View mode
// ══════════════════════════════════════════════════════════════

#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewMode {
    Loading,
    MainMenu,
    Settings,
    NullxPresentation,
    Desktop,
    Transition,
    Credits,
}

impl ViewMode {
    #[cfg(test)]
    pub const ALL: [ViewMode; 7] = [
        ViewMode::Loading,
        ViewMode::MainMenu,
        ViewMode::Settings,
        ViewMode::NullxPresentation,
        ViewMode::Desktop,
        ViewMode::Transition,
        ViewMode::Credits,
    ];

    /// Modes reachable from `self`.
    pub fn successors(self) -> &'static [ViewMode] {
        match self {
            ViewMode::Loading => &[ViewMode::MainMenu],
            ViewMode::MainMenu => &[ViewMode::Settings, ViewMode::NullxPresentation, ViewMode::Desktop],
            ViewMode::Settings => &[ViewMode::MainMenu],
            ViewMode::NullxPresentation => &[ViewMode::Desktop],
            ViewMode::Desktop => &[ViewMode::Transition, ViewMode::MainMenu],
            ViewMode::Transition => &[ViewMode::NullxPresentation, ViewMode::Desktop, ViewMode::Credits],
            ViewMode::Credits => &[],
        }
    }

    pub fn can_enter(self, next: ViewMode) -> bool {
        self == next || self.successors().contains(&next)
    }
}

// ══════════════════════════════════════════════════════════════
// Transition
// ══════════════════════════════════════════════════════════════

#[derive(Clone, PartialEq, Debug)]
pub struct TransitionInfo {
    pub message: String,
    /// Session clock at creation.
    pub started_at: f64,
    pub duration: f32,
    pub next_level_id: Option<LevelId>,
    pub is_cheat_skip: bool,
}

impl TransitionInfo {
    pub fn elapsed(&self, clock: f64) -> f64 {
        (clock - self.started_at).max(0.0)
    }

    /// Overlay opacity: fades in, holds, fades out.
    pub fn alpha(&self, clock: f64) -> f32 {
        let t = self.elapsed(clock);
        let left = self.duration as f64 - t;
        (t / FADE_SECS).min(left / FADE_SECS).clamp(0.0, 1.0) as f32
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum RestoreOutcome {
    Resumed,
    /// Snapshot was unusable; the level restarted from scratch.
    Restarted(LevelId),
}

// ══════════════════════════════════════════════════════════════
// Session
// ══════════════════════════════════════════════════════════════

pub struct SessionState {
    pub current_level_id: LevelId,
    view_mode: ViewMode,
    pub game_started: bool,
    pub pending_level_asset_load: bool,
    pub transition: Option<TransitionInfo>,
    pub desktop: Desktop,
    pub terminal: TerminalBuffer,
    pub popups: Popups,
    pub presenter: Presenter,
    pub saved_state: Option<Snapshot>,
    /// Seconds accumulated from frame deltas.
    pub clock: f64,
    scanner: ClickScanner,
    restoring: bool,
    events: Vec<GameEvent>,
    win_transition_secs: f32,
    wrap_transition_secs: f32,
}

impl SessionState {
    pub fn new(catalog: &dyn LevelCatalog, timing: &TimingConfig, language: Language) -> Self {
        let mut base64 = Vec::new();
        for id in catalog.level_ids() {
            if let Some(level) = catalog.get_level(id) {
                base64.extend(level.clickable_base64.iter().map(|s| (s.clone(), id)));
            }
        }

        SessionState {
            current_level_id: FIRST_LEVEL,
            view_mode: ViewMode::Loading,
            game_started: false,
            pending_level_asset_load: false,
            transition: None,
            desktop: Desktop::new(),
            terminal: TerminalBuffer::new(),
            popups: Popups::default(),
            presenter: Presenter::new(timing.typing_speed, language),
            saved_state: None,
            clock: 0.0,
            scanner: ClickScanner::new(base64),
            restoring: false,
            events: Vec::new(),
            win_transition_secs: timing.win_transition_secs,
            wrap_transition_secs: timing.wrap_transition_secs,
        }
    }

    // ── Mode ──

    pub fn view_mode(&self) -> ViewMode {
        self.view_mode
    }

    pub fn set_mode(&mut self, next: ViewMode) {
        if !self.view_mode.can_enter(next) {
            warn!(from = ?self.view_mode, to = ?next, "unexpected view mode change");
        }
        if self.view_mode != next {
            debug!(from = ?self.view_mode, to = ?next, "view mode");
        }
        self.view_mode = next;
    }

    // ── Output & events ──

    pub fn print(&mut self, raw: &[String], color: SemanticColor) {
        let lines = self.scanner.lines(raw, color, self.current_level_id);
        self.terminal.append(lines);
    }

    pub fn say(&mut self, text: &str, color: SemanticColor) {
        self.print(&[text.to_string()], color);
    }

    pub fn emit(&mut self, event: GameEvent) {
        self.events.push(event);
    }

    pub fn take_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn tick(&mut self, dt: f32) {
        self.clock += dt as f64;
    }

    // ── Level lifecycle ──

    /// New game from the first level, dropping any held snapshot.
    pub fn start_first_level(&mut self, catalog: &dyn LevelCatalog) -> Result<(), GameError> {
        self.saved_state = None;
        self.game_started = true;
        let first = catalog.level_ids().first().copied().unwrap_or(FIRST_LEVEL);
        self.start_new_level(catalog, first)
    }

    pub fn start_new_level(&mut self, catalog: &dyn LevelCatalog, level_id: LevelId) -> Result<(), GameError> {
        if !catalog.contains(level_id) {
            return Err(GameError::LevelNotFound(level_id));
        }
        info!(level = level_id, "starting level");
        self.current_level_id = level_id;
        self.game_started = true;
        self.transition = None;
        self.desktop.clear_temporary();
        self.popups.hide_all();
        self.desktop.ensure_terminal();

        if self.presenter.start(level_id) {
            self.pending_level_asset_load = true;
            self.set_mode(ViewMode::NullxPresentation);
            self.emit(GameEvent::DialogueSegment);
            if !self.restoring {
                self.terminal.clear();
                self.say(&format!("...Initializing Level {level_id} Environment..."), SemanticColor::Hint);
            }
            Ok(())
        } else {
            self.pending_level_asset_load = false;
            self.set_mode(ViewMode::Desktop);
            self.actually_load_desktop_assets(catalog)
        }
    }

    /// Rebuild temporary elements from the level's files and greet the player.
    pub fn actually_load_desktop_assets(&mut self, catalog: &dyn LevelCatalog) -> Result<(), GameError> {
        let level = catalog
            .get_level(self.current_level_id)
            .ok_or(GameError::LevelNotFound(self.current_level_id))?;

        self.desktop.clear_temporary();
        for (name, desc) in &level.desktop_files {
            self.desktop.add(Scope::Temporary, name, desc);
        }

        if !self.restoring {
            if !self.pending_level_asset_load {
                self.terminal.clear();
            }
            self.say(&format!("--- Level {}: {} ---", level.id, level.name), SemanticColor::Success);
            self.say("Objective: Find and submit the flag.", SemanticColor::Hint);
        }
        Ok(())
    }

    /// Presentation ended: load the desktop it was holding back.
    pub fn complete_presentation(&mut self, catalog: &dyn LevelCatalog) -> Result<(), GameError> {
        self.presenter.finish();
        let result = if self.pending_level_asset_load {
            self.actually_load_desktop_assets(catalog)
        } else {
            Ok(())
        };
        self.pending_level_asset_load = false;
        self.set_mode(ViewMode::Desktop);
        result
    }

    // ── Transitions ──

    pub fn begin_transition(&mut self, message: String, duration: f32, next: Option<LevelId>, cheat: bool) {
        self.popups.hide_all();
        self.transition = Some(TransitionInfo {
            message,
            started_at: self.clock,
            duration,
            next_level_id: next,
            is_cheat_skip: cheat,
        });
        self.set_mode(ViewMode::Transition);
    }

    /// Level won: schedule the timed interstitial to the next level or the end.
    pub fn start_level_transition(&mut self, catalog: &dyn LevelCatalog) {
        if self.transition.is_some() || self.view_mode == ViewMode::Transition {
            return;
        }
        let Some(level) = catalog.get_level(self.current_level_id) else { return };

        let next = level.next_level.and_then(|id| catalog.get_level(id));
        let (message, next_id) = match next {
            Some(next) => (format!("{}\n\nLoading: {}...", level.win_message, next.name), Some(next.id)),
            None => (format!("{}\n\nAll levels finished! Congratulations!", level.win_message), None),
        };
        self.begin_transition(message, self.win_transition_secs, next_id, false);
    }

    /// Developer jump to `target`.
    pub fn start_wrap(&mut self, catalog: &dyn LevelCatalog, target: LevelId) {
        let name = catalog.get_level(target).map(|l| l.name.clone()).unwrap_or_default();
        self.begin_transition(
            format!("Wrap drive activated!\nLoading: {name}..."),
            self.wrap_transition_secs,
            Some(target),
            true,
        );
    }

    /// Finish an elapsed transition. Returns true when the game reached the credits.
    pub fn update_transition(&mut self, catalog: &dyn LevelCatalog) -> Result<bool, GameError> {
        let Some(info) = &self.transition else { return Ok(false) };
        if info.elapsed(self.clock) <= info.duration as f64 {
            return Ok(false);
        }
        let Some(info) = self.transition.take() else { return Ok(false) };

        match info.next_level_id {
            Some(next) if info.is_cheat_skip || catalog.contains(next) => {
                self.start_new_level(catalog, next)?;
                Ok(false)
            }
            None if !info.is_cheat_skip => {
                self.set_mode(ViewMode::Credits);
                Ok(true)
            }
            _ => {
                self.set_mode(ViewMode::Desktop);
                Ok(false)
            }
        }
    }

    // ── Desktop interaction ──

    pub fn handle_desktop_click(&mut self, catalog: &dyn LevelCatalog, name: &str) {
        let Some(element) = self.desktop.get(name).cloned() else { return };

        let is_archive = catalog
            .get_level(self.current_level_id)
            .map_or(false, |l| l.is_archive(name));
        if is_archive {
            self.popups.password.show(name);
            self.terminal.show();
            self.say("Password prompt opened.", SemanticColor::Hint);
            return;
        }

        if !element.clickable {
            self.terminal.show();
            self.say(&format!("'{name}' is not interactive."), SemanticColor::Hint);
            return;
        }

        if element.action == Some(FileAction::ShowTerminal) {
            self.terminal.show();
        } else if let Some(path) = &element.target_image {
            self.popups.image.show(path);
        } else if let Some(text) = &element.target_text {
            self.popups.text.show(name, text);
        } else {
            self.terminal.show();
            self.say(
                &format!("Double-clicking '{name}' does not perform any specific action."),
                SemanticColor::Hint,
            );
        }
    }

    // ── Snapshot ──

    /// Take a snapshot of the session and hold it. Returns its encoded form.
    /// On failure nothing is held.
    pub fn save_state(&mut self, catalog: &dyn LevelCatalog) -> Result<String, GameError> {
        self.saved_state = None;
        if !catalog.contains(self.current_level_id) {
            return Err(GameError::LevelNotFound(self.current_level_id));
        }
        let snapshot = save::capture(self);
        let encoded = save::encode(&snapshot)?;
        info!(level = self.current_level_id, "session saved");
        self.saved_state = Some(snapshot);
        Ok(encoded)
    }

    /// Consume the held snapshot. An unusable snapshot restarts its level.
    pub fn restore_state(&mut self, catalog: &dyn LevelCatalog) -> Result<RestoreOutcome, GameError> {
        let snapshot = self.saved_state.take().ok_or(GameError::NoSnapshot)?;

        self.restoring = true;
        let applied = save::apply(self, catalog, &snapshot);
        self.restoring = false;

        match applied {
            Ok(()) => {
                info!(level = snapshot.level_id, "session restored");
                Ok(RestoreOutcome::Resumed)
            }
            Err(e) => {
                warn!(error = %e, "restore failed, restarting level");
                let fallback = if catalog.contains(snapshot.level_id) {
                    snapshot.level_id
                } else {
                    catalog.level_ids().first().copied().unwrap_or(FIRST_LEVEL)
                };
                self.start_new_level(catalog, fallback)?;
                Ok(RestoreOutcome::Restarted(fallback))
            }
        }
    }

    pub(crate) fn restore_mode(&mut self, mode: ViewMode) {
        self.view_mode = mode;
    }
}

// ══════════════════════════════════════════════════════════════
// Tests
// ══════════════════════════════════════════════════════════════

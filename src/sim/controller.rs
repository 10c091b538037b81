/// Top-level view-mode controller.
///
/// Owns the session, the catalog and the menus, routes every input event to
/// the subsystem that is active in the current view mode, advances timers in
/// `update`, and describes what to draw as an ordered list of layers.

use std::path::PathBuf;

use tracing::{error, info, warn};

use crate::config::{self, GameConfig, Preferences};
use crate::domain::catalog::{self, LevelCatalog};
use crate::error::GameError;
use crate::sim::command::{CommandInterpreter, Flow};
use crate::sim::credits::CreditsScreen;
use crate::sim::event::{GameEvent, InputEvent};
use crate::sim::layout::{self, Viewport};
use crate::sim::menu::{MainItem, MainMenu, SettingsItem, SettingsMenu};
use crate::sim::presenter::Advance;
use crate::sim::save;
use crate::sim::session::{RestoreOutcome, SessionState, ViewMode};
use crate::sim::windows::{PasswordAction, Popup};

/// Rows moved by one mouse-wheel notch in the terminal.
const WHEEL_ROWS: isize = 3;

/// What to draw, back to front.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Layer {
    Background,
    /// Icons and taskbar.
    Desktop,
    Terminal,
    Window(Popup),
    Presentation,
    TransitionOverlay,
    MainMenu,
    SettingsMenu,
    Credits,
}

pub struct ViewModeController {
    pub session: SessionState,
    catalog: Box<dyn LevelCatalog>,
    interpreter: CommandInterpreter,
    pub main_menu: MainMenu,
    pub settings_menu: SettingsMenu,
    pub credits: CreditsScreen,
    pub prefs: Preferences,
    /// Where `save.toml` and `preferences.toml` live; `None` keeps everything in memory.
    save_dir: Option<PathBuf>,
    viewport: Viewport,
    selected_icon: usize,
    quit: bool,
}

impl ViewModeController {
    pub fn new(
        catalog: Box<dyn LevelCatalog>,
        config: &GameConfig,
        save_dir: Option<PathBuf>,
    ) -> Result<Self, GameError> {
        catalog::validate(catalog.as_ref())?;
        let mut session = SessionState::new(catalog.as_ref(), &config.timing, config.language);
        if let Some(dir) = save_dir.as_deref().filter(|d| save::has_save(d)) {
            session.saved_state = save::load_save(dir);
            if session.saved_state.is_some() {
                info!(dir = %dir.display(), "found saved session");
            }
        }

        Ok(ViewModeController {
            session,
            catalog,
            interpreter: CommandInterpreter::new(),
            main_menu: MainMenu::default(),
            settings_menu: SettingsMenu::default(),
            credits: CreditsScreen::new(config.timing.credits_scroll_speed),
            prefs: config.preferences(),
            save_dir,
            viewport: Viewport::default(),
            selected_icon: 0,
            quit: false,
        })
    }

    pub fn catalog(&self) -> &dyn LevelCatalog {
        self.catalog.as_ref()
    }

    pub fn mode(&self) -> ViewMode {
        self.session.view_mode()
    }

    pub fn should_quit(&self) -> bool {
        self.quit
    }

    pub fn take_events(&mut self) -> Vec<GameEvent> {
        self.session.take_events()
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn set_viewport(&mut self, width: u16, height: u16) {
        self.viewport = Viewport { width, height };
        self.layout_desktop();
    }

    /// Keyboard-selected desktop icon, if the selection is on screen.
    pub fn selected_icon(&self) -> Option<&str> {
        self.session
            .desktop
            .elements()
            .nth(self.selected_icon)
            .map(|e| e.name.as_str())
    }

    // ══════════════════════════════════════════════════════════════
    // Input routing
    // ══════════════════════════════════════════════════════════════

    /// Hand `event` to the active subsystem. Returns true if it was used.
    pub fn route_event(&mut self, event: InputEvent) -> bool {
        match self.session.view_mode() {
            ViewMode::Loading => false,
            ViewMode::MainMenu => self.main_menu_event(&event),
            ViewMode::Settings => self.settings_event(&event),
            ViewMode::NullxPresentation => {
                if let Some(Advance::NextSegment) = self.session.presenter.handle_event(&event) {
                    self.session.emit(GameEvent::DialogueSegment);
                }
                true
            }
            ViewMode::Desktop => self.desktop_event(&event),
            ViewMode::Transition => {
                if event == InputEvent::Esc {
                    info!("quit during transition");
                    self.quit = true;
                }
                true
            }
            ViewMode::Credits => {
                if self.credits.handle_event(&event) {
                    self.quit = true;
                }
                true
            }
        }
    }

    fn main_menu_event(&mut self, event: &InputEvent) -> bool {
        let clicked = self.menu_click(event, MainItem::ALL.len());
        let Some(item) = self.main_menu.handle_event(event, clicked) else {
            return !matches!(event, InputEvent::Click { .. });
        };
        self.session.emit(GameEvent::MenuSelect);
        match item {
            MainItem::Play => self.play(),
            MainItem::Settings => self.session.set_mode(ViewMode::Settings),
            MainItem::Language => {
                let language = self.prefs.language().toggled();
                self.prefs.language = language.code().to_string();
                self.session.presenter.set_language(language);
                info!(code = language.code(), "presentation language");
                self.store_preferences();
            }
            MainItem::Quit => self.quit = true,
        }
        true
    }

    fn settings_event(&mut self, event: &InputEvent) -> bool {
        let clicked = self.menu_click(event, SettingsItem::ALL.len());
        let Some(item) = self.settings_menu.handle_event(event, clicked) else {
            return !matches!(event, InputEvent::Click { .. });
        };
        self.session.emit(GameEvent::MenuSelect);
        if SettingsMenu::apply(item, &mut self.prefs) {
            self.store_preferences();
        } else {
            self.session.set_mode(ViewMode::MainMenu);
        }
        true
    }

    fn menu_click(&self, event: &InputEvent, count: usize) -> Option<usize> {
        match event {
            InputEvent::Click { col, row } => layout::menu_hit(self.viewport, count, *col, *row),
            _ => None,
        }
    }

    fn desktop_event(&mut self, event: &InputEvent) -> bool {
        if *event == InputEvent::Function(1) {
            if self.session.terminal.visible {
                self.session.terminal.hide();
            } else {
                self.session.terminal.show();
            }
            return true;
        }

        match self.session.popups.topmost() {
            Some(Popup::Password) => {
                if let PasswordAction::Submit(password) = self.session.popups.password.handle_event(event) {
                    self.interpreter
                        .attempt_unzip(&mut self.session, self.catalog.as_ref(), &password);
                }
                return true;
            }
            Some(Popup::Image) => {
                if matches!(event, InputEvent::Esc | InputEvent::Enter | InputEvent::Click { .. }) {
                    self.session.popups.image.hide();
                }
                return true;
            }
            Some(Popup::Text) => {
                if let InputEvent::Click { col, row } = event {
                    if !layout::popup_rect(self.viewport).contains(*col, *row) {
                        self.session.popups.text.hide();
                    }
                    return true;
                }
                return self.session.popups.text.handle_event(event);
            }
            None => {}
        }

        match event {
            InputEvent::Esc => {
                if self.session.terminal.visible {
                    self.session.terminal.hide();
                } else {
                    self.pause_to_menu();
                }
                true
            }
            InputEvent::Click { col, row } => self.desktop_click(*col, *row),
            _ if self.session.terminal.visible => self.terminal_event(event),
            _ => self.icon_key(event),
        }
    }

    fn desktop_click(&mut self, col: u16, row: u16) -> bool {
        if self.session.terminal.visible && layout::terminal_rect(self.viewport).contains(col, row) {
            return true;
        }
        self.layout_desktop();
        let Some(name) = self.session.desktop.hit_test(col, row).map(str::to_string) else {
            return false;
        };
        if let Some(i) = self.session.desktop.elements().position(|e| e.name == name) {
            self.selected_icon = i;
        }
        self.session.handle_desktop_click(self.catalog.as_ref(), &name);
        true
    }

    fn icon_key(&mut self, event: &InputEvent) -> bool {
        let count = self.session.desktop.elements().count();
        if count == 0 {
            return false;
        }
        match event {
            InputEvent::Left => self.selected_icon = (self.selected_icon + count - 1) % count,
            InputEvent::Right | InputEvent::Tab => self.selected_icon = (self.selected_icon + 1) % count,
            InputEvent::Enter => {
                self.selected_icon = self.selected_icon.min(count - 1);
                if let Some(name) = self.selected_icon().map(str::to_string) {
                    self.session.handle_desktop_click(self.catalog.as_ref(), &name);
                }
            }
            _ => return false,
        }
        true
    }

    fn terminal_event(&mut self, event: &InputEvent) -> bool {
        let rows = layout::terminal_view_rows(self.viewport);
        let term = &mut self.session.terminal;
        match event {
            InputEvent::Char(c) => term.insert_char(*c),
            InputEvent::Paste(text) => term.insert_str(text),
            InputEvent::Backspace => term.backspace(),
            InputEvent::Delete => term.delete(),
            InputEvent::Left => term.move_left(),
            InputEvent::Right => term.move_right(),
            InputEvent::Home => term.move_home(),
            InputEvent::End => term.move_end(),
            InputEvent::Up => term.history_prev(),
            InputEvent::Down => term.history_next(),
            InputEvent::PageUp => term.scroll(rows as isize, rows),
            InputEvent::PageDown => term.scroll(-(rows as isize), rows),
            InputEvent::ScrollUp => term.scroll(WHEEL_ROWS, rows),
            InputEvent::ScrollDown => term.scroll(-WHEEL_ROWS, rows),
            InputEvent::Tab => {
                let Some(span) = term.latest_clickable().cloned() else { return true };
                let flow = self
                    .interpreter
                    .activate_span(&mut self.session, self.catalog.as_ref(), &span);
                self.apply_flow(flow);
            }
            InputEvent::Enter => {
                let line = term.submit_line();
                let flow = self
                    .interpreter
                    .execute(&mut self.session, self.catalog.as_ref(), &line);
                self.apply_flow(flow);
            }
            _ => return false,
        }
        true
    }

    fn apply_flow(&mut self, flow: Flow) {
        if flow == Flow::Quit {
            info!("exit command");
            self.quit = true;
        }
    }

    // ══════════════════════════════════════════════════════════════
    // Mode changes
    // ══════════════════════════════════════════════════════════════

    /// Main menu "Play": resume the held snapshot or start a new game.
    pub fn play(&mut self) {
        let result = if self.session.saved_state.is_some() {
            self.session.restore_state(self.catalog.as_ref()).map(|outcome| {
                if let RestoreOutcome::Restarted(level) = outcome {
                    warn!(level, "saved session unusable, level restarted");
                }
            })
        } else {
            self.session.start_first_level(self.catalog.as_ref())
        };
        if let Err(e) = result {
            error!(error = %e, "could not start the game");
            self.session.restore_mode(ViewMode::MainMenu);
        }
        self.selected_icon = 0;
        self.layout_desktop();
    }

    /// ESC on a bare desktop: snapshot the session and go back to the menu.
    pub fn pause_to_menu(&mut self) {
        match self.session.save_state(self.catalog.as_ref()) {
            Ok(encoded) => {
                if let Some(dir) = &self.save_dir {
                    if let Err(e) = save::write_save(dir, &encoded) {
                        warn!(error = %e, "could not write save file");
                    }
                }
            }
            Err(e) => warn!(error = %e, "could not save session"),
        }
        self.session.set_mode(ViewMode::MainMenu);
    }

    fn store_preferences(&self) {
        let Some(dir) = &self.save_dir else { return };
        if let Err(e) = config::save_preferences(dir, &self.prefs) {
            warn!(error = %e, "could not write preferences");
        }
    }

    fn layout_desktop(&mut self) {
        let area = layout::desktop_area(self.viewport);
        self.session.desktop.layout(area.x, area.y, area.w);
    }

    // ══════════════════════════════════════════════════════════════
    // Per-frame update
    // ══════════════════════════════════════════════════════════════

    pub fn update(&mut self, dt: f32) {
        self.session.tick(dt);
        match self.session.view_mode() {
            ViewMode::Loading => self.session.set_mode(ViewMode::MainMenu),
            ViewMode::NullxPresentation => {
                self.session.presenter.update(dt);
                if !self.session.presenter.visible {
                    if let Err(e) = self.session.complete_presentation(self.catalog.as_ref()) {
                        error!(error = %e, "could not load level desktop");
                    }
                    self.selected_icon = 0;
                }
            }
            ViewMode::Transition => match self.session.update_transition(self.catalog.as_ref()) {
                Ok(true) => {
                    info!("all levels finished");
                    self.credits.restart();
                    if let Some(dir) = &self.save_dir {
                        save::delete_save(dir);
                    }
                }
                Ok(false) => {}
                Err(e) => {
                    error!(error = %e, "transition target unavailable");
                    self.session.transition = None;
                    self.session.restore_mode(ViewMode::MainMenu);
                }
            },
            ViewMode::Credits => self.credits.update(dt),
            ViewMode::MainMenu | ViewMode::Settings | ViewMode::Desktop => {}
        }
        if self.session.view_mode() == ViewMode::Desktop {
            self.layout_desktop();
        }
    }

    // ══════════════════════════════════════════════════════════════
    // Draw plan
    // ══════════════════════════════════════════════════════════════

    /// Layers for this frame in z-order:
    /// background, desktop, windows, modal overlay, menu.
    pub fn draw_plan(&self) -> Vec<Layer> {
        let mut layers = vec![Layer::Background];
        match self.session.view_mode() {
            ViewMode::Loading => {}
            ViewMode::MainMenu => layers.push(Layer::MainMenu),
            ViewMode::Settings => layers.push(Layer::SettingsMenu),
            ViewMode::NullxPresentation => layers.push(Layer::Presentation),
            ViewMode::Desktop => {
                layers.push(Layer::Desktop);
                self.push_windows(&mut layers);
            }
            ViewMode::Transition => {
                layers.push(Layer::Desktop);
                layers.push(Layer::TransitionOverlay);
            }
            ViewMode::Credits => return vec![Layer::Credits],
        }
        layers
    }

    fn push_windows(&self, layers: &mut Vec<Layer>) {
        let popups = &self.session.popups;
        if self.session.terminal.visible {
            layers.push(Layer::Terminal);
        }
        if popups.text.visible {
            layers.push(Layer::Window(Popup::Text));
        }
        if popups.image.visible {
            layers.push(Layer::Window(Popup::Image));
        }
        if popups.password.visible {
            layers.push(Layer::Window(Popup::Password));
        }
    }
}

// ══════════════════════════════════════════════════════════════
// Tests
// ══════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TimingConfig;
    use crate::domain::catalog::BuiltinCatalog;
    use crate::domain::dialogue::Language;
    use crate::domain::desktop::TERMINAL_ELEMENT;
    use crate::domain::level::LevelDescriptor;

    fn config() -> GameConfig {
        GameConfig {
            timing: TimingConfig { typing_speed: 0.0, ..TimingConfig::default() },
            ..GameConfig::default()
        }
    }

    fn controller() -> ViewModeController {
        let mut c = ViewModeController::new(Box::new(BuiltinCatalog::new()), &config(), None).unwrap();
        c.update(0.016);
        c
    }

    fn typed(c: &mut ViewModeController, line: &str) {
        for ch in line.chars() {
            c.route_event(InputEvent::Char(ch));
        }
        c.route_event(InputEvent::Enter);
    }

    fn texts(c: &ViewModeController) -> Vec<String> {
        c.session.terminal.lines().iter().map(|l| l.text.clone()).collect()
    }

    /// Start a new game and skip the level 1 presentation.
    fn on_desktop() -> ViewModeController {
        let mut c = controller();
        c.route_event(InputEvent::Enter);
        assert_eq!(c.mode(), ViewMode::NullxPresentation);
        c.route_event(InputEvent::Esc);
        c.update(0.016);
        assert_eq!(c.mode(), ViewMode::Desktop);
        c
    }

    #[test]
    fn loading_moves_to_main_menu() {
        let mut c = ViewModeController::new(Box::new(BuiltinCatalog::new()), &config(), None).unwrap();
        assert_eq!(c.mode(), ViewMode::Loading);
        assert!(!c.route_event(InputEvent::Enter));
        c.update(0.0);
        assert_eq!(c.mode(), ViewMode::MainMenu);
        assert_eq!(c.draw_plan(), vec![Layer::Background, Layer::MainMenu]);
    }

    #[test]
    fn broken_catalog_is_rejected() {
        let broken = BuiltinCatalog::from_levels(vec![LevelDescriptor::new(1, "One", "FLAG{a}").next(9)]);
        let err = ViewModeController::new(Box::new(broken), &config(), None).err();
        assert!(matches!(err, Some(GameError::BrokenChain { from: 1, to: 9 })));
    }

    #[test]
    fn play_runs_presentation_then_desktop() {
        let mut c = controller();
        c.route_event(InputEvent::Enter);
        assert_eq!(c.mode(), ViewMode::NullxPresentation);
        assert!(c.session.pending_level_asset_load);
        assert_eq!(c.draw_plan(), vec![Layer::Background, Layer::Presentation]);

        let events = c.take_events();
        assert!(events.contains(&GameEvent::MenuSelect));
        assert!(events.contains(&GameEvent::DialogueSegment));

        // Typing speed is zero: each Enter advances one segment.
        c.update(0.016);
        c.route_event(InputEvent::Enter);
        assert_eq!(c.session.presenter.segment_index(), 1);
        assert_eq!(c.take_events(), vec![GameEvent::DialogueSegment]);

        c.route_event(InputEvent::Esc);
        c.update(0.016);
        assert_eq!(c.mode(), ViewMode::Desktop);
        assert!(!c.session.pending_level_asset_load);
        assert!(c.session.desktop.has_temporary("image.jpg"));
    }

    #[test]
    fn f1_toggles_terminal_and_layers_follow() {
        let mut c = on_desktop();
        assert!(!c.session.terminal.visible);
        assert_eq!(c.draw_plan(), vec![Layer::Background, Layer::Desktop]);
        c.route_event(InputEvent::Function(1));
        assert!(c.session.terminal.visible);
        assert_eq!(c.draw_plan(), vec![Layer::Background, Layer::Desktop, Layer::Terminal]);
        c.route_event(InputEvent::Function(1));
        assert!(!c.session.terminal.visible);
    }

    #[test]
    fn typed_submit_wins_and_reaches_next_level() {
        let mut c = on_desktop();
        c.route_event(InputEvent::Function(1));
        typed(&mut c, "submit FLAG{hidden_in_metadata}");
        assert_eq!(c.mode(), ViewMode::Transition);
        assert_eq!(c.draw_plan(), vec![Layer::Background, Layer::Desktop, Layer::TransitionOverlay]);
        assert!(c.take_events().contains(&GameEvent::LevelWon));

        c.update(3.5);
        assert_eq!(c.session.current_level_id, 2);
        assert_eq!(c.mode(), ViewMode::NullxPresentation);
    }

    #[test]
    fn exit_command_raises_quit() {
        let mut c = on_desktop();
        c.route_event(InputEvent::Function(1));
        typed(&mut c, "exit");
        assert!(c.should_quit());
    }

    #[test]
    fn esc_closes_terminal_then_pauses_to_menu() {
        let mut c = on_desktop();
        c.route_event(InputEvent::Function(1));
        typed(&mut c, "ls");
        c.route_event(InputEvent::Esc);
        assert_eq!(c.mode(), ViewMode::Desktop);
        assert!(!c.session.terminal.visible);

        c.route_event(InputEvent::Esc);
        assert_eq!(c.mode(), ViewMode::MainMenu);
        assert!(c.session.saved_state.is_some());
        assert_eq!(c.main_menu.labels(true, Language::English)[0], "Continue");

        c.route_event(InputEvent::Enter);
        assert_eq!(c.mode(), ViewMode::Desktop);
        assert!(c.session.saved_state.is_none());
        assert!(texts(&c).iter().any(|t| t.ends_with("ls")));
    }

    #[test]
    fn pause_writes_save_file_and_new_controller_continues() {
        let dir = tempfile::tempdir().unwrap();
        let mut c = ViewModeController::new(
            Box::new(BuiltinCatalog::new()),
            &config(),
            Some(dir.path().to_path_buf()),
        )
        .unwrap();
        c.update(0.016);
        c.route_event(InputEvent::Enter);
        c.route_event(InputEvent::Esc);
        c.update(0.016);
        c.route_event(InputEvent::Esc);
        assert!(save::has_save(dir.path()));

        let mut again = ViewModeController::new(
            Box::new(BuiltinCatalog::new()),
            &config(),
            Some(dir.path().to_path_buf()),
        )
        .unwrap();
        assert!(again.session.saved_state.is_some());
        again.update(0.016);
        again.route_event(InputEvent::Enter);
        assert_eq!(again.mode(), ViewMode::Desktop);
        assert_eq!(again.session.current_level_id, 1);
    }

    #[test]
    fn password_window_takes_input_before_terminal() {
        let mut c = on_desktop();
        c.session.start_new_level(c.catalog.as_ref(), 5).unwrap();
        c.route_event(InputEvent::Esc);
        c.update(0.016);
        c.session.handle_desktop_click(c.catalog.as_ref(), "encrypted.zip");
        assert_eq!(c.session.popups.topmost(), Some(Popup::Password));
        assert_eq!(c.draw_plan().last(), Some(&Layer::Window(Popup::Password)));

        for ch in "SuperSecretPW123".chars() {
            c.route_event(InputEvent::Char(ch));
        }
        assert_eq!(c.session.terminal.input(), "");
        c.route_event(InputEvent::Enter);
        assert!(!c.session.popups.password.visible);
        assert!(c.session.desktop.has_temporary("secret.png"));
        assert!(texts(&c).iter().any(|t| t == "Unzip successful!"));
    }

    #[test]
    fn image_window_closes_on_esc_without_pausing() {
        let mut c = on_desktop();
        c.session.handle_desktop_click(c.catalog.as_ref(), "image.jpg");
        assert_eq!(c.session.popups.topmost(), Some(Popup::Image));
        c.route_event(InputEvent::Esc);
        assert!(c.session.popups.topmost().is_none());
        assert_eq!(c.mode(), ViewMode::Desktop);
    }

    #[test]
    fn keyboard_icon_selection_opens_files() {
        let mut c = on_desktop();
        assert_eq!(c.selected_icon(), Some(TERMINAL_ELEMENT));
        c.route_event(InputEvent::Right);
        assert_eq!(c.selected_icon(), Some("image.jpg"));
        c.route_event(InputEvent::Left);
        c.route_event(InputEvent::Left);
        assert_eq!(c.selected_icon(), Some("notes.txt"));
        c.route_event(InputEvent::Enter);
        assert_eq!(c.session.popups.topmost(), Some(Popup::Text));
        assert_eq!(c.session.popups.text.title, "notes.txt");
    }

    #[test]
    fn mouse_click_hits_icon() {
        let mut c = on_desktop();
        c.set_viewport(100, 30);
        let rect = c.session.desktop.get("image.jpg").and_then(|e| e.rect).unwrap();
        assert!(c.route_event(InputEvent::Click { col: rect.x, row: rect.y }));
        assert_eq!(c.session.popups.topmost(), Some(Popup::Image));
        c.route_event(InputEvent::Click { col: 0, row: 0 });
        assert!(c.session.popups.topmost().is_none());
    }

    #[test]
    fn tab_activates_latest_flag_span() {
        let mut c = on_desktop();
        c.route_event(InputEvent::Function(1));
        typed(&mut c, "exif image.jpg");
        c.route_event(InputEvent::Tab);
        assert_eq!(c.mode(), ViewMode::Transition);
    }

    #[test]
    fn settings_toggle_and_back() {
        let mut c = controller();
        c.route_event(InputEvent::Down);
        c.route_event(InputEvent::Enter);
        assert_eq!(c.mode(), ViewMode::Settings);
        c.route_event(InputEvent::Enter);
        assert!(!c.prefs.music);
        c.route_event(InputEvent::Esc);
        assert_eq!(c.mode(), ViewMode::MainMenu);
    }

    #[test]
    fn language_toggle_updates_preferences() {
        let mut c = controller();
        c.route_event(InputEvent::Down);
        c.route_event(InputEvent::Down);
        c.route_event(InputEvent::Enter);
        assert_eq!(c.prefs.language(), Language::Arabic);
        assert_eq!(c.mode(), ViewMode::MainMenu);

        c.route_event(InputEvent::Up);
        c.route_event(InputEvent::Up);
        c.route_event(InputEvent::Enter);
        assert_eq!(c.mode(), ViewMode::NullxPresentation);
        let arabic = crate::domain::dialogue::script_for(1, Language::Arabic).unwrap();
        assert_eq!(c.session.presenter.current().map(|s| s.text), Some(arabic[0].text));
    }

    #[test]
    fn esc_at_main_menu_quits() {
        let mut c = controller();
        c.route_event(InputEvent::Esc);
        assert!(c.should_quit());
    }

    #[test]
    fn last_level_win_rolls_credits() {
        let mut c = on_desktop();
        c.session.start_new_level(c.catalog.as_ref(), 5).unwrap();
        c.route_event(InputEvent::Esc);
        c.update(0.016);
        c.route_event(InputEvent::Function(1));
        typed(&mut c, "submit FLAG{git_history_reveals_truth}");
        assert!(c.take_events().contains(&GameEvent::GameFinished));
        c.update(3.5);
        assert_eq!(c.mode(), ViewMode::Credits);
        assert_eq!(c.draw_plan(), vec![Layer::Credits]);
        c.route_event(InputEvent::Char('x'));
        assert!(!c.should_quit());
        c.route_event(InputEvent::Esc);
        assert!(c.should_quit());
    }

    #[test]
    fn esc_during_transition_quits() {
        let mut c = on_desktop();
        c.route_event(InputEvent::Function(1));
        typed(&mut c, "wrap 3");
        assert_eq!(c.mode(), ViewMode::Transition);
        c.route_event(InputEvent::Esc);
        assert!(c.should_quit());
    }
}

/// Session snapshots: pause-and-resume state, in memory and on disk.
///
/// ## What a snapshot holds
///
///   Level id, view mode, the terminal (lines, scroll, input, cursor,
///   history, visibility), the three popup windows, the permanent and
///   temporary desktop elements reduced to `ElementSpec`s, and the
///   presentation progress if a presentation was running.
///
/// ## File format
///
///   TOML via serde. ESC from the desktop writes `save.toml`; the next start
///   loads it so the main menu can offer Continue. Finishing the game
///   deletes it.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::domain::catalog::LevelCatalog;
use crate::domain::desktop::{DesktopElement, ElementSpec, TERMINAL_ELEMENT};
use crate::domain::level::LevelId;
use crate::domain::terminal::TerminalState;
use crate::error::GameError;
use crate::sim::event::GameEvent;
use crate::sim::presenter::PresentationProgress;
use crate::sim::session::{SessionState, ViewMode};
use crate::sim::windows::{ImageWindow, PasswordWindow, TextWindow};

// ══════════════════════════════════════════════════════════════
// Snapshot
// ══════════════════════════════════════════════════════════════

#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct Snapshot {
    pub level_id: LevelId,
    pub view_mode: ViewMode,
    pub terminal: TerminalState,
    pub image_window: ImageWindow,
    pub text_window: TextWindow,
    pub password_window: PasswordWindow,
    #[serde(default)]
    pub permanent: BTreeMap<String, ElementSpec>,
    #[serde(default)]
    pub temporary: BTreeMap<String, ElementSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub presentation: Option<PresentationProgress>,
}

/// Deep copy of the live session. Shares nothing with it.
pub fn capture(s: &SessionState) -> Snapshot {
    let specs = |map: &BTreeMap<String, DesktopElement>| {
        map.iter()
            .map(|(name, e)| (name.clone(), e.spec()))
            .collect::<BTreeMap<_, _>>()
    };

    Snapshot {
        level_id: s.current_level_id,
        view_mode: s.view_mode(),
        terminal: s.terminal.state(),
        image_window: s.popups.image.clone(),
        text_window: s.popups.text.clone(),
        password_window: s.popups.password.clone(),
        permanent: specs(&s.desktop.permanent),
        temporary: specs(&s.desktop.temporary),
        presentation: s.presenter.progress(),
    }
}

/// Overwrite the session with a snapshot. Desktop elements are rebuilt
/// through the same icon lookup asset loading uses.
pub fn apply(s: &mut SessionState, catalog: &dyn LevelCatalog, snap: &Snapshot) -> Result<(), GameError> {
    if !catalog.contains(snap.level_id) {
        return Err(GameError::LevelNotFound(snap.level_id));
    }

    s.current_level_id = snap.level_id;
    s.transition = None;
    s.terminal.restore(&snap.terminal);

    s.popups.image = snap.image_window.clone();
    s.popups.text = snap.text_window.clone();
    s.popups.password = snap.password_window.clone();
    s.popups.password.entry.clear();

    s.desktop.clear_all();
    s.desktop.ensure_terminal();
    for (name, spec) in &snap.permanent {
        if name != TERMINAL_ELEMENT {
            s.desktop.permanent.insert(name.clone(), DesktopElement::from_spec(name, spec));
        }
    }
    for (name, spec) in &snap.temporary {
        s.desktop.temporary.insert(name.clone(), DesktopElement::from_spec(name, spec));
    }

    let mut mode = ViewMode::Desktop;
    match snap.presentation {
        Some(progress) if snap.view_mode == ViewMode::NullxPresentation => {
            if s.presenter.start(progress.level) {
                s.presenter.fast_forward(progress.segment_index)?;
                s.emit(GameEvent::DialogueSegment);
                mode = ViewMode::NullxPresentation;
            }
        }
        _ => s.presenter.finish(),
    }

    s.pending_level_asset_load = mode == ViewMode::NullxPresentation;
    s.game_started = true;
    s.restore_mode(mode);
    Ok(())
}

// ══════════════════════════════════════════════════════════════
// Encoding
// ══════════════════════════════════════════════════════════════

pub fn encode(snap: &Snapshot) -> Result<String, GameError> {
    toml::to_string(snap).map_err(|e| GameError::SnapshotEncode(e.to_string()))
}

pub fn decode(text: &str) -> Result<Snapshot, GameError> {
    toml::from_str(text).map_err(|e| GameError::SnapshotDecode(e.to_string()))
}

// ══════════════════════════════════════════════════════════════
// Paths
// ══════════════════════════════════════════════════════════════

pub const SAVE_FILE: &str = "save.toml";

/// Directory for save and preference files. An explicit directory wins.
pub fn save_dir(configured: Option<&Path>) -> PathBuf {
    if let Some(dir) = configured {
        if std::fs::create_dir_all(dir).is_ok() {
            return dir.to_path_buf();
        }
        warn!(dir = %dir.display(), "configured save dir unusable, using default");
    }

    // 1. Exe directory (portable installs)
    if let Ok(exe) = std::env::current_exe() {
        let resolved = exe.canonicalize().unwrap_or(exe);
        if let Some(parent) = resolved.parent() {
            // System installs like /usr/games/ are not writable
            let test_path = parent.join(".write_test_nullos");
            if std::fs::write(&test_path, "").is_ok() {
                let _ = std::fs::remove_file(&test_path);
                return parent.to_path_buf();
            }
        }
    }

    // 2. XDG data home
    if let Ok(home) = std::env::var("HOME") {
        let xdg = PathBuf::from(&home).join(".local/share/nullos");
        if std::fs::create_dir_all(&xdg).is_ok() {
            return xdg;
        }
    }

    // 3. CWD
    std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
}

// ══════════════════════════════════════════════════════════════
// Save file
// ══════════════════════════════════════════════════════════════

pub fn write_save(dir: &Path, encoded: &str) -> Result<(), GameError> {
    std::fs::write(dir.join(SAVE_FILE), encoded)?;
    Ok(())
}

/// Load `save.toml`. A missing file is `None`; a corrupt one is `None` with a warning.
pub fn load_save(dir: &Path) -> Option<Snapshot> {
    let path = dir.join(SAVE_FILE);
    let content = std::fs::read_to_string(&path).ok()?;
    match decode(&content) {
        Ok(snap) => Some(snap),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "ignoring unreadable save file");
            None
        }
    }
}

pub fn has_save(dir: &Path) -> bool {
    dir.join(SAVE_FILE).exists()
}

pub fn delete_save(dir: &Path) {
    let _ = std::fs::remove_file(dir.join(SAVE_FILE));
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
    use crate::domain::terminal::SemanticColor;
    use crate::sim::session::RestoreOutcome;

    fn desktop_session(catalog: &BuiltinCatalog, level: LevelId) -> SessionState {
        let mut s = SessionState::new(catalog, &TimingConfig::default(), Language::English);
        s.start_new_level(catalog, level).unwrap();
        s.complete_presentation(catalog).unwrap();
        s
    }

    #[test]
    fn save_then_restore_is_equivalent() {
        let catalog = BuiltinCatalog::new();
        let mut s = desktop_session(&catalog, 4);
        s.terminal.show();
        s.say("FLAG{hidden_in_the_image}", SemanticColor::Success);
        s.terminal.set_input("extr");
        s.popups.text.show("readme.txt", "body");

        let before = capture(&s);
        s.save_state(&catalog).unwrap();

        s.start_new_level(&catalog, 2).unwrap();
        s.complete_presentation(&catalog).unwrap();
        s.popups.hide_all();

        assert_eq!(s.restore_state(&catalog).unwrap(), RestoreOutcome::Resumed);
        assert!(s.saved_state.is_none());
        assert_eq!(capture(&s), before);
        assert_eq!(s.view_mode(), ViewMode::Desktop);
        assert!(s.terminal.lines().back().unwrap().clickable.is_some());
    }

    #[test]
    fn snapshot_is_single_use() {
        let catalog = BuiltinCatalog::new();
        let mut s = desktop_session(&catalog, 1);
        s.save_state(&catalog).unwrap();
        s.restore_state(&catalog).unwrap();
        assert!(matches!(s.restore_state(&catalog), Err(GameError::NoSnapshot)));
    }

    #[test]
    fn save_with_unknown_level_fails_and_holds_nothing() {
        let catalog = BuiltinCatalog::new();
        let mut s = desktop_session(&catalog, 1);
        s.save_state(&catalog).unwrap();
        s.current_level_id = 77;
        assert!(s.save_state(&catalog).is_err());
        assert!(s.saved_state.is_none());
    }

    #[test]
    fn presentation_progress_is_fast_forwarded() {
        let catalog = BuiltinCatalog::new();
        let mut s = SessionState::new(&catalog, &TimingConfig::default(), Language::English);
        s.start_new_level(&catalog, 3).unwrap();
        s.presenter.advance();
        s.presenter.advance();
        s.presenter.advance();
        s.presenter.advance();
        s.save_state(&catalog).unwrap();

        s.presenter.finish();
        s.restore_state(&catalog).unwrap();
        assert_eq!(s.view_mode(), ViewMode::NullxPresentation);
        assert!(s.pending_level_asset_load);
        assert_eq!(s.presenter.segment_index(), 2);
        assert!(s.presenter.is_typing());
    }

    #[test]
    fn unusable_snapshot_restarts_its_level() {
        let catalog = BuiltinCatalog::new();
        let mut s = desktop_session(&catalog, 4);
        s.save_state(&catalog).unwrap();
        if let Some(snap) = s.saved_state.as_mut() {
            snap.view_mode = ViewMode::NullxPresentation;
            snap.presentation = Some(PresentationProgress { level: 4, segment_index: 99 });
        }
        assert_eq!(s.restore_state(&catalog).unwrap(), RestoreOutcome::Restarted(4));
        assert_eq!(s.current_level_id, 4);
        assert!(s.saved_state.is_none());
    }

    #[test]
    fn restore_rebuilds_terminal_icon_and_created_files() {
        let catalog = BuiltinCatalog::new();
        let mut s = desktop_session(&catalog, 4);
        s.desktop.add(
            crate::domain::desktop::Scope::Temporary,
            "extracted_flag.txt",
            &crate::domain::level::FileDescriptor::text("x"),
        );
        s.save_state(&catalog).unwrap();
        s.desktop.clear_all();
        s.restore_state(&catalog).unwrap();
        assert!(s.desktop.contains(TERMINAL_ELEMENT));
        assert_eq!(s.desktop.get("extracted_flag.txt").unwrap().target_text.as_deref(), Some("x"));
    }

    #[test]
    fn save_file_round_trips_through_toml() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = BuiltinCatalog::new();
        let mut s = desktop_session(&catalog, 5);
        s.popups.password.show("encrypted.zip");
        let encoded = s.save_state(&catalog).unwrap();

        write_save(dir.path(), &encoded).unwrap();
        assert!(has_save(dir.path()));
        let loaded = load_save(dir.path()).unwrap();
        assert_eq!(Some(&loaded), s.saved_state.as_ref());

        delete_save(dir.path());
        assert!(!has_save(dir.path()));
        assert!(load_save(dir.path()).is_none());
    }

    #[test]
    fn corrupt_save_file_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(SAVE_FILE), "level_id = \"nope\"").unwrap();
        assert!(load_save(dir.path()).is_none());
    }

    #[test]
    fn configured_save_dir_is_created() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a/b");
        assert_eq!(save_dir(Some(&nested)), nested);
        assert!(nested.is_dir());
    }
}

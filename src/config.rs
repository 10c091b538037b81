/// External configuration loader.
///
/// Reads `config.toml` from the executable's directory (or CWD).
/// Falls back to sensible defaults if the file is missing or incomplete.
/// Menu choices are kept separately in `preferences.toml` inside the save
/// directory and laid over the file config on start-up.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::domain::dialogue::Language;
use crate::error::GameError;

pub const PREFERENCES_FILE: &str = "preferences.toml";

// ── Public Config Struct ──

#[derive(Clone, Debug)]
pub struct GameConfig {
    pub timing: TimingConfig,
    pub audio: AudioConfig,
    pub language: Language,
    /// Explicit save directory; `None` means the default resolution.
    pub save_dir: Option<PathBuf>,
    pub log_file: PathBuf,
    pub log_filter: String,
}

#[derive(Clone, Debug, PartialEq)]
pub struct TimingConfig {
    pub fps: u32,
    /// Upper bound on a single frame delta, in seconds.
    pub max_dt: f32,
    /// Seconds per revealed dialogue character.
    pub typing_speed: f32,
    pub win_transition_secs: f32,
    pub wrap_transition_secs: f32,
    pub credits_scroll_speed: f32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AudioConfig {
    pub music: bool,
    pub sound_effects: bool,
}

impl Default for TimingConfig {
    fn default() -> Self {
        let t = TomlTiming::default();
        TimingConfig {
            fps: t.fps,
            max_dt: t.max_dt,
            typing_speed: t.typing_speed,
            win_transition_secs: t.win_transition_secs,
            wrap_transition_secs: t.wrap_transition_secs,
            credits_scroll_speed: t.credits_scroll_speed,
        }
    }
}

impl Default for AudioConfig {
    fn default() -> Self {
        AudioConfig { music: default_true(), sound_effects: default_true() }
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        GameConfig::from_toml(TomlConfig::default())
    }
}

// ── TOML Schema (with serde defaults) ──

#[derive(Deserialize, Debug, Default)]
struct TomlConfig {
    #[serde(default)]
    timing: TomlTiming,
    #[serde(default)]
    audio: TomlAudio,
    #[serde(default)]
    general: TomlGeneral,
}

#[derive(Deserialize, Debug)]
struct TomlTiming {
    #[serde(default = "default_fps")]
    fps: u32,
    #[serde(default = "default_max_dt")]
    max_dt: f32,
    #[serde(default = "default_typing_speed")]
    typing_speed: f32,
    #[serde(default = "default_win_transition")]
    win_transition_secs: f32,
    #[serde(default = "default_wrap_transition")]
    wrap_transition_secs: f32,
    #[serde(default = "default_credits_scroll")]
    credits_scroll_speed: f32,
}

#[derive(Deserialize, Debug)]
struct TomlAudio {
    #[serde(default = "default_true")]
    music: bool,
    #[serde(default = "default_true")]
    sound_effects: bool,
}

#[derive(Deserialize, Debug)]
struct TomlGeneral {
    #[serde(default = "default_language")]
    language: String,
    #[serde(default)]
    save_dir: String,
    #[serde(default = "default_log_file")]
    log_file: String,
    #[serde(default = "default_log_filter")]
    log_filter: String,
}

// ── Defaults ──

fn default_fps() -> u32 { 60 }
fn default_max_dt() -> f32 { 0.1 }
fn default_typing_speed() -> f32 { 0.025 }
fn default_win_transition() -> f32 { 3.0 }
fn default_wrap_transition() -> f32 { 1.5 }
fn default_credits_scroll() -> f32 { 70.0 }
fn default_true() -> bool { true }
fn default_language() -> String { "en".into() }
fn default_log_file() -> String { "nullos.log".into() }
fn default_log_filter() -> String { "info".into() }

impl Default for TomlTiming {
    fn default() -> Self {
        TomlTiming {
            fps: default_fps(),
            max_dt: default_max_dt(),
            typing_speed: default_typing_speed(),
            win_transition_secs: default_win_transition(),
            wrap_transition_secs: default_wrap_transition(),
            credits_scroll_speed: default_credits_scroll(),
        }
    }
}

impl Default for TomlAudio {
    fn default() -> Self {
        TomlAudio { music: default_true(), sound_effects: default_true() }
    }
}

impl Default for TomlGeneral {
    fn default() -> Self {
        TomlGeneral {
            language: default_language(),
            save_dir: String::new(),
            log_file: default_log_file(),
            log_filter: default_log_filter(),
        }
    }
}

// ── Preferences ──

/// The settings a player can change from the menus.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Preferences {
    #[serde(default = "default_true")]
    pub music: bool,
    #[serde(default = "default_true")]
    pub sound_effects: bool,
    #[serde(default = "default_language")]
    pub language: String,
}

impl Preferences {
    pub fn language(&self) -> Language {
        parse_language(&self.language)
    }
}

pub fn load_preferences(dir: &Path) -> Option<Preferences> {
    let path = dir.join(PREFERENCES_FILE);
    let text = std::fs::read_to_string(&path).ok()?;
    match toml::from_str(&text) {
        Ok(prefs) => Some(prefs),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "ignoring malformed preferences");
            None
        }
    }
}

pub fn save_preferences(dir: &Path, prefs: &Preferences) -> Result<(), GameError> {
    let text = toml::to_string(prefs).map_err(|e| GameError::PreferencesEncode(e.to_string()))?;
    std::fs::create_dir_all(dir)?;
    std::fs::write(dir.join(PREFERENCES_FILE), text)?;
    Ok(())
}

fn parse_language(code: &str) -> Language {
    Language::from_code(code).unwrap_or_else(|| {
        warn!(code, "unknown language code, using English");
        Language::English
    })
}

// ── Loading ──

impl GameConfig {
    /// Load config from `config.toml`.
    /// Search order: (1) exe directory, (2) current working directory,
    /// (3) `~/.local/share/nullos`.
    /// Missing file or missing keys gracefully fall back to defaults.
    pub fn load() -> Self {
        let search_dirs = candidate_dirs();
        GameConfig::from_toml(load_toml(&search_dirs))
    }

    fn from_toml(cfg: TomlConfig) -> Self {
        let save_dir = match cfg.general.save_dir.trim() {
            "" => None,
            dir => Some(PathBuf::from(dir)),
        };
        GameConfig {
            timing: TimingConfig {
                fps: cfg.timing.fps.max(1),
                max_dt: cfg.timing.max_dt,
                typing_speed: cfg.timing.typing_speed,
                win_transition_secs: cfg.timing.win_transition_secs,
                wrap_transition_secs: cfg.timing.wrap_transition_secs,
                credits_scroll_speed: cfg.timing.credits_scroll_speed,
            },
            audio: AudioConfig {
                music: cfg.audio.music,
                sound_effects: cfg.audio.sound_effects,
            },
            language: parse_language(&cfg.general.language),
            save_dir,
            log_file: PathBuf::from(cfg.general.log_file),
            log_filter: cfg.general.log_filter,
        }
    }

    pub fn preferences(&self) -> Preferences {
        Preferences {
            music: self.audio.music,
            sound_effects: self.audio.sound_effects,
            language: self.language.code().to_string(),
        }
    }

    /// Lay saved menu choices over the file config.
    pub fn apply_preferences(&mut self, prefs: &Preferences) {
        self.audio.music = prefs.music;
        self.audio.sound_effects = prefs.sound_effects;
        self.language = prefs.language();
    }
}

/// Candidate directories to search: exe dir + CWD + user data dir (deduplicated).
fn candidate_dirs() -> Vec<PathBuf> {
    let mut dirs = vec![];

    if let Ok(exe) = std::env::current_exe() {
        let resolved = exe.canonicalize().unwrap_or(exe);
        if let Some(parent) = resolved.parent() {
            dirs.push(parent.to_path_buf());
        }
    }

    if let Ok(cwd) = std::env::current_dir() {
        if !dirs.iter().any(|d| d == &cwd) {
            dirs.push(cwd);
        }
    }

    if let Ok(home) = std::env::var("HOME") {
        let xdg = PathBuf::from(&home).join(".local/share/nullos");
        if xdg.is_dir() && !dirs.iter().any(|d| d == &xdg) {
            dirs.push(xdg);
        }
    }

    if dirs.is_empty() {
        dirs.push(PathBuf::from("."));
    }

    dirs
}

/// Search for config.toml in candidate directories.
fn load_toml(search_dirs: &[PathBuf]) -> TomlConfig {
    for dir in search_dirs {
        let path = dir.join("config.toml");
        if path.exists() {
            match std::fs::read_to_string(&path) {
                Ok(text) => return parse_toml(&text, &path),
                Err(e) => warn!(path = %path.display(), error = %e, "could not read config"),
            }
        }
    }
    TomlConfig::default()
}

fn parse_toml(text: &str, path: &Path) -> TomlConfig {
    toml::from_str::<TomlConfig>(text).unwrap_or_else(|e| {
        warn!(path = %path.display(), error = %e, "config.toml parse error, using defaults");
        TomlConfig::default()
    })
}

// ══════════════════════════════════════════════════════════════
// Tests
// ══════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> GameConfig {
        GameConfig::from_toml(parse_toml(text, Path::new("config.toml")))
    }

    #[test]
    fn empty_file_gives_defaults() {
        let cfg = parse("");
        assert_eq!(cfg.timing, TimingConfig::default());
        assert_eq!(cfg.timing.fps, 60);
        assert_eq!(cfg.timing.win_transition_secs, 3.0);
        assert_eq!(cfg.language, Language::English);
        assert!(cfg.save_dir.is_none());
        assert_eq!(cfg.log_filter, "info");
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let cfg = parse("[timing]\nfps = 30\n\n[audio]\nmusic = false\n\n[general]\nsave_dir = \"/tmp/x\"\n");
        assert_eq!(cfg.timing.fps, 30);
        assert_eq!(cfg.timing.typing_speed, 0.025);
        assert!(!cfg.audio.music);
        assert!(cfg.audio.sound_effects);
        assert_eq!(cfg.save_dir, Some(PathBuf::from("/tmp/x")));
    }

    #[test]
    fn malformed_file_falls_back_to_defaults() {
        let cfg = parse("[timing\nfps = ");
        assert_eq!(cfg.timing, TimingConfig::default());
    }

    #[test]
    fn zero_fps_is_clamped() {
        assert_eq!(parse("[timing]\nfps = 0\n").timing.fps, 1);
    }

    #[test]
    fn unknown_language_means_english() {
        assert_eq!(parse("[general]\nlanguage = \"fr\"\n").language, Language::English);
        assert_eq!(parse("[general]\nlanguage = \"ar\"\n").language, Language::Arabic);
    }

    #[test]
    fn preferences_round_trip_through_the_save_dir() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_preferences(dir.path()).is_none());

        let prefs = Preferences { music: false, sound_effects: true, language: "ar".into() };
        save_preferences(dir.path(), &prefs).unwrap();
        assert_eq!(load_preferences(dir.path()), Some(prefs.clone()));

        let mut cfg = GameConfig::default();
        cfg.apply_preferences(&prefs);
        assert!(!cfg.audio.music);
        assert_eq!(cfg.language, Language::Arabic);
        assert_eq!(cfg.preferences(), prefs);
    }

    #[test]
    fn malformed_preferences_are_ignored() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(PREFERENCES_FILE), "music = ").unwrap();
        assert!(load_preferences(dir.path()).is_none());
    }
}

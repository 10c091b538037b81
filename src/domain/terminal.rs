/// Terminal model: coloured output history, clickable spans, the input line
/// and command history.
///
/// Nothing here knows about pixels or layout. The renderer decides how a
/// `SemanticColor` looks and where a line goes.

use std::collections::VecDeque;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::domain::level::LevelId;

pub const PROMPT: &str = "agent@ctf-os:~$ ";
pub const MAX_OUTPUT_LINES: usize = 500;
pub const MAX_HISTORY: usize = 50;

const FLAG_PATTERN: &str = r"FLAG\{[A-Za-z0-9_@!?-]*\}";

#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SemanticColor {
    Text,
    Success,
    Error,
    Hint,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClickKind {
    Flag,
    /// Base64 string that matters while `level` is active.
    Base64 { level: LevelId },
}

#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct ClickableSpan {
    pub kind: ClickKind,
    pub matched: String,
    pub prefix: String,
    pub suffix: String,
}

#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct TerminalLine {
    pub text: String,
    pub color: SemanticColor,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clickable: Option<ClickableSpan>,
}

impl TerminalLine {
    pub fn plain(text: impl Into<String>, color: SemanticColor) -> Self {
        TerminalLine { text: text.into(), color, clickable: None }
    }
}

// ── Output sink ──

/// Where command results go.
pub trait TerminalSink {
    fn append(&mut self, lines: Vec<TerminalLine>);
}

// ── Clickable span scanning ──

fn flag_regex() -> &'static Regex {
    static FLAG_RE: OnceLock<Regex> = OnceLock::new();
    // FLAG_PATTERN is a literal; the flag-span tests compile it.
    FLAG_RE.get_or_init(|| Regex::new(FLAG_PATTERN).expect("valid flag regex"))
}

/// Finds at most one clickable span per line: a flag-shaped token, or one of
/// the Base64 strings interesting to the active level.
#[derive(Clone, Debug, Default)]
pub struct ClickScanner {
    base64: Vec<(String, LevelId)>,
}

impl ClickScanner {
    pub fn new(base64: Vec<(String, LevelId)>) -> Self {
        ClickScanner { base64 }
    }

    pub fn scan(&self, raw: &str, level: LevelId) -> Option<ClickableSpan> {
        let text = raw.replace('\0', "");

        if let Some(m) = flag_regex().find(&text) {
            return Some(ClickableSpan {
                kind: ClickKind::Flag,
                matched: m.as_str().to_string(),
                prefix: text[..m.start()].to_string(),
                suffix: text[m.end()..].to_string(),
            });
        }

        self.base64
            .iter()
            .filter(|(_, owner)| *owner == level)
            .find_map(|(encoded, owner)| {
                let start = text.find(encoded.as_str())?;
                let end = start + encoded.len();
                Some(ClickableSpan {
                    kind: ClickKind::Base64 { level: *owner },
                    matched: encoded.clone(),
                    prefix: text[..start].to_string(),
                    suffix: text[end..].to_string(),
                })
            })
    }

    /// Turn raw output into terminal lines; embedded newlines split lines.
    pub fn lines(&self, raw: &[String], color: SemanticColor, level: LevelId) -> Vec<TerminalLine> {
        raw.iter()
            .flat_map(|chunk| chunk.split('\n'))
            .map(|text| TerminalLine {
                text: text.to_string(),
                color,
                clickable: self.scan(text, level),
            })
            .collect()
    }
}

// ── Buffer ──

/// Serializable copy of everything the terminal shows or remembers.
#[derive(Clone, PartialEq, Eq, Debug, Default, Serialize, Deserialize)]
pub struct TerminalState {
    pub lines: Vec<TerminalLine>,
    pub scroll_offset: usize,
    pub input: String,
    pub cursor: usize,
    pub history: Vec<String>,
    pub visible: bool,
}

#[derive(Clone, Debug, Default)]
pub struct TerminalBuffer {
    lines: VecDeque<TerminalLine>,
    /// Lines scrolled up from the bottom; 0 follows new output.
    scroll_offset: usize,
    input: String,
    /// Cursor position in chars.
    cursor: usize,
    history: Vec<String>,
    history_pos: Option<usize>,
    draft: String,
    pub visible: bool,
}

impl TerminalBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> &VecDeque<TerminalLine> {
        &self.lines
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn scroll_offset(&self) -> usize {
        self.scroll_offset
    }

    #[cfg(test)]
    pub fn history(&self) -> &[String] {
        &self.history
    }

    pub fn show(&mut self) {
        self.visible = true;
    }

    pub fn hide(&mut self) {
        self.visible = false;
    }

    pub fn clear(&mut self) {
        self.lines.clear();
        self.scroll_offset = 0;
    }

    pub fn push(&mut self, line: TerminalLine) {
        self.lines.push_back(line);
        while self.lines.len() > MAX_OUTPUT_LINES {
            self.lines.pop_front();
        }
        self.scroll_offset = 0;
    }

    /// Most recent line carrying a clickable span.
    pub fn latest_clickable(&self) -> Option<&ClickableSpan> {
        self.lines.iter().rev().find_map(|l| l.clickable.as_ref())
    }

    // ── Input editing ──

    fn byte_index(&self, char_pos: usize) -> usize {
        self.input
            .char_indices()
            .nth(char_pos)
            .map_or(self.input.len(), |(i, _)| i)
    }

    fn input_chars(&self) -> usize {
        self.input.chars().count()
    }

    pub fn set_input(&mut self, text: &str) {
        self.input = text.to_string();
        self.cursor = self.input_chars();
    }

    pub fn insert_char(&mut self, c: char) {
        let at = self.byte_index(self.cursor);
        self.input.insert(at, c);
        self.cursor += 1;
    }

    /// Paste; line breaks are dropped.
    pub fn insert_str(&mut self, text: &str) {
        let clean: String = text.chars().filter(|c| *c != '\n' && *c != '\r').collect();
        let at = self.byte_index(self.cursor);
        self.input.insert_str(at, &clean);
        self.cursor += clean.chars().count();
    }

    pub fn backspace(&mut self) {
        if self.cursor == 0 {
            return;
        }
        self.cursor -= 1;
        let at = self.byte_index(self.cursor);
        self.input.remove(at);
    }

    pub fn delete(&mut self) {
        if self.cursor < self.input_chars() {
            let at = self.byte_index(self.cursor);
            self.input.remove(at);
        }
    }

    pub fn move_left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn move_right(&mut self) {
        self.cursor = (self.cursor + 1).min(self.input_chars());
    }

    pub fn move_home(&mut self) {
        self.cursor = 0;
    }

    pub fn move_end(&mut self) {
        self.cursor = self.input_chars();
    }

    // ── History ──

    pub fn history_prev(&mut self) {
        if self.history.is_empty() {
            return;
        }
        let pos = match self.history_pos {
            None => {
                self.draft = self.input.clone();
                self.history.len() - 1
            }
            Some(p) => p.saturating_sub(1),
        };
        self.history_pos = Some(pos);
        let entry = self.history[pos].clone();
        self.set_input(&entry);
    }

    pub fn history_next(&mut self) {
        let Some(pos) = self.history_pos else { return };
        if pos + 1 < self.history.len() {
            self.history_pos = Some(pos + 1);
            let entry = self.history[pos + 1].clone();
            self.set_input(&entry);
        } else {
            self.history_pos = None;
            let draft = std::mem::take(&mut self.draft);
            self.set_input(&draft);
        }
    }

    /// Echo the input line, record it in history and hand it back trimmed.
    pub fn submit_line(&mut self) -> String {
        let raw = std::mem::take(&mut self.input);
        self.cursor = 0;
        self.history_pos = None;
        self.draft.clear();
        self.push(TerminalLine::plain(format!("{PROMPT}{raw}"), SemanticColor::Text));

        let command = raw.trim().to_string();
        if !command.is_empty() && self.history.last() != Some(&command) {
            self.history.push(command.clone());
            if self.history.len() > MAX_HISTORY {
                self.history.remove(0);
            }
        }
        command
    }

    // ── Scrolling ──

    /// Positive `delta` scrolls back into older output.
    pub fn scroll(&mut self, delta: isize, view_rows: usize) {
        let max = self.lines.len().saturating_sub(view_rows);
        let next = self.scroll_offset as isize + delta;
        self.scroll_offset = next.clamp(0, max as isize) as usize;
    }

    // ── Snapshot ──

    pub fn state(&self) -> TerminalState {
        TerminalState {
            lines: self.lines.iter().cloned().collect(),
            scroll_offset: self.scroll_offset,
            input: self.input.clone(),
            cursor: self.cursor,
            history: self.history.clone(),
            visible: self.visible,
        }
    }

    pub fn restore(&mut self, state: &TerminalState) {
        self.lines = state.lines.iter().cloned().collect();
        while self.lines.len() > MAX_OUTPUT_LINES {
            self.lines.pop_front();
        }
        self.scroll_offset = state.scroll_offset;
        self.input = state.input.clone();
        self.cursor = state.cursor.min(self.input_chars());
        self.history = state.history.clone();
        self.history_pos = None;
        self.draft.clear();
        self.visible = state.visible;
    }
}

impl TerminalSink for TerminalBuffer {
    fn append(&mut self, lines: Vec<TerminalLine>) {
        for line in lines {
            self.push(line);
        }
    }
}

// ══════════════════════════════════════════════════════════════
// Tests
// ══════════════════════════════════════════════════════════════

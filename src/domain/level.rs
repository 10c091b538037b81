/// Level descriptors: the immutable per-level data read by the session and
/// the command interpreter.
///
/// Simulated tool output is stored under a typed `(Tool, target)` key
/// instead of a free-form command string. An empty target holds the usage
/// text a tool prints when called without a usable argument.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};

pub type LevelId = u32;

// ── File semantics ──

#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Debug, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IconType {
    Text,
    Pdf,
    Filanaly,
    Executable,
    Zip,
    Png,
    Image,
    Terminal,
}

impl IconType {
    #[cfg(test)]
    pub const ALL: [IconType; 8] = [
        IconType::Text,
        IconType::Pdf,
        IconType::Filanaly,
        IconType::Executable,
        IconType::Zip,
        IconType::Png,
        IconType::Image,
        IconType::Terminal,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            IconType::Text => "text",
            IconType::Pdf => "pdf",
            IconType::Filanaly => "filanaly",
            IconType::Executable => "executable",
            IconType::Zip => "zip",
            IconType::Png => "png",
            IconType::Image => "image",
            IconType::Terminal => "terminal",
        }
    }

    /// Types `exif` will look at.
    pub fn has_metadata(self) -> bool {
        matches!(self, IconType::Image | IconType::Pdf | IconType::Zip | IconType::Png)
    }

    /// Types where `strings` is worth running (anything but plain text).
    pub fn has_strings(self) -> bool {
        self != IconType::Text
    }
}

impl fmt::Display for IconType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileAction {
    ShowTerminal,
}

/// What a desktop icon means, independent of how it is drawn.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct FileDescriptor {
    pub icon_type: IconType,
    pub clickable: bool,
    pub target_image: Option<String>,
    pub target_text: Option<String>,
    pub action: Option<FileAction>,
}

impl FileDescriptor {
    pub fn inert(icon_type: IconType) -> Self {
        FileDescriptor {
            icon_type,
            clickable: false,
            target_image: None,
            target_text: None,
            action: None,
        }
    }

    /// Clickable document whose payload is shown in the text window.
    pub fn document(icon_type: IconType, content: impl Into<String>) -> Self {
        FileDescriptor {
            clickable: true,
            target_text: Some(content.into()),
            ..Self::inert(icon_type)
        }
    }

    pub fn text(content: impl Into<String>) -> Self {
        Self::document(IconType::Text, content)
    }

    pub fn image(icon_type: IconType, path: impl Into<String>) -> Self {
        FileDescriptor {
            clickable: true,
            target_image: Some(path.into()),
            ..Self::inert(icon_type)
        }
    }

    pub fn terminal() -> Self {
        FileDescriptor {
            clickable: true,
            action: Some(FileAction::ShowTerminal),
            ..Self::inert(IconType::Terminal)
        }
    }
}

// ── Simulated tool output ──

#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
pub enum Tool {
    Cat,
    Exif,
    Strings,
    Extract,
    Unzip,
    Git,
    Decode64,
}

/// A password-protected archive sitting on the desktop.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Archive {
    pub name: String,
    pub password: String,
    pub contents: BTreeMap<String, FileDescriptor>,
}

/// `extract <source>` turns `source` into a new text file `produces`.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Extraction {
    pub source: String,
    pub produces: String,
    pub content: Vec<String>,
    /// `cat <produces>` before extraction tells the player to extract first.
    pub nudge_before_created: bool,
}

/// A derived file with a commit history behind `git log <file>`.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct GitLog {
    pub file: String,
    pub history: Vec<String>,
}

// ── Level descriptor ──

#[derive(Clone, Debug)]
pub struct LevelDescriptor {
    pub id: LevelId,
    pub name: String,
    pub flag: String,
    pub fake_flags: BTreeSet<String>,
    pub desktop_files: BTreeMap<String, FileDescriptor>,
    pub help: Vec<String>,
    pub win_message: String,
    pub next_level: Option<LevelId>,
    /// Level enables the `decode64` command.
    pub decode64: bool,
    /// Base64 strings highlighted as clickable while this level is active.
    pub clickable_base64: Vec<String>,
    pub archive: Option<Archive>,
    pub extractions: Vec<Extraction>,
    pub git_log: Option<GitLog>,
    outputs: BTreeMap<(Tool, String), Vec<String>>,
}

impl LevelDescriptor {
    pub fn new(id: LevelId, name: &str, flag: &str) -> Self {
        LevelDescriptor {
            id,
            name: name.to_string(),
            flag: flag.to_string(),
            fake_flags: BTreeSet::new(),
            desktop_files: BTreeMap::new(),
            help: Vec::new(),
            win_message: String::new(),
            next_level: None,
            decode64: false,
            clickable_base64: Vec::new(),
            archive: None,
            extractions: Vec::new(),
            git_log: None,
            outputs: BTreeMap::new(),
        }
    }

    pub fn fake(mut self, flag: &str) -> Self {
        self.fake_flags.insert(flag.to_string());
        self
    }

    pub fn file(mut self, name: &str, desc: FileDescriptor) -> Self {
        self.desktop_files.insert(name.to_string(), desc);
        self
    }

    pub fn output(mut self, tool: Tool, target: &str, lines: &[&str]) -> Self {
        self.outputs.insert(
            (tool, target.to_string()),
            lines.iter().map(|s| s.to_string()).collect(),
        );
        self
    }

    pub fn output_owned(mut self, tool: Tool, target: &str, lines: Vec<String>) -> Self {
        self.outputs.insert((tool, target.to_string()), lines);
        self
    }

    pub fn usage(self, tool: Tool, lines: &[&str]) -> Self {
        self.output(tool, "", lines)
    }

    pub fn help(mut self, line: &str) -> Self {
        self.help.push(line.to_string());
        self
    }

    pub fn win(mut self, message: &str) -> Self {
        self.win_message = message.to_string();
        self
    }

    pub fn next(mut self, id: LevelId) -> Self {
        self.next_level = Some(id);
        self
    }

    pub fn with_decode64(mut self) -> Self {
        self.decode64 = true;
        self
    }

    pub fn highlight_base64(mut self, encoded: &str) -> Self {
        self.clickable_base64.push(encoded.to_string());
        self
    }

    pub fn with_archive(mut self, archive: Archive) -> Self {
        self.archive = Some(archive);
        self
    }

    pub fn with_extraction(mut self, extraction: Extraction) -> Self {
        self.extractions.push(extraction);
        self
    }

    pub fn with_git_log(mut self, log: GitLog) -> Self {
        self.git_log = Some(log);
        self
    }

    // ── Queries ──

    /// Simulated output of `tool target`, if the level defines one.
    pub fn simulated(&self, tool: Tool, target: &str) -> Option<&[String]> {
        self.outputs
            .get(&(tool, target.to_string()))
            .map(|v| v.as_slice())
    }

    pub fn usage_of(&self, tool: Tool) -> Option<&[String]> {
        self.simulated(tool, "")
    }

    pub fn is_fake(&self, candidate: &str) -> bool {
        self.fake_flags.contains(candidate)
    }

    pub fn extraction_from(&self, source: &str) -> Option<&Extraction> {
        self.extractions.iter().find(|e| e.source == source)
    }

    pub fn extraction_producing(&self, file: &str) -> Option<&Extraction> {
        self.extractions.iter().find(|e| e.produces == file)
    }

    pub fn is_archive(&self, file: &str) -> bool {
        self.archive.as_ref().map_or(false, |a| a.name == file)
    }
}

// ══════════════════════════════════════════════════════════════
// Tests
// ══════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> LevelDescriptor {
        LevelDescriptor::new(7, "Sample", "FLAG{sample}")
            .fake("FLAG{nope}")
            .file("a.txt", FileDescriptor::text("hello"))
            .output(Tool::Exif, "pic.jpg", &["Comment: hi"])
            .usage(Tool::Git, &["Usage: git log <filename>"])
            .next(8)
    }

    #[test]
    fn simulated_lookup_is_keyed_by_tool_and_target() {
        let level = sample();
        assert_eq!(level.simulated(Tool::Exif, "pic.jpg"), Some(&["Comment: hi".to_string()][..]));
        assert!(level.simulated(Tool::Strings, "pic.jpg").is_none());
        assert!(level.simulated(Tool::Exif, "other.jpg").is_none());
    }

    #[test]
    fn usage_lives_under_the_empty_target() {
        let level = sample();
        assert_eq!(level.usage_of(Tool::Git).map(|l| l.len()), Some(1));
        assert!(level.usage_of(Tool::Unzip).is_none());
    }

    #[test]
    fn fake_flags_are_exact_matches() {
        let level = sample();
        assert!(level.is_fake("FLAG{nope}"));
        assert!(!level.is_fake("flag{nope}"));
        assert!(!level.is_fake("FLAG{sample}"));
    }

    #[test]
    fn icon_type_command_sets() {
        assert!(IconType::Zip.has_metadata());
        assert!(!IconType::Text.has_metadata());
        assert!(!IconType::Executable.has_metadata());
        assert!(IconType::Executable.has_strings());
        assert!(!IconType::Text.has_strings());
    }

    #[test]
    fn terminal_descriptor_shows_terminal() {
        let t = FileDescriptor::terminal();
        assert_eq!(t.icon_type, IconType::Terminal);
        assert_eq!(t.action, Some(FileAction::ShowTerminal));
        assert!(t.clickable);
    }
}

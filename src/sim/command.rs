/// Terminal command interpreter.
///
/// One line in, terminal output and session mutations out. Lines are split
/// with shell quoting rules, dispatched on the lowercase first word, and every
/// handler ends by producing a `Reply` or a state change. Nothing raises past
/// `execute`: user mistakes, missing files and bad Base64 all become
/// coloured terminal lines.
///
/// Every invocation emits its output exactly once. Handlers that print on
/// their own (the unzip routine, decode64's auto-submit) return
/// `Reply::Emitted` so the dispatcher adds nothing on top.

use std::collections::BTreeSet;

use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig};
use base64::engine::DecodePaddingMode;
use base64::Engine as _;
use tracing::{debug, error};

use crate::domain::catalog::LevelCatalog;
use crate::domain::desktop::Scope;
use crate::domain::level::{FileDescriptor, IconType, LevelDescriptor, LevelId, Tool};
use crate::domain::terminal::{ClickKind, ClickableSpan, SemanticColor};
use crate::sim::event::GameEvent;
use crate::sim::session::SessionState;

/// Always listed by `help`.
pub const CORE_COMMANDS: [&str; 6] = ["cat", "clear", "exit", "help", "ls", "submit"];

const LENIENT_BASE64: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new()
        .with_decode_padding_mode(DecodePaddingMode::Indifferent)
        .with_decode_allow_trailing_bits(true),
);

// ══════════════════════════════════════════════════════════════
// Command table
// ══════════════════════════════════════════════════════════════

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Command {
    Wrap,
    Exit,
    Clear,
    Help,
    Ls,
    Submit,
    Cat,
    Exif,
    Strings,
    Decode64,
    Extract,
    Unzip,
    Git,
}

impl Command {
    pub const ALL: [Command; 13] = [
        Command::Wrap,
        Command::Exit,
        Command::Clear,
        Command::Help,
        Command::Ls,
        Command::Submit,
        Command::Cat,
        Command::Exif,
        Command::Strings,
        Command::Decode64,
        Command::Extract,
        Command::Unzip,
        Command::Git,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Command::Wrap => "wrap",
            Command::Exit => "exit",
            Command::Clear => "clear",
            Command::Help => "help",
            Command::Ls => "ls",
            Command::Submit => "submit",
            Command::Cat => "cat",
            Command::Exif => "exif",
            Command::Strings => "strings",
            Command::Decode64 => "decode64",
            Command::Extract => "extract",
            Command::Unzip => "unzip",
            Command::Git => "git",
        }
    }

    pub fn parse(word: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.name() == word)
    }
}

/// What the main loop should do after a command.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Flow {
    Continue,
    Quit,
}

enum Reply {
    Silent,
    Print(Vec<String>, SemanticColor),
    /// The handler already wrote its output.
    Emitted,
}

impl Reply {
    fn line(text: impl Into<String>, color: SemanticColor) -> Self {
        Reply::Print(vec![text.into()], color)
    }

    fn hint(text: impl Into<String>) -> Self {
        Self::line(text, SemanticColor::Hint)
    }

    fn error(text: impl Into<String>) -> Self {
        Self::line(text, SemanticColor::Error)
    }

    fn lines(lines: &[String], color: SemanticColor) -> Self {
        Reply::Print(lines.to_vec(), color)
    }
}

fn not_found(word: &str) -> Reply {
    Reply::error(format!("Command not found: {word}"))
}

/// Success colour when the real flag appears in the output. Fake flags do not count.
fn flag_color(level: &LevelDescriptor, lines: &[String]) -> SemanticColor {
    if !level.flag.is_empty() && lines.iter().any(|l| l.contains(&level.flag)) {
        SemanticColor::Success
    } else {
        SemanticColor::Text
    }
}

// ══════════════════════════════════════════════════════════════
// Interpreter
// ══════════════════════════════════════════════════════════════

#[derive(Clone, Copy, Debug, Default)]
pub struct CommandInterpreter;

impl CommandInterpreter {
    pub fn new() -> Self {
        CommandInterpreter
    }

    /// Run one terminal line against the current level.
    pub fn execute(&self, s: &mut SessionState, catalog: &dyn LevelCatalog, line: &str) -> Flow {
        s.terminal.show();

        let Some(level) = catalog.get_level(s.current_level_id) else {
            error!(level = s.current_level_id, "no catalog entry for current level");
            s.say("Error: Invalid level state.", SemanticColor::Error);
            return Flow::Continue;
        };

        let Some(tokens) = shlex::split(line) else {
            s.say("Error: Invalid command syntax (check quotes).", SemanticColor::Error);
            return Flow::Continue;
        };
        let Some((first, args)) = tokens.split_first() else {
            return Flow::Continue;
        };
        let word = first.to_lowercase();
        debug!(command = %word, args = args.len(), "execute");

        let mut flow = Flow::Continue;
        let reply = match Command::parse(&word) {
            None => not_found(&word),
            Some(Command::Exit) => {
                flow = Flow::Quit;
                Reply::Silent
            }
            Some(Command::Clear) => {
                s.terminal.clear();
                Reply::Silent
            }
            Some(Command::Wrap) => self.wrap(s, catalog, args),
            Some(Command::Help) => self.help(s, level),
            Some(Command::Ls) => self.ls(s),
            Some(Command::Submit) => {
                self.submit(s, catalog, level, args.first().map(String::as_str).unwrap_or(""))
            }
            Some(Command::Cat) => self.cat(s, level, args),
            Some(Command::Exif) => self.inspect(s, level, Tool::Exif, args),
            Some(Command::Strings) => self.inspect(s, level, Tool::Strings, args),
            Some(Command::Decode64) => self.decode64(s, catalog, level, args),
            Some(Command::Extract) => self.extract(s, level, args),
            Some(Command::Unzip) => self.unzip(s, catalog, level, args),
            Some(Command::Git) => self.git(s, level, args),
        };

        if let Reply::Print(lines, color) = reply {
            s.print(&lines, color);
        }
        flow
    }

    /// Act on a clickable span from the terminal: flags are submitted,
    /// Base64 text is staged as a `decode64` command.
    pub fn activate_span(&self, s: &mut SessionState, catalog: &dyn LevelCatalog, span: &ClickableSpan) -> Flow {
        match span.kind {
            ClickKind::Flag => self.execute(s, catalog, &format!("submit {}", span.matched)),
            ClickKind::Base64 { .. } => {
                let text = span.matched.replace('\0', "");
                s.terminal.set_input(&format!("decode64 {text}"));
                s.say("Prepared 'decode64' for clicked text.", SemanticColor::Hint);
                Flow::Continue
            }
        }
    }

    // ── wrap ──

    fn wrap(&self, s: &mut SessionState, catalog: &dyn LevelCatalog, args: &[String]) -> Reply {
        let target = match args {
            [arg] if !arg.is_empty() && arg.chars().all(|c| c.is_ascii_digit()) => arg.parse::<LevelId>().ok(),
            _ => None,
        };
        let Some(target) = target else {
            return Reply::hint("Usage: wrap <level_id> (Dev command)");
        };

        if target == s.current_level_id {
            Reply::hint("Already on that level.")
        } else if catalog.contains(target) {
            s.start_wrap(catalog, target);
            Reply::Silent
        } else {
            Reply::error(format!("Invalid level ID: {target}."))
        }
    }

    // ── help ──

    fn help(&self, s: &SessionState, level: &LevelDescriptor) -> Reply {
        let types = s.desktop.visible_types();
        let mut extra: Vec<String> = level.help.clone();

        if types.iter().any(|t| t.has_metadata()) {
            extra.push(" exif <filename>".into());
        }
        if types
            .iter()
            .any(|t| matches!(t, IconType::Filanaly | IconType::Executable | IconType::Zip | IconType::Png))
        {
            extra.push(" strings <filename>".into());
        }
        if types.contains(&IconType::Zip) {
            extra.push(" unzip <zipfile> [-p <password>]".into());
        }
        if level.extractions.iter().any(|e| s.desktop.contains(&e.source)) {
            extra.push(" extract <filename>".into());
        }
        if level.decode64 {
            extra.push(" decode64 <base64_string>".into());
        }
        if let Some(log) = &level.git_log {
            if s.desktop.contains(&log.file) {
                extra.push(" git log <text_file>".into());
            }
        }

        let contextual: BTreeSet<String> = extra
            .iter()
            .map(|l| l.trim())
            .filter(|l| !l.is_empty())
            .filter(|l| !CORE_COMMANDS.contains(&l.split(' ').next().unwrap_or("")))
            .map(|l| format!("  {l}"))
            .collect();

        let mut out = vec!["Available Commands:".to_string(), "--- Core ---".to_string()];
        out.extend(CORE_COMMANDS.iter().map(|c| format!("  {c}")));
        if !contextual.is_empty() {
            out.push("--- Contextual ---".into());
            out.extend(contextual);
        }
        out.push("\nHint: Press Tab to use the latest flag/Base64 in terminal output.".into());
        out.push("Hint: Paste into the terminal with your terminal's paste shortcut.".into());
        Reply::Print(out, SemanticColor::Text)
    }

    // ── ls ──

    fn ls(&self, s: &SessionState) -> Reply {
        let names = s.desktop.visible_names();
        if names.is_empty() {
            Reply::line("(Desktop is empty)", SemanticColor::Text)
        } else {
            Reply::Print(names, SemanticColor::Text)
        }
    }

    // ── submit ──

    fn submit(&self, s: &mut SessionState, catalog: &dyn LevelCatalog, level: &LevelDescriptor, candidate: &str) -> Reply {
        if candidate.is_empty() {
            return Reply::hint("Usage: submit FLAG{...}");
        }
        if s.transition.is_some() {
            return Reply::hint("Transition already in progress.");
        }

        if candidate == level.flag {
            let win = if level.win_message.is_empty() { "Complete!" } else { level.win_message.as_str() };
            let has_next = level.next_level.map_or(false, |id| catalog.contains(id));
            s.emit(if has_next { GameEvent::LevelWon } else { GameEvent::GameFinished });
            s.say(&format!("Correct! {win}"), SemanticColor::Success);
            s.start_level_transition(catalog);
            Reply::Emitted
        } else if level.is_fake(candidate) {
            Reply::error("Incorrect flag. (That's a known fake)")
        } else {
            Reply::error("Incorrect flag.")
        }
    }

    // ── cat ──

    fn cat(&self, s: &SessionState, level: &LevelDescriptor, args: &[String]) -> Reply {
        let Some(file) = args.first() else {
            return Reply::hint("Usage: cat <filename>");
        };

        let Some(element) = s.desktop.get(file) else {
            let nudge = level.extraction_producing(file).map_or(false, |e| e.nudge_before_created);
            return if nudge {
                Reply::error(format!("cat: File '{file}' not found. (Hint: Maybe 'extract' it first?)"))
            } else {
                Reply::error(format!("cat: '{file}': No such file."))
            };
        };

        if let Some(text) = &element.target_text {
            let lines: Vec<String> = text.split('\n').map(str::to_string).collect();
            let color = flag_color(level, &lines);
            return Reply::Print(lines, color);
        }

        match level.simulated(Tool::Cat, file) {
            Some(out) => Reply::lines(out, flag_color(level, out)),
            None => Reply::hint(format!("cat: Cannot display content of '{file}'.")),
        }
    }

    // ── exif / strings ──

    fn inspect(&self, s: &SessionState, level: &LevelDescriptor, tool: Tool, args: &[String]) -> Reply {
        let name = if tool == Tool::Exif { "exif" } else { "strings" };
        let Some(file) = args.first() else {
            return Reply::hint(format!("Usage: {name} <filename>"));
        };
        let Some(element) = s.desktop.get(file) else {
            return Reply::error(format!("{name}: '{file}': No such file."));
        };

        let icon_type = element.icon_type;
        let supported = match tool {
            Tool::Exif => icon_type.has_metadata(),
            _ => icon_type.has_strings(),
        };
        if !supported {
            return Reply::hint(match tool {
                Tool::Exif => format!("exif: File type '{icon_type}' doesn't support EXIF."),
                _ => format!("strings: Not typically useful on '{icon_type}' files."),
            });
        }

        match level.simulated(tool, file) {
            Some(out) => Reply::lines(out, flag_color(level, out)),
            None => Reply::hint(match tool {
                Tool::Exif => format!("exif: No simulated metadata for '{file}'."),
                _ => format!("strings: No simulated output for '{file}'."),
            }),
        }
    }

    // ── decode64 ──

    fn decode64(
        &self,
        s: &mut SessionState,
        catalog: &dyn LevelCatalog,
        level: &LevelDescriptor,
        args: &[String],
    ) -> Reply {
        if !level.decode64 {
            return not_found("decode64");
        }
        let Some(input) = args.first().filter(|a| !a.is_empty()) else {
            return match level.usage_of(Tool::Decode64) {
                Some(usage) => Reply::lines(usage, SemanticColor::Hint),
                None => Reply::hint("Usage: decode64 <base64_string>"),
            };
        };

        let decoded = match decode_base64(input) {
            Ok(text) => text,
            Err(e) => return Reply::error(format!("Decode Error: Invalid Base64 string. ({e})")),
        };

        if decoded == level.flag {
            s.print(
                &[format!("Decoded: {decoded}"), "Flag confirmed! Auto-submitting...".to_string()],
                SemanticColor::Success,
            );
            if let Reply::Print(lines, color) = self.submit(s, catalog, level, &decoded) {
                s.print(&lines, color);
            }
            Reply::Emitted
        } else if level.is_fake(&decoded) {
            Reply::hint(format!("Decoded: {decoded} (Looks like a fake flag)"))
        } else {
            Reply::line(format!("Decoded: {decoded}"), SemanticColor::Text)
        }
    }

    // ── extract ──

    fn extract(&self, s: &mut SessionState, level: &LevelDescriptor, args: &[String]) -> Reply {
        let Some(file) = args.first() else {
            return Reply::hint("Usage: extract <filename>");
        };
        if !s.desktop.contains(file) {
            return Reply::error(format!("extract: '{file}': No such file."));
        }

        let Some(extraction) = level.extraction_from(file) else {
            return match level.simulated(Tool::Extract, file) {
                Some(out) => Reply::lines(out, SemanticColor::Hint),
                None => Reply::hint(format!(
                    "extract: Cannot extract from '{file}' or command not applicable here."
                )),
            };
        };

        if s.desktop.has_temporary(&extraction.produces) {
            return Reply::hint(format!("'{}' already exists.", extraction.produces));
        }

        s.desktop.add(
            Scope::Temporary,
            &extraction.produces,
            &FileDescriptor::text(extraction.content.join("\n")),
        );
        let mut out = level
            .simulated(Tool::Extract, file)
            .map(<[String]>::to_vec)
            .unwrap_or_else(|| vec!["Extraction successful!".to_string()]);
        out.push("New file created. Use 'cat' or click it.".into());
        Reply::Print(out, SemanticColor::Success)
    }

    // ── unzip ──

    fn unzip(&self, s: &mut SessionState, catalog: &dyn LevelCatalog, level: &LevelDescriptor, args: &[String]) -> Reply {
        let Some(archive) = &level.archive else {
            return not_found("unzip");
        };

        match args {
            [zip, flag, password, ..] if *zip == archive.name && flag == "-p" => {
                self.attempt_unzip(s, catalog, password);
                Reply::Emitted
            }
            [zip] if *zip == archive.name => {
                s.popups.password.show(zip);
                Reply::hint(format!(
                    "Password required for '{zip}'.\nUse prompt or 'unzip {zip} -p <password>'"
                ))
            }
            _ => match level.usage_of(Tool::Unzip) {
                Some(usage) => Reply::lines(usage, SemanticColor::Hint),
                None => Reply::Print(
                    vec![
                        "Usage: unzip <file.zip> -p <password>".into(),
                        format!("Or:    unzip {} (for prompt)", archive.name),
                    ],
                    SemanticColor::Hint,
                ),
            },
        }
    }

    /// Shared by `unzip -p` and the password window's confirm action.
    pub fn attempt_unzip(&self, s: &mut SessionState, catalog: &dyn LevelCatalog, password: &str) {
        s.terminal.show();
        let archive = catalog
            .get_level(s.current_level_id)
            .and_then(|l| l.archive.as_ref());
        let Some(archive) = archive else {
            s.say("Unzip command not applicable here.", SemanticColor::Error);
            return;
        };

        if password != archive.password {
            s.say(&format!("Error: Invalid password for {}.", archive.name), SemanticColor::Error);
            return;
        }

        if archive.contents.keys().all(|name| s.desktop.has_temporary(name)) {
            s.say(&format!("Files already extracted from {}.", archive.name), SemanticColor::Hint);
            return;
        }

        let mut out = vec![format!("Archive: {}", archive.name)];
        for (name, desc) in &archive.contents {
            out.push(format!(" inflating: {name}"));
            s.desktop.add(Scope::Temporary, name, desc);
        }
        out.push("Unzip successful!".into());
        s.print(&out, SemanticColor::Success);
    }

    // ── git ──

    fn git(&self, s: &SessionState, level: &LevelDescriptor, args: &[String]) -> Reply {
        let Some(log) = &level.git_log else {
            return not_found("git");
        };
        let sub = args.first().map(|a| a.to_lowercase()).unwrap_or_default();
        let target = args.get(1).map(String::as_str).unwrap_or("");

        match sub.as_str() {
            "log" if target == log.file => {
                if !s.desktop.has_temporary(target) {
                    Reply::error(format!(
                        "git log: File '{target}' not found. (Hint: Have you extracted it yet?)"
                    ))
                } else if log.history.is_empty() {
                    Reply::line("Error: Git log simulation data missing.", SemanticColor::Text)
                } else {
                    Reply::lines(&log.history, flag_color(level, &log.history))
                }
            }
            "log" => Reply::hint(format!(
                "Usage: git log <filename> (Try '{}' after extracting it)",
                log.file
            )),
            _ => match level.usage_of(Tool::Git) {
                Some(usage) => Reply::lines(usage, SemanticColor::Hint),
                None => Reply::hint("Usage: git log <filename>"),
            },
        }
    }
}

/// Pad to a multiple of four, decode, then read as UTF-8 or, failing that,
/// byte-for-byte as Latin-1.
pub fn decode_base64(input: &str) -> Result<String, base64::DecodeError> {
    let mut padded = input.to_string();
    let rem = padded.len() % 4;
    if rem != 0 {
        padded.push_str(&"=".repeat(4 - rem));
    }
    let bytes = LENIENT_BASE64.decode(padded.as_bytes())?;
    Ok(match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(e) => e.into_bytes().into_iter().map(char::from).collect(),
    })
}

// ══════════════════════════════════════════════════════════════
// Tests
// ══════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TimingConfig;
    use crate::domain::catalog::BuiltinCatalog;
    use crate::domain::desktop::TERMINAL_ELEMENT;
    use crate::domain::dialogue::Language;
    use crate::sim::session::ViewMode;
    use base64::engine::general_purpose::{STANDARD, STANDARD_NO_PAD};

    struct Rig {
        catalog: BuiltinCatalog,
        session: SessionState,
        cmd: CommandInterpreter,
    }

    impl Rig {
        fn at(level: LevelId) -> Self {
            let catalog = BuiltinCatalog::new();
            let mut session = SessionState::new(&catalog, &TimingConfig::default(), Language::English);
            session.start_new_level(&catalog, level).unwrap();
            session.complete_presentation(&catalog).unwrap();
            session.terminal.clear();
            session.take_events();
            Rig { catalog, session, cmd: CommandInterpreter::new() }
        }

        fn run(&mut self, line: &str) -> Flow {
            self.cmd.execute(&mut self.session, &self.catalog, line)
        }

        /// Output of one command, without the earlier history.
        fn out(&mut self, line: &str) -> Vec<(String, SemanticColor)> {
            let before = self.session.terminal.lines().len();
            self.run(line);
            self.session
                .terminal
                .lines()
                .iter()
                .skip(before)
                .map(|l| (l.text.clone(), l.color))
                .collect()
        }

        fn texts(&mut self, line: &str) -> Vec<String> {
            self.out(line).into_iter().map(|(t, _)| t).collect()
        }

        fn temp_names(&self) -> Vec<String> {
            self.session.desktop.temporary.keys().cloned().collect()
        }
    }

    // ── parsing & dispatch ──

    #[test]
    fn command_table_round_trips_names() {
        for cmd in Command::ALL {
            assert_eq!(Command::parse(cmd.name()), Some(cmd));
        }
        assert_eq!(Command::parse("rm"), None);
    }

    #[test]
    fn unknown_and_mixed_case_commands() {
        let mut r = Rig::at(1);
        assert_eq!(r.out("rm -rf /"), vec![("Command not found: rm".into(), SemanticColor::Error)]);
        assert_eq!(r.texts("LS")[0], TERMINAL_ELEMENT);
    }

    #[test]
    fn bad_quoting_is_reported() {
        let mut r = Rig::at(1);
        assert_eq!(r.texts("cat \"notes.txt"), vec!["Error: Invalid command syntax (check quotes)."]);
    }

    #[test]
    fn empty_input_is_a_no_op() {
        let mut r = Rig::at(1);
        assert!(r.out("   ").is_empty());
        assert!(r.session.terminal.visible);
    }

    #[test]
    fn missing_level_is_reported_not_fatal() {
        let mut r = Rig::at(1);
        r.session.current_level_id = 42;
        assert_eq!(r.texts("ls"), vec!["Error: Invalid level state."]);
    }

    #[test]
    fn exit_requests_quit_and_clear_empties() {
        let mut r = Rig::at(1);
        r.run("ls");
        assert_eq!(r.run("exit"), Flow::Quit);
        r.run("clear");
        assert!(r.session.terminal.lines().is_empty());
    }

    #[test]
    fn quoted_arguments_keep_spaces() {
        let mut r = Rig::at(1);
        assert_eq!(r.texts("cat 'my notes.txt'"), vec!["cat: 'my notes.txt': No such file."]);
    }

    // ── scenario A ──

    #[test]
    fn metadata_level_exif_then_submit() {
        let mut r = Rig::at(1);
        let out = r.out("exif image.jpg");
        assert!(out.iter().any(|(t, _)| t.contains("FLAG{hidden_in_metadata}")));
        assert!(out.iter().all(|(_, c)| *c == SemanticColor::Success));

        let out = r.out("submit FLAG{hidden_in_metadata}");
        assert_eq!(out[0].0, "Correct! Metadata scan complete! Moving to file dissection.");
        assert_eq!(out[0].1, SemanticColor::Success);
        assert_eq!(r.session.view_mode(), ViewMode::Transition);
        assert_eq!(r.session.transition.as_ref().unwrap().next_level_id, Some(2));
        assert_eq!(r.session.take_events(), vec![GameEvent::LevelWon]);
    }

    // ── submit ──

    #[test]
    fn wrong_flag_is_idempotent() {
        let mut r = Rig::at(2);
        let first = r.out("submit FLAG{nope}");
        let second = r.out("submit FLAG{nope}");
        assert_eq!(first, second);
        assert_eq!(first, vec![("Incorrect flag.".into(), SemanticColor::Error)]);
        assert_eq!(r.session.view_mode(), ViewMode::Desktop);
        assert!(r.session.transition.is_none());
    }

    #[test]
    fn known_fake_and_case_sensitivity() {
        let mut r = Rig::at(2);
        assert_eq!(r.texts("submit FLAG{just_a_red_herring}"), vec!["Incorrect flag. (That's a known fake)"]);
        assert_eq!(r.texts("submit flag{strings_reveal_all}"), vec!["Incorrect flag."]);
        assert_eq!(r.texts("submit"), vec!["Usage: submit FLAG{...}"]);
    }

    #[test]
    fn second_correct_submit_has_no_effect() {
        let mut r = Rig::at(2);
        r.run("submit FLAG{strings_reveal_all}");
        let started = r.session.transition.clone().unwrap();
        r.session.take_events();
        assert_eq!(r.texts("submit FLAG{strings_reveal_all}"), vec!["Transition already in progress."]);
        assert_eq!(r.session.transition.as_ref(), Some(&started));
        assert!(r.session.take_events().is_empty());
    }

    #[test]
    fn final_level_win_signals_game_finished() {
        let mut r = Rig::at(5);
        r.run("submit FLAG{git_history_reveals_truth}");
        assert_eq!(r.session.take_events(), vec![GameEvent::GameFinished]);
        assert_eq!(r.session.transition.as_ref().unwrap().next_level_id, None);
    }

    // ── cat / exif / strings ──

    #[test]
    fn cat_prints_text_payload_and_simulations() {
        let mut r = Rig::at(1);
        let notes = r.texts("cat notes.txt");
        assert_eq!(notes[0], "Objective: Find the flag.");
        assert_eq!(notes.len(), 5);
        assert_eq!(r.texts("cat image.jpg"), vec!["cat: Cannot display binary image content."]);
        assert_eq!(
            r.out("cat Terminal"),
            vec![("cat: Cannot display content of 'Terminal'.".into(), SemanticColor::Hint)]
        );
        assert_eq!(r.texts("cat"), vec!["Usage: cat <filename>"]);
    }

    #[test]
    fn cat_nudges_before_note_is_extracted() {
        let mut r = Rig::at(5);
        assert_eq!(
            r.texts("cat secret_note.txt"),
            vec!["cat: File 'secret_note.txt' not found. (Hint: Maybe 'extract' it first?)"]
        );
    }

    #[test]
    fn fake_flags_do_not_turn_output_green() {
        let mut r = Rig::at(2);
        let out = r.out("exif report.pdf");
        assert!(out.iter().any(|(t, _)| t.contains("FLAG{metadata_is_misleading}")));
        assert!(out.iter().all(|(_, c)| *c == SemanticColor::Text));
    }

    #[test]
    fn exif_and_strings_check_file_types() {
        let mut r = Rig::at(2);
        assert_eq!(
            r.texts("exif analysis_tool.exe"),
            vec!["exif: File type 'filanaly' doesn't support EXIF."]
        );
        let out = r.out("strings analysis_tool.exe");
        assert!(out.iter().any(|(t, _)| t == "SuperSecretDebugKey_Or_Flag: FLAG{strings_reveal_all}"));
        assert_eq!(out[0].1, SemanticColor::Success);
        assert_eq!(r.texts("strings missing.bin"), vec!["strings: 'missing.bin': No such file."]);
        assert_eq!(r.texts("strings Terminal"), vec!["strings: No simulated output for 'Terminal'."]);

        let mut r = Rig::at(1);
        assert_eq!(r.texts("strings notes.txt"), vec!["strings: Not typically useful on 'text' files."]);
        assert_eq!(r.texts("exif"), vec!["Usage: exif <filename>"]);
    }

    // ── scenario B / decode64 ──

    #[test]
    fn decode64_real_flag_auto_submits_once() {
        let mut r = Rig::at(3);
        let out = r.out("decode64 RkxBR3tiNHMzX3NpeHR5X2YwdXJfRlVufQ==");
        let texts: Vec<&str> = out.iter().map(|(t, _)| t.as_str()).collect();
        assert_eq!(
            texts,
            vec![
                "Decoded: FLAG{b4s3_sixty_f0ur_FUn}",
                "Flag confirmed! Auto-submitting...",
                "Correct! Base64 decoded! Revisiting image manipulation.",
            ]
        );
        assert!(out.iter().all(|(_, c)| *c == SemanticColor::Success));
        assert_eq!(r.session.view_mode(), ViewMode::Transition);
    }

    #[test]
    fn decode64_unpadded_fake_and_plain() {
        let mut r = Rig::at(3);
        let fake = STANDARD_NO_PAD.encode("FLAG{encoding_is_easy}");
        assert_eq!(
            r.out(&format!("decode64 {fake}")),
            vec![("Decoded: FLAG{encoding_is_easy} (Looks like a fake flag)".into(), SemanticColor::Hint)]
        );
        assert_eq!(r.texts("decode64 aGVsbG8"), vec!["Decoded: hello"]);
    }

    #[test]
    fn decode64_errors_and_gating() {
        let mut r = Rig::at(3);
        let out = r.out("decode64 !!!!");
        assert_eq!(out.len(), 1);
        assert!(out[0].0.starts_with("Decode Error: Invalid Base64 string. ("));
        assert_eq!(out[0].1, SemanticColor::Error);
        assert_eq!(
            r.texts("decode64"),
            vec!["Usage: decode64 <base64_string>", "Error: Missing Base64 input string."]
        );

        let mut r = Rig::at(1);
        assert_eq!(r.texts("decode64 aGVsbG8="), vec!["Command not found: decode64"]);
    }

    #[test]
    fn decode64_inverts_standard_encoding() {
        let samples = ["", "a", "ab", "abc", "Hello, World!", "~!@#$%^&*()_+{}|:<>?", "FLAG{x y z}"];
        for s in samples {
            assert_eq!(decode_base64(&STANDARD.encode(s)).unwrap(), s);
            assert_eq!(decode_base64(&STANDARD_NO_PAD.encode(s)).unwrap(), s);
        }
        let printable: String = (0x20u8..0x7f).map(char::from).collect();
        assert_eq!(decode_base64(&STANDARD.encode(&printable)).unwrap(), printable);
    }

    #[test]
    fn decode64_falls_back_to_latin1() {
        assert_eq!(decode_base64(&STANDARD.encode([0x41u8, 0xE9, 0xFF])).unwrap(), "A\u{e9}\u{ff}");
        assert!(decode_base64("a").is_err());
        assert!(decode_base64("ab cd").is_err());
    }

    // ── extract ──

    #[test]
    fn extract_is_idempotent() {
        let mut r = Rig::at(4);
        let out = r.out("extract image.jpg");
        assert_eq!(out.last().unwrap().0, "New file created. Use 'cat' or click it.");
        assert!(out.iter().all(|(_, c)| *c == SemanticColor::Success));
        assert_eq!(r.temp_names(), vec!["extracted_flag.txt", "image.jpg", "readme.txt"]);

        assert_eq!(r.texts("extract image.jpg"), vec!["'extracted_flag.txt' already exists."]);
        assert_eq!(r.session.desktop.temporary.len(), 3);

        let cat = r.out("cat extracted_flag.txt");
        assert!(cat.iter().any(|(t, _)| t == " Here it is: FLAG{hidden_in_the_image}"));
        assert_eq!(cat[0].1, SemanticColor::Success);
    }

    #[test]
    fn extract_failures() {
        let mut r = Rig::at(4);
        assert_eq!(r.texts("extract readme.txt"), vec!["extract: Cannot extract data from text file 'readme.txt'."]);
        assert_eq!(r.texts("extract ghost.bin"), vec!["extract: 'ghost.bin': No such file."]);
        assert_eq!(
            r.texts("extract Terminal"),
            vec!["extract: Cannot extract from 'Terminal' or command not applicable here."]
        );
        assert_eq!(r.texts("extract"), vec!["Usage: extract <filename>"]);

        // Before unzip the archive member is just a missing file.
        let mut r = Rig::at(5);
        assert_eq!(r.texts("extract secret.png"), vec!["extract: 'secret.png': No such file."]);
        assert!(!r.session.desktop.contains("secret_note.txt"));
    }

    // ── scenario C / unzip ──

    #[test]
    fn unzip_wrong_then_right_password() {
        let mut r = Rig::at(5);
        let before = r.temp_names();
        assert_eq!(
            r.out("unzip encrypted.zip -p wrongpass"),
            vec![("Error: Invalid password for encrypted.zip.".into(), SemanticColor::Error)]
        );
        assert_eq!(r.temp_names(), before);

        assert_eq!(
            r.texts("unzip encrypted.zip -p SuperSecretPW123"),
            vec!["Archive: encrypted.zip", " inflating: secret.png", "Unzip successful!"]
        );
        let added: Vec<String> = r.temp_names().into_iter().filter(|n| !before.contains(n)).collect();
        assert_eq!(added, vec!["secret.png"]);

        assert_eq!(
            r.texts("unzip encrypted.zip -p SuperSecretPW123"),
            vec!["Files already extracted from encrypted.zip."]
        );
    }

    #[test]
    fn unzip_prompt_form_and_usage() {
        let mut r = Rig::at(5);
        let out = r.texts("unzip encrypted.zip");
        assert_eq!(out[0], "Password required for 'encrypted.zip'.");
        assert!(r.session.popups.password.visible);
        assert_eq!(r.texts("unzip other.zip -x")[0], "Usage: unzip <file.zip> -p <password>");

        let mut r = Rig::at(4);
        assert_eq!(r.texts("unzip encrypted.zip"), vec!["Command not found: unzip"]);
    }

    #[test]
    fn password_window_path_matches_command_path() {
        let mut a = Rig::at(5);
        let mut b = Rig::at(5);
        let via_cmd = a.texts("unzip encrypted.zip -p SuperSecretPW123");
        b.cmd.attempt_unzip(&mut b.session, &b.catalog, "SuperSecretPW123");
        let via_window: Vec<String> = b.session.terminal.lines().iter().map(|l| l.text.clone()).collect();
        assert_eq!(via_cmd, via_window);
        assert_eq!(a.temp_names(), b.temp_names());
    }

    #[test]
    fn unzip_routine_outside_archive_level() {
        let mut r = Rig::at(1);
        r.cmd.attempt_unzip(&mut r.session, &r.catalog, "x");
        assert_eq!(r.session.terminal.lines().back().unwrap().text, "Unzip command not applicable here.");
    }

    // ── git ──

    #[test]
    fn git_log_needs_extracted_note() {
        let mut r = Rig::at(5);
        assert_eq!(
            r.texts("git log secret_note.txt"),
            vec!["git log: File 'secret_note.txt' not found. (Hint: Have you extracted it yet?)"]
        );
        r.run("unzip encrypted.zip -p SuperSecretPW123");
        r.run("extract secret.png");
        let out = r.out("git log secret_note.txt");
        assert!(out.iter().any(|(t, _)| t.contains("FLAG{git_history_reveals_truth}")));
        assert_eq!(out[0].1, SemanticColor::Success);

        assert_eq!(
            r.texts("git log"),
            vec!["Usage: git log <filename> (Try 'secret_note.txt' after extracting it)"]
        );
        assert_eq!(r.texts("git status")[0], "Usage: git log <filename> - Show commit history.");
    }

    #[test]
    fn git_unavailable_elsewhere() {
        let mut r = Rig::at(3);
        assert_eq!(r.texts("git log x"), vec!["Command not found: git"]);
    }

    // ── scenario D / ls ──

    #[test]
    fn ls_lists_sorted_union_with_terminal() {
        let mut r = Rig::at(3);
        assert_eq!(
            r.texts("ls"),
            vec![TERMINAL_ELEMENT, "decoder_manual.txt", "log.txt", "sys_monitor.exe"]
        );
    }

    // ── help ──

    #[test]
    fn help_lists_core_then_context() {
        let mut r = Rig::at(5);
        let out = r.texts("help");
        assert_eq!(&out[..2], &["Available Commands:", "--- Core ---"]);
        assert_eq!(&out[2..8], &["  cat", "  clear", "  exit", "  help", "  ls", "  submit"]);
        assert_eq!(out[8], "--- Contextual ---");
        assert!(out.contains(&"  unzip <zipfile> [-p <password>]".to_string()));
        assert!(out.contains(&"  exif <filename>".to_string()));
        assert!(out.contains(&"  decode64 <base64_string>".to_string()));
        assert!(!out.contains(&"  git log <text_file>".to_string()));
        assert!(!out.contains(&"  extract <filename>".to_string()));
        assert_eq!(out.iter().filter(|l| l.as_str() == "  exif <filename>").count(), 1);

        r.run("unzip encrypted.zip -p SuperSecretPW123");
        r.run("extract secret.png");
        let out = r.texts("help");
        assert!(out.contains(&"  git log <text_file>".to_string()));
        assert!(out.contains(&"  extract <filename>".to_string()));
    }

    #[test]
    fn help_contextual_section_is_sorted() {
        let mut r = Rig::at(3);
        let out = r.texts("help");
        let start = out.iter().position(|l| l == "--- Contextual ---").unwrap() + 1;
        let end = out.iter().position(|l| l.is_empty()).unwrap();
        let section = &out[start..end];
        let mut sorted = section.to_vec();
        sorted.sort();
        assert_eq!(section, &sorted[..]);
        assert!(section.contains(&"  strings <filename>".to_string()));
    }

    // ── wrap ──

    #[test]
    fn wrap_validates_target() {
        let mut r = Rig::at(1);
        assert_eq!(r.texts("wrap 1"), vec!["Already on that level."]);
        assert_eq!(r.texts("wrap 9"), vec!["Invalid level ID: 9."]);
        assert_eq!(r.texts("wrap x"), vec!["Usage: wrap <level_id> (Dev command)"]);
        assert_eq!(r.texts("wrap +3"), vec!["Usage: wrap <level_id> (Dev command)"]);

        assert!(r.out("wrap 3").is_empty());
        let info = r.session.transition.as_ref().unwrap();
        assert!(info.is_cheat_skip);
        assert_eq!(info.next_level_id, Some(3));
        assert_eq!(r.session.view_mode(), ViewMode::Transition);
    }

    // ── clickable spans ──

    #[test]
    fn activating_spans() {
        let mut r = Rig::at(3);
        r.run("cat log.txt");
        let span = r.session.terminal.latest_clickable().cloned().unwrap();
        assert_eq!(span.kind, ClickKind::Flag);
        assert_eq!(span.matched, "FLAG{encoding_is_easy}");

        r.cmd.activate_span(&mut r.session, &r.catalog, &span);
        assert_eq!(r.session.terminal.lines().back().unwrap().text, "Incorrect flag. (That's a known fake)");

        let b64 = ClickableSpan {
            kind: ClickKind::Base64 { level: 3 },
            matched: "RkxBR3tiNHMzX3NpeHR5X2YwdXJfRlVufQ==".into(),
            prefix: String::new(),
            suffix: String::new(),
        };
        r.cmd.activate_span(&mut r.session, &r.catalog, &b64);
        assert_eq!(r.session.terminal.input(), "decode64 RkxBR3tiNHMzX3NpeHR5X2YwdXJfRlVufQ==");
        assert_eq!(
            r.session.terminal.lines().back().unwrap().text,
            "Prepared 'decode64' for clicked text."
        );
    }

    #[test]
    fn level_base64_lines_are_clickable() {
        let mut r = Rig::at(3);
        r.run("cat log.txt");
        let spans: Vec<&ClickableSpan> = r
            .session
            .terminal
            .lines()
            .iter()
            .filter_map(|l| l.clickable.as_ref())
            .collect();
        assert!(spans.iter().any(|s| s.kind == ClickKind::Base64 { level: 3 }));
    }
}

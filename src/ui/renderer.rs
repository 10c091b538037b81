/// Presentation layer: double-buffered, diff-based terminal renderer.
///
/// How it works:
///   1. Compose the controller's draw plan into the `front` buffer, layer by layer
///   2. Compare each cell with `back` buffer (previous frame)
///   3. Only emit terminal commands for cells that changed
///   4. All commands are batched with `queue!`, flushed once at the end
///   5. Swap front/back

use std::io::{self, BufWriter, Write};

use crossterm::{
    cursor::{self, MoveTo},
    event::{DisableBracketedPaste, DisableMouseCapture, EnableBracketedPaste, EnableMouseCapture},
    execute, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{self, Clear, ClearType},
};

use crate::domain::desktop::{Rect, TERMINAL_ELEMENT};
use crate::domain::terminal::{SemanticColor, TerminalLine, PROMPT};
use crate::sim::controller::{Layer, ViewModeController};
use crate::sim::credits::EXIT_PROMPT;
use crate::sim::layout::{self, Viewport};
use crate::sim::menu::{MainItem, SettingsItem, TITLE};
use crate::sim::session::ViewMode;
use crate::sim::windows::Popup;

// ── Palette ──

const HI: Color = Color::Rgb { r: 80, g: 255, b: 80 };
const GOLD: Color = Color::Rgb { r: 255, g: 200, b: 50 };
const TEXT: Color = Color::Rgb { r: 220, g: 220, b: 220 };
const DIM: Color = Color::DarkGrey;
const ERROR: Color = Color::Rgb { r: 255, g: 80, b: 80 };
const LINK: Color = Color::Rgb { r: 100, g: 200, b: 255 };
const WINDOW_BG: Color = Color::Rgb { r: 34, g: 34, b: 52 };
const TERMINAL_BG: Color = Color::Rgb { r: 10, g: 10, b: 14 };
const TASKBAR_BG: Color = Color::Rgb { r: 50, g: 50, b: 80 };

const BANNER: [&str; 5] = [
    r" _   _       _ _  ___  ____  ",
    r"| \ | |_   _| | |/ _ \/ ___| ",
    r"|  \| | | | | | | | | \___ \ ",
    r"| |\  | |_| | | | |_| |___) |",
    r"|_| \_|\__,_|_|_|\___/|____/ ",
];

// ── Cell: the unit of the back-buffer ──

#[derive(Clone, Copy, PartialEq, Eq)]
struct Cell {
    ch: char,
    fg: Color,
    bg: Color,
}

impl Cell {
    /// Explicit dark background for all "empty" terminal cells, so the gap
    /// between rows matches the cell colour on VTE terminals.
    const BASE_BG: Color = Color::Rgb { r: 22, g: 22, b: 35 };

    const BLANK: Cell = Cell { ch: ' ', fg: Color::White, bg: Cell::BASE_BG };

    /// Sentinel cell used to invalidate the back buffer.
    const INVALID: Cell = Cell { ch: '?', fg: Color::Magenta, bg: Color::Magenta };

    fn new(ch: char, fg: Color, bg: Color) -> Self {
        let bg = match bg {
            Color::Reset => Self::BASE_BG,
            other => other,
        };
        Cell { ch, fg, bg }
    }
}

// ── FrameBuffer: a 2D grid of Cells ──

struct FrameBuffer {
    width: usize,
    height: usize,
    cells: Vec<Cell>,
}

impl FrameBuffer {
    fn new(w: usize, h: usize) -> Self {
        FrameBuffer { width: w, height: h, cells: vec![Cell::BLANK; w * h] }
    }

    fn resize(&mut self, w: usize, h: usize) {
        if self.width != w || self.height != h {
            self.width = w;
            self.height = h;
            self.cells = vec![Cell::BLANK; w * h];
        }
    }

    fn clear(&mut self) {
        self.cells.fill(Cell::BLANK);
    }

    fn set(&mut self, x: usize, y: usize, cell: Cell) {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x] = cell;
        }
    }

    fn get(&self, x: usize, y: usize) -> Cell {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x]
        } else {
            Cell::BLANK
        }
    }

    /// Write `s` at (x, y), clipped to `max` columns. Returns columns written.
    fn put_clipped(&mut self, x: usize, y: usize, s: &str, max: usize, fg: Color, bg: Color) -> usize {
        let mut n = 0;
        for ch in s.chars().filter(|c| !c.is_control()) {
            if n >= max || x + n >= self.width {
                break;
            }
            self.set(x + n, y, Cell::new(ch, fg, bg));
            n += 1;
        }
        n
    }

    fn put_str(&mut self, x: usize, y: usize, s: &str, fg: Color, bg: Color) {
        self.put_clipped(x, y, s, usize::MAX, fg, bg);
    }

    fn put_centered(&mut self, y: usize, s: &str, fg: Color, bg: Color) {
        let x = self.width.saturating_sub(s.chars().count()) / 2;
        self.put_str(x, y, s, fg, bg);
    }

    fn fill(&mut self, r: Rect, bg: Color) {
        for y in r.y as usize..(r.y + r.h) as usize {
            for x in r.x as usize..(r.x + r.w) as usize {
                self.set(x, y, Cell::new(' ', Color::White, bg));
            }
        }
    }

    /// Filled box with a single-line border and a title in the top edge.
    fn frame(&mut self, r: Rect, title: &str, border: Color, bg: Color) {
        if r.w < 2 || r.h < 2 {
            return;
        }
        self.fill(r, bg);
        let (x0, y0) = (r.x as usize, r.y as usize);
        let (x1, y1) = (x0 + r.w as usize - 1, y0 + r.h as usize - 1);
        for x in x0 + 1..x1 {
            self.set(x, y0, Cell::new('─', border, bg));
            self.set(x, y1, Cell::new('─', border, bg));
        }
        for y in y0 + 1..y1 {
            self.set(x0, y, Cell::new('│', border, bg));
            self.set(x1, y, Cell::new('│', border, bg));
        }
        self.set(x0, y0, Cell::new('┌', border, bg));
        self.set(x1, y0, Cell::new('┐', border, bg));
        self.set(x0, y1, Cell::new('└', border, bg));
        self.set(x1, y1, Cell::new('┘', border, bg));
        if !title.is_empty() {
            self.put_clipped(x0 + 2, y0, &format!(" {title} "), (r.w as usize).saturating_sub(4), GOLD, bg);
        }
    }
}

// ── Renderer ──

pub struct Renderer {
    writer: BufWriter<io::Stdout>,
    front: FrameBuffer,
    back: FrameBuffer,
    term_w: usize,
    term_h: usize,
    last_mode: Option<ViewMode>,
}

impl Renderer {
    pub fn new() -> Self {
        Renderer {
            writer: BufWriter::with_capacity(16384, io::stdout()),
            front: FrameBuffer::new(0, 0),
            back: FrameBuffer::new(0, 0),
            term_w: 0,
            term_h: 0,
            last_mode: None,
        }
    }

    pub fn init(&mut self) -> io::Result<()> {
        terminal::enable_raw_mode()?;
        execute!(
            self.writer,
            terminal::EnterAlternateScreen,
            EnableMouseCapture,
            EnableBracketedPaste,
            cursor::Hide,
            SetBackgroundColor(Cell::BASE_BG),
            Clear(ClearType::All)
        )?;

        let (tw, th) = terminal::size().unwrap_or((80, 24));
        self.resize(tw, th);
        Ok(())
    }

    pub fn cleanup(&mut self) -> io::Result<()> {
        execute!(
            self.writer,
            ResetColor,
            DisableBracketedPaste,
            DisableMouseCapture,
            cursor::Show,
            terminal::LeaveAlternateScreen
        )?;
        terminal::disable_raw_mode()
    }

    /// Current size in cells.
    pub fn viewport(&self) -> Viewport {
        Viewport { width: self.term_w as u16, height: self.term_h as u16 }
    }

    pub fn resize(&mut self, w: u16, h: u16) {
        self.term_w = w as usize;
        self.term_h = h as usize;
        self.front.resize(self.term_w, self.term_h);
        self.back.resize(self.term_w, self.term_h);
        // Force full repaint: back differs from front in every cell.
        self.back.cells.fill(Cell::INVALID);
    }

    pub fn render(&mut self, c: &ViewModeController) -> io::Result<()> {
        let (tw, th) = terminal::size().unwrap_or((80, 24));
        if tw as usize != self.term_w || th as usize != self.term_h {
            self.resize(tw, th);
            queue!(self.writer, SetBackgroundColor(Cell::BASE_BG), Clear(ClearType::All))?;
        }

        // Mode change → clean repaint
        if self.last_mode != Some(c.mode()) {
            self.back.cells.fill(Cell::INVALID);
            self.last_mode = Some(c.mode());
        }

        self.front.clear();
        let v = self.viewport();
        for layer in c.draw_plan() {
            match layer {
                Layer::Background => {}
                Layer::Desktop => self.compose_desktop(c, v),
                Layer::Terminal => self.compose_terminal(c, v),
                Layer::Window(Popup::Text) => self.compose_text_window(c, v),
                Layer::Window(Popup::Image) => self.compose_image_window(c, v),
                Layer::Window(Popup::Password) => self.compose_password_window(c, v),
                Layer::Presentation => self.compose_presentation(c, v),
                Layer::TransitionOverlay => self.compose_transition(c, v),
                Layer::MainMenu => self.compose_main_menu(c, v),
                Layer::SettingsMenu => self.compose_settings(c, v),
                Layer::Credits => self.compose_credits(c, v),
            }
        }

        self.flush_diff()?;
        std::mem::swap(&mut self.front, &mut self.back);
        Ok(())
    }

    // ── Diff flush: only write changed cells ──

    fn flush_diff(&mut self) -> io::Result<()> {
        let mut last_fg = Color::White;
        let mut last_bg = Cell::BASE_BG;
        let mut need_move = true;
        let mut last_x: usize = 0;
        let mut last_y: usize = 0;

        // Explicit base colours; ResetColor would fall back to the terminal default.
        queue!(self.writer, SetForegroundColor(Color::White), SetBackgroundColor(Cell::BASE_BG))?;

        for y in 0..self.front.height {
            for x in 0..self.front.width {
                let cell = self.front.get(x, y);
                if cell == self.back.get(x, y) {
                    need_move = true;
                    continue;
                }

                if need_move || x != last_x + 1 || y != last_y {
                    queue!(self.writer, MoveTo(x as u16, y as u16))?;
                    need_move = false;
                }
                if cell.fg != last_fg {
                    queue!(self.writer, SetForegroundColor(cell.fg))?;
                    last_fg = cell.fg;
                }
                if cell.bg != last_bg {
                    queue!(self.writer, SetBackgroundColor(cell.bg))?;
                    last_bg = cell.bg;
                }
                queue!(self.writer, Print(cell.ch))?;
                last_x = x;
                last_y = y;
            }
        }

        self.writer.flush()
    }

    // ── Menus ──

    fn compose_banner(&mut self, v: Viewport, rows: &[Rect]) {
        let top = rows.first().map_or(0, |r| r.y as usize);
        let start = top.saturating_sub(BANNER.len() + 2);
        if start + BANNER.len() < top && v.height as usize > BANNER.len() + rows.len() * 2 {
            for (i, line) in BANNER.iter().enumerate() {
                self.front.put_centered(start + i, line, GOLD, Color::Reset);
            }
        } else {
            self.front.put_centered(top.saturating_sub(2), TITLE, GOLD, Color::Reset);
        }
    }

    fn compose_list(&mut self, rows: &[Rect], labels: &[String], selected: usize) {
        for (i, (r, label)) in rows.iter().zip(labels).enumerate() {
            let (text, fg) = if i == selected {
                (format!("▸ {label}"), HI)
            } else {
                (format!("  {label}"), TEXT)
            };
            self.front.put_clipped(r.x as usize, r.y as usize, &text, r.w as usize, fg, Color::Reset);
        }
    }

    fn compose_main_menu(&mut self, c: &ViewModeController, v: Viewport) {
        let rows = layout::menu_rows(v, MainItem::ALL.len());
        self.compose_banner(v, &rows);
        let labels = c.main_menu.labels(c.session.saved_state.is_some(), c.prefs.language());
        self.compose_list(&rows, &labels, c.main_menu.selected());
        let help = "↑↓ Select   ENTER Confirm   ESC Quit";
        self.front.put_centered(v.height.saturating_sub(2) as usize, help, DIM, Color::Reset);
    }

    fn compose_settings(&mut self, c: &ViewModeController, v: Viewport) {
        let rows = layout::menu_rows(v, SettingsItem::ALL.len());
        let top = rows.first().map_or(0, |r| r.y as usize);
        self.front.put_centered(top.saturating_sub(2), "Settings", GOLD, Color::Reset);
        let labels = c.settings_menu.labels(&c.prefs);
        self.compose_list(&rows, &labels, c.settings_menu.selected());
    }

    fn compose_credits(&mut self, c: &ViewModeController, v: Viewport) {
        for (row, text) in c.credits.visible_lines(v.height.saturating_sub(1)) {
            let fg = if text.ends_with(':') { GOLD } else { TEXT };
            self.front.put_centered(row as usize, text, fg, Color::Reset);
        }
        self.front.put_centered(v.height.saturating_sub(1) as usize, EXIT_PROMPT, DIM, Color::Reset);
    }

    // ── Desktop ──

    fn compose_desktop(&mut self, c: &ViewModeController, v: Viewport) {
        let selected = c.selected_icon();
        let show_selection = c.session.popups.topmost().is_none() && !c.session.terminal.visible;
        for e in c.session.desktop.elements() {
            let Some(r) = e.rect else { continue };
            let is_sel = show_selection && selected == Some(e.name.as_str());
            let (fg, bg) = if is_sel { (Color::Black, HI) } else { (LINK, Color::Reset) };
            let (x, y, w) = (r.x as usize, r.y as usize, r.w as usize);
            self.front.put_clipped(x, y, e.icon.glyph, w, fg, bg);
            let label_fg = if e.clickable || e.name == TERMINAL_ELEMENT { TEXT } else { DIM };
            self.front.put_clipped(x, y + 1, &e.label, w, label_fg, Color::Reset);
        }

        // Taskbar
        let row = v.height.saturating_sub(1) as usize;
        self.front.fill(Rect { x: 0, y: row as u16, w: v.width, h: 1 }, TASKBAR_BG);
        let name = c
            .catalog()
            .get_level(c.session.current_level_id)
            .map_or(String::new(), |l| l.name.clone());
        let left = format!(" NullOS │ Level {}: {name}", c.session.current_level_id);
        self.front.put_str(0, row, &left, Color::White, TASKBAR_BG);
        let right = "F1 Terminal  ESC Menu ";
        let rx = (v.width as usize).saturating_sub(right.chars().count());
        if rx > left.chars().count() {
            self.front.put_str(rx, row, right, GOLD, TASKBAR_BG);
        }
    }

    fn compose_terminal(&mut self, c: &ViewModeController, v: Viewport) {
        let r = layout::terminal_rect(v);
        self.front.frame(r, "Terminal", HI, TERMINAL_BG);
        let term = &c.session.terminal;
        let rows = layout::terminal_view_rows(v);
        let inner_w = (r.w as usize).saturating_sub(2);
        let x = r.x as usize + 1;

        let lines = term.lines();
        let end = lines.len().saturating_sub(term.scroll_offset());
        let start = end.saturating_sub(rows);
        for (i, line) in lines.iter().skip(start).take(end - start).enumerate() {
            self.compose_terminal_line(x, r.y as usize + 1 + i, inner_w, line);
        }

        // Prompt line with a block cursor
        let py = (r.y + r.h).saturating_sub(2) as usize;
        let n = self.front.put_clipped(x, py, PROMPT, inner_w, HI, TERMINAL_BG);
        let room = inner_w.saturating_sub(n + 1);
        let input: Vec<char> = term.input().chars().collect();
        let skip = term.cursor().saturating_sub(room);
        for (i, ch) in input.iter().skip(skip).take(room).enumerate() {
            self.front.set(x + n + i, py, Cell::new(*ch, TEXT, TERMINAL_BG));
        }
        let cx = x + n + term.cursor() - skip;
        let under = input.get(term.cursor()).copied().unwrap_or(' ');
        self.front.set(cx, py, Cell::new(under, TERMINAL_BG, TEXT));
    }

    fn compose_terminal_line(&mut self, x: usize, y: usize, max: usize, line: &TerminalLine) {
        let fg = semantic(line.color);
        match &line.clickable {
            Some(span) => {
                let mut n = self.front.put_clipped(x, y, &span.prefix, max, fg, TERMINAL_BG);
                n += self.front.put_clipped(x + n, y, &span.matched, max.saturating_sub(n), LINK, TERMINAL_BG);
                self.front.put_clipped(x + n, y, &span.suffix, max.saturating_sub(n), fg, TERMINAL_BG);
            }
            None => {
                self.front.put_clipped(x, y, &line.text, max, fg, TERMINAL_BG);
            }
        }
    }

    // ── Popups ──

    fn compose_text_window(&mut self, c: &ViewModeController, v: Viewport) {
        let w = &c.session.popups.text;
        let r = layout::popup_rect(v);
        self.front.frame(r, &w.title, GOLD, WINDOW_BG);
        let inner_w = (r.w as usize).saturating_sub(4);
        let rows = (r.h as usize).saturating_sub(3);
        for (i, line) in w.content.lines().skip(w.scroll).take(rows).enumerate() {
            self.front.put_clipped(r.x as usize + 2, r.y as usize + 1 + i, line, inner_w, TEXT, WINDOW_BG);
        }
        let footer = "↑↓ Scroll   ESC Close";
        self.front.put_clipped(r.x as usize + 2, (r.y + r.h).saturating_sub(2) as usize, footer, inner_w, DIM, WINDOW_BG);
    }

    fn compose_image_window(&mut self, c: &ViewModeController, v: Viewport) {
        let w = &c.session.popups.image;
        let r = layout::popup_rect(v);
        let path = w.image_path.as_deref().unwrap_or("");
        self.front.frame(r, path, GOLD, WINDOW_BG);
        let inner_w = (r.w as usize).saturating_sub(4);
        let mid = r.y as usize + r.h as usize / 2;
        let x = r.x as usize + 2;
        self.front.put_clipped(x, mid.saturating_sub(1), &format!("[ image: {path} ]"), inner_w, LINK, WINDOW_BG);
        self.front.put_clipped(x, mid + 1, "Try 'exif' or 'strings' on it in the terminal.", inner_w, DIM, WINDOW_BG);
        self.front.put_clipped(x, (r.y + r.h).saturating_sub(2) as usize, "ESC Close", inner_w, DIM, WINDOW_BG);
    }

    fn compose_password_window(&mut self, c: &ViewModeController, v: Viewport) {
        let w = &c.session.popups.password;
        let p = layout::popup_rect(v);
        let r = Rect { x: p.x, y: (p.y + p.h / 2).saturating_sub(3), w: p.w, h: 6.min(p.h) };
        self.front.frame(r, "Password Required", ERROR, WINDOW_BG);
        let inner_w = (r.w as usize).saturating_sub(4);
        let x = r.x as usize + 2;
        let target = w.target.as_deref().unwrap_or("archive");
        self.front.put_clipped(x, r.y as usize + 1, &format!("Enter password for '{target}':"), inner_w, TEXT, WINDOW_BG);
        self.front.put_clipped(x, r.y as usize + 2, &format!("> {}_", w.masked()), inner_w, HI, WINDOW_BG);
        self.front.put_clipped(x, r.y as usize + 4, "ENTER Unzip   ESC Cancel", inner_w, DIM, WINDOW_BG);
    }

    // ── Presentation & transition ──

    fn compose_presentation(&mut self, c: &ViewModeController, v: Viewport) {
        let p = &c.session.presenter;
        let h = (v.height / 3).max(7).min(v.height);
        let r = Rect { x: 1, y: v.height.saturating_sub(h + 1), w: v.width.saturating_sub(2), h };
        let title = format!("NullX  {}/{}", p.segment_index() + 1, p.segment_count());
        self.front.frame(r, &title, HI, WINDOW_BG);

        if let Some(seg) = p.current() {
            let art = format!("( {} )", seg.image.trim_end_matches(".png"));
            self.front.put_centered((r.y / 2) as usize, &art, GOLD, Color::Reset);
        }

        let inner_w = (r.w as usize).saturating_sub(4);
        let rows = (r.h as usize).saturating_sub(3);
        for (i, line) in wrap(p.visible_text(), inner_w).iter().take(rows).enumerate() {
            self.front.put_str(r.x as usize + 2, r.y as usize + 1 + i, line, TEXT, WINDOW_BG);
        }
        let hint = if p.is_typing() { "ENTER Reveal   ESC Skip" } else { "ENTER Next   ESC Skip" };
        self.front.put_clipped(r.x as usize + 2, (r.y + r.h).saturating_sub(2) as usize, hint, inner_w, DIM, WINDOW_BG);
    }

    fn compose_transition(&mut self, c: &ViewModeController, v: Viewport) {
        let Some(info) = &c.session.transition else { return };
        let alpha = info.alpha(c.session.clock);
        self.front.fill(Rect { x: 0, y: 0, w: v.width, h: v.height }, Color::Black);
        let lines: Vec<&str> = info.message.split('\n').collect();
        let top = (v.height as usize / 2).saturating_sub(lines.len() / 2);
        for (i, line) in lines.iter().enumerate() {
            let fg = fade(if i == 0 { HI } else { TEXT }, alpha);
            self.front.put_centered(top + i, line, fg, Color::Black);
        }
    }
}

fn semantic(color: SemanticColor) -> Color {
    match color {
        SemanticColor::Text => TEXT,
        SemanticColor::Success => HI,
        SemanticColor::Error => ERROR,
        SemanticColor::Hint => GOLD,
    }
}

/// Scale an RGB colour toward black by `alpha` in [0, 1].
fn fade(color: Color, alpha: f32) -> Color {
    let a = alpha.clamp(0.0, 1.0);
    match color {
        Color::Rgb { r, g, b } => Color::Rgb {
            r: (r as f32 * a) as u8,
            g: (g as f32 * a) as u8,
            b: (b as f32 * a) as u8,
        },
        _ if a < 0.5 => Color::Black,
        other => other,
    }
}

/// Greedy word wrap; explicit newlines are kept.
fn wrap(text: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut out = Vec::new();
    for para in text.split('\n') {
        let mut line = String::new();
        for word in para.split(' ') {
            let needed = if line.is_empty() { word.chars().count() } else { line.chars().count() + 1 + word.chars().count() };
            if needed > width && !line.is_empty() {
                out.push(std::mem::take(&mut line));
            }
            if !line.is_empty() {
                line.push(' ');
            }
            line.push_str(word);
        }
        out.push(line);
    }
    out
}

/// Screen geometry shared by input hit-testing and the renderer.
///
/// Everything is in terminal cells. The last row is the taskbar.

use crate::domain::desktop::Rect;

pub const MENU_ROW_WIDTH: u16 = 28;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Viewport {
    pub width: u16,
    pub height: u16,
}

impl Default for Viewport {
    fn default() -> Self {
        Viewport { width: 80, height: 24 }
    }
}

/// Area the desktop icons flow into.
pub fn desktop_area(v: Viewport) -> Rect {
    Rect {
        x: 2,
        y: 1,
        w: v.width.saturating_sub(4),
        h: v.height.saturating_sub(2),
    }
}

/// Terminal window: the lower half of the screen above the taskbar.
pub fn terminal_rect(v: Viewport) -> Rect {
    let h = (v.height / 2).max(6).min(v.height.saturating_sub(1));
    Rect {
        x: 1,
        y: v.height.saturating_sub(h + 1),
        w: v.width.saturating_sub(2),
        h,
    }
}

/// Output rows inside the terminal window (minus borders and prompt).
pub fn terminal_view_rows(v: Viewport) -> usize {
    terminal_rect(v).h.saturating_sub(3) as usize
}

/// Centered popup window.
pub fn popup_rect(v: Viewport) -> Rect {
    let w = (v.width * 3 / 5).max(20).min(v.width);
    let h = (v.height * 3 / 5).max(8).min(v.height);
    Rect {
        x: (v.width - w) / 2,
        y: (v.height - h) / 2,
        w,
        h,
    }
}

/// One rect per menu row, centered, every other line.
pub fn menu_rows(v: Viewport, count: usize) -> Vec<Rect> {
    let w = MENU_ROW_WIDTH.min(v.width);
    let x = (v.width - w) / 2;
    let top = (v.height / 2).saturating_sub(count as u16);
    (0..count as u16)
        .map(|i| Rect { x, y: top + i * 2, w, h: 1 })
        .collect()
}

pub fn menu_hit(v: Viewport, count: usize, col: u16, row: u16) -> Option<usize> {
    menu_rows(v, count).iter().position(|r| r.contains(col, row))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_sits_above_the_taskbar() {
        let v = Viewport { width: 80, height: 24 };
        let t = terminal_rect(v);
        assert_eq!(t.y + t.h, 23);
        assert_eq!(terminal_view_rows(v), 9);
    }

    #[test]
    fn menu_rows_hit_by_row() {
        let v = Viewport::default();
        let rows = menu_rows(v, 4);
        assert_eq!(rows.len(), 4);
        assert_eq!(menu_hit(v, 4, rows[2].x, rows[2].y), Some(2));
        assert_eq!(menu_hit(v, 4, rows[2].x, rows[2].y + 1), None);
    }

    #[test]
    fn tiny_viewport_does_not_underflow() {
        let v = Viewport { width: 10, height: 4 };
        let _ = terminal_rect(v);
        let _ = popup_rect(v);
        assert_eq!(menu_rows(v, 4).len(), 4);
    }
}

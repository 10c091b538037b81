/// Desktop element registries.
///
/// Permanent elements (the Terminal icon) survive level changes; temporary
/// elements are rebuilt from the level's files on every load and grow when
/// commands create files. Screen rectangles are recomputed on every layout
/// pass and never persisted.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::domain::level::{FileAction, FileDescriptor, IconType};

pub const TERMINAL_ELEMENT: &str = "Terminal";

/// Resolved icon for an icon type.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct IconResource {
    pub glyph: &'static str,
}

/// Fixed icon lookup table shared by asset loading and snapshot restore.
pub fn icon_for(icon_type: IconType) -> IconResource {
    match icon_type {
        IconType::Text => IconResource { glyph: "[TXT]" },
        IconType::Pdf => IconResource { glyph: "[PDF]" },
        IconType::Filanaly => IconResource { glyph: "[BIN]" },
        IconType::Executable => IconResource { glyph: "[EXE]" },
        IconType::Zip => IconResource { glyph: "[ZIP]" },
        IconType::Png => IconResource { glyph: "[PNG]" },
        IconType::Image => IconResource { glyph: "[IMG]" },
        IconType::Terminal => IconResource { glyph: "[>_]" },
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct Rect {
    pub x: u16,
    pub y: u16,
    pub w: u16,
    pub h: u16,
}

impl Rect {
    pub fn contains(&self, col: u16, row: u16) -> bool {
        col >= self.x && col < self.x.saturating_add(self.w)
            && row >= self.y && row < self.y.saturating_add(self.h)
    }
}

/// Minimal reconstruction data for one element; what a snapshot stores.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct ElementSpec {
    pub icon_type: IconType,
    pub clickable: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<FileAction>,
}

/// Live registry entry.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct DesktopElement {
    pub name: String,
    pub label: String,
    pub icon: IconResource,
    pub icon_type: IconType,
    pub clickable: bool,
    pub target_image: Option<String>,
    pub target_text: Option<String>,
    pub action: Option<FileAction>,
    pub rect: Option<Rect>,
}

impl DesktopElement {
    pub fn from_descriptor(name: &str, desc: &FileDescriptor) -> Self {
        DesktopElement {
            name: name.to_string(),
            label: name.to_string(),
            icon: icon_for(desc.icon_type),
            icon_type: desc.icon_type,
            clickable: desc.clickable,
            target_image: desc.target_image.clone(),
            target_text: desc.target_text.clone(),
            action: desc.action,
            rect: None,
        }
    }

    pub fn from_spec(name: &str, spec: &ElementSpec) -> Self {
        Self::from_descriptor(name, &FileDescriptor {
            icon_type: spec.icon_type,
            clickable: spec.clickable,
            target_image: spec.target_image.clone(),
            target_text: spec.target_text.clone(),
            action: spec.action,
        })
    }

    pub fn spec(&self) -> ElementSpec {
        ElementSpec {
            icon_type: self.icon_type,
            clickable: self.clickable,
            target_image: self.target_image.clone(),
            target_text: self.target_text.clone(),
            action: self.action,
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Scope {
    Permanent,
    Temporary,
}

#[derive(Clone, Debug, Default)]
pub struct Desktop {
    pub permanent: BTreeMap<String, DesktopElement>,
    pub temporary: BTreeMap<String, DesktopElement>,
}

impl Desktop {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, scope: Scope, name: &str, desc: &FileDescriptor) {
        let element = DesktopElement::from_descriptor(name, desc);
        match scope {
            Scope::Permanent => self.permanent.insert(name.to_string(), element),
            Scope::Temporary => self.temporary.insert(name.to_string(), element),
        };
    }

    pub fn ensure_terminal(&mut self) {
        if !self.permanent.contains_key(TERMINAL_ELEMENT) {
            self.add(Scope::Permanent, TERMINAL_ELEMENT, &FileDescriptor::terminal());
        }
    }

    pub fn clear_temporary(&mut self) {
        self.temporary.clear();
    }

    pub fn clear_all(&mut self) {
        self.permanent.clear();
        self.temporary.clear();
    }

    /// Visible element by name; a temporary entry shadows a permanent one.
    pub fn get(&self, name: &str) -> Option<&DesktopElement> {
        self.temporary.get(name).or_else(|| self.permanent.get(name))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn has_temporary(&self, name: &str) -> bool {
        self.temporary.contains_key(name)
    }

    /// Sorted union of permanent and temporary names.
    pub fn visible_names(&self) -> Vec<String> {
        let names: BTreeSet<&String> = self.permanent.keys().chain(self.temporary.keys()).collect();
        names.into_iter().cloned().collect()
    }

    /// Visible elements in display order: permanent first, then temporary.
    /// A temporary entry shadows a permanent one of the same name.
    pub fn elements(&self) -> impl Iterator<Item = &DesktopElement> {
        self.permanent
            .values()
            .filter(|e| !self.temporary.contains_key(&e.name))
            .chain(self.temporary.values())
    }

    pub fn visible_types(&self) -> BTreeSet<IconType> {
        self.elements().map(|e| e.icon_type).collect()
    }

    /// Lay icons out left to right, wrapping at `width` columns.
    pub fn layout(&mut self, origin_x: u16, origin_y: u16, width: u16) {
        const CELL_W: u16 = 20;
        const CELL_H: u16 = 4;
        let per_row = (width / CELL_W).max(1);
        let mut index = 0u16;
        let Desktop { permanent, temporary } = self;
        let shadowed: BTreeSet<String> = temporary.keys().cloned().collect();
        for e in permanent.values_mut() {
            if shadowed.contains(&e.name) {
                e.rect = None;
                continue;
            }
            e.rect = Some(cell_rect(index, per_row, origin_x, origin_y, CELL_W, CELL_H));
            index = index.saturating_add(1);
        }
        for e in temporary.values_mut() {
            e.rect = Some(cell_rect(index, per_row, origin_x, origin_y, CELL_W, CELL_H));
            index = index.saturating_add(1);
        }
    }

    pub fn hit_test(&self, col: u16, row: u16) -> Option<&str> {
        self.elements()
            .find(|e| e.rect.map_or(false, |r| r.contains(col, row)))
            .map(|e| e.name.as_str())
    }
}

fn cell_rect(index: u16, per_row: u16, ox: u16, oy: u16, w: u16, h: u16) -> Rect {
    Rect {
        x: ox.saturating_add((index % per_row).saturating_mul(w)),
        y: oy.saturating_add((index / per_row).saturating_mul(h)),
        w: w.saturating_sub(2),
        h: h.saturating_sub(1),
    }
}

// ══════════════════════════════════════════════════════════════
// Tests
// ══════════════════════════════════════════════════════════════

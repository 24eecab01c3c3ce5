//! Context menu contents and navigation.

use ratatui::style::Color;

use crate::config::Preset;
use crate::geometry::Point;

#[derive(Debug, Clone, PartialEq)]
pub enum MenuAction {
    Stop,
    Start(Preset),
    Custom,
    Exit,
}

#[derive(Debug, Clone, PartialEq)]
pub enum MenuEntry {
    Item {
        label: String,
        swatch: Option<Color>,
        action: MenuAction,
    },
    Separator,
}

impl MenuEntry {
    pub fn item(label: impl Into<String>, action: MenuAction) -> Self {
        Self::Item { label: label.into(), swatch: None, action }
    }

    pub fn action(&self) -> Option<&MenuAction> {
        match self {
            Self::Item { action, .. } => Some(action),
            Self::Separator => None,
        }
    }
}

/// An open menu: rows start one cell below/right of `origin` (inside the
/// border), one entry per row.
#[derive(Debug, Clone)]
pub struct ContextMenu {
    pub origin: Point,
    pub entries: Vec<MenuEntry>,
    pub selected: usize,
}

impl ContextMenu {
    pub fn new(origin: Point, entries: Vec<MenuEntry>) -> Self {
        let selected = entries.iter().position(|e| e.action().is_some()).unwrap_or(0);
        Self { origin, entries, selected }
    }

    /// Inner width: widest label plus room for a color swatch.
    pub fn content_width(&self) -> usize {
        self.entries
            .iter()
            .map(|e| match e {
                MenuEntry::Item { label, .. } => label.chars().count() + 3,
                MenuEntry::Separator => 1,
            })
            .max()
            .unwrap_or(1)
    }

    pub fn select_next(&mut self) {
        self.step(1);
    }

    pub fn select_prev(&mut self) {
        self.step(self.entries.len().saturating_sub(1));
    }

    fn step(&mut self, by: usize) {
        let len = self.entries.len();
        if len == 0 {
            return;
        }
        for _ in 0..len {
            self.selected = (self.selected + by) % len;
            if self.entries[self.selected].action().is_some() {
                return;
            }
        }
    }

    pub fn selected_action(&self) -> Option<&MenuAction> {
        self.entries.get(self.selected).and_then(MenuEntry::action)
    }

    /// Entry row under a screen point, if any.
    pub fn entry_at(&self, p: Point) -> Option<usize> {
        let left = self.origin.x + 1;
        let right = left + self.content_width() as i32 - 1;
        let row = p.y - (self.origin.y + 1);
        if p.x < left || p.x > right || row < 0 {
            return None;
        }
        let row = row as usize;
        (row < self.entries.len()).then_some(row)
    }

    pub fn hover(&mut self, p: Point) {
        if let Some(idx) = self.entry_at(p) {
            if self.entries[idx].action().is_some() {
                self.selected = idx;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ContextMenu {
        ContextMenu::new(
            Point::new(5, 5),
            vec![
                MenuEntry::item("Stop", MenuAction::Stop),
                MenuEntry::Separator,
                MenuEntry::item("Custom", MenuAction::Custom),
                MenuEntry::Separator,
                MenuEntry::item("Exit", MenuAction::Exit),
            ],
        )
    }

    #[test]
    fn test_navigation_skips_separators() {
        let mut menu = sample();
        assert_eq!(menu.selected_action(), Some(&MenuAction::Stop));
        menu.select_next();
        assert_eq!(menu.selected_action(), Some(&MenuAction::Custom));
        menu.select_next();
        assert_eq!(menu.selected_action(), Some(&MenuAction::Exit));
        menu.select_next();
        assert_eq!(menu.selected_action(), Some(&MenuAction::Stop));
        menu.select_prev();
        assert_eq!(menu.selected_action(), Some(&MenuAction::Exit));
    }

    #[test]
    fn test_entry_hit_testing() {
        let mut menu = sample();
        assert_eq!(menu.content_width(), 9);
        assert_eq!(menu.entry_at(Point::new(6, 6)), Some(0));
        assert_eq!(menu.entry_at(Point::new(14, 8)), Some(2));
        assert_eq!(menu.entry_at(Point::new(15, 8)), None);
        assert_eq!(menu.entry_at(Point::new(6, 5)), None);
        assert_eq!(menu.entry_at(Point::new(6, 11)), None);

        menu.hover(Point::new(7, 7));
        assert_eq!(menu.selected, 0);
        menu.hover(Point::new(7, 10));
        assert_eq!(menu.selected_action(), Some(&MenuAction::Exit));
    }
}

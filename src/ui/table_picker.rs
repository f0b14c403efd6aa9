//! Table picker
//!
//! Lists the tables the connected user owns. Moving the selection does not
//! load anything; Enter (or a click) applies it.

use std::cell::Cell;

use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::Paragraph;

use crate::ui::Component;
use crate::ui::layout::contains;
use crate::ui::theme::Theme;

#[derive(Default)]
pub struct TablePicker {
    tables: Vec<String>,
    selected: usize,
    /// First visible entry, sticky across renders
    offset: Cell<usize>,
    /// Area of the last render
    area: Cell<Rect>,
}

impl TablePicker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the list, keeping the selected table when it is still present
    pub fn set_tables(&mut self, tables: Vec<String>) {
        let previous = self.selected_table().map(str::to_string);
        self.tables = tables;
        self.selected = previous
            .and_then(|name| self.tables.iter().position(|t| *t == name))
            .unwrap_or(0);
        self.offset.set(0);
    }

    pub fn clear(&mut self) {
        self.set_tables(Vec::new());
    }

    pub fn tables(&self) -> &[String] {
        &self.tables
    }

    pub fn selected_table(&self) -> Option<&str> {
        self.tables.get(self.selected).map(String::as_str)
    }

    pub fn move_up(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    pub fn move_down(&mut self) {
        if self.selected + 1 < self.tables.len() {
            self.selected += 1;
        }
    }

    /// Navigation keys; returns false for anything else
    pub fn handle_key(&mut self, key: KeyEvent) -> bool {
        match key.code {
            KeyCode::Up | KeyCode::Char('k') => self.move_up(),
            KeyCode::Down | KeyCode::Char('j') => self.move_down(),
            KeyCode::Home | KeyCode::Char('g') => self.selected = 0,
            KeyCode::End | KeyCode::Char('G') => {
                self.selected = self.tables.len().saturating_sub(1)
            }
            _ => return false,
        }
        true
    }

    /// Select the entry drawn at row `y`; returns whether one was hit
    pub fn click(&mut self, x: u16, y: u16) -> bool {
        let area = self.area.get();
        if !contains(area, x, y) {
            return false;
        }
        let idx = self.offset.get() + (y - area.y) as usize;
        if idx < self.tables.len() {
            self.selected = idx;
            true
        } else {
            false
        }
    }
}

impl Component for TablePicker {
    fn render(&self, frame: &mut Frame, area: Rect, focused: bool, theme: &Theme) {
        self.area.set(area);
        if self.tables.is_empty() {
            frame.render_widget(
                Paragraph::new("(no tables)").style(theme.picker_empty),
                area,
            );
            return;
        }

        let height = area.height as usize;
        let mut offset = self.offset.get();
        if self.selected < offset {
            offset = self.selected;
        } else if height > 0 && self.selected >= offset + height {
            offset = self.selected + 1 - height;
        }
        self.offset.set(offset);

        for (i, name) in self.tables.iter().enumerate().skip(offset).take(height) {
            let style = if i == self.selected && focused {
                theme.picker_selected
            } else if i == self.selected {
                theme.picker_item.add_modifier(Modifier::BOLD)
            } else {
                theme.picker_item
            };
            let marker = if i == self.selected { "\u{25b8} " } else { "  " };
            frame.render_widget(
                Paragraph::new(format!("{marker}{name}")).style(style),
                Rect::new(area.x, area.y + (i - offset) as u16, area.width, 1),
            );
        }
    }
}

//! Table grid widget
//!
//! Displays the loaded table with cell-level selection and an inline cell
//! editor. The grid never writes to the database itself: it turns gestures
//! into [`GridEvent`]s and only changes a cell's value when told the write
//! succeeded.

use std::cell::Cell;

use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::Paragraph;
use unicode_truncate::{Alignment, UnicodeTruncateStr};
use unicode_width::UnicodeWidthStr;

use crate::db::types::{CellValue, Row};
use crate::edit_gate::{CellChange, GridEvent};
use crate::loader::LoadedTable;
use crate::ui::Component;
use crate::ui::input::TextInput;
use crate::ui::layout::contains;
use crate::ui::theme::Theme;

const MIN_COL_WIDTH: u16 = 4;
const MAX_COL_WIDTH: u16 = 40;
const WIDTH_SAMPLE_ROWS: usize = 100;
const PAGE_SIZE: usize = 20;

/// What the inline editor did with a key
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditorAction {
    /// The cell's content was replaced
    Commit(CellChange),
    /// The editor closed without a change
    Closed,
    /// Key consumed, editor still open
    Consumed,
}

#[derive(Debug, Clone)]
struct CellEditor {
    row: usize,
    column: usize,
    original: String,
    input: TextInput,
}

/// Scroll position and area of the last render, used for mouse hit-testing
#[derive(Debug, Clone, Copy, Default)]
struct Viewport {
    area: Rect,
    first_row: usize,
    first_col: usize,
}

#[derive(Default)]
pub struct Grid {
    table_name: String,
    columns: Vec<String>,
    rows: Vec<Row>,
    filter_column: Option<String>,
    selected_row: usize,
    selected_col: usize,
    col_widths: Vec<u16>,
    editor: Option<CellEditor>,
    viewport: Cell<Viewport>,
}

impl Grid {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace everything shown with a freshly loaded table.
    ///
    /// The selected column survives when it exists in the new table so a
    /// re-applied filter keeps targeting the same column.
    pub fn set_table(&mut self, loaded: LoadedTable) {
        self.table_name = loaded.table.name;
        self.columns = loaded.table.columns;
        self.rows = loaded.rows;
        self.filter_column = loaded.filter_column;
        self.col_widths = compute_column_widths(&self.columns, &self.rows);
        self.editor = None;
        self.selected_row = 0;
        if self.selected_col >= self.columns.len() {
            self.selected_col = 0;
        }
        self.viewport.set(Viewport::default());
    }

    pub fn clear(&mut self) {
        self.set_table(LoadedTable::default());
        self.selected_col = 0;
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    /// Focused column index, `None` for a table without columns
    pub fn selected_column(&self) -> Option<usize> {
        (!self.columns.is_empty()).then_some(self.selected_col)
    }

    /// (row, column) of the selected cell, if the grid has one
    pub fn selected_cell(&self) -> Option<(usize, usize)> {
        (self.selected_row < self.rows.len() && self.selected_col < self.columns.len())
            .then_some((self.selected_row, self.selected_col))
    }

    pub fn cell_text(&self, row: usize, column: usize) -> Option<String> {
        let cell = self.rows.get(row)?.values.get(column)?;
        Some(cell.display_text())
    }

    /// Column 0's displayed text for `row`
    pub fn row_id(&self, row: usize) -> Option<String> {
        self.cell_text(row, 0)
    }

    pub fn is_editing(&self) -> bool {
        self.editor.is_some()
    }

    pub fn select_cell(&mut self, row: usize, column: usize) {
        if row < self.rows.len() && column < self.columns.len() {
            self.selected_row = row;
            self.selected_col = column;
        }
    }

    /// Open the inline editor on the selected cell.
    ///
    /// Returns the arming gesture, or `None` when no cell is selected.
    pub fn begin_edit(&mut self) -> Option<GridEvent> {
        let (row, column) = self.selected_cell()?;
        let original = match self.rows[row].values.get(column) {
            Some(CellValue::Null) | None => String::new(),
            Some(value) => value.display_text(),
        };
        self.editor = Some(CellEditor {
            row,
            column,
            input: TextInput::with_value(original.clone()),
            original,
        });
        Some(GridEvent::CellDoubleClicked { row, column })
    }

    pub fn cancel_edit(&mut self) {
        self.editor = None;
    }

    /// Feed a key to the open inline editor
    pub fn editor_key(&mut self, key: KeyEvent) -> EditorAction {
        let Some(editor) = self.editor.as_mut() else {
            return EditorAction::Closed;
        };

        match key.code {
            KeyCode::Esc => {
                self.editor = None;
                EditorAction::Closed
            }
            KeyCode::Enter => {
                let Some(editor) = self.editor.take() else {
                    return EditorAction::Closed;
                };
                if editor.input.value() == editor.original {
                    return EditorAction::Closed;
                }
                match self.change_for(editor.row, editor.column, editor.input.value()) {
                    Some(change) => EditorAction::Commit(change),
                    None => EditorAction::Closed,
                }
            }
            _ => {
                editor.input.handle_key(key);
                EditorAction::Consumed
            }
        }
    }

    /// Handle pasted text: into the editor when open, otherwise as a direct
    /// content change of the selected cell
    pub fn paste(&mut self, text: &str) -> Option<CellChange> {
        if let Some(editor) = self.editor.as_mut() {
            editor.input.insert_str(text);
            return None;
        }
        let (row, column) = self.selected_cell()?;
        self.change_for(row, column, text)
    }

    fn change_for(&self, row: usize, column: usize, value: &str) -> Option<CellChange> {
        Some(CellChange {
            row,
            column,
            value: value.to_string(),
            row_id: self.row_id(row)?,
        })
    }

    /// Show a value the database accepted
    pub fn apply_change(&mut self, change: &CellChange) {
        if let Some(cell) = self
            .rows
            .get_mut(change.row)
            .and_then(|row| row.values.get_mut(change.column))
        {
            *cell = CellValue::Text(change.value.clone());
        }
    }

    pub fn move_up(&mut self) {
        self.selected_row = self.selected_row.saturating_sub(1);
    }

    pub fn move_down(&mut self) {
        if self.selected_row + 1 < self.rows.len() {
            self.selected_row += 1;
        }
    }

    pub fn move_left(&mut self) {
        self.selected_col = self.selected_col.saturating_sub(1);
    }

    pub fn move_right(&mut self) {
        if self.selected_col + 1 < self.columns.len() {
            self.selected_col += 1;
        }
    }

    pub fn page_up(&mut self) {
        self.selected_row = self.selected_row.saturating_sub(PAGE_SIZE);
    }

    pub fn page_down(&mut self) {
        self.selected_row = (self.selected_row + PAGE_SIZE).min(self.rows.len().saturating_sub(1));
    }

    pub fn go_to_top(&mut self) {
        self.selected_row = 0;
    }

    pub fn go_to_bottom(&mut self) {
        self.selected_row = self.rows.len().saturating_sub(1);
    }

    pub fn go_to_home(&mut self) {
        self.selected_col = 0;
    }

    pub fn go_to_end(&mut self) {
        self.selected_col = self.columns.len().saturating_sub(1);
    }

    /// Navigation keys; returns false for anything else
    pub fn handle_nav_key(&mut self, key: KeyEvent) -> bool {
        match key.code {
            KeyCode::Up | KeyCode::Char('k') => self.move_up(),
            KeyCode::Down | KeyCode::Char('j') => self.move_down(),
            KeyCode::Left | KeyCode::Char('h') => self.move_left(),
            KeyCode::Right | KeyCode::Char('l') => self.move_right(),
            KeyCode::PageUp => self.page_up(),
            KeyCode::PageDown => self.page_down(),
            KeyCode::Char('g') => self.go_to_top(),
            KeyCode::Char('G') => self.go_to_bottom(),
            KeyCode::Home | KeyCode::Char('0') => self.go_to_home(),
            KeyCode::End | KeyCode::Char('$') => self.go_to_end(),
            _ => return false,
        }
        true
    }

    /// The data cell drawn at screen position (`x`, `y`) in the last render
    pub fn cell_at(&self, x: u16, y: u16) -> Option<(usize, usize)> {
        let vp = self.viewport.get();
        if !contains(vp.area, x, y) || y == vp.area.y {
            return None;
        }
        let visible_height = (vp.area.height as usize).saturating_sub(2);
        let offset = (y - vp.area.y - 1) as usize;
        if offset >= visible_height {
            return None;
        }
        let row = vp.first_row + offset;
        if row >= self.rows.len() {
            return None;
        }

        let mut cx = vp.area.x;
        for col in vp.first_col..self.columns.len() {
            let w = self.col_widths.get(col).copied().unwrap_or(MIN_COL_WIDTH);
            if x >= cx && x < cx.saturating_add(w) {
                return Some((row, col));
            }
            cx = cx.saturating_add(w + 1);
            if cx >= vp.area.x + vp.area.width {
                break;
            }
        }
        None
    }

    /// Scroll offsets that keep the selection visible in `area`
    fn scroll_for(&self, area: Rect) -> (usize, usize) {
        let previous = self.viewport.get();
        let visible_height = (area.height as usize).saturating_sub(2).max(1);

        let first_row = if self.selected_row < previous.first_row {
            self.selected_row
        } else if self.selected_row >= previous.first_row + visible_height {
            self.selected_row + 1 - visible_height
        } else {
            previous.first_row
        };

        let mut first_col = previous.first_col.min(self.selected_col);
        loop {
            let span: u16 = (first_col..=self.selected_col)
                .map(|c| self.col_widths.get(c).copied().unwrap_or(MIN_COL_WIDTH) + 1)
                .sum();
            if span <= area.width + 1 || first_col == self.selected_col {
                break;
            }
            first_col += 1;
        }

        (first_row, first_col)
    }
}

impl Component for Grid {
    fn render(&self, frame: &mut Frame, area: Rect, focused: bool, theme: &Theme) {
        if self.columns.is_empty() {
            let msg = if self.table_name.is_empty() {
                "No table loaded. Pick a table and press Enter."
            } else {
                "Table has no columns"
            };
            frame.render_widget(Paragraph::new(msg).style(theme.grid_empty), area);
            self.viewport.set(Viewport::default());
            return;
        }

        if area.height < 3 || area.width < 5 {
            return;
        }

        let (first_row, first_col) = self.scroll_for(area);
        self.viewport.set(Viewport {
            area,
            first_row,
            first_col,
        });
        let visible_height = (area.height as usize) - 2;
        let right_edge = area.x + area.width;

        // Header row
        let mut x = area.x;
        for (col_idx, name) in self.columns.iter().enumerate().skip(first_col) {
            if x >= right_edge {
                break;
            }
            let w = self.col_widths[col_idx].min(right_edge - x);
            let style = if focused && col_idx == self.selected_col {
                theme.grid_header_selected
            } else {
                theme.grid_header
            };
            frame.render_widget(
                Paragraph::new(fit_to_width(name, w)).style(style),
                Rect::new(x, area.y, w, 1),
            );
            x += w + 1;
        }

        // Data rows
        for (vis_row, row_idx) in (first_row..self.rows.len()).take(visible_height).enumerate() {
            let row = &self.rows[row_idx];
            let y = area.y + 1 + vis_row as u16;
            let base_style = if vis_row % 2 == 0 {
                theme.grid_row_even
            } else {
                theme.grid_row_odd
            };

            let mut x = area.x;
            for col_idx in first_col..self.columns.len() {
                if x >= right_edge {
                    break;
                }
                let w = self.col_widths[col_idx].min(right_edge - x);
                let cell_area = Rect::new(x, y, w, 1);
                x += w + 1;

                if let Some(editor) = &self.editor
                    && editor.row == row_idx
                    && editor.column == col_idx
                {
                    let visible = editor.input.visible(w as usize);
                    frame.render_widget(
                        Paragraph::new(fit_to_width(&visible.text, w)).style(theme.grid_editor),
                        cell_area,
                    );
                    let cursor_x = cell_area.x + (visible.cursor_offset as u16).min(w - 1);
                    frame.set_cursor_position((cursor_x, y));
                    continue;
                }

                let cell = row.values.get(col_idx).unwrap_or(&CellValue::Null);
                let style = if focused && row_idx == self.selected_row && col_idx == self.selected_col {
                    theme.grid_selected
                } else if cell.is_null() {
                    theme.grid_null
                } else {
                    base_style
                };
                let text = cell.display_text().replace(['\n', '\r'], " ");
                frame.render_widget(Paragraph::new(fit_to_width(&text, w)).style(style), cell_area);
            }
        }

        if self.rows.is_empty() {
            frame.render_widget(
                Paragraph::new("(no rows)").style(theme.grid_empty),
                Rect::new(area.x, area.y + 1, area.width, 1),
            );
        }

        // Footer
        let mut footer = format!(
            "Row {}/{} | Col {}/{} | {}",
            (self.selected_row + 1).min(self.rows.len()),
            self.rows.len(),
            self.selected_col + 1,
            self.columns.len(),
            self.table_name,
        );
        if let Some(column) = &self.filter_column {
            footer.push_str(&format!(" | filtered on {}", column));
        }
        if self.is_editing() {
            footer.push_str(" | editing: Enter=save Esc=cancel");
        }
        frame.render_widget(
            Paragraph::new(footer).style(theme.grid_footer),
            Rect::new(area.x, area.y + area.height - 1, area.width, 1),
        );
    }
}

fn compute_column_widths(columns: &[String], rows: &[Row]) -> Vec<u16> {
    let mut widths: Vec<usize> = columns.iter().map(|c| c.width() + 1).collect();

    for row in rows.iter().take(WIDTH_SAMPLE_ROWS) {
        for (i, cell) in row.values.iter().enumerate().take(widths.len()) {
            widths[i] = widths[i].max(cell.display_text().width() + 1);
        }
    }

    widths
        .into_iter()
        .map(|w| (w.min(MAX_COL_WIDTH as usize) as u16).max(MIN_COL_WIDTH))
        .collect()
}

/// Pad or truncate `s` to exactly `width` display cells
fn fit_to_width(s: &str, width: u16) -> String {
    let width = width as usize;
    if s.width() <= width {
        return s.unicode_pad(width, Alignment::Left, false).into_owned();
    }
    let (head, _) = s.unicode_truncate(width.saturating_sub(1));
    format!("{head}\u{2026}").unicode_pad(width, Alignment::Left, true).into_owned()
}

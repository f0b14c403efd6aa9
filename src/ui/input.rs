//! Single-line text input
//!
//! Shared by the connection form fields, the filter bar and the grid's inline
//! cell editor. The cursor is a byte index that always sits on a char boundary.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use unicode_width::UnicodeWidthChar;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextInput {
    value: String,
    cursor: usize,
}

/// The part of an input that fits a given display width
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisibleSlice {
    pub text: String,
    /// Cursor column within `text`, in display cells
    pub cursor_offset: usize,
}

impl TextInput {
    pub fn new() -> Self {
        Self::default()
    }

    /// Input holding `value` with the cursor at the end
    pub fn with_value(value: impl Into<String>) -> Self {
        let value = value.into();
        let cursor = value.len();
        Self { value, cursor }
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn set(&mut self, value: impl Into<String>) {
        self.value = value.into();
        self.cursor = self.value.len();
    }

    pub fn clear(&mut self) {
        self.value.clear();
        self.cursor = 0;
    }

    /// Insert text at the cursor; line breaks become spaces
    pub fn insert_str(&mut self, text: &str) {
        let cleaned: String = text
            .chars()
            .map(|c| if c == '\n' || c == '\r' { ' ' } else { c })
            .collect();
        self.value.insert_str(self.cursor, &cleaned);
        self.cursor += cleaned.len();
    }

    /// Apply an editing key. Returns false for keys that are not editing keys.
    pub fn handle_key(&mut self, key: KeyEvent) -> bool {
        if key.modifiers.intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) {
            return false;
        }

        match key.code {
            KeyCode::Char(c) => {
                self.value.insert(self.cursor, c);
                self.cursor += c.len_utf8();
            }
            KeyCode::Backspace => {
                if self.cursor > 0 {
                    let prev = self.prev_boundary();
                    self.value.drain(prev..self.cursor);
                    self.cursor = prev;
                }
            }
            KeyCode::Delete => {
                if self.cursor < self.value.len() {
                    let next = self.next_boundary();
                    self.value.drain(self.cursor..next);
                }
            }
            KeyCode::Left => self.cursor = self.prev_boundary(),
            KeyCode::Right => self.cursor = self.next_boundary(),
            KeyCode::Home => self.cursor = 0,
            KeyCode::End => self.cursor = self.value.len(),
            _ => return false,
        }
        true
    }

    fn prev_boundary(&self) -> usize {
        self.value[..self.cursor]
            .char_indices()
            .next_back()
            .map(|(i, _)| i)
            .unwrap_or(0)
    }

    fn next_boundary(&self) -> usize {
        self.cursor
            + self.value[self.cursor..]
                .chars()
                .next()
                .map(|c| c.len_utf8())
                .unwrap_or(0)
    }

    /// The visible window of the value for `width` display cells, scrolled so
    /// the cursor stays in view
    pub fn visible(&self, width: usize) -> VisibleSlice {
        visible_slice(&self.value, self.cursor, width)
    }
}

fn visible_slice(input: &str, cursor: usize, width: usize) -> VisibleSlice {
    let before: Vec<char> = input[..cursor].chars().collect();
    let after = &input[cursor..];
    let char_width = |c: &char| c.width().unwrap_or(0);

    // Walk back from the cursor until the window is full, keeping one cell
    // for the cursor itself.
    let budget = width.saturating_sub(1);
    let mut used = 0;
    let mut start = before.len();
    while start > 0 && used + char_width(&before[start - 1]) <= budget {
        start -= 1;
        used += char_width(&before[start]);
    }

    let mut text: String = before[start..].iter().collect();
    let cursor_offset = used;
    for c in after.chars() {
        if used + char_width(&c) > width {
            break;
        }
        used += char_width(&c);
        text.push(c);
    }

    VisibleSlice {
        text,
        cursor_offset,
    }
}

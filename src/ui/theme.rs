//! UI theme and styling
//!
//! Defines colors, styles, and visual appearance for all UI components.

use ratatui::style::{Color, Modifier, Style};

/// Application theme
#[derive(Debug, Clone)]
pub struct Theme {
    // Panel borders
    pub border_focused: Style,
    pub border_unfocused: Style,

    // Table picker
    pub picker_item: Style,
    pub picker_selected: Style,
    pub picker_empty: Style,

    // Filter bar
    pub filter_label: Style,
    pub filter_input: Style,

    // Grid
    pub grid_header: Style,
    pub grid_header_selected: Style,
    pub grid_row_even: Style,
    pub grid_row_odd: Style,
    pub grid_selected: Style,
    pub grid_null: Style,
    pub grid_editor: Style,
    pub grid_footer: Style,
    pub grid_empty: Style,

    // Connection form
    pub dialog_label: Style,
    pub dialog_input: Style,
    pub dialog_input_focused: Style,
    pub dialog_hint: Style,
    pub dialog_warning: Style,

    // Message box
    pub message_title: Style,
    pub message_error_title: Style,
    pub message_text: Style,

    // Status messages
    pub status_success: Style,
    pub status_error: Style,
    pub status_info: Style,
    pub status_warning: Style,
    pub status_idle: Style,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            // Borders
            border_focused: Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
            border_unfocused: Style::default().fg(Color::DarkGray),

            // Table picker
            picker_item: Style::default().fg(Color::Green),
            picker_selected: Style::default()
                .fg(Color::Black)
                .bg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
            picker_empty: Style::default()
                .fg(Color::DarkGray)
                .add_modifier(Modifier::ITALIC),

            // Filter bar
            filter_label: Style::default()
                .fg(Color::Magenta)
                .add_modifier(Modifier::BOLD),
            filter_input: Style::default().fg(Color::White),

            // Grid
            grid_header: Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
            grid_header_selected: Style::default()
                .fg(Color::Black)
                .bg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
            grid_row_even: Style::default().fg(Color::White),
            grid_row_odd: Style::default().fg(Color::Gray),
            grid_selected: Style::default().fg(Color::Black).bg(Color::Yellow),
            grid_null: Style::default()
                .fg(Color::DarkGray)
                .add_modifier(Modifier::ITALIC),
            grid_editor: Style::default()
                .fg(Color::Black)
                .bg(Color::White)
                .add_modifier(Modifier::BOLD),
            grid_footer: Style::default().fg(Color::DarkGray),
            grid_empty: Style::default().fg(Color::DarkGray),

            // Connection form
            dialog_label: Style::default().fg(Color::Cyan),
            dialog_input: Style::default().fg(Color::Gray),
            dialog_input_focused: Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
            dialog_hint: Style::default().fg(Color::DarkGray),
            dialog_warning: Style::default().fg(Color::Yellow),

            // Message box
            message_title: Style::default()
                .fg(Color::Green)
                .add_modifier(Modifier::BOLD),
            message_error_title: Style::default()
                .fg(Color::Red)
                .add_modifier(Modifier::BOLD),
            message_text: Style::default().fg(Color::White),

            // Status messages
            status_success: Style::default().fg(Color::Green),
            status_error: Style::default().fg(Color::Red),
            status_info: Style::default().fg(Color::Blue),
            status_warning: Style::default().fg(Color::Yellow),
            status_idle: Style::default().fg(Color::DarkGray),
        }
    }
}

impl Theme {
    /// Create a new theme with default colors
    pub fn new() -> Self {
        Self::default()
    }

    /// Get border style based on focus
    pub fn border_style(&self, focused: bool) -> Style {
        if focused {
            self.border_focused
        } else {
            self.border_unfocused
        }
    }
}

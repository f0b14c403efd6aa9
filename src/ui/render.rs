//! Top-level render function
//!
//! Orchestrates rendering of all panels using the layout module.

use crate::app::{App, PanelFocus, StatusLevel};
use crate::ui::Component;
use crate::ui::connection_form::FORM_HEIGHT;
use crate::ui::layout::{calculate_layout, centered_rect};
use crate::ui::theme::Theme;
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Clear, Paragraph};

const FILTER_LABEL: &str = "LIKE ";

/// Render the entire application
pub fn render(frame: &mut Frame, app: &App) {
    let theme = &app.theme;
    app.set_screen(frame.area());
    let layout = calculate_layout(frame.area());

    // Table picker
    let tables_block = Block::default()
        .borders(Borders::ALL)
        .title(" Tables ")
        .border_style(theme.border_style(app.focus == PanelFocus::Tables));
    let tables_inner = tables_block.inner(layout.tables);
    frame.render_widget(tables_block, layout.tables);
    app.table_picker
        .render(frame, tables_inner, app.focus == PanelFocus::Tables, theme);

    // Filter bar
    let filter_block = Block::default()
        .borders(Borders::ALL)
        .title(" Filter ")
        .border_style(theme.border_style(app.focus == PanelFocus::Filter));
    let filter_inner = filter_block.inner(layout.filter);
    frame.render_widget(filter_block, layout.filter);
    render_filter(frame, filter_inner, app, theme);

    // Grid
    let grid_title = if app.grid.table_name().is_empty() {
        " Grid ".to_string()
    } else {
        format!(" {} ", app.grid.table_name())
    };
    let grid_block = Block::default()
        .borders(Borders::ALL)
        .title(grid_title)
        .border_style(theme.border_style(app.focus == PanelFocus::Grid));
    let grid_inner = grid_block.inner(layout.grid);
    frame.render_widget(grid_block, layout.grid);
    app.grid
        .render(frame, grid_inner, app.focus == PanelFocus::Grid, theme);

    render_status_bar(frame, layout.status, app, theme);

    // Overlays
    if app.connection_form.is_visible() {
        let area = centered_rect(60, FORM_HEIGHT, frame.area());
        let block = Block::default()
            .borders(Borders::ALL)
            .title(" Connect ")
            .border_style(theme.border_focused);
        let inner = block.inner(area);
        frame.render_widget(Clear, area);
        frame.render_widget(block, area);
        app.connection_form.render(frame, inner, theme);
    }

    if let Some(message) = &app.message {
        message.render(frame, frame.area(), theme);
    }
}

fn render_filter(frame: &mut Frame, area: Rect, app: &App, theme: &Theme) {
    if area.width == 0 || area.height == 0 {
        return;
    }
    let label_width = FILTER_LABEL.len() as u16;
    let input_width = area.width.saturating_sub(label_width) as usize;
    let visible = app.filter.visible(input_width);

    let line = Line::from(vec![
        Span::styled(FILTER_LABEL, theme.filter_label),
        Span::styled(visible.text, theme.filter_input),
    ]);
    frame.render_widget(Paragraph::new(line), area);

    let overlays_open = app.connection_form.is_visible() || app.message.is_some();
    if app.focus == PanelFocus::Filter && !overlays_open {
        frame.set_cursor_position(Position::new(
            area.x + label_width + visible.cursor_offset as u16,
            area.y,
        ));
    }
}

fn render_status_bar(frame: &mut Frame, area: Rect, app: &App, theme: &Theme) {
    let conn_info = if let Some(ref name) = app.connection_name {
        format!("[{}]", name)
    } else {
        "[disconnected]".to_string()
    };

    if let Some(ref status) = app.status_message {
        let style = match status.level {
            StatusLevel::Info => theme.status_info,
            StatusLevel::Success => theme.status_success,
            StatusLevel::Warning => theme.status_warning,
            StatusLevel::Error => theme.status_error,
        };
        let text = format!("{} {}", conn_info, status.message);
        frame.render_widget(Paragraph::new(text).style(style), area);
    } else {
        let text = format!(
            "{} | Tab: focus  Enter: load/edit  Ctrl+O: connect  Ctrl+R: reload  Ctrl+Q: quit",
            conn_info
        );
        frame.render_widget(Paragraph::new(text).style(theme.status_idle), area);
    }
}

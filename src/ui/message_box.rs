//! Modal message box
//!
//! Shown after connect attempts and for database errors. Any of Enter, Esc or
//! Space dismisses it.

use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};

use crate::ui::layout::centered_rect;
use crate::ui::theme::Theme;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageBox {
    pub title: String,
    pub body: String,
    pub is_error: bool,
}

impl MessageBox {
    pub fn info(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
            is_error: false,
        }
    }

    pub fn error(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
            is_error: true,
        }
    }

    pub fn render(&self, frame: &mut Frame, screen: Rect, theme: &Theme) {
        let body_lines = self.body.lines().count() as u16;
        let area = centered_rect(60, (body_lines + 4).max(5).min(screen.height), screen);

        let title_style = if self.is_error {
            theme.message_error_title
        } else {
            theme.message_title
        };
        let block = Block::default()
            .borders(Borders::ALL)
            .title(Span::styled(format!(" {} ", self.title), title_style))
            .border_style(title_style);
        let inner = block.inner(area);

        frame.render_widget(Clear, area);
        frame.render_widget(block, area);

        if inner.height == 0 {
            return;
        }
        let text_area = Rect::new(inner.x, inner.y, inner.width, inner.height.saturating_sub(1));
        frame.render_widget(
            Paragraph::new(self.body.as_str())
                .style(theme.message_text)
                .wrap(Wrap { trim: false }),
            text_area,
        );
        frame.render_widget(
            Paragraph::new("Enter/Esc to close").style(theme.dialog_hint),
            Rect::new(inner.x, inner.y + inner.height - 1, inner.width, 1),
        );
    }
}

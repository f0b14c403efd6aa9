//! Connection form
//!
//! A modal form with database, user, password, host and port fields plus an
//! SSL mode selector. Submitting produces [`ConnectionParameters`]; required
//! field checks happen in the connection manager and come back through
//! [`ConnectionForm::set_error`].

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::prelude::*;
use ratatui::widgets::Paragraph;

use crate::config::{ConnectionParameters, SslMode};
use crate::ui::input::TextInput;
use crate::ui::theme::Theme;

/// Actions returned by the form to the parent
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormAction {
    /// User submitted the form
    Submit(ConnectionParameters),
    /// User dismissed the form (Esc)
    Dismissed,
    /// Key was consumed by the form
    Consumed,
}

/// Which field currently has focus
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormField {
    Database,
    User,
    Password,
    Host,
    Port,
    SslMode,
}

const FIELDS: [FormField; 6] = [
    FormField::Database,
    FormField::User,
    FormField::Password,
    FormField::Host,
    FormField::Port,
    FormField::SslMode,
];

const SSL_MODES: [SslMode; 3] = [SslMode::Disable, SslMode::Prefer, SslMode::Require];

impl FormField {
    fn label(self) -> &'static str {
        match self {
            FormField::Database => "Database",
            FormField::User => "User",
            FormField::Password => "Password",
            FormField::Host => "Host",
            FormField::Port => "Port",
            FormField::SslMode => "SSL mode",
        }
    }

    fn index(self) -> usize {
        FIELDS.iter().position(|f| *f == self).unwrap_or(0)
    }
}

/// Height the form needs, borders included
pub const FORM_HEIGHT: u16 = 12;

pub struct ConnectionForm {
    visible: bool,
    database: TextInput,
    user: TextInput,
    password: TextInput,
    host: TextInput,
    port: TextInput,
    ssl_mode: SslMode,
    focus: FormField,
    error: Option<String>,
}

impl ConnectionForm {
    pub fn new() -> Self {
        Self {
            visible: false,
            database: TextInput::new(),
            user: TextInput::new(),
            password: TextInput::new(),
            host: TextInput::new(),
            port: TextInput::new(),
            ssl_mode: SslMode::default(),
            focus: FormField::Database,
            error: None,
        }
    }

    /// Show the form prefilled from `params`, focusing the first empty
    /// required field
    pub fn show(&mut self, params: &ConnectionParameters) {
        self.visible = true;
        self.database.set(params.database.as_str());
        self.user.set(params.user.as_str());
        self.password.set(params.password.as_str());
        self.host.set(params.host.as_str());
        self.port.set(params.port.to_string());
        self.ssl_mode = params.ssl_mode;
        self.error = None;
        self.focus = [
            (FormField::Database, &self.database),
            (FormField::User, &self.user),
            (FormField::Host, &self.host),
        ]
        .into_iter()
        .find(|(_, input)| input.value().trim().is_empty())
        .map_or(FormField::Database, |(field, _)| field);
    }

    pub fn hide(&mut self) {
        self.visible = false;
        self.error = None;
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn focus(&self) -> FormField {
        self.focus
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Show a message under the fields (validation failures)
    pub fn set_error(&mut self, error: impl Into<String>) {
        self.error = Some(error.into());
    }

    /// The parameters currently entered. Fails only on an unparsable port.
    pub fn parameters(&self) -> Result<ConnectionParameters, String> {
        let port = self
            .port
            .value()
            .trim()
            .parse::<u16>()
            .ok()
            .filter(|p| *p > 0)
            .ok_or_else(|| format!("Invalid port '{}'", self.port.value()))?;

        let mut params = ConnectionParameters::new(
            self.database.value(),
            self.user.value(),
            self.password.value(),
            self.host.value(),
        );
        params.port = port;
        params.ssl_mode = self.ssl_mode;
        Ok(params)
    }

    fn input_mut(&mut self, field: FormField) -> Option<&mut TextInput> {
        match field {
            FormField::Database => Some(&mut self.database),
            FormField::User => Some(&mut self.user),
            FormField::Password => Some(&mut self.password),
            FormField::Host => Some(&mut self.host),
            FormField::Port => Some(&mut self.port),
            FormField::SslMode => None,
        }
    }

    fn input(&self, field: FormField) -> Option<&TextInput> {
        match field {
            FormField::Database => Some(&self.database),
            FormField::User => Some(&self.user),
            FormField::Password => Some(&self.password),
            FormField::Host => Some(&self.host),
            FormField::Port => Some(&self.port),
            FormField::SslMode => None,
        }
    }

    fn cycle_ssl_mode(&mut self, forward: bool) {
        let idx = SSL_MODES.iter().position(|m| *m == self.ssl_mode).unwrap_or(1);
        let next = if forward {
            (idx + 1) % SSL_MODES.len()
        } else {
            (idx + SSL_MODES.len() - 1) % SSL_MODES.len()
        };
        self.ssl_mode = SSL_MODES[next];
    }

    /// Handle a key event, returning a FormAction
    pub fn handle_key(&mut self, key: KeyEvent) -> FormAction {
        match key.code {
            KeyCode::Esc => return FormAction::Dismissed,
            KeyCode::Tab | KeyCode::Down if key.modifiers == KeyModifiers::NONE => {
                self.focus = FIELDS[(self.focus.index() + 1) % FIELDS.len()];
                return FormAction::Consumed;
            }
            KeyCode::BackTab | KeyCode::Up => {
                self.focus = FIELDS[(self.focus.index() + FIELDS.len() - 1) % FIELDS.len()];
                return FormAction::Consumed;
            }
            KeyCode::Enter => {
                return match self.parameters() {
                    Ok(params) => {
                        self.error = None;
                        FormAction::Submit(params)
                    }
                    Err(e) => {
                        self.error = Some(e);
                        FormAction::Consumed
                    }
                };
            }
            _ => {}
        }

        if self.focus == FormField::SslMode {
            match key.code {
                KeyCode::Left => self.cycle_ssl_mode(false),
                KeyCode::Right | KeyCode::Char(' ') => self.cycle_ssl_mode(true),
                _ => {}
            }
            return FormAction::Consumed;
        }

        let field = self.focus;
        if let Some(input) = self.input_mut(field)
            && input.handle_key(key)
        {
            self.error = None;
        }
        FormAction::Consumed
    }

    /// Insert pasted text into the focused field
    pub fn paste(&mut self, text: &str) {
        let field = self.focus;
        if let Some(input) = self.input_mut(field) {
            input.insert_str(text);
        }
    }

    /// Render the form content into the provided inner area
    pub fn render(&self, frame: &mut Frame, area: Rect, theme: &Theme) {
        if area.height < FIELDS.len() as u16 || area.width < 20 {
            return;
        }

        let label_width = 12u16;
        let x = area.x + 1;
        let inner_width = area.width.saturating_sub(2);
        let input_width = inner_width.saturating_sub(label_width) as usize;

        for (i, field) in FIELDS.iter().enumerate() {
            let y = area.y + i as u16;
            let focused = *field == self.focus;
            let style = if focused {
                theme.dialog_input_focused
            } else {
                theme.dialog_input
            };
            let label = format!("  {:<width$}", format!("{}:", field.label()), width = label_width as usize - 2);

            let (text, cursor) = match self.input(*field) {
                Some(input) => {
                    let visible = input.visible(input_width);
                    let text = if *field == FormField::Password {
                        "*".repeat(visible.text.chars().count())
                    } else {
                        visible.text
                    };
                    (text, Some(visible.cursor_offset))
                }
                None => (format!("< {} >", self.ssl_mode.as_str()), None),
            };

            frame.render_widget(
                Paragraph::new(Line::from(vec![
                    Span::styled(label, theme.dialog_label),
                    Span::styled(text, style),
                ])),
                Rect::new(x, y, inner_width, 1),
            );

            if focused && let Some(offset) = cursor {
                let cursor_x = x + label_width + offset as u16;
                frame.set_cursor_position((cursor_x.min(x + inner_width - 1), y));
            }
        }

        let mut y = area.y + FIELDS.len() as u16 + 1;
        if let Some(err) = &self.error
            && y < area.y + area.height
        {
            frame.render_widget(
                Paragraph::new(Span::styled(format!("  {}", err), theme.dialog_warning)),
                Rect::new(x, y, inner_width, 1),
            );
            y += 1;
        }

        let hint_y = (area.y + area.height).saturating_sub(1).max(y);
        if hint_y < area.y + area.height {
            frame.render_widget(
                Paragraph::new(Span::styled(
                    "  Enter=connect  Tab=next field  \u{2190}/\u{2192}=SSL mode  Esc=close",
                    theme.dialog_hint,
                )),
                Rect::new(x, hint_y, inner_width, 1),
            );
        }
    }
}

impl Default for ConnectionForm {
    fn default() -> Self {
        Self::new()
    }
}

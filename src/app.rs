//! Application state and event handling
//!
//! Central state machine: events come in, state updates, actions go out.
//! Database work is never done here; it is requested through [`Action`]s and
//! its results come back as [`AppEvent`]s.

use std::cell::Cell;
use std::time::{Duration, Instant};

use crossterm::event::{
    Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};
use ratatui::layout::Rect;

use crate::config::ConnectionParameters;
use crate::config::settings::Settings;
use crate::edit_gate::{CellChange, GridEvent};
use crate::error::{DbError, PgcellError, Result};
use crate::loader::{LoadRequest, LoadedTable};
use crate::ui::connection_form::{ConnectionForm, FormAction};
use crate::ui::grid::{EditorAction, Grid};
use crate::ui::input::TextInput;
use crate::ui::layout::{calculate_layout, contains};
use crate::ui::message_box::MessageBox;
use crate::ui::table_picker::TablePicker;
use crate::ui::theme::Theme;

/// Main application state
pub struct App {
    /// `user@host/database` of the live session
    pub connection_name: Option<String>,

    /// Which panel currently has focus
    pub focus: PanelFocus,

    /// UI Components
    pub table_picker: TablePicker,
    pub filter: TextInput,
    pub grid: Grid,
    pub connection_form: ConnectionForm,

    /// Modal message, drawn above everything else
    pub message: Option<MessageBox>,

    /// Parameters of the last connect attempt (form prefill)
    last_params: ConnectionParameters,

    /// UI theme (created once, reused every frame)
    pub theme: Theme,

    /// Status message to display
    pub status_message: Option<StatusMessage>,

    /// Terminal area of the last render, for mouse hit-testing
    screen: Cell<Rect>,

    /// Two clicks on the same cell within this window are a double-click
    double_click: Duration,
    last_click: Option<Click>,

    /// Whether the application is running
    pub running: bool,
}

/// Panel focus state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PanelFocus {
    Tables,
    Filter,
    Grid,
}

/// Status message with severity level
pub struct StatusMessage {
    pub message: String,
    pub level: StatusLevel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusLevel {
    Info,
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone, Copy)]
struct Click {
    cell: (usize, usize),
    at: Instant,
}

/// Application events: terminal input plus results of requested actions
#[derive(Debug)]
pub enum AppEvent {
    /// Keyboard input event
    Key(KeyEvent),
    /// Mouse input event
    Mouse(MouseEvent),
    /// Bracketed paste event
    Paste(String),
    /// Terminal resize event
    Resize,
    /// A session was opened; carries its display name
    Connected(String),
    /// Connecting failed (validation or driver error)
    ConnectFailed(DbError),
    /// Owned tables were listed
    TablesListed(Vec<String>),
    /// A table finished loading
    TableLoaded(LoadedTable),
    /// A load was requested without a live session
    LoadSkipped,
    /// Listing or loading failed; carries the error text
    QueryFailed(String),
    /// The edit gate accepted an edit gesture
    EditArmed,
    /// A cell change was written and committed
    CellSaved { change: CellChange, rows_affected: u64 },
    /// A cell change arrived without an edit gesture and was not written
    CellRejected(CellChange),
    /// Writing a cell change failed
    CellSaveFailed { change: CellChange, error: String },
}

impl AppEvent {
    /// Translate the next item of the terminal's event stream.
    ///
    /// `Ok(None)` means the event is of no interest (key release, focus
    /// change). A closed stream or a read failure ends the event loop.
    pub fn from_terminal(next: Option<std::io::Result<Event>>) -> Result<Option<AppEvent>> {
        let event = next.ok_or_else(|| {
            PgcellError::Terminal("terminal input stream closed".to_string())
        })??;
        Ok(match event {
            Event::Key(key) if key.kind == KeyEventKind::Press => Some(AppEvent::Key(key)),
            Event::Mouse(mouse) => Some(AppEvent::Mouse(mouse)),
            Event::Paste(data) => Some(AppEvent::Paste(data)),
            Event::Resize(_, _) => Some(AppEvent::Resize),
            _ => None,
        })
    }
}

/// Actions returned by event handlers for the main loop to execute
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Connect(ConnectionParameters),
    RefreshTables,
    LoadTable(LoadRequest),
    Grid(GridEvent),
    Quit,
    None,
}

impl App {
    /// Create an app with the connection form open, prefilled from `prefill`
    pub fn new(settings: &Settings, prefill: ConnectionParameters) -> Self {
        let mut app = Self {
            connection_name: None,
            focus: PanelFocus::Tables,
            table_picker: TablePicker::new(),
            filter: TextInput::new(),
            grid: Grid::new(),
            connection_form: ConnectionForm::new(),
            message: None,
            last_params: prefill,
            theme: Theme::default(),
            status_message: None,
            screen: Cell::new(Rect::default()),
            double_click: Duration::from_millis(settings.ui.double_click_ms),
            last_click: None,
            running: true,
        };
        app.show_connection_form();
        app
    }

    /// Handle an application event and return resulting action
    pub fn handle_event(&mut self, event: AppEvent) -> Action {
        match event {
            AppEvent::Key(key) => self.handle_key(key),
            AppEvent::Mouse(mouse) => self.handle_mouse_at(mouse, Instant::now()),
            AppEvent::Paste(data) => self.handle_paste(&data),
            AppEvent::Resize => Action::None,
            AppEvent::Connected(name) => {
                self.connection_form.hide();
                self.table_picker.clear();
                self.grid.clear();
                self.message = Some(MessageBox::info(
                    "Connected",
                    format!("Successfully connected to {}", name),
                ));
                self.set_status(format!("Connected to {}", name), StatusLevel::Success);
                self.connection_name = Some(name);
                Action::RefreshTables
            }
            AppEvent::ConnectFailed(error) => {
                if error.is_validation() {
                    self.connection_form.set_error(error.to_string());
                    self.set_status(error.to_string(), StatusLevel::Warning);
                    return Action::None;
                }
                self.connection_name = None;
                self.table_picker.clear();
                self.grid.clear();
                let body = match error {
                    DbError::ConnectionFailed(report) => report,
                    other => other.to_string(),
                };
                self.message = Some(MessageBox::error("Connection failed", body));
                self.set_status("Connection failed".to_string(), StatusLevel::Error);
                Action::None
            }
            AppEvent::TablesListed(tables) => {
                let count = tables.len();
                self.table_picker.set_tables(tables);
                self.set_status(format!("{} tables", count), StatusLevel::Info);
                Action::LoadTable(self.load_request())
            }
            AppEvent::TableLoaded(loaded) => {
                let status = if loaded.table.name.is_empty() {
                    "No table selected".to_string()
                } else {
                    let mut s = format!("{} rows from {}", loaded.rows.len(), loaded.table.name);
                    if let Some(column) = &loaded.filter_column {
                        s.push_str(&format!(" where {} LIKE '{}'", column, self.filter.value()));
                    }
                    s
                };
                self.grid.set_table(loaded);
                self.last_click = None;
                self.set_status(status, StatusLevel::Success);
                Action::None
            }
            AppEvent::LoadSkipped => {
                self.set_status(
                    "Not connected (Ctrl+O to connect)".to_string(),
                    StatusLevel::Warning,
                );
                Action::None
            }
            AppEvent::QueryFailed(error) => {
                self.message = Some(MessageBox::error("Error", error));
                self.set_status("Query failed".to_string(), StatusLevel::Error);
                Action::None
            }
            AppEvent::EditArmed => {
                self.set_status(
                    "Editing: Enter to save, Esc to cancel".to_string(),
                    StatusLevel::Info,
                );
                Action::None
            }
            AppEvent::CellSaved {
                change,
                rows_affected,
            } => {
                let column = self.column_name(change.column);
                if rows_affected == 0 {
                    self.set_status(
                        format!("No row with id = {}; {} not updated", change.row_id, column),
                        StatusLevel::Warning,
                    );
                } else {
                    self.grid.apply_change(&change);
                    self.set_status(
                        format!("Saved {} for id = {}", column, change.row_id),
                        StatusLevel::Success,
                    );
                }
                Action::None
            }
            AppEvent::CellRejected(_) => {
                self.set_status(
                    "Change discarded: press Enter or double-click a cell to edit".to_string(),
                    StatusLevel::Warning,
                );
                Action::None
            }
            AppEvent::CellSaveFailed { change, error } => {
                let column = self.column_name(change.column);
                self.message = Some(MessageBox::error("Error", error));
                self.set_status(
                    format!("Saving {} for id = {} failed", column, change.row_id),
                    StatusLevel::Error,
                );
                Action::None
            }
        }
    }

    fn handle_key(&mut self, key: KeyEvent) -> Action {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        if ctrl && matches!(key.code, KeyCode::Char('q') | KeyCode::Char('c')) {
            return Action::Quit;
        }

        // Message box swallows everything until dismissed
        if self.message.is_some() {
            if matches!(key.code, KeyCode::Enter | KeyCode::Esc | KeyCode::Char(' ')) {
                self.message = None;
            }
            return Action::None;
        }

        // Connection form intercepts all keys when visible
        if self.connection_form.is_visible() {
            return match self.connection_form.handle_key(key) {
                FormAction::Submit(params) => {
                    self.set_status(
                        format!("Connecting to {}...", params.display_name()),
                        StatusLevel::Info,
                    );
                    self.last_params = params.clone();
                    Action::Connect(params)
                }
                FormAction::Dismissed => {
                    self.connection_form.hide();
                    Action::None
                }
                FormAction::Consumed => Action::None,
            };
        }

        self.status_message = None;

        // Inline editor owns the keyboard while open
        if self.focus == PanelFocus::Grid && self.grid.is_editing() {
            return match self.grid.editor_key(key) {
                EditorAction::Commit(change) => Action::Grid(GridEvent::CellChanged(change)),
                EditorAction::Closed => Action::None,
                EditorAction::Consumed => Action::None,
            };
        }

        if ctrl {
            return match key.code {
                KeyCode::Char('o') => {
                    self.show_connection_form();
                    Action::None
                }
                KeyCode::Char('r') => self.reload(),
                _ => Action::None,
            };
        }

        match key.code {
            KeyCode::Tab => {
                self.cycle_focus();
                return Action::None;
            }
            KeyCode::BackTab => {
                self.cycle_focus_reverse();
                return Action::None;
            }
            _ => {}
        }

        match self.focus {
            PanelFocus::Tables => {
                if key.code == KeyCode::Enter {
                    return self.reload();
                }
                self.table_picker.handle_key(key);
                Action::None
            }
            PanelFocus::Filter => {
                if key.code == KeyCode::Enter {
                    return self.reload();
                }
                self.filter.handle_key(key);
                Action::None
            }
            PanelFocus::Grid => match key.code {
                KeyCode::Enter | KeyCode::F(2) => self.begin_edit(),
                _ => {
                    self.grid.handle_nav_key(key);
                    Action::None
                }
            },
        }
    }

    /// Mouse handling with an explicit clock, so double-clicks can be tested
    pub fn handle_mouse_at(&mut self, mouse: MouseEvent, now: Instant) -> Action {
        if self.message.is_some() || self.connection_form.is_visible() {
            return Action::None;
        }

        let (x, y) = (mouse.column, mouse.row);
        let layout = calculate_layout(self.screen.get());

        match mouse.kind {
            MouseEventKind::Down(MouseButton::Left) => {
                if let Some(cell) = self.grid.cell_at(x, y) {
                    return self.click_cell(cell, now);
                }
                if self.grid.is_editing() {
                    self.grid.cancel_edit();
                }
                self.last_click = None;
                if self.table_picker.click(x, y) {
                    self.focus = PanelFocus::Tables;
                } else if contains(layout.filter, x, y) {
                    self.focus = PanelFocus::Filter;
                } else if contains(layout.grid, x, y) {
                    self.focus = PanelFocus::Grid;
                }
                Action::None
            }
            MouseEventKind::ScrollUp | MouseEventKind::ScrollDown => {
                let down = matches!(mouse.kind, MouseEventKind::ScrollDown);
                if contains(layout.grid, x, y) && !self.grid.is_editing() {
                    if down {
                        self.grid.move_down();
                    } else {
                        self.grid.move_up();
                    }
                } else if contains(layout.tables, x, y) {
                    if down {
                        self.table_picker.move_down();
                    } else {
                        self.table_picker.move_up();
                    }
                }
                Action::None
            }
            _ => Action::None,
        }
    }

    fn click_cell(&mut self, cell: (usize, usize), now: Instant) -> Action {
        self.focus = PanelFocus::Grid;
        if self.grid.is_editing() {
            self.grid.cancel_edit();
        }
        self.grid.select_cell(cell.0, cell.1);

        let is_double = self
            .last_click
            .is_some_and(|c| c.cell == cell && now.duration_since(c.at) <= self.double_click);
        if is_double {
            self.last_click = None;
            return self.begin_edit();
        }
        self.last_click = Some(Click { cell, at: now });
        Action::None
    }

    fn handle_paste(&mut self, data: &str) -> Action {
        if self.message.is_some() {
            return Action::None;
        }
        if self.connection_form.is_visible() {
            self.connection_form.paste(data);
            return Action::None;
        }
        match self.focus {
            PanelFocus::Filter => {
                self.filter.insert_str(data);
                Action::None
            }
            PanelFocus::Grid => match self.grid.paste(data) {
                Some(change) => Action::Grid(GridEvent::CellChanged(change)),
                None => Action::None,
            },
            PanelFocus::Tables => Action::None,
        }
    }

    fn begin_edit(&mut self) -> Action {
        match self.grid.begin_edit() {
            Some(event) => Action::Grid(event),
            None => Action::None,
        }
    }

    fn reload(&mut self) -> Action {
        if self.grid.is_editing() {
            self.grid.cancel_edit();
        }
        Action::LoadTable(self.load_request())
    }

    /// What a (re)load should fetch right now
    pub fn load_request(&self) -> LoadRequest {
        LoadRequest {
            table: self
                .table_picker
                .selected_table()
                .unwrap_or_default()
                .to_string(),
            filter: self.filter.value().to_string(),
            focused_column: self.grid.selected_column(),
        }
    }

    fn column_name(&self, column: usize) -> String {
        self.grid
            .columns()
            .get(column)
            .cloned()
            .unwrap_or_else(|| format!("column {}", column + 1))
    }

    pub fn cycle_focus(&mut self) {
        self.focus = match self.focus {
            PanelFocus::Tables => PanelFocus::Filter,
            PanelFocus::Filter => PanelFocus::Grid,
            PanelFocus::Grid => PanelFocus::Tables,
        };
    }

    fn cycle_focus_reverse(&mut self) {
        self.focus = match self.focus {
            PanelFocus::Tables => PanelFocus::Grid,
            PanelFocus::Filter => PanelFocus::Tables,
            PanelFocus::Grid => PanelFocus::Filter,
        };
    }

    pub fn set_status(&mut self, message: String, level: StatusLevel) {
        self.status_message = Some(StatusMessage { message, level });
    }

    /// Open the connection form prefilled with the last parameters
    pub fn show_connection_form(&mut self) {
        self.connection_form.show(&self.last_params);
    }

    /// Remember the terminal area of the current frame
    pub fn set_screen(&self, area: Rect) {
        self.screen.set(area);
    }
}

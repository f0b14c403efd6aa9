//! Edit gate
//!
//! A two-state machine deciding whether a grid content change may be written
//! to the database. Writing is only allowed right after an explicit "start
//! editing" gesture (double-click, Enter or F2 on a cell); the next content
//! change of any cell consumes that permission.
//!
//! ```text
//!   Idle  --CellDoubleClicked-->  Armed
//!   Armed --CellChanged-------->  Idle   (persist the change)
//!   Idle  --CellChanged-------->  Idle   (discard)
//!   any   --disarm()----------->  Idle   (table reload)
//! ```
//!
//! Arming does not remember which cell was double-clicked.

/// Raw grid gestures, translated from terminal events by the UI layer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GridEvent {
    /// The user asked to edit a cell
    CellDoubleClicked { row: usize, column: usize },
    /// A cell's content was replaced
    CellChanged(CellChange),
}

/// A content change of one cell
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellChange {
    /// Grid row index
    pub row: usize,
    /// Grid column index (index into the table's column list)
    pub column: usize,
    /// New text of the cell
    pub value: String,
    /// Text of the row's column 0 as displayed before the change
    pub row_id: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum GateState {
    #[default]
    Idle,
    Armed,
}

/// What the gate decided for an event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    /// Editing is now permitted
    Armed,
    /// The change may be written; the gate is idle again
    Persist,
    /// The change must not be written
    Discard,
}

#[derive(Debug, Default)]
pub struct EditGate {
    state: GateState,
}

impl EditGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> GateState {
        self.state
    }

    pub fn is_armed(&self) -> bool {
        self.state == GateState::Armed
    }

    /// Force the gate back to idle without persisting anything
    pub fn disarm(&mut self) {
        if self.state == GateState::Armed {
            tracing::debug!("edit gate disarmed");
        }
        self.state = GateState::Idle;
    }

    /// Feed one grid event through the state machine
    pub fn on_event(&mut self, event: &GridEvent) -> GateDecision {
        match (self.state, event) {
            (_, GridEvent::CellDoubleClicked { row, column }) => {
                tracing::debug!(row, column, "edit gate armed");
                self.state = GateState::Armed;
                GateDecision::Armed
            }
            (GateState::Armed, GridEvent::CellChanged(_)) => {
                self.state = GateState::Idle;
                GateDecision::Persist
            }
            (GateState::Idle, GridEvent::CellChanged(change)) => {
                tracing::debug!(
                    row = change.row,
                    column = change.column,
                    "change without edit gesture discarded"
                );
                GateDecision::Discard
            }
        }
    }
}

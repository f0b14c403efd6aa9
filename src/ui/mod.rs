//! Terminal UI components
//!
//! All UI widgets and rendering logic using ratatui.

pub mod connection_form;
pub mod grid;
pub mod input;
pub mod layout;
pub mod message_box;
pub mod render;
pub mod table_picker;
pub mod theme;

use ratatui::{Frame, layout::Rect};

use crate::ui::theme::Theme;

/// Trait for UI panels
pub trait Component {
    /// Render the component to the frame
    fn render(&self, frame: &mut Frame, area: Rect, focused: bool, theme: &Theme);
}

//! Panel layout management
//!
//! Tables on the left, filter bar above the grid, status line at the bottom.
//! Rendering and mouse hit-testing both derive their areas from here.

use ratatui::layout::{Constraint, Direction, Layout, Rect};

/// Width of the table picker panel
pub const TABLES_WIDTH: u16 = 28;

/// Areas of the main screen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ScreenLayout {
    pub tables: Rect,
    pub filter: Rect,
    pub grid: Rect,
    pub status: Rect,
}

/// Calculate panel layout for the main screen
pub fn calculate_layout(area: Rect) -> ScreenLayout {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(1), Constraint::Length(1)])
        .split(area);

    let tables_width = TABLES_WIDTH.min(area.width / 3);
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(tables_width), Constraint::Min(1)])
        .split(rows[0]);

    let right = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(1)])
        .split(columns[1]);

    ScreenLayout {
        tables: columns[0],
        filter: right[0],
        grid: right[1],
        status: rows[1],
    }
}

/// A rectangle of `percent_x` x `height` centered in `area`
pub fn centered_rect(percent_x: u16, height: u16, area: Rect) -> Rect {
    let width = (area.width * percent_x / 100).max(20).min(area.width);
    let height = height.min(area.height);
    Rect::new(
        area.x + (area.width - width) / 2,
        area.y + (area.height - height) / 2,
        width,
        height,
    )
}

/// Whether the cell at (`x`, `y`) lies inside `area`
pub fn contains(area: Rect, x: u16, y: u16) -> bool {
    x >= area.x && x < area.x + area.width && y >= area.y && y < area.y + area.height
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_calculate_layout() {
        let area = Rect::new(0, 0, 100, 40);
        let layout = calculate_layout(area);

        assert_eq!(layout.tables.width, TABLES_WIDTH);
        assert_eq!(layout.filter.height, 3);
        assert_eq!(layout.status.height, 1);
        assert_eq!(layout.status.y, 39);
        assert_eq!(layout.grid.x, layout.filter.x);
        assert_eq!(layout.grid.y, 3);
        assert_eq!(layout.grid.width + layout.tables.width, 100);
    }

    #[test]
    fn test_narrow_terminal_shrinks_tables() {
        let layout = calculate_layout(Rect::new(0, 0, 60, 20));
        assert_eq!(layout.tables.width, 20);
    }

    #[test]
    fn test_centered_rect() {
        let rect = centered_rect(50, 10, Rect::new(0, 0, 100, 40));
        assert_eq!(rect, Rect::new(25, 15, 50, 10));
    }

    #[test]
    fn test_contains() {
        let area = Rect::new(10, 5, 4, 2);
        assert!(contains(area, 10, 5));
        assert!(contains(area, 13, 6));
        assert!(!contains(area, 14, 6));
        assert!(!contains(area, 9, 5));
    }
}

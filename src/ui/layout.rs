use ratatui::layout::{Constraint, Direction, Rect};

/// Height of the indicator header (one line plus borders)
const HEADER_HEIGHT: u16 = 3;

/// Widest the popup panel grows
const MAX_PANEL_WIDTH: u16 = 72;

/// Layout configuration for the popup
pub struct Layout {
    /// Maximum width of the centered panel
    pub max_width: u16,
}

impl Layout {
    /// Create a new layout with default settings
    pub fn new() -> Self {
        Self {
            max_width: MAX_PANEL_WIDTH,
        }
    }

    /// Calculate the main areas
    /// Layout: [ Indicator header ]
    ///         [ Tool sections    ]
    ///         [ Status bar       ]
    pub fn calculate(&self, area: Rect) -> LayoutAreas {
        let width = area.width.min(self.max_width);
        let panel = Rect {
            x: area.x + (area.width - width) / 2,
            width,
            ..area
        };

        let rows = ratatui::layout::Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(HEADER_HEIGHT),
                Constraint::Min(3),
                Constraint::Length(1),
            ])
            .split(panel);

        LayoutAreas {
            header: rows[0],
            body: rows[1],
            status_bar: rows[2],
        }
    }

    /// Calculate areas for a popup (centered)
    pub fn popup_area(&self, area: Rect, width_pct: u16, height_pct: u16) -> Rect {
        let popup_layout = ratatui::layout::Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Percentage((100 - height_pct) / 2),
                Constraint::Percentage(height_pct),
                Constraint::Percentage((100 - height_pct) / 2),
            ])
            .split(area);

        ratatui::layout::Layout::default()
            .direction(Direction::Horizontal)
            .constraints([
                Constraint::Percentage((100 - width_pct) / 2),
                Constraint::Percentage(width_pct),
                Constraint::Percentage((100 - width_pct) / 2),
            ])
            .split(popup_layout[1])[1]
    }
}

impl Default for Layout {
    fn default() -> Self {
        Self::new()
    }
}

/// Calculated layout areas
pub struct LayoutAreas {
    /// Indicator line
    pub header: Rect,
    /// Per-tool sections
    pub body: Rect,
    /// Key hints
    pub status_bar: Rect,
}

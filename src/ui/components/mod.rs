mod help_popup;
mod indicator;
mod status_bar;
mod tool_panel;

pub use help_popup::HelpPopup;
pub use indicator::{tier_color, IndicatorBar};
pub use status_bar::StatusBar;
pub use tool_panel::ToolPanel;

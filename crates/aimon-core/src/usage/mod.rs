//! Usage monitoring: fetch, parse, resolve and present per-tool quota data.
//!
//! A [`RefreshController`] runs the external data source on a timer, one
//! [`FetchSession`] at a time, and publishes [`ControllerState`] through a
//! watch channel. The view layer turns that state into a [`PanelIndicator`]
//! and a [`PopupView`] on demand.

pub mod controller;
pub mod fetcher;
pub mod parser;
pub mod presentation;
pub mod resolver;
pub mod session;
pub mod types;
pub mod view;

pub use controller::{
    ControllerError, ControllerHandle, ControllerPhase, ControllerState, FetchFailure,
    RefreshController, StateReceiver,
};
pub use fetcher::{CommandSource, FetchError, FetchErrorKind, UsageSource};
pub use parser::{parse_snapshot, ParseError, ParseOutcome};
pub use presentation::{clamp_percent, format_countdown, ColorTier};
pub use resolver::{resolve_tool, ResolvedTool};
pub use session::{FetchSession, RawPayload, SessionOutcome};
pub use types::{Snapshot, ToolId, ToolUsageRecord, UsageFigures, UsageWindow};
pub use view::{
    DisplayMode, PanelIndicator, PopupView, ToolSection, UsageBarView, APP_TITLE,
};

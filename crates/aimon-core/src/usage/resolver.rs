//! Pick which tool's data drives the compact indicator.

use super::types::{Snapshot, ToolId, ToolUsageRecord};

/// Outcome of tool resolution
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolvedTool<'a> {
    /// Tool whose record was chosen
    pub tool: ToolId,
    /// That tool's record
    pub record: &'a ToolUsageRecord,
    /// False when no tool was usable and `tool` is only the preference
    pub usable: bool,
}

/// Whether a record has data worth showing in the indicator
pub fn is_usable(tool: ToolId, record: &ToolUsageRecord) -> bool {
    if !record.installed || record.error().is_some() {
        return false;
    }
    !(tool == ToolId::Codex && record.has_data == Some(false))
}

/// Resolve the indicator tool: the preferred one if usable, else the first
/// usable of Claude, Codex, Gemini. Unknown preferences fall back to Claude.
///
/// When nothing is usable the preferred tool is returned with
/// `usable == false`; callers render that as a loading or error state.
pub fn resolve_tool<'a>(snapshot: &'a Snapshot, preferred: &str) -> ResolvedTool<'a> {
    let preferred = preferred.parse::<ToolId>().unwrap_or(ToolId::Claude);

    std::iter::once(preferred)
        .chain(ToolId::ALL)
        .find(|tool| is_usable(*tool, snapshot.get(*tool)))
        .map(|tool| ResolvedTool {
            tool,
            record: snapshot.get(tool),
            usable: true,
        })
        .unwrap_or(ResolvedTool {
            tool: preferred,
            record: snapshot.get(preferred),
            usable: false,
        })
}

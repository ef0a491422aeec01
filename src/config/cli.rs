use aimon_core::config::Settings;
use aimon_core::usage::ToolId;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// AI usage monitor - Claude, Codex and Gemini quotas in your terminal
#[derive(Parser, Debug, Clone)]
#[command(name = "aimon")]
#[command(author, version, about, long_about = None)]
pub struct Config {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub debug: bool,

    /// Path to config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Refresh interval in seconds (20, 60, 120, 300, 600 or 1800)
    #[arg(short = 'i', long, global = true)]
    pub interval: Option<u64>,

    /// Tool shown in the indicator
    #[arg(short, long, global = true)]
    pub tool: Option<ToolId>,

    /// Indicator display mode (0 = ring and text, 1 = ring, 2 = text)
    #[arg(short = 'm', long, global = true, value_parser = clap::value_parser!(i64).range(0..=2))]
    pub display_mode: Option<i64>,

    /// Subcommand
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Subcommands
#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Command {
    /// Interactive popup (default)
    #[default]
    Popup,
    /// Refresh once and print the indicator line
    Status {
        /// Print the indicator as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print the indicator line whenever usage changes
    Watch {
        /// Print the indicator as JSON lines
        #[arg(long)]
        json: bool,
    },
}

impl Config {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Selected subcommand, defaulting to the popup
    pub fn command(&self) -> Command {
        self.command.unwrap_or_default()
    }

    /// Apply command line overrides on top of file settings
    pub fn merge_into(&self, settings: &mut Settings) {
        if let Some(interval) = self.interval {
            settings.refresh_interval_secs = interval;
        }
        if let Some(tool) = self.tool {
            settings.panel_tool = tool.as_str().to_string();
        }
        if let Some(mode) = self.display_mode {
            settings.panel_display_mode = mode;
        }
    }
}

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::warn;

/// Refresh intervals offered to the user, in seconds
pub const REFRESH_INTERVALS: [u64; 6] = [20, 60, 120, 300, 600, 1800];

/// Application settings (from config file)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Seconds between scheduled refreshes
    #[serde(default = "default_refresh_interval")]
    pub refresh_interval_secs: u64,

    /// Tool shown in the compact indicator ("claude", "codex", "gemini")
    #[serde(default = "default_panel_tool")]
    pub panel_tool: String,

    /// 0 = ring and percentage, 1 = ring only, 2 = percentage only
    #[serde(default)]
    pub panel_display_mode: i64,

    /// Show Claude Code in the popup
    #[serde(default = "default_show")]
    pub show_claude: bool,

    /// Show OpenAI Codex in the popup
    #[serde(default = "default_show")]
    pub show_codex: bool,

    /// Show Gemini CLI in the popup
    #[serde(default = "default_show")]
    pub show_gemini: bool,

    /// External data source
    #[serde(default)]
    pub data_source: DataSourceSettings,
}

fn default_refresh_interval() -> u64 {
    60
}

fn default_panel_tool() -> String {
    "claude".to_string()
}

fn default_show() -> bool {
    true
}

/// External command that prints a usage payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataSourceSettings {
    /// Program to run
    #[serde(default = "default_command")]
    pub command: String,

    /// Arguments passed to the program
    #[serde(default)]
    pub args: Vec<String>,

    /// Upper bound on a single fetch; unbounded when unset
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

fn default_command() -> String {
    "aimon-fetch-usage".to_string()
}

impl Default for DataSourceSettings {
    fn default() -> Self {
        Self {
            command: default_command(),
            args: Vec::new(),
            timeout_secs: None,
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            refresh_interval_secs: default_refresh_interval(),
            panel_tool: default_panel_tool(),
            panel_display_mode: 0,
            show_claude: default_show(),
            show_codex: default_show(),
            show_gemini: default_show(),
            data_source: DataSourceSettings::default(),
        }
    }
}

impl Settings {
    /// Load settings from config file or use defaults
    pub fn load(path: Option<&Path>) -> Result<Self> {
        // Try custom path first
        if let Some(p) = path {
            if p.exists() {
                return Self::read(p);
            }
        }

        // Try default config locations
        for path in Self::default_paths().iter().flatten() {
            if path.exists() {
                return Self::read(path);
            }
        }

        // Return defaults if no config file found
        Ok(Self::default())
    }

    fn default_paths() -> [Option<PathBuf>; 3] {
        [
            dirs::config_dir().map(|p| p.join("aimon/config.toml")),
            dirs::home_dir().map(|p| p.join(".config/aimon/config.toml")),
            dirs::home_dir().map(|p| p.join(".aimon.toml")),
        ]
    }

    fn read(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        toml::from_str(&content).with_context(|| format!("Failed to parse config file: {:?}", path))
    }

    /// Validate and normalize settings values
    pub fn validate(&mut self) {
        if !REFRESH_INTERVALS.contains(&self.refresh_interval_secs) {
            warn!(
                "Unsupported refresh interval {}s, using {}s",
                self.refresh_interval_secs,
                default_refresh_interval()
            );
            self.refresh_interval_secs = default_refresh_interval();
        }
        if !(0..=2).contains(&self.panel_display_mode) {
            warn!(
                "Unsupported panel display mode {}, using 0",
                self.panel_display_mode
            );
            self.panel_display_mode = 0;
        }
        if self.data_source.timeout_secs == Some(0) {
            self.data_source.timeout_secs = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.refresh_interval_secs, 60);
        assert_eq!(settings.panel_tool, "claude");
        assert_eq!(settings.panel_display_mode, 0);
        assert!(settings.show_claude && settings.show_codex && settings.show_gemini);
        assert_eq!(settings.data_source.command, "aimon-fetch-usage");
        assert_eq!(settings.data_source.timeout_secs, None);
    }

    #[test]
    fn test_parse_toml() {
        let toml = r#"
            refresh_interval_secs = 300
            panel_tool = "gemini"
            show_codex = false

            [data_source]
            command = "python3"
            args = ["/opt/aimon/fetch_all_usage.py"]
            timeout_secs = 30
        "#;

        let settings: Settings = toml::from_str(toml).expect("Should parse TOML");
        assert_eq!(settings.refresh_interval_secs, 300);
        assert_eq!(settings.panel_tool, "gemini");
        assert!(!settings.show_codex);
        assert!(settings.show_gemini);
        assert_eq!(settings.data_source.command, "python3");
        assert_eq!(settings.data_source.args, vec!["/opt/aimon/fetch_all_usage.py"]);
        assert_eq!(settings.data_source.timeout_secs, Some(30));
    }

    #[test]
    fn test_validate_normalizes() {
        let mut settings = Settings {
            refresh_interval_secs: 45,
            panel_display_mode: 7,
            ..Settings::default()
        };
        settings.data_source.timeout_secs = Some(0);
        settings.validate();
        assert_eq!(settings.refresh_interval_secs, 60);
        assert_eq!(settings.panel_display_mode, 0);
        assert_eq!(settings.data_source.timeout_secs, None);
    }

    #[test]
    fn test_load_from_explicit_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "refresh_interval_secs = 1800\npanel_display_mode = 2\n").unwrap();

        let settings = Settings::load(Some(&path)).unwrap();
        assert_eq!(settings.refresh_interval_secs, 1800);
        assert_eq!(settings.panel_display_mode, 2);
    }

    #[test]
    fn test_load_rejects_invalid_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "refresh_interval_secs = \"soon\"\n").unwrap();

        let err = Settings::load(Some(&path)).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config file"));
    }

    #[test]
    fn test_load_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.toml");
        temp_env::with_vars(
            [
                ("HOME", Some(dir.path().as_os_str())),
                ("XDG_CONFIG_HOME", Some(dir.path().join("xdg").as_os_str())),
            ],
            || {
                let settings = Settings::load(Some(&missing)).unwrap();
                assert_eq!(settings, Settings::default());
            },
        );
    }
}

//! Shared settings with typed keys and change notification.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use parking_lot::RwLock;
use thiserror::Error;
use tokio::sync::broadcast;
use tracing::debug;

use super::settings::{Settings, REFRESH_INTERVALS};
use crate::usage::ToolId;

/// Shared settings store type alias
pub type SharedSettings = Arc<SettingsStore>;

/// Keys exposed by the settings store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SettingKey {
    RefreshInterval,
    PanelTool,
    PanelDisplayMode,
    ShowClaude,
    ShowCodex,
    ShowGemini,
}

impl SettingKey {
    /// All keys
    pub const ALL: [SettingKey; 6] = [
        SettingKey::RefreshInterval,
        SettingKey::PanelTool,
        SettingKey::PanelDisplayMode,
        SettingKey::ShowClaude,
        SettingKey::ShowCodex,
        SettingKey::ShowGemini,
    ];

    /// Stable key name
    pub fn as_str(&self) -> &'static str {
        match self {
            SettingKey::RefreshInterval => "refresh-interval",
            SettingKey::PanelTool => "panel-tool",
            SettingKey::PanelDisplayMode => "panel-display-mode",
            SettingKey::ShowClaude => "show-claude",
            SettingKey::ShowCodex => "show-codex",
            SettingKey::ShowGemini => "show-gemini",
        }
    }

    /// Visibility key for a tool
    pub fn show(tool: ToolId) -> Self {
        match tool {
            ToolId::Claude => SettingKey::ShowClaude,
            ToolId::Codex => SettingKey::ShowCodex,
            ToolId::Gemini => SettingKey::ShowGemini,
        }
    }
}

impl FromStr for SettingKey {
    type Err = SettingsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SettingKey::ALL
            .into_iter()
            .find(|key| key.as_str() == s)
            .ok_or_else(|| SettingsError::UnknownKey(s.to_string()))
    }
}

impl fmt::Display for SettingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error type for settings writes
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SettingsError {
    /// No setting has this name
    #[error("unknown setting: {0}")]
    UnknownKey(String),

    /// The key holds a different type
    #[error("{key} is not a {requested} setting")]
    TypeMismatch {
        key: SettingKey,
        requested: &'static str,
    },

    /// The value is outside the allowed set
    #[error("invalid value for {key}: {value}")]
    InvalidValue { key: SettingKey, value: String },
}

/// Process-wide settings with typed get/set and change subscription.
///
/// Every write that changes a value sends that key to subscribers.
pub struct SettingsStore {
    inner: RwLock<Settings>,
    changes: broadcast::Sender<SettingKey>,
}

impl SettingsStore {
    /// Create a store from already-validated settings
    pub fn new(settings: Settings) -> Self {
        let (changes, _) = broadcast::channel(32);
        Self {
            inner: RwLock::new(settings),
            changes,
        }
    }

    /// Create a shared store
    pub fn shared(settings: Settings) -> SharedSettings {
        Arc::new(Self::new(settings))
    }

    /// Copy of the current settings
    pub fn snapshot(&self) -> Settings {
        self.inner.read().clone()
    }

    /// Subscribe to change notifications
    pub fn subscribe(&self) -> broadcast::Receiver<SettingKey> {
        self.changes.subscribe()
    }

    /// Read an integer setting
    pub fn get_int(&self, key: SettingKey) -> Result<i64, SettingsError> {
        let s = self.inner.read();
        match key {
            SettingKey::RefreshInterval => Ok(s.refresh_interval_secs as i64),
            SettingKey::PanelDisplayMode => Ok(s.panel_display_mode),
            _ => Err(mismatch(key, "integer")),
        }
    }

    /// Read a string setting
    pub fn get_string(&self, key: SettingKey) -> Result<String, SettingsError> {
        match key {
            SettingKey::PanelTool => Ok(self.inner.read().panel_tool.clone()),
            _ => Err(mismatch(key, "string")),
        }
    }

    /// Read a boolean setting
    pub fn get_bool(&self, key: SettingKey) -> Result<bool, SettingsError> {
        let s = self.inner.read();
        match key {
            SettingKey::ShowClaude => Ok(s.show_claude),
            SettingKey::ShowCodex => Ok(s.show_codex),
            SettingKey::ShowGemini => Ok(s.show_gemini),
            _ => Err(mismatch(key, "boolean")),
        }
    }

    /// Write an integer setting
    pub fn set_int(&self, key: SettingKey, value: i64) -> Result<(), SettingsError> {
        let changed = {
            let mut s = self.inner.write();
            match key {
                SettingKey::RefreshInterval => {
                    let secs = u64::try_from(value)
                        .ok()
                        .filter(|v| REFRESH_INTERVALS.contains(v))
                        .ok_or_else(|| invalid(key, value))?;
                    replace(&mut s.refresh_interval_secs, secs)
                }
                SettingKey::PanelDisplayMode => {
                    if !(0..=2).contains(&value) {
                        return Err(invalid(key, value));
                    }
                    replace(&mut s.panel_display_mode, value)
                }
                _ => return Err(mismatch(key, "integer")),
            }
        };
        self.notify(key, changed);
        Ok(())
    }

    /// Write a string setting
    pub fn set_string(&self, key: SettingKey, value: &str) -> Result<(), SettingsError> {
        if key != SettingKey::PanelTool {
            return Err(mismatch(key, "string"));
        }
        let tool = value
            .parse::<ToolId>()
            .map_err(|_| invalid(key, value))?;
        let changed = replace(&mut self.inner.write().panel_tool, tool.as_str().to_string());
        self.notify(key, changed);
        Ok(())
    }

    /// Write a boolean setting
    pub fn set_bool(&self, key: SettingKey, value: bool) -> Result<(), SettingsError> {
        let changed = {
            let mut s = self.inner.write();
            let slot = match key {
                SettingKey::ShowClaude => &mut s.show_claude,
                SettingKey::ShowCodex => &mut s.show_codex,
                SettingKey::ShowGemini => &mut s.show_gemini,
                _ => return Err(mismatch(key, "boolean")),
            };
            replace(slot, value)
        };
        self.notify(key, changed);
        Ok(())
    }

    fn notify(&self, key: SettingKey, changed: bool) {
        if changed {
            debug!(key = %key, "Setting changed");
            // No subscribers is fine
            let _ = self.changes.send(key);
        }
    }
}

fn replace<T: PartialEq>(slot: &mut T, value: T) -> bool {
    if *slot == value {
        return false;
    }
    *slot = value;
    true
}

fn mismatch(key: SettingKey, requested: &'static str) -> SettingsError {
    SettingsError::TypeMismatch { key, requested }
}

fn invalid(key: SettingKey, value: impl fmt::Display) -> SettingsError {
    SettingsError::InvalidValue {
        key,
        value: value.to_string(),
    }
}

mod settings;
mod store;

pub use settings::{DataSourceSettings, Settings, REFRESH_INTERVALS};
pub use store::{SettingKey, SettingsError, SettingsStore, SharedSettings};

use serde::{Deserialize, Serialize};

use super::enums::{LlmProvider, Theme};
use crate::config::DEFAULT_RETENTION_DAYS;

/// User-facing application settings, persisted as one record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppSettings {
    pub language: String,
    pub theme: Theme,
    pub privacy_mode: bool,
    pub notifications_enabled: bool,
    pub llm_provider: LlmProvider,
    /// Days to keep sessions; `-1` keeps them forever
    pub data_retention_days: i64,
    pub analytics_opt_in: bool,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            language: "en".into(),
            theme: Theme::System,
            privacy_mode: true,
            notifications_enabled: false,
            llm_provider: LlmProvider::OpenAi,
            data_retention_days: DEFAULT_RETENTION_DAYS,
            analytics_opt_in: false,
        }
    }
}

/// Partial update; `None` fields keep their current value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsPatch {
    pub language: Option<String>,
    pub theme: Option<Theme>,
    pub privacy_mode: Option<bool>,
    pub notifications_enabled: Option<bool>,
    pub llm_provider: Option<LlmProvider>,
    pub data_retention_days: Option<i64>,
    pub analytics_opt_in: Option<bool>,
}

impl AppSettings {
    /// Apply a patch in place.
    pub fn merge(&mut self, patch: SettingsPatch) {
        if let Some(language) = patch.language {
            self.language = language;
        }
        if let Some(theme) = patch.theme {
            self.theme = theme;
        }
        if let Some(privacy_mode) = patch.privacy_mode {
            self.privacy_mode = privacy_mode;
        }
        if let Some(enabled) = patch.notifications_enabled {
            self.notifications_enabled = enabled;
        }
        if let Some(provider) = patch.llm_provider {
            self.llm_provider = provider;
        }
        if let Some(days) = patch.data_retention_days {
            self.data_retention_days = days;
        }
        if let Some(opt_in) = patch.analytics_opt_in {
            self.analytics_opt_in = opt_in;
        }
    }
}

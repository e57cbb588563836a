//! Persisted application settings.
//!
//! One JSON record under [`config::SETTINGS_KEY`]. A missing record means
//! first run and reads as the defaults; nothing is written until the first
//! update.

use crate::config;
use crate::db::{get_json, set_json, DatabaseError, KeyValueBackend};
use crate::models::{AppSettings, SettingsPatch};

pub fn load_settings(backend: &dyn KeyValueBackend) -> Result<AppSettings, DatabaseError> {
    Ok(get_json(backend, config::SETTINGS_KEY)?.unwrap_or_default())
}

/// Merge `patch` into the stored settings and persist the result.
pub fn update_settings(
    backend: &dyn KeyValueBackend,
    patch: SettingsPatch,
) -> Result<AppSettings, DatabaseError> {
    let mut settings = load_settings(backend)?;
    settings.merge(patch);
    set_json(backend, config::SETTINGS_KEY, &settings)?;
    tracing::debug!(
        language = %settings.language,
        retention_days = settings.data_retention_days,
        "Settings updated"
    );
    Ok(settings)
}

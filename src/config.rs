use std::path::PathBuf;

/// Application-level constants
pub const APP_NAME: &str = "Health Edge";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Name of the on-disk store (kept from the browser build so exported data lines up)
pub const STORE_NAME: &str = "health-edge-diagnostics";

/// Table holding every record kind in one flat key space
pub const STORE_TABLE: &str = "health_data";

/// Backend key of the persisted encryption key record
pub const ENCRYPTION_KEY_RECORD: &str = "encryptionKeyData";

/// Backend key of the persisted application settings
pub const SETTINGS_KEY: &str = "appSettings";

/// Retention window applied when no settings have been saved yet
pub const DEFAULT_RETENTION_DAYS: i64 = 30;

/// Retention value the settings screen uses for "keep forever"
pub const RETAIN_FOREVER: i64 = -1;

/// Environment override for the data directory
pub const DATA_DIR_ENV: &str = "HEALTH_EDGE_DATA_DIR";

/// Default `EnvFilter` directive when `RUST_LOG` is unset
pub fn default_log_filter() -> &'static str {
    "health_edge_lib=info"
}

/// Get the application data directory.
/// `$HEALTH_EDGE_DATA_DIR` if set, otherwise ~/HealthEdge/. Falls back to the
/// working directory when no home directory can be determined.
pub fn app_data_dir() -> PathBuf {
    if let Some(dir) = std::env::var_os(DATA_DIR_ENV) {
        return PathBuf::from(dir);
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("HealthEdge")
}

/// Get the SQLite file backing the record store
pub fn store_path() -> PathBuf {
    app_data_dir().join(format!("{STORE_NAME}.db"))
}
